//! Submit throughput benchmark suite.
//!
//! Measures the overhead of routing work through the connection actor
//! against an in-memory connection:
//! - Sequential submits from one caller
//! - Bursts of concurrent callers: 10, 100
//!
//! Run with: cargo bench --bench submit
//! Results saved to: target/criterion/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use wspool::{Connection, Connector, Context, Pool, PoolConfig, Result};

// ============================================================================
// In-memory Transport
// ============================================================================

struct NullConn;

#[async_trait]
impl Connection for NullConn {
    async fn send_close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(self) -> Result<()> {
        Ok(())
    }
}

struct NullConnector;

#[async_trait]
impl Connector for NullConnector {
    type Conn = NullConn;

    async fn connect(&self, _ctx: &Context) -> Result<NullConn> {
        Ok(NullConn)
    }
}

fn null_pool() -> Arc<Pool<NullConnector>> {
    let config = PoolConfig::new(Duration::from_secs(60), Duration::ZERO);
    Arc::new(Pool::new(NullConnector, config).expect("valid config"))
}

async fn submit_noop(pool: &Pool<NullConnector>) {
    pool.submit(&Context::new(), |_conn| Box::pin(async { Ok(()) }))
        .await
        .expect("noop work");
}

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CALLER_COUNTS: &[usize] = &[10, 100];

// ============================================================================
// Benchmark: Sequential Submit
// ============================================================================

fn bench_sequential(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let pool = null_pool();

    c.bench_function("submit_sequential", |b| {
        b.to_async(&rt).iter(|| submit_noop(&pool));
    });
}

// ============================================================================
// Benchmark: Concurrent Callers
// ============================================================================

fn bench_concurrent(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let pool = null_pool();

    let mut group = c.benchmark_group("submit_concurrent");

    for &count in CALLER_COUNTS {
        group.bench_with_input(BenchmarkId::new("callers", count), &count, |b, &callers| {
            b.to_async(&rt).iter(|| {
                let pool = Arc::clone(&pool);
                async move {
                    let handles: Vec<_> = (0..callers)
                        .map(|_| {
                            let pool = Arc::clone(&pool);
                            tokio::spawn(async move { submit_noop(&pool).await })
                        })
                        .collect();

                    for handle in handles {
                        handle.await.unwrap();
                    }
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sequential, bench_concurrent);
criterion_main!(benches);
