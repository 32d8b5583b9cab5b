/* demos/spark.rs */

use async_trait::async_trait;
use spark_guard::*;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::sleep;

struct PrintingBackend;

#[async_trait]
impl RemoteMutationClient for PrintingBackend {
    async fn insert_spark(&self, post_id: &str, user_id: &str) -> Result<(), RemoteError> {
        println!("    -> upsert spark ({}, {})", post_id, user_id);
        Ok(())
    }

    async fn increment_sparks(&self, post_id: &str) -> Result<(), RemoteError> {
        println!("    -> rpc increment_sparks({})", post_id);
        Ok(())
    }

    async fn delete_spark(&self, post_id: &str, user_id: &str) -> Result<(), RemoteError> {
        println!("    -> delete spark ({}, {})", post_id, user_id);
        Ok(())
    }

    async fn decrement_sparks(&self, post_id: &str) -> Result<(), RemoteError> {
        println!("    -> rpc decrement_sparks({})", post_id);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let queue = Arc::new(InMemoryQueue::new());
    let connectivity = Arc::new(StaticConnectivity::new(true));
    let guard = SparkGuard::new(
        guard_config!(
            rate: WindowRule::new(Duration::seconds(60), 60),
            burst: WindowRule::new(Duration::seconds(10), 10).half_open(),
            gc_interval: Duration::seconds(5),
        ),
        Arc::new(PrintingBackend),
        queue.clone(),
        connectivity.clone(),
    );
    let gc = guard.spawn_gc();

    println!("--- u1 sparks p1 twice, reverses, then sparks offline ---");
    println!("  spark:   {:?}", guard.spark(Some("u1"), "p1").await);
    println!("  spark:   {:?}", guard.spark(Some("u1"), "p1").await);
    println!("  unspark: {:?}", guard.unspark(Some("u1"), "p1").await);
    connectivity.set_online(false);
    println!("  spark:   {:?}", guard.spark(Some("u1"), "p1").await);
    connectivity.set_online(true);

    for action in queue.drain().await {
        println!(
            "  queued {}: {}",
            action.id,
            serde_json::to_string(&action).unwrap_or_default()
        );
    }

    println!("\n--- u2 taps eleven posts in quick succession ---");
    for i in 1..=11 {
        let result = guard.spark(Some("u2"), &format!("post-{}", i)).await;
        println!("  tap #{}: {:?} ({:?})", i, result, result.feedback());
        sleep(StdDuration::from_millis(200)).await;
    }
    println!(
        "  remaining in window for u2: {}",
        guard.limiter().remaining_in_window("u2").await
    );

    println!("\n--- logout ---");
    gc.abort();
    guard.reset().await;
    println!("  stats: {:?}", guard.stats().snapshot());
}
