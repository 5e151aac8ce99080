use async_trait::async_trait;
use bulkhead_framework::{
    BackgroundExecutor, BreakerConfig, Bulkhead, BulkheadConfig, CircuitState, Dependency,
    DependencyError, UnavailableReason,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// --- Test Dependency ---

/// A downstream that can be switched between healthy and failing.
#[derive(Default)]
struct Switchboard {
    failing: AtomicBool,
    delay_ms: AtomicUsize,
    hits: AtomicUsize,
}

struct Flaky;

#[async_trait]
impl Dependency for Flaky {
    type Id = u32;
    type Output = u32;
    type Context = Arc<Switchboard>;

    async fn fetch(id: u32, board: &Arc<Switchboard>) -> Result<u32, DependencyError> {
        board.hits.fetch_add(1, Ordering::SeqCst);
        let delay = board.delay_ms.load(Ordering::SeqCst) as u64;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if board.failing.load(Ordering::SeqCst) {
            return Err(DependencyError::unavailable(
                "flaky",
                UnavailableReason::Network("connection refused".into()),
            ));
        }
        Ok(id + 1)
    }
}

fn flaky_config(name: &str) -> BulkheadConfig {
    BulkheadConfig {
        max_concurrency: 2,
        queue_capacity: 4,
        timeout: Duration::from_millis(200),
        breaker: BreakerConfig {
            failure_threshold: 3,
            cooldown: Duration::from_millis(100),
        },
        ..BulkheadConfig::named(name)
    }
}

// --- Tests ---

#[tokio::test]
async fn test_breaker_full_lifecycle() {
    let board = Arc::new(Switchboard::default());
    let (bulkhead, client) = Bulkhead::<Flaky>::new(flaky_config("flaky"));
    let handle = tokio::spawn(bulkhead.run(board.clone()));

    // 1. Healthy
    assert_eq!(client.call(1).await.unwrap(), 2);
    assert_eq!(client.circuit_state(), CircuitState::Closed);

    // 2. Downstream fails until the breaker trips
    board.failing.store(true, Ordering::SeqCst);
    for _ in 0..3 {
        assert!(client.call(1).await.is_err());
    }
    assert_eq!(client.circuit_state(), CircuitState::Open);

    // 3. Open: rejected without reaching the downstream
    let hits = board.hits.load(Ordering::SeqCst);
    let started = Instant::now();
    let err = client.call(1).await.unwrap_err();
    assert!(err.is_circuit_open());
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(board.hits.load(Ordering::SeqCst), hits);

    // 4. Cooldown elapses, downstream recovers, the probe closes the circuit
    board.failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(client.call(5).await.unwrap(), 6);
    assert_eq!(client.circuit_state(), CircuitState::Closed);

    // 5. Dropping the last client stops the pool
    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_timeouts_count_as_failures() {
    let board = Arc::new(Switchboard::default());
    board.delay_ms.store(1_000, Ordering::SeqCst);
    let (bulkhead, client) = Bulkhead::<Flaky>::new(flaky_config("slow"));
    tokio::spawn(bulkhead.run(board));

    for _ in 0..3 {
        let err = client.call(1).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.dependency(), "slow");
    }
    assert_eq!(client.circuit_state(), CircuitState::Open);
}

#[tokio::test]
async fn test_boundaries_are_isolated() {
    let slow_board = Arc::new(Switchboard::default());
    slow_board.delay_ms.store(1_000, Ordering::SeqCst);
    let fast_board = Arc::new(Switchboard::default());

    let (slow_bulkhead, slow) = Bulkhead::<Flaky>::new(flaky_config("slow"));
    let (fast_bulkhead, fast) = Bulkhead::<Flaky>::new(flaky_config("fast"));
    tokio::spawn(slow_bulkhead.run(slow_board));
    tokio::spawn(fast_bulkhead.run(fast_board));

    // saturate the slow pool and its queue
    let mut stuck = vec![];
    for _ in 0..6 {
        let slow = slow.clone();
        stuck.push(tokio::spawn(async move { slow.call(1).await }));
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    // the other boundary is unaffected
    let started = Instant::now();
    assert_eq!(fast.call(9).await.unwrap(), 10);
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(fast.circuit_state(), CircuitState::Closed);

    for call in stuck {
        assert!(call.await.unwrap().is_err());
    }
}

#[tokio::test]
async fn test_executor_runs_work_after_submit_returns() {
    let executor = BackgroundExecutor::new("processor", 1, 8);
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let done = done.clone();
        executor
            .submit(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
    }

    executor.shutdown(Duration::from_secs(1)).await;
    assert_eq!(done.load(Ordering::SeqCst), 3);
    assert!(executor.submit(async { Ok(()) }).is_err());
}
