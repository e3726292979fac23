//! Blackbox tests for the driver lifecycle.
//!
//! These tests drive an `InitLedgerDriver` the way a harness would, against a fake target
//! adapter, and assert on what the adapter and the observer see.

use std::sync::Arc;
use std::time::Duration;

use ledgerbench_driver::config::Config;
use ledgerbench_driver::{
    AdapterError, BoxedDriver, DriverState, InitLedgerDriver, InitializationError,
    OperationError, RoundContext, TargetContext, TeardownError, WorkloadDriver,
};
use ledgerbench_test::adapter::FakeAdapter;
use ledgerbench_test::observer::{RecordedEvent, RecordingObserver};
use serde_json::json;

fn round(adapter: &FakeAdapter) -> RoundContext {
    RoundContext::new(0, 1, 0)
        .adapter(Arc::new(adapter.clone()))
        .target_context(TargetContext::new())
}

#[tokio::test]
async fn submits_init_ledger_three_times() {
    ledgerbench_test::tracing::init();

    let adapter = FakeAdapter::new();
    let observer = RecordingObserver::new();
    let driver = InitLedgerDriver::new().observer(observer.clone());

    driver.setup(round(&adapter)).await.unwrap();
    for _ in 0..3 {
        driver.perform_operation().await.unwrap();
    }
    driver.teardown().await;

    let requests = adapter.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.target_id(), "testgo");
        assert_eq!(request.operation_name(), "InitLedger");
        assert_eq!(request.invoker_identity(), "Admin@example.com");
        assert!(request.arguments().is_empty());
    }

    assert_eq!(driver.state(), DriverState::Closed);
    assert_eq!(observer.teardown_residuals(), vec![None]);
}

#[tokio::test]
async fn operation_indices_follow_call_order() {
    let adapter = FakeAdapter::new();
    let observer = RecordingObserver::new();
    let driver = InitLedgerDriver::new().observer(observer.clone());

    driver.setup(round(&adapter)).await.unwrap();
    for _ in 0..10 {
        driver.perform_operation().await.unwrap();
    }

    assert_eq!(observer.started_indices(), (0..10).collect::<Vec<_>>());
    assert_eq!(driver.invocations(), 10);
}

#[tokio::test]
async fn failed_submission_does_not_block_later_operations() {
    let adapter = FakeAdapter::new().fail_on(2);
    let observer = RecordingObserver::new();
    let driver = InitLedgerDriver::new().observer(observer.clone());

    driver.setup(round(&adapter)).await.unwrap();
    let first = driver.perform_operation().await;
    let second = driver.perform_operation().await;
    let third = driver.perform_operation().await;

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(OperationError::Submit {
            index: 1,
            source: AdapterError::Rejected { .. }
        })
    ));
    assert!(third.is_ok());
    assert_eq!(driver.invocations(), 3);
    assert_eq!(adapter.submit_count(), 3);

    let finished: Vec<_> = observer
        .events()
        .into_iter()
        .filter(|event| matches!(event, RecordedEvent::OperationFinished { .. }))
        .collect();
    assert_eq!(
        finished,
        vec![
            RecordedEvent::OperationFinished { index: 0, ok: true },
            RecordedEvent::OperationFinished { index: 1, ok: false },
            RecordedEvent::OperationFinished { index: 2, ok: true },
        ]
    );

    // A partially failed round still tears down cleanly.
    driver.teardown().await;
    assert_eq!(observer.teardown_residuals(), vec![None]);
}

#[tokio::test]
async fn adapter_errors_are_surfaced_per_operation() {
    let adapter = FakeAdapter::new().error_on(1);
    let driver = InitLedgerDriver::new();

    driver.setup(round(&adapter)).await.unwrap();
    let err = driver.perform_operation().await.unwrap_err();
    assert!(matches!(
        err,
        OperationError::Submit {
            index: 0,
            source: AdapterError::Generic { .. }
        }
    ));

    driver.perform_operation().await.unwrap();
    assert_eq!(adapter.submit_count(), 2);
}

#[tokio::test]
async fn driver_from_config_submits_configured_operation() {
    let mut config = Config::default();
    config.operation.operation_name = "GetAllAssets".to_owned();

    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::from_config(&config);

    driver.setup(round(&adapter)).await.unwrap();
    driver.perform_operation().await.unwrap();
    driver.perform_operation().await.unwrap();
    driver.teardown().await;

    let requests = adapter.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.target_id(), "testgo");
        assert_eq!(request.operation_name(), "GetAllAssets");
        assert_eq!(request.invoker_identity(), "Admin@example.com");
    }
}

#[tokio::test]
async fn boxed_driver_runs_a_round() {
    let adapter = FakeAdapter::new();
    let observer = RecordingObserver::new();
    let driver: BoxedDriver = Box::new(InitLedgerDriver::new().observer(observer.clone()));

    driver.setup(round(&adapter)).await.unwrap();
    driver.perform_operation().await.unwrap();
    driver.teardown().await;

    assert_eq!(adapter.submit_count(), 1);
    assert_eq!(
        observer.events(),
        vec![
            RecordedEvent::SetupStarted {
                worker_index: 0,
                total_workers: 1,
                round_index: 0
            },
            RecordedEvent::SetupFinished { ok: true },
            RecordedEvent::OperationStarted { index: 0 },
            RecordedEvent::OperationFinished { index: 0, ok: true },
            RecordedEvent::TeardownStarted,
            RecordedEvent::TeardownFinished { residual: None },
        ]
    );
}

#[tokio::test]
async fn second_setup_is_rejected() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();

    driver.setup(round(&adapter)).await.unwrap();
    driver.perform_operation().await.unwrap();

    let err = driver.setup(round(&adapter)).await.unwrap_err();
    assert!(matches!(
        err,
        InitializationError::InvalidState {
            state: DriverState::Ready
        }
    ));

    // The rejected setup must not reset the running round.
    driver.perform_operation().await.unwrap();
    assert_eq!(driver.invocations(), 2);
}

#[tokio::test]
async fn setup_after_teardown_is_rejected() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();

    driver.setup(round(&adapter)).await.unwrap();
    driver.teardown().await;

    let err = driver.setup(round(&adapter)).await.unwrap_err();
    assert!(matches!(
        err,
        InitializationError::InvalidState {
            state: DriverState::Closed
        }
    ));
}

#[tokio::test]
async fn operation_before_setup_submits_nothing() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();

    let err = driver.perform_operation().await.unwrap_err();
    assert!(matches!(
        err,
        OperationError::NotReady {
            state: DriverState::Uninitialized
        }
    ));
    assert_eq!(adapter.submit_count(), 0);
    assert_eq!(driver.invocations(), 0);
}

#[tokio::test]
async fn operation_after_teardown_submits_nothing() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();

    driver.setup(round(&adapter)).await.unwrap();
    driver.perform_operation().await.unwrap();
    driver.teardown().await;

    let err = driver.perform_operation().await.unwrap_err();
    assert!(matches!(
        err,
        OperationError::NotReady {
            state: DriverState::Closed
        }
    ));
    assert_eq!(adapter.submit_count(), 1);
}

#[tokio::test]
async fn missing_adapter_fails_setup() {
    let observer = RecordingObserver::new();
    let driver = InitLedgerDriver::new().observer(observer.clone());
    let context = RoundContext::new(0, 1, 0).target_context(TargetContext::new());

    let err = driver.setup(context).await.unwrap_err();
    assert!(matches!(err, InitializationError::MissingAdapter));
    assert_eq!(driver.state(), DriverState::Uninitialized);
    assert!(
        observer
            .events()
            .contains(&RecordedEvent::SetupFinished { ok: false })
    );
}

#[tokio::test]
async fn missing_context_fails_setup() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();
    let context = RoundContext::new(0, 1, 0).adapter(Arc::new(adapter.clone()));

    let err = driver.setup(context).await.unwrap_err();
    assert!(matches!(err, InitializationError::MissingContext));

    // The driver can still be set up properly afterwards.
    driver.setup(round(&adapter)).await.unwrap();
    assert_eq!(driver.state(), DriverState::Ready);
}

#[tokio::test]
async fn worker_index_must_be_in_range() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();
    let context = RoundContext::new(4, 4, 0)
        .adapter(Arc::new(adapter))
        .target_context(TargetContext::new());

    let err = driver.setup(context).await.unwrap_err();
    assert!(matches!(
        err,
        InitializationError::InvalidWorker {
            worker_index: 4,
            total_workers: 4
        }
    ));
}

#[tokio::test]
async fn keeps_round_context_until_teardown() {
    let adapter = FakeAdapter::new();
    let driver = InitLedgerDriver::new();
    let context = RoundContext::new(1, 2, 3)
        .round_arguments([("assets".to_owned(), json!(4))].into())
        .adapter(Arc::new(adapter))
        .target_context(
            [("msp".to_owned(), json!("Org1MSP"))]
                .into_iter()
                .collect::<TargetContext>(),
        );

    driver.setup(context).await.unwrap();
    let target_context = driver.target_context().unwrap();
    assert_eq!(target_context.get("msp"), Some(&json!("Org1MSP")));
    let arguments = driver.round_arguments().unwrap();
    assert_eq!(arguments.get("assets"), Some(&json!(4)));

    driver.teardown().await;
    assert!(driver.target_context().is_none());
}

#[tokio::test]
async fn teardown_without_setup_is_a_noop() {
    let observer = RecordingObserver::new();
    let driver = InitLedgerDriver::new().observer(observer.clone());

    driver.teardown().await;

    assert_eq!(driver.state(), DriverState::Closed);
    assert_eq!(observer.teardown_residuals(), vec![None]);
}

#[tokio::test]
async fn second_teardown_reports_residual() {
    let adapter = FakeAdapter::new();
    let observer = RecordingObserver::new();
    let driver = InitLedgerDriver::new().observer(observer.clone());

    driver.setup(round(&adapter)).await.unwrap();
    driver.teardown().await;
    driver.teardown().await;

    assert_eq!(driver.state(), DriverState::Closed);
    assert_eq!(
        observer.teardown_residuals(),
        vec![None, Some(TeardownError::AlreadyClosed)]
    );
}

#[tokio::test]
async fn teardown_with_operation_in_flight() {
    let adapter = FakeAdapter::new().paused();
    let observer = RecordingObserver::new();
    let driver = Arc::new(InitLedgerDriver::new().observer(observer.clone()));

    driver.setup(round(&adapter)).await.unwrap();

    let operation = {
        let driver = Arc::clone(&driver);
        tokio::spawn(async move { driver.perform_operation().await })
    };
    adapter.wait_for_submits(1).await;
    assert_eq!(driver.in_flight(), 1);

    driver.teardown().await;
    assert_eq!(driver.state(), DriverState::Closed);
    assert_eq!(
        observer.teardown_residuals(),
        vec![Some(TeardownError::OperationsInFlight { count: 1 })]
    );

    // The operation completes against the adapter it started with.
    adapter.release();
    operation.await.unwrap().unwrap();
    assert_eq!(driver.in_flight(), 0);
}

#[tokio::test]
async fn overlapping_operations_take_distinct_indices() {
    let adapter = FakeAdapter::new().delay(Duration::from_millis(20));
    let observer = RecordingObserver::new();
    let driver = Arc::new(InitLedgerDriver::new().observer(observer.clone()));

    driver.setup(round(&adapter)).await.unwrap();

    let operations: Vec<_> = (0..5)
        .map(|_| {
            let driver = Arc::clone(&driver);
            tokio::spawn(async move { driver.perform_operation().await })
        })
        .collect();
    for operation in operations {
        operation.await.unwrap().unwrap();
    }

    let mut indices = observer.started_indices();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(adapter.submit_count(), 5);
    assert_eq!(driver.in_flight(), 0);
}

#[tokio::test]
async fn cancelled_operation_is_released() {
    let adapter = FakeAdapter::new().paused();
    let driver = InitLedgerDriver::new();

    driver.setup(round(&adapter)).await.unwrap();

    let result = tokio::time::timeout(Duration::from_millis(20), driver.perform_operation()).await;
    assert!(result.is_err());
    assert_eq!(driver.in_flight(), 0);
    driver.wait_idle().await;

    driver.teardown().await;
    assert_eq!(driver.state(), DriverState::Closed);
}

#[tokio::test]
async fn independent_drivers_keep_separate_counters() {
    let adapter = FakeAdapter::new();
    let first = InitLedgerDriver::new();
    let second = InitLedgerDriver::new();

    first
        .setup(
            RoundContext::new(0, 2, 0)
                .adapter(Arc::new(adapter.clone()))
                .target_context(TargetContext::new()),
        )
        .await
        .unwrap();
    second
        .setup(
            RoundContext::new(1, 2, 0)
                .adapter(Arc::new(adapter.clone()))
                .target_context(TargetContext::new()),
        )
        .await
        .unwrap();

    first.perform_operation().await.unwrap();
    first.perform_operation().await.unwrap();
    second.perform_operation().await.unwrap();

    assert_eq!(first.invocations(), 2);
    assert_eq!(second.invocations(), 1);
    assert_eq!(adapter.submit_count(), 3);
}
