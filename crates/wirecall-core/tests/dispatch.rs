//! Dispatch behaviour shared by the in-process and mock paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use wirecall_core::telemetry::{
    CallStatus, Emitter, EmitterSource, EventBus, EventKind, RecordingEmitter, RpcEvent,
};
use wirecall_core::{HandlerError, HandlerRegistry, MockRpc, RequestContext, RpcError, RpcService};

fn test_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register_sync("echo", |args, _ctx| Ok(args))
        .register("slow", |args, _ctx| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(args)
        })
        .register_sync("fail", |_args, _ctx| {
            Err(HandlerError::new("Test Failure")
                .with_code("ERR_CODE_TEST")
                .with_meta(json!({ "hello": "world" })))
        });
    registry
}

fn request_ctx() -> RequestContext {
    RequestContext::builder()
        .http_method("GET")
        .path("/")
        .header("accept", "text/html")
        .build()
}

struct PanickingSource;

impl Emitter for PanickingSource {
    fn emit(&self, _kind: EventKind, _event: &RpcEvent) {
        panic!("telemetry backend down");
    }
}

impl EmitterSource for PanickingSource {
    fn scoped(&self, _ctx: &RequestContext) -> Option<Arc<dyn Emitter>> {
        Some(Arc::new(PanickingSource))
    }
}

#[tokio::test]
async fn test_one_event_per_call_matching_outcome() {
    let recorder = RecordingEmitter::new();
    let service =
        RpcService::new(Arc::new(test_registry())).with_emitters(Arc::new(recorder.clone()));
    let ctx = request_ctx();
    let rpc = service.from_context(&ctx).unwrap();

    rpc.request("echo", json!(1), &ctx).await.unwrap();
    rpc.request("fail", json!(1), &ctx).await.unwrap_err();
    rpc.request("missing", json!(1), &ctx).await.unwrap_err();

    let events = recorder.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].0, EventKind::Method);
    assert_eq!(events[0].1.status, Some(CallStatus::Success));
    assert_eq!(events[1].0, EventKind::Method);
    assert_eq!(events[1].1.status, Some(CallStatus::Failure));
    assert_eq!(events[2].0, EventKind::Error);
    assert_eq!(events[2].1.status, None);
}

#[tokio::test]
async fn test_handler_value_returned_unmodified() {
    let service = RpcService::new(Arc::new(test_registry()));
    let ctx = request_ctx();
    let rpc = service.from_context(&ctx).unwrap();

    let inputs = vec![
        json!(null),
        json!(0),
        json!("text"),
        json!([1, "two", { "three": 3 }]),
        json!({ "nested": { "deep": [true, false, null] }, "n": -1.5 }),
    ];

    for input in inputs {
        let output = rpc.request("echo", input.clone(), &ctx).await.unwrap();
        assert_eq!(output, input);
    }
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let service = RpcService::new(Arc::new(test_registry()));
    let ctx = request_ctx();
    let rpc = service.from_context(&ctx).unwrap();

    let first = rpc.request("echo", json!({ "a": 1 }), &ctx).await;
    let second = rpc.request("echo", json!({ "a": 1 }), &ctx).await;
    assert_eq!(first, second);

    let first = rpc.request("fail", Value::Null, &ctx).await;
    let second = rpc.request("fail", Value::Null, &ctx).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_emitter_panic_does_not_change_outcome() {
    let service = RpcService::new(Arc::new(test_registry())).with_emitters(Arc::new(PanickingSource));
    let ctx = request_ctx();
    let rpc = service.from_context(&ctx).unwrap();

    assert_eq!(rpc.request("echo", json!(5), &ctx).await.unwrap(), json!(5));

    let err = rpc.request("fail", Value::Null, &ctx).await.unwrap_err();
    assert_eq!(err.code(), Some("ERR_CODE_TEST"));

    let err = rpc.request("missing", Value::Null, &ctx).await.unwrap_err();
    assert!(err.is_missing_handler());
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut registry = HandlerRegistry::new();
    {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        registry.register("work", move |args, _ctx| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(args)
            }
        });
    }

    let service = RpcService::new(Arc::new(registry));
    let ctx = request_ctx();
    let rpc = service.from_context(&ctx).unwrap();

    let calls = (0..8).map(|i| {
        let rpc = rpc.clone();
        let ctx = ctx.clone();
        async move { rpc.request("work", json!(i), &ctx).await }
    });
    let results = spawn_all(calls).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!(i));
    }
    assert!(peak.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_event_bus_receives_scoped_events() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let service = RpcService::new(Arc::new(test_registry())).with_emitters(Arc::new(bus));

    let ctx = request_ctx();
    let rpc = service.from_context(&ctx).unwrap();
    rpc.request("slow", json!("x"), &ctx).await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.request_id.as_deref(), Some(ctx.request_id()));
    assert_eq!(received.event.method, "slow");
    assert!(received.event.timing.unwrap() >= 15);
}

#[tokio::test]
async fn test_mock_and_service_agree_on_missing_handler() {
    let mock = MockRpc::new(HandlerRegistry::new());
    let service = RpcService::new(Arc::new(HandlerRegistry::new()));
    let ctx = request_ctx();

    let from_mock = mock.request("test", Value::Null).await.unwrap_err();
    let from_service = service
        .from_context(&ctx)
        .unwrap()
        .request("test", Value::Null, &ctx)
        .await
        .unwrap_err();

    assert_eq!(from_mock, from_service);
    assert!(matches!(from_mock, RpcError::MissingHandler(_)));
    assert_eq!(from_mock.to_string(), "Missing RPC handler for test");
}

/// Spawn every future and collect the results in order.
async fn spawn_all<F, T>(futures: impl IntoIterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("task panicked"));
    }
    results
}
