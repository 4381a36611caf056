use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use http::Uri;
use naming_failover::{
    CallShape, Cfg, EndpointSelector, HttpTransport, InvocationContext, InvocationError,
    InvocationRequest, Locator, NamingInterceptor, RandomSource, StaticNamingProvider,
    WeakAffinityHook, driver,
};
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

/// Sempre o primeiro candidato
struct FirstCandidate;

impl RandomSource for FirstCandidate {
    fn next_index(&self, _bound: usize) -> usize {
        0
    }
}

fn cfg(request_timeout_ms: u64) -> Cfg {
    Cfg {
        port: 0,
        provider_uris: vec![],
        invoke_path: "/invoke".into(),
        session_path: "/sessions".into(),
        auth_header_name: None,
        auth_header_value: None,
        request_timeout_ms,
        connect_timeout_ms: 250,
        gateway_timeout_ms: 10_000,
        concurrency_limit: 1,
    }
}

/// Endpoint que lê a requisição e nunca responde; conta entregas
async fn silent_endpoint() -> (Uri, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap()).parse().unwrap();
    let delivered = Arc::new(AtomicUsize::new(0));
    let seen = delivered.clone();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                if sock.read(&mut buf).await.unwrap_or(0) > 0 {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });
    (uri, delivered)
}

#[tokio::test]
async fn delivered_call_that_times_out_is_not_run_on_another_endpoint() {
    let (slow, slow_delivered) = silent_endpoint().await;
    let (other, other_delivered) = silent_endpoint().await;

    let interceptor = NamingInterceptor::with_parts(
        EndpointSelector::with_random(FirstCandidate),
        Arc::new(WeakAffinityHook),
    );
    let transport = HttpTransport::new(&cfg(300)).unwrap();
    let mut ctx = InvocationContext::new(
        Locator::new("shop", "orders", "OrderBean"),
        CallShape::Invocation,
    )
    .with_naming_provider(Arc::new(StaticNamingProvider::new(vec![
        slow.clone(),
        other.clone(),
    ])));
    let request = InvocationRequest {
        payload: json!({ "method": "placeOrder", "args": [42] }),
    };

    let err = driver::invoke(&interceptor, &mut ctx, &transport, &request)
        .await
        .unwrap_err();

    assert!(matches!(err, InvocationError::Timeout { .. }), "{err:?}");
    assert_eq!(slow_delivered.load(Ordering::SeqCst), 1);
    assert_eq!(other_delivered.load(Ordering::SeqCst), 0);
    assert!(!ctx.is_blacklisted(&slow));
    assert_eq!(ctx.destination(), Some(&slow));
    assert_eq!(ctx.attempt(), 1);
}
