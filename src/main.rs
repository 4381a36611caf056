use axum::{
    Json, Router,
    error_handling::HandleErrorLayer,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use naming_failover::{
    CallShape, Cfg, HttpTransport, InvocationContext, InvocationError, InvocationRequest, Locator,
    NamingInterceptor, SessionId, StaticNamingProvider, config::parse_uri_list, driver,
};
use serde::Serialize;
use serde_json::Value;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::net::TcpListener;
use tower::{BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Header com os destinos preferidos da chamada (URIs separadas por vírgula)
const PREFERRED_DESTINATIONS_HEADER: &str = "x-preferred-destinations";

#[derive(Clone)]
struct AppState {
    naming: Arc<StaticNamingProvider>,
    interceptor: Arc<NamingInterceptor>,
    transport: Arc<HttpTransport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeOut {
    destination: String,
    result: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOut {
    session_id: SessionId,
    destination: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // tracing enxuto
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("naming_failover=info".parse().unwrap())
                .add_directive("axum=warn".parse().unwrap())
                .add_directive("tower_http=warn".parse().unwrap()),
        )
        .with_target(false)
        .compact()
        .init();

    // metrics (metrics 0.24 + prometheus 0.17)
    let prom_handle: PrometheusHandle = PrometheusBuilder::new()
        .install_recorder()
        .expect("install recorder");

    // config/env
    let cfg = Arc::new(Cfg::from_env()?);
    info!("cfg: {:?}", cfg.redacted());

    let state = AppState {
        naming: Arc::new(StaticNamingProvider::new(cfg.provider_uris.clone())),
        interceptor: Arc::new(NamingInterceptor::new()),
        transport: Arc::new(HttpTransport::new(&cfg)?),
    };

    // router
    let prom_handle_route = prom_handle.clone();
    let app = Router::new()
        .route("/invoke/{app}/{module}/{bean}", post(invoke))
        .route("/sessions/{app}/{module}/{bean}", post(create_session))
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ready" }))
        .route(
            "/metrics",
            get(move || {
                let h = prom_handle_route.clone();
                async move { h.render() }
            }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .load_shed()
                .concurrency_limit(cfg.concurrency_limit)
                .timeout(Duration::from_millis(cfg.gateway_timeout_ms))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "gateway timeout elapsed".into())
    } else if err.is::<tower::load_shed::error::Overloaded>() {
        (StatusCode::SERVICE_UNAVAILABLE, "gateway overloaded".into())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("unhandled error: {err}"))
    }
}

async fn invoke(
    State(st): State<AppState>,
    Path((app, module, bean)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<InvokeOut>, (StatusCode, String)> {
    let mut ctx = new_context(&st, Locator::new(app, module, bean), CallShape::Invocation, &headers)?;
    let request = InvocationRequest { payload: body };

    let start = Instant::now();
    let result = driver::invoke(
        st.interceptor.as_ref(),
        &mut ctx,
        st.transport.as_ref(),
        &request,
    )
    .await;
    metrics::histogram!("invoke_latency_ms").record(start.elapsed().as_millis() as f64);
    metrics::histogram!("invoke_attempts").record(ctx.attempt() as f64);

    match result {
        Ok(resp) => {
            metrics::counter!("invoke_ok").increment(1);
            Ok(Json(InvokeOut {
                destination: resp.destination.to_string(),
                result: resp.payload,
            }))
        }
        Err(e) => Err(reject("invoke_err", e)),
    }
}

async fn create_session(
    State(st): State<AppState>,
    Path((app, module, bean)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<SessionOut>, (StatusCode, String)> {
    let mut ctx = new_context(
        &st,
        Locator::new(app, module, bean),
        CallShape::SessionCreation,
        &headers,
    )?;

    match driver::create_session(st.interceptor.as_ref(), &mut ctx, st.transport.as_ref()).await {
        Ok(session_id) => {
            metrics::counter!("session_ok").increment(1);
            Ok(Json(SessionOut {
                session_id,
                destination: ctx.destination().map(ToString::to_string),
            }))
        }
        Err(e) => Err(reject("session_err", e)),
    }
}

/// Contexto novo por requisição: blacklist e flags nunca vazam entre chamadas
fn new_context(
    st: &AppState,
    locator: Locator,
    shape: CallShape,
    headers: &HeaderMap,
) -> Result<InvocationContext, (StatusCode, String)> {
    let mut ctx = InvocationContext::new(locator, shape).with_naming_provider(st.naming.clone());

    if let Some(raw) = headers.get(PREFERRED_DESTINATIONS_HEADER) {
        let raw = raw
            .to_str()
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        let preferred = parse_uri_list(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        ctx.set_preferred_destinations(Some(preferred.into_iter().collect()));
    }
    Ok(ctx)
}

fn reject(metric: &'static str, e: InvocationError) -> (StatusCode, String) {
    let code = match &e {
        InvocationError::NoMoreDestinations { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InvocationError::NoSuchTarget { .. } => StatusCode::NOT_FOUND,
        InvocationError::RequestSendFailed { .. } | InvocationError::InvalidResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
        InvocationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        InvocationError::Remote { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
    };
    metrics::counter!(metric, "code" => code.as_u16().to_string()).increment(1);
    (code, e.to_string())
}
