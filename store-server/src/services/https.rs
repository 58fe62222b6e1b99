use crate::core::{Config, ServerState};
use crate::utils::AppError;
use axum::{Router, middleware};
use std::net::SocketAddr;
use std::time::Duration;
use tower::Service;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

pub type OneshotResult =
    Result<http::Response<axum::body::Body>, Box<dyn std::error::Error + Send + Sync>>;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", request_id = %request_id, "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::products::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::reports::router())
        .merge(crate::api::payments::router())
        .merge(crate::api::events::router())
}

/// HTTP 服务 - 持有带状态的路由
#[derive(Clone, Debug)]
pub struct HttpsService {
    config: Config,
    router: Router,
}

impl HttpsService {
    pub fn new(config: Config, state: ServerState) -> Self {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let router = build_app()
            .with_state(state)
            // Tower HTTP 中间件
            .layer(TimeoutLayer::new(timeout))
            .layer(CorsLayer::permissive())
            .layer(CompressionLayer::new())
            // HTTP 请求日志中间件
            .layer(middleware::from_fn(log_request))
            // request id: 先生成，再回写到响应
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Self { config, router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 不经过网络直接处理一个请求
    pub async fn oneshot(&self, request: http::Request<axum::body::Body>) -> OneshotResult {
        let mut service = self.router.clone();
        match service.call(request).await {
            Ok(response) => Ok(response),
            Err(_) => Err(AppError::internal("Oneshot call failed").into()),
        }
    }

    /// Start the HTTP server, returns after graceful shutdown
    pub async fn start_server<F>(
        &self,
        shutdown_signal: F,
        grace: Duration,
    ) -> Result<(), AppError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("🚀 Starting HTTP server on {}", addr);

        let handle = axum_server::Handle::new();

        let handle_clone = handle.clone();
        tokio::spawn(async move {
            shutdown_signal.await;
            handle_clone.graceful_shutdown(Some(grace));
        });

        axum_server::bind(addr)
            .handle(handle)
            .serve(self.router.clone().into_make_service())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}
