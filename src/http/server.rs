//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, timeout, panic recovery)
//! - Dispatch each request by its route: proxy, analytics, redirect or asset
//! - Drain analytics background tasks after the listener stops

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, Response, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use chrono::Utc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::analytics::{Admission, AdmissionFilter, AnalyticsRelay, Session};
use crate::assets::{AssetStore, CachePolicy, FsAssetStore};
use crate::config::{AnalyticsConfig, EdgeConfig, SiteConfig};
use crate::error::RouterError;
use crate::http::request::{client_ip, request_id, request_origin, UuidRequestId};
use crate::http::response::{asset_response, forbidden, internal_error, no_content, redirect};
use crate::lifecycle::{BackgroundTasks, Shutdown};
use crate::observability::metrics;
use crate::proxy::ApiProxy;
use crate::routing::{RouteKind, Router as EdgeRouter};
use crate::security::PageHeaders;

/// Failure to assemble the server from its configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid allow-list: {0}")]
    AllowList(#[from] regex::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EdgeRouter>,
    pub assets: Arc<dyn AssetStore>,
    pub proxy: Arc<ApiProxy>,
    pub admission: Arc<AdmissionFilter>,
    pub relay: AnalyticsRelay,
    pub tasks: BackgroundTasks,
    pub page_headers: Arc<PageHeaders>,
    pub site: Arc<SiteConfig>,
    pub analytics: Arc<AnalyticsConfig>,
    pub not_found_path: Arc<str>,
}

impl AppState {
    /// Build handler state from configuration and an asset store.
    pub fn new(config: &EdgeConfig, assets: Arc<dyn AssetStore>) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .build()?;

        Ok(Self {
            router: Arc::new(EdgeRouter::from_config(config)),
            assets,
            proxy: Arc::new(ApiProxy::new(client.clone(), &config.proxy)?),
            admission: Arc::new(AdmissionFilter::new(config.analytics.allow_list.as_ref())?),
            relay: AnalyticsRelay::new(client, Url::parse(&config.analytics.collector_url)?),
            tasks: BackgroundTasks::new(),
            page_headers: Arc::new(PageHeaders::from_config(&config.site)),
            site: Arc::new(config.site.clone()),
            analytics: Arc::new(config.analytics.clone()),
            not_found_path: Arc::from(config.assets.not_found_path.as_str()),
        })
    }
}

/// HTTP server for the edge router.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
    tasks: BackgroundTasks,
}

impl HttpServer {
    /// Create a server serving assets from `config.assets.root`.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let store = Arc::new(FsAssetStore::new(&config.assets.root));
        Self::with_store(config, store)
    }

    /// Create a server over an explicit asset store.
    pub fn with_store(config: EdgeConfig, assets: Arc<dyn AssetStore>) -> Result<Self, ServerError> {
        let state = AppState::new(&config, assets)?;
        let tasks = state.tasks.clone();
        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            tasks,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(edge_handler))
            .route("/{*path}", any(edge_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The Axum application, for serving or driving directly in tests.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the analytics background tasks.
    pub fn background_tasks(&self) -> BackgroundTasks {
        self.tasks.clone()
    }

    /// Run until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown.wait()).await
    }

    /// Run until `shutdown` resolves, then drain background tasks.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");

        let abandoned = self
            .tasks
            .drain(Duration::from_secs(self.config.timeouts.drain_secs))
            .await;
        if abandoned > 0 {
            tracing::warn!(abandoned, "Analytics hits dropped at shutdown");
        }
        Ok(())
    }
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    tracing::error!("Handler panicked");
    internal_error()
}

/// Main handler.
/// Classifies the path and dispatches to the matching behaviour.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let route = state.router.classify(request.uri().path());
    let request_id = request_id(request.headers()).to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %path,
        route = route.name(),
        "Dispatching request"
    );

    let response = match dispatch(&state, route, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, route = route.name(), "Dispatch failed");
            e.into_response()
        }
    };

    metrics::record_request(route.name(), response.status().as_u16(), start_time);
    response
}

async fn dispatch(
    state: &AppState,
    route: RouteKind,
    request: Request<Body>,
) -> Result<Response<Body>, RouterError> {
    match route {
        RouteKind::Proxy(index) => Ok(state.proxy.forward(index, request).await?),
        RouteKind::Analytics => handle_analytics(state, &request),
        RouteKind::LegacyRedirect => {
            let path = request.uri().path();
            let prefix = state.site.legacy_prefix.trim_end_matches('/');
            let target = path.strip_prefix(prefix).unwrap_or(path);
            redirect_to(state, &request, target)
        }
        RouteKind::IndexRedirect => {
            let path = request.uri().path();
            let target = match path.strip_suffix(&state.site.index_suffix) {
                Some(dir) => format!("{dir}/"),
                None => path.to_string(),
            };
            redirect_to(state, &request, &target)
        }
        kind => {
            let path = request.uri().path().to_owned();
            serve_asset(state, kind, &path).await
        }
    }
}

fn redirect_to(
    state: &AppState,
    request: &Request<Body>,
    path: &str,
) -> Result<Response<Body>, RouterError> {
    let path = if path.is_empty() { "/" } else { path };
    let origin = request_origin(request.headers(), state.site.origin.as_deref());
    let location = match request.uri().query() {
        Some(query) if !query.is_empty() => format!("{origin}{path}?{query}"),
        _ => format!("{origin}{path}"),
    };
    Ok(redirect(&location, state.site.redirect_max_age_secs)?)
}

fn handle_analytics(state: &AppState, request: &Request<Body>) -> Result<Response<Body>, RouterError> {
    let headers = request.headers();
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    let user_agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());

    let admitted = match state.admission.check(referer, user_agent, request.uri().query()) {
        Admission::Allow(admitted) => admitted,
        Admission::Block(reason) => {
            metrics::record_blocked(reason.as_str());
            tracing::info!(reason = reason.as_str(), referer = ?referer, "Analytics hit blocked");
            return Ok(forbidden());
        }
    };

    let session = Session::resolve(headers, &state.analytics.cookie_name);
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(headers, &state.analytics.client_ip_header, peer);

    state
        .relay
        .dispatch(&state.tasks, &admitted, &session.id, ip.as_deref());

    let cookie = session.is_new.then(|| {
        session.set_cookie(
            &state.analytics.cookie_name,
            Utc::now(),
            state.analytics.cookie_max_age_days,
        )
    });
    Ok(no_content(cookie.as_deref())?)
}

async fn serve_asset(state: &AppState, route: RouteKind, path: &str) -> Result<Response<Body>, RouterError> {
    let policy = route.cache_policy().unwrap_or(CachePolicy::DEFAULT);

    match state.assets.lookup(path).await {
        Ok(asset) => {
            let mut headers = policy.headers(true);
            if route == RouteKind::Page {
                headers.extend(state.page_headers.headers(asset.is_html()));
            }
            Ok(asset_response(asset, StatusCode::OK, headers)?)
        }
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Asset lookup failed, serving not-found page");
            let asset = state
                .assets
                .lookup(&state.not_found_path)
                .await
                .map_err(RouterError::NotFoundPage)?;
            Ok(asset_response(asset, StatusCode::NOT_FOUND, HeaderMap::new())?)
        }
    }
}
