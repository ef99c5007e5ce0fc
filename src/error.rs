//! Top-level request failure.
//!
//! Anything that escapes the dispatcher ends up here and is answered with a
//! fixed 500 response. The cause is logged, never sent to the client.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::assets::AssetError;
use crate::http::response::internal_error;
use crate::proxy::ProxyError;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("not-found page unavailable: {0}")]
    NotFoundPage(AssetError),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        internal_error().into_response()
    }
}
