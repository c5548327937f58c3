//! Security headers middleware.
//!
//! Every response carries:
//! - Content-Security-Policy
//! - X-Content-Type-Options
//! - X-Frame-Options

use axum::http::HeaderValue;
use axum::http::header::HeaderName;
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::set_header::SetResponseHeaderLayer;

/// Content-Security-Policy header value.
///
/// The API only serves JSON and export images; nothing may be framed or
/// scripted from it.
const CSP: &str = "default-src 'none'; \
                   img-src 'self' data:; \
                   frame-ancestors 'none'";

type HeaderLayer = SetResponseHeaderLayer<HeaderValue>;

/// All security header layers, outermost first.
pub(crate) type SecurityLayers =
    Stack<HeaderLayer, Stack<HeaderLayer, Stack<HeaderLayer, Identity>>>;

pub(crate) fn layers() -> ServiceBuilder<SecurityLayers> {
    ServiceBuilder::new()
        .layer(csp_layer())
        .layer(content_type_options_layer())
        .layer(frame_options_layer())
}

fn csp_layer() -> HeaderLayer {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static(CSP),
    )
}

fn content_type_options_layer() -> HeaderLayer {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

fn frame_options_layer() -> HeaderLayer {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    )
}
