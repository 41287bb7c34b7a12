//! HTTP surface: the public authorization API and the admin GraphQL API,
//! each on its own listener.
use crate::admin_graphql;
use crate::authz::identity::{IdentityProvider, SessionIdentity};
use crate::authz::web::AuthzWebState;
use crate::authz::Authorizer;
use crate::settings::Settings;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::Router;
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // X-Frame-Options: Prevent clickjacking
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );

    // X-Content-Type-Options: Prevent MIME sniffing
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );

    // JSON API only; nothing to load
    headers.insert(
        HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );

    // Role checks depend on live assignments
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store"),
    );

    response
}

/// The public router with security headers applied.
pub fn app_router(authz: Authorizer, identity: Arc<dyn IdentityProvider>) -> Router {
    crate::authz::web::router(AuthzWebState { authz, identity })
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(
    settings: Settings,
    db: DatabaseConnection,
    authz: Authorizer,
) -> miette::Result<()> {
    let public_addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let admin_addr: SocketAddr = format!("{}:{}", settings.server.host, settings.admin_port())
        .parse()
        .map_err(|e| miette::miette!("bad admin addr: {e}"))?;

    // NOTE: the admin API has no authentication of its own; bind it to a
    // private interface or put it behind the reverse proxy's auth.
    let admin_schema =
        admin_graphql::build_admin_schema(authz.clone(), db.clone(), settings.session.clone());
    let admin_router = admin_graphql::router(admin_schema).layer(TraceLayer::new_for_http());

    let admin_listener = tokio::net::TcpListener::bind(admin_addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%admin_addr, "Admin GraphQL API listening");
    tracing::info!(
        "GraphQL Playground available at http://{}/admin/playground",
        admin_addr
    );

    tokio::spawn(async move {
        if let Err(e) = axum::serve(admin_listener, admin_router).await {
            tracing::error!(error = %e, "Admin server failed");
        }
    });

    let identity: Arc<dyn IdentityProvider> = Arc::new(SessionIdentity::new(db));
    let router = app_router(authz, identity);

    tracing::info!(%public_addr, "Public API listening");
    let listener = tokio::net::TcpListener::bind(public_addr)
        .await
        .into_diagnostic()?;
    axum::serve(listener, router).await.into_diagnostic()?;
    Ok(())
}
