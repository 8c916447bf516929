//! HTTP front end: axum router, file streaming and the serve loop.
//!
//! Every `GET` is handled by [`serve_resource`]:
//!
//! 1. The raw request path (still percent-encoded) goes to
//!    [`ResourcePolicy::resolve`].  The router never decodes it first, so
//!    the policy sees exactly what the client sent.
//! 2. A rejection becomes a fixed-body 403/404/500.
//! 3. Otherwise the file is streamed, whole (200) or one byte range (206).
//!
//! Files are streamed in chunks with [`ReaderStream`]; a large video is never
//! read into memory.

use std::io::SeekFrom;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::application::{ResolvedResource, ResourceError, ResourcePolicy};
use crate::domain::{content_type_for, ByteRange, ResourceServerConfig};

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds the resource router around `policy`.
pub fn router(policy: Arc<ResourcePolicy>) -> Router {
    Router::new()
        .route("/*path", get(serve_resource))
        .fallback(|| async { rejection(&ResourceError::NotFound) })
        .with_state(policy)
}

/// Serves files under `config.root` until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the root does not exist or the listener cannot be
/// bound.
pub async fn run_server(config: ResourceServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let policy = ResourcePolicy::new(&config.root)
        .with_context(|| format!("resource root {} is not usable", config.root.display()))?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind resource server on {}", config.bind_addr))?;

    info!(root = %policy.root().display(), "resource server listening on {}", config.bind_addr);
    serve(listener, policy, running).await
}

/// Like [`run_server`] but on an already bound listener.
///
/// # Errors
///
/// Returns an error if the underlying server fails.
pub async fn serve(
    listener: TcpListener,
    policy: ResourcePolicy,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(Arc::new(policy)))
        .with_graceful_shutdown(wait_for_shutdown(running))
        .await
        .context("resource server failed")?;

    info!("resource server stopped");
    Ok(())
}

// ── Handler ───────────────────────────────────────────────────────────────────

async fn serve_resource(
    State(policy): State<Arc<ResourcePolicy>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let resource = match policy.resolve(uri.path()) {
        Ok(r) => r,
        Err(e) => {
            if let ResourceError::Io(io) = &e {
                error!(request = uri.path(), "resource lookup failed: {io}");
            }
            return rejection(&e);
        }
    };

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| ByteRange::parse(v, resource.len));

    match stream_file(&resource, range).await {
        Ok(response) => response,
        Err(e) => {
            error!(path = %resource.path.display(), "failed to stream resource: {e}");
            rejection(&ResourceError::Io(e))
        }
    }
}

async fn stream_file(
    resource: &ResolvedResource,
    range: Option<ByteRange>,
) -> std::io::Result<Response> {
    let mut file = tokio::fs::File::open(&resource.path).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&resource.path)),
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let (status, len) = match range {
        Some(r) => {
            file.seek(SeekFrom::Start(r.start)).await?;
            let value = HeaderValue::from_str(&r.content_range(resource.len))
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            headers.insert(header::CONTENT_RANGE, value);
            debug!(path = %resource.path.display(), start = r.start, end = r.end, "serving range");
            (StatusCode::PARTIAL_CONTENT, r.len())
        }
        None => (StatusCode::OK, resource.len),
    };
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    let body = Body::from_stream(ReaderStream::new(file.take(len)));
    Ok((status, headers, body).into_response())
}

fn rejection(error: &ResourceError) -> Response {
    let status = StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, error.body()).into_response()
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    info!("shutdown flag set; stopping resource server");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
