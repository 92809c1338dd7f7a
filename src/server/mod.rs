// Server module - hyper HTTP/1.1 server, routing and the transform handlers

pub mod api;
pub mod endpoints;

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::config::ServerConfig;
use crate::engine::{TransformEngine, TransformRequest, TransformResult};
use crate::error::ImageError;
use crate::fetch::ImageSource;
use api::{parse_body, ChangeFormatBody, IntoTransform, ResizeBody, RotateBody, WatermarkBody};
use endpoints::{
    handle_health, handle_not_found, handle_root, transform_response, EndpointResponse,
};

/// Errors that stop the server process
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Shared, read-only state handed to every connection
#[derive(Clone)]
pub struct AppState {
    engine: TransformEngine,
    source: Arc<dyn ImageSource>,
    permits: Arc<Semaphore>,
    started_at: Instant,
    max_body_size: usize,
}

impl AppState {
    pub fn new(
        engine: TransformEngine,
        source: Arc<dyn ImageSource>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            engine,
            source,
            permits: Arc::new(Semaphore::new(config.max_concurrent_transforms.max(1))),
            started_at: Instant::now(),
            max_body_size: config.max_body_size,
        }
    }

    /// Fetch the image, then run the transform on a blocking thread.
    ///
    /// The semaphore permit moves into the blocking task and is released
    /// when it finishes, even if the client has gone away.
    pub async fn transform(
        &self,
        image_url: &str,
        request: TransformRequest,
    ) -> Result<TransformResult, ImageError> {
        request.validate()?;

        let bytes = self.source.fetch(image_url).await?;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ImageError::internal(format!("transform pool closed: {e}")))?;

        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.run(&bytes, &request)
        })
        .await
        .map_err(|e| ImageError::internal(format!("transform worker failed: {e}")))?
    }
}

/// Bind the listening socket described by `config`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let address = config.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind { address, source })
}

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F)
where
    F: Future<Output = ()>,
{
    let state = Arc::new(state);
    tokio::pin!(shutdown);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Server listening");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };
                let state = Arc::clone(&state);
                tokio::spawn(serve_connection(stream, peer, state));
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }
}

async fn serve_connection(stream: tokio::net::TcpStream, peer: SocketAddr, state: Arc<AppState>) {
    let service = service_fn(move |req| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Infallible>(handle(req, &state).await) }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
    }
}

/// Route one request and log its outcome.
pub async fn handle(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = route(req, state).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status,
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    into_hyper_response(response)
}

async fn route(req: Request<Incoming>, state: &AppState) -> EndpointResponse {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => handle_root(),
        (&Method::GET, "/health") => handle_health(state.started_at),
        (&Method::POST, "/change-image-format") => {
            transform_endpoint::<ChangeFormatBody>(req, state).await
        }
        (&Method::POST, "/rotate-image") => transform_endpoint::<RotateBody>(req, state).await,
        (&Method::POST, "/resize-image") => transform_endpoint::<ResizeBody>(req, state).await,
        (&Method::POST, "/add-watermark") => {
            transform_endpoint::<WatermarkBody>(req, state).await
        }
        _ => handle_not_found(),
    }
}

async fn transform_endpoint<T>(req: Request<Incoming>, state: &AppState) -> EndpointResponse
where
    T: IntoTransform + for<'de> serde::Deserialize<'de>,
{
    let outcome = async {
        let body = read_body(req, state.max_body_size).await?;
        let (image_url, request) = parse_body::<T>(&body)?;
        let operation = request.name();

        state.transform(&image_url, request).await.map_err(|e| {
            log_failure(operation, &e);
            e
        })
    }
    .await;

    transform_response(outcome)
}

fn log_failure(operation: &str, error: &ImageError) {
    if error.to_http_status() >= 500 {
        tracing::error!(operation = operation, error_kind = error.kind(), error = %error, "Transform failed");
    } else {
        tracing::warn!(operation = operation, error_kind = error.kind(), error = %error, "Transform rejected");
    }
}

async fn read_body(req: Request<Incoming>, limit: usize) -> Result<Bytes, ImageError> {
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(
            ImageError::invalid_request(format!("request body exceeds {} bytes", limit)),
        ),
        Err(e) => Err(ImageError::invalid_request(format!(
            "failed to read request body: {e}"
        ))),
    }
}

fn into_hyper_response(endpoint: EndpointResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(endpoint.body)));
    *response.status_mut() =
        StatusCode::from_u16(endpoint.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(endpoint.content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::watermark::WatermarkFont;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn fetch(&self, _url: &str) -> Result<Bytes, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ImageError::transport("unreachable in tests"))
        }
    }

    fn state(source: Arc<dyn ImageSource>) -> AppState {
        let engine = TransformEngine::new(
            Arc::new(WatermarkFont::embedded().unwrap()),
            &ImageConfig::default(),
        );
        AppState::new(engine, source, &ServerConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_request_skips_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let state = state(source.clone());

        let err = state
            .transform(
                "http://img.test/a.png",
                TransformRequest::Resize {
                    max_width: 0,
                    max_height: 0,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ImageError::InvalidRequest { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let state = state(source.clone());

        let err = state
            .transform("http://img.test/a.png", TransformRequest::Rotate { angle: 90 })
            .await
            .unwrap_err();

        assert!(matches!(err, ImageError::Transport { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        // The permit was never taken
        assert_eq!(
            state.permits.available_permits(),
            ServerConfig::default().max_concurrent_transforms
        );
    }

    #[test]
    fn test_into_hyper_response_sets_status_and_content_type() {
        let response = into_hyper_response(handle_not_found());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
