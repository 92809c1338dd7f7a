//! Response generators for the service endpoints.
//!
//! Functions return [`EndpointResponse`] instead of building hyper responses
//! directly, which keeps them testable without a connection. The server loop
//! converts them in one place.

use std::time::Instant;

use crate::engine::TransformResult;
use crate::error::ImageError;

/// Response from an endpoint handler.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl EndpointResponse {
    /// Create a JSON response with the given status and body.
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn from_value(status: u16, value: serde_json::Value) -> Self {
        Self::json(status, value.to_string())
    }
}

/// `GET /`
pub fn handle_root() -> EndpointResponse {
    EndpointResponse::from_value(
        200,
        serde_json::json!({ "message": "Image Processing Server is running" }),
    )
}

/// `GET /health`, with uptime and version information.
pub fn handle_health(start_time: Instant) -> EndpointResponse {
    let uptime_seconds = start_time.elapsed().as_secs();
    let version = env!("CARGO_PKG_VERSION");

    EndpointResponse::from_value(
        200,
        serde_json::json!({
            "status": "healthy",
            "uptime_seconds": uptime_seconds,
            "version": version,
        }),
    )
}

pub fn handle_not_found() -> EndpointResponse {
    EndpointResponse::from_value(404, serde_json::json!({ "error": "Not Found" }))
}

/// Envelope for a finished transform: 200 on success, the error's status otherwise.
pub fn transform_response(outcome: Result<TransformResult, ImageError>) -> EndpointResponse {
    let (status, result) = match outcome {
        Ok(result) => (200, result),
        Err(error) => (error.to_http_status(), TransformResult::from_error(&error)),
    };

    match serde_json::to_string(&result) {
        Ok(body) => EndpointResponse::json(status, body),
        Err(e) => EndpointResponse::from_value(
            500,
            serde_json::json!({
                "success": false,
                "message": format!("Internal server error: {e}"),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(response: &EndpointResponse) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_root() {
        let response = handle_root();
        assert_eq!(response.status, 200);
        assert_eq!(
            body_json(&response)["message"],
            "Image Processing Server is running"
        );
    }

    #[test]
    fn test_health_has_status_uptime_version() {
        let response = handle_health(Instant::now());
        let json = body_json(&response);

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(json["status"], "healthy");
        assert!(json["uptime_seconds"].is_u64());
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_not_found() {
        let response = handle_not_found();
        assert_eq!(response.status, 404);
        assert_eq!(body_json(&response), serde_json::json!({"error": "Not Found"}));
    }

    #[test]
    fn test_transform_error_statuses() {
        let response = transform_response(Err(ImageError::transport("timed out")));
        assert_eq!(response.status, 400);
        assert_eq!(
            body_json(&response)["message"],
            "Failed to download image: timed out"
        );

        let response = transform_response(Err(ImageError::internal("worker panicked")));
        assert_eq!(response.status, 500);
        assert_eq!(
            body_json(&response)["message"],
            "Internal server error: worker panicked"
        );
        assert!(body_json(&response).get("image_data").is_none());
    }

    #[test]
    fn test_transform_success() {
        let response = transform_response(Ok(TransformResult::success(
            "ok",
            &[1, 2, 3],
            (2, 2),
            (1, 1),
        )));
        assert_eq!(response.status, 200);
        assert_eq!(body_json(&response)["success"], true);
    }
}
