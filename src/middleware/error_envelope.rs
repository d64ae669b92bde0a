use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::errors::ErrorEnvelope;

const MAX_ERROR_BODY: usize = 64 * 1024;

/// Rewrites every 4xx/5xx response into the JSON error envelope, adding the
/// request path and method. Errors raised outside our handlers (unknown
/// routes, extractor rejections) are wrapped as `HTTP_EXCEPTION`.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let known = response.extensions().get::<ErrorEnvelope>().cloned();
    let envelope = match known {
        Some(envelope) => envelope,
        None => {
            let message = match axum::body::to_bytes(response.into_body(), MAX_ERROR_BODY).await {
                Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
                _ => status.canonical_reason().unwrap_or("Request failed").to_string(),
            };
            ErrorEnvelope {
                status,
                kind: "HTTP_EXCEPTION",
                message,
            }
        }
    };

    tracing::warn!("{} {} - {} - {}", method, path, status.as_u16(), envelope.message);
    (status, Json(envelope.to_json(Some(&path), Some(&method)))).into_response()
}
