use std::fmt::Debug;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use color_eyre::{eyre::eyre, Report};
use serde_json::json;

#[derive(Debug)]
pub struct ServerError<R: IntoResponse>(pub(crate) Report, pub(crate) R);

pub type ServerResult<S, F = Response> = Result<S, ServerError<F>>;

impl<R: IntoResponse> IntoResponse for ServerError<R> {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = ?self.0, "Request Error");

        // Check if we're in development mode and this is a 500 error
        let is_dev_mode = std::env::var("DEVELOPMENT_MODE")
            .map(|v| v == "1")
            .unwrap_or(false);

        if is_dev_mode {
            let temp_response = self.1.into_response();
            if temp_response.status() == StatusCode::INTERNAL_SERVER_ERROR {
                let error_text = escape_html(&format!("{:?}", self.0));

                let error_html = format!(
                    r#"<!DOCTYPE html>
<html>
<head>
    <title>Development Error - 500</title>
    <style>
        body {{ font-family: monospace; margin: 20px; background: #1a1a1a; color: #fff; }}
        .error-container {{ background: #2d2d2d; padding: 20px; border-radius: 8px; }}
        .error-title {{ color: #ff6b6b; font-size: 24px; margin-bottom: 20px; }}
        .error-details {{ background: #000; padding: 15px; border-radius: 4px; overflow-x: auto; }}
        pre {{ margin: 0; white-space: pre-wrap; word-wrap: break-word; }}
    </style>
</head>
<body>
    <div class="error-container">
        <div class="error-title">Development Mode - Internal Server Error</div>
        <div class="error-details">
            <pre>{}</pre>
        </div>
    </div>
</body>
</html>"#,
                    error_text
                );

                return (StatusCode::INTERNAL_SERVER_ERROR, Html(error_html)).into_response();
            }
            return temp_response;
        }

        self.1.into_response()
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

impl<E> From<E> for ServerError<StatusCode>
where
    E: Into<Report>,
{
    fn from(err: E) -> Self {
        ServerError(err.into(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// A JSON error body: `{"error": "<message>"}` with a status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ApiError> for ServerError<ApiError> {
    fn from(err: ApiError) -> Self {
        ServerError(eyre!("{} ({})", err.message, err.status), err)
    }
}

pub(crate) trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError<StatusCode>>;
}

impl<T> WithStatus<T> for Result<T, Report> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError<StatusCode>> {
        match self {
            Ok(val) => Ok(val),
            Err(err) => Err(ServerError(err, status)),
        }
    }
}

pub(crate) trait WithApiError<T> {
    fn with_api_error(
        self,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Result<T, ServerError<ApiError>>;
}

impl<T> WithApiError<T> for Result<T, Report> {
    fn with_api_error(
        self,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Result<T, ServerError<ApiError>> {
        match self {
            Ok(val) => Ok(val),
            Err(err) => Err(ServerError(err, ApiError::new(status, message))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_with_api_error_keeps_message() {
        let result: Result<(), Report> = Err(eyre!("database exploded"));
        let err = result
            .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch projects")
            .unwrap_err();

        assert_eq!(err.1.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.1.message, "Failed to fetch projects");
    }

    #[test]
    fn test_api_error_response_status() {
        let response = ApiError::not_found("Project not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
