#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use portfolio::{config::AppConfig, cookies::CookieKey, routes::routes, AppState};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt as _;

    // The pool connects lazily, so these only cover paths that never reach the database.
    fn app_with(config: AppConfig) -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("Failed to build lazy pool");
        let state = AppState::new(config, pool, CookieKey::generate()).expect("Failed to build state");

        routes(state)
    }

    fn app() -> Router {
        app_with(AppConfig::new("postgres://localhost/portfolio_test"))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request")
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request")
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = app().oneshot(request("GET", "/healthz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_mutations_require_admin_session() {
        let cases = [
            json_request("POST", "/api/projects", r#"{"title":"New"}"#),
            json_request("PUT", "/api/projects/1", r#"{"title":"New"}"#),
            json_request("PATCH", "/api/technologies/1", r#"{"name":"Rust"}"#),
            json_request("PUT", "/api/stats", r#"{"id":1,"label":"Years"}"#),
            request("DELETE", "/api/testimonials/3"),
            request("DELETE", "/api/navlinks?id=2"),
            request("GET", "/api/admin/services"),
            request("GET", "/api/admin/resume"),
        ];

        for req in cases {
            let uri = req.uri().to_string();
            let response = app().oneshot(req).await.unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let body = json_body(response).await;
            assert_eq!(body["error"], "Unauthorized", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_nav_link_listing_requires_session() {
        let response = app()
            .oneshot(request("GET", "/api/navlinks?admin=true"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_requires_admin_session() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                    .body(Body::from("--X--\r\n"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_upload_is_not_found() {
        let response = app()
            .oneshot(request("GET", "/uploads/projects/missing.png"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_pages_redirect_to_login() {
        for uri in ["/admin", "/admin/projects", "/admin/videos/4/edit"] {
            let response = app().oneshot(request("GET", uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/admin/login",
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = app().oneshot(request("GET", "/admin/login")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&bytes);
        assert!(html.contains("type=\"password\""));
    }

    #[tokio::test]
    async fn test_setup_admin_hidden_without_token() {
        let response = app()
            .oneshot(request(
                "GET",
                "/api/setup-admin?email=a@example.com&password=secret",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_setup_admin_checks_token_and_fields() {
        let mut config = AppConfig::new("postgres://localhost/portfolio_test");
        config.admin_setup_token = Some("let-me-in".to_string());

        let response = app_with(config.clone())
            .oneshot(request(
                "GET",
                "/api/setup-admin?email=a@example.com&password=secret&token=wrong",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app_with(config)
            .oneshot(request("GET", "/api/setup-admin?email=a@example.com&token=let-me-in"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_chat_unconfigured() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                r#"{"messages":[{"role":"user","content":"Hi"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Assistant is not configured");
    }

    #[tokio::test]
    async fn test_static_assets() {
        let response = app()
            .oneshot(request("GET", "/static/favicon.svg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );

        let response = app()
            .oneshot(request("GET", "/static/nope.css"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = AppConfig::new("postgres://localhost/portfolio_test");
        config.max_upload_bytes = 16;

        let body = r#"{"messages":[{"role":"user","content":"far more than sixteen bytes"}]}"#;
        let mut req = json_request("POST", "/api/chat", body);
        req.headers_mut()
            .insert(header::CONTENT_LENGTH, body.len().into());

        let response = app_with(config).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
