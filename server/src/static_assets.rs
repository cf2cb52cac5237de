use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
};
use include_dir::{include_dir, Dir};
use mime_guess::from_path;

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// `GET /static/*path` from the files embedded at build time
pub async fn serve_static_file(Path(path): Path<String>) -> impl IntoResponse {
    let Some(file) = STATIC_DIR.get_file(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime_type = from_path(&path).first_or_octet_stream().to_string();

    (
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        file.contents(),
    )
        .into_response()
}

pub fn asset_url(path: &str) -> String {
    format!("/static/{}", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_assets_exist() {
        for path in ["favicon.svg", "admin.js", "chat.js"] {
            assert!(STATIC_DIR.get_file(path).is_some(), "missing static/{path}");
        }
    }

    #[tokio::test]
    async fn test_unknown_file_is_404() {
        let response = serve_static_file(Path("nope.txt".to_string()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
