//! Static file serving under a URL prefix.

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

/// Router serving files from `root` for requests below `prefix`.
///
/// The prefix is stripped before the path is resolved against `root`, so
/// with prefix `/static` a request for `/static/css/site.css` serves
/// `<root>/css/site.css`. Directory requests serve `index.html`; missing
/// files are answered with `404`. A prefix of `""` or `"/"` serves from the
/// router root.
pub fn static_files<S>(prefix: &str, root: impl AsRef<Path>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let serve = ServeDir::new(root.as_ref());
    match normalize_prefix(prefix) {
        Some(prefix) => {
            tracing::debug!(prefix = %prefix, root = %root.as_ref().display(), "serving static files");
            Router::new().nest_service(&prefix, serve)
        }
        None => Router::new().fallback_service(serve),
    }
}

/// `"static/"` → `Some("/static")`, `"/"` → `None`.
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("hello.txt"), "hi").unwrap();
        fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
        dir
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, body.to_vec())
    }

    #[test]
    fn prefixes_are_normalized() {
        assert_eq!(normalize_prefix("/static"), Some("/static".to_string()));
        assert_eq!(normalize_prefix("static/"), Some("/static".to_string()));
        assert_eq!(normalize_prefix("/a/b/"), Some("/a/b".to_string()));
        assert_eq!(normalize_prefix("/"), None);
        assert_eq!(normalize_prefix(""), None);
    }

    #[tokio::test]
    async fn serves_files_below_prefix() {
        let dir = fixture();
        let app = static_files("/assets/", dir.path());

        let (status, body) = get(app, "/assets/hello.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hi");
    }

    #[tokio::test]
    async fn directory_serves_index() {
        let dir = fixture();
        let app = static_files("/assets", dir.path());

        let (status, body) = get(app, "/assets/docs/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>docs</h1>");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = fixture();
        let app = static_files("/assets", dir.path());

        let (status, _) = get(app, "/assets/nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn paths_outside_prefix_are_not_served() {
        let dir = fixture();
        let app = static_files("/assets", dir.path());

        let (status, _) = get(app, "/hello.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn root_prefix_serves_everything() {
        let dir = fixture();
        let app = static_files("/", dir.path());

        let (status, body) = get(app, "/hello.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hi");
    }
}
