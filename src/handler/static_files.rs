//! Static file serving module
//!
//! `ServeDir` maps a mounted request path to a file under its root without
//! touching the disk; the bytes are read by `load_file` once the chain is done.

use hyper::Method;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::HandlerResult;
use crate::http::mime;
use crate::logger;
use crate::middleware::{send_file, Handler, Next, RequestContext};
use crate::routing::{decode_or_raw, Prefix};

const INDEX_FILE: &str = "index.html";

/// Serve files from `root` for requests under `prefix`
pub struct ServeDir {
    prefix: Prefix,
    root: PathBuf,
}

impl ServeDir {
    pub fn new(prefix: &str, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: Prefix::compile(prefix),
            root: root.into(),
        }
    }

    /// File path for a request path
    ///
    /// `None` if the path is outside the prefix or escapes the root.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = self.prefix.strip(request_path)?;

        let mut file_path = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            let segment = decode_or_raw(segment);
            if segment == "." || segment == ".." || segment.contains(['/', '\\', '\0']) {
                return None;
            }
            file_path.push(segment);
        }

        if relative.is_empty() || relative.ends_with('/') {
            file_path.push(INDEX_FILE);
        }
        Some(file_path)
    }
}

impl Handler for ServeDir {
    fn call(&self, ctx: &mut RequestContext, next: &mut Next) -> HandlerResult {
        if ctx.method != Method::GET && ctx.method != Method::HEAD {
            next.advance();
            return Ok(());
        }

        match self.resolve(&ctx.path) {
            Some(file_path) => send_file(ctx, file_path),
            None => {
                logger::log_warning(&format!(
                    "Not serving {} from {}",
                    ctx.path,
                    self.root.display()
                ));
                next.advance();
            }
        }
        Ok(())
    }
}

/// Read a file reply, with its content type
///
/// `None` when the file is missing, is a directory, or cannot be read.
pub async fn load_file(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    match fs::read(path).await {
        Ok(content) => Some((content, mime::content_type_for(path))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            logger::log_debug(&format!("File not found: {}", path.display()));
            None
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read file '{}': {e}", path.display()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::middleware::{chain, Outcome, Reply};
    use std::sync::Arc;

    fn serve(method: Method, path: &str) -> Outcome {
        let dir = ServeDir::new("/public", "assets");
        let mut ctx = RequestContext::new(method, path, None, Arc::new(AppConfig::default()));
        chain::run(&[&dir], &mut ctx)
    }

    #[test]
    fn test_maps_into_root() {
        match serve(Method::GET, "/public/css/style.css") {
            Outcome::Completed(Reply::File(path)) => {
                assert_eq!(path, Path::new("assets").join("css").join("style.css"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_directory_gets_index() {
        match serve(Method::GET, "/public/") {
            Outcome::Completed(Reply::File(path)) => {
                assert_eq!(path, Path::new("assets").join(INDEX_FILE));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_traversal_is_not_served() {
        assert!(matches!(
            serve(Method::GET, "/public/../Cargo.toml"),
            Outcome::Exhausted
        ));
        assert!(matches!(
            serve(Method::GET, "/public/%2E%2E/secret"),
            Outcome::Exhausted
        ));
        assert!(matches!(
            serve(Method::GET, "/public/a%2Fb"),
            Outcome::Exhausted
        ));
    }

    #[test]
    fn test_encoded_prefix_is_served() {
        match serve(Method::GET, "/%70ublic/style.css") {
            Outcome::Completed(Reply::File(path)) => {
                assert_eq!(path, Path::new("assets").join("style.css"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_path_outside_prefix_passes_through() {
        assert!(matches!(serve(Method::GET, "/private/key.pem"), Outcome::Exhausted));
    }

    #[test]
    fn test_other_methods_pass_through() {
        assert!(matches!(
            serve(Method::POST, "/public/style.css"),
            Outcome::Exhausted
        ));
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.css");
        std::fs::write(&path, "body { margin: 0 }").unwrap();

        let (content, content_type) = load_file(&path).await.unwrap();
        assert_eq!(content, b"body { margin: 0 }");
        assert_eq!(content_type, "text/css; charset=utf-8");

        assert!(load_file(&dir.path().join("missing.css")).await.is_none());
        assert!(load_file(dir.path()).await.is_none());
    }
}
