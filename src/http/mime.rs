//! Content-Type inference for file replies

use std::path::Path;

pub const JSON: &str = "application/json; charset=utf-8";
pub const TEXT: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Content-Type for a file, based on its extension (case-insensitive)
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };

    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => JSON,
        "txt" | "md" => TEXT,
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_types() {
        assert_eq!(
            content_type_for(Path::new("views/index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("public/style.css")),
            "text/css; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("public/logo.PNG")), "image/png");
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(content_type_for(Path::new("public/data.bin")), OCTET_STREAM);
        assert_eq!(content_type_for(Path::new("public/LICENSE")), OCTET_STREAM);
    }
}
