//! Conversions between file-system paths and `file://` document URIs.

use std::path::{Path, PathBuf};
use url::Url;

/// Convert a path into a `file://` URI. Relative paths are kept verbatim.
pub fn path_to_uri(path: &Path) -> String {
    match Url::from_file_path(path) {
        Ok(url) => url.to_string(),
        Err(_) => format!("file://{}", path.display()),
    }
}

/// Convert a `file://` URI back into a path. Non-file URIs yield `None`.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_round_trip_absolute_path() {
        let path = Path::new("/work/demo/src/main/java/org/test/MainClass.java");
        let uri = path_to_uri(path);
        assert_eq!(uri, "file:///work/demo/src/main/java/org/test/MainClass.java");
        assert_eq!(uri_to_path(&uri).as_deref(), Some(path));
    }

    #[test]
    fn test_non_file_uri() {
        assert!(uri_to_path("untitled:Untitled-1").is_none());
        assert!(uri_to_path("not a uri").is_none());
    }
}
