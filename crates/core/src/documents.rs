use beanscope_api::uri::uri_to_path;
use beanscope_api::{ApiError, ApiResult, DocumentStore};
use dashmap::DashMap;

/// Reads documents from disk, preferring the text of documents an editor
/// currently has open.
#[derive(Debug, Default)]
pub struct FsDocumentStore {
    open: DashMap<String, String>,
}

impl FsDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, uri: impl Into<String>, text: impl Into<String>) {
        self.open.insert(uri.into(), text.into());
    }

    pub fn close(&self, uri: &str) -> bool {
        self.open.remove(uri).is_some()
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.open.contains_key(uri)
    }
}

impl DocumentStore for FsDocumentStore {
    fn read_content(&self, uri: &str) -> ApiResult<String> {
        if let Some(text) = self.open.get(uri) {
            return Ok(text.clone());
        }
        let path = uri_to_path(uri).ok_or_else(|| ApiError::InvalidArgument(format!("not a file uri: {uri}")))?;
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanscope_api::uri::path_to_uri;

    #[test]
    fn open_documents_shadow_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.java");
        std::fs::write(&path, "disk").unwrap();
        let uri = path_to_uri(&path);

        let store = FsDocumentStore::new();
        assert_eq!(store.read_content(&uri).unwrap(), "disk");
        store.open(uri.clone(), "editor");
        assert_eq!(store.read_content(&uri).unwrap(), "editor");
        assert!(store.close(&uri));
        assert_eq!(store.read_content(&uri).unwrap(), "disk");
    }

    #[test]
    fn missing_file_is_an_error() {
        let store = FsDocumentStore::new();
        assert!(store.read_content("file:///no/such/File.java").is_err());
        assert!(store.read_content("untitled:1").is_err());
    }
}
