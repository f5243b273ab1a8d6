use std::path::Path;

pub trait FileMatcherCap: Send + Sync {
    fn supports_path(&self, path: &Path) -> bool;

    /// Glob patterns a file watcher should subscribe to for this language.
    fn watch_globs(&self) -> Vec<String>;

    /// Whether the path is a test source (e.g. below `src/test/`).
    fn is_test_source(&self, _path: &Path) -> bool {
        false
    }
}
