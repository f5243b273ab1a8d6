use crate::JavaPlugin;
use beanscope_plugin::FileMatcherCap;
use std::path::{Component, Path};

impl FileMatcherCap for JavaPlugin {
    fn supports_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("java"))
            .unwrap_or(false)
    }

    fn watch_globs(&self) -> Vec<String> {
        vec!["**/*.java".to_string()]
    }

    fn is_test_source(&self, path: &Path) -> bool {
        let parts: Vec<_> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        parts.windows(2).any(|w| w[0] == "src" && w[1] == "test")
    }
}
