use crate::JavaPlugin;
use beanscope_api::models::{Language, TextDocument};
use beanscope_plugin::{BoxError, LanguageParseCap, ParsedUnit};
use std::sync::Arc;

impl LanguageParseCap for JavaPlugin {
    fn parse_document(&self, document: &TextDocument) -> Result<ParsedUnit, BoxError> {
        let tree = self.parser.parse(&document.uri, &document.text)?;
        let unit = ParsedUnit::new(
            document.uri.clone(),
            document.version,
            Language::JAVA,
            Arc::from(document.text.as_str()),
            tree,
        );
        let info = self.parser.file_info(&unit);
        tracing::trace!(
            "Parsed {}: {} imports, {} annotation uses",
            document.uri,
            info.imports.len(),
            info.annotations.len()
        );
        Ok(unit.with_extension(info))
    }
}
