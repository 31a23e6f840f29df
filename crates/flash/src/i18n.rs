//! Localisation of symbolic flash messages.
//!
//! `FlashStorage::set` resolves `FlashMessage::Localized` identifiers through a
//! [`Translator`]. Storage built without one uses [`Passthrough`], which returns
//! the identifier unchanged.

use std::{collections::HashMap, path::Path};

use tracing::debug;

use crate::errors::FlashError;

pub trait Translator: Send + Sync {
    fn translate(&self, id: &str) -> Result<String, FlashError>;
}

impl<F> Translator for F
where
    F: Fn(&str) -> Result<String, FlashError> + Send + Sync,
{
    fn translate(&self, id: &str) -> Result<String, FlashError> {
        self(id)
    }
}

/// Returns the identifier itself as display text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Translator for Passthrough {
    fn translate(&self, id: &str) -> Result<String, FlashError> {
        Ok(id.to_string())
    }
}

/// Locale-keyed message table.
///
/// Catalog files are TOML with one table per locale. Nested tables are
/// flattened into dotted identifiers:
///
/// ```toml
/// [en]
/// redirected = "Redirected"
///
/// [en.login]
/// failed = "Invalid login/password combination"
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    locale: String,
    fallback: Option<String>,
    messages: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into(), fallback: None, messages: HashMap::new() }
    }

    pub fn with_fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback = Some(locale.into());
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn insert(&mut self, locale: &str, id: impl Into<String>, text: impl Into<String>) {
        self.messages.entry(locale.to_string()).or_default().insert(id.into(), text.into());
    }

    /// Parse a TOML catalog and add its entries, replacing existing ones.
    pub fn load_toml_str(&mut self, src: &str) -> Result<(), FlashError> {
        let table: toml::Table = toml::from_str(src).map_err(|e| FlashError::Catalog(e.to_string()))?;
        for (locale, value) in table {
            let toml::Value::Table(entries) = value else {
                return Err(FlashError::Catalog(format!("locale `{locale}` must be a table")));
            };
            let target = self.messages.entry(locale.clone()).or_default();
            flatten_into(target, "", entries)?;
            debug!(%locale, count = target.len(), "loaded flash translations");
        }
        Ok(())
    }

    pub fn from_toml_str(locale: impl Into<String>, src: &str) -> Result<Self, FlashError> {
        let mut catalog = Self::new(locale);
        catalog.load_toml_str(src)?;
        Ok(catalog)
    }

    pub fn from_file(locale: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, FlashError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|e| FlashError::Catalog(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(locale, &src)
    }

    fn lookup(&self, locale: &str, id: &str) -> Option<&String> {
        self.messages.get(locale).and_then(|m| m.get(id))
    }
}

fn flatten_into(target: &mut HashMap<String, String>, prefix: &str, table: toml::Table) -> Result<(), FlashError> {
    for (key, value) in table {
        let id = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
        match value {
            toml::Value::String(text) => {
                target.insert(id, text);
            }
            toml::Value::Table(nested) => flatten_into(target, &id, nested)?,
            other => {
                return Err(FlashError::Catalog(format!("`{id}` must be a string, found {}", other.type_str())));
            }
        }
    }
    Ok(())
}

impl Translator for Catalog {
    fn translate(&self, id: &str) -> Result<String, FlashError> {
        if let Some(text) = self.lookup(&self.locale, id) {
            return Ok(text.clone());
        }
        if let Some(text) = self.fallback.as_deref().and_then(|fb| self.lookup(fb, id)) {
            return Ok(text.clone());
        }
        Err(FlashError::missing(&self.locale, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [en]
        redirected = "Redirected"

        [en.login]
        failed = "Invalid login/password combination"

        [de]
        redirected = "Weitergeleitet"
    "#;

    #[test]
    fn passthrough_returns_identifier() {
        assert_eq!(Passthrough.translate("redirected").unwrap(), "redirected");
    }

    #[test]
    fn catalog_resolves_flat_and_nested_ids() -> Result<(), anyhow::Error> {
        let catalog = Catalog::from_toml_str("en", CATALOG)?;
        assert_eq!(catalog.translate("redirected")?, "Redirected");
        assert_eq!(catalog.translate("login.failed")?, "Invalid login/password combination");
        Ok(())
    }

    #[test]
    fn catalog_falls_back_to_fallback_locale() -> Result<(), anyhow::Error> {
        let catalog = Catalog::from_toml_str("de", CATALOG)?.with_fallback("en");
        assert_eq!(catalog.locale(), "de");
        assert_eq!(catalog.translate("redirected")?, "Weitergeleitet");
        assert_eq!(catalog.translate("login.failed")?, "Invalid login/password combination");
        Ok(())
    }

    #[test]
    fn catalog_reports_missing_id() -> Result<(), anyhow::Error> {
        let catalog = Catalog::from_toml_str("de", CATALOG)?;
        let err = catalog.translate("login.failed").unwrap_err();
        assert_eq!(err, FlashError::missing("de", "login.failed"));
        Ok(())
    }

    #[test]
    fn catalog_rejects_non_string_values() {
        let err = Catalog::from_toml_str("en", "[en]\ncount = 3\n").unwrap_err();
        assert!(matches!(err, FlashError::Catalog(msg) if msg.contains("en") || msg.contains("count")));
    }

    #[test]
    fn closures_are_translators() {
        let upper = |id: &str| -> Result<String, FlashError> { Ok(id.to_uppercase()) };
        assert_eq!(upper.translate("ok").unwrap(), "OK");
    }
}
