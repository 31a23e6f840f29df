use std::{borrow::{Borrow, Cow}, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{errors::FlashError, i18n::Translator};

/// Insertion-ordered mapping of flash keys to display text.
pub type FlashMap = IndexMap<FlashKey, String>;

/// Identifier of a flash message, e.g. `notice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashKey(Cow<'static, str>);

impl FlashKey {
    pub const ERROR: FlashKey = FlashKey(Cow::Borrowed("error"));
    pub const NOTICE: FlashKey = FlashKey(Cow::Borrowed("notice"));
    pub const SUCCESS: FlashKey = FlashKey(Cow::Borrowed("success"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FlashKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FlashKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FlashKey {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for FlashKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&FlashKey> for FlashKey {
    fn from(key: &FlashKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for FlashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value handed to `FlashStorage::set`.
///
/// `Literal` text is stored as-is; `Localized` holds an identifier that is
/// resolved through the storage's translator before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashMessage {
    Literal(String),
    Localized(String),
}

impl FlashMessage {
    pub fn localized(id: impl Into<String>) -> Self {
        Self::Localized(id.into())
    }

    /// Resolve to display text.
    pub fn resolve(self, translator: &dyn Translator) -> Result<String, FlashError> {
        match self {
            Self::Literal(text) => Ok(text),
            Self::Localized(id) => translator.translate(&id),
        }
    }
}

impl From<&str> for FlashMessage {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl From<String> for FlashMessage {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}
