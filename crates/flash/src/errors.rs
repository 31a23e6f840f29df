use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlashError {
    #[error("missing translation for `{id}` in locale `{locale}`")]
    MissingTranslation { locale: String, id: String },
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl FlashError {
    pub fn missing(locale: &str, id: &str) -> Self {
        Self::MissingTranslation { locale: locale.to_string(), id: id.to_string() }
    }
}
