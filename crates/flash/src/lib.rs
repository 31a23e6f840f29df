//! Session-scoped flash messages.
//! - `FlashStorage` keeps two generations: messages visible now, and messages staged for the next request.
//! - `sweep` promotes the staged generation; the framework calls it once per request.
//! - Symbolic messages are resolved through an injected `Translator`.

pub mod errors;
pub mod i18n;
pub mod storage;
pub mod types;

pub use errors::FlashError;
pub use i18n::{Catalog, Passthrough, Translator};
pub use storage::FlashStorage;
pub use types::{FlashKey, FlashMap, FlashMessage};
