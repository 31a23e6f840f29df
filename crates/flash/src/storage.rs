use std::{fmt, mem, sync::Arc};

use tracing::{debug, trace};

use crate::{
    errors::FlashError,
    i18n::{Passthrough, Translator},
    types::{FlashKey, FlashMap, FlashMessage},
};

/// Two-generation flash message store for a single request.
///
/// Reads (`get`, `contains_key`, `iter`, `keys`) see the messages left by the
/// previous request. Writes through `set` are staged for the next request and
/// stay invisible until `sweep` promotes them.
pub struct FlashStorage {
    now: FlashMap,
    next: FlashMap,
    translator: Arc<dyn Translator>,
}

impl FlashStorage {
    /// Wrap the mapping restored from the session, if any.
    pub fn new(session: Option<FlashMap>) -> Self {
        Self { now: session.unwrap_or_default(), next: FlashMap::new(), translator: Arc::new(Passthrough) }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.now.get(key).map(String::as_str)
    }

    /// Stage a message for the next request.
    pub fn set(&mut self, key: impl Into<FlashKey>, message: impl Into<FlashMessage>) -> Result<(), FlashError> {
        let key = key.into();
        let message: FlashMessage = message.into();
        let text = message.resolve(self.translator.as_ref())?;
        trace!(%key, "flash staged");
        self.next.insert(key, text);
        Ok(())
    }

    /// Remove a current message, returning it.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.now.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FlashKey> + '_ {
        self.now.keys()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.now.contains_key(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, FlashKey, String> {
        self.now.iter()
    }

    pub fn replace<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FlashKey>,
        V: Into<String>,
    {
        self.now = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn update<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FlashKey>,
        V: Into<String>,
    {
        self.now.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn merge<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FlashKey>,
        V: Into<String>,
    {
        self.update(entries)
    }

    /// Promote staged messages to current and start an empty next generation.
    pub fn sweep(&mut self) -> &mut Self {
        let dropped = self.now.len();
        self.now = mem::take(&mut self.next);
        debug!(dropped, visible = self.now.len(), "flash swept");
        self
    }

    /// Carry one current message over to the next request.
    ///
    /// Keys that are not current are ignored.
    pub fn keep(&mut self, key: &str) {
        if let Some((k, v)) = self.now.get_key_value(key) {
            trace!(key = %k, "flash kept");
            self.next.insert(k.clone(), v.clone());
        }
    }

    /// Carry every current message over to the next request.
    pub fn keep_all(&mut self) {
        trace!(count = self.now.len(), "flash kept");
        self.next.extend(self.now.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Cancel a staged message.
    pub fn discard(&mut self, key: &str) {
        if self.next.shift_remove(key).is_some() {
            trace!(%key, "flash discarded");
        }
    }

    /// Cancel every staged message.
    pub fn discard_all(&mut self) {
        trace!(count = self.next.len(), "flash discarded");
        self.next.clear();
    }

    pub fn clear(&mut self) {
        self.now.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.now.is_empty()
    }

    pub fn len(&self) -> usize {
        self.now.len()
    }

    /// Snapshot of the current messages, detached from the storage.
    pub fn to_map(&self) -> FlashMap {
        self.now.clone()
    }

    pub fn now(&self) -> &FlashMap {
        &self.now
    }

    /// Direct access to the current generation, for messages meant for this request only.
    pub fn now_mut(&mut self) -> &mut FlashMap {
        &mut self.now
    }

    pub fn next(&self) -> &FlashMap {
        &self.next
    }

    /// Hand the staged generation to the session layer without sweeping.
    pub fn into_next(self) -> FlashMap {
        self.next
    }

    pub fn error(&self) -> Option<&str> {
        self.get(FlashKey::ERROR.as_str())
    }

    pub fn set_error(&mut self, message: impl Into<FlashMessage>) -> Result<(), FlashError> {
        self.set(FlashKey::ERROR, message)
    }

    pub fn notice(&self) -> Option<&str> {
        self.get(FlashKey::NOTICE.as_str())
    }

    pub fn set_notice(&mut self, message: impl Into<FlashMessage>) -> Result<(), FlashError> {
        self.set(FlashKey::NOTICE, message)
    }

    pub fn success(&self) -> Option<&str> {
        self.get(FlashKey::SUCCESS.as_str())
    }

    pub fn set_success(&mut self, message: impl Into<FlashMessage>) -> Result<(), FlashError> {
        self.set(FlashKey::SUCCESS, message)
    }
}

impl Default for FlashStorage {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<'a> IntoIterator for &'a FlashStorage {
    type Item = (&'a FlashKey, &'a String);
    type IntoIter = indexmap::map::Iter<'a, FlashKey, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.now.iter()
    }
}

impl fmt::Display for FlashStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, text)) in self.now.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {text:?}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for FlashStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashStorage").field("now", &self.now).field("next", &self.next).finish_non_exhaustive()
    }
}
