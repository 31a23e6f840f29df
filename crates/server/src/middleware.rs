//! Request lifecycle for flash messages.
//!
//! `flash_middleware` restores the previous request's messages from a signed cookie,
//! exposes a per-request `FlashStorage` through the [`Flash`] extractor, and
//! after the handler returns sweeps it and writes the promoted messages back.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use flash::{FlashError, FlashKey, FlashMap, FlashMessage, FlashStorage, Passthrough, Translator};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct FlashLayerState {
    pub cookie_name: Arc<str>,
    pub translator: Arc<dyn Translator>,
    /// Signs the flash cookie so clients cannot inject messages.
    pub key: Key,
}

impl FlashLayerState {
    pub fn new(cookie_name: impl Into<Arc<str>>, translator: Arc<dyn Translator>, key: Key) -> Self {
        Self { cookie_name: cookie_name.into(), translator, key }
    }
}

impl Default for FlashLayerState {
    fn default() -> Self {
        Self::new("_flash", Arc::new(Passthrough), Key::generate())
    }
}

impl FromRef<FlashLayerState> for Key {
    fn from_ref(state: &FlashLayerState) -> Self {
        state.key.clone()
    }
}

/// Handle to the current request's flash storage.
#[derive(Clone)]
pub struct Flash(Arc<Mutex<FlashStorage>>);

impl Flash {
    pub async fn lock(&self) -> MutexGuard<'_, FlashStorage> {
        self.0.lock().await
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Flash>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "flash middleware not installed"))
    }
}

fn restore(jar: &SignedCookieJar, name: &str) -> Option<FlashMap> {
    let cookie = jar.get(name)?;
    match serde_json::from_str::<FlashMap>(cookie.value()) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(cookie = %name, error = %e, "discarding malformed flash cookie");
            None
        }
    }
}

fn flash_cookie(name: &str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_string(), value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Middleware: one `FlashStorage` per request, swept once the handler is done.
///
/// Cookies with a missing or bad signature read as absent.
pub async fn flash_middleware(
    State(state): State<FlashLayerState>,
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> (SignedCookieJar, Response) {
    let name = state.cookie_name.as_ref();
    let had_cookie = jar.get(name).is_some();
    let storage = FlashStorage::new(restore(&jar, name)).with_translator(Arc::clone(&state.translator));
    let handle = Arc::new(Mutex::new(storage));
    req.extensions_mut().insert(Flash(Arc::clone(&handle)));

    let response = next.run(req).await;

    let mut storage = handle.lock().await;
    storage.sweep();
    let jar = if storage.is_empty() {
        if had_cookie {
            jar.remove(flash_cookie(name, String::new()))
        } else {
            jar
        }
    } else {
        match serde_json::to_string(storage.now()) {
            Ok(value) => {
                debug!(count = storage.len(), "persisting flash messages");
                jar.add(flash_cookie(name, value))
            }
            Err(e) => {
                error!(error = %e, "failed to encode flash cookie");
                jar
            }
        }
    };
    (jar, response)
}

/// Stage a message and redirect, the usual post/redirect/get step.
pub async fn redirect_with_flash(
    flash: &Flash,
    uri: &str,
    key: FlashKey,
    message: FlashMessage,
) -> Result<Redirect, FlashError> {
    flash.lock().await.set(key, message)?;
    Ok(Redirect::to(uri))
}
