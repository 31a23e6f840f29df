use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use axum_extra::extract::cookie::Key;
use common::utils::logging::{init_logging_default, init_logging_json};
use configs::{AppConfig, FlashConfig, LogFormat};
use flash::{Catalog, Passthrough, Translator};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::errors::StartupError;
use crate::middleware::FlashLayerState;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Install the subscriber selected by `[logging] format` / `LOG_FORMAT`
pub fn init_logging(format: LogFormat) {
    match format {
        LogFormat::Compact => init_logging_default(),
        LogFormat::Json => init_logging_json(),
    }
}

/// Load config.toml, or fall back to defaults plus SERVER_HOST/SERVER_PORT when it is absent
pub fn load_config() -> anyhow::Result<AppConfig> {
    let mut cfg = match configs::load_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            // subscriber is not installed yet
            eprintln!("config file not loaded ({e}); using defaults and env vars");
            let mut cfg = AppConfig::default();
            if let Ok(host) = env::var("SERVER_HOST") {
                cfg.server.host = host;
            }
            if let Some(port) = env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                cfg.server.port = port;
            }
            cfg
        }
    };
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

/// Catalog from the configured file, or pass-through when none is available
pub async fn build_translator(cfg: &FlashConfig) -> Result<Arc<dyn Translator>, StartupError> {
    let Some(path) = cfg.translations.as_deref() else {
        return Ok(Arc::new(Passthrough));
    };
    if !common::env::ensure_translations(path).await? {
        return Ok(Arc::new(Passthrough));
    }
    let mut catalog = Catalog::from_file(cfg.locale.clone(), path)
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    if let Some(fallback) = &cfg.fallback_locale {
        catalog = catalog.with_fallback(fallback.clone());
    }
    info!(%path, locale = %catalog.locale(), "flash translations loaded");
    Ok(Arc::new(catalog))
}

/// Cookie signing key from `flash.secret`, or a per-process random key
pub fn build_key(cfg: &FlashConfig) -> Result<Key, StartupError> {
    match cfg.secret.as_deref() {
        Some(secret) => Key::try_from(secret.as_bytes()).map_err(|e| StartupError::InvalidConfig(e.to_string())),
        None => {
            warn!("flash.secret not set; flash cookies will not survive a restart");
            Ok(Key::generate())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl+C; shutdown only by process exit");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Build the app from `cfg` and serve until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let translator = build_translator(&cfg.flash).await?;
    let key = build_key(&cfg.flash)?;
    let state = FlashLayerState::new(cfg.flash.cookie_name.as_str(), translator, key);

    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, cookie = %cfg.flash.cookie_name, "starting flash server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!(event = "stop", "flash server stopped");
    Ok(())
}
