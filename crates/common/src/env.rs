//! Environment/runtime helpers
//!
//! Sanity checks run once at startup.

use tracing::warn;

/// Check that the configured translation catalog exists.
///
/// Returns `false` (with a warning) when it is missing, so callers can fall
/// back to untranslated identifiers instead of refusing to start.
pub async fn ensure_translations(path: &str) -> anyhow::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(true),
        Ok(_) => Err(anyhow::anyhow!("{path} is not a file")),
        Err(_) => {
            warn!(%path, "flash translations not found; identifiers will be shown untranslated");
            Ok(false)
        }
    }
}
