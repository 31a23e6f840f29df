use std::process::ExitCode;

use tracing::{error, info};

fn main() -> ExitCode {
    // .env may carry CONFIG_PATH, LOG_FORMAT and FLASH_SECRET
    dotenvy::dotenv().ok();

    let cfg = match server::startup::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    server::startup::init_logging(cfg.logging.format);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = cfg.server.worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(event = "start", pid = std::process::id(), version = env!("CARGO_PKG_VERSION"), "flash server starting");
    match rt.block_on(server::run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(event = "run_failed", error = %e, "server::run returned error");
            ExitCode::FAILURE
        }
    }
}
