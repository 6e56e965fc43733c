use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod middleware;
mod routing;
mod server;

const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // First argument is the config file path without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    // `.env` feeds MESSAGE_STYLE and SERVER__* before the config is built
    config::load_env_file(None)?;
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Handlers run to completion on one thread; only file reads and sockets await
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let router = handler::app::build_router(&cfg);
    let state = Arc::new(config::AppState::new(cfg, router));

    logger::log_server_start(&addr, &state.config);

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_server_loop(listener, state))
        .await
}
