mod app;
mod poller;
mod reconcile;
mod theme;
mod widgets;

use std::time::Duration;

use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = kiosk_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("kiosk.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("kiosk log: {}", log_path.display());

    tracing::info!("kiosk display starting…");

    let config = kiosk_proto::config::Config::load().unwrap_or_default();

    let (tx, rx) = mpsc::channel::<app::AppMessage>(64);

    let poll_interval = Duration::from_secs(config.display.poll_interval_secs.max(1));
    let (force_tx, _poll_handle) =
        poller::spawn(config.display.server_url.clone(), poll_interval, tx.clone());

    app::spawn_render_tick(tx.clone());
    app::spawn_input_thread(tx);

    let app = app::App::new(config.display.kiosk, force_tx);
    app.run(rx).await
}
