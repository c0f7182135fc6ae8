mod announce;
mod api;
mod app;
mod dispatch;
mod display;
mod events;
mod poller;
mod sequencer;
mod settings;
mod speech;
mod store;
mod stream;

fn main() {
    env_logger::init();

    let settings = settings::load();
    log::info!(
        "[antri] starting: server={} role={} audio={}",
        settings.server_url,
        settings.role,
        settings.audio_enabled
    );

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    runtime.block_on(async {
        let mut app = match app::App::create(settings) {
            Ok(app) => app,
            Err(e) => {
                log::error!("[antri] startup failed: {}", e);
                return;
            }
        };
        app.start();
        log::info!("[antri] running, press Ctrl+C to stop");

        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("[antri] signal handler failed: {}", e);
        }
        log::info!("[antri] shutting down");
        app.dispose();
    });
}
