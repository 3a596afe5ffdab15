use std::process::ExitCode;
use std::sync::Arc;

use log::LevelFilter;

use event_notification_common::settings::Settings;
use event_notification_server::{build_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = Settings::new();
    let level = settings
        .as_ref()
        .ok()
        .and_then(|s| s.server.log_level.parse().ok())
        .unwrap_or(LevelFilter::Info);
    init_logger(level);

    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to load settings: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_settings(&settings) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log::error!("Failed to initialize receiver: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let address = (settings.server.bind_address.as_str(), settings.server.port);
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!(
                "Failed to bind {}:{}: {}",
                settings.server.bind_address,
                settings.server.port,
                e
            );
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Listening on {}:{} for {}",
        settings.server.bind_address,
        settings.server.port,
        settings.endpoint.url
    );

    if let Err(e) = axum::serve(listener, build_router(state)).await {
        log::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_logger(level: LevelFilter) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .expect("Failed to initialize logger");
}
