use std::sync::Arc;

use clap::Parser;

use courier::config::{load_settings, ProcessEnv};
use courier::mail::SmtpTransportFactory;
use courier::Dispatcher;

mod config;
mod controllers;
mod error;
mod filters;
mod http;
mod routes;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let arg = config::HttpArg::parse();

    let settings = match load_settings(arg.config.as_deref()) {
        Ok(settings) => arg.apply(settings),
        Err(e) => {
            log::error!("Failed to load settings: {:?}", e);
            std::process::exit(1);
        }
    };

    // Credentials are read from the environment on every request, not here
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(ProcessEnv),
        Arc::new(SmtpTransportFactory::new(settings.relay_timeout())),
        &settings,
    ));

    log::info!("Starting server...");

    if let Err(e) = http::run(&settings, dispatcher).await {
        log::error!("Server stopped: {:?}", e);
        std::process::exit(1);
    }
}
