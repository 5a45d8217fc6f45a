use std::net::SocketAddr;
use std::sync::Arc;

use courier::config::Settings;
use courier::Dispatcher;

use super::routes;

pub async fn run(settings: &Settings, dispatcher: Arc<Dispatcher>) -> Result<(), courier::Error> {
    let addr: SocketAddr = format!("{}:{}", settings.bind, settings.port)
        .parse()
        .map_err(|e| courier::Error::Unknown(format!("Invalid bind address: {}", e)))?;

    log::info!("Starting HTTP server at {}...", addr);

    let router = routes::router(dispatcher, settings.max_body_bytes);

    warp::serve(router).run(addr).await;

    Ok(())
}
