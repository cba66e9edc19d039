use std::io;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use nearbite::config::Config;
use nearbite::logging;
use nearbite::server::{self, AppState};

fn rate_limit_error(scope: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid {scope} rate limit"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = logging::setup_logging(config.log_level) {
        eprintln!("Failed to set up logging: {}", e);
        return Ok(());
    }

    config.log_summary();

    let client = config
        .http_client()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let state = web::Data::new(AppState::new(
        client.clone(),
        config.google_api_key.clone(),
        config.cache_ttl,
        config.nearby_search(client),
    ));

    // Built once so every worker shares the same limiter state.
    let global_limit = GovernorConfigBuilder::default()
        .per_millisecond(server::GLOBAL_REPLENISH_MS)
        .burst_size(server::GLOBAL_BURST)
        .finish()
        .ok_or_else(|| rate_limit_error("global"))?;
    let places_limit = GovernorConfigBuilder::default()
        .per_millisecond(server::PLACES_REPLENISH_MS)
        .burst_size(server::PLACES_BURST)
        .finish()
        .ok_or_else(|| rate_limit_error("places"))?;

    let bind = (config.bind_address.clone(), config.port);
    info!("Starting nearbite server on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Governor::new(&global_limit))
            .app_data(state.clone())
            .configure(server::configure)
            .service(server::places_scope().wrap(Governor::new(&places_limit)))
            .default_service(web::to(server::not_found))
    })
    .bind(bind)?
    .run()
    .await
}
