mod config;
mod editor;
mod errors;
mod identity;
mod services;
mod storage;

use crate::config::ServerConfig;
use crate::storage::SqliteStore;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let store = SqliteStore::open(&config.database_path).map_err(io::Error::other)?;
    info!("Using database {}", store.path().display());

    let json_limit = config.json_limit_bytes;
    info!("Server running at {}", config.url());

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(web::Data::new(store.clone()))
            .service(services::emails::configure_routes())
            .service(services::templates::configure_routes())
            .service(services::section_templates::configure_routes())
            .service(services::stats::configure_routes())
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
