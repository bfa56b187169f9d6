use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use tma_backend::config::ServerConfig;
use tma_backend::{build_store, configure_app, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;
    let store = build_store(&config).await.map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState::new(store, config.jwt.clone()));

    let server_address = config.bind_address();
    info!("Server running at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure_app)
    })
    .bind(server_address)?
    .run()
    .await
}
