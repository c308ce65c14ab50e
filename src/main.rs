use std::env;
use std::sync::Arc;

use actix_web::{web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use chat_relay::upstream::{CompletionBackend, MistralClient};
use chat_relay::web::{routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting chat relay");

    let upstream: Arc<dyn CompletionBackend> = match MistralClient::from_env() {
        Ok(client) => {
            info!("Upstream completion client initialized");
            Arc::new(client)
        }
        Err(e) => {
            error!("Failed to initialize upstream client: {:#}", e);
            std::process::exit(1);
        }
    };

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3001);

    let state = Data::new(AppState { upstream });

    info!("Listening on {}:{}", host, port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
