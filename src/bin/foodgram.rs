use foodgram_sdk::{serve, Config};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Environment misconfigured: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(config).await {
        log::error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
