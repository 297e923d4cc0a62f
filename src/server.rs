use std::{
    error::Error,
    net::{Ipv4Addr, SocketAddr},
};

use sqlx::postgres::PgPoolOptions;

use crate::{
    config::Config,
    jwt::session_key,
    routes::{routes, Context},
};

/// Connects to storage, applies pending migrations and serves the API until the process exits.
pub async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    log::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations applied");

    let key = session_key(&config.jwt_secret)?;
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));

    log::info!("Listening on {addr}");
    warp::serve(routes(Context::new(pool, key))).run(addr).await;

    Ok(())
}
