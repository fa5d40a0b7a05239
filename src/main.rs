use locallibrary::auth::Authenticator;
use locallibrary::config::Config;
use locallibrary::database::Sqlite;
use locallibrary::http::{AppState, HttpServer, HttpServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("locallibrary=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let catalog = Sqlite::new(config.database_url()).await?;
    let auth = Authenticator::new(
        config.jwt_secret(),
        config.api_username(),
        config.api_password_hash(),
        config.token_ttl_secs(),
    )?;

    let state = AppState::new(catalog, auth);
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
