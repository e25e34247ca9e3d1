use guardian_service::{ServiceConfig, create_app};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing; `LOG_FORMAT=pretty` for development, JSON otherwise.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guardian_service=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServiceConfig::from_env()?;
    let app = create_app(&config);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        error!(address = %address, error = %e, "Failed to bind");
        e
    })?;

    info!(
        address = %address,
        static_dir = %config.static_dir.display(),
        inventory = %config.inventory_path.display(),
        "First Aid Guardian service listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
