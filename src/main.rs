use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enquiry_service::{config::AppConfig, create_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, override with RUST_LOG.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "enquiry_service=info,tower_http=info,sqlx=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().await?;

    sqlx::migrate!().run(&config.database_pool).await?;
    tracing::info!("Database migrations applied");

    let addr = config.server_address();
    let app = create_app(config);

    tracing::info!("Starting enquiry service on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
