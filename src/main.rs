use codeseek_core::AppBuilder;
use codeseek_gateway::GatewayServer;
use codeseek_index::spawn_indexer;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let builder = AppBuilder::from_env()?;
    tracing::info!(path = %builder.config_path().display(), "configuration loaded");
    let app = builder.build()?;
    let config = builder.config();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {e:#}");
                return;
            }
            tracing::info!("received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    let indexer = spawn_indexer(app.indexer, shutdown_rx.clone());

    let served = GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        app.search,
        shutdown_rx,
    )
    .with_auth(config.gateway.auth_token.clone())
    .with_max_body_size(config.gateway.max_body_size)
    .serve()
    .await;

    // The gateway may exit on its own (bind failure); stop the indexer either way.
    let _ = shutdown_tx.send(true);
    if let Err(e) = indexer.await {
        tracing::error!("indexer supervisor failed: {e}");
    }

    served?;
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
