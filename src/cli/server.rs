use std::sync::Arc;
use tracing::{info, warn};

use crate::account::CredentialHasher;
use crate::config::ServiceConfig;
use crate::rpc::RpcServer;
use crate::storage::{MemoryCollection, SledCollection, UserCollection};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

pub async fn run_server(
    mut config: ServiceConfig,
    port: Option<u16>,
    in_memory: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.rpc.port = port;
    }

    let hasher = Arc::new(CredentialHasher::new(&config.hashing)?);

    if in_memory {
        warn!("Using in-memory store, accounts will not survive a restart");
        let store: Arc<dyn UserCollection> = Arc::new(MemoryCollection::new());
        RpcServer::new(store, hasher, config.auth, config.rpc.bind_addr())
            .start(shutdown_signal())
            .await?;
        return Ok(());
    }

    let sled = Arc::new(SledCollection::open(&config.store)?);
    let store: Arc<dyn UserCollection> = sled.clone();
    RpcServer::new(store, hasher, config.auth, config.rpc.bind_addr())
        .start(shutdown_signal())
        .await?;

    sled.flush()?;
    info!("User store flushed, exiting");
    Ok(())
}
