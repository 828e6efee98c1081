pub mod handlers;
pub mod types;

use axum::{routing::post, Router};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::account::CredentialHasher;
use crate::config::AuthConfig;
use crate::storage::UserCollection;

#[derive(Clone)]
pub struct RpcState {
    pub store: Arc<dyn UserCollection>,
    pub hasher: Arc<CredentialHasher>,
    pub auth: Arc<AuthConfig>,
}

pub fn router(state: RpcState) -> Router {
    Router::new()
        .route("/", post(handlers::handle_rpc_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer {
    state: RpcState,
    bind_addr: String,
}

impl RpcServer {
    pub fn new(
        store: Arc<dyn UserCollection>,
        hasher: Arc<CredentialHasher>,
        auth: AuthConfig,
        bind_addr: String,
    ) -> Self {
        Self {
            state: RpcState {
                store,
                hasher,
                auth: Arc::new(auth),
            },
            bind_addr,
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<S>(self, shutdown: S) -> std::io::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;

        info!("RPC server listening on {}", self.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
