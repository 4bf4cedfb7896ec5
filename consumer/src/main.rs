//! Users service consumer binary

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use users_consumer::{build_router, AppConfig, QueueWorker, RpcServer, TransportBinding};
use users_core::dispatch::DeliveryGuarantee;
use users_core::services::{AccountService, AccountServiceConfig, TokenService, TokenServiceConfig};
use users_infra::{
    BcryptPasswordHasher, DatabasePool, HttpEmailNotifier, InMemoryQueue, MySqlCredentialStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        environment = %config.environment,
        binding = %config.binding,
        queue = %config.broker.queue,
        dead_letter_queue = %config.broker.dead_letter_queue,
        max_attempts = config.retry.max_attempts,
        event = "starting",
        "starting users service consumer"
    );

    let pool = DatabasePool::new(&config.database).await?;
    pool.health_check().await?;

    let store = Arc::new(MySqlCredentialStore::new(pool.get_pool().clone()));
    let tokens = TokenService::new(
        Arc::clone(&store),
        TokenServiceConfig::from(config.tokens.clone()),
    );
    let hasher = Arc::new(BcryptPasswordHasher::new());
    let notifier = Arc::new(HttpEmailNotifier::new(config.email.clone())?);

    let service = Arc::new(AccountService::new(
        store,
        tokens,
        hasher,
        notifier,
        AccountServiceConfig::default(),
    ));
    let router = build_router(service);

    // The queue stands where the durable broker client plugs in; both
    // bindings dead-letter through it.
    let queue = InMemoryQueue::new();
    let delivery = DeliveryGuarantee::new(config.retry.clone(), Arc::new(queue.clone()));

    match config.binding {
        TransportBinding::Queue => {
            let worker = QueueWorker::new(Arc::new(queue), router, delivery);
            worker.run_until_shutdown().await?;
        }
        TransportBinding::Rpc => {
            let server = RpcServer::new(config.rpc.clone(), Arc::new(router), Arc::new(delivery));
            server.run_until_shutdown().await?;
        }
    }

    tracing::info!(event = "stopped", "users service consumer stopped");
    Ok(())
}
