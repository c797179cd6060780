// Gateway entry point.
mod observability;

use std::sync::Arc;

use tokio::sync::watch;

use txnscope_gateway::adapters::{
    gateway_router, AllowAllAuthenticator, ChannelEventSink, DisconnectDispatcher,
    GatewayState, RedisSubscriber, SocketDirectory, StaticApiKeyAuthenticator,
};
use txnscope_gateway::application::{
    BroadcastFanOut, ConnectionRegistry, HeartbeatService, TransactionRelay,
};
use txnscope_gateway::config::AppConfig;
use txnscope_gateway::ports::ConnectionAuthenticator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    observability::init_tracing(&config.server.log_level, config.is_production());

    let (sink, events) = ChannelEventSink::new();
    let registry = Arc::new(ConnectionRegistry::new(Arc::new(sink)));
    let directory = Arc::new(SocketDirectory::new());
    let fan_out = Arc::new(BroadcastFanOut::new(registry.clone(), directory.clone()));
    let relay = Arc::new(TransactionRelay::new(fan_out.clone()));

    let api_keys = config.gateway.api_key_list();
    let authenticator: Arc<dyn ConnectionAuthenticator> = if api_keys.is_empty() {
        tracing::warn!("No API keys configured, accepting every client");
        Arc::new(AllowAllAuthenticator)
    } else {
        Arc::new(StaticApiKeyAuthenticator::new(api_keys))
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dispatcher_task = tokio::spawn(
        DisconnectDispatcher::new(events, directory.clone()).run(shutdown_rx.clone()),
    );

    let heartbeat_task = {
        let heartbeat = HeartbeatService::new(fan_out.clone(), config.gateway.heartbeat_interval());
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { heartbeat.run(shutdown).await })
    };

    let subscriber = RedisSubscriber::new(config.redis.clone(), relay.clone())?;
    let subscriber_task = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = subscriber.run(shutdown).await {
                tracing::error!(error = %e, "Redis subscriber exited");
            }
        })
    };

    let app = gateway_router(GatewayState {
        registry: registry.clone(),
        fan_out,
        directory,
        authenticator,
    });

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        channel = %config.redis.channel,
        "Gateway listening"
    );

    let shutdown_registry = registry.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            // Closes every socket so open WebSockets do not hold the server up.
            shutdown_registry.cleanup();
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = tokio::join!(dispatcher_task, heartbeat_task, subscriber_task);

    let stats = relay.stats();
    tracing::info!(
        relayed = stats.relayed,
        rejected = stats.rejected,
        "Gateway stopped"
    );
    Ok(())
}
