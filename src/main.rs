//! Signpost - knowledge-base navigation bot gateway

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signpost::{
    auth::{Authorizer, RemoteAuthClient},
    catalog::{spawn_refresh_task, CatalogIndex, HttpContentSource, Refresher},
    config::Args,
    db::{MembershipStore, MongoMembershipStore},
    gateway::{Dispatcher, TelegramGateway, Texts},
    nav::Navigator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("signpost={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Signpost - knowledge base gateway");
    info!("======================================");
    info!("Source: {}", args.source_url);
    info!("Root key: {}", args.root_key);
    info!("Token prefix: {}", args.token_prefix);
    info!("Refresh interval: {}s", args.refresh_interval_secs);
    info!("MongoDB: {}", args.mongodb_uri);
    info!(
        "Authorization service: {}",
        args.auth_service_url.as_deref().unwrap_or("disabled")
    );
    info!("======================================");

    let http = reqwest::Client::new();

    // Membership store; navigation is useless without authorization, so
    // an unreachable store is fatal
    let store = match MongoMembershipStore::connect(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(store) => Arc::new(store) as Arc<dyn MembershipStore>,
        Err(e) => {
            error!("Membership store connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let remote_auth = args
        .auth_service_url
        .as_deref()
        .map(|url| RemoteAuthClient::new(http.clone(), url, args.request_timeout()));
    let auth = Arc::new(Authorizer::new(store, remote_auth));

    // Catalog: the startup fetch is fatal, since no tree means no
    // navigation at all; later refresh failures only log
    let index = Arc::new(CatalogIndex::new());
    let source = Arc::new(HttpContentSource::new(
        http.clone(),
        args.source_url.clone(),
        args.source_login.clone(),
        args.source_password.clone(),
        args.request_timeout(),
    ));
    let refresher = Arc::new(Refresher::new(source, Arc::clone(&index), args.root_key.clone()));

    if let Err(e) = refresher.refresh().await {
        error!("Startup catalog fetch failed: {}", e);
        std::process::exit(1);
    }
    info!("Startup catalog fetch succeeded");

    // Shutdown signal shared by every loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let refresh_handle =
        spawn_refresh_task(refresher, args.refresh_interval(), shutdown_rx.clone());

    let navigator = Arc::new(Navigator::new(
        Arc::clone(&index),
        args.token_prefix.clone(),
        args.back_label.clone(),
        args.home_label.clone(),
    ));

    let gateway = Arc::new(TelegramGateway::new(
        http,
        &args.bot_api_url,
        &args.bot_token,
        args.request_timeout(),
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        gateway,
        navigator,
        auth,
        Texts {
            greeting: args.greeting_text.clone(),
            menu: args.menu_text.clone(),
            section: args.section_text.clone(),
            expired: args.expired_text.clone(),
            share_contact: args.share_contact_label.clone(),
        },
    ));
    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown_rx));

    info!("Signpost started");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Flip the watch; both loops abandon in-flight non-critical work
    let _ = shutdown_tx.send(true);
    let _ = refresh_handle.await;
    let _ = dispatcher_handle.await;

    info!("Signpost stopped");
    Ok(())
}
