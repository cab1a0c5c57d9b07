use std::{process, sync::Arc};

use galleria::{
    application::{
        error::AppError,
        gallery::GalleryService,
        mutations::MutationPipeline,
        tiered::{TierConfig, TieredReader},
    },
    cache::{CacheConfig, CacheStore},
    config,
    domain::classify::CategoryScorer,
    infra::{
        db::PostgresStore, error::InfraError, fallback::JsonFileStore, http, mirror::SqliteMirror,
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_api_state(&settings).await;
    serve_http(&settings, state).await
}

async fn connect_primary(settings: &config::Settings) -> Option<Arc<PostgresStore>> {
    let url = settings.database.url.as_deref()?;

    let connected = async {
        let pool = PostgresStore::connect(url, settings.database.max_connections.get()).await?;
        PostgresStore::run_migrations(&pool).await?;
        Ok::<_, sqlx::Error>(PostgresStore::new(pool))
    }
    .await;

    match connected {
        Ok(store) => {
            info!("Primary store connected");
            Some(Arc::new(store))
        }
        Err(err) => {
            let err = InfraError::database(err.to_string());
            warn!(error = %err, "Primary store unavailable; tier disabled");
            None
        }
    }
}

async fn connect_mirror(settings: &config::Settings) -> Option<Arc<SqliteMirror>> {
    let path = settings.mirror.path.as_deref()?;

    match SqliteMirror::connect(path).await {
        Ok(mirror) => {
            info!(path = %path.display(), "Mirror store connected");
            Some(Arc::new(mirror))
        }
        Err(err) => {
            let err = InfraError::mirror(err.to_string());
            warn!(
                path = %path.display(),
                error = %err,
                "Mirror store unavailable; tier disabled"
            );
            None
        }
    }
}

async fn build_api_state(settings: &config::Settings) -> http::ApiState {
    let scorer = CategoryScorer::default();
    let cache = Arc::new(CacheStore::new(CacheConfig::from(&settings.cache)));
    let fallback = Arc::new(JsonFileStore::new(settings.fallback.path.clone()));
    let tier_config = TierConfig::from(&settings.tiers);

    let mut reader = TieredReader::new(fallback.clone(), scorer).with_config(tier_config.clone());
    let mut mutations = MutationPipeline::new(fallback, cache.clone(), scorer)
        .with_timeout(tier_config.store_timeout);

    if let Some(primary) = connect_primary(settings).await {
        reader = reader.with_primary(primary.clone());
        mutations = mutations.with_primary(primary);
    }
    if let Some(mirror) = connect_mirror(settings).await {
        reader = reader.with_secondary(mirror);
    }

    info!(
        primary = reader.has_primary(),
        secondary = reader.has_secondary(),
        fallback = %settings.fallback.path.display(),
        cache_enabled = cache.config().enabled,
        stale_after_secs = cache.config().stale_after.as_secs(),
        "Gallery tiers configured"
    );

    let gallery = GalleryService::new(reader, cache, scorer);
    http::ApiState::new(Arc::new(gallery), Arc::new(mutations))
}

async fn serve_http(settings: &config::Settings, state: http::ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "HTTP server listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received; draining connections");
            let _ = signalled_tx.send(());
        })
        .into_future();
    let mut handle = tokio::spawn(server);

    tokio::select! {
        joined = &mut handle => return finish(joined),
        _ = signalled_rx => {}
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut handle).await {
        Ok(joined) => finish(joined),
        Err(_) => {
            warn!(
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out; aborting open connections"
            );
            handle.abort();
            Ok(())
        }
    }
}

fn finish(joined: Result<std::io::Result<()>, tokio::task::JoinError>) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}
