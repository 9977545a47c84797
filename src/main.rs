use std::{future::IntoFuture, process, sync::Arc};

use crispr_site::{
    application::{auth::SessionService, error::AppError},
    config,
    infra::{
        cache::ResponseCache,
        db::{PostgresRepositories, UnconfiguredRepositories},
        error::InfraError,
        http::{self, AppState, SessionCookie},
        telemetry,
    },
};
use sqlx::PgPool;
use tokio::{signal, sync::Notify};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::CreateAdmin(args) => run_create_admin(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cache = ResponseCache::new(settings.cache.revalidate, settings.cache.max_entries);
    let session_cookie = SessionCookie {
        name: settings.session.cookie_name.clone(),
        secure: settings.session.cookie_secure,
    };

    let state = match settings.database.url.as_deref() {
        Some(url) => {
            let pool = connect_and_migrate(url, &settings).await?;
            AppState::from_store(
                Arc::new(PostgresRepositories::new(pool)),
                cache,
                settings.session.ttl,
                session_cookie,
            )
        }
        None => {
            warn!("no database url configured; serving an empty site with writes disabled");
            AppState::from_store(
                Arc::new(UnconfiguredRepositories),
                cache,
                settings.session.ttl,
                session_cookie,
            )
        }
    };

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| InfraError::bind(settings.server.addr, err))?;

    info!(
        addr = %settings.server.addr,
        cache_seconds = settings.cache.revalidate.as_secs(),
        "listening"
    );

    let draining = Arc::new(Notify::new());
    let trigger = draining.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            trigger.notify_one();
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            info!("server stopped");
        }
        _ = async {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_seconds = grace.as_secs(), "graceful shutdown timed out; dropping open connections");
        }
    }

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let url = require_database_url(&settings)?;
    connect_and_migrate(url, &settings).await?;
    info!("migrations applied");
    Ok(())
}

async fn run_create_admin(
    settings: config::Settings,
    args: config::CreateAdminArgs,
) -> Result<(), AppError> {
    let url = require_database_url(&settings)?;
    let pool = connect_and_migrate(url, &settings).await?;
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let sessions = SessionService::new(
        repositories.clone(),
        repositories,
        settings.session.ttl,
    );
    let user = sessions
        .create_admin(&args.email, &args.name, &args.password)
        .await?;

    info!(user_id = %user.id, email = %user.email, "admin account ready");
    Ok(())
}

fn require_database_url(settings: &config::Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::Configuration("database url is not configured").into())
}

async fn connect_and_migrate(url: &str, settings: &config::Settings) -> Result<PgPool, AppError> {
    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(pool)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
