use std::{process, sync::Arc};

use cafe_between::{
    application::{
        auth::AuthService,
        categories::CategoryRegistry,
        error::AppError,
        images::ImageReconciler,
        menu::MenuService,
        news::NewsService,
        repos::{CategoriesRepo, HealthRepo, MenuRepo, NewsRepo},
    },
    cache::{CacheConfig, ReadCache, spawn_sweeper},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    // A missing .env file is the normal case in production.
    dotenvy::dotenv().ok();

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

    telemetry::init(&settings.logging)?;

    match cli_args.command_or_default() {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = Arc::new(ReadCache::new(CacheConfig::from(&settings.cache)));
    let state = build_http_state(repositories, Arc::clone(&cache), &settings)?;

    let sweeper = settings
        .cache
        .enabled
        .then(|| spawn_sweeper(Arc::clone(&cache)));

    let result = serve_http(&settings, state).await;

    if let Some(handle) = sweeper {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!("Database migrations are up to date");
    Ok(())
}

/// Connect and bring the schema up to date.
async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    cache: Arc<ReadCache>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let menu_repo: Arc<dyn MenuRepo> = repositories.clone();
    let news_repo: Arc<dyn NewsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let directory = settings.uploads.directory.clone();
    let uploads = Arc::new(UploadStorage::new(directory.clone()).map_err(|source| {
        InfraError::UploadDirectory {
            path: directory,
            source,
        }
    })?);

    let auth_config = settings
        .auth
        .auth_config()
        .map_err(|err| InfraError::configuration(err.to_string()))?;

    let images = ImageReconciler::new(Arc::clone(&uploads), settings.uploads.max_file_bytes.get());
    let categories = CategoryRegistry::new(categories_repo, Arc::clone(&menu_repo), cache.clone());
    let menu = MenuService::new(menu_repo, categories.clone(), images.clone(), cache);
    let news = NewsService::new(news_repo, images);

    Ok(HttpState {
        menu: Arc::new(menu),
        categories: Arc::new(categories),
        news: Arc::new(news),
        auth: Arc::new(AuthService::new(auth_config)),
        uploads,
        health: health_repo,
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| InfraError::configuration("uploads.max_request_bytes exceeds usize"))?;
    let router = http::build_router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "Listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
