use std::{future::IntoFuture, net::SocketAddr, process, sync::Arc};

use secret_board::{
    application::{
        auth::Authenticator,
        board::BoardService,
        error::AppError,
        repos::{PostsRepo, PostsWriteRepo},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        memory::MemoryRepositories,
        telemetry,
    },
};
use tokio::sync::Notify;
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

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (posts_repo, posts_write_repo) = init_repositories(&settings).await?;

    let board = Arc::new(BoardService::new(
        posts_repo,
        posts_write_repo,
        settings.display.timezone,
    ));
    let auth = Arc::new(Authenticator::new(
        settings.auth.realm.clone(),
        settings.auth.users.clone(),
    ));
    if !auth.is_enabled() {
        warn!(
            target = "secret_board::startup",
            "no users configured; posts are accepted anonymously"
        );
    }

    serve_http(&settings, HttpState { board, auth }).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::MissingDatabaseUrl)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "secret_board::migrate", "migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<(Arc<dyn PostsRepo>, Arc<dyn PostsWriteRepo>), AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "secret_board::startup",
            "database url is not configured; posts are kept in memory"
        );
        let repositories = Arc::new(MemoryRepositories::new());
        return Ok((repositories.clone(), repositories));
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    Ok((repositories.clone(), repositories))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "secret_board::startup",
        addr = %settings.server.addr,
        "listening"
    );

    let stop = Arc::new(Notify::new());
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let stop = stop.clone();
        async move { stop.notified().await }
    })
    .into_future();
    tokio::pin!(server);

    let result = tokio::select! {
        result = &mut server => result,
        () = shutdown_signal() => {
            info!(target = "secret_board::shutdown", "draining in-flight requests");
            stop.notify_one();
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target = "secret_board::shutdown",
                        timeout_secs = settings.server.graceful_shutdown.as_secs(),
                        "graceful shutdown timed out"
                    );
                    Ok(())
                }
            }
        }
    };

    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "secret_board::shutdown", error = %err, "failed to listen for ctrl-c");
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
                error!(target = "secret_board::shutdown", error = %err, "failed to listen for SIGTERM");
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
}
