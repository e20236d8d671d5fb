use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use db_pool::{create_pool, DbConfig};
use post_service::auth::{Authenticator, InMemoryAuthenticator, PgAuthenticator};
use post_service::config::StoreBackend;
use post_service::db::{InMemoryPostStore, PgPostStore, PostStore};
use post_service::{handlers, AppState, Config};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable ({e}); waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// `LOG_FORMAT=json` switches to JSON lines for log aggregation.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// `post-service healthcheck`: probe the local HTTP health endpoint.
async fn run_healthcheck() -> io::Result<()> {
    let port = std::env::var("POST_SERVICE_PORT").unwrap_or_else(|_| "8080".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);

    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

async fn connect_postgres(config: &Config) -> anyhow::Result<sqlx::PgPool> {
    let mut db_cfg = DbConfig::from_env("post-service", &config.database.url);
    db_cfg.max_connections = db_cfg.max_connections.max(config.database.max_connections);
    db_cfg.log_config();

    create_pool(db_cfg)
        .await
        .context("Failed to create database pool")
}

/// `post-service add-author <name> <email> <password>`
async fn run_add_author(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let [name, email, password] = args else {
        anyhow::bail!("usage: post-service add-author <name> <email> <password>");
    };
    if config.database.backend != StoreBackend::Postgres {
        anyhow::bail!("add-author requires POST_STORE_BACKEND=postgres");
    }

    let pool = connect_postgres(config).await?;
    PgPostStore::new(pool.clone()).migrate().await?;

    let author = PgAuthenticator::new(pool)
        .create_author(name, email, password)
        .await?;
    println!("created author {} (id {})", author.name, author.id);
    Ok(())
}

/// Seed the memory backend from `POST_SEED_AUTHORS=name:password,...`
async fn seed_memory_backend(
    store: &InMemoryPostStore,
    authenticator: &InMemoryAuthenticator,
) -> anyhow::Result<()> {
    let Ok(raw) = std::env::var("POST_SEED_AUTHORS") else {
        tracing::warn!("memory backend started without POST_SEED_AUTHORS; nobody can log in");
        return Ok(());
    };

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, password) = entry
            .split_once(':')
            .with_context(|| format!("POST_SEED_AUTHORS entry '{}' is not name:password", entry))?;
        let author = store.create_author(name).await?;
        authenticator.add_account(&author, password).await?;
        tracing::info!(author_id = author.id, name = %author.name, "seeded author");
    }

    Ok(())
}

async fn build_backend(
    config: &Config,
) -> anyhow::Result<(Arc<dyn PostStore>, Arc<dyn Authenticator>)> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let pool = connect_postgres(config).await?;
            let store = PgPostStore::new(pool.clone());
            store.migrate().await?;
            tracing::info!("Connected to PostgreSQL post store");

            Ok((Arc::new(store), Arc::new(PgAuthenticator::new(pool))))
        }
        StoreBackend::Memory => {
            let store = InMemoryPostStore::new();
            let authenticator = InMemoryAuthenticator::new();
            seed_memory_backend(&store, &authenticator).await?;
            tracing::info!("Using in-memory post store");

            Ok((Arc::new(store), Arc::new(authenticator)))
        }
    }
}

/// Post Service
///
/// # Routes
///
/// - `POST /api/v1/posts` - submit a post
/// - `GET /api/v1/posts/recent` - newest posts from everyone
/// - `GET /api/v1/posts/search?q=` - newest posts containing `q`
/// - `GET /api/v1/posts/by-author?author=` - newest posts by one author
/// - `GET /api/v1/posts/by-author/latest?author=` - that author's newest post
/// - `GET /api/v1/health`, `GET /metrics`
#[actix_web::main]
async fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if matches!(
        args.first().map(String::as_str),
        Some("healthcheck" | "healthcheck-http")
    ) {
        return run_healthcheck().await;
    }

    let _ = dotenvy::dotenv();

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if args.first().map(String::as_str) == Some("add-author") {
        return run_add_author(&config, &args[1..])
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{:#}", e)));
    }

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (store, authenticator) = match build_backend(&config).await {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("Post store initialization failed: {:#}", e);
            eprintln!("ERROR: Failed to initialize post store: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = web::Data::new(AppState::from_config(store, &config));
    let bind_address = config.bind_address();
    let allowed_origins = config.cors.allowed_origins.clone();

    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let authenticator = authenticator.clone();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(move |cfg| handlers::configure(cfg, authenticator))
    })
    .bind(&bind_address)?
    .workers(config.app.workers.max(1))
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    server_handle.stop(true).await;

    match server_task.await {
        Ok(result) => result?,
        Err(e) => {
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
    }

    tracing::info!("post-service shut down");
    Ok(())
}
