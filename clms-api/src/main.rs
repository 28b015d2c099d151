use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod config;
mod database;
mod handlers;
mod helpers;
mod ingestion;
mod jobs;
mod notify;

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the Customer Leads Management System"
    }))
}

#[get("/health")]
async fn health(db: web::Data<Arc<database::Database>>) -> impl Responder {
    // Test database connection
    match db.connection.lock() {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("clms-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Initialize database
    let db = helpers::database::initialize_database().expect("Failed to initialize database");

    tracing::info!(
        "Database initialized at: {:?}",
        helpers::database::get_db_path().unwrap()
    );

    // Load config
    let (config, config_path) = config::ApiConfig::load().expect("Failed to load config");
    tracing::info!("Loaded config from {:?}", config_path);

    // Get server config or use defaults
    let (host, port) = if let Some(server_config) = &config.server {
        (server_config.host.clone(), server_config.port)
    } else {
        ("127.0.0.1".to_string(), 5555)
    };

    tracing::info!("Server will listen on {}:{}", host, port);

    // Notification dispatcher: simulated unless a webhook is configured
    let notifier = Arc::new(notify::Notifier::from_config(config.notify.as_ref()));

    // Daily follow-up scheduler
    let cron_expr = config
        .scheduler
        .clone()
        .unwrap_or_default()
        .cron;
    let scheduler = Arc::new(
        jobs::followup_scheduler::FollowupScheduler::new(
            db.async_connection.clone(),
            notifier.clone(),
            &cron_expr,
        )
        .expect("Failed to initialize follow-up scheduler"),
    );

    let scheduler_loop = scheduler.clone();
    tokio::spawn(async move {
        scheduler_loop.run().await;
    });

    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(db.clone()))
            .service(hello)
            .service(health)
            .route("/leads", web::post().to(handlers::leads::create_lead))
            .route("/leads", web::get().to(handlers::leads::list_leads))
            .route("/leads/capture", web::post().to(handlers::leads::capture_lead))
            .route("/leads/{id}", web::get().to(handlers::leads::get_lead))
            .route("/leads/{id}", web::put().to(handlers::leads::update_lead))
            .route("/leads/{id}", web::delete().to(handlers::leads::delete_lead))
            .route("/leads/{id}/log", web::post().to(handlers::leads::append_log))
            .route(
                "/leads/{id}/document",
                web::post().to(handlers::leads::append_document),
            )
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();
    let shutdown_scheduler = scheduler.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        shutdown_scheduler.shutdown();

        handle.stop(true).await;
    });

    server.await
}
