use actix_web::{App, HttpServer, middleware::Logger, web};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attar_billing::{
  adapters::http::{
    middleware::RequestContextMiddleware,
    routes::configure_invoice_routes,
  },
  application::billing::{GetInvoiceUseCase, IssueCreditNoteUseCase},
  domain::billing::CreditNoteService,
  infrastructure::{
    config::Config,
    persistence::postgres::{
      PostgresCustomerRepository, PostgresInvoiceRepository, PostgresSettlementUnitOfWork,
    },
  },
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  // Initialize tracing subscriber for logging
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "attar_billing=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting attar-billing service");

  // Load configuration
  let config = Config::load().expect("Failed to load configuration");
  tracing::info!("Configuration loaded successfully");

  // Set up database connection pool with timeout
  tracing::info!("Connecting to database: {}", config.database.url);

  let db_pool = tokio::time::timeout(
    Duration::from_secs(config.database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
      .connect(&config.database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    );
    std::io::Error::new(
      std::io::ErrorKind::TimedOut,
      format!(
        "Database connection timed out after {} seconds",
        config.database.connect_timeout_seconds
      ),
    )
  })?
  .map_err(|e| {
    tracing::error!("Failed to connect to database: {}", e);
    match e {
      sqlx::Error::Io(_) => std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        format!(
          "Could not connect to database. Is PostgreSQL running at {}?",
          config.database.url
        ),
      ),
      _ => std::io::Error::other(format!("Database error: {}", e)),
    }
  })?;

  tracing::info!("Database connection pool created");

  // Run database migrations
  tracing::info!("Running database migrations");
  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .expect("Failed to run database migrations");
  tracing::info!("Database migrations completed");

  // Initialize repositories
  let invoice_repo = Arc::new(PostgresInvoiceRepository::new(db_pool.clone()));
  let customer_repo = Arc::new(PostgresCustomerRepository::new(db_pool.clone()));
  let settlement = Arc::new(PostgresSettlementUnitOfWork::new(
    db_pool.clone(),
    config.billing.missing_credit_account,
  ));

  // Initialize domain service
  let credit_note_service = Arc::new(CreditNoteService::new(
    invoice_repo,
    customer_repo,
    settlement,
  ));

  // Initialize use cases
  let issue_use_case = Arc::new(IssueCreditNoteUseCase::new(credit_note_service.clone()));
  let get_invoice_use_case = Arc::new(GetInvoiceUseCase::new(credit_note_service.clone()));

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  // Create and start the HTTP server
  HttpServer::new(move || {
    App::new()
      // Add logging middleware
      .wrap(Logger::default())
      // Configure invoice API routes (identity headers required)
      .service(
        web::scope("/api/v1/invoices")
          .wrap(RequestContextMiddleware::new())
          .configure(|cfg| {
            configure_invoice_routes(cfg, issue_use_case.clone(), get_invoice_use_case.clone())
          }),
      )
      // Health check endpoint
      .route("/health", web::get().to(health_check))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await
}

/// Health check endpoint
async fn health_check() -> &'static str {
  "OK"
}
