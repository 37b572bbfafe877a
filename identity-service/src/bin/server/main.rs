use std::sync::Arc;

use auth::JwtHandler;
use auth::TokenEngine;
use identity_service::config::Config;
use identity_service::domain::identity::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::mail::spawn_mail_worker;
use identity_service::outbound::mail::LogMailTransport;
use identity_service::outbound::mail::MailTransport;
use identity_service::outbound::mail::QueuedMailDispatcher;
use identity_service::outbound::mail::SmtpMailTransport;
use identity_service::outbound::repositories::PostgresIdentityRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        access_ttl_minutes = config.jwt.access_expiration_minutes,
        refresh_ttl_minutes = config.jwt.refresh_expiration_minutes,
        key_rotation = config.jwt.previous_secret.is_some(),
        mail_queue_capacity = config.mail.queue_capacity,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let mut jwt_handler = JwtHandler::new(config.jwt.secret.as_bytes());
    if let Some(previous) = &config.jwt.previous_secret {
        jwt_handler = jwt_handler.with_previous_secret(previous.as_bytes());
    }
    let token_engine = Arc::new(TokenEngine::with_handler(
        jwt_handler,
        config.jwt.access_ttl(),
        config.jwt.refresh_ttl(),
    ));

    let (mail_dispatcher, mail_queue) =
        QueuedMailDispatcher::new(config.mail.app_url.clone(), config.mail.queue_capacity);
    let mail_transport: Arc<dyn MailTransport> = match &config.mail.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Activation mail via SMTP");
            Arc::new(SmtpMailTransport::new(smtp)?)
        }
        None => {
            tracing::warn!("No SMTP relay configured, activation mail is only logged");
            Arc::new(LogMailTransport)
        }
    };
    let mail_worker = spawn_mail_worker(mail_queue, mail_transport);

    let identity_repository = Arc::new(PostgresIdentityRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        identity_repository,
        Arc::new(mail_dispatcher),
        token_engine,
        config.verification.ttl(),
    ));

    let http_address = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service);
    let http_server =
        tokio::spawn(async move { axum::serve(http_listener, http_application).await });

    match tokio::try_join!(http_server, mail_worker) {
        Ok((Ok(()), ())) => tracing::info!("Servers exited successfully"),
        Ok((Err(e), ())) => tracing::error!(error = %e, "Http server error"),
        Err(e) => tracing::error!(error = %e, "Server task failed"),
    };

    Ok(())
}
