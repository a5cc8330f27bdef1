use actix_web::{middleware, web, App, HttpServer};
use emergency_notifier::{
    handlers::register_routes, metrics, Config, EmergencyNotifier, FcmPushSender,
    PgUserDirectory,
};
use fcm_push::FCMClient;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!(env = %config.app.env, "Starting emergency notifier");

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            io::Error::new(io::ErrorKind::Other, "Database connection failed")
        })?;
    tracing::info!("Successfully connected to database");

    let fcm_client = match &config.fcm.credentials_path {
        Some(path) => match FCMClient::from_service_account_file(config.fcm.project_id.clone(), path)
            .await
        {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("FCM disabled, failed to load credentials: {}", e);
                None
            }
        },
        None => {
            tracing::warn!("FCM_CREDENTIALS_PATH not set, push dispatch will be recorded as failed");
            None
        }
    };

    let notifier = Arc::new(EmergencyNotifier::new(
        Arc::new(PgUserDirectory::new(db_pool)),
        Arc::new(FcmPushSender::new(fcm_client)),
        config.notifier.clone(),
    ));

    let addr = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(notifier.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(register_routes)
    })
    .bind(&addr)?
    .run()
    .await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());

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
