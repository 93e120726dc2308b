use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use std::sync::Arc;

use qr_attendance::config::Config;
use qr_attendance::docs::ApiDoc;
use qr_attendance::gateway::sheets::SheetsGateway;
use qr_attendance::gateway::{Disconnected, PartitionStore};
use qr_attendance::partition::{PartitionNamer, WeekdayLocale};
use qr_attendance::routes;
use qr_attendance::service::attendance::AttendanceService;

use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    // One session for the whole process; without it every scan reports CONNECTION_ERROR
    let store: Arc<dyn PartitionStore> =
        match SheetsGateway::connect(config.credentials_json.as_deref(), &config).await {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                error!(error = %e, "Failed to initialise Google Sheets client");
                Arc::new(Disconnected)
            }
        };

    let namer = PartitionNamer::system(WeekdayLocale::from_code(&config.locale));
    let service = Data::new(AttendanceService::new(store, namer, config.recent_limit));

    let server_addr = config.server_addr.clone();
    // Shared by all workers so the quota is per process, not per worker
    let scan_limiter = routes::scan_limiter(&config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .configure(|cfg| routes::configure(cfg, scan_limiter.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
