use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::api::view::render_index;
use crate::model::attendance::RecentEntry;
use crate::model::scan::{ScanRequest, ScanResult};
use crate::service::attendance::AttendanceService;

pub const NO_QR_DATA: &str = "No QR data provided";

pub fn no_qr_data() -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": NO_QR_DATA }))
}

/// Attendance page with the latest scans of the day
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Recent attendance page", content_type = "text/html", body = String)
    ),
    tag = "Attendance"
)]
pub async fn index(service: web::Data<AttendanceService>) -> impl Responder {
    let recent = service.recent().await;

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_index(&recent))
}

/// Submit a scanned QR code
#[utoipa::path(
    post,
    path = "/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan processed, outcome in `status`", body = ScanResult),
        (status = 400, description = "Missing QR data", body = Object, example = json!({
            "error": "No QR data provided"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Attendance"
)]
#[instrument(name = "scan", skip(service, body), fields(request_id = %Uuid::new_v4()))]
pub async fn scan(
    service: web::Data<AttendanceService>,
    body: web::Json<ScanRequest>,
) -> impl Responder {
    let qr_data = match body.into_inner().qr_data {
        Some(data) if !data.is_empty() => data,
        _ => {
            debug!("Scan request without qr_data");
            return no_qr_data();
        }
    };

    let result = service.scan(&qr_data).await;
    HttpResponse::Ok().json(result)
}

/// Latest scans of the day as JSON
#[utoipa::path(
    get,
    path = "/recent",
    responses(
        (status = 200, description = "Up to 10 most recent entries", body = [RecentEntry])
    ),
    tag = "Attendance"
)]
pub async fn recent(service: web::Data<AttendanceService>) -> impl Responder {
    HttpResponse::Ok().json(service.recent().await)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({
            "status": "ok",
            "store_connected": true,
            "partition": "JUMAT_24-10-2025"
        }))
    ),
    tag = "Health"
)]
pub async fn health(service: web::Data<AttendanceService>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "store_connected": service.store_connected(),
        "partition": service.partition_name(),
    }))
}
