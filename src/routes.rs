use crate::{
    api::attendance::{self, no_qr_data},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{error::InternalError, web};
use std::sync::Arc;

pub type ScanLimiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Builds the `/scan` limiter. Create it once and hand clones to every
/// worker so they share one quota.
pub fn scan_limiter(config: &Config) -> ScanLimiter {
    let requests_per_min = config.rate_scan_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("rate limit period and burst are non-zero");
    Arc::new(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, scan_limiter: ScanLimiter) {
    // Unreadable bodies get the same answer as a body without qr_data
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| InternalError::from_response(err, no_qr_data()).into()),
    );

    cfg.service(web::resource("/").route(web::get().to(attendance::index)))
        .service(
            web::resource("/scan")
                .wrap(scan_limiter)
                .route(web::post().to(attendance::scan)),
        )
        .service(web::resource("/recent").route(web::get().to(attendance::recent)))
        .service(web::resource("/health").route(web::get().to(attendance::health)));
}
