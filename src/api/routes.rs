use actix_web::web;

use super::error::json_error_handler;
use super::handlers;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/mine", web::post().to(handlers::mine))
        .route("/chain", web::get().to(handlers::full_chain))
        .route("/last_block", web::get().to(handlers::last_block))
        .route("/validate", web::get().to(handlers::validate_chain))
        .route("/transactions/pending", web::get().to(handlers::get_pending_transactions));
}
