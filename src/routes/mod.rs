// Route exports
pub mod kiosk;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/mrz")
            .configure(kiosk::configure),
    );
}
