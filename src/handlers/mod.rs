// HTTP request handlers for the JSON API
pub mod accounts;
pub mod biometrics;
pub mod health;
pub mod helpers;

use actix_web::web;

// Re-export the main handler functions
pub use accounts::{current_session, login, logout, register};
pub use biometrics::{
    check_biometrics, complete_assertion, complete_registration, start_assertion,
    start_registration,
};
pub use health::health;

use helpers::{completion_json_config, json_config};

/// Route table. Expects `web::Data<AppContext>` to be registered.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        // Password accounts
        .route("/api/register", web::post().to(register))
        .route("/api/login", web::post().to(login))
        .route("/api/session", web::get().to(current_session))
        .route("/api/logout", web::post().to(logout))
        // Biometric endpoints
        .route("/api/biometrics/check", web::post().to(check_biometrics))
        .route("/api/biometrics/register", web::post().to(start_registration))
        .service(
            web::resource("/api/biometrics/store")
                .app_data(completion_json_config())
                .route(web::post().to(complete_registration)),
        )
        .route("/api/biometrics/challenge", web::post().to(start_assertion))
        .service(
            web::resource("/api/biometrics/verify")
                .app_data(completion_json_config())
                .route(web::post().to(complete_assertion)),
        )
        // Health endpoint
        .route("/ping", web::get().to(health));
}
