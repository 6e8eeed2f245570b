#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use bioauth::{settings::BioauthSettings, store::Database, AppContext};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = BioauthSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let database = Database::open(&settings.database)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to open database: {e}")))?;
    log::info!("✓ Database ready at {}", settings.database.url);

    let result = start_server(&database, &settings).await;

    database.close().await;
    log::info!("Database connections closed");
    result
}

/// Start the HTTP server and run until shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(database: &Database, settings: &BioauthSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, settings);

    let configure = AppContext::new(database, settings).configure();

    // Configure CORS for the browser front end
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure.clone())
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &BioauthSettings) {
    println!("Starting bioauth on http://{bind_address}");
    println!("Relying party: {} ({})", settings.webauthn.rp_name, settings.webauthn.rp_id);
    println!();
    println!("Account endpoints:");
    println!("  POST /api/register             - Create a password account");
    println!("  POST /api/login                - Password login");
    println!("  GET  /api/session              - Current session");
    println!("  POST /api/logout               - Clear session");
    println!();
    println!("Biometric endpoints:");
    println!("  POST /api/biometrics/check     - Whether a user has biometrics");
    println!("  POST /api/biometrics/register  - Start credential registration");
    println!("  POST /api/biometrics/store     - Complete credential registration");
    println!("  POST /api/biometrics/challenge - Start biometric login");
    println!("  POST /api/biometrics/verify    - Complete biometric login");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping                     - Health check");
}
