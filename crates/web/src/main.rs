//! eDNA Analysis Web Server
//!
//! Serveur web de la démo d'identification de séquences ADN : upload,
//! progression simulée, résultats fictifs et arbre phylogénétique.

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

mod config;
mod models;
mod routes;

use config::AppConfig;
use models::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Charger la configuration
    let config = match AppConfig::load_from_file("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Erreur de chargement de la configuration: {}. Utilisation des valeurs par défaut.",
                e
            );
            AppConfig::default()
        }
    };

    // Initialiser le logging
    init_logging(&config.logging);

    // Initialiser Tera
    let tera = match tera::Tera::new(&format!("{}/*", config.server.templates.display())) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Erreur d'initialisation de Tera: {}", e);
            std::process::exit(1);
        }
    };

    if config.simulation.fast_forward != 1.0 {
        tracing::info!(
            factor = config.simulation.fast_forward,
            "Minuteries de simulation accélérées"
        );
    }

    // Créer l'état de l'application
    let app_state = web::Data::new(AppState::new(tera, config.clone()));

    tracing::info!(
        "🧬 Démarrage du serveur eDNA Analysis sur http://{}:{}",
        config.server.host,
        config.server.port
    );

    let static_files = config.server.static_files.clone();
    HttpServer::new(move || {
        // Configurer CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(Files::new("/static", &static_files))
    })
    .workers(config.server.workers)
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await
}

/// Initialise le système de logging
fn init_logging(config: &config::LoggingConfig) {
    let filter = match config.level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };

    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
        }
    }
}
