//! Configuration du serveur web

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration du serveur
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Taille maximale du texte collé, en octets
    pub upload_limit: usize,
    /// Inactivité après laquelle une session est oubliée, en secondes
    pub session_ttl_secs: u64,
    pub static_files: PathBuf,
    pub templates: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
            upload_limit: 100 * 1024 * 1024, // 100MB
            session_ttl_secs: 60 * 60,
            static_files: PathBuf::from("./static"),
            templates: PathBuf::from("./templates"),
        }
    }
}

/// Réglage des minuteries de la simulation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Facteur d'accélération des durées scriptées (1.0 = durées d'origine)
    pub fast_forward: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { fast_forward: 1.0 }
    }
}

/// Configuration complète de l'application
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
}

/// Configuration du logging
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl AppConfig {
    /// Charge la configuration depuis un fichier
    pub fn load_from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        // Une section illisible retombe sur les valeurs par défaut
        match settings.try_deserialize::<AppConfig>() {
            Ok(cfg) => Ok(cfg),
            Err(_) => Ok(AppConfig::default()),
        }
    }
}
