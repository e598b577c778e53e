//! Système de logging pour eDNA Core

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise le système de logging
///
/// Le filtre vient de `RUST_LOG`; à défaut on retombe sur `default_level`.
/// Un second appel est ignoré (utile quand les tests partagent le processus).
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .try_init();
}

/// Macro pour le logging des opérations critiques
#[macro_export]
macro_rules! log_operation {
    ($name:expr, $block:block) => {{
        let span = tracing::span!(tracing::Level::INFO, $name);
        let _enter = span.enter();
        tracing::info!("Début de l'opération: {}", $name);
        let result = $block;
        tracing::info!("Fin de l'opération: {}", $name);
        result
    }};
}

/// Macro pour le logging des erreurs
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {{
        tracing::error!("Erreur: {}", $error);
        $error
    }};
}
