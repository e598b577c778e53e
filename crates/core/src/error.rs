//! Types d'erreurs pour la bibliothèque eDNA

use thiserror::Error;

/// Erreurs de validation de l'upload.
///
/// Le message est affiché tel quel sous le formulaire, sans code ni action de
/// récupération autre que la ressaisie.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload a valid FASTA or CSV file")]
    InvalidFile { name: String },

    #[error("Please upload a file or paste a DNA sequence")]
    NothingProvided,

    #[error("Invalid DNA sequence. Please use only A, T, C, G, N characters")]
    InvalidSequence,
}

/// Erreurs de recherche par identifiant textuel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdnaError {
    #[error("Démo inconnue: {0}")]
    UnknownDemo(String),

    #[error("Format d'export inconnu: {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, EdnaError>;
