//! Validation de l'upload et état de session de l'analyse
//!
//! Aucun contenu n'est jamais lu ni parsé : un fichier est accepté sur son nom
//! (ou son type MIME), une séquence collée sur sa classe de caractères.

use crate::error::UploadError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Extensions acceptées pour un fichier
pub const ACCEPTED_EXTENSIONS: [&str; 4] = [".fasta", ".fa", ".csv", ".txt"];

/// Types MIME acceptés pour un fichier
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["text/plain", "text/csv", "application/csv"];

fn sequence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^[ATCGN\s>]+$").expect("motif de séquence valide"))
}

/// Vérifie qu'une séquence collée ne contient que A, T, C, G, N, des blancs et `>`
pub fn validate_sequence(text: &str) -> Result<(), UploadError> {
    if sequence_pattern().is_match(text) {
        Ok(())
    } else {
        Err(UploadError::InvalidSequence)
    }
}

/// Vérifie un fichier sur son extension ou son type MIME
pub fn validate_file(name: &str, mime: Option<&str>) -> Result<(), UploadError> {
    let lower = name.to_lowercase();
    let has_valid_extension = ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext));
    let has_valid_type = mime.is_some_and(|m| ACCEPTED_MIME_TYPES.contains(&m));

    if has_valid_extension || has_valid_type {
        Ok(())
    } else {
        Err(UploadError::InvalidFile {
            name: name.to_string(),
        })
    }
}

/// Fichier choisi par l'utilisateur; seuls le nom, la taille et le type sont connus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

/// Formulaire d'upload : un fichier OU une séquence collée
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    sequence: String,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Sélectionne un fichier; vide la zone de texte s'il est accepté
    pub fn set_file(&mut self, file: UploadedFile) -> Result<(), UploadError> {
        validate_file(&file.name, file.mime.as_deref())?;
        self.file = Some(file);
        self.sequence.clear();
        Ok(())
    }

    pub fn remove_file(&mut self) {
        self.file = None;
    }

    /// Remplace le texte collé; un texte non blanc retire le fichier
    pub fn set_sequence(&mut self, text: impl Into<String>) {
        self.sequence = text.into();
        if !self.sequence.trim().is_empty() {
            self.file = None;
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.file.is_some() || !self.sequence.trim().is_empty()
    }

    /// Valide le formulaire et produit l'état de session à conserver
    pub fn submit(&self) -> Result<AnalysisSession, UploadError> {
        if !self.can_proceed() {
            return Err(UploadError::NothingProvided);
        }

        if !self.sequence.trim().is_empty() {
            validate_sequence(&self.sequence)?;
        }

        Ok(AnalysisSession {
            uploaded_file: self.file.as_ref().map(|f| f.name.clone()),
            pasted_sequence: (!self.sequence.is_empty()).then(|| self.sequence.clone()),
        })
    }
}

/// Les deux chaînes conservées entre les écrans pour une analyse
///
/// Écrites à chaque soumission, qui remplace entièrement la précédente; lues
/// au démarrage du traitement, effacées au lancement d'une nouvelle analyse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub uploaded_file: Option<String>,
    pub pasted_sequence: Option<String>,
}

impl AnalysisSession {
    pub fn is_empty(&self) -> bool {
        self.uploaded_file.is_none() && self.pasted_sequence.is_none()
    }

    /// Remplace les deux valeurs par celles de la nouvelle soumission
    pub fn store(&mut self, other: AnalysisSession) {
        *self = other;
    }

    pub fn clear(&mut self) {
        self.uploaded_file = None;
        self.pasted_sequence = None;
    }

    /// Libellé court de l'entrée, pour l'écran de traitement
    pub fn describe(&self) -> String {
        match (&self.uploaded_file, &self.pasted_sequence) {
            (Some(name), _) => name.clone(),
            (None, Some(seq)) => format!("Pasted sequence ({} characters)", seq.chars().count()),
            (None, None) => "No input".to_string(),
        }
    }
}
