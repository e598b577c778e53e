//! Export du rapport (simulé)
//!
//! Aucun PDF ni CSV n'est produit : le « téléchargement » trace sa demande et
//! se déclare terminé après un délai fixe.

use crate::error::EdnaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Délai simulé d'un téléchargement
pub const DOWNLOAD_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Csv => "CSV",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExportFormat {
    type Err = EdnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(EdnaError::UnknownFormat(s.to_string())),
        }
    }
}

/// Section du rapport, cochable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: String,
    pub label: String,
    pub description: String,
    pub included: bool,
}

impl ReportSection {
    fn new(id: &str, label: &str, description: &str, included: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            included,
        }
    }

    /// Les six sections proposées; l'alignement est décoché par défaut
    pub fn defaults() -> Vec<ReportSection> {
        vec![
            Self::new(
                "taxonomy",
                "Taxonomic Classification",
                "Complete taxonomic hierarchy and confidence scores",
                true,
            ),
            Self::new(
                "sequence",
                "Sequence Analysis",
                "Sequence quality metrics, GC content, and annotations",
                true,
            ),
            Self::new(
                "phylogenetic",
                "Phylogenetic Tree",
                "Interactive tree data and evolutionary relationships",
                true,
            ),
            Self::new(
                "alignment",
                "Multiple Sequence Alignment",
                "BLAST results and sequence comparisons",
                false,
            ),
            Self::new(
                "images",
                "Biological Images",
                "Species photographs and habitat images",
                true,
            ),
            Self::new(
                "ecology",
                "Ecological Information",
                "Habitat, distribution, and conservation status",
                true,
            ),
        ]
    }
}

/// Inverse l'inclusion d'une section; un id inconnu ne change rien
pub fn toggle_section(sections: &mut [ReportSection], id: &str) {
    if let Some(section) = sections.iter_mut().find(|s| s.id == id) {
        section.included = !section.included;
    }
}

pub fn included_ids(sections: &[ReportSection]) -> Vec<String> {
    sections
        .iter()
        .filter(|s| s.included)
        .map(|s| s.id.clone())
        .collect()
}

/// Export immédiat depuis l'écran de résultats : trace et rend la main
pub fn quick_export(format: ExportFormat) {
    tracing::info!(format = %format, "Téléchargement du rapport demandé");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Idle,
    Downloading,
    Complete,
}

/// Téléchargement simulé de l'écran d'export
#[derive(Debug, Clone)]
pub struct DownloadJob {
    sections: Vec<ReportSection>,
    format: ExportFormat,
    started: Option<Instant>,
    delay: Duration,
}

impl Default for DownloadJob {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadJob {
    pub fn new() -> Self {
        Self {
            sections: ReportSection::defaults(),
            format: ExportFormat::Pdf,
            started: None,
            delay: DOWNLOAD_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn toggle_section(&mut self, id: &str) {
        toggle_section(&mut self.sections, id);
    }

    /// Lance le téléchargement simulé
    pub fn start(&mut self, format: ExportFormat, now: Instant) {
        self.format = format;
        self.started = Some(now);
        tracing::info!(
            format = %format,
            sections = ?included_ids(&self.sections),
            "Téléchargement du rapport"
        );
    }

    pub fn status(&self, now: Instant) -> DownloadStatus {
        match self.started {
            None => DownloadStatus::Idle,
            Some(t) if now.saturating_duration_since(t) >= self.delay => DownloadStatus::Complete,
            Some(_) => DownloadStatus::Downloading,
        }
    }

    /// Retour à l'état initial, sections comprises
    pub fn reset(&mut self) {
        *self = Self::new().with_delay(self.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sections() {
        let sections = ReportSection::defaults();
        assert_eq!(sections.len(), 6);
        assert_eq!(
            included_ids(&sections),
            vec!["taxonomy", "sequence", "phylogenetic", "images", "ecology"]
        );
    }

    #[test]
    fn test_toggle_section() {
        let mut sections = ReportSection::defaults();
        toggle_section(&mut sections, "alignment");
        toggle_section(&mut sections, "images");
        toggle_section(&mut sections, "missing");
        let ids = included_ids(&sections);
        assert!(ids.contains(&"alignment".to_string()));
        assert!(!ids.contains(&"images".to_string()));
    }

    #[test]
    fn test_download_completes_after_delay() {
        let t0 = Instant::now();
        let mut job = DownloadJob::new();
        assert_eq!(job.status(t0), DownloadStatus::Idle);

        job.start(ExportFormat::Csv, t0);
        assert_eq!(job.status(t0 + Duration::from_millis(2999)), DownloadStatus::Downloading);
        assert_eq!(job.status(t0 + DOWNLOAD_DELAY), DownloadStatus::Complete);
        assert_eq!(job.format(), ExportFormat::Csv);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let t0 = Instant::now();
        let mut job = DownloadJob::new();
        job.toggle_section("taxonomy");
        job.start(ExportFormat::Pdf, t0);
        job.reset();
        assert_eq!(job.status(t0), DownloadStatus::Idle);
        assert_eq!(job.sections(), ReportSection::defaults().as_slice());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("docx".parse::<ExportFormat>().is_err());
    }
}
