//! Commande de validation

use crate::InputArgs;
use anyhow::Result;
use console::style;
use edna_core::{AnalysisSession, UploadError, UploadForm, UploadedFile};

/// Construit le formulaire d'upload depuis les arguments
///
/// Seuls le nom et la taille du fichier sont lus, jamais son contenu.
pub fn form_from_args(input: &InputArgs) -> Result<UploadForm> {
    let mut form = UploadForm::new();

    if let Some(path) = &input.file {
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        form.set_file(UploadedFile {
            name,
            size,
            mime: None,
        })
        .map_err(refused)?;
    }

    if let Some(sequence) = &input.sequence {
        form.set_sequence(sequence.clone());
    }

    Ok(form)
}

fn refused(e: UploadError) -> anyhow::Error {
    tracing::warn!(error = %e, "Entrée refusée");
    e.into()
}

/// Valide l'entrée et rend la session qui serait conservée
pub fn submit(input: &InputArgs) -> Result<AnalysisSession> {
    let form = form_from_args(input)?;
    form.submit().map_err(refused)
}

pub fn run(input: &InputArgs) -> Result<()> {
    let session = submit(input)?;
    println!("{} {}", style("✓").green().bold(), session.describe());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pasted(text: &str) -> InputArgs {
        InputArgs {
            file: None,
            sequence: Some(text.to_string()),
        }
    }

    #[test]
    fn test_pasted_sequence_accepted() {
        let session = submit(&pasted(">Seq1\nATCGATCG")).unwrap();
        assert_eq!(session.pasted_sequence.as_deref(), Some(">Seq1\nATCGATCG"));
    }

    #[test]
    fn test_invalid_sequence_message() {
        let err = submit(&pasted("ATCGX")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid DNA sequence. Please use only A, T, C, G, N characters"
        );
    }

    #[test]
    fn test_nothing_provided() {
        let err = submit(&InputArgs {
            file: None,
            sequence: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Please upload a file or paste a DNA sequence");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let input = InputArgs {
            file: Some("/nonexistent/sample.fasta".into()),
            sequence: None,
        };
        assert!(submit(&input).is_err());
    }
}
