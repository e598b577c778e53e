//! Commande d'exploration des séquences apparentées

use crate::display::tables::related_table;
use crate::{OutputFormat, SortArg};
use anyhow::Result;
use edna_core::{filter_and_sort, related_sequences, ExploreQuery, RelatedSequence, SortKey};
use std::path::PathBuf;

fn query(text: String, family: Option<String>, sort: SortArg) -> ExploreQuery {
    ExploreQuery {
        text,
        family,
        sort: match sort {
            SortArg::Similarity => SortKey::Similarity,
            SortArg::Name => SortKey::Name,
        },
    }
}

pub fn search(text: String, family: Option<String>, sort: SortArg) -> Vec<RelatedSequence> {
    filter_and_sort(&related_sequences(), &query(text, family, sort))
}

pub fn run(
    text: String,
    family: Option<String>,
    sort: SortArg,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let found = search(text, family, sort);
    tracing::info!(count = found.len(), "Séquences apparentées filtrées");

    match format {
        OutputFormat::Table => {
            println!("{} séquences apparentées", found.len());
            println!("{}", related_table(&found));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&found)?;
            if let Some(output) = output {
                std::fs::write(&output, json)?;
                println!("JSON écrit dans: {}", output.display());
            } else {
                println!("{}", json);
            }
        }
    }
    Ok(())
}
