//! Commande d'affichage des résultats

use crate::display::tables::results_table;
use crate::OutputFormat;
use anyhow::Result;
use edna_core::{AnalysisResults, Demo};

/// Résultats principaux, ou ceux d'une démo
pub fn load(demo: Option<&str>) -> Result<AnalysisResults> {
    Ok(match demo {
        Some(slug) => slug.parse::<Demo>()?.results(),
        None => AnalysisResults::brown_trout(),
    })
}

pub fn run(demo: Option<&str>, format: OutputFormat) -> Result<()> {
    let results = load(demo)?;

    match format {
        OutputFormat::Table => {
            println!("🐟 {}", results.taxonomy.common_name);
            println!("{}", results_table(&results));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }
    Ok(())
}
