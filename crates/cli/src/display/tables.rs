//! Tableaux des séquences apparentées et de la taxonomie

use edna_core::{AnalysisResults, RelatedSequence};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct RelatedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Scientific name")]
    scientific_name: String,
    #[tabled(rename = "Common name")]
    common_name: String,
    #[tabled(rename = "Similarity")]
    similarity: String,
    #[tabled(rename = "Conservation")]
    conservation: String,
}

/// Tableau des séquences apparentées, dans l'ordre reçu
pub fn related_table(records: &[RelatedSequence]) -> String {
    let rows = records.iter().map(|r| RelatedRow {
        id: r.id.clone(),
        scientific_name: r.scientific_name.clone(),
        common_name: r.common_name.clone(),
        similarity: format!("{:.1}%", r.similarity),
        conservation: r.conservation.clone(),
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Fiche d'identification : taxonomie, qualité de séquence, écologie
pub fn results_table(results: &AnalysisResults) -> String {
    let taxonomy = &results.taxonomy;
    let sequence = &results.sequence;
    let ecology = &results.ecology;

    let mut rows: Vec<(&str, String)> = vec![
        ("Scientific name", taxonomy.scientific_name.clone()),
        ("Common name", taxonomy.common_name.clone()),
        ("Confidence", format!("{}%", taxonomy.confidence)),
    ];
    rows.extend(
        taxonomy
            .ranks()
            .into_iter()
            .map(|(rank, value)| (rank, value.to_string())),
    );
    rows.extend([
        ("Length", format!("{} bp", sequence.length)),
        ("GC content", format!("{}%", sequence.gc_content)),
        ("Quality", sequence.quality.clone()),
        ("Gene region", sequence.region.clone()),
        ("Habitat", ecology.habitat.clone()),
        ("Distribution", ecology.distribution.clone()),
        ("Conservation", ecology.conservation.clone()),
        ("Diet", ecology.diet.clone()),
    ]);

    Table::new(rows.into_iter().map(|(field, value)| FieldRow {
        field: field.to_string(),
        value,
    }))
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edna_core::related_sequences;

    #[test]
    fn test_related_table_lists_records() {
        let table = related_table(&related_sequences());
        assert!(table.contains("Salmo salar"));
        assert!(table.contains("94.2%"));
        assert!(table.contains("Endangered"));
    }

    #[test]
    fn test_results_table_has_ranks() {
        let table = results_table(&AnalysisResults::brown_trout());
        assert!(table.contains("Salmoniformes"));
        assert!(table.contains("98.7%"));
        assert!(table.contains("658 bp"));
    }
}
