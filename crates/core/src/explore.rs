//! Exploration des séquences apparentées
//!
//! Filtre et tri côté client sur une liste statique; aucune requête.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Séquence apparentée affichée sur l'écran d'exploration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedSequence {
    pub id: String,
    pub scientific_name: String,
    pub common_name: String,
    pub similarity: f64,
    pub family: String,
    pub habitat: String,
    pub conservation: String,
    pub image: String,
    pub description: String,
}

impl RelatedSequence {
    fn new(
        id: &str,
        scientific_name: &str,
        common_name: &str,
        similarity: f64,
        habitat: &str,
        conservation: &str,
        image: &str,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            scientific_name: scientific_name.to_string(),
            common_name: common_name.to_string(),
            similarity,
            family: "Salmonidae".to_string(),
            habitat: habitat.to_string(),
            conservation: conservation.to_string(),
            image: image.to_string(),
            description: description.to_string(),
        }
    }

    /// Classe du badge de conservation
    pub fn conservation_badge(&self) -> &'static str {
        match self.conservation.as_str() {
            "Endangered" => "destructive",
            "Near Threatened" => "warning",
            _ => "secondary",
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.scientific_name.to_lowercase().contains(needle)
            || self.common_name.to_lowercase().contains(needle)
    }
}

/// Les six salmonidés proches de la truite fario
pub fn related_sequences() -> Vec<RelatedSequence> {
    vec![
        RelatedSequence::new(
            "seq-001",
            "Salmo salar",
            "Atlantic Salmon",
            94.2,
            "Anadromous - Ocean and freshwater",
            "Least Concern",
            "/static/atlantic-salmon.jpg",
            "Closely related species with high genetic similarity to brown trout",
        ),
        RelatedSequence::new(
            "seq-002",
            "Oncorhynchus mykiss",
            "Rainbow Trout",
            89.7,
            "Freshwater streams and lakes",
            "Least Concern",
            "/static/rainbow-trout.jpg",
            "Popular sport fish with similar ecological niche",
        ),
        RelatedSequence::new(
            "seq-003",
            "Salvelinus fontinalis",
            "Brook Trout",
            87.3,
            "Cold freshwater streams",
            "Least Concern",
            "/static/brook-trout.jpg",
            "Native North American char species",
        ),
        RelatedSequence::new(
            "seq-004",
            "Thymallus thymallus",
            "European Grayling",
            82.1,
            "Fast-flowing rivers",
            "Near Threatened",
            "/static/european-grayling.jpg",
            "Distinctive dorsal fin and unique spawning behavior",
        ),
        RelatedSequence::new(
            "seq-005",
            "Coregonus lavaretus",
            "European Whitefish",
            78.9,
            "Deep lakes and coastal waters",
            "Least Concern",
            "/static/european-whitefish.jpg",
            "Important commercial species in northern Europe",
        ),
        RelatedSequence::new(
            "seq-006",
            "Hucho hucho",
            "Huchen",
            76.4,
            "Large rivers in Danube basin",
            "Endangered",
            "/static/huchen-salmon.jpg",
            "Largest European salmonid, critically endangered",
        ),
    ]
}

/// Clé de tri
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Similarité décroissante
    #[default]
    Similarity,
    /// Nom scientifique croissant
    Name,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "similarity" => Ok(SortKey::Similarity),
            "name" => Ok(SortKey::Name),
            other => Err(format!("clé de tri inconnue: {}", other)),
        }
    }
}

/// Les trois entrées de l'écran d'exploration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreQuery {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
}

/// Filtre (sous-chaîne insensible à la casse, famille exacte) puis trie
pub fn filter_and_sort(records: &[RelatedSequence], query: &ExploreQuery) -> Vec<RelatedSequence> {
    let needle = query.text.to_lowercase();
    let family = query.family.as_deref().filter(|f| !f.is_empty());

    let mut out: Vec<RelatedSequence> = records
        .iter()
        .filter(|r| r.matches(&needle))
        .filter(|r| family.map_or(true, |f| r.family == f))
        .cloned()
        .collect();

    match query.sort {
        SortKey::Similarity => out.sort_by(|a, b| b.similarity.total_cmp(&a.similarity)),
        SortKey::Name => out.sort_by(|a, b| a.scientific_name.cmp(&b.scientific_name)),
    }
    out
}

/// Familles distinctes, pour le filtre
pub fn families(records: &[RelatedSequence]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.family.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Ouverture d'une fiche : pas de vue dédiée, on trace simplement la demande
pub fn explore_sequence(records: &[RelatedSequence], id: &str) -> Option<RelatedSequence> {
    let found = records.iter().find(|r| r.id == id).cloned();
    tracing::info!(sequence = id, found = found.is_some(), "Exploration d'une séquence");
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str, sort: SortKey) -> ExploreQuery {
        ExploreQuery {
            text: text.to_string(),
            family: None,
            sort,
        }
    }

    #[test]
    fn test_empty_query_keeps_all() {
        let records = related_sequences();
        assert_eq!(filter_and_sort(&records, &ExploreQuery::default()).len(), 6);
    }

    #[test]
    fn test_search_scientific_and_common_names() {
        let records = related_sequences();
        let salmo = filter_and_sort(&records, &query("SALMO", SortKey::Similarity));
        assert_eq!(
            salmo.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["seq-001"]
        );

        let trout = filter_and_sort(&records, &query("trout", SortKey::Name));
        let ids: Vec<_> = trout.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["seq-002", "seq-003"]);
    }

    #[test]
    fn test_family_filter_is_exact() {
        let records = related_sequences();
        let mut q = ExploreQuery::default();
        q.family = Some("salmonidae".to_string());
        assert!(filter_and_sort(&records, &q).is_empty());
        q.family = Some("Salmonidae".to_string());
        assert_eq!(filter_and_sort(&records, &q).len(), 6);
    }

    #[test]
    fn test_sort_by_name() {
        let records = related_sequences();
        let sorted = filter_and_sort(&records, &query("", SortKey::Name));
        assert_eq!(sorted.first().unwrap().scientific_name, "Coregonus lavaretus");
        assert_eq!(sorted.last().unwrap().scientific_name, "Thymallus thymallus");
    }

    #[test]
    fn test_conservation_badges() {
        let records = related_sequences();
        let badges: Vec<_> = records.iter().map(|r| r.conservation_badge()).collect();
        assert_eq!(badges[3], "warning");
        assert_eq!(badges[5], "destructive");
        assert_eq!(badges[0], "secondary");
    }

    #[test]
    fn test_families_are_distinct() {
        assert_eq!(families(&related_sequences()), vec!["Salmonidae".to_string()]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Name".parse::<SortKey>(), Ok(SortKey::Name));
        assert!("size".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_explore_unknown_sequence() {
        assert!(explore_sequence(&related_sequences(), "seq-999").is_none());
    }
}
