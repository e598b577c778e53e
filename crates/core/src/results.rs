//! Résultats d'analyse fictifs
//!
//! Enregistrements statiques affichés tels quels : rien n'est calculé.

use crate::error::{EdnaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Délai de l'écran de chargement des démos
pub const DEMO_LOADING_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub scientific_name: String,
    pub common_name: String,
    pub kingdom: String,
    pub phylum: String,
    pub class: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub confidence: f64,
}

impl Taxonomy {
    /// Rangs dans l'ordre, du règne à l'espèce
    pub fn ranks(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Kingdom", self.kingdom.as_str()),
            ("Phylum", self.phylum.as_str()),
            ("Class", self.class.as_str()),
            ("Order", self.order.as_str()),
            ("Family", self.family.as_str()),
            ("Genus", self.genus.as_str()),
            ("Species", self.species.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceQuality {
    pub length: u32,
    pub gc_content: f64,
    pub quality: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ecology {
    pub habitat: String,
    pub distribution: String,
    pub conservation: String,
    pub diet: String,
}

/// Résultat complet d'une identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub taxonomy: Taxonomy,
    pub sequence: SequenceQuality,
    pub ecology: Ecology,
}

const COI_REGION: &str = "COI (Cytochrome c oxidase subunit I)";

fn salmonid(
    scientific_name: &str,
    common_name: &str,
    genus: &str,
    species: &str,
    confidence: f64,
    gc_content: f64,
    ecology: [&str; 4],
) -> AnalysisResults {
    let [habitat, distribution, conservation, diet] = ecology;
    AnalysisResults {
        taxonomy: Taxonomy {
            scientific_name: scientific_name.to_string(),
            common_name: common_name.to_string(),
            kingdom: "Animalia".to_string(),
            phylum: "Chordata".to_string(),
            class: "Actinopterygii".to_string(),
            order: "Salmoniformes".to_string(),
            family: "Salmonidae".to_string(),
            genus: genus.to_string(),
            species: species.to_string(),
            confidence,
        },
        sequence: SequenceQuality {
            length: 658,
            gc_content,
            quality: "High".to_string(),
            region: COI_REGION.to_string(),
        },
        ecology: Ecology {
            habitat: habitat.to_string(),
            distribution: distribution.to_string(),
            conservation: conservation.to_string(),
            diet: diet.to_string(),
        },
    }
}

impl AnalysisResults {
    /// Résultat affiché à la fin du parcours principal
    pub fn brown_trout() -> Self {
        salmonid(
            "Salmo trutta",
            "Brown Trout",
            "Salmo",
            "trutta",
            98.7,
            52.3,
            [
                "Freshwater streams and lakes",
                "Europe, Asia, North America",
                "Least Concern",
                "Carnivorous - insects, crustaceans, small fish",
            ],
        )
    }

    pub fn atlantic_salmon() -> Self {
        salmonid(
            "Salmo salar",
            "Atlantic Salmon",
            "Salmo",
            "salar",
            99.2,
            48.7,
            [
                "North Atlantic Ocean, rivers and streams",
                "North Atlantic, Baltic Sea, North American and European coasts",
                "Least Concern",
                "Carnivorous - fish, crustaceans, insects",
            ],
        )
    }

    pub fn rainbow_trout() -> Self {
        salmonid(
            "Oncorhynchus mykiss",
            "Rainbow Trout",
            "Oncorhynchus",
            "mykiss",
            97.8,
            51.2,
            [
                "Cold freshwater streams, rivers, and lakes",
                "North America, introduced worldwide",
                "Least Concern",
                "Carnivorous - insects, crustaceans, small fish",
            ],
        )
    }
}

/// Tableaux de bord de démonstration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Demo {
    Salmon,
    Trout,
}

impl Demo {
    pub const ALL: [Demo; 2] = [Demo::Salmon, Demo::Trout];

    pub fn slug(self) -> &'static str {
        match self {
            Demo::Salmon => "salmon",
            Demo::Trout => "trout",
        }
    }

    pub fn results(self) -> AnalysisResults {
        match self {
            Demo::Salmon => AnalysisResults::atlantic_salmon(),
            Demo::Trout => AnalysisResults::rainbow_trout(),
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Demo {
    type Err = EdnaError;

    fn from_str(s: &str) -> Result<Self> {
        Demo::ALL
            .into_iter()
            .find(|d| d.slug() == s.to_lowercase())
            .ok_or_else(|| EdnaError::UnknownDemo(s.to_string()))
    }
}

/// Annotation de séquence de la vue détaillée
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub label: &'static str,
    pub value: &'static str,
}

/// Ligne de l'alignement multiple affiché
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentRow {
    pub name: &'static str,
    pub residues: &'static str,
}

/// Nœud de la lignée taxonomique statique de la vue détaillée
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageNode {
    pub id: &'static str,
    pub label: &'static str,
    pub x: u32,
    pub y: u32,
    pub is_user_sequence: bool,
}

pub const DETAIL_ZOOM_MIN: u32 = 50;
pub const DETAIL_ZOOM_MAX: u32 = 200;
pub const DETAIL_ZOOM_STEP: u32 = 25;

/// Vue détaillée : lignée statique sélectionnable et zoom en pourcentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedView {
    zoom_percent: u32,
    selected: Option<String>,
}

impl Default for DetailedView {
    fn default() -> Self {
        Self {
            zoom_percent: 100,
            selected: None,
        }
    }
}

impl DetailedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }

    pub fn zoom_in(&mut self) {
        self.zoom_percent = (self.zoom_percent + DETAIL_ZOOM_STEP).min(DETAIL_ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_percent = self
            .zoom_percent
            .saturating_sub(DETAIL_ZOOM_STEP)
            .max(DETAIL_ZOOM_MIN);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_percent = 100;
    }

    /// Sélectionne un nœud de la lignée; un id inconnu est ignoré
    pub fn select(&mut self, id: &str) {
        if Self::lineage().iter().any(|n| n.id == id) {
            self.selected = Some(id.to_string());
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Titre et texte du panneau de sélection
    pub fn caption(&self) -> Option<(&'static str, &'static str)> {
        const DEFAULT_TEXT: &str =
            "Click on nodes to explore evolutionary relationships and taxonomic information";
        let title = match self.selected.as_deref()? {
            "trutta" => {
                return Some((
                    "Salmo trutta (Your Sequence)",
                    "Brown trout - Your analyzed sequence with 98.7% confidence match",
                ))
            }
            "salmo" => "Genus Salmo",
            "salar" => "Salmo salar (Atlantic Salmon)",
            _ => "Selected Node",
        };
        Some((title, DEFAULT_TEXT))
    }

    pub fn lineage() -> Vec<LineageNode> {
        let node = |id: &'static str, label: &'static str, x: u32, y: u32| LineageNode {
            id,
            label,
            x,
            y,
            is_user_sequence: id == "trutta",
        };
        vec![
            node("root", "Salmoniformes", 50, 200),
            node("salmonidae", "Salmonidae", 150, 200),
            node("oncorhynchus", "Oncorhynchus", 250, 100),
            node("salmo", "Salmo", 250, 150),
            node("kisutch", "O. kisutch", 350, 120),
            node("trutta", "S. trutta", 350, 180),
            node("salar", "S. salar", 350, 220),
        ]
    }

    /// Branches en coude de la lignée, en données de chemin SVG
    pub fn lineage_paths() -> &'static [&'static str] {
        &[
            "M50 200 L150 200 L150 100 L250 100",
            "M150 200 L150 150 L250 150",
            "M150 200 L150 250 L250 250",
            "M150 200 L150 300 L250 300",
            "M250 150 L350 120",
            "M250 150 L350 180",
            "M250 250 L350 220",
            "M250 250 L350 280",
        ]
    }

    pub fn annotations() -> Vec<Annotation> {
        vec![
            Annotation { label: "Gene Region", value: COI_REGION },
            Annotation { label: "Feature Type", value: "Protein coding" },
            Annotation { label: "Start Codon", value: "ATG" },
            Annotation { label: "Stop Codon", value: "TAA" },
            Annotation { label: "GC Content", value: "52.3%" },
            Annotation { label: "AT Content", value: "47.7%" },
            Annotation { label: "Ambiguous Bases", value: "0" },
            Annotation { label: "Quality Score", value: "High" },
        ]
    }

    pub fn alignment() -> Vec<AlignmentRow> {
        vec![
            AlignmentRow {
                name: "S. trutta (Query)",
                residues: "ATCGATCGATCGTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCT",
            },
            AlignmentRow {
                name: "S. salar",
                residues: "ATCGATCGATCGTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGT",
            },
        ]
    }

    /// Mention affichée sous l'alignement
    pub fn alignment_window() -> &'static str {
        "Showing alignment positions 1-44 of 658 total positions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_lookup() {
        assert_eq!("salmon".parse::<Demo>().unwrap(), Demo::Salmon);
        assert_eq!("Trout".parse::<Demo>().unwrap(), Demo::Trout);
        assert!(matches!("whitefish".parse::<Demo>(), Err(EdnaError::UnknownDemo(_))));
    }

    #[test]
    fn test_demo_records() {
        let salmon = Demo::Salmon.results();
        assert_eq!(salmon.taxonomy.scientific_name, "Salmo salar");
        assert_eq!(salmon.taxonomy.confidence, 99.2);
        assert_eq!(Demo::Trout.results().sequence.gc_content, 51.2);
    }

    #[test]
    fn test_taxonomy_ranks_order() {
        let trout = AnalysisResults::brown_trout();
        let ranks = trout.taxonomy.ranks();
        assert_eq!(ranks.first(), Some(&("Kingdom", "Animalia")));
        assert_eq!(ranks.last(), Some(&("Species", "trutta")));
    }

    #[test]
    fn test_detail_zoom_bounds() {
        let mut view = DetailedView::new();
        for _ in 0..10 {
            view.zoom_in();
        }
        assert_eq!(view.zoom_percent(), 200);
        for _ in 0..10 {
            view.zoom_out();
        }
        assert_eq!(view.zoom_percent(), 50);
        view.reset_zoom();
        assert_eq!(view.zoom_percent(), 100);
    }

    #[test]
    fn test_detail_caption() {
        let mut view = DetailedView::new();
        assert!(view.caption().is_none());
        view.select("trutta");
        assert_eq!(view.caption().unwrap().0, "Salmo trutta (Your Sequence)");
        view.select("kisutch");
        assert_eq!(view.caption().unwrap().0, "Selected Node");
        view.select("unknown");
        assert_eq!(view.selected(), Some("kisutch"));
    }
}
