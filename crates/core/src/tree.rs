//! Arbre phylogénétique interactif
//!
//! L'arbre est un littéral statique aux coordonnées posées à la main : pas de
//! construction, pas de calcul de distance, pas de layout. L'interaction se
//! limite à replier/déplier des sous-arbres, au survol, à la sélection et au
//! zoom appliqué au rendu.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Facteur appliqué par un cran de zoom
pub const ZOOM_STEP: f64 = 1.2;
/// Borne basse du zoom
pub const ZOOM_MIN: f64 = 0.5;
/// Borne haute du zoom
pub const ZOOM_MAX: f64 = 3.0;
/// Durée de l'écran de chargement affiché avant le premier rendu
pub const LOADING_DELAY: Duration = Duration::from_millis(2000);

/// Nœud de l'arbre
///
/// Un nœud sans `name` est une jonction structurelle : il a une position mais
/// n'est dessiné que s'il porte `has_expand_button`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomic_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub children: Vec<TreeNode>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub is_user_sequence: bool,
    #[serde(default)]
    pub has_expand_button: bool,
}

impl TreeNode {
    /// Jonction structurelle, dessinée comme un bouton « + »
    pub fn branch(id: &str, x: f64, y: f64, children: Vec<TreeNode>) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            scientific_name: None,
            common_name: None,
            taxonomic_level: None,
            alignment_score: None,
            confidence: None,
            x,
            y,
            children,
            collapsed: false,
            is_user_sequence: false,
            has_expand_button: true,
        }
    }

    /// Feuille d'espèce
    pub fn species(
        id: &str,
        name: &str,
        scientific_name: &str,
        alignment_score: f64,
        confidence: f64,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            scientific_name: Some(scientific_name.to_string()),
            common_name: None,
            taxonomic_level: Some("Species".to_string()),
            alignment_score: Some(alignment_score),
            confidence: Some(confidence),
            x,
            y,
            children: Vec::new(),
            collapsed: false,
            is_user_sequence: false,
            has_expand_button: false,
        }
    }

    pub fn with_common_name(mut self, common_name: &str) -> Self {
        self.common_name = Some(common_name.to_string());
        self
    }

    pub fn as_user_sequence(mut self) -> Self {
        self.is_user_sequence = true;
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Nom non vide, le cas échéant
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// Jonction sans identité propre
    pub fn is_structural(&self) -> bool {
        self.display_name().is_none()
    }

    /// Recherche en profondeur depuis ce nœud
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Nombre total de nœuds du sous-arbre, repliés compris
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Ids des nœuds atteignables sans traverser un nœud replié
    pub fn visible_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_visible(&mut ids);
        ids
    }

    fn collect_visible(&self, ids: &mut Vec<String>) {
        ids.push(self.id.clone());
        if !self.collapsed {
            for child in &self.children {
                child.collect_visible(ids);
            }
        }
    }

    /// Chemin d'index enfant menant à chaque id
    fn index_paths(&self, path: &mut Vec<usize>, index: &mut HashMap<String, Vec<usize>>) {
        index.insert(self.id.clone(), path.clone());
        for (i, child) in self.children.iter().enumerate() {
            path.push(i);
            child.index_paths(path, index);
            path.pop();
        }
    }

    fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        match path.split_first() {
            None => Some(self),
            Some((&i, rest)) => self.children.get_mut(i)?.node_at_mut(rest),
        }
    }

    fn node_at(&self, path: &[usize]) -> Option<&TreeNode> {
        match path.split_first() {
            None => Some(self),
            Some((&i, rest)) => self.children.get(i)?.node_at(rest),
        }
    }
}

/// Arbre des poissons présenté sur la page de résultats
pub fn fish_tree() -> TreeNode {
    let mut root = TreeNode::branch(
        "root",
        150.0,
        400.0,
        vec![
            TreeNode::species("zebrafish", "zebrafish", "Danio rerio", 98.7, 99.2, 400.0, 150.0)
                .with_common_name("Zebrafish")
                .as_user_sequence(),
            TreeNode::branch(
                "branch1",
                250.0,
                200.0,
                vec![TreeNode::species(
                    "danio-aesculapii",
                    "Danio aesculapii",
                    "Danio aesculapii",
                    89.3,
                    95.1,
                    400.0,
                    250.0,
                )],
            ),
            TreeNode::branch(
                "branch2",
                250.0,
                350.0,
                vec![
                    TreeNode::species(
                        "japanese-medaka",
                        "Japanese medaka",
                        "Oryzias latipes",
                        85.7,
                        92.4,
                        550.0,
                        250.0,
                    ),
                    TreeNode::branch(
                        "branch3",
                        450.0,
                        300.0,
                        vec![TreeNode::species(
                            "amazon-molly",
                            "Amazon molly",
                            "Poecilia formosa",
                            82.1,
                            88.3,
                            650.0,
                            300.0,
                        )],
                    ),
                    TreeNode::branch(
                        "branch4",
                        450.0,
                        350.0,
                        vec![
                            TreeNode::species(
                                "nile-tilapia",
                                "Nile tilapia",
                                "Oreochromis niloticus",
                                78.9,
                                85.7,
                                550.0,
                                400.0,
                            ),
                            TreeNode::branch(
                                "branch5",
                                550.0,
                                350.0,
                                vec![TreeNode::species(
                                    "guppy",
                                    "guppy",
                                    "Poecilia reticulata",
                                    75.4,
                                    82.1,
                                    650.0,
                                    400.0,
                                )],
                            ),
                        ],
                    ),
                ],
            ),
            TreeNode::branch(
                "branch6",
                250.0,
                450.0,
                vec![
                    TreeNode::species(
                        "torafugu",
                        "torafugu",
                        "Takifugu rubripes",
                        72.1,
                        79.8,
                        400.0,
                        450.0,
                    ),
                    TreeNode::species(
                        "tongue-sole",
                        "tongue sole",
                        "Cynoglossus semilaevis",
                        69.7,
                        76.5,
                        400.0,
                        500.0,
                    ),
                ],
            ),
            TreeNode::branch(
                "branch7",
                250.0,
                600.0,
                vec![TreeNode::branch(
                    "branch8",
                    350.0,
                    650.0,
                    vec![
                        TreeNode::species(
                            "cutthroat-trout",
                            "cutthroat trout",
                            "Oncorhynchus clarkii",
                            65.4,
                            73.2,
                            450.0,
                            700.0,
                        ),
                        TreeNode::species(
                            "atlantic-salmon",
                            "Atlantic salmon",
                            "Salmo salar",
                            62.8,
                            70.1,
                            450.0,
                            750.0,
                        ),
                    ],
                )],
            ),
        ],
    );
    root.name = Some("Root".to_string());
    root.has_expand_button = false;
    root
}

/// Widget d'arbre : l'arbre possédé plus l'état transitoire de l'interface
#[derive(Debug, Clone)]
pub struct TreeWidget {
    root: TreeNode,
    index: HashMap<String, Vec<usize>>,
    zoom: f64,
    selected: Option<String>,
    hovered: Option<String>,
    ready_at: Instant,
}

impl TreeWidget {
    /// Charge l'arbre, tout déplié, avec l'écran de chargement démarrant à `now`
    pub fn new(root: TreeNode, now: Instant) -> Self {
        let mut index = HashMap::new();
        root.index_paths(&mut Vec::new(), &mut index);

        if index.len() != root.node_count() {
            tracing::warn!("Arbre avec des ids dupliqués: la recherche retournera le dernier indexé");
        }

        Self {
            root,
            index,
            zoom: 1.0,
            selected: None,
            hovered: None,
            ready_at: now + LOADING_DELAY,
        }
    }

    /// Widget sur l'arbre des poissons
    pub fn fish(now: Instant) -> Self {
        Self::new(fish_tree(), now)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_loading(&self, now: Instant) -> bool {
        now < self.ready_at
    }

    /// Relance l'écran de chargement pour `delay` à partir de `now`
    pub fn restart_loading(&mut self, now: Instant, delay: Duration) {
        self.ready_at = now + delay;
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        match self.index.get(id) {
            Some(path) => self.root.node_at(path),
            None => self.root.find(id),
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        match self.index.get(id) {
            Some(path) => self.root.node_at_mut(path),
            None => self.root.find_mut(id),
        }
    }

    pub fn selected(&self) -> Option<&TreeNode> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn hovered(&self) -> Option<&TreeNode> {
        self.hovered.as_deref().and_then(|id| self.get(id))
    }

    /// Clic sur un nœud : inverse `collapsed` s'il a des enfants, le sélectionne toujours
    ///
    /// Un id inconnu ne fait rien.
    pub fn toggle(&mut self, id: &str) {
        let Some(node) = self.get_mut(id) else {
            tracing::debug!(node = id, "Nœud introuvable, clic ignoré");
            return;
        };

        if node.has_children() {
            node.collapsed = !node.collapsed;
            tracing::debug!(node = id, collapsed = node.collapsed, "Branche basculée");
        }
        self.selected = Some(id.to_string());
    }

    /// Survol d'un nœud, ou fin du survol avec `None`
    pub fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.filter(|id| self.get(id).is_some()).map(str::to_string);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(ZOOM_MIN);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.root.visible_ids()
    }

    /// Ids des nœuds repliés, dans l'ordre de parcours
    pub fn collapsed_ids(&self) -> Vec<String> {
        fn walk(node: &TreeNode, out: &mut Vec<String>) {
            if node.collapsed {
                out.push(node.id.clone());
            }
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}
