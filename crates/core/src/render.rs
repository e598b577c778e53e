//! Rendu SVG de l'arbre phylogénétique
//!
//! Le rendu est une fonction pure de l'arbre et de l'état de vue (zoom,
//! sélection, survol). On construit d'abord une [`Scene`] géométrique, testable
//! sans parser de SVG, puis on la sérialise avec le crate `svg`.

use crate::tree::{TreeNode, TreeWidget};
use serde::Serialize;
use svg::node::element::{Anchor, Circle, Group, Path, Rectangle, Text};
use svg::Document;

/// Taille du canevas (viewBox carrée)
pub const CANVAS_SIZE: i32 = 800;

const RELATED_COLOR: &str = "hsl(142, 71%, 45%)";
const QUERY_COLOR: &str = "hsl(217, 91%, 60%)";
const BACKGROUND_COLOR: &str = "hsl(222, 47%, 11%)";
const LABEL_COLOR: &str = "white";

const QUERY_RADIUS: f64 = 25.0;
const NODE_RADIUS: f64 = 20.0;
const LABEL_OFFSET: (f64, f64) = (35.0, 5.0);
const FONT_SIZE: f64 = 14.0;
const GLYPH_FONT_SIZE: f64 = 16.0;
/// Position des points de contrôle, en fraction de la demi-portée horizontale
const CURVE_TENSION: f64 = 0.7;

/// État de vue passé au rendu
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View<'a> {
    pub zoom: f64,
    pub selected: Option<&'a str>,
    pub hovered: Option<&'a str>,
}

impl Default for View<'_> {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            selected: None,
            hovered: None,
        }
    }
}

impl TreeWidget {
    pub fn view(&self) -> View<'_> {
        View {
            zoom: self.zoom(),
            selected: self.selected().map(|n| n.id.as_str()),
            hovered: self.hovered().map(|n| n.id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn scaled(x: f64, y: f64, zoom: f64) -> Self {
        Self {
            x: x * zoom,
            y: y * zoom,
        }
    }
}

/// Courbe de Bézier cubique reliant un parent à un enfant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub parent: String,
    pub child: String,
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
    pub stroke_width: f64,
}

impl Connector {
    /// Attribut `d` du chemin SVG
    pub fn path_data(&self) -> String {
        format!(
            "M {} {} C {} {} {} {} {} {}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }
}

/// Courbe en S : points de contrôle à 70 % de la demi-portée depuis chaque extrémité
pub fn s_curve(start: Point, end: Point) -> (Point, Point) {
    let mid_x = (start.x + end.x) / 2.0;
    let control1 = Point {
        x: start.x + (mid_x - start.x) * CURVE_TENSION,
        y: start.y,
    };
    let control2 = Point {
        x: end.x - (end.x - mid_x) * CURVE_TENSION,
        y: end.y,
    };
    (control1, control2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphKind {
    /// La séquence de l'utilisateur
    Query,
    /// Séquence apparentée
    Related,
    /// Jonction avec bouton de dépliage
    Expandable { collapsed: bool },
}

/// Nœud dessiné : cercle, icône et étiquette éventuelle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeGlyph {
    pub id: String,
    pub kind: GlyphKind,
    pub center: Point,
    pub radius: f64,
    pub label: Option<String>,
    pub selected: bool,
    pub hovered: bool,
}

impl NodeGlyph {
    /// Symbole du bouton d'une jonction
    pub fn expand_symbol(&self) -> Option<&'static str> {
        match self.kind {
            GlyphKind::Expandable { collapsed: true } => Some("+"),
            GlyphKind::Expandable { collapsed: false } => Some("\u{2212}"),
            _ => None,
        }
    }
}

/// Infobulle du nœud survolé
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub title: String,
    pub common_name: Option<String>,
    pub taxonomic_level: Option<String>,
    pub alignment_score: Option<f64>,
    pub confidence: Option<f64>,
    pub is_user_sequence: bool,
}

impl Tooltip {
    fn for_node(node: &TreeNode) -> Option<Self> {
        let name = node.display_name()?;
        Some(Self {
            title: node.scientific_name.clone().unwrap_or_else(|| name.to_string()),
            common_name: node.common_name.clone(),
            taxonomic_level: node.taxonomic_level.clone(),
            alignment_score: node.alignment_score,
            confidence: node.confidence,
            is_user_sequence: node.is_user_sequence,
        })
    }

    /// Lignes de texte affichées, dans l'ordre
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone()];
        if let Some(common) = &self.common_name {
            lines.push(common.clone());
        }
        if let Some(level) = &self.taxonomic_level {
            lines.push(level.clone());
        }
        if let Some(score) = self.alignment_score {
            lines.push(format!("Alignment: {}%", score));
        }
        if let Some(confidence) = self.confidence {
            lines.push(format!("Confidence: {}%", confidence));
        }
        if self.is_user_sequence {
            lines.push("Your Sequence".to_string());
        }
        lines
    }
}

/// Géométrie complète d'un rendu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub zoom: f64,
    pub connectors: Vec<Connector>,
    pub nodes: Vec<NodeGlyph>,
    pub tooltip: Option<Tooltip>,
}

impl Scene {
    pub fn node(&self, id: &str) -> Option<&NodeGlyph> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connector(&self, parent: &str, child: &str) -> Option<&Connector> {
        self.connectors
            .iter()
            .find(|c| c.parent == parent && c.child == child)
    }

    /// Sérialise la scène; `link_prefix` fait de chaque nœud un lien `{prefix}{id}`
    pub fn to_svg(&self, link_prefix: Option<&str>) -> String {
        let zoom = self.zoom;
        let mut doc = Document::new()
            .set("viewBox", (0, 0, CANVAS_SIZE, CANVAS_SIZE))
            .set("width", "100%")
            .set("height", "100%");

        // Les connexions d'abord, derrière les nœuds
        let mut edges = Group::new().set("class", "tree-connectors");
        for connector in &self.connectors {
            edges = edges.add(
                Path::new()
                    .set("d", connector.path_data())
                    .set("stroke", RELATED_COLOR)
                    .set("stroke-width", connector.stroke_width)
                    .set("fill", "none"),
            );
        }
        doc = doc.add(edges);

        for glyph in &self.nodes {
            let group = render_glyph(glyph, zoom);
            doc = match link_prefix {
                Some(prefix) => doc.add(
                    Anchor::new()
                        .set("href", format!("{}{}", prefix, glyph.id))
                        .add(group),
                ),
                None => doc.add(group),
            };
        }

        if let Some(tooltip) = &self.tooltip {
            doc = doc.add(render_tooltip(tooltip));
        }

        doc.to_string()
    }
}

fn render_glyph(glyph: &NodeGlyph, zoom: f64) -> Group {
    let (fill, stroke) = match glyph.kind {
        GlyphKind::Expandable { .. } => (BACKGROUND_COLOR, RELATED_COLOR),
        GlyphKind::Query => (QUERY_COLOR, BACKGROUND_COLOR),
        GlyphKind::Related => (RELATED_COLOR, BACKGROUND_COLOR),
    };
    let stroke_width = if glyph.selected || glyph.hovered { 4.0 } else { 2.0 };

    let mut group = Group::new()
        .set("class", "tree-node")
        .set("data-node-id", glyph.id.as_str())
        .add(
            Circle::new()
                .set("cx", glyph.center.x)
                .set("cy", glyph.center.y)
                .set("r", glyph.radius)
                .set("fill", fill)
                .set("stroke", stroke)
                .set("stroke-width", stroke_width),
        );

    if let Some(symbol) = glyph.expand_symbol() {
        group = group.add(
            Text::new(symbol)
                .set("x", glyph.center.x)
                .set("y", glyph.center.y + 4.0 * zoom)
                .set("font-size", GLYPH_FONT_SIZE * zoom)
                .set("text-anchor", "middle")
                .set("font-weight", "bold")
                .set("fill", LABEL_COLOR),
        );
    }

    if let Some(label) = &glyph.label {
        group = group
            .add(
                Text::new("\u{1F41F}")
                    .set("x", glyph.center.x)
                    .set("y", glyph.center.y + 3.0 * zoom)
                    .set("font-size", FONT_SIZE * zoom)
                    .set("text-anchor", "middle"),
            )
            .add(
                Text::new(label.as_str())
                    .set("x", glyph.center.x + LABEL_OFFSET.0 * zoom)
                    .set("y", glyph.center.y + LABEL_OFFSET.1 * zoom)
                    .set("font-size", FONT_SIZE * zoom)
                    .set("fill", LABEL_COLOR),
            );
    }

    group
}

fn render_tooltip(tooltip: &Tooltip) -> Group {
    let lines = tooltip.lines();
    let width = 260.0;
    let height = 16.0 + lines.len() as f64 * 18.0;
    let x = CANVAS_SIZE as f64 - width - 16.0;
    let y = 16.0;

    let mut group = Group::new().set("class", "tree-tooltip").add(
        Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", width)
            .set("height", height)
            .set("rx", 8)
            .set("fill", BACKGROUND_COLOR)
            .set("stroke", RELATED_COLOR),
    );
    for (i, line) in lines.iter().enumerate() {
        group = group.add(
            Text::new(line.as_str())
                .set("x", x + 12.0)
                .set("y", y + 24.0 + i as f64 * 18.0)
                .set("font-size", if i == 0 { 14 } else { 12 })
                .set("fill", LABEL_COLOR),
        );
    }
    group
}

/// Construit la scène pour l'arbre et la vue donnés
pub fn build_scene(root: &TreeNode, view: &View<'_>) -> Scene {
    let mut scene = Scene {
        zoom: view.zoom,
        connectors: Vec::new(),
        nodes: Vec::new(),
        tooltip: None,
    };
    collect_connectors(root, view.zoom, &mut scene.connectors);
    collect_nodes(root, view, &mut scene.nodes);
    scene.tooltip = view
        .hovered
        .and_then(|id| root.find(id))
        .and_then(Tooltip::for_node);
    scene
}

fn collect_connectors(node: &TreeNode, zoom: f64, out: &mut Vec<Connector>) {
    if node.collapsed {
        return;
    }
    for child in &node.children {
        let start = Point::scaled(node.x, node.y, zoom);
        let end = Point::scaled(child.x, child.y, zoom);
        let (control1, control2) = s_curve(start, end);
        let width = if child.is_user_sequence { 4.0 } else { 3.0 };
        out.push(Connector {
            parent: node.id.clone(),
            child: child.id.clone(),
            start,
            control1,
            control2,
            end,
            stroke_width: width * zoom,
        });
        collect_connectors(child, zoom, out);
    }
}

fn collect_nodes(node: &TreeNode, view: &View<'_>, out: &mut Vec<NodeGlyph>) {
    let drawn = !node.is_structural() || node.has_expand_button;

    if drawn {
        let kind = if node.has_expand_button {
            GlyphKind::Expandable {
                collapsed: node.collapsed,
            }
        } else if node.is_user_sequence {
            GlyphKind::Query
        } else {
            GlyphKind::Related
        };
        let radius = if node.is_user_sequence {
            QUERY_RADIUS
        } else {
            NODE_RADIUS
        };
        let label = if node.has_expand_button {
            None
        } else {
            node.display_name().map(str::to_string)
        };

        out.push(NodeGlyph {
            id: node.id.clone(),
            kind,
            center: Point::scaled(node.x, node.y, view.zoom),
            radius: radius * view.zoom,
            label,
            selected: view.selected == Some(node.id.as_str()),
            hovered: view.hovered == Some(node.id.as_str()),
        });
    }

    if !node.collapsed {
        for child in &node.children {
            collect_nodes(child, view, out);
        }
    }
}

/// Rendu SVG du widget dans son état courant
pub fn render_svg(widget: &TreeWidget, link_prefix: Option<&str>) -> String {
    build_scene(widget.root(), &widget.view()).to_svg(link_prefix)
}
