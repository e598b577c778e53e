//! Commande d'export de l'arbre phylogénétique

use anyhow::Result;
use edna_core::{log_operation, render_svg, TreeWidget};
use std::path::PathBuf;
use std::time::Instant;

/// État de vue appliqué avant le rendu
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub collapse: Vec<String>,
    pub zoom_in: u32,
    pub zoom_out: u32,
    pub hover: Option<String>,
}

/// Rejoue les interactions sur l'arbre puis le rend
pub fn render(options: &TreeOptions) -> String {
    let mut widget = TreeWidget::fish(Instant::now());

    for id in &options.collapse {
        if widget.get(id).is_none() {
            tracing::warn!(node = %id, "Nœud inconnu ignoré");
        }
        widget.toggle(id);
    }
    for _ in 0..options.zoom_in {
        widget.zoom_in();
    }
    for _ in 0..options.zoom_out {
        widget.zoom_out();
    }
    widget.hover(options.hover.as_deref());

    render_svg(&widget, None)
}

pub fn run(options: &TreeOptions, output: Option<PathBuf>) -> Result<()> {
    let svg = log_operation!("tree_export", { render(options) });

    match output {
        Some(path) => {
            std::fs::write(&path, svg)?;
            println!("🌳 Arbre écrit dans: {}", path.display());
        }
        None => println!("{}", svg),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render_shows_every_species() {
        let svg = render(&TreeOptions::default());
        assert!(svg.contains("viewBox=\"0 0 800 800\""));
        assert!(svg.contains("Japanese medaka"));
        assert!(svg.contains("Atlantic salmon"));
    }

    #[test]
    fn test_collapsed_branch_is_hidden() {
        let svg = render(&TreeOptions {
            collapse: vec!["branch7".to_string(), "nope".to_string()],
            ..Default::default()
        });
        assert!(!svg.contains("Atlantic salmon"));
        assert!(svg.contains("Japanese medaka"));
    }

    #[test]
    fn test_hover_adds_tooltip() {
        let svg = render(&TreeOptions {
            hover: Some("zebrafish".to_string()),
            ..Default::default()
        });
        assert!(svg.contains("Your Sequence"));
    }
}
