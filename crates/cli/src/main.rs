//! CLI pour la démo eDNA Analysis

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

mod commands;
mod display;

use commands::{explore, playback, results, tree, validate};

#[derive(Parser)]
#[command(name = "edna")]
#[command(about = "Démo d'identification de séquences ADN environnementales", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Niveau de verbosité
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Entrée de l'analyse : un fichier (jugé sur son nom) ou une séquence collée
#[derive(clap::Args, Clone, Debug)]
pub struct InputArgs {
    /// Fichier de séquences (.fasta, .fa, .csv, .txt)
    #[arg(short, long, conflicts_with = "sequence")]
    pub file: Option<PathBuf>,

    /// Séquence collée, en-tête FASTA compris
    #[arg(short, long)]
    pub sequence: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Valide une entrée comme le formulaire d'upload
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Valide l'entrée puis joue la simulation de traitement
    Process {
        #[command(flatten)]
        input: InputArgs,

        /// Facteur d'accélération des minuteries (1.0 = temps réel)
        #[arg(long, default_value = "1.0")]
        speed: f64,
    },

    /// Joue la simulation d'analyse
    Analyze {
        /// Facteur d'accélération des minuteries (1.0 = temps réel)
        #[arg(long, default_value = "1.0")]
        speed: f64,
    },

    /// Exporte l'arbre phylogénétique en SVG
    Tree {
        /// Nœuds à replier (répétable)
        #[arg(short, long)]
        collapse: Vec<String>,

        /// Nombre de pas de zoom avant
        #[arg(long, default_value = "0")]
        zoom_in: u32,

        /// Nombre de pas de zoom arrière
        #[arg(long, default_value = "0")]
        zoom_out: u32,

        /// Nœud survolé (affiche son infobulle)
        #[arg(long)]
        hover: Option<String>,

        /// Fichier SVG de sortie (sortie standard sinon)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Liste les séquences apparentées
    Explore {
        /// Recherche sur le nom scientifique ou commun
        #[arg(short, long, default_value = "")]
        query: String,

        /// Famille exacte
        #[arg(long)]
        family: Option<String>,

        /// Clé de tri
        #[arg(long, value_enum, default_value = "similarity")]
        sort: SortArg,

        /// Format de sortie
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Fichier de sortie (JSON uniquement)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Affiche les résultats d'identification
    Results {
        /// Démo à afficher (salmon, trout); résultats principaux sinon
        #[arg(long)]
        demo: Option<String>,

        /// Format de sortie
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum SortArg {
    Similarity,
    Name,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    edna_core::init_logging(level);

    match cli.command {
        Commands::Validate { input } => {
            validate::run(&input)?;
        }
        Commands::Process { input, speed } => {
            playback::process(&input, speed)?;
        }
        Commands::Analyze { speed } => {
            playback::analyze(speed)?;
        }
        Commands::Tree {
            collapse,
            zoom_in,
            zoom_out,
            hover,
            output,
        } => {
            let options = tree::TreeOptions {
                collapse,
                zoom_in,
                zoom_out,
                hover,
            };
            tree::run(&options, output)?;
        }
        Commands::Explore {
            query,
            family,
            sort,
            format,
            output,
        } => {
            explore::run(query, family, sort, format, output)?;
        }
        Commands::Results { demo, format } => {
            results::run(demo.as_deref(), format)?;
        }
    }

    Ok(())
}

/// Crée une barre de progression
pub fn create_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message(msg.to_string());
    pb
}
