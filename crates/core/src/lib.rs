//! eDNA Core Library
//!
//! État du domaine pour la démo d'identification de séquences ADN : validation
//! de l'upload, simulation de progression, arbre phylogénétique interactif,
//! résultats fictifs, exploration et export.

pub mod error;
pub mod explore;
pub mod logging;
pub mod progress;
pub mod render;
pub mod report;
pub mod results;
pub mod tree;
pub mod upload;

// Réexportations principales
pub use error::{EdnaError, Result, UploadError};
pub use explore::{filter_and_sort, related_sequences, ExploreQuery, RelatedSequence, SortKey};
pub use logging::init_logging;
// Les macros log_operation et log_error sont automatiquement exportées à la racine du crate
pub use progress::{Phase, Pipeline, ProgressRun, ProgressSnapshot, RunStatus, StepSpec, StepStatus};
pub use render::{render_svg, Scene};
pub use report::{DownloadJob, DownloadStatus, ExportFormat, ReportSection};
pub use results::{AnalysisResults, Demo, DetailedView};
pub use tree::{fish_tree, TreeNode, TreeWidget};
pub use upload::{validate_file, validate_sequence, AnalysisSession, UploadForm, UploadedFile};
