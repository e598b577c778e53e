//! Sous-commandes de la CLI

pub mod explore;
pub mod playback;
pub mod results;
pub mod tree;
pub mod validate;
