//! Affichage en tableaux

pub mod tables;
