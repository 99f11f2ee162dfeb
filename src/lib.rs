//! mediastash — persisted local download registry for media server clients.
//!
//! Tracks media downloads as keyed records with a status lifecycle,
//! survives process restarts through a flat-text snapshot, migrates the
//! legacy single-blob schema exactly once, and notifies observers after
//! each committed mutation. Transfer mechanics, screens, and theming are
//! external collaborators; this crate only records metadata about
//! downloads.

pub mod database;
pub mod managers;
pub mod services;
pub mod types;
