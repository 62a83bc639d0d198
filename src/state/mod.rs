//! State Management Module
//!
//! Provides the animation document, its bounded undo history, the store
//! that owns both, and document persistence with schema migration.

pub mod history;
pub mod migration;
pub mod persistence;
pub mod project;
pub mod store;

pub use history::{EditAction, History, DEFAULT_HISTORY_CAPACITY};
pub use migration::{migrate_project, CURRENT_SCHEMA_VERSION};
pub use persistence::{load_project, save_project};
pub use project::{DynamicEffect, EffectKind, Frame, Layer, ProjectState, MAX_FRAMES};
pub use store::{ProjectStore, SharedStore};
