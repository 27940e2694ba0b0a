//! Easel Catalog - built-in generation models
//!
//! The model descriptors an Easel canvas ships with, registered per node
//! kind, plus loading of operator-provided catalogs from JSON
//! configuration. The engine itself never hardcodes a model id: every
//! model a node can offer comes from a [`ModelRegistry`] built here.
//!
//! # Categories
//!
//! - **Text**: prompt writing, rewriting, and media description; also
//!   backs agent nodes
//! - **Image**: text-to-image and image-editing models
//! - **Video**: text-to-video models

pub mod config;
mod image;
mod text;
mod video;

use easel_graph::ModelRegistry;
use once_cell::sync::Lazy;

pub use config::{registry_from_json, CatalogError};

static BUILTIN: Lazy<ModelRegistry> = Lazy::new(|| {
    let mut registry = ModelRegistry::new();
    text::register(&mut registry);
    image::register(&mut registry);
    video::register(&mut registry);
    registry
});

/// The built-in model catalog
///
/// Built once on first use and shared immutably for the rest of the
/// process.
pub fn builtin() -> &'static ModelRegistry {
    &BUILTIN
}
