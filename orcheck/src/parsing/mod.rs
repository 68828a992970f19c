//! Parsers for the weekly OR list text format.
//!
//! # Parsers
//!
//! - [`record_parser`]: one observation record (`ID=...,TARGET=(...),...`)
//! - [`comment_parser`]: comment blocks, the low-visibility and approval
//!   tables, and per-observation directives
//! - [`catalog`]: the loader that assembles both into a [`crate::models::Catalog`]
//!
//! # Example
//!
//! ```no_run
//! use orcheck::parsing::CatalogLoader;
//! use std::path::Path;
//!
//! let catalog = CatalogLoader::load_file(Path::new("week_310.or"))
//!     .expect("Failed to load OR list");
//! println!("{} observations", catalog.len());
//! ```

pub mod catalog;
pub mod comment_parser;
pub mod record_parser;

#[cfg(test)]
mod comment_parser_tests;

pub use catalog::CatalogLoader;
