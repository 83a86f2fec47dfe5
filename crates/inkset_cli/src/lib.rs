//! Inkset command line support
//!
//! Configuration loading and the SVG writer used by the `inkset` binary.

pub mod config;
pub mod svg;

pub use config::{FontsConfig, InksetConfig};
pub use svg::SvgWriter;
