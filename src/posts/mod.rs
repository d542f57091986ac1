//! Dated post generation
//!
//! Writes Markdown posts with a YAML metadata header into the posts directory.

pub mod constants;
pub mod frontmatter;
pub mod generator;

pub use generator::PostWriter;
