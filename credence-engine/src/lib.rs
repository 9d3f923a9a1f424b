//! Credence Engine
//!
//! The components that consult the domain registry:
//! - **Frontier**: extracts and ranks candidate links from page text
//! - **Crawler**: bounded, cycle-safe recursive link following
//! - **Fetcher**: HTTP page fetching behind a red-flag gate
//! - **Analyzer**: default keyword-based insight extraction
//! - **Confidence**: combines insight volume with source trust
//! - **Prioritizer**: orders and caps validation evidence by trust class

pub mod traits;
pub mod fetcher;
pub mod frontier;
pub mod crawler;
pub mod analyzer;
pub mod confidence;
pub mod prioritizer;

pub use traits::*;
pub use fetcher::*;
pub use frontier::*;
pub use crawler::*;
pub use analyzer::*;
pub use confidence::*;
pub use prioritizer::*;
