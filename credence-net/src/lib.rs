//! Credence Network Layer
//!
//! Provides the HTTP side of link following:
//! - Client construction with timeout, optional proxy and user-agent rotation
//! - Page scraping that keeps absolute hyperlinks inline with the text

pub mod client;
pub mod scraper;

pub use client::*;
pub use scraper::*;
