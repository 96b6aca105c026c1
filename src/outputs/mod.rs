//! Feed assembly and output.
//!
//! # Submodules
//!
//! - [`feed`]: builds the [`FeedDocument`](crate::models::FeedDocument),
//!   including the placeholder floor
//! - [`rss`]: renders RSS 2.0 XML and writes it to disk
//!
//! # Output
//!
//! A single file (default `markets.xml`) replaced on every run.

pub mod feed;
pub mod rss;
