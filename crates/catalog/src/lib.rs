//! Ordered, cached views over a library of collections, chapters and pages.
//!
//! A library is a plain directory tree:
//!
//! ```text
//! <root>/<collection>/<chapter>/<page>
//! ```
//!
//! [`Catalog`] answers existence checks and produces chapter listings, page
//! listings and a single flattened reading order for a whole collection.
//! Results are memoized for a configurable TTL, so changes on disk show up
//! once the previous result has gone stale.

pub mod error;
mod catalog;
pub mod names;
mod navigate;
pub mod order;
mod ranks;
mod scan;
mod ttl;

pub use crate::catalog::{Catalog, Page};
pub use crate::navigate::Neighbour;
pub use crate::ranks::{ChapterRanks, RankStore};
pub use crate::ttl::TtlCache;
