//! Shelter - offline asset cache for a static site
//!
//! Precaches a site's bootstrap assets into versioned cache partitions,
//! retires stale versions on activation and answers requests from cache or
//! network depending on what was requested.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod notify;
pub mod store;
pub mod ui;
pub mod worker;

pub use error::{ShelterError, ShelterResult};
