//! Fetcher factory
//!
//! Picks the network backend from the origin configuration.

use super::{DirFetcher, Fetcher, HttpFetcher, OfflineFetcher};
use crate::config::schema::OriginConfig;
use std::sync::Arc;

/// Create the fetcher for this origin
///
/// `offline` forces a network that rejects every request; otherwise a
/// configured `site_dir` wins over `base_url`.
pub fn create_fetcher(origin: &OriginConfig, offline: bool) -> Arc<dyn Fetcher> {
    if offline {
        return Arc::new(OfflineFetcher);
    }

    match origin.site_dir {
        Some(ref dir) => Arc::new(DirFetcher::new(dir.clone())),
        None => Arc::new(HttpFetcher::new(origin.base_url.clone())),
    }
}
