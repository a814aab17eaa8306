//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use chainread_storage::{ChainReader, HeadLookup};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<ChainReader>,
    pub heads: Arc<dyn HeadLookup>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(reader: Arc<ChainReader>, heads: Arc<dyn HeadLookup>) -> Self {
        Self {
            reader,
            heads,
            start_time: Instant::now(),
        }
    }
}
