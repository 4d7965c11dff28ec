//! In-memory segment storage
//!
//! Keeps the events appended to each segment of each stream. Events are
//! stored per stream generation, so a stream created again under a deleted
//! name starts with empty segments. Payloads are `Bytes`, so reads hand out
//! reference-counted views rather than copies.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::registry::StreamKey;

/// Event storage for every segment of every stream
#[derive(Debug, Default)]
pub struct SegmentStore {
    /// Per stream generation, the events of each segment in append order
    segments: RwLock<HashMap<(StreamKey, u64), HashMap<u32, Vec<Bytes>>>>,
}

impl SegmentStore {
    /// Create an empty segment store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its offset within the segment
    pub async fn append(
        &self,
        key: &StreamKey,
        generation: u64,
        segment: u32,
        event: Bytes,
    ) -> u64 {
        let mut streams = self.segments.write().await;
        let events = streams
            .entry((key.clone(), generation))
            .or_default()
            .entry(segment)
            .or_default();

        events.push(event);
        (events.len() - 1) as u64
    }

    /// Events of one segment in append order
    pub async fn read(&self, key: &StreamKey, generation: u64, segment: u32) -> Vec<Bytes> {
        self.segments
            .read()
            .await
            .get(&(key.clone(), generation))
            .and_then(|segments| segments.get(&segment))
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of events stored for one generation of a stream
    pub async fn event_count(&self, key: &StreamKey, generation: u64) -> usize {
        self.segments
            .read()
            .await
            .get(&(key.clone(), generation))
            .map_or(0, |segments| segments.values().map(Vec::len).sum())
    }

    /// Indexes of the segments holding at least one event, sorted
    pub async fn segment_ids(&self, key: &StreamKey, generation: u64) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .segments
            .read()
            .await
            .get(&(key.clone(), generation))
            .map(|segments| segments.keys().copied().collect())
            .unwrap_or_default();

        ids.sort_unstable();
        ids
    }
}
