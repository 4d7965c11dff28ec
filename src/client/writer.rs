//! Event writer
//!
//! Appends events to the segments of one stream. Events with the same
//! routing key always land in the same segment for a given segment count.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bytes::Bytes;

use super::segments::SegmentStore;
use super::WriterError;
use crate::controller::MetadataController;
use crate::registry::{StreamKey, StreamState};
use crate::store::MetadataStore;

/// Location of a written event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPosition {
    /// Segment index the event was routed to
    pub segment: u32,
    /// Offset of the event within the segment
    pub offset: u64,
}

/// Writer bound to a single stream
///
/// The stream's state is checked before every append, so once the stream is
/// sealed all further writes fail with [`WriterError::StreamSealed`]. A writer
/// is also bound to the generation it was opened on and never writes into a
/// stream created again under the same name.
pub struct EventWriter<S: MetadataStore> {
    key: StreamKey,
    controller: Arc<MetadataController<S>>,
    segments: Arc<SegmentStore>,
    generation: u64,
    /// Configuration epoch the routing below was computed from
    epoch: u64,
    segment_count: u32,
    events_written: u64,
}

impl<S: MetadataStore> EventWriter<S> {
    pub(super) fn new(
        key: StreamKey,
        controller: Arc<MetadataController<S>>,
        segments: Arc<SegmentStore>,
        generation: u64,
        epoch: u64,
        segment_count: u32,
    ) -> Self {
        Self {
            key,
            controller,
            segments,
            generation,
            epoch,
            segment_count,
            events_written: 0,
        }
    }

    /// Stream this writer appends to
    pub fn stream(&self) -> &StreamKey {
        &self.key
    }

    /// Generation of the stream this writer was opened on
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configuration epoch currently used for routing
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of segments events are currently spread over
    pub fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Number of events written by this writer
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Write an event
    ///
    /// Picks up configuration updates made since the previous write.
    pub async fn write_event(
        &mut self,
        routing_key: &str,
        event: Bytes,
    ) -> Result<EventPosition, WriterError> {
        let info = self
            .controller
            .stream_info(&self.key.scope, &self.key.name)
            .await?
            .filter(|info| info.state == StreamState::Active)
            .ok_or_else(|| WriterError::StreamSealed(self.key.clone()))?;

        if info.generation != self.generation {
            tracing::warn!(
                stream = %self.key,
                generation = self.generation,
                current = info.generation,
                "Write rejected, stream was recreated"
            );
            return Err(WriterError::StreamRecreated(self.key.clone()));
        }

        if info.epoch != self.epoch {
            tracing::debug!(
                stream = %self.key,
                old_epoch = self.epoch,
                new_epoch = info.epoch,
                segments = info.config.segment_count(),
                "Writer picked up new configuration"
            );
            self.epoch = info.epoch;
            self.segment_count = info.config.segment_count();
        }

        let segment = route(routing_key, self.segment_count);
        let offset = self
            .segments
            .append(&self.key, self.generation, segment, event)
            .await;
        self.events_written += 1;

        tracing::trace!(stream = %self.key, segment, offset, "Event written");

        Ok(EventPosition { segment, offset })
    }

    /// Whether the stream's configuration changed since the last write, or
    /// the stream this writer was opened on no longer exists
    pub async fn is_stale(&self) -> Result<bool, WriterError> {
        Ok(self
            .controller
            .stream_info(&self.key.scope, &self.key.name)
            .await?
            .map_or(true, |info| {
                info.generation != self.generation || info.epoch != self.epoch
            }))
    }
}

/// Map a routing key onto one of `segment_count` segments
fn route(routing_key: &str, segment_count: u32) -> u32 {
    let mut hasher = DefaultHasher::new();
    routing_key.hash(&mut hasher);
    (hasher.finish() % u64::from(segment_count.max(1))) as u32
}
