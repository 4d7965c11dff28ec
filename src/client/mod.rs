//! Data-path client
//!
//! Provides writers bound to a stream. A writer can only be opened while
//! the stream is Active, and it stops accepting events once the stream is
//! sealed.

pub mod segments;
pub mod writer;

pub use segments::SegmentStore;
pub use writer::{EventPosition, EventWriter};

use std::sync::Arc;

use crate::controller::MetadataController;
use crate::error::ControllerError;
use crate::registry::{StreamKey, StreamState};
use crate::store::{InMemoryMetadataStore, MetadataStore};

/// Error type for data-path operations
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Writer requested for a stream that is absent, sealed or deleted
    #[error("Stream not active: {0}")]
    StreamNotActive(StreamKey),

    /// Stream was sealed or deleted after the writer was opened
    #[error("Stream sealed: {0}")]
    StreamSealed(StreamKey),

    /// Stream was deleted and created again after the writer was opened
    #[error("Stream recreated: {0}")]
    StreamRecreated(StreamKey),

    /// The control plane failed
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Factory for writers
///
/// Shares one segment store between all writers it creates.
pub struct ClientFactory<S: MetadataStore = InMemoryMetadataStore> {
    controller: Arc<MetadataController<S>>,
    segments: Arc<SegmentStore>,
}

impl<S: MetadataStore> ClientFactory<S> {
    /// Create a factory bound to a controller
    pub fn new(controller: Arc<MetadataController<S>>) -> Self {
        Self {
            controller,
            segments: Arc::new(SegmentStore::new()),
        }
    }

    /// Get the segment store events are appended to
    pub fn segments(&self) -> &Arc<SegmentStore> {
        &self.segments
    }

    /// Open a writer on an active stream
    pub async fn create_event_writer(
        &self,
        scope: &str,
        stream: &str,
    ) -> Result<EventWriter<S>, WriterError> {
        let key = StreamKey::new(scope, stream);

        let info = match self.controller.stream_info(scope, stream).await? {
            Some(info) if info.state == StreamState::Active => info,
            _ => return Err(WriterError::StreamNotActive(key)),
        };

        tracing::debug!(
            stream = %key,
            generation = info.generation,
            epoch = info.epoch,
            segments = info.config.segment_count(),
            "Writer opened"
        );

        Ok(EventWriter::new(
            key,
            Arc::clone(&self.controller),
            Arc::clone(&self.segments),
            info.generation,
            info.epoch,
            info.config.segment_count(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::registry::{ScalingPolicy, StreamConfiguration};

    async fn setup(segments: u32) -> (Arc<MetadataController>, ClientFactory) {
        let controller = Arc::new(MetadataController::new());
        controller.create_scope("scope").await.unwrap();
        controller
            .create_stream(
                "scope",
                "stream",
                StreamConfiguration::new(ScalingPolicy::fixed(segments)),
            )
            .await
            .unwrap();
        let factory = ClientFactory::new(Arc::clone(&controller));
        (controller, factory)
    }

    #[tokio::test]
    async fn test_write_events() {
        let (_controller, factory) = setup(4).await;
        let mut writer = factory.create_event_writer("scope", "stream").await.unwrap();
        assert_eq!(writer.segment_count(), 4);

        for i in 0..100 {
            let position = writer
                .write_event(&i.to_string(), Bytes::from(i.to_string()))
                .await
                .unwrap();
            assert!(position.segment < 4);
        }

        assert_eq!(writer.events_written(), 100);
        assert_eq!(
            factory
                .segments()
                .event_count(writer.stream(), writer.generation())
                .await,
            100
        );
    }

    #[tokio::test]
    async fn test_same_routing_key_same_segment() {
        let (_controller, factory) = setup(8).await;
        let mut writer = factory.create_event_writer("scope", "stream").await.unwrap();

        let first = writer.write_event("user-1", Bytes::from_static(b"a")).await.unwrap();
        let second = writer.write_event("user-1", Bytes::from_static(b"b")).await.unwrap();

        assert_eq!(first.segment, second.segment);
        assert_eq!(second.offset, first.offset + 1);
        assert_eq!(
            factory
                .segments()
                .read(writer.stream(), writer.generation(), first.segment)
                .await,
            vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]
        );
    }

    #[tokio::test]
    async fn test_writer_follows_updates() {
        let (controller, factory) = setup(1).await;
        let mut writer = factory.create_event_writer("scope", "stream").await.unwrap();
        assert!(!writer.is_stale().await.unwrap());

        controller
            .update_stream(
                "scope",
                "stream",
                StreamConfiguration::new(ScalingPolicy::fixed(2)),
            )
            .await
            .unwrap();
        assert!(writer.is_stale().await.unwrap());

        writer.write_event("key", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(writer.epoch(), 1);
        assert_eq!(writer.segment_count(), 2);
        assert!(!writer.is_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_sealed_stream_rejects_writes() {
        let (controller, factory) = setup(1).await;
        let mut writer = factory.create_event_writer("scope", "stream").await.unwrap();
        writer.write_event("key", Bytes::from_static(b"x")).await.unwrap();

        controller.seal_stream("scope", "stream").await.unwrap();

        let result = writer.write_event("key", Bytes::from_static(b"y")).await;
        assert!(matches!(result, Err(WriterError::StreamSealed(_))));
        assert_eq!(writer.events_written(), 1);

        let result = factory.create_event_writer("scope", "stream").await;
        assert!(matches!(result, Err(WriterError::StreamNotActive(_))));
    }

    #[tokio::test]
    async fn test_recreated_stream_starts_empty() {
        let (controller, factory) = setup(1).await;
        let mut old_writer = factory.create_event_writer("scope", "stream").await.unwrap();
        old_writer
            .write_event("key", Bytes::from_static(b"old"))
            .await
            .unwrap();

        controller.seal_stream("scope", "stream").await.unwrap();
        controller.delete_stream("scope", "stream").await.unwrap();
        assert!(controller
            .create_stream(
                "scope",
                "stream",
                StreamConfiguration::new(ScalingPolicy::fixed(1)),
            )
            .await
            .unwrap());

        let new_writer = factory.create_event_writer("scope", "stream").await.unwrap();
        assert_eq!(new_writer.generation(), old_writer.generation() + 1);
        assert_eq!(
            factory
                .segments()
                .event_count(new_writer.stream(), new_writer.generation())
                .await,
            0
        );

        // The writer from the previous generation must not reach the new stream
        assert!(old_writer.is_stale().await.unwrap());
        let result = old_writer.write_event("key", Bytes::from_static(b"late")).await;
        assert!(matches!(result, Err(WriterError::StreamRecreated(_))));
        assert_eq!(
            factory
                .segments()
                .event_count(new_writer.stream(), new_writer.generation())
                .await,
            0
        );
        assert!(!new_writer.is_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_writer_on_missing_stream() {
        let (_controller, factory) = setup(1).await;

        let result = factory.create_event_writer("scope", "missing").await;
        assert!(matches!(result, Err(WriterError::StreamNotActive(_))));
    }
}
