//! Scope and stream management across many scopes and streams.

use std::sync::Arc;

use bytes::Bytes;
use tokio_test::{assert_err, assert_ok};

use streamctl::{
    ClientFactory, ControllerError, ErrorKind, MetadataController, ScalingPolicy, StreamConfiguration,
    StreamState,
};

const NUM_SCOPES: usize = 5;
const NUM_STREAMS: u32 = 20;
const NUM_EVENTS: usize = 100;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn create_seal_and_delete_streams(
    controller: &Arc<MetadataController>,
    clients: &ClientFactory,
    scope: &str,
) {
    for j in 1..=NUM_STREAMS {
        let stream = j.to_string();
        let config = StreamConfiguration::new(ScalingPolicy::fixed(j));

        let err = assert_err!(
            controller
                .create_stream("nonexistentScope", &stream, StreamConfiguration::default())
                .await
        );
        assert_eq!(err.kind(), Some(ErrorKind::ScopeNotFound));

        assert!(assert_ok!(controller.create_stream(scope, &stream, config).await));

        // Double the number of segments
        let config = StreamConfiguration::new(ScalingPolicy::fixed(j * 2));
        assert!(assert_ok!(controller.update_stream(scope, &stream, config).await));

        if j % 2 == 0 {
            let mut writer = assert_ok!(clients.create_event_writer(scope, &stream).await);
            for i in 0..NUM_EVENTS {
                assert_ok!(writer.write_event(&stream, Bytes::from(i.to_string())).await);
            }
            assert_eq!(
                clients
                    .segments()
                    .event_count(writer.stream(), writer.generation())
                    .await,
                NUM_EVENTS
            );
        }

        assert!(assert_ok!(controller.update_stream(scope, &stream, config).await));
        let info = controller.stream_info(scope, &stream).await.unwrap().unwrap();
        assert_eq!(info.epoch, 2);
        assert_eq!(info.config.segment_count(), j * 2);

        // Non-empty scope and unsealed stream cannot be deleted
        assert!(matches!(
            controller.delete_scope(scope).await,
            Err(ControllerError::ScopeNotEmpty { .. })
        ));
        assert!(matches!(
            controller.delete_stream(scope, &stream).await,
            Err(ControllerError::StreamNotSealed { .. })
        ));

        assert!(assert_ok!(controller.seal_stream(scope, &stream).await));
        assert!(assert_ok!(controller.delete_stream(scope, &stream).await));

        // Already sealed and deleted
        assert!(matches!(
            controller.seal_stream(scope, &stream).await,
            Err(ControllerError::StreamNotActive { .. })
        ));
        assert!(!assert_ok!(controller.delete_stream(scope, &stream).await));
    }
}

#[tokio::test]
async fn test_streams_and_scopes_management() {
    init_tracing();

    let controller = Arc::new(MetadataController::new());
    let clients = ClientFactory::new(Arc::clone(&controller));

    for i in 0..NUM_SCOPES {
        let scope = format!("testStreamsAndScopesManagement{}", i);

        assert!(!assert_ok!(controller.delete_scope(&scope).await));
        assert!(assert_ok!(controller.create_scope(&scope).await));

        create_seal_and_delete_streams(&controller, &clients, &scope).await;

        assert!(!assert_ok!(controller.create_scope(&scope).await));
        assert!(assert_ok!(controller.delete_scope(&scope).await));
    }

    assert!(controller.list_scopes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_permitted_only_while_active() {
    init_tracing();

    let controller = Arc::new(MetadataController::new());
    let clients = ClientFactory::new(Arc::clone(&controller));

    assert!(controller.create_scope("A").await.unwrap());
    assert!(controller
        .create_stream("A", "1", StreamConfiguration::new(ScalingPolicy::fixed(1)))
        .await
        .unwrap());
    assert!(controller
        .update_stream("A", "1", StreamConfiguration::new(ScalingPolicy::fixed(2)))
        .await
        .unwrap());

    let mut writer = clients.create_event_writer("A", "1").await.unwrap();
    assert_eq!(writer.epoch(), 1);
    writer
        .write_event("key", Bytes::from_static(b"event"))
        .await
        .unwrap();

    assert!(controller.delete_scope("A").await.is_err());
    assert!(controller.seal_stream("A", "1").await.unwrap());
    assert!(writer
        .write_event("key", Bytes::from_static(b"late"))
        .await
        .is_err());
    assert!(controller.delete_stream("A", "1").await.unwrap());
    assert!(controller.delete_scope("A").await.unwrap());

    let info = controller.stream_info("A", "1").await.unwrap().unwrap();
    assert_eq!(info.state, StreamState::Deleted);
}

#[tokio::test]
async fn test_recreated_stream_hides_previous_events() {
    init_tracing();

    let controller = Arc::new(MetadataController::new());
    let clients = ClientFactory::new(Arc::clone(&controller));
    let config = StreamConfiguration::new(ScalingPolicy::fixed(1));

    controller.create_scope("A").await.unwrap();
    controller.create_stream("A", "1", config).await.unwrap();

    let mut old_writer = clients.create_event_writer("A", "1").await.unwrap();
    assert_ok!(old_writer.write_event("key", Bytes::from_static(b"old")).await);

    assert!(controller.seal_stream("A", "1").await.unwrap());
    assert!(controller.delete_stream("A", "1").await.unwrap());
    assert!(controller.create_stream("A", "1", config).await.unwrap());

    let info = controller.stream_info("A", "1").await.unwrap().unwrap();
    assert_eq!(info.state, StreamState::Active);
    assert_eq!(info.generation, old_writer.generation() + 1);
    assert_eq!(clients.segments().event_count(&info.key, info.generation).await, 0);

    assert!(old_writer.is_stale().await.unwrap());
    assert_err!(old_writer.write_event("key", Bytes::from_static(b"late")).await);
    assert_eq!(clients.segments().event_count(&info.key, info.generation).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_lifecycles_in_one_scope() {
    init_tracing();

    let controller = Arc::new(MetadataController::new());
    controller.create_scope("shared").await.unwrap();

    let tasks: Vec<_> = (0..16u32)
        .map(|i| {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move {
                let name = format!("stream-{}", i);
                let config = StreamConfiguration::new(ScalingPolicy::fixed(i + 1));
                assert!(controller.create_stream("shared", &name, config).await?);
                assert!(controller.update_stream("shared", &name, config).await?);
                assert!(controller.seal_stream("shared", &name).await?);
                assert!(controller.delete_stream("shared", &name).await?);
                Ok::<_, ControllerError>(())
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(controller.is_scope_empty("shared").await.unwrap());
    assert!(controller.delete_scope("shared").await.unwrap());
}
