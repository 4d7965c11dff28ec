//! Scope and stream lifecycle walkthrough
//!
//! Run with: cargo run --example lifecycle [NUM_SCOPES] [NUM_STREAMS]
//!
//! For each scope, creates a range of streams, updates them, writes events
//! to the even-numbered ones, then seals and deletes them, exercising the
//! illegal transitions along the way. Set `RUST_LOG=streamctl=debug` to see
//! no-op results as well.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use streamctl::{
    ClientFactory, ControllerError, MetadataController, ScalingPolicy, StreamConfiguration,
};

const NUM_EVENTS: usize = 100;

fn print_usage() {
    eprintln!("Usage: lifecycle [NUM_SCOPES] [NUM_STREAMS]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  lifecycle          # 5 scopes with 20 streams each");
    eprintln!("  lifecycle 2 4      # 2 scopes with 4 streams each");
}

fn parse_arg(arg: Option<String>, default: u32) -> u32 {
    match arg {
        Some(value) => match value.parse() {
            Ok(n) => n,
            Err(e) => {
                eprintln!("Error: {}: {}", value, e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => default,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let num_scopes = parse_arg(args.next(), 5);
    let num_streams = parse_arg(args.next(), 20);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("streamctl=info".parse()?)
                .add_directive("lifecycle=info".parse()?),
        )
        .init();

    let controller = Arc::new(MetadataController::new());
    let clients = ClientFactory::new(Arc::clone(&controller));
    let started = Instant::now();

    for i in 0..num_scopes {
        let scope = format!("lifecycle{}", i);

        assert!(!controller.delete_scope(&scope).await?);
        assert!(controller.create_scope(&scope).await?);

        for j in 1..=num_streams {
            let stream = j.to_string();

            match controller
                .create_stream("nonexistentScope", &stream, StreamConfiguration::default())
                .await
            {
                Err(ControllerError::ScopeNotFound { .. }) => {}
                other => return Err(format!("expected ScopeNotFound, got {:?}", other).into()),
            }

            let config = StreamConfiguration::new(ScalingPolicy::fixed(j));
            assert!(controller.create_stream(&scope, &stream, config).await?);

            let config = StreamConfiguration::new(ScalingPolicy::fixed(j * 2));
            assert!(controller.update_stream(&scope, &stream, config).await?);

            if j % 2 == 0 {
                let mut writer = clients.create_event_writer(&scope, &stream).await?;
                for n in 0..NUM_EVENTS {
                    writer.write_event(&stream, Bytes::from(n.to_string())).await?;
                }
            }

            assert!(controller.update_stream(&scope, &stream, config).await?);

            match controller.delete_scope(&scope).await {
                Err(ControllerError::ScopeNotEmpty { .. }) => {
                    tracing::info!(scope = %scope, "Scope deletion refused as expected")
                }
                other => return Err(format!("expected ScopeNotEmpty, got {:?}", other).into()),
            }
            match controller.delete_stream(&scope, &stream).await {
                Err(ControllerError::StreamNotSealed { .. }) => {
                    tracing::info!(scope = %scope, stream = %stream, "Stream deletion refused as expected")
                }
                other => return Err(format!("expected StreamNotSealed, got {:?}", other).into()),
            }

            assert!(controller.seal_stream(&scope, &stream).await?);
            assert!(controller.delete_stream(&scope, &stream).await?);

            assert!(controller.seal_stream(&scope, &stream).await.is_err());
            assert!(!controller.delete_stream(&scope, &stream).await?);
        }

        assert!(!controller.create_scope(&scope).await?);
        assert!(controller.delete_scope(&scope).await?);
        println!("Scope {} done", scope);
    }

    println!(
        "Managed {} scopes x {} streams in {:?}",
        num_scopes,
        num_streams,
        started.elapsed()
    );

    Ok(())
}
