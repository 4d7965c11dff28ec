//! Stream configuration
//!
//! A configuration pairs a scaling policy (how many segments the stream is
//! split into, and whether that number follows load) with a retention
//! policy. Both are replaced wholesale by `update_stream`.

use std::time::Duration;

use crate::error::{ControllerError, Result};

/// How a stream is partitioned into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingPolicy {
    /// A fixed number of segments
    Fixed { segments: u32 },
    /// Scale on events per second per segment
    ByEventRate {
        target_rate: u32,
        scale_factor: u32,
        min_segments: u32,
    },
    /// Scale on kilobytes per second per segment
    ByDataRate {
        target_kbps: u32,
        scale_factor: u32,
        min_segments: u32,
    },
}

impl ScalingPolicy {
    /// Fixed number of segments
    pub fn fixed(segments: u32) -> Self {
        ScalingPolicy::Fixed { segments }
    }

    /// Event-rate driven scaling
    pub fn by_event_rate(target_rate: u32, scale_factor: u32, min_segments: u32) -> Self {
        ScalingPolicy::ByEventRate {
            target_rate,
            scale_factor,
            min_segments,
        }
    }

    /// Data-rate driven scaling
    pub fn by_data_rate(target_kbps: u32, scale_factor: u32, min_segments: u32) -> Self {
        ScalingPolicy::ByDataRate {
            target_kbps,
            scale_factor,
            min_segments,
        }
    }

    /// Number of segments the stream starts with (its parallelism)
    pub fn min_segments(&self) -> u32 {
        match *self {
            ScalingPolicy::Fixed { segments } => segments,
            ScalingPolicy::ByEventRate { min_segments, .. }
            | ScalingPolicy::ByDataRate { min_segments, .. } => min_segments,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.min_segments() == 0 {
            return Err(ControllerError::InvalidConfiguration(
                "segment count must be at least 1".into(),
            ));
        }

        match *self {
            ScalingPolicy::Fixed { .. } => Ok(()),
            ScalingPolicy::ByEventRate {
                target_rate: target,
                scale_factor,
                ..
            }
            | ScalingPolicy::ByDataRate {
                target_kbps: target,
                scale_factor,
                ..
            } => {
                if scale_factor == 0 {
                    Err(ControllerError::InvalidConfiguration(
                        "scale factor must be at least 1".into(),
                    ))
                } else if target == 0 {
                    Err(ControllerError::InvalidConfiguration(
                        "scaling target must be positive".into(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        ScalingPolicy::fixed(1)
    }
}

/// How long stream data is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Data is never truncated
    #[default]
    Infinite,
    /// Data older than the duration may be truncated
    ByTime(Duration),
    /// Data beyond the byte count may be truncated
    BySize(u64),
}

/// Configuration attached to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamConfiguration {
    /// Scaling policy
    pub scaling: ScalingPolicy,
    /// Retention policy
    pub retention: RetentionPolicy,
}

impl StreamConfiguration {
    /// Create a configuration with the given scaling policy and infinite retention
    pub fn new(scaling: ScalingPolicy) -> Self {
        Self {
            scaling,
            ..Default::default()
        }
    }

    /// Set the scaling policy
    pub fn scaling_policy(mut self, scaling: ScalingPolicy) -> Self {
        self.scaling = scaling;
        self
    }

    /// Set the retention policy
    pub fn retention_policy(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Number of segments writers spread events over
    pub fn segment_count(&self) -> u32 {
        self.scaling.min_segments()
    }

    /// Reject configurations no stream can run with
    pub fn validate(&self) -> Result<()> {
        self.scaling.validate()?;

        match self.retention {
            RetentionPolicy::ByTime(d) if d.is_zero() => Err(
                ControllerError::InvalidConfiguration("retention time must be positive".into()),
            ),
            RetentionPolicy::BySize(0) => Err(ControllerError::InvalidConfiguration(
                "retention size must be positive".into(),
            )),
            _ => Ok(()),
        }
    }
}
