//! Controller configuration

/// Default maximum length of scope and stream names
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;

/// Controller configuration options
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Maximum length of scope and stream names
    pub max_name_length: usize,

    /// Whether a deleted stream's name may be created again
    ///
    /// When enabled, the recreated stream starts over at epoch 0 with the new
    /// configuration. When disabled, creating a deleted stream is a no-op.
    pub stream_name_reuse: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            stream_name_reuse: true,
        }
    }
}

impl ControllerConfig {
    /// Set the maximum name length
    pub fn max_name_length(mut self, len: usize) -> Self {
        self.max_name_length = len;
        self
    }

    /// Allow or forbid recreating deleted streams
    pub fn stream_name_reuse(mut self, enabled: bool) -> Self {
        self.stream_name_reuse = enabled;
        self
    }
}
