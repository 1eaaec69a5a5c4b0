//! Decode policy for a loaded program.

/// Knobs applied by [`Program`](crate::program::Program) when it decodes accounts.
///
/// The free functions in [`account`](crate::account) always use the strict
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Accept account data that continues past the decoded body. Anchor
    /// accounts are often allocated with spare space; strict decoding treats
    /// those bytes as a `LayoutMismatch`.
    pub allow_trailing_account_bytes: bool,
    /// Emit a `tracing` event for every batch slot that fails to decode.
    pub log_batch_failures: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            allow_trailing_account_bytes: false,
            log_batch_failures: true,
        }
    }
}

impl CodecConfig {
    /// Strict decoding with failure logging.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Tolerate spare bytes after account bodies.
    pub fn lenient() -> Self {
        Self {
            allow_trailing_account_bytes: true,
            ..Self::default()
        }
    }

    pub fn with_trailing_account_bytes(mut self, allow: bool) -> Self {
        self.allow_trailing_account_bytes = allow;
        self
    }

    pub fn with_batch_failure_logging(mut self, enabled: bool) -> Self {
        self.log_batch_failures = enabled;
        self
    }
}
