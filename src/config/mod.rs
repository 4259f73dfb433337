//! Pipeline configuration.
//!
//! All tuning knobs live in [`DiffConfig`], built once at start-up and
//! passed by reference to every component that needs it.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pack::BlockPacker;
use crate::pipeline::{block_header, block_intro, block_trailer};
use crate::utils::Settings;

/// Default maximum size of one delivery unit, in UTF-8 bytes.
///
/// Leaves headroom under GitHub's 65 536-character comment limit.
pub const DEFAULT_MAX_BLOCK_BYTES: usize = 60_000;

/// Default number of body lines per fenced sub-part.
pub const DEFAULT_MAX_LINES_PER_SUBPART: usize = 1_000;

/// Default number of unchanged lines shown around each change.
pub const DEFAULT_CONTEXT_LINES: u32 = 0;

/// Default searchable tag embedded in every block header.
pub const DEFAULT_TAG: &str = "<!-- twb-diff-bot -->";

/// Default input size at which extraction waits before the first attempt.
pub const DEFAULT_EXTRACTION_SIZE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Default delay before the first attempt on large inputs, in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2_000;

/// Default number of retries after the first extraction attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Default multiplier applied to the delay after each failed attempt.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Smallest block budget accepted by [`DiffConfig::validate`].
pub const MIN_BLOCK_BYTES: usize = 1_024;

/// Longest pull request identifier the block budget is checked against.
pub const MAX_PR_ID_BYTES: usize = 32;

const ENV_MAX_BLOCK_BYTES: &str = "TWB_DIFF_MAX_BLOCK_BYTES";
const ENV_MAX_LINES_PER_SUBPART: &str = "TWB_DIFF_MAX_LINES_PER_SUBPART";
const ENV_CONTEXT_LINES: &str = "TWB_DIFF_CONTEXT_LINES";
const ENV_TAG: &str = "TWB_DIFF_TAG";
const ENV_EXTRACTION_SIZE_THRESHOLD: &str = "TWB_DIFF_EXTRACTION_SIZE_THRESHOLD";
const ENV_INITIAL_DELAY_MS: &str = "TWB_DIFF_INITIAL_DELAY_MS";
const ENV_MAX_RETRIES: &str = "TWB_DIFF_MAX_RETRIES";
const ENV_BACKOFF_FACTOR: &str = "TWB_DIFF_BACKOFF_FACTOR";

/// Extraction retry tuning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryConfig {
    /// Inputs of at least this many bytes wait before the first attempt.
    pub size_threshold_bytes: u64,
    /// Delay before the first attempt on large inputs, in milliseconds.
    pub initial_delay_ms: u64,
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Multiplier applied to a non-zero delay after each failed attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            size_threshold_bytes: DEFAULT_EXTRACTION_SIZE_THRESHOLD,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffConfig {
    /// Maximum size of one output block, in UTF-8 bytes.
    pub max_block_bytes: usize,
    /// Maximum number of body lines in one fenced sub-part.
    pub max_lines_per_subpart: usize,
    /// Unchanged lines shown around each change in a diff.
    pub context_lines: u32,
    /// Searchable tag placed in every block header.
    pub tag: String,
    /// Extraction retry tuning.
    pub retry: RetryConfig,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_block_bytes: DEFAULT_MAX_BLOCK_BYTES,
            max_lines_per_subpart: DEFAULT_MAX_LINES_PER_SUBPART,
            context_lines: DEFAULT_CONTEXT_LINES,
            tag: DEFAULT_TAG.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl DiffConfig {
    /// Builds a configuration from the environment, falling back to the
    /// settings file and then to defaults.
    pub fn from_env(settings: &Settings) -> Result<Self> {
        Self::from_lookup(|key| settings.get_env_var(key))
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_block_bytes: parse_or(&lookup, ENV_MAX_BLOCK_BYTES, defaults.max_block_bytes)?,
            max_lines_per_subpart: parse_or(
                &lookup,
                ENV_MAX_LINES_PER_SUBPART,
                defaults.max_lines_per_subpart,
            )?,
            context_lines: parse_or(&lookup, ENV_CONTEXT_LINES, defaults.context_lines)?,
            tag: lookup(ENV_TAG).unwrap_or(defaults.tag),
            retry: RetryConfig {
                size_threshold_bytes: parse_or(
                    &lookup,
                    ENV_EXTRACTION_SIZE_THRESHOLD,
                    defaults.retry.size_threshold_bytes,
                )?,
                initial_delay_ms: parse_or(
                    &lookup,
                    ENV_INITIAL_DELAY_MS,
                    defaults.retry.initial_delay_ms,
                )?,
                max_retries: parse_or(&lookup, ENV_MAX_RETRIES, defaults.retry.max_retries)?,
                backoff_factor: parse_or(
                    &lookup,
                    ENV_BACKOFF_FACTOR,
                    defaults.retry.backoff_factor,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values can be honoured by the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.max_block_bytes < MIN_BLOCK_BYTES {
            anyhow::bail!(
                "{ENV_MAX_BLOCK_BYTES} must be at least {MIN_BLOCK_BYTES}, got {}",
                self.max_block_bytes
            );
        }
        if self.max_lines_per_subpart == 0 {
            anyhow::bail!("{ENV_MAX_LINES_PER_SUBPART} must be at least 1");
        }
        if self.tag.trim().is_empty() || self.tag.contains('\n') {
            anyhow::bail!("{ENV_TAG} must be a non-empty single line");
        }
        let id = "9".repeat(MAX_PR_ID_BYTES);
        BlockPacker::new(
            &block_header(&self.tag, &id),
            &block_intro(&id),
            &block_trailer(&self.tag),
            self.max_block_bytes,
        )
        .with_context(|| {
            format!("{ENV_MAX_BLOCK_BYTES} cannot fit {ENV_TAG} of {} bytes", self.tag.len())
        })?;
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            anyhow::bail!(
                "{ENV_BACKOFF_FACTOR} must be a finite number >= 1.0, got {}",
                self.retry.backoff_factor
            );
        }
        Ok(())
    }
}

/// Parses `key` from `lookup`, returning `default` when it is unset.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display + Send + Sync + std::error::Error + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
