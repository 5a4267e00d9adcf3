#![forbid(unsafe_code)]

//! Grid configuration.
//!
//! Every knob has a default suited to a product grid of 245×450 px cards.
//! Deployments can override the tuning values without a rebuild through
//! environment variables:
//!
//! | Variable                | Field                        |
//! |-------------------------|------------------------------|
//! | `SHELF_BUFFER_ROWS`     | [`GridConfig::buffer_rows`]  |
//! | `SHELF_RESIZE_QUIET_MS` | [`ResizeConfig::quiet_period_ms`] |
//! | `SHELF_POOL_SIZE`       | [`GridConfig::pool_size`]    |
//!
//! Unparseable values are logged and ignored; parsing never fails.

use std::fmt::Display;
use std::str::FromStr;

use shelf_layout::LayoutConfig;
use shelf_widgets::DEFAULT_POOL_SIZE;

use crate::resize_coordinator::ResizeConfig;

/// Env var overriding [`GridConfig::buffer_rows`].
pub const ENV_BUFFER_ROWS: &str = "SHELF_BUFFER_ROWS";
/// Env var overriding [`ResizeConfig::quiet_period_ms`].
pub const ENV_RESIZE_QUIET_MS: &str = "SHELF_RESIZE_QUIET_MS";
/// Env var overriding [`GridConfig::pool_size`].
pub const ENV_POOL_SIZE: &str = "SHELF_POOL_SIZE";

/// Default rows rendered beyond each viewport edge.
pub const DEFAULT_BUFFER_ROWS: usize = 1;
/// Default bound on pipeline passes per flush.
pub const DEFAULT_MAX_FLUSH_PASSES: u32 = 4;

/// Configuration for one grid instance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GridConfig {
    /// Cell geometry.
    pub layout: LayoutConfig,
    /// Rows bound above and below the visible rows.
    pub buffer_rows: usize,
    /// Slots created up front. The pool grows past this when needed.
    pub pool_size: usize,
    /// Resize debouncing.
    pub resize: ResizeConfig,
    /// Pipeline passes a single flush may run before deferring.
    pub max_flush_passes: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            buffer_rows: DEFAULT_BUFFER_ROWS,
            pool_size: DEFAULT_POOL_SIZE,
            resize: ResizeConfig::default(),
            max_flush_passes: DEFAULT_MAX_FLUSH_PASSES,
        }
    }
}

impl GridConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults with overrides read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(rows) = parse_override(&lookup, ENV_BUFFER_ROWS) {
            config.buffer_rows = rows;
        }
        if let Some(ms) = parse_override(&lookup, ENV_RESIZE_QUIET_MS) {
            config.resize.quiet_period_ms = ms;
        }
        if let Some(size) = parse_override(&lookup, ENV_POOL_SIZE) {
            config.pool_size = size;
        }
        config
    }

    /// Set the cell geometry.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the buffer rows.
    #[must_use]
    pub fn with_buffer_rows(mut self, rows: usize) -> Self {
        self.buffer_rows = rows;
        self
    }

    /// Set the initial slot pool size.
    #[must_use]
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set resize debouncing.
    #[must_use]
    pub fn with_resize(mut self, resize: ResizeConfig) -> Self {
        self.resize = resize;
        self
    }

    /// Set the flush pass bound. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_max_flush_passes(mut self, passes: u32) -> Self {
        self.max_flush_passes = passes;
        self
    }

    pub(crate) fn flush_pass_limit(&self) -> u32 {
        self.max_flush_passes.max(1)
    }
}

fn parse_override<T, F>(lookup: &F, var: &'static str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(var, value = %raw, error = %err, "ignoring invalid environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = GridConfig::default();
        assert_eq!(config.buffer_rows, 1);
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.resize.quiet_period_ms, 50);
        assert_eq!(config.layout.item_width(), 245.0);
        assert_eq!(config.layout.item_height(), 450.0);
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(GridConfig::from_lookup(lookup(&[])), GridConfig::default());
    }

    #[test]
    fn overrides_apply() {
        let config = GridConfig::from_lookup(lookup(&[
            (ENV_BUFFER_ROWS, "3"),
            (ENV_RESIZE_QUIET_MS, " 120 "),
            (ENV_POOL_SIZE, "64"),
        ]));
        assert_eq!(config.buffer_rows, 3);
        assert_eq!(config.resize.quiet_period_ms, 120);
        assert_eq!(config.pool_size, 64);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = GridConfig::from_lookup(lookup(&[
            (ENV_BUFFER_ROWS, "-1"),
            (ENV_RESIZE_QUIET_MS, "soon"),
            (ENV_POOL_SIZE, ""),
        ]));
        assert_eq!(config, GridConfig::default());
    }

    #[test]
    fn builders() {
        let config = GridConfig::default()
            .with_layout(LayoutConfig::new(100.0, 100.0, 4.0))
            .with_buffer_rows(0)
            .with_pool_size(8)
            .with_resize(ResizeConfig::default().with_quiet_period_ms(10))
            .with_max_flush_passes(0);
        assert_eq!(config.buffer_rows, 0);
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.resize.quiet_period_ms, 10);
        assert_eq!(config.flush_pass_limit(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let config: GridConfig =
            serde_json::from_str(r#"{"buffer_rows":2,"layout":{"item_width":0,"item_height":300}}"#)
                .unwrap();
        assert_eq!(config.buffer_rows, 2);
        assert_eq!(config.layout.item_width(), 1.0);
        assert_eq!(config.layout.gap(), 0.0);
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    }
}
