//! Interface configuration: refresh cadences, toasts, prompt editor

use serde::Deserialize;
use std::time::Duration;

use crate::tui::controller::ControllerConfig;

use super::Config;

/// Cadences below this would hammer the backend
const MIN_REFRESH_MS: u64 = 250;

// ─────────────────────────────────────────────────────────────────────────────
// Refresh
// ─────────────────────────────────────────────────────────────────────────────

/// Status refresh cadences
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    /// Local snapshot cadence (worktrees + sessions)
    pub local_status_ms: u64,
    /// Remote status cadence (PRs, checks)
    pub remote_status_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            local_status_ms: 2000,
            remote_status_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileRefreshConfig {
    pub local_status_ms: Option<u64>,
    pub remote_status_ms: Option<u64>,
}

impl RefreshConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileRefreshConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            local_status_ms: file
                .local_status_ms
                .unwrap_or(defaults.local_status_ms)
                .max(MIN_REFRESH_MS),
            remote_status_ms: file
                .remote_status_ms
                .unwrap_or(defaults.remote_status_ms)
                .max(MIN_REFRESH_MS),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toasts
// ─────────────────────────────────────────────────────────────────────────────

/// Toast stack configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ToastConfig {
    /// Most toasts shown at once; older ones are dropped
    pub max: usize,
    /// Lifetime of a toast
    pub ttl_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            max: 3,
            ttl_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileToastConfig {
    pub max: Option<usize>,
    pub ttl_ms: Option<u64>,
}

impl ToastConfig {
    pub fn from_file(file: Option<FileToastConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            max: file.max.unwrap_or(defaults.max).max(1),
            ttl_ms: file.ttl_ms.unwrap_or(defaults.ttl_ms).max(1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor
// ─────────────────────────────────────────────────────────────────────────────

/// Prompt editor height bounds, in text rows
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub min_height: usize,
    pub max_height: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_height: 3,
            max_height: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileEditorConfig {
    pub min_height: Option<usize>,
    pub max_height: Option<usize>,
}

impl EditorConfig {
    /// Create from file config; the maximum never drops below the minimum
    pub fn from_file(file: Option<FileEditorConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let min_height = file.min_height.unwrap_or(defaults.min_height).max(1);
        let max_height = file.max_height.unwrap_or(defaults.max_height).max(min_height);

        Self {
            min_height,
            max_height,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller wiring
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Settings the interaction controller needs
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            local_refresh: Duration::from_millis(self.refresh.local_status_ms),
            remote_refresh: Duration::from_millis(self.refresh.remote_status_ms),
            toast_max: self.toasts.max,
            toast_ttl: Duration::from_millis(self.toasts.ttl_ms),
            editor_min_height: self.editor.min_height,
            editor_max_height: self.editor.max_height,
        }
    }
}
