//! Process-wide libgit2 object and pack-window cache limits.
//!
//! Installed from `WebApp::init`, before any repository is opened. The
//! settings are process-global, so only the first install takes effect.

use serde::{Deserialize, Serialize};
use std::sync::Once;

use crate::error::Result;

pub const ONE_MB: usize = 1024 * 1024;

static INSTALL: Once = Once::new();

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitCacheConfig {
    /// Largest slice of a pack file mapped at once.
    #[serde(default = "default_stream_file_threshold")]
    pub stream_file_threshold: usize,
    /// Upper bound on pack memory mapped across all repositories.
    #[serde(default)]
    pub mapped_limit: Option<usize>,
}

fn default_stream_file_threshold() -> usize {
    ONE_MB * 10
}

impl Default for GitCacheConfig {
    fn default() -> Self {
        Self {
            stream_file_threshold: default_stream_file_threshold(),
            mapped_limit: None,
        }
    }
}

impl GitCacheConfig {
    /// Apply the limits to libgit2. Returns `false` when an earlier install
    /// already set them; those settings are kept.
    pub fn install(&self) -> Result<bool> {
        let mut applied = None;
        INSTALL.call_once(|| applied = Some(self.apply()));

        match applied {
            Some(result) => result.map(|()| true),
            None => {
                tracing::debug!("Git window cache already installed, keeping first settings");
                Ok(false)
            }
        }
    }

    fn apply(&self) -> Result<()> {
        git2::opts::enable_caching(true);

        // SAFETY: these are unsynchronized writes to libgit2 globals. `INSTALL`
        // limits them to one per process; `main` gets here before the listener
        // is bound, so no request thread is inside libgit2 yet.
        unsafe {
            git2::opts::set_mwindow_size(self.stream_file_threshold)?;
            if let Some(limit) = self.mapped_limit {
                git2::opts::set_mwindow_mapped_limit(limit)?;
            }
        }

        tracing::info!(
            "Git window cache installed: window={} bytes, mapped limit={:?}",
            self.stream_file_threshold,
            self.mapped_limit
        );
        Ok(())
    }
}
