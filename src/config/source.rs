//! Lazily-read lease tunables.

use super::model::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Where the coordinator reads its lease tunables from.
///
/// Implementations are consulted on every use and must not cache, so that
/// operators can retune a running node.
pub trait ConfigSource: Send + Sync {
    /// How often the holder re-stamps its lease.
    fn refresh_interval(&self) -> Duration;

    /// How old a stamp must be before another node may take the lease over.
    fn max_idle(&self) -> Duration;

    /// Initial wait between acquisition attempts. Read once, at construction.
    fn polling_delay(&self) -> Duration;
}

impl ConfigSource for Config {
    fn refresh_interval(&self) -> Duration {
        Config::refresh_interval(self)
    }

    fn max_idle(&self) -> Duration {
        Config::max_idle(self)
    }

    fn polling_delay(&self) -> Duration {
        Config::polling_delay(self)
    }
}

/// A config source that re-reads a YAML file on every call.
///
/// A missing or invalid file yields the defaults, with a warning for the
/// invalid case.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current(&self) -> Config {
        match Config::load_or_default(&self.path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "falling back to default lease settings");
                Config::default()
            }
        }
    }
}

impl ConfigSource for ConfigFile {
    fn refresh_interval(&self) -> Duration {
        self.current().refresh_interval()
    }

    fn max_idle(&self) -> Duration {
        self.current().max_idle()
    }

    fn polling_delay(&self) -> Duration {
        self.current().polling_delay()
    }
}
