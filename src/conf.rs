//! Configuration and construction of a dispatcher.
//!
//! The backends themselves are constructed by the host. The dispatcher is
//! assembled from them with a [`DispatcherBuilder`], which checks that the
//! result is usable and reads the system search list needed for AutoPath.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use domain::resolv::stub::conf::ResolvConf;
use serde::Deserialize;
use tracing::debug;

use crate::backend::ZoneBackend;
use crate::dispatcher::{BackendEntry, Dispatcher};
use crate::error::ConfigError;
use crate::fall::Fallthrough;
use crate::handler::Handler;
use crate::zones::fqdn;

/// Where the system resolver configuration lives by default.
pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

//------------ Config --------------------------------------------------------

/// Settings of the dispatcher that are not tied to a backend.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// The resolver configuration to read the system search list from.
    pub resolv_conf: PathBuf,

    /// A search list to use instead of the system one.
    pub search: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolv_conf: DEFAULT_RESOLV_CONF.into(),
            search: None,
        }
    }
}

//------------ DispatcherBuilder ---------------------------------------------

/// Assembles a [`Dispatcher`].
///
/// Backends keep the order they are added in, which is their priority.
pub struct DispatcherBuilder {
    entries: Vec<BackendEntry>,
    next: Option<Arc<dyn Handler>>,
    search: Option<Vec<String>>,
    resolv_conf: PathBuf,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let builder = Self {
            entries: Vec::new(),
            next: None,
            search: None,
            resolv_conf: config.resolv_conf.clone(),
        };
        match &config.search {
            Some(search) => builder.search(search),
            None => builder,
        }
    }

    /// Adds a backend with its fallthrough policy.
    #[must_use]
    pub fn backend(
        mut self,
        backend: Arc<dyn ZoneBackend>,
        fallthrough: Fallthrough,
    ) -> Self {
        self.entries.push(BackendEntry::new(backend, fallthrough));
        self
    }

    /// Sets the handler queries go to when no backend is authoritative.
    #[must_use]
    pub fn next(mut self, next: Arc<dyn Handler>) -> Self {
        self.next = Some(next);
        self
    }

    /// Sets the search list instead of reading the system one.
    #[must_use]
    pub fn search<I, S>(mut self, search: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.search = Some(
            search
                .into_iter()
                .filter(|suffix| !suffix.as_ref().is_empty())
                .map(|suffix| fqdn(&suffix.as_ref()))
                .collect(),
        );
        self
    }

    /// Creates the dispatcher.
    ///
    /// Fails if no backend was added or a backend has no zones.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::NoBackends);
        }
        if let Some(index) =
            self.entries.iter().position(|entry| entry.zones().is_empty())
        {
            return Err(ConfigError::NoZones { index });
        }

        let search = match self.search {
            Some(search) => search,
            None => search_from_resolv_conf(&self.resolv_conf),
        };
        debug!(
            "Dispatching over {} backends with search list {:?}",
            self.entries.len(),
            search
        );
        Ok(Dispatcher::new(self.entries, self.next, search))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//------------ System search list --------------------------------------------

/// Reads the search list from a resolver configuration file.
///
/// Returns an empty list if the file cannot be read or parsed.
pub fn search_from_resolv_conf(path: &Path) -> Vec<String> {
    let mut conf = ResolvConf::new();
    if let Err(err) = conf.parse_file(path) {
        debug!("No search list from {}: {err}", path.display());
        return Vec::new();
    }
    search_list(&conf)
}

/// Reads the search list from resolver configuration data.
///
/// Returns an empty list if the data cannot be parsed.
pub fn search_from_reader<R: io::Read>(reader: &mut R) -> Vec<String> {
    let mut conf = ResolvConf::new();
    if let Err(err) = conf.parse(reader) {
        debug!("No search list from resolver configuration: {err}");
        return Vec::new();
    }
    search_list(&conf)
}

fn search_list(conf: &ResolvConf) -> Vec<String> {
    conf.options.search.iter().map(fqdn).collect()
}

//============ Testing =======================================================
