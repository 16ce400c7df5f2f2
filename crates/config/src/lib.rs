//! Layered configuration for libris.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults,
//! 2. a TOML file (an explicit path, or `config.toml` in the platform
//!    configuration directory when present),
//! 3. `LIBRIS_*` environment variables, with `__` separating nested keys
//!    (`LIBRIS_CATALOG__RECENT_LIMIT=20`).
//!
//! ```toml
//! [library]
//! root = "/srv/calibre"
//!
//! [catalog]
//! recent_limit = 50
//! link_mode = "auto"
//!
//! [catalog.formats]
//! azw3 = "application/vnd.amazon.ebook"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use libris_artifacts::FormatTable;
use libris_catalog::LinkMode;
use libris_catalog::options::{
    DEFAULT_FETCH_ENDPOINT, DEFAULT_HTML_THUMBNAIL_HEIGHT, DEFAULT_OPDS_THUMBNAIL_HEIGHT, DEFAULT_RECENT_LIMIT, Options,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "LIBRIS_";
/// File name of the Calibre database inside the library root.
pub const DATABASE_FILE: &str = "metadata.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Calibre library directory.
    pub root: PathBuf,
    /// Defaults to `metadata.db` inside the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub recent_limit: u32,
    pub opds_thumbnail_height: u32,
    pub html_thumbnail_height: u32,
    pub link_mode: LinkMode,
    pub fetch_endpoint: String,
    /// Format code to mime type. Entries are merged over the defaults.
    pub formats: BTreeMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
            opds_thumbnail_height: DEFAULT_OPDS_THUMBNAIL_HEIGHT,
            html_thumbnail_height: DEFAULT_HTML_THUMBNAIL_HEIGHT,
            link_mode: LinkMode::default(),
            fetch_endpoint: DEFAULT_FETCH_ENDPOINT.to_string(),
            formats: FormatTable::default()
                .iter()
                .map(|(code, mime)| (code.to_string(), mime.to_string()))
                .collect(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform config file
    /// is used if there is one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            tracing::error!(path = %path.display(), "configuration file not found");
            exn::bail!(ErrorKind::Load);
        }
        Self::from_figment(Self::figment(path))
    }

    /// The provider stack, before extraction.
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match path.map(Path::to_path_buf).or_else(default_path) {
            Some(file) => {
                tracing::debug!(file = %file.display(), "reading configuration file");
                figment.merge(Toml::file_exact(file))
            },
            None => figment,
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.library.root.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("library.root"));
        }
        if self.catalog.recent_limit == 0 {
            exn::bail!(ErrorKind::Invalid("catalog.recent_limit"));
        }
        if self.catalog.opds_thumbnail_height == 0 {
            exn::bail!(ErrorKind::Invalid("catalog.opds_thumbnail_height"));
        }
        if self.catalog.html_thumbnail_height == 0 {
            exn::bail!(ErrorKind::Invalid("catalog.html_thumbnail_height"));
        }
        if self.catalog.fetch_endpoint.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("catalog.fetch_endpoint"));
        }
        self.format_table()?;
        Ok(())
    }

    /// Path of the Calibre database.
    pub fn database_path(&self) -> PathBuf {
        self.library.database.clone().unwrap_or_else(|| self.library.root.join(DATABASE_FILE))
    }

    pub fn format_table(&self) -> Result<FormatTable> {
        let mut table = FormatTable::empty();
        for (code, mime) in &self.catalog.formats {
            table.insert(code, mime.as_str()).or_raise(|| ErrorKind::Invalid("catalog.formats"))?;
        }
        Ok(table)
    }

    /// Catalog options derived from this configuration.
    pub fn catalog_options(&self) -> Result<Options> {
        Ok(Options::new(&self.library.root)
            .with_link_mode(self.catalog.link_mode)
            .with_fetch_endpoint(self.catalog.fetch_endpoint.trim())
            .with_recent_limit(self.catalog.recent_limit)
            .with_thumbnail_heights(self.catalog.opds_thumbnail_height, self.catalog.html_thumbnail_height)
            .with_formats(self.format_table()?))
    }
}

fn default_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "libris")?;
    let file = dirs.config_dir().join("config.toml");
    file.is_file().then_some(file)
}
