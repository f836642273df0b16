//! Configuration for shelf.
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults,
//! 2. a config file (an explicit path, or `config.{toml,yaml,yml,json}` in the
//!    platform config directory),
//! 3. environment variables prefixed with `SHELF_` (`SHELF_LIBRARY`,
//!    `SHELF_CACHE_TTL`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "SHELF_";
const FILE_STEM: &str = "config";
const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the library. Relative paths are relative to the
    /// working directory.
    pub library: PathBuf,
    /// How long catalog results are reused, in seconds. Zero disables caching.
    pub cache_ttl: u64,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            library: PathBuf::from("./media"),
            cache_ttl: 60,
        }
    }
}

impl Config {
    /// Loads the configuration from every source.
    ///
    /// With `path`, that file must exist. Without it, the platform config
    /// directory is searched and a missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::extract(Self::figment(path)?.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Defaults merged with the config file, without the environment.
    fn figment(path: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::MissingFile(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path(),
        };
        match file {
            Some(file) => {
                tracing::debug!(path = %file.display(), "Reading config file");
                merge_file(figment, &file)
            },
            None => Ok(figment),
        }
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.library.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("library must not be empty".to_string()));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

/// The first `config.*` file found in the platform config directory.
pub fn default_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "shelf")?;
    FILE_EXTENSIONS
        .iter()
        .map(|extension| dirs.config_dir().join(FILE_STEM).with_extension(extension))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn load_file(name: &str, contents: &str) -> Result<Config> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        Config::extract(Config::figment(Some(&path))?)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.library, PathBuf::from("./media"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[rstest]
    #[case("config.toml", "library = \"/srv/manga\"\ncache_ttl = 5\n")]
    #[case("config.yaml", "library: /srv/manga\ncache_ttl: 5\n")]
    #[case("config.yml", "library: /srv/manga\ncache_ttl: 5\n")]
    #[case("config.json", r#"{"library": "/srv/manga", "cache_ttl": 5}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        let config = load_file(name, contents).unwrap();
        assert_eq!(config.library, PathBuf::from("/srv/manga"));
        assert_eq!(config.cache_ttl, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = load_file("config.toml", "cache_ttl = 0\n").unwrap();
        assert_eq!(config.library, PathBuf::from("./media"));
        assert_eq!(config.cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_later_sources_win() {
        let figment = Config::figment(None).unwrap().merge(Serialized::default("cache_ttl", 15));
        assert_eq!(Config::extract(figment).unwrap().cache_ttl, 15);
    }

    #[test]
    fn test_errors() {
        let err = load_file("config.ini", "cache_ttl = 5").unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
        let err = load_file("config.toml", "cache_ttl = \"soon\"").unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
        let err = load_file("config.toml", "library = \"\"").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingFile(PathBuf::from("/definitely/not/here.toml")));
    }
}
