//! Config for cpcache.
//!
//! The config file (`cpcache.yaml`) describes how to reach the origin and how
//! long fetched data stays fresh. It is searched in the current directory and
//! its ancestors unless a path is given explicitly. Every section may be
//! omitted, in which case its defaults apply.
//!
//! Contest specific values (session cookies, contest id, password and problem
//! titles) live in a separate settings file owned by the portal, see
//! [`SettingsStore`]. That file is re-read on every acquisition.
//!
//! Durations are written in [humantime](https://docs.rs/humantime) format,
//! e.g. `30s` or `10m`.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use getset::{CopyGetters, Getters};
use lazy_static::lazy_static;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use cpcache_util::Console;

mod origin_config;
mod session_config;
mod settings;

pub use origin_config::OriginConfig;
pub use session_config::{BrowserConfig, SessionConfig};
pub use settings::{ContestSettings, FileSettingsStore, SettingsStore};

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

lazy_static! {
    static ref VERSION: Version = Version::parse(env!("CARGO_PKG_VERSION")).unwrap();
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_dir: PathBuf,
    body: ConfigBody,
}

impl Config {
    pub fn load(path: Option<&Path>, cnsl: &mut Console) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => ConfigBody::search(cnsl)?,
        };
        let body = ConfigBody::load(&path)?;
        let base_dir = path
            .parent()
            .map(Path::to_owned)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { base_dir, body })
    }

    pub fn default_in_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            body: ConfigBody::default(),
        }
    }

    pub fn origin(&self) -> &OriginConfig {
        &self.body.origin
    }

    pub fn session(&self) -> &SessionConfig {
        &self.body.session
    }

    pub fn browser(&self) -> &BrowserConfig {
        &self.body.browser
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.body.cache
    }

    pub fn server(&self) -> &ServerConfig {
        &self.body.server
    }

    pub fn settings_abs_path(&self) -> PathBuf {
        self.base_dir.join(&self.body.settings_path)
    }

    pub fn settings_store(&self) -> FileSettingsStore {
        FileSettingsStore::new(self.settings_abs_path())
            .with_cookies_env(Some(self.body.settings_cookies_env.clone()))
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let yaml_str = serde_yaml::to_string(&self.body).map_err(|_| fmt::Error)?;
        write!(f, "{}", yaml_str)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigBody {
    #[serde(with = "string_serde")]
    version: Version,
    #[serde(default)]
    origin: OriginConfig,
    #[serde(default)]
    session: SessionConfig,
    #[serde(default)]
    browser: BrowserConfig,
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default = "ConfigBody::default_settings_path")]
    settings_path: PathBuf,
    #[serde(default = "ConfigBody::default_settings_cookies_env")]
    settings_cookies_env: String,
}

impl ConfigBody {
    pub const FILE_NAME: &'static str = "cpcache.yaml";

    const DEFAULT_SETTINGS_PATH: &'static str = "settings.yaml";

    const DEFAULT_SETTINGS_COOKIES_ENV: &'static str = "CPCACHE_SESSION_COOKIES";

    pub fn generate_to(writer: &mut dyn Write) -> Result<()> {
        writeln!(
            writer,
            include_str!("../resources/cpcache.yaml.txt"),
            version = &*VERSION,
        )
        .context("Could not write config")
    }

    fn default_settings_path() -> PathBuf {
        PathBuf::from(Self::DEFAULT_SETTINGS_PATH)
    }

    fn default_settings_cookies_env() -> String {
        Self::DEFAULT_SETTINGS_COOKIES_ENV.to_owned()
    }

    fn search(cnsl: &mut Console) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("Could not get current directory")?;
        let path = cwd
            .ancestors()
            .map(|dir| dir.join(Self::FILE_NAME))
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Could not find config file ({}) in {} or any of the parent directories. \
                     Create config file first by `cpcache init` command.",
                    Self::FILE_NAME,
                    cwd.display()
                )
            })?;
        writeln!(cnsl, "Found config file: {}", path.display())?;
        Ok(path)
    }

    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Could not open config file: {}", path.display()))?;
        let body: Self =
            serde_yaml::from_reader(file).context("Could not read config file as yaml")?;
        body.validate()?;
        Ok(body)
    }

    fn validate(&self) -> Result<()> {
        // check version
        let version_req = VersionReq::parse(&self.version.to_string())
            .context("Could not parse version requirement")?;
        if !version_req.matches(&VERSION) {
            return Err(anyhow!(
                r#"Found mismatched version in config file.
    config version : {}
    cpcache version: {}
Fix the config file so that it is compatible with the current version of cpcache."#,
                self.version,
                &*VERSION
            ));
        }
        if self.cache.contest_ttl.as_millis() == 0 || self.cache.standings_ttl.as_millis() == 0 {
            return Err(anyhow!("Cache ttl must be longer than zero"));
        }
        Ok(())
    }
}

impl Default for ConfigBody {
    fn default() -> Self {
        Self {
            version: VERSION.clone(),
            origin: OriginConfig::default(),
            session: SessionConfig::default(),
            browser: BrowserConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            settings_path: Self::default_settings_path(),
            settings_cookies_env: Self::default_settings_cookies_env(),
        }
    }
}

#[derive(Serialize, Deserialize, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    contest_ttl: Duration,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    standings_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            contest_ttl: Duration::from_secs(10 * 60),
            standings_ttl: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct ServerConfig {
    #[get_copy = "pub"]
    listen: SocketAddr,
    #[get = "pub"]
    allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origins: Vec::new(),
        }
    }
}

mod string_serde {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn generate_and_deserialize() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        ConfigBody::generate_to(&mut buf)?;
        let body_yaml_str = String::from_utf8(buf)?;
        let body_generated: ConfigBody = serde_yaml::from_str(&body_yaml_str)?;

        let body_default = ConfigBody::default();

        assert_eq!(body_generated, body_default);

        Ok(())
    }

    #[test]
    fn load_minimal_config_uses_defaults() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let path = test_dir.path().join(ConfigBody::FILE_NAME);
        fs::write(&path, format!("version: {}\ncache:\n  standings_ttl: 30s\n", &*VERSION))?;

        let mut cnsl = Console::sink(Default::default());
        let conf = Config::load(Some(&path), &mut cnsl)?;

        assert_eq!(conf.cache().contest_ttl(), Duration::from_secs(600));
        assert_eq!(conf.cache().standings_ttl(), Duration::from_secs(30));
        assert_eq!(conf.browser().navigation_timeout(), Duration::from_secs(60));
        assert_eq!(conf.settings_abs_path(), test_dir.path().join("settings.yaml"));
        Ok(())
    }

    #[test]
    fn load_rejects_mismatched_version() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let path = test_dir.path().join(ConfigBody::FILE_NAME);
        fs::write(&path, "version: 99.0.0\n")?;

        let mut cnsl = Console::sink(Default::default());
        let err = Config::load(Some(&path), &mut cnsl).unwrap_err();
        assert!(err.to_string().contains("mismatched version"));
        Ok(())
    }

    #[test]
    fn load_rejects_zero_ttl() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let path = test_dir.path().join(ConfigBody::FILE_NAME);
        fs::write(&path, format!("version: {}\ncache:\n  contest_ttl: 0s\n", &*VERSION))?;

        let mut cnsl = Console::sink(Default::default());
        assert!(Config::load(Some(&path), &mut cnsl).is_err());
        Ok(())
    }
}
