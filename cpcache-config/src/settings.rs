use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use getset::{CopyGetters, Getters};
use serde::Deserialize;
use tracing::debug;

use cpcache_util::model::CredentialContext;
use cpcache_util::FetchError;

/// Contest settings maintained outside this crate (by the portal's admin
/// pages), read once per acquisition.
#[derive(Deserialize, Getters, CopyGetters, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ContestSettings {
    #[get = "pub"]
    session_cookies: Option<String>,
    #[get = "pub"]
    contest_id: Option<String>,
    #[get = "pub"]
    contest_password: Option<String>,
    #[get_copy = "pub"]
    problem_count: usize,
    #[get = "pub"]
    problem_titles: Option<String>,
}

impl ContestSettings {
    pub const DEFAULT_PROBLEM_COUNT: usize = 10;

    pub fn new(session_cookies: impl Into<String>, contest_id: impl Into<String>) -> Self {
        Self {
            session_cookies: Some(session_cookies.into()),
            contest_id: Some(contest_id.into()),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.contest_password = Some(password.into());
        self
    }

    pub fn with_problems(mut self, count: usize, titles: Option<&str>) -> Self {
        self.problem_count = count;
        self.problem_titles = titles.map(str::to_owned);
        self
    }

    /// Credentials for one acquisition; missing cookies or contest id is a
    /// configuration error.
    pub fn credential(&self) -> Result<CredentialContext, FetchError> {
        let cookies = self
            .session_cookies
            .as_deref()
            .ok_or_else(|| FetchError::configuration("session cookies are not set"))?;
        let contest_id = self
            .contest_id
            .as_deref()
            .ok_or_else(|| FetchError::configuration("contest id is not set"))?;
        CredentialContext::new(cookies, contest_id, self.contest_password.clone())
    }
}

impl Default for ContestSettings {
    fn default() -> Self {
        Self {
            session_cookies: None,
            contest_id: None,
            contest_password: None,
            problem_count: Self::DEFAULT_PROBLEM_COUNT,
            problem_titles: None,
        }
    }
}

impl fmt::Debug for ContestSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ContestSettings")
            .field("session_cookies", &self.session_cookies.as_ref().map(|_| "<set>"))
            .field("contest_id", &self.contest_id)
            .field("contest_password", &self.contest_password.as_ref().map(|_| "********"))
            .field("problem_count", &self.problem_count)
            .field("problem_titles", &self.problem_titles)
            .finish()
    }
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<ContestSettings, FetchError>;
}

/// Fixed settings, e.g. passed on the command line.
impl SettingsStore for ContestSettings {
    fn load(&self) -> Result<ContestSettings, FetchError> {
        Ok(self.clone())
    }
}

/// Settings read from a yaml file on every call.
///
/// The session cookies may be overridden by an environment variable so that
/// they do not need to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSettingsStore {
    path: PathBuf,
    cookies_env: Option<String>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cookies_env: None,
        }
    }

    pub fn with_cookies_env(mut self, cookies_env: Option<String>) -> Self {
        self.cookies_env = cookies_env;
        self
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<ContestSettings, FetchError> {
        let text = fs::read_to_string(&self.path).map_err(|err| {
            FetchError::configuration(format!(
                "Could not read settings file {}: {}",
                self.path.display(),
                err
            ))
        })?;
        let mut settings: ContestSettings = serde_yaml::from_str(&text).map_err(|err| {
            FetchError::configuration(format!(
                "Could not parse settings file {}: {}",
                self.path.display(),
                err
            ))
        })?;
        if let Some(cookies) = self
            .cookies_env
            .as_deref()
            .and_then(|name| env::var(name).ok())
            .filter(|cookies| !cookies.trim().is_empty())
        {
            debug!("Using session cookies from environment");
            settings.session_cookies = Some(cookies);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_credential_requires_cookies_and_contest() {
        let err = ContestSettings::default().credential().unwrap_err();
        assert_eq!(err, FetchError::configuration("session cookies are not set"));

        let mut settings = ContestSettings::new("X=1", "");
        settings.contest_id = None;
        let err = settings.credential().unwrap_err();
        assert_eq!(err, FetchError::configuration("contest id is not set"));
    }

    #[test]
    fn test_credential() -> anyhow::Result<()> {
        let ctx = ContestSettings::new("X=1", "123")
            .with_password("pw")
            .credential()?;
        assert_eq!(ctx.contest_id().as_ref(), "123");
        assert_eq!(ctx.contest_password().as_deref(), Some("pw"));
        Ok(())
    }

    #[test]
    fn test_file_store_reads_every_call() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let path = test_dir.path().join("settings.yaml");
        let store = FileSettingsStore::new(&path);

        fs::write(&path, "session_cookies: X=1\ncontest_id: '123'\n")?;
        let settings = store.load()?;
        assert_eq!(settings.contest_id().as_deref(), Some("123"));
        assert_eq!(settings.problem_count(), ContestSettings::DEFAULT_PROBLEM_COUNT);

        fs::write(
            &path,
            "session_cookies: X=1\ncontest_id: '456'\nproblem_count: 3\nproblem_titles: Sum,Search,Sort\n",
        )?;
        let settings = store.load()?;
        assert_eq!(settings.contest_id().as_deref(), Some("456"));
        assert_eq!(settings.problem_count(), 3);
        assert_eq!(settings.problem_titles().as_deref(), Some("Sum,Search,Sort"));
        Ok(())
    }

    #[test]
    fn test_file_store_missing_file_is_configuration_error() {
        let store = FileSettingsStore::new("/nonexistent/cpcache/settings.yaml");
        assert_eq!(store.load().unwrap_err().kind(), "configuration");
    }

    #[test]
    fn test_file_store_cookies_env_override() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let path = test_dir.path().join("settings.yaml");
        fs::write(&path, "contest_id: '1'\n")?;
        let env_name = "CPCACHE_TEST_SETTINGS_COOKIES_OVERRIDE";
        env::set_var(env_name, "FROM_ENV=1");

        let store = FileSettingsStore::new(&path).with_cookies_env(Some(env_name.to_owned()));
        let ctx = store.load()?.credential()?;
        assert_eq!(ctx.cookies(), "FROM_ENV=1");
        env::remove_var(env_name);
        Ok(())
    }

    #[test]
    fn test_debug_hides_cookies() {
        let settings = ContestSettings::new("SECRET=1", "1").with_password("hunter2");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("hunter2"));
    }
}
