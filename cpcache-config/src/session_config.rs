use std::path::PathBuf;
use std::time::Duration;

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Settings of the plain HTTP client talking to the origin.
#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    timeout: Duration,
    #[get = "pub"]
    user_agent: String,
}

impl SessionConfig {
    const DEFAULT_USER_AGENT: &'static str = "Mozilla/5.0 (X11; Linux x86_64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Self::DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Settings of the headless browser used when direct requests are rejected.
#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct BrowserConfig {
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    navigation_timeout: Duration,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    poll_interval: Duration,
    #[get = "pub"]
    executable: Option<PathBuf>,
    #[get_copy = "pub"]
    no_sandbox: bool,
}

impl BrowserConfig {
    pub fn with_navigation_timeout(mut self, navigation_timeout: Duration) -> Self {
        self.navigation_timeout = navigation_timeout;
        self
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            executable: None,
            no_sandbox: true,
        }
    }
}
