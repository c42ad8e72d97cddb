use std::fmt;

use cookie::Cookie;
use getset::Getters;
use tracing::warn;

use crate::error::FetchError;
use crate::model::ContestId;

/// Credentials replayed against the origin for a single acquisition.
#[derive(Getters, Clone, PartialEq, Eq)]
#[get = "pub"]
pub struct CredentialContext {
    cookies: String,
    contest_id: ContestId,
    contest_password: Option<String>,
}

impl CredentialContext {
    pub fn new(
        cookies: impl Into<String>,
        contest_id: impl Into<ContestId>,
        contest_password: Option<String>,
    ) -> Result<Self, FetchError> {
        let cookies = cookies.into().trim().to_owned();
        let contest_id = contest_id.into();
        if cookies.is_empty() {
            return Err(FetchError::configuration("session cookies are not set"));
        }
        if contest_id.is_blank() {
            return Err(FetchError::configuration("contest id is not set"));
        }
        let contest_password = contest_password.filter(|pass| !pass.is_empty());
        Ok(Self {
            cookies,
            contest_id,
            contest_password,
        })
    }

    /// Splits the raw cookie header into name/value pairs.
    pub fn cookie_pairs(&self) -> Vec<(String, String)> {
        self.cookies
            .split(';')
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .filter_map(|fragment| match Cookie::parse(fragment) {
                Ok(cookie) => Some((cookie.name().to_owned(), cookie.value().to_owned())),
                Err(err) => {
                    warn!("Skipping malformed cookie fragment ({})", err);
                    None
                }
            })
            .collect()
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("cookies", &format_args!("<{} bytes>", self.cookies.len()))
            .field("contest_id", &self.contest_id)
            .field(
                "contest_password",
                &self.contest_password.as_ref().map(|_| "********"),
            )
            .finish()
    }
}
