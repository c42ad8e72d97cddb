use crate::FetchError;

/// Result of one acquisition attempt, before any escalation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    /// The origin answered, but not with what was asked for.
    PartialFailure { reason: String, snippet: String },
    HardFailure(FetchError),
}

impl<T> Outcome<T> {
    pub fn partial(reason: impl Into<String>, body: &str) -> Self {
        Self::PartialFailure {
            reason: reason.into(),
            snippet: snippet(body),
        }
    }

    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::PartialFailure { reason, snippet } => Err(FetchError::Shape { reason, snippet }),
            Self::HardFailure(err) => Err(err),
        }
    }
}

const SNIPPET_LEN: usize = 160;

/// Short single-line excerpt of a response body for diagnostics.
pub fn snippet(body: &str) -> String {
    let collapsed = cpcache_util::regex!(r"\s+").replace_all(body.trim(), " ");
    let mut snippet: String = collapsed.chars().take(SNIPPET_LEN).collect();
    if collapsed.chars().count() > SNIPPET_LEN {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_collapses_and_truncates() {
        assert_eq!(snippet("  <html>\n  <title>x</title>\n"), "<html> <title>x</title>");
        let long = "a".repeat(500);
        let short = snippet(&long);
        assert_eq!(short.len(), SNIPPET_LEN + 3);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_into_result() {
        let partial: Outcome<()> = Outcome::partial("missing \"title\"", "{}");
        assert_eq!(
            partial.into_result(),
            Err(FetchError::Shape {
                reason: "missing \"title\"".into(),
                snippet: "{}".into()
            })
        );
        let hard: Outcome<()> = Outcome::HardFailure(FetchError::transport("refused"));
        assert_eq!(hard.into_result(), Err(FetchError::transport("refused")));
        assert_eq!(Outcome::Success(2).into_result(), Ok(2));
    }
}
