//! Checks origin responses before anything downstream sees them.
//!
//! A body the origin returned is either usable data or a [`PartialFailure`]
//! carrying a short snippet of what came back instead. Challenge pages and
//! login redirects answer with a success status and HTML, so the status code
//! alone says little.
//!
//! [`PartialFailure`]: crate::Outcome::PartialFailure

use scraper::Html;
use serde_json::Value;

use cpcache_util::select;

use crate::model::{ProblemDescriptor, StandingsSnapshot};
use crate::{FetchError, Outcome};

/// Contest metadata as the origin reports it.
///
/// `problems` is `None` when the origin did not provide a usable problem
/// list; callers fill it in from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestMeta {
    pub title: String,
    pub problems: Option<Vec<ProblemDescriptor>>,
}

/// Raw answer of the origin to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Classifies the response and parses the body when it looks usable.
    pub fn classify<T>(&self, parse: fn(&str) -> Outcome<T>) -> Outcome<T> {
        if self.is_success() {
            return parse(&self.body);
        }
        if self.body.trim().is_empty() {
            return Outcome::HardFailure(FetchError::transport(format!(
                "HTTP {} with an empty body",
                self.status
            )));
        }
        Outcome::partial(format!("HTTP {}", self.status), &self.body)
    }
}

pub fn contest_meta(body: &str) -> Outcome<ContestMeta> {
    let value = match parse_object(body) {
        Ok(value) => value,
        Err(outcome) => return outcome,
    };
    let title = match value.get("title").and_then(Value::as_str).map(str::trim) {
        Some(title) if !title.is_empty() => title.to_owned(),
        _ => return Outcome::partial("missing \"title\"", body),
    };
    let problems = value.get("problems").and_then(usable_problems);
    Outcome::Success(ContestMeta { title, problems })
}

pub fn standings(body: &str) -> Outcome<StandingsSnapshot> {
    let value = match parse_object(body) {
        Ok(value) => value,
        Err(outcome) => return outcome,
    };
    if !value.get("participants").map_or(false, Value::is_object) {
        return Outcome::partial("missing \"participants\"", body);
    }
    if !value.get("submissions").map_or(false, Value::is_array) {
        return Outcome::partial("missing \"submissions\"", body);
    }
    match serde_json::from_value(value) {
        Ok(standings) => Outcome::Success(standings),
        Err(err) => Outcome::partial(format!("malformed standings ({})", err), body),
    }
}

fn parse_object<T>(body: &str) -> Result<Value, Outcome<T>> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(Outcome::partial("response is not a json object", body)),
        Err(_) => Err(Outcome::partial(describe_non_json(body), body)),
    }
}

fn describe_non_json(body: &str) -> String {
    if body.trim().is_empty() {
        return "response body is empty".into();
    }
    let html = Html::parse_document(body);
    match html.select(select!("title")).next() {
        Some(title) => format!(
            "response is an html page titled {:?}",
            title.text().collect::<String>().trim()
        ),
        None => "response is not json".into(),
    }
}

fn usable_problems(value: &Value) -> Option<Vec<ProblemDescriptor>> {
    let entries = value.as_array().filter(|entries| !entries.is_empty())?;
    let titles = entries
        .iter()
        .map(|entry| {
            entry
                .get("title")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|title| !title.is_empty())
        })
        .collect::<Option<Vec<_>>>()?;
    ProblemDescriptor::sequence(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason<T: std::fmt::Debug>(outcome: Outcome<T>) -> String {
        match outcome {
            Outcome::PartialFailure { reason, .. } => reason,
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[test]
    fn test_contest_meta_with_problems() {
        let body = r#"{"title":" Weekly #12 ","problems":[{"title":"Sum"},{"title":"Sort"}]}"#;
        let meta = contest_meta(body).into_result().unwrap();
        assert_eq!(meta.title, "Weekly #12");
        let problems = meta.problems.unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[1].to_string(), "B - Sort");
    }

    #[test]
    fn test_contest_meta_without_usable_problems() {
        for body in &[
            r#"{"title":"T"}"#,
            r#"{"title":"T","problems":[]}"#,
            r#"{"title":"T","problems":[{"title":"A"},{"num":"B"}]}"#,
            r#"{"title":"T","problems":"A,B"}"#,
        ] {
            let meta = contest_meta(body).into_result().unwrap();
            assert_eq!(meta.problems, None, "{}", body);
        }
    }

    #[test]
    fn test_contest_meta_rejects() {
        assert_eq!(reason(contest_meta("{}")), "missing \"title\"");
        assert_eq!(reason(contest_meta(r#"{"title":"  "}"#)), "missing \"title\"");
        assert_eq!(reason(contest_meta("[1,2]")), "response is not a json object");
        assert_eq!(reason(contest_meta("")), "response body is empty");
        assert_eq!(
            reason(contest_meta(
                "<html><head><title>Just a moment...</title></head><body></body></html>"
            )),
            "response is an html page titled \"Just a moment...\""
        );
    }

    #[test]
    fn test_standings() {
        let body = r#"{
            "participants": {"7": ["alice", "Alice", ""]},
            "submissions": [[7, 0, 1, 120], [7, 1, 0, 300]]
        }"#;
        let standings = standings(body).into_result().unwrap();
        assert_eq!(standings.participants().len(), 1);
        assert_eq!(standings.submissions().len(), 2);
    }

    #[test]
    fn test_standings_rejects() {
        assert_eq!(
            reason(standings(r#"{"submissions":[]}"#)),
            "missing \"participants\""
        );
        assert_eq!(
            reason(standings(r#"{"participants":{}}"#)),
            "missing \"submissions\""
        );
        assert!(reason(standings(r#"{"participants":{},"submissions":[[1]]}"#))
            .starts_with("malformed standings"));
    }

    #[test]
    fn test_classify() {
        let ok = RawResponse::new(200, r#"{"title":"T"}"#);
        assert!(matches!(ok.classify(contest_meta), Outcome::Success(_)));

        let empty = RawResponse::new(502, "  ");
        assert_eq!(
            empty.classify(contest_meta),
            Outcome::HardFailure(FetchError::transport("HTTP 502 with an empty body"))
        );

        let forbidden = RawResponse::new(403, "<html>denied</html>");
        match forbidden.classify(contest_meta) {
            Outcome::PartialFailure { reason, snippet } => {
                assert_eq!(reason, "HTTP 403");
                assert_eq!(snippet, "<html>denied</html>");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
