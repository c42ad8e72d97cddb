use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Uppercase letter identifying a problem by its position in a contest.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "char", into = "char")]
pub struct ProblemLabel(char);

impl ProblemLabel {
    pub const MAX_COUNT: usize = 26;

    pub fn from_index(index: usize) -> Option<Self> {
        if index < Self::MAX_COUNT {
            Some(Self::nth(index))
        } else {
            None
        }
    }

    // callers check the bound
    fn nth(index: usize) -> Self {
        Self(char::from(b'A' + index as u8))
    }

    pub fn index(self) -> usize {
        (self.0 as u8 - b'A') as usize
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl TryFrom<char> for ProblemLabel {
    type Error = &'static str;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        if c.is_ascii_uppercase() {
            Ok(Self(c))
        } else {
            Err("problem label must be an uppercase letter A-Z")
        }
    }
}

impl From<ProblemLabel> for char {
    fn from(label: ProblemLabel) -> Self {
        label.0
    }
}

impl FromStr for ProblemLabel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::try_from(c.to_ascii_uppercase()),
            _ => Err("problem label must be a single letter"),
        }
    }
}

impl fmt::Display for ProblemLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash,
)]
pub struct ProblemDescriptor {
    #[get_copy = "pub"]
    label: ProblemLabel,
    #[get = "pub"]
    title: String,
}

impl ProblemDescriptor {
    pub fn new(label: ProblemLabel, title: impl Into<String>) -> Self {
        Self {
            label,
            title: title.into(),
        }
    }

    /// Labels titles by position.
    ///
    /// Returns `None` when there are more titles than labels.
    pub fn sequence<I, T>(titles: I) -> Option<Vec<Self>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        titles
            .into_iter()
            .enumerate()
            .map(|(i, title)| ProblemLabel::from_index(i).map(|label| Self::new(label, title)))
            .collect()
    }
}

impl fmt::Display for ProblemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {}", self.label, self.title)
    }
}

/// Builds a problem list when the origin can not supply one.
///
/// Titles are taken from the comma separated `titles` by position; a missing
/// or blank entry falls back to the label itself.
pub fn synthesize(count: usize, titles: Option<&str>) -> Result<Vec<ProblemDescriptor>, FetchError> {
    if count == 0 || count > ProblemLabel::MAX_COUNT {
        return Err(FetchError::configuration(format!(
            "problem count must be between 1 and {}, but was {}",
            ProblemLabel::MAX_COUNT,
            count
        )));
    }
    let titles: Vec<&str> = titles
        .map(|titles| titles.split(',').map(str::trim).collect())
        .unwrap_or_default();
    let problems = (0..count)
        .map(|i| {
            let label = ProblemLabel::nth(i);
            match titles.get(i) {
                Some(title) if !title.is_empty() => ProblemDescriptor::new(label, *title),
                _ => ProblemDescriptor::new(label, label.to_string()),
            }
        })
        .collect();
    Ok(problems)
}
