use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::model::ProblemDescriptor;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ContestId(String);

impl ContestId {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<T: Into<String>> From<T> for ContestId {
    fn from(id: T) -> Self {
        Self(id.into().trim().to_owned())
    }
}

impl FromStr for ContestId {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl AsRef<str> for ContestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time view of a contest and its problem list.
#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct ContestSnapshot {
    title: String,
    problems: Vec<ProblemDescriptor>,
    id: ContestId,
    password: Option<String>,
}

impl ContestSnapshot {
    pub fn new(
        title: impl Into<String>,
        problems: Vec<ProblemDescriptor>,
        id: impl Into<ContestId>,
        password: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            problems,
            id: id.into(),
            password,
        }
    }

    /// Problem at a 0-based position, as referenced by standings.
    pub fn problem_at(&self, index: usize) -> Option<&ProblemDescriptor> {
        self.problems.get(index)
    }
}

impl fmt::Display for ContestSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[{}] {}", self.id, self.title)?;
        for problem in &self.problems {
            writeln!(f, "  {}", problem)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::synthesize;

    #[test]
    fn test_contest_id_trims() {
        assert_eq!(ContestId::from(" 123 ").as_ref(), "123");
        assert!(ContestId::from("  ").is_blank());
        assert!(!ContestId::from("abc").is_blank());
    }

    #[test]
    fn test_snapshot_serialize() -> anyhow::Result<()> {
        let snapshot = ContestSnapshot::new("Weekly", synthesize(2, Some("Sum"))?, "123", None);
        let json = serde_json::to_value(&snapshot)?;
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Weekly",
                "problems": [
                    { "label": "A", "title": "Sum" },
                    { "label": "B", "title": "B" },
                ],
                "id": "123",
                "password": null,
            })
        );
        Ok(())
    }

    #[test]
    fn test_problem_at() -> anyhow::Result<()> {
        let snapshot = ContestSnapshot::new("Weekly", synthesize(3, None)?, "1", None);
        assert_eq!(snapshot.problem_at(2).map(|p| p.label().as_char()), Some('C'));
        assert!(snapshot.problem_at(3).is_none());
        Ok(())
    }

    #[test]
    fn test_display() -> anyhow::Result<()> {
        let snapshot = ContestSnapshot::new("Weekly", synthesize(1, Some("Sum"))?, "9", None);
        assert_eq!(snapshot.to_string(), "[9] Weekly\n  A - Sum\n");
        Ok(())
    }
}
