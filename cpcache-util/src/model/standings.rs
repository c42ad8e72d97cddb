use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ContestSnapshot, ProblemDescriptor, ProblemLabel};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ParticipantId(u64);

impl From<u64> for ParticipantId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Participant record.
///
/// The origin encodes it as a positional array
/// `[handle, display_name, avatar_url?]`; the fields are written back as
/// received, blank ones included.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct Participant {
    handle: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

impl Participant {
    pub fn new(
        handle: impl Into<String>,
        display_name: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            display_name: Some(display_name.into()),
            avatar_url,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Name to show, the handle when the origin sent none.
    pub fn display_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.handle,
        }
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref().filter(|url| !url.is_empty())
    }
}

impl TryFrom<Vec<Value>> for Participant {
    type Error = String;

    fn try_from(row: Vec<Value>) -> Result<Self, Self::Error> {
        let handle = match row.first() {
            Some(Value::String(handle)) if !handle.is_empty() => handle.to_owned(),
            other => return Err(format!("participant handle must be a string, got {:?}", other)),
        };
        Ok(Self {
            handle,
            display_name: string_at(&row, 1),
            avatar_url: string_at(&row, 2),
        })
    }
}

impl From<Participant> for Vec<Value> {
    fn from(participant: Participant) -> Self {
        let mut row = vec![Value::String(participant.handle)];
        match (participant.display_name, participant.avatar_url) {
            (display_name, Some(avatar_url)) => {
                row.push(Value::String(display_name.unwrap_or_default()));
                row.push(Value::String(avatar_url));
            }
            (Some(display_name), None) => row.push(Value::String(display_name)),
            (None, None) => {}
        }
        row
    }
}

fn string_at(row: &[Value], index: usize) -> Option<String> {
    row.get(index).and_then(Value::as_str).map(str::to_owned)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    Accepted,
    Rejected,
    Other(i64),
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

impl From<i64> for Verdict {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Accepted,
            0 => Self::Rejected,
            n => Self::Other(n),
        }
    }
}

impl From<Verdict> for i64 {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accepted => 1,
            Verdict::Rejected => 0,
            Verdict::Other(n) => n,
        }
    }
}

/// Verdict as the origin spelled it, a flag or a numeric code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum VerdictCode {
    Flag(bool),
    Code(i64),
}

impl VerdictCode {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Flag(*flag)),
            Value::Number(n) => n.as_i64().map(Self::Code),
            _ => None,
        }
    }

    fn verdict(self) -> Verdict {
        match self {
            Self::Flag(true) => Verdict::Accepted,
            Self::Flag(false) => Verdict::Rejected,
            Self::Code(code) => Verdict::from(code),
        }
    }
}

impl From<VerdictCode> for Value {
    fn from(code: VerdictCode) -> Self {
        match code {
            VerdictCode::Flag(flag) => Value::Bool(flag),
            VerdictCode::Code(code) => Value::from(code),
        }
    }
}

/// Submission record, `[participant_id, problem_index, verdict, timestamp]`
/// on the wire.
#[derive(Serialize, Deserialize, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct Submission {
    #[get_copy = "pub"]
    participant_id: ParticipantId,
    #[get_copy = "pub"]
    problem_index: usize,
    verdict: VerdictCode,
    #[get_copy = "pub"]
    timestamp: i64,
}

impl Submission {
    pub fn new(
        participant_id: impl Into<ParticipantId>,
        problem_index: usize,
        verdict: Verdict,
        timestamp: i64,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            problem_index,
            verdict: VerdictCode::Code(verdict.into()),
            timestamp,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict.verdict()
    }

    /// Label by position; the index is never matched against titles.
    pub fn label(&self) -> Option<ProblemLabel> {
        ProblemLabel::from_index(self.problem_index)
    }

    pub fn problem<'a>(&self, contest: &'a ContestSnapshot) -> Option<&'a ProblemDescriptor> {
        contest.problem_at(self.problem_index)
    }
}

impl TryFrom<Vec<Value>> for Submission {
    type Error = String;

    fn try_from(row: Vec<Value>) -> Result<Self, Self::Error> {
        if row.len() < 4 {
            return Err(format!(
                "submission must have 4 fields, got {}",
                row.len()
            ));
        }
        let participant_id = row[0]
            .as_u64()
            .ok_or_else(|| format!("invalid participant id: {}", row[0]))?;
        let problem_index = row[1]
            .as_u64()
            .ok_or_else(|| format!("invalid problem index: {}", row[1]))?;
        let verdict = VerdictCode::from_value(&row[2])
            .ok_or_else(|| format!("invalid verdict: {}", row[2]))?;
        let timestamp = row[3]
            .as_i64()
            .ok_or_else(|| format!("invalid timestamp: {}", row[3]))?;
        Ok(Self {
            participant_id: participant_id.into(),
            problem_index: problem_index as usize,
            verdict,
            timestamp,
        })
    }
}

impl From<Submission> for Vec<Value> {
    fn from(submission: Submission) -> Self {
        vec![
            Value::from(submission.participant_id.0),
            Value::from(submission.problem_index as u64),
            Value::from(submission.verdict),
            Value::from(submission.timestamp),
        ]
    }
}

/// Point-in-time standings of a contest.
#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq)]
#[get = "pub"]
pub struct StandingsSnapshot {
    participants: BTreeMap<ParticipantId, Participant>,
    submissions: Vec<Submission>,
}

impl StandingsSnapshot {
    pub fn new(
        participants: BTreeMap<ParticipantId, Participant>,
        submissions: Vec<Submission>,
    ) -> Self {
        Self {
            participants,
            submissions,
        }
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }
}

impl fmt::Display for StandingsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let accepted = self
            .submissions
            .iter()
            .filter(|s| s.verdict().is_accepted())
            .count();
        write!(
            f,
            "{} participants, {} submissions ({} accepted)",
            self.participants.len(),
            self.submissions.len(),
            accepted
        )
    }
}
