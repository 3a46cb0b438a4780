use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Maximum raw score for the subject.
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequenceId {
    FirstSequence,
    SecondSequence,
    ThirdSequence,
    FourthSequence,
    FifthSequence,
    SixthSequence,
}

impl SequenceId {
    pub const ALL: [SequenceId; 6] = [
        SequenceId::FirstSequence,
        SequenceId::SecondSequence,
        SequenceId::ThirdSequence,
        SequenceId::FourthSequence,
        SequenceId::FifthSequence,
        SequenceId::SixthSequence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SequenceId::FirstSequence => "firstSequence",
            SequenceId::SecondSequence => "secondSequence",
            SequenceId::ThirdSequence => "thirdSequence",
            SequenceId::FourthSequence => "fourthSequence",
            SequenceId::FifthSequence => "fifthSequence",
            SequenceId::SixthSequence => "sixthSequence",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    pub fn label(self) -> &'static str {
        match self {
            SequenceId::FirstSequence => "First Sequence",
            SequenceId::SecondSequence => "Second Sequence",
            SequenceId::ThirdSequence => "Third Sequence",
            SequenceId::FourthSequence => "Fourth Sequence",
            SequenceId::FifthSequence => "Fifth Sequence",
            SequenceId::SixthSequence => "Sixth Sequence",
        }
    }
}

/// Whether a term needs both of its sequences populated before it computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermGate {
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    First,
    Second,
    Third,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::First, Term::Second, Term::Third];

    pub fn sequences(self) -> (SequenceId, SequenceId) {
        match self {
            Term::First => (SequenceId::FirstSequence, SequenceId::SecondSequence),
            Term::Second => (SequenceId::ThirdSequence, SequenceId::FourthSequence),
            Term::Third => (SequenceId::FifthSequence, SequenceId::SixthSequence),
        }
    }

    pub fn gate(self) -> TermGate {
        match self {
            Term::First | Term::Second => TermGate::Strict,
            Term::Third => TermGate::Lenient,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Term::First => "firstTerm",
            Term::Second => "secondTerm",
            Term::Third => "thirdTerm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Term::First => "First Term",
            Term::Second => "Second Term",
            Term::Third => "Third Term",
        }
    }
}

/// A single recorded mark. `Unset` is stored as `""` and is not the same as a
/// score of zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MarkValue {
    #[default]
    Unset,
    Score(f64),
}

impl MarkValue {
    pub fn is_set(self) -> bool {
        matches!(self, MarkValue::Score(_))
    }

    pub fn or_zero(self) -> f64 {
        match self {
            MarkValue::Unset => 0.0,
            MarkValue::Score(v) => v,
        }
    }
}

impl Serialize for MarkValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MarkValue::Unset => serializer.serialize_str(""),
            MarkValue::Score(v) => serializer.serialize_f64(*v),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMark {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for MarkValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored snapshots only ever hold numbers or "", anything else reads as unset.
        let raw = Option::<RawMark>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawMark::Number(v)) if v.is_finite() => MarkValue::Score(v),
            Some(RawMark::Text(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => MarkValue::Score(v),
                _ => MarkValue::Unset,
            },
            _ => MarkValue::Unset,
        })
    }
}

pub type ScoreMap = BTreeMap<String, MarkValue>;

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ScoreMap, D::Error> {
    Ok(Option::<ScoreMap>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMarks {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_sequence: ScoreMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub second_sequence: ScoreMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub third_sequence: ScoreMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fourth_sequence: ScoreMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fifth_sequence: ScoreMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sixth_sequence: ScoreMap,
}

impl StudentMarks {
    pub fn sequence(&self, seq: SequenceId) -> &ScoreMap {
        match seq {
            SequenceId::FirstSequence => &self.first_sequence,
            SequenceId::SecondSequence => &self.second_sequence,
            SequenceId::ThirdSequence => &self.third_sequence,
            SequenceId::FourthSequence => &self.fourth_sequence,
            SequenceId::FifthSequence => &self.fifth_sequence,
            SequenceId::SixthSequence => &self.sixth_sequence,
        }
    }

    pub fn sequence_mut(&mut self, seq: SequenceId) -> &mut ScoreMap {
        match seq {
            SequenceId::FirstSequence => &mut self.first_sequence,
            SequenceId::SecondSequence => &mut self.second_sequence,
            SequenceId::ThirdSequence => &mut self.third_sequence,
            SequenceId::FourthSequence => &mut self.fourth_sequence,
            SequenceId::FifthSequence => &mut self.fifth_sequence,
            SequenceId::SixthSequence => &mut self.sixth_sequence,
        }
    }

    pub fn mark(&self, seq: SequenceId, subject: &str) -> MarkValue {
        self.sequence(seq).get(subject).copied().unwrap_or_default()
    }

    pub fn has_data(&self, seq: SequenceId) -> bool {
        self.sequence(seq).values().any(|v| v.is_set())
    }

    /// Legacy snapshots stored one flat map per student; that data becomes the
    /// first sequence.
    pub fn from_legacy(flat: ScoreMap) -> Self {
        Self {
            first_sequence: flat,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSlot {
    Sequence(SequenceId),
    Annual,
}

impl CommentSlot {
    pub const ANNUAL_KEY: &'static str = "annual";

    pub fn as_str(self) -> &'static str {
        match self {
            CommentSlot::Sequence(seq) => seq.as_str(),
            CommentSlot::Annual => Self::ANNUAL_KEY,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if raw == Self::ANNUAL_KEY {
            return Some(CommentSlot::Annual);
        }
        SequenceId::parse(raw).map(CommentSlot::Sequence)
    }
}

/// Comments keyed by student index, then by slot key. Indices are positional
/// and are not renumbered when a student is removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentComments(BTreeMap<usize, BTreeMap<String, String>>);

impl StudentComments {
    pub fn get(&self, index: usize, slot: CommentSlot) -> Option<&str> {
        self.0
            .get(&index)
            .and_then(|m| m.get(slot.as_str()))
            .map(String::as_str)
    }

    pub fn for_student(&self, index: usize) -> Option<&BTreeMap<String, String>> {
        self.0.get(&index)
    }

    pub fn set(&mut self, index: usize, slot: CommentSlot, text: impl Into<String>) {
        self.0
            .entry(index)
            .or_default()
            .insert(slot.as_str().to_string(), text.into());
    }

    pub fn drop_student(&mut self, index: usize) {
        self.0.remove(&index);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    /// Roster position the row was computed for.
    #[serde(skip)]
    pub index: usize,
    pub student: String,
    pub total_marks: f64,
    pub average: f64,
    pub rank: usize,
}

pub type SequenceResult = RankedResult;
pub type TermResult = RankedResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualResult {
    #[serde(skip)]
    pub index: usize,
    pub student: String,
    pub first_term_average: f64,
    pub second_term_average: f64,
    pub third_term_average: f64,
    pub final_average: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet<T> {
    pub results: Vec<T>,
    pub class_average: f64,
    pub pass_percentage: f64,
}

impl<T> ResultSet<T> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
