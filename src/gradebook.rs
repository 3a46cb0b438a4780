use crate::calc::{self, CalcContext};
use crate::model::{
    AnnualResult, CommentSlot, MarkValue, ResultSet, SequenceId, SequenceResult, StudentComments,
    StudentMarks, Subject, Term, TermResult,
};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct GradebookError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GradebookError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for GradebookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GradebookError {}

/// A derived result set plus whether the data it was computed from has
/// changed since.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cached<T> {
    #[serde(flatten)]
    pub set: ResultSet<T>,
    pub stale: bool,
}

impl<T> Cached<T> {
    fn fresh(set: ResultSet<T>) -> Self {
        Self { set, stale: false }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceCache {
    pub sequence: SequenceId,
    #[serde(flatten)]
    pub cached: Cached<SequenceResult>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsCache {
    pub sequence: Option<SequenceCache>,
    pub first_term: Option<Cached<TermResult>>,
    pub second_term: Option<Cached<TermResult>>,
    pub third_term: Option<Cached<TermResult>>,
    pub annual: Option<Cached<AnnualResult>>,
}

impl ResultsCache {
    pub fn term(&self, term: Term) -> Option<&Cached<TermResult>> {
        match term {
            Term::First => self.first_term.as_ref(),
            Term::Second => self.second_term.as_ref(),
            Term::Third => self.third_term.as_ref(),
        }
    }

    fn term_slot(&mut self, term: Term) -> &mut Option<Cached<TermResult>> {
        match term {
            Term::First => &mut self.first_term,
            Term::Second => &mut self.second_term,
            Term::Third => &mut self.third_term,
        }
    }

    fn mark_stale(&mut self) {
        if let Some(s) = self.sequence.as_mut() {
            s.cached.stale = true;
        }
        for c in [
            self.first_term.as_mut(),
            self.second_term.as_mut(),
            self.third_term.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            c.stale = true;
        }
        if let Some(a) = self.annual.as_mut() {
            a.stale = true;
        }
    }
}

/// Which results a `recompute_terms` call produced; `false` means the data
/// gate was not met and the previous result was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsOutcome {
    pub first_term: bool,
    pub second_term: bool,
    pub third_term: bool,
    pub annual: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkEdit {
    pub student: usize,
    pub subject: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BulkOutcome {
    pub updated: usize,
    pub rejected: usize,
}

/// The whole session: roster, subjects, marks, comments and the last
/// computed results. `students[i]` always pairs with `marks[i]`.
#[derive(Debug, Clone, Default)]
pub struct Gradebook {
    students: Vec<String>,
    subjects: Vec<Subject>,
    marks: Vec<StudentMarks>,
    comments: StudentComments,
    results: ResultsCache,
}

impl Gradebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a session from stored collections. Marks are padded or truncated
    /// to the roster length.
    pub fn from_parts(
        students: Vec<String>,
        subjects: Vec<Subject>,
        mut marks: Vec<StudentMarks>,
        comments: StudentComments,
    ) -> Self {
        marks.resize_with(students.len(), StudentMarks::default);
        Self {
            students,
            subjects,
            marks,
            comments,
            results: ResultsCache::default(),
        }
    }

    pub fn students(&self) -> &[String] {
        &self.students
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn marks(&self) -> &[StudentMarks] {
        &self.marks
    }

    pub fn comments(&self) -> &StudentComments {
        &self.comments
    }

    pub fn results(&self) -> &ResultsCache {
        &self.results
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        // Duplicate names collide; the last definition wins, as it would as a map key.
        self.subjects.iter().rev().find(|s| s.name == name)
    }

    /// True when any student has any set mark in any sequence.
    pub fn has_marks(&self) -> bool {
        self.marks
            .iter()
            .any(|m| SequenceId::ALL.into_iter().any(|seq| m.has_data(seq)))
    }

    fn ctx(&self) -> CalcContext<'_> {
        CalcContext {
            students: &self.students,
            subjects: &self.subjects,
            marks: &self.marks,
        }
    }

    pub fn add_student(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        debug!(student = %name, "add student");
        self.students.push(name);
        self.marks.push(StudentMarks::default());
        self.results.mark_stale();
        self.students.len() - 1
    }

    pub fn edit_student(&mut self, index: usize, name: impl Into<String>) -> bool {
        let Some(slot) = self.students.get_mut(index) else {
            return false;
        };
        *slot = name.into();
        self.results.mark_stale();
        true
    }

    /// Removes the student, their marks and the comments keyed by `index`.
    /// Comments of later students keep their old indices.
    pub fn delete_student(&mut self, index: usize) -> bool {
        if index >= self.students.len() {
            return false;
        }
        let name = self.students.remove(index);
        self.marks.remove(index);
        self.comments.drop_student(index);
        self.results.mark_stale();
        info!(student = %name, index, "deleted student");
        true
    }

    pub fn add_subject(&mut self, name: impl Into<String>, total: f64) -> Result<usize, GradebookError> {
        validate_total(total)?;
        let name = name.into();
        debug!(subject = %name, total, "add subject");
        self.subjects.push(Subject { name, total });
        self.results.mark_stale();
        Ok(self.subjects.len() - 1)
    }

    /// Replaces the subject at `index`. A rename carries existing marks over
    /// to the new name.
    pub fn edit_subject(
        &mut self,
        index: usize,
        name: impl Into<String>,
        total: f64,
    ) -> Result<bool, GradebookError> {
        validate_total(total)?;
        let name = name.into();
        let Some(subject) = self.subjects.get_mut(index) else {
            return Ok(false);
        };
        let old_name = std::mem::replace(&mut subject.name, name.clone());
        subject.total = total;

        if old_name != name {
            for m in &mut self.marks {
                for seq in SequenceId::ALL {
                    let map = m.sequence_mut(seq);
                    if let Some(v) = map.remove(&old_name) {
                        map.insert(name.clone(), v);
                    }
                }
            }
        }
        self.results.mark_stale();
        Ok(true)
    }

    /// Removes every subject named `name` and purges that key from all six
    /// sequences of every student.
    pub fn delete_subject(&mut self, name: &str) -> bool {
        let before = self.subjects.len();
        self.subjects.retain(|s| s.name != name);
        if self.subjects.len() == before {
            return false;
        }
        for m in &mut self.marks {
            for seq in SequenceId::ALL {
                m.sequence_mut(seq).remove(name);
            }
        }
        self.results.mark_stale();
        info!(subject = %name, "deleted subject");
        true
    }

    pub fn delete_subject_at(&mut self, index: usize) -> bool {
        let Some(name) = self.subjects.get(index).map(|s| s.name.clone()) else {
            return false;
        };
        self.delete_subject(&name)
    }

    /// Single mark entry. Returns `false` when the entry was ignored: unknown
    /// student or subject, non-numeric input, or a value outside
    /// `[0, subject.total]`.
    pub fn set_mark(&mut self, student: usize, seq: SequenceId, subject: &str, raw: &str) -> bool {
        let Some(total) = self.subject(subject).map(|s| s.total) else {
            return false;
        };
        if student >= self.marks.len() {
            return false;
        }
        let Some(value) = calc::parse_mark_input(raw, total) else {
            debug!(student, subject, raw, "mark rejected");
            return false;
        };
        self.store_mark(student, seq, subject, value);
        true
    }

    fn store_mark(&mut self, student: usize, seq: SequenceId, subject: &str, value: MarkValue) {
        self.marks[student]
            .sequence_mut(seq)
            .insert(subject.to_string(), value);
        self.results.mark_stale();
    }

    /// Bulk entry goes through `set_mark` for every edit.
    pub fn bulk_set_marks(&mut self, seq: SequenceId, edits: &[MarkEdit]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for e in edits {
            if self.set_mark(e.student, seq, &e.subject, &e.value) {
                outcome.updated += 1;
            } else {
                outcome.rejected += 1;
            }
        }
        info!(sequence = seq.as_str(), updated = outcome.updated, rejected = outcome.rejected, "bulk marks");
        outcome
    }

    pub fn set_comment(&mut self, student: usize, slot: CommentSlot, text: impl Into<String>) -> bool {
        if student >= self.students.len() {
            return false;
        }
        self.comments.set(student, slot, text);
        true
    }

    pub fn recompute_sequence(&mut self, seq: SequenceId) -> &SequenceCache {
        let set = calc::compute_sequence_results(&self.ctx(), seq);
        info!(sequence = seq.as_str(), students = set.results.len(), "sequence results");
        self.results.sequence.insert(SequenceCache {
            sequence: seq,
            cached: Cached::fresh(set),
        })
    }

    /// Returns `false` and leaves the cached term untouched when the data gate
    /// is not met.
    pub fn recompute_term(&mut self, term: Term) -> bool {
        let Some(set) = calc::compute_term_results(&self.ctx(), term) else {
            debug!(term = term.as_str(), "term gated: missing sequence data");
            return false;
        };
        *self.results.term_slot(term) = Some(Cached::fresh(set));
        true
    }

    pub fn recompute_annual(&mut self) -> bool {
        let Some(set) = calc::compute_annual_results(&self.ctx()) else {
            debug!("annual gated: a term has no data");
            return false;
        };
        self.results.annual = Some(Cached::fresh(set));
        true
    }

    pub fn recompute_terms(&mut self) -> TermsOutcome {
        let outcome = TermsOutcome {
            first_term: self.recompute_term(Term::First),
            second_term: self.recompute_term(Term::Second),
            third_term: self.recompute_term(Term::Third),
            annual: self.recompute_annual(),
        };
        info!(?outcome, "term results");
        outcome
    }

    /// Back to the initial empty state, derived results included.
    pub fn reset(&mut self) {
        *self = Self::default();
        info!("gradebook reset");
    }
}

fn validate_total(total: f64) -> Result<(), GradebookError> {
    if total.is_finite() && total > 0.0 {
        Ok(())
    } else {
        Err(GradebookError::new("bad_params", "subject total must be a positive number")
            .with_details(serde_json::json!({ "total": total })))
    }
}
