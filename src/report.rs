use crate::calc::format_2dp;
use crate::gradebook::Gradebook;
use crate::model::{AnnualResult, CommentSlot, MarkValue, RankedResult, ResultSet, SequenceId, Term};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const NO_COMMENT: &str = "No comment";
pub const NO_PROGRESS_NOTE: &str = "No progress note";
pub const ANNUAL_SUMMARY_TITLE: &str = "Annual Summary";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRow {
    pub sequence: String,
    pub sequence_id: SequenceId,
    pub subject: String,
    pub mark: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub period: String,
    pub average: String,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: String,
    pub index: usize,
    pub file_name: String,
    pub sequence_rows: Vec<SequenceRow>,
    pub summary_rows: Vec<SummaryRow>,
    pub progress_note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultsLayout {
    Ranked,
    Annual,
}

impl ResultsLayout {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ResultsLayout::Ranked => &["rank", "student", "totalMarks", "average"],
            ResultsLayout::Annual => &[
                "rank",
                "student",
                "firstTermAvg",
                "secondTermAvg",
                "thirdTermAvg",
                "finalAvg",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub title: String,
    pub file_name: String,
    pub layout: ResultsLayout,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub class_average: String,
    pub pass_percentage: String,
}

/// Input to the ranked-results document: either layout's result set.
#[derive(Debug, Clone, Copy)]
pub enum ResultsInput<'a> {
    Ranked(&'a ResultSet<RankedResult>),
    Annual(&'a ResultSet<AnnualResult>),
}

impl ResultsInput<'_> {
    pub fn is_annual(&self) -> bool {
        matches!(self, ResultsInput::Annual(_))
    }

    fn is_empty(&self) -> bool {
        match self {
            ResultsInput::Ranked(s) => s.is_empty(),
            ResultsInput::Annual(s) => s.is_empty(),
        }
    }
}

/// Lower-cased title with whitespace runs collapsed to `-`.
pub fn results_file_name(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub fn student_file_name(student: &str) -> String {
    format!("{}_report", student)
}

fn mark_cell(value: Option<MarkValue>) -> String {
    match value {
        None => "-".to_string(),
        Some(MarkValue::Unset) => String::new(),
        Some(MarkValue::Score(v)) => v.to_string(),
    }
}

/// Builds the per-student document; `None` when `index` is not on the roster.
/// Summary rows come from whatever term and annual results are cached, matched
/// on roster index; a row whose name no longer matches (stale after a roster
/// edit) is skipped.
pub fn build_student_report(gb: &Gradebook, index: usize) -> Option<StudentReport> {
    let student = gb.students().get(index)?;
    let marks = gb.marks().get(index)?;
    let comments = gb.comments();

    let mut sequence_rows = Vec::new();
    for seq in SequenceId::ALL {
        let comment = comments
            .get(index, CommentSlot::Sequence(seq))
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_COMMENT);
        for subject in gb.subjects() {
            sequence_rows.push(SequenceRow {
                sequence: seq.label().to_string(),
                sequence_id: seq,
                subject: subject.name.clone(),
                mark: mark_cell(marks.sequence(seq).get(&subject.name).copied()),
                comment: comment.to_string(),
            });
        }
    }

    let mut summary_rows = Vec::new();
    for term in Term::ALL {
        if let Some(r) = gb
            .results()
            .term(term)
            .and_then(|c| {
                c.set
                    .results
                    .iter()
                    .find(|r| r.index == index && r.student == *student)
            })
        {
            summary_rows.push(SummaryRow {
                period: term.label().to_string(),
                average: format_2dp(r.average),
                rank: r.rank,
            });
        }
    }
    if let Some(r) = gb
        .results()
        .annual
        .as_ref()
        .and_then(|c| {
            c.set
                .results
                .iter()
                .find(|r| r.index == index && r.student == *student)
        })
    {
        summary_rows.push(SummaryRow {
            period: ANNUAL_SUMMARY_TITLE.to_string(),
            average: format_2dp(r.final_average),
            rank: r.rank,
        });
    }

    let progress_note = comments
        .get(index, CommentSlot::Annual)
        .filter(|c| !c.is_empty())
        .unwrap_or(NO_PROGRESS_NOTE)
        .to_string();

    Some(StudentReport {
        student: student.clone(),
        index,
        file_name: student_file_name(student),
        sequence_rows,
        summary_rows,
        progress_note,
    })
}

/// Builds the ranked-results document. An empty result set yields `None`.
pub fn build_results_report(title: &str, input: ResultsInput<'_>) -> Option<ResultsReport> {
    if input.is_empty() {
        return None;
    }
    let (layout, rows, class_average, pass_percentage) = match input {
        ResultsInput::Ranked(set) => (
            ResultsLayout::Ranked,
            set.results
                .iter()
                .map(|r| {
                    vec![
                        r.rank.to_string(),
                        r.student.clone(),
                        format_2dp(r.total_marks),
                        format_2dp(r.average),
                    ]
                })
                .collect::<Vec<_>>(),
            set.class_average,
            set.pass_percentage,
        ),
        ResultsInput::Annual(set) => (
            ResultsLayout::Annual,
            set.results
                .iter()
                .map(|r| {
                    vec![
                        r.rank.to_string(),
                        r.student.clone(),
                        format_2dp(r.first_term_average),
                        format_2dp(r.second_term_average),
                        format_2dp(r.third_term_average),
                        format_2dp(r.final_average),
                    ]
                })
                .collect::<Vec<_>>(),
            set.class_average,
            set.pass_percentage,
        ),
    };

    Some(ResultsReport {
        title: title.to_string(),
        file_name: results_file_name(title),
        layout,
        columns: layout.columns().iter().map(|c| c.to_string()).collect(),
        rows,
        class_average: format_2dp(class_average),
        pass_percentage: format_2dp(pass_percentage),
    })
}

/// Which cached result set a results document is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultView {
    Sequence,
    Term(Term),
    Annual,
}

impl ResultView {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sequence" => Some(ResultView::Sequence),
            "firstTerm" => Some(ResultView::Term(Term::First)),
            "secondTerm" => Some(ResultView::Term(Term::Second)),
            "thirdTerm" => Some(ResultView::Term(Term::Third)),
            "annual" => Some(ResultView::Annual),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultView::Sequence => "sequence",
            ResultView::Term(t) => t.as_str(),
            ResultView::Annual => "annual",
        }
    }
}

/// Results document for a cached view, titled the way the view is labelled.
/// `None` when nothing has been computed for the view or it is empty.
pub fn build_view_report(gb: &Gradebook, view: ResultView) -> Option<ResultsReport> {
    let results = gb.results();
    match view {
        ResultView::Sequence => {
            let cache = results.sequence.as_ref()?;
            build_results_report(
                cache.sequence.label(),
                ResultsInput::Ranked(&cache.cached.set),
            )
        }
        ResultView::Term(term) => {
            let cache = results.term(term)?;
            build_results_report(term.label(), ResultsInput::Ranked(&cache.set))
        }
        ResultView::Annual => {
            let cache = results.annual.as_ref()?;
            build_results_report(ANNUAL_SUMMARY_TITLE, ResultsInput::Annual(&cache.set))
        }
    }
}

/// Destination for rendered report documents.
pub trait ReportSink {
    /// Returns where the document was written.
    fn write_student_report(&mut self, report: &StudentReport) -> anyhow::Result<String>;
    fn write_results_report(&mut self, report: &ResultsReport) -> anyhow::Result<String>;
}

/// Writes each document as pretty JSON (`<file_name>.json`) into a directory.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write<T: Serialize>(&self, file_name: &str, doc: &T) -> anyhow::Result<String> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create directory {}", self.dir.to_string_lossy())
        })?;
        let path = self.dir.join(format!("{}.json", sanitize_file_name(file_name)));
        let body = serde_json::to_string_pretty(doc).context("failed to serialize report")?;
        std::fs::write(&path, body)
            .with_context(|| format!("failed to write report {}", path.to_string_lossy()))?;
        info!(path = %path.to_string_lossy(), "report written");
        Ok(path.to_string_lossy().to_string())
    }
}

impl ReportSink for JsonDirSink {
    fn write_student_report(&mut self, report: &StudentReport) -> anyhow::Result<String> {
        self.write(&report.file_name, report)
    }

    fn write_results_report(&mut self, report: &ResultsReport) -> anyhow::Result<String> {
        self.write(&report.file_name, report)
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim().is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}
