use crate::model::{
    AnnualResult, MarkValue, RankedResult, ResultSet, SequenceId, SequenceResult, StudentMarks,
    Subject, Term, TermGate, TermResult,
};
use std::cmp::Ordering;

/// Averages at or above this value pass, on the 20-point scale.
pub const PASSING_MARK: f64 = 10.0;
pub const SCALE_MAX: f64 = 20.0;

/// Normalize a raw mark to the 0..20 scale: `raw / total * 20`.
pub fn scaled_score(raw: f64, total: f64) -> f64 {
    if total > 0.0 {
        raw / total * SCALE_MAX
    } else {
        0.0
    }
}

/// Validates a single mark entry against the subject total.
///
/// Returns `None` when the entry must be ignored. An empty entry is the
/// explicit unset state.
pub fn parse_mark_input(raw: &str, total: f64) -> Option<MarkValue> {
    let t = raw.trim();
    if t.is_empty() {
        return Some(MarkValue::Unset);
    }
    let v = t.parse::<f64>().ok()?;
    if !v.is_finite() || v < 0.0 || v > total {
        return None;
    }
    Some(MarkValue::Score(v))
}

#[derive(Debug, Clone, Copy)]
pub struct CalcContext<'a> {
    pub students: &'a [String],
    pub subjects: &'a [Subject],
    pub marks: &'a [StudentMarks],
}

impl<'a> CalcContext<'a> {
    fn student_marks(&self, index: usize) -> Option<&'a StudentMarks> {
        self.marks.get(index)
    }

    fn mark(&self, index: usize, seq: SequenceId, subject: &str) -> f64 {
        self.student_marks(index)
            .map(|m| m.mark(seq, subject))
            .unwrap_or_default()
            .or_zero()
    }

    fn raw_mark(&self, index: usize, seq: SequenceId, subject: &str) -> MarkValue {
        self.student_marks(index)
            .map(|m| m.mark(seq, subject))
            .unwrap_or_default()
    }
}

/// True if any student has at least one set mark in `seq`.
pub fn sequence_has_data(marks: &[StudentMarks], seq: SequenceId) -> bool {
    marks.iter().any(|m| m.has_data(seq))
}

/// True if either sequence of `term` holds data for any student.
pub fn term_has_data(marks: &[StudentMarks], term: Term) -> bool {
    let (a, b) = term.sequences();
    sequence_has_data(marks, a) || sequence_has_data(marks, b)
}

/// Class average and pass percentage over per-student averages. Both are 0
/// for an empty class.
pub fn class_statistics(averages: &[f64]) -> (f64, f64) {
    if averages.is_empty() {
        return (0.0, 0.0);
    }
    let n = averages.len() as f64;
    let class_average = averages.iter().sum::<f64>() / n;
    let passed = averages.iter().filter(|a| **a >= PASSING_MARK).count();
    (class_average, 100.0 * passed as f64 / n)
}

trait Ranked {
    fn score(&self) -> f64;
    fn set_rank(&mut self, rank: usize);
}

impl Ranked for RankedResult {
    fn score(&self) -> f64 {
        self.average
    }

    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

impl Ranked for AnnualResult {
    fn score(&self) -> f64 {
        self.final_average
    }

    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

/// Stable descending sort, then 1-based consecutive ranks. Ties keep roster
/// order and still get distinct ranks.
fn rank_and_summarize<T: Ranked>(mut rows: Vec<T>) -> ResultSet<T> {
    let averages: Vec<f64> = rows.iter().map(Ranked::score).collect();
    let (class_average, pass_percentage) = class_statistics(&averages);

    rows.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
    for (i, row) in rows.iter_mut().enumerate() {
        row.set_rank(i + 1);
    }

    ResultSet {
        results: rows,
        class_average,
        pass_percentage,
    }
}

fn mean_over_subjects(sum: f64, subject_count: usize) -> f64 {
    if subject_count > 0 {
        sum / subject_count as f64
    } else {
        0.0
    }
}

pub fn compute_sequence_results(
    ctx: &CalcContext<'_>,
    seq: SequenceId,
) -> ResultSet<SequenceResult> {
    let rows = ctx
        .students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let mut total_marks = 0.0_f64;
            let mut scaled_sum = 0.0_f64;
            for subject in ctx.subjects {
                let mark = ctx.mark(i, seq, &subject.name);
                total_marks += mark;
                scaled_sum += scaled_score(mark, subject.total);
            }
            RankedResult {
                index: i,
                student: student.clone(),
                total_marks,
                average: mean_over_subjects(scaled_sum, ctx.subjects.len()),
                rank: 0,
            }
        })
        .collect();

    rank_and_summarize(rows)
}

/// Computes one term from its sequence pair.
///
/// `None` means the data gate was not met: a strict term needs both
/// sequences populated, a lenient term needs at least one.
pub fn compute_term_results(ctx: &CalcContext<'_>, term: Term) -> Option<ResultSet<TermResult>> {
    let (seq1, seq2) = term.sequences();
    let has1 = sequence_has_data(ctx.marks, seq1);
    let has2 = sequence_has_data(ctx.marks, seq2);

    let gate_ok = match term.gate() {
        TermGate::Strict => has1 && has2,
        TermGate::Lenient => has1 || has2,
    };
    if !gate_ok {
        return None;
    }

    let rows = ctx
        .students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let mut total_marks = 0.0_f64;
            let mut scaled_sum = 0.0_f64;
            for subject in ctx.subjects {
                let mark1 = ctx.mark(i, seq1, &subject.name);
                let mark2 = ctx.mark(i, seq2, &subject.name);
                let raw = match (has1, has2) {
                    (true, true) => (mark1 + mark2) / 2.0,
                    (true, false) => mark1,
                    _ => mark2,
                };
                total_marks += raw;
                scaled_sum += scaled_score(raw, subject.total);
            }
            RankedResult {
                index: i,
                student: student.clone(),
                total_marks,
                average: mean_over_subjects(scaled_sum, ctx.subjects.len()),
                rank: 0,
            }
        })
        .collect();

    Some(rank_and_summarize(rows))
}

/// Annual summary over all three terms. `None` unless every term has at least
/// one populated sequence.
pub fn compute_annual_results(ctx: &CalcContext<'_>) -> Option<ResultSet<AnnualResult>> {
    if !Term::ALL.into_iter().all(|t| term_has_data(ctx.marks, t)) {
        return None;
    }

    let rows = ctx
        .students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let mut term_sums = [0.0_f64; 3];
            for subject in ctx.subjects {
                let name = subject.name.as_str();
                let first = (ctx.mark(i, SequenceId::FirstSequence, name)
                    + ctx.mark(i, SequenceId::SecondSequence, name))
                    / 2.0;
                let second = (ctx.mark(i, SequenceId::ThirdSequence, name)
                    + ctx.mark(i, SequenceId::FourthSequence, name))
                    / 2.0;
                let fifth = ctx.mark(i, SequenceId::FifthSequence, name);
                // Third term falls back to the fifth sequence alone when the sixth is unset.
                let third = match ctx.raw_mark(i, SequenceId::SixthSequence, name) {
                    MarkValue::Score(sixth) => (fifth + sixth) / 2.0,
                    MarkValue::Unset => fifth,
                };

                term_sums[0] += scaled_score(first, subject.total);
                term_sums[1] += scaled_score(second, subject.total);
                term_sums[2] += scaled_score(third, subject.total);
            }

            let n = ctx.subjects.len();
            let first_term_average = mean_over_subjects(term_sums[0], n);
            let second_term_average = mean_over_subjects(term_sums[1], n);
            let third_term_average = mean_over_subjects(term_sums[2], n);
            AnnualResult {
                index: i,
                student: student.clone(),
                first_term_average,
                second_term_average,
                third_term_average,
                final_average: (first_term_average + second_term_average + third_term_average)
                    / 3.0,
                rank: 0,
            }
        })
        .collect();

    Some(rank_and_summarize(rows))
}

/// Two-decimal display form used by report documents.
pub fn format_2dp(x: f64) -> String {
    format!("{:.2}", x)
}
