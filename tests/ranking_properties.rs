use gradebookd::calc::{self, CalcContext, PASSING_MARK};
use gradebookd::model::{MarkValue, SequenceId, StudentMarks, Subject};
use proptest::prelude::*;

fn class_from(scores: &[Vec<Option<u8>>], totals: &[u8]) -> (Vec<String>, Vec<Subject>, Vec<StudentMarks>) {
    let subjects: Vec<Subject> = totals
        .iter()
        .enumerate()
        .map(|(i, t)| Subject {
            name: format!("S{i}"),
            total: f64::from(*t),
        })
        .collect();
    let students = (0..scores.len()).map(|i| format!("Student {i}")).collect();
    let marks = scores
        .iter()
        .map(|row| {
            let mut m = StudentMarks::default();
            for (subject, raw) in subjects.iter().zip(row) {
                let value = match raw {
                    Some(v) => MarkValue::Score(f64::from(*v).min(subject.total)),
                    None => MarkValue::Unset,
                };
                m.sequence_mut(SequenceId::ThirdSequence)
                    .insert(subject.name.clone(), value);
            }
            m
        })
        .collect();
    (students, subjects, marks)
}

fn class_strategy() -> impl Strategy<Value = (Vec<Vec<Option<u8>>>, Vec<u8>)> {
    prop::collection::vec(1u8..=100, 1..5).prop_flat_map(|totals| {
        let n = totals.len();
        (
            prop::collection::vec(prop::collection::vec(prop::option::of(0u8..=100), n), 0..12),
            Just(totals),
        )
    })
}

proptest! {
    #[test]
    fn ranks_are_consecutive_and_averages_non_increasing((scores, totals) in class_strategy()) {
        let (students, subjects, marks) = class_from(&scores, &totals);
        let ctx = CalcContext { students: &students, subjects: &subjects, marks: &marks };
        let set = calc::compute_sequence_results(&ctx, SequenceId::ThirdSequence);

        prop_assert_eq!(set.results.len(), students.len());
        for (i, r) in set.results.iter().enumerate() {
            prop_assert_eq!(r.rank, i + 1);
            prop_assert!(r.average >= 0.0 && r.average <= 20.0 + 1e-9);
        }
        for pair in set.results.windows(2) {
            prop_assert!(pair[0].average >= pair[1].average);
        }

        let passed = set.results.iter().filter(|r| r.average >= PASSING_MARK).count();
        if students.is_empty() {
            prop_assert_eq!(set.pass_percentage, 0.0);
            prop_assert_eq!(set.class_average, 0.0);
        } else {
            let expected = 100.0 * passed as f64 / students.len() as f64;
            prop_assert!((set.pass_percentage - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn equal_averages_keep_roster_order(n in 1usize..10, score in 0u8..=20) {
        let scores: Vec<Vec<Option<u8>>> = (0..n).map(|_| vec![Some(score)]).collect();
        let (students, subjects, marks) = class_from(&scores, &[20]);
        let ctx = CalcContext { students: &students, subjects: &subjects, marks: &marks };
        let set = calc::compute_sequence_results(&ctx, SequenceId::ThirdSequence);
        let order: Vec<&str> = set.results.iter().map(|r| r.student.as_str()).collect();
        let roster: Vec<&str> = students.iter().map(String::as_str).collect();
        prop_assert_eq!(order, roster);
    }
}
