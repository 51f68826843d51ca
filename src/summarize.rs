use std::collections::{BTreeMap, HashSet};

use crate::models::{Digest, HomeworkGroup, QuizSample, SubmissionStatus, FIELD_NAMES};
use crate::scope::ScopedView;

/// Caps on every list-valued digest field. They bound prompt size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestLimits {
    pub homework_rows: usize,
    pub quiz_rows: usize,
    pub sample_rows: usize,
}

impl Default for DigestLimits {
    fn default() -> Self {
        Self {
            homework_rows: 50,
            quiz_rows: 50,
            sample_rows: 20,
        }
    }
}

pub fn summarize(view: &ScopedView<'_>, limits: &DigestLimits) -> Digest {
    let mut seen = HashSet::new();
    let roster: Vec<String> = view
        .records()
        .iter()
        .filter(|r| seen.insert(r.student_id.as_str()))
        .map(|r| r.student_name.clone())
        .collect();

    // Keyed by id so two students sharing a display name stay separate.
    let mut groups: BTreeMap<(&str, &str, SubmissionStatus), (&str, usize)> = BTreeMap::new();
    for record in view.records() {
        let key = (
            record.student_id.as_str(),
            record.homework_title.as_str(),
            record.submission_status,
        );
        groups
            .entry(key)
            .or_insert((record.student_name.as_str(), 0))
            .1 += 1;
    }

    let homework_aggregate = groups
        .into_iter()
        .take(limits.homework_rows)
        .map(|((_, title, status), (name, count))| HomeworkGroup {
            student_name: name.to_string(),
            homework_title: title.to_string(),
            submission_status: status,
            count,
        })
        .collect();

    // Filter before truncating: the cap is spent on real scores only.
    let quiz_samples = view
        .records()
        .iter()
        .filter_map(|r| {
            r.quiz_score.value().map(|score| QuizSample {
                student_name: r.student_name.clone(),
                quiz_name: r.quiz_name.clone(),
                quiz_score: *score,
            })
        })
        .take(limits.quiz_rows)
        .collect();

    let raw_sample = view
        .records()
        .iter()
        .take(limits.sample_rows)
        .map(|r| (*r).clone())
        .collect();

    Digest {
        student_count: seen.len(),
        roster,
        homework_aggregate,
        quiz_samples,
        field_names: FIELD_NAMES.iter().map(|name| name.to_string()).collect(),
        raw_sample,
    }
}

/// Mean of recorded quiz scores; `None` when no record carries a score.
pub fn average_quiz_score(view: &ScopedView<'_>) -> Option<f64> {
    let (total, count) = view
        .records()
        .iter()
        .filter_map(|r| r.quiz_score.value())
        .fold((0.0_f64, 0usize), |(total, count), score| (total + score, count + 1));

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Percentage of records marked submitted; 0 for an empty view.
pub fn submission_rate(view: &ScopedView<'_>) -> f64 {
    if view.is_empty() {
        return 0.0;
    }
    let total = view.len();
    let submitted = view
        .records()
        .iter()
        .filter(|r| r.submission_status == SubmissionStatus::Submitted)
        .count();
    submitted as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, roster_store};
    use crate::scope::AccessScope;
    use crate::store::RecordStore;

    #[test]
    fn digest_of_scoped_view_counts_only_visible_students() {
        let store = roster_store();
        let view = ScopedView::new(&store, AccessScope::new(Some(8), Some("A".to_string())));
        let digest = summarize(&view, &DigestLimits::default());

        assert_eq!(digest.student_count, 5);
        assert_eq!(
            digest.roster,
            vec!["Aarav Kumar", "Priya Sharma", "Rohan Patel", "Ananya Singh", "Arjun Reddy"]
        );
        assert_eq!(digest.homework_aggregate.len(), 20);
        assert_eq!(digest.raw_sample.len(), 20);
        assert_eq!(digest.field_names.len(), 11);
        assert!(digest
            .raw_sample
            .iter()
            .all(|r| r.grade == 8 && r.class_section == "A"));
    }

    #[test]
    fn caps_bound_every_list() {
        let store = roster_store();
        let view = ScopedView::new(&store, AccessScope::unrestricted());
        let limits = DigestLimits {
            homework_rows: 7,
            quiz_rows: 5,
            sample_rows: 3,
        };
        let digest = summarize(&view, &limits);

        assert_eq!(digest.homework_aggregate.len(), 7);
        assert_eq!(digest.quiz_samples.len(), 5);
        assert_eq!(digest.raw_sample.len(), 3);
        assert_eq!(digest.roster.len(), 13);
        assert_eq!(digest.raw_sample[0], *view.records()[0]);
    }

    #[test]
    fn not_applicable_scores_are_dropped_before_the_cap() {
        let mut records: Vec<_> = (0..30)
            .map(|i| record(&format!("S{i:03}"), "Blank", 8, "A", "Essay", None))
            .collect();
        records.extend((0..4).map(|i| record(&format!("T{i:03}"), "Scored", 8, "A", "Essay", Some(90.0))));
        let store = RecordStore::new(records);
        let view = ScopedView::new(&store, AccessScope::unrestricted());

        let digest = summarize(
            &view,
            &DigestLimits {
                quiz_rows: 10,
                ..DigestLimits::default()
            },
        );
        assert_eq!(digest.quiz_samples.len(), 4);
        assert!(digest.quiz_samples.iter().all(|q| q.student_name == "Scored"));
    }

    #[test]
    fn lone_not_applicable_record_never_becomes_a_quiz_sample() {
        let store = RecordStore::new(vec![record("S001", "Aarav Kumar", 8, "A", "Essay", None)]);
        let view = ScopedView::new(&store, AccessScope::unrestricted());
        let digest = summarize(&view, &DigestLimits::default());

        assert_eq!(digest.student_count, 1);
        assert!(digest.quiz_samples.is_empty());
        assert_eq!(average_quiz_score(&view), None);
    }

    #[test]
    fn homework_groups_key_by_student_id() {
        let store = RecordStore::new(vec![
            record("S001", "Sam Rivera", 8, "A", "Essay", Some(80.0)),
            record("S002", "Sam Rivera", 8, "A", "Essay", Some(70.0)),
            record("S001", "Sam Rivera", 8, "A", "Essay", Some(75.0)),
        ]);
        let view = ScopedView::new(&store, AccessScope::unrestricted());
        let digest = summarize(&view, &DigestLimits::default());

        assert_eq!(digest.student_count, 2);
        assert_eq!(digest.roster, vec!["Sam Rivera", "Sam Rivera"]);
        let counts: Vec<usize> = digest.homework_aggregate.iter().map(|g| g.count).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn summarize_is_deterministic() {
        let store = roster_store();
        let view = ScopedView::new(&store, AccessScope::new(Some(8), None));
        let limits = DigestLimits::default();
        assert_eq!(summarize(&view, &limits), summarize(&view, &limits));
    }

    #[test]
    fn empty_view_yields_empty_digest_and_zero_rate() {
        let store = RecordStore::default();
        let view = ScopedView::new(&store, AccessScope::new(Some(8), Some("A".to_string())));
        let digest = summarize(&view, &DigestLimits::default());

        assert_eq!(digest.student_count, 0);
        assert!(digest.roster.is_empty());
        assert!(digest.homework_aggregate.is_empty());
        assert!(digest.quiz_samples.is_empty());
        assert!(digest.raw_sample.is_empty());
        assert_eq!(submission_rate(&view), 0.0);
    }

    #[test]
    fn averages_exclude_not_applicable_from_the_denominator() {
        let store = RecordStore::new(vec![
            record("S001", "Aarav Kumar", 8, "A", "Essay", Some(80.0)),
            record("S001", "Aarav Kumar", 8, "A", "Lab", None),
            record("S002", "Priya Sharma", 8, "A", "Essay", Some(60.0)),
        ]);
        let view = ScopedView::new(&store, AccessScope::unrestricted());

        assert_eq!(average_quiz_score(&view), Some(70.0));
        let rate = submission_rate(&view);
        assert!((rate - 200.0 / 3.0).abs() < 1e-9);
    }
}
