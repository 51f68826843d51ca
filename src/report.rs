use std::fmt::Write;

use serde::Serialize;

use crate::scope::{ScopeLabel, ScopedView};
use crate::summarize;

/// What an administrator is authorized to see, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessInfo {
    pub grade: ScopeLabel<i32>,
    pub class: ScopeLabel<String>,
    pub total_records: usize,
    pub total_students: usize,
}

pub fn access_info(view: &ScopedView<'_>) -> AccessInfo {
    AccessInfo {
        grade: view.scope().grade_label(),
        class: view.scope().class_label(),
        total_records: view.len(),
        total_students: view.distinct_students(),
    }
}

pub fn build_summary_report(view: &ScopedView<'_>) -> String {
    let info = access_info(view);
    let rate = summarize::submission_rate(view);
    let average = summarize::average_quiz_score(view);

    let mut output = String::new();
    let _ = writeln!(output, "# Data Access Summary");
    let _ = writeln!(output, "- Grade: {}", info.grade);
    let _ = writeln!(output, "- Class: {}", info.class);
    let _ = writeln!(output, "- Total Students: {}", info.total_students);
    let _ = writeln!(output, "- Total Records: {}", info.total_records);
    if view.is_empty() {
        let _ = writeln!(output, "No records are visible under this access scope.");
    }
    let _ = writeln!(output, "- Submission Rate: {rate:.1}%");

    match average {
        Some(average) => {
            let _ = writeln!(output, "- Average Quiz Score: {average:.1}");
        }
        None => {
            let _ = writeln!(output, "- Average Quiz Score: n/a (no recorded scores)");
        }
    }

    output
}
