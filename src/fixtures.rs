//! Shared test roster: 13 students across grades 8-10 and sections A/B.

use chrono::NaiveDate;

use crate::models::{Marked, Record, SubmissionStatus};
use crate::store::RecordStore;

pub const STUDENTS: [(&str, &str, i32, &str); 13] = [
    ("S001", "Aarav Kumar", 8, "A"),
    ("S002", "Priya Sharma", 8, "A"),
    ("S003", "Rohan Patel", 8, "A"),
    ("S004", "Ananya Singh", 8, "A"),
    ("S005", "Arjun Reddy", 8, "A"),
    ("S006", "Diya Gupta", 8, "B"),
    ("S007", "Kabir Mehta", 8, "B"),
    ("S008", "Ishaan Verma", 8, "B"),
    ("S009", "Sanya Joshi", 9, "A"),
    ("S010", "Vihaan Desai", 9, "A"),
    ("S011", "Aisha Khan", 9, "A"),
    ("S012", "Raj Malhotra", 10, "A"),
    ("S013", "Meera Iyer", 10, "A"),
];

pub const HOMEWORKS: [&str; 4] = [
    "Math Chapter 5 Exercise",
    "Science Lab Report",
    "English Essay on Climate Change",
    "History Project on Independence",
];

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

pub fn record(id: &str, name: &str, grade: i32, section: &str, homework: &str, score: Option<f64>) -> Record {
    let submitted = score.is_some();
    Record {
        student_id: id.to_string(),
        student_name: name.to_string(),
        grade,
        class_section: section.to_string(),
        homework_title: homework.to_string(),
        submission_status: if submitted {
            SubmissionStatus::Submitted
        } else {
            SubmissionStatus::NotSubmitted
        },
        submission_date: if submitted {
            Marked::Value(date(3))
        } else {
            Marked::NotApplicable
        },
        quiz_name: "Math Quiz 1".to_string(),
        quiz_score: score.map_or(Marked::NotApplicable, Marked::Value),
        quiz_date: date(1),
        quiz_scheduled_date: date(12),
    }
}

/// Four homework rows per student; every third row is unsubmitted with no score.
pub fn roster_store() -> RecordStore {
    let mut records = Vec::new();
    let mut counter = 0usize;
    for (id, name, grade, section) in STUDENTS {
        for homework in HOMEWORKS {
            counter += 1;
            let score = if counter % 3 == 0 {
                None
            } else {
                Some(60.0 + (counter % 41) as f64)
            };
            records.push(record(id, name, grade, section, homework, score));
        }
    }
    RecordStore::new(records)
}
