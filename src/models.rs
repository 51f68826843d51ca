use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Literal token the dataset uses for "no value recorded".
pub const NOT_APPLICABLE: &str = "N/A";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column names of the dataset, in schema order.
pub const FIELD_NAMES: [&str; 11] = [
    "student_id",
    "student_name",
    "grade",
    "class_section",
    "homework_title",
    "submission_status",
    "submission_date",
    "quiz_name",
    "quiz_score",
    "quiz_date",
    "quiz_scheduled_date",
];

/// A value that may carry the explicit not-applicable marker instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marked<T> {
    Value(T),
    NotApplicable,
}

impl<T> Marked<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Marked::Value(value) => Some(value),
            Marked::NotApplicable => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Marked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marked::Value(value) => value.fmt(f),
            Marked::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

impl<T: Serialize> Serialize for Marked<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Marked::Value(value) => value.serialize(serializer),
            Marked::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SubmissionStatus {
    #[serde(rename = "Submitted")]
    Submitted,
    #[serde(rename = "Not Submitted")]
    NotSubmitted,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::NotSubmitted => "Not Submitted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Submitted" => Some(SubmissionStatus::Submitted),
            "Not Submitted" => Some(SubmissionStatus::NotSubmitted),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (student, homework/quiz event) fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub student_id: String,
    pub student_name: String,
    pub grade: i32,
    pub class_section: String,
    pub homework_title: String,
    pub submission_status: SubmissionStatus,
    #[serde(serialize_with = "serialize_marked_date")]
    pub submission_date: Marked<NaiveDate>,
    pub quiz_name: String,
    pub quiz_score: Marked<f64>,
    #[serde(serialize_with = "serialize_date")]
    pub quiz_date: NaiveDate,
    #[serde(serialize_with = "serialize_date")]
    pub quiz_scheduled_date: NaiveDate,
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

fn serialize_marked_date<S: Serializer>(
    date: &Marked<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Marked::Value(date) => serialize_date(date, serializer),
        Marked::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
    }
}

/// Count of records sharing one (student, homework, status) key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeworkGroup {
    pub student_name: String,
    pub homework_title: String,
    pub submission_status: SubmissionStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSample {
    pub student_name: String,
    pub quiz_name: String,
    pub quiz_score: f64,
}

/// Bounded summary of a scoped view, handed to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Digest {
    pub student_count: usize,
    pub roster: Vec<String>,
    pub homework_aggregate: Vec<HomeworkGroup>,
    pub quiz_samples: Vec<QuizSample>,
    pub field_names: Vec<String>,
    pub raw_sample: Vec<Record>,
}
