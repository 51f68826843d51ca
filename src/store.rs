use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::ConfigurationError;
use crate::models::{Marked, Record, SubmissionStatus, DATE_FORMAT, NOT_APPLICABLE};

/// Immutable, ordered set of every record loaded for the process.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Untyped row as read from a dataset source, keyed by column name.
#[derive(Debug, Default)]
pub struct RawRow {
    pub line: usize,
    pub fields: HashMap<String, String>,
}

impl RawRow {
    fn require(&self, field: &'static str) -> Result<&str, ConfigurationError> {
        match self.fields.get(field).map(|value| value.trim()) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.invalid(field, "is missing")),
        }
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> ConfigurationError {
        ConfigurationError::InvalidRow {
            line: self.line,
            field,
            reason: reason.into(),
        }
    }

    fn date(&self, field: &'static str) -> Result<NaiveDate, ConfigurationError> {
        let raw = self.require(field)?;
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|err| self.invalid(field, format!("is not a date ({raw}): {err}")))
    }

    fn marked_date(&self, field: &'static str) -> Result<Marked<NaiveDate>, ConfigurationError> {
        if self.require(field)? == NOT_APPLICABLE {
            return Ok(Marked::NotApplicable);
        }
        self.date(field).map(Marked::Value)
    }

    fn score(&self, field: &'static str) -> Result<Marked<f64>, ConfigurationError> {
        let raw = self.require(field)?;
        if raw == NOT_APPLICABLE {
            return Ok(Marked::NotApplicable);
        }
        let score: f64 = raw
            .parse()
            .map_err(|_| self.invalid(field, format!("is not a number or {NOT_APPLICABLE} ({raw})")))?;
        if !(0.0..=100.0).contains(&score) {
            return Err(self.invalid(field, format!("is outside 0-100 ({raw})")));
        }
        Ok(Marked::Value(score))
    }

    /// Validates the row against the fixed schema.
    pub fn into_record(self) -> Result<Record, ConfigurationError> {
        let grade_raw = self.require("grade")?;
        let grade = grade_raw
            .parse::<i32>()
            .map_err(|_| self.invalid("grade", format!("is not an integer ({grade_raw})")))?;
        let status_raw = self.require("submission_status")?;
        let submission_status = SubmissionStatus::parse(status_raw).ok_or_else(|| {
            self.invalid(
                "submission_status",
                format!("must be Submitted or Not Submitted ({status_raw})"),
            )
        })?;

        Ok(Record {
            student_id: self.require("student_id")?.to_string(),
            student_name: self.require("student_name")?.to_string(),
            grade,
            class_section: self.require("class_section")?.to_string(),
            homework_title: self.require("homework_title")?.to_string(),
            submission_status,
            submission_date: self.marked_date("submission_date")?,
            quiz_name: self.require("quiz_name")?.to_string(),
            quiz_score: self.score("quiz_score")?,
            quiz_date: self.date("quiz_date")?,
            quiz_scheduled_date: self.date("quiz_scheduled_date")?,
        })
    }
}

pub fn load_path(path: &Path) -> Result<RecordStore, ConfigurationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let store = match extension.as_deref() {
        Some("csv") => load_csv(path)?,
        Some("json") => load_json(path)?,
        _ => {
            return Err(ConfigurationError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    if store.is_empty() {
        warn!(path = %path.display(), "dataset has no records");
    }
    info!(path = %path.display(), records = store.len(), "dataset loaded");
    Ok(store)
}

pub fn load_csv(path: &Path) -> Result<RecordStore, ConfigurationError> {
    let file = std::fs::File::open(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

pub fn read_csv<R: std::io::Read>(input: R) -> Result<RecordStore, ConfigurationError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, |pos| pos.line() as usize);
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        records.push(RawRow { line, fields }.into_record()?);
    }

    debug!(records = records.len(), "parsed CSV rows");
    Ok(RecordStore::new(records))
}

pub fn load_json(path: &Path) -> Result<RecordStore, ConfigurationError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_json(&content)
}

pub fn read_json(content: &str) -> Result<RecordStore, ConfigurationError> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(content)?;
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let fields = row
            .into_iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                };
                Some((name, text))
            })
            .collect();
        records.push(
            RawRow {
                line: index + 1,
                fields,
            }
            .into_record()?,
        );
    }

    debug!(records = records.len(), "parsed JSON rows");
    Ok(RecordStore::new(records))
}
