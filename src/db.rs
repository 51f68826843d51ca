use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Record, DATE_FORMAT};
use crate::store::{RawRow, RecordStore};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Natural key used to skip rows that were already imported.
pub fn source_key(record: &Record) -> String {
    format!(
        "{}|{}|{}|{}",
        record.student_id,
        record.homework_title,
        record.quiz_name,
        record.quiz_date.format(DATE_FORMAT)
    )
}

pub async fn import_records(pool: &PgPool, records: &[Record]) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO scoped_query.student_records
            (id, student_id, student_name, grade, class_section, homework_title,
             submission_status, submission_date, quiz_name, quiz_score, quiz_date,
             quiz_scheduled_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.student_id)
        .bind(&record.student_name)
        .bind(record.grade)
        .bind(&record.class_section)
        .bind(&record.homework_title)
        .bind(record.submission_status.as_str())
        .bind(record.submission_date.to_string())
        .bind(&record.quiz_name)
        .bind(record.quiz_score.to_string())
        .bind(record.quiz_date)
        .bind(record.quiz_scheduled_date)
        .bind(source_key(record))
        .execute(pool)
        .await
        .with_context(|| format!("failed to insert record {}", source_key(record)))?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    info!(inserted, total = records.len(), "records imported");
    Ok(inserted)
}

/// Loads every stored row, in insertion order, through the same schema
/// validation as the file loaders. Scoping happens in-process afterwards.
pub async fn fetch_records(pool: &PgPool) -> anyhow::Result<RecordStore> {
    let rows = sqlx::query(
        "SELECT student_id, student_name, grade::TEXT AS grade, class_section, \
         homework_title, submission_status, submission_date, quiz_name, quiz_score, \
         quiz_date::TEXT AS quiz_date, quiz_scheduled_date::TEXT AS quiz_scheduled_date \
         FROM scoped_query.student_records \
         ORDER BY row_order",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let mut raw = RawRow {
            line: index + 1,
            ..RawRow::default()
        };
        for field in crate::models::FIELD_NAMES {
            let value: String = row
                .try_get(field)
                .with_context(|| format!("column {field} missing from student_records"))?;
            raw.fields.insert(field.to_string(), value);
        }
        records.push(raw.into_record()?);
    }

    info!(records = records.len(), "dataset loaded from Postgres");
    Ok(RecordStore::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::record;

    #[test]
    fn source_key_is_stable_per_student_assignment() {
        let first = record("S001", "Aarav Kumar", 8, "A", "Science Lab Report", Some(70.0));
        let rescored = record("S001", "Aarav Kumar", 8, "A", "Science Lab Report", None);
        let other = record("S001", "Aarav Kumar", 8, "A", "Math Chapter 5 Exercise", Some(70.0));

        assert_eq!(source_key(&first), "S001|Science Lab Report|Math Quiz 1|2026-02-01");
        assert_eq!(source_key(&first), source_key(&rescored));
        assert_ne!(source_key(&first), source_key(&other));
    }
}
