//! Job records as the workflow runner leaves them in the store
#![allow(dead_code)]

use excel_translate_jobs::models::job::JobAttributes;

pub const CREATED_AT: &str = "2026-03-01T10:00:00.000Z";

fn record(job_id: &str, status: &str, extra: &[(&str, &str)]) -> JobAttributes {
    let mut attrs = JobAttributes::new();
    attrs.insert("jobId".into(), job_id.into());
    attrs.insert("status".into(), status.into());
    attrs.insert("createdAt".into(), CREATED_AT.into());
    attrs.insert("s3Key".into(), "uploads/u1/book.xlsx".into());
    attrs.insert("sourceLanguage".into(), "Japanese".into());
    attrs.insert("targetLanguage".into(), "English".into());
    for (name, value) in extra {
        attrs.insert(name.to_string(), value.to_string());
    }
    attrs
}

/// Right after the prepare step: stage status and `prepared` progress.
pub fn prepared(job_id: &str) -> JobAttributes {
    record(
        job_id,
        "TRANSLATING",
        &[(
            "progress",
            r#"{"phase": "prepared", "batches": 4, "uniqueTexts": 312, "percent": 5}"#,
        )],
    )
}

/// Mid-translation, with timing estimates.
pub fn translating(job_id: &str) -> JobAttributes {
    record(
        job_id,
        "PROCESSING",
        &[
            ("startedAt", "2026-03-01T10:00:02.500Z"),
            (
                "progress",
                r#"{"phase": "translating", "completedBatches": 3, "totalBatches": 10,
                    "percent": 30, "elapsedSeconds": 45, "estimatedRemainingSeconds": 105}"#,
            ),
        ],
    )
}

/// Finished by the merge step; its timestamps carry no offset.
pub fn completed(job_id: &str) -> JobAttributes {
    record(
        job_id,
        "COMPLETED",
        &[
            ("outputS3Key", "translated/7f1c/book_translated.xlsx"),
            ("downloadUrl", "https://bucket.s3.amazonaws.com/translated/7f1c/book_translated.xlsx?X-Amz-Signature=abc"),
            (
                "stats",
                r#"{"totalCells": 1200, "translatableCells": 412, "uniqueTexts": 312,
                    "batchCount": 4, "translatedCells": 410, "sheetsProcessed": 3}"#,
            ),
            ("completedAt", "2026-03-01T10:04:10.123456"),
        ],
    )
}

pub fn failed(job_id: &str) -> JobAttributes {
    record(
        job_id,
        "FAILED",
        &[
            ("error", "Workbook is password protected"),
            ("failedAt", "2026-03-01T10:00:09.000Z"),
        ],
    )
}

pub fn with(mut attrs: JobAttributes, name: &str, value: &str) -> JobAttributes {
    attrs.insert(name.to_string(), value.to_string());
    attrs
}
