use crate::adapters::read_pages;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::{CalculatorResult, DisciplineRecord, ScoreKind, Status};
use crate::domain::services::editing::apply_overrides;
use crate::domain::services::{aggregate, extract_with_header};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_FILE: &str = "report.json";
pub const DISCIPLINES_FILE: &str = "disciplines.csv";
pub const SEMESTERS_FILE: &str = "semesters.csv";

#[derive(Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    source: &'a str,
    score_kind: ScoreKind,
    score: f64,
    result: &'a CalculatorResult,
}

#[derive(Serialize)]
struct DisciplineRow<'a> {
    semester: &'a str,
    code: &'a str,
    name: &'a str,
    hours: u32,
    grade: f64,
    status: Status,
    category: &'static str,
}

impl<'a> From<&'a DisciplineRecord> for DisciplineRow<'a> {
    fn from(record: &'a DisciplineRecord) -> Self {
        Self {
            semester: &record.semester,
            code: &record.code,
            name: &record.name,
            hours: record.hours,
            grade: record.grade,
            status: record.status,
            category: record.status.category().label(),
        }
    }
}

pub struct TranscriptPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> TranscriptPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn source_name(&self) -> String {
        Path::new(self.config.input_path())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.input_path().to_string())
    }

    fn wants(&self, format: &str) -> bool {
        self.config
            .output_formats()
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    /// Renders every requested output as `(file name, bytes)`.
    fn render_outputs(&self, result: &TransformResult) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut outputs = Vec::new();

        if self.wants("json") {
            let report = Report {
                generated_at: Utc::now(),
                source: &result.source_name,
                score_kind: result.score_kind,
                score: result.result.display_score(result.score_kind),
                result: &result.result,
            };
            outputs.push((REPORT_FILE, serde_json::to_vec_pretty(&report)?));
        }

        if self.wants("csv") {
            outputs.push((
                DISCIPLINES_FILE,
                write_csv(result.result.filtered_disciplines.iter().map(DisciplineRow::from))?,
            ));
            outputs.push((SEMESTERS_FILE, write_csv(result.result.semester_scores.iter())?));
        }

        if outputs.is_empty() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "no supported output format in [{}]",
                    self.config.output_formats().join(", ")
                ),
            });
        }

        Ok(outputs)
    }
}

fn write_csv<T: Serialize>(rows: impl Iterator<Item = T>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

fn zip_outputs(outputs: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in outputs {
        zip.start_file::<_, ()>(*name, FileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TranscriptPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<String>> {
        let path = self.config.input_path();
        let bytes = self.storage.read_file(path).await?;
        tracing::debug!("Loaded {} bytes from {}", bytes.len(), path);
        read_pages(path, &bytes)
    }

    async fn transform(&self, pages: Vec<String>) -> Result<TransformResult> {
        let mut records = extract_with_header(&pages, self.config.header())?;
        tracing::info!("Extracted {} disciplines", records.len());

        let summary = apply_overrides(&mut records, &self.config.overrides(), &self.config.drops())?;
        if summary.dropped > 0 || summary.edited > 0 {
            tracing::info!(
                "Applied corrections: {} dropped, {} edited",
                summary.dropped,
                summary.edited
            );
        }

        let result = aggregate(&records);
        if !result.is_complete {
            let codes: Vec<String> = result
                .pending_disciplines
                .iter()
                .map(|r| format!("{}@{}", r.code, r.semester))
                .collect();
            tracing::warn!(
                "{} disciplines have no credit hours: {}",
                codes.len(),
                codes.join(", ")
            );
        }

        Ok(TransformResult {
            source_name: self.source_name(),
            score_kind: self.config.score_kind(),
            result,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let outputs = self.render_outputs(&result)?;

        if let Some(archive_name) = self.config.archive_name() {
            tracing::debug!("Creating ZIP file with {} files", outputs.len());
            let zip_data = zip_outputs(&outputs)?;
            let archive_path = self.output_file(archive_name);
            self.storage.write_file(&archive_path, &zip_data).await?;
            return Ok(archive_path);
        }

        for (name, data) in &outputs {
            self.storage.write_file(&self.output_file(name), data).await?;
        }

        Ok(self.config.output_path().to_string())
    }
}
