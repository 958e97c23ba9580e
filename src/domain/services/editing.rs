//! Corrections applied to extracted records before aggregation.
//!
//! Hours are frequently absent from the transcript text, so a run usually
//! needs a few overrides before the averages can be computed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::model::DisciplineRecord;
use crate::utils::error::{EtlError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordEdit {
    pub name: Option<String>,
    pub hours: Option<u32>,
    pub grade: Option<f64>,
}

impl RecordEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.hours.is_none() && self.grade.is_none()
    }

    fn check(&self) -> Result<()> {
        if let Some(grade) = self.grade {
            if !grade.is_finite() || !(0.0..=10.0).contains(&grade) {
                return Err(EtlError::InvalidEdit {
                    message: format!("grade {} is outside 0..=10", grade),
                });
            }
        }
        Ok(())
    }

    fn apply_to(&self, record: &mut DisciplineRecord) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(hours) = self.hours {
            record.hours = hours;
        }
        if let Some(grade) = self.grade {
            record.grade = grade;
        }
    }
}

pub fn update_record(records: &mut [DisciplineRecord], id: u64, edit: &RecordEdit) -> Result<()> {
    edit.check()?;
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(EtlError::RecordNotFound { id })?;
    edit.apply_to(record);
    Ok(())
}

pub fn delete_record(records: &mut Vec<DisciplineRecord>, id: u64) -> Result<DisciplineRecord> {
    let idx = records
        .iter()
        .position(|r| r.id == id)
        .ok_or(EtlError::RecordNotFound { id })?;
    Ok(records.remove(idx))
}

/// `CODE` matches the course in every semester, `CODE@SEMESTER` only one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordSelector {
    pub code: String,
    pub semester: Option<String>,
}

impl RecordSelector {
    pub fn matches(&self, record: &DisciplineRecord) -> bool {
        record.code == self.code
            && self
                .semester
                .as_deref()
                .map_or(true, |semester| record.semester == semester)
    }
}

impl FromStr for RecordSelector {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        let (code, semester) = match s.trim().split_once('@') {
            Some((code, semester)) => (code.trim(), Some(semester.trim())),
            None => (s.trim(), None),
        };

        if code.is_empty() || semester.is_some_and(str::is_empty) {
            return Err(EtlError::InvalidConfigValueError {
                field: "selector".to_string(),
                value: s.to_string(),
                reason: "expected CODE or CODE@SEMESTER".to_string(),
            });
        }

        Ok(Self {
            code: code.to_ascii_uppercase(),
            semester: semester.map(str::to_string),
        })
    }
}

impl TryFrom<String> for RecordSelector {
    type Error = EtlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RecordSelector> for String {
    fn from(selector: RecordSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for RecordSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.semester {
            Some(semester) => write!(f, "{}@{}", self.code, semester),
            None => f.write_str(&self.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOverride {
    #[serde(rename = "target")]
    pub selector: RecordSelector,
    #[serde(flatten)]
    pub edit: RecordEdit,
}

impl RecordOverride {
    /// Parses `SELECTOR=HOURS`, as given on the command line.
    pub fn hours(assignment: &str) -> Result<Self> {
        let (selector, value) = split_assignment(assignment)?;
        let hours = value.parse::<u32>().map_err(|e| invalid_assignment(assignment, &e.to_string()))?;
        Ok(Self {
            selector,
            edit: RecordEdit {
                hours: Some(hours),
                ..RecordEdit::default()
            },
        })
    }

    /// Parses `SELECTOR=GRADE`; a comma works as decimal separator.
    pub fn grade(assignment: &str) -> Result<Self> {
        let (selector, value) = split_assignment(assignment)?;
        let grade = value
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|e| invalid_assignment(assignment, &e.to_string()))?;
        let edit = RecordEdit {
            grade: Some(grade),
            ..RecordEdit::default()
        };
        edit.check()?;
        Ok(Self { selector, edit })
    }
}

fn split_assignment(assignment: &str) -> Result<(RecordSelector, &str)> {
    let (selector, value) = assignment
        .split_once('=')
        .ok_or_else(|| invalid_assignment(assignment, "expected SELECTOR=VALUE"))?;
    Ok((selector.parse()?, value.trim()))
}

fn invalid_assignment(assignment: &str, reason: &str) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: "override".to_string(),
        value: assignment.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub dropped: usize,
    pub edited: usize,
    /// Selectors that matched no record.
    pub unmatched: Vec<String>,
}

/// Drops first, then overrides, in the order given.
pub fn apply_overrides(
    records: &mut Vec<DisciplineRecord>,
    overrides: &[RecordOverride],
    drops: &[RecordSelector],
) -> Result<EditSummary> {
    let mut summary = EditSummary::default();

    for selector in drops {
        let ids: Vec<u64> = records
            .iter()
            .filter(|r| selector.matches(r))
            .map(|r| r.id)
            .collect();
        if ids.is_empty() {
            tracing::warn!("Drop {} matched no discipline", selector);
            summary.unmatched.push(selector.to_string());
        }
        for id in ids {
            let removed = delete_record(records, id)?;
            tracing::debug!("Dropped {} ({})", removed.code, removed.semester);
            summary.dropped += 1;
        }
    }

    for item in overrides {
        let ids: Vec<u64> = records
            .iter()
            .filter(|r| item.selector.matches(r))
            .map(|r| r.id)
            .collect();
        if ids.is_empty() {
            tracing::warn!("Override {} matched no discipline", item.selector);
            summary.unmatched.push(item.selector.to_string());
        }
        for id in ids {
            update_record(records, id, &item.edit)?;
            summary.edited += 1;
        }
    }

    Ok(summary)
}
