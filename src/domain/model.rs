use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semester label used when a row carries no term and no anchor precedes it.
pub const GENERAL_SEMESTER: &str = "Geral";

/// Final status of a discipline in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    AP,
    AF,
    RE,
    RF,
    RP,
    DP,
    TR,
}

/// Coarse grouping of [`Status`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Approved,
    Failed,
    Exempted,
    Locked,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::AP,
        Status::AF,
        Status::RE,
        Status::RF,
        Status::RP,
        Status::DP,
        Status::TR,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Status::AP => "AP",
            Status::AF => "AF",
            Status::RE => "RE",
            Status::RF => "RF",
            Status::RP => "RP",
            Status::DP => "DP",
            Status::TR => "TR",
        }
    }

    /// Exempted and locked terms never count toward averages or hours.
    pub fn is_excluded(self) -> bool {
        matches!(self, Status::DP | Status::TR)
    }

    pub fn is_failed(self) -> bool {
        matches!(self, Status::RE | Status::RF | Status::RP)
    }

    pub fn is_approved(self) -> bool {
        matches!(self, Status::AP | Status::AF)
    }

    pub fn category(self) -> StatusCategory {
        if self.is_approved() {
            StatusCategory::Approved
        } else if self.is_failed() {
            StatusCategory::Failed
        } else if self == Status::DP {
            StatusCategory::Exempted
        } else {
            StatusCategory::Locked
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or(())
    }
}

impl StatusCategory {
    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Approved => "Approved",
            StatusCategory::Failed => "Failed",
            StatusCategory::Exempted => "Exempted",
            StatusCategory::Locked => "Locked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineRecord {
    pub id: u64,
    pub semester: String,
    pub code: String,
    pub name: String,
    pub hours: u32,
    pub grade: f64,
    pub status: Status,
}

impl DisciplineRecord {
    /// Key used to drop repeated rows: `CODE-SEMESTER`.
    pub fn dedup_key(&self) -> String {
        format!("{}-{}", self.code, self.semester)
    }

    /// Eligible records count toward averages and approved hours.
    pub fn is_eligible(&self) -> bool {
        !self.status.is_excluded()
    }

    /// Hours still missing on a record that would count toward the averages.
    pub fn is_pending(&self) -> bool {
        self.hours == 0 && self.is_eligible()
    }
}

/// Orders records by semester label, then course code.
///
/// Labels compare byte-wise. `2020.2` sorts after `2020.10`; transcripts
/// only emit single-digit terms so the order matches the calendar.
pub fn sort_records(records: &mut [DisciplineRecord]) {
    records.sort_by(|a, b| {
        a.semester
            .cmp(&b.semester)
            .then_with(|| a.code.cmp(&b.code))
    });
}

/// Outcome of reading a single numeric field out of the transcript text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Parsed(T),
    /// The `---` token.
    Placeholder,
    /// Token did not parse. The row tokenizer only hands over grade and
    /// hours tokens whose shape always parses, so rows read from text never
    /// carry this; the parse functions still report it instead of panicking.
    Malformed(String),
}

impl<T: Copy + Default> FieldValue<T> {
    pub fn value(&self) -> T {
        match self {
            FieldValue::Parsed(v) => *v,
            FieldValue::Placeholder | FieldValue::Malformed(_) => T::default(),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        !matches!(self, FieldValue::Parsed(_))
    }
}

/// A table row recovered from the text, before semester resolution and dedup.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCandidate {
    /// Byte offset of the grade token in the normalized text.
    pub offset: usize,
    pub grade: FieldValue<f64>,
    pub hours: FieldValue<u32>,
    pub semester: Option<String>,
    pub status: Status,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterScore {
    pub semester: String,
    /// Arithmetic mean of the semester averages up to this semester.
    pub score: f64,
    /// Eligible hours accumulated up to this semester.
    pub hours: u64,
    pub semester_score: f64,
    pub semester_hours: u64,
    pub cumulative_weighted_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    /// Hours-weighted mean over every eligible record.
    #[default]
    Weighted,
    /// Mean of the per-semester averages.
    Semester,
}

impl FromStr for ScoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weighted" => Ok(ScoreKind::Weighted),
            "semester" | "arithmetic" => Ok(ScoreKind::Semester),
            other => Err(format!("unknown score kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculatorResult {
    pub official_score: f64,
    pub exact_score: f64,
    pub cumulative_score: f64,
    pub total_hours: u64,
    pub approved_hours: u64,
    pub is_complete: bool,
    pub pending_disciplines: Vec<DisciplineRecord>,
    pub semester_scores: Vec<SemesterScore>,
    pub filtered_disciplines: Vec<DisciplineRecord>,
}

impl CalculatorResult {
    pub fn display_score(&self, kind: ScoreKind) -> f64 {
        match kind {
            ScoreKind::Weighted => round_one_decimal(self.cumulative_score),
            ScoreKind::Semester => self.official_score,
        }
    }
}

/// Every finite `f64` has at most this many digits after the decimal point.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Rounds to one decimal place on the exact binary value.
///
/// `7.35` is stored as `7.3499…` and goes down to `7.3`; exact halves such
/// as `7.25` go up, away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }

    let expansion = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let Some((whole, fraction)) = expansion.split_once('.') else {
        return value;
    };
    let (Ok(whole), Some(&tenth), Some(&next)) = (
        whole.parse::<u64>(),
        fraction.as_bytes().first(),
        fraction.as_bytes().get(1),
    ) else {
        return value;
    };

    let mut tenths = whole * 10 + u64::from(tenth - b'0');
    if next >= b'5' {
        tenths += 1;
    }

    (tenths as f64 / 10.0).copysign(value)
}

/// Everything the load stage needs to write a report.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub source_name: String,
    pub score_kind: ScoreKind,
    pub result: CalculatorResult,
}
