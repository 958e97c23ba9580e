//! Discipline rows out of normalized transcript text.
//!
//! A row reads, in order: grade, hours, any number of `---`, an optional
//! semester label, the status, the course name and the course code. The
//! name is kept on a single line and ends at the first code-shaped word.

use std::collections::HashSet;

use crate::domain::model::{
    sort_records, DisciplineRecord, FieldValue, RowCandidate, Status, GENERAL_SEMESTER,
};
use crate::domain::services::anchors::{scan_anchors, semester_before, SemesterAnchor};
use crate::domain::services::normalize::{normalize_with_header, INSTITUTION_HEADER};
use crate::domain::services::tokenizer::{tokenize, Token, TokenKind};
use crate::utils::error::{EtlError, Result};

/// Walks tokens left to right and yields non-overlapping rows.
pub struct RowParser<'t, 'a> {
    text: &'a str,
    tokens: &'t [Token<'a>],
    cursor: usize,
}

impl<'t, 'a> RowParser<'t, 'a> {
    pub fn new(text: &'a str, tokens: &'t [Token<'a>]) -> Self {
        Self {
            text,
            tokens,
            cursor: 0,
        }
    }

    /// Tries to read one row starting exactly at token `start`.
    ///
    /// Returns the row and the index of the first token after it.
    fn parse_at(&self, start: usize) -> Option<(RowCandidate, usize)> {
        let tokens = self.tokens;
        let mut pos = start;

        let grade_token = tokens.get(pos)?;
        let grade = match grade_token.kind {
            TokenKind::Grade => parse_grade(grade_token.text),
            TokenKind::Placeholder => FieldValue::Placeholder,
            _ => return None,
        };
        pos += 1;

        let hours_token = tokens.get(pos)?;
        let hours = match hours_token.kind {
            TokenKind::Hours => parse_hours(hours_token.text),
            TokenKind::Placeholder => FieldValue::Placeholder,
            _ => return None,
        };
        pos += 1;

        while tokens.get(pos)?.kind == TokenKind::Placeholder {
            pos += 1;
        }

        let mut semester = None;
        if tokens.get(pos)?.kind == TokenKind::Semester {
            semester = Some(tokens[pos].text.to_string());
            pos += 1;
        }

        let status = match tokens.get(pos)?.kind {
            TokenKind::Status(status) => status,
            _ => return None,
        };
        pos += 1;

        // At least one word of name, whatever it looks like.
        let name_first = tokens.get(pos)?;
        let mut name_last = name_first;
        pos += 1;

        loop {
            let token = tokens.get(pos)?;
            if let Some(code) = token.code() {
                let name = self.text[name_first.start..name_last.end].trim().to_string();
                let row = RowCandidate {
                    offset: grade_token.start,
                    grade,
                    hours,
                    semester,
                    status,
                    name,
                    code: code.to_string(),
                };
                return Some((row, pos + 1));
            }
            if token.after_newline {
                return None;
            }
            name_last = token;
            pos += 1;
        }
    }
}

impl Iterator for RowParser<'_, '_> {
    type Item = RowCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.tokens.len() {
            match self.parse_at(self.cursor) {
                Some((row, next)) => {
                    self.cursor = next;
                    return Some(row);
                }
                None => self.cursor += 1,
            }
        }
        None
    }
}

/// Fed only `Grade` tokens, which always parse; failure maps to `Malformed`
/// and, downstream, to a zero grade.
fn parse_grade(text: &str) -> FieldValue<f64> {
    match text.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Parsed(v),
        _ => FieldValue::Malformed(text.to_string()),
    }
}

fn parse_hours(text: &str) -> FieldValue<u32> {
    match text.parse::<u32>() {
        Ok(v) => FieldValue::Parsed(v),
        Err(_) => FieldValue::Malformed(text.to_string()),
    }
}

/// Every row candidate in document order, before resolution.
pub fn parse_rows(text: &str) -> Vec<RowCandidate> {
    let tokens = tokenize(text);
    RowParser::new(text, &tokens).collect()
}

/// Turns row candidates into records: resolves the semester, applies the
/// `RF` zero grade, drops repeated `(code, semester)` pairs and sorts.
pub fn resolve_rows(rows: Vec<RowCandidate>, anchors: &[SemesterAnchor]) -> Vec<DisciplineRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in rows {
        let semester = match row.semester {
            Some(semester) => semester,
            None => semester_before(anchors, row.offset)
                .unwrap_or(GENERAL_SEMESTER)
                .to_string(),
        };

        let key = format!("{}-{}", row.code, semester);
        if !seen.insert(key) {
            tracing::debug!("Skipping repeated row {} ({})", row.code, semester);
            continue;
        }

        if row.grade.is_defaulted() {
            tracing::trace!("{} {}: grade defaulted ({:?})", row.code, semester, row.grade);
        }
        if row.hours.is_defaulted() {
            tracing::debug!("{} {}: hours missing ({:?})", row.code, semester, row.hours);
        }

        let grade = if row.status == Status::RF {
            0.0
        } else {
            row.grade.value()
        };

        records.push(DisciplineRecord {
            id: records.len() as u64 + 1,
            semester,
            code: row.code,
            name: row.name,
            hours: row.hours.value(),
            grade,
            status: row.status,
        });
    }

    sort_records(&mut records);
    records
}

pub fn extract_records(normalized: &str, anchors: &[SemesterAnchor]) -> Result<Vec<DisciplineRecord>> {
    let rows = parse_rows(normalized);
    tracing::debug!("Matched {} candidate rows", rows.len());

    let records = resolve_rows(rows, anchors);
    if records.is_empty() {
        return Err(EtlError::NoRecordsFound);
    }

    Ok(records)
}

/// Normalizes the pages, scans anchors and extracts the records.
pub fn extract<S: AsRef<str>>(pages: &[S]) -> Result<Vec<DisciplineRecord>> {
    extract_with_header(pages, INSTITUTION_HEADER)
}

pub fn extract_with_header<S: AsRef<str>>(pages: &[S], header: &str) -> Result<Vec<DisciplineRecord>> {
    let text = normalize_with_header(pages, header);
    let anchors = scan_anchors(&text);
    tracing::debug!(
        "Normalized {} pages into {} bytes, {} semester anchors",
        pages.len(),
        text.len(),
        anchors.len()
    );
    extract_records(&text, &anchors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'r>(records: &'r [DisciplineRecord], code: &str) -> &'r DisciplineRecord {
        records.iter().find(|r| r.code == code).unwrap()
    }

    #[test]
    fn parses_full_row() {
        let rows = parse_rows("8,5 60 2020.1 AP CÁLCULO DIFERENCIAL I EXA806");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.offset, 0);
        assert_eq!(row.grade, FieldValue::Parsed(8.5));
        assert_eq!(row.hours, FieldValue::Parsed(60));
        assert_eq!(row.semester.as_deref(), Some("2020.1"));
        assert_eq!(row.status, Status::AP);
        assert_eq!(row.name, "CÁLCULO DIFERENCIAL I");
        assert_eq!(row.code, "EXA806");
    }

    #[test]
    fn placeholders_are_tagged() {
        let rows = parse_rows("--- --- --- --- DP INGLÊS INSTRUMENTAL LET100");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].grade, FieldValue::Placeholder);
        assert_eq!(rows[0].hours, FieldValue::Placeholder);
        assert_eq!(rows[0].semester, None);
        assert_eq!(rows[0].status, Status::DP);
    }

    #[test]
    fn shaped_numeric_tokens_always_parse() {
        for grade in ["0,0", "0.0", "9,9", "10.0", "99,9"] {
            assert!(matches!(parse_grade(grade), FieldValue::Parsed(_)), "{grade}");
        }
        for hours in ["00", "30", "999"] {
            assert!(matches!(parse_hours(hours), FieldValue::Parsed(_)), "{hours}");
        }

        let rows = parse_rows("0,0 00 2020.1 AP ESTAGIO EXA890");
        assert_eq!(rows[0].grade, FieldValue::Parsed(0.0));
        assert_eq!(rows[0].hours, FieldValue::Parsed(0));
        assert!(!rows[0].grade.is_defaulted());
    }

    #[test]
    fn unparseable_field_defaults_to_zero() {
        let grade = parse_grade("9,x");
        assert_eq!(grade, FieldValue::Malformed("9,x".to_string()));
        assert!(grade.is_defaulted());
        assert_eq!(grade.value(), 0.0);
        assert_eq!(parse_hours("6O").value(), 0);
    }

    #[test]
    fn name_stops_at_first_code() {
        let rows = parse_rows("7.0 45 AP LAB EXA806 EXA807");
        assert_eq!(rows[0].name, "LAB");
        assert_eq!(rows[0].code, "EXA806");
    }

    #[test]
    fn name_does_not_cross_line_breaks() {
        assert!(parse_rows("7,0 60 AP ALGEBRA\nLINEAR EXA807").is_empty());
        let rows = parse_rows("7,0 60 AP\nALGEBRA LINEAR\nEXA807");
        assert_eq!(rows[0].name, "ALGEBRA LINEAR");
    }

    #[test]
    fn rows_do_not_overlap() {
        let rows = parse_rows("9,0 60 2020.1 AP A EXA806 8,0 30 2020.1 AP B EXA807");
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["EXA806", "EXA807"]);
        assert!(rows[0].offset < rows[1].offset);
    }

    #[test]
    fn failed_start_retries_on_next_word() {
        let rows = parse_rows("--- --- 60 AP FISICA FIS101");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].grade, FieldValue::Placeholder);
        assert_eq!(rows[0].hours, FieldValue::Parsed(60));
    }

    #[test]
    fn semester_glued_to_status_is_read() {
        let records = extract(&["8,5 60 2020.1AP CALCULO EXA806"]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].semester, "2020.1");
        assert_eq!(records[0].status, Status::AP);
        assert_eq!(records[0].name, "CALCULO");
    }

    #[test]
    fn row_glued_after_code_is_still_read() {
        let records = extract(&["8,5 60 2020.1 AP CALCULO EXA8067,0 60 2020.1 AP FISICA FIS101"]).unwrap();
        let codes: Vec<&str> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["EXA806", "FIS101"]);
        assert_eq!(find(&records, "EXA806").grade, 8.5);
        assert_eq!(find(&records, "FIS101").grade, 7.0);
        assert_eq!(find(&records, "FIS101").hours, 60);
    }

    #[test]
    fn semester_falls_back_to_previous_anchor() {
        let text = "8,5 60 2020.1 AP CALCULO EXA806 7,0 60 AP ALGEBRA EXA807\n";
        let anchors = scan_anchors(text);
        let records = extract_records(text, &anchors).unwrap();
        assert_eq!(find(&records, "EXA807").semester, "2020.1");
    }

    #[test]
    fn semester_without_anchor_is_general() {
        let records = extract(&["7,0 60 AP ALGEBRA EXA807"]).unwrap();
        assert_eq!(records[0].semester, GENERAL_SEMESTER);
    }

    #[test]
    fn rf_forces_zero_grade() {
        let records = extract(&["6,5 60 2020.1 RF CALCULO EXA806"]).unwrap();
        assert_eq!(records[0].status, Status::RF);
        assert_eq!(records[0].grade, 0.0);
    }

    #[test]
    fn first_duplicate_wins() {
        let records = extract(&[
            "8,5 60 2020.1 AP CALCULO EXA806 3,0 30 2020.1 RE OUTRO NOME EXA806",
        ])
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].grade, 8.5);
        assert_eq!(records[0].name, "CALCULO");
    }

    #[test]
    fn same_code_in_other_semester_is_kept() {
        let records = extract(&[
            "3,0 60 2020.1 RE CALCULO EXA806 8,0 60 2020.2 AP CALCULO EXA806",
        ])
        .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn output_is_sorted_and_ids_follow_document_order() {
        let records = extract(&[
            "8,0 60 2021.1 AP FISICA FIS101 9,0 60 2020.1 AP CALCULO EXA806 7,0 60 2020.1 AP ALGEBRA EXA801",
        ])
        .unwrap();
        let keys: Vec<String> = records.iter().map(|r| r.dedup_key()).collect();
        assert_eq!(keys, vec!["EXA801-2020.1", "EXA806-2020.1", "FIS101-2021.1"]);
        assert_eq!(find(&records, "FIS101").id, 1);
        assert_eq!(find(&records, "EXA801").id, 3);
    }

    #[test]
    fn placeholder_grade_and_hours_become_zero() {
        let records = extract(&["--- --- 2020.2 TR ESTRUTURAS DE DADOS TEC502"]).unwrap();
        assert_eq!(records[0].grade, 0.0);
        assert_eq!(records[0].hours, 0);
        assert_eq!(records[0].status, Status::TR);
    }

    #[test]
    fn empty_text_reports_no_records() {
        let pages: Vec<&str> = Vec::new();
        assert!(matches!(extract(&pages), Err(EtlError::NoRecordsFound)));
        assert!(matches!(
            extract(&["Histórico Escolar sem disciplinas"]),
            Err(EtlError::NoRecordsFound)
        ));
    }
}
