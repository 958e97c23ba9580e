//! Grade averages over a set of discipline records.
//!
//! Two headline numbers come out of the same eligible records:
//! the exact score weighs every semester equally, the cumulative score
//! weighs every credit hour equally.

use std::collections::BTreeMap;

use crate::domain::model::{round_one_decimal, CalculatorResult, DisciplineRecord, SemesterScore};

/// Never fails. Records with missing hours put the result in the
/// incomplete state with every metric zeroed.
pub fn aggregate(records: &[DisciplineRecord]) -> CalculatorResult {
    if records.is_empty() {
        return CalculatorResult {
            is_complete: true,
            ..CalculatorResult::default()
        };
    }

    let pending: Vec<DisciplineRecord> = records
        .iter()
        .filter(|r| r.is_pending())
        .cloned()
        .collect();

    if !pending.is_empty() {
        tracing::debug!("{} disciplines still need their hours", pending.len());
        return CalculatorResult {
            is_complete: false,
            pending_disciplines: pending,
            filtered_disciplines: records.to_vec(),
            ..CalculatorResult::default()
        };
    }

    let mut by_semester: BTreeMap<&str, Vec<&DisciplineRecord>> = BTreeMap::new();
    for record in records {
        by_semester.entry(record.semester.as_str()).or_default().push(record);
    }

    let mut semester_scores = Vec::with_capacity(by_semester.len());
    let mut semester_averages: Vec<f64> = Vec::new();
    let mut cumulative_hours: u64 = 0;
    let mut cumulative_weighted_sum = 0.0;

    for (semester, group) in &by_semester {
        let (semester_hours, semester_weighted_sum) = weighted_totals(group.iter().copied());

        cumulative_hours += semester_hours;
        cumulative_weighted_sum += semester_weighted_sum;

        let semester_average = ratio(semester_weighted_sum, semester_hours);
        if semester_hours > 0 {
            semester_averages.push(semester_average);
        }

        semester_scores.push(SemesterScore {
            semester: semester.to_string(),
            score: mean(&semester_averages),
            hours: cumulative_hours,
            semester_score: semester_average,
            semester_hours,
            cumulative_weighted_score: ratio(cumulative_weighted_sum, cumulative_hours),
        });
    }

    let exact_score = mean(&semester_averages);
    let (approved_hours, total_weighted_sum) = weighted_totals(records.iter());
    let cumulative_score = ratio(total_weighted_sum, approved_hours);

    tracing::debug!(
        "Aggregated {} semesters: exact {:.4}, cumulative {:.4}, {} approved hours",
        semester_scores.len(),
        exact_score,
        cumulative_score,
        approved_hours
    );

    CalculatorResult {
        official_score: round_one_decimal(exact_score),
        exact_score,
        cumulative_score,
        total_hours: cumulative_hours,
        approved_hours,
        is_complete: true,
        pending_disciplines: Vec::new(),
        semester_scores,
        filtered_disciplines: records.to_vec(),
    }
}

/// Eligible hours and `grade * hours` sum.
fn weighted_totals<'r>(records: impl Iterator<Item = &'r DisciplineRecord>) -> (u64, f64) {
    records
        .filter(|r| r.is_eligible())
        .fold((0, 0.0), |(hours, sum), r| {
            (hours + u64::from(r.hours), sum + r.grade * f64::from(r.hours))
        })
}

fn ratio(sum: f64, hours: u64) -> f64 {
    if hours > 0 {
        sum / hours as f64
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ScoreKind, Status};

    const EPS: f64 = 1e-9;

    fn record(code: &str, semester: &str, hours: u32, grade: f64, status: Status) -> DisciplineRecord {
        DisciplineRecord {
            id: 0,
            semester: semester.to_string(),
            code: code.to_string(),
            name: format!("Discipline {}", code),
            hours,
            grade,
            status,
        }
    }

    fn single_semester() -> Vec<DisciplineRecord> {
        vec![
            record("EXA806", "2020.1", 60, 8.5, Status::AP),
            record("EXA807", "2020.1", 30, 6.0, Status::AP),
        ]
    }

    #[test]
    fn empty_records_are_complete_and_zeroed() {
        let result = aggregate(&[]);
        assert!(result.is_complete);
        assert_eq!(result.official_score, 0.0);
        assert_eq!(result.approved_hours, 0);
        assert!(result.semester_scores.is_empty());
        assert!(result.filtered_disciplines.is_empty());
    }

    #[test]
    fn single_semester_weighted_average() {
        let result = aggregate(&single_semester());
        let expected = (8.5 * 60.0 + 6.0 * 30.0) / 90.0;

        assert!(result.is_complete);
        assert_eq!(result.semester_scores.len(), 1);
        assert!((result.semester_scores[0].semester_score - expected).abs() < EPS);
        assert!((result.exact_score - expected).abs() < EPS);
        assert!((result.cumulative_score - expected).abs() < EPS);
        assert_eq!(result.official_score, 7.7);
        assert_eq!(result.approved_hours, 90);
        assert_eq!(result.total_hours, 90);
    }

    #[test]
    fn missing_hours_makes_result_incomplete() {
        let mut records = single_semester();
        records.push(record("EXA808", "2020.1", 0, 9.0, Status::AP));

        let result = aggregate(&records);
        assert!(!result.is_complete);
        assert_eq!(result.official_score, 0.0);
        assert_eq!(result.exact_score, 0.0);
        assert_eq!(result.cumulative_score, 0.0);
        assert_eq!(result.approved_hours, 0);
        assert_eq!(result.total_hours, 0);
        assert!(result.semester_scores.is_empty());
        assert_eq!(result.pending_disciplines, vec![records[2].clone()]);
        assert_eq!(result.filtered_disciplines.len(), 3);
    }

    #[test]
    fn excluded_records_with_zero_hours_are_not_pending() {
        let mut records = single_semester();
        records.push(record("LET100", "2020.1", 0, 0.0, Status::DP));
        records.push(record("TEC502", "2020.1", 0, 0.0, Status::TR));

        let result = aggregate(&records);
        assert!(result.is_complete);
        assert!(result.pending_disciplines.is_empty());
    }

    #[test]
    fn excluded_records_never_count() {
        let mut records = single_semester();
        records.push(record("LET100", "2020.1", 60, 10.0, Status::DP));
        records.push(record("TEC502", "2020.2", 60, 2.0, Status::TR));

        let result = aggregate(&records);
        let expected = (8.5 * 60.0 + 6.0 * 30.0) / 90.0;

        assert_eq!(result.approved_hours, 90);
        assert!((result.cumulative_score - expected).abs() < EPS);
        assert!((result.exact_score - expected).abs() < EPS);
        assert_eq!(result.filtered_disciplines.len(), 4);

        // The locked-only semester still shows up, with nothing eligible.
        let locked = &result.semester_scores[1];
        assert_eq!(locked.semester, "2020.2");
        assert_eq!(locked.semester_hours, 0);
        assert_eq!(locked.semester_score, 0.0);
        assert_eq!(locked.hours, 90);
    }

    #[test]
    fn failed_records_count_with_their_grade() {
        let records = vec![
            record("EXA806", "2020.1", 60, 8.0, Status::AP),
            record("EXA807", "2020.1", 60, 0.0, Status::RF),
        ];
        let result = aggregate(&records);
        assert!((result.cumulative_score - 4.0).abs() < EPS);
        assert_eq!(result.approved_hours, 120);
    }

    #[test]
    fn exact_and_cumulative_scores_diverge() {
        let records = vec![
            record("EXA806", "2020.1", 60, 6.0, Status::AP),
            record("EXA807", "2020.2", 40, 8.0, Status::AP),
        ];
        let result = aggregate(&records);

        assert!((result.exact_score - 7.0).abs() < EPS);
        assert!((result.cumulative_score - 6.8).abs() < EPS);
        assert_eq!(result.official_score, 7.0);
        assert_eq!(result.display_score(ScoreKind::Semester), 7.0);
        assert_eq!(result.display_score(ScoreKind::Weighted), 6.8);
    }

    #[test]
    fn semester_series_accumulates_in_label_order() {
        let records = vec![
            record("FIS101", "2021.1", 60, 9.0, Status::AP),
            record("EXA806", "2020.1", 60, 6.0, Status::AP),
            record("EXA807", "2020.2", 30, 8.0, Status::AP),
        ];
        let result = aggregate(&records);
        let series = &result.semester_scores;

        let labels: Vec<&str> = series.iter().map(|s| s.semester.as_str()).collect();
        assert_eq!(labels, vec!["2020.1", "2020.2", "2021.1"]);

        assert_eq!(series[0].hours, 60);
        assert_eq!(series[1].hours, 90);
        assert_eq!(series[2].hours, 150);

        assert!((series[0].score - 6.0).abs() < EPS);
        assert!((series[1].score - 7.0).abs() < EPS);
        assert!((series[2].score - 23.0 / 3.0).abs() < EPS);

        let weighted_after_two = (6.0 * 60.0 + 8.0 * 30.0) / 90.0;
        assert!((series[1].cumulative_weighted_score - weighted_after_two).abs() < EPS);
        assert_eq!(series[2].semester_hours, 60);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let records = vec![
            record("EXA806", "2020.1", 60, 6.3, Status::AP),
            record("EXA807", "2020.2", 45, 7.9, Status::AF),
            record("EXA808", "2020.2", 30, 2.1, Status::RE),
        ];
        let first = aggregate(&records);
        let second = aggregate(&records);
        assert_eq!(first, second);
        assert_eq!(first.exact_score.to_bits(), second.exact_score.to_bits());
    }

    #[test]
    fn official_score_rounds_the_stored_binary_value() {
        // (7.0 + 7.7) / 2 is stored just below 7.35.
        let records = vec![
            record("EXA806", "2020.1", 30, 7.0, Status::AP),
            record("EXA807", "2020.1", 30, 7.7, Status::AP),
        ];
        let result = aggregate(&records);
        assert_eq!(result.official_score, 7.3);
        assert_eq!(result.display_score(ScoreKind::Weighted), 7.3);

        // (7.0 + 7.5) / 2 is exactly 7.25 and goes up.
        let records = vec![
            record("EXA806", "2020.1", 30, 7.0, Status::AP),
            record("EXA807", "2020.1", 30, 7.5, Status::AP),
        ];
        let result = aggregate(&records);
        assert_eq!(result.official_score, 7.3);
        assert_eq!(result.display_score(ScoreKind::Weighted), 7.3);
    }

    #[test]
    fn hour_totals_do_not_wrap() {
        let records = vec![
            record("EXA806", "2020.1", u32::MAX, 8.0, Status::AP),
            record("EXA807", "2020.2", 1, 8.0, Status::AP),
        ];
        let result = aggregate(&records);
        let expected = u64::from(u32::MAX) + 1;

        assert!(result.is_complete);
        assert_eq!(result.approved_hours, expected);
        assert_eq!(result.total_hours, expected);
        assert_eq!(result.semester_scores[1].hours, expected);
        assert!((result.cumulative_score - 8.0).abs() < EPS);
    }
}
