//! Semester labels that open a block of transcript rows.
//!
//! Rows that omit their own term inherit the label of the closest anchor
//! before them.

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}\.\d{1,2}[A-Z]?)\s+(?:AP|AF|RE|RF|RP|DP|TR|---)").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterAnchor {
    /// Byte offset of the label in the normalized text.
    pub offset: usize,
    pub semester: String,
}

/// Single forward scan; offsets come back strictly increasing.
pub fn scan_anchors(text: &str) -> Vec<SemesterAnchor> {
    ANCHOR_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(1)?;
            Some(SemesterAnchor {
                offset: caps.get(0)?.start(),
                semester: label.as_str().to_string(),
            })
        })
        .collect()
}

/// Label of the last anchor strictly before `offset`.
pub fn semester_before(anchors: &[SemesterAnchor], offset: usize) -> Option<&str> {
    let idx = anchors.partition_point(|anchor| anchor.offset < offset);
    idx.checked_sub(1).map(|i| anchors[i].semester.as_str())
}
