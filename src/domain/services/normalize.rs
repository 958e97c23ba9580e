//! Page text cleanup ahead of record extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Header printed at the top of every transcript page.
pub const INSTITUTION_HEADER: &str = "UNIVERSIDADE ESTADUAL DE FEIRA DE SANTANA";

/// Rows the template emits for terms without registration.
static NOT_ENROLLED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"---\s*---\s*---\s*\d{4}\.\d[A-Z]?\s*---\s*NÃO MATRICULADO\s*-+").unwrap()
});

pub fn normalize<S: AsRef<str>>(pages: &[S]) -> String {
    normalize_with_header(pages, INSTITUTION_HEADER)
}

/// Joins page texts into one blob, dropping duplicated header blocks and
/// not-enrolled rows.
///
/// Every page is followed by a line break, so an empty slice gives an empty
/// string.
pub fn normalize_with_header<S: AsRef<str>>(pages: &[S], header: &str) -> String {
    let mut full_text = String::new();

    for page in pages {
        full_text.push_str(truncate_repeated_header(page.as_ref(), header));
        full_text.push('\n');
    }

    NOT_ENROLLED_RE.replace_all(&full_text, "").into_owned()
}

/// Cuts a page at the second copy of `header`; only the first block is kept.
fn truncate_repeated_header<'a>(page: &'a str, header: &str) -> &'a str {
    if header.is_empty() {
        return page;
    }

    let Some(first) = page.find(header) else {
        return page;
    };

    let after_first = first + header.len();
    match page[after_first..].find(header) {
        Some(rel) => {
            tracing::debug!("Dropping duplicated page block at byte {}", after_first + rel);
            &page[..after_first + rel]
        }
        None => page,
    }
}
