//! Splits normalized transcript text into classified words.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::model::Status;

static GRADE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}[.,]\d$").unwrap());
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2,3}$").unwrap());
static SEMESTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.\d{1,2}[A-Z]?$").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}[0-9]{3}").unwrap());
static SEMESTER_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}\.\d{1,2}[A-Z]?)(?:AP|AF|RE|RF|RP|DP|TR)$").unwrap()
});

pub const PLACEHOLDER: &str = "---";

const CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Placeholder,
    Grade,
    Hours,
    Semester,
    Status(Status),
    /// Six-character course code. Text glued after it becomes its own token.
    Code,
    Word,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// A line break sits between this token and the previous one.
    pub after_newline: bool,
    pub kind: TokenKind,
}

impl<'a> Token<'a> {
    /// The course code part of a [`TokenKind::Code`] token.
    pub fn code(&self) -> Option<&'a str> {
        match self.kind {
            TokenKind::Code => self.text.get(..CODE_LEN),
            _ => None,
        }
    }
}

pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut saw_newline = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(&mut tokens, text, start, idx, saw_newline);
                saw_newline = false;
            }
            if ch == '\n' {
                saw_newline = true;
            }
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }

    if let Some(start) = word_start {
        push_word(&mut tokens, text, start, text.len(), saw_newline);
    }

    tokens
}

/// Pushes one whitespace-delimited word, split where two fields are glued:
/// `2020.1AP` gives a semester and a status, `EXA8067,0` gives a code and
/// a grade.
fn push_word<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, start: usize, end: usize, after_newline: bool) {
    let word = &text[start..end];

    if let Some(semester) = SEMESTER_STATUS_RE.captures(word).and_then(|caps| caps.get(1)) {
        let split = start + semester.end();
        tokens.push(token_at(text, start, split, after_newline, TokenKind::Semester));
        tokens.push(token_at(text, split, end, false, classify(&text[split..end])));
        return;
    }

    let kind = classify(word);
    if kind == TokenKind::Code && word.len() > CODE_LEN {
        let split = start + CODE_LEN;
        tokens.push(token_at(text, start, split, after_newline, TokenKind::Code));
        push_residual(tokens, text, split, end);
        return;
    }

    tokens.push(token_at(text, start, end, after_newline, kind));
}

/// Text glued after a code. A code needs whitespace before it, so a
/// code-shaped residual is an ordinary word.
fn push_residual<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, start: usize, end: usize) {
    let before = tokens.len();
    push_word(tokens, text, start, end, false);
    for token in &mut tokens[before..] {
        if token.kind == TokenKind::Code {
            token.kind = TokenKind::Word;
        }
    }
}

fn token_at(text: &str, start: usize, end: usize, after_newline: bool, kind: TokenKind) -> Token<'_> {
    Token {
        text: &text[start..end],
        start,
        end,
        after_newline,
        kind,
    }
}

/// Exact shapes are tried before the open-ended code prefix.
pub fn classify(word: &str) -> TokenKind {
    if word == PLACEHOLDER {
        TokenKind::Placeholder
    } else if let Ok(status) = word.parse::<Status>() {
        TokenKind::Status(status)
    } else if GRADE_RE.is_match(word) {
        TokenKind::Grade
    } else if HOURS_RE.is_match(word) {
        TokenKind::Hours
    } else if SEMESTER_RE.is_match(word) {
        TokenKind::Semester
    } else if CODE_RE.is_match(word) {
        TokenKind::Code
    } else {
        TokenKind::Word
    }
}
