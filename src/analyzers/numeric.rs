//! Numeric detection and coercion for choice text.
//!
//! Every view shares [`parse_number`], so a choice that counts as numeric
//! for sorting also counts as numeric for rating detection.

use std::collections::{HashMap, HashSet};

use crate::analyzers::types::ResponseRecord;
use crate::error::SurveyError;

/// Checks the float pattern: optional sign, digits, at most one decimal
/// point, at least one digit. No exponents, no `inf`/`NaN`.
fn is_float_literal(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut digits = 0;
    let mut dots = 0;

    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }

    digits > 0 && dots <= 1
}

/// Parses `text` as a number using the strict float pattern.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !is_float_literal(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Parses `text` as an integer: optional sign followed by digits only.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>().ok()
}

/// Returns the rating questions: every observed value numeric and the
/// question not on the denylist. First-seen order.
pub fn rating_questions(records: &[ResponseRecord], denylist: &[String]) -> Vec<String> {
    let denied: HashSet<&str> = denylist.iter().map(String::as_str).collect();
    let mut order: Vec<&str> = Vec::new();
    let mut all_numeric: HashMap<&str, bool> = HashMap::new();

    for record in records {
        let numeric = parse_number(&record.choice_text).is_some();
        let entry = all_numeric
            .entry(record.question.as_str())
            .or_insert_with(|| {
                order.push(record.question.as_str());
                true
            });
        *entry &= numeric;
    }

    order
        .into_iter()
        .filter(|q| all_numeric.get(q).copied().unwrap_or(false))
        .filter(|q| !denied.contains(q))
        .map(str::to_string)
        .collect()
}

/// Requires every choice of `question` to be an integer.
///
/// Used for integer-only datasets; the first offending record aborts the
/// question with a [`SurveyError::Coercion`].
pub fn coerce_integers<'a, I>(question: &str, records: I) -> Result<Vec<i64>, SurveyError>
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    records
        .into_iter()
        .filter(|r| r.question == question)
        .map(|r| {
            parse_integer(&r.choice_text).ok_or_else(|| SurveyError::Coercion {
                question: question.to_string(),
                row: r.row,
                value: r.choice_text.clone(),
            })
        })
        .collect()
}
