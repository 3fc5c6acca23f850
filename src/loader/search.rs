//! Search and ordering helpers for reference collections

use std::cmp::Ordering;

use crate::domain::{scalar_string, Row};

/// Substring match of `term` against any of `fields` on a row.
///
/// `term` must already be trimmed (and lowercased when the search is
/// case-insensitive).
pub fn row_matches(row: &Row, term: &str, fields: &[String], case_sensitive: bool) -> bool {
    fields.iter().any(|field| {
        let Some(value) = row.get(field).and_then(scalar_string) else {
            return false;
        };
        if case_sensitive {
            value.contains(term)
        } else {
            value.to_lowercase().contains(term)
        }
    })
}

/// Case-insensitive, numeric-aware ordering for display labels.
///
/// Digit runs compare as numbers so "Grupo 10" sorts after "Grupo 2".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let na = take_number(&mut ca);
                    let nb = take_number(&mut cb);
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    ca.next();
                    cb.next();
                    match x.cmp(&y) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut n: u64 = 0;
    while let Some(c) = chars.peek() {
        let Some(d) = c.to_digit(10) else { break };
        n = n.saturating_mul(10).saturating_add(d as u64);
        chars.next();
    }
    n
}
