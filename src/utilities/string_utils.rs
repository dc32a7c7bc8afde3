//! String utility functions.
//!
//! Column-name conversions shared by the ingest layer and the statistics
//! queries, plus the name folding the stores apply before comparing text.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static CAMEL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
static CAMEL_LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Convert a camelCase API field name to snake_case.
///
/// `skaterFullName` → `skater_full_name`, `evPoints` → `ev_points`.
pub fn to_snake_case(name: &str) -> String {
    let step1 = CAMEL_WORD.replace_all(name, "${1}_${2}");
    let step2 = CAMEL_LOWER_UPPER.replace_all(&step1, "${1}_${2}");
    step2.to_lowercase()
}

/// Turn a snake_case column into a display header.
///
/// `points_per_game` → `Points Per Game`.
pub fn title_case_column(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Letters NFD does not split into a base letter and a mark.
fn fold_atomic(c: char) -> Option<&'static str> {
    let folded = match c {
        'ø' => "o",
        'ł' => "l",
        'đ' | 'ð' => "d",
        'ħ' => "h",
        'ı' => "i",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}

/// Normalize a name for equality comparison.
///
/// Strips diacritics (`Lindström` → `Lindstrom`, `Daugaviņš` → `Daugavins`),
/// lowercases and trims. Both sides of a text predicate go through this
/// before comparing.
pub fn normalize_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let letters = value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase);
    for c in letters {
        match fold_atomic(c) {
            Some(folded) => out.push_str(folded),
            None => out.push(c),
        }
    }
    out
}

/// Shorten text for log output on a char boundary.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}
