//! Season identifier helpers.
//!
//! NHL seasons straddle two calendar years and are identified by an 8-digit
//! string concatenating the start and end year, e.g. `"20232024"`.

use chrono::{Datelike, NaiveDate};

/// First month (1-based) that belongs to a new season.
const SEASON_START_MONTH: u32 = 10;

/// Return the season id that is active (or most recently completed) on `date`.
///
/// From October onward the season spans the current and next calendar year;
/// before October it spans the previous and current year.
pub fn season_for_date(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= SEASON_START_MONTH {
        format!("{}{}", year, year + 1)
    } else {
        format!("{}{}", year - 1, year)
    }
}

/// Season id for today's local date.
pub fn current_season() -> String {
    season_for_date(chrono::Local::now().date_naive())
}

/// Check that `season` looks like two consecutive 4-digit years.
pub fn is_valid_season(season: &str) -> bool {
    if season.len() != 8 || !season.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match (season[..4].parse::<i32>(), season[4..].parse::<i32>()) {
        (Ok(start), Ok(end)) => end == start + 1,
        _ => false,
    }
}

/// Render a season id for humans: `"20232024"` → `"2023/2024"`.
pub fn display_season(season: &str) -> String {
    if is_valid_season(season) {
        format!("{}/{}", &season[..4], &season[4..])
    } else {
        season.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_november_uses_current_and_next_year() {
        assert_eq!(season_for_date(date(2024, 11, 3)), "20242025");
    }

    #[test]
    fn test_march_uses_previous_and_current_year() {
        assert_eq!(season_for_date(date(2025, 3, 14)), "20242025");
    }

    #[test]
    fn test_october_boundary() {
        assert_eq!(season_for_date(date(2023, 9, 30)), "20222023");
        assert_eq!(season_for_date(date(2023, 10, 1)), "20232024");
    }

    #[test]
    fn test_is_valid_season() {
        assert!(is_valid_season("20232024"));
        assert!(!is_valid_season("20232025"));
        assert!(!is_valid_season("2023"));
        assert!(!is_valid_season("2023-2024"));
    }

    #[test]
    fn test_display_season() {
        assert_eq!(display_season("20232024"), "2023/2024");
        assert_eq!(display_season("latest"), "latest");
    }
}
