use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns},
};

use bapsang_core::DietError;
use bapsang_core::models::{HistoryRecord, format_kg};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
        },
    }
}

/// Turn a service error into a message for the terminal.
pub(crate) fn describe_error(err: DietError, user: &str) -> anyhow::Error {
    match err {
        DietError::ProfileMissing => {
            anyhow!("No profile for '{user}'. Run `bapsang profile set` first.")
        }
        DietError::Storage(inner) => inner,
        other => {
            let messages = other
                .user_messages()
                .unwrap_or_else(|| vec![other.to_string()]);
            anyhow!("{}", messages.join("\n"))
        }
    }
}

/// Round to one decimal and drop a negative zero.
pub(crate) fn tidy(v: f64) -> f64 {
    let rounded = (v * 10.0).round() / 10.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub(crate) fn print_history_table(records: &[HistoryRecord], value_header: &str) {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Date", value_header]);
    for r in records {
        builder.push_record([
            r.id.to_string(),
            r.date.format("%Y-%m-%d").to_string(),
            format_kg(r.value_kg),
        ]);
    }

    let table = builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_describe_error() {
        let missing = describe_error(DietError::ProfileMissing, "local");
        assert!(missing.to_string().contains("bapsang profile set"));

        let invalid = describe_error(
            DietError::InvalidInput(vec!["a".to_string(), "b".to_string()]),
            "local",
        );
        assert_eq!(invalid.to_string(), "a\nb");

        let storage = describe_error(DietError::Storage(anyhow!("locked")), "local");
        assert_eq!(storage.to_string(), "locked");
    }

    #[test]
    fn test_tidy() {
        assert_eq!(tidy(-0.000_01).to_bits(), 0.0_f64.to_bits());
        assert_eq!(tidy(0.199_999), 0.2);
        assert_eq!(tidy(-2.0), -2.0);
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("kakao-user-0123456789", 10), "kakao-u...");
        assert_eq!(truncate("불고기 나물 비빔밥", 8), "불고기 나...");
    }
}
