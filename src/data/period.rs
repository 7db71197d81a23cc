//! Calendar Period Bucketing
//! Maps ship dates onto month, quarter or year labels.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Date formats accepted for the ship date column (month-first for slashes).
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d.%m.%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Month,
    #[default]
    Quarter,
    Year,
}

impl Period {
    /// Column heading for bucket labels.
    pub fn name(self) -> &'static str {
        match self {
            Period::Month => "Month",
            Period::Quarter => "Quarter",
            Period::Year => "Year",
        }
    }

    pub fn adjective(self) -> &'static str {
        match self {
            Period::Month => "Monthly",
            Period::Quarter => "Quarterly",
            Period::Year => "Yearly",
        }
    }

    /// Label for a calendar date, e.g. `2023Q1`, `2023-01`, `2023`.
    pub fn label_for(self, date: NaiveDate) -> String {
        match self {
            Period::Month => format!("{}-{:02}", date.year(), date.month()),
            Period::Quarter => format!("{}Q{}", date.year(), (date.month() - 1) / 3 + 1),
            Period::Year => format!("{}", date.year()),
        }
    }

    /// Bucket a raw value. Values that already are labels of this period pass through.
    pub fn bucket(self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if self.is_label(raw) {
            return Some(raw.to_string());
        }
        parse_date(raw).map(|date| self.label_for(date))
    }

    fn is_label(self, raw: &str) -> bool {
        match self {
            Period::Quarter => match raw.split_once('Q') {
                Some((year, quarter)) => {
                    is_year(year) && matches!(quarter, "1" | "2" | "3" | "4")
                }
                None => false,
            },
            Period::Month => match raw.split_once('-') {
                Some((year, month)) => {
                    is_year(year)
                        && month.len() == 2
                        && month.parse::<u32>().is_ok_and(|m| (1..=12).contains(&m))
                }
                None => false,
            },
            Period::Year => is_year(raw),
        }
    }
}

fn is_year(raw: &str) -> bool {
    raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a date in any of the accepted formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_labels_follow_calendar_truncation() {
        assert_eq!(Period::Quarter.bucket("2023-01-15").as_deref(), Some("2023Q1"));
        assert_eq!(Period::Quarter.bucket("2023-03-31").as_deref(), Some("2023Q1"));
        assert_eq!(Period::Quarter.bucket("04/01/2023").as_deref(), Some("2023Q2"));
        assert_eq!(Period::Quarter.bucket("12/31/2016").as_deref(), Some("2016Q4"));
    }

    #[test]
    fn month_and_year_labels() {
        assert_eq!(Period::Month.bucket("2016-11-08").as_deref(), Some("2016-11"));
        assert_eq!(Period::Year.bucket("11/08/2016").as_deref(), Some("2016"));
    }

    #[test]
    fn bucketing_is_idempotent() {
        for period in [Period::Month, Period::Quarter, Period::Year] {
            for raw in ["2023-02-14", "07/04/2019", "2020-12-31 23:59:00"] {
                let once = period.bucket(raw).unwrap();
                let twice = period.bucket(&once).unwrap();
                assert_eq!(once, twice, "{period:?} {raw}");
            }
        }
    }

    #[test]
    fn unparseable_values_are_rejected() {
        assert_eq!(Period::Quarter.bucket("not a date"), None);
        assert_eq!(Period::Quarter.bucket("2023Q5"), None);
        assert_eq!(Period::Quarter.bucket(""), None);
    }

    #[test]
    fn datetime_values_are_truncated_to_dates() {
        assert_eq!(
            parse_date("2021-05-06T10:00:00"),
            NaiveDate::from_ymd_opt(2021, 5, 6)
        );
    }
}
