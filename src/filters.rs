use crate::models::{Bookmark, EmployeeInsight, FilterSet, InsightSummary, Sentiment};
use chrono::NaiveDate;
use serde::Deserialize;

/// Records that can be narrowed by the free-text search box.
pub trait Searchable {
    fn title(&self) -> &str;

    /// `needle` is already trimmed and lowercased.
    fn matches_search(&self, needle: &str) -> bool {
        self.title().to_lowercase().contains(needle)
    }
}

impl Searchable for InsightSummary {
    fn title(&self) -> &str {
        &self.word_insight
    }
}

impl Searchable for Bookmark {
    fn title(&self) -> &str {
        &self.word_insight
    }
}

impl Searchable for EmployeeInsight {
    fn title(&self) -> &str {
        &self.sentence
    }

    fn matches_search(&self, needle: &str) -> bool {
        [&self.sentence, &self.employee_name, &self.word_insight]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Case-insensitive substring search; a blank term keeps everything.
pub fn search<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.matches_search(&needle))
        .collect()
}

/// Raw filter inputs as they arrive in a query string or form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub search: Option<String>,
    pub sentiment: Option<String>,
    pub kota: Option<String>,
    pub witel: Option<String>,
    pub source: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<usize>,
}

impl FilterQuery {
    /// True when the request carried no filter field at all, as opposed to
    /// fields submitted blank.
    pub fn is_absent(&self) -> bool {
        self.search.is_none()
            && self.sentiment.is_none()
            && self.kota.is_none()
            && self.witel.is_none()
            && self.source.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    pub fn to_filters(&self) -> FilterSet {
        FilterSet {
            search: non_blank(&self.search),
            sentiment: self.sentiment.as_deref().and_then(Sentiment::parse),
            kota: non_blank(&self.kota),
            witel: non_blank(&self.witel),
            source: non_blank(&self.source),
            date_from: non_blank(&self.date_from).filter(|value| parse_date(value).is_some()),
            date_to: non_blank(&self.date_to).filter(|value| parse_date(value).is_some()),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn same_label(expected: &Option<String>, actual: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual.is_some_and(|actual| actual.trim().eq_ignore_ascii_case(expected)),
    }
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }

    pub fn matches(&self, row: &EmployeeInsight) -> bool {
        if let Some(term) = &self.search {
            if !row.matches_search(&term.to_lowercase()) {
                return false;
            }
        }
        if self.sentiment.is_some_and(|sentiment| sentiment != row.sentiment) {
            return false;
        }
        if !same_label(&self.kota, Some(row.kota.as_str()))
            || !same_label(&self.witel, row.witel.as_deref())
            || !same_label(&self.source, Some(row.source.as_str()))
        {
            return false;
        }

        let from = self.date_from.as_deref().and_then(parse_date);
        let to = self.date_to.as_deref().and_then(parse_date);
        if from.is_none() && to.is_none() {
            return true;
        }
        let Some(day) = parse_date(&row.created_at) else {
            return false;
        };
        from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
    }

    pub fn apply<'a>(&self, rows: &'a [EmployeeInsight]) -> Vec<&'a EmployeeInsight> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }

    /// Query-string form of the active filters, without the page number.
    pub fn to_query_string(&self) -> String {
        let pairs = [
            ("search", self.search.clone()),
            ("sentiment", self.sentiment.map(|s| s.as_str().to_string())),
            ("kota", self.kota.clone()),
            ("witel", self.witel.clone()),
            ("source", self.source.clone()),
            ("date_from", self.date_from.clone()),
            ("date_to", self.date_to.clone()),
        ];
        pairs
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_ref()
                    .map(|value| format!("{name}={}", urlencoding::encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Sorted distinct values of one column, for filter dropdowns.
pub fn distinct<'a, T, F>(rows: &'a [T], column: F) -> Vec<String>
where
    F: Fn(&'a T) -> Option<&'a str>,
{
    let mut values: Vec<String> = rows
        .iter()
        .filter_map(column)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    values.sort_by_key(|value| value.to_lowercase());
    values.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(word: &str) -> InsightSummary {
        InsightSummary {
            word_insight: word.to_string(),
            ..Default::default()
        }
    }

    fn row(id: i64, sentiment: Sentiment, kota: &str, date: &str) -> EmployeeInsight {
        EmployeeInsight {
            id,
            employee_name: format!("Employee {id}"),
            source: "survey".into(),
            sentence: format!("Feedback number {id} about gaji"),
            word_insight: "gaji".into(),
            sentiment,
            kota: kota.into(),
            witel: Some("Jatim".into()),
            created_at: date.into(),
        }
    }

    #[test]
    fn search_is_case_insensitive_on_title() {
        let items = vec![summary("Gaji Pokok"), summary("kantor"), summary("tunjangan gaji")];
        let found: Vec<&str> = search(&items, "  GAJI ")
            .iter()
            .map(|item| item.word_insight.as_str())
            .collect();
        assert_eq!(found, vec!["Gaji Pokok", "tunjangan gaji"]);
        assert_eq!(search(&items, "").len(), 3);
        assert!(search(&items, "cuti").is_empty());
    }

    #[test]
    fn equality_filters_combine() {
        let rows = vec![
            row(1, Sentiment::Positive, "Surabaya", "2025-03-01"),
            row(2, Sentiment::Negative, "Surabaya", "2025-03-02"),
            row(3, Sentiment::Negative, "Malang", "2025-03-03"),
        ];
        let filters = FilterSet {
            sentiment: Some(Sentiment::Negative),
            kota: Some("surabaya".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = filters.apply(&rows).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn date_range_is_inclusive_and_skips_unparseable_dates() {
        let rows = vec![
            row(1, Sentiment::Neutral, "Malang", "2025-03-01T08:00:00Z"),
            row(2, Sentiment::Neutral, "Malang", "2025-03-05"),
            row(3, Sentiment::Neutral, "Malang", "yesterday"),
            row(4, Sentiment::Neutral, "Malang", "2025-03-09"),
        ];
        let filters = FilterSet {
            date_from: Some("2025-03-01".into()),
            date_to: Some("2025-03-05".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = filters.apply(&rows).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert_eq!(FilterSet::default().apply(&rows).len(), 4);
    }

    #[test]
    fn query_normalizes_blank_and_invalid_values() {
        let query = FilterQuery {
            search: Some("   ".into()),
            sentiment: Some("Negatif".into()),
            kota: Some(" Malang ".into()),
            date_from: Some("not-a-date".into()),
            ..Default::default()
        };
        let filters = query.to_filters();
        assert_eq!(filters.search, None);
        assert_eq!(filters.sentiment, Some(Sentiment::Negative));
        assert_eq!(filters.kota.as_deref(), Some("Malang"));
        assert_eq!(filters.date_from, None);
        assert!(!query.is_absent());
        assert!(FilterQuery::default().is_absent());
    }

    #[test]
    fn query_string_encodes_values() {
        let filters = FilterSet {
            search: Some("jam kerja".into()),
            sentiment: Some(Sentiment::Positive),
            ..Default::default()
        };
        assert_eq!(filters.to_query_string(), "search=jam%20kerja&sentiment=positive");
    }

    #[test]
    fn distinct_dedups_ignoring_case() {
        let rows = vec![
            row(1, Sentiment::Neutral, "Malang", ""),
            row(2, Sentiment::Neutral, "malang", ""),
            row(3, Sentiment::Neutral, "Blitar", ""),
        ];
        assert_eq!(distinct(&rows, |r| Some(r.kota.as_str())), vec!["Blitar", "Malang"]);
    }
}
