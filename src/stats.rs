use crate::models::{CitySummary, EmployeeInsight, InsightSummary, Sentiment};
use serde::Serialize;
use std::collections::BTreeMap;

/// Share of `part` in `total` as a percentage rounded to two decimals.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
    pub total: i64,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
}

impl SentimentBreakdown {
    pub fn from_counts(positive: i64, negative: i64, neutral: i64) -> Self {
        let total = positive + negative + neutral;
        Self {
            positive,
            negative,
            neutral,
            total,
            positive_pct: percentage(positive, total),
            negative_pct: percentage(negative, total),
            neutral_pct: percentage(neutral, total),
        }
    }

    /// The sentiment with the highest count; ties go positive, then negative.
    pub fn dominant(&self) -> Option<Sentiment> {
        if self.total == 0 {
            return None;
        }
        let max = self.positive.max(self.negative).max(self.neutral);
        if self.positive == max {
            Some(Sentiment::Positive)
        } else if self.negative == max {
            Some(Sentiment::Negative)
        } else {
            Some(Sentiment::Neutral)
        }
    }
}

pub fn sentiment_breakdown<'a, I>(rows: I) -> SentimentBreakdown
where
    I: IntoIterator<Item = &'a EmployeeInsight>,
{
    let (mut positive, mut negative, mut neutral) = (0i64, 0i64, 0i64);
    for row in rows {
        match row.sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => neutral += 1,
        }
    }
    SentimentBreakdown::from_counts(positive, negative, neutral)
}

/// Overall breakdown across insight summaries.
pub fn summary_breakdown(summaries: &[InsightSummary]) -> SentimentBreakdown {
    let (positive, negative, neutral) = summaries.iter().fold((0, 0, 0), |acc, item| {
        (
            acc.0 + item.positif_count,
            acc.1 + item.negatif_count,
            acc.2 + item.netral_count,
        )
    });
    SentimentBreakdown::from_counts(positive, negative, neutral)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRow {
    pub kota: String,
    pub witel: Option<String>,
    pub sentiment: SentimentBreakdown,
}

fn sort_cities(rows: &mut [CityRow]) {
    rows.sort_by(|a, b| {
        b.sentiment
            .total
            .cmp(&a.sentiment.total)
            .then_with(|| a.kota.cmp(&b.kota))
    });
}

pub fn city_breakdown(summaries: &[CitySummary]) -> Vec<CityRow> {
    let mut rows: Vec<CityRow> = summaries
        .iter()
        .map(|city| CityRow {
            kota: city.kota.clone(),
            witel: city.witel.clone(),
            sentiment: SentimentBreakdown::from_counts(
                city.positif_count,
                city.negatif_count,
                city.netral_count,
            ),
        })
        .collect();
    sort_cities(&mut rows);
    rows
}

/// Groups filtered feedback rows by city.
pub fn cities_from_rows<'a, I>(rows: I) -> Vec<CityRow>
where
    I: IntoIterator<Item = &'a EmployeeInsight>,
{
    let mut grouped: BTreeMap<String, (Option<String>, i64, i64, i64)> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry(row.kota.trim().to_string())
            .or_insert_with(|| (row.witel.clone(), 0, 0, 0));
        match row.sentiment {
            Sentiment::Positive => entry.1 += 1,
            Sentiment::Negative => entry.2 += 1,
            Sentiment::Neutral => entry.3 += 1,
        }
    }

    let mut cities: Vec<CityRow> = grouped
        .into_iter()
        .map(|(kota, (witel, pos, neg, neu))| CityRow {
            kota,
            witel,
            sentiment: SentimentBreakdown::from_counts(pos, neg, neu),
        })
        .collect();
    sort_cities(&mut cities);
    cities
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
    pub total: i64,
}

/// The `limit` busiest insights, by total count, as stacked-bar points.
pub fn top_series(summaries: &[InsightSummary], limit: usize) -> Vec<ChartPoint> {
    let mut sorted: Vec<&InsightSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.word_insight.cmp(&b.word_insight))
    });
    sorted
        .into_iter()
        .take(limit)
        .map(|item| ChartPoint {
            label: item.word_insight.clone(),
            positive: item.positif_count,
            negative: item.negatif_count,
            neutral: item.netral_count,
            total: item.total_count,
        })
        .collect()
}
