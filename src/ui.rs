use crate::config::AppConfig;
use crate::models::{
    Bookmark, ChatExchange, DashboardStats, EmployeeInsight, FilterSet, InsightSummary, Sentiment,
    User,
};
use crate::pagination::Page;
use crate::stats::{ChartPoint, CityRow, SentimentBreakdown};
use axum::http::StatusCode;
use std::collections::{HashMap, HashSet};

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Dashboard,
    TopInsights,
    SmartAnalytics,
    MyInsights,
    Chat,
    Settings,
}

const NAV_ITEMS: [(NavItem, &str, &str); 6] = [
    (NavItem::Dashboard, "/survey-dashboard", "Survey Dashboard"),
    (NavItem::TopInsights, "/top-insights", "Top Insights"),
    (NavItem::SmartAnalytics, "/smart-analytics", "Smart Analytics"),
    (NavItem::MyInsights, "/my-insights", "My Insights"),
    (NavItem::Chat, "/chat", "Assistant"),
    (NavItem::Settings, "/settings", "Settings"),
];

fn render_shell(title: &str, active: NavItem, user: Option<&User>, body: &str) -> String {
    let nav: String = NAV_ITEMS
        .iter()
        .map(|(item, href, label)| {
            let class = if *item == active { "nav-link active" } else { "nav-link" };
            format!(r#"<a class="{class}" href="{href}">{label}</a>"#)
        })
        .collect();
    let user = user.map(|user| user.display_name()).unwrap_or("Guest");

    LAYOUT_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav)
        .replace("{{USER}}", &escape(user))
        .replace("{{BODY}}", body)
}

fn render_bare(body: &str) -> String {
    BARE_HTML.replace("{{STYLE}}", STYLE).replace("{{BODY}}", body)
}

fn sentiment_class(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "pos",
        Sentiment::Negative => "neg",
        Sentiment::Neutral => "neu",
    }
}

fn stat_card(label: &str, value: &str, class: &str) -> String {
    format!(
        r#"<div class="stat"><span class="label">{}</span><span class="value {class}">{}</span></div>"#,
        escape(label),
        escape(value)
    )
}

/// Single 100% stacked bar with a legend underneath.
fn sentiment_meter(breakdown: &SentimentBreakdown) -> String {
    if breakdown.total == 0 {
        return r#"<p class="empty">No feedback matches the current filters.</p>"#.to_string();
    }
    let pos = breakdown.positive_pct;
    let neg = breakdown.negative_pct;
    let neu = (100.0 - pos - neg).max(0.0);
    format!(
        r#"<svg class="meter" viewBox="0 0 100 6" preserveAspectRatio="none" role="img" aria-label="Sentiment share">
  <rect class="bar-pos" x="0" y="0" width="{pos:.2}" height="6" />
  <rect class="bar-neg" x="{pos:.2}" y="0" width="{neg:.2}" height="6" />
  <rect class="bar-neu" x="{offset:.2}" y="0" width="{neu:.2}" height="6" />
</svg>
<div class="legend">
  <span class="pos">Positive {pos:.2}% ({p})</span>
  <span class="neg">Negative {neg:.2}% ({n})</span>
  <span class="neu">Neutral {neu_pct:.2}% ({u})</span>
</div>"#,
        offset = pos + neg,
        neu_pct = breakdown.neutral_pct,
        p = breakdown.positive,
        n = breakdown.negative,
        u = breakdown.neutral,
    )
}

/// Horizontal stacked bars, one per insight, scaled to the largest total.
fn stacked_chart(points: &[ChartPoint]) -> String {
    if points.is_empty() {
        return r#"<p class="empty">No data yet</p>"#.to_string();
    }
    const WIDTH: f64 = 600.0;
    const LABEL: f64 = 140.0;
    const ROW: f64 = 26.0;
    let max = points.iter().map(|p| p.total).max().unwrap_or(1).max(1) as f64;
    let scale = (WIDTH - LABEL - 50.0) / max;
    let height = ROW * points.len() as f64 + 8.0;

    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {height}" role="img" aria-label="Top insights by volume">"#
    );
    for (index, point) in points.iter().enumerate() {
        let y = 4.0 + index as f64 * ROW;
        let mut x = LABEL;
        svg.push_str(&format!(
            r#"<text class="chart-label" x="{}" y="{}" text-anchor="end">{}</text>"#,
            LABEL - 8.0,
            y + 15.0,
            escape(&point.label)
        ));
        for (count, class) in [
            (point.positive, "bar-pos"),
            (point.negative, "bar-neg"),
            (point.neutral, "bar-neu"),
        ] {
            let width = count as f64 * scale;
            svg.push_str(&format!(
                r#"<rect class="{class}" x="{x:.2}" y="{y:.2}" width="{width:.2}" height="18" rx="3" />"#
            ));
            x += width;
        }
        svg.push_str(&format!(
            r#"<text class="chart-label" x="{:.2}" y="{}">{}</text>"#,
            x + 6.0,
            y + 15.0,
            point.total
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn with_page(path: &str, query: &str, page: usize) -> String {
    if query.is_empty() {
        format!("{path}?page={page}")
    } else {
        format!("{path}?{query}&page={page}")
    }
}

fn render_pager<T>(path: &str, query: &str, page: &Page<'_, T>) -> String {
    let link = |name: &str, label: &str, enabled: bool, target: usize| {
        if enabled {
            format!(
                r#"<a class="pager-link" data-pager="{name}" href="{}">{label}</a>"#,
                escape(&with_page(path, query, target))
            )
        } else {
            format!(
                r#"<span class="pager-link disabled" data-pager="{name}" aria-disabled="true">{label}</span>"#
            )
        }
    };
    format!(
        r#"<nav class="pager">{}<span class="pager-status">Page {} of {} &middot; {}&ndash;{} of {}</span>{}</nav>"#,
        link("prev", "Previous", page.has_previous(), page.page.saturating_sub(1)),
        page.page,
        page.total_pages,
        page.first_position(),
        page.last_position(),
        page.total_items,
        link("next", "Next", page.has_next(), page.page + 1),
    )
}

fn bookmark_button(word: &str, bookmarked: bool, return_to: &str) -> String {
    let (label, state) = if bookmarked {
        ("&#9733; Saved", "true")
    } else {
        ("&#9734; Save", "false")
    };
    format!(
        r#"<form class="inline" method="post" action="/bookmarks/toggle">
  <input type="hidden" name="word_insight" value="{}" />
  <input type="hidden" name="return_to" value="{}" />
  <button class="btn-ghost" type="submit" data-bookmarked="{state}">{label}</button>
</form>"#,
        escape(word),
        escape(return_to)
    )
}

/// `kind` lands in each row's `data-row` attribute.
fn insight_rows<'a, I>(kind: &str, items: I, bookmarked: &HashSet<String>, return_to: &str) -> String
where
    I: IntoIterator<Item = &'a InsightSummary>,
{
    let mut rows = String::new();
    for item in items {
        let saved = bookmarked.contains(&item.word_insight.trim().to_lowercase());
        rows.push_str(&format!(
            r#"<tr data-row="{kind}">
  <td><a href="/top-insights?word={}">{}</a></td>
  <td>{}</td>
  <td class="pos">{:.2}%</td>
  <td class="neg">{:.2}%</td>
  <td class="neu">{:.2}%</td>
  <td>{}</td>
</tr>"#,
            urlencoding::encode(&item.word_insight),
            escape(&item.word_insight),
            item.total_count,
            item.positif_percentage,
            item.negatif_percentage,
            item.netral_percentage,
            bookmark_button(&item.word_insight, saved, return_to),
        ));
    }
    if rows.is_empty() {
        rows.push_str(r#"<tr><td colspan="6" class="empty">No insights found.</td></tr>"#);
    }
    format!(
        r#"<table class="data">
<thead><tr><th>Insight</th><th>Total</th><th>Positive</th><th>Negative</th><th>Neutral</th><th></th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
    )
}

fn feedback_rows<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a EmployeeInsight>,
{
    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            r#"<tr data-row="feedback">
  <td>{}</td>
  <td>{}</td>
  <td><span class="badge {}">{}</span></td>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
</tr>"#,
            escape(&item.employee_name),
            escape(&item.sentence),
            sentiment_class(item.sentiment),
            item.sentiment,
            escape(&item.kota),
            escape(&item.source),
            escape(item.created_at.get(..10).unwrap_or(&item.created_at)),
        ));
    }
    if rows.is_empty() {
        rows.push_str(r#"<tr><td colspan="6" class="empty">No feedback found.</td></tr>"#);
    }
    format!(
        r#"<table class="data">
<thead><tr><th>Employee</th><th>Feedback</th><th>Sentiment</th><th>City</th><th>Source</th><th>Date</th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
    )
}

fn city_table(cities: &[CityRow]) -> String {
    let mut rows = String::new();
    for city in cities {
        rows.push_str(&format!(
            r#"<tr data-row="city"><td>{}</td><td>{}</td><td>{}</td><td class="pos">{:.2}%</td><td class="neg">{:.2}%</td><td class="neu">{:.2}%</td></tr>"#,
            escape(&city.kota),
            escape(city.witel.as_deref().unwrap_or("-")),
            city.sentiment.total,
            city.sentiment.positive_pct,
            city.sentiment.negative_pct,
            city.sentiment.neutral_pct,
        ));
    }
    if rows.is_empty() {
        rows.push_str(r#"<tr><td colspan="6" class="empty">No city data.</td></tr>"#);
    }
    format!(
        r#"<table class="data">
<thead><tr><th>Kota</th><th>Witel</th><th>Total</th><th>Positive</th><th>Negative</th><th>Neutral</th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
    )
}

fn search_form(action: &str, term: &str) -> String {
    format!(
        r#"<form class="toolbar" method="get" action="{action}">
  <input type="search" name="search" placeholder="Search insights" value="{}" />
  <button class="btn-primary" type="submit">Search</button>
</form>"#,
        escape(term)
    )
}

pub fn render_login(error: Option<&str>, username: &str) -> String {
    let error = error
        .map(|message| format!(r#"<p class="status" data-type="error">{}</p>"#, escape(message)))
        .unwrap_or_default();
    let body = format!(
        r#"<section class="card narrow">
  <h2>Sign in</h2>
  <p class="subtitle">Use your Employee Insights account.</p>
  {error}
  <form class="stack" method="post" action="/login">
    <label>Username <input type="text" name="username" value="{}" required autofocus /></label>
    <label>Password <input type="password" name="password" required /></label>
    <button class="btn-primary" type="submit">Sign in</button>
  </form>
</section>"#,
        escape(username)
    );
    render_bare(&body)
}

pub struct DashboardView<'a> {
    pub user: Option<&'a User>,
    pub stats: &'a DashboardStats,
    pub overall: &'a SentimentBreakdown,
    pub series: &'a [ChartPoint],
    pub cities: &'a [CityRow],
    pub insights: Page<'a, InsightSummary>,
    pub bookmarked: &'a HashSet<String>,
    pub return_to: &'a str,
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let stats = view.stats;
    let body = format!(
        r#"<section class="panel">
  {}
  {}
  {}
  {}
  {}
</section>
<section class="card">
  <h2>Overall sentiment</h2>
  {}
</section>
<section class="card">
  <h2>Top insights by volume</h2>
  {}
</section>
<section class="card">
  <h2>Sentiment by city</h2>
  {}
</section>
<section class="card">
  <h2>All insights</h2>
  {}
  {}
</section>"#,
        stat_card("Insights", &stats.total_insights.to_string(), ""),
        stat_card("Feedback", &stats.total_feedback.to_string(), ""),
        stat_card("Positive", &format!("{:.2}%", stats.positive_ratio), "pos"),
        stat_card("Negative", &format!("{:.2}%", stats.negative_ratio), "neg"),
        stat_card("Neutral", &format!("{:.2}%", stats.neutral_ratio), "neu"),
        sentiment_meter(view.overall),
        stacked_chart(view.series),
        city_table(view.cities),
        insight_rows("insight", view.insights.items, view.bookmarked, view.return_to),
        render_pager("/survey-dashboard", "", &view.insights),
    );
    render_shell("Survey Dashboard", NavItem::Dashboard, view.user, &body)
}

pub struct Drilldown<'a> {
    pub word: &'a str,
    pub summaries: &'a [InsightSummary],
    pub feedback: &'a [EmployeeInsight],
}

pub struct TopInsightsView<'a> {
    pub user: Option<&'a User>,
    pub positives: &'a [InsightSummary],
    pub negatives: &'a [InsightSummary],
    pub results: Page<'a, &'a InsightSummary>,
    pub search: &'a str,
    pub drilldown: Option<Drilldown<'a>>,
    pub bookmarked: &'a HashSet<String>,
    pub return_to: &'a str,
}

pub fn render_top_insights(view: &TopInsightsView<'_>) -> String {
    let drilldown = view
        .drilldown
        .as_ref()
        .map(|detail| {
            format!(
                r#"<section class="card" id="drilldown">
  <h2>Insight: {}</h2>
  {}
  <h3>Feedback</h3>
  {}
</section>"#,
                escape(detail.word),
                insight_rows("detail", detail.summaries, view.bookmarked, view.return_to),
                feedback_rows(detail.feedback),
            )
        })
        .unwrap_or_default();

    let query = if view.search.trim().is_empty() {
        String::new()
    } else {
        format!("search={}", urlencoding::encode(view.search.trim()))
    };

    let body = format!(
        r#"{drilldown}
<section class="split">
  <div class="card">
    <h2>Most positive</h2>
    {}
  </div>
  <div class="card">
    <h2>Most negative</h2>
    {}
  </div>
</section>
<section class="card">
  <h2>Search insights</h2>
  {}
  {}
  {}
</section>"#,
        insight_rows("top-positive", view.positives, view.bookmarked, view.return_to),
        insight_rows("top-negative", view.negatives, view.bookmarked, view.return_to),
        search_form("/top-insights", view.search),
        insight_rows("result", view.results.items.iter().copied(), view.bookmarked, view.return_to),
        render_pager("/top-insights", &query, &view.results),
    );
    render_shell("Top Insights", NavItem::TopInsights, view.user, &body)
}

#[derive(Debug, Default)]
pub struct FilterOptions {
    pub kotas: Vec<String>,
    pub witels: Vec<String>,
    pub sources: Vec<String>,
}

fn select(name: &str, label: &str, options: &[String], selected: Option<&str>) -> String {
    let mut html = format!(
        r#"<label>{label}<select name="{name}"><option value="">All</option>"#
    );
    for option in options {
        let is_selected = selected.is_some_and(|value| value.eq_ignore_ascii_case(option));
        html.push_str(&format!(
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape(option),
            if is_selected { " selected" } else { "" }
        ));
    }
    html.push_str("</select></label>");
    html
}

fn filter_form(filters: &FilterSet, options: &FilterOptions) -> String {
    let sentiments: Vec<String> = Sentiment::ALL.iter().map(|s| s.as_str().to_string()).collect();
    format!(
        r#"<form class="filters" method="get" action="/smart-analytics">
  <label>Search<input type="search" name="search" value="{}" /></label>
  {}
  {}
  {}
  {}
  <label>From<input type="date" name="date_from" value="{}" /></label>
  <label>To<input type="date" name="date_to" value="{}" /></label>
  <button class="btn-primary" type="submit">Apply</button>
  <a class="btn-ghost" href="/smart-analytics?search=">Reset</a>
</form>"#,
        escape(filters.search.as_deref().unwrap_or("")),
        select(
            "sentiment",
            "Sentiment",
            &sentiments,
            filters.sentiment.map(Sentiment::as_str)
        ),
        select("kota", "Kota", &options.kotas, filters.kota.as_deref()),
        select("witel", "Witel", &options.witels, filters.witel.as_deref()),
        select("source", "Source", &options.sources, filters.source.as_deref()),
        escape(filters.date_from.as_deref().unwrap_or("")),
        escape(filters.date_to.as_deref().unwrap_or("")),
    )
}

fn hidden_filters(filters: &FilterSet) -> String {
    let fields = [
        ("search", filters.search.clone()),
        ("sentiment", filters.sentiment.map(|s| s.as_str().to_string())),
        ("kota", filters.kota.clone()),
        ("witel", filters.witel.clone()),
        ("source", filters.source.clone()),
        ("date_from", filters.date_from.clone()),
        ("date_to", filters.date_to.clone()),
    ];
    fields
        .iter()
        .filter_map(|(name, value)| {
            value.as_ref().map(|value| {
                format!(
                    r#"<input type="hidden" name="{name}" value="{}" />"#,
                    escape(value)
                )
            })
        })
        .collect()
}

pub struct SmartAnalyticsView<'a> {
    pub user: Option<&'a User>,
    pub filters: &'a FilterSet,
    pub options: &'a FilterOptions,
    pub breakdown: &'a SentimentBreakdown,
    pub cities: &'a [CityRow],
    pub rows: Page<'a, &'a EmployeeInsight>,
    pub conclusion: Option<&'a str>,
}

pub fn render_smart_analytics(view: &SmartAnalyticsView<'_>) -> String {
    let conclusion = match view.conclusion {
        Some(text) => format!(r#"<p class="conclusion" data-conclusion="cached">{}</p>"#, escape(text)),
        None => r#"<p class="empty">No conclusion generated for these filters yet.</p>"#.to_string(),
    };
    let query = view.filters.to_query_string();

    let body = format!(
        r#"<section class="card">
  <h2>Filters</h2>
  {}
</section>
<section class="card">
  <h2>Sentiment</h2>
  {}
</section>
<section class="card">
  <div class="card-header">
    <h2>AI conclusion</h2>
    <form class="inline" method="post" action="/smart-analytics/conclusion">
      {}
      <button class="btn-primary" type="submit">Generate conclusion</button>
    </form>
  </div>
  {conclusion}
</section>
<section class="card">
  <h2>By city</h2>
  {}
</section>
<section class="card">
  <h2>Feedback</h2>
  {}
  {}
</section>"#,
        filter_form(view.filters, view.options),
        sentiment_meter(view.breakdown),
        hidden_filters(view.filters),
        city_table(view.cities),
        feedback_rows(view.rows.items.iter().copied()),
        render_pager("/smart-analytics", &query, &view.rows),
    );
    render_shell("Smart Analytics", NavItem::SmartAnalytics, view.user, &body)
}

pub struct MyInsightsView<'a> {
    pub user: Option<&'a User>,
    pub bookmarks: Page<'a, &'a Bookmark>,
    pub search: &'a str,
    /// Current summaries keyed by lowercased word.
    pub summaries: &'a HashMap<String, InsightSummary>,
    pub return_to: &'a str,
}

pub fn render_my_insights(view: &MyInsightsView<'_>) -> String {
    let mut rows = String::new();
    for bookmark in view.bookmarks.items {
        let summary = view
            .summaries
            .get(&bookmark.word_insight.trim().to_lowercase());
        let (total, pos, neg) = summary
            .map(|s| {
                (
                    s.total_count.to_string(),
                    format!("{:.2}%", s.positif_percentage),
                    format!("{:.2}%", s.negatif_percentage),
                )
            })
            .unwrap_or_else(|| ("-".into(), "-".into(), "-".into()));
        rows.push_str(&format!(
            r#"<tr data-row="bookmark">
  <td><a href="/top-insights?word={}">{}</a></td>
  <td>{}</td>
  <td>{total}</td>
  <td class="pos">{pos}</td>
  <td class="neg">{neg}</td>
  <td>{}</td>
</tr>"#,
            urlencoding::encode(&bookmark.word_insight),
            escape(&bookmark.word_insight),
            escape(bookmark.note.as_deref().unwrap_or("")),
            bookmark_button(&bookmark.word_insight, true, view.return_to),
        ));
    }
    if rows.is_empty() {
        rows.push_str(r#"<tr><td colspan="6" class="empty">No saved insights yet.</td></tr>"#);
    }
    let query = if view.search.trim().is_empty() {
        String::new()
    } else {
        format!("search={}", urlencoding::encode(view.search.trim()))
    };

    let body = format!(
        r#"<section class="card">
  <h2>My Insights</h2>
  {}
  <table class="data">
    <thead><tr><th>Insight</th><th>Note</th><th>Total</th><th>Positive</th><th>Negative</th><th></th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
  {}
</section>"#,
        search_form("/my-insights", view.search),
        render_pager("/my-insights", &query, &view.bookmarks),
    );
    render_shell("My Insights", NavItem::MyInsights, view.user, &body)
}

pub fn render_settings(user: Option<&User>, config: &AppConfig) -> String {
    let profile = match user {
        Some(user) => format!(
            r#"<dl class="facts">
  <dt>Name</dt><dd>{}</dd>
  <dt>Username</dt><dd>{}</dd>
  <dt>Role</dt><dd>{}</dd>
</dl>"#,
            escape(user.display_name()),
            escape(&user.username),
            escape(user.role.as_deref().unwrap_or("-")),
        ),
        None => r#"<p class="empty">Profile unavailable.</p>"#.to_string(),
    };
    let body = format!(
        r#"<section class="card">
  <h2>Profile</h2>
  {profile}
</section>
<section class="card">
  <h2>Connection</h2>
  <dl class="facts">
    <dt>Insights API</dt><dd>{}</dd>
    <dt>Request timeout</dt><dd>{} ms</dd>
    <dt>Retries</dt><dd>{} (linear, {} ms step)</dd>
    <dt>Cache freshness</dt><dd>{} s</dd>
    <dt>Rows per page</dt><dd>{}</dd>
  </dl>
</section>
<section class="card">
  <h2>Session</h2>
  <form method="post" action="/logout"><button class="btn-danger" type="submit">Sign out</button></form>
</section>"#,
        escape(&config.api_base_url),
        config.request_timeout.as_millis(),
        config.retry_attempts,
        config.retry_delay.as_millis(),
        config.stale_time.as_secs(),
        config.page_size,
    );
    render_shell("Settings", NavItem::Settings, user, &body)
}

pub fn render_chat(user: Option<&User>, history: &[ChatExchange], error: Option<&str>) -> String {
    let mut thread = String::new();
    for exchange in history {
        let sources = if exchange.sources.is_empty() {
            String::new()
        } else {
            let items: String = exchange
                .sources
                .iter()
                .map(|source| format!("<li>{}</li>", escape(source)))
                .collect();
            format!(r#"<ul class="sources">{items}</ul>"#)
        };
        thread.push_str(&format!(
            r#"<div class="bubble question" data-row="chat">{}</div>
<div class="bubble answer">{}{sources}</div>"#,
            escape(&exchange.question),
            escape(&exchange.answer),
        ));
    }
    if thread.is_empty() {
        thread.push_str(r#"<p class="empty">Ask about employee sentiment, cities, or topics.</p>"#);
    }
    let error = error
        .map(|message| format!(r#"<p class="status" data-type="error">{}</p>"#, escape(message)))
        .unwrap_or_default();

    let body = format!(
        r#"<section class="card chat">
  <div class="card-header">
    <h2>Insights assistant</h2>
    <form class="inline" method="post" action="/chat/clear"><button class="btn-ghost" type="submit">Clear</button></form>
  </div>
  <div class="thread">{thread}</div>
  {error}
  <form class="toolbar" method="post" action="/chat">
    <input type="text" name="query" placeholder="Ask a question" required />
    <button class="btn-primary" type="submit">Send</button>
  </form>
</section>"#
    );
    render_shell("Assistant", NavItem::Chat, user, &body)
}

/// Fallback page shown when a request fails for anything but an expired session.
pub fn render_error(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"<section class="card narrow" data-error="{}">
  <h2>Something went wrong</h2>
  <p class="status" data-type="error">{}</p>
  <div class="actions">
    <button class="btn-primary" type="button" onclick="window.location.reload()">Try again</button>
    <a class="btn-ghost" href="/">Reload app</a>
    <a class="btn-ghost" href="/survey-dashboard">Home</a>
  </div>
</section>"#,
        status.as_u16(),
        escape(message)
    );
    render_bare(&body)
}

const STYLE: &str = r#"<style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f5f8;
      --bg-2: #d7e3f4;
      --ink: #23272f;
      --accent: #e2463b;
      --accent-2: #2f4858;
      --pos: #2d9a5b;
      --neg: #d6453d;
      --neu: #9aa3ad;
      --card: rgba(255, 255, 255, 0.92);
      --shadow: 0 18px 48px rgba(47, 72, 88, 0.14);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #eef2f7 60%, #f8f9fb 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    header.top {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
      padding: 18px 32px;
      background: var(--card);
      box-shadow: var(--shadow);
    }

    h1, h2 { font-family: "Fraunces", "Georgia", serif; font-weight: 600; margin: 0 0 12px; }
    h1 { font-size: 1.6rem; margin: 0; }
    h2 { font-size: 1.2rem; }

    nav.main { display: flex; flex-wrap: wrap; gap: 6px; }
    .nav-link { padding: 8px 14px; border-radius: 999px; color: #5f5c57; text-decoration: none; font-weight: 600; }
    .nav-link.active { background: var(--accent-2); color: white; }
    .who { display: flex; align-items: center; gap: 10px; color: #5f5c57; }

    main { width: min(1180px, 100%); margin: 0 auto; padding: 28px 18px 48px; display: grid; gap: 20px; }
    .card { background: var(--card); border-radius: 20px; padding: 22px; box-shadow: var(--shadow); }
    .card.narrow { width: min(420px, 100%); margin: 80px auto; }
    .card-header { display: flex; justify-content: space-between; align-items: center; gap: 12px; }
    .panel { display: grid; grid-template-columns: repeat(auto-fit, minmax(170px, 1fr)); gap: 16px; }
    .split { display: grid; grid-template-columns: repeat(auto-fit, minmax(420px, 1fr)); gap: 20px; }

    .stat { background: white; border-radius: 18px; padding: 18px; border: 1px solid rgba(47, 72, 88, 0.08); display: grid; gap: 8px; }
    .stat .label { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.12em; color: #8b857d; }
    .stat .value { font-size: 1.6rem; font-weight: 600; color: var(--accent-2); }

    .pos { color: var(--pos); }
    .neg { color: var(--neg); }
    .neu { color: var(--neu); }
    .stat .value.pos { color: var(--pos); }
    .stat .value.neg { color: var(--neg); }
    .stat .value.neu { color: var(--neu); }
    .badge { padding: 2px 10px; border-radius: 999px; background: rgba(47, 72, 88, 0.08); font-size: 0.85rem; }

    .bar-pos { fill: var(--pos); }
    .bar-neg { fill: var(--neg); }
    .bar-neu { fill: var(--neu); }
    .meter { width: 100%; height: 22px; border-radius: 11px; display: block; }
    .legend { display: flex; flex-wrap: wrap; gap: 18px; margin-top: 10px; font-weight: 600; }
    .chart { width: 100%; display: block; }
    .chart-label { fill: #7a746d; font-size: 11px; }

    table.data { width: 100%; border-collapse: collapse; font-size: 0.95rem; }
    table.data th { text-align: left; color: #8b857d; font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.08em; padding: 8px; }
    table.data td { padding: 10px 8px; border-top: 1px solid rgba(47, 72, 88, 0.08); vertical-align: top; }
    table.data a { color: var(--accent-2); }

    .toolbar, .filters { display: flex; flex-wrap: wrap; gap: 10px; align-items: end; margin-bottom: 14px; }
    .filters label, .stack label { display: grid; gap: 4px; font-size: 0.85rem; color: #6b645d; }
    .stack { display: grid; gap: 14px; }
    input, select { font: inherit; padding: 9px 12px; border-radius: 12px; border: 1px solid rgba(47, 72, 88, 0.2); background: white; }
    form.inline { display: inline; margin: 0; }

    button, .btn-ghost { appearance: none; border: none; border-radius: 999px; padding: 10px 16px; font: inherit; font-weight: 600; cursor: pointer; text-decoration: none; }
    .btn-primary { background: var(--accent-2); color: white; }
    .btn-danger { background: var(--accent); color: white; }
    .btn-ghost { background: rgba(47, 72, 88, 0.08); color: var(--accent-2); }
    .btn-ghost[data-bookmarked="true"] { background: #ffe9b8; }
    .actions { display: flex; flex-wrap: wrap; gap: 10px; }

    .pager { display: flex; justify-content: space-between; align-items: center; margin-top: 14px; }
    .pager-link { padding: 8px 14px; border-radius: 999px; background: rgba(47, 72, 88, 0.08); color: var(--accent-2); text-decoration: none; font-weight: 600; }
    .pager-link.disabled { opacity: 0.4; cursor: default; }
    .pager-status { color: #6b645d; font-size: 0.9rem; }

    .thread { display: grid; gap: 10px; margin-bottom: 14px; }
    .bubble { padding: 12px 16px; border-radius: 16px; max-width: 80%; white-space: pre-wrap; }
    .bubble.question { justify-self: end; background: var(--accent-2); color: white; }
    .bubble.answer { justify-self: start; background: white; border: 1px solid rgba(47, 72, 88, 0.1); }
    .sources { margin: 8px 0 0; padding-left: 18px; font-size: 0.85rem; color: #6b645d; }

    .conclusion { white-space: pre-wrap; line-height: 1.5; }
    .facts { display: grid; grid-template-columns: max-content 1fr; gap: 8px 18px; }
    .facts dt { color: #8b857d; }
    .facts dd { margin: 0; }
    .status { font-size: 0.95rem; color: #6b645d; min-height: 1.2em; }
    .status[data-type="error"] { color: #c63b2b; }
    .empty { color: #8b857d; }
  </style>"#;

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Employee Insights</title>
  {{STYLE}}
</head>
<body>
  <header class="top">
    <h1>Employee Insights</h1>
    <nav class="main">{{NAV}}</nav>
    <div class="who">
      <span>{{USER}}</span>
      <form class="inline" method="post" action="/logout"><button class="btn-ghost" type="submit">Sign out</button></form>
    </div>
  </header>
  <main>
    {{BODY}}
  </main>
</body>
</html>
"#;

const BARE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Employee Insights</title>
  {{STYLE}}
</head>
<body>
  <main>
    {{BODY}}
  </main>
</body>
</html>
"#;
