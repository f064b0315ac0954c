//! Dashboard views
//!
//! Aggregations behind the overview, alerts and decisions pages: top-N
//! breakdowns, per-day series for the current month, search filters and the
//! "load more" window over decisions.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::records::{Alert, Decision, Statistics};

/// Number of entries in each top-N breakdown
pub const TOP_N: usize = 3;

/// Default "load more" page size
pub const DEFAULT_VISIBLE: usize = 10;

/// A named count in a breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Count items by key and keep the `n` largest groups.
///
/// Items without a key are skipped. Ties keep first-seen order.
pub fn top_counts<'a, T, F>(items: &'a [T], key: F, n: usize) -> Vec<NameCount>
where
    F: Fn(&'a T) -> Option<&'a str>,
{
    let mut order: Vec<NameCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let Some(k) = key(item) else { continue };
        match index.get(k) {
            Some(&i) => order[i].count += 1,
            None => {
                index.insert(k, order.len());
                order.push(NameCount {
                    name: k.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable, so equal counts stay in insertion order
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(n);
    order
}

/// Day key used by the charts (`YYYY-M-D`, unpadded)
pub fn day_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Every day of the month containing `today`
pub fn month_days(today: NaiveDate) -> Vec<NaiveDate> {
    let first = today.with_day(1).unwrap_or(today);
    first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .collect()
}

/// One point of a daily series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub value: usize,
}

/// One day of the per-source series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSeriesRow {
    pub date: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, usize>,
}

/// When the alert happened. Undated alerts count as `now`; an unparsable
/// timestamp drops the alert from the series.
fn alert_day(alert: &Alert, now: DateTime<Utc>) -> Option<NaiveDate> {
    match (alert.timestamp(), alert.occurred_at()) {
        (_, Some(at)) => Some(at.date_naive()),
        (None, None) => Some(now.date_naive()),
        (Some(_), None) => None,
    }
}

fn in_month(day: NaiveDate, today: NaiveDate) -> bool {
    day.year() == today.year() && day.month() == today.month()
}

/// Alerts per day over the current month
pub fn daily_series(alerts: &[Alert], now: DateTime<Utc>) -> Vec<DailyCount> {
    let today = now.date_naive();
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();

    for alert in alerts {
        let Some(day) = alert_day(alert, now) else { continue };
        if in_month(day, today) {
            *per_day.entry(day).or_default() += 1;
        }
    }

    month_days(today)
        .into_iter()
        .map(|d| DailyCount {
            date: day_key(d),
            value: per_day.get(&d).copied().unwrap_or(0),
        })
        .collect()
}

/// Alerts per day over the current month, split by the given source IPs
pub fn source_series(alerts: &[Alert], keys: &[String], now: DateTime<Utc>) -> Vec<SourceSeriesRow> {
    let today = now.date_naive();
    let mut per_day: HashMap<(NaiveDate, &str), usize> = HashMap::new();

    for alert in alerts {
        let Some(ip) = alert.source_ip() else { continue };
        if !keys.iter().any(|k| k == ip) {
            continue;
        }
        let Some(day) = alert_day(alert, now) else { continue };
        if in_month(day, today) {
            *per_day.entry((day, ip)).or_default() += 1;
        }
    }

    month_days(today)
        .into_iter()
        .map(|d| SourceSeriesRow {
            date: day_key(d),
            counts: keys
                .iter()
                .map(|k| (k.clone(), per_day.get(&(d, k.as_str())).copied().unwrap_or(0)))
                .collect(),
        })
        .collect()
}

/// Free-text match used by the alerts table
pub fn alert_matches(alert: &Alert, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    let lower_contains = |field: &Option<String>| {
        field
            .as_deref()
            .map(|s| s.to_lowercase().contains(&needle))
            .unwrap_or(false)
    };

    lower_contains(&alert.scenario)
        || alert.source_ip().map(|ip| ip.contains(search)).unwrap_or(false)
        || lower_contains(&alert.message)
}

/// Everything the alerts page charts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInsights {
    pub top_source_ips: Vec<NameCount>,
    pub top_asns: Vec<NameCount>,
    pub top_engines: Vec<NameCount>,
    pub top_scenarios: Vec<NameCount>,
    pub daily: Vec<DailyCount>,
    pub source_series: Vec<SourceSeriesRow>,
    pub alerts: Vec<Alert>,
    pub total: usize,
}

impl AlertInsights {
    /// Build the breakdowns over `alerts`; the listed alerts are filtered by `search`.
    pub fn build(alerts: Vec<Alert>, search: &str, now: DateTime<Utc>) -> Self {
        let top_source_ips = top_counts(&alerts, Alert::source_ip, TOP_N);
        let top_asns = top_counts(&alerts, Alert::asn, TOP_N);
        let top_engines = top_counts(&alerts, Alert::machine, TOP_N);
        let top_scenarios = top_counts(&alerts, |a| a.scenario.as_deref().filter(|s| !s.is_empty()), TOP_N);

        let keys: Vec<String> = top_source_ips.iter().map(|t| t.name.clone()).collect();
        let daily = daily_series(&alerts, now);
        let source_series = source_series(&alerts, &keys, now);
        let total = alerts.len();

        let alerts = alerts
            .into_iter()
            .filter(|a| alert_matches(a, search))
            .collect();

        Self {
            top_source_ips,
            top_asns,
            top_engines,
            top_scenarios,
            daily,
            source_series,
            alerts,
            total,
        }
    }
}

/// Filters offered by the decisions table
#[derive(Debug, Clone, Default)]
pub struct DecisionFilter {
    pub search: String,
    /// Decision type; `None` or `All` disables the filter
    pub kind: Option<String>,
    /// `Active`/`Simulated`; `None` or `All` disables the filter
    pub status: Option<String>,
}

fn selected(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .filter(|v| !v.is_empty() && *v != "All")
}

impl DecisionFilter {
    pub fn matches(&self, decision: &Decision) -> bool {
        let needle = self.search.to_lowercase();
        let lower_contains =
            |field: Option<&str>| field.map(|s| s.to_lowercase().contains(&needle)).unwrap_or(false);

        let matches_search = decision.value.contains(&self.search)
            || lower_contains(decision.scenario.as_deref())
            || lower_contains(decision.asn_org())
            || lower_contains(decision.origin.as_deref());

        let matches_kind = match selected(&self.kind) {
            Some(kind) => decision.kind.as_deref() == Some(kind),
            None => true,
        };

        let matches_status = match selected(&self.status) {
            Some(status) => decision.status() == status,
            None => true,
        };

        matches_search && matches_kind && matches_status
    }
}

/// Counters shown above the decisions table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    pub bans: usize,
    pub captchas: usize,
    pub active: usize,
    pub simulated: usize,
}

impl DecisionStats {
    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let count_kind = |kind: &str| {
            decisions
                .iter()
                .filter(|d| d.kind.as_deref() == Some(kind))
                .count()
        };
        Self {
            bans: count_kind("ban"),
            captchas: count_kind("captcha"),
            active: decisions.len(),
            simulated: decisions.iter().filter(|d| d.simulated).count(),
        }
    }
}

/// Filtered decisions with a "load more" window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionView {
    pub decisions: Vec<Decision>,
    pub total: usize,
    pub visible: usize,
    pub can_load_more: bool,
    pub stats: DecisionStats,
}

impl DecisionView {
    pub fn build(decisions: Vec<Decision>, filter: &DecisionFilter, visible: usize) -> Self {
        let stats = DecisionStats::from_decisions(&decisions);
        let filtered: Vec<Decision> = decisions.into_iter().filter(|d| filter.matches(d)).collect();
        let total = filtered.len();

        Self {
            decisions: filtered.into_iter().take(visible).collect(),
            total,
            visible,
            can_load_more: visible < total,
            stats,
        }
    }
}

/// Direction hint for an overview card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Increase,
    Decrease,
}

/// Overview stat card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub name: &'static str,
    pub value: String,
    pub change_type: ChangeType,
}

/// Cards for the overview page; success rate only when the upstream reports it
pub fn overview_cards(stats: &Statistics) -> Vec<StatCard> {
    let mut cards = vec![
        StatCard {
            name: "Total Alerts",
            value: stats.total_alerts.to_string(),
            change_type: ChangeType::Increase,
        },
        StatCard {
            name: "Active Decisions",
            value: stats.active_decisions.to_string(),
            change_type: ChangeType::Increase,
        },
        StatCard {
            name: "Blocked IPs",
            value: stats.blocked_ips.to_string(),
            change_type: ChangeType::Decrease,
        },
    ];

    if let Some(rate) = stats.success_rate {
        cards.push(StatCard {
            name: "Success Rate",
            value: format!("{rate}%"),
            change_type: ChangeType::Increase,
        });
    }

    cards
}
