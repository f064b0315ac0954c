//! Upstream resource records
//!
//! Typed views over the JSON the upstream security API returns. The proxy
//! handlers relay upstream bodies verbatim; these records are only used where
//! the dashboard computes something itself. Every field is optional or
//! defaulted so a partially populated payload still decodes.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decision identifier as sent by the browser (numeric or string)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecisionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Key/value entry in an alert event's `meta` list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Event attached to an alert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Vec<MetaEntry>,
}

/// Alert source block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_name: Option<String>,
}

/// Decision summary embedded in an alert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Security alert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AlertSource>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decisions: Vec<AlertDecision>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<AlertEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

impl Alert {
    /// Offending IP: `source.ip`, then `source.value`, then the first decision's value.
    pub fn source_ip(&self) -> Option<&str> {
        let source = self.source.as_ref();
        non_empty(source.and_then(|s| s.ip.as_ref()))
            .or_else(|| non_empty(source.and_then(|s| s.value.as_ref())))
            .or_else(|| non_empty(self.decisions.first().and_then(|d| d.value.as_ref())))
    }

    /// Value of `key` in the first event's meta list
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.events
            .first()?
            .meta
            .iter()
            .find(|m| m.key == key)
            .and_then(|m| non_empty(m.value.as_ref()))
    }

    /// AS organisation, falling back to the AS number
    pub fn asn(&self) -> Option<&str> {
        self.meta("ASNOrg").or_else(|| self.meta("ASNNumber"))
    }

    /// Engine (machine) that raised the alert
    pub fn machine(&self) -> Option<&str> {
        self.meta("machine")
    }

    /// Raw `start_at`, else `stop_at`
    pub fn timestamp(&self) -> Option<&str> {
        non_empty(self.start_at.as_ref()).or_else(|| non_empty(self.stop_at.as_ref()))
    }

    /// [`Alert::timestamp`] parsed as RFC 3339
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Number of events, preferring the upstream's own count
    pub fn event_count(&self) -> u64 {
        self.events_count.unwrap_or(self.events.len() as u64)
    }
}

/// Enrichment attached to a decision
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn_org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn_number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Remediation decision (ban, captcha, throttle, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub simulated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DecisionMetadata>,
}

impl Decision {
    /// Display status: simulated decisions are not enforced
    pub fn status(&self) -> &'static str {
        if self.simulated {
            "Simulated"
        } else {
            "Active"
        }
    }

    pub fn asn_org(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| non_empty(m.asn_org.as_ref()))
    }

    /// Regional-indicator flag for the decision's country, if known
    pub fn country_flag(&self) -> Option<String> {
        let iso = self.metadata.as_ref()?.iso_code.as_deref()?;
        iso_to_flag(iso)
    }
}

/// Convert an ISO 3166-1 alpha-2 code ("FR") to its flag emoji.
pub fn iso_to_flag(iso: &str) -> Option<String> {
    if iso.len() != 2 || !iso.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    iso.to_ascii_uppercase()
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

/// Allowlisted IP
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowlistEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Alert preview carried by the statistics endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentAlert {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RecentAlert {
    /// Normalize into an [`Alert`] so previews and full alerts render alike
    pub fn into_alert(self, index: usize) -> Alert {
        Alert {
            id: Some(index as i64),
            scenario: self.name,
            decisions: vec![AlertDecision {
                value: self.ip,
                kind: None,
            }],
            stop_at: self.timestamp,
            ..Default::default()
        }
    }
}

/// Summary counters from the statistics endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, deserialize_with = "null_as_default", alias = "alertsTotal")]
    pub total_alerts: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_decisions: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked_ips: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_recent_alerts: Option<Vec<RecentAlert>>,
}

/// Decode `body[field]` as a list, skipping elements that do not fit `T`.
///
/// A missing field or a non-array value yields an empty list.
pub fn decode_list<T: DeserializeOwned>(body: &Value, field: &str) -> Vec<T> {
    match body.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode the statistics body, tolerating unexpected shapes.
pub fn decode_statistics(body: &Value) -> Statistics {
    serde_json::from_value(body.clone()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Statistics payload did not decode - using defaults");
        Statistics::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_ip_fallback_chain() {
        let alert: Alert = serde_json::from_value(json!({
            "source": { "ip": "1.1.1.1", "value": "2.2.2.2" },
            "decisions": [{ "value": "3.3.3.3" }]
        }))
        .unwrap();
        assert_eq!(alert.source_ip(), Some("1.1.1.1"));

        let alert: Alert = serde_json::from_value(json!({
            "source": { "ip": "", "value": "2.2.2.2" },
            "decisions": [{ "value": "3.3.3.3" }]
        }))
        .unwrap();
        assert_eq!(alert.source_ip(), Some("2.2.2.2"));

        let alert: Alert = serde_json::from_value(json!({
            "decisions": [{ "value": "3.3.3.3" }]
        }))
        .unwrap();
        assert_eq!(alert.source_ip(), Some("3.3.3.3"));

        let alert: Alert = serde_json::from_value(json!({})).unwrap();
        assert_eq!(alert.source_ip(), None);
    }

    #[test]
    fn test_meta_lookup_uses_first_event() {
        let alert: Alert = serde_json::from_value(json!({
            "events": [
                { "meta": [
                    { "key": "ASNNumber", "value": "16276" },
                    { "key": "machine", "value": "edge-01" }
                ]},
                { "meta": [{ "key": "ASNOrg", "value": "ignored" }] }
            ]
        }))
        .unwrap();

        assert_eq!(alert.asn(), Some("16276"));
        assert_eq!(alert.machine(), Some("edge-01"));
        assert_eq!(alert.meta("ASNOrg"), None);
        assert_eq!(alert.event_count(), 2);
    }

    #[test]
    fn test_occurred_at_prefers_start() {
        let alert: Alert = serde_json::from_value(json!({
            "start_at": "2026-10-03T10:00:00Z",
            "stop_at": "2026-10-04T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            alert.occurred_at().map(|d| d.to_rfc3339()),
            Some("2026-10-03T10:00:00+00:00".to_string())
        );

        let alert: Alert = serde_json::from_value(json!({ "stop_at": "garbage" })).unwrap();
        assert!(alert.occurred_at().is_none());
    }

    #[test]
    fn test_decision_status_and_flag() {
        let decision: Decision = serde_json::from_value(json!({
            "id": 7,
            "value": "5.6.7.8",
            "type": "ban",
            "simulated": true,
            "metadata": { "asnOrg": "OVH", "isoCode": "fr" }
        }))
        .unwrap();

        assert_eq!(decision.status(), "Simulated");
        assert_eq!(decision.kind.as_deref(), Some("ban"));
        assert_eq!(decision.asn_org(), Some("OVH"));
        assert_eq!(decision.country_flag().as_deref(), Some("\u{1F1EB}\u{1F1F7}"));
    }

    #[test]
    fn test_iso_to_flag_rejects_bad_codes() {
        assert!(iso_to_flag("FRA").is_none());
        assert!(iso_to_flag("1A").is_none());
        assert!(iso_to_flag("").is_none());
    }

    #[test]
    fn test_statistics_alias_and_previews() {
        let stats = decode_statistics(&json!({
            "alertsTotal": 42,
            "activeDecisions": 3,
            "topRecentAlerts": [{ "name": "ssh-bf", "ip": "9.9.9.9", "timestamp": "2026-10-01T00:00:00Z" }]
        }));

        assert_eq!(stats.total_alerts, 42);
        assert_eq!(stats.active_decisions, 3);
        assert_eq!(stats.blocked_ips, 0);
        assert!(stats.success_rate.is_none());

        let alert = stats.top_recent_alerts.unwrap().remove(0).into_alert(0);
        assert_eq!(alert.id, Some(0));
        assert_eq!(alert.scenario.as_deref(), Some("ssh-bf"));
        assert_eq!(alert.source_ip(), Some("9.9.9.9"));
        assert_eq!(alert.stop_at.as_deref(), Some("2026-10-01T00:00:00Z"));
    }

    #[test]
    fn test_decode_list_skips_bad_elements() {
        let body = json!({ "decisions": [{ "value": "1.1.1.1" }, 17, { "value": "2.2.2.2" }] });
        let decisions: Vec<Decision> = decode_list(&body, "decisions");
        assert_eq!(decisions.len(), 2);

        let missing: Vec<Decision> = decode_list(&json!({ "decisions": null }), "decisions");
        assert!(missing.is_empty());
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let body = json!({ "alerts": [
            { "id": 1, "scenario": "ssh-bf", "decisions": null, "events": null, "source": { "ip": "1.1.1.1" } },
            { "id": 2, "scenario": "http-probing", "events": [{ "meta": null }] }
        ]});
        let alerts: Vec<Alert> = decode_list(&body, "alerts");
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].decisions.is_empty());
        assert_eq!(alerts[0].source_ip(), Some("1.1.1.1"));
        assert_eq!(alerts[1].machine(), None);

        let decision: Decision =
            serde_json::from_value(json!({ "value": null, "simulated": null, "type": "ban" })).unwrap();
        assert_eq!(decision.value, "");
        assert_eq!(decision.status(), "Active");
    }

    #[test]
    fn test_statistics_null_counter_keeps_the_rest() {
        let stats = decode_statistics(&json!({
            "totalAlerts": 12,
            "activeDecisions": null,
            "blockedIps": 3,
            "topRecentAlerts": [{ "name": "ssh-bf", "ip": "9.9.9.9" }]
        }));

        assert_eq!(stats.total_alerts, 12);
        assert_eq!(stats.active_decisions, 0);
        assert_eq!(stats.blocked_ips, 3);
        assert_eq!(stats.top_recent_alerts.map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_decision_id_round_trips_shape() {
        let ids: Vec<DecisionId> = serde_json::from_value(json!([1, "abc"])).unwrap();
        assert_eq!(ids[0], DecisionId::Number(1));
        assert_eq!(ids[1].to_string(), "abc");
        assert_eq!(serde_json::to_value(&ids).unwrap(), json!([1, "abc"]));
    }
}
