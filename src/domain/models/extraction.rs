//! Structured information extracted from a free-text request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse record of well-known fields pulled out of a request.
///
/// Produced fresh per request by the router's extractors; never persisted on
/// its own. Anything matched generically (raw dates, percentages, monetary
/// amounts) lands in `additional_context`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInformation {
    /// Issuing entity, e.g. "Global Finance Inc"
    pub issuer: Option<String>,
    /// Product name, e.g. "autocallable note"
    pub product_name: Option<String>,
    /// Underlying index or asset, e.g. "S&P 500"
    pub underlying_asset: Option<String>,
    /// ISO currency code
    pub currency: Option<String>,
    /// Principal amount as written, e.g. "$10,000"
    pub principal_amount: Option<String>,
    /// Issue/settlement date as written
    pub issue_date: Option<String>,
    /// Maturity date as written
    pub maturity_date: Option<String>,
    /// Governing jurisdiction
    pub jurisdiction: Option<String>,
    /// Unclassified matches: dates, percentages, monetary amounts
    #[serde(default)]
    pub additional_context: HashMap<String, serde_json::Value>,
}

impl ExtractedInformation {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens the populated typed fields into a string-keyed map.
    ///
    /// `additional_context` is included under its own key so downstream
    /// consumers see one map, matching the `RoutingDecision.extracted_data`
    /// shape.
    pub fn to_map(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        let fields = [
            ("issuer", &self.issuer),
            ("product_name", &self.product_name),
            ("underlying_asset", &self.underlying_asset),
            ("currency", &self.currency),
            ("principal_amount", &self.principal_amount),
            ("issue_date", &self.issue_date),
            ("maturity_date", &self.maturity_date),
            ("jurisdiction", &self.jurisdiction),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                map.insert(name.to_string(), serde_json::Value::String(v.clone()));
            }
        }
        if !self.additional_context.is_empty() {
            map.insert(
                "additional_context".to_string(),
                serde_json::Value::Object(
                    self.additional_context
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
            );
        }
        map
    }

    /// Number of populated typed fields.
    pub fn field_count(&self) -> usize {
        [
            self.issuer.is_some(),
            self.product_name.is_some(),
            self.underlying_asset.is_some(),
            self.currency.is_some(),
            self.principal_amount.is_some(),
            self.issue_date.is_some(),
            self.maturity_date.is_some(),
            self.jurisdiction.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_map_skips_unset_fields() {
        let info = ExtractedInformation {
            issuer: Some("Global Finance Inc".to_string()),
            currency: Some("USD".to_string()),
            ..Default::default()
        };

        let map = info.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("issuer"), Some(&json!("Global Finance Inc")));
        assert!(!map.contains_key("product_name"));
    }

    #[test]
    fn test_to_map_includes_additional_context() {
        let mut info = ExtractedInformation::new();
        info.additional_context
            .insert("percentages".to_string(), json!(["5.0%"]));

        let map = info.to_map();
        assert_eq!(
            map.get("additional_context"),
            Some(&json!({"percentages": ["5.0%"]}))
        );
    }

    #[test]
    fn test_field_count() {
        let mut info = ExtractedInformation::new();
        assert_eq!(info.field_count(), 0);
        info.issuer = Some("A".to_string());
        info.maturity_date = Some("2030-01-01".to_string());
        assert_eq!(info.field_count(), 2);
    }
}
