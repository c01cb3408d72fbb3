//! Intent router: maps free text to a routing decision.
//!
//! Heuristic by design. Keyword scoring plus a set of independent regex
//! field extractors; not a learned model and not trying to be one.

use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::models::{
    AgentType, ExtractedInformation, RoutingDecision, Subtask, SubtaskPriority,
};
use crate::services::config::RouterConfig;

/// Extra confidence granted per extracted key field.
const FIELD_BOOSTS: [(&str, f64); 5] = [
    ("issuer", 0.10),
    ("product_name", 0.10),
    ("underlying_asset", 0.10),
    ("currency", 0.05),
    ("principal_amount", 0.05),
];

/// Compiled field extractors.
///
/// Each extractor is a pure function over the request text: it either
/// produces one typed field or contributes to `additional_context`. None may
/// panic on any input.
pub struct FieldExtractor {
    issued_by: Regex,
    issuer_label: Regex,
    product_name: Regex,
    known_index: Regex,
    linked_to: Regex,
    currency_code: Regex,
    currency_word: Regex,
    principal_before: Regex,
    principal_after: Regex,
    issue_date: Regex,
    maturity_date: Regex,
    jurisdiction_phrase: Regex,
    known_jurisdiction: Regex,
    any_date: Regex,
    percentage: Regex,
    monetary: Regex,
}

impl FieldExtractor {
    /// Compiles the extractor patterns.
    pub fn new() -> Self {
        const DATE: &str = r"(?:(?i:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}|\d{4}-\d{2}-\d{2})";
        let dated = |prefix: &str| {
            Regex::new(&format!(r"{prefix}:?\s+({DATE})")).unwrap()
        };

        Self {
            issued_by: Regex::new(
                r"(?i:issued\s+by)\s+([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*)*)",
            )
            .unwrap(),
            issuer_label: Regex::new(
                r"(?i:issuer)(?i:\s+is|:)\s+([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*)*)",
            )
            .unwrap(),
            product_name: Regex::new(
                r"(?i)\b((?:autocallable|principal[ -]protected|index[ -]linked|market[ -]linked|structured|callable|barrier|reverse convertible)\s+notes?)\b",
            )
            .unwrap(),
            known_index: Regex::new(
                r"(?i)\b(S&P\s*/?\s*TSX(?:\s+Composite)?|S&P\s*500|SP\s*500|NASDAQ(?:-100)?|Dow\s+Jones(?:\s+Industrial\s+Average)?|Russell\s*2000|EURO\s+STOXX\s*50|Nikkei\s*225)\b",
            )
            .unwrap(),
            linked_to: Regex::new(
                r"(?i:linked\s+to|based\s+on|tracking)\s+(?:the\s+)?([A-Z][\w&/. -]+?)(?:\s+(?i:index)\b|[,.]|$)",
            )
            .unwrap(),
            currency_code: Regex::new(r"\b(USD|CAD|EUR|GBP|JPY|CHF|AUD)\b").unwrap(),
            currency_word: Regex::new(
                r"(?i)\b(U\.?S\.?|Canadian|Australian)\s+dollars?\b|(?i)\beuros?\b",
            )
            .unwrap(),
            principal_before: Regex::new(
                r"(?i)principal(?:\s+amount)?\s+of\s+\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
            )
            .unwrap(),
            principal_after: Regex::new(
                r"(?i)\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*(?:in\s+)?(?:principal|notional)",
            )
            .unwrap(),
            issue_date: dated(r"(?i:issue|issuance|settlement)\s+(?i:date)(?:\s+(?i:of|on|is))?"),
            maturity_date: dated(r"(?i:matur)(?i:es|ing|ity)(?:\s+(?i:date))?(?:\s+(?i:of|on|is))?"),
            jurisdiction_phrase: Regex::new(
                r"(?i:under\s+the\s+laws\s+of|governed\s+by(?:\s+the\s+laws\s+of)?|in\s+the\s+province\s+of)\s+([A-Z][A-Za-z ]+?)(?:[,.]|$)",
            )
            .unwrap(),
            known_jurisdiction: Regex::new(
                r"\b(Ontario|Quebec|British Columbia|Alberta|Canada|United States|New York|Delaware|Luxembourg|England)\b",
            )
            .unwrap(),
            any_date: Regex::new(&format!(r"\b{DATE}\b")).unwrap(),
            percentage: Regex::new(r"\b[0-9]+(?:\.[0-9]+)?\s*%").unwrap(),
            monetary: Regex::new(
                r"\$\s*[0-9][0-9,]*(?:\.[0-9]+)?(?:\s*(?i:million|billion|thousand))?",
            )
            .unwrap(),
        }
    }

    /// Runs every extractor over the text.
    pub fn extract(&self, text: &str) -> ExtractedInformation {
        let mut info = ExtractedInformation::new();

        info.issuer = self.extract_issuer(text);
        info.product_name = self.extract_product_name(text);
        info.underlying_asset = self.extract_underlying_asset(text);
        info.currency = self.extract_currency(text);
        info.principal_amount = self.extract_principal_amount(text);
        info.issue_date = self.capture(&self.issue_date, text);
        info.maturity_date = self.capture(&self.maturity_date, text);
        info.jurisdiction = self.extract_jurisdiction(text);

        self.collect_context(text, &mut info);
        info
    }

    fn capture(&self, pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn extract_issuer(&self, text: &str) -> Option<String> {
        self.capture(&self.issued_by, text)
            .or_else(|| self.capture(&self.issuer_label, text))
    }

    fn extract_product_name(&self, text: &str) -> Option<String> {
        self.capture(&self.product_name, text)
            .map(|name| name.to_lowercase())
    }

    fn extract_underlying_asset(&self, text: &str) -> Option<String> {
        self.capture(&self.known_index, text)
            .or_else(|| self.capture(&self.linked_to, text))
    }

    fn extract_currency(&self, text: &str) -> Option<String> {
        if let Some(code) = self.capture(&self.currency_code, text) {
            return Some(code);
        }
        let matched = self.currency_word.find(text)?.as_str().to_lowercase();
        if matched.starts_with("euro") {
            Some("EUR".to_string())
        } else if matched.starts_with("canadian") {
            Some("CAD".to_string())
        } else if matched.starts_with("australian") {
            Some("AUD".to_string())
        } else {
            Some("USD".to_string())
        }
    }

    fn extract_principal_amount(&self, text: &str) -> Option<String> {
        self.capture(&self.principal_before, text)
            .or_else(|| self.capture(&self.principal_after, text))
            .map(|amount| format!("${amount}"))
    }

    fn extract_jurisdiction(&self, text: &str) -> Option<String> {
        self.capture(&self.jurisdiction_phrase, text)
            .or_else(|| self.capture(&self.known_jurisdiction, text))
    }

    fn collect_context(&self, text: &str, info: &mut ExtractedInformation) {
        let dates: Vec<serde_json::Value> = self
            .any_date
            .find_iter(text)
            .map(|m| serde_json::Value::String(m.as_str().to_string()))
            .collect();
        if !dates.is_empty() {
            info.additional_context
                .insert("dates".to_string(), serde_json::Value::Array(dates));
        }

        let percentages: Vec<serde_json::Value> = self
            .percentage
            .find_iter(text)
            .map(|m| serde_json::Value::String(m.as_str().to_string()))
            .collect();
        if !percentages.is_empty() {
            info.additional_context
                .insert("percentages".to_string(), serde_json::Value::Array(percentages));
        }

        let amounts: Vec<serde_json::Value> = self
            .monetary
            .find_iter(text)
            .map(|m| serde_json::Value::String(m.as_str().to_string()))
            .collect();
        if !amounts.is_empty() {
            info.additional_context.insert(
                "monetary_amounts".to_string(),
                serde_json::Value::Array(amounts),
            );
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless intent router.
pub struct IntentRouter {
    config: RouterConfig,
    extractor: FieldExtractor,
}

impl IntentRouter {
    /// Creates a router with the given thresholds.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            extractor: FieldExtractor::new(),
        }
    }

    /// Creates a router with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(RouterConfig::default())
    }

    /// Analyzes a request and produces a routing decision.
    ///
    /// Always returns a best-effort decision: when no agent scores above the
    /// fallback threshold, the configured default agent is chosen and the
    /// ambiguity is noted in `reasoning`.
    #[instrument(skip(self, text))]
    pub fn analyze(&self, text: &str) -> RoutingDecision {
        let info = self.extractor.extract(text);
        let lower = text.to_lowercase();

        let scores: Vec<(AgentType, f64)> = AgentType::ALL
            .iter()
            .map(|agent| (*agent, score_agent(&lower, *agent)))
            .collect();

        let (top_agent, max_score) = scores
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((self.config.default_agent, 0.0));

        let fallback = max_score < self.config.fallback_threshold;
        let primary_agent = if fallback {
            self.config.default_agent
        } else {
            top_agent
        };

        let secondary_agents: Vec<AgentType> = scores
            .iter()
            .filter(|(agent, score)| {
                *agent != primary_agent && *score > self.config.secondary_threshold
            })
            .map(|(agent, _)| *agent)
            .collect();

        let mut task_decomposition =
            vec![Subtask::for_agent(primary_agent, SubtaskPriority::High)];
        task_decomposition.extend(
            secondary_agents
                .iter()
                .map(|agent| Subtask::for_agent(*agent, SubtaskPriority::Medium)),
        );

        let extracted_data = info.to_map();
        let confidence_score = confidence(max_score, &extracted_data);
        let reasoning = build_reasoning(
            primary_agent,
            max_score,
            fallback,
            self.config.fallback_threshold,
            &extracted_data,
            &secondary_agents,
        );

        debug!(
            primary = %primary_agent,
            confidence = confidence_score,
            secondaries = secondary_agents.len(),
            "routing decision"
        );

        RoutingDecision {
            primary_agent,
            secondary_agents,
            extracted_data,
            confidence_score,
            reasoning,
            task_decomposition,
        }
    }

    /// The thresholds this router was built with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Scores one agent against lowercased request text.
///
/// One point per keyword substring match, one extra point per whole-word
/// phrase match, normalized by keyword count.
fn score_agent(lower_text: &str, agent: AgentType) -> f64 {
    let keywords = agent.capability().keywords;
    let mut points = 0.0;
    for keyword in keywords {
        if lower_text.contains(keyword) {
            points += 1.0;
            if contains_whole_phrase(lower_text, keyword) {
                points += 1.0;
            }
        }
    }
    points / keywords.len() as f64
}

/// Whether `phrase` occurs in `text` bounded by non-alphanumeric characters.
fn contains_whole_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, _)| {
        let before_ok = start == 0
            || text[..start]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric());
        let end = start + phrase.len();
        let after_ok = end == text.len()
            || text[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Base confidence from the top score, plus boosts per extracted key field.
fn confidence(max_score: f64, extracted: &std::collections::HashMap<String, serde_json::Value>) -> f64 {
    let mut confidence = (max_score * 2.0).clamp(0.0, 1.0);
    for (field, boost) in FIELD_BOOSTS {
        if extracted.contains_key(field) {
            confidence += boost;
        }
    }
    confidence.min(1.0)
}

fn build_reasoning(
    primary: AgentType,
    max_score: f64,
    fallback: bool,
    threshold: f64,
    extracted: &std::collections::HashMap<String, serde_json::Value>,
    secondaries: &[AgentType],
) -> String {
    let mut parts = Vec::new();
    if fallback {
        parts.push(format!(
            "No agent scored above {threshold:.2} (best {max_score:.2}); routing is ambiguous, falling back to {primary}"
        ));
    } else {
        parts.push(format!("Selected {primary} with score {max_score:.2}"));
    }

    let mut fields: Vec<&str> = extracted
        .keys()
        .filter(|k| k.as_str() != "additional_context")
        .map(String::as_str)
        .collect();
    fields.sort_unstable();
    if fields.is_empty() {
        parts.push("no structured fields extracted".to_string());
    } else {
        parts.push(format!("extracted fields: {}", fields.join(", ")));
    }

    if !secondaries.is_empty() {
        let tags: Vec<&str> = secondaries.iter().map(AgentType::as_str).collect();
        parts.push(format!("secondary agents: {}", tags.join(", ")));
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> IntentRouter {
        IntentRouter::with_defaults()
    }

    #[test]
    fn test_investor_summary_scenario() {
        let decision = router().analyze(
            "Generate an investor summary for a SP 500 autocallable note issued by Global Finance Inc with $10,000 principal amount",
        );

        assert_eq!(decision.primary_agent, AgentType::InvestorSummary);
        assert_eq!(
            decision.extracted_data.get("issuer"),
            Some(&serde_json::json!("Global Finance Inc"))
        );
        assert_eq!(
            decision.extracted_data.get("product_name"),
            Some(&serde_json::json!("autocallable note"))
        );
        assert!(decision.confidence_score >= 0.5);
        assert!(decision.is_valid());
    }

    #[test]
    fn test_multi_document_request_gets_secondaries() {
        let decision =
            router().analyze("Prepare the investor summary and base shelf prospectus for this note");

        assert!(!decision.secondary_agents.is_empty());
        assert!(decision.task_decomposition.len() >= 2);
        assert_eq!(
            decision.task_decomposition[0].priority,
            SubtaskPriority::High
        );
        assert!(decision.task_decomposition[1..]
            .iter()
            .all(|s| s.priority == SubtaskPriority::Medium));
    }

    #[test]
    fn test_low_score_falls_back_to_default() {
        let decision = router().analyze("hello there, how are you today?");

        assert_eq!(decision.primary_agent, RouterConfig::default().default_agent);
        assert!(decision.secondary_agents.is_empty());
        assert!(decision.reasoning.contains("ambiguous"));
    }

    #[test]
    fn test_secondaries_never_contain_primary() {
        let texts = [
            "investor summary and base shelf prospectus",
            "pricing supplement with final terms and issue price, plus a product supplement",
            "summary overview prospectus pricing supplement product terms",
        ];
        for text in texts {
            let decision = router().analyze(text);
            assert!(!decision.secondary_agents.contains(&decision.primary_agent));
        }
    }

    #[test]
    fn test_confidence_is_clamped() {
        let decision = router().analyze(
            "investor summary overview of key terms in plain language for the investor, \
             autocallable note issued by Acme Capital Corp, CAD, $5,000 principal amount, \
             linked to the S&P 500 index",
        );
        assert!(decision.confidence_score <= 1.0);
        assert!(decision.confidence_score > 0.9);
    }

    #[test]
    fn test_whole_phrase_matching() {
        assert!(contains_whole_phrase("an investor summary now", "investor summary"));
        assert!(contains_whole_phrase("summary", "summary"));
        // Embedded in a larger word does not count as a whole phrase
        assert!(!contains_whole_phrase("summarynote", "summary"));
        assert!(!contains_whole_phrase("presummary", "summary"));
    }

    #[test]
    fn test_extract_issuer_variants() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_issuer("notes issued by Maple Leaf Bank with a 5% coupon"),
            Some("Maple Leaf Bank".to_string())
        );
        assert_eq!(
            extractor.extract_issuer("The issuer is Northern Trust Ltd."),
            Some("Northern Trust Ltd.".to_string())
        );
        assert_eq!(extractor.extract_issuer("no issuer mentioned here"), None);
    }

    #[test]
    fn test_extract_currency_variants() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_currency("denominated in CAD"), Some("CAD".to_string()));
        assert_eq!(
            extractor.extract_currency("payable in Canadian dollars"),
            Some("CAD".to_string())
        );
        assert_eq!(
            extractor.extract_currency("settled in euros"),
            Some("EUR".to_string())
        );
        assert_eq!(extractor.extract_currency("no currency"), None);
    }

    #[test]
    fn test_extract_dates() {
        let extractor = FieldExtractor::new();
        let info = extractor.extract(
            "Issue date of March 15, 2025, maturing on March 15, 2030 with a 7.5% barrier",
        );
        assert_eq!(info.issue_date, Some("March 15, 2025".to_string()));
        assert_eq!(info.maturity_date, Some("March 15, 2030".to_string()));

        let dates = info.additional_context.get("dates").unwrap();
        assert_eq!(dates.as_array().unwrap().len(), 2);
        let percentages = info.additional_context.get("percentages").unwrap();
        assert_eq!(percentages.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extractors_never_panic_on_odd_input() {
        let extractor = FieldExtractor::new();
        for text in ["", "$", "issued by", "((((", "日本語のテキスト", "$ principal"] {
            let _ = extractor.extract(text);
        }
    }
}
