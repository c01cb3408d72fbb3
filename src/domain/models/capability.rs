//! Agent types and their static capability table.
//!
//! Agent dispatch is a closed enum rather than string matching: adding a
//! document type means adding a variant and a capability row.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of document-generation agent types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    /// Plain-language summary for retail investors
    InvestorSummary,
    /// Base shelf prospectus establishing the issuance program
    BaseShelfProspectus,
    /// Product supplement describing the note structure
    ProductSupplement,
    /// Pricing supplement with the final economic terms
    PricingSupplement,
}

impl AgentType {
    /// Every registered agent type, in canonical plan order.
    pub const ALL: [AgentType; 4] = [
        AgentType::InvestorSummary,
        AgentType::BaseShelfProspectus,
        AgentType::ProductSupplement,
        AgentType::PricingSupplement,
    ];

    /// The wire/audit tag for this agent type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvestorSummary => "investor-summary",
            Self::BaseShelfProspectus => "base-shelf-prospectus",
            Self::ProductSupplement => "product-supplement",
            Self::PricingSupplement => "pricing-supplement",
        }
    }

    /// Parses an agent tag. Returns `None` for unknown tags.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "investor-summary" | "investor_summary" => Some(Self::InvestorSummary),
            "base-shelf-prospectus" | "base_shelf_prospectus" => Some(Self::BaseShelfProspectus),
            "product-supplement" | "product_supplement" => Some(Self::ProductSupplement),
            "pricing-supplement" | "pricing_supplement" => Some(Self::PricingSupplement),
            _ => None,
        }
    }

    /// The static capability row for this agent type.
    pub fn capability(&self) -> &'static AgentCapability {
        match self {
            Self::InvestorSummary => &CAPABILITIES[0],
            Self::BaseShelfProspectus => &CAPABILITIES[1],
            Self::ProductSupplement => &CAPABILITIES[2],
            Self::PricingSupplement => &CAPABILITIES[3],
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of work a collaborator supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Produce a new document from extracted fields
    Generation,
    /// Rework an existing document after feedback
    Revision,
    /// Review a document produced elsewhere
    Review,
}

/// Static description of what one agent type can do and what it needs.
#[derive(Debug, Clone, Copy)]
pub struct AgentCapability {
    /// The agent this row describes.
    pub agent_type: AgentType,
    /// Keywords the router scores against the request text.
    pub keywords: &'static [&'static str],
    /// Fields the collaborator cannot generate without.
    pub required_fields: &'static [&'static str],
    /// Fields that improve the output when present.
    pub optional_fields: &'static [&'static str],
    /// Work kinds the collaborator supports.
    pub supported_tasks: &'static [TaskType],
}

/// One capability row per agent type. Order matches `AgentType::ALL`.
pub const CAPABILITIES: [AgentCapability; 4] = [
    AgentCapability {
        agent_type: AgentType::InvestorSummary,
        keywords: &[
            "investor summary",
            "summary",
            "investor",
            "overview",
            "key terms",
            "plain language",
        ],
        required_fields: &["issuer", "product_name"],
        optional_fields: &[
            "underlying_asset",
            "currency",
            "principal_amount",
            "maturity_date",
        ],
        supported_tasks: &[TaskType::Generation, TaskType::Revision],
    },
    AgentCapability {
        agent_type: AgentType::BaseShelfProspectus,
        keywords: &[
            "base shelf prospectus",
            "shelf prospectus",
            "base shelf",
            "prospectus",
            "shelf",
            "base document",
        ],
        required_fields: &["issuer", "jurisdiction"],
        optional_fields: &["currency", "principal_amount"],
        supported_tasks: &[TaskType::Generation, TaskType::Revision, TaskType::Review],
    },
    AgentCapability {
        agent_type: AgentType::ProductSupplement,
        keywords: &[
            "product supplement",
            "product terms",
            "product description",
            "structural terms",
            "payoff",
        ],
        required_fields: &["issuer", "product_name", "underlying_asset"],
        optional_fields: &["currency", "issue_date", "maturity_date"],
        supported_tasks: &[TaskType::Generation, TaskType::Revision],
    },
    AgentCapability {
        agent_type: AgentType::PricingSupplement,
        keywords: &[
            "pricing supplement",
            "pricing",
            "final terms",
            "issue price",
            "settlement",
        ],
        required_fields: &["issuer", "product_name", "principal_amount"],
        optional_fields: &[
            "currency",
            "issue_date",
            "maturity_date",
            "underlying_asset",
        ],
        supported_tasks: &[TaskType::Generation, TaskType::Revision],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for agent in AgentType::ALL {
            assert_eq!(AgentType::parse_str(agent.as_str()), Some(agent));
        }
        assert_eq!(AgentType::parse_str("unknown-agent"), None);
    }

    #[test]
    fn test_parse_accepts_underscores() {
        assert_eq!(
            AgentType::parse_str("investor_summary"),
            Some(AgentType::InvestorSummary)
        );
        assert_eq!(
            AgentType::parse_str(" Pricing-Supplement "),
            Some(AgentType::PricingSupplement)
        );
    }

    #[test]
    fn test_capability_rows_match_variants() {
        for agent in AgentType::ALL {
            let cap = agent.capability();
            assert_eq!(cap.agent_type, agent);
            assert!(!cap.keywords.is_empty());
            assert!(!cap.required_fields.is_empty());
        }
    }

    #[test]
    fn test_serde_uses_kebab_tags() {
        let json = serde_json::to_string(&AgentType::BaseShelfProspectus).unwrap();
        assert_eq!(json, "\"base-shelf-prospectus\"");
    }
}
