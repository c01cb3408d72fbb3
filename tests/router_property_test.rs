//! Property tests for the intent router: no input text may panic the
//! router or produce an out-of-range decision.

use proptest::prelude::*;

use docuforge::domain::models::SubtaskPriority;
use docuforge::services::config::RouterConfig;
use docuforge::services::IntentRouter;

fn router() -> IntentRouter {
    IntentRouter::new(RouterConfig::default())
}

proptest! {
    #[test]
    fn analyze_never_panics(text in "\\PC*") {
        let decision = router().analyze(&text);
        prop_assert!(!decision.reasoning.is_empty());
    }

    #[test]
    fn confidence_is_clamped(text in ".*") {
        let decision = router().analyze(&text);
        prop_assert!((0.0..=1.0).contains(&decision.confidence_score));
    }

    #[test]
    fn secondaries_exclude_primary(text in "[a-z ]{0,200}") {
        let decision = router().analyze(&text);
        prop_assert!(!decision.secondary_agents.contains(&decision.primary_agent));

        let mut seen = decision.secondary_agents.clone();
        seen.sort_by_key(|a| a.as_str());
        seen.dedup();
        prop_assert_eq!(seen.len(), decision.secondary_agents.len());
    }

    #[test]
    fn decomposition_leads_with_primary(
        text in "(investor summary|prospectus|pricing|payoff| |note|shelf){1,12}"
    ) {
        let decision = router().analyze(&text);
        prop_assert_eq!(
            decision.task_decomposition.len(),
            1 + decision.secondary_agents.len()
        );

        let first = &decision.task_decomposition[0];
        prop_assert_eq!(first.agent_type, decision.primary_agent);
        prop_assert_eq!(first.priority, SubtaskPriority::High);
        for subtask in &decision.task_decomposition[1..] {
            prop_assert_eq!(subtask.priority, SubtaskPriority::Medium);
        }
    }

    #[test]
    fn analyze_is_deterministic(text in "[a-zA-Z0-9 $,.]{0,160}") {
        let first = router().analyze(&text);
        let second = router().analyze(&text);
        prop_assert_eq!(first.primary_agent, second.primary_agent);
        prop_assert_eq!(first.confidence_score, second.confidence_score);
        prop_assert_eq!(first.secondary_agents, second.secondary_agents);
    }
}
