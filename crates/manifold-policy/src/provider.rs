//! Provider admission gate.
//!
//! Decides whether a policy blocks an entire provider.  The evaluation is a
//! two-tier wildcard-with-override scheme, NOT last-directive-wins: a global
//! disable blocks every provider unless a matching provider re-enable exists
//! anywhere in the list, regardless of position.  Both tiers are explicit
//! whole-list scans so that ordering semantics cannot creep back in.

use crate::catalog::ProviderDescriptor;
use crate::directive::{PolicySet, Scope, Sign};

impl PolicySet {
    /// True when this policy blocks the given provider.
    ///
    /// The default — an empty policy, or no directive matching the provider
    /// — is admission.
    pub fn blocks_provider(&self, provider: &ProviderDescriptor) -> bool {
        if self.disables_all() {
            // Existence scan: `+provider:x` re-enables whether it appears
            // before or after the `-all`.
            let reenabled = self.directives().iter().any(|d| {
                d.sign == Sign::Enable
                    && matches!(&d.scope, Scope::Provider(name) if provider.matches(name))
            });
            return !reenabled;
        }

        self.directives().iter().any(|d| {
            d.sign == Sign::Disable
                && matches!(&d.scope, Scope::Provider(name) if provider.matches(name))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn openai() -> ProviderDescriptor {
        ProviderDescriptor::new("openai", "OpenAI")
    }

    fn azure() -> ProviderDescriptor {
        ProviderDescriptor::new("azure", "Azure")
    }

    #[test]
    fn empty_policy_admits_every_provider() {
        let policy = PolicySet::parse("");
        assert!(!policy.blocks_provider(&openai()));
        assert!(!policy.blocks_provider(&azure()));
    }

    #[test]
    fn global_disable_blocks_all_providers() {
        let policy = PolicySet::parse("-all");
        assert!(policy.blocks_provider(&openai()));
        assert!(policy.blocks_provider(&azure()));
    }

    #[test]
    fn reenable_admits_only_the_named_provider() {
        let policy = PolicySet::parse("-all,+provider:openai");
        assert!(!policy.blocks_provider(&openai()));
        assert!(policy.blocks_provider(&azure()));
    }

    #[test]
    fn reenable_position_is_irrelevant() {
        let before = PolicySet::parse("+provider:openai,-all");
        let after = PolicySet::parse("-all,+provider:openai");
        assert_eq!(
            before.blocks_provider(&openai()),
            after.blocks_provider(&openai())
        );
        assert!(!before.blocks_provider(&openai()));
    }

    #[test]
    fn reenable_matches_display_name() {
        let policy = PolicySet::parse("-all,+provider:OpenAI");
        assert!(!policy.blocks_provider(&openai()));
    }

    #[test]
    fn targeted_disable_blocks_one_provider() {
        let policy = PolicySet::parse("-provider:azure");
        assert!(policy.blocks_provider(&azure()));
        assert!(!policy.blocks_provider(&openai()));
    }

    #[test]
    fn targeted_disable_is_case_insensitive() {
        let policy = PolicySet::parse("-provider:AZURE");
        assert!(policy.blocks_provider(&azure()));
    }

    #[test]
    fn model_directives_do_not_touch_provider_admission() {
        let policy = PolicySet::parse("-gpt-4,-gpt-4o@openai");
        assert!(!policy.blocks_provider(&openai()));
    }

    #[test]
    fn encode_round_trip_preserves_provider_decisions() {
        let original = PolicySet::parse("-all,+provider:openai,-provider:azure");
        let reparsed = PolicySet::parse(&original.encode());
        for p in [openai(), azure()] {
            assert_eq!(original.blocks_provider(&p), reparsed.blocks_provider(&p));
        }
    }
}
