//! Model admission gate.
//!
//! Decides whether a policy makes a model unavailable, optionally against a
//! set of candidate provider names.  Like the provider gate, every rule is
//! an explicit whole-list existence scan; specificity decides conflicts, not
//! position.  The precedence, most specific first:
//!
//! 1. a disable pinned to the queried provider (`-model@provider`),
//! 2. a bare model disable (`-model`), which also narrows a provider-level
//!    allow back down for that one model,
//! 3. the global disable (`-all`), pierced by a matching provider
//!    re-enable, a pinned model re-enable, or — only when a provider
//!    context was supplied — a bare model re-enable,
//! 4. a provider-level disable (`-provider:p`), pierced only by a model
//!    re-enable pinned to that exact provider.
//!
//! A provider-agnostic query (empty provider set) cannot attribute a bare
//! re-enable to anything, so the global disable stands.

use crate::directive::{PolicySet, Scope, Sign};

// ---------------------------------------------------------------------------
// Policy evaluation
// ---------------------------------------------------------------------------

impl PolicySet {
    /// True when this policy makes `model` unavailable against every one of
    /// the candidate `providers`.  An empty `providers` slice is a
    /// provider-agnostic query.
    ///
    /// The default — an empty policy — is availability, for any model and
    /// any providers.
    pub fn model_unavailable(&self, model: &str, providers: &[&str]) -> bool {
        if self.is_empty() {
            return false;
        }

        if providers.is_empty() {
            return self.model_denied_for(model, None);
        }

        // Available on any one candidate provider admits the model.
        providers
            .iter()
            .copied()
            .all(|p| self.model_denied_for(model, Some(p)))
    }

    /// Evaluate denial of `model` against a single provider context.
    fn model_denied_for(&self, model: &str, provider: Option<&str>) -> bool {
        if let Some(p) = provider
            && self.has_pinned(Sign::Disable, model, p)
        {
            return true;
        }

        if self.has_bare(Sign::Disable, model) {
            return true;
        }

        if self.disables_all() {
            let Some(p) = provider else {
                return true;
            };
            let reenabled = self.has_provider(Sign::Enable, p)
                || self.has_pinned(Sign::Enable, model, p)
                || self.has_bare(Sign::Enable, model);
            return !reenabled;
        }

        if let Some(p) = provider
            && self.has_provider(Sign::Disable, p)
        {
            return !self.has_pinned(Sign::Enable, model, p);
        }

        false
    }

    /// Existence scan for `<sign><model>` (unpinned model scope).
    fn has_bare(&self, sign: Sign, model: &str) -> bool {
        self.directives().iter().any(|d| {
            d.sign == sign
                && matches!(&d.scope, Scope::Model(name) if name.eq_ignore_ascii_case(model))
        })
    }

    /// Existence scan for `<sign><model>@<provider>`.
    fn has_pinned(&self, sign: Sign, model: &str, provider: &str) -> bool {
        self.directives().iter().any(|d| {
            d.sign == sign
                && matches!(
                    &d.scope,
                    Scope::ModelAtProvider { model: m, provider: p }
                        if m.eq_ignore_ascii_case(model) && p.eq_ignore_ascii_case(provider)
                )
        })
    }

    /// Existence scan for `<sign>provider:<provider>`.
    fn has_provider(&self, sign: Sign, provider: &str) -> bool {
        self.directives().iter().any(|d| {
            d.sign == sign
                && matches!(&d.scope, Scope::Provider(name) if name.eq_ignore_ascii_case(provider))
        })
    }
}

// ---------------------------------------------------------------------------
// Deployment kill switch
// ---------------------------------------------------------------------------

/// A deployment-level force-disable list, independent of the directive
/// grammar.  Matching is a case-insensitive prefix test on the model name,
/// so one entry covers a whole model family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillSwitch {
    prefixes: Vec<String>,
}

impl KillSwitch {
    /// Build a kill switch from model-name prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// True when the kill switch force-disables `model`.
    pub fn disables(&self, model: &str) -> bool {
        let model = model.to_ascii_lowercase();
        self.prefixes.iter().any(|prefix| model.starts_with(prefix))
    }
}

/// Combined model admission check: the kill switch is a secondary,
/// independent signal ORed into the directive evaluation.
pub fn is_model_unavailable(
    policy: &PolicySet,
    kill: &KillSwitch,
    model: &str,
    providers: &[&str],
) -> bool {
    kill.disables(model) || policy.model_unavailable(model, providers)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
