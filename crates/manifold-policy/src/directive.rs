//! Directive parsing for the availability policy string.
//!
//! A policy string is a single comma-separated configuration value authored
//! by an operator, e.g. `-all,+provider:openrouter,gpt-4o@azure`.  Each
//! segment becomes one [`Directive`]: a sign (enable/disable) applied to a
//! scope (everything, one provider, one model, or one model pinned to a
//! provider).  Parsing never fails — blank or malformed segments are dropped
//! so that a typo in operator configuration degrades gracefully instead of
//! taking the gateway down.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

/// Whether a directive enables or disables its scope.
///
/// A segment with no `-`/`+` prefix is an implicit enable; after parsing,
/// implicit and explicit enables are indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Enable,
    Disable,
}

/// What a single directive applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every provider and model (`all`).
    All,

    /// One provider, matched against its id or display name
    /// (`provider:<name>`).
    Provider(String),

    /// One model by name, not pinned to any provider (`<name>`).
    ///
    /// Model names may contain arbitrary characters short of `,` and `@`,
    /// including slashes (`anthropic/claude-haiku-4.5`).
    Model(String),

    /// One model pinned to a specific provider (`<model>@<provider>`).
    ModelAtProvider { model: String, provider: String },
}

/// One parsed unit of policy: a sign applied to a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub sign: Sign,
    pub scope: Scope,
}

impl Directive {
    /// Parse a single policy segment.  Returns `None` for segments that
    /// carry no usable directive (blank, or a bare sign with nothing after
    /// it).
    fn parse(segment: &str) -> Option<Self> {
        let segment = segment.trim();
        if segment.is_empty() {
            return None;
        }

        let (sign, rest) = if let Some(rest) = segment.strip_prefix('-') {
            (Sign::Disable, rest)
        } else if let Some(rest) = segment.strip_prefix('+') {
            (Sign::Enable, rest)
        } else {
            (Sign::Enable, segment)
        };

        if rest.is_empty() {
            tracing::trace!(segment, "dropping empty policy segment");
            return None;
        }

        let scope = if rest == "all" {
            Scope::All
        } else if let Some(name) = rest.strip_prefix("provider:") {
            if name.is_empty() {
                tracing::trace!(segment, "dropping provider directive with no name");
                return None;
            }
            Scope::Provider(name.to_owned())
        } else if let Some((model, provider)) = rest.rsplit_once('@')
            && !model.is_empty()
            && !provider.is_empty()
        {
            Scope::ModelAtProvider {
                model: model.to_owned(),
                provider: provider.to_owned(),
            }
        } else {
            Scope::Model(rest.to_owned())
        };

        Some(Self { sign, scope })
    }

    /// Render this directive in canonical string form.
    fn encode(&self) -> String {
        let body = match &self.scope {
            Scope::All => "all".to_owned(),
            Scope::Provider(name) => format!("provider:{name}"),
            Scope::Model(name) => name.clone(),
            Scope::ModelAtProvider { model, provider } => format!("{model}@{provider}"),
        };

        match self.sign {
            Sign::Enable => body,
            Sign::Disable => format!("-{body}"),
        }
    }
}

// ---------------------------------------------------------------------------
// PolicySet
// ---------------------------------------------------------------------------

/// An ordered sequence of directives parsed from one policy string.
///
/// An empty set is permissive: nothing is evaluated as disabling.  The set
/// is immutable after parsing; admission queries never mutate it, so a
/// single `PolicySet` can be shared read-only across concurrent turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    directives: Vec<Directive>,
}

impl PolicySet {
    /// Parse a raw policy string.  Never fails; unusable segments are
    /// silently dropped.
    pub fn parse(raw: &str) -> Self {
        let directives = raw.split(',').filter_map(Directive::parse).collect();
        Self { directives }
    }

    /// True when no directive survived parsing (the permissive policy).
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// The parsed directives in insertion order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Render the canonical string form of this policy.
    ///
    /// Re-parsing the result yields a decision-identical policy.  The form
    /// is not byte-stable against the original input: explicit `+` prefixes
    /// collapse to bare enables and blank segments disappear.
    pub fn encode(&self) -> String {
        self.directives
            .iter()
            .map(Directive::encode)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True when the set contains a `Disable(All)` directive anywhere.
    pub(crate) fn disables_all(&self) -> bool {
        self.directives
            .iter()
            .any(|d| d.sign == Sign::Disable && d.scope == Scope::All)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_parses_to_permissive_policy() {
        let policy = PolicySet::parse("");
        assert!(policy.is_empty());
    }

    #[test]
    fn blank_segments_are_dropped() {
        let policy = PolicySet::parse(",, ,gpt-4,");
        assert_eq!(policy.directives().len(), 1);
        assert_eq!(
            policy.directives()[0],
            Directive {
                sign: Sign::Enable,
                scope: Scope::Model("gpt-4".into()),
            }
        );
    }

    #[test]
    fn signs_parse_with_implicit_enable() {
        let policy = PolicySet::parse("-all,+gpt-4,claude-sonnet");
        let d = policy.directives();
        assert_eq!(d[0].sign, Sign::Disable);
        assert_eq!(d[0].scope, Scope::All);
        assert_eq!(d[1].sign, Sign::Enable);
        assert_eq!(d[2].sign, Sign::Enable);
    }

    #[test]
    fn provider_scope_parses() {
        let policy = PolicySet::parse("+provider:OpenRouter");
        assert_eq!(
            policy.directives()[0].scope,
            Scope::Provider("OpenRouter".into())
        );
    }

    #[test]
    fn model_at_provider_splits_on_last_at() {
        let policy = PolicySet::parse("gpt-4@azure");
        assert_eq!(
            policy.directives()[0].scope,
            Scope::ModelAtProvider {
                model: "gpt-4".into(),
                provider: "azure".into(),
            }
        );
    }

    #[test]
    fn slashed_model_names_stay_model_scope() {
        let policy = PolicySet::parse("anthropic/claude-haiku-4.5");
        assert_eq!(
            policy.directives()[0].scope,
            Scope::Model("anthropic/claude-haiku-4.5".into())
        );
    }

    #[test]
    fn malformed_segments_are_dropped_silently() {
        // A bare sign and an empty provider name carry no usable directive.
        let policy = PolicySet::parse("-,+,provider:,gpt-4");
        assert_eq!(policy.directives().len(), 1);
    }

    #[test]
    fn dangling_at_falls_back_to_model_scope() {
        let policy = PolicySet::parse("gpt-4@,@azure");
        assert_eq!(policy.directives()[0].scope, Scope::Model("gpt-4@".into()));
        assert_eq!(policy.directives()[1].scope, Scope::Model("@azure".into()));
    }

    #[test]
    fn encode_round_trip_is_decision_stable() {
        let original = PolicySet::parse(" -all, +provider:OpenRouter ,gpt-4o@azure,,-gpt-4");
        let reparsed = PolicySet::parse(&original.encode());
        assert_eq!(original, reparsed);
    }

    #[test]
    fn explicit_plus_collapses_on_encode() {
        let policy = PolicySet::parse("+gpt-4");
        assert_eq!(policy.encode(), "gpt-4");
    }
}
