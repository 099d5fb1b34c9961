//! Gateway configuration.
//!
//! Loaded once from a TOML file.  The policy string and kill switch are
//! operator-authored configuration values consumed here and evaluated by
//! `manifold-policy`; backend entries describe the HTTP endpoints the
//! gateway can reach.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use manifold_policy::{KillSwitch, PolicySet, ProviderDescriptor};

use crate::error::{GatewayError, Result};

// ---------------------------------------------------------------------------
// Backend entries
// ---------------------------------------------------------------------------

/// One backend endpoint the gateway can dispatch turns to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable lowercase identifier, e.g. `"openrouter"`.
    pub id: String,

    /// Human-facing name, e.g. `"OpenRouter"`.
    pub display_name: String,

    /// Base URL of the chat-completions API, without a trailing path.
    pub base_url: String,

    /// Bearer token.  May be empty for local backends.
    #[serde(default)]
    pub api_key: String,

    /// Whether this backend's model namespace requires provider-qualified
    /// ids (`vendor/model`).  Unqualified ids are rejected before a turn
    /// starts.
    #[serde(default)]
    pub qualified_model_ids: bool,
}

impl BackendConfig {
    /// The provider descriptor the admission gates evaluate against.
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(&self.id, &self.display_name)
    }
}

// ---------------------------------------------------------------------------
// Timeout policy
// ---------------------------------------------------------------------------

/// Per-turn deadline budgets, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Budget for ordinary models.
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,

    /// Budget for extended-reasoning models, which routinely spend minutes
    /// thinking before the first answer token.
    #[serde(default = "default_extended_request_secs")]
    pub extended_request_secs: u64,
}

fn default_request_secs() -> u64 {
    60
}

fn default_extended_request_secs() -> u64 {
    300
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: default_request_secs(),
            extended_request_secs: default_extended_request_secs(),
        }
    }
}

impl TimeoutConfig {
    /// The deadline budget for one turn against the given model.
    pub fn budget_for(&self, model: &str) -> Duration {
        let secs = if is_extended_reasoning_model(model) {
            self.extended_request_secs
        } else {
            self.request_secs
        };
        Duration::from_secs(secs)
    }
}

/// Heuristic for models that stream a long reasoning phase before any
/// answer text.
pub fn is_extended_reasoning_model(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    model.starts_with("o1")
        || model.starts_with("o3")
        || model.contains("deepseek-r")
        || model.contains("-thinking")
}

// ---------------------------------------------------------------------------
// Gateway configuration
// ---------------------------------------------------------------------------

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// The raw availability policy string (comma-separated directives).
    #[serde(default)]
    pub policy: String,

    /// Deployment-level kill switch: model-name prefixes forced
    /// unavailable regardless of the policy string.
    #[serde(default)]
    pub kill_switch: Vec<String>,

    /// Backend endpoints.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    /// Per-turn deadline budgets.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl GatewayConfig {
    /// Parse a configuration document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| GatewayError::Config {
            reason: format!("invalid gateway config: {e}"),
        })
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| GatewayError::Config {
            reason: format!("cannot read {}: {e}", path.as_ref().display()),
        })?;
        Self::from_toml(&raw)
    }

    /// The parsed availability policy.
    pub fn policy(&self) -> PolicySet {
        PolicySet::parse(&self.policy)
    }

    /// The parsed kill switch.
    pub fn kill_switch(&self) -> KillSwitch {
        KillSwitch::new(self.kill_switch.iter().cloned())
    }

    /// Look up a backend by id or display name, case-insensitively.
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.descriptor().matches(name))
    }

    /// The configured backends the current policy admits.  Consulted before
    /// any turn starts.
    pub fn admitted_backends(&self) -> Vec<&BackendConfig> {
        let policy = self.policy();
        self.backends
            .iter()
            .filter(|b| !policy.blocks_provider(&b.descriptor()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        policy = "-all,+provider:openrouter"
        kill_switch = ["gpt-4"]

        [timeouts]
        request_secs = 30
        extended_request_secs = 600

        [[backends]]
        id = "openrouter"
        display_name = "OpenRouter"
        base_url = "https://openrouter.ai/api/v1"
        api_key = "sk-or-test"
        qualified_model_ids = true

        [[backends]]
        id = "ollama"
        display_name = "Ollama"
        base_url = "http://localhost:11434/v1"
    "#;

    #[test]
    fn sample_config_parses() {
        let config = GatewayConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.backends[0].qualified_model_ids);
        // Omitted fields take their defaults.
        assert!(!config.backends[1].qualified_model_ids);
        assert!(config.backends[1].api_key.is_empty());
    }

    #[test]
    fn policy_and_kill_switch_parse_through() {
        let config = GatewayConfig::from_toml(SAMPLE).unwrap();
        let policy = config.policy();
        assert!(policy.blocks_provider(&ProviderDescriptor::new("openai", "OpenAI")));
        assert!(!policy.blocks_provider(&config.backends[0].descriptor()));
        assert!(config.kill_switch().disables("gpt-4o"));
    }

    #[test]
    fn admitted_backends_follow_the_policy() {
        let config = GatewayConfig::from_toml(SAMPLE).unwrap();
        let admitted = config.admitted_backends();
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].id, "openrouter");
    }

    #[test]
    fn backend_lookup_is_case_insensitive() {
        let config = GatewayConfig::from_toml(SAMPLE).unwrap();
        assert!(config.backend("OPENROUTER").is_some());
        assert!(config.backend("Ollama").is_some());
        assert!(config.backend("openai").is_none());
    }

    #[test]
    fn empty_document_is_a_valid_permissive_config() {
        let config = GatewayConfig::from_toml("").unwrap();
        assert!(config.policy().is_empty());
        assert!(config.backends.is_empty());
        assert_eq!(config.timeouts, TimeoutConfig::default());
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = GatewayConfig::from_toml("policy = [1, 2]").unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = GatewayConfig::load(&path).unwrap();
        assert_eq!(config.backends[0].id, "openrouter");

        let missing = GatewayConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(GatewayError::Config { .. })));
    }

    #[test]
    fn extended_reasoning_models_get_the_long_budget() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.budget_for("gpt-4o"), Duration::from_secs(60));
        assert_eq!(timeouts.budget_for("o1-preview"), Duration::from_secs(300));
        assert_eq!(timeouts.budget_for("o3-mini"), Duration::from_secs(300));
        assert_eq!(
            timeouts.budget_for("deepseek/deepseek-r1"),
            Duration::from_secs(300)
        );
        assert_eq!(
            timeouts.budget_for("claude-sonnet-4-thinking"),
            Duration::from_secs(300)
        );
    }
}
