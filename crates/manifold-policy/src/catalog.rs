//! Provider and model catalog.
//!
//! The catalog is supplied by an external registry (static configuration or
//! a backend's model-listing endpoint).  This crate only evaluates admission
//! against it.  The catalog is an explicit immutable value passed into the
//! gates — there is no ambient global provider table.

use serde::{Deserialize, Serialize};

use crate::directive::PolicySet;
use crate::model::{KillSwitch, is_model_unavailable};

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// A distinct backend LLM service family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Stable lowercase identifier, e.g. `"openrouter"`.
    pub id: String,

    /// Human-facing name, e.g. `"OpenRouter"`.
    pub display_name: String,
}

impl ProviderDescriptor {
    /// Create a descriptor.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// True when `name` names this provider by id or display name,
    /// case-insensitively.
    pub fn matches(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.id) || name.eq_ignore_ascii_case(&self.display_name)
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Input capabilities a model declares beyond plain text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Accepts image input.
    #[serde(default)]
    pub vision: bool,

    /// Accepts video input.
    #[serde(default)]
    pub video: bool,
}

/// One catalog entry: a model and the provider it is served by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModel {
    /// The model identifier sent on the wire, e.g. `"openai/gpt-4o"`.
    pub name: String,

    /// Human-facing name.
    pub display_name: String,

    /// The provider serving this model.
    pub provider: ProviderDescriptor,

    /// Declared input capabilities.
    #[serde(default)]
    pub capabilities: ModelCapabilities,

    /// Display ordering hint from the registry.
    #[serde(default)]
    pub sorted: u32,
}

/// The full registry of known providers and models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    providers: Vec<ProviderDescriptor>,
    models: Vec<CatalogModel>,
}

impl ModelCatalog {
    /// Build a catalog from its provider and model lists.
    pub fn new(providers: Vec<ProviderDescriptor>, models: Vec<CatalogModel>) -> Self {
        Self { providers, models }
    }

    /// All registered providers, admitted or not.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// All registered models, callable or not.
    pub fn models(&self) -> &[CatalogModel] {
        &self.models
    }

    /// The providers the given policy admits.
    pub fn admitted_providers(&self, policy: &PolicySet) -> Vec<&ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|p| !policy.blocks_provider(p))
            .collect()
    }

    /// The models callable under the given policy and kill switch: the
    /// model's provider must be admitted and the model itself must pass the
    /// model gate against that provider.
    pub fn callable_models(&self, policy: &PolicySet, kill: &KillSwitch) -> Vec<&CatalogModel> {
        self.models
            .iter()
            .filter(|m| !policy.blocks_provider(&m.provider))
            .filter(|m| {
                let names = [m.provider.id.as_str(), m.provider.display_name.as_str()];
                !is_model_unavailable(policy, kill, &m.name, &names)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
