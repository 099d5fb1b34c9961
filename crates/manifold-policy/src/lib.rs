//! Availability policy engine for the Manifold gateway.
//!
//! Evaluates a compact, operator-authored directive string against a
//! registry of backend providers and models to decide, per request, which
//! targets are callable.  Evaluation is pure and read-only: a parsed
//! [`PolicySet`] can be shared across concurrent turns without locking.
//!
//! ## Modules
//!
//! - [`directive`] -- Policy string tokenization into typed directives.
//! - [`provider`] -- Provider-level admit/block decisions.
//! - [`model`] -- Model-level admit/block decisions and the deployment
//!   kill switch.
//! - [`catalog`] -- The immutable provider/model registry and callable-set
//!   filtering.

pub mod catalog;
pub mod directive;
pub mod model;
pub mod provider;

// Re-export the most commonly used types for convenience.
pub use catalog::{CatalogModel, ModelCapabilities, ModelCatalog, ProviderDescriptor};
pub use directive::{Directive, PolicySet, Scope, Sign};
pub use model::{KillSwitch, is_model_unavailable};
