//! Prover configuration and context.
//!
//! A [`SequentProver`] owns the reasoner registry and the settings that
//! govern proof replay. It is built once and passed by reference to
//! whatever needs to look up reasoners or rebuild proofs.

use crate::proof_tree::ProofTree;
use crate::reasoner::{Reasoner, ReasonerRegistry};
use crate::sequent::Sequent;
use std::sync::Arc;

/// Settings for replaying and checking proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverConfig {
    /// Replay stored rules before re-running their reasoner.
    pub reuse_rules_first: bool,

    /// Re-run a reasoner whose stored version differs from the installed
    /// one instead of trusting the stored rule.
    pub rebuild_on_version_conflict: bool,

    /// Report ill-formed rules with `warn!` when they are applied.
    pub log_ill_formed_rules: bool,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            reuse_rules_first: true,
            rebuild_on_version_conflict: true,
            log_ill_formed_rules: true,
        }
    }
}

/// Prover context: configuration plus installed reasoners.
#[derive(Debug)]
pub struct SequentProver {
    config: ProverConfig,
    registry: ReasonerRegistry,
}

impl SequentProver {
    /// Create a context from parts.
    pub fn new(config: ProverConfig, registry: ReasonerRegistry) -> Self {
        Self { config, registry }
    }

    pub fn builder() -> SequentProverBuilder {
        SequentProverBuilder::new()
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReasonerRegistry {
        &self.registry
    }

    /// Installed reasoner for `id`.
    pub fn reasoner(&self, id: &str) -> Option<Arc<dyn Reasoner>> {
        self.registry.get(id)
    }

    /// Fresh proof tree for `root`, configured from this context.
    pub fn new_proof_tree(&self, root: Sequent) -> ProofTree {
        let mut tree = ProofTree::new(root);
        tree.set_log_ill_formed_rules(self.config.log_ill_formed_rules);
        tree
    }
}

impl Default for SequentProver {
    fn default() -> Self {
        SequentProverBuilder::new().build()
    }
}

/// Builder for [`SequentProver`].
pub struct SequentProverBuilder {
    config: ProverConfig,
    registry: Option<ReasonerRegistry>,
}

impl SequentProverBuilder {
    /// Create a new builder with default config.
    pub fn new() -> Self {
        Self {
            config: ProverConfig::default(),
            registry: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ProverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reuse_rules_first(mut self, enable: bool) -> Self {
        self.config.reuse_rules_first = enable;
        self
    }

    pub fn rebuild_on_version_conflict(mut self, enable: bool) -> Self {
        self.config.rebuild_on_version_conflict = enable;
        self
    }

    pub fn log_ill_formed_rules(mut self, enable: bool) -> Self {
        self.config.log_ill_formed_rules = enable;
        self
    }

    /// Use `registry` instead of the built-in reasoners.
    pub fn registry(mut self, registry: ReasonerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> SequentProver {
        SequentProver {
            config: self.config,
            registry: self.registry.unwrap_or_else(ReasonerRegistry::with_builtin),
        }
    }
}

impl Default for SequentProverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
