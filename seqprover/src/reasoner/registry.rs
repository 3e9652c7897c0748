//! Registry of installed reasoners.
//!
//! Reasoners are registered by id with a factory and instantiated on first
//! lookup. Unknown ids, and factories whose instance reports another id,
//! resolve to a [`DummyReasoner`] that always fails, so stored proofs that
//! mention them can still be loaded.

use crate::error::{Error, Result};
use crate::reasoner::input::{OpaqueInput, ReasonerInput, ReasonerInputReader, SerializeError};
use crate::reasoner::{
    make_failure, ProofMonitor, Reasoner, ReasonerDesc, ReasonerOutput,
};
use crate::sequent::Sequent;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Creates a reasoner instance.
pub type ReasonerFactory = Box<dyn Fn() -> Arc<dyn Reasoner> + Send + Sync>;

struct Entry {
    factory: ReasonerFactory,
    instance: OnceLock<Arc<dyn Reasoner>>,
}

/// Reasoners available to a prover, keyed by id.
#[derive(Default)]
pub struct ReasonerRegistry {
    entries: IndexMap<String, Entry>,
}

impl ReasonerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the reasoners shipped with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::reasoners::register_builtin(&mut registry);
        registry
    }

    /// Register a factory under `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Arc<dyn Reasoner> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(Error::duplicate_reasoner(id));
        }
        self.entries.insert(
            id,
            Entry {
                factory: Box::new(factory),
                instance: OnceLock::new(),
            },
        );
        Ok(())
    }

    /// Register an existing instance under its own id.
    pub fn register_instance(&mut self, reasoner: Arc<dyn Reasoner>) -> Result<()> {
        let id = reasoner.id().to_string();
        self.register(id, move || Arc::clone(&reasoner))
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn registered_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The installed reasoner for `id`, if any.
    ///
    /// The instance is created on first call. An instance reporting an id
    /// other than the one it was registered under is replaced by a dummy.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Reasoner>> {
        let entry = self.entries.get(id)?;
        let instance = entry.instance.get_or_init(|| {
            let reasoner = (entry.factory)();
            if reasoner.id() == id {
                return reasoner;
            }
            warn!(
                declared = id,
                actual = reasoner.id(),
                "Reasoner id mismatch, using a dummy reasoner"
            );
            Arc::new(DummyReasoner::new(ReasonerDesc::new(id, None)))
        });
        Some(Arc::clone(instance))
    }

    /// Reasoner for `desc`, falling back to a dummy for unknown ids.
    pub fn lookup(&self, desc: &ReasonerDesc) -> Arc<dyn Reasoner> {
        self.get(&desc.id).unwrap_or_else(|| {
            debug!(id = %desc, "Reasoner not installed");
            Arc::new(DummyReasoner::new(desc.clone()))
        })
    }

    /// Descriptor for an encoded id such as `name~2`.
    ///
    /// Without an explicit version the descriptor takes the installed
    /// reasoner's version.
    pub fn reasoner_desc(
        &self,
        encoded: &str,
    ) -> std::result::Result<ReasonerDesc, SerializeError> {
        let desc = ReasonerDesc::decode(encoded)?;
        if desc.version.is_some() {
            return Ok(desc);
        }
        let version = self.get(&desc.id).and_then(|r| r.version());
        Ok(ReasonerDesc::new(desc.id, version))
    }

    /// Whether `desc` names an installed reasoner at another version.
    pub fn has_version_conflict(&self, desc: &ReasonerDesc) -> bool {
        match self.get(&desc.id) {
            Some(reasoner) => {
                let conflict = reasoner.version() != desc.version;
                if conflict {
                    warn!(
                        id = %desc.id,
                        stored = ?desc.version,
                        installed = ?reasoner.version(),
                        "Reasoner version conflict"
                    );
                }
                conflict
            }
            None => false,
        }
    }
}

impl fmt::Debug for ReasonerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonerRegistry")
            .field("ids", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Stand-in for a reasoner that is not installed. Always fails.
#[derive(Debug, Clone)]
pub struct DummyReasoner {
    desc: ReasonerDesc,
}

impl DummyReasoner {
    pub fn new(desc: ReasonerDesc) -> Self {
        Self { desc }
    }
}

impl Reasoner for DummyReasoner {
    fn id(&self) -> &str {
        &self.desc.id
    }

    fn version(&self) -> Option<u32> {
        self.desc.version
    }

    fn apply(
        &self,
        _seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        make_failure(self, input, format!("Reasoner {} is not installed", self.desc))
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> std::result::Result<Arc<dyn ReasonerInput>, SerializeError> {
        Ok(Arc::new(OpaqueInput(reader.to_record())))
    }
}
