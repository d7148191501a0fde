//! Aspect registry
//!
//! Enabled aspects, keyed by aspect id. Registering an id twice either
//! replaces the previous aspect (with a warning) or fails, depending on the
//! context's [`DuplicateAspectPolicy`].

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{AsAnyArc, AspectType};
use crate::advice::{instance_key, Order};
use crate::config::DuplicateAspectPolicy;
use crate::error::{Result, WeavingError};

/// Outcome of [`AspectRegistry::register`]
pub enum Registration {
    /// First aspect with this id
    New(String),
    /// Another aspect had this id and was replaced
    Replaced {
        /// Aspect id
        id: String,
        /// Aspect that was replaced
        previous: Arc<dyn AspectType>,
    },
    /// This very instance is already registered
    AlreadyEnabled(String),
}

impl Registration {
    /// Aspect id
    pub fn id(&self) -> &str {
        match self {
            Registration::New(id) | Registration::AlreadyEnabled(id) => id,
            Registration::Replaced { id, .. } => id,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::New(id) => f.debug_tuple("New").field(id).finish(),
            Registration::Replaced { id, .. } => f.debug_struct("Replaced").field("id", id).finish(),
            Registration::AlreadyEnabled(id) => f.debug_tuple("AlreadyEnabled").field(id).finish(),
        }
    }
}

/// Outcome of [`AspectRegistry::prepare`]
pub(crate) enum Prepared {
    /// This very instance is already registered
    AlreadyEnabled(String),
    /// Not registered yet
    Fresh {
        /// Aspect id
        id: String,
        /// Default advice order
        order: Order,
    },
}

struct AspectEntry {
    id: String,
    order: Order,
    aspect: Arc<dyn AspectType>,
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<AspectEntry>,
    /// Per type name, last generated id suffix
    generated: FxHashMap<&'static str, usize>,
}

/// Enabled aspects of a context
pub struct AspectRegistry {
    policy: DuplicateAspectPolicy,
    state: RwLock<RegistryState>,
}

impl AspectRegistry {
    /// Create a registry enforcing `policy` on duplicate ids
    pub fn new(policy: DuplicateAspectPolicy) -> Self {
        Self {
            policy,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Register an aspect
    pub fn register(&self, aspect: Arc<dyn AspectType>) -> Result<Registration> {
        match self.prepare(&aspect)? {
            Prepared::AlreadyEnabled(id) => Ok(Registration::AlreadyEnabled(id)),
            Prepared::Fresh { id, order } => self.insert(aspect, id, order),
        }
    }

    /// Resolve the id and order an aspect would be registered under
    ///
    /// Nothing is stored except the generated id counter, so ids are never
    /// handed out twice.
    pub(crate) fn prepare(&self, aspect: &Arc<dyn AspectType>) -> Result<Prepared> {
        let key = instance_key(aspect);
        let options = aspect.options();
        let type_name = AsAnyArc::aspect_type_name(&**aspect);
        let mut state = self.state.write();

        if let Some(entry) = state.entries.iter().find(|e| instance_key(&e.aspect) == key) {
            return Ok(Prepared::AlreadyEnabled(entry.id.clone()));
        }

        let id = match options.id {
            Some(id) => id,
            None => {
                let n = state.generated.entry(type_name).or_insert(0);
                *n += 1;
                format!("{}#{}", short_type_name(type_name), n)
            }
        };
        self.check_duplicate(&state, &id)?;
        Ok(Prepared::Fresh {
            id,
            order: options.order.unwrap_or_default(),
        })
    }

    /// Store a prepared aspect
    pub(crate) fn insert(&self, aspect: Arc<dyn AspectType>, id: String, order: Order) -> Result<Registration> {
        let key = instance_key(&aspect);
        let type_name = AsAnyArc::aspect_type_name(&*aspect);
        let mut state = self.state.write();

        if let Some(entry) = state.entries.iter().find(|e| instance_key(&e.aspect) == key) {
            return Ok(Registration::AlreadyEnabled(entry.id.clone()));
        }
        self.check_duplicate(&state, &id)?;

        let entry = AspectEntry {
            id: id.clone(),
            order,
            aspect,
        };
        match state.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                tracing::warn!(aspect = %id, kind = type_name, "aspect id already registered, replacing");
                let previous = std::mem::replace(&mut state.entries[index], entry);
                Ok(Registration::Replaced {
                    id,
                    previous: previous.aspect,
                })
            }
            None => {
                tracing::debug!(aspect = %id, kind = type_name, "aspect registered");
                state.entries.push(entry);
                Ok(Registration::New(id))
            }
        }
    }

    fn check_duplicate(&self, state: &RegistryState, id: &str) -> Result<()> {
        if self.policy == DuplicateAspectPolicy::Reject && state.entries.iter().any(|e| e.id == id) {
            return Err(WeavingError::DuplicateAspect(id.to_string()).into());
        }
        Ok(())
    }

    /// Policy applied to duplicate ids
    pub fn policy(&self) -> DuplicateAspectPolicy {
        self.policy
    }

    /// Registered aspect of type `A`, if any
    pub fn get<A: AspectType>(&self) -> Option<Arc<A>> {
        self.state
            .read()
            .entries
            .iter()
            .find_map(|e| Arc::clone(&e.aspect).as_any_arc().downcast::<A>().ok())
    }

    /// Registered aspect by id
    pub fn get_by_id(&self, id: &str) -> Option<Arc<dyn AspectType>> {
        self.state
            .read()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.aspect.clone())
    }

    /// Id of a registered aspect instance
    pub fn id_of<A: ?Sized>(&self, aspect: &Arc<A>) -> Option<String> {
        let key = instance_key(aspect);
        self.state
            .read()
            .entries
            .iter()
            .find(|e| instance_key(&e.aspect) == key)
            .map(|e| e.id.clone())
    }

    /// Default advice order of a registered aspect
    pub fn order_of(&self, id: &str) -> Option<Order> {
        self.state
            .read()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.order)
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.state.read().entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Number of registered aspects
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Check if no aspect is registered
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl fmt::Debug for AspectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AspectRegistry")
            .field("policy", &self.policy)
            .field("ids", &self.ids())
            .finish()
    }
}

fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
