//! Per-attempt holder of a lazily resolved user component.

use std::sync::{Arc, Mutex, MutexGuard};

use jobwire_host::{BoxError, JobContext};
use log::debug;

use crate::{
    component::{Compare, Component, Map, Partition, Reduce, SplitSource},
    error::BridgeError,
    registry::Registry,
    role::Role,
};

/// Binds a role to the component interface its adapter resolves.
pub trait RoleBinding: Send + Sync + 'static {
    const ROLE: Role;
    type Component: ?Sized + Component;

    /// Constructs a component registered under `name`.
    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>>;
}

pub struct InputFormatRole;
pub struct MapperRole;
pub struct CombinerRole;
pub struct PartitionerRole;
pub struct SortComparatorRole;
pub struct GroupingComparatorRole;
pub struct ReducerRole;

impl RoleBinding for InputFormatRole {
    const ROLE: Role = Role::InputFormat;
    type Component = dyn SplitSource;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_split_source(name)
    }
}

impl RoleBinding for MapperRole {
    const ROLE: Role = Role::Mapper;
    type Component = dyn Map;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_mapper(name)
    }
}

impl RoleBinding for CombinerRole {
    const ROLE: Role = Role::Combiner;
    type Component = dyn Reduce;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_reducer(name)
    }
}

impl RoleBinding for PartitionerRole {
    const ROLE: Role = Role::Partitioner;
    type Component = dyn Partition;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_partitioner(name)
    }
}

impl RoleBinding for SortComparatorRole {
    const ROLE: Role = Role::SortComparator;
    type Component = dyn Compare;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_comparator(name)
    }
}

impl RoleBinding for GroupingComparatorRole {
    const ROLE: Role = Role::GroupingComparator;
    type Component = dyn Compare;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_comparator(name)
    }
}

impl RoleBinding for ReducerRole {
    const ROLE: Role = Role::Reducer;
    type Component = dyn Reduce;

    fn construct(registry: &Registry, name: &str) -> Option<Box<Self::Component>> {
        registry.new_reducer(name)
    }
}

/// Observable lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No component instance yet.
    Unresolved,
    /// Component resolved and set up.
    Active,
    /// Component cleaned up, or its resolution failed. Terminal.
    Finalized,
}

enum State<C: ?Sized> {
    Unresolved,
    Active {
        instance: Box<C>,
        has_setup: bool,
        has_cleanup: bool,
    },
    Finalized,
}

/// Holder of the component of one role for one task attempt.
///
/// The component is resolved from the class name persisted in job configuration on the first invocation, exactly
/// once, and reused by every later invocation. Resolution is guarded by a mutex, so concurrent first calls through
/// a shared adapter still resolve a single instance.
pub struct InstanceContainer<B: RoleBinding> {
    registry: Arc<Registry>,
    state: Mutex<State<B::Component>>,
}

impl<B: RoleBinding> InstanceContainer<B> {
    pub fn new(registry: Arc<Registry>) -> Self {
        InstanceContainer {
            registry,
            state: Mutex::new(State::Unresolved),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.state.lock().as_deref() {
            Ok(State::Unresolved) => Lifecycle::Unresolved,
            Ok(State::Active { .. }) => Lifecycle::Active,
            Ok(State::Finalized) | Err(_) => Lifecycle::Finalized,
        }
    }

    /// Whether the resolved component declared `setup` and `cleanup` hooks, `None` unless active.
    pub fn hooks(&self) -> Option<(bool, bool)> {
        match self.state.lock().as_deref() {
            Ok(State::Active {
                has_setup, has_cleanup, ..
            }) => Some((*has_setup, *has_cleanup)),
            _ => None,
        }
    }

    /// Calls `operation` of the component, resolving it first if needed.
    pub fn invoke<T, F>(&self, ctx: &JobContext, operation: &'static str, call: F) -> Result<T, BridgeError>
    where
        F: FnOnce(&mut B::Component) -> Result<T, BoxError>,
    {
        let mut state = self.lock()?;
        let instance = self.active(&mut state, ctx)?;
        call(instance).map_err(|source| BridgeError::DelegateInvocation {
            role: B::ROLE,
            operation,
            attempt: ctx.attempt().cloned(),
            source,
        })
    }

    /// Cleans the component up if it was resolved and declared a cleanup hook. Later calls are no-ops.
    pub fn finalize(&self, ctx: &JobContext) -> Result<(), BridgeError> {
        let mut state = self.lock()?;
        match std::mem::replace(&mut *state, State::Finalized) {
            State::Active {
                mut instance,
                has_cleanup: true,
                ..
            } => {
                debug!("cleaning up {} in {}", B::ROLE, attempt_label(ctx));
                instance.cleanup(ctx).map_err(|source| BridgeError::DelegateInvocation {
                    role: B::ROLE,
                    operation: "cleanup",
                    attempt: ctx.attempt().cloned(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State<B::Component>>, BridgeError> {
        self.state.lock().map_err(|_| BridgeError::Poisoned { role: B::ROLE })
    }

    fn active<'s>(
        &self,
        state: &'s mut State<B::Component>,
        ctx: &JobContext,
    ) -> Result<&'s mut B::Component, BridgeError> {
        if let State::Unresolved = state {
            // A failed resolution is terminal, the framework retries with a fresh adapter.
            *state = State::Finalized;
            *state = self.resolve(ctx)?;
        }
        match state {
            State::Active { instance, .. } => Ok(&mut **instance),
            _ => Err(BridgeError::Finalized {
                role: B::ROLE,
                attempt: ctx.attempt().cloned(),
            }),
        }
    }

    fn resolve(&self, ctx: &JobContext) -> Result<State<B::Component>, BridgeError> {
        let key = B::ROLE.key();
        let unresolved = |class: Option<&str>| BridgeError::ClassResolution {
            role: B::ROLE,
            key,
            class: class.map(str::to_string),
            attempt: ctx.attempt().cloned(),
        };
        let name = ctx.configuration().get(key).ok_or_else(|| unresolved(None))?;
        let mut instance = B::construct(&self.registry, name).ok_or_else(|| unresolved(Some(name)))?;

        let hooks = instance.hooks();
        debug!(
            "resolved {} {} in {} (setup: {}, cleanup: {})",
            B::ROLE,
            name,
            attempt_label(ctx),
            hooks.setup,
            hooks.cleanup
        );
        if hooks.setup {
            instance.setup(ctx).map_err(|source| BridgeError::DelegateInvocation {
                role: B::ROLE,
                operation: "setup",
                attempt: ctx.attempt().cloned(),
                source,
            })?;
        }
        Ok(State::Active {
            instance,
            has_setup: hooks.setup,
            has_cleanup: hooks.cleanup,
        })
    }
}

pub(crate) fn attempt_label(ctx: &JobContext) -> String {
    match ctx.attempt() {
        Some(attempt) => attempt.to_string(),
        None => format!("job {}", ctx.job_name()),
    }
}
