//! Handler registry: route index → priority-ordered handler descriptors.
//!
//! # Responsibilities
//! - Validate registration metadata (fail fast at startup)
//! - Group registrations by route index
//! - Order each group by priority, ties by registration order
//! - Answer lookups with a group or an explicit miss
//!
//! # Design Decisions
//! - Built once, immutable afterwards (shared via Arc without locks)
//! - BTreeMap keeps iteration deterministic across builds
//! - Same index with different or equal priorities is legal; only the
//!   first descriptor of a group is dispatched to

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::RegistrationOverride;
use crate::dispatch::handler::{Handler, HandlerContext};
use crate::dispatch::metadata::{HandlerFactory, Registration, RouteIndex};
use crate::dispatch::priority::Priority;

/// Fatal startup error caused by illegal registration metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("empty route index{}", for_handler(.handler))]
    EmptyIndex { handler: Option<String> },

    #[error("invalid route index '{index}'{}", for_handler(.handler))]
    InvalidIndex { handler: Option<String>, index: String },

    #[error("handler '{handler}' is registered twice for route index '{index}'")]
    DuplicateHandler { handler: String, index: String },

    #[error("override refers to unknown handler '{0}'")]
    UnknownHandler(String),
}

fn for_handler(handler: &Option<String>) -> String {
    match handler {
        Some(name) => format!(" (handler '{}')", name),
        None => String::new(),
    }
}

impl RegistrationError {
    fn with_handler(self, name: &str) -> Self {
        match self {
            RegistrationError::EmptyIndex { .. } => RegistrationError::EmptyIndex {
                handler: Some(name.to_string()),
            },
            RegistrationError::InvalidIndex { index, .. } => RegistrationError::InvalidIndex {
                handler: Some(name.to_string()),
                index,
            },
            other => other,
        }
    }
}

/// Immutable record of one registered handler.
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: Cow<'static, str>,
    index: RouteIndex,
    priority: Priority,
    /// Position in the candidate list; breaks priority ties.
    order: usize,
    factory: HandlerFactory,
}

impl HandlerDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &RouteIndex {
        &self.index
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Create a fresh handler instance.
    pub fn instantiate(&self, ctx: &HandlerContext) -> Box<dyn Handler> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("priority", &self.priority)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Serializable view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSummary {
    pub name: String,
    pub priority: Priority,
    pub active: bool,
}

/// Serializable view of one route index group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub index: RouteIndex,
    pub handlers: Vec<DescriptorSummary>,
}

/// Read-only mapping from route index to ordered handler descriptors.
#[derive(Debug, Default)]
pub struct Registry {
    groups: BTreeMap<RouteIndex, Vec<HandlerDescriptor>>,
}

impl Registry {
    /// Build the registry from the candidate registrations.
    pub fn build<I>(candidates: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = Registration>,
    {
        let mut groups: BTreeMap<RouteIndex, Vec<HandlerDescriptor>> = BTreeMap::new();

        // 1. Validate and group by index
        for (order, registration) in candidates.into_iter().enumerate() {
            let (name, raw_index, priority, factory) = registration.into_parts();
            let index = RouteIndex::new(raw_index).map_err(|e| e.with_handler(&name))?;

            let group = groups.entry(index.clone()).or_default();
            if group.iter().any(|d| d.name == name) {
                return Err(RegistrationError::DuplicateHandler {
                    handler: name.into_owned(),
                    index: index.to_string(),
                });
            }

            tracing::debug!(handler = %name, index = %index, priority = %priority, "Handler registered");
            group.push(HandlerDescriptor {
                name,
                index,
                priority,
                order,
                factory,
            });
        }

        // 2. Order each group (stable, so registration order breaks ties)
        for (index, group) in groups.iter_mut() {
            group.sort_by_key(|d| d.priority);
            for shadowed in group.iter().skip(1) {
                tracing::info!(
                    index = %index,
                    handler = %shadowed.name,
                    active = %group[0].name,
                    "Handler shadowed by higher priority handler"
                );
            }
        }

        let registry = Self { groups };
        tracing::info!(
            routes = registry.len(),
            handlers = registry.handler_count(),
            "Handler registry built"
        );
        Ok(registry)
    }

    /// Ordered handler group for `index`, or `None` if nothing is registered.
    pub fn lookup(&self, index: &str) -> Option<&[HandlerDescriptor]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    /// The descriptor that serves `index`.
    pub fn active(&self, index: &str) -> Option<&HandlerDescriptor> {
        self.lookup(index).and_then(|group| group.first())
    }

    /// Number of route indices.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn handler_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Descriptors that never run because a higher-ranked handler owns their index.
    pub fn shadowed(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.groups.values().flat_map(|group| group.iter().skip(1))
    }

    pub fn summary(&self) -> Vec<RouteSummary> {
        self.groups
            .iter()
            .map(|(index, group)| RouteSummary {
                index: index.clone(),
                handlers: group
                    .iter()
                    .enumerate()
                    .map(|(i, d)| DescriptorSummary {
                        name: d.name.to_string(),
                        priority: d.priority,
                        active: i == 0,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Apply config overrides to the compiled-in registration list.
///
/// Overrides are matched by handler name and applied in order. Disabled
/// handlers are dropped from the list.
pub fn apply_overrides(
    candidates: Vec<Registration>,
    overrides: &[RegistrationOverride],
) -> Result<Vec<Registration>, RegistrationError> {
    if let Some(unknown) = overrides
        .iter()
        .find(|o| !candidates.iter().any(|c| c.name() == o.handler))
    {
        return Err(RegistrationError::UnknownHandler(unknown.handler.clone()));
    }

    let mut adjusted = Vec::with_capacity(candidates.len());
    'candidates: for mut candidate in candidates {
        let name = candidate.name().to_string();
        for o in overrides.iter().filter(|o| o.handler == name) {
            if !o.enabled {
                tracing::info!(handler = %o.handler, "Handler disabled by configuration");
                continue 'candidates;
            }
            if let Some(index) = &o.index {
                candidate = candidate.with_index(index.clone());
            }
            if let Some(priority) = o.priority {
                candidate = candidate.with_priority(priority);
            }
        }
        adjusted.push(candidate);
    }
    Ok(adjusted)
}
