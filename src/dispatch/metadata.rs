//! Route metadata: which index a handler serves and at what priority.
//!
//! # Design Decisions
//! - Metadata lives in associated constants of `RouteHandler`, so a handler
//!   type declares its route next to its definition
//! - Registration is an explicit list of `Registration` values built at startup
//! - Index validation happens in `Registry::build`, keeping `Registration`
//!   cheap to construct and adjust

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::dispatch::handler::{Handler, HandlerContext};
use crate::dispatch::priority::Priority;
use crate::dispatch::registry::RegistrationError;

/// Validated route key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RouteIndex(String);

impl RouteIndex {
    /// Validate a route index.
    ///
    /// Legal indices are non-empty and contain neither `/` nor whitespace.
    pub fn new(index: impl Into<String>) -> Result<Self, RegistrationError> {
        let index = index.into();
        if index.is_empty() {
            return Err(RegistrationError::EmptyIndex { handler: None });
        }
        if index.contains('/') || index.chars().any(char::is_whitespace) {
            return Err(RegistrationError::InvalidIndex {
                handler: None,
                index,
            });
        }
        Ok(Self(index))
    }

    /// Extract the route index from a request path.
    ///
    /// The index is the first path segment; `/` and the empty path have none.
    pub fn from_path(path: &str) -> Option<&str> {
        let segment = path.trim_start_matches('/').split('/').next()?;
        if segment.is_empty() {
            None
        } else {
            Some(segment)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for RouteIndex {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A handler type that declares its own route metadata.
pub trait RouteHandler: Handler + Sized + 'static {
    /// Stable name used in logs and config overrides.
    const NAME: &'static str;
    /// Route index served by this handler.
    const INDEX: &'static str;
    const PRIORITY: Priority = Priority::Default;

    fn create(ctx: &HandlerContext) -> Self;
}

/// Creates a fresh handler instance for one request.
pub type HandlerFactory = Arc<dyn Fn(&HandlerContext) -> Box<dyn Handler> + Send + Sync>;

/// One candidate handler offered to the registry.
#[derive(Clone)]
pub struct Registration {
    name: Cow<'static, str>,
    index: String,
    priority: Priority,
    factory: HandlerFactory,
}

impl Registration {
    /// Registration built from a handler type's associated metadata.
    pub fn of<H: RouteHandler>() -> Self {
        Self {
            name: Cow::Borrowed(H::NAME),
            index: H::INDEX.to_string(),
            priority: H::PRIORITY,
            factory: Arc::new(|ctx: &HandlerContext| Box::new(H::create(ctx)) as Box<dyn Handler>),
        }
    }

    /// Registration built from explicit metadata and a factory closure.
    pub fn new<F>(
        name: impl Into<Cow<'static, str>>,
        index: impl Into<String>,
        priority: Priority,
        factory: F,
    ) -> Self
    where
        F: Fn(&HandlerContext) -> Box<dyn Handler> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            index: index.into(),
            priority,
            factory: Arc::new(factory),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn into_parts(self) -> (Cow<'static, str>, String, Priority, HandlerFactory) {
        (self.name, self.index, self.priority, self.factory)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
