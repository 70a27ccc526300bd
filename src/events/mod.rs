//! Builder lifecycle events and listener registration
//!
//! A [`crate::ConfigurationBuilder`] emits events at well-defined points of
//! its lifecycle: when a configuration is requested, when a new result has
//! been produced, and when a cached result is invalidated. Listeners are
//! registered per [`BuilderEventKind`]; the `Any` kind subscribes to every
//! event. Dispatch is synchronous, on the task that triggered the event, in
//! listener-registration order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of builder lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuilderEventKind {
    /// Wildcard kind matching every builder event (registration only)
    Any,

    /// A configuration was requested from the builder
    ConfigurationRequest,

    /// A new configuration result was created
    ResultCreated,

    /// A cached configuration result was invalidated
    Reset,
}

impl BuilderEventKind {
    /// Whether a listener registered for `self` receives an event of
    /// kind `fired`. `Any` matches every concrete kind.
    pub fn matches(self, fired: BuilderEventKind) -> bool {
        self == BuilderEventKind::Any || self == fired
    }
}

impl std::fmt::Display for BuilderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderEventKind::Any => write!(f, "any"),
            BuilderEventKind::ConfigurationRequest => write!(f, "configuration-request"),
            BuilderEventKind::ResultCreated => write!(f, "result-created"),
            BuilderEventKind::Reset => write!(f, "reset"),
        }
    }
}

/// A builder lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderEvent {
    /// Event kind
    pub kind: BuilderEventKind,

    /// Identifier of the builder that emitted the event
    pub builder_id: uuid::Uuid,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Additional metadata
    pub metadata: Option<serde_json::Value>,
}

impl BuilderEvent {
    /// Create a new event
    pub fn new(kind: BuilderEventKind, builder_id: uuid::Uuid) -> Self {
        Self {
            kind,
            builder_id,
            timestamp: chrono::Utc::now(),
            metadata: None,
        }
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Callback invoked when a matching builder event occurs
pub trait BuilderEventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &BuilderEvent);
}

/// Closure adapter for [`BuilderEventListener`]
pub struct FnListener<F>(F);

impl<F> FnListener<F>
where
    F: Fn(&BuilderEvent) + Send + Sync,
{
    /// Wrap a closure as a listener
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> BuilderEventListener for FnListener<F>
where
    F: Fn(&BuilderEvent) + Send + Sync,
{
    fn on_event(&self, event: &BuilderEvent) {
        (self.0)(event);
    }
}

/// Wrap a closure into a shareable listener
pub fn listener<F>(f: F) -> Arc<dyn BuilderEventListener>
where
    F: Fn(&BuilderEvent) + Send + Sync + 'static,
{
    Arc::new(FnListener::new(f))
}

struct Registration {
    kind: BuilderEventKind,
    listener: Arc<dyn BuilderEventListener>,
}

/// Ordered registry of builder event listeners
///
/// Listener identity is the `Arc` pointer: removing requires the same `Arc`
/// that was registered. Removing a listener that was never registered is a
/// silent no-op.
#[derive(Default)]
pub struct EventListenerList {
    registrations: parking_lot::RwLock<Vec<Registration>>,
}

impl EventListenerList {
    /// Create an empty listener list
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for the given event kind
    pub fn add(&self, kind: BuilderEventKind, listener: Arc<dyn BuilderEventListener>) {
        let mut registrations = self.registrations.write();
        registrations.push(Registration { kind, listener });
        tracing::trace!(kind = %kind, total = registrations.len(), "Listener registered");
    }

    /// Remove the first registration matching the kind and listener identity.
    ///
    /// Returns `true` if a registration was removed.
    pub fn remove(&self, kind: BuilderEventKind, listener: &Arc<dyn BuilderEventListener>) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        if let Some(pos) = registrations
            .iter()
            .position(|r| r.kind == kind && Arc::ptr_eq(&r.listener, listener))
        {
            registrations.remove(pos);
        }
        registrations.len() < before
    }

    /// Dispatch an event to all matching listeners, in registration order
    pub fn fire(&self, event: &BuilderEvent) {
        // Snapshot under the read lock so listeners may re-register freely.
        let matching: Vec<Arc<dyn BuilderEventListener>> = {
            let registrations = self.registrations.read();
            registrations
                .iter()
                .filter(|r| r.kind.matches(event.kind))
                .map(|r| Arc::clone(&r.listener))
                .collect()
        };

        if !matching.is_empty() {
            tracing::trace!(
                kind = %event.kind,
                listeners = matching.len(),
                "Dispatching builder event"
            );
        }

        for listener in matching {
            listener.on_event(event);
        }
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// Whether the list has no registrations
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Remove all registrations
    pub fn clear(&self) {
        self.registrations.write().clear();
    }
}

impl std::fmt::Debug for EventListenerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListenerList")
            .field("registrations", &self.len())
            .finish()
    }
}
