//! Context aggregation - merging codebase, session and environment facts
//!
//! The [`ContextAggregator`] owns the session-lifetime context slots and
//! hands out owned [`AggregatedContext`] snapshots. Observers are called
//! with a fresh snapshot after every mutation, in registration order.

mod optimizer;

pub use optimizer::{ContextOptimizer, TRUNCATION_MARKER, codebase_summary};

use crate::model::{
    AggregatedContext, ClassifiedError, CodebaseContext, Context, ContextSource,
    EnvironmentContext, SessionContext,
};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Relevance of codebase context when the error names a source file
const CODEBASE_RELEVANCE_WITH_FILE: f64 = 0.8;
/// Relevance of codebase context otherwise
const CODEBASE_RELEVANCE: f64 = 0.5;
/// Relevance of session context
const SESSION_RELEVANCE: f64 = 0.5;

/// Callback invoked with a snapshot after each context change
pub type ContextObserver = Box<dyn Fn(&AggregatedContext) + Send + Sync>;

/// Handle returned by [`ContextAggregator::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A partial update routed to one context slot
#[derive(Debug, Clone)]
pub struct ContextUpdate {
    pub source: ContextSource,
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl ContextUpdate {
    pub fn new(source: ContextSource, data: Map<String, Value>) -> Self {
        Self {
            source,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Build an update from a JSON object; non-object values yield an empty update
    pub fn from_json(source: ContextSource, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(source, data)
    }
}

/// Context judged relevant to one error
#[derive(Debug, Clone, Default)]
pub struct RelevantContext {
    pub context_items: Vec<Context>,
    /// Score per source name ("codebase", "session")
    pub relevance_scores: BTreeMap<String, f64>,
}

/// Owns and merges context from every source
pub struct ContextAggregator {
    codebase: Option<CodebaseContext>,
    session: Option<SessionContext>,
    environment: Option<EnvironmentContext>,
    custom_contexts: Vec<Context>,
    observers: Vec<(SubscriptionId, ContextObserver)>,
    next_subscription: u64,
}

impl Default for ContextAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAggregator")
            .field("codebase", &self.codebase)
            .field("session", &self.session)
            .field("environment", &self.environment)
            .field("custom_contexts", &self.custom_contexts)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ContextAggregator {
    /// Create an aggregator with a fresh session
    pub fn new() -> Self {
        Self {
            codebase: None,
            session: Some(SessionContext::new()),
            environment: None,
            custom_contexts: Vec::new(),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn codebase(&self) -> Option<&CodebaseContext> {
        self.codebase.as_ref()
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn environment(&self) -> Option<&EnvironmentContext> {
        self.environment.as_ref()
    }

    /// Register an observer; returns a handle for [`Self::unsubscribe`]
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&AggregatedContext) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Replace the codebase slot
    pub fn set_codebase_context(&mut self, context: CodebaseContext) {
        self.codebase = Some(context);
        self.notify_observers();
    }

    /// Replace the environment slot
    pub fn set_environment_context(&mut self, context: EnvironmentContext) {
        self.environment = Some(context);
        self.notify_observers();
    }

    /// Route an update to its slot, or append it as custom context
    ///
    /// Only fields the slot already defines are merged; anything else in
    /// `data` is ignored. Updates for absent slots (and for sources without
    /// a built-in slot) are kept verbatim in `custom_contexts`.
    pub fn update_context(&mut self, update: ContextUpdate) {
        match update.source {
            ContextSource::Codebase if self.codebase.is_some() => {
                self.codebase = self.codebase.as_ref().map(|c| merge_recognized(c, &update.data));
            }
            ContextSource::Session if self.session.is_some() => {
                self.session = self.session.as_ref().map(|s| merge_recognized(s, &update.data));
            }
            ContextSource::Environment if self.environment.is_some() => {
                self.environment = self
                    .environment
                    .as_ref()
                    .map(|e| merge_recognized(e, &update.data));
            }
            _ => {
                debug!(source = %update.source, "Storing update as custom context");
                self.custom_contexts.push(Context {
                    source: update.source,
                    timestamp: update.timestamp,
                    data: update.data,
                });
            }
        }

        self.notify_observers();
    }

    /// Owned snapshot of the current state
    pub fn build_context(&self) -> AggregatedContext {
        AggregatedContext {
            codebase: self.codebase.clone(),
            session: self.session.clone(),
            environment: self.environment.clone(),
            custom_contexts: self.custom_contexts.clone(),
            relevance_scores: BTreeMap::new(),
        }
    }

    /// Heuristic relevance of each available source to `error`
    pub fn get_relevant_context(&self, error: &ClassifiedError) -> RelevantContext {
        let mut relevant = RelevantContext::default();

        if let Some(ref codebase) = self.codebase {
            relevant.context_items.push(snapshot_item(ContextSource::Codebase, codebase));
            let score = if error.source_file.is_some() {
                CODEBASE_RELEVANCE_WITH_FILE
            } else {
                CODEBASE_RELEVANCE
            };
            relevant.relevance_scores.insert("codebase".to_string(), score);
        }

        if let Some(ref session) = self.session {
            relevant.context_items.push(snapshot_item(ContextSource::Session, session));
            relevant
                .relevance_scores
                .insert("session".to_string(), SESSION_RELEVANCE);
        }

        relevant
    }

    /// Append an error to the session history. History is never trimmed.
    pub fn add_error_to_session(&mut self, error: &ClassifiedError) {
        if let Some(ref mut session) = self.session {
            session.previous_errors.push(error.raw_message.clone());
        }
    }

    fn notify_observers(&self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.build_context();
        for (_, observer) in &self.observers {
            observer(&snapshot);
        }
    }
}

fn snapshot_item<T: Serialize>(source: ContextSource, value: &T) -> Context {
    let mut data = Map::new();
    match serde_json::to_value(value) {
        Ok(v) => {
            data.insert("context".to_string(), v);
        }
        Err(e) => warn!(%source, error = %e, "Could not serialize context item"),
    }
    Context {
        source,
        timestamp: Utc::now(),
        data,
    }
}

/// Apply the fields of `data` that `current` already has, one at a time.
/// A field whose value does not fit the slot's type is skipped.
fn merge_recognized<T>(current: &T, data: &Map<String, Value>) -> T
where
    T: Serialize + DeserializeOwned + Clone,
{
    let Ok(Value::Object(mut fields)) = serde_json::to_value(current) else {
        return current.clone();
    };
    let mut merged = current.clone();

    for (key, value) in data {
        if !fields.contains_key(key) {
            debug!(key = %key, "Ignoring unrecognized context field");
            continue;
        }

        let previous = fields.insert(key.clone(), value.clone());
        match serde_json::from_value::<T>(Value::Object(fields.clone())) {
            Ok(next) => merged = next,
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring context field with incompatible value");
                if let Some(previous) = previous {
                    fields.insert(key.clone(), previous);
                }
            }
        }
    }

    merged
}
