//! Contract tests for the configuration builder
//!
//! Exercises the `ConfigurationBuilder` trait through a minimal custom
//! implementation and through the full `ConfigBuilder`, covering the
//! listener registration semantics, layered merging, validation failures
//! and result caching.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use layerconf::events::{BuilderEvent, EventListenerList, listener};
use layerconf::prelude::*;
use layerconf::validators::FunctionValidator;

/// Minimal builder producing a fixed value, used to exercise the trait
/// contract independently of `ConfigBuilder`.
struct StaticBuilder {
    value: Arc<serde_json::Value>,
    constructions: AtomicUsize,
    listeners: EventListenerList,
}

impl StaticBuilder {
    fn new(value: serde_json::Value) -> Self {
        Self {
            value: Arc::new(value),
            constructions: AtomicUsize::new(0),
            listeners: EventListenerList::new(),
        }
    }
}

#[async_trait]
impl ConfigurationBuilder for StaticBuilder {
    type Output = Arc<serde_json::Value>;

    async fn get_configuration(&self) -> ConfigResult<Self::Output> {
        let id = uuid::Uuid::nil();
        self.listeners
            .fire(&BuilderEvent::new(BuilderEventKind::ConfigurationRequest, id));
        self.constructions.fetch_add(1, Ordering::SeqCst);
        let value = Arc::clone(&self.value);
        self.listeners
            .fire(&BuilderEvent::new(BuilderEventKind::ResultCreated, id));
        Ok(value)
    }

    fn add_event_listener(
        &self,
        kind: BuilderEventKind,
        listener: Arc<dyn BuilderEventListener>,
    ) {
        self.listeners.add(kind, listener);
    }

    fn remove_event_listener(
        &self,
        kind: BuilderEventKind,
        listener: &Arc<dyn BuilderEventListener>,
    ) -> bool {
        self.listeners.remove(kind, listener)
    }
}

#[tokio::test]
async fn get_configuration_returns_a_ready_value() {
    let builder = StaticBuilder::new(json!({"ready": true}));
    let value = builder.get_configuration().await.unwrap();
    assert_eq!(value["ready"], json!(true));
}

#[tokio::test]
async fn repeated_calls_are_allowed_and_observable() {
    // The contract leaves caching to the implementation; this one constructs
    // a result per call and must count every call.
    let builder = StaticBuilder::new(json!({}));
    for _ in 0..3 {
        builder.get_configuration().await.unwrap();
    }
    assert_eq!(builder.constructions.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn removing_an_unregistered_listener_is_a_silent_no_op() {
    let builder = StaticBuilder::new(json!({}));
    let never_registered = listener(|_| {});

    assert!(!builder.remove_event_listener(BuilderEventKind::Any, &never_registered));

    // The builder still works afterwards
    builder.get_configuration().await.unwrap();
}

#[tokio::test]
async fn removed_listener_stops_receiving_events() {
    let builder = StaticBuilder::new(json!({}));
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_inner = Arc::clone(&hits);
    let l = listener(move |_| {
        hits_inner.fetch_add(1, Ordering::SeqCst);
    });

    builder.add_event_listener(BuilderEventKind::ConfigurationRequest, Arc::clone(&l));
    builder.get_configuration().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert!(builder.remove_event_listener(BuilderEventKind::ConfigurationRequest, &l));
    builder.get_configuration().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn removal_requires_the_registered_kind() {
    let builder = StaticBuilder::new(json!({}));
    let l = listener(|_| {});

    builder.add_event_listener(BuilderEventKind::ResultCreated, Arc::clone(&l));
    assert!(!builder.remove_event_listener(BuilderEventKind::Reset, &l));
    assert!(builder.remove_event_listener(BuilderEventKind::ResultCreated, &l));
}

#[tokio::test]
async fn config_builder_layers_file_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.toml");
    tokio::fs::write(&path, "[server]\nport = 9090\n").await.unwrap();

    let config = ConfigBuilder::new()
        .with_defaults_json(json!({
            "server": {"host": "localhost", "port": 8080},
            "debug": false
        }))
        .with_source(ConfigSource::File(path))
        .build()
        .await
        .unwrap();

    let port: u16 = config.get_path("server.port").await.unwrap();
    let host: String = config.get_path("server.host").await.unwrap();
    let debug: bool = config.get_path("debug").await.unwrap();

    assert_eq!(port, 9090, "file overrides defaults");
    assert_eq!(host, "localhost", "untouched defaults survive the merge");
    assert!(!debug);
}

#[tokio::test]
async fn inline_source_wins_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    tokio::fs::write(&path, r#"{"feature": {"enabled": false, "level": 3}}"#)
        .await
        .unwrap();

    let config = ConfigBuilder::new()
        .with_source(ConfigSource::File(path))
        .with_source(ConfigSource::inline(
            ConfigFormat::Json,
            r#"{"feature": {"enabled": true}}"#,
        ))
        .build()
        .await
        .unwrap();

    let enabled: bool = config.get_path("feature.enabled").await.unwrap();
    let level: u8 = config.get_path("feature.level").await.unwrap();
    assert!(enabled);
    assert_eq!(level, 3);
}

#[tokio::test]
async fn failing_optional_sources_are_skipped() {
    // An empty separator makes the env loader fail; Env is an optional
    // source, so the build falls back to the defaults.
    let loader = CompositeLoader::new().add_loader(EnvLoader::new().with_separator(""));

    let config = ConfigBuilder::new()
        .with_defaults_json(json!({"fallback": true}))
        .with_source(ConfigSource::Env)
        .with_loader(Arc::new(loader))
        .build()
        .await
        .unwrap();

    let fallback: bool = config.get_path("fallback").await.unwrap();
    assert!(fallback);
}

#[tokio::test]
async fn fail_on_missing_promotes_optional_failures() {
    let loader = CompositeLoader::new().add_loader(EnvLoader::new().with_separator(""));

    let err = ConfigBuilder::new()
        .with_defaults_json(json!({"fallback": true}))
        .with_source(ConfigSource::Env)
        .with_loader(Arc::new(loader))
        .with_fail_on_missing(true)
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidArgument { .. }));
}

#[tokio::test]
async fn missing_mandatory_file_fails_construction() {
    let err = ConfigBuilder::new()
        .with_source(ConfigSource::File("definitely/not/here.toml".into()))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[tokio::test]
async fn validator_rejection_surfaces_as_validation_error() {
    let validator = FunctionValidator::builder()
        .require_field("database.url")
        .build();

    let err = ConfigBuilder::new()
        .with_defaults_json(json!({"database": {}}))
        .with_validator(Arc::new(validator))
        .build()
        .await
        .unwrap_err();

    match err {
        ConfigError::ValidationError { field, .. } => {
            assert_eq!(field.as_deref(), Some("database.url"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn listeners_observe_the_full_lifecycle() {
    let builder = ConfigBuilder::new().with_defaults_json(json!({"k": 1}));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_inner = Arc::clone(&seen);

    builder.add_event_listener(
        BuilderEventKind::Any,
        listener(move |e| seen_inner.lock().unwrap().push(e.kind)),
    );

    builder.get_configuration().await.unwrap();
    builder.reset();
    builder.get_configuration().await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            BuilderEventKind::ConfigurationRequest,
            BuilderEventKind::ResultCreated,
            BuilderEventKind::Reset,
            BuilderEventKind::ConfigurationRequest,
            BuilderEventKind::ResultCreated,
        ]
    );
}

#[tokio::test]
async fn failed_construction_still_fires_the_request_event() {
    let builder = ConfigBuilder::new(); // no sources, construction fails
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_inner = Arc::clone(&seen);

    builder.add_event_listener(
        BuilderEventKind::Any,
        listener(move |e| seen_inner.lock().unwrap().push(e.kind)),
    );

    assert!(builder.get_configuration().await.is_err());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![BuilderEventKind::ConfigurationRequest],
        "no result event when construction fails"
    );
}

#[tokio::test]
async fn events_carry_the_builder_identity() {
    let builder = ConfigBuilder::new().with_defaults_json(json!({}));
    let expected = builder.id();
    let ids = Arc::new(Mutex::new(Vec::new()));
    let ids_inner = Arc::clone(&ids);

    builder.add_event_listener(
        BuilderEventKind::Any,
        listener(move |e| ids_inner.lock().unwrap().push(e.builder_id)),
    );

    builder.get_configuration().await.unwrap();

    let ids = ids.lock().unwrap();
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|id| *id == expected));
}

#[tokio::test]
async fn cached_results_are_shared_until_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    tokio::fs::write(&path, r#"{"counter": 1}"#).await.unwrap();

    let builder = ConfigBuilder::new()
        .with_source(ConfigSource::File(path.clone()))
        .with_result_caching(true);

    let first = builder.get_configuration().await.unwrap();
    let counter: u64 = first.get_path("counter").await.unwrap();
    assert_eq!(counter, 1);

    // Change the file; the cached result must not see it
    tokio::fs::write(&path, r#"{"counter": 2}"#).await.unwrap();
    let second = builder.get_configuration().await.unwrap();
    let counter: u64 = second.get_path("counter").await.unwrap();
    assert_eq!(counter, 1, "cached result served");

    builder.reset();
    let third = builder.get_configuration().await.unwrap();
    let counter: u64 = third.get_path("counter").await.unwrap();
    assert_eq!(counter, 2, "reset discards the cached result");
}

#[tokio::test]
async fn reload_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    tokio::fs::write(&path, r#"{"version": "a"}"#).await.unwrap();

    let config = ConfigBuilder::new()
        .with_source(ConfigSource::File(path.clone()))
        .build()
        .await
        .unwrap();

    let version: String = config.get_path("version").await.unwrap();
    assert_eq!(version, "a");

    tokio::fs::write(&path, r#"{"version": "b"}"#).await.unwrap();
    config.reload().await.unwrap();

    let version: String = config.get_path("version").await.unwrap();
    assert_eq!(version, "b");
}

#[tokio::test]
async fn unknown_paths_and_bad_segments_error_cleanly() {
    let config = ConfigBuilder::new()
        .with_defaults_json(json!({"a": {"b": 1}}))
        .build()
        .await
        .unwrap();

    assert!(matches!(
        config.get_path::<u64>("a.missing").await.unwrap_err(),
        ConfigError::PathError { .. }
    ));
    assert!(matches!(
        config.get_path::<u64>("a..b").await.unwrap_err(),
        ConfigError::InvalidArgument { .. }
    ));
}
