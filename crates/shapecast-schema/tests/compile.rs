//! Integration test: schema compilation failures and diagnostics.
//!
//! Unsupported shapes and runaway nesting are hard compile errors. Malformed
//! annotations, name collisions and unencodable sample fields are not: they
//! are reported through `tracing` and compilation carries on, which these
//! tests observe by installing a capturing subscriber.

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::json;
use shapecast_core::Describe;
use shapecast_schema::{compile, CompileError, CompileOptions, Schema};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber writing WARN and above into the returned buffer.
fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture.contents())
}

fn double(x: i32) -> i32 {
    x * 2
}

#[derive(Describe)]
struct Hook {
    name: String,
    callback: fn(i32) -> i32,
}

#[test]
fn test_callable_field_is_unsupported() {
    let hook = Hook {
        name: "h".into(),
        callback: double,
    };
    assert_eq!((hook.callback)(2), 4);
    let err = Schema::compile(&hook).unwrap_err();
    assert_eq!(
        err,
        CompileError::Unsupported {
            name: "callback".into(),
            kind: "func"
        }
    );
}

#[test]
fn test_callable_root_is_unsupported() {
    let root: fn(i32) -> i32 = double;
    let err = compile(&root, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported { kind: "func", .. }));
}

#[derive(Debug, Describe)]
struct Chain {
    value: i32,
    next: Option<Box<Chain>>,
}

#[test]
fn test_self_referential_type_hits_depth_limit() {
    let chain = Chain {
        value: 1,
        next: None,
    };
    let err = Schema::compile(&chain).unwrap_err();
    assert!(matches!(err, CompileError::DepthExceeded { limit: 64, .. }));

    let options = CompileOptions {
        max_depth: 3,
        ..CompileOptions::default()
    };
    let err = Schema::compile_with(&chain, &options).unwrap_err();
    assert!(matches!(err, CompileError::DepthExceeded { limit: 3, .. }));
}

#[derive(Debug, Describe)]
struct Tree {
    label: String,
    #[tag(cast = "-")]
    children: Vec<Tree>,
}

#[test]
fn test_omitted_self_reference_compiles() {
    let tree = Tree {
        label: "root".into(),
        children: vec![],
    };
    let schema = Schema::compile(&tree).unwrap();
    assert_eq!(schema.node().children().len(), 1);
    let decoded = schema.decode_json(&json!({"label": "leaf"})).unwrap();
    assert_eq!(decoded.label, "leaf");
    assert!(decoded.children.is_empty());
}

#[derive(Debug, Default, Describe)]
struct Sloppy {
    #[tag(cast = "requird,name=,escape")]
    title: String,
    #[tag(cast = "flatten")]
    count: u32,
}

#[test]
fn test_malformed_options_warn_and_fail_open() {
    let (schema, logs) = capture_warnings(|| Schema::compile(&Sloppy::default()));
    let schema = schema.unwrap();

    let title = schema.node().child("title").unwrap();
    assert!(!title.is_required());
    assert!(title.options().escape);
    assert!(logs.contains("ignoring unknown field option"), "logs: {logs}");
    assert!(logs.contains("requird"), "logs: {logs}");
    assert!(logs.contains("ignoring option without a value"), "logs: {logs}");
    assert!(logs.contains("ignoring flatten"), "logs: {logs}");
}

#[derive(Debug, Clone, PartialEq, Default, Describe)]
struct Origin {
    source: String,
    version: u32,
}

#[derive(Debug, Default, Describe)]
struct Sighting {
    name: String,
    #[tag(cast = "flatten")]
    origin: Option<Origin>,
}

#[test]
fn test_flatten_on_optional_record_keeps_the_field() {
    let (schema, logs) = capture_warnings(|| Schema::compile(&Sighting::default()));
    let schema = schema.unwrap();
    assert!(logs.contains("ignoring flatten"), "logs: {logs}");

    let origin = schema.node().child("origin").unwrap();
    assert!(origin.is_pointer());
    assert!(schema.node().child("source").is_none());

    let absent = schema.decode_json(&json!({"name": "owl"})).unwrap();
    assert_eq!(absent.origin, None);

    let present = schema
        .decode_json(&json!({"name": "owl", "origin": {"source": "field", "version": 2}}))
        .unwrap();
    assert_eq!(
        present.origin,
        Some(Origin {
            source: "field".into(),
            version: 2
        })
    );
}

#[derive(Debug, Default, Describe)]
struct Collide {
    #[tag(cast = "name=key")]
    first: String,
    #[tag(cast = "name=key")]
    second: String,
}

#[test]
fn test_name_collision_is_logged() {
    let (schema, logs) = capture_warnings(|| Schema::compile(&Collide::default()));
    let schema = schema.unwrap();
    assert_eq!(schema.node().children()[0].declared_name(), "second");
    assert!(logs.contains("external name collision"), "logs: {logs}");
}

#[derive(Debug, Default, Describe)]
struct Counter {
    big: u64,
    small: u64,
}

#[test]
fn test_unencodable_sample_field_has_no_default() {
    let sample = Counter {
        big: u64::MAX,
        small: 9,
    };
    let (schema, logs) = capture_warnings(|| Schema::compile(&sample));
    let schema = schema.unwrap();
    assert!(schema.node().child("big").unwrap().default_value().is_none());
    assert!(schema.node().child("small").unwrap().default_value().is_some());
    assert!(logs.contains("default is left absent"), "logs: {logs}");

    let counter = schema.decode_json(&json!({})).unwrap();
    assert_eq!(counter.big, 0);
    assert_eq!(counter.small, 9);
}

#[test]
fn test_custom_annotation_namespace() {
    #[derive(Debug, Default, Describe)]
    struct Query {
        #[tag(cast = "name=q", api = "name=search,required")]
        term: String,
    }
    let schema = Schema::compile_with(&Query::default(), &CompileOptions::with_tag("api")).unwrap();
    let term = schema.node().child("search").unwrap();
    assert!(term.is_required());
    assert!(schema.node().child("q").is_none());
}
