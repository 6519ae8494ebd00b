use kiln::config::build_registry;
use kiln::error::{Error, Result};
use kiln::processor::{Outcome, Processor, RunSummary};
use kiln::renderer::MiniJinjaRenderer;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

/// Keeps every record emitted on the current test thread.
struct Capture;

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

impl Log for Capture {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| records.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static LOGGER: Capture = Capture;
static INIT: Once = Once::new();

fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Debug);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
    let result = f();
    let errors = RECORDS.with(|records| {
        records
            .borrow_mut()
            .drain(..)
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, message)| message)
            .collect()
    });
    (result, errors)
}

const MODULE: &str = r#"
  module:
    operations:
      - type: create
        filePath: "{{ name }}.txt"
        templateStr: "{{ name }}"
"#;

fn fan_out(halt_on_error: bool) -> String {
    format!(
        "generators:\n{MODULE}\n  modules:\n    operations:\n      - type: forMany\n        generatorId: module\n        haltOnError: {halt_on_error}\n        items: [{{name: a}}, {{name: b}}]\n"
    )
}

/// A halting fan-out nested inside a fan-out that continues on errors.
fn nested_fan_out() -> String {
    format!(
        "{}  all:\n    operations:\n      - type: forMany\n        generatorId: modules\n        haltOnError: false\n        items: [{{}}]\n",
        fan_out(true)
    )
}

fn run(config: &str, generator_id: &str, dest: &Path) -> Result<RunSummary> {
    let config_dir = TempDir::new().unwrap();
    let registry = build_registry(config).unwrap();
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&registry, &engine, dest, config_dir.path().join("kiln.yml"));
    processor.run_generator(generator_id, &json!({}))
}

fn exists_errors(errors: &[String]) -> usize {
    errors.iter().filter(|message| message.contains("file already exists")).count()
}

#[test]
fn test_continued_failure_is_logged_once() {
    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("a.txt"), "keep").unwrap();

    let (summary, errors) = capture(|| run(&fan_out(false), "modules", dest.path()));

    match &summary.unwrap().outcomes[0] {
        Outcome::FanOut { failed, dispatched, .. } => {
            assert_eq!(*failed, 1);
            assert_eq!(*dispatched, 2);
        }
        other => panic!("Expected fan-out outcome, got {other:?}"),
    }
    assert_eq!(exists_errors(&errors), 1);
    assert!(dest.path().join("b.txt").is_file());
}

#[test]
fn test_halting_fan_out_failure_is_logged_where_it_is_caught() {
    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("a.txt"), "keep").unwrap();

    let (summary, errors) = capture(|| run(&nested_fan_out(), "all", dest.path()));

    assert!(summary.is_ok());
    assert_eq!(exists_errors(&errors), 1);
    assert!(!dest.path().join("b.txt").exists());
}

#[test]
fn test_halted_failure_is_returned_not_logged() {
    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("a.txt"), "keep").unwrap();

    let (summary, errors) = capture(|| run(&fan_out(true), "modules", dest.path()));

    assert!(matches!(summary, Err(Error::FileExistsError { .. })));
    assert_eq!(exists_errors(&errors), 0);
    assert!(!dest.path().join("b.txt").exists());
}
