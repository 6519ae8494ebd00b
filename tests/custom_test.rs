use kiln::config::build_registry;
use kiln::error::{error_chain, Error, Result};
use kiln::operation::{Action, CustomOperation, Operation, Pattern, RegisteredOperation};
use kiln::processor::{OperationContext, Outcome, Processor, RunSummary};
use kiln::registry::{GeneratorDefinition, Registry};
use kiln::renderer::MiniJinjaRenderer;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn run(registry: &Registry, input: Value, dest: &Path) -> Result<RunSummary> {
    let config_dir = TempDir::new().unwrap();
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(registry, &engine, dest, config_dir.path().join("kiln.yml"));
    processor.run_generator("gen", &input)
}

fn single(operation: Operation) -> Registry {
    let mut registry = Registry::new();
    registry.register_generator("gen", GeneratorDefinition { operations: vec![operation], ..Default::default() });
    registry
}

fn write_marker(data: &Value, options: &Map<String, Value>, context: &OperationContext<'_>) -> anyhow::Result<()> {
    let name = options.get("file").and_then(Value::as_str).unwrap_or("marker.txt");
    let content = context.render("{{ greeting }}!", data)?;
    fs::write(context.destination.join(name), content)?;
    Ok(())
}

fn always_fails(_: &Value, _: &Map<String, Value>, _: &OperationContext<'_>) -> anyhow::Result<()> {
    anyhow::bail!("disk on fire")
}

#[test]
fn test_custom_callback_sees_data_and_context() {
    let dest = TempDir::new().unwrap();
    let registry = single(Operation::Custom(CustomOperation {
        common: Default::default(),
        name: "touch".to_string(),
        action: Action::callback(|data: &Value, context: &OperationContext<'_>| -> anyhow::Result<()> {
            let path = context.destination.join(format!("{}.txt", data["name"].as_str().unwrap_or("x")));
            fs::write(path, "touched")?;
            Ok(())
        }),
    }));

    let summary = run(&registry, json!({"name": "flag"}), dest.path()).unwrap();

    assert_eq!(fs::read_to_string(dest.path().join("flag.txt")).unwrap(), "touched");
    assert_eq!(summary.outcomes, vec![Outcome::Custom { name: "touch".to_string() }]);
}

#[test]
fn test_custom_failure_is_wrapped_with_cause() {
    let dest = TempDir::new().unwrap();
    let registry = single(Operation::Custom(CustomOperation {
        common: Default::default(),
        name: "explode".to_string(),
        action: Action::callback(|_: &Value, _: &OperationContext<'_>| -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }),
    }));

    let err = run(&registry, json!({}), dest.path()).unwrap_err();

    match &err {
        Error::OperationError { name, .. } => assert_eq!(name, "explode"),
        other => panic!("Expected OperationError, got {other:?}"),
    }
    let causes: Vec<String> = error_chain(&err).map(|e| e.to_string()).collect();
    assert_eq!(causes, vec!["operation 'explode' failed".to_string(), "boom".to_string()]);
}

#[test]
fn test_registered_handler_receives_options() {
    let config = r#"
generators:
  gen:
    operations:
      - type: marker
        file: hello.txt
"#;
    let dest = TempDir::new().unwrap();
    let mut registry = build_registry(config).unwrap();
    registry.register_handler("marker", write_marker);

    run(&registry, json!({"greeting": "hello"}), dest.path()).unwrap();

    assert_eq!(fs::read_to_string(dest.path().join("hello.txt")).unwrap(), "hello!");
}

#[test]
fn test_unknown_operation_type() {
    let config = r#"
generators:
  gen:
    operations:
      - type: lint
"#;
    let dest = TempDir::new().unwrap();
    let registry = build_registry(config).unwrap();

    let err = run(&registry, json!({}), dest.path()).unwrap_err();

    assert!(matches!(err, Error::UnknownOperationTypeError { type_name } if type_name == "lint"));
}

#[test]
fn test_builtin_wins_over_registered_handler() {
    let config = r#"
generators:
  gen:
    operations:
      - type: create
        filePath: a.txt
        templateStr: builtin
"#;
    let dest = TempDir::new().unwrap();
    let mut registry = build_registry(config).unwrap();
    registry.register_handler("create", always_fails);

    run(&registry, json!({}), dest.path()).unwrap();

    assert_eq!(fs::read_to_string(dest.path().join("a.txt")).unwrap(), "builtin");
}

#[test]
fn test_registered_failure_respects_halt_on_error() {
    let dest = TempDir::new().unwrap();
    let mut registry = single(Operation::Registered(RegisteredOperation {
        type_name: "fragile".to_string(),
        common: serde_json::from_value(json!({"haltOnError": false})).unwrap(),
        options: Map::new(),
    }));
    registry.register_handler("fragile", always_fails);

    let summary = run(&registry, json!({}), dest.path()).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.dispatched, 1);
}

#[test]
fn test_replace_in_file_reports_changes() {
    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("config.txt"), "mode = debug\nlevel = debug\n").unwrap();
    let registry = single(Operation::Custom(CustomOperation {
        common: Default::default(),
        name: "release".to_string(),
        action: Action::callback(|_: &Value, context: &OperationContext<'_>| -> anyhow::Result<()> {
            let pattern = Pattern::Literal("debug".to_string());
            assert!(context.replace_in_file("config.txt", &pattern, "release")?);
            assert!(!context.replace_in_file("config.txt", &pattern, "release")?);
            Ok(())
        }),
    }));

    run(&registry, json!({}), dest.path()).unwrap();

    assert_eq!(
        fs::read_to_string(dest.path().join("config.txt")).unwrap(),
        "mode = release\nlevel = release\n"
    );
}

#[test]
fn test_replace_in_file_literal_keeps_dollar() {
    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("b.txt"), "price: X\n").unwrap();
    let registry = single(Operation::Custom(CustomOperation {
        common: Default::default(),
        name: "price".to_string(),
        action: Action::callback(|_: &Value, context: &OperationContext<'_>| -> anyhow::Result<()> {
            context.replace_in_file("b.txt", &Pattern::Literal("X".to_string()), "$5")?;
            Ok(())
        }),
    }));

    run(&registry, json!({}), dest.path()).unwrap();

    assert_eq!(fs::read_to_string(dest.path().join("b.txt")).unwrap(), "price: $5\n");
}

#[cfg(unix)]
#[test]
fn test_command_operation_type_from_config() {
    let config = r#"
operationTypes:
  stamp: "touch {{ file }}"
generators:
  gen:
    operations:
      - type: stamp
        file: stamped.txt
      - type: custom
        name: listing
        action: "sh -c 'cat > {{ name }}.json'"
"#;
    let dest = TempDir::new().unwrap();
    let registry = build_registry(config).unwrap();

    run(&registry, json!({"name": "input"}), dest.path()).unwrap();

    assert!(dest.path().join("stamped.txt").is_file());
    let written: Value =
        serde_json::from_str(&fs::read_to_string(dest.path().join("input.json")).unwrap()).unwrap();
    assert_eq!(written, json!({"name": "input"}));
}

#[cfg(unix)]
#[test]
fn test_failing_command_is_command_error() {
    let config = r#"
generators:
  gen:
    operations:
      - type: custom
        name: nope
        action: "false"
"#;
    let dest = TempDir::new().unwrap();
    let registry = build_registry(config).unwrap();

    let err = run(&registry, json!({}), dest.path()).unwrap_err();

    assert!(matches!(err, Error::CommandError { .. }));
}
