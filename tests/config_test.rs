use kiln::config::{build_registry, find_config, load_config, parse_config, validate_config};
use kiln::error::Error;
use kiln::operation::Operation;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_json_and_yaml_are_accepted() {
    let json_config = r#"{"generators": {"a": {"operations": [{"type": "create", "filePath": "x", "templateStr": "y"}]}}}"#;
    let yaml_config = "generators:\n  a:\n    operations:\n      - type: create\n        filePath: x\n        templateStr: y\n";

    assert_eq!(parse_config(json_config).unwrap(), parse_config(yaml_config).unwrap());
}

#[test]
fn test_registry_keeps_declaration_order() {
    let config = r#"
partials:
  header: "// generated"
generators:
  zeta:
    description: last letter
    prompts:
      name:
        type: str
        help: Name?
    operations:
      - type: create
        filePath: a
        templateStr: "{% include 'header' %}"
      - type: forMany
        generatorId: alpha
        items: [1, 2]
  alpha:
    operations:
      - type: custom
        name: hello
        action: "echo hello"
"#;
    let registry = build_registry(config).unwrap();

    assert_eq!(registry.generator_ids(), vec!["zeta", "alpha"]);
    assert_eq!(registry.partials().get("header").map(String::as_str), Some("// generated"));

    let zeta = registry.generator("zeta").unwrap();
    assert_eq!(zeta.description, "last letter");
    assert!(zeta.prompts.contains_key("name"));
    assert!(matches!(zeta.operations[0], Operation::Create(_)));
    assert!(matches!(zeta.operations[1], Operation::ForMany(_)));
}

#[test]
fn test_prompts_keep_declaration_order() {
    let config = r#"
generators:
  g:
    prompts:
      zone:
        type: str
      crate:
        type: str
        default: "{{ zone }}-core"
      all:
        type: bool
    operations:
      - type: create
        filePath: a
        templateStr: b
"#;
    let registry = build_registry(config).unwrap();

    let prompts: Vec<&str> = registry.generator("g").unwrap().prompts.keys().map(String::as_str).collect();
    assert_eq!(prompts, vec!["zone", "crate", "all"]);
}

#[test]
fn test_operation_types_register_handlers() {
    let config = r#"
operationTypes:
  fmt: "cargo fmt"
generators:
  a:
    operations:
      - type: fmt
"#;
    let registry = build_registry(config).unwrap();

    assert!(registry.handler("fmt").is_some());
}

#[test]
fn test_schema_rejects_missing_required_fields() {
    let config = json!({"generators": {"a": {"operations": [{"type": "create", "templateStr": "y"}]}}});
    assert!(matches!(validate_config(&config), Err(Error::ConfigError(_))));

    let config = json!({"generators": {"a": {"operations": [{"filePath": "x"}]}}});
    assert!(validate_config(&config).is_err());

    let config = json!({"partials": {}});
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_schema_rejects_contradictory_options() {
    let config = json!({"generators": {"a": {"operations": [{
        "type": "create",
        "filePath": "x",
        "templateStr": "y",
        "templateFilePath": "z"
    }]}}});
    assert!(validate_config(&config).is_err());

    let config = json!({"generators": {"a": {"operations": [{
        "type": "createAll",
        "destinationPath": "out",
        "templateFilesGlob": "t/*",
        "skipIfExists": true,
        "overwrite": true
    }]}}});
    assert!(validate_config(&config).is_err());

    let config = json!({"generators": {"a": {"operations": [{
        "type": "createAll",
        "destinationPath": "out",
        "templateFilesGlob": "t/*",
        "skipIfExists": true,
        "overwrite": false
    }]}}});
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_invalid_content_is_config_error() {
    let err = build_registry("generators: [unclosed").unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[test]
fn test_find_and_load_config() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(find_config(dir.path()), Err(Error::ConfigError(_))));

    fs::write(dir.path().join("kiln.yaml"), "generators:\n  a: {}\n").unwrap();
    let path = find_config(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("kiln.yaml"));

    fs::write(dir.path().join("kiln.json"), r#"{"generators": {"b": {}}}"#).unwrap();
    let path = find_config(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("kiln.json"));

    let registry = load_config(&path).unwrap();
    assert_eq!(registry.generator_ids(), vec!["b"]);
}

#[test]
fn test_load_missing_config_is_read_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(dir.path().join("kiln.yml")).unwrap_err();
    assert!(matches!(err, Error::ReadError { .. }));
}
