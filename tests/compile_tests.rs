//! End-to-end compilation tests
//!
//! Compiles fixture descriptions and checks the registry or the error the
//! compilation stops with.

use nifxml_schema::{
    BlockKind, ErrorKind, SchemaCompiler, SchemaError, SchemaOrigin, SchemaRegistry, TypeTarget, Value,
};

fn compile(text: &str) -> Result<SchemaRegistry, SchemaError> {
    SchemaCompiler::new().compile_str(text)
}

// =============================================================================
// Referential Integrity
// =============================================================================

#[test]
fn test_unknown_ancestor_fails_then_valid_document_compiles() {
    let err = compile(include_str!("fixtures/unknown_ancestor.xml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
    assert!(err.to_string().contains("AController"), "{err}");
    assert_eq!(err.line(), None);

    let registry = compile(include_str!("fixtures/valid_record.xml")).unwrap();
    assert!(registry.is_unconditional("Vector3"));

    let flag_default = registry.primitive_type("flag").unwrap().default.clone();
    assert_eq!(flag_default, Some(Value::Int(0)));
    let node = registry.record_type("NiNode").unwrap();
    assert_eq!(node.field("flags").unwrap().default, flag_default);
    assert_eq!(node.field("mask").unwrap().default, Some(Value::Int(12)));
    let controller = registry.ancestor("AController").unwrap();
    assert_eq!(controller.field("flags").unwrap().default, flag_default);
}

#[test]
fn test_every_field_type_resolves_after_compile() {
    let registry = SchemaCompiler::new().compile_bundled().unwrap();
    let blocks = registry
        .field_groups()
        .chain(registry.ancestors())
        .chain(registry.record_types());
    for block in blocks {
        for field in &block.fields {
            assert!(
                registry.resolve_type(&field.type_ref).is_some(),
                "{}.{} -> {}",
                block.id,
                field.name,
                field.type_ref
            );
        }
        for ancestor in &block.ancestors {
            assert!(registry.ancestor(ancestor).is_some(), "{} inherits {}", block.id, ancestor);
        }
    }
}

#[test]
fn test_unknown_field_type_names_owner() {
    let text = r#"<niflotoxml>
  <compound name="Quaternion"><add name="w" type="float"/></compound>
</niflotoxml>"#;
    match compile(text).unwrap_err() {
        SchemaError::UnknownType { kind, owner, type_ref } => {
            assert_eq!(kind, BlockKind::FieldGroup);
            assert_eq!(owner, "Quaternion");
            assert_eq!(type_ref, "float");
        }
        other => panic!("Expected UnknownType, got {:?}", other),
    }
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn test_self_embedding_compound_is_cyclic() {
    let err = compile(include_str!("fixtures/self_embedding.xml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
    assert!(err.to_string().contains("Tree"));
}

#[test]
fn test_self_inheriting_ancestor_is_cyclic() {
    let err = compile(include_str!("fixtures/self_inheritance.xml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
    assert!(err.to_string().contains("NiObject"));
}

#[test]
fn test_non_ascii_compound_names() {
    let text = r#"<niflotoxml>
  <type name="float" type="float"/>
  <compound name="Ärger"><add name="x" type="float"/></compound>
  <niblock name="N"><add name="a" type="Ärger"/></niblock>
</niflotoxml>"#;
    let registry = compile(text).unwrap();
    assert_eq!(registry.record_type("N").unwrap().field("a").unwrap().type_ref, "ärger");
    assert!(registry.is_unconditional("Ärger"));

    let embedding = r#"<niflotoxml><compound name="Ärger"><add name="self" type="Ärger"/></compound></niflotoxml>"#;
    let err = compile(embedding).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
    assert!(err.to_string().contains("Ärger"), "{err}");
}

#[test]
fn test_truncated_document_has_line_context() {
    let err = compile("<niflotoxml>\n  <type name=\"a\" type=\"uint8\"/>\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.line().is_some());
    assert!(err.to_string().starts_with("XML parse error (line 3)"), "{err}");
}

#[test]
fn test_two_step_cycle_only_fails_in_strict_mode() {
    let text = r#"<niflotoxml>
  <compound name="Outer"><add name="inner" type="inner"/></compound>
  <compound name="Inner"><add name="outer" type="outer"/></compound>
</niflotoxml>"#;
    let registry = compile(text).unwrap();
    assert!(matches!(registry.resolve_type("inner"), Some(TypeTarget::FieldGroup(_))));

    let err = SchemaCompiler::new().strict_cycles(true).compile_str(text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
}

// =============================================================================
// Unconditional Types
// =============================================================================

#[test]
fn test_unconditional_classification() {
    let registry = compile(include_str!("fixtures/conditioned.xml")).unwrap();
    assert!(registry.is_unconditional("Plain"));
    assert!(registry.is_unconditional("float"));
    assert!(registry.is_unconditional("bool"));
    assert!(!registry.is_unconditional("WithCond"));
    assert!(!registry.is_unconditional("WithVersion"));
    assert!(!registry.is_unconditional("WithUpperBound"));
    let ids: Vec<_> = registry.unconditional_types().collect();
    assert_eq!(ids, ["float", "bool", "Plain"]);
}

#[test]
fn test_one_conditioned_field_removes_classification() {
    let plain = r#"<niflotoxml>
  <type name="float" type="float"/>
  <compound name="Pair"><add name="a" type="float"/><add name="b" type="float"/></compound>
  <ancestor name="Base"><add name="a" type="float"/></ancestor>
</niflotoxml>"#;
    let registry = compile(plain).unwrap();
    assert!(registry.is_unconditional("Pair"));
    assert!(registry.ancestor("Base").unwrap().is_unconditional());

    let conditioned = plain
        .replace(r#"<add name="b" type="float"/>"#, r#"<add name="b" type="float" cond="a != 0"/>"#)
        .replace(r#"<ancestor name="Base"><add name="a" type="float"/>"#, r#"<ancestor name="Base"><add name="a" type="float" ver1="20.0.0.4"/>"#);
    let registry = compile(&conditioned).unwrap();
    assert!(!registry.is_unconditional("Pair"));
    assert!(!registry.ancestor("Base").unwrap().is_unconditional());
}

// =============================================================================
// Grammar
// =============================================================================

#[test]
fn test_nesting_beyond_bound_is_grammar_violation() {
    let mut text = String::from("<niflotoxml>");
    let names = ["niblock", "add", "add", "add", "add", "add", "add", "add"];
    for name in names {
        text.push_str(&format!("<{name} name=\"n\" type=\"t\">"));
    }
    for name in names.iter().rev() {
        text.push_str(&format!("</{name}>"));
    }
    text.push_str("</niflotoxml>");

    let err = compile(&text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Grammar);
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_wrong_root_element() {
    let err = compile("<nifxml><type name=\"a\" type=\"uint8\"/></nifxml>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Grammar);
}

#[test]
fn test_type_with_children_rejected() {
    let text = "<niflotoxml>\n<type name=\"a\" type=\"uint8\">\n<add name=\"x\" type=\"a\"/>\n</type>\n</niflotoxml>";
    let err = compile(text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Grammar);
    assert_eq!(err.line(), Some(3));
    assert!(err.to_string().starts_with("XML parse error (line 3)"));
}

#[test]
fn test_inherit_in_compound_rejected() {
    let text = r#"<niflotoxml><compound name="A"><inherit name="B"/></compound></niflotoxml>"#;
    assert_eq!(compile(text).unwrap_err().kind(), ErrorKind::Grammar);
}

#[test]
fn test_empty_block_name_rejected() {
    let text = r#"<niflotoxml><niblock><add name="x" type="y"/></niblock></niflotoxml>"#;
    let err = compile(text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Declaration);
    assert!(err.to_string().contains("invalid niblock declaration"));
}

#[test]
fn test_bad_primitive_default_rejected() {
    let text = r#"<niflotoxml><type name="byte" type="uint8" value="300"/></niflotoxml>"#;
    assert_eq!(compile(text).unwrap_err().kind(), ErrorKind::Declaration);
}

// =============================================================================
// Registry Lifecycle
// =============================================================================

#[test]
fn test_second_compilation_discards_first() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.xml");
    let second = dir.path().join("second.xml");
    std::fs::write(
        &first,
        r#"<niflotoxml><type name="flag" type="uint16" value="1"/><compound name="Old"><add name="f" type="flag"/></compound></niflotoxml>"#,
    )
    .unwrap();
    std::fs::write(
        &second,
        r#"<niflotoxml><type name="flag" type="uint32" value="2"/></niflotoxml>"#,
    )
    .unwrap();

    let compiler = SchemaCompiler::new().fallback_to_bundled(false);
    let mut registry = SchemaRegistry::new();
    compiler.compile_into(&mut registry, &first).unwrap();
    assert!(registry.field_group("Old").is_some());

    compiler.compile_into(&mut registry, &second).unwrap();
    assert!(registry.field_group("Old").is_none());
    assert_eq!(registry.primitive_type_overloads("flag").len(), 1);
    assert_eq!(registry.primitive_type("flag").unwrap().default, Some(Value::Int(2)));
}

#[test]
fn test_duplicate_primitive_ids_last_wins() {
    let text = r#"<niflotoxml>
  <type name="count" type="uint16" value="1"/>
  <type name="count" type="uint32" value="2"/>
  <compound name="Holder"><add name="n" type="count"/></compound>
</niflotoxml>"#;
    let registry = compile(text).unwrap();
    assert_eq!(registry.primitive_type_overloads("count").len(), 2);
    assert_eq!(
        registry.field_group("Holder").unwrap().field("n").unwrap().default,
        Some(Value::Int(2))
    );
}

#[test]
fn test_missing_file_uses_bundled_description() {
    let (registry, origin) = SchemaCompiler::new()
        .compile_path_with_origin("/does/not/exist.xml")
        .unwrap();
    assert_eq!(origin, SchemaOrigin::Bundled);
    assert!(registry.record_type("NiNode").is_some());

    let err = SchemaCompiler::new()
        .fallback_to_bundled(false)
        .compile_path("/does/not/exist.xml")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_registry_serializes_to_json() {
    let registry = compile(include_str!("fixtures/valid_record.xml")).unwrap();
    let json = serde_json::to_value(&registry).unwrap();
    assert_eq!(json["field_groups"]["Vector3"]["fields"][0]["name"], "x");
    assert_eq!(json["primitive_types"]["flag"][0]["kind"], "uint16");
    assert_eq!(json["unconditional"][2], "Vector3");
}
