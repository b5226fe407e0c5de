/// Document decoding tests
///
/// The decoder never rejects a well-formed JSON document: unknown shapes are
/// normalised and only invalid JSON or a scalar root is an error.
use optclause_parser::{Document, ParseError};

#[test]
fn test_array_and_object_roots_are_equivalent() {
    let nodes = r#"[
        { "element_id": "a", "text": "First" },
        { "element_id": "b", "text": "Second", "children": [{ "element_id": "c", "text": "Third" }] }
    ]"#;

    let from_array = Document::from_json_str(nodes).unwrap();
    let from_children = Document::from_json_str(&format!(r#"{{ "children": {nodes} }}"#)).unwrap();
    let from_paragraphs =
        Document::from_json_str(&format!(r#"{{ "paragraphs": {nodes} }}"#)).unwrap();

    assert_eq!(from_array, from_children);
    assert_eq!(from_array, from_paragraphs);
    assert_eq!(from_array.paragraphs.len(), 2);
}

#[test]
fn test_fallback_ids_follow_index_path() {
    let doc = Document::from_json_str(
        r#"[{ "text": "no id" }, { "text": "parent", "children": [{}, { "text": "leaf" }] }]"#,
    )
    .unwrap();

    let mut ids = Vec::new();
    doc.walk(&mut |node, path| ids.push((node.id.clone(), path.to_vec())));
    assert_eq!(
        ids,
        vec![
            ("0".to_string(), vec![0]),
            ("1".to_string(), vec![1]),
            ("1.0".to_string(), vec![1, 0]),
            ("1.1".to_string(), vec![1, 1]),
        ]
    );
}

#[test]
fn test_reset_version_and_numeric_ids() {
    let doc = Document::from_json_str(r#"[{ "id": 42, "text": "x", "resetVersion": 3 }]"#).unwrap();

    let node = &doc.paragraphs[0];
    assert_eq!(node.id, "42");
    assert_eq!(node.reset_version, 3);
}

#[test]
fn test_object_without_children_is_empty() {
    let doc = Document::from_json_str(r#"{ "title": "Lease" }"#).unwrap();
    assert!(doc.paragraphs.is_empty());
}

#[test]
fn test_scalar_root_is_rejected() {
    let err = Document::from_json_str("17").unwrap_err();
    assert!(matches!(err, ParseError::InvalidRoot { ref found } if found == "a number"));
}

#[test]
fn test_invalid_json_reports_position() {
    let err = Document::from_json_str("[\n  { \"text\": }\n]").unwrap_err();
    match err {
        ParseError::Json { line, .. } => assert_eq!(line, 2),
        other => panic!("expected JSON error, got {other:?}"),
    }
}
