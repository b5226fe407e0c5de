/// Determinism tests - ensure rendering is reproducible
///
/// These tests validate that:
/// - Same document and option states produce identical output on every render
/// - A warm fragment cache never changes the output
/// - A subtree rendered from its recorded context matches the full walk
use optclause_evaluator::{
    resolve_inline_options, Evaluator, OptionStateMap, ParentInfo, RenderOptions, RenderState,
    RenderedDocument, ResolveContext, StatusTable, TemplateTextProvider,
};
use optclause_parser::{Document, OptionDescriptor, ParagraphNode};

fn contract() -> Document {
    let pets = OptionDescriptor::new("pets").with_meta("name", "Pets");
    let parking = OptionDescriptor::new("parking").with_meta("name", "Parking");
    let term = OptionDescriptor::new("term").with_meta("name", "Term");

    Document::new(vec![
        ParagraphNode::new("intro", "This lease is made between the parties."),
        ParagraphNode::new(
            "use",
            "The tenant [Optional(pets):Pets:] [may keep [small] pets] and [Optional(parking):Parking:] [one car ]in the unit.",
        )
        .with_inline_option(pets)
        .with_inline_option(parking),
        ParagraphNode::new("term", "The lease runs for twelve months ]")
            .with_attached_option(term)
            .with_children(vec![
                ParagraphNode::new("term-1", "Renewal is automatic."),
                ParagraphNode::new("term-2", "Notice is due sixty days ahead."),
            ]),
    ])
}

fn render_with(evaluator: &mut Evaluator, doc: &Document, store: &OptionStateMap) -> RenderedDocument {
    let statuses = StatusTable::new();
    evaluator.render(
        doc,
        &ParentInfo::root(),
        &RenderOptions::default(),
        &RenderState::new(store, &statuses),
    )
}

#[test]
fn test_render_determinism_fresh_evaluators() {
    let doc = contract();
    let store = OptionStateMap::new().with("parking", "hidden");

    let results: Vec<RenderedDocument> = (0..10)
        .map(|_| render_with(&mut Evaluator::new(), &doc, &store))
        .collect();

    for i in 1..results.len() {
        assert_eq!(results[0], results[i], "Render {} differs from render 0", i);
    }
}

#[test]
fn test_warm_cache_matches_cold_render() {
    let doc = contract();
    let store = OptionStateMap::new().with("pets", "small-animals-only");

    let mut evaluator = Evaluator::new();
    let cold = render_with(&mut evaluator, &doc, &store);
    let warm = render_with(&mut evaluator, &doc, &store);

    assert_eq!(cold, warm);
    assert!(evaluator.cache().hits() > 0);
}

#[test]
fn test_serialized_output_is_byte_identical() {
    let doc = contract();
    let store = OptionStateMap::new();

    let first = serde_json::to_string(&render_with(&mut Evaluator::new(), &doc, &store)).unwrap();
    let second = serde_json::to_string(&render_with(&mut Evaluator::new(), &doc, &store)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_resolver_is_idempotent() {
    let doc = contract();
    let node = &doc.paragraphs[1];
    let store = OptionStateMap::new().with("pets", "hidden");
    let provider = TemplateTextProvider::default();

    let first = resolve_inline_options(
        &node.raw_text,
        &node.inline_options,
        &store,
        ResolveContext::default(),
        &provider,
    );
    let second = resolve_inline_options(
        &node.raw_text,
        &node.inline_options,
        &store,
        ResolveContext::default(),
        &provider,
    );

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_subtree_render_matches_full_walk() {
    let doc = contract();
    let store = OptionStateMap::new();
    let statuses = StatusTable::new();
    let state = RenderState::new(&store, &statuses);
    let options = RenderOptions::default();

    let mut evaluator = Evaluator::new();
    let full = evaluator.render(&doc, &ParentInfo::root(), &options, &state);

    let context = full.contexts.get("term").expect("term was rendered");
    let partial = evaluator
        .render_subtree(&doc, context, &options, &state)
        .expect("path still exists");

    assert_eq!(partial.nodes.len(), 1);
    assert_eq!(Some(&partial.nodes[0]), full.find("term"));
    assert_eq!(partial.numbering, full.numbering[2..].to_vec());
}

#[test]
fn test_subtree_render_of_removed_path() {
    let doc = contract();
    let store = OptionStateMap::new();
    let statuses = StatusTable::new();
    let state = RenderState::new(&store, &statuses);

    let mut evaluator = Evaluator::new();
    let full = evaluator.render(&doc, &ParentInfo::root(), &RenderOptions::default(), &state);
    let context = full.contexts.get("term-2").unwrap().clone();

    let shorter = Document::new(vec![doc.paragraphs[0].clone()]);
    assert!(evaluator
        .render_subtree(&shorter, &context, &RenderOptions::default(), &state)
        .is_none());
}
