//! Integration tests for editor crate

use optclause_editor::{EditorError, OptionState, RenderOptions, RenderSession};
use optclause_evaluator::{OptionStateMap, RenderNode, RenderingMode};
use std::cell::RefCell;
use std::rc::Rc;

const LEASE: &str = r#"[
    { "element_id": "intro", "text": "This agreement is made between the parties." },
    {
        "element_id": "pets-section",
        "text": "Animals ]",
        "optioninfo": { "id": "pets", "name": "Pets" },
        "children": [
            {
                "element_id": "pets-1",
                "text": "Dogs [Optional(pets):Pets:] [and cats] are allowed.",
                "inlineoptions": [{ "id": "pets", "name": "Pets" }]
            },
            { "element_id": "pets-2", "text": "A deposit applies." }
        ]
    },
    {
        "element_id": "parking",
        "text": "Parking [Optional(parking):Parking:] [for one car] is included.",
        "inlineoptions": ["{\"id\": \"parking\", \"name\": \"Parking\"}"]
    }
]"#;

fn session() -> RenderSession {
    RenderSession::from_json_str(LEASE).expect("fixture parses")
}

fn text_of(session: &RenderSession, node_id: &str) -> String {
    session
        .rendered()
        .find(node_id)
        .unwrap_or_else(|| panic!("{node_id} not rendered"))
        .inline_text()
}

fn counter(session: &mut RenderSession) -> Rc<RefCell<Vec<(String, String)>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    session.subscribe_all_numbering(move |node, numbering| {
        sink.borrow_mut().push((node.to_string(), numbering.to_string()))
    });
    log
}

#[test]
fn test_initial_render_registers_observers() -> anyhow::Result<()> {
    let mut session = RenderSession::from_json_str(LEASE)?;
    let log = counter(&mut session);
    session.render();

    assert_eq!(session.registry().notify("pets"), vec!["pets-section", "pets-1"]);
    assert_eq!(session.registry().notify("parking"), vec!["parking"]);
    assert_eq!(
        session.registry().descriptor("parking").map(|d| d.display_name()),
        Some("Parking")
    );

    assert_eq!(log.borrow().len(), 5);
    assert_eq!(
        text_of(&session, "pets-1"),
        "Dogs [Pets: and cats] are allowed. [end Pets]"
    );
    Ok(())
}

#[test]
fn test_state_change_matches_full_render() {
    let mut live = session();
    live.render();

    let dirty = live.set_option_state("pets", OptionState::Hidden);
    assert_eq!(dirty, vec!["pets-section", "pets-1"]);

    let mut fresh = session().with_states(OptionStateMap::new().with("pets", "hidden"));
    fresh.render();

    assert_eq!(live.rendered().nodes, fresh.rendered().nodes);
    assert_eq!(live.rendered().numbering, fresh.rendered().numbering);
    assert_eq!(text_of(&live, "pets-1"), "Dogs  are allowed.");
    assert_eq!(text_of(&live, "pets-section"), "");
}

#[test]
fn test_unchanged_state_renders_nothing() {
    let mut session = session();
    session.render();

    assert!(session
        .set_option_state("pets", OptionState::Default)
        .is_empty());
    assert!(session
        .set_option_state("nobody-reads-this", OptionState::Hidden)
        .is_empty());
}

#[test]
fn test_state_change_does_not_rebroadcast_numbering() {
    let mut session = session();
    let log = counter(&mut session);
    session.render();

    session.set_option_state("parking", OptionState::Choice("two-cars".into()));
    session.set_option_state("pets", OptionState::Hidden);

    assert_eq!(log.borrow().len(), 5);
    assert_eq!(text_of(&session, "parking"), "Parking for one car is included.");
}

#[test]
fn test_focus_emphasizes_subtree() {
    let mut session = session();
    session.render();

    let dirty = session.set_focus(Some("pets"));
    assert_eq!(dirty, vec!["pets-section", "pets-1"]);
    assert!(session.set_focus(Some("pets")).is_empty());

    for id in ["pets-section", "pets-2"] {
        match session.rendered().find(id) {
            Some(RenderNode::Paragraph { mode, focused, .. }) => {
                assert_eq!(*mode, RenderingMode::Emphasized, "{id}");
                assert!(*focused, "{id}");
            }
            other => panic!("{other:?}"),
        }
    }

    session.set_focus(None);
    match session.rendered().find("pets-section") {
        Some(RenderNode::Paragraph { mode, focused, .. }) => {
            assert_eq!(*mode, RenderingMode::Highlighted);
            assert!(!*focused);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn test_update_text_remounts_paragraph() {
    let mut session = session();
    session.render();

    session
        .update_text("pets-2", "A deposit of one month applies.")
        .expect("paragraph exists");

    assert_eq!(text_of(&session, "pets-2"), "A deposit of one month applies.");
    let node = session.document().node_at(&[1, 1]).unwrap();
    assert_eq!(node.reset_version, 1);
    match &session.rendered().find("pets-2").unwrap().content()[0] {
        RenderNode::Leaf { key, .. } => assert_eq!(key, "pets-2-1"),
        other => panic!("{other:?}"),
    }
}

#[test]
fn test_update_text_unknown_node() {
    let mut session = session();
    session.render();

    let err = session.update_text("missing", "text").unwrap_err();
    assert!(matches!(err, EditorError::NodeNotFound { ref node_id } if node_id == "missing"));
}

#[test]
fn test_replace_document_tears_down_removed_paragraphs() {
    let mut session = session();
    let log = counter(&mut session);
    session.render();

    let mut smaller = session.document().clone();
    smaller.paragraphs.retain(|node| node.id == "pets-section");
    session.replace_document(smaller);

    assert!(session.registry().notify("parking").is_empty());
    assert!(session.statuses().get("intro").is_none());
    assert_eq!(session.rendered().to_plain_text().lines().count(), 3);

    let renumbered: Vec<(String, String)> = log.borrow()[5..].to_vec();
    assert_eq!(
        renumbered,
        vec![
            ("pets-section".to_string(), "1".to_string()),
            ("pets-1".to_string(), "1.1".to_string()),
            ("pets-2".to_string(), "1.2".to_string()),
        ]
    );
}

#[test]
fn test_preview_session_still_tracks_readers() {
    let mut session = session().with_options(RenderOptions {
        preview_only: true,
        schedule_num: None,
    });
    session.render();
    assert!(session.registry().is_empty());
    assert_eq!(text_of(&session, "parking"), "Parking for one car is included.");

    let dirty = session.set_option_state("parking", OptionState::Hidden);
    assert_eq!(dirty, vec!["parking"]);
    assert_eq!(text_of(&session, "parking"), "Parking  is included.");
}

#[test]
fn test_close_unregisters_everything() {
    let mut session = session();
    session.render();
    session.close();

    assert!(session.registry().is_empty());
    assert!(session.statuses().is_empty());
    assert!(session.rendered().nodes.is_empty());
}

#[test]
fn test_invalid_json_is_a_parse_error() {
    let err = RenderSession::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, EditorError::Parse(_)));
}

#[test]
fn test_renamed_option_is_not_served_from_cache() -> anyhow::Result<()> {
    let with_name = |name: &str| {
        format!(
            r#"[{{
                "element_id": "p",
                "text": "A [Optional(a):A:] [x] B",
                "inlineoptions": [{{ "id": "a", "name": "{name}" }}]
            }}]"#
        )
    };
    let mut session = RenderSession::from_json_str(&with_name("Old"))?;
    session.render();
    assert!(text_of(&session, "p").contains("[Old: "));

    session.replace_document(optclause_editor::Document::from_json_str(&with_name("New"))?);
    let text = text_of(&session, "p");
    assert!(text.contains("[New: "), "{text}");
    assert!(!text.contains("[Old: "), "{text}");
    Ok(())
}

#[test]
fn test_full_walk_drops_stale_observers() -> anyhow::Result<()> {
    let mut session = RenderSession::from_json_str(
        r#"[{
            "element_id": "p",
            "text": "A [Optional(a):A:] [x] B",
            "inlineoptions": [{ "id": "a", "name": "A" }]
        }]"#,
    )?;
    session.render();
    assert_eq!(session.registry().notify("a"), vec!["p"]);

    session.replace_document(optclause_editor::Document::from_json_str(
        r#"[{ "element_id": "p", "text": "Plain text" }]"#,
    )?);
    assert!(session.registry().notify("a").is_empty());
    assert!(session.registry().descriptor("a").is_none());
    assert!(session.rendered().subscriptions.is_empty());
    assert!(session.set_option_state("a", OptionState::Hidden).is_empty());
    Ok(())
}

#[test]
fn test_refresh_keeps_subscriptions_current() {
    let mut live = session();
    live.render();
    live.update_text("pets-1", "Dogs are allowed.").expect("pets-1 exists");
    live.set_option_state("parking", OptionState::Hidden);

    let mut fresh = session().with_states(OptionStateMap::new().with("parking", "hidden"));
    fresh.update_text("pets-1", "Dogs are allowed.").expect("pets-1 exists");
    fresh.render();

    assert_eq!(live.rendered().subscriptions, fresh.rendered().subscriptions);
    assert_eq!(live.rendered().nodes, fresh.rendered().nodes);
}

#[test]
fn test_focus_marks_inline_clause() {
    let mut session = session();
    session.render();

    assert_eq!(session.set_focus(Some("parking")), vec!["parking"]);
    let clause_focus = |session: &RenderSession| {
        session
            .rendered()
            .find("parking")
            .map(|node| node.content().to_vec())
            .unwrap_or_default()
            .into_iter()
            .find_map(|node| match node {
                RenderNode::Clause {
                    focused, children, ..
                } => Some((focused, children)),
                _ => None,
            })
            .expect("parking renders its clause")
    };

    let (focused, children) = clause_focus(&session);
    assert!(focused);
    assert!(matches!(
        children[0],
        RenderNode::Leaf {
            mode: RenderingMode::Emphasized,
            focused: true,
            ..
        }
    ));

    session.set_focus(None);
    assert!(!clause_focus(&session).0);
}
