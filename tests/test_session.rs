//! End-to-end session flows through the public API: prepare, expand,
//! navigate, remove, and switch views against a file-style graph.

use serde_json::{json, Value};
use ustr::ustr;

use typetree::config::{HierarchyView, TreeDisplayConfig};
use typetree::hierarchy_server::make_graph_server;
use typetree::hierarchy_types::Position;
use typetree::tree_model::{prepare_session, DisplayState, HierarchyChange, TreeAdapter};

fn item_row(sym: &str, name: &str, kind: &str, uri: &str, line: u32) -> Value {
    json!({
        "sym": sym, "name": name, "kind": kind, "uri": uri,
        "range": { "start_lineno": line, "start_col": 0, "end_lineno": line + 5, "end_col": 0 },
        "selection_range": { "start_lineno": line, "start_col": 7, "end_lineno": line, "end_col": 7 + name.len() as u32 }
    })
}

/// A small widget-toolkit shaped graph:
/// Object <- Control <- Widget (implements IPaint) <- { Button, Label }
fn widget_graph() -> Value {
    json!({
        "items": [
            item_row("t#Object", "Object", "class", "src/object.rs", 1),
            item_row("t#Control", "Control", "class", "src/control.rs", 10),
            item_row("t#IPaint", "IPaint", "interface", "src/paint.rs", 3),
            item_row("t#Widget", "Widget", "class", "src/widget.rs", 20),
            item_row("t#Button", "Button", "class", "src/button.rs", 4),
            item_row("t#Label", "Label", "class", "src/label.rs", 8),
        ],
        "supertypes": {
            "t#Control": ["t#Object"],
            "t#Widget": ["t#IPaint", "t#Control"],
            "t#Button": ["t#Widget"],
            "t#Label": ["t#Widget"]
        }
    })
}

async fn widget_session(view: HierarchyView) -> TreeAdapter {
    let server = make_graph_server(widget_graph()).unwrap();
    let model = prepare_session(
        server,
        ustr("src/widget.rs"),
        Position { lineno: 22, col: 4 },
        view,
    )
    .await
    .unwrap()
    .expect("widget.rs:22 anchors a hierarchy");
    TreeAdapter::new(model, TreeDisplayConfig::default())
}

#[tokio::test]
async fn test_supertype_session_expands_and_orders() {
    let mut adapter = widget_session(HierarchyView::Supertype).await;

    let roots = adapter.children(None).await;
    assert_eq!(roots.len(), 1);
    let widget = roots[0];
    assert_eq!(adapter.model().item(widget).name.as_str(), "Widget");
    assert_eq!(adapter.display_state(widget).await, DisplayState::Expanded);

    // Interfaces group ahead of classes; equal kinds order by name.
    let supers = adapter.children(Some(widget)).await;
    let names: Vec<&str> = supers
        .iter()
        .map(|id| adapter.model().item(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["IPaint", "Control"]);

    let control = supers[1];
    let ancestors = adapter.children(Some(control)).await;
    assert_eq!(ancestors.len(), 1);
    assert_eq!(adapter.model().item(ancestors[0]).name.as_str(), "Object");
    assert_eq!(adapter.parent(ancestors[0]), Some(control));
}

#[tokio::test]
async fn test_navigation_walks_the_expanded_tree() {
    let mut adapter = widget_session(HierarchyView::Supertype).await;
    let widget = adapter.children(None).await[0];
    let supers = adapter.children(Some(widget)).await;
    let (ipaint, control) = (supers[0], supers[1]);

    let model = adapter.model();
    assert_eq!(model.next(widget), ipaint, "descends into first child");
    assert_eq!(model.next(ipaint), control);
    assert_eq!(model.next(control), ipaint, "wraps within the sibling array");
    assert_eq!(model.previous(ipaint), control);
}

#[tokio::test]
async fn test_removal_shrinks_siblings_and_signals_model() {
    let mut adapter = widget_session(HierarchyView::Supertype).await;
    let widget = adapter.children(None).await[0];
    let supers = adapter.children(Some(widget)).await;
    let mut rx = adapter.subscribe();

    adapter.model_mut().remove(supers[0]);
    assert!(matches!(rx.try_recv(), Ok(HierarchyChange::Model)));
    assert!(rx.try_recv().is_err());

    let remaining = adapter.children(Some(widget)).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(adapter.model().item(remaining[0]).name.as_str(), "Control");
}

#[tokio::test]
async fn test_class_view_builds_chain_to_topmost_class() {
    let mut adapter = widget_session(HierarchyView::Class).await;

    let tops = adapter.children(None).await;
    assert_eq!(tops.len(), 1);
    let object = tops[0];
    let model = adapter.model();
    assert_eq!(model.item(object).name.as_str(), "Object");
    assert!(model.node(object).forced_expand());

    // Object -> Control -> Widget, one child per link.
    let control = model.node(object).resolved_children().unwrap()[0];
    assert_eq!(model.item(control).name.as_str(), "Control");
    let widget = model.node(control).resolved_children().unwrap()[0];
    assert_eq!(model.item(widget).name.as_str(), "Widget");
    assert!(model.is_root(widget), "the anchor stays the only true root");

    // Below the anchor the class view descends into subtypes.
    let subs = adapter.children(Some(widget)).await;
    let names: Vec<&str> = subs
        .iter()
        .map(|id| adapter.model().item(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["Button", "Label"]);
}

#[tokio::test]
async fn test_view_switch_rebases_onto_anchor() {
    let mut adapter = widget_session(HierarchyView::Supertype).await;
    let widget = adapter.children(None).await[0];
    let token = adapter.model().cancellation_handle();

    let model = adapter.into_model().rebase(HierarchyView::Subtype, widget);
    assert!(token.is_cancelled(), "old view's queries stop mattering");

    let mut adapter = TreeAdapter::new(model, TreeDisplayConfig::default());
    let roots = adapter.children(None).await;
    assert_eq!(roots.len(), 1);
    let subs = adapter.children(Some(roots[0])).await;
    let names: Vec<&str> = subs
        .iter()
        .map(|id| adapter.model().item(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["Button", "Label"]);
}

#[tokio::test]
async fn test_locate_and_highlights_follow_the_anchor_document() {
    let mut adapter = widget_session(HierarchyView::Supertype).await;
    let widget = adapter.children(None).await[0];
    let model = adapter.model();

    let (uri, range) = model.locate(widget);
    assert_eq!(uri, ustr("src/widget.rs"));
    assert_eq!(range.start_lineno, 20);

    assert_eq!(model.highlights_for(widget, ustr("src/widget.rs")).len(), 1);
    assert!(model.highlights_for(widget, ustr("src/button.rs")).is_empty());
    assert_eq!(model.nearest_root(ustr("src/nowhere.rs")), Some(widget));
}
