pub mod adapter;
pub mod model;

pub use adapter::{DisplayState, TreeAdapter};
pub use model::{prepare_session, HierarchyChange, HierarchyModel, HierarchyNode, NodeId};

/// Fixture helpers shared by the model and adapter test modules.
#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use ustr::{ustr, Ustr};

    use crate::hierarchy_server::{
        make_graph_server, ErrorDetails, ErrorLayer, HierarchyServer, RelatedDirection, Result,
        ServerError,
    };
    use crate::hierarchy_types::{HierarchyItem, Position, SourceRange, SymbolKind};

    pub fn row(sym: &str, name: &str, kind: &str, uri: &str) -> Value {
        json!({
            "sym": sym, "name": name, "kind": kind, "uri": uri,
            "range": { "start_lineno": 1, "start_col": 0, "end_lineno": 9, "end_col": 0 },
            "selection_range": { "start_lineno": 1, "start_col": 0, "end_lineno": 1, "end_col": 4 }
        })
    }

    /// An item as the local graph backend would have served it, correlation
    /// payload included.
    pub fn served_item(sym: &str, name: &str, kind: SymbolKind, uri: &str) -> HierarchyItem {
        HierarchyItem {
            name: ustr(name),
            kind,
            tags: None,
            detail: None,
            uri: ustr(uri),
            range: SourceRange {
                start_lineno: 1,
                start_col: 0,
                end_lineno: 9,
                end_col: 0,
            },
            selection_range: SourceRange {
                start_lineno: 1,
                start_col: 0,
                end_lineno: 1,
                end_col: 4,
            },
            data: Some(json!(sym)),
        }
    }

    pub fn empty_server() -> Box<dyn HierarchyServer + Send + Sync> {
        make_graph_server(json!({ "items": [] })).unwrap()
    }

    /// Backend that relates the anchor "X" to a single class "Y" and fails
    /// every other related-symbol query.
    struct FailingBackend;

    #[async_trait]
    impl HierarchyServer for FailingBackend {
        async fn prepare_hierarchy(&self, _uri: Ustr, _pos: Position) -> Result<Vec<HierarchyItem>> {
            Ok(vec![])
        }

        async fn fetch_related(
            &self,
            item: &HierarchyItem,
            _direction: RelatedDirection,
            _cancel: &CancellationToken,
        ) -> Result<Option<Vec<HierarchyItem>>> {
            if item.name.as_str() == "X" {
                return Ok(Some(vec![served_item("y", "Y", SymbolKind::Class, "y.rs")]));
            }
            Err(ServerError::TransientProblem(ErrorDetails {
                layer: ErrorLayer::ServerLayer,
                message: "backend fell over".to_string(),
            }))
        }
    }

    pub fn failing_backend() -> Box<dyn HierarchyServer + Send + Sync> {
        Box::new(FailingBackend)
    }
}
