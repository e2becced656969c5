use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{from_slice, from_value, json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use ustr::{ustr, Ustr};

use super::server_interface::{
    ErrorDetails, ErrorLayer, HierarchyServer, RelatedDirection, Result, ServerError,
};
use crate::hierarchy_types::{HierarchyItem, Position};

/// On-disk description of a type graph: the items plus the supertype relation
/// keyed by symbol.  The subtype relation is always the derived inverse, so
/// the file never states it.
#[derive(Deserialize)]
struct GraphFile {
    items: Vec<GraphItem>,
    #[serde(default)]
    supertypes: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct GraphItem {
    sym: String,
    #[serde(flatten)]
    item: HierarchyItem,
}

/// A `HierarchyServer` answering from a static graph loaded out of a JSON
/// file.  This is what the CLI and the tests run against; a live language
/// backend would sit behind the same trait.
pub struct LocalGraph {
    /// Items in file order; `prepare_hierarchy` answers in this order.
    items: Vec<HierarchyItem>,
    by_sym: HashMap<Ustr, usize>,
    supertypes: HashMap<Ustr, Vec<Ustr>>,
    subtypes: HashMap<Ustr, Vec<Ustr>>,
}

impl LocalGraph {
    pub fn from_value(value: Value) -> Result<LocalGraph> {
        let file: GraphFile = from_value(value)?;

        let mut items = Vec::with_capacity(file.items.len());
        let mut by_sym = HashMap::new();
        for row in file.items {
            let sym = ustr(&row.sym);
            let mut item = row.item;
            if !item.range.contains_range(&item.selection_range) {
                warn!(sym = %sym, "selection_range escapes enclosing range");
            }
            // Stamp the sym into the opaque correlation payload so that
            // fetch_related can map an item back to its graph row.
            item.data = Some(json!(row.sym));
            if by_sym.insert(sym, items.len()).is_some() {
                return Err(ServerError::StickyProblem(ErrorDetails {
                    layer: ErrorLayer::DataLayer,
                    message: format!("duplicate graph sym: {}", sym),
                }));
            }
            items.push(item);
        }

        let mut supertypes: HashMap<Ustr, Vec<Ustr>> = HashMap::new();
        let mut subtypes: HashMap<Ustr, Vec<Ustr>> = HashMap::new();
        for (sym, supers) in file.supertypes {
            let sym = ustr(&sym);
            for super_sym in supers {
                let super_sym = ustr(&super_sym);
                supertypes.entry(sym).or_default().push(super_sym);
                subtypes.entry(super_sym).or_default().push(sym);
            }
        }

        Ok(LocalGraph {
            items,
            by_sym,
            supertypes,
            subtypes,
        })
    }

    fn item_for_sym(&self, sym: &Ustr) -> Option<&HierarchyItem> {
        self.by_sym.get(sym).map(|idx| &self.items[*idx])
    }

    /// The sym a previously-served item corresponds to, recovered from the
    /// correlation payload we stamped on it.
    fn sym_of(item: &HierarchyItem) -> Option<Ustr> {
        item.data
            .as_ref()
            .and_then(|data| data.as_str())
            .map(ustr)
    }
}

#[async_trait]
impl HierarchyServer for LocalGraph {
    async fn prepare_hierarchy(&self, uri: Ustr, pos: Position) -> Result<Vec<HierarchyItem>> {
        let hits: Vec<HierarchyItem> = self
            .items
            .iter()
            .filter(|item| item.uri == uri && item.range.contains(&pos))
            .cloned()
            .collect();
        trace!(uri = %uri, hits = hits.len(), "prepared hierarchy");
        Ok(hits)
    }

    async fn fetch_related(
        &self,
        item: &HierarchyItem,
        direction: RelatedDirection,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<HierarchyItem>>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let sym = match LocalGraph::sym_of(item) {
            Some(sym) => sym,
            // Items we did not serve have no graph row; nothing to relate.
            None => return Ok(None),
        };
        let relation = match direction {
            RelatedDirection::Supertypes => &self.supertypes,
            RelatedDirection::Subtypes => &self.subtypes,
        };
        let related = match relation.get(&sym) {
            Some(syms) => syms
                .iter()
                .filter_map(|s| self.item_for_sym(s))
                .cloned()
                .collect(),
            None => return Ok(None),
        };
        Ok(Some(related))
    }
}

pub async fn make_local_graph_server(
    path: &str,
) -> Result<Box<dyn HierarchyServer + Send + Sync>> {
    let bytes = tokio::fs::read(path).await?;
    let value = from_slice(&bytes)?;
    make_graph_server(value)
}

/// Build a graph server straight from an in-memory JSON value.  Handy for
/// tests and for callers that already hold the graph.
pub fn make_graph_server(value: Value) -> Result<Box<dyn HierarchyServer + Send + Sync>> {
    Ok(Box::new(LocalGraph::from_value(value)?))
}
