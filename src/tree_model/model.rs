use std::cmp::Ordering;

use lexical_sort::natural_lexical_cmp;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::trace;
use ustr::Ustr;

use crate::config::HierarchyView;
use crate::hierarchy_server::{HierarchyServer, RelatedDirection, Result};
use crate::hierarchy_types::{HierarchyItem, Position, SourceRange};

/// Handle for one node in a model's arena.  Only meaningful for the model
/// that minted it; handles are never reused, not even after removal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u32);

/// One fetched item plus its tree linkage.  Nodes live in the model's arena;
/// `parent` is an arena handle rather than a reference so tearing down the
/// model reclaims everything without cycle-breaking.
pub struct HierarchyNode {
    item: HierarchyItem,
    parent: Option<NodeId>,
    /// `None` means "never resolved"; `Some(vec![])` means "resolved, no
    /// children".  Display logic tells these two states apart, so resolution
    /// always caches, even for empty results.
    children: Option<Vec<NodeId>>,
    /// Forces expanded display; only ever set on synthesized class-view
    /// ancestors.
    expand: bool,
}

impl HierarchyNode {
    pub fn item(&self) -> &HierarchyItem {
        &self.item
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The cached child list, if this node has been resolved.
    pub fn resolved_children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }

    pub fn forced_expand(&self) -> bool {
        self.expand
    }
}

/// Change notification payload.  `Model` deliberately does not carry the
/// removed/affected node: it means "structure changed, recompute from
/// scratch", not "this one node changed".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HierarchyChange {
    /// Re-render from the top without recomputing anything.
    All,
    /// One node's subtree changed in place.
    Node(NodeId),
    /// Structure changed; recompute everything from the model.
    Model,
}

/// Sibling ordering: kind string descending so like-kinded symbols group
/// together (interfaces ahead of classes), then human-aware name comparison
/// ascending.  The surrounding sort must be stable for equal keys.
fn sibling_order(a: &HierarchyItem, b: &HierarchyItem) -> Ordering {
    b.kind
        .name()
        .cmp(a.kind.name())
        .then_with(|| natural_lexical_cmp(a.name.as_str(), b.name.as_str()))
}

/// The in-memory tree of one hierarchy session.
///
/// Owns every node, the active view, and a single cancellation token shared
/// by every query it issues.  All access happens from one logical task;
/// fetches are independent suspensions but never concurrent writers.
pub struct HierarchyModel {
    server: Box<dyn HierarchyServer + Send + Sync>,
    view: HierarchyView,
    nodes: Vec<HierarchyNode>,
    roots: Vec<NodeId>,
    /// Bumped on every structural mutation so derived state (like the
    /// materialized class-view root) can tell when it went stale.
    epoch: u64,
    cancel: CancellationToken,
    subscribers: Vec<UnboundedSender<HierarchyChange>>,
}

impl HierarchyModel {
    /// Build a model over the given root items, in the order the prepare
    /// query delivered them.  The caller decided that order; we never re-sort
    /// roots.
    pub fn new(
        server: Box<dyn HierarchyServer + Send + Sync>,
        view: HierarchyView,
        items: Vec<HierarchyItem>,
    ) -> HierarchyModel {
        let mut model = HierarchyModel {
            server,
            view,
            nodes: Vec::with_capacity(items.len()),
            roots: Vec::with_capacity(items.len()),
            epoch: 0,
            cancel: CancellationToken::new(),
            subscribers: vec![],
        };
        for item in items {
            let id = model.push_node(item, None, false);
            model.roots.push(id);
        }
        model
    }

    pub fn view(&self) -> HierarchyView {
        self.view
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.0 as usize]
    }

    pub fn item(&self, id: NodeId) -> &HierarchyItem {
        &self.nodes[id.0 as usize].item
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].parent
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.roots.contains(&id)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// A clone of the model's shared cancellation token, for glue that needs
    /// to tie this model's queries to some outer lifetime.
    pub fn cancellation_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop honoring outstanding queries.  Anything still in flight resolves
    /// as "no children" from here on.
    pub fn cancel_queries(&self) {
        self.cancel.cancel();
    }

    /// Register a change listener.  Senders whose receiver went away are shed
    /// on the next emit.
    pub fn subscribe(&mut self) -> UnboundedReceiver<HierarchyChange> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, change: HierarchyChange) {
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }

    pub(crate) fn emit_node_changed(&mut self, id: NodeId) {
        self.emit(HierarchyChange::Node(id));
    }

    fn push_node(&mut self, item: HierarchyItem, parent: Option<NodeId>, expand: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(HierarchyNode {
            item,
            parent,
            children: None,
            expand,
        });
        id
    }

    /// Resolve (and cache) a node's children.  Idempotent: a second call
    /// returns the cached list without another fetch.  Query failure,
    /// cancellation, and an absent result all cache an empty list; callers
    /// never see the difference.
    pub async fn resolve_children(&mut self, id: NodeId) -> Vec<NodeId> {
        if let Some(kids) = self.node(id).resolved_children() {
            return kids.to_vec();
        }
        let item = self.node(id).item.clone();
        let direction = self.view.direction();
        let mut items = self.fetch_related_items(&item, direction).await;
        items.sort_by(sibling_order);
        let kids: Vec<NodeId> = items
            .into_iter()
            .map(|child| self.push_node(child, Some(id), false))
            .collect();
        trace!(name = %item.name, count = kids.len(), "resolved children");
        self.nodes[id.0 as usize].children = Some(kids.clone());
        kids
    }

    async fn fetch_related_items(
        &self,
        item: &HierarchyItem,
        direction: RelatedDirection,
    ) -> Vec<HierarchyItem> {
        if self.cancel.is_cancelled() {
            return vec![];
        }
        match self
            .server
            .fetch_related(item, direction, &self.cancel)
            .await
        {
            Ok(Some(items)) => items,
            Ok(None) => vec![],
            Err(err) => {
                trace!(?err, direction = direction.name(), "query degraded to empty");
                vec![]
            }
        }
    }

    /// Raw supertype query for class-chain materialization.  Does not touch
    /// the node's child cache; the class view resolves children downward
    /// while the chain climbs upward.
    pub(crate) async fn fetch_supertype_items(&self, id: NodeId) -> Vec<HierarchyItem> {
        let item = self.node(id).item.clone();
        self.fetch_related_items(&item, RelatedDirection::Supertypes)
            .await
    }

    /// Wrap `item` as a new parentless node whose sole cached child is
    /// `child`, flagged for forced-expand display.  The child keeps whatever
    /// parent it was constructed with; synthesized ancestors sit outside the
    /// root sequence and the parent links.
    pub(crate) fn synthesize_parent(&mut self, child: NodeId, item: HierarchyItem) -> NodeId {
        let id = self.push_node(item, None, true);
        self.nodes[id.0 as usize].children = Some(vec![child]);
        trace!(name = %self.nodes[id.0 as usize].item.name, "synthesized class-view ancestor");
        id
    }

    /// Depth-first-with-wrap forward navigation: descend to the first
    /// resolved child if there is one, otherwise step to the next sibling
    /// with wraparound.  A no-op where no neighbor is computable.
    pub fn next(&self, from: NodeId) -> NodeId {
        if let Some(first) = self
            .node(from)
            .resolved_children()
            .and_then(|kids| kids.first())
        {
            return *first;
        }
        self.step_sibling(from, 1)
    }

    /// Mirror of `next`: descend to the last resolved child, else step to the
    /// previous sibling with wraparound.
    pub fn previous(&self, from: NodeId) -> NodeId {
        if let Some(last) = self
            .node(from)
            .resolved_children()
            .and_then(|kids| kids.last())
        {
            return *last;
        }
        self.step_sibling(from, -1)
    }

    fn step_sibling(&self, from: NodeId, delta: isize) -> NodeId {
        let siblings: &[NodeId] = match self.node(from).parent {
            Some(p) => match self.node(p).resolved_children() {
                Some(kids) => kids,
                None => return from,
            },
            None => &self.roots,
        };
        // A removed node or a synthesized ancestor has no sibling slot; leave
        // navigation where it is.
        let idx = match siblings.iter().position(|n| *n == from) {
            Some(idx) => idx,
            None => return from,
        };
        let len = siblings.len() as isize;
        siblings[(idx as isize + delta).rem_euclid(len) as usize]
    }

    /// Map a node to its navigable source position.
    pub fn locate(&self, id: NodeId) -> (Ustr, SourceRange) {
        let item = self.item(id);
        (item.uri, item.selection_range.clone())
    }

    /// The root whose URI matches, or the first root as a fallback.  Only
    /// `None` when the model has no roots at all, which a live session never
    /// does.
    pub fn nearest_root(&self, uri: Ustr) -> Option<NodeId> {
        self.roots
            .iter()
            .find(|id| self.item(**id).uri == uri)
            .or_else(|| self.roots.first())
            .copied()
    }

    /// Ranges to decorate in the given document for this node: the selection
    /// range when the node lives in that document, nothing otherwise.
    pub fn highlights_for(&self, id: NodeId, uri: Ustr) -> Vec<SourceRange> {
        let item = self.item(id);
        if item.uri == uri {
            vec![item.selection_range.clone()]
        } else {
            vec![]
        }
    }

    /// Detach a node from its sibling array (the root sequence for roots) and
    /// announce the structural change.  Removing a node with no resolvable
    /// sibling slot is a silent no-op.
    pub fn remove(&mut self, id: NodeId) {
        let removed = match self.node(id).parent {
            Some(p) => match self.nodes[p.0 as usize].children.as_mut() {
                Some(kids) => match kids.iter().position(|n| *n == id) {
                    Some(idx) => {
                        kids.remove(idx);
                        true
                    }
                    None => false,
                },
                None => false,
            },
            None => match self.roots.iter().position(|n| *n == id) {
                Some(idx) => {
                    self.roots.remove(idx);
                    true
                }
                None => false,
            },
        };
        if removed {
            self.epoch += 1;
            trace!(?id, "removed node");
            self.emit(HierarchyChange::Model);
        }
    }

    /// Re-anchor on one of this model's nodes under a different view: cancel
    /// everything in flight for the old view and start a fresh model whose
    /// sole root is the anchor's item.  Any caches built for the old view die
    /// with it.
    pub fn rebase(self, view: HierarchyView, anchor: NodeId) -> HierarchyModel {
        self.cancel.cancel();
        let item = self.nodes[anchor.0 as usize].item.clone();
        HierarchyModel::new(self.server, view, vec![item])
    }
}

/// Start a hierarchy session anchored at a source location.  `Ok(None)` means
/// the backend has no hierarchy there and the session is abandoned before a
/// tree is constructed.
pub async fn prepare_session(
    server: Box<dyn HierarchyServer + Send + Sync>,
    uri: Ustr,
    pos: Position,
    view: HierarchyView,
) -> Result<Option<HierarchyModel>> {
    let items = server.prepare_hierarchy(uri, pos).await?;
    if items.is_empty() {
        trace!(uri = %uri, "no hierarchy at location");
        return Ok(None);
    }
    Ok(Some(HierarchyModel::new(server, view, items)))
}
