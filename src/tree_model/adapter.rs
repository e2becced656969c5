use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use super::model::{HierarchyChange, HierarchyModel, NodeId};
use crate::config::{HierarchyView, TreeDisplayConfig};
use crate::hierarchy_types::SymbolKind;

/// How the display sink should initially render a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisplayState {
    Expanded,
    Collapsed,
    Leaf,
}

/// Bridges a `HierarchyModel` to the external tree display: computes display
/// children (including the class-view root materialization), decides
/// expand/collapse state, and hands the model's change signal through to the
/// sink.  One adapter per model instance; a rebased model gets a fresh
/// adapter.
pub struct TreeAdapter {
    model: HierarchyModel,
    config: TreeDisplayConfig,
    /// Materialized class-view root, valid for the recorded structure epoch.
    /// Materialization synthesizes nodes, so running it again on the same
    /// structure would fan out duplicate chains.
    class_root: Option<(u64, NodeId)>,
}

impl TreeAdapter {
    pub fn new(model: HierarchyModel, config: TreeDisplayConfig) -> TreeAdapter {
        TreeAdapter {
            model,
            config,
            class_root: None,
        }
    }

    pub fn model(&self) -> &HierarchyModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut HierarchyModel {
        &mut self.model
    }

    /// Surrender the model, e.g. to rebase it under a different view.
    pub fn into_model(self) -> HierarchyModel {
        self.model
    }

    /// The refresh signal for the display sink; a forwarded view of the
    /// model's change channel.
    pub fn subscribe(&mut self) -> UnboundedReceiver<HierarchyChange> {
        self.model.subscribe()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.model.parent(id)
    }

    /// Display children: the (possibly materialized) roots for the top-level
    /// call, lazily resolved children otherwise.
    pub async fn children(&mut self, of: Option<NodeId>) -> Vec<NodeId> {
        match of {
            Some(id) => {
                let kids = self.model.resolve_children(id).await;
                if kids.is_empty() {
                    // Tell the sink right away so it can collapse/relabel the
                    // node instead of waiting for a separate poll.
                    self.model.emit_node_changed(id);
                }
                kids
            }
            None => self.top_level_children().await,
        }
    }

    async fn top_level_children(&mut self) -> Vec<NodeId> {
        if self.model.view() != HierarchyView::Class {
            return self.model.roots().to_vec();
        }
        if let Some((epoch, root)) = self.class_root {
            if epoch == self.model.epoch() {
                return vec![root];
            }
        }
        let anchor = self
            .model
            .roots()
            .iter()
            .copied()
            .find(|id| self.model.item(*id).kind == SymbolKind::Class);
        match anchor {
            Some(anchor) => {
                let top = self.materialize_class_root(anchor).await;
                self.class_root = Some((self.model.epoch(), top));
                vec![top]
            }
            // Nothing class-kind to climb from; show the plain roots.
            None => self.model.roots().to_vec(),
        }
    }

    /// Climb supertype edges from a class-kind anchor until the class chain
    /// runs out: at each step, the first class-kind supertype (interfaces and
    /// other kinds are skipped) becomes a synthesized forced-expand ancestor
    /// whose sole child is the node below it.  The result is a strictly
    /// linear chain, never a fan-out.
    ///
    /// The climb trusts the backend to report an acyclic supertype relation;
    /// with `class_chain_limit` unset, a cyclic report would not terminate.
    async fn materialize_class_root(&mut self, anchor: NodeId) -> NodeId {
        let mut cur = anchor;
        let mut hops = 0usize;
        loop {
            if let Some(limit) = self.config.class_chain_limit {
                if hops >= limit {
                    warn!(limit, "class chain clipped at configured limit");
                    return cur;
                }
            }
            let supers = self.model.fetch_supertype_items(cur).await;
            let ancestor = supers
                .into_iter()
                .find(|item| item.kind == SymbolKind::Class);
            match ancestor {
                Some(item) => {
                    cur = self.model.synthesize_parent(cur, item);
                    hops += 1;
                }
                None => return cur,
            }
        }
    }

    /// Initial expand/collapse state.  Forced-expand (class-view chain) nodes
    /// and roots render pre-expanded; a node with a cached empty child list
    /// is a leaf; everything else is collapsed, resolving eagerly first when
    /// prefetch is on.
    pub async fn display_state(&mut self, id: NodeId) -> DisplayState {
        let node = self.model.node(id);
        if node.forced_expand() || self.model.is_root(id) {
            return DisplayState::Expanded;
        }
        if let Some(kids) = node.resolved_children() {
            return if kids.is_empty() {
                DisplayState::Leaf
            } else {
                DisplayState::Collapsed
            };
        }
        if self.config.prefetch {
            if self.model.resolve_children(id).await.is_empty() {
                DisplayState::Leaf
            } else {
                DisplayState::Collapsed
            }
        } else {
            DisplayState::Collapsed
        }
    }
}
