//! Application state: the live goal tree and its mutation choke point
//!
//! All writes funnel through `AppState` so that persistence and change
//! notification stay consistent with every mutation. Two notification
//! classes exist: tree changes (structure changed, navigation views must
//! rebuild, document is saved) and selection changes (no persistence).
//! Plain field updates save without notifying tree subscribers.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{
    AppData, ChildMode, ChildrenType, FieldUpdate, ListField, Node, StandardNode, StrategyNode,
};
use crate::infrastructure::{JsonStorage, StorageResult};

type Callback = Box<dyn Fn()>;

/// Owner of the in-memory goal forest, selection and expansion state.
///
/// Constructed once and threaded explicitly through whatever front end
/// drives it; there is no ambient singleton. Lookups by id that miss are
/// silent no-ops by contract, never errors.
pub struct AppState {
    storage: JsonStorage,
    data: AppData,
    selected_node_id: Option<String>,
    expanded_nodes: HashSet<String>,
    tree_subscribers: Vec<Callback>,
    selection_subscribers: Vec<Callback>,
}

impl AppState {
    /// Load the document and start with every node expanded.
    pub fn new(storage: JsonStorage) -> StorageResult<Self> {
        let data = storage.load()?;
        let mut state = Self {
            storage,
            data,
            selected_node_id: None,
            expanded_nodes: HashSet::new(),
            tree_subscribers: Vec::new(),
            selection_subscribers: Vec::new(),
        };
        state.expand_all();
        Ok(state)
    }

    fn expand_all(&mut self) {
        fn collect(nodes: &[Node], into: &mut HashSet<String>) {
            for node in nodes {
                into.insert(node.id().to_string());
                collect(node.children(), into);
            }
        }
        collect(&self.data.roots, &mut self.expanded_nodes);
    }

    /// Subscribe to structural changes (nodes added). Callbacks run in
    /// registration order, before the document is saved.
    pub fn subscribe_tree_change(&mut self, callback: impl Fn() + 'static) {
        self.tree_subscribers.push(Box::new(callback));
    }

    pub fn subscribe_selection_change(&mut self, callback: impl Fn() + 'static) {
        self.selection_subscribers.push(Box::new(callback));
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    /// Depth-first pre-order search over the forest. O(n), no index.
    pub fn find_node_by_id(&self, node_id: &str) -> Option<&Node> {
        Self::find_in(&self.data.roots, node_id)
    }

    fn find_in<'a>(nodes: &'a [Node], node_id: &str) -> Option<&'a Node> {
        for node in nodes {
            if node.id() == node_id {
                return Some(node);
            }
            if let Some(found) = Self::find_in(node.children(), node_id) {
                return Some(found);
            }
        }
        None
    }

    fn find_in_mut<'a>(nodes: &'a mut [Node], node_id: &str) -> Option<&'a mut Node> {
        for node in nodes {
            if node.id() == node_id {
                return Some(node);
            }
            if let Some(found) = Self::find_in_mut(node.children_mut(), node_id) {
                return Some(found);
            }
        }
        None
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    /// Resolve the current selection; stale ids read as no selection.
    pub fn get_selected_node(&self) -> Option<&Node> {
        let id = self.selected_node_id.as_deref()?;
        self.find_node_by_id(id)
    }

    /// Set or clear the selection. Fires selection-change; never persists.
    pub fn select_node(&mut self, node_id: Option<String>) {
        self.selected_node_id = node_id;
        self.notify_selection_change();
    }

    /// Flip a node's expansion flag. View-local state: no notification,
    /// no persistence.
    pub fn toggle_expanded(&mut self, node_id: &str) {
        if !self.expanded_nodes.remove(node_id) {
            self.expanded_nodes.insert(node_id.to_string());
        }
    }

    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded_nodes.contains(node_id)
    }

    /// Append a new root goal and expand it. Fires tree-change.
    pub fn add_root_node(&mut self, name: &str) -> Node {
        debug!("add_root_node: {}", name);
        let node = Node::Standard(StandardNode::new(name));
        self.expanded_nodes.insert(node.id().to_string());
        self.data.roots.push(node.clone());
        self.notify_tree_change();
        node
    }

    /// Add a child under `parent_id`, locking the parent's decomposition
    /// mode on first use.
    ///
    /// The requested mode is advisory: once a parent's mode is locked, the
    /// locked mode decides the child variant and the request is silently
    /// ignored. Missing parent is a no-op returning `None`. Fires
    /// tree-change and expands both parent and child.
    pub fn add_child_to_node(&mut self, parent_id: &str, mode: ChildMode) -> Option<Node> {
        debug!("add_child_to_node: parent={} mode={:?}", parent_id, mode);
        let child = {
            let parent = Self::find_in_mut(&mut self.data.roots, parent_id)?;
            let effective = parent.resolve_children_type(mode.into());
            let child = match effective {
                ChildrenType::Dapp => Node::Strategy(StrategyNode::new("New Strategy")),
                _ => Node::Standard(StandardNode::new("New Subgoal")),
            };
            parent.children_mut().push(child.clone());
            child
        };
        self.expanded_nodes.insert(parent_id.to_string());
        self.expanded_nodes.insert(child.id().to_string());
        self.notify_tree_change();
        Some(child)
    }

    /// Apply a scalar field update. Missing node is a no-op.
    ///
    /// Saves the document; fires tree-change instead of a plain save when
    /// `refresh_tree` is set (for fields that navigation views display,
    /// like the name).
    pub fn update_node_field(&mut self, node_id: &str, update: FieldUpdate, refresh_tree: bool) {
        let Some(node) = Self::find_in_mut(&mut self.data.roots, node_id) else {
            return;
        };
        node.apply(update);
        if refresh_tree {
            self.notify_tree_change();
        } else {
            self.persist();
        }
    }

    /// Append an entry to a strategy list field.
    ///
    /// No-op (`false`) when the node is missing or not a strategy node.
    pub fn push_list_item(
        &mut self,
        node_id: &str,
        field: ListField,
        value: impl Into<String>,
    ) -> bool {
        let Some(node) = Self::find_in_mut(&mut self.data.roots, node_id) else {
            return false;
        };
        let Some(strategy) = node.as_strategy_mut() else {
            return false;
        };
        strategy.list_mut(field).push(value.into());
        node.touch();
        self.persist();
        true
    }

    /// Replace one entry of a strategy list field. Out-of-range is a no-op.
    pub fn set_list_item(
        &mut self,
        node_id: &str,
        field: ListField,
        index: usize,
        value: impl Into<String>,
    ) -> bool {
        let Some(node) = Self::find_in_mut(&mut self.data.roots, node_id) else {
            return false;
        };
        let Some(strategy) = node.as_strategy_mut() else {
            return false;
        };
        let Some(slot) = strategy.list_mut(field).get_mut(index) else {
            return false;
        };
        *slot = value.into();
        node.touch();
        self.persist();
        true
    }

    /// Remove one entry of a strategy list field.
    ///
    /// Refuses (`false`) when the index is out of range or the removal
    /// would take the list below its structural minimum (`atp` keeps at
    /// least one entry).
    pub fn remove_list_item(&mut self, node_id: &str, field: ListField, index: usize) -> bool {
        let Some(node) = Self::find_in_mut(&mut self.data.roots, node_id) else {
            return false;
        };
        let Some(strategy) = node.as_strategy_mut() else {
            return false;
        };
        let list = strategy.list_mut(field);
        if index >= list.len() || list.len() <= field.min_len() {
            return false;
        }
        list.remove(index);
        node.touch();
        self.persist();
        true
    }

    /// Write the current document synchronously, bypassing the debounce.
    ///
    /// The durability escape hatch: one-shot processes call this before
    /// exit so a pending debounced write is never lost.
    pub fn flush(&self) -> StorageResult<()> {
        self.storage.save_immediate(&self.data)
    }

    /// Whether the most recent storage write attempt failed.
    pub fn last_save_failed(&self) -> bool {
        self.storage.last_save_failed()
    }

    fn notify_tree_change(&self) {
        for callback in &self.tree_subscribers {
            callback();
        }
        self.storage.save(&self.data);
    }

    fn notify_selection_change(&self) {
        for callback in &self.selection_subscribers {
            callback();
        }
    }

    fn persist(&self) {
        self.storage.save(&self.data);
    }
}
