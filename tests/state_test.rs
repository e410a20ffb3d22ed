//! Tests for AppState: mutation operations, selection and notifications
//!
//! These tests run without an async runtime, so every save degrades to a
//! synchronous write and the backing file reflects each mutation at once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use goaltree::application::AppState;
use goaltree::domain::{ChildMode, ChildrenType, FieldUpdate, ListField, Node, Status};
use goaltree::infrastructure::JsonStorage;

struct Ctx {
    // keeps the directory alive for the lifetime of the state
    _dir: TempDir,
    data_file: std::path::PathBuf,
    state: AppState,
}

#[fixture]
fn ctx() -> Ctx {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("goals.json");
    let storage = JsonStorage::new(&data_file, 500);
    let state = AppState::new(storage).unwrap();
    Ctx {
        _dir: dir,
        data_file,
        state,
    }
}

fn tree_counter(state: &mut AppState) -> Rc<Cell<usize>> {
    let counter = Rc::new(Cell::new(0));
    let hook = counter.clone();
    state.subscribe_tree_change(move || hook.set(hook.get() + 1));
    counter
}

fn selection_counter(state: &mut AppState) -> Rc<Cell<usize>> {
    let counter = Rc::new(Cell::new(0));
    let hook = counter.clone();
    state.subscribe_selection_change(move || hook.set(hook.get() + 1));
    counter
}

// ============================================================
// Root Creation Tests
// ============================================================

#[rstest]
fn given_empty_store_when_adding_root_then_standard_leaf_node(mut ctx: Ctx) {
    let node = ctx.state.add_root_node("Goal A");

    assert_eq!(ctx.state.data().roots.len(), 1);
    assert!(!node.id().is_empty());
    assert_eq!(node.children_type(), ChildrenType::Leaf);
    assert!(node.as_strategy().is_none(), "roots are standard nodes");
    assert!(ctx.state.is_expanded(node.id()));
}

#[rstest]
fn given_root_addition_when_subscribed_then_tree_change_fires_and_persists(mut ctx: Ctx) {
    let tree_calls = tree_counter(&mut ctx.state);

    ctx.state.add_root_node("Goal A");

    assert_eq!(tree_calls.get(), 1);
    assert!(ctx.data_file.exists(), "tree changes save the document");
}

#[rstest]
fn given_many_adds_when_collecting_ids_then_all_unique(mut ctx: Ctx) {
    let mut ids = std::collections::HashSet::new();
    for i in 0..10 {
        let root = ctx.state.add_root_node(&format!("Goal {}", i));
        assert!(ids.insert(root.id().to_string()));
        let child = ctx
            .state
            .add_child_to_node(root.id(), ChildMode::Strategies)
            .unwrap();
        assert!(ids.insert(child.id().to_string()));
    }
    assert_eq!(ids.len(), 20);
}

// ============================================================
// Child Creation Tests
// ============================================================

#[rstest]
fn given_leaf_parent_when_adding_strategy_child_then_mode_locks_to_dapp(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");

    let child = ctx
        .state
        .add_child_to_node(root.id(), ChildMode::Strategies)
        .unwrap();

    let parent = ctx.state.find_node_by_id(root.id()).unwrap();
    assert_eq!(parent.children_type(), ChildrenType::Dapp);
    assert_eq!(parent.children().len(), 1);
    let strategy = child.as_strategy().expect("child is a strategy node");
    assert_eq!(strategy.atp, vec![String::new()]);
    assert_eq!(child.name(), "New Strategy");
    assert!(ctx.state.is_expanded(root.id()));
    assert!(ctx.state.is_expanded(child.id()));
}

#[rstest]
fn given_locked_parent_when_requesting_other_mode_then_request_is_advisory(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    ctx.state
        .add_child_to_node(root.id(), ChildMode::Subgoals)
        .unwrap();

    let second = ctx
        .state
        .add_child_to_node(root.id(), ChildMode::Strategies)
        .unwrap();

    let parent = ctx.state.find_node_by_id(root.id()).unwrap();
    assert_eq!(parent.children_type(), ChildrenType::Rrtd);
    assert!(second.as_strategy().is_none(), "locked mode wins");
    assert_eq!(second.name(), "New Subgoal");
}

#[rstest]
fn given_missing_parent_when_adding_child_then_noop(mut ctx: Ctx) {
    let tree_calls = tree_counter(&mut ctx.state);

    let result = ctx.state.add_child_to_node("no-such-id", ChildMode::Subgoals);

    assert!(result.is_none());
    assert_eq!(tree_calls.get(), 0);
}

// ============================================================
// Lookup & Selection Tests
// ============================================================

#[rstest]
fn given_nested_forest_when_finding_by_id_then_idempotent(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    let child = ctx
        .state
        .add_child_to_node(root.id(), ChildMode::Subgoals)
        .unwrap();

    let first = ctx.state.find_node_by_id(child.id()).map(Node::id);
    let second = ctx.state.find_node_by_id(child.id()).map(Node::id);

    assert_eq!(first, second);
    assert_eq!(first, Some(child.id()));
}

#[rstest]
fn given_selection_when_set_then_fires_selection_change_without_persisting(mut ctx: Ctx) {
    let selection_calls = selection_counter(&mut ctx.state);
    let tree_calls = tree_counter(&mut ctx.state);

    ctx.state.select_node(Some("anything".to_string()));

    assert_eq!(selection_calls.get(), 1);
    assert_eq!(tree_calls.get(), 0);
    assert!(!ctx.data_file.exists(), "selection is ephemeral");
}

#[rstest]
fn given_stale_selection_when_resolving_then_none(mut ctx: Ctx) {
    ctx.state.select_node(Some("gone".to_string()));

    assert!(ctx.state.get_selected_node().is_none());
    assert_eq!(ctx.state.selected_node_id(), Some("gone"));
}

#[rstest]
fn given_selected_root_when_resolving_then_found(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");

    ctx.state.select_node(Some(root.id().to_string()));

    assert_eq!(ctx.state.get_selected_node().map(Node::id), Some(root.id()));
}

#[rstest]
fn given_expanded_node_when_toggling_then_membership_flips(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    assert!(ctx.state.is_expanded(root.id()));

    ctx.state.toggle_expanded(root.id());
    assert!(!ctx.state.is_expanded(root.id()));

    ctx.state.toggle_expanded(root.id());
    assert!(ctx.state.is_expanded(root.id()));
}

#[rstest]
fn given_saved_forest_when_reloading_then_all_nodes_expanded(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    let child = ctx
        .state
        .add_child_to_node(root.id(), ChildMode::Subgoals)
        .unwrap();
    ctx.state.flush().unwrap();

    let reloaded = AppState::new(JsonStorage::new(&ctx.data_file, 500)).unwrap();

    assert!(reloaded.is_expanded(root.id()));
    assert!(reloaded.is_expanded(child.id()));
}

// ============================================================
// Field Update Tests
// ============================================================

#[rstest]
fn given_status_update_when_applied_then_saved_without_tree_change(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    let before = ctx.state.find_node_by_id(root.id()).unwrap().updated_at();
    let tree_calls = tree_counter(&mut ctx.state);
    std::thread::sleep(std::time::Duration::from_millis(2));

    ctx.state
        .update_node_field(root.id(), FieldUpdate::Status(Status::Completed), false);

    let node = ctx.state.find_node_by_id(root.id()).unwrap();
    assert_eq!(node.status(), Status::Completed);
    assert!(node.updated_at() > before);
    assert_eq!(tree_calls.get(), 0, "field updates do not rebuild the tree");

    let json = std::fs::read_to_string(&ctx.data_file).unwrap();
    assert!(json.contains("COMPLETED"), "field updates persist");
}

#[rstest]
fn given_name_update_with_refresh_when_applied_then_tree_change_fires(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    let tree_calls = tree_counter(&mut ctx.state);

    ctx.state
        .update_node_field(root.id(), FieldUpdate::Name("Renamed".into()), true);

    assert_eq!(tree_calls.get(), 1);
    assert_eq!(
        ctx.state.find_node_by_id(root.id()).unwrap().name(),
        "Renamed"
    );
}

#[rstest]
fn given_missing_node_when_updating_field_then_noop(mut ctx: Ctx) {
    ctx.state
        .update_node_field("no-such-id", FieldUpdate::Name("x".into()), false);

    assert!(!ctx.data_file.exists(), "no-op does not persist");
}

// ============================================================
// List Item Tests
// ============================================================

fn strategy_child(ctx: &mut Ctx) -> Node {
    let root = ctx.state.add_root_node("Goal A");
    ctx.state
        .add_child_to_node(root.id(), ChildMode::Strategies)
        .unwrap()
}

#[rstest]
fn given_strategy_node_when_pushing_and_setting_items_then_lists_update(mut ctx: Ctx) {
    let child = strategy_child(&mut ctx);

    assert!(ctx
        .state
        .push_list_item(child.id(), ListField::Signposts, "milestone"));
    assert!(ctx
        .state
        .set_list_item(child.id(), ListField::Atp, 0, "first step"));

    let strategy = ctx
        .state
        .find_node_by_id(child.id())
        .unwrap()
        .as_strategy()
        .unwrap()
        .clone();
    assert_eq!(strategy.signposts, vec!["milestone".to_string()]);
    assert_eq!(strategy.atp, vec!["first step".to_string()]);
}

#[rstest]
fn given_single_atp_entry_when_removing_then_refused(mut ctx: Ctx) {
    let child = strategy_child(&mut ctx);

    let removed = ctx.state.remove_list_item(child.id(), ListField::Atp, 0);

    assert!(!removed);
    let strategy = ctx
        .state
        .find_node_by_id(child.id())
        .unwrap()
        .as_strategy()
        .unwrap()
        .clone();
    assert_eq!(strategy.atp, vec![String::new()], "atp keeps one entry");
}

#[rstest]
fn given_two_atp_entries_when_removing_one_then_succeeds(mut ctx: Ctx) {
    let child = strategy_child(&mut ctx);
    ctx.state.push_list_item(child.id(), ListField::Atp, "second");

    assert!(ctx.state.remove_list_item(child.id(), ListField::Atp, 0));

    let strategy = ctx
        .state
        .find_node_by_id(child.id())
        .unwrap()
        .as_strategy()
        .unwrap()
        .clone();
    assert_eq!(strategy.atp, vec!["second".to_string()]);
}

#[rstest]
fn given_out_of_range_index_when_setting_then_refused(mut ctx: Ctx) {
    let child = strategy_child(&mut ctx);

    assert!(!ctx.state.set_list_item(child.id(), ListField::Atp, 5, "x"));
}

#[rstest]
fn given_standard_node_when_editing_lists_then_refused(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");

    assert!(!ctx.state.push_list_item(root.id(), ListField::Atp, "x"));
    assert!(!ctx.state.remove_list_item(root.id(), ListField::Triggers, 0));
}

// ============================================================
// Notification Order & Flush Tests
// ============================================================

#[rstest]
fn given_two_subscribers_when_tree_changes_then_called_in_registration_order(mut ctx: Ctx) {
    let order = Rc::new(RefCell::new(Vec::new()));
    let first = order.clone();
    let second = order.clone();
    ctx.state
        .subscribe_tree_change(move || first.borrow_mut().push("first"));
    ctx.state
        .subscribe_tree_change(move || second.borrow_mut().push("second"));

    ctx.state.add_root_node("Goal A");

    assert_eq!(*order.borrow(), vec!["first", "second"]);
}

#[rstest]
fn given_mutations_when_flushing_then_document_on_disk_is_current(mut ctx: Ctx) {
    let root = ctx.state.add_root_node("Goal A");
    ctx.state
        .update_node_field(root.id(), FieldUpdate::Description("details".into()), false);

    ctx.state.flush().unwrap();
    assert!(!ctx.state.last_save_failed());

    let reloaded = AppState::new(JsonStorage::new(&ctx.data_file, 500)).unwrap();
    let node = reloaded.find_node_by_id(root.id()).unwrap();
    assert_eq!(node.description(), "details");
}
