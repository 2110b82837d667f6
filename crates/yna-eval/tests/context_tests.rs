//! Tests for the context chain and variable storage.
//!
//! Covers:
//! - root/base lineage for arbitrary Sub chains
//! - variable writes, removal, and the replace-mode variable
//! - Sub scopes sharing the Root table
//! - guild delegation through any context

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::rc::Rc;
use yna_eval::{ContextArena, ContextId, ContextKind};
use yna_types::{Member, StaticGuild, VarValue};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn guild() -> Rc<StaticGuild> {
    Rc::new(StaticGuild::new(vec![
        Member::new(10, "alice", "0001").with_nick("Al"),
        Member::new(20, "bob", "0002"),
    ]))
}

fn root() -> (ContextArena, ContextId) {
    let mut arena = ContextArena::new();
    let root = arena.create_root(guild());
    (arena, root)
}

/// Build a chain of `depth` Sub contexts under a fresh Root; returns every
/// context, Root first.
fn chain(depth: usize) -> (ContextArena, Vec<ContextId>) {
    let (mut arena, root) = root();
    let mut ids = vec![root];
    for _ in 0..depth {
        let parent = *ids.last().unwrap();
        ids.push(arena.create_sub(parent));
    }
    (arena, ids)
}

fn text(arena: &ContextArena, ctx: ContextId, name: &str) -> Option<String> {
    arena.get_variable(ctx, name).map(ToString::to_string)
}

// ══════════════════════════════════════════════════════════════════════════════
// Lineage
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn root_has_itself_as_base_and_root() {
    let (arena, root) = root();
    assert_eq!(arena.kind(root), ContextKind::Root);
    assert_eq!(arena.base(root), root);
    assert_eq!(arena.root(root), root);
}

#[test]
fn sub_points_at_parent() {
    let (arena, ids) = chain(3);
    assert_eq!(arena.kind(ids[3]), ContextKind::Sub);
    assert_eq!(arena.base(ids[3]), ids[2]);
    assert_eq!(arena.root(ids[3]), ids[0]);
}

#[test]
fn separate_roots_do_not_share() {
    let mut arena = ContextArena::new();
    let a = arena.create_root(guild());
    let b = arena.create_root(guild());
    arena.set_text(a, "x", "1");
    assert_eq!(text(&arena, b, "x"), None);
}

proptest! {
    #[test]
    fn cached_root_matches_resolved_root(depth in 0usize..32) {
        let (arena, ids) = chain(depth);
        for &ctx in &ids {
            prop_assert_eq!(arena.root(ctx), arena.resolve_root(ctx));
            prop_assert_eq!(arena.root(ctx), ids[0]);
        }
    }

    #[test]
    fn set_then_get_through_any_scope(
        depth in 0usize..8,
        writer in 0usize..8,
        reader in 0usize..8,
        name in "[a-z]{1,8}",
        value in "[ -~]{1,16}",
    ) {
        prop_assume!(name != "newrep");
        let (mut arena, ids) = chain(depth);
        let writer = ids[writer % ids.len()];
        let reader = ids[reader % ids.len()];
        arena.set_text(writer, &name, value.clone());
        prop_assert_eq!(text(&arena, reader, &name), Some(value));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Variables
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn removing_absent_variable_is_idempotent() {
    let (mut arena, root) = root();
    arena.set_variable(root, "ghost", None);
    arena.set_variable(root, "ghost", None);
    assert_eq!(arena.get_variable(root, "ghost"), None);
    assert!(arena.variables(root).is_empty());
}

#[test]
fn absent_value_removes_binding() {
    let (mut arena, root) = root();
    arena.set_text(root, "x", "1");
    arena.set_variable(root, "x", None);
    assert_eq!(arena.get_variable(root, "x"), None);
}

#[test]
fn empty_value_removes_binding() {
    let (mut arena, root) = root();
    arena.set_text(root, "x", "1");
    arena.set_variable(root, "x", Some(VarValue::from("")));
    assert_eq!(arena.get_variable(root, "x"), None);
}

#[test]
fn member_values_stay_rich() {
    let (mut arena, root) = root();
    let alice = arena.get_member(root, 10).unwrap();
    arena.set_variable(root, "who", Some(alice.clone().into()));
    assert_eq!(arena.get_variable(root, "who"), Some(&VarValue::Member(alice)));
    assert_eq!(text(&arena, root, "who"), Some("alice#0001".to_string()));
}

#[test]
fn sub_writes_are_visible_at_root() {
    let (mut arena, ids) = chain(2);
    arena.set_text(ids[2], "deep", "yes");
    assert_eq!(text(&arena, ids[0], "deep"), Some("yes".to_string()));
    assert_eq!(arena.variables(ids[0]).len(), 1);
}

#[test]
fn variables_iterate_in_name_order() {
    let (mut arena, root) = root();
    arena.set_text(root, "b", "2");
    arena.set_text(root, "a", "1");
    let names: Vec<&str> = arena.variables(root).iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["a", "b"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Replace mode
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn replace_mode_variable_sets_flag_not_binding() {
    let (mut arena, root) = root();
    assert!(!arena.legacy_replace_mode(root));
    arena.set_text(root, "newrep", "1");
    assert!(arena.legacy_replace_mode(root));
    assert_eq!(arena.get_variable(root, "newrep"), None);
}

#[test]
fn replace_mode_from_sub_lands_on_root() {
    let (mut arena, ids) = chain(2);
    arena.set_text(ids[2], "newrep", "on");
    assert!(arena.legacy_replace_mode(ids[0]));
    assert!(arena.legacy_replace_mode(ids[1]));
    arena.set_variable(ids[1], "newrep", None);
    assert!(!arena.legacy_replace_mode(ids[0]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Guild delegation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn member_lookups_reach_root_guild() {
    let (arena, ids) = chain(2);
    let sub = ids[2];
    assert_eq!(arena.get_members(sub).len(), 2);
    assert_eq!(arena.get_member(sub, 20).map(|m| m.name), Some("bob".to_string()));
    assert_eq!(arena.get_member_named(sub, "Al").map(|m| m.id), Some(10));
    assert_eq!(arena.get_member_named(sub, "bob#0002").map(|m| m.id), Some(20));
    assert_eq!(arena.get_member_named(sub, "carol"), None);
}
