//! Tests for the `loop` construct: range parsing, laziness, scoping of
//! `iter`, and early termination.

use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;
use yna_eval::builtins::iteration::{iterate, Body, RangeSpec, ITER_VARIABLE};
use yna_eval::{ContextArena, ContextId, ContextKind, Invocation};
use yna_types::{ErrorKind, StaticGuild, YnaError, YnaResult};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn root() -> (ContextArena, ContextId) {
    let mut arena = ContextArena::new();
    let root = arena.create_root(Rc::new(StaticGuild::default()));
    (arena, root)
}

/// Body that renders the current `iter`.
fn echo_iter() -> Body<'static> {
    Box::new(|arena: &mut ContextArena, ctx: ContextId| {
        Ok(arena
            .get_variable(ctx, ITER_VARIABLE)
            .map(ToString::to_string)
            .unwrap_or_default())
    })
}

fn collect(spec: &str) -> YnaResult<Vec<String>> {
    let (mut arena, root) = root();
    let output = iterate(Invocation::new(&mut arena, root), spec, echo_iter())?;
    output.collect()
}

fn iter_of(arena: &ContextArena, ctx: ContextId) -> Option<String> {
    arena.get_variable(ctx, ITER_VARIABLE).map(ToString::to_string)
}

// ══════════════════════════════════════════════════════════════════════════════
// Range specs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn three_token_range() {
    assert_eq!(collect("1,4,1").unwrap(), vec!["1", "2", "3"]);
}

#[test]
fn single_token_equals_explicit_range() {
    assert_eq!(collect("3").unwrap(), collect("1,3,1").unwrap());
    assert_eq!(collect("3").unwrap(), vec!["1", "2"]);
}

#[test]
fn defaults_for_blank_start_and_step() {
    assert_eq!(collect(",4,").unwrap(), vec!["1", "2", "3"]);
    assert_eq!(collect("0,10,").unwrap().len(), 10);
}

#[test]
fn stepped_and_descending_ranges() {
    assert_eq!(collect("0,10,3").unwrap(), vec!["0", "3", "6", "9"]);
    assert_eq!(collect("3,0,-1").unwrap(), vec!["3", "2", "1"]);
}

#[test]
fn empty_range_yields_nothing() {
    assert_eq!(collect("5,1,1").unwrap(), Vec::<String>::new());
    assert_eq!(collect("1").unwrap(), Vec::<String>::new());
}

#[test]
fn malformed_specs_fail_before_iterating() {
    for spec in ["", "1,2", "1,2,3,4", "a", "1,b,1", "1,5,0"] {
        let err = RangeSpec::parse(spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments, "spec {spec:?}");
    }
}

#[test]
fn malformed_spec_runs_no_body_and_creates_no_scope() {
    let (mut arena, root) = root();
    let ran = Cell::new(false);
    let body: Body<'_> = Box::new(|_: &mut ContextArena, _: ContextId| {
        ran.set(true);
        Ok(String::new())
    });
    let err = iterate(Invocation::new(&mut arena, root), "1,2", body).err().unwrap();
    assert_eq!(err.source_function(), Some("loop"));
    assert_eq!(err.to_string(), "<loop:invalid args>");
    assert!(!ran.get());
}

// ══════════════════════════════════════════════════════════════════════════════
// Laziness
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unpulled_elements_are_never_evaluated() {
    let (mut arena, root) = root();
    let calls = Cell::new(0);
    let body: Body<'_> = Box::new(|_: &mut ContextArena, _: ContextId| {
        calls.set(calls.get() + 1);
        Ok("x".to_string())
    });
    let mut output = iterate(Invocation::new(&mut arena, root), "1,1000000,1", body).unwrap();
    assert_eq!(calls.get(), 0);
    let first_two: Vec<_> = output.by_ref().take(2).collect::<YnaResult<_>>().unwrap();
    assert_eq!(first_two, vec!["x", "x"]);
    drop(output);
    assert_eq!(calls.get(), 2);
}

#[test]
fn first_failure_ends_the_sequence() {
    let (mut arena, root) = root();
    let body: Body<'_> = Box::new(|arena: &mut ContextArena, ctx: ContextId| {
        match arena.get_variable(ctx, ITER_VARIABLE).map(ToString::to_string).as_deref() {
            Some("2") => Err(YnaError::new(ErrorKind::BadIndex).from_builtin("slice")),
            Some(i) => Ok(i.to_string()),
            None => Ok(String::new()),
        }
    });
    let mut output = iterate(Invocation::new(&mut arena, root), "1,5,1", body).unwrap();
    assert_eq!(output.next().unwrap().unwrap(), "1");
    assert_eq!(output.next().unwrap().unwrap_err().kind(), ErrorKind::BadIndex);
    assert!(output.next().is_none());
    assert!(output.next().is_none());
}

// ══════════════════════════════════════════════════════════════════════════════
// Scoping
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn body_runs_in_one_sub_scope() {
    let (mut arena, root) = root();
    let seen = Cell::new(None);
    let body: Body<'_> = Box::new(|arena: &mut ContextArena, ctx: ContextId| {
        assert_eq!(arena.kind(ctx), ContextKind::Sub);
        assert_eq!(arena.base(ctx), root);
        match seen.get() {
            None => seen.set(Some(ctx)),
            Some(first) => assert_eq!(first, ctx),
        }
        Ok(String::new())
    });
    let output = iterate(Invocation::new(&mut arena, root), "1,4,1", body).unwrap();
    assert_eq!(output.count(), 3);
}

#[test]
fn iter_is_restored_after_exhaustion() {
    let (mut arena, root) = root();
    arena.set_text(root, ITER_VARIABLE, "outer");
    let output = iterate(Invocation::new(&mut arena, root), "1,4,1", echo_iter()).unwrap();
    let items: Vec<String> = output.collect::<YnaResult<_>>().unwrap();
    assert_eq!(items, vec!["1", "2", "3"]);
    assert_eq!(iter_of(&arena, root), Some("outer".to_string()));
}

#[test]
fn iter_is_removed_when_parent_had_none() {
    let (mut arena, root) = root();
    let output = iterate(Invocation::new(&mut arena, root), "1,3,1", echo_iter()).unwrap();
    assert_eq!(output.count(), 2);
    assert_eq!(iter_of(&arena, root), None);
}

#[test]
fn iter_is_restored_on_early_drop() {
    let (mut arena, root) = root();
    arena.set_text(root, ITER_VARIABLE, "outer");
    let mut output = iterate(Invocation::new(&mut arena, root), "1,100,1", echo_iter()).unwrap();
    assert_eq!(output.next().unwrap().unwrap(), "1");
    drop(output);
    assert_eq!(iter_of(&arena, root), Some("outer".to_string()));
}

#[test]
fn iter_is_restored_after_failure() {
    let (mut arena, root) = root();
    arena.set_text(root, ITER_VARIABLE, "outer");
    let body: Body<'_> = Box::new(|_: &mut ContextArena, _: ContextId| {
        Err(YnaError::new(ErrorKind::NoContent))
    });
    let mut output = iterate(Invocation::new(&mut arena, root), "1,3,1", body).unwrap();
    assert!(output.next().unwrap().is_err());
    assert!(output.next().is_none());
    drop(output);
    assert_eq!(iter_of(&arena, root), Some("outer".to_string()));
}

#[test]
fn body_writes_survive_the_loop() {
    let (mut arena, root) = root();
    let body: Body<'_> = Box::new(|arena: &mut ContextArena, ctx: ContextId| {
        let i = arena.get_variable(ctx, ITER_VARIABLE).map(ToString::to_string).unwrap_or_default();
        arena.set_text(ctx, "last", i);
        Ok(String::new())
    });
    let output = iterate(Invocation::new(&mut arena, root), "1,4,1", body).unwrap();
    assert_eq!(output.count(), 3);
    assert_eq!(arena.get_variable(root, "last").map(ToString::to_string), Some("3".into()));
}

#[test]
fn nested_loops_restore_each_level() {
    let (mut arena, root) = root();
    let inner_outputs = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = Rc::clone(&inner_outputs);
    let outer_body: Body<'_> = Box::new(move |arena: &mut ContextArena, ctx: ContextId| {
        let outer_i = iter_of(arena, ctx).unwrap_or_default();
        let inner = iterate(Invocation::new(arena, ctx), "1,3,1", echo_iter())?;
        let inner: String = inner.collect::<YnaResult<Vec<_>>>()?.concat();
        sink.borrow_mut().push(inner);
        // The inner loop put the outer `iter` back.
        Ok(format!("{outer_i}={}", iter_of(arena, ctx).unwrap_or_default()))
    });
    let output = iterate(Invocation::new(&mut arena, root), "1,3,1", outer_body).unwrap();
    let items: Vec<String> = output.collect::<YnaResult<_>>().unwrap();
    assert_eq!(items, vec!["1=1", "2=2"]);
    assert_eq!(*inner_outputs.borrow(), vec!["12".to_string(), "12".to_string()]);
    assert_eq!(iter_of(&arena, root), None);
}
