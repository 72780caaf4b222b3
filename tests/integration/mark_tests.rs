//! Mark-phase integration tests: classification outcomes over whole
//! programs, cycle handling, and override contracts.

use javatrim::ast::{Expr, NodeId, Program, ProgramBuilder, Stmt, TypeRef};
use javatrim::{Classifier, CoverageView, Decision, InclusionReason, ReasonTable};

/// Abstract `Shape.area()` with two concrete overrides; only `Circle`'s ran
/// at runtime.
fn shapes() -> (Program, Shapes) {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Shapes.java", Some("geo"));

    let shape = b.add_class(unit, None, "Shape");
    b.type_mut(shape).modifiers.is_abstract = true;
    let area = b.add_method(shape, "area", TypeRef::Primitive(javatrim::ast::PrimitiveKind::Double));
    b.callable_mut(area).modifiers.is_abstract = true;

    let circle = b.add_class(unit, None, "Circle");
    b.type_mut(circle).superclass = Some(TypeRef::named("geo.Shape"));
    let circle_area = b.add_method(circle, "area", TypeRef::Primitive(javatrim::ast::PrimitiveKind::Double));
    b.set_body(circle_area, vec![]);

    let square = b.add_class(unit, None, "Square");
    b.type_mut(square).superclass = Some(TypeRef::named("geo.Shape"));
    let square_area = b.add_method(square, "area", TypeRef::Primitive(javatrim::ast::PrimitiveKind::Double));
    b.set_body(square_area, vec![]);
    let unrelated = b.add_method(square, "debugString", TypeRef::string());
    b.set_body(unrelated, vec![]);

    let program = b.finish();
    (
        program,
        Shapes {
            shape,
            area,
            circle,
            circle_area,
            square,
            square_area,
            unrelated,
        },
    )
}

struct Shapes {
    shape: NodeId,
    area: NodeId,
    circle: NodeId,
    circle_area: NodeId,
    square: NodeId,
    square_area: NodeId,
    unrelated: NodeId,
}

#[test]
fn test_override_contract_scenario() {
    let (program, s) = shapes();

    // the caller dispatches through Shape.area(); both subclasses are
    // instantiated somewhere reachable
    let reasons = ReasonTable::new();
    reasons.attach(s.shape, InclusionReason::DirectlyReferenced);
    reasons.attach(s.area, InclusionReason::DirectlyReferenced);
    reasons.attach(s.circle, InclusionReason::DirectlyReferenced);
    reasons.attach(s.square, InclusionReason::DirectlyReferenced);

    let mut coverage = CoverageView::new();
    coverage.record_method("geo.Circle#area()", true);
    coverage.record_method("geo.Square#area()", false);

    let classifier = Classifier::new(&program, &reasons, &coverage);
    assert_eq!(classifier.classify(s.area), Decision::Keep);
    // ran at runtime: body survives
    assert_eq!(classifier.classify(s.circle_area), Decision::Keep);
    // required for override consistency, but provably never ran
    assert_eq!(classifier.classify(s.square_area), Decision::Dummy);
    // not referenced, not a contract: gone
    assert_eq!(classifier.classify(s.unrelated), Decision::Remove);
}

#[test]
fn test_sole_concrete_override_of_kept_abstract_is_kept() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("W.java", Some("p"));
    let base = b.add_class(unit, None, "Worker");
    b.type_mut(base).modifiers.is_abstract = true;
    let run = b.add_method(base, "run", TypeRef::Void);
    b.callable_mut(run).modifiers.is_abstract = true;
    let only = b.add_class(unit, None, "OnlyWorker");
    b.type_mut(only).superclass = Some(TypeRef::named("p.Worker"));
    let only_run = b.add_method(only, "run", TypeRef::Void);
    b.set_body(only_run, vec![]);
    let program = b.finish();

    let reasons = ReasonTable::new();
    reasons.attach(base, InclusionReason::DirectlyReferenced);
    reasons.attach(run, InclusionReason::DirectlyReferenced);
    reasons.attach(only, InclusionReason::DirectlyReferenced);

    let coverage = CoverageView::default();
    let classifier = Classifier::new(&program, &reasons, &coverage);
    // the abstract declaration would be uncallable without its one
    // implementation
    assert_eq!(classifier.classify(only_run), Decision::Keep);
}

#[test]
fn test_mutual_reference_cycle_is_removed_in_any_order() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("C.java", Some("p"));
    let class = b.add_class(unit, None, "C");
    let a = b.add_method(class, "a", TypeRef::Void);
    b.set_body(a, vec![]);
    let c = b.add_method(class, "b", TypeRef::Void);
    b.set_body(c, vec![]);
    let program = b.finish();

    let reasons = ReasonTable::new();
    reasons.attach(class, InclusionReason::DirectlyReferenced);
    reasons.attach(a, InclusionReason::TransitiveMethodCallTarget(c));
    reasons.attach(c, InclusionReason::TransitiveMethodCallTarget(a));

    let coverage = CoverageView::default();
    let forward = Classifier::new(&program, &reasons, &coverage);
    let first = (forward.classify(a), forward.classify(c));

    let backward = Classifier::new(&program, &reasons, &coverage);
    let second = (backward.classify(c), backward.classify(a));

    assert_eq!(first, (Decision::Remove, Decision::Remove));
    assert_eq!(second, (Decision::Remove, Decision::Remove));
}

#[test]
fn test_reference_chain_follows_its_root() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Chain.java", Some("p"));
    let class = b.add_class(unit, None, "Chain");
    let root = b.add_method(class, "root", TypeRef::Void);
    b.set_body(root, vec![]);
    let mid = b.add_method(class, "mid", TypeRef::Void);
    b.set_body(mid, vec![]);
    let leaf = b.add_method(class, "leaf", TypeRef::Void);
    b.set_body(leaf, vec![]);
    let program = b.finish();

    let with_root = ReasonTable::new();
    with_root.attach(class, InclusionReason::DirectlyReferenced);
    with_root.attach(root, InclusionReason::ByEntrypoint);
    with_root.attach(mid, InclusionReason::TransitiveMethodCallTarget(root));
    with_root.attach(leaf, InclusionReason::TransitiveMethodCallTarget(mid));

    let coverage = CoverageView::default();
    let classifier = Classifier::new(&program, &with_root, &coverage);
    assert_eq!(classifier.classify(leaf), Decision::Keep);

    // same chain minus the entry point reason: everything collapses
    let without_root = ReasonTable::new();
    without_root.attach(class, InclusionReason::DirectlyReferenced);
    without_root.attach(mid, InclusionReason::TransitiveMethodCallTarget(root));
    without_root.attach(leaf, InclusionReason::TransitiveMethodCallTarget(mid));

    let classifier = Classifier::new(&program, &without_root, &coverage);
    assert_eq!(classifier.classify(leaf), Decision::Remove);
    assert_eq!(classifier.classify(mid), Decision::Remove);
}

#[test]
fn test_rooted_cycle_decisions_are_order_independent() {
    // entry calls step; step and other call each other
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Loop.java", Some("p"));
    let class = b.add_class(unit, None, "Loop");
    let entry = b.add_method(class, "entry", TypeRef::Void);
    b.set_body(entry, vec![]);
    let step = b.add_method(class, "step", TypeRef::Void);
    b.set_body(step, vec![]);
    let other = b.add_method(class, "other", TypeRef::Void);
    b.set_body(other, vec![]);
    let program = b.finish();

    let reasons = ReasonTable::new();
    reasons.attach(class, InclusionReason::DirectlyReferenced);
    reasons.attach(entry, InclusionReason::ByEntrypoint);
    reasons.attach(step, InclusionReason::TransitiveMethodCallTarget(entry));
    reasons.attach(step, InclusionReason::TransitiveMethodCallTarget(other));
    reasons.attach(other, InclusionReason::TransitiveMethodCallTarget(step));

    let coverage = CoverageView::default();
    let forward = Classifier::new(&program, &reasons, &coverage);
    let first = (forward.classify(step), forward.classify(other));

    let backward = Classifier::new(&program, &reasons, &coverage);
    let second = (backward.classify(other), backward.classify(step));

    // the cycle is rooted through `entry`, so both survive regardless of
    // which member of the cycle is asked about first
    assert_eq!(first, (Decision::Keep, Decision::Keep));
    assert_eq!((second.1, second.0), first);
}

#[test]
fn test_always_throwing_body_is_dummied() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("T.java", Some("p"));
    let class = b.add_class(unit, None, "T");
    let caller = b.add_method(class, "caller", TypeRef::Void);
    b.set_body(caller, vec![]);
    let fail = b.add_method(class, "fail", TypeRef::Void);
    let boom = b.add_stmt(Stmt::Throw(Expr::new_of(
        TypeRef::named("java.lang.IllegalStateException"),
        vec![],
    )));
    b.set_body(fail, vec![boom]);
    let ok = b.add_method(class, "ok", TypeRef::int());
    let ret = b.add_stmt(Stmt::Return(Some(Expr::int(1))));
    b.set_body(ok, vec![ret]);
    let program = b.finish();

    let reasons = ReasonTable::new();
    reasons.attach(class, InclusionReason::DirectlyReferenced);
    reasons.attach(caller, InclusionReason::ByEntrypoint);
    reasons.attach(fail, InclusionReason::TransitiveMethodCallTarget(caller));
    reasons.attach(ok, InclusionReason::TransitiveMethodCallTarget(caller));

    let coverage = CoverageView::default();
    let classifier = Classifier::new(&program, &reasons, &coverage);
    // no runtime evidence either way: the unconditional throw is already
    // marker-equivalent, the returning body is not
    assert_eq!(classifier.classify(fail), Decision::Dummy);
    assert_eq!(classifier.classify(ok), Decision::Keep);
}

#[test]
fn test_removed_type_drags_members() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Host.java", Some("p"));
    let host = b.add_class(unit, None, "Host");
    let member = b.add_method(host, "member", TypeRef::Void);
    b.set_body(member, vec![]);
    let program = b.finish();

    // the method carries a reason, the declaring type does not
    let reasons = ReasonTable::new();
    reasons.attach(member, InclusionReason::DirectlyReferenced);

    let coverage = CoverageView::default();
    let classifier = Classifier::new(&program, &reasons, &coverage);
    assert_eq!(classifier.classify(host), Decision::Remove);
    assert_eq!(classifier.classify(member), Decision::Remove);
}

#[test]
fn test_coverage_covered_class_survives_without_reasons() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("R.java", Some("p"));
    let class = b.add_class(unit, None, "ReflectivelyLoaded");
    let program = b.finish();

    let mut coverage = CoverageView::new();
    coverage.record_class("p.ReflectivelyLoaded", true);

    let reasons = ReasonTable::new();
    let classifier = Classifier::new(&program, &reasons, &coverage);
    assert_eq!(classifier.classify(class), Decision::Keep);
}

#[test]
fn test_classification_is_idempotent() {
    let (program, s) = shapes();
    let reasons = ReasonTable::new();
    reasons.attach(s.shape, InclusionReason::DirectlyReferenced);
    reasons.attach(s.area, InclusionReason::DirectlyReferenced);
    reasons.attach(s.circle, InclusionReason::DirectlyReferenced);
    reasons.attach(s.square, InclusionReason::DirectlyReferenced);

    let coverage = CoverageView::default();
    let classifier = Classifier::new(&program, &reasons, &coverage);
    let first: Vec<Decision> = program
        .decl_ids()
        .into_iter()
        .map(|id| classifier.classify(id))
        .collect();
    let second: Vec<Decision> = program
        .decl_ids()
        .into_iter()
        .map(|id| classifier.classify(id))
        .collect();
    assert_eq!(first, second);
}
