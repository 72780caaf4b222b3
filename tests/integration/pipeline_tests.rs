//! End-to-end pipeline tests: discovery, mark, sweep, convergence,
//! and reporting over small hand-built programs.

use javatrim::ast::{
    CallableKey, Expr, NodeId, Program, ProgramBuilder, Stmt, TypeRef,
};
use javatrim::{
    CoverageView, DecisionReport, ExplanationGraph, InclusionReason, Reducer, ReducerConfig,
    ReasonTable, Resolver,
};

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reference discovery over statement bodies: call and construction targets
/// (and their declaring types) become reachable from the referencing
/// callable.
fn discover(program: &Program, reasons: &ReasonTable) {
    let resolver = Resolver::new(program);
    for id in program.decl_ids() {
        let Some(c) = program.callable(id) else {
            continue;
        };
        let Some(body) = c.body else {
            continue;
        };
        let mut stack: Vec<NodeId> = vec![body];
        while let Some(sid) = stack.pop() {
            let Some(stmt) = program.stmt(sid) else {
                continue;
            };
            match stmt {
                Stmt::Block(children) => stack.extend(children.iter().copied()),
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    stack.push(*then_branch);
                    stack.extend(else_branch.iter().copied());
                }
                Stmt::While { body, .. } => stack.push(*body),
                Stmt::Try {
                    body,
                    catches,
                    finally,
                    ..
                } => {
                    stack.push(*body);
                    stack.extend(catches.iter().map(|cl| cl.body));
                    stack.extend(finally.iter().copied());
                }
                Stmt::Switch { cases, .. } => {
                    for case in cases {
                        stack.extend(case.body.iter().copied());
                    }
                }
                _ => {}
            }
            stmt.exprs(&mut |expr| match expr {
                Expr::Call(call) => {
                    if let Ok(CallableKey::Source(target)) = resolver.resolve_call(call, id) {
                        reasons.attach(target, InclusionReason::TransitiveMethodCallTarget(id));
                        if let Some(ty) = program.declaring_type(target) {
                            reasons.attach(ty, InclusionReason::DirectlyReferencedBy(id));
                        }
                    }
                }
                Expr::New(creation) => {
                    if let Ok(CallableKey::Source(target)) = resolver.resolve_ctor(creation, id) {
                        reasons.attach(target, InclusionReason::TransitiveMethodCallTarget(id));
                        if let Some(ty) = program.declaring_type(target) {
                            reasons.attach(ty, InclusionReason::DirectlyReferencedBy(id));
                        }
                    }
                }
                _ => {}
            });
        }
    }
}

/// `Main.main()` calls `Service.handle()`; `Orphan` is never referenced.
fn sample_program() -> Program {
    let mut b = ProgramBuilder::new();

    let main_unit = b.add_unit("Main.java", Some("app"));
    let main_class = b.add_class(main_unit, None, "Main");
    let main = b.add_method(main_class, "main", TypeRef::Void);
    b.callable_mut(main).modifiers.is_static = true;
    let construct = b.add_stmt(Stmt::LocalVar {
        name: "s".to_string(),
        ty: TypeRef::named("app.Service"),
        init: Some(Expr::new_of(TypeRef::named("app.Service"), vec![])),
    });
    let invoke = b.add_stmt(Stmt::Expr(Expr::call_on(
        Expr::name("s"),
        "handle",
        vec![],
    )));
    b.set_body(main, vec![construct, invoke]);

    let service_unit = b.add_unit("Service.java", Some("app"));
    let service = b.add_class(service_unit, None, "Service");
    let ctor = b.add_ctor(service);
    b.set_body(ctor, vec![]);
    let handle = b.add_method(service, "handle", TypeRef::Void);
    b.set_body(handle, vec![]);
    let helper = b.add_method(service, "formatDebug", TypeRef::string());
    let ret = b.add_stmt(Stmt::Return(Some(Expr::string("debug"))));
    b.set_body(helper, vec![ret]);

    let orphan_unit = b.add_unit("Orphan.java", Some("app"));
    let orphan = b.add_class(orphan_unit, None, "Orphan");
    let dead = b.add_method(orphan, "dead", TypeRef::Void);
    b.set_body(dead, vec![]);

    b.finish()
}

fn entry_config() -> ReducerConfig {
    ReducerConfig {
        entry_points: vec!["app.Main#main()".to_string()],
        ..ReducerConfig::default()
    }
}

#[test]
fn test_reduces_to_reachable_subset() {
    init_logging();
    let reducer = Reducer::new(entry_config());
    let reduction = reducer
        .run(sample_program(), &CoverageView::default(), discover)
        .unwrap();

    let sigs = reduction.program.retained_signatures();
    assert!(sigs.contains("app.Main#main()"));
    assert!(sigs.contains("app.Service#handle()"));
    assert!(sigs.contains("app.Service#<init>()"));
    assert!(!sigs.contains("app.Service#formatDebug()"));
    assert!(!sigs.contains("app.Orphan#dead()"));
    // the Orphan unit disappears entirely
    assert_eq!(reduction.program.units().len(), 2);
}

#[test]
fn test_reduction_is_idempotent() {
    init_logging();
    let reducer = Reducer::new(entry_config());
    let first = reducer
        .run(sample_program(), &CoverageView::default(), discover)
        .unwrap();
    let first_sigs = first.program.retained_signatures();

    let second = reducer
        .run(first.program, &CoverageView::default(), discover)
        .unwrap();
    assert_eq!(second.program.retained_signatures(), first_sigs);
    assert_eq!(second.rounds(), 1);
}

#[test]
fn test_stats_track_rounds() {
    init_logging();
    let reducer = Reducer::new(entry_config());
    let reduction = reducer
        .run(sample_program(), &CoverageView::default(), discover)
        .unwrap();

    assert!(reduction.rounds() >= 2);
    let last = reduction.stats.last().unwrap();
    assert_eq!(last.round, reduction.rounds());
    assert!(last.kept > 0);
    for window in reduction.stats.windows(2) {
        assert!(window[1].retained_callables <= window[0].retained_callables);
    }
}

#[test]
fn test_sequential_matches_parallel() {
    init_logging();
    let parallel = Reducer::new(entry_config())
        .run(sample_program(), &CoverageView::default(), discover)
        .unwrap();
    let sequential = Reducer::new(ReducerConfig {
        parallel: false,
        ..entry_config()
    })
    .run(sample_program(), &CoverageView::default(), discover)
    .unwrap();

    assert_eq!(
        parallel.program.retained_signatures(),
        sequential.program.retained_signatures()
    );
}

#[test]
fn test_retain_pattern_keeps_matching_declarations() {
    init_logging();
    let config = ReducerConfig {
        entry_points: vec!["app.Main#main()".to_string()],
        retain_patterns: vec!["app.Orphan**".to_string()],
        ..ReducerConfig::default()
    };
    let reduction = Reducer::new(config)
        .run(sample_program(), &CoverageView::default(), discover)
        .unwrap();

    assert!(reduction
        .program
        .retained_signatures()
        .contains("app.Orphan#dead()"));
}

#[test]
fn test_decision_report_over_final_round() {
    init_logging();
    let program = sample_program();
    let reasons = ReasonTable::new();
    discover(&program, &reasons);
    // root the entry point the way the driver would
    for id in program.decl_ids() {
        if program.callable_signature(id).as_deref() == Some("app.Main#main()") {
            reasons.attach(id, InclusionReason::ByEntrypoint);
            reasons.attach(
                program.declaring_type(id).unwrap(),
                InclusionReason::ByEntrypoint,
            );
        }
    }
    let coverage = CoverageView::default();
    let classifier = javatrim::Classifier::new(&program, &reasons, &coverage);
    for id in program.decl_ids() {
        classifier.classify(id);
    }
    let decisions = classifier.decisions();

    let report = DecisionReport::build(&program, &decisions, &reasons);
    let json = report.to_json().unwrap();
    assert!(json.contains("app.Main#main()"));
    assert!(json.contains("designated entrypoint"));

    let graph = ExplanationGraph::build(&program, &reasons);
    let handle = program
        .decl_ids()
        .into_iter()
        .find(|id| {
            program.callable_signature(*id).as_deref() == Some("app.Service#handle()")
        })
        .unwrap();
    let chain = graph.why_kept(handle).expect("reachable from entry point");
    assert_eq!(chain.last().unwrap(), "designated entrypoint");
}
