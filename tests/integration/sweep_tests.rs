//! Sweep-phase integration tests: structural repairs, dummy synthesis,
//! catch narrowing, and round-trip stability.

use std::collections::BTreeMap;

use javatrim::ast::{
    CatchClause, Expr, Literal, LibCallable, LibClass, NodeId, Program, ProgramBuilder, Stmt,
    TypeKind, TypeRef,
};
use javatrim::sweep::{sweep, SweepError, SweepOptions};
use javatrim::{Decision, ReasonTable};

fn keep_all(program: &Program) -> BTreeMap<NodeId, Decision> {
    program
        .decl_ids()
        .into_iter()
        .map(|id| (id, Decision::Keep))
        .collect()
}

fn find_callable(program: &Program, signature: &str) -> NodeId {
    program
        .decl_ids()
        .into_iter()
        .find(|id| program.callable_signature(*id).as_deref() == Some(signature))
        .unwrap_or_else(|| panic!("no callable {signature}"))
}

fn body_stmts(program: &Program, callable: NodeId) -> Vec<NodeId> {
    let body = program.callable(callable).unwrap().body.expect("body");
    match program.stmt(body) {
        Some(Stmt::Block(stmts)) => stmts.clone(),
        other => panic!("expected block body, got {other:?}"),
    }
}

#[test]
fn test_all_keep_unit_round_trips_structurally() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Calc.java", Some("p"));
    b.add_import(unit, "java.util.List", false, false);
    let class = b.add_class(unit, None, "Calc");
    let field = b.add_field(class, "total", TypeRef::int());
    b.field_mut(field).initializer = Some(Expr::int(0));
    let m = b.add_method(class, "accumulate", TypeRef::int());
    b.add_param(m, "x", TypeRef::int());
    let then_branch = b.add_stmt(Stmt::Return(Some(Expr::name("x"))));
    let cond = b.add_stmt(Stmt::If {
        cond: Expr::Binary {
            op: ">".to_string(),
            lhs: Box::new(Expr::name("x")),
            rhs: Box::new(Expr::int(0)),
        },
        then_branch,
        else_branch: None,
    });
    let ret = b.add_stmt(Stmt::Return(Some(Expr::name("total"))));
    b.set_body(m, vec![cond, ret]);
    let program = b.finish();

    let reduced = sweep(
        &program,
        &keep_all(&program),
        &ReasonTable::new(),
        &SweepOptions::default(),
    )
    .unwrap();

    assert_eq!(reduced.retained_signatures(), program.retained_signatures());
    let new_m = find_callable(&reduced, "p.Calc#accumulate(int)");
    assert_eq!(body_stmts(&reduced, new_m).len(), 2);
    let new_unit = reduced.unit(reduced.units()[0]).unwrap();
    assert_eq!(new_unit.imports.len(), 1);
}

#[test]
fn test_dummy_marker_carries_configured_message() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("A.java", Some("p"));
    let class = b.add_class(unit, None, "A");
    let m = b.add_method(class, "compute", TypeRef::string());
    let ret = b.add_stmt(Stmt::Return(Some(Expr::string("real"))));
    b.set_body(m, vec![ret]);
    let program = b.finish();

    let mut decisions = keep_all(&program);
    decisions.insert(m, Decision::Dummy);
    let options = SweepOptions {
        assertions_enabled: true,
        marker_message: "stripped by test".to_string(),
    };
    let reduced = sweep(&program, &decisions, &ReasonTable::new(), &options).unwrap();

    let new_m = find_callable(&reduced, "p.A#compute()");
    let stmts = body_stmts(&reduced, new_m);
    assert_eq!(stmts.len(), 1);
    match reduced.stmt(stmts[0]) {
        Some(Stmt::Throw(Expr::New(creation))) => {
            assert_eq!(creation.ty, TypeRef::named("java.lang.AssertionError"));
            assert_eq!(
                creation.args,
                vec![Expr::Literal(Literal::Str("stripped by test".to_string()))]
            );
        }
        other => panic!("expected marker throw, got {other:?}"),
    }
}

#[test]
fn test_dummy_default_returns_are_well_typed() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("A.java", Some("p"));
    let class = b.add_class(unit, None, "A");
    let int_m = b.add_method(class, "count", TypeRef::int());
    b.set_body(int_m, vec![]);
    let bool_m = b.add_method(class, "ready", TypeRef::boolean());
    b.set_body(bool_m, vec![]);
    let ref_m = b.add_method(class, "label", TypeRef::string());
    b.set_body(ref_m, vec![]);
    let void_m = b.add_method(class, "touch", TypeRef::Void);
    b.set_body(void_m, vec![]);
    let program = b.finish();

    let mut decisions = keep_all(&program);
    for m in [int_m, bool_m, ref_m, void_m] {
        decisions.insert(m, Decision::Dummy);
    }
    let options = SweepOptions {
        assertions_enabled: false,
        ..SweepOptions::default()
    };
    let reduced = sweep(&program, &decisions, &ReasonTable::new(), &options).unwrap();

    let returned = |sig: &str| {
        let id = find_callable(&reduced, sig);
        let stmts = body_stmts(&reduced, id);
        stmts
            .first()
            .and_then(|s| match reduced.stmt(*s) {
                Some(Stmt::Return(e)) => Some(e.clone()),
                _ => None,
            })
    };
    assert_eq!(
        returned("p.A#count()"),
        Some(Some(Expr::Literal(Literal::Int(0))))
    );
    assert_eq!(
        returned("p.A#ready()"),
        Some(Some(Expr::Literal(Literal::Bool(false))))
    );
    assert_eq!(returned("p.A#label()"), Some(Some(Expr::null())));
    // void dummies have nothing to return
    let void_id = find_callable(&reduced, "p.A#touch()");
    assert!(body_stmts(&reduced, void_id).is_empty());
}

#[test]
fn test_dummy_ctor_delegates_and_assigns_final_fields() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Pair.java", Some("p"));

    let base = b.add_class(unit, None, "Base");
    let base_ctor = b.add_ctor(base);
    b.add_param(base_ctor, "id", TypeRef::int());
    b.set_body(base_ctor, vec![]);

    let pair = b.add_class(unit, None, "Pair");
    b.type_mut(pair).superclass = Some(TypeRef::named("p.Base"));
    let field = b.add_field(pair, "left", TypeRef::int());
    b.field_mut(field).modifiers.is_final = true;
    let ctor = b.add_ctor(pair);
    b.add_param(ctor, "left", TypeRef::int());
    let sup = b.add_stmt(Stmt::ExplicitCtorCall {
        is_super: true,
        args: vec![Expr::int(1)],
    });
    let assign = b.add_stmt(Stmt::Expr(Expr::assign(
        Expr::FieldAccess {
            target: Box::new(Expr::This),
            name: "left".to_string(),
        },
        Expr::name("left"),
    )));
    b.set_body(ctor, vec![sup, assign]);
    let program = b.finish();

    let mut decisions = keep_all(&program);
    decisions.insert(ctor, Decision::Dummy);
    let reduced = sweep(
        &program,
        &decisions,
        &ReasonTable::new(),
        &SweepOptions::default(),
    )
    .unwrap();

    let new_ctor = find_callable(&reduced, "p.Pair#<init>(int)");
    let stmts = body_stmts(&reduced, new_ctor);
    // super(0); this.left = 0; throw marker
    assert_eq!(stmts.len(), 3);
    match reduced.stmt(stmts[0]) {
        Some(Stmt::ExplicitCtorCall { is_super: true, args }) => {
            assert_eq!(args, &vec![Expr::Literal(Literal::Int(0))]);
        }
        other => panic!("expected super delegation, got {other:?}"),
    }
    match reduced.stmt(stmts[1]) {
        Some(Stmt::Expr(Expr::Assign { value, .. })) => {
            assert_eq!(**value, Expr::Literal(Literal::Int(0)));
        }
        other => panic!("expected final-field assignment, got {other:?}"),
    }
    assert!(matches!(reduced.stmt(stmts[2]), Some(Stmt::Throw(_))));
}

#[test]
fn test_catch_union_narrows_to_still_thrown_type() {
    let mut b = ProgramBuilder::new();
    b.library_mut().add_class(LibClass {
        qualified_name: "java.io.IOException".to_string(),
        kind: TypeKind::Class,
        is_abstract: false,
        type_params: vec![],
        superclass: Some(TypeRef::named("java.lang.Exception")),
        interfaces: vec![],
        members: vec![LibCallable::ctor(vec![])],
    });
    b.library_mut().add_class(LibClass {
        qualified_name: "java.sql.SQLException".to_string(),
        kind: TypeKind::Class,
        is_abstract: false,
        type_params: vec![],
        superclass: Some(TypeRef::named("java.lang.Exception")),
        interfaces: vec![],
        members: vec![LibCallable::ctor(vec![])],
    });

    let unit = b.add_unit("A.java", Some("p"));
    let class = b.add_class(unit, None, "A");
    let m = b.add_method(class, "load", TypeRef::Void);
    let throw = b.add_stmt(Stmt::Throw(Expr::new_of(
        TypeRef::named("java.io.IOException"),
        vec![],
    )));
    let try_body = b.add_stmt(Stmt::Block(vec![throw]));
    let catch_body = b.add_stmt(Stmt::Block(vec![]));
    let try_stmt = b.add_stmt(Stmt::Try {
        resources: vec![],
        body: try_body,
        catches: vec![CatchClause {
            types: vec![
                TypeRef::named("java.io.IOException"),
                TypeRef::named("java.sql.SQLException"),
            ],
            param: "e".to_string(),
            body: catch_body,
        }],
        finally: None,
    });
    b.set_body(m, vec![try_stmt]);
    let program = b.finish();

    let reduced = sweep(
        &program,
        &keep_all(&program),
        &ReasonTable::new(),
        &SweepOptions::default(),
    )
    .unwrap();

    let new_m = find_callable(&reduced, "p.A#load()");
    let stmts = body_stmts(&reduced, new_m);
    let Some(Stmt::Try { catches, .. }) = reduced.stmt(stmts[0]) else {
        panic!("expected try statement");
    };
    assert_eq!(catches.len(), 1);
    assert_eq!(catches[0].types, vec![TypeRef::named("java.io.IOException")]);
}

#[test]
fn test_enum_losing_all_constants_keeps_concrete_methods() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Mode.java", Some("p"));
    let mode = b.add_enum(unit, None, "Mode");
    let on = b.add_enum_constant(mode, "ON", vec![]);
    let off = b.add_enum_constant(mode, "OFF", vec![]);
    let describe = b.add_method(mode, "describe", TypeRef::string());
    b.callable_mut(describe).modifiers.is_abstract = true;
    let program = b.finish();

    let mut decisions = keep_all(&program);
    decisions.insert(on, Decision::Remove);
    decisions.insert(off, Decision::Remove);
    decisions.insert(describe, Decision::Dummy);
    let reduced = sweep(
        &program,
        &decisions,
        &ReasonTable::new(),
        &SweepOptions::default(),
    )
    .unwrap();

    let new_describe = find_callable(&reduced, "p.Mode#describe()");
    let decl = reduced.callable(new_describe).unwrap();
    // nothing can subclass an enum without constants, so the method must
    // become concrete
    assert!(!decl.modifiers.is_abstract);
    assert!(decl.body.is_some());
}

#[test]
fn test_missing_super_ctor_is_a_structural_failure() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("B.java", Some("p"));

    let sealed_unit = b.add_unit("Sealed.java", Some("p"));
    let sealed = b.add_class(sealed_unit, None, "Sealed");
    let hidden = b.add_ctor(sealed);
    b.set_visibility(hidden, javatrim::ast::Visibility::Private);
    b.set_body(hidden, vec![]);

    let class = b.add_class(unit, None, "B");
    b.type_mut(class).superclass = Some(TypeRef::named("p.Sealed"));
    let ctor = b.add_ctor(class);
    b.add_param(ctor, "x", TypeRef::int());
    b.set_body(ctor, vec![]);
    let program = b.finish();

    let mut decisions = keep_all(&program);
    decisions.insert(ctor, Decision::Remove);
    let result = sweep(
        &program,
        &decisions,
        &ReasonTable::new(),
        &SweepOptions::default(),
    );

    assert!(matches!(
        result,
        Err(SweepError::StructuralRepair { ref class, .. }) if class == "p.B"
    ));
}
