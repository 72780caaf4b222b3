//! Resolution integration tests: overload selection, baseline distrust,
//! name scoping, static imports, and pseudo-fields.

use javatrim::ast::{
    CallableKey, Expr, MethodCall, NodeId, Program, ProgramBuilder, Stmt, SymbolRef, TypeKey,
    TypeRef,
};
use javatrim::resolve::NameTarget;
use javatrim::types::ResolvedType;
use javatrim::{ResolveError, Resolver};

fn call(name: &str, args: Vec<Expr>) -> MethodCall {
    MethodCall {
        receiver: None,
        name: name.to_string(),
        type_args: vec![],
        args,
        baseline: None,
    }
}

/// `f(Object)` and `f(String)`, plus a caller to resolve from.
fn overloaded() -> (Program, NodeId, NodeId, NodeId) {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("A.java", Some("p"));
    let class = b.add_class(unit, None, "A");
    let f_object = b.add_method(class, "f", TypeRef::Void);
    b.add_param(f_object, "x", TypeRef::named("java.lang.Object"));
    let f_string = b.add_method(class, "f", TypeRef::Void);
    b.add_param(f_string, "x", TypeRef::string());
    let caller = b.add_method(class, "caller", TypeRef::Void);
    b.set_body(caller, vec![]);
    (b.finish(), f_object, f_string, caller)
}

#[test]
fn test_most_specific_overload_wins() {
    let (program, _f_object, f_string, caller) = overloaded();
    let resolver = Resolver::new(&program);

    let resolved = resolver
        .resolve_call(&call("f", vec![Expr::string("x")]), caller)
        .unwrap();
    assert_eq!(resolved, CallableKey::Source(f_string));
}

#[test]
fn test_widening_falls_back_to_object_overload() {
    let (program, f_object, _f_string, caller) = overloaded();
    let resolver = Resolver::new(&program);

    // an int argument matches neither exactly; only Object boxes
    let resolved = resolver
        .resolve_call(&call("f", vec![Expr::int(3)]), caller)
        .unwrap();
    assert_eq!(resolved, CallableKey::Source(f_object));
}

#[test]
fn test_varargs_selected_on_second_pass() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("L.java", Some("p"));
    let class = b.add_class(unit, None, "L");
    let log = b.add_method(class, "log", TypeRef::Void);
    let tail = b.add_param(log, "parts", TypeRef::array(TypeRef::string()));
    b.param_mut(tail).varargs = true;
    let caller = b.add_method(class, "caller", TypeRef::Void);
    b.set_body(caller, vec![]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    let resolved = resolver
        .resolve_call(
            &call("log", vec![Expr::string("a"), Expr::string("b")]),
            caller,
        )
        .unwrap();
    assert_eq!(resolved, CallableKey::Source(log));
}

#[test]
fn test_ambiguity_is_a_hard_error() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("G.java", Some("p"));
    let class = b.add_class(unit, None, "G");
    let g_int = b.add_method(class, "g", TypeRef::Void);
    b.add_param(g_int, "x", TypeRef::int());
    let g_bool = b.add_method(class, "g", TypeRef::Void);
    b.add_param(g_bool, "x", TypeRef::boolean());
    let caller = b.add_method(class, "caller", TypeRef::Void);
    b.set_body(caller, vec![]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    // the argument's type is unknown, so both overloads stay applicable
    let arg = Expr::Opaque {
        referenced: vec!["mystery".to_string()],
    };
    let result = resolver.resolve_call(&call("g", vec![arg]), caller);
    assert!(matches!(result, Err(ResolveError::Ambiguous { .. })));
}

#[test]
fn test_trusted_baseline_short_circuits() {
    let (program, f_object, _f_string, caller) = overloaded();
    let resolver = Resolver::new(&program);

    // the baseline names the less specific overload; without a suspect
    // overload set it is taken at face value
    let mut c = call("f", vec![Expr::string("x")]);
    c.baseline = Some(SymbolRef::Callable(CallableKey::Source(f_object)));
    let resolved = resolver.resolve_call(&c, caller).unwrap();
    assert_eq!(resolved, CallableKey::Source(f_object));
}

#[test]
fn test_suspect_baseline_is_rederived() {
    use javatrim::ast::TypeParam;

    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("P.java", Some("p"));
    let class = b.add_class(unit, None, "P");

    // two overloads declaring `T` at the same position: the known
    // conflation shape
    let pick_one = b.add_method(class, "pick", TypeRef::named("T"));
    b.callable_mut(pick_one).type_params.push(TypeParam::new("T"));
    b.add_param(pick_one, "a", TypeRef::named("T"));

    let pick_two = b.add_method(class, "pick", TypeRef::named("T"));
    b.callable_mut(pick_two).type_params.push(TypeParam::new("T"));
    b.add_param(pick_two, "a", TypeRef::named("T"));
    b.add_param(pick_two, "b", TypeRef::named("T"));

    let caller = b.add_method(class, "caller", TypeRef::Void);
    b.set_body(caller, vec![]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    // the baseline claims the two-argument overload for a one-argument
    // call; re-derivation lands on the arity-correct one
    let mut c = call("pick", vec![Expr::string("x")]);
    c.baseline = Some(SymbolRef::Callable(CallableKey::Source(pick_two)));
    let resolved = resolver.resolve_call(&c, caller).unwrap();
    assert_eq!(resolved, CallableKey::Source(pick_one));
}

#[test]
fn test_same_context_calls_resolve_independently() {
    // two locals of different types, one method: resolving `a.f()` must
    // not pre-answer `b.f()`
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("C.java", Some("p"));
    let a_class = b.add_class(unit, None, "A");
    let a_f = b.add_method(a_class, "f", TypeRef::Void);
    let b_class = b.add_class(unit, None, "B");
    let b_f = b.add_method(b_class, "f", TypeRef::Void);
    let host = b.add_class(unit, None, "Host");
    let m = b.add_method(host, "run", TypeRef::Void);
    let da = b.add_stmt(Stmt::LocalVar {
        name: "a".to_string(),
        ty: TypeRef::named("p.A"),
        init: None,
    });
    let db = b.add_stmt(Stmt::LocalVar {
        name: "b".to_string(),
        ty: TypeRef::named("p.B"),
        init: None,
    });
    b.set_body(m, vec![da, db]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    let call_on = |recv: &str| MethodCall {
        receiver: Some(Box::new(Expr::name(recv))),
        name: "f".to_string(),
        type_args: vec![],
        args: vec![],
        baseline: None,
    };
    assert_eq!(
        resolver.resolve_call(&call_on("a"), m).unwrap(),
        CallableKey::Source(a_f)
    );
    assert_eq!(
        resolver.resolve_call(&call_on("b"), m).unwrap(),
        CallableKey::Source(b_f)
    );
    // and asking again hits the cache with the same answers
    assert_eq!(
        resolver.resolve_call(&call_on("a"), m).unwrap(),
        CallableKey::Source(a_f)
    );
}

#[test]
fn test_parameter_shadows_field() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("S.java", Some("p"));
    let class = b.add_class(unit, None, "S");
    let field = b.add_field(class, "x", TypeRef::string());
    let m = b.add_method(class, "use", TypeRef::Void);
    let param = b.add_param(m, "x", TypeRef::int());
    b.set_body(m, vec![]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    assert_eq!(
        resolver.resolve_name("x", m).unwrap(),
        NameTarget::Param(param)
    );

    // outside the method the field is the only `x`
    assert_eq!(
        resolver.resolve_name("x", class).unwrap(),
        NameTarget::Field(field)
    );
}

#[test]
fn test_static_import_resolves_constant() {
    let mut b = ProgramBuilder::new();
    let const_unit = b.add_unit("Constants.java", Some("p"));
    let constants = b.add_class(const_unit, None, "Constants");
    let max = b.add_field(constants, "MAX", TypeRef::int());
    b.field_mut(max).modifiers.is_static = true;
    b.field_mut(max).modifiers.is_final = true;

    let using_unit = b.add_unit("U.java", Some("q"));
    b.add_import(using_unit, "p.Constants.MAX", true, false);
    let using = b.add_class(using_unit, None, "U");
    let m = b.add_method(using, "limit", TypeRef::int());
    b.set_body(m, vec![]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    assert_eq!(
        resolver.resolve_name("MAX", m).unwrap(),
        NameTarget::Field(max)
    );
}

#[test]
fn test_switch_label_resolves_in_enum_scope() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("Color.java", Some("p"));
    let color = b.add_enum(unit, None, "Color");
    let red = b.add_enum_constant(color, "RED", vec![]);
    let program = b.finish();
    let resolver = Resolver::new(&program);

    // `case RED:` resolves against the selector's type, not the use site
    let selector = ResolvedType::reference(TypeKey::Source(color));
    assert_eq!(
        resolver.resolve_switch_label(&selector, &Expr::name("RED")),
        Some(NameTarget::EnumConstant(red))
    );
    assert_eq!(
        resolver.resolve_switch_label(&selector, &Expr::name("BLUE")),
        None
    );
}

#[test]
fn test_array_length_pseudo_field() {
    let mut b = ProgramBuilder::new();
    let unit = b.add_unit("A.java", Some("p"));
    let class = b.add_class(unit, None, "A");
    let program = b.finish();
    let resolver = Resolver::new(&program);

    let array = ResolvedType::array(ResolvedType::Primitive(
        javatrim::ast::PrimitiveKind::Int,
    ));
    assert_eq!(
        resolver.resolve_field_access(&array, "length", class).unwrap(),
        NameTarget::ArrayLength
    );
}
