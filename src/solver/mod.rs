// Type/generics solver - binds type variables from context and arguments
#![allow(dead_code)]

use std::collections::HashSet;

use crate::ast::{CallableKey, NodeId, Program, TypeKey};
use crate::types::{
    canonicalize, class_var_scope, instantiate_as, object, prefer, resolve_ref, substitute,
    ResolvedType, Substitution, TypeVariable, VarScope,
};

/// The lexical container a solved type must be valid in: type variables
/// declared outside these scopes may not leak out of a resolution query
#[derive(Debug, Clone, Default)]
pub struct Container {
    scopes: HashSet<String>,
}

impl Container {
    /// Container around a node: every enclosing type plus the enclosing
    /// callable
    pub fn around(program: &Program, node: NodeId) -> Self {
        let mut scopes = HashSet::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(t) = program.type_decl(id) {
                scopes.insert(t.qualified_name.clone());
            }
            if program.callable(id).is_some() {
                if let Some(sig) = program.callable_signature(id) {
                    scopes.insert(sig);
                }
            }
            current = program.owner_of(id);
        }
        Self { scopes }
    }

    pub fn in_scope(&self, var: &TypeVariable) -> bool {
        self.scopes.contains(&var.scope)
    }
}

/// Declared parameter types, return type, and the variable scope of a
/// callable, with class- and callable-level type parameters as `Variable`s
pub fn callable_types(
    program: &Program,
    key: CallableKey,
) -> Option<(Vec<ResolvedType>, ResolvedType, VarScope)> {
    match key {
        CallableKey::Source(id) => {
            let c = program.callable(id)?;
            // enum-constant-body members hang off the constant node, their
            // class scope is the enum itself
            let owner_key = TypeKey::Source(program.declaring_type(id).unwrap_or(c.owner));
            let mut vars = class_var_scope(program, owner_key);
            let own_scope = program.callable_signature(id)?;
            for tp in &c.type_params {
                let bound = tp
                    .bounds
                    .first()
                    .and_then(|b| resolve_ref(program, b, &vars))
                    .unwrap_or_else(|| object(program));
                vars.declare(TypeVariable {
                    name: tp.name.clone(),
                    scope: own_scope.clone(),
                    bound: Box::new(bound),
                });
            }
            let params: Option<Vec<ResolvedType>> = c
                .params
                .iter()
                .filter_map(|p| program.param(*p))
                .map(|p| resolve_ref(program, &p.ty, &vars))
                .collect();
            let ret = resolve_ref(program, &c.return_type, &vars)?;
            Some((params?, ret, vars))
        }
        CallableKey::Library(id) => {
            let class = program.library().class(id.class);
            let member = program.library().member(id);
            let owner_key = TypeKey::Library(id.class);
            let mut vars = class_var_scope(program, owner_key);
            let own_scope = format!("{}#{}", class.qualified_name, member.name);
            for name in &member.type_params {
                vars.declare(TypeVariable {
                    name: name.clone(),
                    scope: own_scope.clone(),
                    bound: Box::new(object(program)),
                });
            }
            let params: Option<Vec<ResolvedType>> = member
                .params
                .iter()
                .map(|p| resolve_ref(program, p, &vars))
                .collect();
            let ret = resolve_ref(program, &member.return_type, &vars)?;
            Some((params?, ret, vars))
        }
    }
}

/// Declaring type of a callable
pub fn declaring_type_of(program: &Program, key: CallableKey) -> Option<TypeKey> {
    match key {
        CallableKey::Source(id) => program
            .declaring_type(id)
            .or_else(|| program.callable(id).map(|c| c.owner))
            .map(TypeKey::Source),
        CallableKey::Library(id) => Some(TypeKey::Library(id.class)),
    }
}

/// Bindings contributed by the receiver: its own type arguments propagated
/// down the inheritance chain to the member's declaring type
pub fn receiver_bindings(
    program: &Program,
    receiver: &ResolvedType,
    declaring: TypeKey,
) -> Substitution {
    let mut out = Substitution::new();
    let (decl, args) = match receiver {
        ResolvedType::Reference { decl, args } => (*decl, args.clone()),
        ResolvedType::Variable(v) => return receiver_bindings(program, &v.bound, declaring),
        ResolvedType::Wildcard { bound, .. } => {
            return receiver_bindings(program, bound, declaring)
        }
        _ => return out,
    };
    let Some(as_declaring) = instantiate_as(program, decl, &args, declaring) else {
        return out;
    };
    for (name, arg) in program
        .type_param_names(declaring)
        .into_iter()
        .zip(as_declaring.into_iter())
    {
        out.insert(name, arg);
    }
    out
}

/// Merge a binding, combining conflicting candidates by specificity
fn bind(program: &Program, subst: &mut Substitution, name: String, ty: ResolvedType) {
    match subst.remove(&name) {
        Some(existing) => {
            let combined = prefer(program, existing, ty);
            subst.insert(name, combined);
        }
        None => {
            subst.insert(name, ty);
        }
    }
}

/// Structurally unify a declared parameter type against an argument type,
/// accumulating type-variable bindings. Recurses through arrays, wildcards,
/// and nested generics.
fn unify(program: &Program, param: &ResolvedType, arg: &ResolvedType, out: &mut Substitution) {
    match (param, arg) {
        (ResolvedType::Variable(v), _) => {
            if !matches!(arg, ResolvedType::Null) {
                bind(program, out, v.name.clone(), arg.clone());
            }
        }
        (ResolvedType::Array(pe), ResolvedType::Array(ae)) => unify(program, pe, ae, out),
        (ResolvedType::Wildcard { bound, .. }, _) => unify(program, bound, arg, out),
        (_, ResolvedType::Wildcard { bound, .. }) => unify(program, param, bound, out),
        (
            ResolvedType::Reference {
                decl: p_decl,
                args: p_args,
            },
            ResolvedType::Reference {
                decl: a_decl,
                args: a_args,
            },
        ) => {
            let viewed = if p_decl == a_decl {
                Some(a_args.clone())
            } else {
                instantiate_as(program, *a_decl, a_args, *p_decl)
            };
            if let Some(viewed_args) = viewed {
                for (p, a) in p_args.iter().zip(viewed_args.iter()) {
                    unify(program, p, a, out);
                }
            }
        }
        _ => {}
    }
}

/// Resolve leftover variables after substitution: in-scope variables stay;
/// variables whose binding was never discovered expand to their declared
/// bound when they belong to the solved callable itself, and out-of-scope
/// variables become appropriately-bounded wildcards so inference variables
/// never leak past `container`
fn finish(
    program: &Program,
    ty: &ResolvedType,
    container: &Container,
    expand_scopes: &HashSet<String>,
) -> ResolvedType {
    let resolved = match ty {
        ResolvedType::Variable(v) => {
            if expand_scopes.contains(&v.scope) {
                (*v.bound).clone()
            } else if container.in_scope(v) {
                ty.clone()
            } else if *v.bound == object(program) {
                ResolvedType::wildcard_extends(object(program))
            } else {
                ResolvedType::wildcard_extends((*v.bound).clone())
            }
        }
        ResolvedType::Array(elem) => {
            ResolvedType::array(finish(program, elem, container, expand_scopes))
        }
        ResolvedType::Reference { decl, args } => ResolvedType::Reference {
            decl: *decl,
            args: args
                .iter()
                .map(|a| finish(program, a, container, expand_scopes))
                .collect(),
        },
        ResolvedType::Wildcard { kind, bound } => ResolvedType::Wildcard {
            kind: *kind,
            bound: Box::new(finish(program, bound, container, expand_scopes)),
        },
        ResolvedType::Intersection(parts) => ResolvedType::Intersection(
            parts
                .iter()
                .map(|p| finish(program, p, container, expand_scopes))
                .collect(),
        ),
        ResolvedType::Union(parts) => ResolvedType::Union(
            parts
                .iter()
                .map(|p| finish(program, p, container, expand_scopes))
                .collect(),
        ),
        other => other.clone(),
    };
    canonicalize(program, &resolved)
}

/// Solve a declared type in the context of a member access: substitute the
/// receiver's type-argument bindings for the member's declaring type, then
/// close over the container
pub fn solve_in_class_context(
    program: &Program,
    ty: &ResolvedType,
    receiver: &ResolvedType,
    declaring: TypeKey,
    container: &Container,
) -> ResolvedType {
    let bindings = receiver_bindings(program, receiver, declaring);
    let substituted = substitute(ty, &bindings);
    finish(program, &substituted, container, &HashSet::new())
}

/// Solve a callable's return type at a call site. Applies, in order:
/// explicit type arguments, receiver bindings, argument-based inference,
/// bound expansion, and out-of-scope wildcard replacement.
pub fn solve_in_method_context(
    program: &Program,
    method: CallableKey,
    receiver: Option<&ResolvedType>,
    arg_types: &[Option<ResolvedType>],
    explicit_type_args: &[ResolvedType],
    container: &Container,
) -> Option<ResolvedType> {
    let (params, ret, vars) = callable_types(program, method)?;
    let declaring = declaring_type_of(program, method)?;

    let mut subst = Substitution::new();

    // (a) explicit type arguments
    let method_var_names = method_type_param_names(program, method);
    for (name, arg) in method_var_names.iter().zip(explicit_type_args.iter()) {
        subst.insert(name.clone(), arg.clone());
    }

    // (b) receiver bindings propagated down the inheritance chain
    if let Some(recv) = receiver {
        for (name, ty) in receiver_bindings(program, recv, declaring) {
            bind(program, &mut subst, name, ty);
        }
    }

    // (c) inference from argument types
    for (param, arg) in params.iter().zip(arg_types.iter()) {
        if let Some(arg_ty) = arg {
            let mut inferred = Substitution::new();
            unify(program, param, arg_ty, &mut inferred);
            for (name, ty) in inferred {
                if !subst.contains_key(&name) || method_var_names.contains(&name) {
                    bind(program, &mut subst, name, ty);
                }
            }
        }
    }

    let substituted = substitute(&ret, &subst);

    // (d)/(e): leftover variables of the callable expand to their bound;
    // out-of-scope variables become wildcards
    let expand: HashSet<String> = vars
        .scope_names()
        .filter(|s| s.contains('#'))
        .map(str::to_string)
        .collect();
    Some(finish(program, &substituted, container, &expand))
}

fn method_type_param_names(program: &Program, key: CallableKey) -> Vec<String> {
    match key {
        CallableKey::Source(id) => program
            .callable(id)
            .map(|c| c.type_params.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default(),
        CallableKey::Library(id) => program.library().member(id).type_params.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ProgramBuilder, TypeParam, TypeRef};

    /// class Box<T> { T get(); void put(T t); static <E> E pick(E a, E b); }
    fn boxed_program() -> (Program, NodeId, NodeId, NodeId) {
        let mut b = ProgramBuilder::new();
        let unit = b.add_unit("Box.java", Some("p"));
        let class = b.add_class(unit, None, "Box");
        b.type_mut(class).type_params.push(TypeParam::new("T"));

        let get = b.add_method(class, "get", TypeRef::named("T"));
        let pick = b.add_method(class, "pick", TypeRef::named("E"));
        b.callable_mut(pick).type_params.push(TypeParam::new("E"));
        b.add_param(pick, "a", TypeRef::named("E"));
        b.add_param(pick, "b", TypeRef::named("E"));

        (b.finish(), class, get, pick)
    }

    #[test]
    fn test_receiver_binding_solves_return() {
        let (program, class, get, _) = boxed_program();
        let string =
            ResolvedType::reference(program.lookup_type("java.lang.String").unwrap());
        let receiver = ResolvedType::reference_with(TypeKey::Source(class), vec![string.clone()]);

        let solved = solve_in_method_context(
            &program,
            CallableKey::Source(get),
            Some(&receiver),
            &[],
            &[],
            &Container::default(),
        )
        .unwrap();
        assert_eq!(solved, string);
    }

    #[test]
    fn test_argument_inference_picks_lub() {
        let (program, _, _, pick) = boxed_program();
        let string =
            ResolvedType::reference(program.lookup_type("java.lang.String").unwrap());

        let solved = solve_in_method_context(
            &program,
            CallableKey::Source(pick),
            None,
            &[Some(string.clone()), Some(string.clone())],
            &[],
            &Container::default(),
        )
        .unwrap();
        assert_eq!(solved, string);
    }

    #[test]
    fn test_explicit_type_args_win() {
        let (program, _, _, pick) = boxed_program();
        let string =
            ResolvedType::reference(program.lookup_type("java.lang.String").unwrap());

        let solved = solve_in_method_context(
            &program,
            CallableKey::Source(pick),
            None,
            &[None, None],
            &[object(&program)],
            &Container::default(),
        )
        .unwrap();
        assert_eq!(solved, object(&program));
    }

    #[test]
    fn test_unbound_out_of_scope_variable_becomes_wildcard() {
        let (program, class, get, _) = boxed_program();
        // raw receiver: no bindings for T, and the call site is outside Box
        let receiver = ResolvedType::reference(TypeKey::Source(class));
        let solved = solve_in_method_context(
            &program,
            CallableKey::Source(get),
            Some(&receiver),
            &[],
            &[],
            &Container::default(),
        )
        .unwrap();
        assert_eq!(solved, ResolvedType::wildcard_extends(object(&program)));
    }
}
