// Assignability and the substituted supertype walk
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};

use crate::ast::{BoundKind, Program, TypeKey};

use super::{
    class_var_scope, erasure, object, resolve_ref, substitute, ResolvedType, Substitution,
};

/// View `(decl, args)` as an instantiation of `target` by walking the
/// supertype graph and applying type-argument substitution along the way.
/// `ArrayList<String>` viewed as `List` yields `Some([String])`; raw uses
/// stay raw (`Some([])`). Best-effort: missing class metadata yields `None`.
pub fn instantiate_as(
    program: &Program,
    decl: TypeKey,
    args: &[ResolvedType],
    target: TypeKey,
) -> Option<Vec<ResolvedType>> {
    let mut queue: VecDeque<(TypeKey, Vec<ResolvedType>)> = VecDeque::new();
    let mut seen: HashSet<(TypeKey, Vec<ResolvedType>)> = HashSet::new();
    queue.push_back((decl, args.to_vec()));

    while let Some((current, current_args)) = queue.pop_front() {
        if !seen.insert((current, current_args.clone())) {
            continue;
        }
        if current == target {
            return Some(current_args);
        }

        let param_names = program.type_param_names(current);
        let raw = current_args.is_empty() && !param_names.is_empty();

        let mut subst = Substitution::new();
        if !raw {
            for (idx, name) in param_names.iter().enumerate() {
                if let Some(arg) = current_args.get(idx) {
                    subst.insert(name.clone(), arg.clone());
                }
            }
        }

        let vars = class_var_scope(program, current);
        for super_ref in program.declared_supers(current) {
            let Some(resolved) = resolve_ref(program, &super_ref, &vars) else {
                continue;
            };
            if let ResolvedType::Reference {
                decl: super_decl,
                args: super_args,
            } = resolved
            {
                let next_args = if raw {
                    Vec::new()
                } else {
                    super_args.iter().map(|a| substitute(a, &subst)).collect()
                };
                queue.push_back((super_decl, next_args));
            }
        }
    }

    None
}

/// Whether `target` is a (possibly transitive) supertype declaration of
/// `decl`
pub fn is_supertype_decl(program: &Program, decl: TypeKey, target: TypeKey) -> bool {
    instantiate_as(program, decl, &[], target).is_some()
}

/// Whether a type argument `source` is contained by `target` (JLS 4.5.1);
/// used pointwise when comparing two instantiations of the same declaration
fn contains(program: &Program, target: &ResolvedType, source: &ResolvedType) -> bool {
    if target == source {
        return true;
    }
    match target {
        ResolvedType::Wildcard {
            kind: BoundKind::Extends,
            bound,
        } => match source {
            ResolvedType::Wildcard {
                kind: BoundKind::Extends,
                bound: source_bound,
            } => assignable(program, bound, source_bound),
            ResolvedType::Wildcard { .. } => **bound == object(program),
            other => assignable(program, bound, other),
        },
        ResolvedType::Wildcard {
            kind: BoundKind::Super,
            bound,
        } => match source {
            ResolvedType::Wildcard {
                kind: BoundKind::Super,
                bound: source_bound,
            } => assignable(program, source_bound, bound),
            ResolvedType::Wildcard { .. } => false,
            other => assignable(program, other, bound),
        },
        _ => false,
    }
}

/// Reference-widening / primitive-widening assignability: can a value of
/// type `source` be used where `target` is expected?
pub fn assignable(program: &Program, target: &ResolvedType, source: &ResolvedType) -> bool {
    if target == source {
        return true;
    }

    match (target, source) {
        (ResolvedType::Primitive(t), ResolvedType::Primitive(s)) => s.widens_to(*t),

        // null converts to any reference-like type
        (t, ResolvedType::Null) if t.is_reference_like() => true,

        // a union (multi-catch) source must convert through every alternative
        (_, ResolvedType::Union(parts)) => {
            !parts.is_empty() && parts.iter().all(|p| assignable(program, target, p))
        }
        (_, ResolvedType::Intersection(parts)) => {
            parts.iter().any(|p| assignable(program, target, p))
        }
        (ResolvedType::Intersection(parts), _) => {
            parts.iter().all(|p| assignable(program, p, source))
        }

        // a type variable converts out through its bound
        (_, ResolvedType::Variable(v)) => assignable(program, target, &v.bound),
        (ResolvedType::Variable(_), _) => false,

        (_, ResolvedType::Wildcard { kind, bound }) => match kind {
            BoundKind::Extends => assignable(program, target, bound),
            BoundKind::Super => assignable(program, target, &object(program)),
        },

        (ResolvedType::Array(te), ResolvedType::Array(se)) => match (&**te, &**se) {
            // primitive component types are invariant
            (ResolvedType::Primitive(a), ResolvedType::Primitive(b)) => a == b,
            (t, s) => assignable(program, t, s),
        },

        // arrays convert to Object
        (ResolvedType::Reference { decl, args }, ResolvedType::Array(_)) => {
            args.is_empty() && program.type_name(*decl) == "java.lang.Object"
        }

        // boxing at the reference boundary
        (ResolvedType::Reference { .. }, ResolvedType::Primitive(p)) => {
            match program.lookup_type(p.boxed_name()) {
                Some(boxed) => assignable(program, target, &ResolvedType::reference(boxed)),
                None => false,
            }
        }

        (
            ResolvedType::Reference {
                decl: target_decl,
                args: target_args,
            },
            ResolvedType::Reference {
                decl: source_decl,
                args: source_args,
            },
        ) => {
            let Some(as_target) = instantiate_as(program, *source_decl, source_args, *target_decl)
            else {
                return false;
            };
            // raw on either side erases the argument check
            if target_args.is_empty() || as_target.is_empty() {
                return true;
            }
            if target_args.len() != as_target.len() {
                return false;
            }
            target_args
                .iter()
                .zip(as_target.iter())
                .all(|(t, s)| contains(program, t, s))
        }

        _ => false,
    }
}

/// Raw-erased assignability, the applicability test for overload filtering
pub fn assignable_erased(program: &Program, target: &ResolvedType, source: &ResolvedType) -> bool {
    assignable(
        program,
        &erasure(program, target),
        &erasure(program, source),
    )
}
