// Specificity ordering and least-upper-bound fallback
#![allow(dead_code)]

use crate::ast::Program;

use super::{assignable, instantiate_as, object, ResolvedType};

/// Partial order over resolved types: is `a` strictly more specific than
/// `b`? Two references to the same declaration compare pointwise on type
/// arguments (non-raw beats raw); otherwise a type is more specific than
/// any of its supertypes.
pub fn more_specific(program: &Program, a: &ResolvedType, b: &ResolvedType) -> bool {
    if a == b {
        return false;
    }

    if let (
        ResolvedType::Reference {
            decl: a_decl,
            args: a_args,
        },
        ResolvedType::Reference {
            decl: b_decl,
            args: b_args,
        },
    ) = (a, b)
    {
        if a_decl == b_decl {
            // non-raw beats raw
            if b_args.is_empty() && !a_args.is_empty() {
                return true;
            }
            if a_args.is_empty() || a_args.len() != b_args.len() {
                return false;
            }
            let pointwise_at_least = a_args
                .iter()
                .zip(b_args.iter())
                .all(|(x, y)| x == y || more_specific(program, x, y));
            let strictly_somewhere = a_args
                .iter()
                .zip(b_args.iter())
                .any(|(x, y)| more_specific(program, x, y));
            return pointwise_at_least && strictly_somewhere;
        }
    }

    // subtype is more specific than supertype
    assignable(program, b, a) && !assignable(program, a, b)
}

/// Combine two candidate solutions for the same site: take the more
/// specific one, falling back to the least upper bound when neither
/// dominates
pub fn prefer(program: &Program, a: ResolvedType, b: ResolvedType) -> ResolvedType {
    if a == b || more_specific(program, &a, &b) {
        return a;
    }
    if more_specific(program, &b, &a) {
        return b;
    }
    lub(program, &a, &b)
}

/// Best-effort least upper bound: one of the inputs when it already
/// contains the other, otherwise the first supertype of `a` that accepts
/// `b`, otherwise `Object`
pub fn lub(program: &Program, a: &ResolvedType, b: &ResolvedType) -> ResolvedType {
    if assignable(program, a, b) {
        return a.clone();
    }
    if assignable(program, b, a) {
        return b.clone();
    }

    if let ResolvedType::Reference { decl, args } = a {
        // walk a's supertype cone in BFS order, the first hit wins
        let mut frontier = program.declared_supers(*decl);
        let vars = super::class_var_scope(program, *decl);
        let mut visited = std::collections::HashSet::new();
        while let Some(super_ref) = frontier.pop() {
            let Some(resolved) = super::resolve_ref(program, &super_ref, &vars) else {
                continue;
            };
            let ResolvedType::Reference {
                decl: super_decl, ..
            } = resolved
            else {
                continue;
            };
            if !visited.insert(super_decl) {
                continue;
            }
            if let Some(as_super) = instantiate_as(program, *decl, args, super_decl) {
                let candidate = ResolvedType::reference_with(super_decl, as_super);
                if assignable(program, &candidate, b) {
                    return candidate;
                }
            }
            frontier.extend(program.declared_supers(super_decl));
        }
    }

    object(program)
}
