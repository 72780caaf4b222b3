// Wildcard canonicalization and bound merging
#![allow(dead_code)]

use crate::ast::{BoundKind, Program};

use super::{more_specific, object, ResolvedType};

/// Canonicalize a resolved type: collapse nested wildcards and merge
/// intersection bounds implied by a more specific bound already present.
///
/// Nested wildcard rules:
///   `? extends ? extends T` -> `? extends T`
///   `? extends ? super T`   -> `? extends Object` (unbounded)
///   `? super ? super T`     -> `? super T`
///   `? super ? extends T`   -> `? extends Object` (unbounded)
pub fn canonicalize(program: &Program, ty: &ResolvedType) -> ResolvedType {
    match ty {
        ResolvedType::Array(elem) => ResolvedType::array(canonicalize(program, elem)),
        ResolvedType::Reference { decl, args } => ResolvedType::Reference {
            decl: *decl,
            args: args.iter().map(|a| canonicalize(program, a)).collect(),
        },
        ResolvedType::Wildcard { kind, bound } => {
            let inner = canonicalize(program, bound);
            match (*kind, inner) {
                (
                    BoundKind::Extends,
                    ResolvedType::Wildcard {
                        kind: BoundKind::Extends,
                        bound: nested,
                    },
                ) => ResolvedType::Wildcard {
                    kind: BoundKind::Extends,
                    bound: nested,
                },
                (
                    BoundKind::Super,
                    ResolvedType::Wildcard {
                        kind: BoundKind::Super,
                        bound: nested,
                    },
                ) => ResolvedType::Wildcard {
                    kind: BoundKind::Super,
                    bound: nested,
                },
                (_, ResolvedType::Wildcard { .. }) => {
                    ResolvedType::wildcard_extends(object(program))
                }
                (kind, inner) => ResolvedType::Wildcard {
                    kind,
                    bound: Box::new(inner),
                },
            }
        }
        ResolvedType::Intersection(parts) => {
            let canonical: Vec<ResolvedType> = parts
                .iter()
                .map(|p| canonicalize(program, p))
                .collect();
            merge_bounds(program, canonical)
        }
        ResolvedType::Union(parts) => ResolvedType::Union(
            parts.iter().map(|p| canonicalize(program, p)).collect(),
        ),
        other => other.clone(),
    }
}

/// Drop intersection members implied by a more specific member already
/// present; a single survivor unwraps the intersection
fn merge_bounds(program: &Program, parts: Vec<ResolvedType>) -> ResolvedType {
    let mut kept: Vec<ResolvedType> = Vec::new();
    for part in parts {
        if kept.contains(&part) {
            continue;
        }
        // implied by something already kept?
        if kept.iter().any(|k| more_specific(program, k, &part)) {
            continue;
        }
        // subsumes something already kept?
        kept.retain(|k| !more_specific(program, &part, k));
        kept.push(part);
    }
    match kept.len() {
        0 => object(program),
        1 => kept.into_iter().next().expect("one element"),
        _ => ResolvedType::Intersection(kept),
    }
}
