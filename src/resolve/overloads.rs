// Overload and constructor selection per JLS 15.12, raw-erased
#![allow(dead_code)]

use std::collections::HashSet;

use tracing::trace;

use crate::ast::{CallableKey, Location, NodeId, Program, TypeKey, Visibility};
use crate::solver::callable_types;
use crate::types::{assignable, assignable_erased, erasure, instantiate_as, ResolvedType};

use super::ResolveError;

/// One accessible callable under consideration at a call site
#[derive(Debug, Clone)]
pub struct Candidate {
    pub key: CallableKey,
    pub owner: TypeKey,
    pub params: Vec<ResolvedType>,
    pub varargs: bool,
    pub is_abstract: bool,
}

impl Candidate {
    fn describe(&self, program: &Program) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.display(program)).collect();
        format!("{}({})", program.type_name(self.owner), params.join(", "))
    }

    /// Erased parameter fingerprint, for override matching
    fn erased_sig(&self, program: &Program) -> String {
        self.params
            .iter()
            .map(|p| erasure(program, p).display(program))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Declared parameter type at `index`, expanding a vararg tail
    fn param_at(&self, index: usize) -> Option<&ResolvedType> {
        if self.varargs && index + 1 >= self.params.len() {
            match self.params.last()? {
                ResolvedType::Array(elem) => Some(elem),
                other => Some(other),
            }
        } else {
            self.params.get(index)
        }
    }
}

/// Supertype declarations of `start` in BFS order, `start` first
pub fn supertype_chain(program: &Program, start: TypeKey) -> Vec<TypeKey> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut frontier = vec![start];
    while let Some(key) = frontier.pop() {
        if !seen.insert(key) {
            continue;
        }
        chain.push(key);
        for super_ref in program.declared_supers(key) {
            if let crate::ast::TypeRef::Named { name, .. } = &super_ref {
                if let Some(super_key) = program.lookup_type(name) {
                    frontier.push(super_key);
                }
            }
        }
    }
    chain
}

fn package_of(program: &Program, key: TypeKey) -> Option<String> {
    match key {
        TypeKey::Source(id) => {
            let t = program.type_decl(id)?;
            program.unit(t.unit)?.package.clone()
        }
        TypeKey::Library(id) => {
            let name = &program.library().class(id).qualified_name;
            name.rsplit_once('.').map(|(pkg, _)| pkg.to_string())
        }
    }
}

fn context_package(program: &Program, context: NodeId) -> Option<String> {
    let unit = program.unit_of(context)?;
    program.unit(unit)?.package.clone()
}

fn top_level_type(program: &Program, mut id: NodeId) -> Option<NodeId> {
    if program.type_decl(id).is_none() {
        id = program.declaring_type(id)?;
    }
    while let Some(t) = program.type_decl(id) {
        match t.parent {
            Some(parent) => id = parent,
            None => return Some(id),
        }
    }
    None
}

/// JLS 6.6 member access check, relative to the use site
fn accessible(
    program: &Program,
    owner: TypeKey,
    visibility: Visibility,
    context: NodeId,
) -> bool {
    match visibility {
        Visibility::Public => true,
        Visibility::Private => match owner {
            TypeKey::Source(owner_id) => {
                top_level_type(program, owner_id) == top_level_type(program, context)
            }
            TypeKey::Library(_) => false,
        },
        Visibility::PackagePrivate => {
            package_of(program, owner) == context_package(program, context)
        }
        Visibility::Protected => {
            if package_of(program, owner) == context_package(program, context) {
                return true;
            }
            let Some(context_type) = program.declaring_type(context).or_else(|| {
                program.type_decl(context).map(|_| context)
            }) else {
                return false;
            };
            instantiate_as(program, TypeKey::Source(context_type), &[], owner).is_some()
        }
    }
}

fn candidate_for(program: &Program, key: CallableKey, owner: TypeKey) -> Option<Candidate> {
    let (params, _, _) = callable_types(program, key)?;
    let (varargs, is_abstract) = match key {
        CallableKey::Source(id) => {
            let c = program.callable(id)?;
            let varargs = c
                .params
                .last()
                .and_then(|p| program.param(*p))
                .map(|p| p.varargs)
                .unwrap_or(false);
            (varargs, c.modifiers.is_abstract)
        }
        CallableKey::Library(id) => {
            let m = program.library().member(id);
            (m.varargs, m.is_abstract)
        }
    };
    Some(Candidate {
        key,
        owner,
        params,
        varargs,
        is_abstract,
    })
}

fn visibility_of(program: &Program, key: CallableKey) -> Visibility {
    match key {
        CallableKey::Source(id) => program
            .callable(id)
            .map(|c| c.modifiers.visibility)
            .unwrap_or_default(),
        CallableKey::Library(id) => program.library().member(id).visibility,
    }
}

/// Collect accessible methods named `name` on `decl` and its supertypes.
/// A subtype declaration shadows supertype declarations with the same
/// erased signature.
pub fn gather_methods(
    program: &Program,
    decl: TypeKey,
    name: &str,
    context: NodeId,
) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    let mut shadowed: HashSet<String> = HashSet::new();
    for owner in supertype_chain(program, decl) {
        for key in program.callables_of(owner) {
            let is_match = match key {
                CallableKey::Source(id) => program
                    .callable(id)
                    .map(|c| !c.is_constructor && c.name == name)
                    .unwrap_or(false),
                CallableKey::Library(id) => {
                    let m = program.library().member(id);
                    !m.is_constructor() && m.name == name
                }
            };
            if !is_match || !accessible(program, owner, visibility_of(program, key), context) {
                continue;
            }
            let Some(candidate) = candidate_for(program, key, owner) else {
                continue;
            };
            let sig = candidate.erased_sig(program);
            if shadowed.insert(sig) {
                out.push(candidate);
            }
        }
    }
    out
}

fn applicable_fixed(
    program: &Program,
    candidate: &Candidate,
    args: &[Option<ResolvedType>],
) -> bool {
    candidate.params.len() == args.len()
        && candidate.params.iter().zip(args.iter()).all(|(p, a)| {
            a.as_ref()
                .map(|arg| assignable_erased(program, p, arg))
                .unwrap_or(true)
        })
}

fn applicable_varargs(
    program: &Program,
    candidate: &Candidate,
    args: &[Option<ResolvedType>],
) -> bool {
    if !candidate.varargs || candidate.params.is_empty() {
        return false;
    }
    let fixed = candidate.params.len() - 1;
    if args.len() < fixed {
        return false;
    }
    let fixed_ok = candidate.params[..fixed]
        .iter()
        .zip(args.iter())
        .all(|(p, a)| {
            a.as_ref()
                .map(|arg| assignable_erased(program, p, arg))
                .unwrap_or(true)
        });
    if !fixed_ok {
        return false;
    }
    let tail_param = &candidate.params[fixed];
    let elem = match tail_param {
        ResolvedType::Array(elem) => elem,
        other => other,
    };
    args[fixed..].iter().all(|a| {
        a.as_ref()
            .map(|arg| {
                // an array argument may also pass straight through
                assignable_erased(program, elem, arg)
                    || assignable_erased(program, tail_param, arg)
            })
            .unwrap_or(true)
    })
}

/// Pairwise specificity at a given call arity: A beats B when every
/// expanded parameter of A converts into B's, at least one strictly
fn more_specific_candidate(
    program: &Program,
    a: &Candidate,
    b: &Candidate,
    arity: usize,
) -> bool {
    let mut all_convert = true;
    let mut strict = false;
    for i in 0..arity.max(1) {
        let (Some(pa), Some(pb)) = (a.param_at(i), b.param_at(i)) else {
            return false;
        };
        if !assignable(program, pb, pa) {
            all_convert = false;
            break;
        }
        if !assignable(program, pa, pb) {
            strict = true;
        }
    }
    // a fixed-arity match beats a varargs match at the same arity
    all_convert && (strict || (!a.varargs && b.varargs))
}

/// Whether candidate `a` overrides candidate `b`: same erased signature,
/// declared in a subtype
fn overrides(program: &Program, a: &Candidate, b: &Candidate) -> bool {
    a.owner != b.owner
        && a.erased_sig(program) == b.erased_sig(program)
        && instantiate_as(program, a.owner, &[], b.owner).is_some()
}

/// Two-pass applicability then most-specific selection
pub fn select(
    program: &Program,
    name: &str,
    candidates: Vec<Candidate>,
    args: &[Option<ResolvedType>],
    location: Location,
) -> Result<CallableKey, ResolveError> {
    let fixed: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| applicable_fixed(program, c, args))
        .collect();
    let pool: Vec<&Candidate> = if !fixed.is_empty() {
        fixed
    } else {
        candidates
            .iter()
            .filter(|c| applicable_varargs(program, c, args))
            .collect()
    };

    if pool.is_empty() {
        return Err(ResolveError::UnsolvedSymbol {
            name: name.to_string(),
            location,
        });
    }
    if pool.len() == 1 {
        return Ok(pool[0].key);
    }

    // keep only maximally specific candidates
    let mut maximal: Vec<&Candidate> = pool
        .iter()
        .filter(|a| {
            !pool
                .iter()
                .any(|b| more_specific_candidate(program, b, a, args.len()))
        })
        .copied()
        .collect();

    // ties between an override pair resolve to the override
    if maximal.len() > 1 {
        let snapshot = maximal.clone();
        maximal.retain(|a| !snapshot.iter().any(|b| overrides(program, b, a)));
    }

    match maximal.len() {
        1 => {
            trace!(name, target = %maximal[0].describe(program), "selected overload");
            Ok(maximal[0].key)
        }
        0 => Err(ResolveError::UnsolvedSymbol {
            name: name.to_string(),
            location,
        }),
        _ => Err(ResolveError::Ambiguous {
            name: name.to_string(),
            location,
            candidates: maximal.iter().map(|c| c.describe(program)).collect(),
        }),
    }
}

/// Constructor selection: the method algorithm restricted to the type's own
/// constructors, with a single-candidate fallback when applicability cannot
/// be established from the argument types
pub fn select_ctor(
    program: &Program,
    decl: TypeKey,
    args: &[Option<ResolvedType>],
    context: NodeId,
    location: Location,
) -> Result<CallableKey, ResolveError> {
    let name = program.type_name(decl).to_string();
    let accessible_ctors: Vec<Candidate> = program
        .callables_of(decl)
        .into_iter()
        .filter(|key| match key {
            CallableKey::Source(id) => program
                .callable(*id)
                .map(|c| c.is_constructor)
                .unwrap_or(false),
            CallableKey::Library(id) => program.library().member(*id).is_constructor(),
        })
        .filter(|key| accessible(program, decl, visibility_of(program, *key), context))
        .filter_map(|key| candidate_for(program, key, decl))
        .collect();

    if accessible_ctors.len() == 1 {
        // sole accessible candidate wins even when argument types are
        // too incomplete for the applicability filter
        let sole = accessible_ctors[0].key;
        if applicable_fixed(program, &accessible_ctors[0], args)
            || applicable_varargs(program, &accessible_ctors[0], args)
            || args.iter().any(Option::is_none)
        {
            return Ok(sole);
        }
    }

    select(program, &name, accessible_ctors, args, location)
}

/// Supertype methods a source callable overrides: same name, same erased
/// parameter list, declared above it in the hierarchy
pub fn override_targets(program: &Program, callable: NodeId) -> Vec<CallableKey> {
    let Some(c) = program.callable(callable) else {
        return Vec::new();
    };
    if c.is_constructor {
        return Vec::new();
    }
    let Some(owner) = program.declaring_type(callable) else {
        return Vec::new();
    };
    let own_key = TypeKey::Source(owner);
    let Some(own) = candidate_for(program, CallableKey::Source(callable), own_key) else {
        return Vec::new();
    };
    let own_sig = own.erased_sig(program);

    let mut out = Vec::new();
    for super_key in supertype_chain(program, own_key).into_iter().skip(1) {
        for key in program.callables_of(super_key) {
            let name_matches = match key {
                CallableKey::Source(id) => program
                    .callable(id)
                    .map(|s| !s.is_constructor && s.name == c.name)
                    .unwrap_or(false),
                CallableKey::Library(id) => {
                    let m = program.library().member(id);
                    !m.is_constructor() && m.name == c.name
                }
            };
            if !name_matches {
                continue;
            }
            if let Some(cand) = candidate_for(program, key, super_key) {
                if cand.params.len() == own.params.len() && cand.erased_sig(program) == own_sig
                {
                    out.push(key);
                }
            }
        }
    }
    out
}

/// Constructor a regenerated default constructor should delegate to:
/// prefer the superclass no-arg constructor, else the accessible one with
/// the fewest parameters. `None` when the superclass keeps no accessible
/// constructor, which the sweep surfaces as a structural-repair failure.
pub fn most_specific_super_ctor(program: &Program, class: NodeId) -> Option<CallableKey> {
    let decl = program.type_decl(class)?;
    let super_key = match &decl.superclass {
        Some(crate::ast::TypeRef::Named { name, .. }) => program.lookup_type(name)?,
        Some(_) => return None,
        None => program.lookup_type("java.lang.Object")?,
    };

    let mut ctors: Vec<Candidate> = program
        .callables_of(super_key)
        .into_iter()
        .filter(|key| match key {
            CallableKey::Source(id) => program
                .callable(*id)
                .map(|c| c.is_constructor)
                .unwrap_or(false),
            CallableKey::Library(id) => program.library().member(*id).is_constructor(),
        })
        .filter(|key| accessible(program, super_key, visibility_of(program, *key), class))
        .filter_map(|key| candidate_for(program, key, super_key))
        .collect();

    ctors.sort_by_key(|c| c.params.len());
    ctors.into_iter().next().map(|c| c.key)
}
