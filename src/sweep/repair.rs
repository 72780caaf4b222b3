// Structural repairs: completion analysis, catch pruning, default values
#![allow(dead_code)]

use std::collections::HashSet;

use crate::ast::{
    Expr, Literal, NodeId, PrimitiveKind, Program, Stmt, TypeKey, TypeRef,
};
use crate::resolve::Resolver;

/// Whether a statement can complete normally (JLS 14.21, the cases the
/// reducer produces). Statements after one that cannot are unreachable and
/// get truncated.
pub fn can_complete_normally(program: &Program, stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) | Stmt::Throw(_) => false,
        Stmt::Block(children) => children
            .last()
            .and_then(|id| program.stmt(*id))
            .map(|last| can_complete_normally(program, last))
            .unwrap_or(true),
        Stmt::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => {
            let then_completes = program
                .stmt(*then_branch)
                .map(|s| can_complete_normally(program, s))
                .unwrap_or(true);
            let else_completes = program
                .stmt(*else_branch)
                .map(|s| can_complete_normally(program, s))
                .unwrap_or(true);
            then_completes || else_completes
        }
        s if s.is_infinite_loop() => false,
        _ => true,
    }
}

/// The zero value of a declared type: primitive zero/false, `null` for
/// references and arrays
pub fn default_value(ty: &TypeRef) -> Expr {
    match ty {
        TypeRef::Primitive(kind) => Expr::Literal(match kind {
            PrimitiveKind::Boolean => Literal::Bool(false),
            PrimitiveKind::Char => Literal::Char('\0'),
            PrimitiveKind::Long => Literal::Long(0),
            PrimitiveKind::Float => Literal::Float(0.0),
            PrimitiveKind::Double => Literal::Double(0.0),
            _ => Literal::Int(0),
        }),
        _ => Expr::null(),
    }
}

/// Checked exception types a statement tree can throw, as qualified (or
/// as-written) names. `None` means the analysis hit a call it could not
/// resolve; callers must then keep every catch clause.
pub fn thrown_types(
    resolver: &Resolver<'_>,
    program: &Program,
    root: NodeId,
    context: NodeId,
) -> Option<HashSet<String>> {
    let mut thrown = HashSet::new();
    let mut precise = true;
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(stmt) = program.stmt(id) else {
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
                // a nested try handles its own clauses; only what escapes
                // matters, which this coarse walk over-approximates
                stack.push(*body);
                stack.extend(catches.iter().map(|c| c.body));
                stack.extend(finally.iter().copied());
            }
            Stmt::Switch { cases, .. } => {
                for case in cases {
                    stack.extend(case.body.iter().copied());
                }
            }
            _ => {}
        }
        stmt.exprs(&mut |expr| {
            collect_expr_throws(resolver, program, expr, context, &mut thrown, &mut precise);
        });
        if let Stmt::Throw(e) = stmt {
            if let Expr::New(creation) = e {
                thrown.insert(creation.ty.display());
            } else {
                precise = false;
            }
        }
    }
    precise.then_some(thrown)
}

fn collect_expr_throws(
    resolver: &Resolver<'_>,
    program: &Program,
    expr: &Expr,
    context: NodeId,
    thrown: &mut HashSet<String>,
    precise: &mut bool,
) {
    let throws_of = |key| -> Vec<TypeRef> {
        match key {
            crate::ast::CallableKey::Source(id) => program
                .callable(id)
                .map(|c| c.throws.clone())
                .unwrap_or_default(),
            crate::ast::CallableKey::Library(id) => program.library().member(id).throws.clone(),
        }
    };
    match expr {
        Expr::Call(call) => match resolver.resolve_call(call, context) {
            Ok(key) => {
                for t in throws_of(key) {
                    thrown.insert(t.display());
                }
            }
            Err(_) => *precise = false,
        },
        Expr::New(creation) => match resolver.resolve_ctor(creation, context) {
            Ok(key) => {
                for t in throws_of(key) {
                    thrown.insert(t.display());
                }
            }
            Err(_) => {
                // a type with no declared ctor throws nothing; only an
                // unresolvable type poisons the analysis
                if let TypeRef::Named { name, .. } = &creation.ty {
                    if resolver.resolve_type_name(name, context).is_none() {
                        *precise = false;
                    }
                }
            }
        },
        Expr::Opaque { .. } => *precise = false,
        _ => {}
    }
}

/// Whether a catch type must be kept: unchecked exceptions, the
/// `Exception`/`Throwable` roots, and anything a retained throw site still
/// produces
pub fn catch_type_needed(
    resolver: &Resolver<'_>,
    program: &Program,
    catch_ty: &TypeRef,
    thrown: &HashSet<String>,
    context: NodeId,
) -> bool {
    let name = match catch_ty {
        TypeRef::Named { name, .. } => name.as_str(),
        _ => return true,
    };
    let simple = name.rsplit('.').next().unwrap_or(name);
    if matches!(simple, "Exception" | "Throwable" | "RuntimeException" | "Error") {
        return true;
    }

    if let Some(key) = resolver.resolve_type_name(name, context) {
        match key {
            TypeKey::Library(id) => {
                if program.library().is_unchecked_exception(id) {
                    return true;
                }
            }
            TypeKey::Source(_) => {
                // source-declared exceptions extending an unchecked root
                let chain = crate::resolve::supertype_chain(program, key);
                if chain.iter().any(|k| {
                    matches!(
                        program.type_name(*k),
                        "java.lang.RuntimeException" | "java.lang.Error"
                    )
                }) {
                    return true;
                }
            }
        }
    }

    thrown.iter().any(|t| {
        let thrown_simple = t.rsplit('.').next().unwrap_or(t);
        if thrown_simple == simple {
            return true;
        }
        // a catch of a supertype still handles subtypes thrown below it
        match (
            resolver.resolve_type_name(t, context),
            resolver.resolve_type_name(name, context),
        ) {
            (Some(thrown_key), Some(catch_key)) => {
                crate::types::instantiate_as(program, thrown_key, &[], catch_key).is_some()
            }
            _ => false,
        }
    })
}
