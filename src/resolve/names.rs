// Name and field resolution fallbacks
#![allow(dead_code)]

use crate::ast::{Node, NodeId, Program, Stmt, TypeKey, TypeRef};
use crate::types::ResolvedType;

use super::overloads::supertype_chain;
use super::Resolver;

/// What a bare or qualified name resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTarget {
    Param(NodeId),
    /// Local variables and try-resources are not arena nodes; only the
    /// declared type matters downstream
    Local {
        ty: TypeRef,
    },
    Field(NodeId),
    EnumConstant(NodeId),
    Type(TypeKey),
    /// The array `length` pseudo-field
    ArrayLength,
}

/// Statement nodes reachable from a body block, in no particular order
fn body_stmts(program: &Program, body: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![body];
    while let Some(id) = stack.pop() {
        out.push(id);
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
    }
    out
}

/// Find a local variable or try-resource declaration named `name` in the
/// enclosing callable. Flow-insensitive: shadowing across blocks is rare
/// enough in reduced input that the declared type is taken as-is.
fn local(program: &Program, name: &str, callable: NodeId) -> Option<NameTarget> {
    let body = program.callable(callable)?.body?;
    for id in body_stmts(program, body) {
        match program.stmt(id)? {
            Stmt::LocalVar {
                name: var_name, ty, ..
            } if var_name == name => {
                return Some(NameTarget::Local { ty: ty.clone() });
            }
            Stmt::Try { resources, .. } => {
                if let Some(r) = resources.iter().find(|r| r.name == name) {
                    return Some(NameTarget::Local { ty: r.ty.clone() });
                }
            }
            _ => {}
        }
    }
    None
}

/// Find a field or enum constant named `name` on `decl` or its supertypes
fn member_in_chain(program: &Program, decl: TypeKey, name: &str) -> Option<NameTarget> {
    for key in supertype_chain(program, decl) {
        let TypeKey::Source(id) = key else {
            continue;
        };
        let t = program.type_decl(id)?;
        for member in &t.members {
            match program.node(*member) {
                Node::Field(f) if f.name == name => {
                    return Some(NameTarget::Field(*member));
                }
                Node::EnumConstant(e) if e.name == name => {
                    return Some(NameTarget::EnumConstant(*member));
                }
                _ => {}
            }
        }
    }
    None
}

/// Member access against a resolved target type, including the array
/// `length` pseudo-field
pub fn field_access(
    program: &Program,
    target: &ResolvedType,
    name: &str,
) -> Option<NameTarget> {
    match target {
        ResolvedType::Array(_) if name == "length" => Some(NameTarget::ArrayLength),
        ResolvedType::Reference { decl, .. } => member_in_chain(program, *decl, name),
        ResolvedType::Variable(v) => field_access(program, &v.bound, name),
        ResolvedType::Wildcard { bound, .. } => field_access(program, bound, name),
        _ => None,
    }
}

/// Resolve a bare name at a use site. Order: parameters, locals, fields of
/// enclosing types (own then inherited, walking outward through nesting,
/// which also covers enum-constant bodies), static imports, type names.
pub fn name(resolver: &Resolver<'_>, name: &str, context: NodeId) -> Option<NameTarget> {
    let program = resolver.program();

    if let Some(callable) = resolver.enclosing_callable(context) {
        if let Some(decl) = program.callable(callable) {
            for param in &decl.params {
                if program.param(*param).map(|p| p.name.as_str()) == Some(name) {
                    return Some(NameTarget::Param(*param));
                }
            }
        }
        if let Some(found) = local(program, name, callable) {
            return Some(found);
        }
    }

    let mut enclosing = program
        .declaring_type(context)
        .or_else(|| program.type_decl(context).map(|_| context));
    while let Some(type_id) = enclosing {
        if let Some(found) = member_in_chain(program, TypeKey::Source(type_id), name) {
            return Some(found);
        }
        enclosing = program
            .type_decl(type_id)
            .and_then(|t| t.parent)
            .and_then(|p| {
                if program.type_decl(p).is_some() {
                    Some(p)
                } else {
                    program.declaring_type(p)
                }
            });
    }

    if let Some(found) = static_import(program, name, context) {
        return Some(found);
    }

    type_name(program, name, context).map(NameTarget::Type)
}

/// Search static single and on-demand imports for a field or enum constant
fn static_import(program: &Program, name: &str, context: NodeId) -> Option<NameTarget> {
    let unit_id = program.unit_of(context)?;
    let unit = program.unit(unit_id)?;
    for import_id in &unit.imports {
        let import = program.import(*import_id)?;
        if !import.is_static {
            continue;
        }
        if import.on_demand {
            // import static a.b.C.*;
            if let Some(decl) = program.lookup_type(&import.path) {
                if let Some(found) = member_in_chain(program, decl, name) {
                    return Some(found);
                }
            }
        } else if import.imported_name() == Some(name) {
            // import static a.b.C.name;
            let (type_path, _) = import.path.rsplit_once('.')?;
            if let Some(decl) = program.lookup_type(type_path) {
                if let Some(found) = member_in_chain(program, decl, name) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Nested source types declared directly on a type
fn nested_types(program: &Program, type_id: NodeId) -> Vec<NodeId> {
    program
        .type_decl(type_id)
        .map(|t| {
            t.members
                .iter()
                .copied()
                .filter(|m| program.type_decl(*m).is_some())
                .collect()
        })
        .unwrap_or_default()
}

/// Resolve a type name visible from `context`. Order: enclosing types and
/// their nested members (own, then inherited through supertypes), single
/// imports, same-package types, the global index, on-demand imports, then
/// unambiguous library simple names.
pub fn type_name(program: &Program, name: &str, context: NodeId) -> Option<TypeKey> {
    // enclosing scopes, innermost first
    let mut enclosing = program
        .declaring_type(context)
        .or_else(|| program.type_decl(context).map(|_| context));
    while let Some(type_id) = enclosing {
        let t = program.type_decl(type_id)?;
        if t.name == name {
            return Some(TypeKey::Source(type_id));
        }
        // nested types of this scope and of everything it inherits
        for chain_key in supertype_chain(program, TypeKey::Source(type_id)) {
            let TypeKey::Source(chain_id) = chain_key else {
                continue;
            };
            for nested in nested_types(program, chain_id) {
                if program.type_decl(nested).map(|n| n.name.as_str()) == Some(name) {
                    return Some(TypeKey::Source(nested));
                }
            }
        }
        enclosing = t.parent;
    }

    let unit = program.unit_of(context).and_then(|u| program.unit(u));

    if let Some(unit) = unit {
        for import_id in &unit.imports {
            let Some(import) = program.import(*import_id) else {
                continue;
            };
            if !import.is_static && import.imported_name() == Some(name) {
                if let Some(key) = program.lookup_type(&import.path) {
                    return Some(key);
                }
            }
        }

        if let Some(package) = &unit.package {
            if let Some(key) = program.lookup_type(&format!("{package}.{name}")) {
                return Some(key);
            }
        }
    }

    if let Some(key) = program.lookup_type(name) {
        return Some(key);
    }

    if let Some(unit) = unit {
        for import_id in &unit.imports {
            let Some(import) = program.import(*import_id) else {
                continue;
            };
            if !import.is_static && import.on_demand {
                if let Some(key) = program.lookup_type(&format!("{}.{}", import.path, name)) {
                    return Some(key);
                }
            }
        }
    }

    program
        .library()
        .find_simple(name)
        .map(TypeKey::Library)
}
