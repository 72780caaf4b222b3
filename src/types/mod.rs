// Resolved-type model - the semantic counterpart of syntactic type references
#![allow(dead_code)]

mod assignability;
mod canonical;
mod specificity;

pub use assignability::{assignable, assignable_erased, instantiate_as};
pub use canonical::canonicalize;
pub use specificity::{lub, more_specific, prefer};

use std::collections::HashMap;

use crate::ast::{BoundKind, PrimitiveKind, Program, TypeKey, TypeRef};

/// A type variable with its declaring scope and declared upper bound.
/// `scope` is the qualified name of the declaring type or the signature of
/// the declaring callable; it anchors the in-scope check when solved types
/// escape their declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    pub scope: String,
    pub bound: Box<ResolvedType>,
}

/// Semantic types. Invariant: type arguments are always `ResolvedType`
/// themselves; raw types are represented as a `Reference` with no arguments
/// on a declaration that has type parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Primitive(PrimitiveKind),
    Array(Box<ResolvedType>),
    Reference {
        decl: TypeKey,
        args: Vec<ResolvedType>,
    },
    Variable(TypeVariable),
    /// `? extends bound` / `? super bound`; the unbounded wildcard is
    /// `? extends java.lang.Object`
    Wildcard {
        kind: BoundKind,
        bound: Box<ResolvedType>,
    },
    Intersection(Vec<ResolvedType>),
    Union(Vec<ResolvedType>),
    Void,
    Null,
}

impl ResolvedType {
    pub fn reference(decl: TypeKey) -> Self {
        ResolvedType::Reference {
            decl,
            args: Vec::new(),
        }
    }

    pub fn reference_with(decl: TypeKey, args: Vec<ResolvedType>) -> Self {
        ResolvedType::Reference { decl, args }
    }

    pub fn array(elem: ResolvedType) -> Self {
        ResolvedType::Array(Box::new(elem))
    }

    pub fn wildcard_extends(bound: ResolvedType) -> Self {
        ResolvedType::Wildcard {
            kind: BoundKind::Extends,
            bound: Box::new(bound),
        }
    }

    pub fn wildcard_super(bound: ResolvedType) -> Self {
        ResolvedType::Wildcard {
            kind: BoundKind::Super,
            bound: Box::new(bound),
        }
    }

    pub fn is_reference_like(&self) -> bool {
        matches!(
            self,
            ResolvedType::Array(_)
                | ResolvedType::Reference { .. }
                | ResolvedType::Variable(_)
                | ResolvedType::Wildcard { .. }
                | ResolvedType::Intersection(_)
                | ResolvedType::Union(_)
                | ResolvedType::Null
        )
    }

    /// Whether this is a raw use of a generic declaration
    pub fn is_raw(&self, program: &Program) -> bool {
        match self {
            ResolvedType::Reference { decl, args } => {
                args.is_empty() && !program.type_param_names(*decl).is_empty()
            }
            _ => false,
        }
    }

    pub fn display(&self, program: &Program) -> String {
        match self {
            ResolvedType::Primitive(p) => p.name().to_string(),
            ResolvedType::Array(elem) => format!("{}[]", elem.display(program)),
            ResolvedType::Reference { decl, args } => {
                let name = program.type_name(*decl);
                if args.is_empty() {
                    name.to_string()
                } else {
                    let rendered: Vec<String> =
                        args.iter().map(|a| a.display(program)).collect();
                    format!("{}<{}>", name, rendered.join(", "))
                }
            }
            ResolvedType::Variable(v) => v.name.clone(),
            ResolvedType::Wildcard {
                kind: BoundKind::Extends,
                bound,
            } => {
                if **bound == object(program) {
                    "?".to_string()
                } else {
                    format!("? extends {}", bound.display(program))
                }
            }
            ResolvedType::Wildcard {
                kind: BoundKind::Super,
                bound,
            } => format!("? super {}", bound.display(program)),
            ResolvedType::Intersection(parts) => parts
                .iter()
                .map(|p| p.display(program))
                .collect::<Vec<_>>()
                .join(" & "),
            ResolvedType::Union(parts) => parts
                .iter()
                .map(|p| p.display(program))
                .collect::<Vec<_>>()
                .join(" | "),
            ResolvedType::Void => "void".to_string(),
            ResolvedType::Null => "null".to_string(),
        }
    }
}

/// `java.lang.Object` as a resolved type. The JDK core seed guarantees the
/// lookup succeeds.
pub fn object(program: &Program) -> ResolvedType {
    let key = program
        .lookup_type("java.lang.Object")
        .expect("java.lang.Object is seeded in every library");
    ResolvedType::reference(key)
}

/// Map from type-variable name to binding, scoped to one resolution query
pub type Substitution = HashMap<String, ResolvedType>;

/// Apply a substitution, leaving unbound variables in place
pub fn substitute(ty: &ResolvedType, subst: &Substitution) -> ResolvedType {
    match ty {
        ResolvedType::Variable(v) => subst
            .get(&v.name)
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        ResolvedType::Array(elem) => ResolvedType::array(substitute(elem, subst)),
        ResolvedType::Reference { decl, args } => ResolvedType::Reference {
            decl: *decl,
            args: args.iter().map(|a| substitute(a, subst)).collect(),
        },
        ResolvedType::Wildcard { kind, bound } => ResolvedType::Wildcard {
            kind: *kind,
            bound: Box::new(substitute(bound, subst)),
        },
        ResolvedType::Intersection(parts) => {
            ResolvedType::Intersection(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        ResolvedType::Union(parts) => {
            ResolvedType::Union(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        other => other.clone(),
    }
}

/// Erase to the raw form (JLS 4.6), used by overload applicability filtering
pub fn erasure(program: &Program, ty: &ResolvedType) -> ResolvedType {
    match ty {
        ResolvedType::Array(elem) => ResolvedType::array(erasure(program, elem)),
        ResolvedType::Reference { decl, .. } => ResolvedType::reference(*decl),
        ResolvedType::Variable(v) => erasure(program, &v.bound),
        ResolvedType::Wildcard {
            kind: BoundKind::Extends,
            bound,
        } => erasure(program, bound),
        ResolvedType::Wildcard {
            kind: BoundKind::Super,
            ..
        } => object(program),
        ResolvedType::Intersection(parts) => parts
            .first()
            .map(|p| erasure(program, p))
            .unwrap_or_else(|| object(program)),
        ResolvedType::Union(parts) => parts
            .first()
            .map(|p| erasure(program, p))
            .unwrap_or_else(|| object(program)),
        other => other.clone(),
    }
}

/// Known type variables at a resolution site, outermost scope first
#[derive(Debug, Clone, Default)]
pub struct VarScope {
    vars: HashMap<String, TypeVariable>,
}

impl VarScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, var: TypeVariable) {
        self.vars.insert(var.name.clone(), var);
    }

    pub fn get(&self, name: &str) -> Option<&TypeVariable> {
        self.vars.get(name)
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.vars.values().map(|v| v.scope.as_str())
    }
}

/// Resolve a syntactic reference into the semantic model. Names resolve
/// first against in-scope type variables, then through the program's type
/// index. Returns `None` when a named type cannot be found; callers in the
/// resolution layer surface that as an unsolved-symbol error.
pub fn resolve_ref(program: &Program, ty: &TypeRef, vars: &VarScope) -> Option<ResolvedType> {
    match ty {
        TypeRef::Primitive(p) => Some(ResolvedType::Primitive(*p)),
        TypeRef::Void => Some(ResolvedType::Void),
        TypeRef::Array(elem) => Some(ResolvedType::array(resolve_ref(program, elem, vars)?)),
        TypeRef::Wildcard { bound } => match bound {
            None => Some(ResolvedType::wildcard_extends(object(program))),
            Some((kind, inner)) => Some(ResolvedType::Wildcard {
                kind: *kind,
                bound: Box::new(resolve_ref(program, inner, vars)?),
            }),
        },
        TypeRef::Named { name, args } => {
            if args.is_empty() {
                if let Some(var) = vars.get(name) {
                    return Some(ResolvedType::Variable(var.clone()));
                }
            }
            let decl = program.lookup_type(name)?;
            let resolved_args: Option<Vec<ResolvedType>> = args
                .iter()
                .map(|a| resolve_ref(program, a, vars))
                .collect();
            Some(ResolvedType::Reference {
                decl,
                args: resolved_args?,
            })
        }
    }
}

/// Declared type variables of a class-like declaration, as a `VarScope`
pub fn class_var_scope(program: &Program, key: TypeKey) -> VarScope {
    let scope_name = program.type_name(key).to_string();
    let mut vars = VarScope::new();
    match key {
        TypeKey::Source(id) => {
            if let Some(decl) = program.type_decl(id) {
                for tp in &decl.type_params {
                    // Bounds may reference sibling variables; resolve them
                    // against the empty scope first, which is precise enough
                    // for bound expansion.
                    let bound = tp
                        .bounds
                        .first()
                        .and_then(|b| resolve_ref(program, b, &VarScope::new()))
                        .unwrap_or_else(|| object(program));
                    vars.declare(TypeVariable {
                        name: tp.name.clone(),
                        scope: scope_name.clone(),
                        bound: Box::new(bound),
                    });
                }
            }
        }
        TypeKey::Library(id) => {
            for name in &program.library().class(id).type_params {
                vars.declare(TypeVariable {
                    name: name.clone(),
                    scope: scope_name.clone(),
                    bound: Box::new(object(program)),
                });
            }
        }
    }
    vars
}
