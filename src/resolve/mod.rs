// Symbol resolution fallback layer - re-derives targets the baseline
// resolver got wrong, missed, or conflated
#![allow(dead_code)]

mod names;
mod overloads;

pub use names::NameTarget;
pub use overloads::{supertype_chain, Candidate};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::ast::{
    CallableKey, Expr, Literal, Location, MethodCall, NodeId, ObjectCreation, PrimitiveKind,
    Program, SymbolRef, TypeKey, TypeRef,
};
use crate::solver::{self, Container};
use crate::types::{
    class_var_scope, object, resolve_ref, ResolvedType, TypeVariable, VarScope,
};

/// Resolution failures. Unsolved symbols surface to the caller; guessing
/// here would corrupt reachability results downstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unsolved symbol `{name}` at {location}")]
    UnsolvedSymbol { name: String, location: Location },
    #[error("ambiguous resolution of `{name}` at {location}: candidates {candidates:?}")]
    Ambiguous {
        name: String,
        location: Location,
        candidates: Vec<String>,
    },
}

/// Shared, read-mostly resolution layer. The cache is keyed by the querying
/// node plus a query fingerprint; resolving the same query twice always
/// produces an equal result, so racy population is harmless.
pub struct Resolver<'p> {
    program: &'p Program,
    calls: DashMap<(NodeId, String), Result<CallableKey, ResolveError>>,
    type_names: DashMap<(NodeId, String), Option<TypeKey>>,
}

impl<'p> Resolver<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            calls: DashMap::new(),
            type_names: DashMap::new(),
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Resolve a type name visible from `context`: enclosing and inherited
    /// nested types, then imports, then package and global index
    pub fn resolve_type_name(&self, name: &str, context: NodeId) -> Option<TypeKey> {
        let key = (context, name.to_string());
        if let Some(cached) = self.type_names.get(&key) {
            return *cached;
        }
        let result = names::type_name(self.program, name, context);
        self.type_names.insert(key, result);
        result
    }

    /// Resolve a method call. Trusts the baseline target unless the target
    /// type's overload set matches a known baseline defect, in which case
    /// the fallback re-derives the target from scratch.
    pub fn resolve_call(
        &self,
        call: &MethodCall,
        context: NodeId,
    ) -> Result<CallableKey, ResolveError> {
        if let Some(SymbolRef::Callable(key)) = call.baseline {
            if !baseline_suspect(self.program, key) {
                return Ok(key);
            }
            debug!(name = %call.name, "baseline target distrusted, re-deriving");
        }

        // distinct calls in one context must not collide: the receiver and
        // the argument shapes are part of the query, not just name/arity
        let fingerprint = format!(
            "call:{}@{:?}({:?})",
            call.name, call.receiver, call.args
        );
        if let Some(cached) = self.calls.get(&(context, fingerprint.clone())) {
            return cached.clone();
        }

        let result = self.resolve_call_uncached(call, context);
        self.calls.insert((context, fingerprint), result.clone());
        result
    }

    fn resolve_call_uncached(
        &self,
        call: &MethodCall,
        context: NodeId,
    ) -> Result<CallableKey, ResolveError> {
        let unsolved = || ResolveError::UnsolvedSymbol {
            name: call.name.clone(),
            location: self.program.location(context),
        };

        let receiver_type = match &call.receiver {
            Some(recv) => self.expr_type(recv, context).ok_or_else(unsolved)?,
            None => self.this_type(context).ok_or_else(unsolved)?,
        };
        let receiver_decl = match &receiver_type {
            ResolvedType::Reference { decl, .. } => *decl,
            ResolvedType::Variable(v) => match &*v.bound {
                ResolvedType::Reference { decl, .. } => *decl,
                _ => return Err(unsolved()),
            },
            ResolvedType::Array(_) => self
                .program
                .lookup_type("java.lang.Object")
                .ok_or_else(unsolved)?,
            _ => return Err(unsolved()),
        };

        let arg_types: Vec<Option<ResolvedType>> = call
            .args
            .iter()
            .map(|a| self.expr_type(a, context))
            .collect();

        let candidates =
            overloads::gather_methods(self.program, receiver_decl, &call.name, context);
        if candidates.is_empty() {
            return Err(unsolved());
        }
        overloads::select(
            self.program,
            &call.name,
            candidates,
            &arg_types,
            self.program.location(context),
        )
    }

    /// Resolve a constructor invocation
    pub fn resolve_ctor(
        &self,
        creation: &ObjectCreation,
        context: NodeId,
    ) -> Result<CallableKey, ResolveError> {
        if let Some(SymbolRef::Callable(key)) = creation.baseline {
            if !baseline_suspect(self.program, key) {
                return Ok(key);
            }
        }

        let name = creation.ty.display();
        let unsolved = || ResolveError::UnsolvedSymbol {
            name: name.clone(),
            location: self.program.location(context),
        };

        let decl = match &creation.ty {
            TypeRef::Named { name, .. } => self
                .resolve_type_name(name, context)
                .ok_or_else(unsolved)?,
            _ => return Err(unsolved()),
        };

        let arg_types: Vec<Option<ResolvedType>> = creation
            .args
            .iter()
            .map(|a| self.expr_type(a, context))
            .collect();

        overloads::select_ctor(
            self.program,
            decl,
            &arg_types,
            context,
            self.program.location(context),
        )
    }

    /// Resolve a bare name at a use site, trying parameters, locals,
    /// fields (own, inherited, enum-constant-body), static imports, then
    /// type names
    pub fn resolve_name(&self, name: &str, context: NodeId) -> Result<NameTarget, ResolveError> {
        names::name(self, name, context).ok_or_else(|| ResolveError::UnsolvedSymbol {
            name: name.to_string(),
            location: self.program.location(context),
        })
    }

    /// Resolve a field access against a known target type; handles the
    /// array `.length` pseudo-field
    pub fn resolve_field_access(
        &self,
        target: &ResolvedType,
        name: &str,
        context: NodeId,
    ) -> Result<NameTarget, ResolveError> {
        names::field_access(self.program, target, name).ok_or_else(|| {
            ResolveError::UnsolvedSymbol {
                name: name.to_string(),
                location: self.program.location(context),
            }
        })
    }

    /// Resolve a switch-case label against the selector's type: enum
    /// constants resolve in the enum's scope, not the use site's
    pub fn resolve_switch_label(
        &self,
        selector: &ResolvedType,
        label: &Expr,
    ) -> Option<NameTarget> {
        let name = match label {
            Expr::Name(n) => n.as_str(),
            _ => return None,
        };
        names::field_access(self.program, selector, name)
    }

    /// The type of `this` at a context node: the declaring type applied to
    /// its own type parameters
    pub fn this_type(&self, context: NodeId) -> Option<ResolvedType> {
        let decl_id = if self.program.type_decl(context).is_some() {
            context
        } else {
            self.program.declaring_type(context)?
        };
        let decl = self.program.type_decl(decl_id)?;
        let key = TypeKey::Source(decl_id);
        let args: Vec<ResolvedType> = decl
            .type_params
            .iter()
            .map(|tp| {
                ResolvedType::Variable(TypeVariable {
                    name: tp.name.clone(),
                    scope: decl.qualified_name.clone(),
                    bound: Box::new(object(self.program)),
                })
            })
            .collect();
        Some(ResolvedType::reference_with(key, args))
    }

    /// Type variables visible at a context node: declaring type's, plus the
    /// enclosing callable's
    pub fn scope_at(&self, context: NodeId) -> VarScope {
        let mut vars = match self.program.declaring_type(context).or_else(|| {
            self.program.type_decl(context).map(|_| context)
        }) {
            Some(t) => class_var_scope(self.program, TypeKey::Source(t)),
            None => VarScope::new(),
        };
        let callable = if self.program.callable(context).is_some() {
            Some(context)
        } else {
            self.enclosing_callable(context)
        };
        if let Some(c) = callable {
            if let (Some(decl), Some(sig)) = (
                self.program.callable(c),
                self.program.callable_signature(c),
            ) {
                for tp in &decl.type_params {
                    let bound = tp
                        .bounds
                        .first()
                        .and_then(|b| resolve_ref(self.program, b, &vars))
                        .unwrap_or_else(|| object(self.program));
                    vars.declare(TypeVariable {
                        name: tp.name.clone(),
                        scope: sig.clone(),
                        bound: Box::new(bound),
                    });
                }
            }
        }
        vars
    }

    pub fn enclosing_callable(&self, context: NodeId) -> Option<NodeId> {
        let mut current = Some(context);
        while let Some(id) = current {
            if self.program.callable(id).is_some() {
                return Some(id);
            }
            current = self.program.owner_of(id);
        }
        None
    }

    /// Best-effort expression typing; `None` means not enough information,
    /// never a guess
    pub fn expr_type(&self, expr: &Expr, context: NodeId) -> Option<ResolvedType> {
        match expr {
            Expr::Literal(lit) => Some(self.literal_type(lit)),
            Expr::This => self.this_type(context),
            Expr::Name(name) => self.name_type(name, context),
            Expr::FieldAccess { target, name } => {
                let target_type = self.expr_type(target, context)?;
                self.target_type_of(
                    names::field_access(self.program, &target_type, name)?,
                    context,
                )
            }
            Expr::Call(call) => {
                let key = self.resolve_call(call, context).ok()?;
                let receiver_type = match &call.receiver {
                    Some(recv) => Some(self.expr_type(recv, context)?),
                    None => self.this_type(context),
                };
                let arg_types: Vec<Option<ResolvedType>> = call
                    .args
                    .iter()
                    .map(|a| self.expr_type(a, context))
                    .collect();
                let explicit: Vec<ResolvedType> = call
                    .type_args
                    .iter()
                    .filter_map(|t| resolve_ref(self.program, t, &self.scope_at(context)))
                    .collect();
                let container = Container::around(self.program, context);
                let solved = solver::solve_in_method_context(
                    self.program,
                    key,
                    receiver_type.as_ref(),
                    &arg_types,
                    &explicit,
                    &container,
                )?;
                (solved != ResolvedType::Void).then_some(solved)
            }
            Expr::New(creation) => resolve_ref(
                self.program,
                &creation.ty,
                &self.scope_at(context),
            ),
            Expr::ArrayNew { elem, dims } => {
                let mut ty = resolve_ref(self.program, elem, &self.scope_at(context))?;
                for _ in dims {
                    ty = ResolvedType::array(ty);
                }
                Some(ty)
            }
            Expr::ArrayAccess { array, .. } => match self.expr_type(array, context)? {
                ResolvedType::Array(elem) => Some(*elem),
                _ => None,
            },
            Expr::Assign { target, .. } => self.expr_type(target, context),
            Expr::Binary { op, lhs, rhs } => self.binary_type(op, lhs, rhs, context),
            Expr::Unary { op, operand } => match op.as_str() {
                "!" => Some(ResolvedType::Primitive(PrimitiveKind::Boolean)),
                _ => self.expr_type(operand, context),
            },
            Expr::Cast { ty, .. } => resolve_ref(self.program, ty, &self.scope_at(context)),
            Expr::InstanceOf { .. } => Some(ResolvedType::Primitive(PrimitiveKind::Boolean)),
            Expr::Opaque { .. } => None,
        }
    }

    fn literal_type(&self, lit: &Literal) -> ResolvedType {
        match lit.primitive_kind() {
            Some(kind) => ResolvedType::Primitive(kind),
            None => match lit {
                Literal::Str(_) => self
                    .program
                    .lookup_type("java.lang.String")
                    .map(ResolvedType::reference)
                    .unwrap_or(ResolvedType::Null),
                _ => ResolvedType::Null,
            },
        }
    }

    fn name_type(&self, name: &str, context: NodeId) -> Option<ResolvedType> {
        // dotted names resolve segment by segment
        if let Some((head, rest)) = name.split_once('.') {
            if let Some(mut ty) = self.name_type(head, context) {
                for segment in rest.split('.') {
                    let target = names::field_access(self.program, &ty, segment)?;
                    ty = self.target_type_of(target, context)?;
                }
                return Some(ty);
            }
            // the whole dotted path may itself be a type name
            return self
                .resolve_type_name(name, context)
                .map(ResolvedType::reference);
        }
        let target = names::name(self, name, context)?;
        self.target_type_of(target, context)
    }

    fn target_type_of(&self, target: NameTarget, context: NodeId) -> Option<ResolvedType> {
        match target {
            NameTarget::Param(id) => {
                let p = self.program.param(id)?;
                let base = resolve_ref(self.program, &p.ty, &self.scope_at(id))?;
                Some(if p.varargs {
                    ResolvedType::array(base)
                } else {
                    base
                })
            }
            NameTarget::Local { ty } => resolve_ref(self.program, &ty, &self.scope_at(context)),
            NameTarget::Field(id) => {
                let f = self.program.field(id)?;
                resolve_ref(self.program, &f.ty, &self.scope_at(id))
            }
            NameTarget::EnumConstant(id) => {
                let owner = self.program.enum_constant(id)?.owner;
                Some(ResolvedType::reference(TypeKey::Source(owner)))
            }
            NameTarget::Type(key) => Some(ResolvedType::reference(key)),
            NameTarget::ArrayLength => Some(ResolvedType::Primitive(PrimitiveKind::Int)),
        }
    }

    fn binary_type(
        &self,
        op: &str,
        lhs: &Expr,
        rhs: &Expr,
        context: NodeId,
    ) -> Option<ResolvedType> {
        match op {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => {
                Some(ResolvedType::Primitive(PrimitiveKind::Boolean))
            }
            "+" => {
                let string = self
                    .program
                    .lookup_type("java.lang.String")
                    .map(ResolvedType::reference);
                let l = self.expr_type(lhs, context);
                let r = self.expr_type(rhs, context);
                // string concatenation wins over numeric addition
                if l == string || r == string {
                    return string;
                }
                l.or(r)
            }
            _ => self
                .expr_type(lhs, context)
                .or_else(|| self.expr_type(rhs, context)),
        }
    }

    /// Methods in supertypes that `callable` overrides (same name, same
    /// erased parameter types)
    pub fn override_targets(&self, callable: NodeId) -> Vec<CallableKey> {
        overloads::override_targets(self.program, callable)
    }

    /// Whether a callable satisfies a contract a library type requires: it
    /// overrides an abstract (or interface) library member
    pub fn required_by_library_contract(&self, callable: NodeId) -> bool {
        self.override_targets(callable)
            .into_iter()
            .any(|key| match key {
                CallableKey::Library(id) => {
                    let member = self.program.library().member(id);
                    let class = self.program.library().class(id.class);
                    member.is_abstract
                        || class.kind == crate::ast::TypeKind::Interface
                }
                CallableKey::Source(_) => false,
            })
    }

    /// The superclass constructor a regenerated default constructor should
    /// delegate to: prefer no-arg, else fewest parameters. `None` when the
    /// superclass has no accessible constructor at all.
    pub fn most_specific_super_ctor(&self, class: NodeId) -> Option<CallableKey> {
        overloads::most_specific_super_ctor(self.program, class)
    }
}

/// Baseline resolvers are known to conflate overloads that declare a
/// same-named type variable at the same position; any target inside such an
/// overload set is re-derived
pub fn baseline_suspect(program: &Program, key: CallableKey) -> bool {
    let CallableKey::Source(id) = key else {
        return false;
    };
    let Some(c) = program.callable(id) else {
        return false;
    };
    let owner = TypeKey::Source(c.owner);
    let siblings: Vec<NodeId> = program
        .callables_of(owner)
        .into_iter()
        .filter_map(|k| match k {
            CallableKey::Source(s) if s != id => Some(s),
            _ => None,
        })
        .filter(|s| {
            program
                .callable(*s)
                .map(|other| other.name == c.name)
                .unwrap_or(false)
        })
        .collect();
    for sibling in siblings {
        let Some(other) = program.callable(sibling) else {
            continue;
        };
        let shared = c
            .type_params
            .iter()
            .zip(other.type_params.iter())
            .any(|(a, b)| a.name == b.name);
        if shared {
            return true;
        }
    }
    false
}
