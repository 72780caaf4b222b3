// Sweep phase - clones each unit into a new arena, guided by decisions
#![allow(dead_code)]

mod repair;

pub use repair::{can_complete_normally, catch_type_needed, default_value, thrown_types};

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::ast::{
    CallableKey, CatchClause, Expr, Location, MethodCall, Node, NodeId, ObjectCreation, Program,
    ProgramBuilder, Stmt, SwitchCase, TryResource, TypeKind, TypeRef,
};
use crate::mark::Decision;
use crate::reasons::{InclusionReason, ReasonTable};
use crate::resolve::Resolver;

/// Sweep behavior knobs, resolved from configuration by the driver
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Marker-throw dummy bodies when true, silent default returns when
    /// false
    pub assertions_enabled: bool,
    /// Message carried by the marker `AssertionError`
    pub marker_message: String,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            assertions_enabled: true,
            marker_message: "unreachable code removed during reduction".to_string(),
        }
    }
}

/// Sweep failures must be loud: emitting uncompilable output is worse than
/// stopping
#[derive(Error, Debug, Clone)]
pub enum SweepError {
    #[error("no superclass constructor candidate remains for {class} at {location}")]
    StructuralRepair { class: String, location: Location },
}

/// Produce the reduced program. The original arena is read-only input; the
/// output is a fresh arena with its own node ids.
pub fn sweep(
    program: &Program,
    decisions: &BTreeMap<NodeId, Decision>,
    reasons: &ReasonTable,
    options: &SweepOptions,
) -> Result<Program, SweepError> {
    Sweeper::new(program, decisions, reasons, options).run()
}

struct Sweeper<'p> {
    program: &'p Program,
    decisions: &'p BTreeMap<NodeId, Decision>,
    reasons: &'p ReasonTable,
    options: &'p SweepOptions,
    resolver: Resolver<'p>,
    /// simple name -> qualified name, for nested types whose nest parent
    /// was reduced to a shell
    relocated: HashMap<String, String>,
}

impl<'p> Sweeper<'p> {
    fn new(
        program: &'p Program,
        decisions: &'p BTreeMap<NodeId, Decision>,
        reasons: &'p ReasonTable,
        options: &'p SweepOptions,
    ) -> Self {
        Self {
            program,
            decisions,
            reasons,
            options,
            resolver: Resolver::new(program),
            relocated: HashMap::new(),
        }
    }

    fn decision(&self, node: NodeId) -> Decision {
        self.decisions
            .get(&node)
            .copied()
            .unwrap_or(Decision::Remove)
    }

    /// A type kept only as a nest parent: supertypes severed, instance
    /// members dropped
    fn is_shell(&self, type_id: NodeId) -> bool {
        if !self.decision(type_id).is_retained() {
            return false;
        }
        let reasons = self.reasons.reasons(type_id);
        !reasons.is_empty()
            && reasons
                .iter()
                .all(|r| matches!(r, InclusionReason::NestParent(_)))
    }

    fn run(mut self) -> Result<Program, SweepError> {
        // nested types under a shell parent resolve by qualified name
        // afterwards
        for type_id in self.program.type_ids() {
            if let Some(decl) = self.program.type_decl(type_id) {
                if let Some(parent) = decl.parent {
                    if self.is_shell(parent) && self.decision(type_id).is_retained() {
                        self.relocated
                            .insert(decl.name.clone(), decl.qualified_name.clone());
                    }
                }
            }
        }

        let mut b = ProgramBuilder::with_library(self.program.library().clone());
        for unit_id in self.program.units() {
            self.copy_unit(&mut b, *unit_id)?;
        }
        Ok(b.finish())
    }

    fn copy_unit(&self, b: &mut ProgramBuilder, unit_id: NodeId) -> Result<(), SweepError> {
        let Some(unit) = self.program.unit(unit_id) else {
            return Ok(());
        };
        let retained_types: Vec<NodeId> = unit
            .types
            .iter()
            .copied()
            .filter(|t| self.decision(*t).is_retained())
            .collect();
        if retained_types.is_empty() {
            debug!(path = %unit.path.display(), "unit fully removed");
            return Ok(());
        }

        let new_unit = b.add_unit(unit.path.clone(), unit.package.as_deref());
        for import_id in &unit.imports {
            if self.decision(*import_id).is_retained() {
                if let Some(import) = self.program.import(*import_id) {
                    b.add_import(new_unit, &import.path, import.is_static, import.on_demand);
                }
            }
        }
        for type_id in retained_types {
            self.copy_type(b, type_id, new_unit, None)?;
        }
        Ok(())
    }

    fn copy_type(
        &self,
        b: &mut ProgramBuilder,
        old: NodeId,
        unit: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SweepError> {
        let decl = self
            .program
            .type_decl(old)
            .expect("copy_type called on a type node");
        let shell = self.is_shell(old);

        let new_id = b.add_type(unit, parent, &decl.name, decl.kind);
        {
            let t = b.type_mut(new_id);
            t.modifiers = decl.modifiers.clone();
            t.type_params = decl.type_params.clone();
            if !shell {
                t.superclass = decl.superclass.clone();
                t.interfaces = decl.interfaces.clone();
            }
            t.location = decl.location.clone();
        }

        let mut declared_ctors = 0usize;
        let mut kept_ctors = 0usize;
        let total_constants = decl
            .members
            .iter()
            .filter(|m| self.program.enum_constant(**m).is_some())
            .count();
        let retained_constants = decl
            .members
            .iter()
            .filter(|m| {
                self.program.enum_constant(**m).is_some() && self.decision(**m).is_retained()
            })
            .count();
        // an enum that lost every constant must stay concrete
        let force_concrete =
            decl.kind == TypeKind::Enum && total_constants > 0 && retained_constants == 0;

        for member in &decl.members {
            let member = *member;
            match self.program.node(member) {
                Node::Type(_) => {
                    if self.decision(member).is_retained() {
                        self.copy_type(b, member, unit, Some(new_id))?;
                    }
                }
                Node::Field(f) => {
                    if !self.decision(member).is_retained() {
                        continue;
                    }
                    if shell && !f.modifiers.is_static {
                        continue;
                    }
                    let new_field = b.add_field(new_id, &f.name, f.ty.clone());
                    let fm = b.field_mut(new_field);
                    fm.modifiers = f.modifiers.clone();
                    fm.initializer = f.initializer.as_ref().map(|e| self.clean_expr(e));
                    fm.location = f.location.clone();
                }
                Node::Callable(c) => {
                    if c.is_constructor {
                        declared_ctors += 1;
                    }
                    let decision = self.decision(member);
                    if !decision.is_retained() {
                        continue;
                    }
                    if shell && !c.modifiers.is_static {
                        continue;
                    }
                    if c.is_constructor {
                        kept_ctors += 1;
                    }
                    self.copy_callable(b, member, new_id, old, decision, force_concrete);
                }
                Node::EnumConstant(e) => {
                    if shell || !self.decision(member).is_retained() {
                        continue;
                    }
                    let args: Vec<Expr> = e.args.iter().map(|a| self.clean_expr(a)).collect();
                    let new_constant = b.add_enum_constant(new_id, &e.name, args);
                    for body_member in &e.body_members {
                        let decision = self.decision(*body_member);
                        if !decision.is_retained() {
                            continue;
                        }
                        if self.program.callable(*body_member).is_some() {
                            self.copy_callable(b, *body_member, new_constant, old, decision, false);
                        }
                    }
                }
                Node::Initializer(init) => {
                    let decision = self.decision(member);
                    if !decision.is_retained() || (shell && !init.is_static) {
                        continue;
                    }
                    let body = match decision {
                        Decision::Keep => match self.copy_stmt(b, init.body, member) {
                            Some(block) => vec![block],
                            None => Vec::new(),
                        },
                        _ => self.marker_stmts(b),
                    };
                    b.add_initializer(new_id, init.is_static, body);
                }
                _ => {}
            }
        }

        // every explicit constructor died: regenerate a default one so the
        // type still constructs
        if decl.kind == TypeKind::Class && declared_ctors > 0 && kept_ctors == 0 && !shell {
            self.regenerate_default_ctor(b, old, new_id)?;
        }

        Ok(new_id)
    }

    fn copy_callable(
        &self,
        b: &mut ProgramBuilder,
        old: NodeId,
        new_owner: NodeId,
        old_class: NodeId,
        decision: Decision,
        force_concrete: bool,
    ) {
        let c = self
            .program
            .callable(old)
            .expect("copy_callable called on a callable node");

        let new_id = if c.is_constructor {
            b.add_ctor(new_owner)
        } else {
            b.add_method(new_owner, &c.name, c.return_type.clone())
        };
        for param_id in &c.params {
            if let Some(p) = self.program.param(*param_id) {
                let new_param = b.add_param(new_id, &p.name, p.ty.clone());
                b.param_mut(new_param).varargs = p.varargs;
            }
        }
        {
            let decl = b.callable_mut(new_id);
            decl.modifiers = c.modifiers.clone();
            decl.type_params = c.type_params.clone();
            decl.throws = c.throws.clone();
            decl.location = c.location.clone();
            if force_concrete {
                decl.modifiers.is_abstract = false;
            }
        }

        // @Override comes off once nothing overridden remains
        if c.has_override_marker() && !self.any_override_target_retained(old) {
            b.callable_mut(new_id)
                .modifiers
                .annotations
                .retain(|a| a != "Override");
        }

        let body = match decision {
            Decision::Keep => c.body.and_then(|body| self.copy_stmt(b, body, old)),
            Decision::Dummy => {
                if c.body.is_none() && !c.is_constructor && !force_concrete {
                    // abstract declarations stay bodiless
                    None
                } else {
                    let stmts = self.dummy_body(b, old, old_class);
                    Some(b.add_stmt(Stmt::Block(stmts)))
                }
            }
            Decision::Remove => None,
        };
        if force_concrete && body.is_none() && c.body.is_none() {
            let stmts = self.dummy_body(b, old, old_class);
            let block = b.add_stmt(Stmt::Block(stmts));
            b.callable_mut(new_id).body = Some(block);
        } else {
            b.callable_mut(new_id).body = body;
        }
    }

    fn any_override_target_retained(&self, callable: NodeId) -> bool {
        self.resolver
            .override_targets(callable)
            .into_iter()
            .any(|key| match key {
                CallableKey::Source(id) => self.decision(id).is_retained(),
                // library declarations never go away
                CallableKey::Library(_) => true,
            })
    }

    /// Body of a dummy callable: superclass delegation and final-field
    /// assignments first so the result stays compilable, then the marker
    fn dummy_body(&self, b: &mut ProgramBuilder, old: NodeId, old_class: NodeId) -> Vec<NodeId> {
        let c = self
            .program
            .callable(old)
            .expect("dummy_body called on a callable node");
        let mut stmts: Vec<NodeId> = Vec::new();

        if c.is_constructor {
            if let Some(super_ctor) = self.resolver.most_specific_super_ctor(old_class) {
                let params = self.ctor_params(super_ctor);
                if !params.is_empty() {
                    let args: Vec<Expr> = params.iter().map(default_value).collect();
                    stmts.push(b.add_stmt(Stmt::ExplicitCtorCall {
                        is_super: true,
                        args,
                    }));
                }
            }
            stmts.extend(self.final_field_defaults(b, old_class));
        }

        if self.options.assertions_enabled {
            stmts.push(b.add_stmt(Stmt::Throw(Expr::New(ObjectCreation {
                ty: TypeRef::named("java.lang.AssertionError"),
                args: vec![Expr::string(&self.options.marker_message)],
                baseline: None,
            }))));
        } else if !c.is_constructor && c.return_type != TypeRef::Void {
            stmts.push(b.add_stmt(Stmt::Return(Some(default_value(&c.return_type)))));
        }
        stmts
    }

    fn ctor_params(&self, key: CallableKey) -> Vec<TypeRef> {
        match key {
            CallableKey::Source(id) => self
                .program
                .callable(id)
                .map(|c| {
                    c.params
                        .iter()
                        .filter_map(|p| self.program.param(*p))
                        .map(|p| p.ty.clone())
                        .collect()
                })
                .unwrap_or_default(),
            CallableKey::Library(id) => self.program.library().member(id).params.clone(),
        }
    }

    /// `this.x = <default>;` for each retained final instance field without
    /// an initializer; a dummy constructor no longer runs the assignments
    /// the original body had
    fn final_field_defaults(&self, b: &mut ProgramBuilder, old_class: NodeId) -> Vec<NodeId> {
        let Some(decl) = self.program.type_decl(old_class) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for member in &decl.members {
            let Some(f) = self.program.field(*member) else {
                continue;
            };
            if !self.decision(*member).is_retained() {
                continue;
            }
            if f.modifiers.is_final && !f.modifiers.is_static && f.initializer.is_none() {
                let assign = Expr::assign(
                    Expr::FieldAccess {
                        target: Box::new(Expr::This),
                        name: f.name.clone(),
                    },
                    default_value(&f.ty),
                );
                out.push(b.add_stmt(Stmt::Expr(assign)));
            }
        }
        out
    }

    fn marker_stmts(&self, b: &mut ProgramBuilder) -> Vec<NodeId> {
        if self.options.assertions_enabled {
            vec![b.add_stmt(Stmt::Throw(Expr::New(ObjectCreation {
                ty: TypeRef::named("java.lang.AssertionError"),
                args: vec![Expr::string(&self.options.marker_message)],
                baseline: None,
            })))]
        } else {
            Vec::new()
        }
    }

    fn regenerate_default_ctor(
        &self,
        b: &mut ProgramBuilder,
        old_class: NodeId,
        new_class: NodeId,
    ) -> Result<(), SweepError> {
        let decl = self
            .program
            .type_decl(old_class)
            .expect("regenerate called on a type node");
        let super_ctor = self.resolver.most_specific_super_ctor(old_class);
        if super_ctor.is_none() && decl.superclass.is_some() {
            return Err(SweepError::StructuralRepair {
                class: decl.qualified_name.clone(),
                location: decl.location.clone(),
            });
        }

        debug!(class = %decl.qualified_name, "regenerating default constructor");
        let ctor = b.add_ctor(new_class);
        let mut stmts: Vec<NodeId> = Vec::new();
        if let Some(key) = super_ctor {
            let params = self.ctor_params(key);
            if !params.is_empty() {
                let args: Vec<Expr> = params.iter().map(default_value).collect();
                stmts.push(b.add_stmt(Stmt::ExplicitCtorCall {
                    is_super: true,
                    args,
                }));
            }
        }
        stmts.extend(self.final_field_defaults(b, old_class));
        let block = b.add_stmt(Stmt::Block(stmts));
        b.callable_mut(ctor).body = Some(block);
        Ok(())
    }

    /// Deep-copy one statement into the new arena, applying truncation and
    /// catch pruning along the way. `context` is the old arena node used
    /// for resolution queries.
    fn copy_stmt(&self, b: &mut ProgramBuilder, old: NodeId, context: NodeId) -> Option<NodeId> {
        let stmt = self.program.stmt(old)?;
        let copied = match stmt {
            Stmt::Block(children) => {
                let mut new_children = Vec::new();
                for child in children {
                    let completes = self
                        .program
                        .stmt(*child)
                        .map(|s| can_complete_normally(self.program, s))
                        .unwrap_or(true);
                    if let Some(new_child) = self.copy_stmt(b, *child, context) {
                        new_children.push(new_child);
                    }
                    if !completes {
                        // everything after this statement is unreachable
                        break;
                    }
                }
                Stmt::Block(new_children)
            }
            Stmt::Expr(e) => Stmt::Expr(self.clean_expr(e)),
            Stmt::LocalVar { name, ty, init } => Stmt::LocalVar {
                name: name.clone(),
                ty: ty.clone(),
                init: init.as_ref().map(|e| self.clean_expr(e)),
            },
            Stmt::Return(e) => Stmt::Return(e.as_ref().map(|e| self.clean_expr(e))),
            Stmt::Throw(e) => Stmt::Throw(self.clean_expr(e)),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let new_then = self.copy_stmt(b, *then_branch, context)?;
                let new_else = else_branch.and_then(|e| self.copy_stmt(b, e, context));
                Stmt::If {
                    cond: self.clean_expr(cond),
                    then_branch: new_then,
                    else_branch: new_else,
                }
            }
            Stmt::While { cond, body } => Stmt::While {
                cond: self.clean_expr(cond),
                body: self.copy_stmt(b, *body, context)?,
            },
            Stmt::Try {
                resources,
                body,
                catches,
                finally,
            } => return self.copy_try(b, resources, *body, catches, *finally, context),
            Stmt::Switch { selector, cases } => Stmt::Switch {
                selector: self.clean_expr(selector),
                cases: cases
                    .iter()
                    .map(|case| SwitchCase {
                        labels: case.labels.iter().map(|l| self.clean_expr(l)).collect(),
                        body: case
                            .body
                            .iter()
                            .filter_map(|s| self.copy_stmt(b, *s, context))
                            .collect(),
                    })
                    .collect(),
            },
            Stmt::ExplicitCtorCall { is_super, args } => Stmt::ExplicitCtorCall {
                is_super: *is_super,
                args: args.iter().map(|a| self.clean_expr(a)).collect(),
            },
            Stmt::Empty => Stmt::Empty,
        };
        Some(b.add_stmt(copied))
    }

    fn copy_try(
        &self,
        b: &mut ProgramBuilder,
        resources: &[TryResource],
        body: NodeId,
        catches: &[CatchClause],
        finally: Option<NodeId>,
        context: NodeId,
    ) -> Option<NodeId> {
        let new_body = self.copy_stmt(b, body, context)?;
        let new_resources: Vec<TryResource> = resources
            .iter()
            .map(|r| TryResource {
                name: r.name.clone(),
                ty: r.ty.clone(),
                init: self.clean_expr(&r.init),
            })
            .collect();

        // prune exception types nothing in the retained body still throws;
        // an imprecise analysis keeps every clause
        let thrown = thrown_types(&self.resolver, self.program, body, context);
        let mut new_catches: Vec<CatchClause> = Vec::new();
        for clause in catches {
            let kept_types: Vec<TypeRef> = match &thrown {
                None => clause.types.clone(),
                Some(thrown) => clause
                    .types
                    .iter()
                    .filter(|t| {
                        catch_type_needed(&self.resolver, self.program, t, thrown, context)
                    })
                    .cloned()
                    .collect(),
            };
            if kept_types.is_empty() {
                continue;
            }
            let Some(new_clause_body) = self.copy_stmt(b, clause.body, context) else {
                continue;
            };
            new_catches.push(CatchClause {
                types: kept_types,
                param: clause.param.clone(),
                body: new_clause_body,
            });
        }

        let new_finally = finally.and_then(|f| self.copy_stmt(b, f, context));

        // a try with nothing left to do unwraps into its body
        if new_catches.is_empty() && new_resources.is_empty() && new_finally.is_none() {
            return Some(new_body);
        }
        Some(b.add_stmt(Stmt::Try {
            resources: new_resources,
            body: new_body,
            catches: new_catches,
            finally: new_finally,
        }))
    }

    /// Clone an expression, dropping stale baseline targets (they hold old
    /// arena ids) and re-qualifying names of types that moved out from
    /// under a shell parent
    fn clean_expr(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Name(n) => match self.relocated.get(n) {
                Some(qualified) => Expr::Name(qualified.clone()),
                None => expr.clone(),
            },
            Expr::FieldAccess { target, name } => Expr::FieldAccess {
                target: Box::new(self.clean_expr(target)),
                name: name.clone(),
            },
            Expr::Call(call) => Expr::Call(MethodCall {
                receiver: call
                    .receiver
                    .as_ref()
                    .map(|r| Box::new(self.clean_expr(r))),
                name: call.name.clone(),
                type_args: call.type_args.clone(),
                args: call.args.iter().map(|a| self.clean_expr(a)).collect(),
                baseline: None,
            }),
            Expr::New(creation) => Expr::New(ObjectCreation {
                ty: creation.ty.clone(),
                args: creation.args.iter().map(|a| self.clean_expr(a)).collect(),
                baseline: None,
            }),
            Expr::ArrayNew { elem, dims } => Expr::ArrayNew {
                elem: elem.clone(),
                dims: dims.iter().map(|d| self.clean_expr(d)).collect(),
            },
            Expr::ArrayAccess { array, index } => Expr::ArrayAccess {
                array: Box::new(self.clean_expr(array)),
                index: Box::new(self.clean_expr(index)),
            },
            Expr::Assign { target, value } => Expr::Assign {
                target: Box::new(self.clean_expr(target)),
                value: Box::new(self.clean_expr(value)),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op: op.clone(),
                lhs: Box::new(self.clean_expr(lhs)),
                rhs: Box::new(self.clean_expr(rhs)),
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op: op.clone(),
                operand: Box::new(self.clean_expr(operand)),
            },
            Expr::Cast { ty, expr } => Expr::Cast {
                ty: ty.clone(),
                expr: Box::new(self.clean_expr(expr)),
            },
            Expr::InstanceOf { expr, ty } => Expr::InstanceOf {
                expr: Box::new(self.clean_expr(expr)),
                ty: ty.clone(),
            },
            Expr::Literal(_) | Expr::This | Expr::Opaque { .. } => expr.clone(),
        }
    }
}
