// Statement model
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use super::expr::{Expr, Literal};
use super::typeref::TypeRef;
use super::NodeId;

/// One `catch` clause; `types` has more than one entry for a union catch
/// (`catch (IOException | SQLException e)`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub types: Vec<TypeRef>,
    pub param: String,
    pub body: NodeId,
}

/// `case L1, L2: body` or `default:` (empty labels)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchCase {
    /// Enum-constant or constant labels; empty for `default`
    pub labels: Vec<Expr>,
    pub body: Vec<NodeId>,
}

/// A try-with-resources resource declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryResource {
    pub name: String,
    pub ty: TypeRef,
    pub init: Expr,
}

/// Statements. Each statement is an arena node so the discovery pass can
/// attach inclusion reasons to individual statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Block(Vec<NodeId>),
    Expr(Expr),
    LocalVar {
        name: String,
        ty: TypeRef,
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    If {
        cond: Expr,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: Expr,
        body: NodeId,
    },
    Try {
        resources: Vec<TryResource>,
        body: NodeId,
        catches: Vec<CatchClause>,
        finally: Option<NodeId>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
    },
    /// `super(args)` or `this(args)` as the first statement of a constructor
    ExplicitCtorCall {
        is_super: bool,
        args: Vec<Expr>,
    },
    Empty,
}

impl Stmt {
    /// Visit every expression directly held by this statement (not by
    /// nested statements, which are separate nodes)
    pub fn exprs(&self, visit: &mut dyn FnMut(&Expr)) {
        match self {
            Stmt::Expr(e) | Stmt::Throw(e) => e.walk(visit),
            Stmt::Return(Some(e)) => e.walk(visit),
            Stmt::LocalVar { init: Some(e), .. } => e.walk(visit),
            Stmt::If { cond, .. } => cond.walk(visit),
            Stmt::While { cond, .. } => cond.walk(visit),
            Stmt::Try { resources, .. } => {
                for r in resources {
                    r.init.walk(visit);
                }
            }
            Stmt::Switch { selector, cases } => {
                selector.walk(visit);
                for case in cases {
                    for label in &case.labels {
                        label.walk(visit);
                    }
                }
            }
            Stmt::ExplicitCtorCall { args, .. } => {
                for a in args {
                    a.walk(visit);
                }
            }
            Stmt::Return(None) | Stmt::LocalVar { init: None, .. } | Stmt::Block(_) | Stmt::Empty => {}
        }
    }

    /// Whether the loop condition is the literal `true` (a `while (true)`
    /// without breaks cannot complete normally, JLS 14.21)
    pub fn is_infinite_loop(&self) -> bool {
        matches!(
            self,
            Stmt::While {
                cond: Expr::Literal(Literal::Bool(true)),
                ..
            }
        )
    }
}
