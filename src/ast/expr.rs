// Expression model - the subset reduction decisions need to see
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use super::decl::SymbolRef;
use super::typeref::{PrimitiveKind, TypeRef};

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Long(i64),
    Float(f64),
    Double(f64),
    Char(char),
    Str(String),
    Null,
}

impl Literal {
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Literal::Bool(_) => Some(PrimitiveKind::Boolean),
            Literal::Int(_) => Some(PrimitiveKind::Int),
            Literal::Long(_) => Some(PrimitiveKind::Long),
            Literal::Float(_) => Some(PrimitiveKind::Float),
            Literal::Double(_) => Some(PrimitiveKind::Double),
            Literal::Char(_) => Some(PrimitiveKind::Char),
            Literal::Str(_) | Literal::Null => None,
        }
    }
}

/// A method invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Receiver expression; `None` for unqualified calls
    pub receiver: Option<Box<Expr>>,
    pub name: String,
    /// Explicit type arguments (`Collections.<String>emptyList()`)
    pub type_args: Vec<TypeRef>,
    pub args: Vec<Expr>,
    /// Target attached by the baseline resolver, if any
    pub baseline: Option<SymbolRef>,
}

/// `new T(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectCreation {
    pub ty: TypeRef,
    pub args: Vec<Expr>,
    pub baseline: Option<SymbolRef>,
}

/// Expressions. Anything the reducer has no use for folds into `Opaque`,
/// which records only the names it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    /// Simple or dotted name, resolved lazily
    Name(String),
    This,
    FieldAccess {
        target: Box<Expr>,
        name: String,
    },
    Call(MethodCall),
    New(ObjectCreation),
    ArrayNew {
        elem: TypeRef,
        dims: Vec<Expr>,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeRef,
    },
    Opaque {
        referenced: Vec<String>,
    },
}

impl Expr {
    pub fn name(n: &str) -> Self {
        Expr::Name(n.to_string())
    }

    pub fn int(v: i64) -> Self {
        Expr::Literal(Literal::Int(v))
    }

    pub fn string(s: &str) -> Self {
        Expr::Literal(Literal::Str(s.to_string()))
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call(MethodCall {
            receiver: None,
            name: name.to_string(),
            type_args: Vec::new(),
            args,
            baseline: None,
        })
    }

    pub fn call_on(receiver: Expr, name: &str, args: Vec<Expr>) -> Self {
        Expr::Call(MethodCall {
            receiver: Some(Box::new(receiver)),
            name: name.to_string(),
            type_args: Vec::new(),
            args,
            baseline: None,
        })
    }

    pub fn new_of(ty: TypeRef, args: Vec<Expr>) -> Self {
        Expr::New(ObjectCreation {
            ty,
            args,
            baseline: None,
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Walk this expression tree, visiting every sub-expression
    pub fn walk(&self, visit: &mut dyn FnMut(&Expr)) {
        visit(self);
        match self {
            Expr::FieldAccess { target, .. } => target.walk(visit),
            Expr::Call(call) => {
                if let Some(recv) = &call.receiver {
                    recv.walk(visit);
                }
                for arg in &call.args {
                    arg.walk(visit);
                }
            }
            Expr::New(creation) => {
                for arg in &creation.args {
                    arg.walk(visit);
                }
            }
            Expr::ArrayNew { dims, .. } => {
                for d in dims {
                    d.walk(visit);
                }
            }
            Expr::ArrayAccess { array, index } => {
                array.walk(visit);
                index.walk(visit);
            }
            Expr::Assign { target, value } => {
                target.walk(visit);
                value.walk(visit);
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            Expr::Unary { operand, .. } => operand.walk(visit),
            Expr::Cast { expr, .. } => expr.walk(visit),
            Expr::InstanceOf { expr, .. } => expr.walk(visit),
            Expr::Literal(_) | Expr::Name(_) | Expr::This | Expr::Opaque { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_counts_subexpressions() {
        let e = Expr::call_on(Expr::name("list"), "add", vec![Expr::int(1)]);
        let mut count = 0;
        e.walk(&mut |_| count += 1);
        // call + receiver + argument
        assert_eq!(count, 3);
    }

    #[test]
    fn test_literal_kinds() {
        assert_eq!(
            Literal::Int(3).primitive_kind(),
            Some(PrimitiveKind::Int)
        );
        assert_eq!(Literal::Null.primitive_kind(), None);
    }
}
