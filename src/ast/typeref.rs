// Syntactic type references - the pre-resolution view of types as written in source
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Java primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Boxed counterpart in java.lang
    pub fn boxed_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
        }
    }

    /// Widening primitive conversion per JLS 5.1.2
    pub fn widens_to(&self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if *self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short => matches!(target, Int | Long | Float | Double),
            Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Boolean | Double => false,
        }
    }
}

/// Wildcard bound direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    /// `? extends T`
    Extends,
    /// `? super T`
    Super,
}

/// A type as written in source, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Primitive(PrimitiveKind),

    /// Simple or qualified name with optional type arguments.
    /// Resolves to a type variable when the name matches an in-scope
    /// type parameter, otherwise to a class-like declaration.
    Named { name: String, args: Vec<TypeRef> },

    Array(Box<TypeRef>),

    /// `?`, `? extends T`, `? super T`
    Wildcard { bound: Option<(BoundKind, Box<TypeRef>)> },

    Void,
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    pub fn named_with(name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.to_string(),
            args,
        }
    }

    pub fn array(elem: TypeRef) -> Self {
        TypeRef::Array(Box::new(elem))
    }

    pub fn int() -> Self {
        TypeRef::Primitive(PrimitiveKind::Int)
    }

    pub fn boolean() -> Self {
        TypeRef::Primitive(PrimitiveKind::Boolean)
    }

    pub fn string() -> Self {
        TypeRef::named("java.lang.String")
    }

    pub fn object() -> Self {
        TypeRef::named("java.lang.Object")
    }

    /// Simple (unqualified) head name, if this is a named reference
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => {
                Some(name.rsplit('.').next().unwrap_or(name.as_str()))
            }
            _ => None,
        }
    }

    /// Render the reference roughly as it would appear in source
    pub fn display(&self) -> String {
        match self {
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Named { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let rendered: Vec<String> = args.iter().map(|a| a.display()).collect();
                    format!("{}<{}>", name, rendered.join(", "))
                }
            }
            TypeRef::Array(elem) => format!("{}[]", elem.display()),
            TypeRef::Wildcard { bound: None } => "?".to_string(),
            TypeRef::Wildcard {
                bound: Some((BoundKind::Extends, t)),
            } => format!("? extends {}", t.display()),
            TypeRef::Wildcard {
                bound: Some((BoundKind::Super, t)),
            } => format!("? super {}", t.display()),
            TypeRef::Void => "void".to_string(),
        }
    }
}
