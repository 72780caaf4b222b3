// Declaration node payloads - some fields reserved for the discovery pass
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::expr::Expr;
use super::library::{LibClassId, LibMemberId};
use super::typeref::TypeRef;
use super::NodeId;

/// Location in source code, attached to every declaration node for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    /// Line number (1-indexed, 0 when synthesized)
    pub line: usize,
    /// Column number (1-indexed, 0 when synthesized)
    pub column: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Visibility modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    PackagePrivate,
}

impl Visibility {
    pub fn from_modifiers(modifiers: &[&str]) -> Self {
        if modifiers.contains(&"private") {
            Visibility::Private
        } else if modifiers.contains(&"protected") {
            Visibility::Protected
        } else if modifiers.contains(&"public") {
            Visibility::Public
        } else {
            Visibility::PackagePrivate
        }
    }
}

/// Modifier set shared by all member declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Annotation simple names as written (`Override`, `Deprecated`, ...)
    pub annotations: Vec<String>,
}

impl Modifiers {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

/// Kind of class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl TypeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Annotation => "annotation",
        }
    }
}

/// A declared type parameter (`<T extends Bound>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

impl TypeParam {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bounds: Vec::new(),
        }
    }

    pub fn bounded(name: &str, bounds: Vec<TypeRef>) -> Self {
        Self {
            name: name.to_string(),
            bounds,
        }
    }
}

/// One source file: package, imports, top-level type declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<NodeId>,
    pub types: Vec<NodeId>,
}

/// `import a.b.C;` / `import static a.b.C.d;` / `import a.b.*;`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Dotted path without the trailing `.*`
    pub path: String,
    pub is_static: bool,
    pub on_demand: bool,
    pub unit: NodeId,
    pub location: Location,
}

impl ImportDecl {
    /// Simple name introduced by a single-type/single-static import
    pub fn imported_name(&self) -> Option<&str> {
        if self.on_demand {
            None
        } else {
            self.path.rsplit('.').next()
        }
    }
}

/// Class, interface, enum, or annotation declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub qualified_name: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    /// Member declarations in source order: callables, fields, enum
    /// constants, initializers, and nested type nodes
    pub members: Vec<NodeId>,
    pub unit: NodeId,
    /// Enclosing type for nested declarations
    pub parent: Option<NodeId>,
    pub location: Location,
}

impl TypeDecl {
    pub fn is_concrete_class(&self) -> bool {
        self.kind == TypeKind::Class && !self.modifiers.is_abstract
    }
}

/// Method or constructor declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallableDecl {
    /// `<init>` for constructors
    pub name: String,
    pub is_constructor: bool,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<NodeId>,
    pub return_type: TypeRef,
    pub throws: Vec<TypeRef>,
    /// Body block statement node; `None` for abstract/interface methods
    pub body: Option<NodeId>,
    pub owner: NodeId,
    pub location: Location,
}

impl CallableDecl {
    pub fn has_override_marker(&self) -> bool {
        self.modifiers.has_annotation("Override")
    }
}

/// Field declaration (one variable per node)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
    pub initializer: Option<Expr>,
    pub owner: NodeId,
    pub location: Location,
}

/// Enum constant, optionally with a constant body (anonymous subclass members)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConstantDecl {
    pub name: String,
    pub args: Vec<Expr>,
    pub body_members: Vec<NodeId>,
    pub owner: NodeId,
    pub location: Location,
}

/// Static or instance initializer block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: NodeId,
    pub owner: NodeId,
    pub location: Location,
}

/// Callable parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    pub varargs: bool,
    pub owner: NodeId,
    pub location: Location,
}

/// Canonical handle for a class-like declaration: either a node in the
/// analyzed source or an external (library) class with no AST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKey {
    Source(NodeId),
    Library(LibClassId),
}

/// Canonical handle for a callable declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallableKey {
    Source(NodeId),
    Library(LibMemberId),
}

/// A pre-resolved symbol attached by the external (baseline) resolution
/// backend; the fallback layer re-derives it when absent or distrusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolRef {
    Callable(CallableKey),
    Field(NodeId),
    Type(TypeKey),
}
