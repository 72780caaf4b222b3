// Arena AST model - declaration nodes, owned by compilation units
#![allow(dead_code)]

mod build;
mod decl;
mod expr;
mod library;
mod stmt;
mod typeref;

pub use build::ProgramBuilder;
pub use decl::{
    CallableDecl, CallableKey, CompilationUnit, EnumConstantDecl, FieldDecl, ImportDecl,
    InitializerDecl, Location, Modifiers, ParamDecl, SymbolRef, TypeDecl, TypeKey, TypeKind,
    TypeParam, Visibility,
};
pub use expr::{Expr, Literal, MethodCall, ObjectCreation};
pub use library::{LibCallable, LibClass, LibClassId, LibMemberId, Library};
pub use stmt::{CatchClause, Stmt, SwitchCase, TryResource};
pub use typeref::{BoundKind, PrimitiveKind, TypeRef};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identity of a declaration node within one `Program` arena.
/// All side tables (reasons, decisions, resolution cache) key on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A declaration node: any named or structural construct that participates
/// in reachability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Unit(CompilationUnit),
    Import(ImportDecl),
    Type(TypeDecl),
    Callable(CallableDecl),
    Field(FieldDecl),
    EnumConstant(EnumConstantDecl),
    Initializer(InitializerDecl),
    Param(ParamDecl),
    Stmt(Stmt),
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Unit(_) => "compilation unit",
            Node::Import(_) => "import",
            Node::Type(t) => t.kind.display_name(),
            Node::Callable(c) if c.is_constructor => "constructor",
            Node::Callable(_) => "method",
            Node::Field(_) => "field",
            Node::EnumConstant(_) => "enum constant",
            Node::Initializer(_) => "initializer",
            Node::Param(_) => "parameter",
            Node::Stmt(_) => "statement",
        }
    }
}

/// The whole analyzed program: one arena of nodes, the compilation-unit
/// roots, and the classpath (library) table. Immutable during the mark
/// phase; the sweep phase produces an entirely new `Program`.
#[derive(Debug)]
pub struct Program {
    nodes: Vec<Node>,
    units: Vec<NodeId>,
    library: Library,
    /// Qualified and unambiguous simple type names -> declaration
    type_index: HashMap<String, TypeKey>,
}

impl Program {
    pub(super) fn from_parts(nodes: Vec<Node>, units: Vec<NodeId>, library: Library) -> Self {
        let mut program = Self {
            nodes,
            units,
            library,
            type_index: HashMap::new(),
        };
        program.build_type_index();
        program
    }

    fn build_type_index(&mut self) {
        let mut by_simple: HashMap<String, Vec<TypeKey>> = HashMap::new();
        let mut index: HashMap<String, TypeKey> = HashMap::new();

        for id in self.type_ids() {
            let decl = self.type_decl(id).expect("type id");
            let key = TypeKey::Source(id);
            index.insert(decl.qualified_name.clone(), key);
            by_simple.entry(decl.name.clone()).or_default().push(key);
        }
        for (lib_id, class) in self.library.classes() {
            let key = TypeKey::Library(lib_id);
            index.entry(class.qualified_name.clone()).or_insert(key);
            by_simple
                .entry(class.simple_name().to_string())
                .or_default()
                .push(key);
        }
        // Simple names only resolve through the index when unambiguous;
        // source declarations shadow library ones.
        for (simple, keys) in by_simple {
            let source: Vec<&TypeKey> = keys
                .iter()
                .filter(|k| matches!(k, TypeKey::Source(_)))
                .collect();
            let chosen = match (source.len(), keys.len()) {
                (1, _) => Some(*source[0]),
                (0, 1) => Some(keys[0]),
                _ => None,
            };
            if let Some(key) = chosen {
                index.entry(simple).or_insert(key);
            }
        }
        self.type_index = index;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn units(&self) -> &[NodeId] {
        &self.units
    }

    pub fn unit(&self, id: NodeId) -> Option<&CompilationUnit> {
        match self.node(id) {
            Node::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn import(&self, id: NodeId) -> Option<&ImportDecl> {
        match self.node(id) {
            Node::Import(i) => Some(i),
            _ => None,
        }
    }

    pub fn type_decl(&self, id: NodeId) -> Option<&TypeDecl> {
        match self.node(id) {
            Node::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn callable(&self, id: NodeId) -> Option<&CallableDecl> {
        match self.node(id) {
            Node::Callable(c) => Some(c),
            _ => None,
        }
    }

    pub fn field(&self, id: NodeId) -> Option<&FieldDecl> {
        match self.node(id) {
            Node::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn enum_constant(&self, id: NodeId) -> Option<&EnumConstantDecl> {
        match self.node(id) {
            Node::EnumConstant(e) => Some(e),
            _ => None,
        }
    }

    pub fn initializer(&self, id: NodeId) -> Option<&InitializerDecl> {
        match self.node(id) {
            Node::Initializer(i) => Some(i),
            _ => None,
        }
    }

    pub fn param(&self, id: NodeId) -> Option<&ParamDecl> {
        match self.node(id) {
            Node::Param(p) => Some(p),
            _ => None,
        }
    }

    pub fn stmt(&self, id: NodeId) -> Option<&Stmt> {
        match self.node(id) {
            Node::Stmt(s) => Some(s),
            _ => None,
        }
    }

    /// All type declaration ids, in arena order
    pub fn type_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| matches!(self.node(*id), Node::Type(_)))
            .collect()
    }

    /// Every reachability-tracked declaration id (everything except
    /// statement nodes, which are decided through their enclosing callable)
    pub fn decl_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| !matches!(self.node(*id), Node::Stmt(_) | Node::Unit(_)))
            .collect()
    }

    /// Declaration ids owned by one compilation unit
    pub fn decl_ids_of_unit(&self, unit: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(u) = self.unit(unit) else {
            return out;
        };
        out.extend(u.imports.iter().copied());
        let mut stack: Vec<NodeId> = u.types.clone();
        while let Some(id) = stack.pop() {
            out.push(id);
            match self.node(id) {
                Node::Type(t) => stack.extend(t.members.iter().copied()),
                Node::Callable(c) => stack.extend(c.params.iter().copied()),
                Node::EnumConstant(e) => stack.extend(e.body_members.iter().copied()),
                _ => {}
            }
        }
        out
    }

    /// Structural owner of a node: declaring type for members, callable for
    /// parameters, unit for imports and top-level types
    pub fn owner_of(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id) {
            Node::Unit(_) => None,
            Node::Import(i) => Some(i.unit),
            Node::Type(t) => t.parent.or(Some(t.unit)),
            Node::Callable(c) => Some(c.owner),
            Node::Field(f) => Some(f.owner),
            Node::EnumConstant(e) => Some(e.owner),
            Node::Initializer(i) => Some(i.owner),
            Node::Param(p) => Some(p.owner),
            Node::Stmt(_) => None,
        }
    }

    /// Nearest enclosing type declaration, if any
    pub fn declaring_type(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.owner_of(id);
        while let Some(owner) = current {
            if matches!(self.node(owner), Node::Type(_)) {
                return Some(owner);
            }
            current = self.owner_of(owner);
        }
        None
    }

    /// Compilation unit owning a node
    pub fn unit_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            match self.node(current) {
                Node::Unit(_) => return Some(current),
                Node::Type(t) => return Some(t.unit),
                _ => current = self.owner_of(current)?,
            }
        }
    }

    pub fn location(&self, id: NodeId) -> Location {
        match self.node(id) {
            Node::Unit(u) => Location::new(u.path.clone(), 0, 0),
            Node::Import(i) => i.location.clone(),
            Node::Type(t) => t.location.clone(),
            Node::Callable(c) => c.location.clone(),
            Node::Field(f) => f.location.clone(),
            Node::EnumConstant(e) => e.location.clone(),
            Node::Initializer(i) => i.location.clone(),
            Node::Param(p) => p.location.clone(),
            Node::Stmt(_) => Location::default(),
        }
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Import(i) => Some(i.path.as_str()),
            Node::Type(t) => Some(t.name.as_str()),
            Node::Callable(c) => Some(c.name.as_str()),
            Node::Field(f) => Some(f.name.as_str()),
            Node::EnumConstant(e) => Some(e.name.as_str()),
            Node::Param(p) => Some(p.name.as_str()),
            _ => None,
        }
    }

    /// Display string for diagnostics, e.g. `method bar (Foo.java:12:5)`
    pub fn display(&self, id: NodeId) -> String {
        match self.name_of(id) {
            Some(name) => format!(
                "{} {} ({})",
                self.node(id).kind_name(),
                name,
                self.location(id)
            ),
            None => format!("{} ({})", self.node(id).kind_name(), self.location(id)),
        }
    }

    /// Resolve a type name through the global index (qualified names always;
    /// simple names only when unambiguous). Import-aware lookup lives in the
    /// resolution layer.
    pub fn lookup_type(&self, name: &str) -> Option<TypeKey> {
        self.type_index.get(name).copied()
    }

    pub fn type_name(&self, key: TypeKey) -> &str {
        match key {
            TypeKey::Source(id) => self
                .type_decl(id)
                .map(|t| t.qualified_name.as_str())
                .unwrap_or("<invalid>"),
            TypeKey::Library(id) => self.library.class(id).qualified_name.as_str(),
        }
    }

    /// Declared supertype references of a class-like declaration
    pub fn declared_supers(&self, key: TypeKey) -> Vec<TypeRef> {
        match key {
            TypeKey::Source(id) => {
                let Some(t) = self.type_decl(id) else {
                    return Vec::new();
                };
                let mut supers: Vec<TypeRef> = Vec::new();
                if let Some(sc) = &t.superclass {
                    supers.push(sc.clone());
                }
                supers.extend(t.interfaces.iter().cloned());
                if supers.is_empty() && t.qualified_name != "java.lang.Object" {
                    supers.push(TypeRef::object());
                }
                supers
            }
            TypeKey::Library(id) => {
                let class = self.library.class(id);
                let mut supers: Vec<TypeRef> = Vec::new();
                if let Some(sc) = &class.superclass {
                    supers.push(sc.clone());
                }
                supers.extend(class.interfaces.iter().cloned());
                supers
            }
        }
    }

    /// Type parameter names of a class-like declaration
    pub fn type_param_names(&self, key: TypeKey) -> Vec<String> {
        match key {
            TypeKey::Source(id) => self
                .type_decl(id)
                .map(|t| t.type_params.iter().map(|p| p.name.clone()).collect())
                .unwrap_or_default(),
            TypeKey::Library(id) => self.library.class(id).type_params.clone(),
        }
    }

    /// Callable members of a type, source or library
    pub fn callables_of(&self, key: TypeKey) -> Vec<CallableKey> {
        match key {
            TypeKey::Source(id) => self
                .type_decl(id)
                .map(|t| {
                    t.members
                        .iter()
                        .filter(|m| matches!(self.node(**m), Node::Callable(_)))
                        .map(|m| CallableKey::Source(*m))
                        .collect()
                })
                .unwrap_or_default(),
            TypeKey::Library(id) => {
                let class = self.library.class(id);
                (0..class.members.len() as u32)
                    .map(|index| CallableKey::Library(LibMemberId { class: id, index }))
                    .collect()
            }
        }
    }

    /// Qualified signature of a callable, e.g. `com.x.Foo#bar(int,java.lang.String)`.
    /// Stable across re-arenafication, used as the convergence key between
    /// reduction rounds.
    pub fn callable_signature(&self, id: NodeId) -> Option<String> {
        let c = self.callable(id)?;
        let owner = self.type_decl(c.owner)?;
        let params: Vec<String> = c
            .params
            .iter()
            .filter_map(|p| self.param(*p))
            .map(|p| p.ty.display())
            .collect();
        Some(format!(
            "{}#{}({})",
            owner.qualified_name,
            c.name,
            params.join(",")
        ))
    }

    /// Signatures of every callable that still has a body or declaration in
    /// this program
    pub fn retained_signatures(&self) -> std::collections::BTreeSet<String> {
        self.decl_ids()
            .into_iter()
            .filter_map(|id| self.callable_signature(id))
            .collect()
    }
}
