// Program construction - the surface the external parser (and tests) drive
#![allow(dead_code)]

use std::path::PathBuf;

use super::decl::{
    CallableDecl, CompilationUnit, EnumConstantDecl, FieldDecl, ImportDecl, InitializerDecl,
    Location, Modifiers, ParamDecl, TypeDecl, TypeKind, Visibility,
};
use super::expr::Expr;
use super::library::Library;
use super::stmt::Stmt;
use super::typeref::TypeRef;
use super::{Node, NodeId, Program};

/// Builds a `Program` arena node by node. Nodes are appended once and
/// wired through ids; `finish()` seals the arena and builds the indexes.
#[derive(Debug)]
pub struct ProgramBuilder {
    nodes: Vec<Node>,
    units: Vec<NodeId>,
    library: Library,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            units: Vec::new(),
            library: Library::with_jdk_core(),
        }
    }

    pub fn with_library(library: Library) -> Self {
        Self {
            nodes: Vec::new(),
            units: Vec::new(),
            library,
        }
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn add_unit(&mut self, path: impl Into<PathBuf>, package: Option<&str>) -> NodeId {
        let id = self.push(Node::Unit(CompilationUnit {
            path: path.into(),
            package: package.map(str::to_string),
            imports: Vec::new(),
            types: Vec::new(),
        }));
        self.units.push(id);
        id
    }

    pub fn add_import(&mut self, unit: NodeId, path: &str, is_static: bool, on_demand: bool) -> NodeId {
        let location = self.unit_location(unit);
        let id = self.push(Node::Import(ImportDecl {
            path: path.to_string(),
            is_static,
            on_demand,
            unit,
            location,
        }));
        if let Node::Unit(u) = &mut self.nodes[unit.0 as usize] {
            u.imports.push(id);
        }
        id
    }

    /// Add a class-like declaration; `parent` is the enclosing type for
    /// nested declarations
    pub fn add_type(&mut self, unit: NodeId, parent: Option<NodeId>, name: &str, kind: TypeKind) -> NodeId {
        let qualified_name = self.qualify(unit, parent, name);
        let location = self.unit_location(unit);
        let id = self.push(Node::Type(TypeDecl {
            name: name.to_string(),
            qualified_name,
            kind,
            modifiers: Modifiers::default(),
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            unit,
            parent,
            location,
        }));
        match parent {
            Some(p) => {
                if let Node::Type(t) = &mut self.nodes[p.0 as usize] {
                    t.members.push(id);
                }
            }
            None => {
                if let Node::Unit(u) = &mut self.nodes[unit.0 as usize] {
                    u.types.push(id);
                }
            }
        }
        id
    }

    pub fn add_class(&mut self, unit: NodeId, parent: Option<NodeId>, name: &str) -> NodeId {
        self.add_type(unit, parent, name, TypeKind::Class)
    }

    pub fn add_interface(&mut self, unit: NodeId, parent: Option<NodeId>, name: &str) -> NodeId {
        self.add_type(unit, parent, name, TypeKind::Interface)
    }

    pub fn add_enum(&mut self, unit: NodeId, parent: Option<NodeId>, name: &str) -> NodeId {
        self.add_type(unit, parent, name, TypeKind::Enum)
    }

    pub fn add_method(&mut self, owner: NodeId, name: &str, return_type: TypeRef) -> NodeId {
        let location = self.owner_location(owner);
        let id = self.push(Node::Callable(CallableDecl {
            name: name.to_string(),
            is_constructor: false,
            modifiers: Modifiers::default(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type,
            throws: Vec::new(),
            body: None,
            owner,
            location,
        }));
        self.attach_member(owner, id);
        id
    }

    pub fn add_ctor(&mut self, owner: NodeId) -> NodeId {
        let location = self.owner_location(owner);
        let id = self.push(Node::Callable(CallableDecl {
            name: "<init>".to_string(),
            is_constructor: true,
            modifiers: Modifiers::default(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: TypeRef::Void,
            throws: Vec::new(),
            body: None,
            owner,
            location,
        }));
        self.attach_member(owner, id);
        id
    }

    pub fn add_param(&mut self, callable: NodeId, name: &str, ty: TypeRef) -> NodeId {
        let location = self.owner_location(callable);
        let id = self.push(Node::Param(ParamDecl {
            name: name.to_string(),
            ty,
            varargs: false,
            owner: callable,
            location,
        }));
        if let Node::Callable(c) = &mut self.nodes[callable.0 as usize] {
            c.params.push(id);
        }
        id
    }

    pub fn add_field(&mut self, owner: NodeId, name: &str, ty: TypeRef) -> NodeId {
        let location = self.owner_location(owner);
        let id = self.push(Node::Field(FieldDecl {
            name: name.to_string(),
            ty,
            modifiers: Modifiers::default(),
            initializer: None,
            owner,
            location,
        }));
        self.attach_member(owner, id);
        id
    }

    pub fn add_enum_constant(&mut self, owner: NodeId, name: &str, args: Vec<Expr>) -> NodeId {
        let location = self.owner_location(owner);
        let id = self.push(Node::EnumConstant(EnumConstantDecl {
            name: name.to_string(),
            args,
            body_members: Vec::new(),
            owner,
            location,
        }));
        self.attach_member(owner, id);
        id
    }

    pub fn add_initializer(&mut self, owner: NodeId, is_static: bool, body: Vec<NodeId>) -> NodeId {
        let location = self.owner_location(owner);
        let block = self.add_stmt(Stmt::Block(body));
        let id = self.push(Node::Initializer(InitializerDecl {
            is_static,
            body: block,
            owner,
            location,
        }));
        self.attach_member(owner, id);
        id
    }

    pub fn add_stmt(&mut self, stmt: Stmt) -> NodeId {
        self.push(Node::Stmt(stmt))
    }

    /// Wrap statements in a block and install it as the callable's body
    pub fn set_body(&mut self, callable: NodeId, stmts: Vec<NodeId>) {
        let block = self.add_stmt(Stmt::Block(stmts));
        if let Node::Callable(c) = &mut self.nodes[callable.0 as usize] {
            c.body = Some(block);
        }
    }

    // Mutation accessors for fleshing out declarations after creation

    pub fn type_mut(&mut self, id: NodeId) -> &mut TypeDecl {
        match &mut self.nodes[id.0 as usize] {
            Node::Type(t) => t,
            other => panic!("expected type declaration, found {}", other.kind_name()),
        }
    }

    pub fn callable_mut(&mut self, id: NodeId) -> &mut CallableDecl {
        match &mut self.nodes[id.0 as usize] {
            Node::Callable(c) => c,
            other => panic!("expected callable, found {}", other.kind_name()),
        }
    }

    pub fn field_mut(&mut self, id: NodeId) -> &mut FieldDecl {
        match &mut self.nodes[id.0 as usize] {
            Node::Field(f) => f,
            other => panic!("expected field, found {}", other.kind_name()),
        }
    }

    pub fn param_mut(&mut self, id: NodeId) -> &mut ParamDecl {
        match &mut self.nodes[id.0 as usize] {
            Node::Param(p) => p,
            other => panic!("expected parameter, found {}", other.kind_name()),
        }
    }

    pub fn enum_constant_mut(&mut self, id: NodeId) -> &mut EnumConstantDecl {
        match &mut self.nodes[id.0 as usize] {
            Node::EnumConstant(e) => e,
            other => panic!("expected enum constant, found {}", other.kind_name()),
        }
    }

    pub fn set_visibility(&mut self, id: NodeId, visibility: Visibility) {
        match &mut self.nodes[id.0 as usize] {
            Node::Type(t) => t.modifiers.visibility = visibility,
            Node::Callable(c) => c.modifiers.visibility = visibility,
            Node::Field(f) => f.modifiers.visibility = visibility,
            _ => {}
        }
    }

    pub fn set_location(&mut self, id: NodeId, line: usize, column: usize) {
        let file = self
            .node_unit(id)
            .and_then(|u| match &self.nodes[u.0 as usize] {
                Node::Unit(unit) => Some(unit.path.clone()),
                _ => None,
            })
            .unwrap_or_default();
        let location = Location::new(file, line, column);
        match &mut self.nodes[id.0 as usize] {
            Node::Import(i) => i.location = location,
            Node::Type(t) => t.location = location,
            Node::Callable(c) => c.location = location,
            Node::Field(f) => f.location = location,
            Node::EnumConstant(e) => e.location = location,
            Node::Initializer(i) => i.location = location,
            Node::Param(p) => p.location = location,
            _ => {}
        }
    }

    pub fn finish(self) -> Program {
        Program::from_parts(self.nodes, self.units, self.library)
    }

    fn attach_member(&mut self, owner: NodeId, member: NodeId) {
        match &mut self.nodes[owner.0 as usize] {
            Node::Type(t) => t.members.push(member),
            Node::EnumConstant(e) => e.body_members.push(member),
            other => panic!("cannot attach member to {}", other.kind_name()),
        }
    }

    fn qualify(&self, unit: NodeId, parent: Option<NodeId>, name: &str) -> String {
        if let Some(p) = parent {
            if let Node::Type(t) = &self.nodes[p.0 as usize] {
                return format!("{}.{}", t.qualified_name, name);
            }
        }
        match &self.nodes[unit.0 as usize] {
            Node::Unit(u) => match &u.package {
                Some(pkg) => format!("{}.{}", pkg, name),
                None => name.to_string(),
            },
            _ => name.to_string(),
        }
    }

    fn unit_location(&self, unit: NodeId) -> Location {
        match &self.nodes[unit.0 as usize] {
            Node::Unit(u) => Location::new(u.path.clone(), 0, 0),
            _ => Location::default(),
        }
    }

    fn owner_location(&self, owner: NodeId) -> Location {
        match &self.nodes[owner.0 as usize] {
            Node::Type(t) => t.location.clone(),
            Node::Callable(c) => c.location.clone(),
            Node::EnumConstant(e) => e.location.clone(),
            _ => Location::default(),
        }
    }

    fn node_unit(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id.0 as usize] {
            Node::Unit(_) => Some(id),
            Node::Import(i) => Some(i.unit),
            Node::Type(t) => Some(t.unit),
            Node::Callable(c) => self.node_unit(c.owner),
            Node::Field(f) => self.node_unit(f.owner),
            Node::EnumConstant(e) => self.node_unit(e.owner),
            Node::Initializer(i) => self.node_unit(i.owner),
            Node::Param(p) => self.node_unit(p.owner),
            Node::Stmt(_) => None,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
