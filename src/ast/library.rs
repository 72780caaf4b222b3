// Library (classpath) declarations - external classes with no AST
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::decl::{TypeKind, Visibility};
use super::typeref::TypeRef;

/// Identifier for a library class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibClassId(pub u32);

/// Identifier for a library constructor or method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibMemberId {
    pub class: LibClassId,
    pub index: u32,
}

/// A constructor or method on a library class. Parameter and return types
/// use syntactic references resolved against the same library table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibCallable {
    /// `<init>` for constructors
    pub name: String,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_static: bool,
    pub params: Vec<TypeRef>,
    pub varargs: bool,
    pub return_type: TypeRef,
    pub throws: Vec<TypeRef>,
    /// Type parameter names declared on the callable itself
    pub type_params: Vec<String>,
}

impl LibCallable {
    pub fn ctor(params: Vec<TypeRef>) -> Self {
        Self {
            name: "<init>".to_string(),
            visibility: Visibility::Public,
            is_abstract: false,
            is_static: false,
            params,
            varargs: false,
            return_type: TypeRef::Void,
            throws: Vec::new(),
            type_params: Vec::new(),
        }
    }

    pub fn method(name: &str, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_abstract: false,
            is_static: false,
            params,
            varargs: false,
            return_type,
            throws: Vec::new(),
            type_params: Vec::new(),
        }
    }

    pub fn abstract_method(name: &str, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        let mut m = Self::method(name, params, return_type);
        m.is_abstract = true;
        m
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

/// A library class: qualified name, supertypes, and member signatures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibClass {
    pub qualified_name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    pub type_params: Vec<String>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub members: Vec<LibCallable>,
}

impl LibClass {
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn ctors(&self) -> impl Iterator<Item = (usize, &LibCallable)> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_constructor())
    }
}

/// Table of classpath declarations visible to resolution. Pre-seeded with
/// the JDK core the engine itself depends on; the classpath layer extends
/// it with whatever the analyzed program links against.
#[derive(Debug, Clone)]
pub struct Library {
    classes: Vec<LibClass>,
    by_qualified: HashMap<String, LibClassId>,
    by_simple: HashMap<String, Vec<LibClassId>>,
}

impl Library {
    pub fn empty() -> Self {
        Self {
            classes: Vec::new(),
            by_qualified: HashMap::new(),
            by_simple: HashMap::new(),
        }
    }

    /// Library with the minimal JDK core: Object, String, the Throwable
    /// hierarchy, and boxed primitives
    pub fn with_jdk_core() -> Self {
        let mut lib = Self::empty();

        lib.add_class(LibClass {
            qualified_name: "java.lang.Object".to_string(),
            kind: TypeKind::Class,
            is_abstract: false,
            type_params: vec![],
            superclass: None,
            interfaces: vec![],
            members: vec![
                LibCallable::ctor(vec![]),
                LibCallable::method("equals", vec![TypeRef::object()], TypeRef::boolean()),
                LibCallable::method("hashCode", vec![], TypeRef::int()),
                LibCallable::method("toString", vec![], TypeRef::string()),
            ],
        });

        lib.add_class(LibClass {
            qualified_name: "java.lang.String".to_string(),
            kind: TypeKind::Class,
            is_abstract: false,
            type_params: vec![],
            superclass: Some(TypeRef::object()),
            interfaces: vec![TypeRef::named_with(
                "java.lang.Comparable",
                vec![TypeRef::string()],
            )],
            members: vec![
                LibCallable::ctor(vec![]),
                LibCallable::ctor(vec![TypeRef::string()]),
                LibCallable::method("length", vec![], TypeRef::int()),
                LibCallable::method("isEmpty", vec![], TypeRef::boolean()),
            ],
        });

        lib.add_class(LibClass {
            qualified_name: "java.lang.Comparable".to_string(),
            kind: TypeKind::Interface,
            is_abstract: true,
            type_params: vec!["T".to_string()],
            superclass: None,
            interfaces: vec![],
            members: vec![LibCallable::abstract_method(
                "compareTo",
                vec![TypeRef::named("T")],
                TypeRef::int(),
            )],
        });

        // Throwable hierarchy, needed by catch-clause pruning and marker throws
        for (name, superclass) in [
            ("java.lang.Throwable", None),
            ("java.lang.Exception", Some("java.lang.Throwable")),
            ("java.lang.RuntimeException", Some("java.lang.Exception")),
            ("java.lang.Error", Some("java.lang.Throwable")),
            ("java.lang.AssertionError", Some("java.lang.Error")),
            ("java.lang.IllegalStateException", Some("java.lang.RuntimeException")),
        ] {
            lib.add_class(LibClass {
                qualified_name: name.to_string(),
                kind: TypeKind::Class,
                is_abstract: false,
                type_params: vec![],
                superclass: superclass.map(TypeRef::named).or(Some(TypeRef::object())),
                interfaces: vec![],
                members: vec![
                    LibCallable::ctor(vec![]),
                    LibCallable::ctor(vec![TypeRef::string()]),
                    LibCallable::method("getMessage", vec![], TypeRef::string()),
                ],
            });
        }

        for kind in [
            super::typeref::PrimitiveKind::Boolean,
            super::typeref::PrimitiveKind::Byte,
            super::typeref::PrimitiveKind::Short,
            super::typeref::PrimitiveKind::Char,
            super::typeref::PrimitiveKind::Int,
            super::typeref::PrimitiveKind::Long,
            super::typeref::PrimitiveKind::Float,
            super::typeref::PrimitiveKind::Double,
        ] {
            lib.add_class(LibClass {
                qualified_name: kind.boxed_name().to_string(),
                kind: TypeKind::Class,
                is_abstract: false,
                type_params: vec![],
                superclass: Some(TypeRef::object()),
                interfaces: vec![],
                members: vec![],
            });
        }

        lib
    }

    pub fn add_class(&mut self, class: LibClass) -> LibClassId {
        let id = LibClassId(self.classes.len() as u32);
        self.by_qualified.insert(class.qualified_name.clone(), id);
        self.by_simple
            .entry(class.simple_name().to_string())
            .or_default()
            .push(id);
        self.classes.push(class);
        id
    }

    pub fn class(&self, id: LibClassId) -> &LibClass {
        &self.classes[id.0 as usize]
    }

    pub fn member(&self, id: LibMemberId) -> &LibCallable {
        &self.class(id.class).members[id.index as usize]
    }

    pub fn find(&self, qualified_name: &str) -> Option<LibClassId> {
        self.by_qualified.get(qualified_name).copied()
    }

    /// Find by simple name; `None` when absent or ambiguous
    pub fn find_simple(&self, simple_name: &str) -> Option<LibClassId> {
        match self.by_simple.get(simple_name) {
            Some(ids) if ids.len() == 1 => Some(ids[0]),
            _ => None,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = (LibClassId, &LibClass)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (LibClassId(i as u32), c))
    }

    /// Whether a class is an unchecked exception (RuntimeException or Error
    /// subtype, JLS 11.1)
    pub fn is_unchecked_exception(&self, id: LibClassId) -> bool {
        self.is_subclass_of(id, "java.lang.RuntimeException")
            || self.is_subclass_of(id, "java.lang.Error")
    }

    pub fn is_subclass_of(&self, id: LibClassId, ancestor: &str) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            let class = self.class(cid);
            if class.qualified_name == ancestor {
                return true;
            }
            current = class
                .superclass
                .as_ref()
                .and_then(|s| match s {
                    TypeRef::Named { name, .. } => self.find(name),
                    _ => None,
                });
        }
        false
    }
}
