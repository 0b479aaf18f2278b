//! Class hierarchy oracle.
//!
//! The verifier resolves type descriptors and answers subtyping questions
//! through a [`ClassPath`]: a directed graph of class definitions linked by
//! `extends` and `implements` edges. The classpath is populated with every
//! class the analyzed code may reference (application and system classes
//! alike), then closed; it is read-only during verification.

use crate::errors::{AnalysisError, AnalysisResult};
use dv_dex::types::Type;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use std::collections::{BTreeMap, BTreeSet};

pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";

/// The two link kinds of the hierarchy graph.
#[derive(Debug, PartialEq, Eq)]
pub enum Inheritance {
    Extends,
    Implements,
}

/// A class known to the classpath.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassDef {
    name: String,
    is_interface: bool,
    defined: bool,
    virtual_methods: BTreeSet<String>,
}

impl ClassDef {
    /// A concrete class definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_interface: false,
            defined: true,
            virtual_methods: BTreeSet::new(),
        }
    }

    /// An interface definition.
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_interface: true,
            ..Self::new(name)
        }
    }

    /// A placeholder for a class that is referenced but whose definition has
    /// not been registered.
    fn stub(name: impl Into<String>) -> Self {
        Self {
            defined: false,
            ..Self::new(name)
        }
    }

    /// Declares a virtual method, identified by its short signature
    /// `name(PP)R`.
    #[must_use]
    pub fn with_virtual_method(mut self, signature: impl Into<String>) -> Self {
        self.virtual_methods.insert(signature.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.is_interface
    }

    #[inline]
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.defined
    }

    #[must_use]
    pub fn declares_virtual_method(&self, signature: &str) -> bool {
        self.virtual_methods.contains(signature)
    }
}

#[derive(Debug, Default)]
pub struct ClassPath {
    inner: DiGraph<ClassDef, Inheritance>,
    node_ids: BTreeMap<String, NodeIndex>,
}

impl ClassPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_class(&mut self, class: ClassDef) -> AnalysisResult<()> {
        if let Some(id) = self.node_ids.get(class.name()) {
            if self.inner[*id].is_defined() {
                return Err(AnalysisError::Internal(format!(
                    "class '{}' has already been registered",
                    class.name()
                )));
            }
            // The class was referenced before its definition was registered:
            // replace the stub, keeping its hierarchy links.
            self.inner[*id] = class;
            return Ok(());
        }
        let id = self.inner.add_node(class);
        self.node_ids
            .insert(self.inner[id].name().to_string(), id);
        Ok(())
    }

    pub fn insert_extends(&mut self, class: &str, superclass: &str) -> AnalysisResult<()> {
        self.insert_link(class, superclass, Inheritance::Extends)
    }

    pub fn insert_implements(&mut self, class: &str, interface: &str) -> AnalysisResult<()> {
        self.insert_link(class, interface, Inheritance::Implements)
    }

    fn insert_link(&mut self, from: &str, to: &str, link: Inheritance) -> AnalysisResult<()> {
        let src = self.id_or_stub(from);
        let dst = self.id_or_stub(to);
        self.inner.add_edge(src, dst, link);
        Ok(())
    }

    fn id_or_stub(&mut self, name: &str) -> NodeIndex {
        if let Some(id) = self.node_ids.get(name) {
            return *id;
        }
        let id = self.inner.add_node(ClassDef::stub(name));
        self.node_ids.insert(name.to_string(), id);
        id
    }

    /// Closes the hierarchy: ensures `java/lang/Object` exists and gives
    /// every class without a declared supertype an `extends` link to it.
    pub fn close(&mut self) {
        let root = self.id_or_stub(JAVA_LANG_OBJECT);
        let orphans: Vec<NodeIndex> = self
            .inner
            .node_indices()
            .filter(|id| *id != root && self.inner.edges(*id).next().is_none())
            .collect();
        for id in orphans {
            log::warn!(
                "class {} declares no supertype, rooting it at {JAVA_LANG_OBJECT}",
                self.inner[id].name()
            );
            self.inner.add_edge(id, root, Inheritance::Extends);
        }
    }

    #[must_use]
    pub fn contains_class(&self, class_name: &str) -> bool {
        self.node_ids.contains_key(class_name)
    }

    #[must_use]
    pub fn get_class(&self, class_name: &str) -> Option<&ClassDef> {
        self.node_ids.get(class_name).map(|id| &self.inner[*id])
    }

    pub fn iter_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.inner.node_weights()
    }

    fn class(&self, class_name: &str) -> AnalysisResult<&ClassDef> {
        self.get_class(class_name)
            .ok_or_else(|| AnalysisError::ClassNotFound(class_name.to_string()))
    }

    /// Checks that the given descriptor designates a known type: primitives
    /// always resolve, arrays resolve through their base element, and class
    /// types must have been registered.
    pub fn resolve(&self, typ: &Type) -> AnalysisResult<()> {
        match typ {
            Type::Class(name) => self.class(name).map(|_| ()),
            Type::Array(_, base) => self.resolve(base),
            _ => Ok(()),
        }
    }

    pub fn is_interface(&self, class_name: &str) -> AnalysisResult<bool> {
        Ok(self.class(class_name)?.is_interface())
    }

    /// Returns the direct superclass name, if any.
    pub fn superclass(&self, class_name: &str) -> AnalysisResult<Option<&str>> {
        let id = self
            .node_ids
            .get(class_name)
            .ok_or_else(|| AnalysisError::ClassNotFound(class_name.to_string()))?;
        Ok(self
            .inner
            .edges(*id)
            .find(|edge| *edge.weight() == Inheritance::Extends)
            .map(|edge| self.inner[edge.target()].name()))
    }

    /// Checks whether `sub` is typeable as `sup`, following both `extends`
    /// and `implements` links. Every class is typeable as itself and as
    /// `java/lang/Object`.
    pub fn extends_class(&self, sub: &str, sup: &str) -> AnalysisResult<bool> {
        if sub == sup || sup == JAVA_LANG_OBJECT {
            return Ok(true);
        }
        self.class(sup)?;
        let start = self
            .node_ids
            .get(sub)
            .ok_or_else(|| AnalysisError::ClassNotFound(sub.to_string()))?;
        let mut walk = Dfs::new(&self.inner, *start);
        while let Some(id) = walk.next(&self.inner) {
            if self.inner[id].name() == sup {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Checks whether the class, or any type it inherits from, declares
    /// the given virtual method.
    pub fn has_virtual_method(&self, class_name: &str, signature: &str) -> AnalysisResult<bool> {
        let start = self
            .node_ids
            .get(class_name)
            .ok_or_else(|| AnalysisError::ClassNotFound(class_name.to_string()))?;
        let mut walk = Dfs::new(&self.inner, *start);
        while let Some(id) = walk.next(&self.inner) {
            if self.inner[id].declares_virtual_method(signature) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns the name of the most specific class both arguments are
    /// typeable as. Interface operands widen to `java/lang/Object` unless
    /// one is typeable as the other.
    pub fn common_superclass(&self, a: &str, b: &str) -> AnalysisResult<String> {
        if self.extends_class(a, b)? {
            return Ok(b.to_string());
        }
        if self.extends_class(b, a)? {
            return Ok(a.to_string());
        }
        if self.is_interface(a)? || self.is_interface(b)? {
            return Ok(JAVA_LANG_OBJECT.to_string());
        }
        let mut current = self.superclass(a)?.map(str::to_string);
        while let Some(candidate) = current {
            if self.extends_class(b, &candidate)? {
                return Ok(candidate);
            }
            current = self.superclass(&candidate)?.map(str::to_string);
        }
        Ok(JAVA_LANG_OBJECT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassPath {
        let mut cp = ClassPath::new();
        cp.insert_class(ClassDef::new("java/lang/Object")).unwrap();
        cp.insert_class(ClassDef::new("java/util/AbstractList"))
            .unwrap();
        cp.insert_class(ClassDef::new("java/util/ArrayList")).unwrap();
        cp.insert_class(ClassDef::new("java/util/LinkedList"))
            .unwrap();
        cp.insert_class(ClassDef::interface("java/util/List")).unwrap();
        cp.insert_extends("java/util/AbstractList", "java/lang/Object")
            .unwrap();
        cp.insert_extends("java/util/ArrayList", "java/util/AbstractList")
            .unwrap();
        cp.insert_extends("java/util/LinkedList", "java/util/AbstractList")
            .unwrap();
        cp.insert_implements("java/util/ArrayList", "java/util/List")
            .unwrap();
        cp.insert_implements("java/util/LinkedList", "java/util/List")
            .unwrap();
        cp.close();
        cp
    }

    #[test]
    fn extends_queries() {
        let cp = sample();
        assert!(cp
            .extends_class("java/util/ArrayList", "java/util/AbstractList")
            .unwrap());
        assert!(cp
            .extends_class("java/util/ArrayList", "java/util/List")
            .unwrap());
        assert!(cp
            .extends_class("java/util/ArrayList", "java/lang/Object")
            .unwrap());
        assert!(!cp
            .extends_class("java/util/AbstractList", "java/util/ArrayList")
            .unwrap());
        assert!(cp.extends_class("java/util/List", "java/util/List").unwrap());
        assert!(cp.extends_class("missing", "java/lang/Object").unwrap());
        assert!(cp.extends_class("java/util/List", "missing").is_err());
    }

    #[test]
    fn common_superclass_queries() {
        let cp = sample();
        assert_eq!(
            cp.common_superclass("java/util/ArrayList", "java/util/LinkedList")
                .unwrap(),
            "java/util/AbstractList"
        );
        assert_eq!(
            cp.common_superclass("java/util/ArrayList", "java/util/AbstractList")
                .unwrap(),
            "java/util/AbstractList"
        );
        assert_eq!(
            cp.common_superclass("java/util/List", "java/util/AbstractList")
                .unwrap(),
            "java/lang/Object"
        );
        assert_eq!(
            cp.common_superclass("java/util/ArrayList", "java/util/List")
                .unwrap(),
            "java/util/List"
        );
    }

    #[test]
    fn close_roots_orphans() {
        let mut cp = ClassPath::new();
        cp.insert_class(ClassDef::new("com/example/Orphan")).unwrap();
        cp.close();
        assert!(cp.contains_class(JAVA_LANG_OBJECT));
        assert!(cp
            .extends_class("com/example/Orphan", JAVA_LANG_OBJECT)
            .unwrap());
        assert_eq!(
            cp.superclass("com/example/Orphan").unwrap(),
            Some(JAVA_LANG_OBJECT)
        );
    }

    #[test]
    fn virtual_method_lookup() {
        let mut cp = ClassPath::new();
        cp.insert_class(
            ClassDef::new("java/lang/Object").with_virtual_method("toString()Ljava/lang/String;"),
        )
        .unwrap();
        cp.insert_class(ClassDef::new("com/example/A")).unwrap();
        cp.insert_extends("com/example/A", "java/lang/Object").unwrap();
        cp.close();
        assert!(cp
            .has_virtual_method("com/example/A", "toString()Ljava/lang/String;")
            .unwrap());
        assert!(!cp.has_virtual_method("com/example/A", "clone()V").unwrap());
    }
}
