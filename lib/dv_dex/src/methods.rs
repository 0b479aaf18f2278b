//! Dalvik methods, prototypes and member references.

use crate::code::CodeItem;
use crate::flags::MethodFlags;
use crate::types::Type;
use std::fmt;

/// A method prototype: return type and declared parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    pub return_type: Type,
    pub parameters: Vec<Type>,
}

impl Prototype {
    #[must_use]
    pub fn new(return_type: Type, parameters: Vec<Type>) -> Self {
        Self {
            return_type,
            parameters,
        }
    }

    /// Returns the number of registers occupied by the declared parameters
    /// (wide parameters occupy two consecutive registers).
    #[must_use]
    pub fn parameter_register_count(&self) -> usize {
        self.parameters.iter().map(Type::register_count).sum()
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for t in &self.parameters {
            write!(f, "{t}")?;
        }
        write!(f, "){}", self.return_type)
    }
}

/// A resolved reference to a method, as carried by invoke instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    /// Type that defined the method.
    /// According to the Dalvik documentation, this must be a class type or an array type.
    pub definer: Type,
    pub name: String,
    pub proto: Prototype,
}

impl MethodRef {
    #[must_use]
    pub fn new(definer: Type, name: impl Into<String>, proto: Prototype) -> Self {
        Self {
            definer,
            name: name.into(),
            proto,
        }
    }

    /// Short signature used for virtual method lookups: `name(PP)R`.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.proto)
    }

    /// Checks whether the referenced method is a class or instance initializer
    /// (its name is bracketed, `<init>` or `<clinit>`).
    #[must_use]
    pub fn is_init(&self) -> bool {
        self.name.starts_with('<')
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}{}", self.definer, self.name, self.proto)
    }
}

/// A resolved reference to a field, as carried by field access instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub definer: Type,
    pub name: String,
    pub ftype: Type,
}

impl FieldRef {
    #[must_use]
    pub fn new(definer: Type, name: impl Into<String>, ftype: Type) -> Self {
        Self {
            definer,
            name: name.into(),
            ftype,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}:{}", self.definer, self.name, self.ftype)
    }
}

/// A decoded method: access flags, identity and (for non-abstract,
/// non-native methods) its code item.
#[derive(Debug, Clone)]
pub struct EncodedMethod {
    pub flags: MethodFlags,
    pub definer: Type,
    pub name: String,
    pub proto: Prototype,
    pub code: Option<CodeItem>,
}

impl EncodedMethod {
    #[must_use]
    pub fn new(
        flags: MethodFlags,
        definer: Type,
        name: impl Into<String>,
        proto: Prototype,
        code: Option<CodeItem>,
    ) -> Self {
        Self {
            flags,
            definer,
            name: name.into(),
            proto,
            code,
        }
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> MethodFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub const fn code(&self) -> Option<&CodeItem> {
        self.code.as_ref()
    }
}

impl fmt::Display for EncodedMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}{}", self.definer, self.name, self.proto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototype_register_count() {
        let proto = Prototype::new(Type::Void, vec![Type::Int, Type::Long, Type::Double]);
        assert_eq!(proto.parameter_register_count(), 5);
        assert_eq!(format!("{proto}"), "(IJD)V");
    }

    #[test]
    fn method_signature() {
        let m = MethodRef::new(
            Type::class("java/lang/Object"),
            "equals",
            Prototype::new(Type::Boolean, vec![Type::class("java/lang/Object")]),
        );
        assert_eq!(m.signature(), "equals(Ljava/lang/Object;)Z");
        assert!(!m.is_init());
        assert!(MethodRef::new(
            Type::class("java/lang/Object"),
            "<init>",
            Prototype::new(Type::Void, vec![]),
        )
        .is_init());
    }
}
