//! Dalvik type descriptors.
//!
//! A descriptor follows the single-character grammar used throughout dex
//! files: `Z B S C I J F D` for the primitives, `V` for a void return,
//! `Lpkg/Name;` for a class, and one leading `[` per array dimension.
//! [`Type`] is the decoded form of a descriptor; `Display` renders it back
//! out in descriptor syntax.

use crate::errors::{DexError, DexResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `S`
    Short,
    /// `C`
    Char,
    /// `I`
    Int,
    /// `J`; occupies a register pair.
    Long,
    /// `F`
    Float,
    /// `D`; occupies a register pair.
    Double,
    /// `V`; only meaningful as a method return type.
    Void,
    /// `L…;`, carrying the fully qualified class name in slash-separated
    /// form, without the `L`/`;` framing.
    Class(String),
    /// An array: the dimension count (the number of leading `[`) and the
    /// non-array base type. Dex caps dimensions at 255.
    Array(usize, Box<Self>),
}

impl Type {
    /// Builds a class type from a fully qualified class name
    /// (e.g. `java/lang/Object`).
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Builds an array type over the given base type.
    #[must_use]
    pub fn array(dimensions: usize, base: Self) -> Self {
        Self::Array(dimensions, Box::new(base))
    }

    /// Decodes a descriptor string.
    ///
    /// # Errors
    ///
    /// Fails with [`DexError::BadDescriptor`] when the string does not
    /// follow the descriptor grammar (unknown primitive letter, unframed
    /// class name, empty input, `void` array, more than 255 dimensions).
    pub fn parse(descriptor: &str) -> DexResult<Self> {
        let bad = || DexError::BadDescriptor(descriptor.to_string());

        let dimensions = descriptor.bytes().take_while(|b| *b == b'[').count();
        if dimensions > 255 {
            return Err(bad());
        }
        let base = &descriptor[dimensions..];

        let parsed = if let Some(primitive) = Self::primitive_for(base) {
            if primitive == Self::Void && dimensions > 0 {
                return Err(bad());
            }
            primitive
        } else {
            let name = base
                .strip_prefix('L')
                .and_then(|rest| rest.strip_suffix(';'))
                .filter(|name| !name.is_empty())
                .ok_or_else(bad)?;
            Self::Class(name.to_string())
        };

        Ok(if dimensions == 0 {
            parsed
        } else {
            Self::Array(dimensions, Box::new(parsed))
        })
    }

    fn primitive_for(code: &str) -> Option<Self> {
        Some(match code {
            "V" => Self::Void,
            "Z" => Self::Boolean,
            "B" => Self::Byte,
            "S" => Self::Short,
            "C" => Self::Char,
            "I" => Self::Int,
            "J" => Self::Long,
            "F" => Self::Float,
            "D" => Self::Double,
            _ => return None,
        })
    }

    /// The descriptor letter, for primitive (and void) types.
    const fn code(&self) -> Option<char> {
        Some(match self {
            Self::Void => 'V',
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Short => 'S',
            Self::Char => 'C',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
            Self::Class(_) | Self::Array(_, _) => return None,
        })
    }

    const fn java_keyword(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Char => "char",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Class(_) | Self::Array(_, _) => "",
        }
    }

    /// Renders the type the way Java source spells it (`int[]`,
    /// `java.lang.Object`); diagnostics sometimes prefer this over the raw
    /// descriptor the `Display` implementation produces.
    #[must_use]
    pub fn to_java_string(&self) -> String {
        match self {
            Self::Array(dimensions, base) => {
                format!("{}{}", base.to_java_string(), "[]".repeat(*dimensions))
            }
            Self::Class(name) => name.replace('/', "."),
            primitive => primitive.java_keyword().to_string(),
        }
    }

    /// The fully qualified class name, for class types.
    pub fn as_class_name(&self) -> DexResult<&str> {
        match self {
            Self::Class(name) => Ok(name),
            _ => Err(DexError::InvalidType),
        }
    }

    /// Checks whether the type occupies a register pair.
    #[inline]
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }

    /// Checks whether the type is a reference (class or array) type.
    #[inline]
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Class(_) | Self::Array(_, _))
    }

    /// Returns the number of registers a value of this type occupies.
    #[inline]
    #[must_use]
    pub const fn register_count(&self) -> usize {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    /// Returns the number of array dimensions (0 for non-array types).
    #[inline]
    #[must_use]
    pub fn array_dimensions(&self) -> usize {
        match self {
            Self::Array(dimensions, _) => *dimensions,
            _ => 0,
        }
    }

    /// Returns the element type obtained by peeling one array dimension.
    ///
    /// For `[[I` this is `[I`; for `[Ljava/lang/String;` it is
    /// `Ljava/lang/String;`.
    pub fn immediate_element_type(&self) -> DexResult<Self> {
        match self {
            Self::Array(1, base) => Ok(base.as_ref().clone()),
            Self::Array(dimensions, base) => Ok(Self::Array(*dimensions - 1, base.clone())),
            _ => Err(DexError::InvalidType),
        }
    }

    /// Returns the innermost element type of an array type.
    pub fn base_element_type(&self) -> DexResult<&Self> {
        match self {
            Self::Array(_, base) => Ok(base.as_ref()),
            _ => Err(DexError::InvalidType),
        }
    }
}

impl TryFrom<&str> for Type {
    type Error = DexError;

    fn try_from(descriptor: &str) -> DexResult<Self> {
        Self::parse(descriptor)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Array(dimensions, base) => write!(f, "{}{base}", "[".repeat(*dimensions)),
            Self::Class(name) => write!(f, "L{name};"),
            primitive => match primitive.code() {
                Some(code) => write!(f, "{code}"),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parser() {
        assert_eq!(Type::parse("V").unwrap(), Type::Void);
        assert_eq!(Type::parse("I").unwrap(), Type::Int);
        assert_eq!(
            Type::parse("Ljava/lang/Object;").unwrap(),
            Type::class("java/lang/Object")
        );
        assert_eq!(Type::parse("[[J").unwrap(), Type::array(2, Type::Long));
        assert_eq!(
            Type::parse("[Ljava/lang/String;").unwrap(),
            Type::array(1, Type::class("java/lang/String"))
        );
    }

    #[test]
    fn descriptor_parser_rejections() {
        assert!(Type::parse("").is_err());
        assert!(Type::parse("X").is_err());
        assert!(Type::parse("L;").is_err());
        assert!(Type::parse("Ljava/lang/Object").is_err());
        assert!(Type::parse("java/lang/Object;").is_err());
        assert!(Type::parse("[V").is_err());
        assert!(Type::parse("[").is_err());
    }

    #[test]
    fn descriptor_display() {
        assert_eq!(format!("{}", Type::Long), "J");
        assert_eq!(
            format!("{}", Type::array(1, Type::class("java/lang/String"))),
            "[Ljava/lang/String;"
        );
        assert_eq!(format!("{}", Type::array(3, Type::Int)), "[[[I");
    }

    #[test]
    fn java_rendering() {
        assert_eq!(Type::array(1, Type::Int).to_java_string(), "int[]");
        assert_eq!(
            Type::class("java/lang/Object").to_java_string(),
            "java.lang.Object"
        );
        assert_eq!(
            Type::array(2, Type::class("java/lang/String")).to_java_string(),
            "java.lang.String[][]"
        );
    }

    #[test]
    fn array_helpers() {
        let t = Type::parse("[[I").unwrap();
        assert_eq!(t.array_dimensions(), 2);
        assert_eq!(
            t.immediate_element_type().unwrap(),
            Type::array(1, Type::Int)
        );
        assert_eq!(t.base_element_type().unwrap(), &Type::Int);
        assert!(Type::Int.immediate_element_type().is_err());
    }

    #[test]
    fn register_counts() {
        assert_eq!(Type::Long.register_count(), 2);
        assert_eq!(Type::Double.register_count(), 2);
        assert_eq!(Type::Int.register_count(), 1);
        assert_eq!(Type::class("java/lang/Object").register_count(), 1);
    }
}
