//! Abstract register types.
//!
//! Every virtual register holds, at every program point, a value of one of
//! the categories below. The categories form a finite-height lattice:
//! `Unknown` is the bottom, `Conflict` the top of irreconcilable merges, and
//! the sub-integer categories are ordered by the ranges of the literals they
//! can hold (`Boolean ⊑ PosByte ⊑ Byte ⊑ PosShort ⊑ Short ⊑ Integer`, with
//! `Char` joining the chain below `Integer`). Literal `0` is `Null` so that
//! it can merge with reference registers without conflict.

use crate::classpath::{ClassPath, JAVA_LANG_OBJECT};
use crate::errors::{AnalysisError, AnalysisResult};
use dv_dex::errors::DexError;
use dv_dex::types::Type;
use dv_dex::Addr;
use lazy_static::lazy_static;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Category {
    Unknown = 0,
    Uninit = 1,
    Null = 2,
    One = 3,
    Boolean = 4,
    PosByte = 5,
    Byte = 6,
    PosShort = 7,
    Short = 8,
    Char = 9,
    Integer = 10,
    Float = 11,
    LongLo = 12,
    LongHi = 13,
    DoubleLo = 14,
    DoubleHi = 15,
    UninitRef = 16,
    Reference = 17,
    Conflict = 18,
}

impl Category {
    const ALL: [Self; 19] = [
        Self::Unknown,
        Self::Uninit,
        Self::Null,
        Self::One,
        Self::Boolean,
        Self::PosByte,
        Self::Byte,
        Self::PosShort,
        Self::Short,
        Self::Char,
        Self::Integer,
        Self::Float,
        Self::LongLo,
        Self::LongHi,
        Self::DoubleLo,
        Self::DoubleHi,
        Self::UninitRef,
        Self::Reference,
        Self::Conflict,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Uninit => "Uninit",
            Self::Null => "Null",
            Self::One => "One",
            Self::Boolean => "Boolean",
            Self::PosByte => "PosByte",
            Self::Byte => "Byte",
            Self::PosShort => "PosShort",
            Self::Short => "Short",
            Self::Char => "Char",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::LongLo => "LongLo",
            Self::LongHi => "LongHi",
            Self::DoubleLo => "DoubleLo",
            Self::DoubleHi => "DoubleHi",
            Self::UninitRef => "UninitRef",
            Self::Reference => "Reference",
            Self::Conflict => "Conflict",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compact set of [`Category`] values, used for operand checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySet(u32);

impl CategorySet {
    #[must_use]
    pub const fn of(categories: &[Category]) -> Self {
        let mut bits = 0u32;
        let mut i = 0;
        while i < categories.len() {
            bits |= 1 << (categories[i] as u32);
            i += 1;
        }
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, category: Category) -> bool {
        self.0 & (1 << (category as u32)) != 0
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for category in Category::ALL {
            if self.contains(category) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{category}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The categories a 32-bit primitive operand may hold.
pub const PRIMITIVE_32BIT: CategorySet = CategorySet::of(&[
    Category::Null,
    Category::One,
    Category::Boolean,
    Category::PosByte,
    Category::Byte,
    Category::PosShort,
    Category::Short,
    Category::Char,
    Category::Integer,
    Category::Float,
]);

/// The categories a reference operand may hold.
pub const REFERENCE: CategorySet = CategorySet::of(&[Category::Null, Category::Reference]);

/// The categories valid for the low half of a wide register pair.
pub const WIDE_LOW: CategorySet = CategorySet::of(&[Category::LongLo, Category::DoubleLo]);

/// The categories valid for the high half of a wide register pair.
pub const WIDE_HIGH: CategorySet = CategorySet::of(&[Category::LongHi, Category::DoubleHi]);

/// The categories an integral (non-float) 32-bit operand may hold.
pub const INTEGRAL: CategorySet = CategorySet::of(&[
    Category::Null,
    Category::One,
    Category::Boolean,
    Category::PosByte,
    Category::Byte,
    Category::PosShort,
    Category::Short,
    Category::Char,
    Category::Integer,
]);

/// The categories a float operand may hold.
pub const FLOATABLE: CategorySet =
    CategorySet::of(&[Category::Null, Category::One, Category::Float]);

/// An abstract register type: a category, plus the designated class for
/// reference categories.
///
/// Value equality is canonical identity: there is one value per
/// (category, class) pair, except for `UninitRef` where the allocation site
/// keeps distinct `new-instance` results (and the constructor `this`)
/// distinguishable, so that the `<init>` promotion can rewrite exactly the
/// registers holding one given allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterType {
    pub category: Category,
    class: Option<Type>,
    uninit: Option<Addr>,
}

macro_rules! prim_const {
    ( $name:ident, $category:ident ) => {
        pub const $name: RegisterType = RegisterType {
            category: Category::$category,
            class: None,
            uninit: None,
        };
    };
}

impl RegisterType {
    prim_const!(UNKNOWN, Unknown);
    prim_const!(UNINIT, Uninit);
    prim_const!(NULL, Null);
    prim_const!(ONE, One);
    prim_const!(BOOLEAN, Boolean);
    prim_const!(POS_BYTE, PosByte);
    prim_const!(BYTE, Byte);
    prim_const!(POS_SHORT, PosShort);
    prim_const!(SHORT, Short);
    prim_const!(CHAR, Char);
    prim_const!(INTEGER, Integer);
    prim_const!(FLOAT, Float);
    prim_const!(LONG_LO, LongLo);
    prim_const!(LONG_HI, LongHi);
    prim_const!(DOUBLE_LO, DoubleLo);
    prim_const!(DOUBLE_HI, DoubleHi);
    prim_const!(CONFLICT, Conflict);

    /// The canonical value for a primitive (class-less) category.
    #[must_use]
    pub const fn primitive(category: Category) -> Self {
        Self {
            category,
            class: None,
            uninit: None,
        }
    }

    /// An initialized reference to the given class or array type.
    #[must_use]
    pub const fn reference(class: Type) -> Self {
        Self {
            category: Category::Reference,
            class: Some(class),
            uninit: None,
        }
    }

    /// An allocated but not-yet-initialized instance of the given class,
    /// identified by its allocation site.
    #[must_use]
    pub const fn uninitialized(class: Type, site: Addr) -> Self {
        Self {
            category: Category::UninitRef,
            class: Some(class),
            uninit: Some(site),
        }
    }

    /// Classifies a 32-bit-range literal into the most specific category
    /// capable of holding it.
    #[must_use]
    pub const fn for_literal(value: i64) -> Self {
        match value {
            0 => Self::NULL,
            1 => Self::ONE,
            2..=127 => Self::POS_BYTE,
            -128..=-1 => Self::BYTE,
            128..=32767 => Self::POS_SHORT,
            -32768..=-129 => Self::SHORT,
            32768..=65535 => Self::CHAR,
            _ => Self::INTEGER,
        }
    }

    /// Maps a type descriptor to the register type a value of that type
    /// occupies (the low half for wide types).
    pub fn for_type(typ: &Type) -> AnalysisResult<Self> {
        match typ {
            Type::Void => Err(AnalysisError::Dex(DexError::InvalidType)),
            Type::Boolean => Ok(Self::BOOLEAN),
            Type::Byte => Ok(Self::BYTE),
            Type::Short => Ok(Self::SHORT),
            Type::Char => Ok(Self::CHAR),
            Type::Int => Ok(Self::INTEGER),
            Type::Float => Ok(Self::FLOAT),
            Type::Long => Ok(Self::LONG_LO),
            Type::Double => Ok(Self::DOUBLE_LO),
            Type::Class(_) | Type::Array(_, _) => Ok(Self::reference(typ.clone())),
        }
    }

    /// Returns the matching high half for a wide low half.
    #[must_use]
    pub const fn wide_high(&self) -> Self {
        match self.category {
            Category::LongLo => Self::LONG_HI,
            Category::DoubleLo => Self::DOUBLE_HI,
            _ => Self::UNKNOWN,
        }
    }

    #[inline]
    #[must_use]
    pub const fn class(&self) -> Option<&Type> {
        self.class.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn uninit_site(&self) -> Option<Addr> {
        self.uninit
    }

    /// Lattice join.
    pub fn merge(&self, other: &Self, classpath: &ClassPath) -> AnalysisResult<Self> {
        use Category::{Conflict, Null, Reference, UninitRef, Unknown};

        if self == other {
            return Ok(self.clone());
        }
        match (self.category, other.category) {
            (Unknown, _) => Ok(other.clone()),
            (_, Unknown) => Ok(self.clone()),
            (Conflict, _) | (_, Conflict) => Ok(Self::CONFLICT),

            (Null, Reference) => Ok(other.clone()),
            (Reference, Null) => Ok(self.clone()),
            (Reference, Reference) => {
                let a = self.class.as_ref().ok_or_else(|| {
                    AnalysisError::Internal("reference register without a class".to_string())
                })?;
                let b = other.class.as_ref().ok_or_else(|| {
                    AnalysisError::Internal("reference register without a class".to_string())
                })?;
                Ok(Self::reference(common_reference(a, b, classpath)?))
            }

            // Distinct uninitialized instances never merge, and an
            // uninitialized instance never merges with anything else.
            (UninitRef, _) | (_, UninitRef) => Ok(Self::CONFLICT),

            (a, b) => Ok(numeric_lub(a, b).map_or(Self::CONFLICT, Self::primitive)),
        }
    }

    /// Lattice order: whether a value of this type may be used where `dst`
    /// is expected.
    pub fn can_be_assigned_to(&self, dst: &Self, classpath: &ClassPath) -> AnalysisResult<bool> {
        if self == dst {
            return Ok(true);
        }
        Ok(self.merge(dst, classpath)? == *dst)
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "{}({class})", self.category),
            None => write!(f, "{}", self.category),
        }
    }
}

lazy_static! {
    pub static ref JAVA_LANG_STRING: RegisterType =
        RegisterType::reference(Type::class("java/lang/String"));
    pub static ref JAVA_LANG_CLASS: RegisterType =
        RegisterType::reference(Type::class("java/lang/Class"));
    pub static ref JAVA_LANG_THROWABLE: RegisterType =
        RegisterType::reference(Type::class("java/lang/Throwable"));
}

/// Least upper bound of two (distinct) categories within the 32-bit numeric
/// sub-lattice, `None` when either falls outside of it.
fn numeric_lub(a: Category, b: Category) -> Option<Category> {
    use Category::{Boolean, Byte, Char, Float, Integer, Null, One, PosByte, PosShort, Short};

    const fn chain_rank(c: Category) -> Option<u8> {
        match c {
            Null | One => Some(0),
            Boolean => Some(1),
            PosByte => Some(2),
            Byte => Some(3),
            PosShort => Some(4),
            Short => Some(5),
            Integer => Some(6),
            _ => None,
        }
    }

    match (a, b) {
        (Char, x) | (x, Char) => match x {
            // zero, one and the positive sub-integer ranges are all valid
            // character values
            Null | One | Boolean | PosByte | PosShort => Some(Char),
            Byte | Short | Integer => Some(Integer),
            _ => None,
        },
        (Float, x) | (x, Float) => match x {
            Null | One => Some(Float),
            _ => None,
        },
        _ => {
            let (ra, rb) = (chain_rank(a)?, chain_rank(b)?);
            if ra == 0 && rb == 0 {
                // Null ⊔ One
                return Some(Boolean);
            }
            Some(if ra >= rb { a } else { b })
        }
    }
}

/// Whether a value of reference type `src` may be stored where `dst` is
/// expected.
pub(crate) fn reference_assignable(
    src: &Type,
    dst: &Type,
    classpath: &ClassPath,
) -> AnalysisResult<bool> {
    match (src, dst) {
        (Type::Class(a), Type::Class(b)) => classpath.extends_class(a, b),
        (Type::Array(_, _), Type::Class(b)) => Ok(is_array_supertype(b)),
        (Type::Array(n1, b1), Type::Array(n2, b2)) => {
            if n1 == n2 {
                match (b1.as_ref(), b2.as_ref()) {
                    (Type::Class(x), Type::Class(y)) => classpath.extends_class(x, y),
                    (x, y) => Ok(x == y),
                }
            } else {
                Ok(n2 < n1 && matches!(b2.as_ref(), Type::Class(name) if is_array_supertype(name)))
            }
        }
        _ => Ok(false),
    }
}

fn is_array_supertype(name: &str) -> bool {
    name == JAVA_LANG_OBJECT || name == "java/lang/Cloneable" || name == "java/io/Serializable"
}

/// Most specific common supertype of two reference types.
pub(crate) fn common_reference(
    a: &Type,
    b: &Type,
    classpath: &ClassPath,
) -> AnalysisResult<Type> {
    if reference_assignable(a, b, classpath)? {
        return Ok(b.clone());
    }
    if reference_assignable(b, a, classpath)? {
        return Ok(a.clone());
    }
    match (a, b) {
        (Type::Class(x), Type::Class(y)) => {
            Ok(Type::class(classpath.common_superclass(x, y)?))
        }
        (Type::Array(n1, b1), Type::Array(n2, b2)) if n1 == n2 => {
            match (b1.as_ref(), b2.as_ref()) {
                (Type::Class(x), Type::Class(y)) => Ok(Type::array(
                    *n1,
                    Type::class(classpath.common_superclass(x, y)?),
                )),
                // differing primitive bases only share the enclosing
                // dimensions
                _ if *n1 == 1 => Ok(Type::class(JAVA_LANG_OBJECT)),
                _ => Ok(Type::array(*n1 - 1, Type::class(JAVA_LANG_OBJECT))),
            }
        }
        _ => Ok(Type::class(JAVA_LANG_OBJECT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::ClassDef;

    fn classpath() -> ClassPath {
        let mut cp = ClassPath::new();
        cp.insert_class(ClassDef::new("java/lang/Object")).unwrap();
        cp.insert_class(ClassDef::new("java/lang/String")).unwrap();
        cp.insert_class(ClassDef::new("java/util/AbstractList"))
            .unwrap();
        cp.insert_class(ClassDef::new("java/util/ArrayList")).unwrap();
        cp.insert_class(ClassDef::new("java/util/LinkedList"))
            .unwrap();
        cp.insert_extends("java/util/ArrayList", "java/util/AbstractList")
            .unwrap();
        cp.insert_extends("java/util/LinkedList", "java/util/AbstractList")
            .unwrap();
        cp.close();
        cp
    }

    #[test]
    fn literal_classification() {
        assert_eq!(RegisterType::for_literal(0), RegisterType::NULL);
        assert_eq!(RegisterType::for_literal(1), RegisterType::ONE);
        assert_eq!(RegisterType::for_literal(100), RegisterType::POS_BYTE);
        assert_eq!(RegisterType::for_literal(-1), RegisterType::BYTE);
        assert_eq!(RegisterType::for_literal(1000), RegisterType::POS_SHORT);
        assert_eq!(RegisterType::for_literal(-1000), RegisterType::SHORT);
        assert_eq!(RegisterType::for_literal(50_000), RegisterType::CHAR);
        assert_eq!(RegisterType::for_literal(100_000), RegisterType::INTEGER);
        assert_eq!(RegisterType::for_literal(-100_000), RegisterType::INTEGER);
    }

    #[test]
    fn numeric_merges() {
        let cp = classpath();
        let merge = |a: &RegisterType, b: &RegisterType| a.merge(b, &cp).unwrap();

        assert_eq!(merge(&RegisterType::NULL, &RegisterType::ONE), RegisterType::BOOLEAN);
        assert_eq!(merge(&RegisterType::BOOLEAN, &RegisterType::BYTE), RegisterType::BYTE);
        assert_eq!(merge(&RegisterType::BYTE, &RegisterType::CHAR), RegisterType::INTEGER);
        assert_eq!(merge(&RegisterType::POS_BYTE, &RegisterType::CHAR), RegisterType::CHAR);
        assert_eq!(merge(&RegisterType::NULL, &RegisterType::FLOAT), RegisterType::FLOAT);
        assert_eq!(
            merge(&RegisterType::INTEGER, &RegisterType::FLOAT),
            RegisterType::CONFLICT
        );
        assert_eq!(
            merge(&RegisterType::LONG_LO, &RegisterType::DOUBLE_LO),
            RegisterType::CONFLICT
        );
        assert_eq!(merge(&RegisterType::UNKNOWN, &RegisterType::SHORT), RegisterType::SHORT);
    }

    #[test]
    fn reference_merges() {
        let cp = classpath();
        let array_list = RegisterType::reference(Type::class("java/util/ArrayList"));
        let linked_list = RegisterType::reference(Type::class("java/util/LinkedList"));
        let merged = array_list.merge(&linked_list, &cp).unwrap();
        assert_eq!(
            merged,
            RegisterType::reference(Type::class("java/util/AbstractList"))
        );

        assert_eq!(
            RegisterType::NULL.merge(&array_list, &cp).unwrap(),
            array_list
        );
        assert_eq!(
            array_list.merge(&RegisterType::INTEGER, &cp).unwrap(),
            RegisterType::CONFLICT
        );
    }

    #[test]
    fn array_merges() {
        let cp = classpath();
        let int_arr = RegisterType::reference(Type::array(1, Type::Int));
        let float_arr = RegisterType::reference(Type::array(1, Type::Float));
        assert_eq!(
            int_arr.merge(&float_arr, &cp).unwrap(),
            RegisterType::reference(Type::class("java/lang/Object"))
        );

        let a = RegisterType::reference(Type::array(1, Type::class("java/util/ArrayList")));
        let b = RegisterType::reference(Type::array(1, Type::class("java/util/LinkedList")));
        assert_eq!(
            a.merge(&b, &cp).unwrap(),
            RegisterType::reference(Type::array(1, Type::class("java/util/AbstractList")))
        );
    }

    #[test]
    fn uninit_instances_are_distinct() {
        let cp = classpath();
        let t = Type::class("java/lang/String");
        let a = RegisterType::uninitialized(t.clone(), Addr(4));
        let b = RegisterType::uninitialized(t.clone(), Addr(10));
        let c = RegisterType::uninitialized(t, Addr(4));
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.merge(&b, &cp).unwrap(), RegisterType::CONFLICT);
        assert_eq!(a.merge(&c, &cp).unwrap(), a);
    }

    #[test]
    fn assignability() {
        let cp = classpath();
        let object = RegisterType::reference(Type::class("java/lang/Object"));
        let array_list = RegisterType::reference(Type::class("java/util/ArrayList"));

        assert!(array_list.can_be_assigned_to(&object, &cp).unwrap());
        assert!(!object.can_be_assigned_to(&array_list, &cp).unwrap());
        assert!(RegisterType::NULL.can_be_assigned_to(&array_list, &cp).unwrap());
        assert!(RegisterType::BYTE
            .can_be_assigned_to(&RegisterType::INTEGER, &cp)
            .unwrap());
        assert!(!RegisterType::INTEGER
            .can_be_assigned_to(&RegisterType::BYTE, &cp)
            .unwrap());
        assert!(!RegisterType::BYTE
            .can_be_assigned_to(&RegisterType::BOOLEAN, &cp)
            .unwrap());

        let int_arr = RegisterType::reference(Type::array(1, Type::Int));
        assert!(int_arr.can_be_assigned_to(&object, &cp).unwrap());
        assert!(!object.can_be_assigned_to(&int_arr, &cp).unwrap());
    }

    #[test]
    fn category_sets() {
        assert!(PRIMITIVE_32BIT.contains(Category::Null));
        assert!(PRIMITIVE_32BIT.contains(Category::Float));
        assert!(!PRIMITIVE_32BIT.contains(Category::LongLo));
        assert!(REFERENCE.contains(Category::Reference));
        assert!(!REFERENCE.contains(Category::UninitRef));
        assert_eq!(format!("{WIDE_LOW}"), "LongLo, DoubleLo");
    }
}
