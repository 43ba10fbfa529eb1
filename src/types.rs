//! Type representation and layout
//!
//! This module defines [`Ty`], the tagged type tree used throughout the
//! interpreter, and the two layout computations that everything else leans
//! on:
//!
//! - `size`/`align`: structural size and alignment of any type
//! - [`struct_layout`]: sequential field placement with padding
//!
//! # Sizes
//!
//! Sizes are fixed and platform-independent:
//! - `char`: 1 byte, `short`: 2, `int`: 4, `long`: 8 (all signed)
//! - `_Bool`: 1 byte, storing exactly 0 or 1
//! - pointers: 8 bytes regardless of pointee
//! - arrays: element size times length
//! - structs: padded per [`struct_layout`]
//!
//! Struct types are laid out once, when the definition is parsed, and the
//! computed offsets, size, and alignment are cached on the [`StructType`]
//! value itself.

use std::fmt;
use std::rc::Rc;

/// A C type. Cheap to clone: composite types share their interior via `Rc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ty {
    pub kind: TyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TyKind {
    Void,
    /// `_Bool`: 1 byte wide, but stores are truncated to 0 or 1.
    Bool,
    /// Sized integer: width is 1, 2, 4, or 8 bytes.
    Scalar { width: usize, signed: bool },
    Ptr { base: Rc<Ty> },
    Array { elem: Rc<Ty>, len: usize },
    Struct(Rc<StructType>),
    Func(Rc<FuncType>),
}

/// A struct definition with precomputed field offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub fields: Vec<Field>,
    pub size: usize,
    pub align: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub offset: usize,
}

/// A function signature. `params` is `None` for unspecified-parameter
/// declarations like `int printf();`, whose calls are arity-unchecked.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub params: Option<Vec<Ty>>,
    pub ret: Ty,
}

impl Ty {
    pub fn void() -> Ty {
        Ty { kind: TyKind::Void }
    }

    pub fn bool() -> Ty {
        Ty { kind: TyKind::Bool }
    }

    pub fn char() -> Ty {
        Ty::scalar(1, true)
    }

    pub fn short() -> Ty {
        Ty::scalar(2, true)
    }

    pub fn int() -> Ty {
        Ty::scalar(4, true)
    }

    pub fn long() -> Ty {
        Ty::scalar(8, true)
    }

    pub fn scalar(width: usize, signed: bool) -> Ty {
        Ty {
            kind: TyKind::Scalar { width, signed },
        }
    }

    pub fn ptr_to(base: Ty) -> Ty {
        Ty {
            kind: TyKind::Ptr {
                base: Rc::new(base),
            },
        }
    }

    pub fn array_of(elem: Ty, len: usize) -> Ty {
        Ty {
            kind: TyKind::Array {
                elem: Rc::new(elem),
                len,
            },
        }
    }

    pub fn func(params: Option<Vec<Ty>>, ret: Ty) -> Ty {
        Ty {
            kind: TyKind::Func(Rc::new(FuncType { params, ret })),
        }
    }

    /// Size of a value of this type in bytes.
    pub fn size(&self) -> usize {
        match &self.kind {
            TyKind::Void => 1,
            TyKind::Bool => 1,
            TyKind::Scalar { width, .. } => *width,
            TyKind::Ptr { .. } => 8,
            TyKind::Array { elem, len } => elem.size() * len,
            TyKind::Struct(s) => s.size,
            TyKind::Func(_) => 8,
        }
    }

    /// Alignment requirement of this type in bytes.
    pub fn align(&self) -> usize {
        match &self.kind {
            TyKind::Void => 1,
            TyKind::Bool => 1,
            TyKind::Scalar { width, .. } => *width,
            TyKind::Ptr { .. } => 8,
            TyKind::Array { elem, .. } => elem.align(),
            TyKind::Struct(s) => s.align,
            TyKind::Func(_) => 8,
        }
    }

    /// True for the types that participate in integer arithmetic.
    pub fn is_integer(&self) -> bool {
        matches!(self.kind, TyKind::Bool | TyKind::Scalar { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, TyKind::Ptr { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TyKind::Array { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TyKind::Struct(_))
    }

    /// The type `*self` yields, if this is a pointer.
    pub fn pointee(&self) -> Option<&Ty> {
        match &self.kind {
            TyKind::Ptr { base } => Some(base),
            _ => None,
        }
    }

    /// Array-to-pointer decay: `T[n]` becomes `T*`, everything else is
    /// unchanged. Applied whenever an array is read as a value.
    pub fn decay(&self) -> Ty {
        match &self.kind {
            TyKind::Array { elem, .. } => Ty::ptr_to(elem.as_ref().clone()),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TyKind::Void => write!(f, "void"),
            TyKind::Bool => write!(f, "_Bool"),
            TyKind::Scalar { width, .. } => match width {
                1 => write!(f, "char"),
                2 => write!(f, "short"),
                4 => write!(f, "int"),
                _ => write!(f, "long"),
            },
            TyKind::Ptr { base } => write!(f, "{}*", base),
            TyKind::Array { elem, len } => write!(f, "{}[{}]", elem, len),
            TyKind::Struct(_) => write!(f, "struct"),
            TyKind::Func(func) => write!(f, "{}()", func.ret),
        }
    }
}

/// Round `n` up to the next multiple of `align`. `align` must be nonzero.
pub fn align_to(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

/// Lay out an ordered field list into a struct type.
///
/// Each field's offset is the running cursor rounded up to the field's own
/// alignment; the struct's alignment is the maximum field alignment (1 for
/// an empty struct) and its size is the cursor rounded up to that alignment,
/// so `{char, int, char}` occupies 12 bytes and `{char, char}` occupies 2.
pub fn struct_layout(fields: Vec<(String, Ty)>) -> Ty {
    let mut cursor = 0;
    let mut align = 1;
    let mut laid = Vec::with_capacity(fields.len());

    for (name, ty) in fields {
        cursor = align_to(cursor, ty.align());
        align = align.max(ty.align());
        let offset = cursor;
        cursor += ty.size();
        laid.push(Field { name, ty, offset });
    }

    Ty {
        kind: TyKind::Struct(Rc::new(StructType {
            fields: laid,
            size: align_to(cursor, align),
            align,
        })),
    }
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declaration-specifier accumulator.
///
/// The parser counts base-type keywords as it sees them and asks `finish`
/// for the canonical scalar, so `long int`, `int long`, `long long`, and
/// `long int long` all normalize to the same 8-byte type, and a declaration
/// with no base keyword at all (`typedef t;`) defaults to int.
#[derive(Debug, Default)]
pub struct Specifiers {
    pub voids: usize,
    pub bools: usize,
    pub chars: usize,
    pub shorts: usize,
    pub ints: usize,
    pub longs: usize,
    /// Typedef name or struct specifier, if one appeared.
    pub user: Option<Ty>,
}

impl Specifiers {
    pub fn new() -> Specifiers {
        Specifiers::default()
    }

    pub fn saw_base_keyword(&self) -> bool {
        self.voids + self.bools + self.chars + self.shorts + self.ints + self.longs > 0
    }

    /// Resolve the accumulated keywords to a canonical type.
    pub fn finish(self) -> Result<Ty, String> {
        if let Some(ty) = self.user {
            if self.voids + self.bools + self.chars + self.shorts + self.ints + self.longs > 0 {
                return Err("cannot combine a named type with base-type keywords".to_string());
            }
            return Ok(ty);
        }
        if self.voids > 0 {
            if self.bools + self.chars + self.shorts + self.ints + self.longs > 0 {
                return Err("invalid combination of type specifiers".to_string());
            }
            return Ok(Ty::void());
        }
        if self.bools > 0 {
            if self.chars + self.shorts + self.ints + self.longs > 0 {
                return Err("invalid combination of type specifiers".to_string());
            }
            return Ok(Ty::bool());
        }
        if self.chars > 0 {
            if self.shorts + self.ints + self.longs > 0 {
                return Err("invalid combination of type specifiers".to_string());
            }
            return Ok(Ty::char());
        }
        if self.shorts > 0 {
            if self.longs > 0 || self.ints > 1 {
                return Err("invalid combination of type specifiers".to_string());
            }
            return Ok(Ty::short());
        }
        if self.longs > 0 {
            if self.ints > 1 {
                return Err("invalid combination of type specifiers".to_string());
            }
            return Ok(Ty::long());
        }
        // Bare int, or no base keyword at all.
        Ok(Ty::int())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(chars: usize, shorts: usize, ints: usize, longs: usize) -> Specifiers {
        Specifiers {
            chars,
            shorts,
            ints,
            longs,
            ..Specifiers::default()
        }
    }

    #[test]
    fn keyword_order_does_not_matter() {
        // long int, int long, long long, long int long
        assert_eq!(spec(0, 0, 1, 1).finish().unwrap().size(), 8);
        assert_eq!(spec(0, 0, 0, 2).finish().unwrap().size(), 8);
        assert_eq!(spec(0, 0, 1, 2).finish().unwrap().size(), 8);
        // short int, int short
        assert_eq!(spec(0, 1, 1, 0).finish().unwrap().size(), 2);
        assert_eq!(spec(0, 1, 0, 0).finish().unwrap().size(), 2);
    }

    #[test]
    fn missing_base_defaults_to_int() {
        assert_eq!(Specifiers::new().finish().unwrap(), Ty::int());
    }

    #[test]
    fn conflicting_specifiers_rejected() {
        assert!(spec(1, 0, 0, 1).finish().is_err());
        assert!(spec(0, 1, 0, 1).finish().is_err());
    }

    #[test]
    fn char_int_char_layout() {
        let ty = struct_layout(vec![
            ("a".to_string(), Ty::char()),
            ("b".to_string(), Ty::int()),
            ("c".to_string(), Ty::char()),
        ]);
        let TyKind::Struct(s) = &ty.kind else {
            panic!("expected struct");
        };
        assert_eq!(s.field("a").unwrap().offset, 0);
        assert_eq!(s.field("b").unwrap().offset, 4);
        assert_eq!(s.field("c").unwrap().offset, 8);
        assert_eq!(s.size, 12);
        assert_eq!(s.align, 4);
    }

    #[test]
    fn char_only_structs_pack() {
        let ty = struct_layout(vec![
            ("a".to_string(), Ty::char()),
            ("b".to_string(), Ty::char()),
        ]);
        assert_eq!(ty.size(), 2);
        assert_eq!(ty.align(), 1);
    }

    #[test]
    fn empty_struct_does_not_fail() {
        let ty = struct_layout(Vec::new());
        assert_eq!(ty.size(), 0);
        assert_eq!(ty.align(), 1);
    }

    #[test]
    fn trailing_padding_respects_widest_field() {
        // {char, long} pads to 16, {char, short} to 4.
        let ty = struct_layout(vec![
            ("a".to_string(), Ty::char()),
            ("b".to_string(), Ty::long()),
        ]);
        assert_eq!(ty.size(), 16);
        let ty = struct_layout(vec![
            ("a".to_string(), Ty::char()),
            ("b".to_string(), Ty::short()),
        ]);
        assert_eq!(ty.size(), 4);
    }

    #[test]
    fn array_sizes_multiply() {
        let ty = Ty::array_of(Ty::array_of(Ty::int(), 4), 3);
        assert_eq!(ty.size(), 48);
        assert_eq!(ty.align(), 4);
        assert_eq!(Ty::array_of(Ty::ptr_to(Ty::int()), 3).size(), 24);
        assert_eq!(Ty::ptr_to(Ty::array_of(Ty::int(), 3)).size(), 8);
    }
}
