//! Memory model for the interpreter
//!
//! All program storage lives in a single flat byte arena indexed by virtual
//! address, so pointer tricks behave exactly as they do in C: storing an
//! address into an `int` truncates it to 4 bytes, reading struct memory
//! through an `int *` sees the padded layout, and adjacent stack slots are
//! really adjacent.
//!
//! Address space:
//!
//! ```text
//! 0 .. DATA_BASE        unmapped (null page)
//! DATA_BASE ..          globals and string literals, allocated at load
//! .. STACK_TOP          stack frames, growing downward
//! ```
//!
//! - [`value`]: runtime values and lvalues
//! - [`frame`]: per-function stack slot layout
//!
//! # Pointer Arithmetic
//!
//! Pointer arithmetic is scaled by pointee size:
//! ```text
//! ptr + n  →  ptr + (n * sizeof(*ptr))
//! ```
//! [`pointer_add`] and [`pointer_diff`] handle the scaling; a pointer
//! difference is an element count, not a byte count.
//!
//! # Error Handling
//!
//! Methods return `Result<_, String>`; the string errors are converted to
//! `EvalError` at the interpreter boundary.

pub mod frame;
pub mod value;

use crate::types::{Ty, TyKind};

/// First mapped address. Everything below is the null page.
pub const DATA_BASE: u64 = 0x1000;

/// One-past-the-end of the arena; stack frames grow down from here.
pub const STACK_TOP: u64 = 0x10_0000;

/// The flat byte arena backing globals, string literals, and the stack.
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            bytes: vec![0; STACK_TOP as usize],
        }
    }

    fn check(&self, addr: u64, len: usize) -> Result<usize, String> {
        if addr < DATA_BASE {
            return Err(format!("access to null or unmapped address 0x{:x}", addr));
        }
        let start = usize::try_from(addr)
            .map_err(|_| format!("access to unmapped address 0x{:x}", addr))?;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start),
            _ => Err(format!("access past end of memory at 0x{:x}", addr)),
        }
    }

    /// Load a little-endian integer of `width` bytes, sign-extended.
    pub fn load_int(&self, addr: u64, width: usize) -> Result<i64, String> {
        if width == 0 || width > 8 {
            return Err(format!("unsupported load width {}", width));
        }
        let start = self.check(addr, width)?;
        let mut raw = [0u8; 8];
        raw[..width].copy_from_slice(&self.bytes[start..start + width]);
        let unsigned = u64::from_le_bytes(raw);
        let shift = 64 - width as u32 * 8;
        Ok(((unsigned << shift) as i64) >> shift)
    }

    /// Store the low `width` bytes of `bits`, little-endian.
    pub fn store_int(&mut self, addr: u64, width: usize, bits: i64) -> Result<(), String> {
        if width == 0 || width > 8 {
            return Err(format!("unsupported store width {}", width));
        }
        let start = self.check(addr, width)?;
        self.bytes[start..start + width].copy_from_slice(&bits.to_le_bytes()[..width]);
        Ok(())
    }

    /// Load a scalar of the given type. Pointers load as 8-byte addresses;
    /// narrower scalars sign-extend.
    pub fn load_scalar(&self, addr: u64, ty: &Ty) -> Result<i64, String> {
        match &ty.kind {
            TyKind::Ptr { .. } => self.load_int(addr, 8),
            TyKind::Bool => Ok(self.load_int(addr, 1)? & 1),
            _ => self.load_int(addr, ty.size()),
        }
    }

    /// Store a scalar of the given type, truncating to its width. A `_Bool`
    /// store collapses any nonzero value to exactly 1; the stored value is
    /// returned so assignment can evaluate to it.
    pub fn store_scalar(&mut self, addr: u64, ty: &Ty, bits: i64) -> Result<i64, String> {
        let (width, stored) = match &ty.kind {
            TyKind::Ptr { .. } => (8, bits),
            TyKind::Bool => (1, (bits != 0) as i64),
            // Storing through an array-typed lvalue writes its first element.
            TyKind::Array { elem, .. } => (elem.size(), bits),
            _ => (ty.size(), bits),
        };
        self.store_int(addr, width, stored)?;
        self.load_int(addr, width)
    }

    pub fn write_bytes(&mut self, addr: u64, data: &[u8]) -> Result<(), String> {
        let start = self.check(addr, data.len())?;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Read a NUL-terminated byte string, for `%s` and format strings.
    pub fn load_cstr(&self, addr: u64) -> Result<Vec<u8>, String> {
        let mut out = Vec::new();
        let mut cursor = addr;
        loop {
            let byte = self.load_int(cursor, 1)? as u8;
            if byte == 0 {
                return Ok(out);
            }
            out.push(byte);
            cursor += 1;
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

/// Pointer plus integer: the offset is scaled by the pointee size.
pub fn pointer_add(addr: i64, count: i64, elem_size: usize) -> i64 {
    addr.wrapping_add(count.wrapping_mul(elem_size as i64))
}

/// Difference of two pointers in elements, not bytes.
pub fn pointer_diff(lhs: i64, rhs: i64, elem_size: usize) -> i64 {
    if elem_size == 0 {
        return 0;
    }
    lhs.wrapping_sub(rhs) / elem_size as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_loads_sign_extend() {
        let mut mem = Memory::new();
        mem.store_int(DATA_BASE, 1, -1).unwrap();
        assert_eq!(mem.load_int(DATA_BASE, 1).unwrap(), -1);
        mem.store_int(DATA_BASE, 4, -10).unwrap();
        assert_eq!(mem.load_int(DATA_BASE, 4).unwrap(), -10);
    }

    #[test]
    fn int_store_truncates_addresses() {
        let mut mem = Memory::new();
        mem.store_scalar(DATA_BASE, &Ty::int(), 0x1_2345_6789).unwrap();
        assert_eq!(mem.load_scalar(DATA_BASE, &Ty::int()).unwrap(), 0x2345_6789);
    }

    #[test]
    fn bool_store_collapses_to_one() {
        let mut mem = Memory::new();
        assert_eq!(mem.store_scalar(DATA_BASE, &Ty::bool(), 2).unwrap(), 1);
        assert_eq!(mem.store_scalar(DATA_BASE, &Ty::bool(), 0).unwrap(), 0);
    }

    #[test]
    fn null_page_is_unmapped() {
        let mem = Memory::new();
        assert!(mem.load_int(0, 4).is_err());
        assert!(mem.load_int(8, 8).is_err());
    }

    #[test]
    fn scaled_arithmetic() {
        assert_eq!(pointer_add(1000, 2, 4), 1008);
        assert_eq!(pointer_add(1000, -1, 4), 996);
        assert_eq!(pointer_diff(1008, 1000, 4), 2);
    }
}
