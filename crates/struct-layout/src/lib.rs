//! Explicit struct layouts.
//!
//! [`fixed_layout`] turns declared field offsets into a `repr(C)` struct whose padding is spelled
//! out as hidden byte arrays. The result has no implicit padding, its size and offsets are
//! checked while compiling, and [`FixedLayout`] describes it at runtime so raw buffers can be
//! decoded field by field.
//!
//! ```rust
//! use struct_layout::{fixed_layout, FixedLayout};
//!
//! #[fixed_layout(16)]
//! #[derive(Clone, Copy)]
//! pub struct Pair {
//!   #[field_offset(0)]
//!   pub l: i64,
//!   #[field_offset(8)]
//!   pub i: i32
//! }
//!
//! assert_eq!(Pair::SIZE, 16);
//! assert_eq!(Pair::padding_bytes(), 4);
//! ```
//!
//! # Rejected layouts
//!
//! A declared offset the compiler can't honour is a build error. Here `l` would land at 8:
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub struct Misaligned {
//!   #[field_offset(0)]
//!   pub i: i32,
//!   #[field_offset(4)]
//!   pub l: i64
//! }
//! ```
//!
//! So is a size that disagrees with the natural alignment (this one rounds up to 16):
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout(12)]
//! pub struct Short {
//!   #[field_offset(0)]
//!   pub l: i64,
//!   #[field_offset(8)]
//!   pub i: i32
//! }
//! ```
//!
//! Offsets must increase:
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub struct Backwards {
//!   #[field_offset(8)]
//!   pub l: i64,
//!   #[field_offset(0)]
//!   pub i: i32
//! }
//! ```
//!
//! The size can't be below the last offset:
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout(4)]
//! pub struct TooSmall {
//!   #[field_offset(0)]
//!   pub a: u8,
//!   #[field_offset(8)]
//!   pub b: u8
//! }
//! ```
//!
//! The macro owns `repr`:
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! #[repr(C)]
//! pub struct ManualRepr {
//!   #[field_offset(0)]
//!   pub a: u32
//! }
//! ```
//!
//! Every field needs an integer `field_offset`:
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub struct Missing {
//!   #[field_offset(0)]
//!   pub a: u32,
//!   pub b: u32
//! }
//! ```
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub struct NotAnInteger {
//!   #[field_offset("0")]
//!   pub a: u32
//! }
//! ```
//!
//! Only non-generic structs with named fields are accepted:
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub enum NotAStruct {
//!   A
//! }
//! ```
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub union NotAStruct {
//!   #[field_offset(0)]
//!   a: u32
//! }
//! ```
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub struct Tuple(#[field_offset(0)] u32);
//! ```
//!
//! ```compile_fail
//! # use struct_layout::fixed_layout;
//! #[fixed_layout]
//! pub struct Generic<T> {
//!   #[field_offset(0)]
//!   pub a: T
//! }
//! ```

extern crate self as struct_layout;

use bytemuck::Pod;
use thiserror::Error;

pub use struct_layout_codegen::fixed_layout;

/// Where a single declared field lives inside its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
  pub name:   &'static str,
  pub offset: usize,
  pub size:   usize
}

impl FieldLayout {
  /// First byte past the field.
  pub const fn end(&self) -> usize {
    self.offset + self.size
  }
}

/// Implemented by every struct expanded by [`fixed_layout`].
pub trait FixedLayout: Sized {
  /// Declared fields, in declaration order. Padding is not listed.
  const FIELDS: &'static [FieldLayout];

  const SIZE: usize = core::mem::size_of::<Self>();
  const ALIGN: usize = core::mem::align_of::<Self>();

  fn field(name: &str) -> Option<&'static FieldLayout> {
    Self::FIELDS.iter().find(|f| f.name == name)
  }

  /// Bytes of the record not covered by any declared field.
  fn padding_bytes() -> usize {
    Self::SIZE - Self::FIELDS.iter().map(|f| f.size).sum::<usize>()
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
  #[error("no field named `{0}`")]
  UnknownField(String),

  #[error("field `{field}` ends at byte {end} but the record has only {len} bytes")]
  FieldOutOfBounds {
    field: &'static str,
    end:   usize,
    len:   usize
  },

  #[error("field `{field}` is {actual} bytes, requested type is {expected} bytes")]
  SizeMismatch {
    field:    &'static str,
    expected: usize,
    actual:   usize
  }
}

/// Decodes `field` out of the raw bytes of one record.
///
/// `bytes` does not need to be aligned.
pub fn read_field<F: Pod>(bytes: &[u8], field: &FieldLayout) -> Result<F, LayoutError> {
  let expected = core::mem::size_of::<F>();
  if field.size != expected {
    return Err(LayoutError::SizeMismatch {
      field: field.name,
      expected,
      actual: field.size
    });
  }

  let raw = bytes
    .get(field.offset..field.end())
    .ok_or(LayoutError::FieldOutOfBounds {
      field: field.name,
      end:   field.end(),
      len:   bytes.len()
    })?;

  Ok(bytemuck::pod_read_unaligned(raw))
}

/// Looks up `name` in `T`'s layout and decodes it from `bytes`.
pub fn read_named<T: FixedLayout, F: Pod>(bytes: &[u8], name: &str) -> Result<F, LayoutError> {
  let field = T::field(name).ok_or_else(|| LayoutError::UnknownField(name.to_owned()))?;
  read_field(bytes, field)
}

#[cfg(test)]
mod tests {
  use core::mem::{align_of, size_of};

  use bytemuck::{Pod, Zeroable};

  use super::*;

  #[fixed_layout(0x38)]
  #[derive(Clone, Copy)]
  pub struct Foo {
    #[field_offset(0x10)]
    pub a: i32,

    #[field_offset(0x20)]
    pub b: i32,

    #[field_offset(0x30)]
    pub c: i32
  }

  #[fixed_layout(16)]
  #[derive(Clone, Copy, Pod, Zeroable)]
  pub struct LongThenInt {
    #[field_offset(0)]
    pub l: i64,
    #[field_offset(8)]
    pub i: i32
  }

  #[fixed_layout]
  #[derive(Clone, Copy)]
  pub struct Unsized {
    #[field_offset(0)]
    pub a: u8,
    #[field_offset(4)]
    pub b: u32
  }

  #[test]
  fn test_size() {
    assert_eq!(size_of::<Foo>(), 0x38, "`Foo` should be 0x38 bytes long");
    assert_eq!(Foo::SIZE, 0x38);
  }

  #[test]
  fn test_size_without_trailing_padding() {
    assert_eq!(size_of::<Unsized>(), 8);
    assert_eq!(Unsized::padding_bytes(), 3);
  }

  #[test]
  fn test_offsets() {
    assert_eq!(core::mem::offset_of!(Foo, a), 0x10);
    assert_eq!(core::mem::offset_of!(Foo, b), 0x20);
    assert_eq!(core::mem::offset_of!(Foo, c), 0x30);

    let offsets = Foo::FIELDS.iter().map(|f| (f.name, f.offset)).collect::<Vec<_>>();
    assert_eq!(offsets, [("a", 0x10), ("b", 0x20), ("c", 0x30)]);
  }

  #[test]
  fn test_natural_alignment() {
    assert_eq!(size_of::<LongThenInt>(), 16);
    assert_eq!(align_of::<LongThenInt>(), 8);
    assert_eq!(LongThenInt::ALIGN, 8);
    assert_eq!(LongThenInt::padding_bytes(), 4);
    assert_eq!(
      LongThenInt::field("i"),
      Some(&FieldLayout {
        name:   "i",
        offset: 8,
        size:   4
      })
    );
    assert_eq!(LongThenInt::field("__pad2"), None);
  }

  #[test]
  fn test_read_field() {
    let mut value = LongThenInt::zeroed();
    value.l = 0x12345678abcdef12;
    value.i = -3;

    let bytes = bytemuck::bytes_of(&value);
    assert_eq!(read_named::<LongThenInt, i64>(bytes, "l"), Ok(0x12345678abcdef12));
    assert_eq!(read_named::<LongThenInt, i32>(bytes, "i"), Ok(-3));

    // unaligned source
    let mut shifted = vec![0u8; 1];
    shifted.extend_from_slice(bytes);
    assert_eq!(read_named::<LongThenInt, i32>(&shifted[1..], "i"), Ok(-3));
  }

  #[test]
  fn test_read_field_errors() {
    let value = LongThenInt::zeroed();
    let bytes = bytemuck::bytes_of(&value);

    assert_eq!(
      read_named::<LongThenInt, i64>(bytes, "x"),
      Err(LayoutError::UnknownField("x".into()))
    );
    assert_eq!(
      read_named::<LongThenInt, i64>(bytes, "i"),
      Err(LayoutError::SizeMismatch {
        field:    "i",
        expected: 8,
        actual:   4
      })
    );
    assert_eq!(
      read_named::<LongThenInt, i32>(&bytes[..10], "i"),
      Err(LayoutError::FieldOutOfBounds {
        field: "i",
        end:   12,
        len:   10
      })
    );
  }
}
