//! The two records the kernels produce.
//!
//! `SmallStruct2` puts the 8-byte field first, so its 4 bytes of padding sit at the tail instead
//! of between the fields.

use bytemuck::{Pod, Zeroable};
use struct_layout::fixed_layout;

pub const ARRAY_LEN: usize = 3;

#[fixed_layout(16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct SmallStruct2 {
  #[field_offset(0)]
  pub l: i64,
  #[field_offset(8)]
  pub i: i32
}

impl SmallStruct2 {
  pub fn new(l: i64, i: i32) -> Self {
    let mut value = Self::zeroed();
    value.l = l;
    value.i = i;
    value
  }
}

#[fixed_layout(48)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct StructOfStruct2 {
  #[field_offset(0)]
  pub arr: [SmallStruct2; ARRAY_LEN]
}

impl StructOfStruct2 {
  pub fn new(arr: [SmallStruct2; ARRAY_LEN]) -> Self {
    let mut value = Self::zeroed();
    value.arr = arr;
    value
  }
}

#[cfg(test)]
mod tests {
  use std::mem::{align_of, offset_of, size_of};

  use struct_layout::FixedLayout;

  use super::*;

  #[test]
  fn test_small_struct_layout() {
    assert_eq!(size_of::<SmallStruct2>(), 16, "`SmallStruct2` should be 16 bytes long");
    assert_eq!(align_of::<SmallStruct2>(), 8);
    assert_eq!(offset_of!(SmallStruct2, l), 0);
    assert_eq!(offset_of!(SmallStruct2, i), 8);
    assert_eq!(SmallStruct2::padding_bytes(), 4);
  }

  #[test]
  fn test_struct_of_struct_layout() {
    assert_eq!(size_of::<StructOfStruct2>(), 3 * 16);
    assert_eq!(align_of::<StructOfStruct2>(), 8);
    assert_eq!(offset_of!(StructOfStruct2, arr), 0);
    assert_eq!(StructOfStruct2::padding_bytes(), 0);
    assert_eq!(StructOfStruct2::field("arr").map(|f| f.size), Some(48));
  }

  #[test]
  fn test_padding_is_zero() {
    let value = SmallStruct2::new(-1, -1);
    let bytes = bytemuck::bytes_of(&value);
    assert_eq!(&bytes[..12], &[0xff; 12]);
    assert_eq!(&bytes[12..], &[0; 4]);
  }

  #[test]
  fn test_array_elements_are_strided() {
    let value = StructOfStruct2::new([
      SmallStruct2::new(1, 2),
      SmallStruct2::new(3, 4),
      SmallStruct2::new(5, 6)
    ]);
    let bytes = bytemuck::bytes_of(&value);
    let second: &SmallStruct2 = bytemuck::from_bytes(&bytes[16..32]);
    assert_eq!(second.l, 3);
    assert_eq!(second.i, 4);
  }
}
