use bytemuck::Pod;
use thiserror::Error;

use crate::config::{ConfigError, GridConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
  #[error("({x}, {y}) is outside the {dim_x}x{dim_y} allocation")]
  OutOfBounds {
    x:     u32,
    y:     u32,
    dim_x: u32,
    dim_y: u32
  },

  #[error("expected {expected} bytes for a {dim_x}x{dim_y} allocation, got {actual}")]
  ByteLength {
    dim_x:    u32,
    dim_y:    u32,
    expected: usize,
    actual:   usize
  },

  #[error(transparent)]
  Config(#[from] ConfigError)
}

/// A 2D buffer of fixed-layout records, row-major with `x` fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation2D<T> {
  dim_x: u32,
  dim_y: u32,
  data:  Vec<T>
}

impl<T: Pod> Allocation2D<T> {
  /// A zero-filled allocation covering the configured grid.
  pub fn new(config: &GridConfig) -> Result<Self, AllocationError> {
    config.validate()?;
    config.byte_len(core::mem::size_of::<T>())?;
    let len = config.cell_count()?;
    Ok(Self {
      dim_x: config.dim_x,
      dim_y: config.dim_y,
      data:  vec![T::zeroed(); len]
    })
  }

  /// Rebuilds an allocation from a raw host-side copy. `bytes` may have any alignment.
  pub fn from_bytes(dim_x: u32, dim_y: u32, bytes: &[u8]) -> Result<Self, AllocationError> {
    let config = GridConfig::with_dims(dim_x, dim_y);
    config.validate()?;
    let expected = config.byte_len(core::mem::size_of::<T>())?;
    if bytes.len() != expected {
      return Err(AllocationError::ByteLength {
        dim_x,
        dim_y,
        expected,
        actual: bytes.len()
      });
    }

    Ok(Self {
      dim_x,
      dim_y,
      data: bytemuck::pod_collect_to_vec(bytes)
    })
  }

  pub fn dims(&self) -> (u32, u32) {
    (self.dim_x, self.dim_y)
  }

  fn index(&self, x: u32, y: u32) -> Result<usize, AllocationError> {
    if x >= self.dim_x || y >= self.dim_y {
      return Err(AllocationError::OutOfBounds {
        x,
        y,
        dim_x: self.dim_x,
        dim_y: self.dim_y
      });
    }
    Ok(y as usize * self.dim_x as usize + x as usize)
  }

  pub fn element_at(&self, x: u32, y: u32) -> Result<&T, AllocationError> {
    let index = self.index(x, y)?;
    Ok(&self.data[index])
  }

  pub fn element_at_mut(&mut self, x: u32, y: u32) -> Result<&mut T, AllocationError> {
    let index = self.index(x, y)?;
    Ok(&mut self.data[index])
  }

  /// Raw bytes of one cell, padding included.
  pub fn element_bytes(&self, x: u32, y: u32) -> Result<&[u8], AllocationError> {
    self.element_at(x, y).map(bytemuck::bytes_of)
  }

  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.data)
  }

  pub(crate) fn data_mut(&mut self) -> &mut [T] {
    &mut self.data
  }
}
