use thiserror::Error;

pub const DEFAULT_INT_START: i32 = 0x7;
pub const DEFAULT_LONG_START: i64 = 0x12345678abcdef12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("grid must not be empty, got {dim_x}x{dim_y}")]
  EmptyGrid { dim_x: u32, dim_y: u32 },

  #[error("grid of {dim_x}x{dim_y} cells is too large to address")]
  TooLarge { dim_x: u32, dim_y: u32 }
}

/// Grid dimensions and the two seeds every producer and verifier formula starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
  pub dim_x:      u32,
  pub dim_y:      u32,
  pub int_start:  i32,
  pub long_start: i64
}

impl Default for GridConfig {
  fn default() -> Self {
    Self {
      dim_x:      2,
      dim_y:      2,
      int_start:  DEFAULT_INT_START,
      long_start: DEFAULT_LONG_START
    }
  }
}

impl GridConfig {
  pub fn with_dims(dim_x: u32, dim_y: u32) -> Self {
    Self {
      dim_x,
      dim_y,
      ..Self::default()
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.dim_x == 0 || self.dim_y == 0 {
      return Err(ConfigError::EmptyGrid {
        dim_x: self.dim_x,
        dim_y: self.dim_y
      });
    }
    self.cell_count().map(|_| ())
  }

  pub fn cell_count(&self) -> Result<usize, ConfigError> {
    self.byte_len(1)
  }

  /// Bytes needed for one `elem_size`-byte record per cell. Allocations are capped at
  /// `isize::MAX` bytes.
  pub fn byte_len(&self, elem_size: usize) -> Result<usize, ConfigError> {
    (self.dim_x as usize)
      .checked_mul(self.dim_y as usize)
      .and_then(|cells| cells.checked_mul(elem_size))
      .filter(|&len| len <= isize::MAX as usize)
      .ok_or(ConfigError::TooLarge {
        dim_x: self.dim_x,
        dim_y: self.dim_y
      })
  }

  /// `y * dim_x + x` in the 32-bit integer arithmetic the `i` field uses.
  pub fn linear_i32(&self, x: u32, y: u32) -> i32 {
    (y as i32)
      .wrapping_mul(self.dim_x as i32)
      .wrapping_add(x as i32)
  }

  /// Expected `i` at `(x, y)`, shifted by `idx` for array elements.
  pub fn expected_int(&self, x: u32, y: u32, idx: usize) -> i32 {
    self
      .int_start
      .wrapping_add(self.linear_i32(x, y))
      .wrapping_add(idx as i32)
  }

  /// Expected `l` at `(x, y)`, shifted by `idx` for array elements.
  pub fn expected_long(&self, x: u32, y: u32, idx: usize) -> i64 {
    self
      .long_start
      .wrapping_add(i64::from(self.linear_i32(x, y)))
      .wrapping_add(idx as i64)
  }
}
