use bytemuck::Pod;
use rayon::prelude::*;

use crate::{
  allocation::Allocation2D,
  config::GridConfig,
  records::{SmallStruct2, StructOfStruct2}
};

/// A pure function from a grid coordinate to one output cell.
pub trait Kernel2D: Sync {
  type Output: Pod + Send;

  fn name(&self) -> &'static str;

  fn call(&self, x: u32, y: u32) -> Self::Output;
}

pub fn set_struct(config: &GridConfig, x: u32, y: u32) -> SmallStruct2 {
  SmallStruct2::new(
    config.expected_long(x, y, 0),
    config.expected_int(x, y, 0)
  )
}

pub fn set_array_of_struct(config: &GridConfig, x: u32, y: u32) -> StructOfStruct2 {
  StructOfStruct2::new(core::array::from_fn(|idx| {
    SmallStruct2::new(
      config.expected_long(x, y, idx),
      config.expected_int(x, y, idx)
    )
  }))
}

pub struct SetStruct<'a>(pub &'a GridConfig);

impl Kernel2D for SetStruct<'_> {
  type Output = SmallStruct2;

  fn name(&self) -> &'static str {
    "setStruct"
  }

  fn call(&self, x: u32, y: u32) -> SmallStruct2 {
    set_struct(self.0, x, y)
  }
}

pub struct SetArrayOfStruct<'a>(pub &'a GridConfig);

impl Kernel2D for SetArrayOfStruct<'_> {
  type Output = StructOfStruct2;

  fn name(&self) -> &'static str {
    "setArrayOfStruct"
  }

  fn call(&self, x: u32, y: u32) -> StructOfStruct2 {
    set_array_of_struct(self.0, x, y)
  }
}

/// Runs `kernel` once per cell of `output`, rows in parallel.
pub fn for_each_2d<K: Kernel2D>(kernel: &K, output: &mut Allocation2D<K::Output>) {
  let (dim_x, dim_y) = output.dims();
  log::debug!("launching {} over {}x{}", kernel.name(), dim_x, dim_y);

  output
    .data_mut()
    .par_chunks_mut(dim_x as usize)
    .enumerate()
    .for_each(|(y, row)| {
      for (x, cell) in row.iter_mut().enumerate() {
        *cell = kernel.call(x as u32, y as u32);
      }
    });
}
