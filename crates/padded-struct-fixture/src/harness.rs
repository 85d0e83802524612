use std::thread;

use struct_layout::{read_named, FixedLayout};

use crate::{
  allocation::Allocation2D,
  client::{ChannelClient, ClientError, TestMessage},
  config::GridConfig,
  kernel::{for_each_2d, SetArrayOfStruct, SetStruct},
  records::{SmallStruct2, StructOfStruct2},
  verify::{report, verify, Verdict},
  Error
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HarnessError {
  #[error("`{record}::{field}` decoded by offset as {by_offset}, typed read gives {typed}")]
  LayoutDisagreement {
    record:    &'static str,
    field:     &'static str,
    by_offset: i64,
    typed:     i64
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
  pub verdict: Verdict,
  pub message: TestMessage
}

impl Outcome {
  pub fn passed(&self) -> bool {
    self.message == TestMessage::Passed
  }
}

/// Produces both buffers for `config`, as written by the kernels.
pub fn produce(
  config: &GridConfig
) -> Result<(Allocation2D<SmallStruct2>, Allocation2D<StructOfStruct2>), Error> {
  let mut a = Allocation2D::new(config)?;
  let mut b = Allocation2D::new(config)?;
  for_each_2d(&SetStruct(config), &mut a);
  for_each_2d(&SetArrayOfStruct(config), &mut b);

  Ok((a, b))
}

/// Copies an allocation out to bytes and rebuilds it, the way a host reads a device buffer.
pub fn read_back<T: bytemuck::Pod>(alloc: &Allocation2D<T>) -> Result<Allocation2D<T>, Error> {
  let (dim_x, dim_y) = alloc.dims();
  let bytes = alloc.as_bytes().to_vec();
  Ok(Allocation2D::from_bytes(dim_x, dim_y, &bytes)?)
}

fn check_field(
  record: &'static str,
  field: &'static str,
  by_offset: i64,
  typed: i64
) -> Result<(), HarnessError> {
  if by_offset != typed {
    return Err(HarnessError::LayoutDisagreement {
      record,
      field,
      by_offset,
      typed
    });
  }
  Ok(())
}

/// Decodes cell `(0, 0)` of `a` through the declared field offsets and compares it to the typed
/// view of the same bytes.
pub fn check_declared_offsets(a: &Allocation2D<SmallStruct2>) -> Result<(), Error> {
  let bytes = a.element_bytes(0, 0)?;
  let typed = a.element_at(0, 0)?;

  let l: i64 = read_named::<SmallStruct2, _>(bytes, "l")?;
  let i: i32 = read_named::<SmallStruct2, _>(bytes, "i")?;
  check_field("SmallStruct2", "l", l, typed.l)?;
  check_field("SmallStruct2", "i", i.into(), typed.i.into())?;

  log::debug!(
    "SmallStruct2: {} bytes, align {}, {} padding bytes",
    SmallStruct2::SIZE,
    SmallStruct2::ALIGN,
    SmallStruct2::padding_bytes()
  );
  Ok(())
}

/// Runs the verifier on its own thread and blocks until it reports.
pub fn verify_and_report(
  config: &GridConfig,
  a: &Allocation2D<SmallStruct2>,
  b: &Allocation2D<StructOfStruct2>
) -> Result<Outcome, Error> {
  let (client, rx) = ChannelClient::channel();

  thread::scope(|scope| {
    let verifier = scope.spawn(move || -> Result<Verdict, Error> {
      let verdict = verify(config, a, b)?;
      report(&verdict, &client)?;
      Ok(verdict)
    });

    let received = rx.recv();
    let verdict = match verifier.join() {
      Ok(result) => result?,
      Err(payload) => std::panic::resume_unwind(payload)
    };
    let message = received.map_err(|_| ClientError::Disconnected(verdict.message()))?;

    Ok(Outcome { verdict, message })
  })
}

/// Full pipeline: produce, read back on the host, verify, receive the result.
pub fn run(config: &GridConfig) -> Result<Outcome, Error> {
  log::info!(
    "running {} on a {}x{} grid",
    crate::verify::TEST_NAME,
    config.dim_x,
    config.dim_y
  );

  let (a, b) = produce(config)?;
  let a = read_back(&a)?;
  let b = read_back(&b)?;
  check_declared_offsets(&a)?;

  let outcome = verify_and_report(config, &a, &b)?;
  log::info!(
    "{} finished: {:?} (message {})",
    crate::verify::TEST_NAME,
    outcome.message,
    outcome.message.code()
  );
  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    allocation::AllocationError,
    config::ConfigError,
    verify::{Buffer, Field}
  };

  #[test]
  fn test_end_to_end() {
    let config = GridConfig {
      dim_x:      2,
      dim_y:      2,
      int_start:  7,
      long_start: 0x12345678abcdef12
    };
    let outcome = run(&config).unwrap();
    assert!(outcome.passed());
    assert!(outcome.verdict.passed());

    let (a, _) = produce(&config).unwrap();
    assert_eq!(read_back(&a).unwrap().element_at(1, 1).unwrap().i, 10);
  }

  #[test]
  fn test_larger_grid_passes() {
    let outcome = run(&GridConfig::with_dims(31, 7)).unwrap();
    assert_eq!(outcome.message, TestMessage::Passed);
  }

  #[test]
  fn test_corrupted_buffer_fails() {
    let config = GridConfig::with_dims(3, 3);
    let (mut a, b) = produce(&config).unwrap();
    a.element_at_mut(2, 2).unwrap().i = 0;

    let outcome = verify_and_report(&config, &a, &b).unwrap();
    assert_eq!(outcome.message, TestMessage::Failed);
    assert_eq!(outcome.verdict.mismatches.len(), 1);
    assert_eq!(outcome.verdict.mismatches[0].buffer, Buffer::A);
    assert_eq!(outcome.verdict.mismatches[0].field, Field::I);
  }

  #[test]
  fn test_read_back_is_identical() {
    let config = GridConfig::with_dims(4, 3);
    let (a, b) = produce(&config).unwrap();
    assert_eq!(read_back(&a).unwrap(), a);
    assert_eq!(read_back(&b).unwrap(), b);
    check_declared_offsets(&a).unwrap();
  }

  #[test]
  fn test_empty_grid_is_an_error() {
    assert!(matches!(
      run(&GridConfig::with_dims(0, 0)),
      Err(Error::Allocation(AllocationError::Config(
        ConfigError::EmptyGrid { .. }
      )))
    ));
  }
}
