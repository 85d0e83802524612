use std::fmt;

use crate::{
  allocation::{Allocation2D, AllocationError},
  client::{Client, ClientError, TestMessage},
  config::GridConfig,
  records::{SmallStruct2, StructOfStruct2, ARRAY_LEN}
};

pub const TEST_NAME: &str = "small_struct_2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
  A,
  B
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  I,
  L
}

/// One field whose read-back value differs from the producer formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
  pub buffer:   Buffer,
  pub x:        u32,
  pub y:        u32,
  pub idx:      Option<usize>,
  pub field:    Field,
  pub expected: i64,
  pub actual:   i64
}

impl fmt::Display for Mismatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let field = match self.field {
      Field::I => "i",
      Field::L => "l"
    };
    write!(f, "{:?}({}, {})", self.buffer, self.x, self.y)?;
    if let Some(idx) = self.idx {
      write!(f, ".arr[{idx}]")?;
    }
    write!(
      f,
      ".{field}: expected {}, got {}",
      self.expected, self.actual
    )
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Verdict {
  pub mismatches: Vec<Mismatch>
}

impl Verdict {
  pub fn passed(&self) -> bool {
    self.mismatches.is_empty()
  }

  pub fn message(&self) -> TestMessage {
    if self.passed() {
      TestMessage::Passed
    } else {
      TestMessage::Failed
    }
  }

  fn check(&mut self, mismatch: Mismatch) {
    if mismatch.expected != mismatch.actual {
      log::warn!("{TEST_NAME}: {mismatch}");
      self.mismatches.push(mismatch);
    }
  }

  fn check_record(
    &mut self,
    buffer: Buffer,
    (x, y): (u32, u32),
    idx: Option<usize>,
    value: &SmallStruct2,
    config: &GridConfig
  ) {
    let shift = idx.unwrap_or(0);
    self.check(Mismatch {
      buffer,
      x,
      y,
      idx,
      field:    Field::I,
      expected: config.expected_int(x, y, shift).into(),
      actual:   value.i.into()
    });
    self.check(Mismatch {
      buffer,
      x,
      y,
      idx,
      field:    Field::L,
      expected: config.expected_long(x, y, shift),
      actual:   value.l
    });
  }
}

/// Re-derives every field of `a` and `b` and collects the ones that don't match.
pub fn verify(
  config: &GridConfig,
  a: &Allocation2D<SmallStruct2>,
  b: &Allocation2D<StructOfStruct2>
) -> Result<Verdict, AllocationError> {
  let mut verdict = Verdict::default();

  for x in 0..config.dim_x {
    for y in 0..config.dim_y {
      let v = a.element_at(x, y)?;
      verdict.check_record(Buffer::A, (x, y), None, v, config);
    }
  }

  for x in 0..config.dim_x {
    for y in 0..config.dim_y {
      let v = b.element_at(x, y)?;
      for idx in 0..ARRAY_LEN {
        verdict.check_record(Buffer::B, (x, y), Some(idx), &v.arr[idx], config);
      }
    }
  }

  Ok(verdict)
}

/// Logs the outcome and hands the single pass/fail message to `client`.
pub fn report(verdict: &Verdict, client: &impl Client) -> Result<(), ClientError> {
  if verdict.passed() {
    log::debug!("{TEST_NAME} test PASSED");
  } else {
    log::debug!(
      "{TEST_NAME} test FAILED ({} mismatches)",
      verdict.mismatches.len()
    );
  }
  client.send_blocking(verdict.message())
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::kernel::{for_each_2d, SetArrayOfStruct, SetStruct};

  #[derive(Default)]
  struct RecordingClient {
    sent: RefCell<Vec<TestMessage>>
  }

  impl Client for RecordingClient {
    fn send_blocking(&self, message: TestMessage) -> Result<(), ClientError> {
      self.sent.borrow_mut().push(message);
      Ok(())
    }
  }

  fn produce(
    config: &GridConfig
  ) -> (Allocation2D<SmallStruct2>, Allocation2D<StructOfStruct2>) {
    let mut a = Allocation2D::new(config).unwrap();
    let mut b = Allocation2D::new(config).unwrap();
    for_each_2d(&SetStruct(config), &mut a);
    for_each_2d(&SetArrayOfStruct(config), &mut b);
    (a, b)
  }

  #[test]
  fn test_produced_buffers_pass() {
    let config = GridConfig::with_dims(5, 3);
    let (a, b) = produce(&config);

    let verdict = verify(&config, &a, &b).unwrap();
    assert!(verdict.passed(), "{:?}", verdict.mismatches);

    let client = RecordingClient::default();
    report(&verdict, &client).unwrap();
    assert_eq!(*client.sent.borrow(), [TestMessage::Passed]);
  }

  #[test]
  fn test_zeroed_buffers_fail() {
    let config = GridConfig::default();
    let a = Allocation2D::new(&config).unwrap();
    let b = Allocation2D::new(&config).unwrap();

    let verdict = verify(&config, &a, &b).unwrap();
    // two fields per record: 4 cells in A, 4 * 3 elements in B
    assert_eq!(verdict.mismatches.len(), 2 * (4 + 4 * 3));
  }

  #[test]
  fn test_single_corruption_is_reported() {
    let config = GridConfig::default();
    let (a, mut b) = produce(&config);
    b.element_at_mut(1, 0).unwrap().arr[2].l += 1;

    let verdict = verify(&config, &a, &b).unwrap();
    assert_eq!(
      verdict.mismatches,
      [Mismatch {
        buffer:   Buffer::B,
        x:        1,
        y:        0,
        idx:      Some(2),
        field:    Field::L,
        expected: 0x12345678abcdef12 + 1 + 2,
        actual:   0x12345678abcdef12 + 1 + 2 + 1
      }]
    );
    assert_eq!(
      verdict.mismatches[0].to_string(),
      format!(
        "B(1, 0).arr[2].l: expected {}, got {}",
        0x12345678abcdef15i64, 0x12345678abcdef16i64
      )
    );

    let client = RecordingClient::default();
    report(&verdict, &client).unwrap();
    assert_eq!(*client.sent.borrow(), [TestMessage::Failed]);
  }

  #[test]
  fn test_buffer_smaller_than_grid() {
    let config = GridConfig::with_dims(3, 3);
    let (a, b) = produce(&GridConfig::with_dims(2, 2));
    assert!(matches!(
      verify(&config, &a, &b),
      Err(AllocationError::OutOfBounds { x: 0, y: 2, .. })
    ));
  }
}
