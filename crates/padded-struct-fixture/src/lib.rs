//! Fixture for the `small_struct_2` layout: an 8-byte field followed by a 4-byte field, with the
//! padding at the tail.
//!
//! Producer kernels fill two 2D allocations from a [`GridConfig`], the host reads the buffers
//! back, and the verifier re-derives every field before sending one pass/fail message to the
//! client.

pub mod allocation;
pub mod client;
pub mod config;
pub mod harness;
pub mod kernel;
pub mod records;
pub mod verify;

use thiserror::Error;

pub use allocation::{Allocation2D, AllocationError};
pub use client::{ChannelClient, Client, ClientError, TestMessage};
pub use config::{ConfigError, GridConfig};
pub use harness::{run, HarnessError, Outcome};
pub use records::{SmallStruct2, StructOfStruct2, ARRAY_LEN};
pub use verify::{Mismatch, Verdict};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  Config(#[from] ConfigError),

  #[error("allocation error: {0}")]
  Allocation(#[from] AllocationError),

  #[error("layout error: {0}")]
  Layout(#[from] struct_layout::LayoutError),

  #[error("client error: {0}")]
  Client(#[from] ClientError),

  #[error(transparent)]
  Harness(#[from] HarnessError)
}
