use thiserror::Error;

/// Result message sent to the process driving the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMessage {
  Passed,
  Failed
}

impl TestMessage {
  /// Message id on the client channel.
  pub const fn code(self) -> u32 {
    match self {
      TestMessage::Passed => 100,
      TestMessage::Failed => 102
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
  #[error("client disconnected before {0:?} was delivered")]
  Disconnected(TestMessage)
}

pub trait Client {
  /// Delivers `message`, returning only once the client has taken it.
  fn send_blocking(&self, message: TestMessage) -> Result<(), ClientError>;
}

/// Rendezvous channel: every send waits for the matching receive.
pub struct ChannelClient {
  tx: flume::Sender<TestMessage>
}

impl ChannelClient {
  pub fn channel() -> (Self, flume::Receiver<TestMessage>) {
    let (tx, rx) = flume::bounded(0);
    (Self { tx }, rx)
  }
}

impl Client for ChannelClient {
  fn send_blocking(&self, message: TestMessage) -> Result<(), ClientError> {
    self
      .tx
      .send(message)
      .map_err(|err| ClientError::Disconnected(err.into_inner()))
  }
}
