use crate::domain::command::Command;
use crate::domain::key::KeyInput;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Performs navigation on the palette's behalf.
#[cfg_attr(test, mockall::automock)]
pub trait Router: Send + Sync {
    fn navigate(&self, path: &str) -> Result<()>;
}

/// String key-value persistence. Absent keys are `Ok(None)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read_key(&self, name: &str) -> Result<Option<String>>;
    async fn write_key(&self, name: &str, value: &str) -> Result<()>;
}

/// Told about every command that ran successfully.
#[cfg_attr(test, mockall::automock)]
pub trait ExecutionObserver: Send + Sync {
    fn on_command_executed(&self, command: &Command);
}

/// A stream of global key presses.
pub trait KeyEventSource {
    fn subscribe(&self) -> KeySubscription;
}

/// The single live listener on a [`KeyEventSource`]. Dropping it unregisters.
#[derive(Debug)]
pub struct KeySubscription {
    rx: mpsc::Receiver<KeyInput>,
}

impl KeySubscription {
    pub fn new(rx: mpsc::Receiver<KeyInput>) -> Self {
        Self { rx }
    }

    /// Next key press, or `None` once the source has shut down.
    pub async fn next(&mut self) -> Option<KeyInput> {
        self.rx.recv().await
    }
}
