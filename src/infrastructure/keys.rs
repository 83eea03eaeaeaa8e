use crate::app::keymap::key_input_from_event;
use crate::domain::key::KeyInput;
use crate::domain::ports::{KeyEventSource, KeySubscription};
use crossterm::event::{self, Event};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 100;

type Listener = Arc<Mutex<Option<mpsc::Sender<KeyInput>>>>;

/// A key source fed by [`KeyEmitter`]s. Subscribing again replaces the
/// previous listener, whose subscription then ends.
#[derive(Debug, Default)]
pub struct ChannelKeySource {
    listener: Listener,
}

impl ChannelKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitter(&self) -> KeyEmitter {
        KeyEmitter {
            listener: Arc::clone(&self.listener),
        }
    }
}

impl KeyEventSource for ChannelKeySource {
    fn subscribe(&self) -> KeySubscription {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        *self.listener.lock() = Some(tx);
        KeySubscription::new(rx)
    }
}

/// Sending half of a [`ChannelKeySource`].
#[derive(Debug, Clone)]
pub struct KeyEmitter {
    listener: Listener,
}

impl KeyEmitter {
    fn sender(&self) -> Option<mpsc::Sender<KeyInput>> {
        self.listener.lock().clone()
    }

    /// Delivers a key. Returns `false` if nobody is listening.
    pub async fn emit(&self, input: KeyInput) -> bool {
        match self.sender() {
            Some(tx) => tx.send(input).await.is_ok(),
            None => false,
        }
    }

    /// Like [`emit`](Self::emit) for use off the async runtime.
    pub fn blocking_emit(&self, input: KeyInput) -> bool {
        match self.sender() {
            Some(tx) => tx.blocking_send(input).is_ok(),
            None => false,
        }
    }

    /// Shuts the source down; the listener sees the end of its stream.
    pub fn close(&self) {
        self.listener.lock().take();
    }
}

/// Reads terminal key presses on a blocking thread and forwards them until
/// `quit` is pressed, the listener goes away, or reading fails.
pub fn spawn_terminal_reader(emitter: KeyEmitter, quit: KeyInput) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    let Some(input) = key_input_from_event(key) else {
                        continue;
                    };
                    if input == quit || !emitter.blocking_emit(input) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "terminal read failed");
                    break;
                }
            }
        }
        emitter.close();
    })
}
