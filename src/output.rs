//! Single writer thread for everything the host reads from stdout.
//! Workers hand finished lists over a bounded channel with `try_send`; when
//! the host stops reading and the queue fills up, renders are dropped rather
//! than parking a runtime thread on the pipe.

use crate::commands::ResultSink;
use crate::models::{QueryEvent, ResultItem};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use std::thread::JoinHandle;

const QUEUE_CAPACITY: usize = 256;

#[derive(Serialize)]
pub struct RenderMessage<'a> {
    pub event: u64,
    pub items: &'a [ResultItem],
}

pub fn render_line(event: u64, items: &[ResultItem]) -> Result<String, String> {
    serde_json::to_string(&RenderMessage { event, items }).map_err(|e| e.to_string())
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct StdoutSink {
    tx: Mutex<Option<Sender<String>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout(), QUEUE_CAPACITY)
    }

    pub fn with_writer<W: Write + Send + 'static>(out: W, capacity: usize) -> Self {
        let (tx, rx) = bounded::<String>(capacity);
        let writer = std::thread::spawn(move || write_lines(rx, out));
        Self {
            tx: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
        }
    }

    /// Queue one list for the host. Never blocks.
    pub fn send(&self, event: u64, items: &[ResultItem]) {
        let line = match render_line(event, items) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Could not serialize render for event {}: {}", event, e);
                return;
            }
        };
        let tx = lock(&self.tx);
        let Some(tx) = tx.as_ref() else {
            log::warn!("Output closed, dropping render for event {}", event);
            return;
        };
        match tx.try_send(line) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Host is not reading, dropping render for event {}", event)
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Output writer gone, dropping render for event {}", event)
            }
        }
    }

    /// Stop accepting renders and wait until everything queued is written.
    pub fn close(&self) {
        lock(&self.tx).take();
        if let Some(writer) = lock(&self.writer).take() {
            if writer.join().is_err() {
                log::error!("Output writer panicked");
            }
        }
    }
}

fn write_lines<W: Write>(rx: Receiver<String>, mut out: W) {
    while let Ok(line) = rx.recv() {
        if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
            break;
        }
    }
}

impl ResultSink for StdoutSink {
    fn render(&self, event: &QueryEvent, items: Vec<ResultItem>) {
        self.send(event.id, &items);
    }
}
