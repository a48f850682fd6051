//! Write-behind adapter that moves persistence off the caller's thread.
//!
//! # Responsibility
//! - Accept `set` calls without waiting for the inner store.
//! - Apply writes on one background thread in submission order.
//!
//! # Invariants
//! - Writes are applied in the order they were submitted; last write wins.
//! - `get` and `flush` are answered after every write queued before them.
//! - Failed background writes are logged and dropped, never retried.
//! - Dropping the adapter drains the queue and joins the writer thread.

use super::{DurableStore, KvError, KvResult};
use log::{error, info, warn};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

const WRITER_THREAD_NAME: &str = "agenda-kv-writer";

enum Command {
    Set {
        key: String,
        value: Value,
    },
    Get {
        key: String,
        reply: Sender<KvResult<Option<Value>>>,
    },
    Flush {
        reply: Sender<()>,
    },
}

/// Durable store whose writes are fire-and-forget.
pub struct WriteBehindStore {
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl WriteBehindStore {
    /// Moves `inner` onto a dedicated writer thread.
    ///
    /// # Errors
    /// - `Unavailable` when the thread cannot be spawned.
    pub fn spawn<S>(inner: S) -> KvResult<Self>
    where
        S: DurableStore + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(inner, receiver))
            .map_err(|err| KvError::Unavailable(format!("failed to spawn writer: {err}")))?;

        info!("event=kv_writer_start module=kv status=ok");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Blocks until every write submitted so far has been applied.
    pub fn flush(&self) -> KvResult<()> {
        let (reply, response) = mpsc::channel();
        self.send(Command::Flush { reply })?;
        response.recv().map_err(|_| writer_stopped())
    }

    fn send(&self, command: Command) -> KvResult<()> {
        self.sender
            .as_ref()
            .ok_or_else(writer_stopped)?
            .send(command)
            .map_err(|_| writer_stopped())
    }
}

impl DurableStore for WriteBehindStore {
    fn get(&self, key: &str) -> KvResult<Option<Value>> {
        let (reply, response) = mpsc::channel();
        self.send(Command::Get {
            key: key.to_string(),
            reply,
        })?;
        response.recv().map_err(|_| writer_stopped())?
    }

    fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        self.send(Command::Set {
            key: key.to_string(),
            value: value.clone(),
        })
    }
}

impl Drop for WriteBehindStore {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop after the queued commands.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=kv_writer_stop module=kv status=error error_code=writer_panicked");
            }
        }
    }
}

fn run_writer<S: DurableStore>(inner: S, commands: Receiver<Command>) {
    for command in commands {
        match command {
            Command::Set { key, value } => {
                if let Err(err) = inner.set(&key, &value) {
                    warn!("event=kv_write module=kv status=error key={key} error={err}");
                }
            }
            Command::Get { key, reply } => {
                let _ = reply.send(inner.get(&key));
            }
            Command::Flush { reply } => {
                let _ = reply.send(());
            }
        }
    }
    info!("event=kv_writer_stop module=kv status=ok");
}

fn writer_stopped() -> KvError {
    KvError::Unavailable("write-behind writer has stopped".to_string())
}

#[cfg(test)]
mod tests {
    use super::WriteBehindStore;
    use crate::kv::{DurableStore, MemoryKvStore};
    use serde_json::json;

    #[test]
    fn writes_are_applied_in_submission_order() {
        let inner = MemoryKvStore::new();
        let store = WriteBehindStore::spawn(inner.clone()).expect("writer should spawn");

        for round in 0..50 {
            store.set("tareas", &json!([round])).expect("set should queue");
        }
        store.flush().expect("flush should complete");

        assert_eq!(inner.get("tareas").expect("get should succeed"), Some(json!([49])));
    }

    #[test]
    fn get_observes_previously_queued_writes() {
        let store = WriteBehindStore::spawn(MemoryKvStore::new()).expect("writer should spawn");
        store.set("k", &json!("v")).expect("set should queue");
        assert_eq!(store.get("k").expect("get should see queued write"), Some(json!("v")));
    }

    #[test]
    fn drop_drains_pending_writes() {
        let inner = MemoryKvStore::new();
        {
            let store = WriteBehindStore::spawn(inner.clone()).expect("writer should spawn");
            store.set("k", &json!(1)).expect("set should queue");
        }
        assert_eq!(inner.get("k").expect("get should succeed"), Some(json!(1)));
    }
}
