use crate::command::Command;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// MULTI state of one connection: idle, or queuing commands for EXEC.
#[derive(Debug, Default)]
pub struct Transaction {
    queue: Option<Vec<Command>>,
}

impl Transaction {
    pub fn is_queuing(&self) -> bool {
        self.queue.is_some()
    }

    /// Enter queuing mode with an empty queue. A second MULTI starts over.
    pub fn begin(&mut self) {
        self.queue = Some(Vec::new());
    }

    /// Append a command; it is not looked at until EXEC. Returns false when
    /// no transaction is open.
    pub fn enqueue(&mut self, command: Command) -> bool {
        match &mut self.queue {
            Some(queue) => {
                queue.push(command);
                true
            }
            None => false,
        }
    }

    /// Leave queuing mode and hand back the queued commands, if any were open.
    pub fn take(&mut self) -> Option<Vec<Command>> {
        self.queue.take()
    }

    pub fn queued(&self) -> usize {
        self.queue.as_ref().map_or(0, Vec::len)
    }
}

/// Per-connection state.
#[derive(Debug)]
pub struct ClientState {
    pub id: u64,
    pub transaction: Transaction,
    pub should_close: bool,
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientState {
    pub fn new() -> Self {
        ClientState {
            id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            transaction: Transaction::default(),
            should_close: false,
        }
    }
}
