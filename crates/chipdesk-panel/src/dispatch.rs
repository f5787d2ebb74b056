// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use chipdesk_api::{ApiRequest, Gateway, RequestOutcome};
use chipdesk_app::ChipId;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::resource::Operation;
use crate::search::BusyGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Chips,
    CcEmails,
}

/// What a completion belongs to, so the UI thread knows how to apply it.
#[derive(Debug)]
pub enum Task {
    Search { guard: BusyGuard },
    Contact,
    Reload(ListKind),
    Mutate { list: ListKind, operation: Operation },
    SaveChip { id: ChipId },
    FetchChip,
    EmailSettings { batch_submitted: bool },
}

#[derive(Debug)]
pub struct Completion {
    pub task: Task,
    pub outcome: RequestOutcome,
}

/// Runs each request on its own worker thread and hands completions back in
/// arrival order.
pub struct Dispatcher {
    gateway: Arc<dyn Gateway>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gateway,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn submit(&mut self, task: Task, request: ApiRequest) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tracing::debug!(%request, ?task, "dispatch");

        thread::spawn(move || {
            let outcome = gateway.perform(&request);
            if tx.send(Completion { task, outcome }).is_err() {
                tracing::debug!("completion dropped; panel is gone");
            }
        });
        self.in_flight += 1;
    }

    pub fn try_next(&mut self) -> Option<Completion> {
        match self.rx.try_recv() {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn wait_next(&mut self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
