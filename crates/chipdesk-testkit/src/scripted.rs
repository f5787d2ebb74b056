// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use chipdesk_api::{ApiRequest, Failure, Gateway, Method, RequestOutcome};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// In-memory [`Gateway`] that answers from per-route reply queues and
/// records every request it sees.
///
/// A route with an empty queue falls back to its `always` reply, then to a
/// transport failure naming the route.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    queued: Mutex<HashMap<String, VecDeque<RequestOutcome>>>,
    always: Mutex<HashMap<String, RequestOutcome>>,
    seen: Mutex<Vec<ApiRequest>>,
    held: Mutex<bool>,
    released: Condvar,
}

fn route(method: Method, path: &str) -> String {
    format!("{method} {path}")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: Method, path: &str, outcome: RequestOutcome) -> &Self {
        lock(&self.queued)
            .entry(route(method, path))
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn reply_json(&self, method: Method, path: &str, payload: Value) -> &Self {
        self.reply(method, path, RequestOutcome::Success(payload))
    }

    pub fn reply_error(&self, method: Method, path: &str, message: &str, details: &[&str]) -> &Self {
        let details = details.iter().map(|detail| (*detail).to_owned()).collect();
        self.reply(
            method,
            path,
            RequestOutcome::Failure(Failure::application(message, details)),
        )
    }

    pub fn always(&self, method: Method, path: &str, outcome: RequestOutcome) -> &Self {
        lock(&self.always).insert(route(method, path), outcome);
        self
    }

    /// Block every `perform` call until [`release`](Self::release).
    pub fn hold(&self) {
        *lock(&self.held) = true;
    }

    pub fn release(&self) {
        *lock(&self.held) = false;
        self.released.notify_all();
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.seen).clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        lock(&self.seen)
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<ApiRequest> {
        lock(&self.seen)
            .iter()
            .rev()
            .find(|request| request.method == method && request.path == path)
            .cloned()
    }

    fn wait_until_released(&self) {
        let mut held = lock(&self.held);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Gateway for ScriptedGateway {
    fn perform(&self, request: &ApiRequest) -> RequestOutcome {
        lock(&self.seen).push(request.clone());
        self.wait_until_released();

        let key = route(request.method, &request.path);
        if let Some(outcome) = lock(&self.queued)
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }
        if let Some(outcome) = lock(&self.always).get(&key) {
            return outcome.clone();
        }
        RequestOutcome::Failure(Failure::transport(format!("no scripted reply for {key}")))
    }
}
