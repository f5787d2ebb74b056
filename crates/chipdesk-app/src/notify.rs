// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Transient notification slots.
//!
//! Each slot shows at most one message and owns at most one pending hide
//! timer. Timers are deadlines checked by [`NotificationCenter::tick`], which
//! the UI loop calls on every poll, so hides always run on the UI thread.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub mod slot {
    pub const SEARCH_ERROR: &str = "search_error";
    pub const SEARCH_SUCCESS: &str = "search_success";
    pub const CONTACT: &str = "contact_result";
    pub const ADD_CHIP: &str = "add_chip_result";
    pub const EDIT_CHIP: &str = "edit_chip_result";
    pub const CHIP_LIST: &str = "chip_list_message";
    pub const CC_EMAIL: &str = "cc_email_message";
    pub const EMAIL_SETTINGS: &str = "email_settings_result";

    pub const ALL: [&str; 8] = [
        SEARCH_ERROR,
        SEARCH_SUCCESS,
        CONTACT,
        ADD_CHIP,
        EDIT_CHIP,
        CHIP_LIST,
        CC_EMAIL,
        EMAIL_SETTINGS,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
}

impl Tone {
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideTimer {
    pub id: TimerId,
    pub deadline: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotState {
    pub message: String,
    pub tone: Tone,
    pub visible: bool,
    timer: Option<HideTimer>,
}

impl Default for SlotState {
    fn default() -> Self {
        Self {
            message: String::new(),
            tone: Tone::Success,
            visible: false,
            timer: None,
        }
    }
}

impl SlotState {
    pub const fn timer(&self) -> Option<HideTimer> {
        self.timer
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    slots: BTreeMap<&'static str, SlotState>,
    next_timer: u64,
}

impl NotificationCenter {
    pub fn with_slots(names: impl IntoIterator<Item = &'static str>) -> Self {
        let mut center = Self::default();
        for name in names {
            center.register(name);
        }
        center
    }

    pub fn register(&mut self, name: &'static str) {
        self.slots.entry(name).or_default();
    }

    pub fn slot(&self, name: &str) -> Option<&SlotState> {
        self.slots.get(name)
    }

    pub fn visible(&self) -> impl Iterator<Item = (&'static str, &SlotState)> {
        self.slots
            .iter()
            .filter(|(_, state)| state.visible)
            .map(|(name, state)| (*name, state))
    }

    /// Show `message` in `name`. A zero `duration` keeps it up until
    /// [`dismiss`](Self::dismiss); otherwise the slot hides at `now +
    /// duration`. Either way the previous timer for the slot is cancelled.
    pub fn show(
        &mut self,
        name: &str,
        message: impl Into<String>,
        success: bool,
        duration: Duration,
        now: Instant,
    ) {
        let Some(state) = self.slots.get_mut(name) else {
            tracing::warn!(slot = name, "notification slot not found");
            return;
        };

        state.message = message.into();
        state.tone = Tone::from_success(success);
        state.visible = true;

        if let Some(previous) = state.timer.take() {
            tracing::trace!(slot = name, timer = previous.id.get(), "cancel hide timer");
        }
        if duration.is_zero() {
            return;
        }

        self.next_timer = self.next_timer.saturating_add(1);
        state.timer = Some(HideTimer {
            id: TimerId(self.next_timer),
            deadline: now + duration,
        });
    }

    pub fn dismiss(&mut self, name: &str) {
        if let Some(state) = self.slots.get_mut(name) {
            state.visible = false;
            state.timer = None;
        }
    }

    /// Fire every timer whose deadline has passed. Returns the hidden slots.
    pub fn tick(&mut self, now: Instant) -> Vec<&'static str> {
        let mut hidden = Vec::new();
        for (name, state) in &mut self.slots {
            if let Some(timer) = state.timer
                && timer.deadline <= now
            {
                state.visible = false;
                state.timer = None;
                hidden.push(*name);
            }
        }
        hidden
    }

    pub fn pending_timers(&self) -> usize {
        self.slots
            .values()
            .filter(|state| state.timer.is_some())
            .count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .values()
            .filter_map(|state| state.timer.map(|timer| timer.deadline))
            .min()
    }
}
