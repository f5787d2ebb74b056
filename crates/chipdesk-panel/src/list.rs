// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Load, render, bind, mutate, reload.
//!
//! The rendered list is only ever replaced wholesale: every successful load
//! rebuilds all rows and all row bindings under a fresh generation, so a
//! handle taken from an older render resolves to nothing. A failed load or
//! mutation leaves the current rows exactly as they were.

use chipdesk_api::{
    ApiRequest, Failure, Gateway, MALFORMED_RESPONSE_MESSAGE, RequestOutcome, success_message,
};
use chipdesk_app::NotificationCenter;
use std::marker::PhantomData;
use std::time::Instant;

use crate::resource::{ActionKind, Operation, Resource, RowAction};

pub const VANISHED_ROW_MESSAGE: &str = "list changed, request not sent";

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedRow {
    Placeholder(&'static str),
    Item(ItemRow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub key: String,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

impl RenderedRow {
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Placeholder(_) => None,
            Self::Item(row) => Some(&row.key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionHandle {
    generation: u64,
    row: usize,
    kind: ActionKind,
}

impl ActionHandle {
    pub const fn row(self) -> usize {
        self.row
    }

    pub const fn kind(self) -> ActionKind {
        self.kind
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowBindings {
    generation: u64,
    bound: Vec<(ActionHandle, RowAction)>,
}

impl RowBindings {
    fn bind(generation: u64, rows: &[RenderedRow]) -> Self {
        let mut bound = Vec::new();
        for (row, rendered) in rows.iter().enumerate() {
            let RenderedRow::Item(item) = rendered else {
                continue;
            };
            for action in &item.actions {
                let handle = ActionHandle {
                    generation,
                    row,
                    kind: action.kind,
                };
                bound.push((handle, action.clone()));
            }
        }
        Self { generation, bound }
    }

    pub fn resolve(&self, handle: ActionHandle) -> Option<&RowAction> {
        if handle.generation != self.generation {
            return None;
        }
        self.bound
            .iter()
            .find(|(bound, _)| *bound == handle)
            .map(|(_, action)| action)
    }

    pub fn handles(&self) -> impl Iterator<Item = ActionHandle> + '_ {
        self.bound.iter().map(|(handle, _)| *handle)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// Synchronous yes/no gate in front of destructive row actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub operation: Operation,
    pub request: ApiRequest,
}

impl Mutation {
    pub const fn new(operation: Operation, request: ApiRequest) -> Self {
        Self { operation, request }
    }
}

#[derive(Debug, Clone)]
pub struct ListSynchronizer<R: Resource> {
    currency: String,
    items: Vec<R::Item>,
    rows: Vec<RenderedRow>,
    bindings: RowBindings,
    generation: u64,
    loaded: bool,
    resource: PhantomData<R>,
}

impl<R: Resource> ListSynchronizer<R> {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            items: Vec::new(),
            rows: Vec::new(),
            bindings: RowBindings::default(),
            generation: 0,
            loaded: false,
            resource: PhantomData,
        }
    }

    pub fn rows(&self) -> &[RenderedRow] {
        &self.rows
    }

    pub fn items(&self) -> &[R::Item] {
        &self.items
    }

    pub fn bindings(&self) -> &RowBindings {
        &self.bindings
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// True once any load has succeeded.
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn reload_request(&self) -> ApiRequest {
        R::list_request()
    }

    /// Apply a list response. Returns whether the rows were replaced.
    pub fn apply_reload(
        &mut self,
        outcome: RequestOutcome,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> bool {
        let items = match outcome.into_application() {
            RequestOutcome::Success(payload) => match R::decode_list(payload) {
                Ok(items) => items,
                Err(error) => {
                    tracing::debug!(list = R::TITLE, error = %format!("{error:#}"), "decode list");
                    self.report(
                        &Failure::transport(MALFORMED_RESPONSE_MESSAGE),
                        notices,
                        now,
                    );
                    return false;
                }
            },
            RequestOutcome::Failure(failure) => {
                self.report(&failure, notices, now);
                return false;
            }
        };

        self.render(items);
        true
    }

    /// Apply a mutation response. Returns whether the list must be reloaded.
    pub fn apply_mutation(
        &mut self,
        operation: Operation,
        outcome: RequestOutcome,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> bool {
        let feedback = R::feedback(operation);
        match outcome.into_application() {
            RequestOutcome::Success(payload) => {
                let message = success_message(&payload).unwrap_or(feedback.success_text);
                notices.show(feedback.slot, message, true, feedback.success_for, now);
                true
            }
            RequestOutcome::Failure(failure) => {
                notices.show(
                    feedback.slot,
                    failure.prefixed(feedback.failure_prefix),
                    false,
                    feedback.failure_for,
                    now,
                );
                false
            }
        }
    }

    pub fn handle(&self, row: usize, kind: ActionKind) -> Option<ActionHandle> {
        self.bindings
            .handles()
            .find(|handle| handle.row == row && handle.kind == kind)
    }

    /// Handle for `kind` on whichever row currently carries `key`.
    pub fn handle_for_key(&self, key: &str, kind: ActionKind) -> Option<ActionHandle> {
        let row = self.rows.iter().position(|row| row.key() == Some(key))?;
        self.handle(row, kind)
    }

    pub fn action(&self, handle: ActionHandle) -> Option<&RowAction> {
        let action = self.bindings.resolve(handle);
        if action.is_none() {
            tracing::debug!(
                list = R::TITLE,
                handle = ?handle,
                generation = self.generation,
                "stale row action ignored"
            );
        }
        action
    }

    /// Turn a bound toggle or delete into a mutation. Returns `None` for a
    /// stale handle, an edit action, or a declined confirmation.
    pub fn prepare(&self, handle: ActionHandle, confirm: &mut dyn Confirm) -> Option<Mutation> {
        let action = self.action(handle)?;
        let operation = action.operation()?;
        if let Some(prompt) = action.confirm
            && !confirm.confirm(prompt)
        {
            return None;
        }
        Some(Mutation::new(operation, action.request.clone()))
    }

    pub fn reload_with(
        &mut self,
        gateway: &dyn Gateway,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> bool {
        let outcome = gateway.perform(&self.reload_request());
        self.apply_reload(outcome, notices, now)
    }

    /// Perform `mutation` and, on success, reload. Returns whether the
    /// mutation succeeded.
    pub fn mutate_with(
        &mut self,
        gateway: &dyn Gateway,
        mutation: Mutation,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> bool {
        let outcome = gateway.perform(&mutation.request);
        if !self.apply_mutation(mutation.operation, outcome, notices, now) {
            return false;
        }
        self.reload_with(gateway, notices, now);
        true
    }

    /// Report a confirmed action whose row no longer exists.
    pub fn report_vanished(
        &self,
        operation: Operation,
        notices: &mut NotificationCenter,
        now: Instant,
    ) {
        let feedback = R::feedback(operation);
        notices.show(
            feedback.slot,
            format!("{}: {VANISHED_ROW_MESSAGE}", feedback.failure_prefix),
            false,
            feedback.failure_for,
            now,
        );
    }

    fn report(&self, failure: &Failure, notices: &mut NotificationCenter, now: Instant) {
        let feedback = R::feedback(Operation::Load);
        notices.show(
            feedback.slot,
            failure.prefixed(feedback.failure_prefix),
            false,
            feedback.failure_for,
            now,
        );
    }

    fn render(&mut self, items: Vec<R::Item>) {
        self.rows = if items.is_empty() {
            vec![RenderedRow::Placeholder(R::PLACEHOLDER)]
        } else {
            items
                .iter()
                .map(|item| {
                    RenderedRow::Item(ItemRow {
                        key: R::row_key(item),
                        cells: R::cells(item, &self.currency),
                        actions: R::actions(item),
                    })
                })
                .collect()
        };
        self.items = items;
        self.generation += 1;
        self.bindings = RowBindings::bind(self.generation, &self.rows);
        self.loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{ListSynchronizer, RenderedRow};
    use crate::resource::{ActionKind, CcEmailResource, ChipResource};
    use chipdesk_api::{Failure, RequestOutcome};
    use chipdesk_app::{NotificationCenter, Tone, slot};
    use chipdesk_testkit::{
        ChipFaker, cc_email_list_json, chip_list_json, fixture_datetime, sample_cc_emails,
        sample_chips,
    };
    use serde_json::json;
    use std::time::Instant;

    fn notices() -> NotificationCenter {
        NotificationCenter::with_slots(slot::ALL)
    }

    #[test]
    fn empty_collection_renders_one_placeholder() {
        let mut list = ListSynchronizer::<CcEmailResource>::new("¥");
        let mut notices = notices();
        let rendered = list.apply_reload(
            RequestOutcome::Success(cc_email_list_json(&[])),
            &mut notices,
            Instant::now(),
        );
        assert!(rendered);
        assert_eq!(list.rows(), &[RenderedRow::Placeholder("no cc emails")]);
        assert!(list.bindings().is_empty());
    }

    #[test]
    fn items_render_one_row_each_with_bound_actions() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        list.apply_reload(
            RequestOutcome::Success(chip_list_json(&sample_chips())),
            &mut notices,
            Instant::now(),
        );
        assert_eq!(list.rows().len(), 3);
        assert_eq!(list.bindings().len(), 6);
        for row in 0..3 {
            assert!(list.handle(row, ActionKind::Edit).is_some());
            assert!(list.handle(row, ActionKind::Delete).is_some());
            assert!(list.handle(row, ActionKind::Toggle).is_none());
        }
    }

    #[test]
    fn cc_rows_show_status_and_created_date() {
        let mut list = ListSynchronizer::<CcEmailResource>::new("¥");
        let mut notices = notices();
        list.apply_reload(
            RequestOutcome::Success(cc_email_list_json(&sample_cc_emails())),
            &mut notices,
            Instant::now(),
        );

        let RenderedRow::Item(first) = &list.rows()[0] else {
            panic!("first cc email should render as an item");
        };
        let created = fixture_datetime().split('T').next().unwrap_or_default();
        assert_eq!(first.cells[1], "active");
        assert_eq!(first.cells[2], created);
        let RenderedRow::Item(second) = &list.rows()[1] else {
            panic!("second cc email should render as an item");
        };
        assert_eq!(second.cells[2], "-");
    }

    #[test]
    fn failed_reload_keeps_previous_rows() {
        let mut list = ListSynchronizer::<CcEmailResource>::new("¥");
        let mut notices = notices();
        let now = Instant::now();
        list.apply_reload(
            RequestOutcome::Success(cc_email_list_json(&sample_cc_emails())),
            &mut notices,
            now,
        );
        let before = list.rows().to_vec();
        let generation = list.generation();

        let rendered = list.apply_reload(
            RequestOutcome::Failure(Failure::transport("network error, please retry")),
            &mut notices,
            now,
        );
        assert!(!rendered);
        assert_eq!(list.rows(), before.as_slice());
        assert_eq!(list.generation(), generation);
        let state = notices.slot(slot::CC_EMAIL).expect("slot registered");
        assert_eq!(state.tone, Tone::Failure);
        assert_eq!(state.message, "load failed: network error, please retry");
    }

    #[test]
    fn error_field_and_malformed_payload_are_failures() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        let now = Instant::now();

        assert!(!list.apply_reload(
            RequestOutcome::Success(json!({"error": "database unavailable"})),
            &mut notices,
            now,
        ));
        assert_eq!(
            notices.slot(slot::CHIP_LIST).map(|state| state.message.as_str()),
            Some("load failed: database unavailable")
        );

        assert!(!list.apply_reload(
            RequestOutcome::Success(json!({"chips": "nope"})),
            &mut notices,
            now,
        ));
        assert!(!list.is_loaded());
        assert!(list.rows().is_empty());
    }

    #[test]
    fn rerender_invalidates_old_handles() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        let now = Instant::now();
        let payload = chip_list_json(&sample_chips());
        list.apply_reload(RequestOutcome::Success(payload.clone()), &mut notices, now);
        let stale = list.handle(0, ActionKind::Delete).expect("bound handle");

        list.apply_reload(RequestOutcome::Success(payload), &mut notices, now);
        assert!(list.action(stale).is_none());
        let mut confirm = |_: &str| true;
        assert!(list.prepare(stale, &mut confirm).is_none());
        let fresh = list.handle(0, ActionKind::Delete).expect("rebound handle");
        assert!(list.action(fresh).is_some());
    }

    #[test]
    fn key_lookup_follows_rows_across_rerenders() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        let now = Instant::now();
        list.apply_reload(
            RequestOutcome::Success(chip_list_json(&sample_chips())),
            &mut notices,
            now,
        );
        let before = list.handle_for_key("chip-2", ActionKind::Delete).expect("bound");
        assert_eq!(before.row(), 1);

        let shifted = sample_chips().into_iter().skip(1).collect::<Vec<_>>();
        list.apply_reload(RequestOutcome::Success(chip_list_json(&shifted)), &mut notices, now);
        assert!(list.action(before).is_none());
        let after = list.handle_for_key("chip-2", ActionKind::Delete).expect("rebound");
        assert_eq!(after.row(), 0);
        assert!(list.handle_for_key("chip-1", ActionKind::Delete).is_none());
    }

    #[test]
    fn large_payload_binds_two_actions_per_row() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        let chips = ChipFaker::new(11).chips(200);
        list.apply_reload(
            RequestOutcome::Success(chip_list_json(&chips)),
            &mut notices,
            Instant::now(),
        );

        assert_eq!(list.rows().len(), 200);
        assert_eq!(list.bindings().len(), 400);
        for (row, chip) in chips.iter().enumerate() {
            assert_eq!(list.rows()[row].key(), Some(format!("chip-{}", chip.id).as_str()));
            assert!(list.handle(row, ActionKind::Edit).is_some());
            assert!(list.handle(row, ActionKind::Delete).is_some());
        }
    }

    #[test]
    fn declined_confirmation_yields_no_mutation() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        list.apply_reload(
            RequestOutcome::Success(chip_list_json(&sample_chips())),
            &mut notices,
            Instant::now(),
        );
        let handle = list.handle(1, ActionKind::Delete).expect("bound handle");

        let mut prompts = Vec::new();
        let mut decline = |prompt: &str| {
            prompts.push(prompt.to_owned());
            false
        };
        assert!(list.prepare(handle, &mut decline).is_none());
        assert_eq!(prompts, vec!["delete this chip?".to_owned()]);
    }

    #[test]
    fn failed_mutation_joins_details_and_skips_reload() {
        let mut list = ListSynchronizer::<ChipResource>::new("¥");
        let mut notices = notices();
        let reload = list.apply_mutation(
            crate::Operation::Create,
            RequestOutcome::Failure(Failure::application(
                "form validation failed",
                vec!["model: required".to_owned(), "price: invalid".to_owned()],
            )),
            &mut notices,
            Instant::now(),
        );
        assert!(!reload);
        assert_eq!(
            notices.slot(slot::ADD_CHIP).map(|state| state.message.as_str()),
            Some("add failed: model: required, price: invalid")
        );
    }
}
