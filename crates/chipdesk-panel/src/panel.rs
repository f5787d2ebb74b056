// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use chipdesk_api::{
    Failure, Gateway, MALFORMED_RESPONSE_MESSAGE, RequestOutcome, decode, endpoints,
};
use chipdesk_app::{
    AppCommand, AppState, CcEmailFormInput, ChipEditSurface, ChipFormInput, ChipRecord, FormKind,
    NotificationCenter, TabKind, slot,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::dispatch::{Completion, Dispatcher, ListKind, Task};
use crate::flows::{ContactFlow, EmailSettingsFlow};
use crate::list::{ActionHandle, Confirm, ListSynchronizer, Mutation};
use crate::resource::{ActionKind, CcEmailResource, ChipResource, Operation, Resource};
use crate::search::SearchFlow;

const EDITOR_FAILURE_DURATION: Duration = Duration::from_millis(5000);

/// The admin panel controller. Owns every piece of UI state and is driven
/// from a single thread; requests run on workers and come back through
/// [`pump`](Self::pump) or [`wait_idle`](Self::wait_idle).
pub struct AdminPanel {
    pub state: AppState,
    pub search: SearchFlow,
    pub contact: ContactFlow,
    pub settings: EmailSettingsFlow,
    pub chip_form: ChipFormInput,
    pub cc_form: CcEmailFormInput,
    notices: NotificationCenter,
    editor: Option<ChipEditSurface>,
    chips: ListSynchronizer<ChipResource>,
    cc_emails: ListSynchronizer<CcEmailResource>,
    dispatcher: Dispatcher,
    currency: String,
}

impl AdminPanel {
    pub fn new(gateway: Arc<dyn Gateway>, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        Self {
            state: AppState::default(),
            search: SearchFlow::default(),
            contact: ContactFlow::default(),
            settings: EmailSettingsFlow::default(),
            chip_form: ChipFormInput::default(),
            cc_form: CcEmailFormInput::default(),
            notices: NotificationCenter::with_slots(slot::ALL),
            editor: None,
            chips: ListSynchronizer::new(currency.clone()),
            cc_emails: ListSynchronizer::new(currency.clone()),
            dispatcher: Dispatcher::new(gateway),
            currency,
        }
    }

    pub fn notices(&self) -> &NotificationCenter {
        &self.notices
    }

    pub fn dismiss(&mut self, name: &str) {
        self.notices.dismiss(name);
    }

    pub fn chips(&self) -> &ListSynchronizer<ChipResource> {
        &self.chips
    }

    pub fn cc_emails(&self) -> &ListSynchronizer<CcEmailResource> {
        &self.cc_emails
    }

    pub fn editor(&self) -> Option<&ChipEditSurface> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut ChipEditSurface> {
        self.editor.as_mut()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    pub fn start(&mut self) {
        self.reload_chips();
        self.reload_cc_emails();
    }

    pub fn submit_search(&mut self, now: Instant) -> bool {
        let Some((request, guard)) = self.search.begin(&mut self.notices, now) else {
            return false;
        };
        self.dispatcher.submit(Task::Search { guard }, request);
        true
    }

    /// Pre-fill the contact message from the displayed hit and switch to the
    /// contact tab.
    pub fn inquire(&mut self) -> bool {
        let Some(message) = self.search.inquiry_message() else {
            return false;
        };
        self.contact.form.message = message;
        self.state.dispatch(AppCommand::SelectTab(TabKind::Contact));
        true
    }

    pub fn submit_contact(&mut self, now: Instant) -> bool {
        let Some(request) = self.contact.begin(&mut self.notices, now) else {
            return false;
        };
        self.dispatcher.submit(Task::Contact, request);
        true
    }

    pub fn reload_chips(&mut self) {
        let request = self.chips.reload_request();
        self.dispatcher.submit(Task::Reload(ListKind::Chips), request);
    }

    pub fn reload_cc_emails(&mut self) {
        let request = self.cc_emails.reload_request();
        self.dispatcher
            .submit(Task::Reload(ListKind::CcEmails), request);
    }

    pub fn add_chip(&mut self, now: Instant) -> bool {
        let payload = match self.chip_form.to_payload() {
            Ok(payload) => payload,
            Err(error) => {
                report_local::<ChipResource>(&mut self.notices, Operation::Create, &error, now);
                return false;
            }
        };
        self.mutate(
            ListKind::Chips,
            Mutation::new(Operation::Create, endpoints::add_chip(&payload)),
        );
        true
    }

    /// Fetch the row's chip into the edit surface.
    pub fn open_chip_editor(&mut self, handle: ActionHandle) -> bool {
        if handle.kind() != ActionKind::Edit {
            return false;
        }
        let Some(action) = self.chips.action(handle) else {
            return false;
        };
        let request = action.request.clone();
        self.dispatcher.submit(Task::FetchChip, request);
        true
    }

    /// Send the edit surface as an update. The server keeps whichever
    /// update lands last.
    pub fn save_chip_edit(&mut self, now: Instant) -> bool {
        let Some(editor) = &self.editor else {
            return false;
        };
        let payload = match editor.form.to_payload() {
            Ok(payload) => payload,
            Err(error) => {
                report_local::<ChipResource>(&mut self.notices, Operation::Update, &error, now);
                return false;
            }
        };
        let id = editor.id;
        self.dispatcher
            .submit(Task::SaveChip { id }, endpoints::update_chip(id, &payload));
        true
    }

    pub fn close_chip_editor(&mut self) {
        self.editor = None;
        if self.state.form() == Some(FormKind::EditChip) {
            self.state.dispatch(AppCommand::ExitToNav);
        }
    }

    pub fn delete_chip(&mut self, handle: ActionHandle, confirm: &mut dyn Confirm) -> bool {
        if handle.kind() != ActionKind::Delete {
            return false;
        }
        let Some(mutation) = self.chips.prepare(handle, confirm) else {
            return false;
        };
        self.mutate(ListKind::Chips, mutation);
        true
    }

    /// Delete the row that currently carries `key`. When a reload has
    /// removed it since the prompt was shown, the list slot says so and
    /// nothing is sent.
    pub fn delete_row(
        &mut self,
        list: ListKind,
        key: &str,
        confirm: &mut dyn Confirm,
        now: Instant,
    ) -> bool {
        let handle = match list {
            ListKind::Chips => self.chips.handle_for_key(key, ActionKind::Delete),
            ListKind::CcEmails => self.cc_emails.handle_for_key(key, ActionKind::Delete),
        };
        let Some(handle) = handle else {
            tracing::debug!(?list, key, "delete target vanished before confirmation");
            match list {
                ListKind::Chips => {
                    self.chips
                        .report_vanished(Operation::Delete, &mut self.notices, now);
                }
                ListKind::CcEmails => {
                    self.cc_emails
                        .report_vanished(Operation::Delete, &mut self.notices, now);
                }
            }
            return false;
        };
        match list {
            ListKind::Chips => self.delete_chip(handle, confirm),
            ListKind::CcEmails => self.delete_cc_email(handle, confirm),
        }
    }

    pub fn add_cc_email(&mut self, now: Instant) -> bool {
        let email = match self.cc_form.validated_email() {
            Ok(email) => email,
            Err(error) => {
                report_local::<CcEmailResource>(&mut self.notices, Operation::Create, &error, now);
                return false;
            }
        };
        self.mutate(
            ListKind::CcEmails,
            Mutation::new(Operation::Create, endpoints::add_cc_email(&email)),
        );
        true
    }

    pub fn toggle_cc_email(&mut self, handle: ActionHandle) -> bool {
        if handle.kind() != ActionKind::Toggle {
            return false;
        }
        let mut no_prompt = |_: &str| true;
        let Some(mutation) = self.cc_emails.prepare(handle, &mut no_prompt) else {
            return false;
        };
        self.mutate(ListKind::CcEmails, mutation);
        true
    }

    pub fn delete_cc_email(&mut self, handle: ActionHandle, confirm: &mut dyn Confirm) -> bool {
        if handle.kind() != ActionKind::Delete {
            return false;
        }
        let Some(mutation) = self.cc_emails.prepare(handle, confirm) else {
            return false;
        };
        self.mutate(ListKind::CcEmails, mutation);
        true
    }

    pub fn update_email_settings(&mut self, now: Instant) -> bool {
        let Some(submission) = self.settings.begin(&mut self.notices, now) else {
            return false;
        };
        self.dispatcher.submit(
            Task::EmailSettings {
                batch_submitted: submission.batch_submitted,
            },
            submission.request,
        );
        true
    }

    /// Apply every completion that has already arrived.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.dispatcher.try_next() {
            self.apply(completion, now);
            applied += 1;
        }
        applied
    }

    pub fn tick(&mut self, now: Instant) -> Vec<&'static str> {
        self.notices.tick(now)
    }

    /// Block until no request is in flight, applying completions as they
    /// arrive, including any reloads they trigger.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while self.dispatcher.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                bail!(
                    "{} request(s) still in flight after {}ms -- is the server responding?",
                    self.dispatcher.in_flight(),
                    timeout.as_millis()
                );
            }
            if let Some(completion) = self.dispatcher.wait_next(remaining) {
                self.apply(completion, Instant::now());
            }
        }
        Ok(())
    }

    fn mutate(&mut self, list: ListKind, mutation: Mutation) {
        self.dispatcher.submit(
            Task::Mutate {
                list,
                operation: mutation.operation,
            },
            mutation.request,
        );
    }

    fn apply(&mut self, completion: Completion, now: Instant) {
        let Completion { task, outcome } = completion;
        match task {
            Task::Search { guard } => {
                self.search
                    .apply(outcome, &mut self.notices, now, &self.currency);
                drop(guard);
            }
            Task::Contact => self.contact.apply(outcome, &mut self.notices, now),
            Task::Reload(ListKind::Chips) => {
                self.chips.apply_reload(outcome, &mut self.notices, now);
            }
            Task::Reload(ListKind::CcEmails) => {
                self.cc_emails.apply_reload(outcome, &mut self.notices, now);
            }
            Task::Mutate {
                list: ListKind::Chips,
                operation,
            } => {
                if !self
                    .chips
                    .apply_mutation(operation, outcome, &mut self.notices, now)
                {
                    return;
                }
                if operation == Operation::Create {
                    self.chip_form = ChipFormInput::default();
                }
                self.reload_chips();
            }
            Task::SaveChip { id } => {
                if !self
                    .chips
                    .apply_mutation(Operation::Update, outcome, &mut self.notices, now)
                {
                    return;
                }
                // Another chip's editor may have opened while this one saved.
                if self.editor.as_ref().is_some_and(|editor| editor.id == id) {
                    self.close_chip_editor();
                }
                self.reload_chips();
            }
            Task::Mutate {
                list: ListKind::CcEmails,
                operation,
            } => {
                if !self
                    .cc_emails
                    .apply_mutation(operation, outcome, &mut self.notices, now)
                {
                    return;
                }
                if operation == Operation::Create {
                    self.cc_form = CcEmailFormInput::default();
                }
                self.reload_cc_emails();
            }
            Task::FetchChip => self.apply_fetched_chip(outcome, now),
            Task::EmailSettings { batch_submitted } => {
                if self
                    .settings
                    .apply(batch_submitted, outcome, &mut self.notices, now)
                {
                    self.reload_cc_emails();
                }
            }
        }
    }

    fn apply_fetched_chip(&mut self, outcome: RequestOutcome, now: Instant) {
        let chip = match outcome.into_application() {
            RequestOutcome::Success(payload) => decode::<ChipRecord>(payload, "chip")
                .map_err(|error| {
                    tracing::debug!(error = %format!("{error:#}"), "decode chip");
                    Failure::transport(MALFORMED_RESPONSE_MESSAGE)
                }),
            RequestOutcome::Failure(failure) => Err(failure),
        };
        match chip {
            Ok(chip) => {
                self.editor = Some(ChipEditSurface {
                    id: chip.id,
                    form: ChipFormInput::from_record(&chip),
                });
                self.state.dispatch(AppCommand::OpenForm(FormKind::EditChip));
            }
            Err(failure) => self.notices.show(
                slot::EDIT_CHIP,
                failure.prefixed("load failed"),
                false,
                EDITOR_FAILURE_DURATION,
                now,
            ),
        }
    }
}

fn report_local<R: Resource>(
    notices: &mut NotificationCenter,
    operation: Operation,
    error: &anyhow::Error,
    now: Instant,
) {
    let feedback = R::feedback(operation);
    let failure = Failure::local(error);
    notices.show(feedback.slot, failure.message, false, feedback.failure_for, now);
}
