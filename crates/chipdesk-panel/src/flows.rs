// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! One-shot form submissions that do not own a list.

use chipdesk_api::{ApiRequest, Failure, Gateway, RequestOutcome, endpoints, success_message};
use chipdesk_app::{ContactFormInput, EmailSettingsFormInput, NotificationCenter, slot};
use std::time::{Duration, Instant};

const RESULT_DURATION: Duration = Duration::from_millis(5000);

fn report_local(
    notices: &mut NotificationCenter,
    slot: &'static str,
    error: &anyhow::Error,
    now: Instant,
) {
    let failure = Failure::local(error);
    notices.show(slot, failure.message, false, RESULT_DURATION, now);
}

/// Show the outcome in `slot`. Returns whether the submission succeeded.
fn report_outcome(
    notices: &mut NotificationCenter,
    slot: &'static str,
    outcome: RequestOutcome,
    success_text: &str,
    failure_prefix: &str,
    now: Instant,
) -> bool {
    match outcome.into_application() {
        RequestOutcome::Success(payload) => {
            let message = success_message(&payload).unwrap_or(success_text);
            notices.show(slot, message, true, RESULT_DURATION, now);
            true
        }
        RequestOutcome::Failure(failure) => {
            notices.show(
                slot,
                failure.prefixed(failure_prefix),
                false,
                RESULT_DURATION,
                now,
            );
            false
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactFlow {
    pub form: ContactFormInput,
}

impl ContactFlow {
    pub fn begin(&mut self, notices: &mut NotificationCenter, now: Instant) -> Option<ApiRequest> {
        if let Err(error) = self.form.validate() {
            report_local(notices, slot::CONTACT, &error, now);
            return None;
        }
        Some(endpoints::submit_contact(&self.form))
    }

    pub fn apply(&mut self, outcome: RequestOutcome, notices: &mut NotificationCenter, now: Instant) {
        if report_outcome(
            notices,
            slot::CONTACT,
            outcome,
            "message sent",
            "submit failed",
            now,
        ) {
            self.form = ContactFormInput::default();
        }
    }

    pub fn run_with(
        &mut self,
        gateway: &dyn Gateway,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> bool {
        let Some(request) = self.begin(notices, now) else {
            return false;
        };
        let outcome = gateway.perform(&request);
        self.apply(outcome, notices, now);
        true
    }
}

/// In-flight email settings submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSubmission {
    pub request: ApiRequest,
    /// A batch CC value went out with the request.
    pub batch_submitted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EmailSettingsFlow {
    pub form: EmailSettingsFormInput,
}

impl EmailSettingsFlow {
    pub fn begin(
        &mut self,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> Option<SettingsSubmission> {
        let payload = match self.form.to_payload() {
            Ok(payload) => payload,
            Err(error) => {
                report_local(notices, slot::EMAIL_SETTINGS, &error, now);
                return None;
            }
        };
        Some(SettingsSubmission {
            request: endpoints::update_email_settings(&payload),
            batch_submitted: payload.cc_email.is_some(),
        })
    }

    /// Returns whether the CC list must be reloaded.
    pub fn apply(
        &mut self,
        batch_submitted: bool,
        outcome: RequestOutcome,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> bool {
        let succeeded = report_outcome(
            notices,
            slot::EMAIL_SETTINGS,
            outcome,
            "email settings updated",
            "update failed",
            now,
        );
        if succeeded && batch_submitted {
            self.form.cc_batch.clear();
            return true;
        }
        false
    }
}
