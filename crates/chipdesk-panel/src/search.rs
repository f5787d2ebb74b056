// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use chipdesk_api::{
    ApiRequest, Failure, Gateway, MALFORMED_RESPONSE_MESSAGE, RequestOutcome, decode, endpoints,
};
use chipdesk_app::{
    NotificationCenter, SearchDisplay, SearchFormInput, SearchHit, parse_search_query, slot,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub const SEARCH_LABEL: &str = "search";
pub const SEARCHING_LABEL: &str = "searching...";
pub const SEARCH_SUCCEEDED: &str = "search succeeded";

const FAILURE_DURATION: Duration = Duration::from_millis(5000);
const SUCCESS_DURATION: Duration = Duration::from_millis(10_000);

/// Submit control shared between the UI and the in-flight request.
#[derive(Debug, Clone, Default)]
pub struct SubmitButton {
    busy: Arc<AtomicBool>,
}

impl SubmitButton {
    pub fn is_disabled(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn label(&self) -> &'static str {
        if self.is_disabled() {
            SEARCHING_LABEL
        } else {
            SEARCH_LABEL
        }
    }

    /// Disable the button until the returned guard drops. `None` while a
    /// previous guard is still alive.
    pub fn engage(&self) -> Option<BusyGuard> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(BusyGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

/// Re-enables its [`SubmitButton`] on drop, whichever way the request ends.
#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchFlow {
    pub input: SearchFormInput,
    button: SubmitButton,
    display: Option<SearchDisplay>,
    focus_requested: bool,
}

impl SearchFlow {
    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    /// The detail panel; `None` while hidden.
    pub fn display(&self) -> Option<&SearchDisplay> {
        self.display.as_ref()
    }

    /// Consume a pending request to move focus back to the model input.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Validate the input and engage the button. Returns nothing when the
    /// query is blank or a search is already in flight.
    pub fn begin(
        &mut self,
        notices: &mut NotificationCenter,
        now: Instant,
    ) -> Option<(ApiRequest, BusyGuard)> {
        let model = match parse_search_query(&self.input.model) {
            Ok(model) => model,
            Err(error) => {
                let failure = Failure::local(&error);
                notices.show(slot::SEARCH_ERROR, failure.message, false, FAILURE_DURATION, now);
                self.focus_requested = true;
                return None;
            }
        };
        let guard = self.button.engage()?;
        Some((endpoints::search(&model), guard))
    }

    pub fn apply(
        &mut self,
        outcome: RequestOutcome,
        notices: &mut NotificationCenter,
        now: Instant,
        currency: &str,
    ) {
        let hit = match outcome.into_application() {
            RequestOutcome::Success(payload) => decode::<SearchHit>(payload, "search hit")
                .map_err(|error| {
                    tracing::debug!(error = %format!("{error:#}"), "decode search hit");
                    Failure::transport(MALFORMED_RESPONSE_MESSAGE)
                }),
            RequestOutcome::Failure(failure) => Err(failure),
        };

        match hit {
            Ok(hit) => {
                self.display = Some(SearchDisplay::from_hit(&hit, currency));
                notices.dismiss(slot::SEARCH_ERROR);
                notices.show(slot::SEARCH_SUCCESS, SEARCH_SUCCEEDED, true, SUCCESS_DURATION, now);
            }
            Err(failure) => {
                self.display = None;
                notices.show(
                    slot::SEARCH_ERROR,
                    failure.display_text(),
                    false,
                    FAILURE_DURATION,
                    now,
                );
            }
        }
    }

    /// Run one search to completion on the calling thread. Returns whether a
    /// request was issued.
    pub fn run_with(
        &mut self,
        gateway: &dyn Gateway,
        notices: &mut NotificationCenter,
        now: Instant,
        currency: &str,
    ) -> bool {
        let Some((request, _guard)) = self.begin(notices, now) else {
            return false;
        };
        let outcome = gateway.perform(&request);
        self.apply(outcome, notices, now, currency);
        true
    }

    /// Contact-form pre-fill for the model currently on display.
    pub fn inquiry_message(&self) -> Option<String> {
        let display = self.display.as_ref().filter(|display| display.has_model())?;
        Some(format!(
            "I'm interested in model {}, please send a detailed quote and lead time.",
            display.model
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{SEARCH_LABEL, SEARCHING_LABEL, SearchFlow};
    use chipdesk_api::{Body, Failure, RequestOutcome};
    use chipdesk_app::{NotificationCenter, StockTier, Tone, slot};
    use serde_json::json;
    use std::time::Instant;

    fn notices() -> NotificationCenter {
        NotificationCenter::with_slots(slot::ALL)
    }

    #[test]
    fn blank_query_requests_focus_and_issues_nothing() {
        let mut flow = SearchFlow::default();
        flow.input.model = "   ".to_owned();
        let mut notices = notices();

        assert!(flow.begin(&mut notices, Instant::now()).is_none());
        assert!(flow.take_focus_request());
        assert!(!flow.take_focus_request());
        assert!(!flow.button().is_disabled());
        let state = notices.slot(slot::SEARCH_ERROR).expect("slot registered");
        assert_eq!(state.message, "enter a chip model");
        assert_eq!(state.tone, Tone::Failure);
    }

    #[test]
    fn button_is_busy_until_guard_drops() {
        let mut flow = SearchFlow::default();
        flow.input.model = " ABC123 ".to_owned();
        let mut notices = notices();

        let (request, guard) = flow
            .begin(&mut notices, Instant::now())
            .expect("search should start");
        assert_eq!(
            request.body,
            Body::Multipart(vec![("model".to_owned(), "ABC123".to_owned())])
        );
        assert!(flow.button().is_disabled());
        assert_eq!(flow.button().label(), SEARCHING_LABEL);
        assert!(flow.begin(&mut notices, Instant::now()).is_none());

        drop(guard);
        assert!(!flow.button().is_disabled());
        assert_eq!(flow.button().label(), SEARCH_LABEL);
    }

    #[test]
    fn guard_restores_button_when_worker_panics() {
        let mut flow = SearchFlow::default();
        flow.input.model = "ABC123".to_owned();
        let (_, guard) = flow
            .begin(&mut notices(), Instant::now())
            .expect("search should start");

        let worker = std::thread::spawn(move || {
            let _guard = guard;
            panic!("worker died");
        });
        assert!(worker.join().is_err());
        assert!(!flow.button().is_disabled());
    }

    #[test]
    fn hit_is_classified_for_display() {
        let mut flow = SearchFlow::default();
        let mut notices = notices();
        flow.apply(
            RequestOutcome::Success(json!({"model": "ABC123", "stock": 5, "price": 0})),
            &mut notices,
            Instant::now(),
            "¥",
        );
        let display = flow.display().expect("detail panel shown");
        assert_eq!(display.stock_text(), "5");
        assert_eq!(display.tier, StockTier::Low);
        assert_eq!(display.tier.label(), "low");
        assert_eq!(display.price_text, "price on request");
        assert_eq!(
            notices.slot(slot::SEARCH_SUCCESS).map(|state| state.visible),
            Some(true)
        );
    }

    #[test]
    fn error_field_hides_detail_panel() {
        let mut flow = SearchFlow::default();
        let mut notices = notices();
        let now = Instant::now();
        flow.apply(
            RequestOutcome::Success(json!({"model": "LM358", "stock": 50})),
            &mut notices,
            now,
            "¥",
        );
        assert!(flow.display().is_some());

        flow.apply(
            RequestOutcome::Success(json!({"error": "chip not found"})),
            &mut notices,
            now,
            "¥",
        );
        assert!(flow.display().is_none());
        assert_eq!(
            notices.slot(slot::SEARCH_ERROR).map(|state| state.message.as_str()),
            Some("chip not found")
        );
    }

    #[test]
    fn transport_failure_shows_generic_message() {
        let mut flow = SearchFlow::default();
        let mut notices = notices();
        flow.apply(
            RequestOutcome::Failure(Failure::transport("server error: 500 Internal Server Error")),
            &mut notices,
            Instant::now(),
            "¥",
        );
        let state = notices.slot(slot::SEARCH_ERROR).expect("slot registered");
        assert!(state.message.contains("500"));
    }

    #[test]
    fn inquiry_needs_a_real_model() {
        let mut flow = SearchFlow::default();
        assert_eq!(flow.inquiry_message(), None);

        let mut notices = notices();
        flow.apply(
            RequestOutcome::Success(json!({"stock": 3})),
            &mut notices,
            Instant::now(),
            "¥",
        );
        assert_eq!(flow.inquiry_message(), None);

        flow.apply(
            RequestOutcome::Success(json!({"model": "NE555"})),
            &mut notices,
            Instant::now(),
            "¥",
        );
        let message = flow.inquiry_message().expect("prefill for a hit");
        assert!(message.contains("model NE555"));
    }
}
