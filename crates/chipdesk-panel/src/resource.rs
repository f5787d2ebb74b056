// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Per-collection descriptors consumed by [`ListSynchronizer`].
//!
//! [`ListSynchronizer`]: crate::ListSynchronizer

use anyhow::Result;
use chipdesk_api::endpoints::{self, CcEmailListResponse, ChipListResponse};
use chipdesk_api::{ApiRequest, decode};
use chipdesk_app::{CcEmailEntry, ChipRecord, NO_DESCRIPTION, format_price, slot};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

const FAILURE_DURATION: Duration = Duration::from_millis(5000);
const CHIP_SAVED_DURATION: Duration = Duration::from_millis(1500);
const LIST_NOTICE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    Create,
    Update,
    Toggle,
    Delete,
}

/// Where and how an operation's outcome is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub slot: &'static str,
    pub failure_prefix: &'static str,
    /// Shown when a successful response carries no `message`.
    pub success_text: &'static str,
    pub success_for: Duration,
    pub failure_for: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Edit,
    Toggle,
    Delete,
}

/// A row-level control with its request captured at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct RowAction {
    pub kind: ActionKind,
    pub label: &'static str,
    pub request: ApiRequest,
    /// Prompt for a synchronous confirmation before the request is issued.
    pub confirm: Option<&'static str>,
}

impl RowAction {
    pub const fn operation(&self) -> Option<Operation> {
        match self.kind {
            ActionKind::Edit => None,
            ActionKind::Toggle => Some(Operation::Toggle),
            ActionKind::Delete => Some(Operation::Delete),
        }
    }
}

pub trait Resource {
    type Item: Clone + fmt::Debug;

    const TITLE: &'static str;
    const PLACEHOLDER: &'static str;
    const COLUMNS: &'static [&'static str];

    fn list_request() -> ApiRequest;
    fn decode_list(payload: Value) -> Result<Vec<Self::Item>>;
    /// Stable key of the rendered row, unique within one collection.
    fn row_key(item: &Self::Item) -> String;
    fn cells(item: &Self::Item, currency: &str) -> Vec<String>;
    fn actions(item: &Self::Item) -> Vec<RowAction>;
    fn feedback(operation: Operation) -> Feedback;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChipResource;

impl Resource for ChipResource {
    type Item = ChipRecord;

    const TITLE: &'static str = "chips";
    const PLACEHOLDER: &'static str = "no chips yet";
    const COLUMNS: &'static [&'static str] =
        &["id", "model", "description", "stock", "status", "price"];

    fn list_request() -> ApiRequest {
        endpoints::list_chips()
    }

    fn decode_list(payload: Value) -> Result<Vec<ChipRecord>> {
        Ok(decode::<ChipListResponse>(payload, "chip list")?.chips)
    }

    fn row_key(chip: &ChipRecord) -> String {
        format!("chip-{}", chip.id)
    }

    fn cells(chip: &ChipRecord, currency: &str) -> Vec<String> {
        vec![
            chip.id.to_string(),
            chip.model.clone(),
            chip.description
                .clone()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
            chip.stock.to_string(),
            chip.tier().label().to_owned(),
            format_price(chip.price, currency),
        ]
    }

    fn actions(chip: &ChipRecord) -> Vec<RowAction> {
        vec![
            RowAction {
                kind: ActionKind::Edit,
                label: "edit",
                request: endpoints::get_chip(chip.id),
                confirm: None,
            },
            RowAction {
                kind: ActionKind::Delete,
                label: "delete",
                request: endpoints::delete_chip(chip.id),
                confirm: Some("delete this chip?"),
            },
        ]
    }

    fn feedback(operation: Operation) -> Feedback {
        match operation {
            Operation::Load => Feedback {
                slot: slot::CHIP_LIST,
                failure_prefix: "load failed",
                success_text: "",
                success_for: Duration::ZERO,
                failure_for: FAILURE_DURATION,
            },
            Operation::Create => Feedback {
                slot: slot::ADD_CHIP,
                failure_prefix: "add failed",
                success_text: "chip added",
                success_for: CHIP_SAVED_DURATION,
                failure_for: FAILURE_DURATION,
            },
            Operation::Update | Operation::Toggle => Feedback {
                slot: slot::EDIT_CHIP,
                failure_prefix: "update failed",
                success_text: "chip updated",
                success_for: CHIP_SAVED_DURATION,
                failure_for: FAILURE_DURATION,
            },
            Operation::Delete => Feedback {
                slot: slot::CHIP_LIST,
                failure_prefix: "delete failed",
                success_text: "chip deleted",
                success_for: LIST_NOTICE_DURATION,
                failure_for: FAILURE_DURATION,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CcEmailResource;

impl Resource for CcEmailResource {
    type Item = CcEmailEntry;

    const TITLE: &'static str = "cc emails";
    const PLACEHOLDER: &'static str = "no cc emails";
    const COLUMNS: &'static [&'static str] = &["email", "status", "created"];

    fn list_request() -> ApiRequest {
        endpoints::list_cc_emails()
    }

    fn decode_list(payload: Value) -> Result<Vec<CcEmailEntry>> {
        Ok(decode::<CcEmailListResponse>(payload, "cc email list")?.cc_emails)
    }

    fn row_key(entry: &CcEmailEntry) -> String {
        format!("cc-email-{}", entry.id)
    }

    fn cells(entry: &CcEmailEntry, _currency: &str) -> Vec<String> {
        vec![
            entry.email.clone(),
            entry.status_label().to_owned(),
            entry.created_label(),
        ]
    }

    fn actions(entry: &CcEmailEntry) -> Vec<RowAction> {
        vec![
            RowAction {
                kind: ActionKind::Toggle,
                label: if entry.is_active { "deactivate" } else { "activate" },
                request: endpoints::toggle_cc_email(entry.id, !entry.is_active),
                confirm: None,
            },
            RowAction {
                kind: ActionKind::Delete,
                label: "delete",
                request: endpoints::delete_cc_email(entry.id),
                confirm: Some("delete this cc email?"),
            },
        ]
    }

    fn feedback(operation: Operation) -> Feedback {
        let (failure_prefix, success_text) = match operation {
            Operation::Load => ("load failed", ""),
            Operation::Create => ("add failed", "cc email added"),
            Operation::Update | Operation::Toggle => ("update failed", "cc email updated"),
            Operation::Delete => ("delete failed", "cc email deleted"),
        };
        Feedback {
            slot: slot::CC_EMAIL,
            failure_prefix,
            success_text,
            success_for: LIST_NOTICE_DURATION,
            failure_for: LIST_NOTICE_DURATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionKind, CcEmailResource, ChipResource, Operation, Resource};
    use chipdesk_api::{Body, Method};
    use chipdesk_app::{CcEmailEntry, CcEmailId, ChipId, ChipRecord};
    use serde_json::json;

    #[test]
    fn toggle_action_sends_negated_state() {
        let entry = CcEmailEntry {
            id: CcEmailId::new(4),
            email: "ops@example.com".to_owned(),
            is_active: true,
            created_at: None,
        };
        let actions = CcEmailResource::actions(&entry);
        let toggle = actions
            .iter()
            .find(|action| action.kind == ActionKind::Toggle)
            .expect("toggle action");
        assert_eq!(toggle.label, "deactivate");
        assert_eq!(toggle.request.method, Method::Put);
        assert_eq!(toggle.request.body, Body::Json(json!({"is_active": false})));
        assert_eq!(toggle.operation(), Some(Operation::Toggle));
    }

    #[test]
    fn chip_cells_show_tier_and_price() {
        let chip = ChipRecord {
            id: ChipId::new(2),
            model: "NE555".to_owned(),
            description: Some(String::new()),
            stock: 10,
            price: 0.0,
        };
        assert_eq!(
            ChipResource::cells(&chip, "¥"),
            vec!["2", "NE555", "no description", "10", "low", "price on request"]
        );
        assert_eq!(ChipResource::row_key(&chip), "chip-2");
    }

    #[test]
    fn only_delete_asks_for_confirmation() {
        let chip = ChipRecord {
            id: ChipId::new(1),
            model: "LM358".to_owned(),
            description: None,
            stock: 1,
            price: 1.0,
        };
        for action in ChipResource::actions(&chip) {
            assert_eq!(action.confirm.is_some(), action.kind == ActionKind::Delete);
        }
    }
}
