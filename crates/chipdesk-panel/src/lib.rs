// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod dispatch;
mod flows;
mod list;
mod panel;
mod resource;
mod search;

pub use dispatch::{Completion, Dispatcher, ListKind, Task};
pub use flows::{ContactFlow, EmailSettingsFlow, SettingsSubmission};
pub use list::{
    ActionHandle, Confirm, ItemRow, ListSynchronizer, Mutation, RenderedRow, RowBindings,
    VANISHED_ROW_MESSAGE,
};
pub use panel::AdminPanel;
pub use resource::{
    ActionKind, CcEmailResource, ChipResource, Feedback, Operation, Resource, RowAction,
};
pub use search::{
    BusyGuard, SEARCH_LABEL, SEARCH_SUCCEEDED, SEARCHING_LABEL, SearchFlow, SubmitButton,
};
