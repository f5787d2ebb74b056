// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::{ChipId, ChipRecord, FormKind};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Text fields a form exposes to the terminal editor, in display order.
pub trait FormFields {
    fn labels(&self) -> &'static [&'static str];
    fn field(&self, index: usize) -> Option<&str>;
    fn field_mut(&mut self, index: usize) -> Option<&mut String>;
}

pub fn parse_search_query(raw: &str) -> Result<String> {
    let model = raw.trim();
    if model.is_empty() {
        bail!("enter a chip model");
    }
    Ok(model.to_owned())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFormInput {
    pub model: String,
}

impl FormFields for SearchFormInput {
    fn labels(&self) -> &'static [&'static str] {
        &["model"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        (index == 0).then_some(self.model.as_str())
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        (index == 0).then_some(&mut self.model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipPayload {
    pub model: String,
    pub description: String,
    pub stock: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipFormInput {
    pub model: String,
    pub description: String,
    pub stock: String,
    pub price: String,
}

impl ChipFormInput {
    pub fn from_record(chip: &ChipRecord) -> Self {
        Self {
            model: chip.model.clone(),
            description: chip.description.clone().unwrap_or_default(),
            stock: chip.stock.to_string(),
            price: chip.price.to_string(),
        }
    }

    pub fn to_payload(&self) -> Result<ChipPayload> {
        let model = self.model.trim();
        if model.is_empty() {
            bail!("chip model is required -- enter a model and retry");
        }

        let stock_raw = self.stock.trim();
        let stock = if stock_raw.is_empty() {
            0
        } else {
            match stock_raw.parse::<u32>() {
                Ok(stock) => stock,
                Err(_) => bail!("chip stock must be a whole number of 0 or more, got {stock_raw:?}"),
            }
        };

        let price_raw = self.price.trim();
        let price = if price_raw.is_empty() {
            0.0
        } else {
            match price_raw.parse::<f64>() {
                Ok(price) if price.is_finite() && price >= 0.0 => price,
                _ => bail!("chip price must be a number of 0 or more, got {price_raw:?}"),
            }
        };

        Ok(ChipPayload {
            model: model.to_owned(),
            description: self.description.trim().to_owned(),
            stock,
            price,
        })
    }
}

impl FormFields for ChipFormInput {
    fn labels(&self) -> &'static [&'static str] {
        &["model", "description", "stock", "price"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.model),
            1 => Some(&self.description),
            2 => Some(&self.stock),
            3 => Some(&self.price),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.model),
            1 => Some(&mut self.description),
            2 => Some(&mut self.stock),
            3 => Some(&mut self.price),
            _ => None,
        }
    }
}

/// Edit surface filled by the "fetch one" read before an update is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipEditSurface {
    pub id: ChipId,
    pub form: ChipFormInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CcEmailFormInput {
    pub email: String,
}

impl CcEmailFormInput {
    pub fn validated_email(&self) -> Result<String> {
        let email = self.email.trim();
        if email.is_empty() {
            bail!("enter a valid email address");
        }
        if !is_valid_email(email) {
            bail!("enter a valid email format");
        }
        Ok(email.to_owned())
    }
}

impl FormFields for CcEmailFormInput {
    fn labels(&self) -> &'static [&'static str] {
        &["email"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        (index == 0).then_some(self.email.as_str())
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        (index == 0).then_some(&mut self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettingsPayload {
    pub email: String,
    pub cc_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSettingsFormInput {
    pub email: String,
    pub cc_batch: String,
}

impl EmailSettingsFormInput {
    pub fn to_payload(&self) -> Result<EmailSettingsPayload> {
        let email = self.email.trim();
        if email.is_empty() {
            bail!("enter an email address");
        }
        let cc_batch = self.cc_batch.trim();
        Ok(EmailSettingsPayload {
            email: email.to_owned(),
            cc_email: (!cc_batch.is_empty()).then(|| cc_batch.to_owned()),
        })
    }
}

impl FormFields for EmailSettingsFormInput {
    fn labels(&self) -> &'static [&'static str] {
        &["recipient email", "batch cc emails"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.email),
            1 => Some(&self.cc_batch),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.email),
            1 => Some(&mut self.cc_batch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactFormInput {
    pub company: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            bail!("name and email are required");
        }
        Ok(())
    }
}

impl FormFields for ContactFormInput {
    fn labels(&self) -> &'static [&'static str] {
        &["company", "name", "email", "phone", "message"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.company),
            1 => Some(&self.name),
            2 => Some(&self.email),
            3 => Some(&self.phone),
            4 => Some(&self.message),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.company),
            1 => Some(&mut self.name),
            2 => Some(&mut self.email),
            3 => Some(&mut self.phone),
            4 => Some(&mut self.message),
            _ => None,
        }
    }
}

pub fn form_hint(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Search => "type a model, enter to search",
        FormKind::AddChip | FormKind::EditChip => "up/down field, enter save, esc cancel",
        FormKind::AddCcEmail => "enter to add, esc cancel",
        FormKind::EmailSettings | FormKind::Contact => "up/down field, enter submit, esc cancel",
    }
}
