// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;
use time::format_description::well_known::Rfc2822;
use time::macros::format_description;

use crate::ids::*;

pub const PRICE_ON_REQUEST: &str = "price on request";
pub const NO_DESCRIPTION: &str = "no description";
pub const MISSING_MODEL: &str = "N/A";
pub const DEFAULT_CURRENCY: &str = "¥";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Search,
    Chips,
    CcEmails,
    Settings,
    Contact,
}

impl TabKind {
    pub const ALL: [Self; 5] = [
        Self::Search,
        Self::Chips,
        Self::CcEmails,
        Self::Settings,
        Self::Contact,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Chips => "chips",
            Self::CcEmails => "cc emails",
            Self::Settings => "settings",
            Self::Contact => "contact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Search,
    AddChip,
    EditChip,
    AddCcEmail,
    EmailSettings,
    Contact,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::AddChip => "add chip",
            Self::EditChip => "edit chip",
            Self::AddCcEmail => "add cc email",
            Self::EmailSettings => "email settings",
            Self::Contact => "contact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Form(FormKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipRecord {
    pub id: ChipId,
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
}

impl ChipRecord {
    pub fn tier(&self) -> StockTier {
        StockTier::classify(self.stock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcEmailEntry {
    pub id: CcEmailId,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CcEmailEntry {
    /// Calendar date of `created_at`, accepting ISO-8601 timestamps and the
    /// RFC 2822 form some JSON encoders emit for datetimes.
    pub fn created_on(&self) -> Option<Date> {
        let raw = self.created_at.as_deref()?.trim();
        if let Some(prefix) = raw.get(..10)
            && let Ok(date) = Date::parse(prefix, format_description!("[year]-[month]-[day]"))
        {
            return Some(date);
        }
        time::OffsetDateTime::parse(raw, &Rfc2822)
            .ok()
            .map(|value| value.date())
    }

    pub fn created_label(&self) -> String {
        self.created_on()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_owned())
    }

    pub const fn status_label(&self) -> &'static str {
        if self.is_active { "active" } else { "inactive" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTier {
    Sufficient,
    Low,
    OutOfStock,
}

impl StockTier {
    pub const fn classify(stock: u32) -> Self {
        match stock {
            0 => Self::OutOfStock,
            1..=10 => Self::Low,
            _ => Self::Sufficient,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sufficient => "sufficient",
            Self::Low => "low",
            Self::OutOfStock => "out of stock",
        }
    }
}

pub fn format_price(price: f64, currency: &str) -> String {
    if price > 0.0 {
        format!("{currency}{price:.2}")
    } else {
        PRICE_ON_REQUEST.to_owned()
    }
}

/// Body of a successful `/search` hit. Every field may be missing or null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: Option<ChipId>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchDisplay {
    pub model: String,
    pub description: String,
    pub stock: u32,
    pub tier: StockTier,
    pub price_text: String,
}

impl SearchDisplay {
    pub fn from_hit(hit: &SearchHit, currency: &str) -> Self {
        let model = non_empty(hit.model.as_deref()).unwrap_or(MISSING_MODEL);
        let description = non_empty(hit.description.as_deref()).unwrap_or(NO_DESCRIPTION);
        let stock = hit.stock.unwrap_or(0);
        Self {
            model: model.to_owned(),
            description: description.to_owned(),
            stock,
            tier: StockTier::classify(stock),
            price_text: format_price(hit.price.unwrap_or(0.0), currency),
        }
    }

    pub fn stock_text(&self) -> String {
        self.stock.to_string()
    }

    pub fn has_model(&self) -> bool {
        self.model != MISSING_MODEL
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
