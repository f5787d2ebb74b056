// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod scripted;

pub use scripted::ScriptedGateway;

use anyhow::{Context, Result};
use chipdesk_app::{CcEmailEntry, CcEmailId, ChipId, ChipRecord};
use serde_json::{Value, json};
use std::path::PathBuf;
use time::macros::format_description;
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

const CHIP_FAMILIES: [(&str, &str); 12] = [
    ("LM", "op amp"),
    ("NE", "timer"),
    ("STM32F", "microcontroller"),
    ("ATmega", "microcontroller"),
    ("TPS", "buck converter"),
    ("AMS", "LDO regulator"),
    ("CH", "USB bridge"),
    ("MAX", "RS-485 transceiver"),
    ("ESP", "Wi-Fi SoC"),
    ("W25Q", "SPI flash"),
    ("SN74", "logic gate"),
    ("IRF", "MOSFET"),
];

const PACKAGE_SUFFIXES: [&str; 8] = ["", "DR", "N", "T6", "PU", "DBVR", "-3.3", "C8T6"];

const MAILBOX_NAMES: [&str; 10] = [
    "sales",
    "ops",
    "purchasing",
    "quotes",
    "warehouse",
    "support",
    "finance",
    "logistics",
    "alerts",
    "manager",
];

const MAIL_DOMAINS: [&str; 5] = [
    "example.com",
    "chips.example",
    "distributor.test",
    "fab.example.net",
    "parts.example.org",
];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let state = seed ^ 0x2545_F491_4F6C_DD1D;
        Self {
            state: if state == 0 { 0x9E37_79B9 } else { state },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn below(&mut self, n: u64) -> u64 {
        if n <= 1 {
            return 0;
        }
        self.next_u64() % n
    }
}

/// Seeded generator of plausible catalog rows.
#[derive(Debug, Clone)]
pub struct ChipFaker {
    rng: DeterministicRng,
}

impl ChipFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed.max(1)),
        }
    }

    pub fn chip(&mut self, id: i64) -> ChipRecord {
        let (prefix, kind) = CHIP_FAMILIES[self.rng.below(CHIP_FAMILIES.len() as u64) as usize];
        let suffix = PACKAGE_SUFFIXES[self.rng.below(PACKAGE_SUFFIXES.len() as u64) as usize];
        let number = 100 + self.rng.below(900);

        // A quarter of rows are "price on request" and a few are out of stock.
        let price = match self.rng.below(4) {
            0 => 0.0,
            _ => (self.rng.below(5_000) + 5) as f64 / 100.0,
        };
        let stock = match self.rng.below(6) {
            0 => 0,
            1 => 1 + self.rng.below(10) as u32,
            _ => 11 + self.rng.below(2_000) as u32,
        };

        ChipRecord {
            id: ChipId::new(id),
            model: format!("{prefix}{number}{suffix}"),
            description: (self.rng.below(5) != 0).then(|| kind.to_owned()),
            stock,
            price,
        }
    }

    pub fn chips(&mut self, count: usize) -> Vec<ChipRecord> {
        (1..=count as i64).map(|id| self.chip(id)).collect()
    }

    pub fn cc_email(&mut self, id: i64) -> CcEmailEntry {
        let mailbox = MAILBOX_NAMES[self.rng.below(MAILBOX_NAMES.len() as u64) as usize];
        let domain = MAIL_DOMAINS[self.rng.below(MAIL_DOMAINS.len() as u64) as usize];
        let created = reference_datetime() + Duration::minutes(self.rng.below(525_600) as i64);
        CcEmailEntry {
            id: CcEmailId::new(id),
            email: format!("{mailbox}{id}@{domain}"),
            is_active: self.rng.below(3) != 0,
            created_at: Some(format_iso(created)),
        }
    }
}

pub fn sample_chips() -> Vec<ChipRecord> {
    vec![
        ChipRecord {
            id: ChipId::new(1),
            model: "LM358".to_owned(),
            description: Some("dual op amp".to_owned()),
            stock: 120,
            price: 0.35,
        },
        ChipRecord {
            id: ChipId::new(2),
            model: "NE555".to_owned(),
            description: Some("precision timer".to_owned()),
            stock: 8,
            price: 0.2,
        },
        ChipRecord {
            id: ChipId::new(3),
            model: "STM32F103C8T6".to_owned(),
            description: None,
            stock: 0,
            price: 0.0,
        },
    ]
}

pub fn sample_cc_emails() -> Vec<CcEmailEntry> {
    vec![
        CcEmailEntry {
            id: CcEmailId::new(1),
            email: "sales@example.com".to_owned(),
            is_active: true,
            created_at: Some(fixture_datetime().to_owned()),
        },
        CcEmailEntry {
            id: CcEmailId::new(2),
            email: "ops@example.com".to_owned(),
            is_active: false,
            created_at: None,
        },
    ]
}

pub fn chip_list_json(chips: &[ChipRecord]) -> Value {
    json!({ "chips": chips })
}

pub fn cc_email_list_json(entries: &[CcEmailEntry]) -> Value {
    json!({ "cc_emails": entries })
}

pub fn message_json(message: &str) -> Value {
    json!({ "message": message })
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56"
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

fn reference_datetime() -> PrimitiveDateTime {
    let date =
        Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1).expect("valid calendar date");
    PrimitiveDateTime::new(date, Time::MIDNIGHT)
}

fn format_iso(value: PrimitiveDateTime) -> String {
    value
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
        .expect("fixed format description")
}
