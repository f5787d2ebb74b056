// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Request builders and response schemas, one per remote route.

use chipdesk_app::{
    CcEmailEntry, CcEmailId, ChipId, ChipPayload, ChipRecord, ContactFormInput,
    EmailSettingsPayload,
};
use serde::Deserialize;
use serde_json::json;

use crate::{ApiRequest, Body, Method};

pub fn search(model: &str) -> ApiRequest {
    ApiRequest::new(
        Method::Post,
        "/search",
        Body::Multipart(vec![("model".to_owned(), model.to_owned())]),
    )
}

pub fn submit_contact(form: &ContactFormInput) -> ApiRequest {
    ApiRequest::new(
        Method::Post,
        "/contact",
        Body::Json(json!({
            "company": form.company,
            "name": form.name,
            "email": form.email,
            "phone": form.phone,
            "message": form.message,
        })),
    )
}

pub fn list_chips() -> ApiRequest {
    ApiRequest::new(Method::Get, "/admin/chip/list", Body::Empty)
}

pub fn add_chip(payload: &ChipPayload) -> ApiRequest {
    ApiRequest::new(Method::Post, "/admin/chip/add", chip_body(payload))
}

pub fn get_chip(id: ChipId) -> ApiRequest {
    ApiRequest::new(Method::Get, format!("/admin/chip/{id}"), Body::Empty)
}

pub fn update_chip(id: ChipId, payload: &ChipPayload) -> ApiRequest {
    ApiRequest::new(
        Method::Post,
        format!("/admin/chip/update/{id}"),
        chip_body(payload),
    )
}

pub fn delete_chip(id: ChipId) -> ApiRequest {
    ApiRequest::new(Method::Post, format!("/admin/chip/delete/{id}"), Body::Empty)
}

pub fn list_cc_emails() -> ApiRequest {
    ApiRequest::new(Method::Get, "/admin/email/cc", Body::Empty)
}

pub fn add_cc_email(email: &str) -> ApiRequest {
    ApiRequest::new(
        Method::Post,
        "/admin/email/cc",
        Body::Json(json!({ "email": email })),
    )
}

pub fn toggle_cc_email(id: CcEmailId, is_active: bool) -> ApiRequest {
    ApiRequest::new(
        Method::Put,
        format!("/admin/email/cc/{id}"),
        Body::Json(json!({ "is_active": is_active })),
    )
}

pub fn delete_cc_email(id: CcEmailId) -> ApiRequest {
    ApiRequest::new(Method::Delete, format!("/admin/email/cc/{id}"), Body::Empty)
}

pub fn update_email_settings(payload: &EmailSettingsPayload) -> ApiRequest {
    let mut fields = vec![("email".to_owned(), payload.email.clone())];
    if let Some(cc_email) = &payload.cc_email {
        fields.push(("cc_email".to_owned(), cc_email.clone()));
    }
    ApiRequest::new(
        Method::Post,
        "/admin/settings/email",
        Body::Multipart(fields),
    )
}

pub fn health() -> ApiRequest {
    ApiRequest::new(Method::Get, "/health", Body::Empty)
}

fn chip_body(payload: &ChipPayload) -> Body {
    Body::Json(json!({
        "model": payload.model,
        "description": payload.description,
        "stock": payload.stock,
        "price": payload.price,
    }))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChipListResponse {
    #[serde(default)]
    pub chips: Vec<ChipRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CcEmailListResponse {
    #[serde(default)]
    pub cc_emails: Vec<CcEmailEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}
