//! Browser bindings: the event views and the answer grid call into these
//! with the stored JSON shapes.

use crate::event::Event;
use crate::format::{format_date, format_deadline, TeacherPresence};
use crate::select::analyze;
use chrono::NaiveDate;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Plain objects rather than `Map`s, so the UI reads fields directly.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(to_js_error)
}

/// Aggregation and headline slots of one stored event.
#[wasm_bindgen(js_name = analyzeEvent)]
pub fn analyze_event(event: JsValue) -> Result<JsValue, JsValue> {
    let event: Event = serde_wasm_bindgen::from_value(event).map_err(to_js_error)?;
    to_js(&analyze(&event))
}

#[wasm_bindgen(js_name = formatDate)]
pub fn format_date_js(date: &str) -> Result<String, JsValue> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(to_js_error)?;
    Ok(format_date(date))
}

/// `{ text, isPast }` for a `YYYY-MM-DDTHH:MM` deadline, `null` without one.
#[wasm_bindgen(js_name = formatDeadline)]
pub fn format_deadline_js(deadline: Option<String>) -> Result<JsValue, JsValue> {
    let deadline = match deadline.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(crate::event::parse_deadline(raw).map_err(to_js_error)?),
    };

    to_js(&format_deadline(deadline))
}

#[wasm_bindgen(js_name = teacherBadge)]
pub fn teacher_badge(count: usize) -> String {
    TeacherPresence::from_count(count).badge().to_string()
}
