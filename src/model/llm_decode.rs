use serde_json::{Map, Value};

use crate::model::narrative_event::EventKind;
use crate::model::proposal::{
    ArcDecision, ArcDirective, PacingHints, Posture, Proposal, ProposedEvent, TimerAdjustment,
};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("provider text contains no JSON object")]
    NoJsonObject,

    #[error("invalid proposal JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("proposal must be a JSON object")]
    NotAnObject,
}

/// Decode provider text into a Proposal.
///
/// Only the outer structure is mandatory. Individual fields degrade to
/// "absent" when malformed: a bad arc becomes no arc, a bad event is dropped,
/// a bad pacing block is ignored.
pub fn decode_proposal(text: &str) -> Result<Proposal, DecodeError> {
    let json = extract_json_object(text).ok_or(DecodeError::NoJsonObject)?;
    let value: Value = serde_json::from_str(json)?;

    let Value::Object(root) = value else {
        return Err(DecodeError::NotAnObject);
    };

    Ok(Proposal {
        arc: root.get("arc").and_then(decode_arc),
        scattered_events: decode_events(root.get("scattered_events")),
        pacing: decode_pacing(&root),
        posture: root.get("posture").and_then(decode_posture),
        rationale: str_field(&root, &["reasoning", "rationale"]),
    })
}

/// Slice from the first `{` to the last `}`; tolerates code fences and prose
/// around the payload.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn decode_arc(value: &Value) -> Option<ArcDirective> {
    let Value::Object(obj) = value else {
        return None;
    };

    let decision = str_field(obj, &["decision"])
        .map(|d| ArcDecision::parse(&d))
        .unwrap_or_default();
    let name = str_field(obj, &["arc_name", "name"]).unwrap_or_else(|| "Unnamed arc".to_string());

    Some(ArcDirective {
        decision,
        name,
        events: decode_events(obj.get("events")),
        rationale: str_field(obj, &["reasoning", "rationale"]),
    })
}

fn decode_events(value: Option<&Value>) -> Vec<ProposedEvent> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items.iter().filter_map(decode_event).collect()
}

fn decode_event(item: &Value) -> Option<ProposedEvent> {
    let Value::Object(obj) = item else {
        return None;
    };

    let raw_type = str_field(obj, &["type"])?;
    if raw_type.trim().is_empty() {
        return None;
    }

    Some(ProposedEvent {
        delay_hours: f32_field(obj, &["delay_hours", "delayHours"]).unwrap_or(0.0),
        kind: EventKind::canonicalize(&raw_type),
        subtype: str_field(obj, &["subtype"]),
        faction: str_field(obj, &["faction"]),
        intensity: f32_field(obj, &["intensity"]).unwrap_or(1.0),
        note: str_field(obj, &["note"]),
    })
}

fn decode_pacing(root: &Map<String, Value>) -> PacingHints {
    let nested = match root.get("pacing") {
        Some(Value::Object(obj)) => Some(obj),
        _ => None,
    };

    let next_call_days = f32_field(root, &["next_call_days"]).or_else(|| {
        nested.and_then(|p| f32_field(p, &["next_call_interval_days", "next_call_days"]))
    });

    let adjusted_bounds = root
        .get("adjust_timers")
        .or_else(|| nested.and_then(|p| p.get("adjust_timers")))
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<TimerAdjustment>(v.clone()).ok());

    PacingHints {
        next_call_days,
        adjusted_bounds,
    }
}

fn decode_posture(value: &Value) -> Option<Posture> {
    let Value::Object(obj) = value else {
        return None;
    };

    let label = str_field(obj, &["current_blend", "label"])?;
    Some(Posture {
        label,
        rationale: str_field(obj, &["reasoning", "rationale"]),
        next_trigger: str_field(obj, &["next_posture_hint", "next_trigger"]),
    })
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|v| v.as_str())
        .map(str::to_string)
}

/// Numbers may arrive as JSON numbers or as numeric strings.
fn f32_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f32> {
    keys.iter().filter_map(|key| obj.get(*key)).find_map(|v| match v {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    })
}
