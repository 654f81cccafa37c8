//! Progress heuristics shown next to saved drafts.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::domain::DraftFormData;

/// Share of the estimate that comes from filled fields.
const FIELD_WEIGHT: f64 = 85.0;
/// Bonus per wizard step already completed.
const STEP_BONUS: u32 = 5;

/// Best-effort completion estimate in `[0, 100]`.
///
/// Every field of every object-valued section counts once; a field is filled unless it
/// is `null` or the empty string. Steps already passed add a flat bonus on top of the field share.
pub fn completion_percentage(form_data: &DraftFormData, current_step: u32) -> u8 {
    let (filled, total) = form_data
        .fields()
        .fold((0u32, 0u32), |(filled, total), value| {
            (filled + u32::from(is_filled(value)), total + 1)
        });

    let field_share = if total > 0 {
        f64::from(filled) / f64::from(total) * FIELD_WEIGHT
    } else {
        0.0
    };
    let step_bonus = current_step.saturating_sub(1).saturating_mul(STEP_BONUS);

    (field_share + f64::from(step_bonus)).round().min(100.0) as u8
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// Relative "last saved" label using only the largest whole unit.
pub fn time_since(saved: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(saved).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days} {} ago", plural(days, "day"))
    } else if hours > 0 {
        format!("{hours} {} ago", plural(hours, "hour"))
    } else if minutes > 0 {
        format!("{minutes} {} ago", plural(minutes, "minute"))
    } else {
        "Just now".to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count > 1 {
        format!("{unit}s")
    } else {
        unit.to_string()
    }
}
