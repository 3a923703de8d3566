//! Request context and workload metadata
//!
//! Derives the workload shape from the raw intake questionnaire and renders
//! the intake into the prompt context. One pure function returns both, so
//! no cached module state leaks between requests.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ROLE_INDEX_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^role_\d+").expect("role key regex"));
static ROLE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""role_(?:key|name)"\s*:"#).expect("role field regex"));

/// Shape of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadMetadata {
    /// Count of distinct compensation-plan units; never zero
    pub plan_count: u32,
    pub is_multi_segment: bool,
    pub has_variants: bool,
}

/// Rendered intake plus derived metadata
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Intake rendered for inclusion in prompts
    pub context: String,
    pub metadata: WorkloadMetadata,
}

/// Estimate the plan count from intake data.
///
/// The count metadata may be missing, so this tries a fallback chain:
/// explicit count, combo details, role/plan arrays, indexed role keys,
/// nested role arrays, and finally a scan for role-field patterns in the
/// serialized intake. Defaults to 1; never returns zero.
#[must_use]
pub fn estimate_plan_count(intake: &Value) -> u32 {
    if let Some(count) = intake.get("_plan_count").and_then(Value::as_u64) {
        if count > 0 {
            return count as u32;
        }
    }

    if let Some(combos) = intake.get("_combo_details").and_then(Value::as_array) {
        if !combos.is_empty() {
            return combos.len() as u32;
        }
    }

    for key in ["roles", "plans"] {
        if let Some(items) = intake.get(key).and_then(Value::as_array) {
            return (items.len() as u32).max(1);
        }
    }

    if let Some(object) = intake.as_object() {
        let indexed = object.keys().filter(|k| ROLE_INDEX_KEY.is_match(k)).count();
        if indexed > 0 {
            return indexed as u32;
        }

        for value in object.values() {
            if let Some(nested) = value.as_object() {
                if let Some(roles) = nested.get("roles").and_then(Value::as_array) {
                    return (roles.len() as u32).max(1);
                }
            }
        }
    }

    if let Ok(serialized) = serde_json::to_string(intake) {
        let matches = ROLE_FIELD.find_iter(&serialized).count();
        if matches > 0 {
            return matches as u32;
        }
    }

    1
}

/// Build the request context from raw intake.
///
/// Pure function; returns the rendered context and the metadata together
/// rather than caching either between calls.
#[must_use]
pub fn build_request_context(intake: &Value) -> RequestContext {
    let metadata = WorkloadMetadata {
        plan_count: estimate_plan_count(intake),
        is_multi_segment: intake
            .get("_is_multi_segment")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        has_variants: intake
            .get("_has_variants")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };

    RequestContext {
        context: render_intake(intake),
        metadata,
    }
}

/// Render the intake questionnaire as labeled prompt text.
///
/// Meta keys (leading underscore) are skipped; nested structures are
/// inlined as JSON so the generator sees them verbatim.
fn render_intake(intake: &Value) -> String {
    let Some(object) = intake.as_object() else {
        return serde_json::to_string_pretty(intake).unwrap_or_default();
    };

    let mut lines = vec!["[COMPANY INTAKE]".to_string()];
    for (key, value) in object {
        if key.starts_with('_') {
            continue;
        }
        let label = key.replace('_', " ");
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => serde_json::to_string(other).unwrap_or_default(),
        };
        lines.push(format!("{label}: {rendered}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_count_wins() {
        let intake = json!({ "_plan_count": 7, "roles": [1, 2] });
        assert_eq!(estimate_plan_count(&intake), 7);
    }

    #[test]
    fn combo_details_length() {
        let intake = json!({ "_combo_details": [{}, {}, {}] });
        assert_eq!(estimate_plan_count(&intake), 3);
    }

    #[test]
    fn roles_array_length_with_floor() {
        assert_eq!(estimate_plan_count(&json!({ "roles": [1, 2, 3, 4] })), 4);
        assert_eq!(estimate_plan_count(&json!({ "roles": [] })), 1);
        assert_eq!(estimate_plan_count(&json!({ "plans": [1, 2] })), 2);
    }

    #[test]
    fn indexed_role_keys_counted() {
        let intake = json!({ "role_1_focus": "x", "role_2_focus": "y", "company": "z" });
        assert_eq!(estimate_plan_count(&intake), 2);
    }

    #[test]
    fn nested_roles_found() {
        let intake = json!({ "org": { "roles": [1, 2, 3] } });
        assert_eq!(estimate_plan_count(&intake), 3);
    }

    #[test]
    fn serialized_role_fields_counted() {
        let intake = json!({ "teams": [[{ "role_key": "ae" }], [{ "role_key": "sdr" }]] });
        assert_eq!(estimate_plan_count(&intake), 2);
    }

    #[test]
    fn defaults_to_one() {
        assert_eq!(estimate_plan_count(&json!({ "company": "Acme" })), 1);
        assert_eq!(estimate_plan_count(&json!({})), 1);
    }

    #[test]
    fn context_skips_meta_keys() {
        let intake = json!({
            "company_name": "Acme",
            "_plan_count": 2,
            "team_size": 12
        });
        let request = build_request_context(&intake);

        assert!(request.context.contains("company name: Acme"));
        assert!(request.context.contains("team size: 12"));
        assert!(!request.context.contains("_plan_count"));
        assert_eq!(request.metadata.plan_count, 2);
    }

    #[test]
    fn metadata_flags_default_false() {
        let request = build_request_context(&json!({}));
        assert!(!request.metadata.is_multi_segment);
        assert!(!request.metadata.has_variants);

        let request = build_request_context(&json!({
            "_is_multi_segment": true,
            "_has_variants": true
        }));
        assert!(request.metadata.is_multi_segment);
        assert!(request.metadata.has_variants);
    }
}
