//! `--aic-metrics` / `--aiv-metrics` values
//!
//! A value is either a list of named metric groups from the platform
//! whitelist, or `Custom:` followed by raw PMU event ids. Both forms are
//! deduplicated keeping the first occurrence.

use crate::domain::{ArgId, ValidationError};
use crate::platform::Platform;

pub const CUSTOM_PREFIX: &str = "Custom:";
pub const MAX_CUSTOM_EVENTS: usize = 30;

/// Validate and canonicalize a metrics value.
///
/// # Errors
/// Unknown group, malformed event id, wrong event count, or a mix of both
/// forms.
pub fn normalize(arg: ArgId, raw: &str, platform: &dyn Platform) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty(arg));
    }
    match strip_custom_prefix(raw) {
        Some(events) => normalize_custom(arg, raw, events),
        None => normalize_groups(arg, raw, platform),
    }
}

fn strip_custom_prefix(raw: &str) -> Option<&str> {
    let head = raw.get(..CUSTOM_PREFIX.len())?;
    head.eq_ignore_ascii_case(CUSTOM_PREFIX).then(|| &raw[CUSTOM_PREFIX.len()..])
}

fn normalize_groups(arg: ArgId, raw: &str, platform: &dyn Platform) -> Result<String, ValidationError> {
    let whitelist = platform.metrics_whitelist();
    let mut groups: Vec<&str> = Vec::new();
    for group in raw.split(',').map(str::trim) {
        if strip_custom_prefix(group).is_some() {
            return Err(ValidationError::invalid(
                arg,
                raw,
                "Metric groups and Custom: events cannot be mixed",
            ));
        }
        if !whitelist.contains(&group) {
            return Err(ValidationError::invalid(arg, raw, format!("Please input [{}]", whitelist.join("|"))));
        }
        if !groups.contains(&group) {
            groups.push(group);
        }
    }
    Ok(groups.join(","))
}

fn normalize_custom(arg: ArgId, raw: &str, events: &str) -> Result<String, ValidationError> {
    let parts: Vec<&str> = events.split(',').map(str::trim).collect();
    if parts.is_empty() || parts.len() > MAX_CUSTOM_EVENTS || parts.iter().all(|p| p.is_empty()) {
        return Err(ValidationError::invalid(
            arg,
            raw,
            format!("Custom: takes 1 to {MAX_CUSTOM_EVENTS} event ids"),
        ));
    }
    let mut out: Vec<String> = Vec::with_capacity(parts.len());
    for part in parts {
        let event = event_to_hex(part).ok_or_else(|| {
            ValidationError::invalid(arg, raw, format!("Event {part} is not a hex (0x..) or decimal number"))
        })?;
        if !out.contains(&event) {
            out.push(event);
        }
    }
    Ok(format!("{CUSTOM_PREFIX}{}", out.join(",")))
}

/// Canonical spelling of an event id: `0x1B`, `0x01b` and `27` all give
/// `0x1b`.
fn event_to_hex(part: &str) -> Option<String> {
    let lower = part.to_ascii_lowercase();
    let (digits, radix) = match lower.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (lower.as_str(), 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = u64::from_str_radix(digits, radix).ok()?;
    Some(format!("{value:#x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HostPlatform, PlatformType};

    fn v2() -> HostPlatform {
        HostPlatform::new(PlatformType::CloudV2, false)
    }

    #[test]
    fn test_custom_events_dedup_in_order() {
        let out = normalize(ArgId::AicMetrics, "Custom:0x1,0x2,0x1", &v2()).unwrap();
        assert_eq!(out, "Custom:0x1,0x2");
        // Re-normalizing is stable
        assert_eq!(normalize(ArgId::AicMetrics, &out, &v2()).unwrap(), out);
    }

    #[test]
    fn test_custom_prefix_case_and_decimal() {
        let out = normalize(ArgId::AivMetrics, "custom:0X1B,27,16", &v2()).unwrap();
        assert_eq!(out, "Custom:0x1b,0x10");
    }

    #[test]
    fn test_custom_events_dedup_by_value() {
        let out = normalize(ArgId::AicMetrics, "Custom:0x01,0x1,1,0x0A,10", &v2()).unwrap();
        assert_eq!(out, "Custom:0x1,0xa");
    }

    #[test]
    fn test_custom_event_count_bounds() {
        assert!(normalize(ArgId::AicMetrics, "Custom:", &v2()).is_err());
        let thirty = (1..=30).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        assert!(normalize(ArgId::AicMetrics, &format!("Custom:{thirty}"), &v2()).is_ok());
        let thirty_one = format!("Custom:{thirty},31");
        assert!(normalize(ArgId::AicMetrics, &thirty_one, &v2()).is_err());
    }

    #[test]
    fn test_custom_rejects_bad_event() {
        assert!(normalize(ArgId::AicMetrics, "Custom:0xzz", &v2()).is_err());
        assert!(normalize(ArgId::AicMetrics, "Custom:0x", &v2()).is_err());
        assert!(normalize(ArgId::AicMetrics, "Custom:-1", &v2()).is_err());
    }

    #[test]
    fn test_groups_dedup_and_whitelist() {
        let out = normalize(ArgId::AicMetrics, "Memory,PipeUtilization,Memory", &v2()).unwrap();
        assert_eq!(out, "Memory,PipeUtilization");
        let mini = HostPlatform::new(PlatformType::Mini, false);
        assert!(normalize(ArgId::AicMetrics, "MemoryAccess", &mini).is_err());
    }

    #[test]
    fn test_mixed_forms_rejected() {
        let err = normalize(ArgId::AicMetrics, "Memory,Custom:0x1", &v2()).unwrap_err();
        assert!(err.to_string().contains("cannot be mixed"));
    }
}
