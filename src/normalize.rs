//! Shared field derivations used by more than one resource fetcher.
//!
//! Everything here is pure: no I/O, and the capture time is passed in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Returned for clock skew, i.e. a creation time after the capture time.
pub const ZERO_AGE: &str = "0s";
/// Returned when the object carries no creation timestamp.
pub const UNKNOWN: &str = "Unknown";
/// Role string for objects without any role label.
pub const NO_ROLES: &str = "None";

/// Formats `now - created` as `{d}d{h}h{m}m{s}s`, dropping leading zero units.
///
/// Sub-second remainders are truncated, never rounded. A negative duration
/// yields [`ZERO_AGE`].
pub fn compute_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created);
    let total = elapsed.num_seconds();
    if total <= 0 {
        return ZERO_AGE.to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d{hours}h{minutes}m{seconds}s")
    } else if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Age of an object from its metadata, or [`UNKNOWN`] without a timestamp.
pub fn age_of(meta: &ObjectMeta, now: DateTime<Utc>) -> String {
    meta.creation_timestamp
        .as_ref()
        .map(|created| compute_age(created.0, now))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Joins the last path segment of every label key containing `role`.
///
/// `node-role.kubernetes.io/worker` contributes `worker`. With no role labels
/// the result is exactly [`NO_ROLES`].
pub fn extract_roles(labels: &BTreeMap<String, String>) -> String {
    let roles = labels
        .keys()
        .filter(|key| key.contains("role"))
        .map(|key| key.rsplit('/').next().unwrap_or(key))
        .collect::<Vec<_>>()
        .join(",");

    if roles.is_empty() {
        NO_ROLES.to_string()
    } else {
        roles
    }
}

/// Image reference up to the first `:`; the whole string when there is none.
pub fn image_type(image: &str) -> &str {
    image.split(':').next().unwrap_or(image)
}

pub fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

pub fn namespace_of(meta: &ObjectMeta) -> String {
    meta.namespace.clone().unwrap_or_default()
}
