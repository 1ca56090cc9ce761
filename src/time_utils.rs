// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z`
/// suffix. The fixed width keeps lexicographic order equal to time order,
/// which the store relies on when sorting by `created_at`.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored timestamp format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}
