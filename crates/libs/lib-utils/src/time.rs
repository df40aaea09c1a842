//! # Time Utilities
//!
//! Clock access and timestamp ordering using chrono.

use chrono::{DateTime, Duration, Utc};

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Return `candidate`, or one microsecond past `previous` if `candidate` does not
/// come strictly after it.
///
/// Keeps creation timestamps strictly increasing even when the wall clock
/// stalls or steps backwards.
pub fn strictly_after(candidate: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match previous {
        Some(prev) if candidate <= prev => prev + Duration::microseconds(1),
        _ => candidate,
    }
}
