use std::sync::Once;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Calendar dates are exchanged as `YYYY-MM-DD`.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Source of the current instant, injected so resolvers can run at a fixed time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// The server's wall clock in its local offset.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// The current time in the server's local offset.
///
/// The local offset can't always be determined (e.g. on some platforms once
/// other threads are running), in which case UTC is used.
pub fn now() -> OffsetDateTime {
    in_local_offset(OffsetDateTime::now_utc(), UtcOffset::current_local_offset().ok())
}

static UTC_FALLBACK_WARNING: Once = Once::new();

fn in_local_offset(now: OffsetDateTime, local: Option<UtcOffset>) -> OffsetDateTime {
    match local {
        Some(offset) => now.to_offset(offset),
        None => {
            UTC_FALLBACK_WARNING.call_once(|| {
                tracing::warn!("local UTC offset is unknown, release dates will be UTC dates");
            });
            now
        }
    }
}

pub fn format_date(moment: OffsetDateTime) -> String {
    moment
        .date()
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| moment.date().to_string())
}
