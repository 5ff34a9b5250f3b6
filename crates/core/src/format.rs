//! Display helpers shared by the feed and watchlist views.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

/// Human label for how long ago something was posted.
///
/// Under a minute is "Just now", under an hour counts minutes, under a day
/// counts hours, anything older shows the month and day (`Jun 17`).
#[must_use]
pub fn relative_time(at: DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);

    if elapsed.num_days() >= 1 {
        return at.format("%b %d").to_string();
    }

    let hours = elapsed.num_hours();
    if hours >= 1 {
        return format!("{hours} hour{} ago", plural(hours));
    }

    let minutes = elapsed.num_minutes();
    if minutes >= 1 {
        return format!("{minutes} minute{} ago", plural(minutes));
    }

    "Just now".to_string()
}

/// Unpadded `D/M/YYYY`.
#[must_use]
pub fn short_date(at: DateTime<FixedOffset>) -> String {
    format!("{}/{}/{}", at.day(), at.month(), at.year())
}

const fn plural(n: i64) -> &'static str {
    if n > 1 { "s" } else { "" }
}
