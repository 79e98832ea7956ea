use chrono::{DateTime, Utc};

/// Whole seconds until `until`, rounded up and never below one.
pub fn seconds_until(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds();
    if millis <= 0 {
        return 1;
    }

    ((millis as u64).div_ceil(1000)).max(1)
}

/// `agents-as-tools` -> `agents as tools`
pub fn humanize_slug(slug: &str) -> String {
    slug.replace(['-', '_'], " ")
}
