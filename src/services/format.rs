//! Relative time labels
//!
//! Produces translation keys rather than text; the rendering layer owns the
//! translation tables.

use chrono::{DateTime, Utc};

/// Translation key describing how long ago `then` was, seen from `now`
///
/// Older than thirty days falls back to the plain date.
pub fn relative_time_key(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();

    let key = if seconds < 5 {
        "t_time_just_now"
    } else if seconds < 60 {
        "t_time_seconds_ago"
    } else if seconds < 3_600 {
        match seconds / 60 {
            1 => "t_time_one_minute_ago",
            2 => "t_time_two_minutes_ago",
            3 => "t_time_three_minutes_ago",
            4 => "t_time_four_minutes_ago",
            5 => "t_time_five_minutes_ago",
            6..=10 => "t_time_less_than_ten_minutes_ago",
            11..=15 => "t_time_less_than_fifteen_minutes_ago",
            16..=30 => "t_time_less_than_thirty_minutes_ago",
            _ => "t_time_less_than_hour_ago",
        }
    } else if seconds < 86_400 {
        match seconds / 3_600 {
            1 => "t_time_one_hour_ago",
            2 => "t_time_two_hours_ago",
            3 => "t_time_three_hours_ago",
            4 => "t_time_four_hours_ago",
            5..=6 => "t_time_less_than_six_hours_ago",
            7..=12 => "t_time_less_than_twelve_hours_ago",
            _ => "t_time_less_than_day_ago",
        }
    } else {
        match seconds / 86_400 {
            1 => "t_time_one_day_ago",
            2 => "t_time_two_days_ago",
            3 => "t_time_three_days_ago",
            4..=7 => "t_time_less_than_week_ago",
            8..=14 => "t_time_less_than_two_weeks_ago",
            15..=30 => "t_time_less_than_month_ago",
            _ => return then.format("%Y-%m-%d").to_string(),
        }
    };

    key.to_string()
}
