//! Display rules for board posts.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

/// Weekday labels indexed by days counted from Sunday.
pub const WEEKDAY_LABELS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

const DATE_FORMAT: &str = "%Y年%m月%d日";
const TIME_FORMAT: &str = "%H時%M分%S秒";
const LINE_BREAK: &str = "<br>";

pub fn weekday_label(days_from_sunday: u32) -> &'static str {
    WEEKDAY_LABELS[days_from_sunday as usize % WEEKDAY_LABELS.len()]
}

/// Formats as `YYYY年MM月DD日(W) HH時mm分ss秒` in the zone carried by `local`.
pub fn format_display_timestamp(local: &DateTime<Tz>) -> String {
    let weekday = weekday_label(local.weekday().num_days_from_sunday());
    format!(
        "{}({weekday}) {}",
        local.format(DATE_FORMAT),
        local.format(TIME_FORMAT)
    )
}

/// Escapes post content for HTML and turns each newline into `<br>`.
///
/// A `\r` preceding the newline is dropped so textarea submissions (CRLF)
/// render the same as LF content.
pub fn content_to_html(content: &str) -> String {
    content
        .split('\n')
        .map(|line| ammonia::clean_text(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}
