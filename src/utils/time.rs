use chrono::{Duration, NaiveDateTime};

// STK UTCG 格式，例如 "20 Jan 2020 17:00:00.000"
const UTCG_INPUT_FORMATS: [&str; 2] = ["%d %b %Y %H:%M:%S%.f", "%d %b %Y %H:%M:%S"];
const UTCG_OUTPUT_FORMAT: &str = "%-d %b %Y %H:%M:%S%.3f";

pub fn parse_utcg(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim().trim_matches('"');
    UTCG_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

pub fn format_utcg(value: &NaiveDateTime) -> String {
    value.format(UTCG_OUTPUT_FORMAT).to_string()
}

/// 由起始時間與時長（小時）計算結束時間，解析失敗回傳 None
pub fn utcg_after_hours(start: &str, hours: f64) -> Option<String> {
    let start = parse_utcg(start)?;
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() {
        return None;
    }
    let stop = start.checked_add_signed(Duration::try_milliseconds(millis as i64)?)?;
    Some(format_utcg(&stop))
}
