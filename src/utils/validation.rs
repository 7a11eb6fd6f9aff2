use crate::utils::error::{Result, StkError};
use crate::utils::time::parse_utcg;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StkError::validation(
            field_name,
            value,
            "must be a non-empty string",
        ));
    }
    Ok(())
}

/// STK 物件名稱不可含 `/` 或空白，否則路徑解析會出錯
pub fn validate_object_name(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if value.contains('/') {
        return Err(StkError::validation(
            field_name,
            value,
            "must not contain '/'",
        ));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(StkError::validation(
            field_name,
            value,
            "must not contain whitespace",
        ));
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN 也會落在這裡
    if !(value >= min && value <= max) {
        return Err(StkError::validation(
            field_name,
            value,
            format!("must be within [{}, {}]", min, max),
        ));
    }
    Ok(())
}

pub fn validate_at_least(field_name: &str, value: f64, min: f64) -> Result<()> {
    if !(value >= min) {
        return Err(StkError::validation(
            field_name,
            value,
            format!("must be >= {}", min),
        ));
    }
    Ok(())
}

pub fn validate_positive(field_name: &str, value: f64) -> Result<()> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(StkError::validation(field_name, value, "must be positive"));
    }
    Ok(())
}

pub fn validate_port(field_name: &str, value: u16) -> Result<()> {
    if value == 0 {
        return Err(StkError::validation(field_name, value, "must be at least 1"));
    }
    Ok(())
}

pub fn validate_utcg(field_name: &str, value: &str) -> Result<()> {
    if parse_utcg(value).is_none() {
        return Err(StkError::validation(
            field_name,
            value,
            "must be an STK UTCG time such as '20 Jan 2020 17:00:00.000'",
        ));
    }
    Ok(())
}
