//! Field-level validation shared by entity create helpers and services.
use chrono::NaiveTime;

use crate::errors::{invalid, ModelError};

pub const MAX_NOTES: usize = 500;
pub const MAX_REASON: usize = 200;
pub const MAX_COMMENT: usize = 1000;

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    if email.is_empty() || email.len() > 255 || email.contains(char::is_whitespace) {
        return Err(invalid("invalid email"));
    }
    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("invalid email"))?;
    if local.is_empty() || domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') || domain.contains('@') {
        return Err(invalid("invalid email"));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} required")));
    }
    validate_max_len(field, value, max)
}

pub fn validate_max_len(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.chars().count() > max {
        return Err(invalid(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

/// `+` optional, then 9 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ModelError> {
    let digits = phone.trim().strip_prefix('+').unwrap_or(phone.trim());
    if !(9..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("phone number must be entered in the format '+999999999', up to 15 digits"));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ModelError> {
    let ok = !slug.is_empty()
        && slug.len() <= 100
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !ok {
        return Err(invalid("slug must be lowercase letters, digits and dashes"));
    }
    Ok(())
}

/// Lowercase, collapse every non-alphanumeric run into a single dash.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

pub fn validate_rating(rating: i32) -> Result<(), ModelError> {
    if !(1..=5).contains(&rating) {
        return Err(invalid("rating must be between 1 and 5"));
    }
    Ok(())
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime, ModelError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| invalid(format!("invalid time '{value}', expected HH:MM")))
}

/// Both ends must parse as `HH:MM` and start must be strictly before end.
pub fn validate_time_window(start: &str, end: &str) -> Result<(NaiveTime, NaiveTime), ModelError> {
    let s = parse_hhmm(start)?;
    let e = parse_hhmm(end)?;
    if s >= e {
        return Err(invalid("end time must be after start time"));
    }
    Ok((s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@c.de").is_err());
        assert!(validate_email("@c.de").is_err());
    }

    #[test]
    fn phone_rules() {
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765-43210").is_err());
    }

    #[test]
    fn slug_rules_and_slugify() {
        assert!(validate_slug("appliance-repair").is_ok());
        assert!(validate_slug("Bad Slug").is_err());
        assert_eq!(slugify("Appliance Repair & AC"), "appliance-repair-ac");
        assert_eq!(slugify("  Pest  Control "), "pest-control");
    }

    #[test]
    fn time_window_requires_order() {
        assert!(validate_time_window("09:00", "17:30").is_ok());
        assert!(validate_time_window("17:00", "09:00").is_err());
        assert!(validate_time_window("09:00", "09:00").is_err());
        assert!(validate_time_window("9am", "10:00").is_err());
    }

    #[test]
    fn length_caps_count_chars() {
        assert!(validate_max_len("notes", &"x".repeat(MAX_NOTES), MAX_NOTES).is_ok());
        assert!(validate_max_len("notes", &"x".repeat(MAX_NOTES + 1), MAX_NOTES).is_err());
        assert!(validate_required("name", "  ", 10).is_err());
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
