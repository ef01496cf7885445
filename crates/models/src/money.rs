//! Money is held as integer paise (1 INR = 100 paise).

use crate::errors::{invalid, ModelError};

/// Largest single price or booking amount accepted: 10 crore INR.
pub const MAX_AMOUNT_PAISE: i64 = 10_000_000_000;

/// Tax on `subtotal` at `bps` basis points, rounded half up to the nearest paisa.
pub fn tax_for(subtotal: i64, bps: u32) -> Result<i64, ModelError> {
    let tax = (i128::from(subtotal) * i128::from(bps) + 5_000).div_euclid(10_000);
    i64::try_from(tax).map_err(|_| invalid("amount too large to tax"))
}

/// `(tax, total)` for a tax-exclusive subtotal.
pub fn with_tax(subtotal: i64, bps: u32) -> Result<(i64, i64), ModelError> {
    let tax = tax_for(subtotal, bps)?;
    let total = subtotal.checked_add(tax).ok_or_else(|| invalid("amount too large to tax"))?;
    Ok((tax, total))
}

/// "1234.50"
pub fn format_amount(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn format_inr(paise: i64) -> String {
    format!("\u{20b9}{}", format_amount(paise))
}

/// ASCII rendition for contexts without the rupee glyph (PDF base fonts).
pub fn format_plain(paise: i64, currency: &str) -> String {
    format!("{currency} {}", format_amount(paise))
}

/// Tax rate as a percentage label, e.g. 1800 -> "18", 1250 -> "12.5".
pub fn rate_label(bps: u32) -> String {
    if bps % 100 == 0 {
        (bps / 100).to_string()
    } else {
        let s = format!("{}.{:02}", bps / 100, bps % 100);
        s.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gst_rounds_half_up() {
        assert_eq!(tax_for(100_000, 1800).unwrap(), 18_000);
        // 18% of 0.25 INR = 4.5 paise -> 5
        assert_eq!(tax_for(25, 1800).unwrap(), 5);
        assert_eq!(tax_for(0, 1800).unwrap(), 0);
        assert_eq!(with_tax(49_900, 1800).unwrap(), (8_982, 58_882));
    }

    #[test]
    fn huge_amounts_error_instead_of_overflowing() {
        assert_eq!(with_tax(MAX_AMOUNT_PAISE, 1800).unwrap(), (1_800_000_000, 11_800_000_000));
        assert!(tax_for(i64::MAX, 20_000).is_err());
        assert!(with_tax(i64::MAX, 1).is_err());
        assert!(with_tax(10_000_000_000_000_000, 1800).is_ok());
    }

    #[test]
    fn formatting() {
        assert_eq!(format_amount(123_450), "1234.50");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(-150), "-1.50");
        assert_eq!(format_inr(58_882), "\u{20b9}588.82");
        assert_eq!(format_plain(100, "INR"), "INR 1.00");
    }

    #[test]
    fn rate_labels() {
        assert_eq!(rate_label(1800), "18");
        assert_eq!(rate_label(1250), "12.5");
        assert_eq!(rate_label(1805), "18.05");
    }
}
