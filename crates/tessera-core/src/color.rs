use crate::error::{Result, TesseraError};

/// Accepts `#RRGGBB` in either case and returns it uppercased.
pub fn validate_hex_color(color: &str) -> Result<String> {
    let digits = color
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| TesseraError::InvalidColor(color.to_string()))?;
    Ok(format!("#{}", digits.to_ascii_uppercase()))
}
