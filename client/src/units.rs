/// Renders a base-unit amount with `decimals` decimals, trimming trailing
/// zeros: `10 * 10^18` with 18 decimals is `"10"`, half a token is `"0.5"`.
/// Decimals whose scale does not fit a `u128` render raw base units.
pub fn format_units(amount: u128, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(decimals as u32) else {
        return amount.to_string();
    };
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0width$}", width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// Inverse of [`format_units`]. Rejects more fractional digits than
/// `decimals` and anything that overflows.
pub fn parse_units(value: &str, decimals: u8) -> Option<u128> {
    let value = value.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > decimals as usize
        || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let scale = 10u128.checked_pow(decimals as u32)?;
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = decimals as usize);
        padded.parse().ok()?
    };
    whole.checked_mul(scale)?.checked_add(fraction)
}
