use std::time::Duration;

/// Parses a compact duration string such as `5m` or `1h30m`.
///
/// The string is a sequence of `<digits><unit>` pairs where the unit is one
/// of `s`, `m`, `h` or `d`. This is the same notation the search backend uses
/// for scroll lifetimes.
///
/// Returns `None` for an empty string, a missing or unknown unit, or on
/// overflow.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use metacpan_client::time::parse_duration;
///
/// assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
/// assert_eq!(parse_duration("5"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    if input.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut number_str = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                number_str.push(chars.next()?);
            } else {
                break;
            }
        }

        if number_str.is_empty() {
            return None;
        }

        let number: u64 = number_str.parse().ok()?;
        let multiplier = match chars.next()? {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return None,
        };

        total = total.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(Duration::from_secs(total))
}
