// 🔢 CNIC handling - 13-digit national identity numbers
//
// Enforcement is client-side only: the input filter runs on every keystroke
// and validation runs again before submission.

/// Number of digits in a CNIC
pub const CNIC_LEN: usize = 13;

/// Keep only ASCII digits, truncated to [`CNIC_LEN`].
///
/// Applied to the whole field value after each keystroke, so pasted text
/// with dashes (`35202-1234567-1`) collapses to the bare number.
pub fn filter_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(CNIC_LEN)
        .collect()
}

/// True when `value` is exactly 13 ASCII digits
pub fn is_valid(value: &str) -> bool {
    value.len() == CNIC_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// Group a valid CNIC as `XXXXX-XXXXXXX-X`. Anything else is returned as-is.
pub fn display(value: &str) -> String {
    if !is_valid(value) {
        return value.to_string();
    }
    format!("{}-{}-{}", &value[..5], &value[5..12], &value[12..])
}
