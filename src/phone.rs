//! Phone number canonicalization.
//!
//! Every lookup key in the service is the domestic leading-zero form
//! (`09121234567`). Clients may send `+98 912 123 4567`, `0098912...`,
//! `98912...` or the bare `9121234567`; all of them map to the same key.

use once_cell::sync::Lazy;
use regex::Regex;

const COUNTRY_CODE: &str = "98";
const DIALED_COUNTRY_CODE: &str = "0098";
const NATIONAL_LEN: usize = 10;

static MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^09\d{9}$").expect("valid mobile regex"));

/// Converts a phone number to the canonical domestic form.
///
/// Never fails. Non-digits are dropped and input that matches none of the known
/// shapes is returned as its digits, which may be empty.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match national_part(&digits) {
        Some(national) => format!("0{}", national),
        None => digits,
    }
}

/// Converts a phone number to the international form without a plus sign
/// (`989121234567`), as SMS gateways expect it.
pub fn to_international(raw: &str) -> String {
    let canonical = normalize(raw);
    match canonical.strip_prefix('0') {
        Some(rest) if !rest.starts_with('0') && rest.len() == NATIONAL_LEN => {
            format!("{}{}", COUNTRY_CODE, rest)
        }
        _ => canonical,
    }
}

/// True for a canonical mobile number.
pub fn is_valid(canonical: &str) -> bool {
    MOBILE_REGEX.is_match(canonical)
}

fn national_part(digits: &str) -> Option<&str> {
    for prefix in [DIALED_COUNTRY_CODE, COUNTRY_CODE] {
        if let Some(rest) = digits.strip_prefix(prefix) {
            if let Some(national) = after_country_code(rest) {
                return Some(national);
            }
        }
    }
    // mobile number typed without its leading zero
    if digits.len() == NATIONAL_LEN && digits.starts_with('9') {
        return Some(digits);
    }
    None
}

/// Accepts the domestic trunk zero after the country code (`+98 0912...`).
fn after_country_code(rest: &str) -> Option<&str> {
    match rest.len() {
        NATIONAL_LEN => Some(rest),
        len if len == NATIONAL_LEN + 1 && rest.starts_with("09") => Some(&rest[1..]),
        _ => None,
    }
}
