//! Phone number utilities

/// Strip formatting characters, keeping digits and a leading `+`
///
/// A `+` anywhere but the first significant position is dropped.
pub fn strip_formatting(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() || (c == '+' && i == 0) {
            out.push(c);
        }
    }
    out
}

/// Mask a phone number for logs (e.g. +91****3210)
///
/// Keeps the first three and last four characters; anything shorter than
/// eight characters is fully masked.
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() >= 8 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}
