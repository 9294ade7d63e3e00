//! Form body validation for the intake endpoint.
//!
//! Bodies are checked, not rewritten: a valid body is forwarded exactly as
//! received. The rules follow the usual strict form parsers: UTF-8 only,
//! `&` as the sole separator, and every `%` followed by two hex digits.

use url::form_urlencoded;

use crate::error::IntakeError;
use crate::relay::FORM_CONTENT_TYPE;

/// Validate an `application/x-www-form-urlencoded` body.
///
/// Returns the body as a string and the number of key/value pairs.
pub fn validate_form(body: &[u8]) -> Result<(&str, usize), IntakeError> {
    let text = std::str::from_utf8(body).map_err(|_| IntakeError::NotUtf8)?;

    // An escaped `%3B` is data, not a separator.
    if text.contains(';') {
        return Err(IntakeError::Semicolon);
    }

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(IntakeError::InvalidEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let pairs = form_urlencoded::parse(text.as_bytes()).count();
    Ok((text, pairs))
}

/// Check the request content type, if one was sent.
///
/// Parameters such as `charset` are ignored.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), IntakeError> {
    let Some(raw) = content_type else {
        return Ok(());
    };

    let essence = raw.split(';').next().unwrap_or("").trim();
    if essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(IntakeError::UnsupportedContentType(raw.to_string()))
    }
}
