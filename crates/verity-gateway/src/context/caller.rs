use axum::http::HeaderMap;

use verity_core::error::{Result, VerityError};
use verity_core::Address;

/// Header naming the account on whose behalf a mutation is made.
pub const CALLER_HEADER: &str = "x-verity-caller";

/// Resolve the caller identity or return a client-visible error.
pub fn resolve_caller(headers: &HeaderMap) -> Result<Address> {
    let raw = headers
        .get(CALLER_HEADER)
        .ok_or_else(|| VerityError::BadRequest(format!("missing {CALLER_HEADER} header")))?;
    let s = raw
        .to_str()
        .map_err(|_| VerityError::BadRequest(format!("{CALLER_HEADER} is not ascii")))?;
    s.trim()
        .parse::<Address>()
        .map_err(|e| VerityError::BadRequest(format!("{CALLER_HEADER}: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn parses_header() {
        let mut h = HeaderMap::new();
        h.insert(
            CALLER_HEADER,
            HeaderValue::from_static("0x00000000000000000000000000000000000000a0"),
        );
        assert_eq!(resolve_caller(&h).expect("caller"), Address::from_low_u8(0xA0));
    }

    #[test]
    fn missing_or_malformed_is_bad_request() {
        let mut h = HeaderMap::new();
        let err = resolve_caller(&h).expect_err("missing");
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");

        h.insert(CALLER_HEADER, HeaderValue::from_static("0xzz"));
        let err = resolve_caller(&h).expect_err("malformed");
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    }
}
