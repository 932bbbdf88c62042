//! Typed decoding of framed responses.
//!
//! The set of decodable types is closed: text, unsigned integers, booleans,
//! floating point values and [`SystemState`]. Each is picked at the call
//! site, e.g. `connection.execute::<u32>("get state Running")`.

use models::SystemState;

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for bool {}
    impl Sealed for f64 {}
    impl Sealed for models::SystemState {}
}

/// A type a response can be decoded into.
pub trait FromResponse: sealed::Sealed + Sized {
    const TYPE_NAME: &'static str;

    /// Decode the framed response; the error is a short reason.
    fn from_response(text: &str) -> Result<Self, String>;
}

impl FromResponse for String {
    const TYPE_NAME: &'static str = "text";

    fn from_response(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }
}

impl FromResponse for u32 {
    const TYPE_NAME: &'static str = "unsigned integer";

    fn from_response(text: &str) -> Result<Self, String> {
        text.trim().parse().map_err(|e| format!("{e}"))
    }
}

impl FromResponse for u64 {
    const TYPE_NAME: &'static str = "unsigned integer";

    fn from_response(text: &str) -> Result<Self, String> {
        text.trim().parse().map_err(|e| format!("{e}"))
    }
}

impl FromResponse for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_response(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
            Ok(false)
        } else {
            Err(String::from("expected true or false"))
        }
    }
}

impl FromResponse for f64 {
    const TYPE_NAME: &'static str = "floating point number";

    fn from_response(text: &str) -> Result<Self, String> {
        text.trim().parse().map_err(|e| format!("{e}"))
    }
}

impl FromResponse for SystemState {
    const TYPE_NAME: &'static str = "system state";

    fn from_response(text: &str) -> Result<Self, String> {
        text.parse::<SystemState>().map_err(|_| String::from("not a known system state"))
    }
}
