//! JSON encoding and decoding with wire naming.
//!
//! All request and response bodies pass through this module. Encoding
//! applies the [naming policy](crate::naming) to struct field names; decoding
//! reads plain JSON, with tagged unions resolved by the
//! [union codec](crate::union).
//!
//! # Examples
//!
//! ```
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Refund {
//!     #[serde(rename = "AmountInMinor")]
//!     amount: u64,
//! }
//!
//! let json = paywire::wire::encode(&Refund { amount: 100 }).unwrap();
//! assert_eq!(json, r#"{"amount_in_minor":100}"#);
//! ```

mod serializer;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
pub use serializer::WireSerializer;

use crate::{
    error::CodecError,
    union::{self, TaggedUnion},
};

/// Serializes `value` to a wire-named JSON value.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if a `Serialize` impl fails, and any error
/// raised while writing a tagged union nested in `value`.
pub fn to_wire_value<T: ?Sized + Serialize>(value: &T) -> Result<Value, CodecError> {
    Ok(value.serialize(WireSerializer)?)
}

/// Serializes `value` to compact wire JSON text.
///
/// # Errors
///
/// See [`to_wire_value`].
pub fn encode<T: ?Sized + Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&to_wire_value(value)?)?)
}

/// Serializes `value` to the exact bytes that are both signed and sent.
///
/// The request signer and the transport must see the same body, so callers
/// sign and transmit the returned buffer rather than re-encoding.
///
/// # Errors
///
/// See [`to_wire_value`].
pub fn canonical_body<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(&to_wire_value(value)?)?)
}

/// Deserializes wire JSON text into `T`.
///
/// Tagged unions nested anywhere in `T` are resolved through their
/// discriminator rule, and a union that fails to resolve surfaces as its own
/// typed [`CodecError`] rather than a flattened serde message.
///
/// # Errors
///
/// - [`CodecError::Json`] on malformed JSON or a shape mismatch outside any union
/// - the union's [`CodecError`] when a tagged union in `T` cannot be read
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T, CodecError> {
    recovering(|| serde_json::from_str(json))
}

/// Deserializes a wire JSON body into `T`.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, CodecError> {
    recovering(|| serde_json::from_slice(body))
}

/// Deserializes an already-parsed wire value into `T`.
///
/// # Errors
///
/// See [`decode`].
pub fn from_wire_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
    recovering(|| serde_json::from_value(value))
}

fn recovering<T>(decode: impl FnOnce() -> Result<T, serde_json::Error>) -> Result<T, CodecError> {
    union::reset_failure();
    decode().map_err(union::recover_failure)
}

/// Decodes a top-level tagged union, reporting the precise [`CodecError`] on failure.
///
/// # Errors
///
/// - [`CodecError::Json`] if `json` is not valid JSON
/// - [`CodecError::MalformedInput`] if it is not a JSON object
/// - [`CodecError::MissingDiscriminatorField`] / [`CodecError::UnknownDiscriminator`]
///   if no variant can be selected
/// - [`CodecError::VariantTypeMismatch`] if the payload does not fit the selected variant
pub fn decode_union<U: TaggedUnion>(json: &str) -> Result<U, CodecError> {
    let value: Value = serde_json::from_str(json)?;
    union::read(value)
}
