//! Read and write paths of the tagged-union codec.

use serde_json::{Map, Value};
use tracing::trace;

use super::{TaggedUnion, resolve};
use crate::error::{CodecError, DefinitionError};

/// Reads a union from a wire value.
///
/// The whole object, discriminator included, is deserialized as the selected
/// variant's payload type; fields the payload does not declare are ignored.
pub(crate) fn read<U: TaggedUnion>(value: Value) -> Result<U, CodecError> {
    let resolved = resolve::<U>()?;

    let Value::Object(object) = &value else {
        return Err(CodecError::MalformedInput { type_name: U::NAME, found: json_kind(&value) });
    };
    let variant = probe_discriminator(U::NAME, U::RULE.fields(), object, |label| resolved.lookup(label))?;
    trace!(union = U::NAME, discriminator = variant.discriminator, "resolved union variant");

    let lift = variant.lift.ok_or(DefinitionError::MissingVariantConstructor {
        type_name: U::NAME,
        variant: variant.type_name,
    })?;
    lift(value).map_err(|err| CodecError::VariantTypeMismatch {
        discriminator: variant.discriminator.to_owned(),
        variant: variant.type_name,
        message: err.to_string(),
    })
}

/// Writes a union as a wire object with the active label under the rule's primary field.
///
/// Fallback fields the payload carries are written as they are. A payload
/// whose object already holds the primary field fails with
/// [`DefinitionError::DiscriminatorFieldCollision`]: [`resolve`] catches
/// declared struct fields, this catches free-form payloads at write time.
pub(crate) fn write<U: TaggedUnion>(union: &U) -> Result<Value, CodecError> {
    resolve::<U>()?;

    let mut value = union.variant_to_value()?;
    let object = match &mut value {
        Value::Object(object) => object,
        other => return Err(CodecError::MalformedInput { type_name: U::NAME, found: json_kind(other) }),
    };

    if let Some(primary) = U::RULE.primary() {
        if object.contains_key(primary) {
            let variant = U::VARIANTS.get(union.index()).map_or(U::NAME, |variant| variant.type_name);
            return Err(CodecError::Definition(DefinitionError::DiscriminatorFieldCollision {
                type_name: U::NAME,
                variant,
                field: primary,
            }));
        }
        object.insert(primary.to_owned(), Value::String(union.discriminator().to_owned()));
    }

    Ok(value)
}

/// Probes `fields` in order; the first string value `lookup` recognises wins.
///
/// A present but unrecognised value yields [`CodecError::UnknownDiscriminator`]
/// carrying the first such value; no present field at all yields
/// [`CodecError::MissingDiscriminatorField`].
pub(crate) fn probe_discriminator<T>(
    type_name: &'static str,
    fields: &'static [&'static str],
    object: &Map<String, Value>,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<T, CodecError> {
    let mut unmatched: Option<String> = None;

    for field in fields {
        let Some(candidate) = object.get(*field) else {
            continue;
        };
        match candidate {
            Value::String(label) => {
                if let Some(found) = lookup(label) {
                    return Ok(found);
                }
                unmatched.get_or_insert_with(|| label.clone());
            }
            other => {
                unmatched.get_or_insert_with(|| other.to_string());
            }
        }
    }

    match unmatched {
        Some(value) => Err(CodecError::UnknownDiscriminator {
            type_name,
            value,
            raw: serde_json::to_string(object).unwrap_or_default(),
        }),
        None => Err(CodecError::MissingDiscriminatorField { type_name, fields }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
