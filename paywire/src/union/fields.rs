//! Static field lists of payload types.

use serde::{
    Deserializer,
    de::{DeserializeOwned, Error as _, Visitor, value::Error},
    forward_to_deserialize_any,
};

/// Wire field names `T` reads, when it reads a fixed set of object fields.
///
/// Derived structs report their (renamed) fields and tagged unions report
/// their discriminator fields. Maps, flattened structs and free-form values
/// report `None`.
pub(crate) fn declared_fields<T: DeserializeOwned>() -> Option<&'static [&'static str]> {
    let mut captured = None;
    if T::deserialize(FieldCapture { captured: &mut captured }).is_ok() {
        return None;
    }
    captured
}

/// Deserializer that records the field list of the first struct request and aborts.
struct FieldCapture<'a> {
    captured: &'a mut Option<&'static [&'static str]>,
}

impl<'de> Deserializer<'de> for FieldCapture<'_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Error> {
        Err(Error::custom("no fixed field list"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Error> {
        *self.captured = Some(fields);
        Err(Error::custom("field list captured"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;
    use serde_json::Value;

    use super::*;

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Refund {
        #[serde(rename = "refundId")]
        id: String,
        amount_in_minor: u64,
    }

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Envelope {
        id: String,
        #[serde(flatten)]
        rest: HashMap<String, Value>,
    }

    #[test]
    fn test_struct_reports_wire_fields() {
        assert_eq!(declared_fields::<Refund>(), Some(&["refundId", "amount_in_minor"][..]));
        assert_eq!(declared_fields::<Box<Refund>>(), Some(&["refundId", "amount_in_minor"][..]));
    }

    #[test]
    fn test_open_shapes_report_nothing() {
        assert_eq!(declared_fields::<Value>(), None);
        assert_eq!(declared_fields::<HashMap<String, u64>>(), None);
        assert_eq!(declared_fields::<Envelope>(), None);
        assert_eq!(declared_fields::<String>(), None);
    }
}
