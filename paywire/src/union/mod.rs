//! Tagged (discriminated) unions over JSON objects.
//!
//! The API represents polymorphic resources as JSON objects carrying a string
//! discriminator, for example a payment whose `status` is
//! `"authorization_required"`, `"authorized"` or `"failed"`, each shape with
//! its own fields. This module maps such objects onto closed Rust enums whose
//! variants each wrap one concrete payload type.
//!
//! # Declaring a union
//!
//! Unions are declared with [`tagged_union!`](crate::tagged_union). The
//! macro generates the enum, one `From` lift per variant, the
//! [`TaggedUnion`] impl (the discriminator table and rule) and
//! `Serialize`/`Deserialize` impls routed through this module's codec. Labels
//! are checked for uniqueness at compile time.
//!
//! ```
//! use paywire::tagged_union;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct Settled { pub settled_at: String }
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct Failed { pub failure_reason: String }
//!
//! tagged_union! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum Outcome by ["status"] {
//!         Settled(Settled) = "settled",
//!         Failed(Failed) = "failed",
//!     }
//! }
//!
//! let outcome: Outcome =
//!     paywire::wire::decode(r#"{"status":"failed","failure_reason":"expired"}"#).unwrap();
//! assert_eq!(outcome, Outcome::Failed(Failed { failure_reason: "expired".into() }));
//! assert_eq!(
//!     paywire::wire::encode(&outcome).unwrap(),
//!     r#"{"failure_reason":"expired","status":"failed"}"#
//! );
//! ```
//!
//! # Discriminator resolution
//!
//! Each union carries an explicit, ordered [`DiscriminatorRule`]. On read the
//! rule's fields are probed in order and the first one whose string value is
//! a known label selects the variant, so a fallback field wins when the
//! primary one is present but unmapped. On write the active variant is
//! serialized through its own concrete type and the label is always written
//! under the rule's first field. Payloads may carry the rule's fallback
//! fields (a legacy `status` next to a `type` label), but a payload that
//! declares the primary field itself cannot round-trip and is rejected with
//! [`DefinitionError::DiscriminatorFieldCollision`]. This also covers a
//! variant whose payload is a union discriminated by the same field.

mod codec;
mod fields;

use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::{Arc, LazyLock},
};

use serde::{
    Deserializer,
    de::{self, DeserializeOwned, MapAccess, Visitor},
};
use serde_json::{Map, Value};

pub(crate) use self::codec::{json_kind, probe_discriminator, read, write};
use crate::{
    cache::TypeCache,
    error::{CodecError, DefinitionError},
};

/// Lifts a whole wire object into the union through one variant's payload type.
pub type Lift<U> = fn(Value) -> Result<U, serde_json::Error>;

/// Reports the object fields a payload type reads, if that set is fixed.
pub type WireFields = fn() -> Option<&'static [&'static str]>;

/// Ordered list of wire fields probed for a union's discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscriminatorRule {
    fields: &'static [&'static str],
}

impl DiscriminatorRule {
    /// Discriminator in `"type"` only.
    pub const TYPE: Self = Self::new(&["type"]);

    /// Discriminator in `"status"` only.
    pub const STATUS: Self = Self::new(&["status"]);

    /// `"type"` first, falling back to `"status"`.
    pub const TYPE_OR_STATUS: Self = Self::new(&["type", "status"]);

    /// Creates a rule probing `fields` in order.
    #[must_use]
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self { fields }
    }

    /// Fields probed on read, in priority order.
    #[must_use]
    pub const fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Field the label is written to.
    #[must_use]
    pub fn primary(&self) -> Option<&'static str> {
        self.fields.first().copied()
    }
}

/// One alternative of a tagged union.
pub struct VariantDescriptor<U> {
    /// Wire label selecting this variant.
    pub discriminator: &'static str,
    /// Name of the payload type, for diagnostics.
    pub type_name: &'static str,
    /// Construction path into the union; `None` marks a broken definition.
    pub lift: Option<Lift<U>>,
    /// Field list of the payload, checked against the rule's primary field.
    pub wire_fields: Option<WireFields>,
}

impl<U> VariantDescriptor<U> {
    /// Describes a variant constructed through `lift`.
    #[must_use]
    pub const fn new(discriminator: &'static str, type_name: &'static str, lift: Lift<U>) -> Self {
        Self { discriminator, type_name, lift: Some(lift), wire_fields: None }
    }

    /// Attaches the payload's field list so [`resolve`] can reject a payload
    /// that declares the discriminator field.
    #[must_use]
    pub const fn with_wire_fields(self, wire_fields: WireFields) -> Self {
        Self { wire_fields: Some(wire_fields), ..self }
    }

    /// Describes a variant with no construction path.
    ///
    /// Resolving a union containing such a variant fails with
    /// [`DefinitionError::MissingVariantConstructor`].
    #[must_use]
    pub const fn without_lift(discriminator: &'static str, type_name: &'static str) -> Self {
        Self { discriminator, type_name, lift: None, wire_fields: None }
    }
}

impl<U> fmt::Debug for VariantDescriptor<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantDescriptor")
            .field("discriminator", &self.discriminator)
            .field("type_name", &self.type_name)
            .field("has_lift", &self.lift.is_some())
            .finish()
    }
}

/// A closed set of variants, each identified on the wire by a discriminator label.
///
/// Implemented by [`tagged_union!`](crate::tagged_union); hand-written impls
/// are validated by [`resolve`] on first use.
pub trait TaggedUnion: Sized + 'static {
    /// Union type name, for diagnostics.
    const NAME: &'static str;

    /// Fields probed for the discriminator.
    const RULE: DiscriminatorRule;

    /// Variants in declaration order.
    const VARIANTS: &'static [VariantDescriptor<Self>];

    /// Position of the active variant in [`VARIANTS`](Self::VARIANTS).
    fn index(&self) -> usize;

    /// The active variant's payload as its concrete type.
    fn value(&self) -> &dyn Any;

    /// Serializes the active payload through its concrete type.
    ///
    /// # Errors
    ///
    /// Returns the payload's serialization error.
    fn variant_to_value(&self) -> Result<Value, CodecError>;

    /// Wire label of the active variant.
    fn discriminator(&self) -> &'static str {
        Self::VARIANTS.get(self.index()).map_or("", |variant| variant.discriminator)
    }
}

/// Validated view of a union's variant table.
pub struct ResolvedUnion<U> {
    layout: Arc<UnionLayout>,
    _union: PhantomData<fn() -> U>,
}

impl<U: TaggedUnion> ResolvedUnion<U> {
    /// Variant matching a wire label.
    #[must_use]
    pub fn lookup(&self, discriminator: &str) -> Option<&'static VariantDescriptor<U>> {
        self.layout.by_label.get(discriminator).and_then(|&index| U::VARIANTS.get(index))
    }

    /// All variants in declaration order.
    #[must_use]
    pub fn variants(&self) -> &'static [VariantDescriptor<U>] {
        U::VARIANTS
    }

    /// Known labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        U::VARIANTS.iter().map(|variant| variant.discriminator)
    }
}

impl<U> fmt::Debug for ResolvedUnion<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedUnion").field("labels", &self.layout.by_label.len()).finish()
    }
}

#[derive(Debug)]
struct UnionLayout {
    by_label: HashMap<&'static str, usize>,
}

static LAYOUTS: LazyLock<TypeCache> = LazyLock::new(TypeCache::new);

/// Validates a union definition, caching the outcome for the process lifetime.
///
/// A broken definition fails identically on every call.
///
/// # Errors
///
/// - [`DefinitionError::InvalidUnionDefinition`] if the union has no variants
///   or its rule names no fields
/// - [`DefinitionError::MissingVariantConstructor`] if a variant has no lift
/// - [`DefinitionError::DuplicateDiscriminator`] if two variants share a label
/// - [`DefinitionError::DiscriminatorFieldCollision`] if a payload declares
///   the rule's primary field
pub fn resolve<U: TaggedUnion>() -> Result<ResolvedUnion<U>, DefinitionError> {
    let outcome = LAYOUTS.get_or_insert_with::<U, _, _>(build_layout::<U>);
    match &*outcome {
        Ok(layout) => Ok(ResolvedUnion { layout: Arc::clone(layout), _union: PhantomData }),
        Err(err) => Err(err.clone()),
    }
}

fn build_layout<U: TaggedUnion>() -> Result<Arc<UnionLayout>, DefinitionError> {
    if U::VARIANTS.is_empty() {
        return Err(DefinitionError::InvalidUnionDefinition {
            type_name: U::NAME,
            reason: "a union needs at least one variant".to_owned(),
        });
    }
    if U::RULE.fields().is_empty() {
        return Err(DefinitionError::InvalidUnionDefinition {
            type_name: U::NAME,
            reason: "the discriminator rule names no fields".to_owned(),
        });
    }

    let mut by_label = HashMap::with_capacity(U::VARIANTS.len());
    for (index, variant) in U::VARIANTS.iter().enumerate() {
        if variant.lift.is_none() {
            return Err(DefinitionError::MissingVariantConstructor {
                type_name: U::NAME,
                variant: variant.type_name,
            });
        }
        if by_label.insert(variant.discriminator, index).is_some() {
            return Err(DefinitionError::DuplicateDiscriminator {
                type_name: U::NAME,
                discriminator: variant.discriminator.to_owned(),
            });
        }
        if let (Some(primary), Some(wire_fields)) = (U::RULE.primary(), variant.wire_fields)
            && wire_fields().is_some_and(|fields| fields.contains(&primary))
        {
            return Err(DefinitionError::DiscriminatorFieldCollision {
                type_name: U::NAME,
                variant: variant.type_name,
                field: primary,
            });
        }
    }

    Ok(Arc::new(UnionLayout { by_label }))
}

/// Deserializes a wire object as `V` and lifts it into `U`.
#[doc(hidden)]
pub fn lift_variant<U, V>(value: Value) -> Result<U, serde_json::Error>
where
    V: DeserializeOwned,
    U: From<V>,
{
    serde_json::from_value::<V>(value).map(U::from)
}

/// Object fields `T` reads; see [`VariantDescriptor::with_wire_fields`].
#[doc(hidden)]
#[must_use]
pub fn payload_fields<T: DeserializeOwned>() -> Option<&'static [&'static str]> {
    fields::declared_fields::<T>()
}

/// Returns `true` if no two labels are equal. Usable in const context.
#[doc(hidden)]
#[must_use]
pub const fn labels_are_unique(labels: &[&str]) -> bool {
    let mut i = 0;
    while i < labels.len() {
        let mut j = i + 1;
        while j < labels.len() {
            if const_str_eq(labels[i], labels[j]) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn const_str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Declares a tagged union enum and its wire codec.
///
/// ```text
/// tagged_union! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Name by ["primary_field", "fallback_field"] {
///         VariantA(PayloadA) = "label_a",
///         VariantB(PayloadB),              // label defaults to "VariantB"
///     }
/// }
/// ```
///
/// Each payload type must implement `Serialize + DeserializeOwned` and be
/// distinct, since every variant gets a `From<Payload>` impl. Duplicate
/// labels are rejected at compile time.
#[macro_export]
macro_rules! tagged_union {
    (@label $variant:ident) => {
        ::core::stringify!($variant)
    };
    (@label $variant:ident $label:literal) => {
        $label
    };

    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident by [$($field:literal),+ $(,)?] {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($payload:ty) $(= $label:literal)?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($payload),
            )+
        }

        const _: () = ::core::assert!(
            $crate::union::labels_are_unique(&[$($crate::tagged_union!(@label $variant $($label)?)),+]),
            ::core::concat!("duplicate discriminator label in `", ::core::stringify!($name), "`"),
        );

        $(
            impl ::core::convert::From<$payload> for $name {
                fn from(value: $payload) -> Self {
                    Self::$variant(value)
                }
            }
        )+

        impl $crate::union::TaggedUnion for $name {
            const NAME: &'static str = ::core::stringify!($name);
            const RULE: $crate::union::DiscriminatorRule = $crate::union::DiscriminatorRule::new(&[$($field),+]);
            const VARIANTS: &'static [$crate::union::VariantDescriptor<Self>] = &[
                $(
                    $crate::union::VariantDescriptor::new(
                        $crate::tagged_union!(@label $variant $($label)?),
                        ::core::stringify!($payload),
                        $crate::union::lift_variant::<Self, $payload>,
                    )
                    .with_wire_fields($crate::union::payload_fields::<$payload>),
                )+
            ];

            #[allow(unused_assignments)]
            fn index(&self) -> usize {
                let mut index = 0_usize;
                $(
                    if let Self::$variant(_) = self {
                        return index;
                    }
                    index += 1;
                )+
                index
            }

            fn value(&self) -> &dyn ::core::any::Any {
                match self {
                    $(Self::$variant(inner) => inner as &dyn ::core::any::Any,)+
                }
            }

            fn variant_to_value(&self) -> ::core::result::Result<$crate::__private::serde_json::Value, $crate::error::CodecError> {
                match self {
                    $(Self::$variant(inner) => $crate::wire::to_wire_value(inner),)+
                }
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                let value = $crate::union::encode_value(self)
                    .map_err(<S::Error as $crate::__private::serde::ser::Error>::custom)?;
                $crate::__private::serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                $crate::union::deserialize_union(deserializer)
            }
        }
    };
}

/// Writes a union as a wire object. Used by the `Serialize` impls [`tagged_union!`](crate::tagged_union) generates.
///
/// # Errors
///
/// See [`write`].
pub fn encode_value<U: TaggedUnion>(union: &U) -> Result<Value, CodecError> {
    write(union)
}

/// Reads a union from a wire value.
///
/// # Errors
///
/// See [`read`].
pub fn decode_value<U: TaggedUnion>(value: Value) -> Result<U, CodecError> {
    read(value)
}

thread_local! {
    static LAST_FAILURE: RefCell<Option<CodecError>> = const { RefCell::new(None) };
}

/// Reads a union through any serde deserializer. Used by the `Deserialize`
/// impls [`tagged_union!`](crate::tagged_union) generates.
///
/// The object is requested as a struct whose fields are the rule's fields,
/// which lets [`payload_fields`] see a nested union's discriminator. A codec
/// failure is kept on the current thread so the [wire](crate::wire) decoders
/// can hand the typed error back once serde has flattened it to a message.
///
/// # Errors
///
/// Returns the deserializer's error, carrying the [`CodecError`] message.
pub fn deserialize_union<'de, U, D>(deserializer: D) -> Result<U, D::Error>
where
    U: TaggedUnion,
    D: Deserializer<'de>,
{
    let object = deserializer.deserialize_struct(U::NAME, U::RULE.fields(), ObjectVisitor)?;
    read(Value::Object(object)).map_err(|err| {
        let message = err.to_string();
        LAST_FAILURE.with(|slot| *slot.borrow_mut() = Some(err));
        de::Error::custom(message)
    })
}

/// Clears any union failure left on this thread by an earlier decode.
pub(crate) fn reset_failure() {
    LAST_FAILURE.with(|slot| *slot.borrow_mut() = None);
}

/// Maps a serde error back to the typed union failure that caused it, if any.
pub(crate) fn recover_failure(err: serde_json::Error) -> CodecError {
    let stashed = LAST_FAILURE.with(|slot| slot.borrow_mut().take());
    match stashed {
        Some(failure) if err.to_string().starts_with(&failure.to_string()) => failure,
        _ => CodecError::Json(err),
    }
}

struct ObjectVisitor;

impl<'de> Visitor<'de> for ObjectVisitor {
    type Value = Map<String, Value>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut object = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            object.insert(key, value);
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::wire;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Authorized {
        amount_in_minor: u64,
        currency: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Failed {
        failure_reason: String,
        failure_stage: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Pending {}

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum Legacy by ["type", "status"] {
            Authorized(Authorized) = "authorized",
            Failed(Failed) = "failed",
            Pending(Pending),
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Transfer {
        amount_in_minor: u64,
        status: String,
    }

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum LegacyLedger by ["type", "status"] {
            Transfer(Transfer) = "transfer",
            Pending(Pending) = "pending",
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Card {
        last4: String,
    }

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum Method by ["type"] {
            Card(Card) = "card",
        }
    }

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum Checkout by ["kind"] {
            Method(Method) = "method",
        }
    }

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum Shadowed by ["type"] {
            Method(Method) = "method",
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SelfTagged {
        #[serde(rename = "type")]
        kind: String,
    }

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum Retagged by ["type", "status"] {
            Tagged(SelfTagged) = "tagged",
        }
    }

    crate::tagged_union! {
        #[derive(Debug, Clone, PartialEq)]
        enum Freeform by ["type"] {
            Raw(Value) = "raw",
        }
    }

    struct Empty;

    impl TaggedUnion for Empty {
        const NAME: &'static str = "Empty";
        const RULE: DiscriminatorRule = DiscriminatorRule::TYPE;
        const VARIANTS: &'static [VariantDescriptor<Self>] = &[];

        fn index(&self) -> usize {
            0
        }

        fn value(&self) -> &dyn Any {
            self
        }

        fn variant_to_value(&self) -> Result<Value, CodecError> {
            Ok(Value::Null)
        }
    }

    enum Colliding {
        First(Authorized),
        Second(Authorized),
    }

    impl TaggedUnion for Colliding {
        const NAME: &'static str = "Colliding";
        const RULE: DiscriminatorRule = DiscriminatorRule::TYPE;
        const VARIANTS: &'static [VariantDescriptor<Self>] = &[
            VariantDescriptor::new("same", "Authorized", |v| serde_json::from_value(v).map(Colliding::First)),
            VariantDescriptor::new("same", "Authorized", |v| serde_json::from_value(v).map(Colliding::Second)),
        ];

        fn index(&self) -> usize {
            match self {
                Self::First(_) => 0,
                Self::Second(_) => 1,
            }
        }

        fn value(&self) -> &dyn Any {
            match self {
                Self::First(inner) | Self::Second(inner) => inner,
            }
        }

        fn variant_to_value(&self) -> Result<Value, CodecError> {
            wire::to_wire_value(&self.value().downcast_ref::<Authorized>())
        }
    }

    #[derive(Debug)]
    struct Unliftable(Failed);

    impl TaggedUnion for Unliftable {
        const NAME: &'static str = "Unliftable";
        const RULE: DiscriminatorRule = DiscriminatorRule::STATUS;
        const VARIANTS: &'static [VariantDescriptor<Self>] = &[VariantDescriptor::without_lift("failed", "Failed")];

        fn index(&self) -> usize {
            0
        }

        fn value(&self) -> &dyn Any {
            &self.0
        }

        fn variant_to_value(&self) -> Result<Value, CodecError> {
            wire::to_wire_value(&self.0)
        }
    }

    #[test]
    fn test_resolve_default_and_explicit_labels() {
        let resolved = resolve::<Legacy>().unwrap();
        assert_eq!(resolved.labels().collect::<Vec<_>>(), vec!["authorized", "failed", "Pending"]);
        assert_eq!(resolved.lookup("failed").map(|v| v.type_name), Some("Failed"));
        assert!(resolved.lookup("unknown").is_none());
    }

    #[test]
    fn test_resolve_rejects_empty_union() {
        let err = resolve::<Empty>().unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidUnionDefinition { type_name: "Empty", .. }));
    }

    #[test]
    fn test_resolve_rejects_duplicate_labels() {
        let err = resolve::<Colliding>().unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateDiscriminator { type_name: "Colliding", discriminator: "same".to_owned() }
        );
    }

    #[test]
    fn test_resolve_failure_is_cached_and_repeatable() {
        let first = resolve::<Unliftable>().unwrap_err();
        let second = resolve::<Unliftable>().unwrap_err();
        assert_eq!(first, second);
        assert_eq!(
            first,
            DefinitionError::MissingVariantConstructor { type_name: "Unliftable", variant: "Failed" }
        );
    }

    #[test]
    fn test_broken_definition_surfaces_on_decode() {
        let err = wire::decode_union::<Unliftable>(r#"{"status":"failed","failure_reason":"x"}"#).unwrap_err();
        assert!(matches!(err, CodecError::Definition(DefinitionError::MissingVariantConstructor { .. })));
    }

    #[test]
    fn test_labels_are_unique() {
        assert!(labels_are_unique(&["a", "b", "ab"]));
        assert!(!labels_are_unique(&["a", "b", "a"]));
        assert!(labels_are_unique(&[]));
    }

    #[test]
    fn test_index_and_value_report_active_variant() {
        let union = Legacy::from(Failed { failure_reason: "expired".to_owned(), failure_stage: None });
        assert_eq!(union.index(), 1);
        assert_eq!(union.discriminator(), "failed");
        let payload = union.value().downcast_ref::<Failed>().unwrap();
        assert_eq!(payload.failure_reason, "expired");
        assert!(union.value().downcast_ref::<Authorized>().is_none());
    }

    #[test]
    fn test_fallback_field_wins_when_primary_unmapped() {
        let union: Legacy = wire::decode(
            r#"{"type":"legacy_payment","status":"authorized","amount_in_minor":1000,"currency":"GBP"}"#,
        )
        .unwrap();
        assert_eq!(union, Legacy::Authorized(Authorized { amount_in_minor: 1000, currency: "GBP".to_owned() }));
    }

    #[test]
    fn test_primary_field_wins_when_both_mapped() {
        let union: Legacy =
            wire::decode(r#"{"type":"failed","status":"authorized","failure_reason":"x"}"#).unwrap();
        assert_eq!(union.discriminator(), "failed");
    }

    #[test]
    fn test_unknown_discriminator_fails_closed() {
        let err = wire::decode_union::<Legacy>(r#"{"type":"totally_unknown"}"#).unwrap_err();
        match err {
            CodecError::UnknownDiscriminator { type_name, value, raw } => {
                assert_eq!(type_name, "Legacy");
                assert_eq!(value, "totally_unknown");
                assert_eq!(raw, r#"{"type":"totally_unknown"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_discriminator_field() {
        let err = wire::decode_union::<Legacy>(r#"{"amount_in_minor":1}"#).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingDiscriminatorField { type_name: "Legacy", fields: ["type", "status"] }
        ));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = wire::decode_union::<Legacy>("[1, 2]").unwrap_err();
        assert!(matches!(err, CodecError::MalformedInput { type_name: "Legacy", found: "array" }));
    }

    #[test]
    fn test_payload_mismatch_reports_variant() {
        let err = wire::decode_union::<Legacy>(r#"{"type":"authorized","amount_in_minor":"lots"}"#).unwrap_err();
        match err {
            CodecError::VariantTypeMismatch { discriminator, variant, .. } => {
                assert_eq!(discriminator, "authorized");
                assert_eq!(variant, "Authorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_write_injects_label_under_primary_field() {
        let union = Legacy::from(Authorized { amount_in_minor: 1000, currency: "GBP".to_owned() });
        assert_eq!(
            wire::to_wire_value(&union).unwrap(),
            json!({"type": "authorized", "amount_in_minor": 1000, "currency": "GBP"})
        );
    }

    #[test]
    fn test_write_uses_runtime_variant_fields() {
        let unions = vec![
            Legacy::from(Authorized { amount_in_minor: 5, currency: "EUR".to_owned() }),
            Legacy::from(Failed {
                failure_reason: "rejected".to_owned(),
                failure_stage: Some("authorizing".to_owned()),
            }),
        ];
        let encoded = wire::to_wire_value(&unions).unwrap();
        assert_eq!(encoded[1]["failure_stage"], "authorizing");
        assert!(encoded[1].get("amount_in_minor").is_none());
        assert_eq!(encoded[0]["amount_in_minor"], 5);
    }

    #[test]
    fn test_payload_fallback_field_keeps_label_under_primary() {
        let union = LegacyLedger::from(Transfer { amount_in_minor: 1, status: "pending".to_owned() });
        let value = wire::to_wire_value(&union).unwrap();
        assert_eq!(value, json!({"type": "transfer", "amount_in_minor": 1, "status": "pending"}));

        let decoded: LegacyLedger = wire::decode(&wire::encode(&union).unwrap()).unwrap();
        assert_eq!(decoded, union);
    }

    #[test]
    fn test_union_payload_under_distinct_field_round_trips() {
        let union = Checkout::from(Method::from(Card { last4: "4242".to_owned() }));
        let value = wire::to_wire_value(&union).unwrap();
        assert_eq!(value, json!({"kind": "method", "type": "card", "last4": "4242"}));

        let decoded: Checkout = wire::from_wire_value(value).unwrap();
        assert_eq!(decoded, union);
    }

    #[test]
    fn test_union_payload_sharing_primary_field_is_rejected() {
        assert_eq!(
            resolve::<Shadowed>().unwrap_err(),
            DefinitionError::DiscriminatorFieldCollision { type_name: "Shadowed", variant: "Method", field: "type" }
        );

        let union = Shadowed::from(Method::from(Card { last4: "4242".to_owned() }));
        let err = wire::to_wire_value(&union).unwrap_err();
        assert!(err.to_string().contains("discriminator field \"type\""), "{err}");
    }

    #[test]
    fn test_payload_declaring_primary_field_is_rejected() {
        assert_eq!(
            resolve::<Retagged>().unwrap_err(),
            DefinitionError::DiscriminatorFieldCollision {
                type_name: "Retagged",
                variant: "SelfTagged",
                field: "type",
            }
        );
    }

    #[test]
    fn test_freeform_payload_checked_on_write() {
        assert!(resolve::<Freeform>().is_ok());

        let union = Freeform::from(json!({"note": "hello"}));
        assert_eq!(wire::to_wire_value(&union).unwrap(), json!({"type": "raw", "note": "hello"}));

        let clashing = Freeform::from(json!({"type": "other"}));
        let err = encode_value(&clashing).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Definition(DefinitionError::DiscriminatorFieldCollision { variant: "Value", .. })
        ));
    }

    #[test]
    fn test_empty_payload_variant_round_trips() {
        let union = Legacy::from(Pending {});
        let json = wire::encode(&union).unwrap();
        assert_eq!(json, r#"{"type":"Pending"}"#);
        assert_eq!(wire::decode::<Legacy>(&json).unwrap(), union);
    }
}
