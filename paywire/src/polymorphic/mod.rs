//! Polymorphic base types: open hierarchies decoded through a label registry.
//!
//! Where the domain models a hierarchy rather than a closed union (webhook
//! events being the main case) a base type registers `(label, subtype)`
//! pairs together with a lift from each subtype into the base. Decoding
//! inspects the discriminator, deserializes the object as the registered
//! subtype and lifts it. The registry is built once per base type and cached.
//!
//! Writing a base type polymorphically is deliberately unsupported:
//! [`encode`] fails with [`CodecError::NotSupported`]. Serialize the concrete
//! subtype instead.
//!
//! # Examples
//!
//! ```
//! use paywire::polymorphic::{self, PolymorphicBase, RegistryBuilder};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Ping { id: String }
//!
//! #[derive(Debug)]
//! enum Message { Ping(Ping) }
//!
//! impl PolymorphicBase for Message {
//!     const NAME: &'static str = "Message";
//!
//!     fn register_subtypes(registry: &mut RegistryBuilder<Self>) {
//!         registry.subtype::<Ping, _>("ping", Message::Ping);
//!     }
//! }
//!
//! let message: Message = polymorphic::decode_str(r#"{"type":"ping","id":"p-1"}"#).unwrap();
//! assert!(matches!(message, Message::Ping(Ping { ref id }) if id == "p-1"));
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::{
    cache::TypeCache,
    error::{CodecError, DefinitionError},
    union::{DiscriminatorRule, json_kind, probe_discriminator},
};

type Factory<B> = Arc<dyn Fn(Value) -> Result<B, CodecError> + Send + Sync>;

/// An abstract type decoded by dispatching on a discriminator label.
pub trait PolymorphicBase: Sized + 'static {
    /// Base type name, for diagnostics.
    const NAME: &'static str;

    /// Fields carrying the label. Defaults to `"type"`.
    const DISCRIMINATOR: DiscriminatorRule = DiscriminatorRule::TYPE;

    /// Registers every known subtype.
    fn register_subtypes(registry: &mut RegistryBuilder<Self>);
}

struct Entry<B> {
    label: &'static str,
    type_name: &'static str,
    factory: Factory<B>,
}

/// Collects subtype registrations for one base type.
pub struct RegistryBuilder<B> {
    entries: Vec<Entry<B>>,
}

impl<B: PolymorphicBase> RegistryBuilder<B> {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registers subtype `C` under `label`, lifted into the base by `lift`.
    pub fn subtype<C, F>(&mut self, label: &'static str, lift: F) -> &mut Self
    where
        C: DeserializeOwned + 'static,
        F: Fn(C) -> B + Send + Sync + 'static,
    {
        let type_name = short_type_name::<C>();
        let factory: Factory<B> = Arc::new(move |value| {
            let concrete = deserialize_subtype::<C>(label, type_name, value)?;
            Ok(lift(concrete))
        });
        self.entries.push(Entry { label, type_name, factory });
        self
    }

    /// Registers subtype `C` under `label` with a lift that may reject the value.
    ///
    /// A rejection surfaces as [`CodecError::FactoryInvocationError`].
    pub fn fallible_subtype<C, E, F>(&mut self, label: &'static str, lift: F) -> &mut Self
    where
        C: DeserializeOwned + 'static,
        E: fmt::Display,
        F: Fn(C) -> Result<B, E> + Send + Sync + 'static,
    {
        let type_name = short_type_name::<C>();
        let factory: Factory<B> = Arc::new(move |value| {
            let concrete = deserialize_subtype::<C>(label, type_name, value)?;
            lift(concrete).map_err(|err| CodecError::FactoryInvocationError {
                type_name: B::NAME,
                discriminator: label.to_owned(),
                message: err.to_string(),
            })
        });
        self.entries.push(Entry { label, type_name, factory });
        self
    }

    fn build(self) -> Result<PolymorphicRegistry<B>, DefinitionError> {
        if self.entries.is_empty() {
            return Err(DefinitionError::InvalidUnionDefinition {
                type_name: B::NAME,
                reason: "no subtypes are registered".to_owned(),
            });
        }
        if B::DISCRIMINATOR.fields().is_empty() {
            return Err(DefinitionError::InvalidUnionDefinition {
                type_name: B::NAME,
                reason: "the discriminator rule names no fields".to_owned(),
            });
        }

        let mut by_label = HashMap::with_capacity(self.entries.len());
        let mut labels = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            labels.push(entry.label);
            if let Some(previous) = by_label.insert(entry.label, entry) {
                return Err(DefinitionError::DuplicateDiscriminator {
                    type_name: B::NAME,
                    discriminator: previous.label.to_owned(),
                });
            }
        }

        Ok(PolymorphicRegistry { by_label, labels })
    }
}

impl<B> fmt::Debug for RegistryBuilder<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder").field("entries", &self.entries.len()).finish()
    }
}

/// Validated label-to-subtype table for one base type.
pub struct PolymorphicRegistry<B> {
    by_label: HashMap<&'static str, Entry<B>>,
    labels: Vec<&'static str>,
}

impl<B> PolymorphicRegistry<B> {
    /// Registered labels in registration order.
    #[must_use]
    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    /// Name of the subtype registered under `label`.
    #[must_use]
    pub fn subtype_name(&self, label: &str) -> Option<&'static str> {
        self.by_label.get(label).map(|entry| entry.type_name)
    }
}

impl<B> fmt::Debug for PolymorphicRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicRegistry").field("labels", &self.labels).finish()
    }
}

static REGISTRIES: LazyLock<TypeCache> = LazyLock::new(TypeCache::new);

/// Returns the cached registry for `B`, building it on first use.
///
/// # Errors
///
/// - [`DefinitionError::InvalidUnionDefinition`] if no subtype is registered
/// - [`DefinitionError::DuplicateDiscriminator`] if a label is registered twice
pub fn registry<B: PolymorphicBase>() -> Result<Arc<PolymorphicRegistry<B>>, DefinitionError> {
    let outcome = REGISTRIES.get_or_insert_with::<B, _, _>(|| {
        let mut builder = RegistryBuilder::new();
        B::register_subtypes(&mut builder);
        builder.build().map(Arc::new)
    });
    (*outcome).clone()
}

/// Decodes a wire value as the registered subtype of `B`.
///
/// # Errors
///
/// - [`CodecError::Definition`] if the registry is invalid
/// - [`CodecError::MalformedInput`] if `value` is not an object
/// - [`CodecError::MissingDiscriminatorField`] / [`CodecError::UnknownDiscriminator`]
/// - [`CodecError::VariantTypeMismatch`] if the object does not fit the subtype
/// - [`CodecError::FactoryInvocationError`] if a fallible lift rejects it
pub fn decode<B: PolymorphicBase>(value: Value) -> Result<B, CodecError> {
    let registry = registry::<B>()?;

    let Value::Object(object) = &value else {
        return Err(CodecError::MalformedInput { type_name: B::NAME, found: json_kind(&value) });
    };
    let entry = probe_discriminator(B::NAME, B::DISCRIMINATOR.fields(), object, |label| {
        registry.by_label.get(label)
    })?;
    trace!(base = B::NAME, discriminator = entry.label, subtype = entry.type_name, "resolved subtype");

    (entry.factory)(value)
}

/// Parses JSON text and decodes it as the registered subtype of `B`.
///
/// # Errors
///
/// [`CodecError::Json`] on invalid JSON, otherwise see [`decode`].
pub fn decode_str<B: PolymorphicBase>(json: &str) -> Result<B, CodecError> {
    decode(serde_json::from_str(json)?)
}

/// Always fails: polymorphic bases are written through their concrete subtype.
///
/// # Errors
///
/// Always returns [`CodecError::NotSupported`].
pub fn encode<B: PolymorphicBase>(_value: &B) -> Result<Value, CodecError> {
    Err(CodecError::NotSupported(format!(
        "writing polymorphic base `{}`; serialize the concrete subtype instead",
        B::NAME
    )))
}

fn deserialize_subtype<C: DeserializeOwned>(
    label: &'static str,
    type_name: &'static str,
    value: Value,
) -> Result<C, CodecError> {
    serde_json::from_value(value).map_err(|err| CodecError::VariantTypeMismatch {
        discriminator: label.to_owned(),
        variant: type_name,
        message: err.to_string(),
    })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Created {
        id: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Deleted {
        id: String,
        version: u32,
    }

    #[derive(Debug, PartialEq)]
    enum Notification {
        Created(Created),
        Deleted(Deleted),
    }

    impl PolymorphicBase for Notification {
        const NAME: &'static str = "Notification";
        const DISCRIMINATOR: DiscriminatorRule = DiscriminatorRule::new(&["kind"]);

        fn register_subtypes(registry: &mut RegistryBuilder<Self>) {
            registry.subtype::<Created, _>("created", Notification::Created).fallible_subtype::<Deleted, _, _>(
                "deleted",
                |deleted| {
                    if deleted.version == 1 {
                        Ok(Notification::Deleted(deleted))
                    } else {
                        Err(format!("unsupported version {}", deleted.version))
                    }
                },
            );
        }
    }

    #[derive(Debug)]
    struct Nothing;

    impl PolymorphicBase for Nothing {
        const NAME: &'static str = "Nothing";

        fn register_subtypes(_registry: &mut RegistryBuilder<Self>) {}
    }

    #[derive(Debug)]
    struct Twice;

    impl PolymorphicBase for Twice {
        const NAME: &'static str = "Twice";

        fn register_subtypes(registry: &mut RegistryBuilder<Self>) {
            registry.subtype::<Created, _>("same", |_| Twice).subtype::<Deleted, _>("same", |_| Twice);
        }
    }

    #[test]
    fn test_decode_dispatches_on_custom_field() {
        let decoded: Notification = decode(json!({"kind": "created", "id": "n-1"})).unwrap();
        assert_eq!(decoded, Notification::Created(Created { id: "n-1".to_owned() }));
    }

    #[test]
    fn test_decode_ignores_default_type_field_when_overridden() {
        let err = decode::<Notification>(json!({"type": "created", "id": "n-1"})).unwrap_err();
        assert!(matches!(err, CodecError::MissingDiscriminatorField { fields: ["kind"], .. }));
    }

    #[test]
    fn test_unknown_label() {
        let err = decode::<Notification>(json!({"kind": "archived"})).unwrap_err();
        assert!(matches!(err, CodecError::UnknownDiscriminator { type_name: "Notification", .. }));
    }

    #[test]
    fn test_fallible_lift_failure_is_factory_error() {
        let err = decode::<Notification>(json!({"kind": "deleted", "id": "n-1", "version": 2})).unwrap_err();
        match err {
            CodecError::FactoryInvocationError { type_name, discriminator, message } => {
                assert_eq!(type_name, "Notification");
                assert_eq!(discriminator, "deleted");
                assert_eq!(message, "unsupported version 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_subtype_shape_mismatch() {
        let err = decode::<Notification>(json!({"kind": "deleted", "id": "n-1"})).unwrap_err();
        assert!(matches!(err, CodecError::VariantTypeMismatch { variant: "Deleted", .. }));
    }

    #[test]
    fn test_empty_registry_is_invalid() {
        let err = decode_str::<Nothing>(r#"{"type":"x"}"#).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Definition(DefinitionError::InvalidUnionDefinition { type_name: "Nothing", .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected_consistently() {
        let first = registry::<Twice>().unwrap_err();
        let second = registry::<Twice>().unwrap_err();
        assert_eq!(first, second);
        assert!(matches!(
            first,
            DefinitionError::DuplicateDiscriminator { ref discriminator, .. } if discriminator == "same"
        ));
    }

    #[test]
    fn test_registry_is_cached() {
        let first = registry::<Notification>().unwrap();
        let second = registry::<Notification>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.labels(), ["created", "deleted"]);
        assert_eq!(first.subtype_name("deleted"), Some("Deleted"));
    }

    #[test]
    fn test_encode_not_supported() {
        let value = Notification::Created(Created { id: "n-1".to_owned() });
        assert!(matches!(encode(&value), Err(CodecError::NotSupported(_))));
    }
}
