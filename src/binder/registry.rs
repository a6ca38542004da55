//! Custom converter registry (`spec.md` §4.6 "Custom converters").
//!
//! Keyed by target type, checked before falling back to the built-in
//! [`super::FromField`] impls. Registration is copy-on-write: adding a
//! converter returns a new registry rather than mutating a shared one,
//! mirroring the immutable-options-record shape used elsewhere in this
//! crate.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;

type BoxedConverter<V> = Box<dyn Fn(&[u8]) -> Result<V> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        ConverterRegistry { converters: HashMap::new() }
    }

    /// Register a converter for `V`, returning a new registry. A converter
    /// already registered for `V` is replaced.
    pub fn with_converter<V>(&self, f: impl Fn(&[u8]) -> Result<V> + Send + Sync + 'static) -> Self
    where
        V: 'static,
    {
        let mut converters = self.converters.clone();
        let boxed: BoxedConverter<V> = Box::new(f);
        converters.insert(TypeId::of::<V>(), Arc::new(boxed));
        ConverterRegistry { converters }
    }

    pub fn convert<V: 'static>(&self, bytes: &[u8]) -> Option<Result<V>> {
        let erased = self.converters.get(&TypeId::of::<V>())?;
        let f = erased
            .downcast_ref::<BoxedConverter<V>>()
            .unwrap_or_else(|| unreachable!("TypeId collision in converter registry"));
        Some(f(bytes))
    }
}

/// Resolve a field value, preferring a registered custom converter and
/// falling back to the built-in [`super::FromField`] impl. A custom
/// converter shadows the format string entirely — it takes only the raw
/// bytes, same as [`ConverterRegistry::with_converter`] always has.
pub fn resolve_field<V>(registry: &ConverterRegistry, bytes: &[u8]) -> Result<V>
where
    V: super::FromField + 'static,
{
    resolve_field_with_format(registry, bytes, None)
}

/// Like [`resolve_field`], but passes `format` through to
/// [`super::FromField::from_field_with_format`] when no custom converter is
/// registered for `V` (`spec.md` §4.6 "optional format string").
pub fn resolve_field_with_format<V>(registry: &ConverterRegistry, bytes: &[u8], format: Option<&str>) -> Result<V>
where
    V: super::FromField + 'static,
{
    match registry.convert::<V>(bytes) {
        Some(result) => result,
        None => V::from_field_with_format(bytes, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_converter_shadows_builtin() {
        let registry = ConverterRegistry::new().with_converter::<i32>(|_bytes| Ok(-1));
        let value: i32 = resolve_field(&registry, b"42").unwrap();
        assert_eq!(value, -1);
    }

    #[test]
    fn falls_back_to_builtin_when_unregistered() {
        let registry = ConverterRegistry::new();
        let value: i32 = resolve_field(&registry, b"42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn with_converter_does_not_mutate_original() {
        let base = ConverterRegistry::new();
        let extended = base.with_converter::<i32>(|_| Ok(7));
        assert!(base.convert::<i32>(b"1").is_none());
        assert_eq!(extended.convert::<i32>(b"1").unwrap().unwrap(), 7);
    }
}
