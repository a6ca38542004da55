//! Static binder registry (`spec.md` §9 "Cyclic factory registry" redesign
//! flag).
//!
//! The source registered binders via an implicit module-initialiser that ran
//! at import time, cyclically depending on the modules it was registering.
//! This replaces that with explicit `register_binder::<T>(name, build)` calls
//! into a read-mostly concurrent map, so registration order is caller-chosen
//! and there is no initialisation cycle. Grounded on the pack's
//! lazily-initialised global dispatch tables (`tds-protocol`'s token lookup).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::binder::RecordDescriptor;

type Entry = Box<dyn Any + Send + Sync>;

static BINDERS: Lazy<RwLock<HashMap<(&'static str, TypeId), Entry>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a [`RecordDescriptor`] builder for `T` under `name`. Later
/// registrations for the same `(name, T)` pair replace earlier ones.
pub fn register_binder<T: 'static>(name: &'static str, build: impl Fn() -> RecordDescriptor<T> + Send + Sync + 'static) {
    let key = (name, TypeId::of::<T>());
    let boxed: Box<dyn Fn() -> RecordDescriptor<T> + Send + Sync> = Box::new(build);
    BINDERS.write().unwrap_or_else(|e| e.into_inner()).insert(key, Box::new(boxed));
}

/// Build a fresh [`RecordDescriptor`] from the binder registered for
/// `(name, T)`, or `None` if nothing is registered there.
pub fn resolve_binder<T: 'static>(name: &'static str) -> Option<RecordDescriptor<T>> {
    let key = (name, TypeId::of::<T>());
    let binders = BINDERS.read().unwrap_or_else(|e| e.into_inner());
    let entry = binders.get(&key)?;
    let build = entry
        .downcast_ref::<Box<dyn Fn() -> RecordDescriptor<T> + Send + Sync>>()
        .unwrap_or_else(|| unreachable!("TypeId collision in binder registry"));
    Some(build())
}
