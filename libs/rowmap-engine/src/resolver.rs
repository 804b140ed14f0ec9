use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rowmap_api::descriptor::{MapTarget, TypeDescriptor};

use crate::error::MappingError;

/// Resolve the descriptor of `T`.
///
/// Fails with `UnresolvableType` when `T` declares no constructors and is not
/// a scalar type. Constructors keep their declaration order.
pub fn resolve<T: MapTarget>() -> Result<TypeDescriptor<T>, MappingError> {
    let descriptor = T::descriptor();
    if descriptor.constructors().is_empty() && descriptor.scalar_param().is_none() {
        return Err(MappingError::UnresolvableType {
            type_name: descriptor.type_name().to_string(),
        });
    }
    tracing::debug!(
        target_type = %descriptor.type_name(),
        constructors = descriptor.constructors().len(),
        scalar = descriptor.scalar_param().is_some(),
        "resolved type descriptor"
    );
    Ok(descriptor)
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Resolved descriptors keyed by target type.
///
/// Reads are concurrent. The first resolution of a type inserts once; a
/// thread that loses the insert race drops its own descriptor and returns
/// the stored one, so every caller sees the same instance.
#[derive(Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl std::fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("len", &self.len())
            .finish()
    }
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve<T: MapTarget>(&self) -> Result<Arc<TypeDescriptor<T>>, MappingError> {
        let key = TypeId::of::<T>();

        let cached = self.read().get(&key).cloned();
        if let Some(Ok(descriptor)) = cached.map(|e| e.downcast::<TypeDescriptor<T>>()) {
            return Ok(descriptor);
        }

        let resolved = Arc::new(resolve::<T>()?);
        let stored = self
            .write()
            .entry(key)
            .or_insert_with(|| resolved.clone() as Entry)
            .clone();
        Ok(stored.downcast::<TypeDescriptor<T>>().unwrap_or(resolved))
    }

    pub fn contains<T: MapTarget>(&self) -> bool {
        self.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Entry>> {
        match self.entries.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("descriptor cache read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Entry>> {
        match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("descriptor cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rowmap_api::descriptor::{FromValue, TypeDescriptor};

    use super::*;

    struct Opaque;

    impl MapTarget for Opaque {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::builder("Opaque").build()
        }
    }

    static COUNTED_RESOLUTIONS: AtomicUsize = AtomicUsize::new(0);

    struct Counted(i32);

    impl MapTarget for Counted {
        fn descriptor() -> TypeDescriptor<Self> {
            COUNTED_RESOLUTIONS.fetch_add(1, Ordering::SeqCst);
            TypeDescriptor::builder("Counted")
                .constructor("new", vec![i32::PARAM], |args| Ok(Counted(args.take()?)))
                .build()
        }
    }

    #[test]
    fn type_without_constructors_is_unresolvable() {
        let err = resolve::<Opaque>().unwrap_err();
        assert!(matches!(err, MappingError::UnresolvableType { ref type_name } if type_name == "Opaque"));
    }

    #[test]
    fn scalar_type_resolves_without_constructors() {
        let d = resolve::<i64>().unwrap();
        assert!(d.constructors().is_empty());
        assert!(d.scalar_param().is_some());
    }

    #[test]
    fn cache_resolves_once_and_shares_instance() {
        let cache = DescriptorCache::new();
        let a = cache.get_or_resolve::<Counted>().unwrap();
        let b = cache.get_or_resolve::<Counted>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(COUNTED_RESOLUTIONS.load(Ordering::SeqCst), 1);
        assert!(cache.contains::<Counted>());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_does_not_store_failures() {
        let cache = DescriptorCache::new();
        assert!(cache.get_or_resolve::<Opaque>().is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_first_resolution_yields_one_visible_value() {
        let cache = Arc::new(DescriptorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get_or_resolve::<String>().unwrap())
            })
            .collect();
        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for d in &descriptors[1..] {
            assert!(Arc::ptr_eq(&descriptors[0], d));
        }
        assert_eq!(cache.len(), 1);
    }
}
