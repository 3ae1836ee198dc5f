//! Process-wide descriptor memoization

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{DescriptorBuilder, Resource, TypeDescriptor};
use crate::error::ShapeError;
use crate::options::{CodecOptions, NamingPolicy};

type CachedDescriptor = Result<Arc<dyn Any + Send + Sync>, ShapeError>;

static DESCRIPTORS: OnceLock<RwLock<HashMap<(TypeId, NamingPolicy), CachedDescriptor>>> =
    OnceLock::new();

fn registry() -> &'static RwLock<HashMap<(TypeId, NamingPolicy), CachedDescriptor>> {
    DESCRIPTORS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The descriptor for `T` under `policy`, built on first use.
///
/// A shape error is cached like a descriptor and returned for every later use
/// of the type. Concurrent first uses may each build a descriptor; the first
/// one stored wins.
pub fn descriptor<T: Resource>(policy: NamingPolicy) -> Result<Arc<TypeDescriptor<T>>, ShapeError> {
    let key = (TypeId::of::<T>(), policy);

    if let Some(cached) = registry().read().get(&key) {
        return downcast::<T>(cached.clone());
    }

    let mut builder = DescriptorBuilder::<T>::new();
    T::describe(&mut builder);
    let built: CachedDescriptor = match builder.build(policy) {
        Ok(descriptor) => {
            debug!(
                rust_type = descriptor.rust_type(),
                resource_type = ?descriptor.fixed_resource_type(),
                members = descriptor.members().len(),
                ?policy,
                "Built type descriptor"
            );
            Ok(Arc::new(descriptor) as Arc<dyn Any + Send + Sync>)
        }
        Err(err) => {
            debug!(error = %err, "Type descriptor rejected");
            Err(err)
        }
    };

    let stored = {
        let mut registry = registry().write();
        if registry.contains_key(&key) {
            trace!(
                rust_type = std::any::type_name::<T>(),
                "Descriptor raced with another thread, keeping the first"
            );
        }
        registry.entry(key).or_insert(built).clone()
    };
    downcast::<T>(stored)
}

/// The descriptor for `T` under the naming policy in `options`
pub fn descriptor_for_options<T: Resource>(
    options: &CodecOptions,
) -> Result<Arc<TypeDescriptor<T>>, ShapeError> {
    descriptor::<T>(options.naming_policy)
}

fn downcast<T: Resource>(cached: CachedDescriptor) -> Result<Arc<TypeDescriptor<T>>, ShapeError> {
    let any = cached?;
    match any.downcast::<TypeDescriptor<T>>() {
        Ok(descriptor) => Ok(descriptor),
        // The key includes T's TypeId, so the entry always holds a TypeDescriptor<T>
        Err(_) => unreachable!("descriptor cache entry does not match its TypeId"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeError;

    #[derive(Default)]
    struct Widget {
        id: String,
        display_name: String,
    }

    impl Resource for Widget {
        fn describe(builder: &mut DescriptorBuilder<Self>) {
            builder
                .resource_type("widgets")
                .constructor(Widget::default)
                .id(|w| Some(w.id.as_str()), |w, id| w.id = id);
            builder.attribute("display_name", |w| &w.display_name, |w, v| w.display_name = v);
        }
    }

    struct Faulty;

    impl Resource for Faulty {
        fn describe(builder: &mut DescriptorBuilder<Self>) {
            builder.resource_type("faulty");
        }
    }

    #[test]
    fn test_descriptor_is_memoized_per_policy() {
        let first = descriptor::<Widget>(NamingPolicy::CamelCase).unwrap();
        let second = descriptor::<Widget>(NamingPolicy::CamelCase).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.members()[0].wire_name(), "displayName");

        let kebab = descriptor::<Widget>(NamingPolicy::KebabCase).unwrap();
        assert!(!Arc::ptr_eq(&first, &kebab));
        assert_eq!(kebab.members()[0].wire_name(), "display-name");
    }

    #[test]
    fn test_shape_error_reported_on_every_use() {
        for _ in 0..3 {
            assert!(matches!(
                descriptor::<Faulty>(NamingPolicy::None),
                Err(ShapeError::MissingConstructor { .. })
            ));
        }
    }

    #[test]
    fn test_concurrent_first_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| descriptor::<Widget>(NamingPolicy::SnakeCase).unwrap()))
            .collect();
        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for descriptor in &descriptors[1..] {
            assert!(Arc::ptr_eq(&descriptors[0], descriptor));
        }
    }
}
