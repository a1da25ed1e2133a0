use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};

/// Type-safe storage for module APIs and shared engine handles.
///
/// Values are stored as `Arc<dyn Any + Send + Sync>` keyed by `TypeId` of T.
/// Trait objects go in through their ref alias, e.g. a module publishing
/// `Arc<dyn BrowserApi>` inserts `Arc::new(api_ref)` under `BrowserApiRef`.
#[derive(Default)]
pub struct Resources {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Resources {
    #[inline]
    pub fn insert<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.map.insert(TypeId::of::<T>(), value);
    }

    #[inline]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|v| v.clone().downcast::<T>().ok())
    }

    /// Like `get`, but a missing entry is an engine error naming the type.
    pub fn require<T: Any + Send + Sync>(&self) -> EngineResult<Arc<T>> {
        self.get::<T>().ok_or_else(|| {
            EngineError::Other(format!(
                "resource not registered: {}",
                std::any::type_name::<T>()
            ))
        })
    }

    #[inline]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    #[inline]
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<Arc<T>> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
