//! # IDs
//! Layers, uploads, and other editor resources need identities that are never reused, even after
//! the resource they named is deleted. This is implemented via the `DarkroomID<T>` type, which
//! hands out process-unique IDs namespaced by the type T.
//!
//! To get a fresh ID, use `DarkroomID<YourNamespaceTy>`'s `Default` impl.

// Next available ID by namespace.
// Only written when a namespace is seen for the first time.
static ID_SERVER: parking_lot::RwLock<
    std::collections::BTreeMap<std::any::TypeId, std::sync::atomic::AtomicU64>,
> = parking_lot::const_rwlock(std::collections::BTreeMap::new());

/// ID that is guaranteed unique within this execution of the program, and never handed out twice.
/// IDs with different namespaces may share a value but should not be considered equal.
pub struct DarkroomID<T: std::any::Any> {
    id: std::num::NonZeroU64,
    // Namespace marker
    _phantom: std::marker::PhantomData<fn() -> T>,
}
impl<T: std::any::Any> Clone for DarkroomID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for DarkroomID<T> {}
impl<T: std::any::Any> PartialEq for DarkroomID<T> {
    fn eq(&self, other: &Self) -> bool {
        // Namespace already checked at compile time.
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for DarkroomID<T> {}
impl<T: std::any::Any> PartialOrd for DarkroomID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T: std::any::Any> Ord for DarkroomID<T> {
    /// Order of IDs is allocation order, which is *not* z-order. Don't use it for painting!
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T: std::any::Any> std::hash::Hash for DarkroomID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> DarkroomID<T> {
    /// Get the raw numeric value of this ID.
    /// IDs from differing namespaces may share the same numeric ID!
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
    /// Allocate a new ID in this namespace.
    ///
    /// # Panics
    /// If all `u64::MAX - 1` IDs of this namespace are exhausted. At one ID per nanosecond
    /// that takes five centuries.
    #[must_use]
    pub fn allocate() -> Self {
        let ty = std::any::TypeId::of::<T>();
        let raw = {
            let read = ID_SERVER.upgradable_read();
            if let Some(next) = read.get(&ty) {
                next.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            } else {
                // First ID of this namespace. Exclusive access needed to insert.
                let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                // Another writer may have raced us between the read and the upgrade.
                write
                    .entry(ty)
                    .or_insert_with(|| 1.into())
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            }
        };
        let Some(id) = std::num::NonZeroU64::new(raw) else {
            // Wrapped around to zero. Uniqueness can no longer be upheld.
            panic!("{} ID overflow!", std::any::type_name::<T>());
        };
        Self {
            id,
            _phantom: std::marker::PhantomData,
        }
    }
}
impl<T: std::any::Any> Default for DarkroomID<T> {
    fn default() -> Self {
        Self::allocate()
    }
}
impl<T: std::any::Any> std::fmt::Display for DarkroomID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one element, even for empty strings.
        let name = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or_default();
        write!(f, "{name}#{}", self.id)
    }
}
impl<T: std::any::Any> std::fmt::Debug for DarkroomID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}
