use core::alloc::Layout;

/// The error returned by [`HashTable::try_with_capacity`] when the bucket
/// array cannot be acquired.
///
/// [`HashTable::try_with_capacity`]: crate::HashTable::try_with_capacity
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    /// The bucket count or the bucket array's byte size does not fit in the
    /// address space.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused a bucket array of the given layout.
    #[error("memory allocation failed for {layout:?}")]
    AllocError {
        /// Layout of the bucket array that could not be allocated.
        layout: Layout,
    },
}
