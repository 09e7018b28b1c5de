//! A fixed-size, separately-chained table of `u64` keys to `u64` values.
//!
//! The bucket array is sized once at construction and never grows: every
//! bucket holds the head of a singly-linked chain of boxed entries whose keys
//! mix (see [`hash_key`]) to that bucket's index. New keys are appended at the
//! tail of their chain, so chain order is insertion order.

use alloc::alloc::handle_alloc_error;
use alloc::boxed::Box;
use core::alloc::Layout;
use core::fmt::Debug;
use core::ptr::NonNull;

use crate::error::CapacityError;
use crate::mix::hash_key;

/// Owning link to the next entry of a chain. A bucket head is a `Link` too.
///
/// `Option<Box<_>>` is guaranteed to be pointer sized with `None` represented
/// by all-zero bits, which is what lets a zeroed allocation stand in for an
/// array of empty buckets.
type Link = Option<Box<Entry>>;

/// Number of buckets for a requested capacity: `1 << bitlength(capacity)`.
///
/// This is always strictly greater than `capacity`, so a power of two is
/// doubled (64 -> 128) rather than kept as is. Returns `None` when the result
/// does not fit in a `usize`.
#[inline]
fn bucket_count_for(capacity: usize) -> Option<usize> {
    1usize.checked_shl(usize::BITS - capacity.leading_zeros())
}

/// A single key/value pair stored in a bucket chain.
///
/// Entries are only ever handed out by reference through
/// [`HashTable::lookup`] and [`HashTable::lookup_mut`]; the table owns them
/// for their whole life.
pub struct Entry {
    key: u64,
    value: u64,
    next: Link,
}

impl Entry {
    #[inline]
    fn new(key: u64, value: u64) -> Self {
        Self {
            key,
            value,
            next: None,
        }
    }

    /// The key of this entry.
    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// The value currently stored for this entry's key.
    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// A mutable reference to the stored value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.insert(7, 1);
    ///
    /// if let Some(entry) = table.lookup_mut(7) {
    ///     *entry.value_mut() += 41;
    /// }
    /// assert_eq!(table.get(7), Some(42));
    /// ```
    #[inline]
    pub fn value_mut(&mut self) -> &mut u64 {
        &mut self.value
    }

    /// Overwrites the stored value, returning the previous one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.insert(3, 30);
    ///
    /// let old = table.lookup_mut(3).map(|entry| entry.set_value(31));
    /// assert_eq!(old, Some(30));
    /// assert_eq!(table.get(3), Some(31));
    /// ```
    #[inline]
    pub fn set_value(&mut self, value: u64) -> u64 {
        core::mem::replace(&mut self.value, value)
    }
}

impl Debug for Entry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

/// Chain-length histogram of a table.
///
/// Index `n` holds the number of buckets whose chain has exactly `n`
/// entries; index 0 therefore counts empty buckets.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    /// Bucket counts indexed by chain length.
    pub buckets_by_length: alloc::vec::Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ChainHistogram {
    /// Length of the longest chain in the table.
    pub fn longest_chain(&self) -> usize {
        self.buckets_by_length.len().saturating_sub(1)
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.buckets_by_length.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!("chain histogram ({} buckets):", self.buckets_by_length.iter().sum::<usize>());
        for (length, &count) in self.buckets_by_length.iter().enumerate() {
            let units = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", length, "█".repeat(units), count);
        }
    }
}

/// Debug statistics for hash table analysis.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of buckets in the bucket array
    pub bucket_count: usize,
    /// Number of buckets with a non-empty chain
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / bucket_count)
    pub load_factor: f64,
    /// Bytes held by the bucket array
    pub bucket_bytes: usize,
    /// Bytes held by chain entries
    pub entry_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {} entries in {} buckets ({:.2} load factor)",
            self.populated, self.bucket_count, self.load_factor
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% occupied)",
            self.occupied_buckets,
            self.bucket_count,
            if self.bucket_count == 0 {
                0.0
            } else {
                (self.occupied_buckets as f64 / self.bucket_count as f64) * 100.0
            }
        );
        println!("Longest Chain: {} entries", self.longest_chain);
        println!(
            "Memory: {} bytes buckets, {} bytes entries",
            self.bucket_bytes, self.entry_bytes
        );
    }
}

/// A fixed-size hash table from `u64` keys to `u64` values using separate
/// chaining.
///
/// The number of buckets is fixed at construction to `1 << bitlength(n)` for
/// a requested capacity `n`, and is never changed afterwards: there is no
/// resizing or rehashing, so the load factor grows without bound as keys are
/// added. Keys are distributed with the fixed MurmurHash64A mix in
/// [`hash_key`].
///
/// Dropping the table releases every remaining entry and the bucket array.
///
/// ## Example
///
/// ```rust
/// # use chain_hash::HashTable;
/// #
/// let mut table = HashTable::with_capacity(100);
/// assert_eq!(table.bucket_count(), 128);
///
/// assert!(table.insert(1, 10));
/// assert!(!table.insert(1, 11));
/// assert_eq!(table.lookup(1).map(|e| e.value()), Some(11));
///
/// assert!(table.erase(1));
/// assert!(!table.erase(1));
/// assert!(table.lookup(1).is_none());
/// ```
pub struct HashTable {
    buckets: NonNull<Link>,
    layout: Layout,
    mask: usize,
    populated: usize,
}

// SAFETY: The table exclusively owns its bucket array and every entry
// reachable from it; entries are plain data with no interior mutability.
unsafe impl Send for HashTable {}
// SAFETY: Shared access only ever reads through the bucket array.
unsafe impl Sync for HashTable {}

impl Debug for HashTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Chain<'a>(&'a Link);

        impl Debug for Chain<'_> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_map()
                    .entries(chain(self.0).map(|e| (e.key, e.value)))
                    .finish()
            }
        }

        struct Buckets<'a>(&'a [Link]);

        impl Debug for Buckets<'_> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_map()
                    .entries(
                        self.0
                            .iter()
                            .enumerate()
                            .filter(|(_, head)| head.is_some())
                            .map(|(index, head)| (index, Chain(head))),
                    )
                    .finish()
            }
        }

        f.debug_struct("HashTable")
            .field("bucket_count", &self.bucket_count())
            .field("populated", &self.populated)
            .field("buckets", &Buckets(self.buckets()))
            .finish()
    }
}

impl Clone for HashTable {
    fn clone(&self) -> Self {
        let mut new_table = match Self::with_bucket_count(self.bucket_count()) {
            Ok(table) => table,
            Err(_) => handle_alloc_error(self.layout),
        };

        for (src, dst) in self.buckets().iter().zip(new_table.buckets_mut()) {
            let mut tail = dst;
            for entry in chain(src) {
                tail = &mut tail.insert(Box::new(Entry::new(entry.key, entry.value))).next;
            }
        }
        new_table.populated = self.populated;

        new_table
    }
}

impl Drop for HashTable {
    fn drop(&mut self) {
        let released = self.release_chains();
        log::trace!(
            "releasing hash table: {} entries, {} buckets",
            released,
            self.bucket_count()
        );

        // SAFETY: `buckets` was allocated in `with_bucket_count` with exactly
        // `self.layout`, and every chain has just been released, so the array
        // holds only `None`s which need no drop.
        unsafe {
            alloc::alloc::dealloc(self.buckets.as_ptr().cast(), self.layout);
        }
    }
}

/// Walks a chain head to tail.
#[inline]
fn chain(head: &Link) -> impl Iterator<Item = &Entry> {
    core::iter::successors(head.as_deref(), |entry| entry.next.as_deref())
}

impl HashTable {
    /// Creates a new hash table sized for `capacity` keys.
    ///
    /// The bucket count is `1 << bitlength(capacity)`: the smallest power of
    /// two strictly greater than `capacity`. A capacity that is already a
    /// power of two is therefore doubled.
    ///
    /// # Panics
    ///
    /// Panics if the bucket count overflows, and aborts through
    /// [`handle_alloc_error`] if the bucket array cannot be allocated. See
    /// [`HashTable::try_with_capacity`] for a fallible version.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// assert_eq!(HashTable::with_capacity(837).bucket_count(), 1024);
    /// assert_eq!(HashTable::with_capacity(64).bucket_count(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(table) => table,
            Err(CapacityError::CapacityOverflow) => panic!("capacity overflow"),
            Err(CapacityError::AllocError { layout }) => handle_alloc_error(layout),
        }
    }

    /// Creates a new hash table sized for `capacity` keys, reporting failure
    /// instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::CapacityOverflow`] if the bucket count or the
    /// bucket array size does not fit in the address space, and
    /// [`CapacityError::AllocError`] if the allocator fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::CapacityError;
    /// # use chain_hash::HashTable;
    /// #
    /// let table = HashTable::try_with_capacity(10).unwrap();
    /// assert_eq!(table.bucket_count(), 16);
    ///
    /// let err = HashTable::try_with_capacity(usize::MAX).unwrap_err();
    /// assert_eq!(err, CapacityError::CapacityOverflow);
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        let result = bucket_count_for(capacity)
            .ok_or(CapacityError::CapacityOverflow)
            .and_then(Self::with_bucket_count);

        match &result {
            Ok(table) => log::debug!(
                "created hash table for capacity {}: {} buckets, {} bytes",
                capacity,
                table.bucket_count(),
                table.layout.size()
            ),
            Err(e) => log::error!("cannot create hash table for capacity {capacity}: {e}"),
        }

        result
    }

    /// Allocates a zeroed bucket array of `bucket_count` empty chains.
    fn with_bucket_count(bucket_count: usize) -> Result<Self, CapacityError> {
        debug_assert!(bucket_count.is_power_of_two());

        let layout =
            Layout::array::<Link>(bucket_count).map_err(|_| CapacityError::CapacityOverflow)?;
        debug_assert!(layout.size() != 0);

        // SAFETY: `bucket_count >= 1` and `Link` is pointer sized, so the
        // layout has a non-zero size. All-zero bytes are a valid `None` for
        // every slot.
        let raw_alloc = unsafe { alloc::alloc::alloc_zeroed(layout) };
        let buckets =
            NonNull::new(raw_alloc.cast::<Link>()).ok_or(CapacityError::AllocError { layout })?;

        Ok(Self {
            buckets,
            layout,
            mask: bucket_count - 1,
            populated: 0,
        })
    }

    #[inline(always)]
    fn buckets(&self) -> &[Link] {
        // SAFETY: The allocation holds `mask + 1` initialized links and lives
        // as long as `self`.
        unsafe { core::slice::from_raw_parts(self.buckets.as_ptr(), self.mask + 1) }
    }

    #[inline(always)]
    fn buckets_mut(&mut self) -> &mut [Link] {
        // SAFETY: As in `buckets`, and `&mut self` guarantees exclusive access.
        unsafe { core::slice::from_raw_parts_mut(self.buckets.as_ptr(), self.mask + 1) }
    }

    #[inline(always)]
    fn bucket_index(&self, key: u64) -> usize {
        (hash_key(key) as usize) & self.mask
    }

    /// Returns the link holding `key`'s entry, or the empty link at the tail
    /// of its bucket's chain if the key is absent.
    #[inline]
    fn link_for(&mut self, key: u64) -> &mut Link {
        let index = self.bucket_index(key);
        let mut link = &mut self.buckets_mut()[index];
        // Test with a shared borrow first: breaking out of a `while let` over
        // `link` would keep it mutably borrowed past the loop.
        while link.as_ref().is_some_and(|entry| entry.key != key) {
            if let Some(entry) = link {
                link = &mut entry.next;
            }
        }
        link
    }

    /// Releases every chain, leaving all buckets empty. Returns the number of
    /// entries released.
    fn release_chains(&mut self) -> usize {
        let mut released = 0;
        if self.populated == 0 {
            return released;
        }

        // Unlink one node at a time so long chains never drop recursively.
        for head in self.buckets_mut() {
            let mut next = head.take();
            while let Some(mut entry) = next {
                next = entry.next.take();
                released += 1;
            }
        }

        debug_assert_eq!(released, self.populated);
        self.populated = 0;
        released
    }

    /// Returns the number of buckets. Always a power of two.
    pub fn bucket_count(&self) -> usize {
        self.mask + 1
    }

    /// Returns the number of entries in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// assert_eq!(table.len(), 0);
    ///
    /// table.insert(1, 1);
    /// table.insert(1, 2);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Finds the entry for `key`.
    ///
    /// Walks `key`'s bucket chain head to tail and returns the matching
    /// entry, or `None` if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table.insert(3, 30);
    ///
    /// let entry = table.lookup(3).unwrap();
    /// assert_eq!((entry.key(), entry.value()), (3, 30));
    /// assert!(table.lookup(4).is_none());
    /// ```
    #[inline]
    pub fn lookup(&self, key: u64) -> Option<&Entry> {
        chain(&self.buckets()[self.bucket_index(key)]).find(|entry| entry.key == key)
    }

    /// Finds the entry for `key`, allowing its value to be modified in place.
    #[inline]
    pub fn lookup_mut(&mut self, key: u64) -> Option<&mut Entry> {
        self.link_for(key).as_deref_mut()
    }

    /// Returns the value stored for `key`, if any.
    #[inline]
    pub fn get(&self, key: u64) -> Option<u64> {
        self.lookup(key).map(Entry::value)
    }

    /// Returns `true` if the table holds an entry for `key`.
    #[inline]
    pub fn contains_key(&self, key: u64) -> bool {
        self.lookup(key).is_some()
    }

    /// Inserts `value` for `key`.
    ///
    /// If `key` is already present its value is overwritten in place and
    /// `false` is returned. Otherwise a new entry is appended at the tail of
    /// the key's bucket chain and `true` is returned.
    ///
    /// The table never resizes, whatever the load factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// assert!(table.insert(5, 42));
    /// assert!(!table.insert(5, 5));
    /// assert_eq!(table.get(5), Some(5));
    /// ```
    pub fn insert(&mut self, key: u64, value: u64) -> bool {
        let link = self.link_for(key);
        if let Some(entry) = link {
            entry.value = value;
            return false;
        }

        *link = Some(Box::new(Entry::new(key, value)));
        self.populated += 1;
        true
    }

    /// Removes the entry for `key`.
    ///
    /// Returns `true` if an entry was found and released, `false` if the key
    /// was absent. Erasing the same key twice is not an error; the second
    /// call simply returns `false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table.insert(9, 90);
    ///
    /// assert!(table.erase(9));
    /// assert!(!table.erase(9));
    /// ```
    pub fn erase(&mut self, key: u64) -> bool {
        let link = self.link_for(key);
        let Some(entry) = link.take() else {
            return false;
        };

        *link = entry.next;
        self.populated -= 1;
        true
    }

    /// Removes every entry, keeping the bucket array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table.insert(1, 1);
    /// table.insert(2, 2);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.bucket_count(), 16);
    /// ```
    pub fn clear(&mut self) {
        self.release_chains();
    }

    /// Computes a histogram of chain lengths for the current table state.
    ///
    /// Available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> ChainHistogram {
        let mut buckets_by_length = alloc::vec![0usize; 1];
        for head in self.buckets() {
            let length = chain(head).count();
            if length >= buckets_by_length.len() {
                buckets_by_length.resize(length + 1, 0);
            }
            buckets_by_length[length] += 1;
        }

        ChainHistogram { buckets_by_length }
    }

    /// Returns occupancy and memory statistics for debugging.
    ///
    /// Available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.chain_histogram();
        let bucket_count = self.bucket_count();

        DebugStats {
            populated: self.populated,
            bucket_count,
            occupied_buckets: bucket_count - histogram.buckets_by_length[0],
            longest_chain: histogram.longest_chain(),
            load_factor: self.populated as f64 / bucket_count as f64,
            bucket_bytes: self.layout.size(),
            entry_bytes: self.populated * size_of::<Entry>(),
        }
    }

    /// Checks that every entry sits in the bucket its key mixes to, that keys
    /// are unique, and that the entry count matches `len()`.
    #[cfg(test)]
    fn check_invariants(&self) {
        use alloc::collections::BTreeSet;

        assert!(self.bucket_count().is_power_of_two());

        let mut keys = BTreeSet::new();
        for (index, head) in self.buckets().iter().enumerate() {
            for entry in chain(head) {
                assert_eq!(self.bucket_index(entry.key), index, "{self:?}");
                assert!(keys.insert(entry.key), "duplicate key {}", entry.key);
            }
        }
        assert_eq!(keys.len(), self.populated);
    }

    /// Keys of the chain in `key`'s bucket, head to tail.
    #[cfg(test)]
    fn chain_keys(&self, key: u64) -> alloc::vec::Vec<u64> {
        chain(&self.buckets()[self.bucket_index(key)])
            .map(Entry::key)
            .collect()
    }
}
