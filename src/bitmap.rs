use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use core::iter::FusedIterator;
use thiserror::Error;

/// The largest value a [`Bitmap`] can hold.
///
/// Bitmaps are meant to store relatively small numbers (corresponding to,
/// say, an enum), so the maximum entry is capped to keep the backing storage
/// small. 64k is plenty.
pub const MAX_MEMBER: usize = 0xffff;

const WORD_BITS: usize = u64::BITS as usize;

/// The error type returned by the fallible [`Bitmap`] operations.
///
/// Every failure leaves the bitmap in its prior state; no partial mutation
/// is ever observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Growing or copying the backing word storage failed to allocate.
    #[error("allocation failure while growing bitmap storage")]
    OutOfMemory,
    /// The value passed to [`Bitmap::set`] exceeds [`MAX_MEMBER`].
    #[error("value {0} exceeds the maximum representable member 65535")]
    OutOfRange(usize),
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

/// Resume token for [`Bitmap::next_member`].
///
/// Holds the next candidate value to examine. Callers create it with
/// [`Cursor::START`] (or [`Default`]) and thread the same cursor through
/// repeated [`next_member`] calls; each call resumes the scan where the
/// previous one stopped rather than rescanning from zero. Once a scan runs
/// off the end of the backing words the cursor parks at an end sentinel and
/// every further call reports exhaustion.
///
/// A cursor cannot be rewound; start over with a fresh [`Cursor::START`].
///
/// [`next_member`]: Bitmap::next_member
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cursor(usize);

impl Cursor {
    /// A cursor positioned before the smallest possible member.
    pub const START: Cursor = Cursor(0);

    const END: Cursor = Cursor(usize::MAX);

    /// Returns `true` once a scan with this cursor has reached the end of
    /// the bitmap.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::{Bitmap, Cursor};
    ///
    /// let bitmap = Bitmap::new();
    /// let mut cursor = Cursor::START;
    /// assert!(!cursor.is_exhausted());
    /// assert_eq!(bitmap.next_member(&mut cursor), None);
    /// assert!(cursor.is_exhausted());
    /// ```
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        *self == Self::END
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::START
    }
}

/// The main type that stores the information.
///
/// A growable set of small integers in `0..=`[`MAX_MEMBER`], where bit `r`
/// of word `w` records membership of `w * 64 + r`. Words are allocated
/// lazily: a fresh bitmap owns no storage at all, and [`set`] grows the word
/// sequence just far enough to reach the bit it needs, zero-filling on the
/// way. Words past the highest one ever touched simply do not exist, which
/// is what keeps sparse populations cheap.
///
/// Equality is structural over the member set; trailing all-zero words left
/// behind by growth never distinguish two bitmaps.
///
/// [`set`]: Bitmap::set
#[derive(Clone)]
pub struct Bitmap {
    words: Vec<u64>,
}

impl Bitmap {
    /// Creates a new bitmap with no members and no backing allocation.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// ```
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Creates an independent copy of the bitmap, reporting allocation
    /// failure instead of aborting.
    ///
    /// The copy shares no storage with the original; mutating one never
    /// affects the other. The infallible [`Clone`] impl is available when
    /// allocation failure handling is not a concern.
    ///
    /// # Errors
    /// [`Error::OutOfMemory`] if the copy allocation fails.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let mut original = Bitmap::new();
    /// original.set(7).unwrap();
    /// let mut copy = original.try_clone().unwrap();
    /// copy.unset(7);
    /// assert!(original.is_set(7));
    /// assert!(!copy.is_set(7));
    /// ```
    pub fn try_clone(&self) -> Result<Self, Error> {
        let mut words = Vec::new();
        words.try_reserve_exact(self.words.len())?;
        words.extend_from_slice(&self.words);
        Ok(Self { words })
    }

    /// Builds a bitmap containing exactly the values yielded by the
    /// iterator.
    ///
    /// # Errors
    /// Propagates the first [`set`] failure; see [`set`] for the error
    /// conditions.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let bitmap = Bitmap::try_from_members([0, 2, 5]).unwrap();
    /// assert!(bitmap.is_set(2));
    /// assert!(!bitmap.is_set(1));
    /// ```
    ///
    /// [`set`]: Bitmap::set
    pub fn try_from_members<I: IntoIterator<Item = usize>>(iter: I) -> Result<Self, Error> {
        let mut bitmap = Self::new();
        for n in iter {
            bitmap.set(n)?;
        }
        Ok(bitmap)
    }

    /// Inserts `n` into the bitmap.
    ///
    /// If `n` lands beyond the words currently in use, the backing sequence
    /// grows (zero-filling new words) to reach it. Growth may over-allocate
    /// capacity for amortization, but the word count afterwards is exactly
    /// `n / 64 + 1`.
    ///
    /// # Errors
    /// - [`Error::OutOfRange`] if `n > `[`MAX_MEMBER`]; nothing is mutated.
    /// - [`Error::OutOfMemory`] if growth fails to allocate; the bitmap is
    ///   left unchanged.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::{Bitmap, Error, MAX_MEMBER};
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.set(3).unwrap();
    /// assert!(bitmap.is_set(3));
    /// assert_eq!(
    ///     bitmap.set(MAX_MEMBER + 1),
    ///     Err(Error::OutOfRange(MAX_MEMBER + 1))
    /// );
    /// ```
    pub fn set(&mut self, n: usize) -> Result<(), Error> {
        // refuse to allocate huge bitmaps
        if n > MAX_MEMBER {
            return Err(Error::OutOfRange(n));
        }
        let (offset, bit) = word_and_bit(n);
        if offset >= self.words.len() {
            self.words.try_reserve(offset + 1 - self.words.len())?;
            self.words.resize(offset + 1, 0);
        }
        self.words[offset] |= 1 << bit;
        Ok(())
    }

    /// Removes `n` from the bitmap.
    ///
    /// A no-op if `n` falls beyond the words in use; there is nothing to
    /// clear there, and the storage never grows for an unset.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.set(3).unwrap();
    /// bitmap.unset(3);
    /// bitmap.unset(1_000_000); // fine, nothing there
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn unset(&mut self, n: usize) {
        let (offset, bit) = word_and_bit(n);
        if let Some(word) = self.words.get_mut(offset) {
            *word &= !(1 << bit);
        }
    }

    /// Returns `true` if `n` is a member of the bitmap.
    ///
    /// Values beyond the words in use are reported as not set.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.set(70).unwrap();
    /// assert!(bitmap.is_set(70));
    /// assert!(!bitmap.is_set(71));
    /// assert!(!bitmap.is_set(1_000_000));
    /// ```
    #[inline]
    pub fn is_set(&self, n: usize) -> bool {
        let (offset, bit) = word_and_bit(n);
        self.words
            .get(offset)
            .is_some_and(|word| word & (1 << bit) != 0)
    }

    /// Returns `true` if the bitmap has no members.
    ///
    /// Runs in O(w) where w is the number of words in use, since words may
    /// be in use yet hold no set bits.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// bitmap.set(500).unwrap();
    /// assert!(!bitmap.is_empty());
    /// bitmap.unset(500);
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Removes all members and releases the backing storage.
    ///
    /// The bitmap behaves as freshly created afterwards and can be reused.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.set(1234).unwrap();
    /// bitmap.clear();
    /// assert!(bitmap.is_empty());
    /// bitmap.set(1).unwrap();
    /// assert!(bitmap.is_set(1));
    /// ```
    pub fn clear(&mut self) {
        self.words = Vec::new();
    }

    /// Yields the next member at or above the cursor position, in ascending
    /// order, and advances the cursor past it.
    ///
    /// Returns `None` once no further member exists, parking the cursor at
    /// its end sentinel; calling again on an exhausted cursor returns `None`
    /// without side effects. A full traversal costs O(w) in the number of
    /// words in use, amortized across the calls, because each call resumes
    /// at the cursor instead of rescanning from zero.
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::{Bitmap, Cursor};
    ///
    /// let bitmap = Bitmap::try_from_members([3, 70, 1000]).unwrap();
    /// let mut cursor = Cursor::START;
    /// assert_eq!(bitmap.next_member(&mut cursor), Some(3));
    /// assert_eq!(bitmap.next_member(&mut cursor), Some(70));
    /// assert_eq!(bitmap.next_member(&mut cursor), Some(1000));
    /// assert_eq!(bitmap.next_member(&mut cursor), None);
    /// assert_eq!(bitmap.next_member(&mut cursor), None);
    /// ```
    pub fn next_member(&self, cursor: &mut Cursor) -> Option<usize> {
        if cursor.is_exhausted() {
            return None;
        }
        let (mut offset, bit) = word_and_bit(cursor.0);
        // masks off the bits below the cursor in the first word
        let mut mask = !0u64 << bit;
        while offset < self.words.len() {
            let pending = self.words[offset] & mask;
            if pending != 0 {
                let n = offset * WORD_BITS + pending.trailing_zeros() as usize;
                cursor.0 = n + 1;
                return Some(n);
            }
            offset += 1;
            mask = !0;
        }
        *cursor = Cursor::END;
        None
    }

    /// Returns an iterator over all members in ascending order.
    ///
    /// A convenience layer over [`next_member`] that threads its own
    /// [`Cursor`].
    ///
    /// # Examples
    /// ```
    /// use sparse_bitmap::Bitmap;
    ///
    /// let bitmap = Bitmap::try_from_members([3, 70, 1000]).unwrap();
    /// let members: Vec<usize> = bitmap.iter_members().collect();
    /// assert_eq!(members, [3, 70, 1000]);
    /// ```
    ///
    /// [`next_member`]: Bitmap::next_member
    #[inline]
    pub fn iter_members(&self) -> Members<'_> {
        Members {
            bitmap: self,
            cursor: Cursor::START,
        }
    }
}

#[inline]
const fn word_and_bit(n: usize) -> (usize, usize) {
    (n / WORD_BITS, n % WORD_BITS)
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality over the member set, independent of how far either
/// bitmap has grown.
///
/// The overlapping prefix of the two word sequences is compared word for
/// word; past it, every word of the longer sequence must be all zero, so
/// trailing zero words left behind by growth never distinguish two bitmaps.
///
/// # Examples
/// ```
/// use sparse_bitmap::Bitmap;
///
/// let mut a = Bitmap::new();
/// a.set(5).unwrap();
/// let mut b = Bitmap::new();
/// b.set(5).unwrap();
/// b.set(500).unwrap();
/// b.unset(500); // b keeps its zero high words
/// assert_eq!(a, b);
/// ```
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        let common = self.words.len().min(other.words.len());
        self.words[..common] == other.words[..common]
            && self.words[common..].iter().all(|&word| word == 0)
            && other.words[common..].iter().all(|&word| word == 0)
    }
}

impl Eq for Bitmap {}

impl Debug for Bitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter_members()).finish()
    }
}

/// Iterator over the members of a [`Bitmap`] in ascending order.
///
/// Returned by [`Bitmap::iter_members()`].
#[derive(Clone, Copy)]
pub struct Members<'bitmap> {
    bitmap: &'bitmap Bitmap,
    cursor: Cursor,
}

impl Iterator for Members<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.bitmap.next_member(&mut self.cursor)
    }
}

impl FusedIterator for Members<'_> {}

/// Treats an `Option<Bitmap>` as a nullable bitmap handle.
///
/// An absent bitmap behaves as a valid empty set: reads find nothing,
/// [`unset`], [`clear`] and iteration are graceful no-ops, and none of these
/// operations can fail. Only [`ensure_allocated`] materializes a bitmap in
/// the slot.
///
/// # Examples
/// ```
/// use sparse_bitmap::{Bitmap, BitmapSlot};
///
/// let mut slot: Option<Bitmap> = None;
/// assert!(slot.is_empty());
/// assert!(!slot.is_set(3));
/// slot.ensure_allocated().set(3).unwrap();
/// assert!(slot.is_set(3));
/// ```
///
/// [`unset`]: BitmapSlot::unset
/// [`clear`]: BitmapSlot::clear
/// [`ensure_allocated`]: BitmapSlot::ensure_allocated
pub trait BitmapSlot {
    /// Puts an empty bitmap into the slot if it is absent and returns a
    /// mutable reference to the occupant. Idempotent; allocates nothing,
    /// since an empty bitmap owns no storage.
    fn ensure_allocated(&mut self) -> &mut Bitmap;

    /// Returns `true` if `n` is a member; `false` on an absent bitmap.
    fn is_set(&self, n: usize) -> bool;

    /// Returns `true` if the bitmap is absent or has no members.
    fn is_empty(&self) -> bool;

    /// Removes `n`; a no-op on an absent bitmap.
    fn unset(&mut self, n: usize);

    /// Removes all members and releases backing storage; a no-op on an
    /// absent bitmap. An occupied slot stays occupied.
    fn clear(&mut self);

    /// Yields the next member as [`Bitmap::next_member`] does; on an absent
    /// bitmap reports exhaustion immediately, leaving the cursor untouched.
    fn next_member(&self, cursor: &mut Cursor) -> Option<usize>;

    /// Structural equality between two handles. Two absent bitmaps are
    /// equal; an absent bitmap equals a present one only if the present one
    /// has no members; two present bitmaps compare as [`Bitmap`] equality.
    fn members_equal(&self, other: &Self) -> bool;
}

impl BitmapSlot for Option<Bitmap> {
    fn ensure_allocated(&mut self) -> &mut Bitmap {
        self.get_or_insert_with(Bitmap::new)
    }

    fn is_set(&self, n: usize) -> bool {
        self.as_ref().is_some_and(|bitmap| bitmap.is_set(n))
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_none_or(Bitmap::is_empty)
    }

    fn unset(&mut self, n: usize) {
        if let Some(bitmap) = self {
            bitmap.unset(n);
        }
    }

    fn clear(&mut self) {
        if let Some(bitmap) = self {
            bitmap.clear();
        }
    }

    fn next_member(&self, cursor: &mut Cursor) -> Option<usize> {
        self.as_ref()?.next_member(cursor)
    }

    fn members_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            (Some(present), None) | (None, Some(present)) => present.is_empty(),
        }
    }
}
