use core::ops::{Deref, DerefMut};

#[cfg(feature = "alloc")]
use std_alloc::vec::Vec;

/// Get the runtime size of a collection
///
/// When the collection contains [`u8`]s, `get_size` is the
/// number of bytes stored.
pub trait GetSize {
  /// Get the number of elements currently stored.
  ///
  /// ```
  /// use croak_common::GetSize;
  ///
  /// assert_eq!(tinyvec::array_vec!([u8; 4] => 1, 2).get_size(), 2)
  /// ```
  fn get_size(&self) -> usize;

  /// Get the number of elements this collection can hold,
  /// `None` when the collection may grow without bound.
  ///
  /// ```
  /// use croak_common::GetSize;
  ///
  /// assert_eq!(tinyvec::ArrayVec::<[u8; 4]>::new().max_size(), Some(4));
  /// ```
  fn max_size(&self) -> Option<usize>;

  /// Is there no room left in this collection?
  fn is_full(&self) -> bool;

  /// Check if the collection is empty
  ///
  /// ```
  /// use croak_common::GetSize;
  ///
  /// assert!(tinyvec::ArrayVec::<[u8; 4]>::new().size_is_zero())
  /// ```
  fn size_is_zero(&self) -> bool {
    self.get_size() == 0
  }
}

#[cfg(feature = "alloc")]
impl<T> GetSize for Vec<T> {
  fn get_size(&self) -> usize {
    self.len()
  }

  fn max_size(&self) -> Option<usize> {
    None
  }

  fn is_full(&self) -> bool {
    false
  }
}

impl<A: tinyvec::Array> GetSize for tinyvec::ArrayVec<A> {
  fn get_size(&self) -> usize {
    self.len()
  }

  fn max_size(&self) -> Option<usize> {
    Some(A::CAPACITY)
  }

  fn is_full(&self) -> bool {
    self.len() >= self.capacity()
  }
}

/// Create a collection and reserve some amount of space for it to grow into
///
/// - `Vec` invokes [`Vec::with_capacity`]
/// - `tinyvec::ArrayVec` invokes `Default::default()`, the space
///   already lives on the stack
pub trait Reserve: Default {
  /// Create an instance of the collection with a given capacity
  fn reserve(_: usize) -> Self {
    Default::default()
  }
}

#[cfg(feature = "alloc")]
impl<T> Reserve for Vec<T> {
  fn reserve(n: usize) -> Self {
    Self::with_capacity(n)
  }
}

impl<A: tinyvec::Array> Reserve for tinyvec::ArrayVec<A> {}

/// An ordered indexable collection of some type `Item`
///
/// # Provided implementations
/// - [`Vec`] (feature `alloc`)
/// - [`tinyvec::ArrayVec`]
///
/// `tinyvec` is preferred over `heapless` / `arrayvec` for the same reasons
/// as everywhere else in this project: a fast `Extend` implementation and
/// zero unsafe code.
///
/// # Requirements
/// - [`Default`] for creating the collection
/// - [`Extend`] for adding onto the collection (1 or more elements)
/// - [`Reserve`] for reserving space ahead of time
/// - [`GetSize`] for bound checks, empty checks, and accessing the length
/// - [`FromIterator`] for `collect`ing into the collection
/// - [`IntoIterator`] for iterating and destroying the collection
/// - [`Deref<Target = [T]>`](Deref) and [`DerefMut`] for indexing & slice iteration
pub trait Array:
  Default
  + GetSize
  + Reserve
  + Deref<Target = [<Self as Array>::Item]>
  + DerefMut
  + Extend<<Self as Array>::Item>
  + FromIterator<<Self as Array>::Item>
  + IntoIterator<Item = <Self as Array>::Item>
{
  /// The type of item contained in the collection
  type Item;

  /// Add a value to the end of the collection.
  ///
  /// May panic or drop the value if the collection is full;
  /// check [`GetSize::is_full`] first.
  fn push(&mut self, value: <Self as Array>::Item);

  /// Insert a value at a particular index, shifting everything
  /// after it one position to the right.
  fn insert_at(&mut self, index: usize, value: <Self as Array>::Item);
}

#[cfg(feature = "alloc")]
impl<T> Array for Vec<T> {
  type Item = T;

  fn push(&mut self, value: T) {
    self.push(value)
  }

  fn insert_at(&mut self, index: usize, value: T) {
    self.insert(index, value)
  }
}

impl<A: tinyvec::Array<Item = T>, T> Array for tinyvec::ArrayVec<A> {
  type Item = T;

  fn push(&mut self, value: T) {
    self.push(value)
  }

  fn insert_at(&mut self, index: usize, value: T) {
    self.insert(index, value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sums<A: Array<Item = u8>>(a: A) -> usize {
    a.into_iter().map(usize::from).sum()
  }

  #[test]
  fn array_is_collection_agnostic() {
    let vec = vec![1u8, 2, 3];
    let arrayvec = tinyvec::array_vec!([u8; 4] => 1, 2, 3);
    assert_eq!(sums(vec), sums(arrayvec));
  }

  #[test]
  fn insert_at_shifts_right() {
    let mut av = tinyvec::array_vec!([u8; 4] => 1, 3);
    av.insert_at(1, 2);
    assert_eq!(&av[..], &[1, 2, 3]);
  }

  #[test]
  fn full_and_empty() {
    let mut av = tinyvec::ArrayVec::<[u8; 2]>::new();
    assert!(av.size_is_zero());
    assert!(!av.is_full());

    av.extend([1, 2]);
    assert!(av.is_full());
    assert_eq!(av.max_size(), Some(2));

    assert!(!vec![1u8].is_full());
    assert_eq!(Vec::<u8>::new().max_size(), None);
  }
}
