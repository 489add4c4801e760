//! # Sparse vector
//!
//! Wrapping a `Vec<(usize, _)>`, sorted by index. Indices start at `0`. The vector has no fixed
//! dimension; an absent index denotes a zero coefficient.
//!
//! Explicit zero entries are allowed to accumulate during additive updates and are only dropped
//! by `compactify`. Equality of the represented index to value maps is therefore a separate
//! operation from the (cheaper, derived) structural equality.
use std::mem;

use num_traits::Zero;

use crate::data::linear_algebra::SparseTuple;
use crate::data::number_types::Rational;

/// A sparse vector of rationals using a `Vec` with (index, value) combinations as back-end.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct SparseVector {
    data: Vec<SparseTuple<Rational>>,
}

impl SparseVector {
    /// Create a vector from existing entries.
    ///
    /// Requires the entries to be sorted by strictly increasing index; zero values are permitted.
    pub fn new(data: Vec<SparseTuple<Rational>>) -> Self {
        debug_assert!(data.windows(2).all(|w| w[0].0 < w[1].0));

        Self { data }
    }

    /// Create a vector without any entries.
    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    /// Retrieve the value at an index.
    ///
    /// # Returns
    ///
    /// `None` if no entry is stored at the index. Note that a stored entry may still be an
    /// explicit zero.
    pub fn get(&self, index: usize) -> Option<&Rational> {
        self.get_data_index(index).ok().map(|i| &self.data[i].1)
    }

    /// The value at an index as an owned rational, zero when absent.
    pub fn value_at(&self, index: usize) -> Rational {
        self.get(index).cloned().unwrap_or_else(Rational::zero)
    }

    /// Set the value at index `i` to `value`.
    ///
    /// Overwrites an existing entry. Depending on the insert position, this can be an expensive
    /// operation (many values may be shifted).
    pub fn set(&mut self, i: usize, value: Rational) {
        match self.get_data_index(i) {
            Ok(index) => self.data[index].1 = value,
            Err(index) => self.data.insert(index, (i, value)),
        }
    }

    /// Add `factor` times `other` to this vector, in place.
    ///
    /// Entries that cancel to zero remain stored until the next `compactify`.
    pub fn add_multiple(&mut self, factor: &Rational, other: &SparseVector) {
        if factor.is_zero() {
            return;
        }

        let mut merged = Vec::with_capacity(self.data.len() + other.data.len());
        let mut left = mem::take(&mut self.data).into_iter().peekable();
        let mut right = other.data.iter().peekable();

        loop {
            match (left.peek(), right.peek()) {
                (Some(&(i, _)), Some(&&(j, _))) => {
                    if i < j {
                        merged.push(left.next().unwrap());
                    } else if j < i {
                        let (index, value) = right.next().unwrap();
                        merged.push((*index, factor * value));
                    } else {
                        let (index, mut value) = left.next().unwrap();
                        let (_, other_value) = right.next().unwrap();
                        value += factor * other_value;
                        merged.push((index, value));
                    }
                }
                (Some(_), None) => merged.push(left.next().unwrap()),
                (None, Some(_)) => {
                    let (index, value) = right.next().unwrap();
                    merged.push((*index, factor * value));
                }
                (None, None) => break,
            }
        }

        self.data = merged;
    }

    /// Compute the difference `self - other` as a new vector.
    ///
    /// The coefficient at each index is the difference of the two coefficients at that index;
    /// zero results remain stored.
    pub fn difference(&self, other: &SparseVector) -> SparseVector {
        let mut result = self.clone();
        result.add_multiple(&-Rational::from_integer(1), other);
        result
    }

    /// Drop all entries holding an explicit zero. Idempotent.
    pub fn compactify(&mut self) {
        self.data.retain(|(_, value)| !value.is_zero());
    }

    /// Bring every stored value into lowest terms. Idempotent, does not change semantic content.
    pub fn canonicalize(&mut self) {
        for (_, value) in &mut self.data {
            value.reduce();
        }
    }

    /// Whether both vectors represent the same index to value map.
    ///
    /// Explicit zero entries on either side are ignored. This is the expensive comparison; the
    /// derived `PartialEq` compares the raw entry lists and may report a difference where there
    /// semantically is none.
    pub fn semantic_eq(&self, other: &SparseVector) -> bool {
        let mut left = self.data.iter().filter(|(_, value)| !value.is_zero());
        let mut right = other.data.iter().filter(|(_, value)| !value.is_zero());

        loop {
            match (left.next(), right.next()) {
                (Some(lhs), Some(rhs)) => {
                    if lhs != rhs {
                        return false;
                    }
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    /// Compute the inner product with another sparse vector.
    pub fn scalar_product(&self, other: &SparseVector) -> Rational {
        let mut product = Rational::zero();
        let mut right = other.data.iter().peekable();

        for (i, value) in &self.data {
            while right.next_if(|&&(j, _)| j < *i).is_some() {}
            if let Some((_, other_value)) = right.next_if(|&&(j, _)| j == *i) {
                product += value * other_value;
            }
        }

        product
    }

    /// Iterate over the stored entries, explicit zeros included.
    pub fn iter(&self) -> std::slice::Iter<SparseTuple<Rational>> {
        self.data.iter()
    }

    /// The number of stored entries (and not the dimension of the represented vector).
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_data_index(&self, i: usize) -> Result<usize, usize> {
        self.data.binary_search_by_key(&i, |&(index, _)| index)
    }
}

#[cfg(test)]
mod test {
    use num_traits::Zero;

    use crate::data::linear_algebra::vector::SparseVector;
    use crate::data::number_types::Rational;
    use crate::R;

    fn from_pairs(pairs: &[(usize, i64)]) -> SparseVector {
        SparseVector::new(pairs.iter().map(|&(i, v)| (i, R!(v))).collect())
    }

    #[test]
    fn get_set() {
        let mut vector = from_pairs(&[(1, 3), (4, -2)]);

        assert_eq!(vector.get(0), None);
        assert_eq!(vector.get(1), Some(&R!(3)));
        assert_eq!(vector.value_at(2), R!(0));

        vector.set(2, R!(7));
        assert_eq!(vector.get(2), Some(&R!(7)));
        vector.set(1, R!(-1, 2));
        assert_eq!(vector.get(1), Some(&R!(-1, 2)));
    }

    #[test]
    fn add_multiple_merges_and_keeps_zeros() {
        let mut vector = from_pairs(&[(0, 4), (2, 1)]);
        let other = from_pairs(&[(0, -2), (1, 5)]);

        vector.add_multiple(&R!(2), &other);

        assert_eq!(vector.value_at(0), R!(0));
        assert_eq!(vector.value_at(1), R!(10));
        assert_eq!(vector.value_at(2), R!(1));
        // The cancelled entry is still stored.
        assert_eq!(vector.size(), 3);

        vector.compactify();
        assert_eq!(vector.size(), 2);
    }

    #[test]
    fn semantic_equality_ignores_explicit_zeros() {
        let mut left = from_pairs(&[(0, 1), (3, 2)]);
        left.add_multiple(&R!(-1), &from_pairs(&[(0, 1)]));
        let right = from_pairs(&[(3, 2)]);

        assert_ne!(left, right);
        assert!(left.semantic_eq(&right));
        assert!(right.semantic_eq(&left));

        left.compactify();
        assert_eq!(left, right);
    }

    #[test]
    fn difference() {
        let left = from_pairs(&[(0, 1), (2, 3)]);
        let right = from_pairs(&[(0, 1), (1, -1)]);

        let difference = left.difference(&right);

        assert_eq!(difference.value_at(0), R!(0));
        assert_eq!(difference.value_at(1), R!(1));
        assert_eq!(difference.value_at(2), R!(3));
        assert!(difference.get(0).is_some());
    }

    #[test]
    fn scalar_product() {
        let left = from_pairs(&[(0, 2), (2, 3), (5, -1)]);
        let right = from_pairs(&[(1, 10), (2, 2), (5, 5)]);

        assert_eq!(left.scalar_product(&right), R!(1));
        assert_eq!(right.scalar_product(&left), R!(1));
        assert_eq!(left.scalar_product(&SparseVector::empty()), Rational::zero());
    }

    #[test]
    fn compactify_and_canonicalize_are_idempotent() {
        let mut vector = from_pairs(&[(0, 5), (1, 0), (7, -3)]);

        vector.compactify();
        let after_once = vector.clone();
        vector.compactify();
        assert_eq!(vector, after_once);

        vector.canonicalize();
        let after_once = vector.clone();
        vector.canonicalize();
        assert_eq!(vector, after_once);
    }
}
