//! Row masks

use polars::prelude::*;

use crate::error::{Error, Result};

/// Boolean selection over the rows of one table; `true` keeps the row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMask {
    bits: Vec<bool>,
}

impl RowMask {
    /// A mask keeping all `len` rows
    #[must_use]
    pub fn all(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    /// Narrow the mask by a predicate result (logical AND)
    pub fn and(&mut self, other: &[bool]) -> Result<()> {
        if other.len() != self.bits.len() {
            return Err(Error::operation(format!(
                "Predicate produced {} values for {} rows",
                other.len(),
                self.bits.len()
            )));
        }
        for (bit, keep) in self.bits.iter_mut().zip(other) {
            *bit &= *keep;
        }
        Ok(())
    }

    /// Number of rows in the mask
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the mask covers no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of rows kept
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Whether every row is kept
    #[must_use]
    pub fn keeps_all(&self) -> bool {
        self.bits.iter().all(|b| *b)
    }

    /// The raw bits
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Apply the mask, producing a filtered copy of `df`
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        if df.height() != self.bits.len() {
            return Err(Error::operation(format!(
                "Mask of {} rows applied to a table of {} rows",
                self.bits.len(),
                df.height()
            )));
        }
        if self.keeps_all() {
            return Ok(df.clone());
        }
        let mask = BooleanChunked::from_slice("mask".into(), &self.bits);
        Ok(df.filter(&mask)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_narrows() {
        let mut mask = RowMask::all(4);
        mask.and(&[true, false, true, true]).unwrap();
        mask.and(&[true, true, false, true]).unwrap();
        assert_eq!(mask.as_slice(), &[true, false, false, true]);
        assert_eq!(mask.count(), 2);
        assert!(!mask.keeps_all());
    }

    #[test]
    fn test_length_mismatch() {
        let mut mask = RowMask::all(2);
        assert!(mask.and(&[true]).is_err());
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_apply() {
        let df = df! { "x" => [1, 2, 3] }.unwrap();
        let mut mask = RowMask::all(3);
        mask.and(&[false, true, true]).unwrap();
        let filtered = mask.apply(&df).unwrap();
        assert_eq!(filtered.height(), 2);
        assert!(RowMask::all(3).apply(&df).unwrap().equals(&df));
    }
}
