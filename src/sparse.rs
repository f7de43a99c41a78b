/// A single sparse feature row: column indices strictly increasing, no explicit zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRow {
    width: usize,
    entries: Vec<(usize, f64)>,
}

impl SparseRow {
    #[cfg(test)]
    pub fn zeros(width: usize) -> Self {
        Self {
            width,
            entries: Vec::new(),
        }
    }

    /// Builds a row from unordered `(column, value)` pairs. Duplicate columns are summed.
    pub fn from_entries(width: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(col, _)| *col);

        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (col, value) in entries {
            debug_assert!(col < width, "column {} out of range for width {}", col, width);
            match merged.last_mut() {
                Some((last, acc)) if *last == col => *acc += value,
                _ => merged.push((col, value)),
            }
        }
        merged.retain(|(_, value)| *value != 0.0);

        Self {
            width,
            entries: merged,
        }
    }

    pub fn from_dense(values: &[f64]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (i, *v))
            .collect();
        Self {
            width: values.len(),
            entries,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    #[cfg(test)]
    pub fn get(&self, col: usize) -> f64 {
        self.entries
            .binary_search_by_key(&col, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.width];
        for (col, value) in self.iter() {
            dense[col] = value;
        }
        dense
    }

    /// Dot product against a dense weight vector of the same width.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter().map(|(col, value)| weights[col] * value).sum()
    }

    /// Horizontal concatenation: `self`'s columns first, then `right`'s shifted by `self.width()`.
    pub fn hstack(&self, right: &SparseRow) -> SparseRow {
        let offset = self.width;
        let mut entries = Vec::with_capacity(self.nnz() + right.nnz());
        entries.extend(self.iter());
        entries.extend(right.iter().map(|(col, value)| (col + offset, value)));
        SparseRow {
            width: self.width + right.width,
            entries,
        }
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for (_, value) in self.entries.iter_mut() {
            *value *= factor;
        }
    }

    pub(crate) fn map_values(&mut self, f: impl Fn(usize, f64) -> f64) {
        for (col, value) in self.entries.iter_mut() {
            *value = f(*col, *value);
        }
        self.entries.retain(|(_, value)| *value != 0.0);
    }
}
