//! Provides a sparse-set used to track which instructions are already
//! scheduled on an evaluation stack.

#[derive(Debug)]
pub(crate) struct SparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

impl SparseSet {
    /// Initializes a new set taking a value representing the maximum size
    /// of the set.
    #[must_use]
    pub(crate) fn new(max_len: usize) -> Self {
        Self {
            dense: Vec::with_capacity(max_len),
            sparse: vec![0; max_len],
        }
    }

    /// Inserts a value into the set.
    pub(crate) fn insert(&mut self, val: usize) {
        if self.contains(val) {
            return;
        }

        self.sparse[val] = self.dense.len();
        self.dense.push(val);
    }

    /// Returns `true` if the set contains a value.
    pub(crate) fn contains(&self, val: usize) -> bool {
        self.sparse
            .get(val)
            .map(|&dense_idx| self.dense.get(dense_idx) == Some(&val))
            .unwrap_or(false)
    }

    /// Clears the set, removing all values.
    pub(crate) fn clear(&mut self) {
        self.dense.clear();
    }
}
