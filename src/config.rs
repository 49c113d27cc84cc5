/// Construction options for [`crate::Emberwood`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Install a [`crate::Validator`] so that [`crate::Emberwood::validate`] inspects the tree.
    pub debug: bool,
    /// Number of node slots to allocate up front.
    pub capacity: usize,
}

impl TreeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
