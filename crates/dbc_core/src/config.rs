//! Load configuration.

use crate::registry::AllocationTracker;

/// Options recognized by [`DbcStorage::open`](crate::DbcStorage::open).
#[derive(Debug, Clone, Default)]
pub struct LoadConfig {
    /// Skip the header magic check.
    pub ignore_wrong_magic: bool,

    /// Decode `LazyString` fields exactly like `String` fields.
    pub materialize_lazy_strings_immediately: bool,

    /// Load the whole file into memory even when it could be streamed.
    pub complete_load: bool,

    /// The store owns the stream and closes it on teardown, or right after
    /// an eager load.
    pub own_stream: bool,

    /// Observer for every allocation the store registers.
    pub tracker: Option<AllocationTracker>,
}

impl LoadConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a wrong header magic is tolerated.
    #[must_use]
    pub const fn ignore_wrong_magic(mut self, value: bool) -> Self {
        self.ignore_wrong_magic = value;
        self
    }

    /// Sets whether lazy strings are materialized during decode.
    #[must_use]
    pub const fn materialize_lazy_strings_immediately(mut self, value: bool) -> Self {
        self.materialize_lazy_strings_immediately = value;
        self
    }

    /// Sets whether the whole file is loaded eagerly.
    #[must_use]
    pub const fn complete_load(mut self, value: bool) -> Self {
        self.complete_load = value;
        self
    }

    /// Sets whether the store takes ownership of the stream.
    #[must_use]
    pub const fn own_stream(mut self, value: bool) -> Self {
        self.own_stream = value;
        self
    }

    /// Attaches an allocation tracker.
    #[must_use]
    pub fn tracker(mut self, tracker: AllocationTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }
}
