/// Minimum number of requested indices a cycle must resolve before its values
/// are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViabilityPolicy {
    /// At least one requested index is resolved.
    #[default]
    AnyResolved,
    /// At least two resolved indices, on the assumption that time is always
    /// one of them. Older readers used this rule.
    Legacy,
}

impl ViabilityPolicy {
    pub fn min_resolved(self) -> usize {
        match self {
            ViabilityPolicy::AnyResolved => 1,
            ViabilityPolicy::Legacy => 2,
        }
    }

    pub fn is_viable(self, resolved: usize) -> bool {
        resolved >= self.min_resolved()
    }
}

/// Runtime options for a single decode.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Emit [`crate::FILL_VALUE`] for sensors that are not set in a cycle
    /// instead of leaving the cycle out of their series.
    pub include_not_set: bool,
    /// Drop the first viable cycle, which usually carries bootstrap state.
    pub skip_first_cycle: bool,
    /// Stop once every sensor holds this many values. `None` reads the whole
    /// file.
    pub max_values_per_sensor: Option<usize>,
    pub viability: ViabilityPolicy,
}

/// Upper bound for decompressed content held in memory.
pub const MAX_IN_MEMORY_FILE_SIZE: usize = 1024 * 1024 * 1024;

/// Where [`crate::CompressedFileCache`] materializes decompressed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Write a sibling file once and reuse it on later opens.
    #[default]
    SiblingFile,
    /// Decompress into memory on every open, refusing content above
    /// `max_bytes`.
    InMemory { max_bytes: usize },
}
