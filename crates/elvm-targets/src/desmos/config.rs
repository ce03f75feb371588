/// Tunables for the Desmos backend (the `DESMOS_MEM_SIZE`, `K`, and
/// `CHUNKED_FUNC_SIZE` constants of the source material), surfaced at the
/// backend boundary instead of baked in as preprocessor constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesmosConfig {
    /// Pc-chunk size `K`: how many consecutive pcs share one `f_c` function.
    /// Also reused as the memory chunk size (`DESMOS_MEM_SIZE` is divided
    /// into chunks of this many words each), since the source material does
    /// not distinguish the two chunk granularities.
    pub chunk_size: usize,
    /// Total addressable memory (`DESMOS_MEM_SIZE`). Addresses wrap modulo
    /// this value.
    pub mem_size: usize,
    /// Register width, as a power of two (e.g. `0x1000`_`0000` for 24 bits).
    /// `ADD`/`SUB`/`GETC` results are reduced modulo this value.
    pub reg_mask: i64,
}

impl DesmosConfig {
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_mem_size(mut self, mem_size: usize) -> Self {
        self.mem_size = mem_size;
        self
    }

    #[must_use]
    pub fn with_reg_mask(mut self, reg_mask: i64) -> Self {
        self.reg_mask = reg_mask;
        self
    }

    /// Number of memory chunk-lists needed to cover `mem_size` addresses.
    #[must_use]
    pub fn num_mem_chunks(&self) -> usize {
        self.mem_size.div_ceil(self.chunk_size)
    }
}

impl Default for DesmosConfig {
    fn default() -> Self {
        DesmosConfig {
            chunk_size: 16,
            mem_size: 64,
            reg_mask: 0x1000000,
        }
    }
}
