use super::Inst;

/// A whole IR program: the initial memory image plus the instruction stream.
///
/// The source material represents both as linked lists (`Data`/`Inst::next`);
/// `Vec` is the idiomatic Rust equivalent and is what every backend in this
/// crate actually wants (random access by pc, iteration in source order).
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub data: Vec<i64>,
    pub text: Vec<Inst>,
}

impl Module {
    #[must_use]
    pub fn new(data: Vec<i64>, text: Vec<Inst>) -> Self {
        Module { data, text }
    }

    /// The highest pc value appearing in `text`, or `None` for an empty module.
    #[must_use]
    pub fn max_pc(&self) -> Option<u32> {
        self.text.iter().map(|inst| inst.pc).max()
    }
}
