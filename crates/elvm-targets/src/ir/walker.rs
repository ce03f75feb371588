use super::{Inst, Module};

/// Callbacks a backend implements to be driven by [`walk`].
///
/// `walk` guarantees: for every pc that has at least one instruction,
/// `pc_change` is called exactly once before any `emit_inst` for that pc;
/// pcs are visited in ascending order within a chunk; `func_prologue` and
/// `func_epilogue` bracket each fixed-size chunk of pcs.
pub trait ChunkSink {
    fn func_prologue(&mut self, chunk_id: usize);
    fn func_epilogue(&mut self);
    fn pc_change(&mut self, pc: u32);
    fn emit_inst(&mut self, inst: &Inst);
}

/// Walk `module.text` grouped into fixed-size pc chunks, invoking `sink`'s
/// callbacks in source order. Returns the number of chunks visited, which is
/// `ceil((max_pc + 1) / chunk_size)`, or 0 for an empty module.
pub fn walk(module: &Module, chunk_size: usize, sink: &mut dyn ChunkSink) -> usize {
    assert!(chunk_size > 0, "chunk_size must be positive");

    let Some(max_pc) = module.max_pc() else {
        return 0;
    };
    let num_chunks = (max_pc as usize / chunk_size) + 1;

    // Group instructions by pc up front so each chunk only has to slice a
    // contiguous run; the walker never mutates or reorders the IR.
    let mut by_pc: std::collections::BTreeMap<u32, Vec<&Inst>> = std::collections::BTreeMap::new();
    for inst in &module.text {
        by_pc.entry(inst.pc).or_default().push(inst);
    }

    for chunk_id in 0..num_chunks {
        sink.func_prologue(chunk_id);

        let pc_start = (chunk_id * chunk_size) as u32;
        let pc_end = pc_start + chunk_size as u32;
        for pc in pc_start..pc_end {
            let Some(insts) = by_pc.get(&pc) else {
                continue;
            };
            sink.pc_change(pc);
            for inst in insts {
                sink.emit_inst(inst);
            }
        }

        sink.func_epilogue();
    }

    num_chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Inst, Opcode, Register, Value};

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
    }

    impl ChunkSink for RecordingSink {
        fn func_prologue(&mut self, chunk_id: usize) {
            self.events.push(format!("prologue({chunk_id})"));
        }

        fn func_epilogue(&mut self) {
            self.events.push("epilogue".to_string());
        }

        fn pc_change(&mut self, pc: u32) {
            self.events.push(format!("pc({pc})"));
        }

        fn emit_inst(&mut self, inst: &Inst) {
            self.events.push(format!("inst({:?}@{})", inst.op, inst.pc));
        }
    }

    fn mov(pc: u32, dst: Register, src: i64) -> Inst {
        Inst::new(Opcode::Mov, pc)
            .with_dst(dst)
            .with_src(Value::Imm(src))
    }

    #[test]
    fn empty_module_has_no_chunks() {
        let module = Module::default();
        let mut sink = RecordingSink::default();
        assert_eq!(walk(&module, 16, &mut sink), 0);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn single_chunk_visits_pcs_in_order() {
        let module = Module::new(
            vec![],
            vec![
                mov(0, Register::A, 1),
                mov(0, Register::A, 2),
                mov(1, Register::B, 3),
            ],
        );
        let mut sink = RecordingSink::default();
        let chunks = walk(&module, 16, &mut sink);
        assert_eq!(chunks, 1);
        assert_eq!(
            sink.events,
            vec![
                "prologue(0)",
                "pc(0)",
                "inst(Mov@0)",
                "inst(Mov@0)",
                "pc(1)",
                "inst(Mov@1)",
                "epilogue",
            ]
        );
    }

    #[test]
    fn pc_beyond_first_chunk_starts_a_new_chunk() {
        let module = Module::new(vec![], vec![mov(20, Register::A, 1)]);
        let mut sink = RecordingSink::default();
        let chunks = walk(&module, 16, &mut sink);
        // pcs 0..16 form chunk 0, pc 20 falls in chunk 1 (16..32).
        assert_eq!(chunks, 2);
        assert_eq!(
            sink.events,
            vec!["prologue(0)", "epilogue", "prologue(1)", "pc(20)", "inst(Mov@20)", "epilogue"]
        );
    }

    #[test]
    fn chunk_count_is_ceiling_of_max_pc_plus_one_over_k() {
        let module = Module::new(vec![], vec![mov(15, Register::A, 1)]);
        let mut sink = RecordingSink::default();
        assert_eq!(walk(&module, 16, &mut sink), 1);

        let module = Module::new(vec![], vec![mov(16, Register::A, 1)]);
        let mut sink = RecordingSink::default();
        assert_eq!(walk(&module, 16, &mut sink), 2);
    }
}
