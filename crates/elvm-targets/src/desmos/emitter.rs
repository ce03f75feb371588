//! Assembles a whole program into the Desmos graph-state JSON document (C2):
//! drives the pc-chunk walker, turns its callbacks into per-chunk piecewise
//! functions via `lower`, and wraps everything — initial state, the fixed
//! helper catalogue, the chunk functions, and the ticker — into one
//! `{"version":9,"expressions":{...}}` payload.

use serde_json::{Value as Json, json};

use crate::error::Result;
use crate::ir::{ChunkSink, Inst, Module, walk};

use super::config::DesmosConfig;
use super::expr::{Expr, render_definition};
use super::lower::lower_pc;
use super::runtime;
use super::symbols;

/// Groups the walker's callbacks into `(chunk_id, pc, insts)` structure only
/// — grouping is infallible (`ChunkSink`'s methods have no `Result` to
/// return), so the fallible per-pc lowering happens afterward, in `compile`,
/// where a `?` is available.
#[derive(Default)]
struct Grouper {
    chunks: Vec<Vec<(u32, Vec<Inst>)>>,
    current: Vec<(u32, Vec<Inst>)>,
}

impl ChunkSink for Grouper {
    fn func_prologue(&mut self, _chunk_id: usize) {
        self.current = Vec::new();
    }

    fn func_epilogue(&mut self) {
        self.chunks.push(std::mem::take(&mut self.current));
    }

    fn pc_change(&mut self, pc: u32) {
        self.current.push((pc, Vec::new()));
    }

    fn emit_inst(&mut self, inst: &Inst) {
        self.current
            .last_mut()
            .expect("walk() always calls pc_change before emit_inst")
            .1
            .push(inst.clone());
    }
}

/// Accumulates the `expressions.list` array: every item (folder or
/// expression) draws from the same monotone id counter, and expressions
/// opened after a folder carry that folder's id as `folderId` until the
/// next folder (or the end of the list, for the un-foldered trailing
/// dispatch entry).
struct ListBuilder {
    items: Vec<Json>,
    next_id: u32,
    folder_id: Option<u32>,
}

impl ListBuilder {
    fn new() -> Self {
        ListBuilder { items: Vec::new(), next_id: 1, folder_id: None }
    }

    fn folder(&mut self, title: &str) {
        let id = self.next_id;
        self.next_id += 1;
        self.items
            .push(json!({"id": id.to_string(), "type": "folder", "collapsed": true, "title": title}));
        self.folder_id = Some(id);
    }

    fn expr(&mut self, latex: String) {
        let id = self.next_id;
        self.next_id += 1;
        let mut item = json!({
            "id": id.to_string(),
            "type": "expression",
            "hidden": true,
            "latex": latex,
        });
        if let Some(folder_id) = self.folder_id {
            item["folderId"] = Json::String(folder_id.to_string());
        }
        self.items.push(item);
    }
}

/// Compile `module` into the Desmos graph-state JSON document, pretty-printed.
pub fn compile(module: &Module, cfg: &DesmosConfig) -> Result<String> {
    if module.data.len() > cfg.mem_size {
        tracing::warn!(
            requested = module.data.len(),
            capacity = cfg.mem_size,
            "initial data image exceeds DesmosConfig::mem_size, truncating"
        );
    }

    let mut grouper = Grouper::default();
    let num_chunks = walk(module, cfg.chunk_size, &mut grouper);

    let mut list = ListBuilder::new();

    list.folder("Setup");
    for latex in initial_state(module, cfg) {
        list.expr(latex);
    }

    list.folder("Runtime library");
    for latex in runtime::helper_definitions(cfg) {
        list.expr(latex);
    }

    list.folder("Chunk functions");
    for (chunk_id, pcs) in grouper.chunks.into_iter().enumerate() {
        let mut branches = Vec::new();
        for (pc, insts) in &pcs {
            let insts_ref: Vec<&Inst> = insts.iter().collect();
            branches.extend(lower_pc(cfg, *pc, &insts_ref, pc + 1)?);
        }
        let name = symbols::chunk_fn_symbol(chunk_id);
        let body = Expr::Piecewise(branches, None);
        list.expr(render_definition(&name, &[], &body));
    }

    list.folder("Dispatch");
    list.expr(runtime::update_definition(cfg, num_chunks));

    tracing::debug!(
        "Desmos emission: {num_chunks} chunk function(s), {} expression(s)",
        list.items.len()
    );

    let doc = json!({
        "version": 9,
        "expressions": {
            "ticker": {
                "handlerLatex": format!("{}\\left(\\right)", symbols::UPDATE),
                "open": true,
                "playing": false,
            },
            "list": list.items,
        }
    });

    Ok(serde_json::to_string_pretty(&doc)?)
}

/// The program's starting values: registers at zero, the running flag set,
/// empty I/O lists, and `module.data` scattered across the memory chunks.
fn initial_state(module: &Module, cfg: &DesmosConfig) -> Vec<String> {
    use crate::ir::Register;

    let mut lines = Vec::new();
    lines.push(format!("{}=1", symbols::RUNNING));
    lines.push(format!("{}=0", symbols::IP));
    for reg in Register::ALL {
        lines.push(format!("{}=0", symbols::reg_symbol(reg)));
    }
    lines.push(format!("{}=\\left[\\right]", symbols::STDOUT));
    lines.push(format!("{}=\\left[\\right]", symbols::STDIN));

    for chunk in 0..cfg.num_mem_chunks() {
        let start = chunk * cfg.chunk_size;
        let values: Vec<Expr> = (0..cfg.chunk_size)
            .map(|offset| Expr::num(module.data.get(start + offset).copied().unwrap_or(0)))
            .collect();
        lines.push(format!(
            "{}={}",
            symbols::mem_symbol(chunk),
            Expr::List(values).to_latex()
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Opcode, Register, Value};

    #[test]
    fn compiles_an_empty_program_to_well_formed_json() {
        let module = Module::default();
        let cfg = DesmosConfig::default().with_mem_size(4).with_chunk_size(4);
        let doc = compile(&module, &cfg).unwrap();
        let parsed: Json = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed["version"], 9);
        assert!(parsed["expressions"]["list"].as_array().unwrap().len() > 5);
    }

    #[test]
    fn a_single_exit_program_produces_one_chunk_function() {
        let module = Module::new(vec![], vec![Inst::new(Opcode::Exit, 0)]);
        let cfg = DesmosConfig::default().with_mem_size(4).with_chunk_size(4);
        let doc = compile(&module, &cfg).unwrap();
        assert!(doc.contains("f_{0}"));
        assert!(doc.contains("r\\\\to 0"));
    }

    #[test]
    fn initial_memory_is_scattered_across_chunks() {
        let module = Module::new(vec![1, 2, 3, 4, 5], vec![]);
        let cfg = DesmosConfig::default().with_mem_size(8).with_chunk_size(4);
        let doc = compile(&module, &cfg).unwrap();
        assert!(doc.contains("m_{0}=\\\\left[1,2,3,4\\\\right]"));
        assert!(doc.contains("m_{1}=\\\\left[5,0,0,0\\\\right]"));
    }

    #[test]
    fn mov_then_exit_round_trips_through_the_walker() {
        let module = Module::new(
            vec![],
            vec![
                Inst::new(Opcode::Mov, 0)
                    .with_dst(Register::A)
                    .with_src(Value::Imm(7)),
                Inst::new(Opcode::Exit, 1),
            ],
        );
        let cfg = DesmosConfig::default().with_mem_size(4).with_chunk_size(4);
        let doc = compile(&module, &cfg).unwrap();
        assert!(doc.contains("p_{c}\\\\to 1"));
    }
}
