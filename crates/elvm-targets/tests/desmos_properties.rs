//! Property-based checks for the Desmos backend that only need the public
//! `desmos::compile` entry point: expression-id uniqueness/contiguity,
//! JSON well-formedness, and the `append`/`pop` helper semantics (§8,
//! properties 1, 2 and 5).

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::Value as Json;

use elvm_targets::desmos::DesmosConfig;
use elvm_targets::ir::{Inst, Module, Opcode, Register, Value};

fn mov(pc: u32, dst: Register, src: i64) -> Inst {
    Inst::new(Opcode::Mov, pc).with_dst(dst).with_src(Value::Imm(src))
}

fn small_program(n: u32) -> Module {
    let mut text: Vec<Inst> = (0..n).map(|pc| mov(pc, Register::A, i64::from(pc))).collect();
    text.push(Inst::new(Opcode::Exit, n));
    Module::new(vec![], text)
}

fn ids_of(doc: &Json) -> Vec<u32> {
    doc["expressions"]["list"]
        .as_array()
        .expect("list is an array")
        .iter()
        .map(|item| item["id"].as_str().expect("id is a string").parse().unwrap())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Property 1: ids are unique and contiguous from 1..=N for any program
    /// size and chunk configuration.
    #[test]
    fn expression_ids_are_unique_and_contiguous(n in 0u32..40, chunk_size in 1usize..8) {
        let module = small_program(n);
        let cfg = DesmosConfig::default().with_chunk_size(chunk_size).with_mem_size(chunk_size);
        let doc_str = elvm_targets::desmos::compile(&module, &cfg).unwrap();
        let doc: Json = serde_json::from_str(&doc_str).unwrap();

        let ids = ids_of(&doc);
        let unique: HashSet<u32> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), ids.len(), "duplicate ids in {:?}", ids);

        let mut sorted = ids.clone();
        sorted.sort_unstable();
        let expected: Vec<u32> = (1..=ids.len() as u32).collect();
        prop_assert_eq!(sorted, expected);
    }

    /// Property 2: the whole document parses as JSON for any program.
    #[test]
    fn output_is_well_formed_json(n in 0u32..40) {
        let module = small_program(n);
        let cfg = DesmosConfig::default().with_chunk_size(8).with_mem_size(8);
        let doc_str = elvm_targets::desmos::compile(&module, &cfg).unwrap();
        prop_assert!(serde_json::from_str::<Json>(&doc_str).is_ok());
    }
}

#[test]
fn folders_group_expressions_and_carry_their_own_id() {
    let module = small_program(2);
    let cfg = DesmosConfig::default().with_chunk_size(4).with_mem_size(4);
    let doc_str = elvm_targets::desmos::compile(&module, &cfg).unwrap();
    let doc: Json = serde_json::from_str(&doc_str).unwrap();
    let list = doc["expressions"]["list"].as_array().unwrap();

    let folders: Vec<&Json> = list.iter().filter(|item| item["type"] == "folder").collect();
    assert!(!folders.is_empty());
    for folder in &folders {
        assert_eq!(folder["collapsed"], true);
    }

    let expressions: Vec<&Json> = list.iter().filter(|item| item["type"] == "expression").collect();
    assert!(!expressions.is_empty());
    for expr in &expressions {
        assert_eq!(expr["hidden"], true);
        assert!(expr["folderId"].is_string());
    }
}

#[test]
fn ticker_names_the_update_call_and_is_not_playing() {
    let module = Module::default();
    let cfg = DesmosConfig::default().with_chunk_size(4).with_mem_size(4);
    let doc_str = elvm_targets::desmos::compile(&module, &cfg).unwrap();
    let doc: Json = serde_json::from_str(&doc_str).unwrap();
    assert_eq!(doc["expressions"]["ticker"]["handlerLatex"], "u\\left(\\right)");
    assert_eq!(doc["expressions"]["ticker"]["playing"], false);
}

// --- Property 5: append/pop semantics, verified against a pure-Rust model
// of the Desmos `append`/`pop` formulas (no Desmos runtime to execute
// against — see SPEC_FULL.md §9 "No reference interpreter").

fn model_append(l: &[i64], v: i64) -> Vec<i64> {
    let mut out = l.to_vec();
    out.push(v);
    out
}

fn model_pop(l: &[i64]) -> Vec<i64> {
    if l.len() < 2 { Vec::new() } else { l[1..].to_vec() }
}

proptest! {
    /// For any non-empty list and value, popping an appended list is the
    /// same as appending to the popped list — i.e. `append` only ever
    /// touches the tail, `pop` only ever touches the head.
    #[test]
    fn pop_of_append_drops_the_original_head(l in prop::collection::vec(any::<i8>().prop_map(i64::from), 1..20), v in any::<i8>().prop_map(i64::from)) {
        let appended = model_append(&l, v);
        let result = model_pop(&appended);
        let mut expected = l[1..].to_vec();
        expected.push(v);
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn append_then_pop_preserves_length_for_nonempty_lists(l in prop::collection::vec(any::<i8>().prop_map(i64::from), 1..20), v in any::<i8>().prop_map(i64::from)) {
        let appended = model_append(&l, v);
        prop_assert_eq!(appended.len(), l.len() + 1);
        let popped = model_pop(&appended);
        prop_assert_eq!(popped.len(), l.len());
    }
}

#[test]
fn pop_of_singleton_list_is_empty() {
    assert_eq!(model_pop(&[1]), Vec::<i64>::new());
}
