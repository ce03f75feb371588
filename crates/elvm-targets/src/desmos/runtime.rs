//! The fixed catalogue of Desmos helper piecewise functions (C3): list
//! primitives, memory load/store, and the ticker entry point. Everything
//! here is independent of any particular IR program — D1 is the only piece
//! that generates program-specific branches.

use super::config::DesmosConfig;
use super::expr::{Expr, render_definition};
use super::symbols;

/// Render every helper definition that does not depend on the chunk count
/// (`append`, `pop`, `wrap`, `getc`, `check`, `changepc`, `load`, `store`,
/// and the per-memory-chunk `s_c` gates).
#[must_use]
pub fn helper_definitions(cfg: &DesmosConfig) -> Vec<String> {
    let mut defs = Vec::new();

    defs.push(render_definition(
        symbols::APPEND,
        &["l", "i"],
        &append_body(),
    ));
    defs.push(render_definition(symbols::POP, &["l"], &pop_body()));
    defs.push(render_definition(symbols::WRAP, &["i"], &wrap_body(cfg)));
    defs.push(render_definition(symbols::GETC, &[], &getc_body()));
    defs.push(render_definition(symbols::CHECK, &["p", "i"], &check_body()));
    defs.push(render_definition(
        symbols::CHANGEPC,
        &["p"],
        &changepc_body(),
    ));

    let num_chunks = cfg.num_mem_chunks();
    for chunk in 0..num_chunks {
        let name = store_chunk_symbol(chunk);
        defs.push(render_definition(
            &name,
            &["l", "i"],
            &store_chunk_body(cfg, chunk),
        ));
    }
    defs.push(render_definition(
        symbols::STORE,
        &["l", "i"],
        &store_body(cfg),
    ));
    defs.push(render_definition(symbols::LOAD, &["l"], &load_body(cfg)));

    defs
}

/// The `s_c(l,i)` sub-helper's own name for memory chunk `chunk` — one
/// concrete function per chunk, each closing over its own `m_c` list, since
/// Desmos has no way to parameterize *which variable* a function reads.
#[must_use]
pub fn store_chunk_symbol(chunk: usize) -> String {
    format!("{}_{{{chunk}}}", symbols::STORE_CHUNK)
}

/// Render the ticker entry point `u()`, which dispatches to the per-pc-chunk
/// function selected by `floor(PC/K)`. Needs `num_chunks` because the
/// dispatch table can only be built once the program's pc range is known.
#[must_use]
pub fn update_definition(cfg: &DesmosConfig, num_chunks: usize) -> String {
    let branches = (0..num_chunks)
        .map(|c| {
            let cond = floor_div(pc(), Expr::num(cfg.chunk_size as i64)).eq(Expr::num(c as i64));
            let call = Expr::Call(super::symbols::chunk_fn_symbol(c), Vec::new());
            (vec![cond], call)
        })
        .collect();
    let body = Expr::Piecewise(
        vec![(vec![running().eq(Expr::num(1))], Expr::Piecewise(branches, None))],
        None,
    );
    render_definition(symbols::UPDATE, &[], &body)
}

fn append_body() -> Expr {
    let l = Expr::ident("l");
    let n = Expr::ident("n");
    let len = length(Expr::ident("l"));
    Expr::Map {
        var: "n".to_string(),
        to: Box::new(len.clone().add(Expr::num(1))),
        body: Box::new(Expr::Piecewise(
            vec![(vec![n.clone().lt(len.add(Expr::num(1)))], l.index(n))],
            Some(Box::new(Expr::ident("i"))),
        )),
    }
}

fn pop_body() -> Expr {
    let l = Expr::ident("l");
    let len = length(Expr::ident("l"));
    let tail = Expr::Map {
        var: "n".to_string(),
        to: Box::new(len.clone().sub(Expr::num(1))),
        body: Box::new(l.index(Expr::ident("n").add(Expr::num(1)))),
    };
    Expr::Piecewise(
        vec![(vec![len.lt(Expr::num(2))], Expr::List(Vec::new()))],
        Some(Box::new(tail)),
    )
}

fn wrap_body(cfg: &DesmosConfig) -> Expr {
    Expr::Builtin("mod".to_string(), vec![Expr::ident("i"), Expr::num(cfg.reg_mask)])
}

fn getc_body() -> Expr {
    let stdin = Expr::ident(symbols::STDIN);
    Expr::Piecewise(
        vec![(vec![length(stdin.clone()).eq(Expr::num(0))], Expr::num(0))],
        Some(Box::new(stdin.index(Expr::num(1)))),
    )
}

fn check_body() -> Expr {
    let cond = vec![pc().eq(Expr::ident("p")), ip().eq(Expr::ident("i"))];
    Expr::Piecewise(vec![(cond, Expr::num(1))], None)
}

/// `changepc(p)` lands the machine at pc `p`. If `p` is the pc we're already
/// at (a single-instruction self-loop jumping to itself), the pc-change is a
/// no-op, so `IP` only advances by one, same as a non-pc-changing
/// instruction's implicit `inc_ip`; otherwise `IP` resets to 0. It is only
/// ever called once, on a group's last micro-step; earlier micro-steps bump
/// `IP` directly instead of going through this helper, since at that point
/// the pc hasn't changed yet.
fn changepc_body() -> Expr {
    let ip_next = Expr::Piecewise(
        vec![(vec![pc().eq(Expr::ident("p"))], ip().add(Expr::num(1)))],
        Some(Box::new(Expr::num(0))),
    );
    Expr::Action(vec![
        (symbols::reg_symbol(crate::ir::Register::Pc).to_string(), Expr::ident("p")),
        (symbols::IP.to_string(), ip_next),
    ])
}

fn load_body(cfg: &DesmosConfig) -> Expr {
    let addr = wrapped_addr(cfg, Expr::ident("l"));
    let offset = modulo(addr.clone(), Expr::num(cfg.chunk_size as i64)).add(Expr::num(1));
    let chunk_idx = floor_div(addr, Expr::num(cfg.chunk_size as i64));

    let num_chunks = cfg.num_mem_chunks();
    let mut branches = Vec::new();
    for c in 0..num_chunks.saturating_sub(1) {
        let cond = chunk_idx.clone().eq(Expr::num(c as i64));
        let value = Expr::ident(symbols::mem_symbol(c)).index(offset.clone());
        branches.push((vec![cond], value));
    }
    let last = num_chunks.saturating_sub(1);
    let else_ = Expr::ident(symbols::mem_symbol(last)).index(offset);
    Expr::Piecewise(branches, Some(Box::new(else_)))
}

fn store_chunk_body(cfg: &DesmosConfig, chunk: usize) -> Expr {
    let addr = wrapped_addr(cfg, Expr::ident("l"));
    let chunk_idx = floor_div(addr.clone(), Expr::num(cfg.chunk_size as i64));
    let offset = modulo(addr, Expr::num(cfg.chunk_size as i64)).add(Expr::num(1));

    let mem = Expr::ident(symbols::mem_symbol(chunk));
    let replaced = Expr::Map {
        var: "n".to_string(),
        to: Box::new(length(mem.clone())),
        body: Box::new(Expr::Piecewise(
            vec![(vec![Expr::ident("n").eq(offset)], Expr::ident("i"))],
            Some(Box::new(mem.clone().index(Expr::ident("n")))),
        )),
    };

    Expr::Piecewise(
        vec![(vec![chunk_idx.eq(Expr::num(chunk as i64))], replaced)],
        Some(Box::new(mem)),
    )
}

fn store_body(cfg: &DesmosConfig) -> Expr {
    let assignments = (0..cfg.num_mem_chunks())
        .map(|c| {
            let call = Expr::Call(
                store_chunk_symbol(c),
                vec![Expr::ident("l"), Expr::ident("i")],
            );
            (symbols::mem_symbol(c), call)
        })
        .collect();
    Expr::Action(assignments)
}

fn wrapped_addr(cfg: &DesmosConfig, addr: Expr) -> Expr {
    let total = (cfg.chunk_size * cfg.num_mem_chunks()) as i64;
    modulo(addr, Expr::num(total))
}

fn modulo(a: Expr, b: Expr) -> Expr {
    Expr::Builtin("mod".to_string(), vec![a, b])
}

fn floor_div(a: Expr, b: Expr) -> Expr {
    Expr::Builtin("floor".to_string(), vec![Expr::Frac(Box::new(a), Box::new(b))])
}

fn length(l: Expr) -> Expr {
    Expr::Builtin("length".to_string(), vec![l])
}

fn pc() -> Expr {
    Expr::ident(symbols::reg_symbol(crate::ir::Register::Pc))
}

fn ip() -> Expr {
    Expr::ident(symbols::IP)
}

fn running() -> Expr {
    Expr::ident(symbols::RUNNING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_definitions_cover_the_fixed_catalogue() {
        let cfg = DesmosConfig::default().with_mem_size(4).with_chunk_size(4);
        let defs = helper_definitions(&cfg);
        // append, pop, wrap, getc, check, changepc, 1 store-chunk gate (4/4=1 chunk), store, load
        assert_eq!(defs.len(), 9);
        assert!(defs[0].starts_with("a_{ppend}\\left(l,i\\right)="));
    }

    #[test]
    fn check_body_uses_comma_joined_conjunction() {
        let latex = render_definition(symbols::CHECK, &["p", "i"], &check_body());
        assert_eq!(
            latex,
            "c_{heck}\\left(p,i\\right)=\\left\\{p_{c}=p,i_{p}=i:1\\right\\}"
        );
    }

    #[test]
    fn changepc_resets_ip_unless_it_is_a_self_loop() {
        let latex = render_definition(symbols::CHANGEPC, &["p"], &changepc_body());
        assert!(latex.contains("p_{c}\\to p"));
        assert!(latex.contains("p_{c}=p:\\left(i_{p}+1\\right)"));
        assert!(latex.contains(",0\\right\\}"));
    }

    #[test]
    fn update_definition_dispatches_over_chunks() {
        let cfg = DesmosConfig::default();
        let latex = update_definition(&cfg, 2);
        assert!(latex.starts_with("u\\left(\\right)="));
        assert!(latex.contains("f_{0}\\left(\\right)"));
        assert!(latex.contains("f_{1}\\left(\\right)"));
    }
}
