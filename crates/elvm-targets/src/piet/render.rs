//! Piet image renderer (P3): assigns a color sequence to the opcode stream
//! and writes a binary PPM.
//!
//! Piet opcodes aren't colors, they're *transitions* between two adjacent
//! codels' colors. This module tracks one running "current color" threaded
//! through an initialization strip and then every pc-block in turn, so that
//! decoding the image by walking adjacent codels left-to-right reproduces
//! exactly the opcode stream this crate generated.

use crate::error::Result;

use super::lower::Block;
use super::opcode::PietOp;

pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);
pub const WHITE: Rgb = (255, 255, 255);

/// The 18 standard Piet hue/lightness colors, ordered `hue * 3 + lightness`
/// (lightness: light=0, normal=1, dark=2; hue: red, yellow, green, cyan,
/// blue, magenta), matching the color-transition formula below.
const PALETTE: [Rgb; 18] = [
    (255, 192, 192),
    (255, 0, 0),
    (192, 0, 0),
    (255, 255, 192),
    (255, 255, 0),
    (192, 192, 0),
    (192, 255, 192),
    (0, 255, 0),
    (0, 192, 0),
    (192, 255, 255),
    (0, 255, 255),
    (0, 192, 192),
    (192, 192, 255),
    (0, 0, 255),
    (0, 0, 192),
    (255, 192, 255),
    (255, 0, 255),
    (192, 0, 192),
];

#[must_use]
pub fn color_rgb(c: u8) -> Rgb {
    PALETTE[usize::from(c % 18)]
}

/// Maps a real Piet command to its 0-indexed command code (the table
/// position *after* the reserved no-op at hue-step 0/lightness-step 0).
/// `Jmp`/`Exit` have no command code; they're renderer directives.
#[must_use]
fn op_code(op: PietOp) -> Option<u8> {
    match op {
        PietOp::Push(_) => Some(0),
        PietOp::Pop => Some(1),
        PietOp::Add => Some(2),
        PietOp::Sub => Some(3),
        PietOp::Mul => Some(4),
        PietOp::Div => Some(5),
        PietOp::Mod => Some(6),
        PietOp::Not => Some(7),
        PietOp::Gt => Some(8),
        PietOp::Ptr => Some(9),
        PietOp::Switch => Some(10),
        PietOp::Dup => Some(11),
        PietOp::Roll => Some(12),
        PietOp::InNum => Some(13),
        PietOp::InChar => Some(14),
        PietOp::OutNum => Some(15),
        PietOp::OutChar => Some(16),
        PietOp::Jmp | PietOp::Exit => None,
    }
}

/// The color a codel transitions to when `op` (0-indexed per [`op_code`])
/// follows a codel of color `c`.
#[must_use]
pub fn next_color(c: u8, op: u8) -> u8 {
    let o = i32::from(op) + 1;
    let light = (i32::from(c) % 3 + o % 3) % 3;
    let hue = (i32::from(c) / 3 + o / 3) % 6;
    u8::try_from(hue * 3 + light).expect("hue*3+light is always in 0..18")
}

/// A same-colored codel rectangle — one Piet "block" — occupying `width`
/// columns by `height` rows. `Push` is the only op whose codel is taller
/// than 1 row (`height` encodes its pushed magnitude, painted as a vertical
/// stripe in a single column, matching how a real Piet interpreter reads a
/// push's magnitude off the block's pixel count); the `EXIT` trap is the
/// only one wider than 1 column. Every other real op is a single codel.
struct Run {
    color: Rgb,
    width: usize,
    height: usize,
}

/// The repeating dispatch-ladder pattern painted down the right border
/// column: `PUSH, SUB, DUP, NOT, PTR`, cycling.
const LADDER: [PietOp; 5] = [PietOp::Push(1), PietOp::Sub, PietOp::Dup, PietOp::Not, PietOp::Ptr];

const BAND_HEIGHT: usize = 7;
const MARGIN: usize = 20;

struct Renderer {
    color: u8,
}

impl Renderer {
    fn new() -> Self {
        Renderer { color: 0 }
    }

    /// Renders one block's ops into same-colored runs, threading `self.color`
    /// across calls so every codel boundary matches a real transition.
    fn runs_for(&mut self, ops: &[PietOp]) -> Vec<Run> {
        let mut runs = Vec::new();
        for &op in ops {
            match op {
                PietOp::Exit => runs.push(Run { color: BLACK, width: 3, height: 1 }),
                PietOp::Jmp => {}
                PietOp::Push(n) => {
                    let code = op_code(op).expect("push has a command code");
                    self.color = next_color(self.color, code);
                    runs.push(Run {
                        color: color_rgb(self.color),
                        width: 1,
                        height: usize::try_from(n).unwrap_or(1).max(1),
                    });
                }
                other => {
                    let code = op_code(other).expect("only Jmp/Exit lack a command code");
                    self.color = next_color(self.color, code);
                    runs.push(Run { color: color_rgb(self.color), width: 1, height: 1 });
                }
            }
        }
        runs
    }
}

/// Renders `blocks` (one per pc, in ascending pc order — see
/// [`super::lower::lower_blocks`]) to a binary P6 PPM image. An empty
/// `blocks` slice still renders a valid (single-row) image of just the
/// initialization header.
pub fn render(blocks: &[Block]) -> Result<Vec<u8>> {
    let mut renderer = Renderer::new();
    let init_runs = renderer.runs_for(&[PietOp::Push(1), PietOp::Not]); // seed pc = 0

    let block_runs: Vec<Vec<Run>> = blocks.iter().map(|b| renderer.runs_for(&b.ops)).collect();

    // A block's footprint is sized by its real-opcode count, not its pushed
    // magnitudes (those grow the block's *height*, not its width) or its
    // `Jmp`/`Exit` pseudo-ops (those are renderer directives, not codels the
    // dispatcher has to make room for sideways). The 20px margin absorbs the
    // per-block overhead (the dispatch `Pop`, the `EXIT` trap's extra
    // columns) the same way it does in the reference renderer this is
    // ported from.
    let longest: usize = blocks
        .iter()
        .map(|b| real_op_count(&b.ops))
        .max()
        .unwrap_or(0);

    let width = longest + MARGIN;
    let height = BAND_HEIGHT * block_runs.len().max(1) + MARGIN;

    let mut canvas = vec![vec![WHITE; width]; height];

    paint_ladder(&mut canvas, width, height);
    paint_runs(&mut canvas, &init_runs, 5, width - MARGIN / 2);

    for (i, runs) in block_runs.iter().enumerate() {
        let y = MARGIN / 2 + i * BAND_HEIGHT;
        paint_runs(&mut canvas, runs, y, width - MARGIN / 2);
    }

    tracing::debug!("Piet render: {}x{} image, {} pc-block(s)", width, height, blocks.len());

    Ok(to_ppm(&canvas, width, height))
}

/// Number of ops in `ops` that are real Piet opcodes (have a command code),
/// excluding the `Jmp`/`Exit` renderer directives.
fn real_op_count(ops: &[PietOp]) -> usize {
    ops.iter().filter(|&&op| op_code(op).is_some()).count()
}

/// Paints `runs` right-to-left, each run's right edge starting just left of
/// wherever the previous run left off (starting at `right_x`, just left of
/// the dispatcher's hand-off column). A run's rectangle is anchored with
/// its top-left corner at `(x - width, y)`: non-`Push` runs are 1 column
/// wide and paint only row `y`; a `Push` run is 1 column wide but `height`
/// rows tall, painting straight down from `y` (the magnitude the
/// interpreter reads back out of the block); the `EXIT` trap run is several
/// columns wide but 1 row tall.
fn paint_runs(canvas: &mut [Vec<Rgb>], runs: &[Run], y: usize, right_x: usize) {
    let mut x = right_x;
    for run in runs {
        if x < run.width {
            return;
        }
        x -= run.width;
        for dy in 0..run.height {
            for dx in 0..run.width {
                canvas[y + dy][x + dx] = run.color;
            }
        }
    }
}

fn paint_ladder(canvas: &mut [Vec<Rgb>], width: usize, height: usize) {
    if width == 0 {
        return;
    }
    let x = width - 1;
    let mut color = 0u8;
    for y in 0..height {
        let op = LADDER[y % LADDER.len()];
        let code = op_code(op).expect("ladder ops all have command codes");
        color = next_color(color, code);
        canvas[y][x] = color_rgb(color);
    }
}

fn to_ppm(canvas: &[Vec<Rgb>], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(15 + width * height * 3);
    out.extend_from_slice(b"P6\n");
    out.extend_from_slice(format!("{width} {height}\n").as_bytes());
    out.extend_from_slice(b"255\n");
    for row in canvas {
        for &(r, g, b) in row {
            out.push(r);
            out.push(g);
            out.push(b);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Inst, Opcode};
    use crate::piet::config::PietConfig;
    use crate::piet::lower::lower_blocks;

    #[test]
    fn palette_has_eighteen_distinct_colors() {
        let unique: std::collections::HashSet<_> = PALETTE.iter().copied().collect();
        assert_eq!(unique.len(), 18);
    }

    #[test]
    fn next_color_stays_in_range() {
        for c in 0..18u8 {
            for op in 0..17u8 {
                assert!(next_color(c, op) < 18);
            }
        }
    }

    #[test]
    fn same_color_pair_decodes_back_to_the_op_that_produced_it() {
        // Property 7, exercised directly against the transition formula:
        // for any starting color and op, applying the formula and then
        // searching for the op that explains (c, next) recovers the op.
        for c in 0..18u8 {
            for op in 0..17u8 {
                let next = next_color(c, op);
                let recovered = (0..17u8).find(|&candidate| next_color(c, candidate) == next);
                assert_eq!(recovered, Some(op), "c={c} op={op}");
            }
        }
    }

    #[test]
    fn ppm_starts_with_p6_header_and_matches_byte_count() {
        let inst = Inst::new(Opcode::Exit, 0);
        let ops = lower_blocks(&PietConfig::default(), &[(0, vec![inst])]).unwrap();
        let bytes = render(&ops).unwrap();
        assert!(bytes.starts_with(b"P6\n"));

        let header_end = bytes.iter().position(|&b| b == b'\n').unwrap();
        let rest = &bytes[header_end + 1..];
        let dims_end = rest.iter().position(|&b| b == b'\n').unwrap();
        let dims = std::str::from_utf8(&rest[..dims_end]).unwrap();
        let mut parts = dims.split(' ');
        let w: usize = parts.next().unwrap().parse().unwrap();
        let h: usize = parts.next().unwrap().parse().unwrap();

        let maxval_start = header_end + 1 + dims_end + 1;
        let maxval_end = bytes[maxval_start..].iter().position(|&b| b == b'\n').unwrap();
        let pixel_data_start = maxval_start + maxval_end + 1;

        assert_eq!(bytes.len() - pixel_data_start, w * h * 3);
    }

    #[test]
    fn exit_block_paints_a_black_trap() {
        let inst = Inst::new(Opcode::Exit, 0);
        let blocks = lower_blocks(&PietConfig::default(), &[(0, vec![inst])]).unwrap();
        let bytes = render(&blocks).unwrap();
        let black_pixel = [0u8, 0, 0];
        assert!(bytes.windows(3).any(|w| w == black_pixel));
    }
}
