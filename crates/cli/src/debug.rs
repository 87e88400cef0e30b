//! Terminal rendering for `-d` debug mode: clears the screen and redraws
//! the board (with each maiden's position marked) and, when requested,
//! every maiden's stack, once per tick.

use std::io::{stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use labyrinth_runtime::{DebugOptions, DebugRenderer, Grid, Maiden};

#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        TerminalRenderer
    }
}

impl DebugRenderer for TerminalRenderer {
    fn render(&mut self, grid: &Grid, maidens: &[Maiden], options: &DebugOptions) {
        let mut out = stdout();
        let _ = queue!(out, Clear(ClearType::All), MoveTo(0, 0));

        if options.print_board {
            render_board(&mut out, grid, maidens);
        }
        if options.print_stacks {
            render_stacks(&mut out, maidens);
        }

        let _ = out.flush();
    }
}

fn render_board(out: &mut impl Write, grid: &Grid, maidens: &[Maiden]) {
    for y in 0..grid.rows() as i64 {
        let mut line = String::with_capacity(grid.width());
        for x in 0..grid.width() as i64 {
            if let Some(m) = maidens.iter().find(|m| m.position.x == x && m.position.y == y) {
                line.push(maiden_glyph(m));
            } else {
                let c = grid.read(x, y);
                line.push(if c == '\0' { ' ' } else { c });
            }
        }
        let _ = queue!(out, MoveTo(0, y as u16), Print(line));
    }
}

/// An arrow pointing the maiden's current heading, so several maidens on
/// the same board remain visually distinguishable from the raw source.
fn maiden_glyph(m: &Maiden) -> char {
    match (m.velocity.x.signum(), m.velocity.y.signum()) {
        (1, 0) => '>',
        (-1, 0) => '<',
        (0, -1) => '^',
        (0, 1) => 'v',
        _ => '*',
    }
}

fn render_stacks(out: &mut impl Write, maidens: &[Maiden]) {
    for (i, m) in maidens.iter().enumerate() {
        let mut repr = String::new();
        for (j, v) in m.stack_items().iter().enumerate() {
            if j > 0 {
                repr.push_str(", ");
            }
            v.dump(&mut repr);
        }
        let _ = queue!(
            out,
            Print(format!(
                "\r\nmaiden {i} @ ({}, {}): [{repr}]",
                m.position.x, m.position.y
            ))
        );
    }
    let _ = queue!(out, Print("\r\n"));
}
