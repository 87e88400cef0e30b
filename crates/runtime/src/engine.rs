//! The session loop: owns the grid and the maiden set, drives ticks,
//! and turns dispatcher effects (fork, fire, dump) into maiden-list
//! mutations.

use std::io::Write;
use std::time::Duration;

use labyrinth_core::Value;

use crate::dispatcher::{dispatch, Effect, Status};
use crate::error::RuntimeError;
use crate::grid::Grid;
use crate::maiden::Maiden;
use crate::random::Random;

/// Debug-mode flags, per spec.md §3's Engine/Session options.
#[derive(Debug, Clone, Copy)]
pub struct DebugOptions {
    pub enabled: bool,
    pub print_board: bool,
    pub print_stacks: bool,
    pub pacing_ms: u64,
}

impl Default for DebugOptions {
    fn default() -> Self {
        DebugOptions {
            enabled: false,
            print_board: false,
            print_stacks: false,
            pacing_ms: 120,
        }
    }
}

/// External collaborator for rendering a debug frame. The `Engine` calls
/// through this narrow trait rather than knowing anything about terminals
/// — `labyrinth-cli` supplies the real `crossterm` implementation; a
/// no-op `NullRenderer` is used whenever debug mode is off (and in tests).
pub trait DebugRenderer {
    fn render(&mut self, grid: &Grid, maidens: &[Maiden], options: &DebugOptions);
}

/// The renderer used whenever debug mode is disabled.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl DebugRenderer for NullRenderer {
    fn render(&mut self, _grid: &Grid, _maidens: &[Maiden], _options: &DebugOptions) {}
}

/// Owns the grid and the maiden set, and drives the step loop.
/// `maidens[0]` is the original maiden; its termination ends the program.
pub struct Engine {
    grid: Grid,
    maidens: Vec<Maiden>,
    rng: Random,
    pub debug: DebugOptions,
}

impl Engine {
    /// Builds the engine with one initial maiden, seeded with `seeds`
    /// pushed left-to-right, and rewound one step so the first `move`
    /// lands it on the grid's origin cell.
    pub fn new(grid: Grid, seeds: &[i64], rng: Random) -> Self {
        let mut initial = Maiden::initial();
        for &seed in seeds {
            initial.push(Value::Int(seed));
        }
        initial.unstep();
        tracing::debug!(rows = grid.rows(), cols = grid.width(), seeds = seeds.len(), "engine initialized");
        Engine {
            grid,
            maidens: vec![initial],
            rng,
            debug: DebugOptions::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn maidens(&self) -> &[Maiden] {
        &self.maidens
    }

    /// Drives ticks until the original maiden exits (or a runtime error
    /// aborts the whole run). Returns the process exit code.
    pub fn run(
        &mut self,
        stdout: &mut impl Write,
        renderer: &mut dyn DebugRenderer,
    ) -> Result<i32, RuntimeError> {
        loop {
            // Newly spawned maidens wait for the next tick: snapshot the
            // length before this pass starts.
            let mut tick_len = self.maidens.len();
            let mut idx = 0usize;
            while idx < tick_len && idx < self.maidens.len() {
                if self.maidens[idx].steps_ahead > 0 {
                    self.maidens[idx].steps_ahead -= 1;
                    idx += 1;
                    continue;
                }

                let _ = self.maidens[idx].move_and_read(&self.grid);
                let (status, effect) =
                    dispatch(&mut self.maidens[idx], &self.grid, &mut self.rng, stdout)?;

                match effect {
                    Effect::None => {}
                    Effect::Fork(child) => {
                        tracing::debug!(
                            x = child.position.x,
                            y = child.position.y,
                            vx = child.velocity.x,
                            vy = child.velocity.y,
                            total = self.maidens.len() + 1,
                            "maiden forked"
                        );
                        self.maidens.push(child);
                    }
                    Effect::FireIndex(i) => {
                        if let Some(removed) = self.fire_index(i) {
                            if removed <= idx {
                                idx = idx.saturating_sub(1);
                            }
                            if removed < tick_len {
                                tick_len -= 1;
                            }
                        }
                    }
                    Effect::FireCount(n) => {
                        let removed = self.fire_count(n);
                        tick_len = tick_len.saturating_sub(removed).min(self.maidens.len());
                    }
                    Effect::Dump { then_exit } => {
                        self.dump(&mut std::io::stderr());
                        if then_exit {
                            return Ok(0);
                        }
                    }
                }

                match status {
                    Status::Continue => {}
                    Status::Exit(code) => {
                        if idx == 0 {
                            tracing::info!(code, "program exiting");
                            return Ok(code);
                        }
                        tracing::debug!(idx, remaining = self.maidens.len() - 1, "maiden reaped");
                        self.maidens.swap_remove(idx);
                        tick_len -= 1;
                        idx = idx.saturating_sub(1);
                    }
                }

                idx += 1;
            }

            if self.debug.enabled {
                renderer.render(&self.grid, &self.maidens, &self.debug);
                std::thread::sleep(Duration::from_millis(self.debug.pacing_ms));
            }
        }
    }

    /// `F`: 1-based index among the non-original maidens (`maidens[1..]`,
    /// which is exactly `maidens[i]` in absolute terms). Out-of-range is
    /// silently ignored — firing something that doesn't exist has no
    /// effect, the same way reaping an already-gone maiden would be a
    /// no-op. Returns the absolute index removed, if any.
    fn fire_index(&mut self, i: i64) -> Option<usize> {
        if i < 1 {
            return None;
        }
        let target = i as usize;
        if target == 0 || target >= self.maidens.len() {
            return None;
        }
        tracing::debug!(target, "maiden fired by index");
        self.maidens.swap_remove(target);
        Some(target)
    }

    /// `f`: reaps the last `n` non-original maidens (from the end of the
    /// list), clamped to however many non-original maidens actually
    /// exist. Returns how many were removed.
    fn fire_count(&mut self, n: i64) -> usize {
        if n <= 0 {
            return 0;
        }
        let available = self.maidens.len().saturating_sub(1);
        let count = (n as usize).min(available);
        if count > 0 {
            tracing::debug!(count, requested = n, "maidens fired by count");
        }
        for _ in 0..count {
            self.maidens.pop();
        }
        count
    }

    /// `D`/`d`: reproduces the reference engine's `dump()` — one
    /// `Handmaiden(position=(x, y), velocity=(x, y), stack=[...])` line
    /// per maiden, newline-terminated, flushed.
    fn dump(&self, out: &mut impl Write) {
        for maiden in &self.maidens {
            let mut stack_repr = String::new();
            stack_repr.push('[');
            for (i, v) in maiden.stack_items().iter().enumerate() {
                if i > 0 {
                    stack_repr.push_str(", ");
                }
                v.dump(&mut stack_repr);
            }
            stack_repr.push(']');
            let _ = writeln!(
                out,
                "Handmaiden(position=({}, {}), velocity=({}, {}), stack={})",
                maiden.position.x,
                maiden.position.y,
                maiden.velocity.x,
                maiden.velocity.y,
                stack_repr
            );
        }
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_program(src: &str, seeds: &[i64]) -> (i32, String) {
        let grid = Grid::load(src);
        let mut engine = Engine::new(grid, seeds, Random::seeded(1));
        let mut out = Vec::new();
        let code = engine
            .run(&mut out, &mut NullRenderer)
            .expect("program should not error");
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn push_and_quit_is_silent() {
        let (code, out) = run_program("9Q", &[]);
        assert_eq!(code, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn pop_n_and_quit_sets_exit_code() {
        let (code, _) = run_program("5q", &[]);
        assert_eq!(code, 5);
    }

    #[test]
    fn string_literal_then_print() {
        let (code, out) = run_program("\"ab\"PQ", &[]);
        assert_eq!(code, 0);
        assert_eq!(out, "ab\n");
    }

    #[test]
    fn dup_add_dump_without_newline() {
        let (code, out) = run_program("12.+nQ", &[]);
        assert_eq!(code, 0);
        assert_eq!(out, "24");
    }

    #[test]
    fn original_maidens_quit_ends_program_before_later_indexed_maidens_run() {
        // H forks a maiden heading up (off the single-row grid — fatal if
        // it ever moved). The original reaches `Q` on the very next tick;
        // since index 0 is dispatched before index 1 within a tick, the
        // engine returns as soon as the original quits, and the forked
        // maiden never gets a turn that would have errored.
        let (code, _) = run_program("HQ", &[]);
        assert_eq!(code, 0);
    }

    #[test]
    fn forked_maiden_survives_later_ticks_once_given_a_safe_heading() {
        // `h` forks rightward (velocity rotated right of RIGHT is DOWN);
        // row 1 gives it a harmless `-` to land on so it can coexist with
        // the original across several ticks without erroring.
        let grid = Grid::load("h-Q\n-");
        let mut engine = Engine::new(grid, &[], Random::seeded(1));
        let mut out = Vec::new();
        let code = engine.run(&mut out, &mut NullRenderer).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn seeds_are_pushed_left_to_right() {
        // with seeds [1, 2], stack is [1, 2] bottom-to-top; `_` computes
        // args[1] - args[0] = 1 - 2 = -1.
        let (code, out) = run_program("_nQ", &[1, 2]);
        assert_eq!(code, 0);
        assert_eq!(out, "-1");
    }

    #[test]
    fn fire_count_reaps_from_the_end_and_clamps() {
        let mut engine = Engine::new(Grid::load("Q"), &[], Random::seeded(1));
        engine.maidens.push(Maiden::initial());
        engine.maidens.push(Maiden::initial());
        assert_eq!(engine.fire_count(10), 2);
        assert_eq!(engine.maidens.len(), 1);
    }

    #[test]
    fn fire_index_is_one_based_among_non_original_maidens() {
        let mut engine = Engine::new(Grid::load("Q"), &[], Random::seeded(1));
        engine.maidens.push(Maiden::initial());
        engine.maidens.push(Maiden::initial());
        assert_eq!(engine.maidens.len(), 3);
        assert_eq!(engine.fire_index(2), Some(2));
        assert_eq!(engine.maidens.len(), 2);
    }
}
