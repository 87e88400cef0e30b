//! Decodes a function character, pops its arity, and runs its effect.
//!
//! Binary operators follow the source's argument order: `args[0]` is
//! whatever was on top of the stack (popped first, i.e. pushed last),
//! `args[1]` is the next one down. `a + b` on the grid (push `a`, push
//! `b`, then `+`) pops `args[0] = b`, `args[1] = a`, and computes
//! `args[1] OP args[0]` — so `-`/`/`/`%`/`l`/`g`/`c` read in the order
//! the operands were written, not stack order.

use std::io::Write;

use labyrinth_core::Value;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::grid::Grid;
use crate::maiden::Maiden;
use crate::random::Random;

/// What a dispatch resolved to, after a single instruction ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Continue,
    Exit(i32),
}

/// Work a dispatch wants done that only the `Engine` can do, because it
/// touches the maiden set or the whole program's state rather than just
/// the dispatching maiden.
#[derive(Debug)]
pub enum Effect {
    None,
    /// A new maiden to append to the engine's maiden list (`H`/`h`).
    Fork(Maiden),
    /// Reap the non-original maiden at this 1-based index (`F`).
    FireIndex(i64),
    /// Reap the last `n` non-original maidens (`f`).
    FireCount(i64),
    /// Dump full engine state to stderr; `true` means exit 0 afterward
    /// (`D`), `false` means continue (`d`).
    Dump { then_exit: bool },
}

/// The arity of each recognized function character, per the external
/// interface table. `None` means the character is not a recognized
/// instruction (includes any character outside this table, and the NUL
/// sentinel read when a maiden runs off the grid).
pub fn arity(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(0),
        '"' | '[' | ']' => Some(0),
        '.' | ':' => Some(0),
        ',' => Some(1),
        ';' => Some(0),
        '#' => Some(1),
        '@' => Some(1),
        '$' => Some(0),
        'C' => Some(0),
        '-' | '|' => Some(0),
        '>' | '<' | '^' | 'v' => Some(0),
        '{' | '}' => Some(0),
        'J' => Some(0),
        'j' => Some(1),
        'z' => Some(1),
        'r' | 'R' => Some(0),
        '?' | 'I' | 'T' => Some(1),
        'K' | 'k' => Some(2),
        'H' | 'h' => Some(0),
        'F' | 'f' => Some(1),
        '+' | '_' | '*' | '/' | '%' => Some(2),
        'X' | 'x' => Some(1),
        '=' | 'l' | 'g' | 'c' => Some(2),
        '!' => Some(1),
        'A' | 'a' | 's' | 'i' => Some(1),
        'L' => Some(1),
        'G' => Some(3),
        'S' => Some(4),
        'P' | 'p' | 'N' | 'n' => Some(1),
        'D' | 'd' | 'Q' => Some(0),
        'q' => Some(1),
        'U' => Some(0),
        _ => None,
    }
}

fn err(maiden: &Maiden, instruction: char, kind: RuntimeErrorKind) -> RuntimeError {
    RuntimeError::new(maiden.position, instruction, kind)
}

fn require_int(
    maiden: &Maiden,
    instruction: char,
    v: &Value,
) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Arr(_) => Err(err(
            maiden,
            instruction,
            RuntimeErrorKind::TypeError(labyrinth_core::ValueError::NotInt),
        )),
    }
}

/// Runs the instruction at the maiden's current cell. `stdout` receives
/// `P`/`p`/`N`/`n` output; `stderr` receives `D`/`d` dumps.
#[allow(clippy::too_many_lines)]
pub fn dispatch(
    maiden: &mut Maiden,
    grid: &Grid,
    rng: &mut Random,
    stdout: &mut impl Write,
) -> Result<(Status, Effect), RuntimeError> {
    let c = grid.read(maiden.position.x, maiden.position.y);
    if c.is_ascii_digit() {
        maiden.scan_int_literal(grid);
        return Ok((Status::Continue, Effect::None));
    }
    if c == '"' {
        maiden.scan_string_literal(grid)?;
        return Ok((Status::Continue, Effect::None));
    }

    let Some(a) = arity(c) else {
        return Err(err(maiden, c, RuntimeErrorKind::UnknownInstruction));
    };
    let mut args = Vec::with_capacity(a as usize);
    for _ in 0..a {
        args.push(maiden.pop(maiden.position, c)?);
    }

    let mut effect = Effect::None;
    let status = match c {
        '.' => {
            let top = maiden.nth(1, maiden.position, c)?;
            maiden.push(top);
            Status::Continue
        }
        ':' => {
            let second = maiden.nth(2, maiden.position, c)?;
            maiden.push(second);
            Status::Continue
        }
        '#' => {
            let n = require_int(maiden, c, &args[0])?;
            maiden.dupn(n, maiden.position, c)?;
            Status::Continue
        }
        ',' => Status::Continue, // pop already discarded args[0]
        ';' => {
            maiden.popn(2, maiden.position, c)?;
            Status::Continue
        }
        '@' => {
            let n = require_int(maiden, c, &args[0])?;
            maiden.popn(n, maiden.position, c)?;
            Status::Continue
        }
        '$' => {
            let second = maiden.popn(2, maiden.position, c)?;
            maiden.push(second);
            Status::Continue
        }
        'C' => {
            maiden.push(Value::Int(maiden.stacklen()));
            Status::Continue
        }
        '-' | '|' => Status::Continue,
        '>' => {
            maiden.velocity = labyrinth_core::RIGHT;
            Status::Continue
        }
        '<' => {
            maiden.velocity = labyrinth_core::LEFT;
            Status::Continue
        }
        '^' => {
            maiden.velocity = labyrinth_core::UP;
            Status::Continue
        }
        'v' => {
            maiden.velocity = labyrinth_core::DOWN;
            Status::Continue
        }
        '{' => {
            maiden.velocity = maiden.velocity.add(maiden.velocity.direction());
            Status::Continue
        }
        '}' => {
            let dir = maiden.velocity.direction();
            let mut v = maiden.velocity.sub(dir);
            if v == labyrinth_core::ZERO {
                v = v.sub(dir);
            }
            maiden.velocity = v;
            Status::Continue
        }
        'J' => {
            maiden.step();
            Status::Continue
        }
        'j' => {
            let n = require_int(maiden, c, &args[0])?;
            for _ in 0..n {
                maiden.step();
            }
            Status::Continue
        }
        'z' => {
            let n = require_int(maiden, c, &args[0])?;
            if n > 0 {
                maiden.steps_ahead += n as u64;
            }
            Status::Continue
        }
        'r' => {
            maiden.push(Value::Int(maiden.position.x));
            maiden.push(Value::Int(maiden.position.y));
            Status::Continue
        }
        'R' => {
            maiden.push(Value::Int(rng.next_int()));
            Status::Continue
        }
        '?' => {
            if !args[0].is_truthy() {
                maiden.velocity = maiden.velocity.rotate_right();
            }
            Status::Continue
        }
        'I' => {
            if !args[0].is_truthy() {
                maiden.velocity = maiden.velocity.rotate_left();
            }
            Status::Continue
        }
        'T' => {
            let cond = args[0].clone();
            let val = maiden.pop(maiden.position, c)?;
            if cond.is_truthy() {
                maiden.push(val);
            }
            Status::Continue
        }
        'K' => {
            let cond = &args[0];
            let n = require_int(maiden, c, &args[1])?;
            if cond.is_truthy() {
                for _ in 0..n {
                    maiden.step();
                }
            }
            Status::Continue
        }
        'k' => {
            let cond = &args[0];
            let n = require_int(maiden, c, &args[1])?;
            if !cond.is_truthy() {
                for _ in 0..n {
                    maiden.step();
                }
            }
            Status::Continue
        }
        'H' => {
            effect = Effect::Fork(fork_maiden(maiden, maiden.velocity.rotate_left()));
            Status::Continue
        }
        'h' => {
            effect = Effect::Fork(fork_maiden(maiden, maiden.velocity.rotate_right()));
            Status::Continue
        }
        'F' => {
            let i = require_int(maiden, c, &args[0])?;
            effect = Effect::FireIndex(i);
            Status::Continue
        }
        'f' => {
            let n = require_int(maiden, c, &args[0])?;
            effect = Effect::FireCount(n);
            Status::Continue
        }
        '+' => {
            maiden.push(args[1].add(&args[0]).map_err(|e| err(maiden, c, e.into()))?);
            Status::Continue
        }
        '_' => {
            maiden.push(args[1].sub(&args[0]).map_err(|e| err(maiden, c, e.into()))?);
            Status::Continue
        }
        '*' => {
            maiden.push(args[1].mul(&args[0]).map_err(|e| err(maiden, c, e.into()))?);
            Status::Continue
        }
        '/' => {
            maiden.push(
                args[1]
                    .div(&args[0])
                    .map_err(|e| err(maiden, c, value_error_kind(e)))?,
            );
            Status::Continue
        }
        '%' => {
            maiden.push(
                args[1]
                    .rem(&args[0])
                    .map_err(|e| err(maiden, c, value_error_kind(e)))?,
            );
            Status::Continue
        }
        'X' => {
            let n = require_int(maiden, c, &args[0])?;
            maiden.push(Value::Int(n.wrapping_add(1)));
            Status::Continue
        }
        'x' => {
            let n = require_int(maiden, c, &args[0])?;
            maiden.push(Value::Int(n.wrapping_sub(1)));
            Status::Continue
        }
        '=' => {
            maiden.push(Value::Int(args[1].eql(&args[0]) as i64));
            Status::Continue
        }
        'l' => {
            maiden.push(args[1].lt(&args[0]).map_err(|e| err(maiden, c, e.into()))?);
            Status::Continue
        }
        'g' => {
            maiden.push(args[1].gt(&args[0]).map_err(|e| err(maiden, c, e.into()))?);
            Status::Continue
        }
        'c' => {
            maiden.push(args[1].cmp(&args[0]).map_err(|e| err(maiden, c, e.into()))?);
            Status::Continue
        }
        '!' => {
            maiden.push(Value::Int(!args[0].is_truthy() as i64));
            Status::Continue
        }
        'A' => {
            maiden.push(args[0].chr());
            Status::Continue
        }
        'a' => return Err(err(maiden, c, RuntimeErrorKind::Unimplemented)),
        's' => {
            maiden.push(args[0].to_string_value());
            Status::Continue
        }
        'i' => {
            let n = args[0]
                .array_to_int()
                .map_err(|e| err(maiden, c, e.into()))?;
            maiden.push(Value::Int(n));
            Status::Continue
        }
        'L' => {
            maiden.push(Value::Int(args[0].len()));
            Status::Continue
        }
        'G' => {
            let (_unused, index, array) = (&args[0], &args[1], &args[2]);
            let idx = require_int(maiden, c, index)?;
            let Value::Arr(a) = array else {
                return Err(err(maiden, c, RuntimeErrorKind::TypeError(labyrinth_core::ValueError::NotInt)));
            };
            let v = a
                .get_1based(idx)
                .ok_or_else(|| err(maiden, c, RuntimeErrorKind::IndexOutOfBounds))?;
            maiden.push(v);
            Status::Continue
        }
        'S' => {
            let (_unused, value, index, array) = (&args[0], &args[1], &args[2], &args[3]);
            let idx = require_int(maiden, c, index)?;
            let Value::Arr(mut a) = array.clone() else {
                return Err(err(maiden, c, RuntimeErrorKind::TypeError(labyrinth_core::ValueError::NotInt)));
            };
            if !a.set_1based(idx, value.clone()) {
                return Err(err(maiden, c, RuntimeErrorKind::IndexOutOfBounds));
            }
            maiden.push(Value::Arr(a));
            Status::Continue
        }
        'P' => {
            args[0]
                .print(stdout)
                .map_err(|e| err(maiden, c, e.into()))?;
            let _ = stdout.write_all(b"\n");
            Status::Continue
        }
        'p' => {
            args[0]
                .print(stdout)
                .map_err(|e| err(maiden, c, e.into()))?;
            Status::Continue
        }
        'N' => {
            let mut s = String::new();
            args[0].dump(&mut s);
            s.push('\n');
            let _ = stdout.write_all(s.as_bytes());
            Status::Continue
        }
        'n' => {
            let mut s = String::new();
            args[0].dump(&mut s);
            let _ = stdout.write_all(s.as_bytes());
            Status::Continue
        }
        'D' => {
            effect = Effect::Dump { then_exit: true };
            Status::Continue
        }
        'd' => {
            effect = Effect::Dump { then_exit: false };
            Status::Continue
        }
        'Q' => Status::Exit(0),
        'q' => {
            let n = require_int(maiden, c, &args[0])?;
            Status::Exit(n as i32)
        }
        'U' => return Err(err(maiden, c, RuntimeErrorKind::Unimplemented)),
        '[' | ']' => return Err(err(maiden, c, RuntimeErrorKind::Unimplemented)),
        _ => return Err(err(maiden, c, RuntimeErrorKind::UnknownInstruction)),
    };

    Ok((status, effect))
}

fn value_error_kind(e: labyrinth_core::ValueError) -> RuntimeErrorKind {
    match e {
        labyrinth_core::ValueError::DivisionByZero => RuntimeErrorKind::DivisionByZero,
        other => RuntimeErrorKind::TypeError(other),
    }
}

fn fork_maiden(parent: &Maiden, velocity: labyrinth_core::Coordinate) -> Maiden {
    let mut child = Maiden::new(parent.position, velocity);
    child.clone_stack_from(parent);
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use labyrinth_core::{Coordinate, RIGHT, ZERO};
    use pretty_assertions::assert_eq;

    fn run(prog: &str, seed_stack: &[i64]) -> (Vec<Maiden>, Vec<u8>) {
        let grid = Grid::load(prog);
        let mut rng = Random::seeded(1);
        let mut maiden = Maiden::new(Coordinate::new(-1, 0), RIGHT);
        for &n in seed_stack {
            maiden.push(Value::Int(n));
        }
        let mut out = Vec::new();
        loop {
            if maiden.steps_ahead > 0 {
                maiden.steps_ahead -= 1;
                continue;
            }
            let _ = maiden.move_and_read(&grid);
            let (status, _effect) = dispatch(&mut maiden, &grid, &mut rng, &mut out).unwrap();
            if let Status::Exit(_) = status {
                break;
            }
        }
        (vec![maiden], out)
    }

    #[test]
    fn push_and_quit() {
        let (_, out) = run("9Q", &[]);
        assert_eq!(out, b"");
    }

    #[test]
    fn dup_add_dump() {
        let (_, out) = run("12.+nQ", &[]);
        assert_eq!(out, b"24");
    }

    #[test]
    fn string_literal_print() {
        let (_, out) = run("\"ab\"PQ", &[]);
        assert_eq!(out, b"ab\n");
    }

    #[test]
    fn subtraction_uses_source_order_not_stack_order() {
        // seed stack [5, 2] (5 pushed first, 2 on top); `_` => args[0]=2
        // (top), args[1]=5 => 5 - 2 = 3
        let (_, out) = run("_nQ", &[5, 2]);
        assert_eq!(out, b"3");
    }

    #[test]
    fn velocity_reversal_never_produces_zero() {
        let grid = Grid::load(">1}..Q");
        let mut rng = Random::seeded(1);
        let mut maiden = Maiden::new(Coordinate::new(-1, 0), RIGHT);
        for _ in 0..3 {
            let _ = maiden.move_and_read(&grid);
            let (_status, _effect) =
                dispatch(&mut maiden, &grid, &mut rng, &mut std::io::sink()).unwrap();
        }
        assert_ne!(maiden.velocity, labyrinth_core::ZERO);
        assert_eq!(maiden.velocity, labyrinth_core::LEFT);
    }

    #[test]
    fn unknown_instruction_is_fatal() {
        let grid = Grid::load("~");
        let mut rng = Random::seeded(1);
        let mut maiden = Maiden::new(Coordinate::new(-1, 0), RIGHT);
        let _ = maiden.move_and_read(&grid);
        let result = dispatch(&mut maiden, &grid, &mut rng, &mut std::io::sink());
        assert!(result.is_err());
    }

    #[test]
    fn array_get_is_one_based() {
        let grid = Grid::load("GQ");
        let mut rng = Random::seeded(1);
        let mut maiden = Maiden::new(Coordinate::new(-1, 0), RIGHT);
        let arr = Value::array(vec![Value::Int(10), Value::Int(20)]);
        // G pops (args[0]=unused, args[1]=index, args[2]=array) -> element
        maiden.push(arr);
        maiden.push(Value::Int(2)); // index
        maiden.push(Value::Int(0)); // unused top arg
        let _ = maiden.move_and_read(&grid);
        let (status, _effect) = dispatch(&mut maiden, &grid, &mut rng, &mut std::io::sink()).unwrap();
        assert_eq!(status, Status::Continue);
        assert_eq!(maiden.pop(ZERO, 'x').unwrap(), Value::Int(20));
    }

    #[test]
    fn array_set_copies_on_write_when_shared() {
        let grid = Grid::load("SQ");
        let mut rng = Random::seeded(1);
        let mut maiden = Maiden::new(Coordinate::new(-1, 0), RIGHT);
        let arr = Value::array(vec![Value::Int(10), Value::Int(20)]);
        let shared = arr.clone();
        // S pops (args[0]=unused, args[1]=value, args[2]=index, args[3]=array) -> mutated array
        maiden.push(arr);
        maiden.push(Value::Int(1)); // index
        maiden.push(Value::Int(99)); // value
        maiden.push(Value::Int(0)); // unused top arg
        let _ = maiden.move_and_read(&grid);
        dispatch(&mut maiden, &grid, &mut rng, &mut std::io::sink()).unwrap();
        let result = maiden.pop(ZERO, 'x').unwrap();
        assert_eq!(result, Value::array(vec![Value::Int(99), Value::Int(20)]));
        // the original shared handle is untouched.
        assert_eq!(shared, Value::array(vec![Value::Int(10), Value::Int(20)]));
    }
}
