//! Maiden: one execution agent's position, heading, and operand stack.

use labyrinth_core::{Coordinate, Value, RIGHT, ZERO};

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::grid::Grid;

/// An execution agent. The stack is a plain `Vec<Value>` rather than the
/// shared `Array` type — a maiden's stack is never aliased by anything
/// else, so there is nothing for the refcount to buy here. Forking a
/// maiden clones this `Vec`, which is exactly "fresh container, rc of
/// each element bumped": cloning a `Value::Arr` bumps the `Rc` inside it,
/// cloning a `Value::Int` just copies the integer.
#[derive(Debug, Clone)]
pub struct Maiden {
    pub position: Coordinate,
    pub velocity: Coordinate,
    stack: Vec<Value>,
    pub steps_ahead: u64,
}

impl Maiden {
    pub fn new(position: Coordinate, velocity: Coordinate) -> Self {
        Maiden {
            position,
            velocity,
            stack: Vec::new(),
            steps_ahead: 0,
        }
    }

    /// The canonical initial maiden: starts facing right at the origin.
    pub fn initial() -> Self {
        Maiden::new(ZERO, RIGHT)
    }

    pub fn push(&mut self, v: Value) {
        self.stack.push(v);
    }

    pub fn pop(&mut self, at: Coordinate, instruction: char) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeError::new(at, instruction, RuntimeErrorKind::StackUnderflow))
    }

    pub fn stacklen(&self) -> i64 {
        self.stack.len() as i64
    }

    /// Read-only view of the stack, bottom to top. Used by the engine's
    /// `D`/`d` dump.
    pub fn stack_items(&self) -> &[Value] {
        &self.stack
    }

    /// 1-indexed from the top: `nth(1)` is the current top.
    fn top_index(&self, i: i64) -> Option<usize> {
        if i < 1 || i as usize > self.stack.len() {
            return None;
        }
        Some(self.stack.len() - i as usize)
    }

    pub fn nth(&self, i: i64, at: Coordinate, instruction: char) -> Result<Value, RuntimeError> {
        self.top_index(i)
            .map(|idx| self.stack[idx].clone())
            .ok_or_else(|| RuntimeError::new(at, instruction, RuntimeErrorKind::StackUnderflow))
    }

    pub fn dupn(&mut self, i: i64, at: Coordinate, instruction: char) -> Result<(), RuntimeError> {
        let v = self.nth(i, at, instruction)?;
        self.stack.push(v);
        Ok(())
    }

    pub fn popn(&mut self, i: i64, at: Coordinate, instruction: char) -> Result<Value, RuntimeError> {
        self.top_index(i)
            .map(|idx| self.stack.remove(idx))
            .ok_or_else(|| RuntimeError::new(at, instruction, RuntimeErrorKind::StackUnderflow))
    }

    pub fn step(&mut self) {
        self.position = self.position.add(self.velocity);
    }

    pub fn unstep(&mut self) {
        self.position = self.position.sub(self.velocity);
    }

    /// Clones `parent`'s stack wholesale into `self` — a fresh `Vec`
    /// container whose elements share storage with the parent's (cloning a
    /// `Value::Arr` bumps its `Rc`, cloning a `Value::Int` just copies the
    /// integer). Used when forking (`H`/`h`).
    pub fn clone_stack_from(&mut self, parent: &Maiden) {
        self.stack = parent.stack.clone();
    }

    /// Advances by velocity and reads the cell now underfoot.
    pub fn move_and_read(&mut self, grid: &Grid) -> char {
        self.step();
        grid.read(self.position.x, self.position.y)
    }

    /// Scans a multi-character integer literal. The maiden is already
    /// standing on the literal's first digit (just dispatched); this reads
    /// that digit plus every following digit, advancing one cell per scan
    /// step, until a non-digit terminator. A source `-` is never part of
    /// this scan — it dispatches separately as the `-` no-op instruction,
    /// so a negative literal on the grid reads as two cells, not one token.
    /// Pushes the unsigned result and sets `steps_ahead` to the number of
    /// scan steps taken beyond the first, so the next real tick lands on
    /// the terminator exactly as a naive one-cell-per-tick walk would have.
    pub fn scan_int_literal(&mut self, grid: &Grid) {
        let mut text = String::new();
        text.push(grid.read(self.position.x, self.position.y));
        let mut moves = 0u64;
        loop {
            let c = self.move_and_read(grid);
            moves += 1;
            if c.is_ascii_digit() {
                text.push(c);
                continue;
            }
            // `c` is the terminator; rewind onto the last digit unless
            // it's NUL (end of grid — nothing to re-read).
            if c != '\0' {
                self.unstep();
            }
            break;
        }
        let n: i64 = text.parse().unwrap_or(0);
        self.push(Value::Int(n));
        self.steps_ahead += moves.saturating_sub(1);
    }

    /// Scans a `"`-delimited string literal into a fresh array of
    /// character-code Ints. Returns an error if the grid ends first.
    pub fn scan_string_literal(&mut self, grid: &Grid) -> Result<(), RuntimeError> {
        let start = self.position;
        let mut chars = Vec::new();
        let mut moves = 0u64;
        loop {
            let c = self.move_and_read(grid);
            moves += 1;
            if c == '"' {
                break;
            }
            if c == '\0' {
                return Err(RuntimeError::new(
                    start,
                    '"',
                    RuntimeErrorKind::UnterminatedString,
                ));
            }
            chars.push(Value::Int(c as i64));
        }
        self.push(Value::array(chars));
        if moves > 0 {
            self.steps_ahead += moves - 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labyrinth_core::ZERO;
    use pretty_assertions::assert_eq;

    #[test]
    fn stack_push_pop_is_lifo() {
        let mut m = Maiden::new(ZERO, RIGHT);
        m.push(Value::Int(1));
        m.push(Value::Int(2));
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(2));
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(1));
        assert!(m.pop(ZERO, 'x').is_err());
    }

    #[test]
    fn nth_is_one_indexed_from_top() {
        let mut m = Maiden::new(ZERO, RIGHT);
        m.push(Value::Int(10));
        m.push(Value::Int(20));
        m.push(Value::Int(30));
        assert_eq!(m.nth(1, ZERO, 'x').unwrap(), Value::Int(30));
        assert_eq!(m.nth(3, ZERO, 'x').unwrap(), Value::Int(10));
        assert!(m.nth(4, ZERO, 'x').is_err());
    }

    #[test]
    fn dupn_clones_without_removing() {
        let mut m = Maiden::new(ZERO, RIGHT);
        m.push(Value::Int(1));
        m.push(Value::Int(2));
        m.dupn(2, ZERO, 'x').unwrap();
        assert_eq!(m.stacklen(), 3);
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(1));
    }

    #[test]
    fn popn_removes_and_shifts() {
        let mut m = Maiden::new(ZERO, RIGHT);
        m.push(Value::Int(1));
        m.push(Value::Int(2));
        m.push(Value::Int(3));
        assert_eq!(m.popn(2, ZERO, 'x').unwrap(), Value::Int(2));
        assert_eq!(m.stacklen(), 2);
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(3));
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(1));
    }

    #[test]
    fn step_unstep_are_inverses() {
        let mut m = Maiden::new(ZERO, RIGHT);
        m.step();
        m.step();
        m.unstep();
        assert_eq!(m.position, Coordinate::new(1, 0));
    }

    #[test]
    fn scan_int_literal_consumes_all_digits_and_sets_steps_ahead() {
        let grid = Grid::load("123+");
        let mut m = Maiden::new(ZERO, RIGHT);
        m.scan_int_literal(&grid);
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(123));
        // 3 scan steps ('2', '3', the terminator), steps_ahead = 3 - 1 = 2.
        assert_eq!(m.steps_ahead, 2);
        assert_eq!(m.position, Coordinate::new(2, 0));
    }

    #[test]
    fn scan_int_literal_never_consumes_a_leading_minus() {
        // `-` dispatches separately as a no-op; the scanner starting on
        // the `4` only ever sees "42", not "-42".
        let grid = Grid::load("-42q");
        let mut m = Maiden::new(Coordinate::new(1, 0), RIGHT);
        m.scan_int_literal(&grid);
        assert_eq!(m.pop(ZERO, 'x').unwrap(), Value::Int(42));
    }

    #[test]
    fn scan_string_literal_collects_chars_until_closing_quote() {
        let grid = Grid::load("\"ab\"Q");
        let mut m = Maiden::new(ZERO, RIGHT);
        m.scan_string_literal(&grid).unwrap();
        let v = m.pop(ZERO, 'x').unwrap();
        assert_eq!(v, Value::array(vec![Value::Int('a' as i64), Value::Int('b' as i64)]));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let grid = Grid::load("\"ab");
        let mut m = Maiden::new(ZERO, RIGHT);
        assert!(m.scan_string_literal(&grid).is_err());
    }
}
