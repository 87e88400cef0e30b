//! Value: what a Labyrinth program talks about.
//!
//! A `Value` is one of two things: a 64-bit signed integer, or a handle to
//! a shared, refcounted `Array`. Unlike the C reference (which packs both
//! into one machine word via a low tag bit), this just uses an enum —
//! disambiguating the two is free in Rust and bit-tagging here would buy
//! nothing but unsafe code.

use std::fmt::Write as _;

use crate::array::Array;

/// Things that can go wrong purely evaluating a `Value` operation, without
/// any grid position attached. `labyrinth-runtime` wraps these with the
/// maiden position and offending instruction before reporting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Arithmetic or comparison attempted on something other than two Ints.
    NotInt,
    DivisionByZero,
    /// Printing an array containing a non-Int element.
    NotPrintable,
    /// `a2i`-style conversion of an array whose length isn't 1.
    WrongLengthForInt,
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueError::NotInt => write!(f, "operation is only defined on integers"),
            ValueError::DivisionByZero => write!(f, "division by zero"),
            ValueError::NotPrintable => write!(f, "can only print arrays of integers"),
            ValueError::WrongLengthForInt => {
                write!(f, "can only convert arrays of length 1 to an integer")
            }
        }
    }
}

impl std::error::Error for ValueError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Arr(Array),
}

impl Value {
    pub fn int(i: i64) -> Value {
        Value::Int(i)
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Arr(Array::from_vec(items))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// `Int(0)` and the empty array are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Arr(a) => !a.is_empty(),
        }
    }

    pub fn len(&self) -> i64 {
        match self {
            Value::Int(_) => 1,
            Value::Arr(a) => a.len() as i64,
        }
    }

    /// Structural equality: `Int == Int` by value, `Arr == Arr` by same
    /// length and pointwise `eql`, anything else is unequal.
    pub fn eql(&self, other: &Value) -> bool {
        self == other
    }

    /// `chr`: wrap an Int in a length-1 array; pass arrays through.
    pub fn chr(&self) -> Value {
        match self {
            Value::Int(i) => Value::array(vec![Value::Int(*i)]),
            Value::Arr(_) => self.clone(),
        }
    }

    /// Decimal rendering of an Int as an array of character codes; arrays
    /// pass through unchanged (already "a string").
    pub fn to_string_value(&self) -> Value {
        match self {
            Value::Int(i) => {
                let mut buf = String::new();
                write!(buf, "{i}").expect("writing to a String cannot fail");
                Value::array(buf.bytes().map(|b| Value::Int(b as i64)).collect())
            }
            Value::Arr(_) => self.clone(),
        }
    }

    /// For an Int, returns the value if it happens to be an ASCII digit
    /// codepoint, else 0 — the source's `parse_int` treats a bare Int as a
    /// one-character string. For an Arr, reads an optional leading `-` then
    /// ASCII digits, stopping at the first non-digit; empty/no-digit yields
    /// 0.
    pub fn parse_int(&self) -> i64 {
        match self {
            Value::Int(i) => {
                if (0..=255).contains(i) && (*i as u8 as char).is_ascii_digit() {
                    (*i as u8 as char).to_digit(10).unwrap() as i64
                } else {
                    0
                }
            }
            Value::Arr(a) => {
                let items = a.items();
                let mut idx = 0usize;
                let mut sign = 1i64;
                if let Some(Value::Int(c)) = items.get(idx) {
                    if *c == b'-' as i64 {
                        sign = -1;
                        idx += 1;
                    }
                }
                let mut total = 0i64;
                while let Some(item) = items.get(idx) {
                    let Value::Int(c) = item else {
                        break;
                    };
                    if !(0..=255).contains(c) || !(*c as u8 as char).is_ascii_digit() {
                        break;
                    }
                    total = total
                        .wrapping_mul(10)
                        .wrapping_add((*c as u8 as char).to_digit(10).unwrap() as i64);
                    idx += 1;
                }
                total * sign
            }
        }
    }

    /// Write this value's printable bytes to `out`. Ints are a single byte
    /// (truncated to `u8`, matching `fputc` on the C `integer`); arrays must
    /// contain only Ints.
    pub fn print(&self, out: &mut impl std::io::Write) -> Result<(), ValueError> {
        match self {
            Value::Int(i) => {
                let _ = out.write_all(&[*i as u8]);
                Ok(())
            }
            Value::Arr(a) => {
                for item in a.items().iter() {
                    match item {
                        Value::Int(i) => {
                            let _ = out.write_all(&[*i as u8]);
                        }
                        Value::Arr(_) => return Err(ValueError::NotPrintable),
                    }
                }
                Ok(())
            }
        }
    }

    /// Machine-readable dump: Ints as decimal, arrays as `[e0, e1, …]`
    /// with recursive dumping of nested elements.
    pub fn dump(&self, out: &mut String) {
        match self {
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Arr(a) => {
                out.push('[');
                for (i, item) in a.items().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.dump(out);
                }
                out.push(']');
            }
        }
    }

    fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Arr(_) => Err(ValueError::NotInt),
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int(self.as_int()?.wrapping_add(rhs.as_int()?)))
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int(self.as_int()?.wrapping_sub(rhs.as_int()?)))
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int(self.as_int()?.wrapping_mul(rhs.as_int()?)))
    }

    pub fn div(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (l, r) = (self.as_int()?, rhs.as_int()?);
        if r == 0 {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Value::Int(l.wrapping_div(r)))
    }

    pub fn rem(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (l, r) = (self.as_int()?, rhs.as_int()?);
        if r == 0 {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Value::Int(l.wrapping_rem(r)))
    }

    pub fn lt(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int((self.as_int()? < rhs.as_int()?) as i64))
    }

    pub fn gt(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int((self.as_int()? > rhs.as_int()?) as i64))
    }

    /// -1 / 0 / 1
    pub fn cmp(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (l, r) = (self.as_int()?, rhs.as_int()?);
        Ok(Value::Int(match l.cmp(&r) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }))
    }

    /// `a2i`: an array's sole element converted to an int; errors unless
    /// the array has exactly one element.
    pub fn array_to_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Arr(a) => {
                if a.len() != 1 {
                    return Err(ValueError::WrongLengthForInt);
                }
                Ok(a.items()[0].array_to_int()?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness_matches_spec() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
        assert!(Value::array(vec![Value::Int(0)]).is_truthy());
    }

    #[test]
    fn eql_is_structural_not_by_identity() {
        let a = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert!(a.eql(&b));
        assert!(!a.eql(&Value::Int(1)));
    }

    #[test]
    fn to_string_then_parse_int_round_trips() {
        for n in [0i64, 1, -1, 42, -42, 1_000_000, i64::MIN / 2] {
            let s = Value::Int(n).to_string_value();
            assert_eq!(s.parse_int(), n, "round-trip failed for {n}");
        }
    }

    #[test]
    fn parse_int_stops_at_first_non_digit() {
        let s = Value::array("12a3".bytes().map(|b| Value::Int(b as i64)).collect());
        assert_eq!(s.parse_int(), 12);
    }

    #[test]
    fn parse_int_on_bare_int_is_digit_or_zero() {
        assert_eq!(Value::Int('7' as i64).parse_int(), 7);
        assert_eq!(Value::Int('x' as i64).parse_int(), 0);
    }

    #[test]
    fn division_by_zero_errors() {
        assert_eq!(
            Value::Int(1).div(&Value::Int(0)),
            Err(ValueError::DivisionByZero)
        );
    }

    #[test]
    fn arithmetic_on_array_is_a_type_error() {
        let arr = Value::array(vec![]);
        assert_eq!(Value::Int(1).add(&arr), Err(ValueError::NotInt));
    }

    #[test]
    fn cmp_returns_sign() {
        assert_eq!(Value::Int(1).cmp(&Value::Int(2)), Ok(Value::Int(-1)));
        assert_eq!(Value::Int(2).cmp(&Value::Int(2)), Ok(Value::Int(0)));
        assert_eq!(Value::Int(3).cmp(&Value::Int(2)), Ok(Value::Int(1)));
    }
}
