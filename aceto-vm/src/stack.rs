//! The multi-stack store: a bank of integer-addressed stacks, one of which
//! is active at a time, each independently markable as sticky.

use crate::value::Value;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// A single stack of values plus its sticky flag.
#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
    /// While sticky, `pop` returns the top without removing it.
    pub sticky: bool,
}

impl Stack {
    fn new() -> Self {
        Stack { values: Vec::new(), sticky: false }
    }

    pub fn push(&mut self, v: Value) {
        self.values.push(v);
    }

    /// Pops the top value, yielding `Integer(0)` on an empty stack. If the
    /// stack is sticky, the top is returned but left in place.
    pub fn pop(&mut self) -> Value {
        if self.sticky {
            self.peek()
        } else {
            self.values.pop().unwrap_or_else(|| Value::int(0))
        }
    }

    /// Looks at the top value without removing it, yielding `Integer(0)` on
    /// an empty stack.
    pub fn peek(&self) -> Value {
        self.values.last().cloned_value()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `d`: duplicates the top value.
    pub fn dup(&mut self) {
        let top = self.peek();
        self.push(top);
    }

    /// `s`: swaps the top two values.
    pub fn swap(&mut self) {
        let a = self.values.pop().unwrap_or_else(|| Value::int(0));
        let b = self.values.pop().unwrap_or_else(|| Value::int(0));
        self.values.push(a);
        self.values.push(b);
    }

    /// `h`: drops every value except the top.
    pub fn head(&mut self) {
        let top = self.values.pop();
        self.values.clear();
        if let Some(top) = top {
            self.values.push(top);
        }
    }

    /// `x`: reverses the whole stack in place.
    pub fn reverse(&mut self) {
        self.values.reverse();
    }

    /// `Q`: moves the bottom value to the top.
    pub fn rotate_bottom_to_top(&mut self) {
        if !self.values.is_empty() {
            let bottom = self.values.remove(0);
            self.values.push(bottom);
        }
    }

    /// `q`: moves the top value to the bottom.
    pub fn rotate_top_to_bottom(&mut self) {
        if let Some(top) = self.values.pop() {
            self.values.insert(0, top);
        }
    }

    /// `l`: the stack's current length.
    pub fn length_value(&self) -> Value {
        Value::int(self.values.len() as i64)
    }

    /// `C`: whether the stack contains a value equal to `needle`.
    pub fn contains(&self, needle: &Value) -> bool {
        self.values.iter().any(|v| crate::value::values_equal(v, needle))
    }

    /// `×`: replaces the stack with `k` copies of itself, bottom-to-top.
    pub fn repeat(&mut self, k: i64) {
        if k < 0 {
            return;
        }
        let original = self.values.clone();
        self.values.clear();
        for _ in 0..k {
            self.values.extend(original.iter().cloned());
        }
    }

    /// `g`: sorts ascending by numeric value.
    pub fn sort_asc(&mut self) {
        self.values.sort_by(crate::value::numeric_cmp);
    }

    /// `G`: sorts descending by numeric value.
    pub fn sort_desc(&mut self) {
        self.values.sort_by(|a, b| crate::value::numeric_cmp(b, a));
    }

    /// `Y`: shuffles the stack in place using the interpreter's PRNG.
    pub fn shuffle(&mut self, rng: &mut StdRng) {
        self.values.shuffle(rng);
    }

    /// Replaces the stack contents wholesale, e.g. for `£` (implode).
    pub fn replace_with(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    /// Appends values on top, in iteration order (last pushed ends on top),
    /// e.g. for `€` (explode) and the range commands `z`/`Z`.
    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }

    /// `ø`: discards every value.
    pub fn empty(&mut self) {
        self.values.clear();
    }

    /// Direct read access for commands that need to inspect without popping,
    /// e.g. the type-peek dispatch used by `F`, `/`, and `%`, and `£`
    /// (implode), which reads top-to-bottom.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Looks `n` values down from the top (0 = top) without popping,
    /// yielding `Integer(0)` if the stack is too short. Used by `F`'s
    /// type-peek dispatch, which must inspect the second-from-top value.
    pub fn peek_nth(&self, n: usize) -> Value {
        if n >= self.values.len() {
            return Value::int(0);
        }
        self.values[self.values.len() - 1 - n].clone()
    }
}

/// Extension trait giving `Option<&Value>` a cheap "clone or default" helper,
/// mirroring the pop-yields-zero-on-empty convention used throughout.
trait OptValueExt {
    fn cloned_value(self) -> Value;
}

impl OptValueExt for Option<&Value> {
    fn cloned_value(self) -> Value {
        self.cloned().unwrap_or_else(|| Value::int(0))
    }
}

/// The bank of stacks a running program addresses by integer id, with one
/// stack active at a time. "Left" is `active - 1`, "right" is `active + 1`.
#[derive(Debug)]
pub struct StackStore {
    stacks: HashMap<i64, Stack>,
    active: i64,
}

impl Default for StackStore {
    fn default() -> Self {
        let mut stacks = HashMap::new();
        stacks.insert(0, Stack::new());
        StackStore { stacks, active: 0 }
    }
}

impl StackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the active stack, creating it on first touch.
    pub fn active_mut(&mut self) -> &mut Stack {
        self.stacks.entry(self.active).or_insert_with(Stack::new)
    }

    pub fn active(&self) -> Option<&Stack> {
        self.stacks.get(&self.active)
    }

    pub fn active_id(&self) -> i64 {
        self.active
    }

    /// `(`: moves the active index left by one.
    pub fn move_left(&mut self) {
        self.active -= 1;
        self.stacks.entry(self.active).or_insert_with(Stack::new);
    }

    /// `)`: moves the active index right by one.
    pub fn move_right(&mut self) {
        self.active += 1;
        self.stacks.entry(self.active).or_insert_with(Stack::new);
    }

    /// `{`: pops from the active stack and pushes onto its left neighbour,
    /// without changing which stack is active.
    pub fn pass_left(&mut self) {
        let v = self.active_mut().pop();
        let left = self.active - 1;
        self.stacks.entry(left).or_insert_with(Stack::new).push(v);
    }

    /// `}`: pops from the active stack and pushes onto its right neighbour,
    /// without changing which stack is active.
    pub fn pass_right(&mut self) {
        let v = self.active_mut().pop();
        let right = self.active + 1;
        self.stacks.entry(right).or_insert_with(Stack::new).push(v);
    }

    /// `[`: pops from the active stack, moves active left by one, and pushes
    /// the popped value onto the new active stack.
    pub fn carry_left(&mut self) {
        let v = self.active_mut().pop();
        self.move_left();
        self.active_mut().push(v);
    }

    /// `]`: pops from the active stack, moves active right by one, and
    /// pushes the popped value onto the new active stack.
    pub fn carry_right(&mut self) {
        let v = self.active_mut().pop();
        self.move_right();
        self.active_mut().push(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_on_empty_yields_zero() {
        let mut s = Stack::new();
        match s.pop() {
            Value::Integer(i) => assert_eq!(i, num_bigint::BigInt::from(0)),
            other => panic!("expected Integer(0), got {other:?}"),
        }
    }

    #[test]
    fn sticky_pop_leaves_value_in_place() {
        let mut s = Stack::new();
        s.sticky = true;
        s.push(Value::int(7));
        assert_eq!(s.len(), 1);
        let _ = s.pop();
        let _ = s.pop();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn repeat_multiplies_length() {
        let mut s = Stack::new();
        s.push(Value::int(1));
        s.push(Value::int(2));
        s.repeat(3);
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn carry_moves_value_across_stacks() {
        let mut store = StackStore::new();
        store.active_mut().push(Value::int(9));
        store.carry_right();
        assert_eq!(store.active_id(), 1);
        assert_eq!(store.active().unwrap().len(), 1);
    }

    #[test]
    fn rotation_round_trips() {
        let mut s = Stack::new();
        s.push(Value::int(1));
        s.push(Value::int(2));
        s.push(Value::int(3));
        s.rotate_top_to_bottom();
        s.rotate_bottom_to_top();
        assert_eq!(s.len(), 3);
    }
}
