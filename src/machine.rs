use crate::error::InterpreterError;
use crate::{STACK_CAPACITY, TAPE_SIZE};

/// A fixed-length tape of byte cells with a single data pointer.
///
/// Pointer movement wraps around both ends of the tape and cell arithmetic
/// wraps modulo 256, so no instruction can index outside the tape.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Box<[u8]>,
    pointer: usize,
}

impl Tape {
    /// A zeroed tape of [`TAPE_SIZE`] cells.
    pub fn new() -> Self {
        Self::with_len(TAPE_SIZE)
    }

    /// A zeroed tape with a custom number of cells (at least one).
    pub fn with_len(len: usize) -> Self {
        Self {
            cells: vec![0; len.max(1)].into_boxed_slice(),
            pointer: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Place the data pointer, wrapping `pointer` onto the tape.
    pub fn set_pointer(&mut self, pointer: usize) {
        self.pointer = pointer % self.cells.len();
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn set(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    pub fn move_right(&mut self) {
        self.pointer = (self.pointer + 1) % self.cells.len();
    }

    pub fn move_left(&mut self) {
        self.pointer = self.pointer.checked_sub(1).unwrap_or(self.cells.len() - 1);
    }

    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

/// Positions of the `[` instructions whose loops are currently entered.
///
/// Storage for the full capacity is reserved up front and never grows.
#[derive(Debug, Clone)]
pub struct LoopStack {
    entries: Vec<usize>,
    capacity: usize,
}

impl LoopStack {
    pub fn new() -> Self {
        Self::with_capacity(STACK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record the `[` at `ip` as entered.
    pub fn push(&mut self, ip: usize) -> Result<(), InterpreterError> {
        if self.entries.len() >= self.capacity {
            return Err(InterpreterError::ControlStackOverflow {
                ip,
                capacity: self.capacity,
            });
        }
        self.entries.push(ip);
        Ok(())
    }

    pub fn top(&self) -> Option<usize> {
        self.entries.last().copied()
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.entries.pop()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LoopStack {
    fn default() -> Self {
        Self::new()
    }
}

/// All mutable state of one run: the tape and the loop stack.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    pub tape: Tape,
    pub loops: LoopStack,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(tape: Tape, loops: LoopStack) -> Self {
        Self { tape, loops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tape_is_zeroed_at_full_size() {
        let tape = Tape::new();
        assert_eq!(tape.len(), TAPE_SIZE);
        assert_eq!(tape.pointer(), 0);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn pointer_wraps_left_from_zero() {
        let mut tape = Tape::new();
        tape.move_left();
        assert_eq!(tape.pointer(), TAPE_SIZE - 1);
    }

    #[test]
    fn pointer_wraps_right_from_last_cell() {
        let mut tape = Tape::with_len(3);
        tape.move_right();
        tape.move_right();
        tape.move_right();
        assert_eq!(tape.pointer(), 0);
    }

    #[test]
    fn set_pointer_wraps_onto_tape() {
        let mut tape = Tape::with_len(10);
        tape.set_pointer(4);
        assert_eq!(tape.pointer(), 4);
        tape.set_pointer(23);
        assert_eq!(tape.pointer(), 3);
        tape.set(7);
        assert_eq!(tape.cells()[3], 7);
    }

    #[test]
    fn wrapping_subtraction() {
        let mut tape = Tape::with_len(1);
        tape.decrement();
        assert_eq!(tape.get(), 255);
    }

    #[test]
    fn wrapping_addition() {
        let mut tape = Tape::with_len(1);
        for _ in 0..256 {
            tape.increment();
        }
        assert_eq!(tape.get(), 0);
    }

    #[test]
    fn zero_length_tape_still_has_a_cell() {
        let mut tape = Tape::with_len(0);
        tape.move_left();
        tape.increment();
        assert_eq!(tape.cells(), &[1]);
    }

    #[test]
    fn loop_stack_rejects_push_past_capacity() {
        let mut loops = LoopStack::with_capacity(2);
        loops.push(0).unwrap();
        loops.push(5).unwrap();
        let err = loops.push(9).unwrap_err();
        assert!(matches!(err, InterpreterError::ControlStackOverflow { ip: 9, capacity: 2 }));
        assert_eq!(loops.depth(), 2);
        assert_eq!(loops.top(), Some(5));
    }

    #[test]
    fn loop_stack_pop_on_empty_is_none() {
        let mut loops = LoopStack::new();
        assert_eq!(loops.capacity(), STACK_CAPACITY);
        assert_eq!(loops.pop(), None);
        assert_eq!(loops.top(), None);
    }
}
