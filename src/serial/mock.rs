// src/serial/mock.rs

//! Recording register backend for unit tests

use super::backend::{RegisterMap, UartHardware};
use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

/// Captures every write in order and serves scripted reads.
///
/// A read pops the next scripted value for its offset; once the script is
/// exhausted it returns the value set with [`MockHardware::set`] (or the
/// last value written there).
#[derive(Debug, Default)]
pub(crate) struct MockHardware<W> {
    writes: Vec<(usize, W)>,
    reads: Vec<usize>,
    values: BTreeMap<usize, W>,
    scripts: BTreeMap<usize, VecDeque<W>>,
}

impl<W: Copy + Default> MockHardware<W> {
    pub(crate) fn new() -> Self {
        Self {
            writes: Vec::new(),
            reads: Vec::new(),
            values: BTreeMap::new(),
            scripts: BTreeMap::new(),
        }
    }

    pub(crate) fn set(&mut self, offset: usize, value: W) {
        self.values.insert(offset, value);
    }

    pub(crate) fn script(&mut self, offset: usize, values: impl IntoIterator<Item = W>) {
        self.scripts.entry(offset).or_default().extend(values);
    }

    pub(crate) fn writes(&self) -> &[(usize, W)] {
        &self.writes
    }

    pub(crate) fn writes_to(&self, offset: usize) -> Vec<W> {
        self.writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|&(_, v)| v)
            .collect()
    }

    pub(crate) fn reads_of(&self, offset: usize) -> usize {
        self.reads.iter().filter(|&&o| o == offset).count()
    }

    pub(crate) fn clear_log(&mut self) {
        self.writes.clear();
        self.reads.clear();
    }
}

impl<W: Copy + Default> UartHardware<W> for MockHardware<W> {
    fn read<R: RegisterMap<Word = W>>(&mut self, register: R) -> W {
        let offset = register.offset();
        self.reads.push(offset);
        if let Some(value) = self.scripts.get_mut(&offset).and_then(VecDeque::pop_front) {
            return value;
        }
        self.values.get(&offset).copied().unwrap_or_default()
    }

    fn write<R: RegisterMap<Word = W>>(&mut self, register: R, value: W) {
        let offset = register.offset();
        self.writes.push((offset, value));
        self.values.insert(offset, value);
    }
}
