//! Bounded-capacity tuple pages
//!
//! The page is the unit of inter-operator transfer and of spill I/O.
//! Capacity is fixed at construction and never exceeded.

use crate::executor::{ExecError, ExecResult};
use crate::tuple::Tuple;

/// An ordered, bounded sequence of tuples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    tuples: Vec<Tuple>,
    capacity: usize,
}

impl Page {
    /// Creates an empty page holding at most `capacity` tuples
    pub fn new(capacity: usize) -> Self {
        Self {
            tuples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tuples.len() >= self.capacity
    }

    /// Appends a tuple.
    ///
    /// Appending to a full page is a budget violation.
    pub fn push(&mut self, tuple: Tuple) -> ExecResult<()> {
        if self.is_full() {
            return Err(ExecError::buffer_budget(format!(
                "Page overflow: capacity {} already reached",
                self.capacity
            )));
        }
        self.tuples.push(tuple);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Tuple> {
        self.tuples.get(index)
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    pub fn into_tuples(self) -> Vec<Tuple> {
        self.tuples
    }
}

impl IntoIterator for Page {
    type Item = Tuple;
    type IntoIter = std::vec::IntoIter<Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.into_iter()
    }
}

/// Cuts a tuple sequence into full pages of `capacity`, last page partial.
pub fn paginate(tuples: impl IntoIterator<Item = Tuple>, capacity: usize) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page::new(capacity);
    for tuple in tuples {
        if current.is_full() {
            pages.push(std::mem::replace(&mut current, Page::new(capacity)));
        }
        current.tuples.push(tuple);
    }
    if !current.is_empty() {
        pages.push(current);
    }
    pages
}
