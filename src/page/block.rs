//! Blocks: several pages flattened into one scan unit
//!
//! A block lives for exactly one left-block iteration of block nested-loop
//! join. It holds at most `max_pages` whole pages.

use super::page::Page;
use crate::tuple::Tuple;

/// Ordered aggregation of up to `max_pages` pages
#[derive(Debug, Clone)]
pub struct Block {
    max_pages: usize,
    page_count: usize,
    tuples: Vec<Tuple>,
}

impl Block {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            page_count: 0,
            tuples: Vec::new(),
        }
    }

    /// Adds a whole page. A full block hands the page back.
    pub fn add_page(&mut self, page: Page) -> Result<(), Page> {
        if self.is_full() {
            return Err(page);
        }
        self.tuples.extend(page);
        self.page_count += 1;
        Ok(())
    }

    /// Capacity in pages
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn is_full(&self) -> bool {
        self.page_count >= self.max_pages
    }

    /// No page has been added
    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }

    /// Number of tuples across all pages
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn get(&self, index: usize) -> Option<&Tuple> {
        self.tuples.get(index)
    }
}
