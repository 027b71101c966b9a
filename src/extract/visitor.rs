//! Document-order traversal of a block tree.

use crate::model::{Block, NodePath, Run, Table};

/// Structural boundary between two siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Between two blocks of one sequence
    Block,
    /// Between two cells of one row
    Cell,
    /// Between two rows of one table
    Row,
}

/// Receives traversal events. Every method defaults to doing nothing.
pub trait Visitor {
    fn paragraph_start(&mut self, _path: &NodePath) {}

    /// `index` is the run's position inside its paragraph.
    fn run(&mut self, _run: &Run, _path: &NodePath, _index: usize) {}

    fn table_start(&mut self, _table: &Table, _path: &NodePath) {}

    fn table_end(&mut self, _table: &Table, _path: &NodePath) {}

    fn boundary(&mut self, _boundary: Boundary) {}
}

/// Walk `blocks` as a top-level sequence.
pub fn walk(blocks: &[Block], visitor: &mut impl Visitor) {
    walk_blocks(blocks, None, visitor);
}

fn walk_blocks(blocks: &[Block], parent: Option<(&NodePath, usize)>, visitor: &mut impl Visitor) {
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            visitor.boundary(Boundary::Block);
        }
        let path = match parent {
            Some((table, cell)) => table.child(cell, index),
            None => NodePath::root(index),
        };
        match block {
            Block::Paragraph(paragraph) => {
                visitor.paragraph_start(&path);
                for (i, run) in paragraph.runs().iter().enumerate() {
                    visitor.run(run, &path, i);
                }
            }
            Block::Table(table) => {
                visitor.table_start(table, &path);
                walk_table(table, &path, visitor);
                visitor.table_end(table, &path);
            }
        }
    }
}

/// Cells grouped by row, each row in column order.
fn walk_table(table: &Table, path: &NodePath, visitor: &mut impl Visitor) {
    let mut current_row = None;
    for index in table.cell_order() {
        let cell = &table.cells()[index];
        match current_row {
            Some(row) if row == cell.row => visitor.boundary(Boundary::Cell),
            Some(_) => visitor.boundary(Boundary::Row),
            None => {}
        }
        current_row = Some(cell.row);
        walk_blocks(cell.blocks(), Some((path, index)), visitor);
    }
}
