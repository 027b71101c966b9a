//! Table access on the logical grid.
//!
//! A [`TableManager`] borrows a [`StructureModel`] and hands out
//! [`TableHandle`]s. A handle is the table's [`NodePath`] plus the table's
//! id. Ids are unique across every model parsed in the process, so a handle
//! used against another document or another table at the same path is
//! detected instead of silently reading the wrong table.
//!
//! Grid coordinates follow the cell addresses, not the raw cell order: a cell
//! spanning two rows answers for both coordinates it covers.
//!
//! # Example
//!
//! ```no_run
//! use hanji::Document;
//!
//! # fn main() -> Result<(), hanji::Error> {
//! let mut doc = Document::open("report.hwp")?;
//! let mut tables = doc.table_manager()?;
//! for handle in tables.get_all_tables(true) {
//!     let (rows, cols) = tables.get_table_size(&handle)?;
//!     println!("{} is {rows}x{cols}", handle.path());
//! }
//! # Ok(())
//! # }
//! ```

use crate::common::{Error, Result};
use crate::extract::{ExtractOptions, blocks_text};
use crate::model::{Block, NodePath, StructureModel, Table};
use once_cell::unsync::OnceCell;


/// Reference to one table of a model.
#[derive(Debug, Clone)]
pub struct TableHandle {
    path: NodePath,
    uid: u64,
    nested: bool,
    /// Grid size, computed on first request
    size: OnceCell<(usize, usize)>,
}

impl TableHandle {
    fn new(path: NodePath, uid: u64) -> Self {
        Self {
            nested: path.is_nested(),
            path,
            uid,
            size: OnceCell::new(),
        }
    }

    /// Path of the table block.
    #[inline]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Process-unique id of the table this handle was issued for.
    #[inline]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Whether the table sits inside another table's cell.
    #[inline]
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

impl PartialEq for TableHandle {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid && self.path == other.path
    }
}

impl Eq for TableHandle {}

/// Reads and edits tables of one model.
///
/// Works on any [`StructureModel`], whichever reader produced it.
pub struct TableManager<'m> {
    model: &'m mut StructureModel,
}

impl<'m> TableManager<'m> {
    pub fn new(model: &'m mut StructureModel) -> Self {
        Self { model }
    }

    /// Every table reachable from the body, depth-first in document order.
    ///
    /// A table comes before the tables nested in its cells. With
    /// `include_nested` false only top-level tables are returned.
    pub fn get_all_tables(&self, include_nested: bool) -> Vec<TableHandle> {
        let mut handles = Vec::new();
        for (index, block) in self.model.blocks().iter().enumerate() {
            if let Block::Table(table) = block {
                collect(table, NodePath::root(index), include_nested, &mut handles);
            }
        }
        handles
    }

    /// The table a handle refers to.
    pub fn resolve(&self, handle: &TableHandle) -> Result<&Table> {
        self.model
            .table(&handle.path)
            .filter(|table| table.uid() == handle.uid)
            .ok_or_else(|| stale(handle))
    }

    /// `(rows, cols)` of the logical grid, spans included.
    pub fn get_table_size(&self, handle: &TableHandle) -> Result<(usize, usize)> {
        let table = self.resolve(handle)?;
        Ok(*handle.size.get_or_init(|| table.grid_size()))
    }

    /// Row-major grid of cell text.
    ///
    /// A spanning cell's text sits at its top-left coordinate. Coordinates
    /// covered by a span, or by no cell at all, hold empty strings.
    pub fn extract_table_text(&self, handle: &TableHandle) -> Result<Vec<Vec<String>>> {
        let table = self.resolve(handle)?;
        let (rows, cols) = *handle.size.get_or_init(|| table.grid_size());
        let options = ExtractOptions::default();

        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in table.cells() {
            let (row, col) = (cell.row as usize, cell.col as usize);
            if let Some(slot) = grid.get_mut(row).and_then(|r| r.get_mut(col)) {
                *slot = blocks_text(cell.blocks(), &options);
            }
        }
        Ok(grid)
    }

    /// Text of the cell covering `(row, col)`.
    ///
    /// An in-range coordinate that no cell covers reads as an empty string.
    pub fn get_cell_text(&self, handle: &TableHandle, row: usize, col: usize) -> Result<String> {
        let table = self.resolve(handle)?;
        check_bounds(table, row, col)?;
        Ok(table
            .cell_at(row, col)
            .map(|index| blocks_text(table.cells()[index].blocks(), &ExtractOptions::default()))
            .unwrap_or_default())
    }

    /// Replace the text of the cell covering `(row, col)`.
    ///
    /// The text goes into the first editable run of the cell's own paragraphs
    /// and every other editable run there is emptied. Nested tables are left
    /// alone. Returns whether any run changed.
    pub fn set_cell_text(
        &mut self,
        handle: &TableHandle,
        row: usize,
        col: usize,
        text: &str,
    ) -> Result<bool> {
        let index = {
            let table = self.resolve(handle)?;
            check_bounds(table, row, col)?;
            table.cell_at(row, col).ok_or_else(|| {
                Error::InvalidArgument(format!("no cell covers ({row}, {col}) in {}", handle.path))
            })?
        };

        let Some(Block::Table(table)) = self.model.block_mut(&handle.path) else {
            return Err(stale(handle));
        };
        let cell = &mut table.cells[index];

        let mut runs = cell
            .blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Paragraph(paragraph) => Some(paragraph),
                Block::Table(_) => None,
            })
            .flat_map(|paragraph| paragraph.runs.iter_mut())
            .filter(|run| run.is_editable());

        let Some(first) = runs.next() else {
            return Err(Error::UnsupportedWrite(format!(
                "cell ({row}, {col}) of {} has no editable text",
                handle.path
            )));
        };
        let mut changed = first.set_text(text.to_string());
        for run in runs {
            changed |= run.set_text(String::new());
        }

        if changed {
            self.model.touch();
        }
        Ok(changed)
    }
}

fn collect(table: &Table, path: NodePath, include_nested: bool, out: &mut Vec<TableHandle>) {
    out.push(TableHandle::new(path.clone(), table.uid()));
    if !include_nested {
        return;
    }
    for (cell_index, cell) in table.cells().iter().enumerate() {
        for (block_index, block) in cell.blocks().iter().enumerate() {
            if let Block::Table(inner) = block {
                collect(inner, path.child(cell_index, block_index), true, out);
            }
        }
    }
}

fn check_bounds(table: &Table, row: usize, col: usize) -> Result<()> {
    let (rows, cols) = table.grid_size();
    if row >= rows || col >= cols {
        return Err(Error::InvalidArgument(format!(
            "cell ({row}, {col}) is outside a {rows}x{cols} table"
        )));
    }
    Ok(())
}

fn stale(handle: &TableHandle) -> Error {
    Error::StaleHandle(format!("table {} at {}", handle.uid, handle.path))
}
