//! In-place text replacement.
//!
//! [`TextReplacer`] runs a caller-supplied transform over every editable run
//! of the body, of table cells, or of both. Runs keep their place in the
//! model, so node paths and annotation anchors survive any replacement.

use crate::common::{Error, Result};
use crate::model::{StructureModel, for_each_paragraph_mut};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

bitflags! {
    /// Where a replacement applies.
    ///
    /// Serializes as flag names, e.g. `"BODY | TABLE"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Scope: u8 {
        /// Paragraphs outside any table
        const BODY = 1 << 0;
        /// Paragraphs inside table cells, at any depth
        const TABLE = 1 << 1;
        const ALL = Self::BODY.bits() | Self::TABLE.bits();
    }
}

impl Scope {
    /// Parse location names such as `["body", "table"]`.
    ///
    /// Names are case-insensitive. An empty list is an empty scope.
    pub fn from_locations<S: AsRef<str>>(locations: &[S]) -> Result<Self> {
        locations.iter().try_fold(Scope::empty(), |scope, name| {
            let flag = match name.as_ref().trim().to_ascii_lowercase().as_str() {
                "body" => Scope::BODY,
                "table" | "tables" => Scope::TABLE,
                "all" => Scope::ALL,
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unknown replacement location '{other}'"
                    )));
                },
            };
            Ok(scope | flag)
        })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::ALL
    }
}

/// Applies text transforms to one model.
///
/// Works on any [`StructureModel`], whichever reader produced it.
pub struct TextReplacer<'m> {
    model: &'m mut StructureModel,
}

impl<'m> TextReplacer<'m> {
    pub fn new(model: &'m mut StructureModel) -> Self {
        Self { model }
    }

    /// Transform every editable run in `scope`, in document order.
    ///
    /// Returns how many runs ended up with different text. Synthetic runs
    /// (tabs, breaks, anchor markers) and note or memo bodies are never
    /// passed to `transform`.
    pub fn replace_all<F>(&mut self, mut transform: F, scope: Scope) -> usize
    where
        F: FnMut(&str) -> String,
    {
        if scope.is_empty() {
            return 0;
        }

        let mut changed = 0usize;
        for_each_paragraph_mut(&mut self.model.blocks, false, &mut |paragraph, in_table| {
            let wanted = if in_table { Scope::TABLE } else { Scope::BODY };
            if !scope.contains(wanted) {
                return;
            }
            for run in paragraph.runs.iter_mut().filter(|run| run.is_editable()) {
                let replaced = transform(run.text());
                if run.set_text(replaced) {
                    changed += 1;
                }
            }
        });

        if changed > 0 {
            log::debug!("replaced text in {changed} runs ({scope:?})");
            self.model.touch();
        }
        changed
    }

    /// Transform only runs inside table cells.
    pub fn replace_in_tables<F>(&mut self, transform: F) -> usize
    where
        F: FnMut(&str) -> String,
    {
        self.replace_all(transform, Scope::TABLE)
    }
}
