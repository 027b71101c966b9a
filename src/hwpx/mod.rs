//! HWPX packages.
//!
//! An HWPX document is a ZIP archive of XML parts. [`read`] resolves the
//! section parts from the package manifest and folds them, in spine order,
//! into one [`StructureModel`]; the raw archive and section texts are kept
//! in an [`HwpxSource`] so [`write`] can rewrite only the edited parts.
//!
//! # Example
//!
//! ```no_run
//! use hanji::hwpx;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("report.hwpx")?;
//! let (model, source) = hwpx::read(bytes)?;
//! println!("{} blocks in {} sections", model.blocks().len(), source.section_count());
//! # Ok(())
//! # }
//! ```

mod package;
mod parser;
mod template;
mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::common::Result;
use crate::model::StructureModel;
use package::Package;

pub use template::blank;
pub use writer::write;

/// One section part and its raw XML.
#[derive(Debug, Clone)]
pub(crate) struct SectionPart {
    pub(crate) name: String,
    pub(crate) xml: String,
}

/// Source state kept for writing an HWPX package back.
#[derive(Debug, Clone)]
pub struct HwpxSource {
    bytes: Vec<u8>,
    sections: Vec<SectionPart>,
}

impl HwpxSource {
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Archive names of the section parts, in reading order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|part| part.name.as_str())
    }
}

/// Parse an HWPX package held in memory.
pub fn read(bytes: Vec<u8>) -> Result<(StructureModel, HwpxSource)> {
    let (sections, numbering) = {
        let mut package = Package::open(&bytes)?;
        let numbering = package.note_numbering()?;
        let mut sections = Vec::new();
        for name in package.section_names()? {
            let xml = package.read_string(&name)?;
            sections.push(SectionPart { name, xml });
        }
        (sections, numbering)
    };

    let model = parser::build_model(&sections, numbering)?;
    Ok((model, HwpxSource { bytes, sections }))
}
