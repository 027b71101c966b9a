//! Configuration for text extraction.

/// Separator policy for plain-text extraction.
///
/// Paragraphs (and tables, which are blocks too) are joined with the
/// paragraph separator; inside a table, cells of one row are joined with the
/// cell separator and rows with the row separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Placed between consecutive blocks
    pub paragraph_separator: String,
    /// Placed between cells of one table row
    pub cell_separator: String,
    /// Placed between table rows
    pub row_separator: String,
    /// Whether table text is part of the extracted text
    pub include_tables: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            paragraph_separator: "\n".to_string(),
            cell_separator: "\t".to_string(),
            row_separator: "\n".to_string(),
            include_tables: true,
        }
    }
}

impl ExtractOptions {
    /// Create a new `ExtractOptions` with default values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hanji::extract::ExtractOptions;
    ///
    /// let options = ExtractOptions::new();
    /// assert_eq!(options.cell_separator, "\t");
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the separator placed between blocks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hanji::extract::ExtractOptions;
    ///
    /// let options = ExtractOptions::new().with_paragraph_separator("\n\n");
    /// ```
    #[inline]
    pub fn with_paragraph_separator(mut self, separator: impl Into<String>) -> Self {
        self.paragraph_separator = separator.into();
        self
    }

    /// Set the separator placed between cells of a row.
    #[inline]
    pub fn with_cell_separator(mut self, separator: impl Into<String>) -> Self {
        self.cell_separator = separator.into();
        self
    }

    /// Set the separator placed between table rows.
    #[inline]
    pub fn with_row_separator(mut self, separator: impl Into<String>) -> Self {
        self.row_separator = separator.into();
        self
    }

    /// Set whether table text is extracted.
    ///
    /// Annotations inside tables are reported either way.
    #[inline]
    pub fn with_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }
}
