use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::NOT_GIVEN;

// ---------------------------------------------------------------------------
// StructureKind – serial / parallel classification of an organ
// ---------------------------------------------------------------------------

/// Canonical classification of a row's `Type` cell.
///
/// The original text is kept on the row for display; this is only used for
/// filter comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureKind {
    Serial,
    Parallel,
    /// Anything else the table carries. Passes through `All`, never matches
    /// `Serial only` / `Parallel only`.
    Other,
}

impl StructureKind {
    /// Case-insensitive, whitespace-tolerant classification.
    pub fn classify(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("serial") {
            StructureKind::Serial
        } else if label.eq_ignore_ascii_case("parallel") {
            StructureKind::Parallel
        } else {
            StructureKind::Other
        }
    }

    /// Lowercase canonical name, `None` for unrecognised types.
    pub fn canonical(self) -> Option<&'static str> {
        match self {
            StructureKind::Serial => Some("serial"),
            StructureKind::Parallel => Some("parallel"),
            StructureKind::Other => None,
        }
    }
}

// ---------------------------------------------------------------------------
// StructuralFilter – the "Show" radio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralFilter {
    #[default]
    All,
    SerialOnly,
    ParallelOnly,
}

impl StructuralFilter {
    pub const OPTIONS: [StructuralFilter; 3] = [
        StructuralFilter::All,
        StructuralFilter::SerialOnly,
        StructuralFilter::ParallelOnly,
    ];

    /// Machine name: `all`, `serial_only`, `parallel_only`.
    pub fn as_str(self) -> &'static str {
        match self {
            StructuralFilter::All => "all",
            StructuralFilter::SerialOnly => "serial_only",
            StructuralFilter::ParallelOnly => "parallel_only",
        }
    }

    /// Label shown next to the radio button.
    pub fn label(self) -> &'static str {
        match self {
            StructuralFilter::All => "All",
            StructuralFilter::SerialOnly => "Serial only",
            StructuralFilter::ParallelOnly => "Parallel only",
        }
    }

    /// Whether a row of the given kind survives this filter.
    pub fn admits(self, kind: StructureKind) -> bool {
        match self {
            StructuralFilter::All => true,
            StructuralFilter::SerialOnly => kind == StructureKind::Serial,
            StructuralFilter::ParallelOnly => kind == StructureKind::Parallel,
        }
    }
}

impl fmt::Display for StructuralFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructuralFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalised.as_str() {
            "all" => Ok(StructuralFilter::All),
            "serial_only" | "serial" => Ok(StructuralFilter::SerialOnly),
            "parallel_only" | "parallel" => Ok(StructuralFilter::ParallelOnly),
            _ => Err(format!("unknown structural filter '{s}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// ConstraintRow – one row of the reference table
// ---------------------------------------------------------------------------

/// A single normalised row. Text fields are never absent: missing cells are
/// empty strings, a missing contouring instruction is `"Not given"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintRow {
    /// `None` when the source cell was blank or not a whole number.
    pub fractions: Option<u32>,
    pub tissue: String,
    /// Trimmed `Type` text, case as given.
    #[serde(rename = "type")]
    pub type_label: String,
    pub contouring_instructions: String,
    pub volume: String,
    pub volume_max_gy: String,
    pub max_point_dose_gy: String,
    pub endpoint: String,
    /// `Occ` column, ordering key within an organ.
    pub occurrence: Option<f64>,
    /// Position among the data records of the source file (0-based).
    #[serde(skip)]
    pub source_index: usize,
}

impl ConstraintRow {
    pub fn kind(&self) -> StructureKind {
        StructureKind::classify(&self.type_label)
    }

    /// Re-apply the table invariants: trimmed tissue and type, a contouring
    /// fallback, and no footnote / legend / blank-tissue rows.
    fn normalised(mut self) -> Option<Self> {
        self.tissue = self.tissue.trim().to_string();
        if artifact_reason(&self.tissue).is_some() {
            return None;
        }
        self.type_label = self.type_label.trim().to_string();
        if self.contouring_instructions.trim().is_empty() {
            self.contouring_instructions = NOT_GIVEN.to_string();
        }
        Some(self)
    }

    /// Cells in the order of [`DISPLAY_COLUMNS`](crate::config::DISPLAY_COLUMNS).
    pub fn display_cells(&self) -> [&str; 6] {
        [
            self.type_label.as_str(),
            self.contouring_instructions.as_str(),
            self.volume.as_str(),
            self.volume_max_gy.as_str(),
            self.max_point_dose_gy.as_str(),
            self.endpoint.as_str(),
        ]
    }
}

/// Why a tissue cell is not a real organ, if it isn't. Table extraction
/// leaves footnotes (`*…`), the abbreviations legend and blank rows behind.
pub(crate) fn artifact_reason(tissue: &str) -> Option<&'static str> {
    if tissue.is_empty() {
        Some("blank tissue")
    } else if tissue.starts_with('*') {
        Some("footnote")
    } else if tissue.to_lowercase().contains("abbreviations") {
        Some("abbreviations legend")
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The validated, read-only reference table.
///
/// There is no way to mutate rows after construction; share it behind an
/// `Arc` across sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rows: Vec<ConstraintRow>,
    has_occurrence_column: bool,
}

impl Dataset {
    /// Only the loader builds datasets; rows breaking the table invariants
    /// are normalised or dropped here as well.
    pub(crate) fn new(rows: Vec<ConstraintRow>, has_occurrence_column: bool) -> Self {
        Dataset {
            rows: rows.into_iter().filter_map(ConstraintRow::normalised).collect(),
            has_occurrence_column,
        }
    }

    /// Rows in source order.
    pub fn rows(&self) -> &[ConstraintRow] {
        &self.rows
    }

    /// Whether the source carried an `Occ` column.
    pub fn has_occurrence_column(&self) -> bool {
        self.has_occurrence_column
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Query / ResultSet – what the UI asks and what export receives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub fraction: u32,
    pub filter: StructuralFilter,
    pub organ: String,
}

/// Ordered rows for one query plus the query itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub query: Query,
    pub rows: Vec<ConstraintRow>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
