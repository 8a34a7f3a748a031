// ---------------------------------------------------------------------------
// Application constants
// ---------------------------------------------------------------------------

pub const APP_TITLE: &str = "Timmerman Constraint Finder";

pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

pub const DISCLAIMER: &str = "Disclaimer: This tool is provided for reference and convenience only. \
It does not replace clinical judgment, institutional policies, or peer review. \
Users are responsible for verifying constraints against the source material and the patient's clinical context.";

/// Looked up relative to the working directory unless `--data` is given.
pub const DEFAULT_DATA_FILE: &str = "timmerman_constraints.csv";

/// Fraction count pre-selected when the table offers it.
pub const PREFERRED_FRACTION: u32 = 3;

/// Fallback for an absent contouring instruction / metric cell.
pub const NOT_GIVEN: &str = "Not given";

/// Column headers of the displayed / exported projection, in order.
pub const DISPLAY_COLUMNS: [&str; 6] = [
    "Type",
    "Contouring instructions",
    "Volume",
    "Volume max (Gy)",
    "Max point dose (Gy)",
    "Endpoint",
];
