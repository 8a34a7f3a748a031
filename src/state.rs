use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use timmerman_finder::data::cache::DatasetCache;
use timmerman_finder::data::filter::{
    default_fraction, fraction_options, organ_options, resolve_organ, select,
};
use timmerman_finder::data::model::{Dataset, ResultSet, StructuralFilter};
use timmerman_finder::export::ExportFormat;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The session's selections and the rows they produce, independent of
/// rendering. Every setter re-runs the query.
pub struct AppState {
    /// Constraint table on disk.
    pub data_path: PathBuf,

    cache: DatasetCache,

    /// Loaded table (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    pub fraction_options: Vec<u32>,
    pub fraction: Option<u32>,

    pub filter: StructuralFilter,

    /// Organs offered for the current (fraction, filter).
    pub organ_options: Vec<String>,
    pub organ: Option<String>,

    /// Rows for the current selection. None when nothing can be selected.
    pub result: Option<ResultSet>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(data_path: PathBuf) -> Self {
        Self {
            data_path,
            cache: DatasetCache::new(),
            dataset: None,
            fraction_options: Vec::new(),
            fraction: None,
            filter: StructuralFilter::default(),
            organ_options: Vec::new(),
            organ: None,
            result: None,
            status_message: None,
        }
    }

    /// Load (or reuse) the table at `data_path`, reporting failures in the
    /// status line.
    pub fn load(&mut self) {
        match self.try_load() {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("Failed to load constraint table: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn try_load(&mut self) -> Result<()> {
        let dataset = self
            .cache
            .get_or_load(&self.data_path)
            .with_context(|| format!("loading {}", self.data_path.display()))?;
        self.set_dataset(dataset);
        Ok(())
    }

    /// Switch to another table file. On failure the previous file and its
    /// rows stay selected.
    pub fn open(&mut self, path: PathBuf) {
        let previous = std::mem::replace(&mut self.data_path, path);
        match self.try_load() {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("Failed to open constraint table: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.data_path = previous;
            }
        }
    }

    /// Drop the cached table and read the file again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.load();
    }

    /// Ingest a dataset, keeping the current fraction when it is still offered.
    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.fraction_options = fraction_options(&dataset);
        self.fraction = match self.fraction {
            Some(fx) if self.fraction_options.contains(&fx) => Some(fx),
            _ => default_fraction(&self.fraction_options),
        };
        self.dataset = Some(dataset);
        self.refresh();
    }

    pub fn set_fraction(&mut self, fraction: u32) {
        self.fraction = Some(fraction);
        self.refresh();
    }

    pub fn set_filter(&mut self, filter: StructuralFilter) {
        self.filter = filter;
        self.refresh();
    }

    /// Select an organ. A stale choice makes the organ list re-derive.
    pub fn set_organ(&mut self, organ: String) {
        let (Some(dataset), Some(fraction)) = (&self.dataset, self.fraction) else {
            return;
        };
        match select(dataset, fraction, self.filter, &organ) {
            Ok(result) => {
                self.organ = Some(organ);
                self.result = Some(result);
            }
            Err(e) => {
                log::debug!("{e}; refreshing organ list");
                self.refresh();
            }
        }
    }

    /// Re-derive organ options for the current (fraction, filter), keep or
    /// reset the organ, and re-run the query.
    pub fn refresh(&mut self) {
        let (Some(dataset), Some(fraction)) = (self.dataset.clone(), self.fraction) else {
            self.organ_options.clear();
            self.organ = None;
            self.result = None;
            return;
        };

        self.organ_options = organ_options(&dataset, fraction, self.filter);
        self.organ = resolve_organ(&self.organ_options, self.organ.as_deref());

        self.result = match &self.organ {
            Some(organ) => match select(&dataset, fraction, self.filter, organ) {
                Ok(result) => Some(result),
                Err(e) => {
                    // Options were derived from the same inputs just above.
                    log::error!("Selection rejected after refresh: {e}");
                    None
                }
            },
            None => None,
        };
    }

    /// Write the current result to `path`. Returns the number of rows written.
    pub fn export_to(&self, format: ExportFormat, path: &Path) -> Result<usize> {
        let result = self
            .result
            .as_ref()
            .context("nothing selected to export")?;
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let today = chrono::Local::now().date_naive();
        let count = format
            .write(result, BufWriter::new(file), today)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported {count} rows to {}", path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = "\
Fractions,Type,Tissue,Contouring instructions,Volume,Volume max (Gy),Max point dose (Gy),Endpoint
1,Serial,Spinal Cord,,<0.35 cc,10,14,Myelitis
3,Serial,Spinal Cord,,<0.35 cc,18,21.9,Myelitis
3,Serial,Trachea,,<4 cc,15,30,Stenosis/fistula
5,Parallel,Lung,,1500 cc,12.5,,Basic lung function
*Avoid circumferential irradiation,,,,,,,
";

    fn state_with_table() -> (AppState, tempfile::NamedTempFile) {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(TABLE.as_bytes()).unwrap();
        tmp.flush().unwrap();
        let mut state = AppState::new(tmp.path().to_path_buf());
        state.load();
        (state, tmp)
    }

    #[test]
    fn test_load_picks_preferred_fraction_and_first_organ() {
        let (state, _tmp) = state_with_table();
        assert!(state.status_message.is_none());
        assert_eq!(state.fraction_options, vec![1, 3, 5]);
        assert_eq!(state.fraction, Some(3));
        assert_eq!(state.organ_options, vec!["Lung", "Spinal Cord", "Trachea"]);
        assert_eq!(state.organ.as_deref(), Some("Lung"));
        assert_eq!(state.result.as_ref().unwrap().rows.len(), 1);
    }

    #[test]
    fn test_filter_change_resets_stale_organ() {
        let (mut state, _tmp) = state_with_table();
        state.set_organ("Lung".to_string());
        state.set_filter(StructuralFilter::SerialOnly);
        assert_eq!(state.organ_options, vec!["Spinal Cord", "Trachea"]);
        assert_eq!(state.organ.as_deref(), Some("Spinal Cord"));
    }

    #[test]
    fn test_fraction_change_keeps_valid_organ() {
        let (mut state, _tmp) = state_with_table();
        state.set_organ("Spinal Cord".to_string());
        state.set_fraction(1);
        assert_eq!(state.organ.as_deref(), Some("Spinal Cord"));
        let rows = &state.result.as_ref().unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].volume_max_gy, "10");
    }

    #[test]
    fn test_stale_organ_selection_refreshes() {
        let (mut state, _tmp) = state_with_table();
        state.set_fraction(1);
        state.set_organ("Trachea".to_string());
        assert_eq!(state.organ_options, vec!["Lung", "Spinal Cord"]);
        assert_eq!(state.organ.as_deref(), Some("Lung"));
    }

    #[test]
    fn test_load_failure_sets_status() {
        let mut state = AppState::new(PathBuf::from("/no/such/table.csv"));
        state.load();
        assert!(state.dataset.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }

    #[test]
    fn test_failed_open_keeps_previous_table() {
        let (mut state, tmp) = state_with_table();
        let rows_before = state.dataset.as_ref().unwrap().len();

        state.open(PathBuf::from("/no/such/table.csv"));

        assert_eq!(state.data_path, tmp.path());
        assert_eq!(state.dataset.as_ref().unwrap().len(), rows_before);
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }

    #[test]
    fn test_export_to_file() {
        let (state, _tmp) = state_with_table();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let count = state.export_to(ExportFormat::Csv, &path).unwrap();
        assert_eq!(count, 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Basic lung function"));
    }
}
