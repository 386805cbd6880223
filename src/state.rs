use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::DataPaths;
use crate::data::cache::TableCache;
use crate::data::filter::distinct_cutoffs;
use crate::data::model::{Level, Tables};

pub const TEXT_SIZE_RANGE: RangeInclusive<u8> = 5..=15;
pub const DEFAULT_TEXT_SIZE: u8 = 5;

// ---------------------------------------------------------------------------
// Selection – the user's choices for one render pass
// ---------------------------------------------------------------------------

/// Styling of the per-organism name labels.
///
/// Only exists while names are shown, so neither field can leak into a
/// chart drawn without labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameLabels {
    pub color_by_genus: bool,
    pub text_size: u8,
}

impl Default for NameLabels {
    fn default() -> Self {
        Self {
            color_by_genus: false,
            text_size: DEFAULT_TEXT_SIZE,
        }
    }
}

/// Immutable snapshot of every control in the side panel.
///
/// Each `with_*` method consumes the selection and returns the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub antibiotic: String,
    pub level: Level,
    /// `None` when organism names are hidden.
    pub names: Option<NameLabels>,
    /// Ticked HC cutoffs, in the order they were ticked.
    pub visible_cutoffs: Vec<f64>,
}

impl Selection {
    /// First antibiotic, species level, names on, no HC lines.
    pub fn initial(tables: &Tables) -> Option<Self> {
        let antibiotic = tables.antibiotics().first()?.to_string();
        Some(Self {
            antibiotic,
            level: Level::default(),
            names: Some(NameLabels::default()),
            visible_cutoffs: Vec::new(),
        })
    }

    /// Switching antibiotic forgets the ticked cutoffs.
    pub fn with_antibiotic(mut self, antibiotic: &str) -> Self {
        if self.antibiotic != antibiotic {
            self.antibiotic = antibiotic.to_string();
            self.visible_cutoffs.clear();
        }
        self
    }

    /// Switching level forgets the ticked cutoffs and shows names again.
    /// Label styling survives only if names were already on.
    pub fn with_level(mut self, level: Level) -> Self {
        if self.level != level {
            self.level = level;
            self.visible_cutoffs.clear();
            self.names = Some(self.names.unwrap_or_default());
        }
        self
    }

    pub fn with_show_names(mut self, show: bool) -> Self {
        self.names = match (show, self.names) {
            (true, Some(labels)) => Some(labels),
            (true, None) => Some(NameLabels::default()),
            (false, _) => None,
        };
        self
    }

    pub fn with_color_by_genus(mut self, on: bool) -> Self {
        if let Some(labels) = &mut self.names {
            labels.color_by_genus = on;
        }
        self
    }

    pub fn with_text_size(mut self, size: u8) -> Self {
        if let Some(labels) = &mut self.names {
            labels.text_size = size.clamp(*TEXT_SIZE_RANGE.start(), *TEXT_SIZE_RANGE.end());
        }
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64, visible: bool) -> Self {
        let present = self.is_cutoff_visible(cutoff);
        if visible && !present {
            self.visible_cutoffs.push(cutoff);
        } else if !visible && present {
            self.visible_cutoffs.retain(|c| *c != cutoff);
        }
        self
    }

    pub fn show_names(&self) -> bool {
        self.names.is_some()
    }

    pub fn is_cutoff_visible(&self, cutoff: f64) -> bool {
        self.visible_cutoffs.contains(&cutoff)
    }
}

// ---------------------------------------------------------------------------
// Cutoff checkboxes
// ---------------------------------------------------------------------------

/// One "show HCx" checkbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffToggle {
    pub cutoff: f64,
    pub checked: bool,
}

impl CutoffToggle {
    /// `0.05` → `"show HC5"`. The percentage is truncated, so `0.29`
    /// (28.999… in binary) reads `HC28`.
    pub fn label(&self) -> String {
        format!("show HC{}", (self.cutoff * 100.0).trunc() as i64)
    }
}

/// One checkbox per distinct cutoff of the selected antibiotic and level.
pub fn cutoff_toggles(tables: &Tables, selection: &Selection) -> Vec<CutoffToggle> {
    distinct_cutoffs(tables, &selection.antibiotic, selection.level)
        .into_iter()
        .map(|cutoff| CutoffToggle {
            cutoff,
            checked: selection.is_cutoff_visible(cutoff),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything the UI keeps between frames.
pub struct AppState {
    /// Memoized loads, keyed by path set.
    pub cache: TableCache,

    /// Paths of the tables currently shown.
    pub paths: DataPaths,

    /// Tables currently shown (read-only snapshot from `cache`).
    pub tables: Arc<Tables>,

    /// Current control values.
    pub selection: Selection,

    /// Whether the filtered rows are listed under the chart.
    pub show_data: bool,

    /// Where the next screenshot should be written, once it arrives.
    pub pending_screenshot: Option<PathBuf>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Load the startup path set. Failure here is fatal for the session.
    pub fn load(paths: DataPaths) -> Result<Self> {
        let mut cache = TableCache::new();
        let tables = cache.get_or_load(&paths)?;
        Self::with_tables(cache, paths, tables)
    }

    fn with_tables(cache: TableCache, paths: DataPaths, tables: Arc<Tables>) -> Result<Self> {
        let selection = Selection::initial(&tables)
            .ok_or_else(|| anyhow::anyhow!("no antibiotics in {}", paths.msc.display()))?;
        Ok(Self {
            cache,
            paths,
            tables,
            selection,
            show_data: false,
            pending_screenshot: None,
            status_message: None,
        })
    }

    /// Switch to another path set. On failure the current tables stay.
    pub fn open(&mut self, paths: DataPaths) {
        let loaded = self.cache.get_or_load(&paths).and_then(|tables| {
            let selection = Selection::initial(&tables)
                .ok_or_else(|| anyhow::anyhow!("no antibiotics in {}", paths.msc.display()))?;
            Ok((tables, selection))
        });

        match loaded {
            Ok((tables, selection)) => {
                log::info!("Switched to tables in {}", paths.msc.display());
                self.tables = tables;
                self.selection = selection;
                self.paths = paths;
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load tables: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
