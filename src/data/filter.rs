use super::model::{CurvePoint, HazardConcentration, Keyed, Level, Measurement, Tables};
use crate::state::Selection;

// ---------------------------------------------------------------------------
// Filtered views of the loaded tables
// ---------------------------------------------------------------------------

/// Rows of the three tables that feed one render pass.
///
/// Views borrow from the loaded [`Tables`]; nothing is copied or mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredTables<'a> {
    /// CASRN of the first row of the antibiotic, read before the level filter.
    pub casrn: Option<&'a str>,
    /// Measurements of the selected antibiotic and level.
    pub measurements: Vec<&'a Measurement>,
    /// Curve points of the selected antibiotic, all levels.
    pub curves: Vec<&'a CurvePoint>,
    /// HC estimates of the selected antibiotic and level whose cutoff is visible.
    pub hazards: Vec<&'a HazardConcentration>,
}

/// Narrow all three tables to the current selection.
///
/// 1. every table → rows of the selected antibiotic
/// 2. measurements and HC estimates → rows of the selected level
///    (curves keep both levels; the chart splits them into focal/background)
/// 3. HC estimates → rows whose cutoff is ticked
pub fn filter_tables<'a>(tables: &'a Tables, selection: &Selection) -> FilteredTables<'a> {
    let antibiotic = selection.antibiotic.as_str();

    let measurements = for_antibiotic(&tables.measurements, antibiotic);
    let casrn = measurements.first().map(|m| m.casrn.as_str());
    let measurements = at_level(measurements, selection.level);

    let curves = for_antibiotic(&tables.curves, antibiotic);

    let hazards = at_level(for_antibiotic(&tables.hazards, antibiotic), selection.level)
        .into_iter()
        .filter(|h| selection.is_cutoff_visible(h.cutoff))
        .collect();

    FilteredTables {
        casrn,
        measurements,
        curves,
        hazards,
    }
}

/// Split curve points into (selected level, every other level).
pub fn split_curves<'a>(
    curves: &[&'a CurvePoint],
    level: Level,
) -> (Vec<&'a CurvePoint>, Vec<&'a CurvePoint>) {
    curves.iter().copied().partition(|c| c.level == level)
}

/// Distinct HC cutoffs for an antibiotic/level pair, in first-seen order.
pub fn distinct_cutoffs(tables: &Tables, antibiotic: &str, level: Level) -> Vec<f64> {
    let mut cutoffs: Vec<f64> = Vec::new();
    for h in at_level(for_antibiotic(&tables.hazards, antibiotic), level) {
        if h.cutoff.is_finite() && !cutoffs.contains(&h.cutoff) {
            cutoffs.push(h.cutoff);
        }
    }
    cutoffs
}

fn for_antibiotic<'a, T: Keyed>(rows: &'a [T], antibiotic: &str) -> Vec<&'a T> {
    rows.iter().filter(|r| r.antibiotic() == antibiotic).collect()
}

fn at_level<T: Keyed>(rows: Vec<&T>, level: Level) -> Vec<&T> {
    rows.into_iter().filter(|r| r.level() == level).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::sample_tables;

    #[test]
    fn test_filter_by_antibiotic_and_level() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables).unwrap();

        let view = filter_tables(&tables, &selection);
        assert_eq!(view.casrn, Some("26787-78-0"));
        assert_eq!(view.measurements.len(), 3);
        assert!(view
            .measurements
            .iter()
            .all(|m| m.antibiotic == "AMX" && m.level == Level::Species));
        // Curves keep both levels
        assert_eq!(view.curves.len(), 5);
        // No cutoff ticked
        assert!(view.hazards.is_empty());
    }

    #[test]
    fn test_visible_cutoffs_select_hazards() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables)
            .unwrap()
            .with_level(Level::Genus)
            .with_cutoff(0.1, true);

        let view = filter_tables(&tables, &selection);
        assert_eq!(view.hazards.len(), 1);
        assert_eq!(view.hazards[0].cutoff, 0.1);
        assert_eq!(view.hazards[0].hc, 0.2);
    }

    #[test]
    fn test_casrn_read_before_level_filter() {
        let mut tables = sample_tables();
        // Only genus rows for CIP: the level view is empty but the title still has a CASRN
        tables.measurements[5].level = Level::Genus;
        let selection = Selection::initial(&tables).unwrap().with_antibiotic("CIP");

        let view = filter_tables(&tables, &selection);
        assert!(view.measurements.is_empty());
        assert_eq!(view.casrn, Some("85721-33-1"));
    }

    #[test]
    fn test_curve_split_is_a_partition() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables).unwrap();
        let view = filter_tables(&tables, &selection);

        for level in Level::ALL {
            let (focal, background) = split_curves(&view.curves, level);
            assert!(focal.iter().all(|c| c.level == level));
            assert!(background.iter().all(|c| c.level != level));

            let mut union: Vec<&CurvePoint> = focal.iter().chain(&background).copied().collect();
            let mut original = view.curves.clone();
            let key = |c: &&CurvePoint| (c.level, c.msc.to_bits(), c.paf.to_bits());
            union.sort_by_key(key);
            original.sort_by_key(key);
            assert_eq!(union, original);
        }
    }

    #[test]
    fn test_distinct_cutoffs_first_seen() {
        let mut tables = sample_tables();
        tables.hazards.insert(
            0,
            crate::data::model::tests::hazard("AMX", Level::Genus, 0.5, 1.0),
        );
        tables
            .hazards
            .push(crate::data::model::tests::hazard("AMX", Level::Genus, 0.1, 0.3));

        assert_eq!(distinct_cutoffs(&tables, "AMX", Level::Genus), vec![0.5, 0.05, 0.1]);
        assert_eq!(distinct_cutoffs(&tables, "AMX", Level::Species), vec![0.05, 0.5]);
        assert!(distinct_cutoffs(&tables, "CIP", Level::Genus).is_empty());
    }
}
