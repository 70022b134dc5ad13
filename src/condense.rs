//! Point-of-interest condensation.
//!
//! A full summary can list dozens of places; a trip title wants a handful.
//! [`condense`] reduces an ordered POI list under two constraints, applied
//! in sequence: a minimum along-track spacing between entries, then a
//! maximum entry count. Both are greedy destructive reductions: entries
//! are only ever deleted, never reordered or inserted, and the start entry
//! at index 0 is never deleted.

use crate::error::{Result, SummaryError};
use crate::places::SettlementRanks;
use crate::summarize::Poi;

/// Constraints for [`condense`].
#[derive(Debug, Clone)]
pub struct CondenseOptions {
    /// Minimum along-track distance (km) between consecutive entries.
    pub min_spacing_km: Option<f64>,
    /// Maximum number of entries to keep.
    pub max_count: Option<usize>,
    /// Settlement ranking used as deletion priority; lower-priority entries
    /// are deleted first.
    pub priorities: SettlementRanks,
}

impl Default for CondenseOptions {
    fn default() -> Self {
        Self {
            min_spacing_km: None,
            max_count: None,
            priorities: SettlementRanks::condense_priority(),
        }
    }
}

impl CondenseOptions {
    fn validate(&self) -> Result<()> {
        if let Some(spacing) = self.min_spacing_km {
            if !spacing.is_finite() || spacing < 0.0 {
                return Err(SummaryError::InvalidConstraint {
                    message: format!("minimum spacing must be non-negative, got {spacing}"),
                });
            }
        }
        if self.max_count == Some(0) {
            return Err(SummaryError::InvalidConstraint {
                message: "maximum count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Reduce an ordered POI list under the given constraints.
///
/// The spacing constraint is applied first, then the count constraint.
/// Input with fewer than two entries is returned unchanged.
pub fn condense(pois: Vec<Poi>, options: &CondenseOptions) -> Result<Vec<Poi>> {
    options.validate()?;
    if pois.len() < 2 {
        return Ok(pois);
    }
    let mut pois = pois;
    if let Some(spacing) = options.min_spacing_km {
        condense_min_spacing(&mut pois, spacing, &options.priorities);
    }
    if let Some(max_count) = options.max_count {
        condense_max_count(&mut pois, max_count, &options.priorities);
    }
    Ok(pois)
}

/// Delete one entry of every adjacent pair closer than `spacing`, restarting
/// the scan after each deletion until no pair violates the constraint.
///
/// Deletion choice: never index 0; otherwise the lower-priority entry, the
/// later one on ties.
fn condense_min_spacing(pois: &mut Vec<Poi>, spacing: f64, priorities: &SettlementRanks) {
    'scan: loop {
        for i in 0..pois.len().saturating_sub(1) {
            if pois[i + 1].distance - pois[i].distance < spacing {
                let victim = if i == 0 {
                    i + 1
                } else {
                    let earlier = priorities.rank(&pois[i].kind);
                    let later = priorities.rank(&pois[i + 1].kind);
                    if earlier < later {
                        i
                    } else {
                        i + 1
                    }
                };
                remove_poi(pois, victim);
                continue 'scan;
            }
        }
        return;
    }
}

/// Repeatedly delete an entry from the closest adjacent pair until at most
/// `max_count` entries remain.
///
/// Deletion choice for the closest pair: never index 0; for the final pair
/// of the list, the lower-priority entry (later on ties); otherwise the
/// lower-priority entry, and on a priority tie the entry whose outer
/// neighbor gap is shorter (the later entry when those gaps are equal too).
fn condense_max_count(pois: &mut Vec<Poi>, max_count: usize, priorities: &SettlementRanks) {
    while pois.len() > max_count {
        let mut min_i = 0;
        let mut min_gap = f64::INFINITY;
        for i in 0..pois.len() - 1 {
            let gap = pois[i + 1].distance - pois[i].distance;
            if gap < min_gap {
                min_i = i;
                min_gap = gap;
            }
        }

        let earlier = priorities.rank(&pois[min_i].kind);
        let later = priorities.rank(&pois[min_i + 1].kind);
        let victim = if min_i == 0 || later < earlier {
            min_i + 1
        } else if earlier < later {
            min_i
        } else if min_i == pois.len() - 2 {
            // Last pair with equal priorities: the later entry goes.
            min_i + 1
        } else {
            // Equal priorities on an interior pair: compare the gaps on the
            // outside of the pair and delete on the shorter side.
            let gap_before = pois[min_i].distance - pois[min_i - 1].distance;
            let gap_after = pois[min_i + 2].distance - pois[min_i + 1].distance;
            if gap_before < gap_after {
                min_i
            } else {
                min_i + 1
            }
        };
        remove_poi(pois, victim);
    }
}

fn remove_poi(pois: &mut Vec<Poi>, index: usize) {
    let poi = pois.remove(index);
    log::debug!("condense: dropping {} ({:.1} km)", poi.name, poi.distance);
}
