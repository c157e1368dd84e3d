//! Taylor diagram statistics

use super::{paired_finite, pearson, sample_std};
use crate::models::{DailyTable, EtoMethod};
use serde::Serialize;
use tracing::{debug, info};

/// Spread and correlation of one candidate against the reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaylorStats {
    pub reference_std: f64,
    pub candidate_std: f64,
    /// `None` when either series has zero spread
    pub correlation: Option<f64>,
}

/// Statistics over the jointly finite rows, `None` below two of them
pub fn taylor_statistics(
    reference: &[Option<f64>],
    candidate: &[Option<f64>],
) -> Option<TaylorStats> {
    let (reference, candidate) = paired_finite(reference, candidate);
    let reference_std = sample_std(&reference)?;
    let candidate_std = sample_std(&candidate)?;
    let correlation = if reference_std == 0.0 || candidate_std == 0.0 {
        None
    } else {
        pearson(&reference, &candidate)
    };
    Some(TaylorStats {
        reference_std,
        candidate_std,
        correlation,
    })
}

/// Position of one method on the diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaylorPlacement {
    pub method: EtoMethod,
    pub std: f64,
    pub correlation: f64,
    /// Candidate spread over the reference's own spread
    pub normalized_std: Option<f64>,
    pub centered_rms_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaylorDiagram {
    pub reference: EtoMethod,
    pub reference_std: f64,
    pub placements: Vec<TaylorPlacement>,
    pub excluded: Vec<EtoMethod>,
}

/// Place every method with defined statistics.
///
/// The reference spread is taken over the reference's own finite values.
/// Returns `None` when the reference column is absent or has fewer than
/// two finite values.
pub fn taylor_diagram(
    table: &DailyTable,
    reference: EtoMethod,
    methods: &[EtoMethod],
) -> Option<TaylorDiagram> {
    let reference_values = table.column(reference.column_name())?;
    let own: Vec<f64> = reference_values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let reference_std = sample_std(&own)?;

    let mut placements = Vec::new();
    let mut excluded = Vec::new();
    for &method in methods.iter().filter(|m| **m != reference) {
        let Some(candidate) = table.column(method.column_name()) else {
            continue;
        };
        let placed = taylor_statistics(reference_values, candidate).and_then(|stats| {
            let correlation = stats.correlation?;
            let centered = (reference_std.powi(2) + stats.candidate_std.powi(2)
                - 2.0 * reference_std * stats.candidate_std * correlation)
                .max(0.0)
                .sqrt();
            Some(TaylorPlacement {
                method,
                std: stats.candidate_std,
                correlation,
                normalized_std: (reference_std > 0.0).then(|| stats.candidate_std / reference_std),
                centered_rms_difference: centered,
            })
        });
        match placed {
            Some(placement) => placements.push(placement),
            None => {
                debug!("{} has undefined Taylor statistics", method);
                excluded.push(method);
            }
        }
    }

    if !excluded.is_empty() {
        info!(
            "Excluded from Taylor diagram: {}",
            excluded
                .iter()
                .map(|m| m.short_id())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Some(TaylorDiagram {
        reference,
        reference_std,
        placements,
        excluded,
    })
}
