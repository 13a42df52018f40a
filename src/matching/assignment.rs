use tracing::instrument;

use super::Scorer;
use crate::mapping::{Fragment, MappingError};

/// Pairs every generated id with a reference id by identifier similarity.
///
/// The highest remaining score is committed first. All remaining pairs
/// scoring within `tolerance` of it form a tie group; if the tie group is a
/// set of disjoint pairs, all of them are committed together, otherwise the
/// scores carry no discriminating information and the whole category is
/// rejected. Rejection never resolves ties by input order.
///
/// # Errors
///
/// Returns [`MappingError::CountMismatch`] if the two sides differ in size,
/// and [`MappingError::Tied`] if a tie group is ambiguous. Both name every
/// reference id of the category.
#[instrument(skip_all, fields(category = %category, n = generated.len()))]
pub fn solve<S>(
    category: &str,
    generated: &[&str],
    reference: &[&str],
    scorer: &S,
    tolerance: f64,
) -> Result<Fragment, MappingError>
where
    S: Scorer + ?Sized,
{
    let unmatched = || reference.iter().map(ToString::to_string).collect();

    if generated.len() != reference.len() {
        return Err(MappingError::CountMismatch {
            category: category.to_string(),
            generated: generated.len(),
            reference: reference.len(),
            unmatched: unmatched(),
        });
    }

    let scores: Vec<Vec<f64>> = generated
        .iter()
        .map(|g| reference.iter().map(|r| scorer.score(g, r)).collect())
        .collect();

    let mut row_open = vec![true; generated.len()];
    let mut column_open = vec![true; reference.len()];
    let mut assigned = vec![None; generated.len()];
    let mut remaining = generated.len();

    while remaining > 0 {
        let (rows, columns) = (&row_open, &column_open);
        let open_cells = move || {
            (0..generated.len())
                .filter(move |&i| rows[i])
                .flat_map(move |i| (0..reference.len()).map(move |j| (i, j)))
                .filter(move |&(_, j)| columns[j])
        };

        let best = open_cells()
            .map(|(i, j)| scores[i][j])
            .fold(f64::NEG_INFINITY, f64::max);
        let group: Vec<(usize, usize)> = open_cells()
            .filter(|&(i, j)| best - scores[i][j] <= tolerance)
            .collect();

        if !is_disjoint(&group) {
            tracing::debug!(
                "{category}: {} pairs tie at score {best:.4}; rejecting category",
                group.len()
            );
            return Err(MappingError::Tied {
                category: category.to_string(),
                unmatched: unmatched(),
            });
        }
        if group.is_empty() {
            // every remaining score is NaN
            return Err(MappingError::Tied {
                category: category.to_string(),
                unmatched: unmatched(),
            });
        }

        for (i, j) in group {
            row_open[i] = false;
            column_open[j] = false;
            assigned[i] = Some(j);
            remaining -= 1;
        }
    }

    let mut fragment = Fragment::new(category);
    for (i, j) in assigned.into_iter().enumerate() {
        if let Some(j) = j {
            fragment.push(generated[i], reference[j]);
        }
    }
    Ok(fragment)
}

fn is_disjoint(group: &[(usize, usize)]) -> bool {
    let mut rows = std::collections::HashSet::new();
    let mut columns = std::collections::HashSet::new();
    group
        .iter()
        .all(|&(i, j)| rows.insert(i) && columns.insert(j))
}
