//! Static contiguous partitioning of row indices across workers.

use std::ops::Range;

use crate::error::{JacobiError, Result};

/// Splits `[0, rows)` into `workers` contiguous, disjoint blocks.
///
/// The first `workers - 1` blocks hold `rows / workers` rows each and the last
/// block absorbs the remainder.
pub fn partition_rows(rows: usize, workers: usize) -> Result<Vec<Range<usize>>> {
    if workers == 0 || workers > rows {
        return Err(JacobiError::invalid_input(format!(
            "cannot split {rows} rows across {workers} workers"
        )));
    }

    let chunk = rows / workers;
    let ranges = (0..workers)
        .map(|worker| {
            let start = worker * chunk;
            let end = if worker + 1 == workers {
                rows
            } else {
                start + chunk
            };
            start..end
        })
        .collect();
    Ok(ranges)
}

/// Chunk length handed to the fork-join loop; never zero.
pub fn chunk_len(rows: usize, workers: usize) -> usize {
    (rows / workers.max(1)).max(1)
}
