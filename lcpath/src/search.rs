use crate::{
    interrupt::{Interrupt, Never},
    neighbors::{is_diagonal, NEIGHBORS},
    LcpError, Path,
};
use log::debug;
use num_traits::{AsPrimitive, Float};
use raster::{Grid, GridIndex};
use rayon::prelude::*;
use std::{cmp::Ordering, collections::BinaryHeap};

/// Marks a cell with no recorded predecessor.
const NO_PRED: u8 = u8::MAX;

/// Default number of finalized cells between interrupt polls.
pub const DEFAULT_CHECK_INTERVAL: usize = 4096;

/// Configures and runs least-cost path searches.
///
/// Movement is allowed to any of the 8 surrounding cells; the grid
/// edge is impassable. Moving between adjacent cells `a` and `b`
/// costs `(cost[a] + cost[b]) / 2` times the step length (1, or √2
/// diagonally).
#[derive(Debug, Clone)]
pub struct PathBuilder<I = Never> {
    /// First cell of the path (required).
    start: Option<GridIndex>,

    /// Last cell of the path (required).
    end: Option<GridIndex>,

    /// Finalized cells between interrupt polls (defaults to
    /// [`DEFAULT_CHECK_INTERVAL`]).
    check_interval: usize,

    /// Polled during expansion (defaults to [`Never`]).
    interrupt: I,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            check_interval: DEFAULT_CHECK_INTERVAL,
            interrupt: Never,
        }
    }
}

impl<I> PathBuilder<I> {
    /// First cell of the path (required).
    #[must_use]
    pub fn start(mut self, index: GridIndex) -> Self {
        self.start = Some(index);
        self
    }

    /// Last cell of the path (required).
    #[must_use]
    pub fn end(mut self, index: GridIndex) -> Self {
        self.end = Some(index);
        self
    }

    /// Finalized cells between interrupt polls (defaults to
    /// [`DEFAULT_CHECK_INTERVAL`], clamped to at least 1).
    #[must_use]
    pub fn check_interval(mut self, cells: usize) -> Self {
        self.check_interval = cells.max(1);
        self
    }

    /// Replaces the interrupt polled during expansion.
    #[must_use]
    pub fn interrupt<J: Interrupt>(self, interrupt: J) -> PathBuilder<J> {
        PathBuilder {
            start: self.start,
            end: self.end,
            check_interval: self.check_interval,
            interrupt,
        }
    }
}

impl<I: Interrupt> PathBuilder<I> {
    /// Returns the least-cost path from `start` to `end` over `cost`.
    ///
    /// Every cost cell must be finite and positive; the first one that
    /// isn't fails the search with [`LcpError::InvalidCostValue`].
    pub fn build<T>(&self, cost: &Grid<T>) -> Result<Path, LcpError>
    where
        T: Float + AsPrimitive<f64>,
    {
        let start = self.start.ok_or(LcpError::Builder("start"))?;
        let end = self.end.ok_or(LcpError::Builder("end"))?;
        check_endpoint("start", start, cost)?;
        check_endpoint("end", end, cost)?;
        validate(cost)?;
        self.search(cost, start, end)
    }

    /// Runs one search per `(start, end)` pair over a shared `cost`
    /// grid, in parallel.
    ///
    /// `cost` is validated once up front; a failure there fails the
    /// whole batch. Per-query failures are reported in the returned
    /// vector, which is in `queries` order. Any `start`/`end` set on
    /// this builder is ignored.
    pub fn build_batch<T>(
        &self,
        cost: &Grid<T>,
        queries: &[(GridIndex, GridIndex)],
    ) -> Result<Vec<Result<Path, LcpError>>, LcpError>
    where
        T: Float + AsPrimitive<f64> + Send + Sync,
        I: Sync,
    {
        validate(cost)?;
        let now = std::time::Instant::now();
        let paths = queries
            .par_iter()
            .map(|&(start, end)| {
                check_endpoint("start", start, cost)?;
                check_endpoint("end", end, cost)?;
                self.search(cost, start, end)
            })
            .collect();
        debug!(
            "least cost batch; queries: {}, exec: {:?}",
            queries.len(),
            now.elapsed()
        );
        Ok(paths)
    }
}

/// Private API.
impl<I: Interrupt> PathBuilder<I> {
    /// Dijkstra expansion from `start`, stopping as soon as `end` is
    /// finalized. `cost` must already be validated and both endpoints
    /// in bounds.
    fn search<T>(
        &self,
        cost: &Grid<T>,
        start: GridIndex,
        end: GridIndex,
    ) -> Result<Path, LcpError>
    where
        T: Float + AsPrimitive<f64>,
    {
        let shape @ (height, width) = cost.shape();
        if start == end {
            return Ok(Path::new(vec![start], 0.0, shape, *cost.transform()));
        }

        let now = std::time::Instant::now();
        let cells = cost.as_slice();
        let src = start.row * width + start.col;
        let dst = end.row * width + end.col;

        // Per-search state, indexed like `cells`. `pred` holds the
        // index into `NEIGHBORS` of the move that reached each cell.
        let mut dist = vec![f64::INFINITY; cells.len()];
        let mut pred = vec![NO_PRED; cells.len()];
        let mut closed = vec![false; cells.len()];

        let mut frontier = BinaryHeap::new();
        let mut seq = 0_u64;
        let mut expanded = 0_usize;
        dist[src] = 0.0;
        frontier.push(Frontier {
            cost: 0.0,
            seq,
            idx: src,
        });

        while let Some(Frontier { cost: g, idx, .. }) = frontier.pop() {
            if closed[idx] {
                continue;
            }
            closed[idx] = true;
            expanded += 1;

            if idx == dst {
                let cells = trace(&pred, start, end, height, width);
                let path = Path::new(cells, g, shape, *cost.transform());
                debug!(
                    "least cost path; start: {start}, end: {end}, len: {}, cost: {g}, expanded: {expanded}, exec: {:?}",
                    path.len(),
                    now.elapsed()
                );
                return Ok(path);
            }

            if expanded % self.check_interval == 0 && self.interrupt.is_interrupted() {
                debug!("least cost path; interrupted after {expanded} cells");
                return Err(LcpError::Interrupted { expanded });
            }

            let here = GridIndex {
                row: idx / width,
                col: idx % width,
            };
            let here_cost: f64 = cells[idx].as_();

            for (dir, &offset) in NEIGHBORS.iter().enumerate() {
                let Some(next) = here.offset(offset, height, width) else {
                    continue;
                };
                let next_idx = next.row * width + next.col;
                if closed[next_idx] {
                    continue;
                }
                let next_cost: f64 = cells[next_idx].as_();
                let tentative = g + Path::edge_weight(here_cost, next_cost, is_diagonal(offset));
                if tentative < dist[next_idx] {
                    dist[next_idx] = tentative;
                    #[allow(clippy::cast_possible_truncation)]
                    let dir = dir as u8;
                    pred[next_idx] = dir;
                    seq += 1;
                    frontier.push(Frontier {
                        cost: tentative,
                        seq,
                        idx: next_idx,
                    });
                }
            }
        }

        Err(LcpError::Unreachable { start, end })
    }
}

/// Walks predecessors back from `end` and returns the cells in
/// start-to-end order.
fn trace(
    pred: &[u8],
    start: GridIndex,
    end: GridIndex,
    height: usize,
    width: usize,
) -> Vec<GridIndex> {
    let mut cells = vec![end];
    let mut here = end;
    while here != start {
        let (d_row, d_col) = NEIGHBORS[usize::from(pred[here.row * width + here.col])];
        // Predecessors were recorded from in-bounds cells, so stepping
        // back always lands inside the grid.
        match here.offset((-d_row, -d_col), height, width) {
            Some(prev) => here = prev,
            None => break,
        }
        cells.push(here);
    }
    cells.reverse();
    cells
}

fn check_endpoint<T>(
    which: &'static str,
    index: GridIndex,
    cost: &Grid<T>,
) -> Result<(), LcpError> {
    if cost.contains(index) {
        Ok(())
    } else {
        Err(LcpError::InvalidInput {
            which,
            index,
            height: cost.height(),
            width: cost.width(),
        })
    }
}

/// Fails on the first cell that is not a finite, positive cost.
fn validate<T>(cost: &Grid<T>) -> Result<(), LcpError>
where
    T: Float + AsPrimitive<f64>,
{
    match cost
        .indexed_iter()
        .find(|(_, v)| !(cost.is_valid_value(**v) && **v > T::zero()))
    {
        Some((index, value)) => Err(LcpError::InvalidCostValue {
            index,
            value: value.as_(),
        }),
        None => Ok(()),
    }
}

/// A frontier entry.
///
/// Ordered so `BinaryHeap`, a max-heap, pops the lowest accumulated
/// cost first and, among equal costs, the earliest pushed entry.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    seq: u64,
    idx: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

#[cfg(test)]
mod tests {
    use super::DEFAULT_CHECK_INTERVAL;
    use crate::{Deadline, LcpError, Path};
    use approx::assert_relative_eq;
    use raster::{GeoTransform, Grid, GridIndex};
    use std::{
        f64::consts::SQRT_2,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    fn uniform(width: usize, height: usize, cost: f64) -> Grid<f64> {
        Grid::filled(width, height, cost, GeoTransform::IDENTITY).unwrap()
    }

    /// Deterministic pseudo-random costs in `[1, 10)`.
    fn rough(width: usize, height: usize, seed: u64) -> Grid<f64> {
        let mut state = seed;
        Grid::from_fn(width, height, GeoTransform::IDENTITY, |_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            1.0 + (state >> 33) as f64 / (1_u64 << 31) as f64 * 9.0
        })
        .unwrap()
    }

    fn find(cost: &Grid<f64>, start: (usize, usize), end: (usize, usize)) -> Path {
        Path::builder()
            .start(start.into())
            .end(end.into())
            .build(cost)
            .unwrap()
    }

    /// Relaxes every edge until nothing changes; returns the cheapest
    /// cost from `start` to every cell.
    fn brute_force(cost: &Grid<f64>, start: GridIndex) -> Grid<f64> {
        let (height, width) = cost.shape();
        let mut dist = cost.map(|_| f64::INFINITY);
        dist[start] = 0.0;
        let mut changed = true;
        while changed {
            changed = false;
            for (here, _) in cost.indexed_iter() {
                for offset in crate::NEIGHBORS {
                    if let Some(next) = here.offset(offset, height, width) {
                        let w = Path::edge_weight(cost[here], cost[next], here.is_diagonal(next));
                        if dist[here] + w < dist[next] {
                            dist[next] = dist[here] + w;
                            changed = true;
                        }
                    }
                }
            }
        }
        dist
    }

    fn assert_well_formed(path: &Path, cost: &Grid<f64>, start: GridIndex, end: GridIndex) {
        assert_eq!(path.start(), start);
        assert_eq!(path.end(), end);
        for pair in path.cells().windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert_relative_eq!(
            path.recompute_cost(cost).unwrap(),
            path.cost(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_same_start_and_end() {
        let cost = rough(5, 5, 7);
        let path = find(&cost, (2, 3), (2, 3));
        assert_eq!(path.cells(), &[GridIndex::new(2, 3)]);
        assert_eq!(path.cost(), 0.0);

        let single = uniform(1, 1, 4.0);
        let path = find(&single, (0, 0), (0, 0));
        assert_eq!(path.len(), 1);
        assert_eq!(path.cost(), 0.0);
    }

    #[test]
    fn test_three_by_three_diagonal() {
        let cost = uniform(3, 3, 2.0);
        let path = find(&cost, (0, 0), (2, 2));
        assert_eq!(
            path.cells(),
            &[
                GridIndex::new(0, 0),
                GridIndex::new(1, 1),
                GridIndex::new(2, 2)
            ]
        );
        assert_relative_eq!(path.cost(), 2.0 * SQRT_2 * 2.0);
        assert_relative_eq!(path.cost(), 5.657, epsilon = 1e-3);
    }

    #[test]
    fn test_uniform_cost_scales_with_distance() {
        let c = 3.5;
        let cost = uniform(12, 10, c);

        let straight = find(&cost, (4, 1), (4, 9));
        assert_eq!(straight.len(), 9);
        assert_relative_eq!(straight.cost(), c * 8.0, max_relative = 1e-12);

        let diagonal = find(&cost, (0, 0), (6, 6));
        assert_eq!(diagonal.len(), 7);
        assert_relative_eq!(diagonal.cost(), c * 6.0 * SQRT_2, max_relative = 1e-12);

        // Off-axis: octile distance, 3 diagonal and 5 cardinal moves.
        let start = GridIndex::new(1, 2);
        let end = GridIndex::new(9, 5);
        let mixed = find(&cost, (1, 2), (9, 5));
        assert_well_formed(&mixed, &cost, start, end);
        assert_relative_eq!(
            mixed.cost(),
            c * (3.0 * SQRT_2 + 5.0),
            max_relative = 1e-12
        );
        for pair in mixed.cells().windows(2) {
            assert!(pair[1].row >= pair[0].row);
            assert!(pair[1].col >= pair[0].col);
        }
    }

    #[test]
    fn test_matches_brute_force() {
        for seed in [1, 2, 3] {
            let cost = rough(7, 6, seed);
            let start = GridIndex::new(5, 0);
            let end = GridIndex::new(0, 6);
            let path = find(&cost, (5, 0), (0, 6));
            assert_well_formed(&path, &cost, start, end);
            let best = brute_force(&cost, start);
            assert_relative_eq!(path.cost(), best[end], max_relative = 1e-9);
        }
    }

    #[test]
    fn test_cost_is_sum_of_edge_weights() {
        let cost = rough(13, 11, 5);
        let path = find(&cost, (10, 0), (0, 12));
        assert_eq!(path.cost(), path.recompute_cost(&cost).unwrap());
        assert_eq!(
            path.cumulative_costs(&cost).unwrap().last(),
            Some(&path.cost())
        );
    }

    #[test]
    fn test_reverse_query_is_symmetric() {
        let cost = rough(9, 7, 42);
        let there = find(&cost, (0, 0), (6, 8));
        let back = find(&cost, (6, 8), (0, 0));
        assert_relative_eq!(there.cost(), back.cost(), max_relative = 1e-9);
        assert_eq!(there.reversed().cells(), back.cells());
    }

    #[test]
    fn test_corridor_beats_direct_route() {
        const WALL: f64 = 9999.0;
        // Corridor along the top row and down the right column.
        let cost = Grid::from_fn(5, 5, GeoTransform::IDENTITY, |GridIndex { row, col }| {
            if row == 0 || col == 4 {
                1.0
            } else {
                WALL
            }
        })
        .unwrap();
        let path = find(&cost, (0, 0), (4, 4));
        assert!(path.cells().iter().all(|cell| cost[*cell] == 1.0));
        // The corner is cut diagonally between two corridor cells.
        assert_eq!(
            path.cells(),
            &[
                GridIndex::new(0, 0),
                GridIndex::new(0, 1),
                GridIndex::new(0, 2),
                GridIndex::new(0, 3),
                GridIndex::new(1, 4),
                GridIndex::new(2, 4),
                GridIndex::new(3, 4),
                GridIndex::new(4, 4),
            ]
        );
        assert_relative_eq!(path.cost(), 6.0 + SQRT_2, max_relative = 1e-12);
    }

    #[test]
    fn test_penalty_cells_are_crossed_when_unavoidable() {
        let cost = Grid::new(3, 1, vec![1.0, 9999.0, 1.0], GeoTransform::IDENTITY).unwrap();
        let path = find(&cost, (0, 0), (0, 2));
        assert_eq!(path.len(), 3);
        assert_relative_eq!(path.cost(), 10_000.0);
    }

    #[test]
    fn test_ties_resolve_to_first_discovery() {
        let cost = uniform(3, 3, 1.0);
        let expected = [
            GridIndex::new(0, 0),
            GridIndex::new(1, 0),
            GridIndex::new(2, 1),
        ];
        for _ in 0..3 {
            let path = find(&cost, (0, 0), (2, 1));
            assert_eq!(path.cells(), &expected);
            assert_relative_eq!(path.cost(), 1.0 + SQRT_2);
        }
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let cost = uniform(4, 3, 1.0);
        let err = Path::builder()
            .start(GridIndex::new(3, 0))
            .end(GridIndex::new(0, 0))
            .build(&cost)
            .unwrap_err();
        assert_eq!(
            err,
            LcpError::InvalidInput {
                which: "start",
                index: GridIndex::new(3, 0),
                height: 3,
                width: 4,
            }
        );
        let err = Path::builder()
            .start(GridIndex::new(0, 0))
            .end(GridIndex::new(0, 4))
            .build(&cost)
            .unwrap_err();
        assert!(matches!(err, LcpError::InvalidInput { which: "end", .. }));
    }

    #[test]
    fn test_missing_endpoints() {
        let cost = uniform(2, 2, 1.0);
        assert_eq!(
            Path::builder().end(GridIndex::new(0, 0)).build(&cost),
            Err(LcpError::Builder("start"))
        );
        assert_eq!(
            Path::builder().start(GridIndex::new(0, 0)).build(&cost),
            Err(LcpError::Builder("end"))
        );
    }

    #[test]
    fn test_invalid_cost_values() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -2.0] {
            let mut cost = uniform(4, 4, 1.0);
            cost[GridIndex::new(2, 1)] = bad;
            let err = Path::builder()
                .start(GridIndex::new(0, 0))
                .end(GridIndex::new(3, 3))
                .build(&cost)
                .unwrap_err();
            match err {
                LcpError::InvalidCostValue { index, value } => {
                    assert_eq!(index, GridIndex::new(2, 1));
                    assert!(value.is_nan() == bad.is_nan());
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_f32_costs() {
        let cost: Grid<f32> = Grid::filled(3, 3, 2.0, GeoTransform::IDENTITY).unwrap();
        let path = Path::builder()
            .start(GridIndex::new(0, 0))
            .end(GridIndex::new(2, 2))
            .build(&cost)
            .unwrap();
        assert_relative_eq!(path.cost(), 4.0 * SQRT_2, max_relative = 1e-12);
    }

    #[test]
    fn test_cancellation_flag() {
        let cost = uniform(20, 20, 1.0);
        let cancel = AtomicBool::new(false);
        let builder = Path::builder()
            .start(GridIndex::new(0, 0))
            .end(GridIndex::new(19, 19))
            .check_interval(1)
            .interrupt(&cancel);
        assert!(builder.build(&cost).is_ok());

        cancel.store(true, Ordering::Relaxed);
        assert_eq!(
            builder.build(&cost),
            Err(LcpError::Interrupted { expanded: 1 })
        );
    }

    #[test]
    fn test_deadline() {
        let cost = uniform(100, 100, 1.0);
        let result = Path::builder()
            .start(GridIndex::new(0, 0))
            .end(GridIndex::new(99, 99))
            .interrupt(Deadline::after(Duration::ZERO))
            .build(&cost);
        assert_eq!(
            result,
            Err(LcpError::Interrupted {
                expanded: DEFAULT_CHECK_INTERVAL
            })
        );
    }

    #[test]
    fn test_batch() {
        let cost = rough(16, 12, 9);
        let queries = [
            (GridIndex::new(0, 0), GridIndex::new(11, 15)),
            (GridIndex::new(11, 0), GridIndex::new(0, 15)),
            (GridIndex::new(12, 0), GridIndex::new(0, 0)),
            (GridIndex::new(5, 5), GridIndex::new(5, 5)),
        ];
        let results = Path::builder().build_batch(&cost, &queries).unwrap();
        assert_eq!(results.len(), queries.len());
        for ((start, end), result) in queries.iter().zip(&results) {
            let single = Path::builder().start(*start).end(*end).build(&cost);
            assert_eq!(&single, result);
        }
        assert!(matches!(results[2], Err(LcpError::InvalidInput { .. })));

        let mut broken = cost.clone();
        broken[GridIndex::new(3, 3)] = f64::NAN;
        assert!(matches!(
            Path::builder().build_batch(&broken, &queries),
            Err(LcpError::InvalidCostValue { .. })
        ));
    }
}
