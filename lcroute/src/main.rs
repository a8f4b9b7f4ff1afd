mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use itertools::Itertools;
use lcpath::{Deadline, Path};
use log::debug;
use options::{Cli, Command as CliCmd};
use raster::{GeoTransform, Grid, GridIndex};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path as FsPath,
    time::Duration,
};
use terrain::{slope, slope_from_transform, CostSurface};

fn main() -> Result<(), AnyError> {
    let Cli {
        elevation,
        res_x,
        res_y,
        min_cost,
        max_cost,
        penalty,
        timeout_ms,
        start,
        dest,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let dem = GridFile::<f64>::load(&elevation)?.into_grid()?;
    let degrees = match (res_x, res_y) {
        (Some(res_x), Some(res_y)) => slope(&dem, res_x, res_y)?,
        _ => slope_from_transform(&dem)?,
    };
    let surface = CostSurface::builder()
        .min_cost(min_cost)
        .max_cost(max_cost)
        .penalty(penalty)
        .build(&degrees)?;
    debug!(
        "cost surface; valid: {}, penalized: {}, slope range: {:?}",
        surface.valid_cells(),
        surface.penalty_cells(),
        surface.slope_range()
    );
    let cost = surface.grid();

    let start_idx = cost.to_index(start.0)?;
    let dest_idx = cost.to_index(dest.0)?;
    eprintln!(
        "start: {:?} -> {start_idx}, dest: {:?} -> {dest_idx}",
        start.0, dest.0
    );

    let builder = Path::builder().start(start_idx).end(dest_idx);
    let path = match timeout_ms {
        Some(ms) => builder
            .interrupt(Deadline::after(Duration::from_millis(ms)))
            .build(cost)?,
        None => builder.build(cost)?,
    };
    eprintln!(
        "cost: {}, cells: {}, turns: {}, ground length: {}",
        path.cost(),
        path.len(),
        turns(&path),
        path.ground_length(cost.transform())
    );

    match cmd {
        CliCmd::Csv => print_csv(&path, cost)?,
        CliCmd::Json => print_json(&path, cost)?,
        CliCmd::Mask { out } => GridFile::from(&path.rasterize(cost)?).save(&out)?,
    };
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// cargo run -- --elevation=dem.json --start=401250,4500120 --dest=409980,4493010 csv | tr ',' ' ' > ~/.tmp/route && gnuplot -p -e "plot '~/.tmp/route' using 4:5 with lines"
/// ```
fn print_csv(path: &Path, cost: &Grid<f64>) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Step,Row,Col,X,Y,Cost")?;
    for (step, (index, accumulated)) in path
        .cells()
        .iter()
        .zip(path.cumulative_costs(cost)?)
        .enumerate()
    {
        let GridIndex { row, col } = *index;
        let center = cost.to_coords(*index)?;
        let (x, y) = (center.x, center.y);
        writeln!(stdout, "{step},{row},{col},{x},{y},{accumulated}")?;
    }
    Ok(())
}

fn print_json(path: &Path, cost: &Grid<f64>) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonEntry {
        index: GridIndex,
        location: [f64; 2],
        cost: f64,
    }

    #[derive(Serialize)]
    struct JsonRoute {
        cost: f64,
        ground_length: f64,
        cells: Vec<JsonEntry>,
    }

    let cells = path
        .cells()
        .iter()
        .zip(path.cumulative_costs(cost)?)
        .map(|(index, accumulated)| -> Result<JsonEntry, AnyError> {
            let center = cost.to_coords(*index)?;
            Ok(JsonEntry {
                index: *index,
                location: [center.x, center.y],
                cost: accumulated,
            })
        })
        .collect::<Result<Vec<_>, AnyError>>()?;
    let route = JsonRoute {
        cost: path.cost(),
        ground_length: path.ground_length(cost.transform()),
        cells,
    };
    let json = serde_json::to_string(&route)?;
    println!("{json}");
    Ok(())
}

/// On-disk JSON representation of a [`Grid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GridFile<T> {
    width: usize,
    height: usize,
    transform: GeoTransform,
    #[serde(default)]
    nodata: Option<T>,
    data: Vec<T>,
}

impl<T> GridFile<T> {
    fn into_grid(self) -> Result<Grid<T>, AnyError> {
        let Self {
            width,
            height,
            transform,
            nodata,
            data,
        } = self;
        Ok(Grid::new(width, height, data, transform)?.with_nodata(nodata))
    }
}

impl<T: DeserializeOwned + Default> GridFile<T> {
    fn load(path: &FsPath) -> Result<Self, AnyError> {
        let reader = BufReader::new(File::open(path)?);
        let grid_file = serde_json::from_reader(reader)?;
        Ok(grid_file)
    }
}

impl<T: Serialize> GridFile<T> {
    fn save(&self, path: &FsPath) -> Result<(), AnyError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl<T: Clone> From<&Grid<T>> for GridFile<T> {
    fn from(grid: &Grid<T>) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            transform: *grid.transform(),
            nodata: grid.nodata().cloned(),
            data: grid.as_slice().to_vec(),
        }
    }
}

/// Number of direction changes along `path`.
fn turns(path: &Path) -> usize {
    path.cells()
        .iter()
        .tuple_windows()
        .map(|(a, b)| (b.row as isize - a.row as isize, b.col as isize - a.col as isize))
        .tuple_windows()
        .filter(|(prev, next)| prev != next)
        .count()
}

#[cfg(test)]
mod tests {
    use super::{turns, GridFile};
    use approx::assert_relative_eq;
    use lcpath::Path;
    use raster::{GeoTransform, Grid, GridIndex};
    use terrain::{slope_from_transform, CostSurface};

    const DEM_JSON: &str = r#"{
        "width": 4,
        "height": 3,
        "transform": { "a": 10.0, "b": 0.0, "c": 0.0, "d": 0.0, "e": -10.0, "f": 30.0 },
        "nodata": -32768.0,
        "data": [
            1.0, 1.0, 1.0, 1.0,
            1.0, 1.0, 1.0, 1.0,
            1.0, 1.0, 1.0, -32768.0
        ]
    }"#;

    #[test]
    fn test_grid_file_into_grid() {
        let grid_file: GridFile<f64> = serde_json::from_str(DEM_JSON).unwrap();
        let dem = grid_file.into_grid().unwrap();
        assert_eq!(dem.shape(), (3, 4));
        assert_eq!(dem.nodata(), Some(&-32768.0));
        assert!(!dem.is_valid(GridIndex::new(2, 3)));
        assert_eq!(dem.transform().resolution(), (10.0, 10.0));
    }

    #[test]
    fn test_grid_file_rejects_bad_shape() {
        let grid_file = GridFile {
            width: 4,
            height: 4,
            transform: GeoTransform::IDENTITY,
            nodata: None,
            data: vec![0.0_f64; 12],
        };
        assert!(grid_file.into_grid().is_err());
    }

    #[test]
    fn test_mask_grid_file() {
        let grid_file: GridFile<f64> = serde_json::from_str(DEM_JSON).unwrap();
        let dem = grid_file.into_grid().unwrap();
        let degrees = slope_from_transform(&dem).unwrap();
        let cost = CostSurface::builder().build(&degrees).unwrap().into_grid();
        let path = Path::builder()
            .start(GridIndex::new(0, 0))
            .end(GridIndex::new(0, 3))
            .build(&cost)
            .unwrap();
        assert_relative_eq!(path.cost(), 3.0);

        let mask = GridFile::from(&path.rasterize(&cost).unwrap());
        assert_eq!(mask.transform, *dem.transform());
        assert_eq!(mask.data.iter().map(|&v| usize::from(v)).sum::<usize>(), 4);
        let json = serde_json::to_string(&mask).unwrap();
        let reloaded: GridFile<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, mask);
    }

    #[test]
    fn test_turns() {
        let xform = GeoTransform::IDENTITY;
        let cost = Grid::filled(5, 5, 1.0_f64, xform).unwrap();
        let straight = Path::builder()
            .start(GridIndex::new(2, 0))
            .end(GridIndex::new(2, 4))
            .build(&cost)
            .unwrap();
        assert_eq!(turns(&straight), 0);

        let dogleg = Path::builder()
            .start(GridIndex::new(0, 0))
            .end(GridIndex::new(2, 4))
            .build(&cost)
            .unwrap();
        assert!(turns(&dogleg) >= 1);
    }
}
