use anyhow::{anyhow, Error as AnyError};
use clap::{Parser, Subcommand};
use geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};
use terrain::PENALTY_COST;

/// Find least-cost routes across terrain.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Elevation grid, as a JSON document with `width`, `height`,
    /// `transform`, `nodata` and row-major `data`.
    #[arg(short, long)]
    pub elevation: PathBuf,

    /// Column spacing, in elevation units. Defaults to the grid
    /// transform's resolution.
    #[arg(long, requires = "res_y")]
    pub res_x: Option<f64>,

    /// Row spacing, in elevation units.
    #[arg(long, requires = "res_x")]
    pub res_y: Option<f64>,

    /// Cost of the flattest valid cell.
    #[arg(long, default_value_t = 1.0)]
    pub min_cost: f64,

    /// Cost of the steepest valid cell.
    #[arg(long, default_value_t = 10.0)]
    pub max_cost: f64,

    /// Cost assigned to cells with unknown slope.
    #[arg(long, default_value_t = PENALTY_COST)]
    pub penalty: f64,

    /// Abandon the search after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Start "x,y", in the grid's ground coordinates.
    #[arg(long)]
    pub start: XY,

    /// Destination "x,y", in the grid's ground coordinates.
    #[arg(long)]
    pub dest: XY,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Debug, Copy)]
pub struct XY(pub Coord<f64>);

impl FromStr for XY {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid x,y"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(Coord { x, y }))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print route cells to stdout.
    Csv,

    /// Print route as JSON to stdout.
    Json,

    /// Write a JSON grid marking the route's cells with 1.
    Mask {
        /// Output path.
        out: PathBuf,
    },
}
