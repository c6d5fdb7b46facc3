//! Inspect derived views of an in-memory dataset described in JSON.
//!
//! ```text
//! mdview dataset.json subset --selection /band_properties/validity=1 --array /ar
//! mdview dataset.json grid --array /v --x /x --y /y --algorithm nearest --resolution 0.5
//! mdview dataset.json ortho --array /p --index-x /gx --index-y /gy --offset -1
//! ```
//!
//! The result is printed on stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mdim_common::{Group, GroupSpec, MdArray, Window};
use virtual_array::{GeoTransform, GriddedOptions, ViewFactory};

#[derive(Parser, Debug)]
#[command(name = "mdview")]
#[command(about = "Read orthorectified, gridded and subset views of a dataset", long_about = None)]
struct Cli {
    /// Dataset description (JSON)
    dataset: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Restrict a dimension by value and read one array of the result
    Subset {
        /// Selection as /path/to/array=value
        #[arg(short, long)]
        selection: String,

        /// Full name of the array to read
        #[arg(short, long)]
        array: String,
    },

    /// Grid a point cloud and read one 2-D slice
    Grid {
        /// Array holding one value per point along its last dimension
        #[arg(short, long)]
        array: String,

        /// X coordinate array
        #[arg(long)]
        x: String,

        /// Y coordinate array
        #[arg(long)]
        y: String,

        /// Gridding algorithm with options (e.g. invdist:power=2)
        #[arg(long, default_value = "invdist")]
        algorithm: String,

        /// Grid resolution (estimated when omitted)
        #[arg(short, long)]
        resolution: Option<f64>,

        /// Accept point clouds above the configured limit
        #[arg(long)]
        accept_big: bool,

        /// Indices on the leading dimensions, comma separated
        #[arg(long)]
        slice: Option<String>,
    },

    /// Rectify an array through a geolocation lookup table
    Ortho {
        /// Array to rectify (Y, X, ...)
        #[arg(short, long)]
        array: String,

        /// Column index array
        #[arg(long)]
        index_x: String,

        /// Row index array
        #[arg(long)]
        index_y: String,

        /// Added to every index before lookup
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,

        /// origin_x,pixel_width,origin_y,pixel_height
        #[arg(long, allow_hyphen_values = true)]
        geo_transform: Option<String>,
    },
}

/// What gets printed for a view.
#[derive(Debug, Serialize)]
struct ViewOutput {
    name: String,
    dimensions: Vec<String>,
    shape: Vec<u64>,
    no_data: Option<f64>,
    values: Vec<f64>,
}

impl ViewOutput {
    fn read(array: &dyn MdArray, window: &Window) -> Result<Self> {
        let values = array
            .read_f64(window)
            .with_context(|| format!("Failed to read {}", array.full_name()))?;
        Ok(Self {
            name: array.full_name().to_string(),
            dimensions: array
                .dimensions()
                .iter()
                .map(|d| d.full_name().to_string())
                .collect(),
            shape: window.count.iter().map(|&c| c as u64).collect(),
            no_data: array.raw_no_data(),
            values,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let text = std::fs::read_to_string(&cli.dataset)
        .with_context(|| format!("Failed to read dataset {}", cli.dataset.display()))?;
    let root: Arc<dyn Group> = GroupSpec::from_json(&text)
        .and_then(|spec| spec.build())
        .with_context(|| format!("Invalid dataset {}", cli.dataset.display()))?;

    let factory = ViewFactory::from_env().context("Invalid configuration")?;
    let output = run(&factory, &root, cli.command)?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(factory: &ViewFactory, root: &Arc<dyn Group>, command: Commands) -> Result<ViewOutput> {
    match command {
        Commands::Subset { selection, array } => {
            let view = factory.subset(root, &selection)?;
            let array = view.open_array_from_full_name(&array)?;
            info!(array = %array.full_name(), shape = ?array.shape(), "Reading subset");
            ViewOutput::read(&*array, &Window::full(&array.shape()))
        }
        Commands::Grid {
            array,
            x,
            y,
            algorithm,
            resolution,
            accept_big,
            slice,
        } => {
            let mut options = GriddedOptions::default();
            if let Some(res) = resolution {
                options = options.with_resolution(res);
            }
            if accept_big {
                options = options.accept_big();
            }
            let gridded = factory.gridded(
                root.open_array_from_full_name(&array)?,
                &algorithm,
                root.open_array_from_full_name(&x)?,
                root.open_array_from_full_name(&y)?,
                &options,
            )?;

            let shape = gridded.shape();
            let lead = shape.len() - 2;
            let mut start = match slice {
                Some(text) => parse_list::<u64>(&text)?,
                None => vec![0; lead],
            };
            if start.len() != lead {
                bail!("--slice needs {} indices, got {}", lead, start.len());
            }
            start.extend([0, 0]);
            let mut count = vec![1usize; lead];
            count.extend([shape[lead] as usize, shape[lead + 1] as usize]);

            info!(geometry = ?gridded.geometry(), "Reading gridded slice");
            ViewOutput::read(&*gridded, &Window::contiguous(start, count))
        }
        Commands::Ortho {
            array,
            index_x,
            index_y,
            offset,
            geo_transform,
        } => {
            let gt = match geo_transform {
                Some(text) => match parse_list::<f64>(&text)?.as_slice() {
                    &[ox, dx, oy, dy] => GeoTransform::new(ox, dx, oy, dy),
                    other => bail!("--geo-transform needs 4 values, got {}", other.len()),
                },
                None => GeoTransform::default(),
            };
            let view = factory.orthorectified(
                root.open_array_from_full_name(&array)?,
                root.open_array_from_full_name(&index_x)?,
                root.open_array_from_full_name(&index_y)?,
                offset,
                gt,
            )?;
            ViewOutput::read(&*view, &Window::full(&view.shape()))
        }
    }
}

/// Parse a comma separated list.
fn parse_list<T>(text: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.split(',')
        .map(|item| {
            item.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid list item '{}'", item))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list::<u64>("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_list::<f64>("-0.5,1").unwrap(), vec![-0.5, 1.0]);
        assert!(parse_list::<u64>("1,x").is_err());
    }

    #[test]
    fn test_cli_parses_grid_command() {
        let cli = Cli::try_parse_from([
            "mdview",
            "data.json",
            "grid",
            "--array",
            "/v",
            "--x",
            "/x",
            "--y",
            "/y",
            "--resolution",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Grid {
                resolution,
                algorithm,
                ..
            } => {
                assert_eq!(resolution, Some(0.5));
                assert_eq!(algorithm, "invdist");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
