use docopt::Docopt;
use itertools::Itertools;
use ndmazes::{renderers, units::CellsCount, MazeEngine};
use serde_derive::Deserialize;
use std::{
    fs::File,
    io::{self, BufReader, BufWriter},
    num::ParseIntError,
    str::FromStr,
};
use tracing::info;

const USAGE: &str = "N-dimensional mazes

Usage:
    ndmazes_driver -h | --help
    ndmazes_driver generate --sizes=<list> [--seed=<n>] [--start=<list>] [--end=<list>] [--out=<path>] [--layer=<list>]
    ndmazes_driver show <path> [--layer=<list>]
    ndmazes_driver info <path>

Options:
    -h --help          Show this screen.
    --sizes=<list>     Comma separated axis lengths, at least two, e.g. 10,10,3.
    --seed=<n>         Seed the random source for a reproducible maze.
    --start=<list>     Comma separated start coordinate. Components outside the grid are clamped onto it.
    --end=<list>       Comma separated end coordinate. Components outside the grid are clamped onto it.
    --out=<path>       Save the maze to a file in the binary maze format.
    --layer=<list>     Comma separated coordinates of every axis but the last two, selecting the 2-D layer to draw. Defaults to the first layer.
";
#[derive(Debug, Deserialize)]
struct MazeArgs {
    cmd_generate: bool,
    cmd_show: bool,
    cmd_info: bool,
    arg_path: String,
    flag_sizes: String,
    flag_seed: Option<u64>,
    flag_start: Option<String>,
    flag_end: Option<String>,
    flag_out: String,
    flag_layer: Option<String>,
}

mod errors {
    use error_chain::*;
    error_chain! {

        links {
            Maze(::ndmazes::errors::Error, ::ndmazes::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
            Io(::std::io::Error);
            ParseInt(::std::num::ParseIntError);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {

    // Logs go to stderr so the rendered maze on stdout stays clean.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    if args.cmd_generate {
        generate_maze(&args)
    } else if args.cmd_show {
        let engine = load_maze(&args.arg_path)?;
        print_layer(&engine, args.flag_layer.as_deref())
    } else if args.cmd_info {
        let engine = load_maze(&args.arg_path)?;
        print_info(&engine);
        Ok(())
    } else {
        Ok(())
    }
}

fn generate_maze(args: &MazeArgs) -> Result<()> {

    let sizes: Vec<usize> = parse_list(&args.flag_sizes)
        .chain_err(|| format!("Invalid --sizes value '{}'", args.flag_sizes))?;

    let engine = match args.flag_seed {
        Some(seed) => MazeEngine::with_seed(sizes.len(), seed),
        None => MazeEngine::new(sizes.len()),
    }.chain_err(|| format!("Cannot build a maze of {} dimensions", sizes.len()))?;
    engine.set_size(&sizes)?;

    let start = parse_optional_list::<i64>(args.flag_start.as_deref(), "--start")?;
    let end = parse_optional_list::<i64>(args.flag_end.as_deref(), "--end")?;
    engine.generate(start.as_deref(), end.as_deref())
        .chain_err(|| format!("Failed to generate a maze of sizes {}", sizes.iter().join("x")))?;

    if let Some((start, end)) = engine.endpoints() {
        info!(%start, %end, passages = engine.passage_count().0, "maze generated");
    }

    if !args.flag_out.is_empty() {
        save_maze(&engine, &args.flag_out)
            .chain_err(|| format!("Failed to save maze to file {}", args.flag_out))?;
    }

    print_layer(&engine, args.flag_layer.as_deref())
}

fn save_maze(engine: &MazeEngine, file_path: &str) -> Result<()> {
    let file = File::create(file_path)?;
    engine.write_to(BufWriter::new(file))?;
    Ok(())
}

fn load_maze(file_path: &str) -> Result<MazeEngine> {
    let file = File::open(file_path)
        .chain_err(|| format!("Failed to open maze file {}", file_path))?;
    let engine = MazeEngine::read_from(BufReader::new(file))
        .chain_err(|| format!("Failed to read maze file {}", file_path))?;
    Ok(engine)
}

fn print_layer(engine: &MazeEngine, layer: Option<&str>) -> Result<()> {
    let layer: Vec<usize> = parse_optional_list(layer, "--layer")?.unwrap_or_default();
    let text = engine.with_grid(|grid| renderers::render_layer(grid, &layer))
        .chain_err(|| format!("Cannot draw layer [{}]", layer.iter().join(", ")))?;
    print!("{}", text);
    Ok(())
}

fn print_info(engine: &MazeEngine) {
    let CellsCount(cells) = engine.capacity();
    println!("dimensions: {}", engine.dimensions());
    println!("sizes: {}", engine.sizes().iter().join("x"));
    println!("cells: {}", cells);
    println!("passages: {}", engine.passage_count().0);
}

fn parse_list<T>(text: &str) -> Result<Vec<T>>
    where T: FromStr<Err = ParseIntError>
{
    let values = text.split(',')
                     .map(|part| part.trim().parse::<T>())
                     .collect::<::std::result::Result<Vec<T>, ParseIntError>>()?;
    Ok(values)
}

fn parse_optional_list<T>(text: Option<&str>, flag: &str) -> Result<Option<Vec<T>>>
    where T: FromStr<Err = ParseIntError>
{
    match text {
        Some(text) if !text.trim().is_empty() => {
            let values = parse_list(text).chain_err(|| format!("Invalid {} value '{}'", flag, text))?;
            Ok(Some(values))
        }
        _ => Ok(None),
    }
}
