//! Board commands - print generated grids and path queries

use anyhow::{bail, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hextactics_core::{find_hex_path, Grid, GridConfig, HexCoord, HexPathDomain, ShortestPathSearch};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args, Clone, Debug)]
pub struct BoardArgs {
    /// Hexes in an even row
    #[arg(long, default_value = "9")]
    pub width: usize,

    /// Number of rows
    #[arg(long, default_value = "8")]
    pub height: usize,

    /// Chance that an eligible tile becomes a roadblock
    #[arg(long, default_value = "0.1")]
    pub roadblock_chance: f32,
}

#[derive(Args)]
pub struct GridArgs {
    #[command(flatten)]
    pub board: BoardArgs,
}

#[derive(Args)]
pub struct PathArgs {
    #[command(flatten)]
    pub board: BoardArgs,

    /// Start hex as q,r
    #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
    pub from: HexCoord,

    /// Goal hex as q,r
    #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
    pub to: HexCoord,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn run_grid(args: GridArgs, seed: Option<u64>) -> Result<()> {
    let (grid, seed) = generate(&args.board, seed)?;
    println!("Grid {}x{} (seed {})", grid.width(), grid.height(), seed);
    print!("{}", render(&grid, &[], None));
    Ok(())
}

pub fn run_path(args: PathArgs, seed: Option<u64>) -> Result<()> {
    let (grid, seed) = generate(&args.board, seed)?;
    for (label, coord) in [("start", args.from), ("goal", args.to)] {
        if !grid.is_valid(coord) {
            bail!("The {} hex {} is not on the {}x{} grid", label, coord, grid.width(), grid.height());
        }
    }
    tracing::debug!("Searching {} -> {} on seed {}", args.from, args.to, seed);

    match find_hex_path(&grid, args.from, args.to) {
        Some(path) => {
            let cost = ShortestPathSearch::new(HexPathDomain::new(&grid)).path_cost(&args.from, &path);
            let steps: Vec<String> = path.iter().map(ToString::to_string).collect();
            println!("Path {} -> {}: {} steps, cost {}", args.from, args.to, path.len(), cost);
            println!("  {}", steps.join(" "));
            print!("{}", render(&grid, &path, Some(args.from)));
        }
        None => {
            println!("No path from {} to {}", args.from, args.to);
            print!("{}", render(&grid, &[], Some(args.from)));
        }
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn generate(board: &BoardArgs, seed: Option<u64>) -> Result<(Grid, u64)> {
    let config = GridConfig {
        width: board.width,
        height: board.height,
        roadblock_chance: board.roadblock_chance,
        ..Default::default()
    };
    config.validate()?;
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok((Grid::generate(&config, &mut rng), seed))
}

/// Parse "q,r"
pub fn parse_coord(s: &str) -> Result<HexCoord, String> {
    let (q, r) = s
        .split_once(',')
        .ok_or_else(|| format!("expected q,r but got '{}'", s))?;
    let q = q.trim().parse::<i32>().map_err(|e| format!("bad q '{}': {}", q, e))?;
    let r = r.trim().parse::<i32>().map_err(|e| format!("bad r '{}': {}", r, e))?;
    Ok(HexCoord::new(q, r))
}

/// ASCII map, odd rows shifted half a hex.
///
/// `.` open, `#` roadblock, `*` path, `S` start.
pub fn render(grid: &Grid, path: &[HexCoord], start: Option<HexCoord>) -> String {
    let mut out = String::new();
    for row in 0..grid.height() {
        if row % 2 == 1 {
            out.push(' ');
        }
        let cells: Vec<&str> = (0..grid.row_len(row))
            .map(|col| {
                let tile = grid.tile_direct(row, col);
                if Some(tile.coord()) == start {
                    "S"
                } else if path.contains(&tile.coord()) {
                    "*"
                } else if !tile.is_terrain_passable() {
                    "#"
                } else {
                    "."
                }
            })
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}
