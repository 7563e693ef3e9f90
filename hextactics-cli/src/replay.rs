//! Replay command - run a scripted match headlessly
//!
//! ## Architecture
//!
//! - run(): orchestration
//! - load_inputs(), play_script(), report()
//! - step and report formatting

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use hextactics_core::{
    Battle, GameEvent, GameState, HexCoord, MatchConfig, NullLifecycle, Roster, UnitCatalog,
};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct ReplayArgs {
    /// Unit and ability catalog JSON file
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,

    /// Roster JSON file
    #[arg(long, value_name = "FILE")]
    pub roster: PathBuf,

    /// Match config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Script JSON file. Without one the match only runs army build.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Output the final report as JSON
    #[arg(long)]
    pub json: bool,
}

/// One scripted input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Click the hex at [q, r]
    Click([i32; 2]),
    /// Select a skill of the active unit, null to deselect
    SelectSkill(Option<usize>),
    /// Advance the simulation
    Tick(f32),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse script: {}", path.display()))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UnitReport {
    pub id: usize,
    pub template: String,
    pub owner: Option<usize>,
    pub health: i32,
    pub mana: i32,
    pub coord: Option<[i32; 2]>,
}

/// Final state of a replayed match
#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub state: GameState,
    /// Winner index, -1 for a draw
    pub outcome: Option<i32>,
    pub turn: u32,
    pub active_player: usize,
    pub finished: bool,
    pub steps: usize,
    pub events: usize,
    pub units: Vec<UnitReport>,
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Run replay command
pub fn run(args: ReplayArgs, seed: Option<u64>) -> Result<()> {
    let (config, catalog, roster, script) = load_inputs(&args, seed)?;

    tracing::info!(
        "Replaying {} steps on a {}x{} grid",
        script.steps.len(),
        config.grid.width,
        config.grid.height
    );

    let report = play_script(config, catalog, roster, &script)?;
    print_report(&report, args.json)
}

fn load_inputs(args: &ReplayArgs, seed: Option<u64>) -> Result<(MatchConfig, UnitCatalog, Roster, Script)> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    let catalog = UnitCatalog::load(&args.catalog)?;
    let roster = Roster::load(&args.roster)?;
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };
    Ok((config, catalog, roster, script))
}

/// Build the match, start army build and feed it every step
pub fn play_script(config: MatchConfig, catalog: UnitCatalog, roster: Roster, script: &Script) -> Result<ReplayReport> {
    let mut battle = Battle::new(config, catalog)?
        .with_roster(roster)
        .with_lifecycle(NullLifecycle::new());

    let seen = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&seen);
    battle.events_mut().subscribe_all(move |event: &GameEvent| {
        counter.set(counter.get() + 1);
        tracing::info!("event: {:?}", event);
    });

    battle.start_game()?;
    for (i, step) in script.steps.iter().enumerate() {
        tracing::debug!("step {}: {:?}", i, step);
        apply_step(&mut battle, step).with_context(|| format!("Script step {} failed: {:?}", i, step))?;
    }

    Ok(report(&battle, script.steps.len(), seen.get()))
}

fn apply_step(battle: &mut Battle, step: &Step) -> Result<()> {
    match *step {
        Step::Click([q, r]) => battle.click_hex(HexCoord::new(q, r))?,
        Step::SelectSkill(index) => {
            if !battle.select_skill(index)? {
                tracing::debug!("skill selection {:?} had no effect", index);
            }
        }
        Step::Tick(seconds) => battle.tick(seconds)?,
    }
    Ok(())
}

// ============================================================================
// REPORTING
// ============================================================================

fn report(battle: &Battle, steps: usize, events: usize) -> ReplayReport {
    let units = battle
        .world()
        .units()
        .map(|u| UnitReport {
            id: u.id().0,
            template: u.template().to_string(),
            owner: u.owner().map(|p| p.0),
            health: u.health(),
            mana: u.mana(),
            coord: u.coord().map(|c| [c.q, c.r]),
        })
        .collect();

    ReplayReport {
        state: battle.game_state(),
        outcome: battle.outcome().map(|o| o.id()),
        turn: battle.turn().current_turn(),
        active_player: battle.turn().active_player().0,
        finished: battle.is_finished(),
        steps,
        events,
        units,
    }
}

fn print_report(report: &ReplayReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("\n=== REPLAY ===");
    println!("State:    {:?}", report.state);
    match report.outcome {
        Some(-1) => println!("Outcome:  Draw"),
        Some(winner) => println!("Outcome:  Player {} wins", winner + 1),
        None => println!("Outcome:  undecided"),
    }
    println!("Turn:     {} (Player {} to act)", report.turn, report.active_player + 1);
    println!("Steps:    {}  Events: {}", report.steps, report.events);
    println!();
    for unit in &report.units {
        let owner = unit.owner.map_or("-".to_string(), |p| format!("P{}", p + 1));
        let coord = unit.coord.map_or("off-board".to_string(), |[q, r]| format!("({}, {})", q, r));
        println!(
            "  #{:<2} {:<10} {:<3} hp {:>3}  mana {:>3}  {}",
            unit.id, unit.template, owner, unit.health, unit.mana, coord
        );
    }
    Ok(())
}
