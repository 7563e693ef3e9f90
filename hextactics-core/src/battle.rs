//! Match orchestration
//!
//! A [`Battle`] owns the [`World`] and drives it through army build, the
//! battle turns and game over. Input arrives as hex clicks and skill
//! selections. Completion of long-running actions arrives through the event
//! bus, which every public entry point pumps until it is empty.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::ability::{Ability, AbilityId, Effect, Target};
use crate::config::{MatchConfig, PLAYER_COUNT};
use crate::error::{EngineError, EngineResult};
use crate::events::{EventBus, GameEvent};
use crate::grid::{Grid, HighlightTone, Tile};
use crate::hex::HexCoord;
use crate::highlight::{ActionCache, CacheCategory};
use crate::lifecycle::ObjectLifecycle;
use crate::pathfinding::find_hex_path;
use crate::player::PlayerId;
use crate::roster::{army_size, roster_key, RosterSource, UnitCatalog};
use crate::task::Countdown;
use crate::turn::{GameOutcome, GameState, TurnState};
use crate::unit::{Unit, UnitId};
use crate::world::World;

/// Deferred command run when the current action completes
pub type QueuedAction = Box<dyn FnOnce(&mut Battle) -> EngineResult<()>>;

pub struct Battle {
    world: World,
    config: MatchConfig,
    catalog: UnitCatalog,
    roster: Option<Box<dyn RosterSource>>,
    cache: ActionCache,
    selected_hex: Option<HexCoord>,
    selected_unit: Option<UnitId>,
    active_unit: Option<UnitId>,
    queue: VecDeque<QueuedAction>,
    battle_countdown: Option<Countdown>,
    game_over_countdown: Option<Countdown>,
    outcome: Option<GameOutcome>,
    finished: bool,
    /// Consecutive turns ended because the active unit could do nothing
    skipped_turns: usize,
}

impl Battle {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Validate the config, compose every ability and generate the grid
    pub fn new(config: MatchConfig, catalog: UnitCatalog) -> EngineResult<Self> {
        config.validate()?;
        let blueprints = catalog.compose()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let grid = Grid::generate(&config.grid, &mut rng);
        let first_player = config
            .first_player
            .unwrap_or_else(|| rng.gen_range(0..PLAYER_COUNT));
        let world = World::new(grid, blueprints, PLAYER_COUNT, first_player, rng);

        Ok(Self {
            world,
            config,
            catalog,
            roster: None,
            cache: ActionCache::new(),
            selected_hex: None,
            selected_unit: None,
            active_unit: None,
            queue: VecDeque::new(),
            battle_countdown: None,
            game_over_countdown: None,
            outcome: None,
            finished: false,
            skipped_turns: 0,
        })
    }

    pub fn with_roster(mut self, roster: impl RosterSource + 'static) -> Self {
        self.roster = Some(Box::new(roster));
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: impl ObjectLifecycle + 'static) -> Self {
        self.world.lifecycle = Box::new(lifecycle);
        self
    }

    /// Replace the generated grid, e.g. with a hand-made board
    pub fn with_grid(mut self, grid: Grid) -> Self {
        self.world.grid = grid;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn grid(&self) -> &Grid {
        self.world.grid()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn turn(&self) -> &TurnState {
        self.world.turn()
    }

    pub fn game_state(&self) -> GameState {
        self.world.turn.game_state()
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.world.unit(id)
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.world.ability(id)
    }

    pub fn active_unit(&self) -> Option<UnitId> {
        self.active_unit
    }

    pub fn selected_unit(&self) -> Option<UnitId> {
        self.selected_unit
    }

    pub fn selected_hex(&self) -> Option<HexCoord> {
        self.selected_hex
    }

    pub fn action_cache(&self) -> &ActionCache {
        &self.cache
    }

    pub fn queued_actions(&self) -> usize {
        self.queue.len()
    }

    /// Set once the game is over, before teardown
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// The match has been torn down
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        self.world.events_mut()
    }

    /// Highlighted tiles, row-major
    pub fn highlighted_tiles(&self) -> Vec<(HexCoord, HighlightTone)> {
        self.world.grid.highlighted().collect()
    }

    /// Every unit and cast is idle
    pub fn is_settled(&self) -> bool {
        self.world.is_settled()
    }

    fn set_game_state(&mut self, state: GameState) {
        let old = self.world.turn.game_state;
        if old == state {
            return;
        }
        self.world.turn.game_state = state;
        info!("Game state {:?} -> {:?}", old, state);
        self.world.publish(GameEvent::GameStateChanged { old, new: state });
    }

    fn set_selected_unit(&mut self, unit: Option<UnitId>) {
        if self.selected_unit != unit {
            self.world.publish(GameEvent::UnitSelectionChanged(unit));
        }
        self.selected_unit = unit;
    }

    fn end_turn(&mut self) {
        self.world.turn.end_turn();
        debug!(
            "Turn ended, {} is up (turn {})",
            self.world.turn.active_player(),
            self.world.turn.current_turn()
        );
        self.world.publish(GameEvent::TurnEnded);
    }

    // ========================================================================
    // PUBLIC COMMANDS
    // ========================================================================

    /// Spawn both armies from the roster and start placement
    pub fn start_game(&mut self) -> EngineResult<()> {
        match self.game_state() {
            GameState::Idle | GameState::GameOver => {}
            state => {
                warn!("Cannot start a game while in {:?}", state);
                return Ok(());
            }
        }
        self.reset_match_state();

        let roster = self.roster.as_deref().ok_or(EngineError::RosterUnavailable)?;
        let size = army_size(roster, self.config.max_army_size);
        for slot in 0..size {
            let Some(name) = roster.lookup(&roster_key(slot)) else {
                break;
            };
            let template = self
                .catalog
                .unit(&name)
                .ok_or_else(|| EngineError::UnknownUnitTemplate(name.clone()))?;
            for player in 0..PLAYER_COUNT {
                self.world.spawn_unit(template, PlayerId(player))?;
            }
        }
        info!("Army build: {} units per player", size);

        self.set_game_state(GameState::ArmyBuild);
        self.begin_placement()?;
        self.pump()
    }

    /// Route a click on `coord` according to the game state
    pub fn click_hex(&mut self, coord: HexCoord) -> EngineResult<()> {
        self.world.grid.tile(coord)?;
        self.world.publish(GameEvent::HexClicked(coord));
        match self.game_state() {
            GameState::ArmyBuild => self.click_build(coord)?,
            GameState::Battle => {
                if self.click_battle(coord)? {
                    self.click_active_skill()?;
                }
            }
            GameState::Idle | GameState::GameOver => {}
        }
        self.pump()
    }

    /// Select a skill of the active unit, `None` to deselect
    pub fn select_skill(&mut self, index: Option<usize>) -> EngineResult<bool> {
        let Some(active) = self.active_unit else {
            return Ok(false);
        };
        if self.game_state() != GameState::Battle {
            return Ok(false);
        }
        let changed = self.world.select_skill(active, index)?;
        self.pump()?;
        Ok(changed)
    }

    /// Cast an ability directly
    pub fn cast_ability(&mut self, id: AbilityId) -> EngineResult<bool> {
        let started = self.world.cast(id)?;
        self.pump()?;
        Ok(started)
    }

    /// Apply an effect from outside any ability
    pub fn inflict(&mut self, unit: UnitId, effect: &Effect) -> EngineResult<()> {
        self.world.apply_effect("external", effect, Target::Unit(unit))?;
        self.pump()
    }

    /// Apply several effects before any resulting event is handled
    pub fn resolve_effects(&mut self, effects: &[(UnitId, Effect)]) -> EngineResult<()> {
        for (unit, effect) in effects {
            self.world.apply_effect("external", effect, Target::Unit(*unit))?;
        }
        self.pump()
    }

    /// Advance movement, casts and timers by `dt` seconds
    pub fn tick(&mut self, dt: f32) -> EngineResult<()> {
        self.world.advance_movement(dt)?;
        self.world.advance_casts(dt)?;
        self.advance_timers(dt)?;
        self.pump()
    }

    /// Clear the selection cache and every highlight it placed
    pub fn reset_active_hexes(&mut self) {
        for coord in self.cache.clear() {
            self.world.grid.reset_highlight(coord);
        }
    }

    /// Rebuild highlights for the selected hex
    pub fn highlight_active_hex(&mut self) -> EngineResult<()> {
        self.rebuild_highlight()?;
        self.pump()
    }

    fn reset_match_state(&mut self) {
        if self.game_state() == GameState::GameOver && !self.finished {
            self.world.teardown();
        }
        self.reset_active_hexes();
        self.queue.clear();
        self.selected_hex = None;
        self.selected_unit = None;
        self.active_unit = None;
        self.battle_countdown = None;
        self.game_over_countdown = None;
        self.outcome = None;
        self.finished = false;
        self.skipped_turns = 0;
    }

    // ========================================================================
    // EVENT PUMP
    // ========================================================================

    fn pump(&mut self) -> EngineResult<()> {
        while let Some(event) = self.world.events.next_pending() {
            self.dispatch(&event)?;
            self.world.fire_event_triggers(&event)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &GameEvent) -> EngineResult<()> {
        if self.game_state() != GameState::Battle {
            return Ok(());
        }
        match *event {
            GameEvent::CastCompleted { ability, success } => {
                let passive = self.world.ability(ability).is_some_and(Ability::is_passive);
                if !success {
                    let name = self.world.ability(ability).map_or("ability", |a| a.name());
                    warn!("{} has failed", name);
                }
                self.on_action_completed(passive)
            }
            GameEvent::MoveCompleted(_) => self.on_action_completed(false),
            GameEvent::UnitRemoved(unit) => self.on_unit_removed(unit),
            GameEvent::AbilityActivated(_) => self.rebuild_highlight(),
            GameEvent::AbilityDeactivated(_) => {
                let skill_selected = self
                    .active_unit
                    .and_then(|u| self.world.unit(u))
                    .is_some_and(|u| u.active_skill_index().is_some());
                if skill_selected {
                    Ok(())
                } else {
                    self.rebuild_highlight()
                }
            }
            _ => Ok(()),
        }
    }

    fn advance_timers(&mut self, dt: f32) -> EngineResult<()> {
        if let Some(countdown) = self.battle_countdown.as_mut() {
            if countdown.advance(dt).is_done() {
                self.battle_countdown = None;
                self.start_battle()?;
            }
        }
        if let Some(countdown) = self.game_over_countdown.as_mut() {
            if countdown.advance(dt).is_done() && self.world.is_settled() {
                self.finish_match();
            }
        }
        Ok(())
    }

    // ========================================================================
    // ARMY BUILD
    // ========================================================================

    fn spawn_rows(&self, player: PlayerId) -> std::ops::Range<usize> {
        let height = self.world.grid.height();
        let depth = self.config.max_spawn_distance.min(height);
        if player.deploys_at_top() {
            0..depth
        } else {
            height - depth..height
        }
    }

    fn all_units_placed(&self) -> bool {
        self.world
            .players
            .iter()
            .flat_map(|p| p.units())
            .all(|u| self.world.unit(u).is_some_and(|unit| unit.coord().is_some()))
    }

    /// Hand the active player its next unit and mark the spawn band
    fn begin_placement(&mut self) -> EngineResult<()> {
        if self.all_units_placed() {
            return self.finish_army_build();
        }
        self.reset_active_hexes();
        let player = self.world.active_player();
        let next = self.world.players[player.0].next_unit(|_| true);
        self.set_selected_unit(next);

        for row in self.spawn_rows(player) {
            for col in 0..self.world.grid.row_len(row) {
                let coord = self.world.grid.tile_direct(row, col).coord();
                self.mark(CacheCategory::Other, coord, HighlightTone::Standard);
            }
        }
        Ok(())
    }

    fn click_build(&mut self, coord: HexCoord) -> EngineResult<()> {
        let player = self.world.active_player();
        if !self.spawn_rows(player).contains(&(coord.r as usize)) {
            return Ok(());
        }
        let Some(unit) = self.selected_unit else {
            return Ok(());
        };
        if !self.world.grid.get_tile(coord).is_some_and(Tile::is_passable) {
            return Ok(());
        }

        self.world.place_unit(unit, coord)?;
        info!("{} placed unit #{} at {}", player, unit.0, coord);
        self.set_selected_unit(None);
        self.end_turn();
        self.reset_active_hexes();
        self.begin_placement()
    }

    fn finish_army_build(&mut self) -> EngineResult<()> {
        self.reset_active_hexes();
        if self.config.battle_start_delay > 0.0 {
            self.battle_countdown = Some(Countdown::new(self.config.battle_start_delay));
            Ok(())
        } else {
            self.start_battle()
        }
    }

    fn start_battle(&mut self) -> EngineResult<()> {
        self.set_game_state(GameState::Battle);
        info!("Battle! {} moves first", self.world.active_player());
        self.start_unit_turn()
    }

    // ========================================================================
    // TURNS
    // ========================================================================

    /// Pick the active player's next living unit and select it
    fn start_unit_turn(&mut self) -> EngineResult<()> {
        let player = self.world.active_player();
        let units = &self.world.units;
        let next = self.world.players[player.0].next_unit(|u| units.get(u.0).is_some_and(Unit::is_alive));
        let Some(unit) = next else {
            return self.try_game_over();
        };

        self.active_unit = Some(unit);
        self.world.select_skill(unit, None)?;
        self.world.set_weapons_enabled(unit, true)?;
        debug!("Unit #{} of {} is active", unit.0, player);

        match self.world.unit(unit).and_then(Unit::coord) {
            Some(coord) => self.select_hex(coord),
            None => Ok(()),
        }
    }

    fn on_action_completed(&mut self, passive: bool) -> EngineResult<()> {
        if passive {
            return self.try_game_over();
        }
        if let Some(action) = self.queue.pop_front() {
            return action(self);
        }
        self.finish_turn()
    }

    fn finish_turn(&mut self) -> EngineResult<()> {
        self.try_game_over()?;
        if self.game_state() != GameState::Battle {
            return Ok(());
        }
        self.reset_active_hexes();
        self.selected_hex = None;
        if let Some(previous) = self.active_unit {
            self.world.set_weapons_enabled(previous, false)?;
        }
        self.end_turn();
        self.start_unit_turn()
    }

    /// End the turn of an active unit that cannot do anything
    fn skip_turn(&mut self, unit: UnitId) -> EngineResult<()> {
        self.skipped_turns += 1;
        let living = self.world.units().filter(|u| u.is_alive() && u.owner().is_some()).count();
        if self.skipped_turns > living {
            warn!("Stalemate: no unit has a valid action");
            return Ok(());
        }
        debug!("Unit #{} has no valid action, ending its turn", unit.0);
        self.finish_turn()
    }

    /// Winner by elimination. Player 0 wins when the last player is out,
    /// a draw when both are out, player 1 otherwise.
    fn try_game_over(&mut self) -> EngineResult<()> {
        if self.game_state() != GameState::Battle {
            return Ok(());
        }
        let world = &self.world;
        let alive = |p: usize| world.players[p].is_any_unit_alive(|u| world.is_alive(u));
        let last = world.players.len() - 1;

        let outcome = (0..world.players.len()).find(|p| !alive(*p)).map(|p| {
            if p == last {
                GameOutcome::Winner(PlayerId(0))
            } else if !alive(last) {
                GameOutcome::Draw
            } else {
                GameOutcome::Winner(PlayerId(1))
            }
        });
        match outcome {
            Some(outcome) => self.game_over(outcome),
            None => Ok(()),
        }
    }

    fn game_over(&mut self, outcome: GameOutcome) -> EngineResult<()> {
        self.set_game_state(GameState::GameOver);
        info!("Game over: {}", outcome);
        self.selected_hex = None;
        self.set_selected_unit(None);
        self.reset_active_hexes();
        self.queue.clear();
        self.outcome = Some(outcome);
        self.game_over_countdown = Some(Countdown::new(self.config.game_over_delay));
        Ok(())
    }

    fn finish_match(&mut self) {
        self.game_over_countdown = None;
        let outcome = self.outcome.unwrap_or(GameOutcome::Draw);
        self.world.publish(GameEvent::MatchFinished(outcome));
        self.world.teardown();
        self.active_unit = None;
        self.finished = true;
        info!("Match finished: {}", outcome);
    }

    fn on_unit_removed(&mut self, unit: UnitId) -> EngineResult<()> {
        let coord = self.world.remove_unit(unit)?;
        self.try_game_over()?;
        if self.game_state() != GameState::Battle {
            return Ok(());
        }
        if let Some(coord) = coord {
            self.cache.remove_tile(coord);
            self.world.grid.reset_highlight(coord);
        }
        match self.selected_hex {
            Some(hex) => self.select_hex(hex),
            None => Ok(()),
        }
    }

    // ========================================================================
    // BATTLE INPUT
    // ========================================================================

    /// Returns false when the click was ignored because the active unit is
    /// busy
    fn click_battle(&mut self, coord: HexCoord) -> EngineResult<bool> {
        let Some(active) = self.active_unit.filter(|_| self.selected_unit.is_some()) else {
            self.select_hex(coord)?;
            return Ok(true);
        };
        if !self.world.is_unit_idle(active) {
            debug!("Unit #{} is busy, click ignored", active.0);
            return Ok(false);
        }

        let unit = self.world.try_unit(active)?;
        let (skill, melee, ranged, origin) = (unit.active_skill(), unit.melee(), unit.ranged(), unit.coord());
        let occupant = self.world.grid.get_tile(coord).and_then(Tile::occupant);

        let Some(target) = occupant else {
            if !self.cache.contains(CacheCategory::Move, coord) {
                self.select_hex(coord)?;
                return Ok(true);
            }
            for ability in skill.into_iter().chain(melee).chain(ranged) {
                self.world.deactivate(ability)?;
            }
            if let Some(path) = self.world.path_for(active, coord).filter(|p| !p.is_empty()) {
                self.world.start_move(active, path)?;
            }
            return Ok(true);
        };

        if self.cache.contains(CacheCategory::DirectAction, coord) {
            for weapon in melee.into_iter().chain(ranged) {
                self.world.deactivate(weapon)?;
            }
            if let Some(skill) = skill {
                self.world.aim_click(skill, coord)?;
            }
            return Ok(true);
        }

        if self.cache.contains(CacheCategory::DirectAttack, coord) {
            if let Some(skill) = skill {
                self.world.deactivate(skill)?;
            }
            let distance = origin.map_or(0, |o| o.distance_to(coord));
            if let Some(ranged) = ranged {
                if distance > 1 {
                    if let Some(melee) = melee {
                        self.world.deactivate(melee)?;
                    }
                    self.world.activate_auto_cast(ranged, Some(Target::Unit(target)))?;
                    return Ok(true);
                }
                self.world.deactivate(ranged)?;
            }
            if let Some(melee) = melee {
                self.world.activate_auto_cast(melee, Some(Target::Unit(target)))?;
            }
            return Ok(true);
        }

        if let (Some(origin), Some(_)) = (origin, melee) {
            let mut shortest: Option<Vec<HexCoord>> = None;
            let approaches: Vec<HexCoord> = self.cache.pairs_for(coord).collect();
            for approach in approaches {
                let Some(path) = find_hex_path(&self.world.grid, origin, approach) else {
                    continue;
                };
                if shortest.as_ref().map_or(true, |best| path.len() < best.len()) {
                    shortest = Some(path);
                }
                if shortest.as_ref().is_some_and(|best| best.len() == 1) {
                    break;
                }
            }
            if let Some(path) = shortest.filter(|p| !p.is_empty()) {
                debug!("Unit #{} approaches {} to attack", active.0, coord);
                self.queue.push_back(Box::new(move |battle: &mut Battle| battle.queued_melee(active, target)));
                self.world.start_move(active, path)?;
                return Ok(true);
            }
        }

        self.select_hex(coord)?;
        Ok(true)
    }

    fn queued_melee(&mut self, attacker: UnitId, target: UnitId) -> EngineResult<()> {
        match self.world.unit(attacker).and_then(Unit::melee) {
            Some(melee) => self.world.activate_auto_cast(melee, Some(Target::Unit(target))),
            None => self.finish_turn(),
        }
    }

    /// Click trigger for the active skill, after the aim saw the click
    fn click_active_skill(&mut self) -> EngineResult<()> {
        let skill = self.active_unit.and_then(|u| self.world.unit(u)).and_then(Unit::active_skill);
        if let Some(skill) = skill {
            self.world.click_cast(skill)?;
        }
        Ok(())
    }

    // ========================================================================
    // SELECTION & HIGHLIGHT
    // ========================================================================

    fn select_hex(&mut self, coord: HexCoord) -> EngineResult<()> {
        let occupant = self.world.grid.get_tile(coord).and_then(Tile::occupant);
        self.set_selected_unit(occupant.or(self.active_unit));
        self.selected_hex = Some(coord);
        self.rebuild_highlight()
    }

    fn rebuild_highlight(&mut self) -> EngineResult<()> {
        let Some(center) = self.selected_hex else {
            return Ok(());
        };
        self.reset_active_hexes();

        let Some(unit) = self.world.grid.get_tile(center).and_then(Tile::occupant) else {
            self.mark(CacheCategory::Other, center, HighlightTone::Standard);
            return Ok(());
        };
        let selected = self.world.try_unit(unit)?;
        let is_active = self.active_unit == Some(unit);
        let (skill, melee, ranged) = (selected.active_skill(), selected.melee(), selected.ranged());
        let reachable: Vec<(HexCoord, Option<UnitId>)> = self
            .world
            .grid
            .hexes_in_reachable_range(center, selected.movement_range(), true)
            .map(|t| (t.coord(), t.occupant()))
            .collect();

        let mut has_valid_action = false;
        for (coord, occupant) in reachable {
            match occupant {
                Some(other) if is_active => {
                    if melee.is_none() || !self.is_living_enemy(unit, other) {
                        continue;
                    }
                    for neighbor in coord.neighbors() {
                        if self.cache.contains(CacheCategory::Move, neighbor) {
                            self.cache.add_pair(neighbor, coord);
                            self.world.grid.set_highlight(coord, HighlightTone::Attack);
                            has_valid_action = true;
                        }
                    }
                }
                Some(_) => {
                    if coord != center {
                        self.mark(CacheCategory::Other, coord, HighlightTone::Inspect);
                    }
                }
                None if is_active => {
                    self.mark(CacheCategory::Move, coord, HighlightTone::Standard);
                    has_valid_action = true;
                }
                None => self.mark(CacheCategory::Other, coord, HighlightTone::Inspect),
            }
        }

        if is_active {
            has_valid_action |= self.mark_ability(skill, CacheCategory::DirectAction, HighlightTone::Skill);
            has_valid_action |= self.mark_ability(melee, CacheCategory::DirectAttack, HighlightTone::Attack);
            has_valid_action |= self.mark_ability(ranged, CacheCategory::DirectAttack, HighlightTone::Attack);
        }

        if has_valid_action || !is_active {
            if is_active {
                self.skipped_turns = 0;
            }
            if !self.cache.contains(CacheCategory::DirectAttack, center) {
                self.mark(CacheCategory::Other, center, HighlightTone::Selected);
            }
            return Ok(());
        }

        // A pending completion ends the turn on its own
        let completion_pending = self
            .world
            .events
            .pending()
            .any(|e| matches!(e, GameEvent::CastCompleted { .. } | GameEvent::MoveCompleted(_)));
        if self.world.is_unit_idle(unit) && self.queue.is_empty() && !completion_pending {
            self.skip_turn(unit)?;
        }
        Ok(())
    }

    fn mark(&mut self, category: CacheCategory, coord: HexCoord, tone: HighlightTone) {
        self.cache.add(category, coord);
        self.world.grid.set_highlight(coord, tone);
    }

    fn mark_ability(&mut self, ability: Option<AbilityId>, category: CacheCategory, tone: HighlightTone) -> bool {
        let Some(ability) = ability else {
            return false;
        };
        let mut any = false;
        for coord in self.world.available_hexes(ability) {
            if self.cache.add(category, coord) {
                self.world.grid.set_highlight(coord, tone);
                any = true;
            }
        }
        any
    }

    fn is_living_enemy(&self, unit: UnitId, other: UnitId) -> bool {
        match (self.world.unit(unit), self.world.unit(other)) {
            (Some(unit), Some(other)) => other.is_alive() && other.is_enemy_of(unit),
            _ => false,
        }
    }
}
