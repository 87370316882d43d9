//! The overworld orchestrator.
//!
//! `Game` owns the current map, the player's roster and every overlay, and
//! advances them through a fixed pipeline of stages once per tick. Anything
//! that swaps the world state (changing maps, entering or leaving a battle)
//! goes through the tint transition and happens only at full opacity.

pub mod character;
pub mod dialogue;
pub mod map;
pub mod player;
pub mod transition;

use crate::battle::engine::BattleRules;
use crate::battle::runner::{BattleRunner, ExecutionResult};
use crate::battle::state::{BattleKind, BattleOutcome, BattleSession, Controller, PlayerAction, TurnRng, PLAYER_SIDE};
use crate::config::GameConfig;
use crate::data::GameData;
use crate::encounter::EncounterController;
use crate::errors::{BattleError, DataResult, GameResult, SaveError, SaveResult};
use crate::persistence::{self, CharacterRecord, GameSnapshot, SaveData};
use crate::progression::evolution::EvolutionEvent;
use crate::progression::EvolutionController;
use crate::roster::Roster;
use crate::services::{AudioCue, AudioPlayer, BattleView, Frame, InputState, Key, NullAudio, NullRenderer, Renderer};
use crate::timer::Timer;
use character::{in_line_of_sight, initial_book, Character, CharacterBook, CharacterRole, TALK_REACH};
use dialogue::Dialogue;
use map::{Direction, Rect, WorldMap};
use player::Player;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use transition::{TintMode, Transition, TransitionTarget};

/// The stages of one tick, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStage {
    /// Nothing else runs until the startup delay has elapsed
    StartupDelay,
    EncounterTimer,
    /// Skipped while the screen is tinting or the player is blocked
    Input,
    TransitionCheck,
    /// Movement, trainer line of sight, encounter rolls
    WorldUpdate,
    /// Dialogue, battle and evolution
    Overlays,
    Tint,
}

impl TickStage {
    pub const ORDER: [TickStage; 7] = [
        TickStage::StartupDelay,
        TickStage::EncounterTimer,
        TickStage::Input,
        TickStage::TransitionCheck,
        TickStage::WorldUpdate,
        TickStage::Overlays,
        TickStage::Tint,
    ];
}

pub struct Game {
    data: Arc<GameData>,
    config: GameConfig,
    rules: BattleRules,
    rng: StdRng,

    current_world: String,
    map: WorldMap,
    player: Player,
    characters: Vec<Character>,
    character_book: CharacterBook,
    roster: Roster,
    /// World and spawn the player returns to after losing a battle
    checkpoint: (String, String),

    dialogue: Option<Dialogue>,
    dialogue_opened: bool, // Opened during the current tick
    monster_index_open: bool,
    battle: Option<BattleRunner>,
    battle_clock: Timer,
    encounter: EncounterController,
    evolution: EvolutionController,
    transition: Transition,
    startup_delay: Timer,

    messages: Vec<String>,
    running: bool,
    audio: Box<dyn AudioPlayer>,
    renderer: Box<dyn Renderer>,
}

impl Game {
    /// Build a new game at the configured start. Unknown species, maps or
    /// spawns in the configuration abort setup.
    pub fn new(
        data: Arc<GameData>,
        config: GameConfig,
        audio: Box<dyn AudioPlayer>,
        renderer: Box<dyn Renderer>,
    ) -> GameResult<Self> {
        let roster = Roster::from_templates(&data, &config.starting_roster)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut game = Self {
            rules: BattleRules::from(&config),
            rng,
            current_world: config.start_world.clone(),
            map: WorldMap::default(),
            player: Player::new((0.0, 0.0), Direction::Down, config.player_speed),
            characters: Vec::new(),
            character_book: initial_book(&data),
            roster,
            checkpoint: (config.start_world.clone(), config.start_spawn.clone()),
            dialogue: None,
            dialogue_opened: false,
            monster_index_open: false,
            battle: None,
            battle_clock: Timer::new(config.battle_turn_interval_ms),
            encounter: EncounterController::from_config(&config),
            evolution: EvolutionController::new(config.evolution_duration_ms),
            transition: Transition::new(config.tint_speed),
            startup_delay: Timer::started(config.startup_delay_ms),
            messages: Vec::new(),
            running: true,
            audio,
            renderer,
            data,
            config,
        };

        let (world, spawn) = game.checkpoint.clone();
        game.load_map(&world, &spawn)?;
        game.audio.play(AudioCue::OverworldMusic);
        Ok(game)
    }

    /// A game with no audio and no drawing
    pub fn headless(data: Arc<GameData>, config: GameConfig) -> GameResult<Self> {
        Self::new(data, config, Box::new(NullAudio), Box::new(NullRenderer))
    }

    // --- Accessors ---

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_world(&self) -> &str {
        &self.current_world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The player's roster. Empty while a battle owns it.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn checkpoint(&self) -> &(String, String) {
        &self.checkpoint
    }

    pub fn dialogue(&self) -> Option<&Dialogue> {
        self.dialogue.as_ref()
    }

    pub fn battle(&self) -> Option<&BattleSession> {
        self.battle.as_ref().map(BattleRunner::session)
    }

    pub fn evolution(&self) -> &EvolutionController {
        &self.evolution
    }

    pub fn tint_mode(&self) -> TintMode {
        self.transition.mode
    }

    pub fn monster_index_open(&self) -> bool {
        self.monster_index_open
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_defeated(&self, character_id: &str) -> bool {
        self.character_book
            .get(character_id)
            .is_some_and(|flags| flags.defeated)
    }

    /// Battle narration and evolution notices produced since the last call
    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    pub fn close(&mut self) {
        log::info!("Closing the game");
        self.running = false;
    }

    // --- Tick pipeline ---

    /// Advance the whole game by `dt` seconds, then draw the frame
    pub fn update(&mut self, dt: f32, input: &dyn InputState) -> GameResult<()> {
        for stage in TickStage::ORDER {
            if !self.run_stage(stage, dt, input)? {
                break;
            }
        }
        self.dialogue_opened = false;
        let frame = self.frame();
        self.renderer.draw(&frame);
        Ok(())
    }

    /// Run one stage. Returns false when the rest of the tick is skipped.
    fn run_stage(&mut self, stage: TickStage, dt: f32, input: &dyn InputState) -> GameResult<bool> {
        match stage {
            TickStage::StartupDelay => {
                self.startup_delay.update(dt);
                return Ok(!self.startup_delay.is_active());
            }
            TickStage::EncounterTimer => self.encounter.update_timer(dt),
            TickStage::Input => {
                if input.just_pressed(Key::Close) {
                    self.close();
                }
                let tinting = self.transition.mode == TintMode::Tinting;
                if !tinting && (!self.player.blocked || self.monster_index_open) {
                    self.handle_input(input)?;
                }
            }
            TickStage::TransitionCheck => self.transition_check(),
            TickStage::WorldUpdate => self.update_world(dt)?,
            TickStage::Overlays => self.update_overlays(dt, input)?,
            TickStage::Tint => {
                if let Some(target) = self.transition.update(dt) {
                    self.apply_transition(target)?;
                }
            }
        }
        Ok(true)
    }

    fn handle_input(&mut self, input: &dyn InputState) -> GameResult<()> {
        if self.dialogue.is_none() && self.battle.is_none() {
            if input.just_pressed(Key::Confirm) && !self.player.blocked {
                self.talk_to_facing_character()?;
            }
            if input.just_pressed(Key::MonsterIndex) {
                self.monster_index_open = !self.monster_index_open;
                if self.monster_index_open {
                    self.player.block();
                } else {
                    self.player.unblock();
                }
            }
            if input.just_pressed(Key::Escape) && self.monster_index_open {
                self.monster_index_open = false;
                self.player.unblock();
            }
            if !self.monster_index_open {
                let path = self.config.quick_save_path();
                if input.just_pressed(Key::QuickSave) {
                    if let Err(err) = self.save_game(&path) {
                        log::warn!("Quick save failed: {}", err);
                    }
                }
                if input.just_pressed(Key::QuickLoad) {
                    if let Err(err) = self.load_game(&path) {
                        log::warn!("Quick load failed, keeping current state: {}", err);
                    }
                }
            }
        }
        self.player.set_direction(input.movement());
        Ok(())
    }

    fn talk_to_facing_character(&mut self) -> DataResult<()> {
        let (pos, facing) = (self.player.pos, self.player.facing);
        let Some(character) = self
            .characters
            .iter_mut()
            .find(|character| in_line_of_sight(pos, facing, character.pos, TALK_REACH))
        else {
            return Ok(());
        };
        character.face(pos);
        let character_id = character.id.clone();

        self.player.block();
        self.start_dialogue(&character_id)
    }

    fn transition_check(&mut self) {
        if self.transition.is_busy() || self.battle.is_some() {
            return;
        }
        let Some(zone) = self.map.transition_at(&self.player.hitbox()) else {
            return;
        };
        let target = TransitionTarget::Map {
            target: zone.target.clone(),
            spawn: zone.spawn.clone(),
        };
        self.player.block();
        self.transition.request(target);
    }

    fn update_world(&mut self, dt: f32) -> GameResult<()> {
        let blockers: Vec<Rect> = self.characters.iter().map(Character::hitbox).collect();
        self.player.step(dt, &self.map, &blockers);
        self.check_trainer_sight()?;
        self.check_for_encounter()
    }

    /// An undefeated trainer that sees the player stops them and starts talking
    fn check_trainer_sight(&mut self) -> DataResult<()> {
        if self.dialogue.is_some() || self.battle.is_some() || self.transition.is_busy() {
            return Ok(());
        }
        let pos = self.player.pos;
        let (data, book) = (&self.data, &self.character_book);
        let Some(character) = self.characters.iter_mut().find(|character| {
            let defeated = book.get(&character.id).is_some_and(|flags| flags.defeated);
            let trainer = data.character(&character.id).is_ok_and(|c| c.is_trainer());
            trainer && !defeated && character.sees(pos)
        }) else {
            return Ok(());
        };
        character.noticed = true;
        character.face(pos);
        let character_id = character.id.clone();
        log::info!("{} noticed the player", character_id);

        self.player.block();
        self.audio.play(AudioCue::Notice);
        self.start_dialogue(&character_id)
    }

    fn check_for_encounter(&mut self) -> GameResult<()> {
        let busy = self.battle.is_some() || self.transition.is_busy() || self.dialogue.is_some();
        let hitbox = self.player.hitbox();
        let moving = self.player.is_moving();
        let Some(encounter) = self
            .encounter
            .check(&self.data, &self.map, &hitbox, moving, busy, &mut self.rng)?
        else {
            return Ok(());
        };

        if encounter.roster.is_empty() || self.roster.all_fainted() {
            log::warn!("Skipping wild encounter in {}: a side has nothing to fight with", encounter.zone.biome);
            return Ok(());
        }
        let session = BattleSession::wild(
            std::mem::take(&mut self.roster),
            encounter.roster,
            &encounter.zone.biome,
            self.player_controller(),
        )?;
        self.request_battle(session);
        Ok(())
    }

    fn update_overlays(&mut self, dt: f32, input: &dyn InputState) -> GameResult<()> {
        self.update_dialogue(input)?;
        self.update_battle(dt)?;
        self.update_evolution(dt)
    }

    /// Confirm advances the conversation. Paused while an evolution plays.
    fn update_dialogue(&mut self, input: &dyn InputState) -> GameResult<()> {
        if self.evolution.is_active() || self.dialogue_opened {
            return Ok(());
        }
        let Some(dialogue) = self.dialogue.as_mut() else {
            return Ok(());
        };
        if !dialogue.is_finished() && input.just_pressed(Key::Confirm) {
            dialogue.advance();
        }
        if dialogue.is_finished() {
            let character_id = dialogue.character_id.clone();
            self.dialogue = None;
            self.end_dialogue(&character_id)?;
        }
        Ok(())
    }

    /// With auto-battle on, the AI plays the player's side at a fixed pace
    fn update_battle(&mut self, dt: f32) -> GameResult<()> {
        if !self.config.auto_battle || self.transition.is_busy() {
            return Ok(());
        }
        let Some(runner) = self.battle.as_mut() else {
            return Ok(());
        };
        if runner.is_battle_ended() || !self.battle_clock.update(dt) {
            return Ok(());
        }
        self.battle_clock.activate();
        if let Some(result) = runner.auto_execute_if_ready()? {
            self.handle_battle_result(result)?;
        }
        Ok(())
    }

    fn update_evolution(&mut self, dt: f32) -> GameResult<()> {
        if self.battle.is_some() || self.evolution.is_idle() {
            return Ok(());
        }
        let data = Arc::clone(&self.data);
        for event in self.evolution.update(dt, &data, &mut self.roster)? {
            match event {
                EvolutionEvent::Started { from, to, .. } => {
                    self.player.block();
                    self.audio.play(AudioCue::Evolution);
                    self.messages.push(format!("{} is evolving into {}!", from, to));
                }
                EvolutionEvent::Completed { species, .. } => {
                    self.messages.push(format!("It became {}!", species));
                }
                EvolutionEvent::Drained => {
                    if self.dialogue.is_none() {
                        self.player.unblock();
                    }
                }
            }
        }
        Ok(())
    }

    // --- Dialogue ---

    fn start_dialogue(&mut self, character_id: &str) -> DataResult<()> {
        if self.dialogue.is_some() {
            return Ok(());
        }
        let character = self.data.character(character_id)?;
        let lines = character.lines(self.is_defeated(character_id));
        self.dialogue = Some(Dialogue::new(character_id, lines));
        self.dialogue_opened = true;
        log::debug!("Dialogue with {} started", character_id);
        Ok(())
    }

    /// Nurses heal and set the checkpoint, undefeated trainers start a battle
    fn end_dialogue(&mut self, character_id: &str) -> GameResult<()> {
        let data = Arc::clone(&self.data);
        let character = data.character(character_id)?;
        match character.role {
            CharacterRole::Nurse => {
                self.roster.heal_all();
                if let Some(spawn) = &character.checkpoint {
                    self.checkpoint = (self.current_world.clone(), spawn.clone());
                    log::info!("Checkpoint set to {} / {}", self.current_world, spawn);
                }
                self.player.unblock();
            }
            CharacterRole::Trainer if character.is_trainer() && !self.is_defeated(character_id) => {
                let opponents = character.build_roster(&data)?;
                if self.roster.all_fainted() {
                    log::warn!("No monster can fight {}", character_id);
                    self.player.unblock();
                    return Ok(());
                }
                let session = BattleSession::trainer(
                    std::mem::take(&mut self.roster),
                    character_id,
                    opponents,
                    &character.biome,
                    self.player_controller(),
                )?;
                self.request_battle(session);
            }
            CharacterRole::Trainer => {
                if self.evolution.is_idle() {
                    self.player.unblock();
                }
            }
        }
        Ok(())
    }

    // --- Battle ---

    fn player_controller(&self) -> Controller {
        if self.config.auto_battle {
            Controller::Ai
        } else {
            Controller::Human
        }
    }

    /// Fade into a prepared battle. The session already owns the roster.
    fn request_battle(&mut self, session: BattleSession) {
        if self.transition.is_busy() {
            log::warn!("Battle requested during another transition, discarded");
            self.roster = session.into_player_roster();
            return;
        }
        self.player.block();
        self.audio.play(AudioCue::BattleMusic);
        self.transition.request(TransitionTarget::Battle(Box::new(session)));
    }

    /// Submit the player's action for the running battle. Invalid actions come
    /// back as `GameError::Battle` with nothing changed. Returns whether a
    /// turn or replacement was resolved.
    pub fn submit_battle_action(&mut self, action: PlayerAction) -> GameResult<bool> {
        let runner = self.battle.as_mut().ok_or(BattleError::BattleOver)?;
        match runner.submit_action(PLAYER_SIDE, action)? {
            Some(result) => {
                self.handle_battle_result(result)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn handle_battle_result(&mut self, result: ExecutionResult) -> GameResult<()> {
        if let Some(runner) = &self.battle {
            self.messages.extend(result.events.formatted(runner.session()));
        }
        match result.outcome {
            Some(BattleOutcome::Victory) => self.on_victory()?,
            Some(BattleOutcome::Defeat) => self.on_defeat(),
            Some(BattleOutcome::Fled) => self.on_flee(),
            None => {}
        }
        Ok(())
    }

    /// A beaten trainer is marked defeated and says its defeated lines
    pub fn on_victory(&mut self) -> GameResult<()> {
        self.audio.play(AudioCue::OverworldMusic);
        let trainer = match self.battle() {
            Some(BattleSession {
                kind: BattleKind::Trainer { character_id },
                ..
            }) => Some(character_id.clone()),
            _ => None,
        };
        if let Some(character_id) = trainer {
            self.character_book.entry(character_id.clone()).or_default().defeated = true;
            log::info!("{} has been defeated", character_id);
            self.start_dialogue(&character_id)?;
        }
        self.transition.request(TransitionTarget::EndBattle { respawn: None });
        Ok(())
    }

    /// Losing sends the player back to the last checkpoint with a healed roster
    pub fn on_defeat(&mut self) {
        self.audio.play(AudioCue::OverworldMusic);
        self.transition.request(TransitionTarget::EndBattle {
            respawn: Some(self.checkpoint.clone()),
        });
    }

    /// Fleeing changes nothing on the roster
    pub fn on_flee(&mut self) {
        self.audio.play(AudioCue::OverworldMusic);
        self.transition.request(TransitionTarget::EndBattle { respawn: None });
    }

    // --- Transitions ---

    fn apply_transition(&mut self, target: TransitionTarget) -> GameResult<()> {
        match target {
            TransitionTarget::NoTransition => {}
            TransitionTarget::Map { target, spawn } => {
                self.load_map(&target, &spawn)?;
                self.player.unblock();
            }
            TransitionTarget::Battle(session) => {
                let rng = TurnRng::from_seed(self.rng.random());
                self.battle = Some(BattleRunner::new(
                    *session,
                    Arc::clone(&self.data),
                    self.rules.clone(),
                    rng,
                ));
                self.battle_clock = Timer::started(self.config.battle_turn_interval_ms);
            }
            TransitionTarget::EndBattle { respawn } => self.finish_battle(respawn)?,
        }
        Ok(())
    }

    /// Take the roster back from the finished battle and queue its evolutions
    fn finish_battle(&mut self, respawn: Option<(String, String)>) -> GameResult<()> {
        let Some(runner) = self.battle.take() else {
            return Ok(());
        };
        let session = runner.finish();
        let pending = session.pending_evolutions.clone();
        self.roster = session.into_player_roster();

        if let Some((world, spawn)) = respawn {
            self.roster.heal_all();
            self.load_map(&world, &spawn)?;
        }
        self.evolution.enqueue_slots(&self.roster, &pending);
        if self.dialogue.is_none() && self.evolution.is_idle() {
            self.player.unblock();
        }
        Ok(())
    }

    fn enter_world(&mut self, world: &str) -> DataResult<()> {
        let map = self.data.world(world)?.clone();
        self.characters = map.characters.iter().map(Character::from_placement).collect();
        self.map = map;
        self.current_world = world.to_string();
        Ok(())
    }

    /// Swap in a map and put the player on one of its spawns
    pub fn load_map(&mut self, world: &str, spawn: &str) -> DataResult<()> {
        let point = self.data.world(world)?.spawn(world, spawn)?.clone();
        self.enter_world(world)?;
        self.player.pos = point.pos();
        self.player.facing = point.facing;
        self.player.direction = (0.0, 0.0);
        log::info!("Entered {} at {}", world, spawn);
        Ok(())
    }

    // --- Persistence ---

    pub fn to_save_data(&self) -> SaveData {
        SaveData {
            game_data: GameSnapshot {
                current_world: self.current_world.clone(),
                player_monsters: self.roster.to_records(),
            },
            player: self.player.to_record(),
            characters: self
                .characters
                .iter()
                .map(|character| CharacterRecord {
                    character_id: character.id.clone(),
                    facing: character.facing,
                    defeated: self.is_defeated(&character.id),
                })
                .collect(),
            character_data: self.character_book.clone(),
        }
    }

    fn battle_in_progress(&self) -> bool {
        self.battle.is_some() || matches!(self.transition.pending(), TransitionTarget::Battle(_))
    }

    pub fn save_game(&self, path: &Path) -> SaveResult<()> {
        if self.battle_in_progress() {
            return Err(SaveError::InBattle);
        }
        persistence::write_save(path, &self.to_save_data())
    }

    /// Load a save file. On any error the current state is left untouched.
    pub fn load_game(&mut self, path: &Path) -> SaveResult<()> {
        if self.battle_in_progress() {
            return Err(SaveError::InBattle);
        }
        let save = persistence::read_save(path)?;
        self.apply_save_data(save)?;
        log::info!("Loaded save from {}", path.display());
        Ok(())
    }

    pub fn apply_save_data(&mut self, save: SaveData) -> SaveResult<()> {
        let roster = save.validate(&self.data)?;
        self.enter_world(&save.game_data.current_world)
            .map_err(|e| SaveError::MalformedSave(e.to_string()))?;

        self.roster = roster;
        self.character_book = initial_book(&self.data);
        self.character_book.extend(save.character_data);
        for record in save.characters {
            if let Some(character) = self.characters.iter_mut().find(|c| c.id == record.character_id) {
                character.facing = record.facing;
            }
            self.character_book.entry(record.character_id).or_default().defeated = record.defeated;
        }
        self.player.apply_record(&save.player);
        self.dialogue = None;
        self.evolution.clear();
        Ok(())
    }

    // --- Rendering ---

    pub fn frame(&self) -> Frame {
        Frame {
            world: self.current_world.clone(),
            player_pos: self.player.pos,
            player_facing: self.player.facing,
            tint_alpha: self.transition.alpha(),
            dialogue_line: self
                .dialogue
                .as_ref()
                .and_then(Dialogue::current_line)
                .map(str::to_string),
            monster_index_open: self.monster_index_open,
            battle: self.battle().map(|session| BattleView {
                turn_number: session.turn_number,
                phase: session.phase,
                player_monster: session.player().active_monster().map(|m| m.to_string()),
                opponent_monster: session.opponent().active_monster().map(|m| m.to_string()),
            }),
            evolution: self
                .evolution
                .active()
                .map(|active| (active.from.clone(), active.to.clone(), active.progress())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::Monster;
    use crate::services::InputFrame;
    use super::player::PLAYER_HITBOX;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 0.1;

    #[derive(Clone, Default)]
    struct RecordingAudio(Rc<RefCell<Vec<AudioCue>>>);

    impl AudioPlayer for RecordingAudio {
        fn play(&mut self, cue: AudioCue) {
            self.0.borrow_mut().push(cue);
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(7),
            startup_delay_ms: 0,
            battle_turn_interval_ms: 100,
            ..GameConfig::default()
        }
    }

    fn game_with(config: GameConfig) -> (Game, RecordingAudio) {
        let audio = RecordingAudio::default();
        let data = Arc::new(GameData::bundled().unwrap());
        let game = Game::new(data, config, Box::new(audio.clone()), Box::new(NullRenderer)).unwrap();
        (game, audio)
    }

    fn monster(game: &Game, name: &str, level: u32) -> Monster {
        Monster::new(&game.data, name, level).unwrap()
    }

    /// Tick until `done` holds, failing after `max_ticks`
    fn run_until(game: &mut Game, input: &InputFrame, max_ticks: usize, done: impl Fn(&Game) -> bool) {
        for _ in 0..max_ticks {
            if done(game) {
                return;
            }
            game.update(DT, input).unwrap();
        }
        assert!(done(game), "condition not reached within {} ticks", max_ticks);
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            TickStage::ORDER,
            [
                TickStage::StartupDelay,
                TickStage::EncounterTimer,
                TickStage::Input,
                TickStage::TransitionCheck,
                TickStage::WorldUpdate,
                TickStage::Overlays,
                TickStage::Tint,
            ]
        );
    }

    #[test]
    fn test_startup_delay_gates_everything() {
        let (mut game, _) = game_with(GameConfig {
            startup_delay_ms: 250,
            ..config()
        });
        let walk = InputFrame::new().moving(Direction::Right);

        game.update(DT, &walk).unwrap();
        game.update(DT, &walk).unwrap();
        assert_eq!(game.player().pos, (640.0, 640.0));

        game.update(DT, &walk).unwrap();
        assert_eq!(game.player().pos, (665.0, 640.0));
        assert_eq!(game.player().facing, Direction::Right);
    }

    #[test]
    fn test_transition_zone_swaps_map_at_full_tint() {
        let (mut game, _) = game_with(config());
        game.player.pos = (1280.0, 392.0);
        let idle = InputFrame::new();

        game.update(DT, &idle).unwrap();
        assert_eq!(game.tint_mode(), TintMode::Tinting);
        assert!(game.player().blocked);
        assert_eq!(game.current_world(), "world");

        run_until(&mut game, &idle, 10, |g| g.current_world() == "hospital");
        assert_eq!(game.player().pos, (512.0, 576.0));
        assert_eq!(game.player().facing, Direction::Up);
        assert!(!game.player().blocked);
        assert_eq!(game.characters()[0].id, "Nurse");
    }

    #[test]
    fn test_wild_encounter_and_flee() {
        let (mut game, audio) = game_with(GameConfig {
            spawn_chance: 0,
            ..config()
        });
        let before = game.roster().clone();
        game.player.pos = (900.0, 700.0);

        // Walking through the zone fires an encounter on the first roll
        game.update(DT, &InputFrame::new().moving(Direction::Right)).unwrap();
        assert!(game.player().blocked);
        assert!(game.roster().is_empty(), "the pending battle owns the roster");

        let idle = InputFrame::new();
        run_until(&mut game, &idle, 10, |g| g.battle().is_some());
        let frame = game.frame();
        assert_eq!(
            frame.battle.as_ref().and_then(|view| view.player_monster.clone()),
            Some("Plumette at level 5".to_string())
        );
        assert!(matches!(game.save_game(Path::new("unused.json")), Err(SaveError::InBattle)));

        assert!(game.submit_battle_action(PlayerAction::Flee).unwrap());
        assert_eq!(game.battle().and_then(BattleSession::outcome), Some(BattleOutcome::Fled));
        assert!(!game.take_messages().is_empty());

        run_until(&mut game, &idle, 10, |g| g.battle().is_none());
        assert_eq!(game.roster(), &before);
        assert!(!game.player().blocked);
        assert_eq!(
            *audio.0.borrow(),
            vec![AudioCue::OverworldMusic, AudioCue::BattleMusic, AudioCue::OverworldMusic]
        );
    }

    #[test]
    fn test_invalid_battle_action_is_rejected() {
        let (mut game, _) = game_with(config());
        let session = BattleSession::trainer(
            std::mem::take(&mut game.roster),
            "o1",
            Roster::from_monsters(vec![monster(&game, "Larvea", 5)]),
            "forest",
            Controller::Human,
        )
        .unwrap();
        game.request_battle(session);
        run_until(&mut game, &InputFrame::new(), 10, |g| g.battle().is_some());

        let result = game.submit_battle_action(PlayerAction::Flee);
        assert!(matches!(
            result,
            Err(crate::errors::GameError::Battle(BattleError::CannotFlee))
        ));
        assert_eq!(game.battle().map(|s| s.turn_number), Some(1));
    }

    #[test]
    fn test_defeat_returns_to_checkpoint_healed() {
        let (mut game, _) = game_with(GameConfig {
            auto_battle: true,
            ..config()
        });
        let mut larvea = monster(&game, "Larvea", 1);
        larvea.health = 1;
        let session = BattleSession::wild(
            Roster::from_monsters(vec![larvea]),
            Roster::from_monsters(vec![monster(&game, "Jacana", 5)]),
            "forest",
            Controller::Ai,
        )
        .unwrap();
        game.roster = Roster::new();
        game.player.pos = (900.0, 900.0);
        game.request_battle(session);

        let idle = InputFrame::new();
        run_until(&mut game, &idle, 10, |g| g.battle().is_some());
        run_until(&mut game, &idle, 30, |g| g.battle().is_none());

        assert_eq!(game.current_world(), "world");
        assert_eq!(game.player().pos, (640.0, 640.0));
        let larvea = game.roster().get(0).unwrap();
        assert_eq!(larvea.health, 15);
        assert!(!game.player().blocked);
    }

    #[test]
    fn test_nurse_heals_and_sets_checkpoint() {
        let (mut game, _) = game_with(config());
        game.load_map("hospital", "nurse").unwrap();
        game.roster.get_mut(0).unwrap().take_damage(30);
        let confirm = InputFrame::new().press(Key::Confirm);

        game.update(DT, &confirm).unwrap();
        assert_eq!(
            game.dialogue().and_then(Dialogue::current_line),
            Some("Welcome to the hospital")
        );
        assert!(game.player().blocked);

        game.update(DT, &confirm).unwrap();
        game.update(DT, &confirm).unwrap();
        assert!(game.dialogue().is_none());
        assert_eq!(game.roster().get(0).unwrap().health, 75);
        assert_eq!(game.checkpoint(), &("hospital".to_string(), "nurse".to_string()));
        assert!(!game.player().blocked);
    }

    #[test]
    fn test_characters_block_the_player() {
        let (mut game, _) = game_with(config());
        game.load_map("hospital", "nurse").unwrap();
        game.player.pos = (512.0, 420.0);
        let walk_up = InputFrame::new().moving(Direction::Up);

        for _ in 0..8 {
            game.update(DT, &walk_up).unwrap();
        }

        let nurse = game.characters()[0].hitbox();
        assert_eq!(game.player().pos, (512.0, nurse.bottom() + PLAYER_HITBOX.1 / 2.0));
        assert!(!nurse.intersects(&game.player().hitbox()));
        assert!(game.dialogue().is_none());
    }

    #[test]
    fn test_trainer_battle_victory_and_evolution() {
        let (mut game, audio) = game_with(GameConfig {
            auto_battle: true,
            ..config()
        });
        game.roster = Roster::from_monsters(vec![monster(&game, "Sparchu", 50)]);
        game.player.pos = (900.0, 960.0);
        let idle = InputFrame::new();
        let confirm = InputFrame::new().press(Key::Confirm);

        // o1 looks left and spots the player
        game.update(DT, &idle).unwrap();
        assert_eq!(game.dialogue().map(|d| d.character_id.as_str()), Some("o1"));
        assert!(game.characters().iter().any(|c| c.id == "o1" && c.noticed));

        for _ in 0..3 {
            game.update(DT, &confirm).unwrap();
        }
        assert!(game.dialogue().is_none());
        run_until(&mut game, &idle, 10, |g| g.battle().is_some());
        run_until(&mut game, &idle, 60, |g| g.battle().is_none());

        assert!(game.is_defeated("o1"));
        assert_eq!(
            game.dialogue().and_then(Dialogue::current_line),
            Some("You are very strong!")
        );

        // Level 50 is past Sparchu's evolution level
        run_until(&mut game, &idle, 5, |g| g.evolution().is_active());
        let evolved = game.roster().get(0).unwrap();
        assert_eq!(evolved.name, "Cindrill");
        assert_eq!(evolved.level, 50);
        assert!(game.player().blocked);
        assert!(audio.0.borrow().contains(&AudioCue::Notice));
        assert!(audio.0.borrow().contains(&AudioCue::Evolution));

        // The defeated trainer does not notice the player again
        assert!(game.to_save_data().character_data["o1"].defeated);
    }

    #[test]
    fn test_monster_index_blocks_movement() {
        let (mut game, _) = game_with(config());
        let start = game.player().pos;

        game.update(DT, &InputFrame::new().press(Key::MonsterIndex)).unwrap();
        assert!(game.monster_index_open());
        game.update(DT, &InputFrame::new().moving(Direction::Down)).unwrap();
        assert_eq!(game.player().pos, start);

        game.update(DT, &InputFrame::new().press(Key::Escape)).unwrap();
        assert!(!game.monster_index_open());
        assert!(!game.player().blocked);
    }

    #[test]
    fn test_quick_save_and_load() {
        let save_dir = std::env::temp_dir().join(format!("monster-adventure-game-{}", std::process::id()));
        let (mut game, _) = game_with(GameConfig {
            save_dir: save_dir.clone(),
            ..config()
        });
        let saved_roster = game.roster().clone();

        game.update(DT, &InputFrame::new().press(Key::QuickSave)).unwrap();
        assert!(game.config().quick_save_path().exists());

        game.roster.get_mut(1).unwrap().take_damage(40);
        game.load_map("hospital", "world").unwrap();
        game.update(DT, &InputFrame::new().press(Key::QuickLoad)).unwrap();

        assert_eq!(game.current_world(), "world");
        assert_eq!(game.player().pos, (640.0, 640.0));
        assert_eq!(game.roster(), &saved_roster);
        let _ = std::fs::remove_dir_all(&save_dir);
    }

    #[test]
    fn test_malformed_save_keeps_state() {
        let path = std::env::temp_dir().join(format!("monster-adventure-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{\"game_data\": {\"current_world\": \"world\"}}").unwrap();
        let (mut game, _) = game_with(config());
        game.roster.get_mut(0).unwrap().take_damage(10);
        let before = game.roster().clone();

        assert!(matches!(game.load_game(&path), Err(SaveError::MalformedSave(_))));
        assert_eq!(game.roster(), &before);
        assert_eq!(game.current_world(), "world");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_close_key_stops_the_game() {
        let (mut game, _) = game_with(config());
        game.update(DT, &InputFrame::new().press(Key::Close)).unwrap();
        assert!(!game.is_running());
    }
}
