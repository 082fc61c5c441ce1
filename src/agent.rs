//! The decision loop
//!
//! [`Agent`] owns every per-match component and turns host events into one
//! [`TickCommands`] per tick. Events can be handed over directly through
//! [`Agent::handle`] or queued from callbacks through the inbox sender.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::AgentConfig;
use crate::game::arena::Arena;
use crate::game::constants::rules::bullet_speed;
use crate::game::events::{GunCommand, HostEvent, NavCommand, SelfState, Sighting, TickCommands};
use crate::game::inbox::{EventInbox, EventSender};
use crate::learning::guess_factor::GuessFactorContext;
use crate::learning::wave::{Wave, WaveSet};
use crate::nav::motion::MotionTracker;
use crate::nav::threats::ThreatTracker;
use crate::nav::{NavInputs, NavigationEngine};
use crate::radar::RadarControl;
use crate::scheduler::{ScheduledTask, Scheduler, TaskEffect};
use crate::stats::DecisionStats;
use crate::targeting::gun::{ready_to_fire, GunControl};
use crate::targeting::selection::TargetSelector;
use crate::targeting::solution::{AimMethod, FiringSolution};
use crate::tracking::recording::Recording;
use crate::tracking::store::TrackStore;
use crate::util::angle::bearing;
use crate::util::vec2::Vec2;

const FIRE_TASK: &str = "fire";
const FIRE_PRIORITY: u8 = 99;
const RADAR_TASK: &str = "radar";
const RADAR_PRIORITY: u8 = 10;

pub struct Agent {
    config: AgentConfig,
    tracks: Arc<TrackStore>,
    waves: WaveSet,
    context: GuessFactorContext,
    threats: ThreatTracker,
    selector: TargetSelector,
    gun: GunControl,
    nav: NavigationEngine,
    motion: MotionTracker,
    scheduler: Scheduler,
    inbox: EventInbox,
    stats: Arc<DecisionStats>,
    state: SelfState,
    /// Collision response waiting to be issued on the next tick
    pending_nav: Option<NavCommand>,
    /// Bearing the gun was told to turn onto last tick
    gun_aim: Option<f64>,
}

impl Agent {
    /// Agent with a fresh learning context
    pub fn new(config: AgentConfig) -> Self {
        let context = GuessFactorContext::new(&config.power_levels, config.angular_buckets);
        Self::with_context(config, context)
    }

    /// Agent sharing an existing learning context
    pub fn with_context(config: AgentConfig, context: GuessFactorContext) -> Self {
        let tracks = Arc::new(TrackStore::new(config.track_capacity));
        let mut agent = Self {
            waves: WaveSet::new(config.wave_tolerance),
            threats: ThreatTracker::new(config.shot_fan),
            selector: TargetSelector::new(),
            gun: GunControl::from_config(&config),
            nav: NavigationEngine::from_config(&config),
            motion: MotionTracker::new(),
            scheduler: Scheduler::new(),
            inbox: EventInbox::new(config.inbox_capacity),
            stats: Arc::new(DecisionStats::new()),
            state: SelfState::default(),
            pending_nav: None,
            gun_aim: None,
            context,
            tracks,
            config,
        };
        agent.schedule_radar();
        agent
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.config.arena
    }

    pub fn state(&self) -> &SelfState {
        &self.state
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    pub fn context(&self) -> &GuessFactorContext {
        &self.context
    }

    pub fn threats(&self) -> &ThreatTracker {
        &self.threats
    }

    pub fn nav(&self) -> &NavigationEngine {
        &self.nav
    }

    pub fn motion(&self) -> &MotionTracker {
        &self.motion
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn current_target(&self) -> Option<&str> {
        self.selector.current()
    }

    pub fn stats(&self) -> Arc<DecisionStats> {
        self.stats.clone()
    }

    /// Handle for host callbacks to queue events
    pub fn inbox_sender(&self) -> EventSender {
        self.inbox.sender()
    }

    fn schedule_radar(&mut self) {
        let tracks = self.tracks.clone();
        self.scheduler.schedule(ScheduledTask::repeating(
            RADAR_TASK,
            RADAR_PRIORITY,
            |_| true,
            move |me| Some(TaskEffect::Radar(RadarControl::turn(me, &tracks.tops()))),
        ));
    }

    /// Apply one host event
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Status(state) => {
                self.state = state;
                self.motion.observe(&state);
            }
            HostEvent::Scanned(sighting) => self.on_scanned(&sighting),
            HostEvent::HitWall { bearing } => {
                let command = self.nav.on_hit_wall(bearing);
                self.start_recoil(command);
            }
            HostEvent::HitRobot { name, bearing } => {
                debug!(opponent = %name, "Rammed opponent");
                let command = self.nav.on_hit_robot(bearing);
                self.start_recoil(command);
            }
            HostEvent::HitByBullet { name, power, .. } => {
                debug!(shooter = %name, power, "Hit by bullet");
                let command = self.nav.on_hit_by_bullet(&self.motion);
                self.start_recoil(command);
            }
            HostEvent::RobotDeath { name } => {
                self.tracks.remove(&name);
                self.waves.drop_target(&name);
                self.threats.drop_shooter(&name);
                if self.selector.current() == Some(name.as_str()) {
                    self.hold_fire();
                }
                self.selector.forget(&name);
                info!(opponent = %name, "Opponent destroyed");
            }
            HostEvent::RoundEnded => {
                self.end_round();
            }
        }
    }

    fn on_scanned(&mut self, sighting: &Sighting) {
        let me = self.state;
        let previous = self.tracks.top(&sighting.name);
        let current = self.tracks.observe(sighting, &me);
        DecisionStats::bump(&self.stats.scans);

        if let Some(previous) = previous {
            let lines = self.threats.infer(&sighting.name, &previous, &current, me.position);
            DecisionStats::add(&self.stats.inferred_shots, lines as u64);
        }

        let report = self
            .waves
            .update(&sighting.name, current.position, current.tick, &self.context);
        DecisionStats::add(&self.stats.waves_hit, report.hits as u64);
        DecisionStats::add(&self.stats.waves_passed, report.passes as u64);

        if self.config.virtual_waves {
            for &power in self.context.power_levels() {
                self.launch_wave(&sighting.name, &current, me.position, me.tick, power, false);
            }
        }
    }

    fn launch_wave(
        &self,
        target: &str,
        recording: &Recording,
        origin: Vec2,
        tick: u64,
        power: f64,
        real: bool,
    ) {
        self.waves.launch(Wave {
            origin,
            heading: bearing(origin, recording.advance(tick)),
            speed: bullet_speed(power),
            fire_tick: tick,
            target: target.to_string(),
            direction: recording.lateral_direction,
            key: self.context.key(recording.velocity, power),
            real,
        });
        DecisionStats::bump(&self.stats.waves_launched);
    }

    fn start_recoil(&mut self, command: Option<NavCommand>) {
        if let Some(command) = command {
            self.motion.abort();
            self.pending_nav = Some(command);
            DecisionStats::bump(&self.stats.recoils);
        }
    }

    fn end_round(&mut self) {
        self.tracks.clear();
        self.waves.clear();
        self.threats.clear();
        self.selector.clear();
        self.motion.reset();
        self.nav.reset();
        self.scheduler.clear();
        self.schedule_radar();
        self.pending_nav = None;
        self.gun_aim = None;
        info!(tick = self.state.tick, "Round ended, per-match state cleared");
    }

    /// Forget everything learned about every opponent
    pub fn reset_context(&self) {
        self.context.reset();
    }

    /// Decide this tick's commands from everything handled so far
    pub fn tick(&mut self) -> TickCommands {
        let started = Instant::now();
        for event in self.inbox.drain() {
            self.handle(event);
        }

        let me = self.state;
        DecisionStats::bump(&self.stats.ticks);

        let expired = self.waves.expire(me.tick, self.config.arena.diagonal());
        DecisionStats::add(&self.stats.waves_passed, expired as u64);
        self.threats.prune(me.tick, me.position, &self.config.arena);

        let tops = self.tracks.tops();
        let mut commands = TickCommands {
            gun: self.plan_shot(&me, &tops),
            nav: self.plan_movement(&me, &tops),
            radar: None,
        };

        for effect in self.scheduler.run(&me) {
            match effect {
                TaskEffect::Fire(solution) => self.fire(&me, &solution, &mut commands),
                TaskEffect::Radar(turn) => commands.radar = Some(turn),
            }
        }

        self.stats.record_decision_time(started.elapsed());
        commands
    }

    /// Convenience for hosts that deliver a whole tick at once
    pub fn step(&mut self, status: SelfState, events: impl IntoIterator<Item = HostEvent>) -> TickCommands {
        self.handle(HostEvent::Status(status));
        for event in events {
            self.handle(event);
        }
        self.tick()
    }

    fn plan_shot(&mut self, me: &SelfState, tops: &[(String, Recording)]) -> Option<GunCommand> {
        let target = self
            .selector
            .select(me, tops)
            .and_then(|name| tops.iter().find(|(n, _)| *n == name).cloned());
        let Some((name, recording)) = target else {
            self.hold_fire();
            return None;
        };

        let fire_tick = self.gun.fire_tick(me, &recording);
        let shooter = self.motion.project(me, fire_tick - me.tick);
        match self
            .gun
            .aim(me, shooter, fire_tick, &name, &recording, &self.context)
        {
            Ok(Some(solution)) => {
                let turn = solution.gun_turn(me.gun_heading);
                // Without a turn in flight, only a shot already lined up goes out
                let aimed_at = self.gun_aim.replace(solution.bearing).unwrap_or(solution.bearing);
                self.schedule_fire(solution, aimed_at);
                Some(GunCommand { turn, fire: None })
            }
            Ok(None) => {
                self.hold_fire();
                None
            }
            Err(err) => {
                debug!(%err, target = %name, "No firing solution");
                DecisionStats::bump(&self.stats.no_solution);
                self.hold_fire();
                None
            }
        }
    }

    /// Replace any pending shot with this solution
    ///
    /// The shot goes out once the gun is cool and the turn issued last tick
    /// toward `aimed_at` is all but complete.
    fn schedule_fire(&mut self, solution: FiringSolution, aimed_at: f64) {
        self.scheduler.cancel(FIRE_TASK);
        self.scheduler.schedule(ScheduledTask::once(
            FIRE_TASK,
            FIRE_PRIORITY,
            move |me| ready_to_fire(me, aimed_at),
            move |_| Some(TaskEffect::Fire(solution.clone())),
        ));
    }

    fn hold_fire(&mut self) {
        self.scheduler.cancel(FIRE_TASK);
        self.gun_aim = None;
    }

    fn fire(&mut self, me: &SelfState, solution: &FiringSolution, commands: &mut TickCommands) {
        let gun = commands.gun.get_or_insert(GunCommand {
            turn: solution.gun_turn(me.gun_heading),
            fire: None,
        });
        gun.fire = Some(solution.power);

        DecisionStats::bump(&self.stats.shots);
        if solution.method == AimMethod::GuessFactor {
            DecisionStats::bump(&self.stats.shots_guess_factor);
        }
        if let Some(recording) = self.tracks.top(&solution.target) {
            self.launch_wave(&solution.target, &recording, me.position, me.tick, solution.power, true);
        }
        debug!(
            target = %solution.target,
            power = solution.power,
            bearing = solution.bearing,
            method = ?solution.method,
            "Fire"
        );
    }

    fn plan_movement(&mut self, me: &SelfState, tops: &[(String, Recording)]) -> Option<NavCommand> {
        let command = match self.pending_nav.take() {
            Some(command) => Some(command),
            None => {
                let opponents: Vec<Recording> = tops.iter().map(|(_, r)| *r).collect();
                let projectiles = self.threats.positions(me.tick);
                let command = self.nav.decide(&NavInputs {
                    me,
                    motion: &self.motion,
                    opponents: &opponents,
                    projectiles: &projectiles,
                });
                if command.is_some() {
                    DecisionStats::bump(&self.stats.legs_planned);
                }
                command
            }
        };
        if let Some(command) = &command {
            self.motion.begin(command);
        }
        command
    }
}
