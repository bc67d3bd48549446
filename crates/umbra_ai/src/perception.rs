//! Perception channels and the per-actor perception scheduler
//!
//! Every actor owns a fixed table mapping each [`PercType`] to an optional
//! script callback. Active channels are evaluated by [`PerceptionTable::process`]
//! at most once per perception interval; passive channels are delivered by
//! the world when something happens near the actor.

use crate::config::AiConfig;
use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};
use umbra_core::{ActorId, ScriptFn};
use umbra_physics::CollisionWorld;

/// Number of perception table slots (types are numbered from 1)
pub const PERC_COUNT: usize = 33;

/// Perception channel, numbered like the script interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PercType {
    AssessPlayer = 1,
    AssessEnemy = 2,
    AssessFighter = 3,
    AssessBody = 4,
    AssessItem = 5,
    AssessMurder = 6,
    AssessDefeat = 7,
    AssessDamage = 8,
    AssessOthersDamage = 9,
    AssessThreat = 10,
    AssessRemoveWeapon = 11,
    ObserveIntruder = 12,
    AssessFightSound = 13,
    AssessQuietSound = 14,
    AssessWarn = 15,
    CatchThief = 16,
    AssessTheft = 17,
    AssessCall = 18,
    AssessTalk = 19,
    AssessGivenItem = 20,
    AssessFakeGuild = 21,
    MoveMob = 22,
    MoveNpc = 23,
    DrawWeapon = 24,
    ObserveSuspect = 25,
    NpcCommand = 26,
    AssessMagic = 27,
    AssessStopMagic = 28,
    AssessCaster = 29,
    AssessSurprise = 30,
    AssessEnterRoom = 31,
    AssessUseMob = 32,
}

impl PercType {
    /// Channels evaluated by the scheduler, in processing order
    pub const ACTIVE: [PercType; 8] = [
        PercType::AssessPlayer,
        PercType::AssessEnemy,
        PercType::AssessFighter,
        PercType::AssessBody,
        PercType::AssessFightSound,
        PercType::AssessQuietSound,
        PercType::DrawWeapon,
        PercType::AssessCaster,
    ];

    /// From the script number
    pub fn from_u8(value: u8) -> Result<Self> {
        use PercType::*;
        const ALL: [PercType; 32] = [
            AssessPlayer, AssessEnemy, AssessFighter, AssessBody, AssessItem, AssessMurder,
            AssessDefeat, AssessDamage, AssessOthersDamage, AssessThreat, AssessRemoveWeapon,
            ObserveIntruder, AssessFightSound, AssessQuietSound, AssessWarn, CatchThief,
            AssessTheft, AssessCall, AssessTalk, AssessGivenItem, AssessFakeGuild, MoveMob,
            MoveNpc, DrawWeapon, ObserveSuspect, NpcCommand, AssessMagic, AssessStopMagic,
            AssessCaster, AssessSurprise, AssessEnterRoom, AssessUseMob,
        ];
        match value {
            1..=32 => Ok(ALL[value as usize - 1]),
            _ => Err(AiError::InvalidPerception(value)),
        }
    }

    /// Whether the scheduler evaluates this channel on its own
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

/// Noise an actor makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Noise {
    #[default]
    Silent,
    /// Sneaking, lock picking
    Quiet,
    /// Weapon clashes, shouting
    Fight,
}

/// What an observer knows about another actor during one perception pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observed {
    pub id: ActorId,
    /// Feet position
    pub position: [f32; 3],
    /// Eye position
    pub eye: [f32; 3],
    pub is_player: bool,
    /// Hostile towards the observer
    pub hostile: bool,
    pub dead: bool,
    pub weapon_drawn: bool,
    /// Started drawing a weapon this pass
    pub drawing_weapon: bool,
    pub casting: bool,
    pub noise: Noise,
    /// Actor it is fighting
    pub target: Option<ActorId>,
}

/// The perceiving actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub id: ActorId,
    pub position: [f32; 3],
    pub eye: [f32; 3],
    /// Heading around Y in radians; forward is `(sin, 0, cos)`
    pub yaw: f32,
}

/// A perception to deliver to a script callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptionEvent {
    pub perc: PercType,
    pub func: ScriptFn,
    /// The perceived actor (`other` in the callback)
    pub other: Option<ActorId>,
    /// Whoever `other` is fighting, for fight sounds
    pub victim: Option<ActorId>,
}

/// Result of one perception pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerceptionReport {
    pub events: Vec<PerceptionEvent>,
    /// Nearest visible hostile, when `AssessEnemy` ran
    pub nearest_enemy: Option<ActorId>,
}

/// Perception callbacks of one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionTable {
    #[serde(with = "slots")]
    slots: [Option<ScriptFn>; PERC_COUNT],
    perception_time: u64,
    next_time: u64,
}

impl Default for PerceptionTable {
    fn default() -> Self {
        Self::new(AiConfig::default().perception_time_ms)
    }
}

impl PerceptionTable {
    /// All channels disabled
    pub fn new(perception_time: u64) -> Self {
        Self {
            slots: [None; PERC_COUNT],
            perception_time,
            next_time: 0,
        }
    }

    /// Route a channel to a callback
    pub fn set_enabled(&mut self, perc: PercType, func: ScriptFn) {
        self.slots[perc as usize] = Some(func);
    }

    /// Disable a channel
    pub fn set_disabled(&mut self, perc: PercType) {
        self.slots[perc as usize] = None;
    }

    /// Callback of an enabled channel
    pub fn get(&self, perc: PercType) -> Option<ScriptFn> {
        self.slots[perc as usize]
    }

    /// Whether a channel is enabled
    pub fn has(&self, perc: PercType) -> bool {
        self.slots[perc as usize].is_some()
    }

    /// Set the interval between active passes
    pub fn set_perception_time(&mut self, ms: u64) {
        self.perception_time = ms;
    }

    /// Interval between active passes
    pub fn perception_time(&self) -> u64 {
        self.perception_time
    }

    /// Earliest time of the next active pass
    pub fn next_time(&self) -> u64 {
        self.next_time
    }

    /// Disable every channel
    pub fn clear(&mut self) {
        self.slots = [None; PERC_COUNT];
    }

    /// Run an active perception pass
    ///
    /// Does nothing before `next_time`. Each enabled active channel yields
    /// at most one event.
    pub fn process(
        &mut self,
        observer: &Observer,
        candidates: &[Observed],
        physics: &CollisionWorld,
        config: &AiConfig,
        now: u64,
    ) -> PerceptionReport {
        let mut report = PerceptionReport::default();
        if now < self.next_time {
            return report;
        }
        self.next_time = now + self.perception_time;

        let sight_sq = config.sight_range * config.sight_range;
        let visible = |c: &Observed| -> bool {
            c.id != observer.id
                && dist_sq(observer.position, c.position) <= sight_sq
                && can_see(observer, c.eye, false, physics, config)
        };
        let nearest = |pred: &dyn Fn(&Observed) -> bool| nearest_to(observer, candidates, pred);

        for perc in PercType::ACTIVE {
            let Some(func) = self.get(perc) else {
                continue;
            };
            let other = match perc {
                PercType::AssessPlayer => nearest(&|c: &Observed| c.is_player && !c.dead && visible(c)),
                PercType::AssessEnemy => {
                    let enemy = nearest(&|c: &Observed| c.hostile && !c.dead && visible(c));
                    report.nearest_enemy = enemy.map(|c| c.id);
                    enemy
                }
                PercType::AssessFighter => nearest(&|c: &Observed| c.weapon_drawn && !c.dead && visible(c)),
                PercType::AssessBody => nearest(&|c: &Observed| c.dead && visible(c)),
                PercType::DrawWeapon => nearest(&|c: &Observed| c.drawing_weapon && visible(c)),
                PercType::AssessCaster => nearest(&|c: &Observed| c.casting && visible(c)),
                PercType::AssessFightSound => nearest(&|c: &Observed| {
                    c.id != observer.id
                        && c.noise == Noise::Fight
                        && dist_sq(observer.position, c.position) <= config.hearing_range * config.hearing_range
                }),
                PercType::AssessQuietSound => nearest(&|c: &Observed| {
                    c.id != observer.id
                        && c.noise != Noise::Silent
                        && dist_sq(observer.position, c.position)
                            <= config.quiet_hearing_range * config.quiet_hearing_range
                }),
                _ => None,
            };
            if let Some(other) = other {
                let victim = if perc == PercType::AssessFightSound { other.target } else { None };
                report.events.push(PerceptionEvent {
                    perc,
                    func,
                    other: Some(other.id),
                    victim,
                });
            }
        }

        report
    }
}

/// Candidate closest to the observer among those `pred` accepts
fn nearest_to<'c>(
    observer: &Observer,
    candidates: &'c [Observed],
    pred: &dyn Fn(&Observed) -> bool,
) -> Option<&'c Observed> {
    candidates
        .iter()
        .filter(|c| pred(c))
        .min_by(|a, b| dist_sq(observer.position, a.position).total_cmp(&dist_sq(observer.position, b.position)))
}

/// Squared distance
pub fn dist_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
}

/// Whether `observer` can see the point `target_eye`
///
/// With `free_los` only the line of sight matters; otherwise the point must
/// also lie inside the horizontal field of view.
pub fn can_see(
    observer: &Observer,
    target_eye: [f32; 3],
    free_los: bool,
    physics: &CollisionWorld,
    config: &AiConfig,
) -> bool {
    if !free_los {
        let dx = target_eye[0] - observer.position[0];
        let dz = target_eye[2] - observer.position[2];
        let len = (dx * dx + dz * dz).sqrt();
        if len > 1e-3 {
            let facing = dx / len * observer.yaw.sin() + dz / len * observer.yaw.cos();
            if facing < config.fov_cos() {
                return false;
            }
        }
    }
    physics.line_of_sight(observer.eye, target_eye)
}

mod slots {
    use super::PERC_COUNT;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use umbra_core::ScriptFn;

    pub fn serialize<S: Serializer>(slots: &[Option<ScriptFn>; PERC_COUNT], s: S) -> Result<S::Ok, S::Error> {
        slots.as_slice().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[Option<ScriptFn>; PERC_COUNT], D::Error> {
        let v: Vec<Option<ScriptFn>> = Vec::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| D::Error::invalid_length(len, &"one slot per perception type"))
    }
}
