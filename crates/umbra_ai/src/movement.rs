//! Movement resolution
//!
//! Decides each tick whether an actor walks, falls, slides, swims, dives or
//! climbs, and pushes its body through the collision world accordingly.
//! The resolver only sees what the [`Movable`] trait exposes.

use crate::config::AiConfig;
use serde::{Deserialize, Serialize};
use umbra_physics::{CollisionWorld, MoveOutcome, PhysicalBody};

/// Gait chosen by scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WalkMode {
    Walk,
    #[default]
    Run,
    Sneak,
}

/// Movement mode resolved by the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveMode {
    #[default]
    Stand,
    /// Walking, running or sneaking on ground
    Move,
    /// Rising after a jump
    Jump,
    Fall,
    /// Sliding down a slope too steep to stand on
    Slide,
    Swim,
    Dive,
    Climb,
}

/// Movement state of one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveState {
    pub mode: MoveMode,
    pub walk_mode: WalkMode,
    /// Requested horizontal direction (unit length or zero)
    pub direction: [f32; 3],
    pub vertical_speed: f32,
    /// Height a fall started at
    pub fall_start_y: f32,
    /// Ledge height a climb ends at
    pub climb_target: Option<f32>,
    /// Dive below the surface while in deep water
    pub dive: bool,
}

impl Default for MoveState {
    fn default() -> Self {
        Self {
            mode: MoveMode::Stand,
            walk_mode: WalkMode::Run,
            direction: [0.0; 3],
            vertical_speed: 0.0,
            fall_start_y: 0.0,
            climb_target: None,
            dive: false,
        }
    }
}

impl MoveState {
    /// Request horizontal movement towards `direction`
    pub fn set_direction(&mut self, direction: [f32; 3]) {
        let len = (direction[0] * direction[0] + direction[2] * direction[2]).sqrt();
        self.direction = if len > 1e-5 {
            [direction[0] / len, 0.0, direction[2] / len]
        } else {
            [0.0; 3]
        };
    }

    /// Stop horizontal movement
    pub fn stop(&mut self) {
        self.direction = [0.0; 3];
    }

    /// Start a jump; ignored unless standing on ground
    pub fn jump(&mut self, speed: f32, y: f32) -> bool {
        if !matches!(self.mode, MoveMode::Stand | MoveMode::Move) {
            return false;
        }
        self.mode = MoveMode::Jump;
        self.vertical_speed = speed;
        self.fall_start_y = y;
        true
    }

    /// Start climbing up to `ledge_y`
    pub fn climb(&mut self, ledge_y: f32) -> bool {
        if !matches!(self.mode, MoveMode::Stand | MoveMode::Move) {
            return false;
        }
        self.mode = MoveMode::Climb;
        self.climb_target = Some(ledge_y);
        self.vertical_speed = 0.0;
        true
    }

    /// Airborne after a jump or a fall
    pub fn is_in_air(&self) -> bool {
        matches!(self.mode, MoveMode::Jump | MoveMode::Fall)
    }
}

/// Capability an entity needs to be moved by the resolver
pub trait Movable {
    /// Feet position
    fn position(&self) -> [f32; 3];
    /// Store the resolved feet position
    fn set_position(&mut self, pos: [f32; 3]);
    /// Collision body, if the entity has one
    fn body(&self) -> Option<&PhysicalBody>;
    /// Movement state
    fn move_state(&self) -> &MoveState;
    /// Mutable movement state
    fn move_state_mut(&mut self) -> &mut MoveState;
    /// Whether the entity may move on its own (dead actors may not)
    fn can_move(&self) -> bool {
        true
    }
}

/// What happened during one movement tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveReport {
    pub mode: MoveMode,
    pub outcome: Option<MoveOutcome>,
    /// Height fallen, when the actor landed this tick
    pub landed: Option<f32>,
}

/// Per-tick movement of actors
pub struct MovementResolver;

impl MovementResolver {
    /// Resolve one tick of movement for `actor`
    pub fn tick<M: Movable + ?Sized>(
        actor: &mut M,
        physics: &mut CollisionWorld,
        config: &AiConfig,
        dt_ms: u64,
    ) -> MoveReport {
        let dt = dt_ms as f32 / 1000.0;
        let mut report = MoveReport {
            mode: actor.move_state().mode,
            outcome: None,
            landed: None,
        };
        if actor.body().is_none() || dt <= 0.0 {
            return report;
        }

        let pos = actor.position();
        let mut state = actor.move_state().clone();
        let direction = if actor.can_move() { state.direction } else { [0.0; 3] };
        let speed = match state.walk_mode {
            WalkMode::Walk => config.walk_speed,
            WalkMode::Run => config.run_speed,
            WalkMode::Sneak => config.sneak_speed,
        };

        let depth = physics.water_depth(pos[0], pos[1], pos[2]);
        let swimming = matches!(state.mode, MoveMode::Swim | MoveMode::Dive);
        let swim_threshold = if swimming { config.swim_depth * 0.9 } else { config.swim_depth };

        let (dp, next_mode) = match depth {
            Some(depth) if depth >= swim_threshold => {
                let step = config.swim_speed * dt;
                // Divers sink to dive depth and hold there; swimmers float at swim depth
                let (dy, mode) = if state.dive {
                    (-(config.dive_depth - depth).clamp(0.0, step), MoveMode::Dive)
                } else {
                    (depth - config.swim_depth, MoveMode::Swim)
                };
                state.vertical_speed = 0.0;
                state.climb_target = None;
                ([direction[0] * step, dy, direction[2] * step], Some(mode))
            }
            _ if state.mode == MoveMode::Climb => {
                let target = state.climb_target.unwrap_or(pos[1]);
                let dy = (target - pos[1]).min(config.climb_speed * dt).max(0.0);
                ([0.0, dy, 0.0], None)
            }
            _ => {
                state.vertical_speed = (state.vertical_speed - config.gravity * dt).max(-config.max_fall_speed);
                let step = speed * dt;
                (
                    [direction[0] * step, state.vertical_speed * dt, direction[2] * step],
                    None,
                )
            }
        };

        let Some((result, ground)) = actor.body().map(|body| physics.try_move_n(body, dp, dt)) else {
            return report;
        };
        report.outcome = Some(result.outcome);

        state.mode = match next_mode {
            Some(mode) => mode,
            None if state.mode == MoveMode::Climb => {
                let reached = state
                    .climb_target
                    .map(|t| result.position[1] >= t - 1e-3)
                    .unwrap_or(true);
                if reached || result.outcome == MoveOutcome::Blocked {
                    state.climb_target = None;
                    MoveMode::Stand
                } else {
                    MoveMode::Climb
                }
            }
            None if result.grounded && state.vertical_speed <= 0.0 => {
                if state.is_in_air() {
                    report.landed = Some((state.fall_start_y - result.position[1]).max(0.0));
                }
                state.vertical_speed = 0.0;
                if result.sliding || !physics.is_walkable(ground) {
                    MoveMode::Slide
                } else if direction != [0.0; 3] {
                    MoveMode::Move
                } else {
                    MoveMode::Stand
                }
            }
            None => {
                if !state.is_in_air() {
                    state.fall_start_y = pos[1];
                }
                if state.vertical_speed > 0.0 {
                    MoveMode::Jump
                } else {
                    MoveMode::Fall
                }
            }
        };

        report.mode = state.mode;
        *actor.move_state_mut() = state;
        actor.set_position(result.position);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_physics::{LandscapeMesh, PhysicsConfig, SurfaceMaterial};

    struct Crate {
        pos: [f32; 3],
        body: PhysicalBody,
        state: MoveState,
    }

    impl Movable for Crate {
        fn position(&self) -> [f32; 3] {
            self.pos
        }
        fn set_position(&mut self, pos: [f32; 3]) {
            self.pos = pos;
        }
        fn body(&self) -> Option<&PhysicalBody> {
            Some(&self.body)
        }
        fn move_state(&self) -> &MoveState {
            &self.state
        }
        fn move_state_mut(&mut self) -> &mut MoveState {
            &mut self.state
        }
    }

    fn ground() -> CollisionWorld {
        let mesh = LandscapeMesh::empty().with_quad([-30.0, -30.0], [30.0, 30.0], 0.0, SurfaceMaterial::Earth);
        CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap()
    }

    fn spawn(world: &mut CollisionWorld, pos: [f32; 3]) -> Crate {
        Crate {
            pos,
            body: world.create_actor(1.8, 0.4, pos, None),
            state: MoveState::default(),
        }
    }

    #[test]
    fn test_falls_then_lands() {
        let mut world = ground();
        let mut actor = spawn(&mut world, [0.0, 3.0, 0.0]);
        let config = AiConfig::default();

        let first = MovementResolver::tick(&mut actor, &mut world, &config, 50);
        assert_eq!(first.mode, MoveMode::Fall);

        let mut landed = None;
        for _ in 0..200 {
            let report = MovementResolver::tick(&mut actor, &mut world, &config, 50);
            if report.landed.is_some() {
                landed = report.landed;
                break;
            }
        }
        let height = landed.expect("actor never landed");
        assert!(height > 2.5 && height < 3.5);
        assert!(actor.pos[1] < 0.2);
    }

    #[test]
    fn test_walks_forward() {
        let mut world = ground();
        let mut actor = spawn(&mut world, [0.0, 0.0, 0.0]);
        let config = AiConfig::default();
        actor.state.set_direction([0.0, 0.0, 2.0]);
        actor.state.walk_mode = WalkMode::Walk;

        for _ in 0..10 {
            MovementResolver::tick(&mut actor, &mut world, &config, 100);
        }
        assert_eq!(actor.state.mode, MoveMode::Move);
        assert!((actor.pos[2] - config.walk_speed).abs() < 0.2);
    }

    #[test]
    fn test_swims_in_deep_water() {
        let mesh = LandscapeMesh::empty()
            .with_quad([-30.0, -30.0], [30.0, 30.0], -5.0, SurfaceMaterial::Earth)
            .with_quad([-30.0, -30.0], [30.0, 30.0], 0.0, SurfaceMaterial::Water);
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap();
        let mut actor = spawn(&mut world, [0.0, -3.0, 0.0]);
        let config = AiConfig::default();

        let report = MovementResolver::tick(&mut actor, &mut world, &config, 50);
        assert_eq!(report.mode, MoveMode::Swim);
        assert!((actor.pos[1] + config.swim_depth).abs() < 0.1);
    }

    #[test]
    fn test_jump_needs_ground() {
        let mut state = MoveState::default();
        assert!(state.jump(4.0, 0.0));
        assert!(!state.jump(4.0, 0.0));
        assert!(state.is_in_air());
    }
}
