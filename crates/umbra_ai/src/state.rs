//! Scripted state machine and daily routines
//!
//! An actor runs at most one script state at a time, made of an init, a
//! loop and an end callback. States are started explicitly by scripts or by
//! the daily routine matching the current time of day. The machine never
//! calls scripts itself: it returns the [`StateCall`]s to make, in order,
//! and the actor performs them.

use serde::{Deserialize, Serialize};
use umbra_core::{GameTime, ScriptFn, TimeOfDay};

/// Special states visible to scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum NpcState {
    #[default]
    Invalid = 0,
    Answer = 1,
    Dead = 2,
    Unconscious = 3,
    FadeAway = 4,
    Follow = 5,
}

/// Callbacks making up one script state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFns {
    pub init: ScriptFn,
    pub looping: Option<ScriptFn>,
    pub end: Option<ScriptFn>,
}

impl StateFns {
    /// State with only an init callback
    pub fn new(init: ScriptFn) -> Self {
        Self {
            init,
            looping: None,
            end: None,
        }
    }

    /// Set the loop and end callbacks
    pub fn with_loop_end(mut self, looping: Option<ScriptFn>, end: Option<ScriptFn>) -> Self {
        self.looping = looping;
        self.end = end;
        self
    }
}

/// Script call requested by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCall {
    Init(ScriptFn),
    Loop(ScriptFn),
    End(ScriptFn),
}

/// One entry of a daily routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    /// Window start (inclusive)
    pub start: TimeOfDay,
    /// Window end (exclusive)
    pub end: TimeOfDay,
    /// State started for the window
    pub callback: ScriptFn,
    /// Waypoint the state takes place at
    pub waypoint: Option<String>,
}

impl Routine {
    /// Whether `tod` falls inside the window
    pub fn contains(&self, tod: TimeOfDay) -> bool {
        tod.in_window(self.start, self.end)
    }
}

/// The running state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub fns: StateFns,
    pub start_time: GameTime,
    pub end_time: Option<GameTime>,
    pub started: bool,
    pub waypoint: Option<String>,
    /// Started by the routine rather than explicitly
    pub from_routine: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StateRequest {
    fns: StateFns,
    waypoint: Option<String>,
    end_time: Option<GameTime>,
    no_finalize: bool,
    from_routine: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum PendingChange {
    Start {
        init: ScriptFn,
        waypoint: Option<String>,
        end_time: Option<GameTime>,
        no_finalize: bool,
    },
    Clear {
        no_finalize: bool,
    },
}

/// Script state of one actor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorStateMachine {
    current: Option<AiState>,
    previous: Option<ScriptFn>,
    routines: Vec<Routine>,
    active_routine: Option<usize>,
    pending: Option<PendingChange>,
}

impl ActorStateMachine {
    /// Idle machine without routines
    pub fn new() -> Self {
        Self::default()
    }

    /// Running state
    pub fn current(&self) -> Option<&AiState> {
        self.current.as_ref()
    }

    /// Whether the running state has `init` as its init callback
    pub fn is_state(&self, init: ScriptFn) -> bool {
        self.current.as_ref().map(|s| s.fns.init == init).unwrap_or(false)
    }

    /// Whether `looping` is the loop callback of the running state
    pub fn is_state_loop(&self, looping: ScriptFn) -> bool {
        self.current
            .as_ref()
            .map(|s| s.fns.looping == Some(looping))
            .unwrap_or(false)
    }

    /// Whether the previous state had `init` as its init callback
    pub fn was_in_state(&self, init: ScriptFn) -> bool {
        self.previous == Some(init)
    }

    /// Time spent in the running state
    pub fn state_time(&self, now: GameTime) -> u64 {
        self.current
            .as_ref()
            .map(|s| now - s.start_time)
            .unwrap_or(0)
    }

    /// Routine list
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Append a routine entry
    pub fn add_routine(&mut self, routine: Routine) {
        self.routines.push(routine);
    }

    /// Drop the routine list; the next entries form a new one
    pub fn clear_routines(&mut self) {
        self.routines.clear();
        self.active_routine = None;
    }

    /// Index of the routine covering `tod`
    pub fn routine_at(&self, tod: TimeOfDay) -> Option<usize> {
        self.routines.iter().position(|r| r.contains(tod))
    }

    /// Ask for a state to start on the next tick
    pub fn request(&mut self, init: ScriptFn, waypoint: Option<String>, end_time: Option<GameTime>, no_finalize: bool) {
        self.pending = Some(PendingChange::Start {
            init,
            waypoint,
            end_time,
            no_finalize,
        });
    }

    /// Ask for the running state to stop on the next tick
    pub fn request_clear(&mut self, no_finalize: bool) {
        self.pending = Some(PendingChange::Clear { no_finalize });
    }

    /// Whether a start or clear request is pending
    pub fn has_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a state right away, ending the running one first
    pub fn start(
        &mut self,
        fns: StateFns,
        waypoint: Option<String>,
        end_time: Option<GameTime>,
        no_finalize: bool,
        now: GameTime,
    ) -> Vec<StateCall> {
        self.start_request(
            StateRequest {
                fns,
                waypoint,
                end_time,
                no_finalize,
                from_routine: false,
            },
            now,
        )
    }

    /// Stop the running state
    ///
    /// The end callback runs unless `no_finalize` is set or the state never
    /// started. Pending requests are dropped.
    pub fn clear_state(&mut self, no_finalize: bool) -> Option<StateCall> {
        self.pending = None;
        let state = self.current.take()?;
        self.previous = Some(state.fns.init);
        if state.started && !no_finalize {
            state.fns.end.map(StateCall::End)
        } else {
            None
        }
    }

    /// Decide the script calls of this tick
    ///
    /// Pending requests go first. With `follow_routine` unset (dead or
    /// unconscious actors) routine windows are ignored.
    pub fn plan_tick<F>(&mut self, now: GameTime, follow_routine: bool, resolve: F) -> Vec<StateCall>
    where
        F: Fn(ScriptFn) -> StateFns,
    {
        match self.pending.take() {
            Some(PendingChange::Start {
                init,
                waypoint,
                end_time,
                no_finalize,
            }) => {
                let request = StateRequest {
                    fns: resolve(init),
                    waypoint,
                    end_time,
                    no_finalize,
                    from_routine: false,
                };
                return self.start_request(request, now);
            }
            Some(PendingChange::Clear { no_finalize }) => {
                return self.clear_state(no_finalize).into_iter().collect();
            }
            None => {}
        }

        let routine = if follow_routine {
            self.routine_at(now.time_of_day())
        } else {
            self.active_routine
        };
        if routine != self.active_routine {
            self.active_routine = routine;
            return match routine {
                Some(index) => self.start_routine(index, now, &resolve),
                None => {
                    let from_routine = self.current.as_ref().map(|s| s.from_routine).unwrap_or(false);
                    if from_routine {
                        self.clear_state(false).into_iter().collect()
                    } else {
                        Vec::new()
                    }
                }
            };
        }

        match &self.current {
            None if !follow_routine => Vec::new(),
            None => match routine {
                Some(index) => self.start_routine(index, now, &resolve),
                None => Vec::new(),
            },
            Some(state) if state.end_time.map(|end| now >= end).unwrap_or(false) => {
                self.clear_state(false).into_iter().collect()
            }
            Some(state) if state.started => state.fns.looping.map(StateCall::Loop).into_iter().collect(),
            Some(_) => Vec::new(),
        }
    }

    /// React to a loop callback's return value; positive ends the state
    pub fn on_loop_return(&mut self, ret: i32) -> Option<StateCall> {
        if ret > 0 {
            self.clear_state(false)
        } else {
            None
        }
    }

    fn start_routine<F>(&mut self, index: usize, now: GameTime, resolve: &F) -> Vec<StateCall>
    where
        F: Fn(ScriptFn) -> StateFns,
    {
        let routine = &self.routines[index];
        let request = StateRequest {
            fns: resolve(routine.callback),
            waypoint: routine.waypoint.clone(),
            end_time: None,
            no_finalize: false,
            from_routine: true,
        };
        self.start_request(request, now)
    }

    fn start_request(&mut self, request: StateRequest, now: GameTime) -> Vec<StateCall> {
        let mut calls = Vec::new();
        if let Some(end) = self.clear_state(request.no_finalize) {
            calls.push(end);
        }
        calls.push(StateCall::Init(request.fns.init));
        self.current = Some(AiState {
            fns: request.fns,
            start_time: now,
            end_time: request.end_time,
            started: true,
            waypoint: request.waypoint,
            from_routine: request.from_routine,
        });
        calls
    }
}
