//! Scripted VM and level fixtures shared by the world tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use umbra_ai::{ActorTemplate, InstanceKind, ScriptCall, ScriptError, ScriptHost, ScriptOutcome, StateFns};
use umbra_core::{ScriptFn, ScriptSymbol};
use umbra_physics::{LandscapeMesh, SurfaceMaterial};
use umbra_world::{SimConfig, World};

#[derive(Default)]
struct VmState {
    outcomes: HashMap<ScriptFn, ScriptOutcome>,
    failing: Vec<ScriptFn>,
    calls: Vec<ScriptCall>,
    symbols: HashMap<String, (ScriptSymbol, InstanceKind)>,
    npcs: HashMap<ScriptSymbol, ActorTemplate>,
}

/// Script host answering from a table; clones share the table and call log
#[derive(Clone, Default)]
pub struct TestVm {
    state: Arc<Mutex<VmState>>,
}

impl TestVm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome returned by every call of `func`
    pub fn on(&self, func: u32, outcome: ScriptOutcome) -> &Self {
        self.state.lock().outcomes.insert(ScriptFn(func), outcome);
        self
    }

    /// Make `func` raise an error
    pub fn failing(&self, func: u32) -> &Self {
        self.state.lock().failing.push(ScriptFn(func));
        self
    }

    pub fn item(&self, name: &str, symbol: u32) -> &Self {
        self.state
            .lock()
            .symbols
            .insert(name.to_ascii_uppercase(), (ScriptSymbol(symbol), InstanceKind::Item));
        self
    }

    pub fn npc(&self, name: &str, template: ActorTemplate) -> &Self {
        let mut state = self.state.lock();
        state
            .symbols
            .insert(name.to_ascii_uppercase(), (template.instance, InstanceKind::Npc));
        state.npcs.insert(template.instance, template);
        drop(state);
        self
    }

    /// Every call so far
    pub fn calls(&self) -> Vec<ScriptCall> {
        self.state.lock().calls.clone()
    }

    /// Functions called so far, in order
    pub fn called(&self) -> Vec<u32> {
        self.state.lock().calls.iter().map(|c| c.func.0).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl ScriptHost for TestVm {
    fn call(&mut self, call: &ScriptCall) -> Result<ScriptOutcome, ScriptError> {
        let mut state = self.state.lock();
        state.calls.push(*call);
        if state.failing.contains(&call.func) {
            return Err(ScriptError::Failed {
                func: call.func,
                reason: "test failure".into(),
            });
        }
        Ok(state.outcomes.get(&call.func).cloned().unwrap_or_default())
    }

    // Loop and end callbacks follow the init callback
    fn state_functions(&self, init: ScriptFn) -> StateFns {
        StateFns::new(init).with_loop_end(Some(ScriptFn(init.0 + 1)), Some(ScriptFn(init.0 + 2)))
    }

    fn symbol_index(&self, name: &str) -> Option<ScriptSymbol> {
        self.state.lock().symbols.get(&name.to_ascii_uppercase()).map(|s| s.0)
    }

    fn instance_kind(&self, symbol: ScriptSymbol) -> Option<InstanceKind> {
        self.state
            .lock()
            .symbols
            .values()
            .find(|(s, _)| *s == symbol)
            .map(|(_, kind)| *kind)
    }

    fn create_npc(&mut self, symbol: ScriptSymbol) -> Result<ActorTemplate, ScriptError> {
        self.state
            .lock()
            .npcs
            .get(&symbol)
            .cloned()
            .ok_or(ScriptError::NotInstantiable(symbol))
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Flat ground at y = 0
pub fn flat_ground() -> LandscapeMesh {
    LandscapeMesh::empty().with_quad([-200.0, -200.0], [200.0, 200.0], 0.0, SurfaceMaterial::Earth)
}

pub fn world_with(config: SimConfig, vm: &TestVm) -> World {
    init_logging();
    World::new(config, &flat_ground(), Box::new(vm.clone())).unwrap()
}
