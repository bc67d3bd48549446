//! Handles into the scripting VM
//!
//! The simulation never interprets script code. It only stores opaque
//! symbol indices handed out by the VM and passes them back when a
//! behaviour callback should run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A script function (state callback, perception handler, trigger script)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptFn(pub u32);

impl fmt::Debug for ScriptFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptFn({})", self.0)
    }
}

/// A script instance symbol an actor is created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptSymbol(pub u32);

/// A script instance symbol for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemSymbol(pub u32);
