//! Umbra Core - shared primitives of the simulation
//!
//! This crate holds the small vocabulary every other Umbra crate speaks:
//!
//! # Features
//!
//! - Generational actor ids and an ordered actor registry
//! - Game time (day / hour / minute) and time-of-day windows
//! - Script function handles crossing the scripting boundary
//!
//! # Example
//!
//! ```ignore
//! use umbra_core::prelude::*;
//!
//! let mut actors: ActorRegistry<&str> = ActorRegistry::new();
//! let bandit = actors.insert("bandit")?;
//! assert_eq!(actors.get(bandit), Some(&"bandit"));
//!
//! let noon = GameTime::from_day_time(0, 12, 0);
//! assert!(noon.time_of_day().in_window(TimeOfDay::new(8, 0), TimeOfDay::new(20, 0)));
//! ```

pub mod error;
pub mod id;
pub mod script;
pub mod time;

pub mod prelude {
    //! Common imports
    pub use crate::error::{CoreError, Result};
    pub use crate::id::{ActorId, ActorRegistry};
    pub use crate::script::{ItemSymbol, ScriptFn, ScriptSymbol};
    pub use crate::time::{GameTime, TimeOfDay};
}

pub use prelude::*;
