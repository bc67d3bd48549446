//! Umbra Triggers - named trigger volumes and event propagation
//!
//! Trigger volumes are named world objects. Level designers wire them
//! together by name: a pressure plate forwards to a list, the list opens a
//! door and enables a script trigger a few seconds later.
//!
//! # Features
//!
//! - Reaction flags with the level data bit layout
//! - Closed set of trigger kinds behind one behaviour table
//! - Touch membership through ghost bodies in the collision world
//! - Time barriers for delayed events
//! - Name resolution at dispatch time; unknown targets are ignored
//! - Serializable dispatcher state including pending events
//!
//! # Example
//!
//! ```ignore
//! use umbra_triggers::prelude::*;
//!
//! let plate = TriggerVolume::new("plate", TriggerKind::Trigger(TriggerSettings::to("door")))
//!     .with_flags(ReactFlags::REACT_TO_ON_TOUCH | ReactFlags::RESPOND_TO_PC | ReactFlags::START_ENABLED)
//!     .with_bounds([-1.0, 0.0, -1.0], [1.0, 0.2, 1.0]);
//!
//! let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
//! dispatcher.add(plate, &mut physics);
//! dispatcher.tick(&physics, |_| Some(InstigatorKind::Player));
//! let effects = dispatcher.flush(now_ms);
//! ```

pub mod dispatcher;
pub mod events;
pub mod filter;
pub mod trigger;
pub mod volume;

pub mod prelude {
    //! Common imports for trigger functionality
    pub use crate::dispatcher::{TriggerConfig, TriggerDispatcher};
    pub use crate::events::{TriggerEffect, TriggerEvent, TriggerEventType};
    pub use crate::filter::{InstigatorKind, ReactFlags};
    pub use crate::trigger::{
        ListMode, ListTarget, MessageAction, MessageFilter, Mover, TriggerKind, TriggerList,
        TriggerSettings, WorldStart,
    };
    pub use crate::volume::TriggerVolume;
}

pub use prelude::*;
