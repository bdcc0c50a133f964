//! Deterministic tank arena simulation
//!
//! Systems are free functions over a `Frame`; `simulation` wires them up in
//! a fixed order and `signals` routes in-tick events between them.

pub mod assets;
pub mod collision;
pub mod commands;
pub mod components;
pub mod control;
pub mod drive;
pub mod events;
pub mod explosion;
pub mod frame;
pub mod gameplay;
pub mod input;
pub mod player;
pub mod projectile;
pub mod signals;
pub mod simulation;
pub mod vehicle;
pub mod world;

pub use assets::{AssetDb, AssetError, PrototypeRef};
pub use commands::{Command, CommandError};
pub use components::PlayerRef;
pub use events::{Notification, SoundKind};
pub use frame::Frame;
pub use gameplay::{Gameplay, MatchState, PlayerData};
pub use input::{Buttons, Input};
pub use simulation::{Join, Simulation, TickInput};
