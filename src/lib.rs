//! Tank Arena Simulation - deterministic multiplayer tank combat core
//!
//! The library holds the lockstep simulation:
//! - fixed-point math and a generational entity/component store
//! - the vehicle model, combat systems and match controller
//! - a flat arena physics collaborator behind the `PhysicsQuery` boundary
//! - a tokio host loop and replay logs around it

pub mod config;
pub mod ecs;
pub mod game;
pub mod host;
pub mod math;
pub mod physics;
pub mod replay;
pub mod util;
