//! Physics query boundary
//!
//! The simulation only ever asks two things of physics: a ray cast against
//! static geometry, and the list of contacts that started this tick. The
//! built-in `Arena` answers both for a flat, box-bounded playfield.

pub mod arena;

use serde::{Deserialize, Serialize};

use crate::ecs::EntityRef;
use crate::game::assets::TerrainModifierRef;
use crate::game::world::World;
use crate::math::{Fp, Vec3};

pub use arena::{Arena, ContactSet, Surface};

pub const LAYER_DEFAULT: u32 = 1 << 0;
pub const LAYER_GROUND: u32 = 1 << 1;
pub const LAYER_DYNAMIC: u32 = 1 << 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub hit_triggers: bool,
}

impl QueryOptions {
    /// Everything except trigger volumes
    pub const SOLID: QueryOptions = QueryOptions {
        hit_triggers: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayHit {
    /// Distance from the ray origin along the (normalized) direction
    pub distance: Fp,
    pub point: Vec3,
    pub normal: Vec3,
    pub is_static: bool,
    /// Index of the static surface that was hit
    pub surface: u16,
    /// Terrain modifier asset carried by the surface
    pub modifier: Option<TerrainModifierRef>,
}

pub trait PhysicsQuery {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: Fp,
        layer_mask: u32,
        options: QueryOptions,
    ) -> Option<RayHit>;

    /// Integrate bodies by `dt` and return the contacts that began, in
    /// detection order. `contacts` carries overlaps between steps.
    fn step(&self, world: &mut World, contacts: &mut ContactSet, dt: Fp) -> Vec<ContactEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactKind {
    Collision,
    Trigger,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ContactTarget {
    Entity(EntityRef),
    /// Static surface index
    Static(u16),
}

/// A contact that began this tick. For triggers, `entity` is the trigger
/// holder. `ignore` is set by routing when the contact must have no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub entity: EntityRef,
    pub other: ContactTarget,
    pub ignore: bool,
}
