//! Component store: one typed storage per component kind

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ecs::{Entities, EntityRef, Storage};

use super::assets::{AssetDb, PrototypeRef};
use super::components::{
    Collider, Explosion, FireCoolDown, PhysicsBody, PlayerLink, PlayerRef, PlayerVehicle,
    Projectile, Transform, Turret, TurretUpdater, VehicleState,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    entities: Entities,
    pub transforms: Storage<Transform>,
    pub bodies: Storage<PhysicsBody>,
    pub colliders: Storage<Collider>,
    pub vehicles: Storage<VehicleState>,
    pub player_vehicles: Storage<PlayerVehicle>,
    pub player_links: Storage<PlayerLink>,
    pub turret_updaters: Storage<TurretUpdater>,
    pub turrets: Storage<Turret>,
    pub fire_cooldowns: Storage<FireCoolDown>,
    pub projectiles: Storage<Projectile>,
    pub explosions: Storage<Explosion>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> EntityRef {
        self.entities.create()
    }

    pub fn exists(&self, entity: EntityRef) -> bool {
        self.entities.exists(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.entities.iter()
    }

    /// Destroy the entity and every component attached to it. Stale or dead
    /// references are ignored.
    pub fn destroy(&mut self, entity: EntityRef) -> bool {
        if !self.entities.destroy(entity) {
            trace!(%entity, "Ignoring destroy of stale entity");
            return false;
        }
        self.transforms.remove(entity);
        self.bodies.remove(entity);
        self.colliders.remove(entity);
        self.vehicles.remove(entity);
        self.player_vehicles.remove(entity);
        self.player_links.remove(entity);
        self.turret_updaters.remove(entity);
        self.turrets.remove(entity);
        self.fire_cooldowns.remove(entity);
        self.projectiles.remove(entity);
        self.explosions.remove(entity);
        true
    }

    /// Instantiate a prototype. `None` if the prototype does not exist.
    pub fn spawn(&mut self, assets: &AssetDb, prototype: PrototypeRef) -> Option<EntityRef> {
        let proto = assets.prototype(prototype)?;
        let entity = self.create();

        if let Some(transform) = proto.transform {
            self.transforms.insert(entity, transform);
        }
        if let Some(body) = proto.body {
            self.bodies.insert(entity, body);
        }
        if let Some(collider) = proto.collider {
            self.colliders.insert(entity, collider);
        }
        if let Some(vehicle) = proto.vehicle {
            let axles = assets.vehicle(vehicle).map_or(0, |config| config.axes.len());
            self.vehicles.insert(entity, VehicleState::new(vehicle, axles));
        }
        if let Some(player_vehicle) = proto.player_vehicle {
            self.player_vehicles.insert(entity, player_vehicle);
        }
        if let Some(updater) = proto.turret_updater {
            self.turret_updaters.insert(entity, updater);
        }
        if let Some(turret) = proto.turret {
            self.turrets.insert(entity, turret);
        }
        if let Some(cooldown) = proto.fire_cooldown {
            self.fire_cooldowns.insert(entity, cooldown);
        }
        if let Some(projectile) = proto.projectile {
            self.projectiles.insert(entity, projectile);
        }
        if let Some(explosion) = proto.explosion {
            self.explosions.insert(entity, explosion);
        }

        trace!(%entity, prototype = %proto.name, "Spawned entity");
        Some(entity)
    }

    /// The live avatar linked to `player`, if any.
    pub fn player_entity(&self, player: PlayerRef) -> Option<EntityRef> {
        self.player_links
            .iter()
            .find(|(_, link)| link.player == player)
            .map(|(entity, _)| entity)
    }
}
