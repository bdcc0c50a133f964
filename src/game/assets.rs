//! Static configuration assets
//!
//! Loaded once before the first tick and shared read-only (behind an `Arc`)
//! by every participant. Nothing in here changes while the simulation runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::math::{Curve, Fp, Vec3};
use crate::physics::{Arena, LAYER_GROUND};

use super::components::{
    Collider, Explosion, FireCoolDown, PhysicsBody, PlayerVehicle, Projectile, Transform, Turret,
    TurretUpdater,
};
use super::vehicle::{AxisConfig, EngineSettings, GripSettings, VehicleConfig, WheelConfig};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PrototypeRef(pub u16);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VehicleRef(pub u16);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TerrainModifierRef(pub u16);

/// Grip/drag multipliers for a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainModifier {
    pub grip_factor: Fp,
    pub drag_factor: Fp,
}

impl Default for TerrainModifier {
    fn default() -> Self {
        Self {
            grip_factor: Fp::ONE,
            drag_factor: Fp::ONE,
        }
    }
}

/// Initial components for a spawned entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPrototype {
    pub name: String,
    pub transform: Option<Transform>,
    pub body: Option<PhysicsBody>,
    pub collider: Option<Collider>,
    pub vehicle: Option<VehicleRef>,
    pub player_vehicle: Option<PlayerVehicle>,
    pub turret_updater: Option<TurretUpdater>,
    pub turret: Option<Turret>,
    pub fire_cooldown: Option<FireCoolDown>,
    pub projectile: Option<Projectile>,
    pub explosion: Option<Explosion>,
}

/// Match-wide tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Seconds per match
    pub match_duration: Fp,
    /// Seconds between death and timed respawn
    pub respawn_delay: Fp,
    /// Seconds after expiry before the next match starts
    pub restart_grace: Fp,
    /// Tanks at or below this height are killed
    pub out_of_bounds_depth: Fp,
    /// Seconds between shots
    pub fire_cooldown: Fp,
    /// Fixed per-tick turret slerp weight
    pub turret_smoothing: Fp,
    /// Spawn x/z are drawn from `-spawn_extent..=spawn_extent`
    pub spawn_extent: i32,
    pub spawn_height: Fp,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            match_duration: Fp::from_int(180),
            respawn_delay: Fp::from_int(3),
            restart_grace: Fp::from_int(3),
            out_of_bounds_depth: Fp::from_int(-50),
            fire_cooldown: Fp::ONE,
            turret_smoothing: Fp::from_ratio(1, 10),
            spawn_extent: 50,
            spawn_height: Fp::from_int(10),
        }
    }
}

/// All static assets, addressed by index refs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDb {
    pub prototypes: Vec<EntityPrototype>,
    pub vehicles: Vec<VehicleConfig>,
    #[serde(default)]
    pub terrain_modifiers: Vec<TerrainModifier>,
    #[serde(default)]
    pub gameplay: GameplaySettings,
    /// Static level geometry
    #[serde(default)]
    pub arena: Arena,
    pub default_avatar: PrototypeRef,
}

/// Asset loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to read asset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid asset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prototype '{owner}' references missing prototype {target}")]
    MissingPrototype { owner: String, target: u16 },

    #[error("Prototype '{owner}' references missing vehicle config {target}")]
    MissingVehicle { owner: String, target: u16 },

    #[error("Terrain modifier {0} does not exist")]
    MissingTerrainModifier(u16),

    #[error("Vehicle config '{0}' has no axles")]
    NoAxles(String),

    #[error("Avatar prototype '{0}' lacks a required component: {1}")]
    IncompleteAvatar(String, &'static str),

    #[error("Gameplay setting {0} out of range: {1}")]
    InvalidSetting(&'static str, String),
}

impl AssetDb {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        let db: AssetDb = serde_json::from_str(json)?;
        db.validate()?;
        Ok(db)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let db = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            prototypes = db.prototypes.len(),
            vehicles = db.vehicles.len(),
            "Loaded static assets"
        );
        Ok(db)
    }

    pub fn prototype(&self, r: PrototypeRef) -> Option<&EntityPrototype> {
        self.prototypes.get(r.0 as usize)
    }

    pub fn vehicle(&self, r: VehicleRef) -> Option<&VehicleConfig> {
        self.vehicles.get(r.0 as usize)
    }

    pub fn terrain_modifier(&self, r: TerrainModifierRef) -> Option<&TerrainModifier> {
        self.terrain_modifiers.get(r.0 as usize)
    }

    /// Check that every reference resolves.
    pub fn validate(&self) -> Result<(), AssetError> {
        let proto_exists = |owner: &EntityPrototype, r: PrototypeRef| {
            if self.prototype(r).is_some() {
                Ok(())
            } else {
                Err(AssetError::MissingPrototype {
                    owner: owner.name.clone(),
                    target: r.0,
                })
            }
        };

        for proto in &self.prototypes {
            if let Some(v) = proto.vehicle {
                if self.vehicle(v).is_none() {
                    return Err(AssetError::MissingVehicle {
                        owner: proto.name.clone(),
                        target: v.0,
                    });
                }
            }
            if let Some(updater) = &proto.turret_updater {
                proto_exists(proto, updater.turret_prototype)?;
            }
            if let Some(turret) = &proto.turret {
                proto_exists(proto, turret.barrel_prototype)?;
            }
            if let Some(cooldown) = &proto.fire_cooldown {
                proto_exists(proto, cooldown.projectile_prototype)?;
            }
            if let Some(projectile) = &proto.projectile {
                proto_exists(proto, projectile.explosion_prototype)?;
            }
        }

        for vehicle in &self.vehicles {
            if vehicle.axes.is_empty() {
                return Err(AssetError::NoAxles(vehicle.name.clone()));
            }
        }

        let extent = self.gameplay.spawn_extent;
        if extent < 0 {
            return Err(AssetError::InvalidSetting("spawn_extent", extent.to_string()));
        }

        for modifier in self.arena.surfaces.iter().filter_map(|s| s.modifier) {
            if self.terrain_modifier(modifier).is_none() {
                return Err(AssetError::MissingTerrainModifier(modifier.0));
            }
        }

        let avatar = self
            .prototype(self.default_avatar)
            .ok_or(AssetError::MissingPrototype {
                owner: "default_avatar".to_string(),
                target: self.default_avatar.0,
            })?;
        self.validate_avatar(avatar)
    }

    fn validate_avatar(&self, avatar: &EntityPrototype) -> Result<(), AssetError> {
        let missing = |component| Err(AssetError::IncompleteAvatar(avatar.name.clone(), component));
        if avatar.transform.is_none() {
            return missing("transform");
        }
        if avatar.player_vehicle.is_none() {
            return missing("player_vehicle");
        }
        if avatar.turret_updater.is_none() {
            return missing("turret_updater");
        }
        if avatar.turret.is_none() {
            return missing("turret");
        }
        Ok(())
    }

    /// The stock tank arena.
    pub fn builtin() -> Self {
        const TANK: PrototypeRef = PrototypeRef(0);
        const TURRET: PrototypeRef = PrototypeRef(1);
        const BARREL: PrototypeRef = PrototypeRef(2);
        const SHELL: PrototypeRef = PrototypeRef(3);
        const EXPLOSION: PrototypeRef = PrototypeRef(4);

        let tank = EntityPrototype {
            name: "tank".to_string(),
            transform: Some(Transform::default()),
            body: Some(PhysicsBody::default()),
            collider: Some(Collider {
                radius: Fp::ONE,
                ..Default::default()
            }),
            vehicle: Some(VehicleRef(0)),
            player_vehicle: Some(PlayerVehicle::default()),
            turret_updater: Some(TurretUpdater {
                turret_prototype: TURRET,
                ..Default::default()
            }),
            turret: Some(Turret {
                barrel_prototype: BARREL,
                ..Default::default()
            }),
            fire_cooldown: Some(FireCoolDown {
                remaining: Fp::ZERO,
                projectile_prototype: SHELL,
            }),
            ..Default::default()
        };

        let turret = EntityPrototype {
            name: "turret".to_string(),
            transform: Some(Transform::default()),
            turret: Some(Turret {
                barrel_prototype: BARREL,
                ..Default::default()
            }),
            ..Default::default()
        };

        let barrel = EntityPrototype {
            name: "barrel".to_string(),
            transform: Some(Transform::default()),
            ..Default::default()
        };

        let shell = EntityPrototype {
            name: "shell".to_string(),
            transform: Some(Transform::default()),
            body: Some(PhysicsBody {
                angular_drag: Fp::ZERO,
                ..Default::default()
            }),
            collider: Some(Collider {
                radius: Fp::from_ratio(1, 5),
                ..Default::default()
            }),
            projectile: Some(Projectile {
                explosion_prototype: EXPLOSION,
                ..Default::default()
            }),
            ..Default::default()
        };

        let explosion = EntityPrototype {
            name: "explosion".to_string(),
            transform: Some(Transform::default()),
            collider: Some(Collider {
                is_trigger: true,
                ..Default::default()
            }),
            explosion: Some(Explosion::default()),
            ..Default::default()
        };

        Self {
            prototypes: vec![tank, turret, barrel, shell, explosion],
            vehicles: vec![builtin_tank_config()],
            terrain_modifiers: vec![TerrainModifier {
                grip_factor: Fp::HALF,
                drag_factor: Fp::TWO,
            }],
            gameplay: GameplaySettings::default(),
            arena: Arena::builtin(),
            default_avatar: TANK,
        }
    }
}

fn builtin_tank_config() -> VehicleConfig {
    let axle = |turn: bool, offset: Fp| AxisConfig {
        turn,
        traction: true,
        offset,
        width: Fp::from_ratio(3, 2),
        ..Default::default()
    };

    VehicleConfig {
        name: "tank".to_string(),
        wheel: WheelConfig {
            collision_mask: LAYER_GROUND,
            grip: GripSettings {
                grip: Curve::from_points(&[
                    (Fp::ZERO, Fp::ZERO),
                    (Fp::from_ratio(1, 4), Fp::ONE),
                    (Fp::ONE, Fp::from_ratio(3, 4)),
                ]),
                ..Default::default()
            },
            ..Default::default()
        },
        axes: vec![axle(true, Fp::ONE), axle(false, -Fp::ONE)],
        steer_curve: Curve::from_points(&[
            (Fp::ZERO, Fp::HALF),
            (Fp::from_ratio(1, 2), Fp::ONE),
            (Fp::ONE, Fp::from_ratio(3, 5)),
        ]),
        engine: EngineSettings {
            torque_curve: Curve::from_points(&[
                (Fp::ZERO, Fp::from_ratio(1, 2)),
                (Fp::from_ratio(2, 3), Fp::ONE),
                (Fp::ONE, Fp::from_ratio(7, 10)),
            ]),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let db = AssetDb::builtin();
        db.validate().unwrap();
        assert_eq!(db.vehicle(VehicleRef(0)).unwrap().axes.len(), 2);
    }

    #[test]
    fn test_json_roundtrip_keeps_references() {
        let json = serde_json::to_string(&AssetDb::builtin()).unwrap();
        let db = AssetDb::from_json(&json).unwrap();
        let avatar = db.prototype(db.default_avatar).unwrap();
        assert_eq!(avatar.name, "tank");
        assert_eq!(avatar.turret_updater.unwrap().turret_prototype, PrototypeRef(1));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut db = AssetDb::builtin();
        db.prototypes[3].projectile.as_mut().unwrap().explosion_prototype = PrototypeRef(42);
        assert!(matches!(
            db.validate(),
            Err(AssetError::MissingPrototype { target: 42, .. })
        ));
    }

    #[test]
    fn test_vehicle_without_axles_rejected() {
        let mut db = AssetDb::builtin();
        db.vehicles[0].axes.clear();
        assert!(matches!(db.validate(), Err(AssetError::NoAxles(_))));
    }

    #[test]
    fn test_surface_modifier_must_exist() {
        let mut db = AssetDb::builtin();
        db.terrain_modifiers.clear();
        assert!(matches!(
            db.validate(),
            Err(AssetError::MissingTerrainModifier(0))
        ));
    }

    #[test]
    fn test_negative_spawn_extent_rejected() {
        let mut db = AssetDb::builtin();
        db.gameplay.spawn_extent = 0;
        db.validate().unwrap();

        db.gameplay.spawn_extent = -1;
        let json = serde_json::to_string(&db).unwrap();
        assert!(matches!(
            AssetDb::from_json(&json),
            Err(AssetError::InvalidSetting("spawn_extent", _))
        ));
    }
}
