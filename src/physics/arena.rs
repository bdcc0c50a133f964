//! Flat arena: horizontal static surfaces plus a sphere-collider integrator

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ecs::EntityRef;
use crate::game::assets::TerrainModifierRef;
use crate::game::world::World;
use crate::math::{Fp, Quat, Vec3};

use super::{
    ContactEvent, ContactKind, ContactTarget, PhysicsQuery, QueryOptions, RayHit, LAYER_GROUND,
};

/// Overlaps alive at the end of the previous step. Lives in the frame so a
/// rollback restores it along with everything else.
pub type ContactSet = BTreeSet<(EntityRef, ContactTarget)>;

/// Upward-facing rectangle at a fixed height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    pub min_x: Fp,
    pub max_x: Fp,
    pub min_z: Fp,
    pub max_z: Fp,
    pub height: Fp,
    #[serde(default = "default_surface_layer")]
    pub layer: u32,
    #[serde(default)]
    pub is_trigger: bool,
    #[serde(default)]
    pub modifier: Option<TerrainModifierRef>,
}

fn default_surface_layer() -> u32 {
    LAYER_GROUND
}

impl Surface {
    pub fn contains(&self, x: Fp, z: Fp) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub surfaces: Vec<Surface>,
    pub gravity: Vec3,
}

impl Default for Arena {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Slack when deciding whether a sphere rests on a surface
const CONTACT_SLOP: Fp = Fp::from_ratio(1, 100);

impl Arena {
    /// A 200 x 200 floor at height zero with a mud patch in front of the
    /// origin. Earlier surfaces win ties, so the patch is listed first.
    pub fn builtin() -> Self {
        let mud = Surface {
            min_x: Fp::from_int(-10),
            max_x: Fp::from_int(10),
            min_z: Fp::from_int(20),
            max_z: Fp::from_int(40),
            height: Fp::ZERO,
            layer: LAYER_GROUND,
            is_trigger: false,
            modifier: Some(TerrainModifierRef(0)),
        };
        let floor = Surface {
            min_x: Fp::from_int(-100),
            max_x: Fp::from_int(100),
            min_z: Fp::from_int(-100),
            max_z: Fp::from_int(100),
            height: Fp::ZERO,
            layer: LAYER_GROUND,
            is_trigger: false,
            modifier: None,
        };
        Self {
            surfaces: vec![mud, floor],
            gravity: Vec3::new(Fp::ZERO, Fp::from_ratio(-981, 100), Fp::ZERO),
        }
    }

    fn integrate(&self, world: &mut World, dt: Fp) {
        for entity in world.bodies.entities() {
            let (Some(transform), Some(body)) =
                (world.transforms.get_mut(entity), world.bodies.get_mut(entity))
            else {
                continue;
            };
            if body.mass <= Fp::ZERO {
                body.clear_accumulators();
                continue;
            }

            let acceleration = body.force * (Fp::ONE / body.mass) + self.gravity * body.gravity_scale;
            body.velocity += acceleration * dt;
            body.velocity = body.velocity * (Fp::ONE - body.drag * dt).clamp01();

            // torque is world space, inertia is diagonal in body space
            let local_torque = transform.rotation.conjugate().rotate(body.torque);
            let local_acc = local_torque.div_components(body.inertia_tensor);
            body.angular_velocity += transform.rotation.rotate(local_acc) * dt;
            body.angular_velocity =
                body.angular_velocity * (Fp::ONE - body.angular_drag * dt).clamp01();

            transform.position += body.velocity * dt;
            let spin = body.angular_velocity.magnitude();
            if !spin.is_zero() {
                let turn = Quat::angle_axis((spin * dt).to_degrees(), body.angular_velocity);
                transform.set_rotation(turn * transform.rotation);
            }

            body.clear_accumulators();
        }
    }

    /// Highest solid surface under (x, z) whose top is not above `ceiling`.
    fn support(&self, x: Fp, z: Fp, ceiling: Fp) -> Option<&Surface> {
        let mut best: Option<&Surface> = None;
        for surface in &self.surfaces {
            if surface.is_trigger || !surface.contains(x, z) || surface.height > ceiling {
                continue;
            }
            if best.map_or(true, |b| surface.height > b.height) {
                best = Some(surface);
            }
        }
        best
    }

    fn rest_on_surfaces(&self, world: &mut World) {
        for (entity, collider) in world.colliders.iter().map(|(e, c)| (e, *c)).collect::<Vec<_>>() {
            if collider.is_trigger {
                continue;
            }
            let Some(transform) = world.transforms.get_mut(entity) else {
                continue;
            };
            let p = transform.position;
            let Some(surface) = self.support(p.x, p.z, p.y + collider.radius) else {
                continue;
            };
            let floor = surface.height + collider.radius;
            if p.y < floor {
                transform.position.y = floor;
                if let Some(body) = world.bodies.get_mut(entity) {
                    if body.velocity.y < Fp::ZERO {
                        body.velocity.y = Fp::ZERO;
                    }
                }
            }
        }
    }

    /// Current overlaps in detection order: entity pairs by ascending slot,
    /// then entity/surface pairs.
    fn detect(&self, world: &World) -> Vec<((EntityRef, ContactTarget), ContactKind, bool, bool)> {
        let spheres: Vec<_> = world
            .colliders
            .iter()
            .filter_map(|(entity, collider)| {
                world
                    .transforms
                    .get(entity)
                    .map(|t| (entity, t.position, collider.radius, collider.is_trigger))
            })
            .collect();

        let mut found = Vec::new();
        for (i, &(a, pa, ra, ta)) in spheres.iter().enumerate() {
            for &(b, pb, rb, tb) in &spheres[i + 1..] {
                if ta && tb {
                    continue;
                }
                let reach = ra + rb;
                if (pb - pa).sqr_magnitude() > reach * reach {
                    continue;
                }
                let kind = if ta || tb {
                    ContactKind::Trigger
                } else {
                    ContactKind::Collision
                };
                found.push(((a, ContactTarget::Entity(b)), kind, ta, tb));
            }
        }

        for &(entity, p, radius, trigger) in &spheres {
            if trigger {
                continue;
            }
            for (index, surface) in self.surfaces.iter().enumerate() {
                if !surface.contains(p.x, p.z) {
                    continue;
                }
                if (p.y - surface.height).abs() > radius + CONTACT_SLOP {
                    continue;
                }
                let kind = if surface.is_trigger {
                    ContactKind::Trigger
                } else {
                    ContactKind::Collision
                };
                found.push(((entity, ContactTarget::Static(index as u16)), kind, false, false));
            }
        }
        found
    }
}

fn enter_events(
    (entity, other): (EntityRef, ContactTarget),
    kind: ContactKind,
    a_trigger: bool,
    b_trigger: bool,
    events: &mut Vec<ContactEvent>,
) {
    let event = |entity, other| ContactEvent {
        kind,
        entity,
        other,
        ignore: false,
    };
    trace!(%entity, ?other, ?kind, "Contact began");
    match (kind, other) {
        (ContactKind::Collision, ContactTarget::Entity(b)) => {
            events.push(event(entity, other));
            events.push(event(b, ContactTarget::Entity(entity)));
        }
        (ContactKind::Trigger, ContactTarget::Entity(b)) => {
            if a_trigger {
                events.push(event(entity, other));
            }
            if b_trigger {
                events.push(event(b, ContactTarget::Entity(entity)));
            }
        }
        (_, ContactTarget::Static(_)) => events.push(event(entity, other)),
    }
}

impl PhysicsQuery for Arena {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: Fp,
        layer_mask: u32,
        options: QueryOptions,
    ) -> Option<RayHit> {
        // surfaces face up, so only downward rays can hit them
        if direction.y >= Fp::ZERO {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for (index, surface) in self.surfaces.iter().enumerate() {
            if surface.layer & layer_mask == 0 || (surface.is_trigger && !options.hit_triggers) {
                continue;
            }
            let distance = (surface.height - origin.y) / direction.y;
            if distance < Fp::ZERO || distance > max_distance {
                continue;
            }
            let point = origin + direction * distance;
            if !surface.contains(point.x, point.z) {
                continue;
            }
            if best.map_or(true, |hit| distance < hit.distance) {
                best = Some(RayHit {
                    distance,
                    point: Vec3::new(point.x, surface.height, point.z),
                    normal: Vec3::UP,
                    is_static: true,
                    surface: index as u16,
                    modifier: surface.modifier,
                });
            }
        }
        best
    }

    fn step(&self, world: &mut World, contacts: &mut ContactSet, dt: Fp) -> Vec<ContactEvent> {
        self.integrate(world, dt);
        self.rest_on_surfaces(world);

        let current = self.detect(world);
        let mut events = Vec::new();
        let mut next = ContactSet::new();
        for (key, kind, a_trigger, b_trigger) in current {
            if !contacts.contains(&key) {
                enter_events(key, kind, a_trigger, b_trigger, &mut events);
            }
            next.insert(key);
        }
        *contacts = next;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::components::{Collider, PhysicsBody, Transform};
    use crate::physics::LAYER_DYNAMIC;

    fn ball(world: &mut World, position: Vec3, radius: Fp, is_trigger: bool) -> EntityRef {
        let entity = world.create();
        world.transforms.insert(entity, Transform::at(position));
        world.colliders.insert(
            entity,
            Collider {
                radius,
                is_trigger,
                layer: LAYER_DYNAMIC,
            },
        );
        entity
    }

    #[test]
    fn test_raycast_prefers_first_declared_surface_on_tie() {
        let arena = Arena::builtin();
        let hit = arena
            .raycast(
                Vec3::from_ints(0, 1, 30),
                Vec3::DOWN,
                Fp::TWO,
                LAYER_GROUND,
                QueryOptions::SOLID,
            )
            .unwrap();
        assert_eq!(hit.distance, Fp::ONE);
        assert_eq!(hit.modifier, Some(TerrainModifierRef(0)));

        let plain = arena
            .raycast(Vec3::from_ints(50, 1, 0), Vec3::DOWN, Fp::TWO, LAYER_GROUND, QueryOptions::SOLID)
            .unwrap();
        assert_eq!(plain.surface, 1);
        assert_eq!(plain.modifier, None);
    }

    #[test]
    fn test_raycast_respects_length_and_mask() {
        let arena = Arena::builtin();
        let origin = Vec3::from_ints(0, 3, 0);
        assert!(arena
            .raycast(origin, Vec3::DOWN, Fp::TWO, LAYER_GROUND, QueryOptions::SOLID)
            .is_none());
        assert!(arena
            .raycast(origin, Vec3::DOWN, Fp::from_int(5), LAYER_DYNAMIC, QueryOptions::SOLID)
            .is_none());
        assert!(arena
            .raycast(origin, Vec3::UP, Fp::from_int(5), LAYER_GROUND, QueryOptions::SOLID)
            .is_none());
    }

    #[test]
    fn test_gravity_and_resting() {
        let arena = Arena::builtin();
        let mut world = World::new();
        let entity = ball(&mut world, Vec3::from_ints(0, 5, 0), Fp::HALF, false);
        world.bodies.insert(entity, PhysicsBody::default());
        let mut contacts = ContactSet::new();
        let dt = Fp::from_ratio(1, 60);

        arena.step(&mut world, &mut contacts, dt);
        let body = world.bodies.get(entity).unwrap();
        assert!(body.velocity.y < Fp::ZERO);

        for _ in 0..600 {
            arena.step(&mut world, &mut contacts, dt);
        }
        let position = world.transforms.get(entity).unwrap().position;
        assert_eq!(position.y, Fp::HALF);
    }

    #[test]
    fn test_contact_enter_reported_once() {
        let arena = Arena::builtin();
        let mut world = World::new();
        let a = ball(&mut world, Vec3::from_ints(0, 5, 0), Fp::ONE, false);
        let b = ball(&mut world, Vec3::new(Fp::ONE, Fp::from_int(5), Fp::ZERO), Fp::ONE, false);
        let mut contacts = ContactSet::new();

        let events = arena.step(&mut world, &mut contacts, Fp::from_ratio(1, 60));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].entity, a);
        assert_eq!(events[0].other, ContactTarget::Entity(b));
        assert_eq!(events[1].entity, b);

        let again = arena.step(&mut world, &mut contacts, Fp::from_ratio(1, 60));
        assert!(again.is_empty());
    }

    #[test]
    fn test_trigger_event_names_trigger_holder() {
        let arena = Arena::builtin();
        let mut world = World::new();
        let solid = ball(&mut world, Vec3::from_ints(0, 5, 0), Fp::ONE, false);
        let trigger = ball(&mut world, Vec3::from_ints(0, 6, 0), Fp::from_int(3), true);
        let mut contacts = ContactSet::new();

        let events = arena.step(&mut world, &mut contacts, Fp::from_ratio(1, 60));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactKind::Trigger);
        assert_eq!(events[0].entity, trigger);
        assert_eq!(events[0].other, ContactTarget::Entity(solid));
    }
}
