//! Drive system: runs the vehicle model for every player-driven tank

use tracing::trace;

use crate::physics::PhysicsQuery;

use super::frame::Frame;
use super::vehicle::VehicleContext;

pub fn update(frame: &mut Frame, physics: &dyn PhysicsQuery) {
    let (delta, update_rate) = (frame.delta, frame.update_rate);

    for entity in frame.world.vehicles.entities() {
        // no link, no input, no driving
        let Some(link) = frame.world.player_links.get(entity).copied() else {
            continue;
        };
        let input = frame.input(link.player);

        let world = &mut frame.world;
        let (Some(transform), Some(body), Some(state)) = (
            world.transforms.get_mut(entity),
            world.bodies.get_mut(entity),
            world.vehicles.get_mut(entity),
        ) else {
            continue;
        };
        let Some(config) = frame.assets.vehicle(state.config) else {
            trace!(%entity, config = state.config.0, "Vehicle config missing");
            continue;
        };

        config.update(&mut VehicleContext {
            transform,
            body,
            state,
            input: &input,
            physics,
            assets: &frame.assets,
            delta,
            update_rate,
        });
    }
}
