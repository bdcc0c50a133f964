//! Explosion lifetime

use crate::math::Fp;

use super::frame::Frame;

/// Explosions live for a fixed time whether or not they hit anything.
pub fn update(frame: &mut Frame) {
    let delta = frame.delta;
    for entity in frame.world.explosions.entities() {
        let Some(explosion) = frame.world.explosions.get_mut(entity) else {
            continue;
        };
        explosion.remaining_lifetime -= delta;
        if explosion.remaining_lifetime <= Fp::ZERO {
            frame.world.destroy(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::game::assets::{AssetDb, PrototypeRef};

    #[test]
    fn test_explosion_expires() {
        // half a second at 10 ticks per second
        let mut frame = Frame::new(Arc::new(AssetDb::builtin()), 0, 10);
        let explosion = frame.world.spawn(&frame.assets, PrototypeRef(4)).unwrap();
        for _ in 0..5 {
            update(&mut frame);
        }
        assert!(frame.world.exists(explosion));
        update(&mut frame);
        assert!(!frame.world.exists(explosion));
    }
}
