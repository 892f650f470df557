//! Combat systems operating on the engine's world.
//!
//! Systems are free functions taking the engine. They do not own state;
//! everything lives in components, `LevelStats` or the event queue.

pub mod ballistic;
pub mod damage;
pub mod floor;
pub mod grenade;
pub mod mock;
pub mod morale;
pub mod reaction;
pub mod shoot;
pub mod splash;
pub mod visibility;

use rand::Rng;

/// Uniform random number in `[-1, 1)`.
pub(crate) fn crand<R: Rng>(rng: &mut R) -> f32 {
    rng.gen::<f32>() * 2.0 - 1.0
}

/// Uniform random number in `[0, 1)`.
pub(crate) fn frand<R: Rng>(rng: &mut R) -> f32 {
    rng.gen::<f32>()
}

/// Pair of independent standard normal samples (polar method).
pub(crate) fn gauss_pair<R: Rng>(rng: &mut R) -> (f32, f32) {
    loop {
        let x = crand(rng);
        let y = crand(rng);
        let s = x * x + y * y;
        if s > 0.0 && s < 1.0 {
            let factor = (-2.0 * s.ln() / s).sqrt();
            return (x * factor, y * factor);
        }
    }
}
