//! Damped velocity integrators that animate whole-cube and layer rotations.
//!
//! Both integrators advance one fixed step per animation tick: the distance
//! to the target accelerates the velocity, damping bleeds it off and the
//! result is clamped to a maximum speed. They hold no state of their own;
//! the caller owns velocities and accumulated angles.

use std::f32::consts::{FRAC_PI_2, TAU};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::math::{clamp_magnitude, wrap_angle};
use crate::orientation::Orientation;

/// Target of every layer turn: a quarter revolution.
pub const QUARTER_TURN: f32 = FRAC_PI_2;

/// Tuning of one integrator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    /// Fraction of the remaining distance added to the velocity per tick.
    pub acceleration: f32,
    /// Factor the velocity is multiplied by per tick.
    pub damping: f32,
    /// Largest angular speed, in radians per tick.
    pub max_velocity: f32,
    /// Distance under which the rotation counts as arrived.
    pub epsilon: f32,
}

impl Gains {
    pub const WHOLE_CUBE: Gains = Gains {
        acceleration: 0.03,
        damping: 0.7,
        max_velocity: 0.15,
        epsilon: 1e-4,
    };

    pub const LAYER: Gains = Gains {
        acceleration: 0.05,
        damping: 0.6,
        max_velocity: 0.2,
        epsilon: 0.01,
    };
}

/// Outcome of one whole-cube tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientationStep {
    pub orientation: Orientation,
    pub velocity: Vector2<f32>,
    pub arrived: bool,
}

/// Advances the whole-cube orientation one tick towards `target`.
///
/// Each axis moves along the shorter way round. On arrival the orientation
/// is snapped exactly onto `target` and the velocity is zeroed.
pub fn step_orientation(
    current: Orientation,
    target: Orientation,
    velocity: Vector2<f32>,
    gains: &Gains,
) -> OrientationStep {
    let distance = Vector2::new(
        wrap_angle(target.x - current.x),
        wrap_angle(target.y - current.y),
    );
    let accelerated = (velocity + distance * gains.acceleration) * gains.damping;
    let velocity = clamp_magnitude(accelerated, gains.max_velocity);

    if distance.norm() < gains.epsilon && velocity.norm() < gains.epsilon * 10.0 {
        return OrientationStep {
            orientation: target,
            velocity: Vector2::zeros(),
            arrived: true,
        };
    }

    OrientationStep {
        orientation: Orientation::new(current.x + velocity.x, current.y + velocity.y),
        velocity,
        arrived: false,
    }
}

/// Per-turn state of a layer rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerTurnState {
    /// Rotation accumulated since the turn started.
    pub accumulated: f32,
    pub velocity: f32,
    pub target: f32,
}

impl LayerTurnState {
    pub fn new() -> Self {
        Self {
            accumulated: 0.0,
            velocity: 0.0,
            target: QUARTER_TURN,
        }
    }
}

impl Default for LayerTurnState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one layer tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStep {
    /// Angle to rotate the layer by this tick, correction included.
    pub delta: f32,
    pub state: LayerTurnState,
    pub arrived: bool,
}

/// Advances a layer turn one tick.
///
/// On arrival the returned delta includes the correction that lands the
/// accumulated angle exactly on the target, and the velocity is zeroed.
pub fn step_layer(state: LayerTurnState, gains: &Gains) -> LayerStep {
    let remaining = wrap_angle(state.target - state.accumulated);
    let acceleration = remaining.abs() * gains.acceleration;
    let velocity = ((state.velocity + acceleration) * gains.damping)
        .clamp(-gains.max_velocity, gains.max_velocity);
    let accumulated = state.accumulated + velocity;

    let left = (state.target - accumulated).abs();
    let left = left.min((left - TAU).abs());
    if left < gains.epsilon {
        return LayerStep {
            delta: state.target - state.accumulated,
            state: LayerTurnState {
                accumulated: state.target,
                velocity: 0.0,
                target: state.target,
            },
            arrived: true,
        };
    }

    LayerStep {
        delta: velocity,
        state: LayerTurnState {
            accumulated,
            velocity,
            target: state.target,
        },
        arrived: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    const TICK_LIMIT: usize = 1000;

    fn run_orientation(start: Orientation, target: Orientation) -> (usize, Orientation) {
        let mut current = start;
        let mut velocity = Vector2::zeros();
        let mut last_distance = f32::INFINITY;
        for tick in 0..TICK_LIMIT {
            let step = step_orientation(current, target, velocity, &Gains::WHOLE_CUBE);
            if step.arrived {
                assert_eq!(step.velocity, Vector2::zeros());
                return (tick, step.orientation);
            }
            let distance = Vector2::new(
                wrap_angle(target.x - step.orientation.x),
                wrap_angle(target.y - step.orientation.y),
            )
            .norm();
            assert!(distance <= last_distance + 1e-6, "distance grew at tick {tick}");
            last_distance = distance;
            current = step.orientation;
            velocity = step.velocity;
        }
        panic!("no convergence from {start:?} to {target:?}");
    }

    #[test]
    fn whole_cube_converges_and_snaps() {
        let targets = [
            Orientation::new(0.5, 0.785),
            Orientation::new(3.0, -3.0),
            Orientation::new(PI, PI),
            Orientation::new(-6.0, 10.0),
        ];
        for target in targets {
            let (ticks, reached) = run_orientation(Orientation::default(), target);
            assert!(ticks < 300);
            assert_eq!(reached, target);
        }
    }

    #[test]
    fn whole_cube_takes_the_short_way_round() {
        // from 0 towards 2pi - 0.1, the first step must go negative
        let target = Orientation::new(TAU - 0.1, 0.0);
        let step = step_orientation(Orientation::default(), target, Vector2::zeros(), &Gains::WHOLE_CUBE);
        assert!(step.velocity.x < 0.0);
    }

    #[test]
    fn whole_cube_velocity_is_clamped() {
        let step = step_orientation(
            Orientation::default(),
            Orientation::new(3.0, 3.0),
            Vector2::new(5.0, 5.0),
            &Gains::WHOLE_CUBE,
        );
        assert_relative_eq!(step.velocity.norm(), Gains::WHOLE_CUBE.max_velocity, epsilon = 1e-6);
    }

    #[test]
    fn already_there_arrives_immediately() {
        let here = Orientation::new(0.2, -0.4);
        let step = step_orientation(here, here, Vector2::zeros(), &Gains::WHOLE_CUBE);
        assert!(step.arrived);
        assert_eq!(step.orientation, here);
    }

    #[test]
    fn layer_turn_lands_exactly_on_a_quarter() {
        let mut state = LayerTurnState::new();
        let mut applied = 0.0;
        for tick in 0..TICK_LIMIT {
            let step = step_layer(state, &Gains::LAYER);
            applied += step.delta;
            assert!(step.state.accumulated <= QUARTER_TURN + 1e-6, "overshoot at tick {tick}");
            if step.arrived {
                assert!(tick < 200);
                assert_eq!(step.state.accumulated, QUARTER_TURN);
                assert_eq!(step.state.velocity, 0.0);
                assert_relative_eq!(applied, QUARTER_TURN, epsilon = 1e-5);
                return;
            }
            state = step.state;
        }
        panic!("layer turn never arrived");
    }

    #[test]
    fn layer_velocity_respects_maximum() {
        let state = LayerTurnState {
            accumulated: 0.0,
            velocity: 1.0,
            target: QUARTER_TURN,
        };
        let step = step_layer(state, &Gains::LAYER);
        assert_eq!(step.state.velocity, Gains::LAYER.max_velocity);
    }
}
