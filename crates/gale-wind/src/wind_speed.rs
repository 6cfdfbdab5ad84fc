//! The base wind: a linear ramp toward a randomly drawn target speed.

use gale_core::{param::MAX_WIND_FORCE, rng::RandomSource};

use crate::BlockRate;

/// Mean wind speed (m/s) for each wind force level.
pub const MEAN_WIND_SPEED: [f32; 13] = [
    0.0, 0.9, 2.45, 4.4, 6.7, 9.35, 12.3, 15.5, 18.95, 22.6, 26.45, 30.55, 34.0,
];

/// Standard deviation of the wind speed (m/s) for each wind force level.
pub const SD_WIND_SPEED: [f32; 13] = [
    0.0, 0.3, 0.425, 0.5, 0.6, 0.675, 0.75, 0.8, 0.875, 0.9, 0.975, 1.025, 4.25,
];

/// Ramp length at force 0.
const CALM_RAMP_SECONDS: f32 = 1.0;

/// A ramp generator that draws a new target and ramp length each time the
/// previous ramp completes. Higher wind forces give higher targets and
/// shorter ramps.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WindSpeed {
    current: f32,
    delta: f32,
    target: f32,
    step_counter: u32,
    step_count: u32,
}

impl WindSpeed {
    /// Reset to a calm, finished ramp. The next call to [`WindSpeed::advance`]
    /// draws a fresh target.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by one block.
    pub fn advance<R: RandomSource>(&mut self, wind_force: u32, rate: BlockRate, rng: &mut R) {
        self.step_counter += 1;

        if self.step_counter > self.step_count {
            self.redraw(wind_force, rate, rng);
        } else {
            self.current += self.delta;
        }
    }

    /// Draw a new target and ramp length, restarting the ramp from the
    /// current speed.
    pub fn redraw<R: RandomSource>(&mut self, wind_force: u32, rate: BlockRate, rng: &mut R) {
        let force = wind_force.min(MAX_WIND_FORCE);

        if force == 0 {
            self.target = 0.0;
            self.step_count = rate.blocks(CALM_RAMP_SECONDS);
        } else {
            let i = force as usize;
            self.target = MEAN_WIND_SPEED[i] + SD_WIND_SPEED[i] * rng.gaussian();
            self.step_count = rate.blocks(ramp_seconds(force, rng.gaussian()));
        }

        self.step_counter = 0;
        self.delta = (self.target - self.current) / self.step_count as f32;
    }

    /// Clamp the stored speed at zero and return it.
    ///
    /// Targets may be drawn below zero, so the ramp can dip negative between
    /// two clamps.
    pub fn clamp_current(&mut self) -> f32 {
        if self.current < 0.0 {
            self.current = 0.0;
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn step_counter(&self) -> u32 {
        self.step_counter
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }
}

/// Ramp length for `force > 0`, given one standard normal draw.
fn ramp_seconds(force: u32, normal: f32) -> f32 {
    (10.0 + 2.0 * normal) / (force as f32 / 2.0)
}
