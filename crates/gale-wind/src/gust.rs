//! Gusts and squalls layered on top of the base wind.
//!
//! The machine cycles `Off -> Waiting -> Active -> Closing -> Off`. While
//! `Active`, the gust level ramps between randomly drawn targets (components)
//! until the episode length runs out, then ramps back to zero while
//! `Closing`. Squalls are longer, stronger episodes drawn with different
//! distributions.

use gale_core::{
    param::{WindParamsSnapshot, MAX_WIND_FORCE},
    rng::RandomSource,
};

use crate::{wind_speed::SD_WIND_SPEED, BlockRate};

/// Gusts are suppressed below this wind force.
pub const MIN_GUST_FORCE: u32 = 3;

/// How long a gust takes to ramp back to zero after it ends.
pub const CLOSE_SECONDS: f32 = 2.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GustStatus {
    /// No gust activity. The gust level is zero.
    #[default]
    Off,
    /// Counting down the interval until the next episode.
    Waiting,
    /// Ramping between component targets of a gust or squall episode.
    Active,
    /// Ramping back to zero after an episode.
    Closing,
}

/// The kind of episode a component was drawn for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EpisodeKind {
    #[default]
    Gust,
    Squall,
}

impl EpisodeKind {
    fn from_params(params: &WindParamsSnapshot) -> Self {
        if params.squall_active {
            Self::Squall
        } else {
            Self::Gust
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GustState {
    status: GustStatus,
    was_active: bool,
    kind: EpisodeKind,

    current: f32,
    delta: f32,
    target: f32,

    component_counter: u32,
    component_count: u32,
    length_counter: u32,
    length_count: u32,
    interval_counter: u32,
    interval_count: u32,
}

impl GustState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by one block and return the new status.
    ///
    /// The machine only runs while gusts are enabled or a gust is closing.
    /// Disabling gusts in the middle of an episode starts closing it.
    ///
    /// Depths are used as given, so pass a
    /// [`clamped`](WindParamsSnapshot::clamped) snapshot.
    pub fn advance<R: RandomSource>(
        &mut self,
        params: &WindParamsSnapshot,
        rate: BlockRate,
        rng: &mut R,
    ) -> GustStatus {
        if params.gust_active || self.status == GustStatus::Closing {
            self.evaluate(params, rate, rng);
        } else if self.status == GustStatus::Active {
            self.close(rate);
        }

        self.status
    }

    fn evaluate<R: RandomSource>(
        &mut self,
        params: &WindParamsSnapshot,
        rate: BlockRate,
        rng: &mut R,
    ) {
        if !self.was_active {
            self.draw_interval(params, rate, rng);
            return;
        }

        match self.status {
            // `was_active` is cleared together with entering `Off`.
            GustStatus::Off => self.draw_interval(params, rate, rng),
            GustStatus::Waiting => {
                self.interval_counter += 1;
                if self.interval_counter > self.interval_count {
                    let kind = EpisodeKind::from_params(params);
                    if self.draw_component(kind, params, rate, rng) {
                        self.draw_length(kind, rate, rng);
                    }
                }
            }
            GustStatus::Active => {
                self.length_counter += 1;
                if self.length_counter > self.length_count {
                    self.close(rate);
                    return;
                }

                self.component_counter += 1;
                if self.component_counter > self.component_count {
                    self.draw_component(EpisodeKind::from_params(params), params, rate, rng);
                } else {
                    self.current += self.delta;
                }
            }
            GustStatus::Closing => {
                self.component_counter += 1;
                if self.component_counter > self.component_count {
                    self.current = 0.0;
                    self.status = GustStatus::Off;
                    self.was_active = false;
                } else {
                    self.current += self.delta;
                }
            }
        }
    }

    /// Draw the next component target and ramp length, entering `Active`.
    ///
    /// Below [`MIN_GUST_FORCE`] this closes the gust instead and returns
    /// `false`.
    fn draw_component<R: RandomSource>(
        &mut self,
        kind: EpisodeKind,
        params: &WindParamsSnapshot,
        rate: BlockRate,
        rng: &mut R,
    ) -> bool {
        let force = params.wind_force.min(MAX_WIND_FORCE);
        if force < MIN_GUST_FORCE {
            self.close(rate);
            return false;
        }

        let spread = 2.0 * SD_WIND_SPEED[force as usize];
        let half_force = force as f32 / 2.0;

        let (target, ramp_seconds) = match kind {
            EpisodeKind::Gust => {
                let target = 15.0 * params.gust_depth + spread * rng.gaussian();
                (target, (1.0 + 0.25 * rng.gaussian()) / half_force)
            }
            EpisodeKind::Squall => {
                let target = 20.0 * params.squall_depth + spread * rng.gaussian();
                (target, (0.75 + 0.25 * rng.gaussian()) / half_force)
            }
        };

        self.kind = kind;
        self.target = target;
        self.component_count = rate.blocks(ramp_seconds);
        self.component_counter = 0;
        self.delta = (self.target - self.current) / self.component_count as f32;
        self.status = GustStatus::Active;

        true
    }

    fn draw_length<R: RandomSource>(&mut self, kind: EpisodeKind, rate: BlockRate, rng: &mut R) {
        let seconds = match kind {
            EpisodeKind::Gust => 5.0 + 1.5 * rng.gaussian(),
            EpisodeKind::Squall => 30.0 + 5.0 * rng.gaussian(),
        };

        self.length_counter = 0;
        self.length_count = rate.blocks(seconds);
    }

    fn draw_interval<R: RandomSource>(
        &mut self,
        params: &WindParamsSnapshot,
        rate: BlockRate,
        rng: &mut R,
    ) {
        let seconds = 5.0 + 100.0 * params.gust_interval + 10.0 * rng.gaussian();

        self.interval_counter = 0;
        self.interval_count = rate.blocks(seconds);
        self.status = GustStatus::Waiting;
        self.was_active = true;
    }

    /// Start ramping the gust level back to zero.
    fn close(&mut self, rate: BlockRate) {
        self.target = 0.0;
        self.component_count = rate.blocks(CLOSE_SECONDS);
        self.component_counter = 0;
        self.delta = (self.target - self.current) / self.component_count as f32;
        self.status = GustStatus::Closing;
    }

    pub fn status(&self) -> GustStatus {
        self.status
    }

    pub fn was_active(&self) -> bool {
        self.was_active
    }

    /// The kind of the most recently drawn component.
    pub fn kind(&self) -> EpisodeKind {
        self.kind
    }

    /// The current gust level, added to the base wind speed.
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn component_count(&self) -> u32 {
        self.component_count
    }

    pub fn length_count(&self) -> u32 {
        self.length_count
    }

    pub fn interval_count(&self) -> u32 {
        self.interval_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gale_core::{
        rng::{ConstantSource, Pcg32Source},
        ProcessSpec,
    };

    fn rate() -> BlockRate {
        BlockRate::new(&ProcessSpec::new(48000.0, 480, 2).unwrap())
    }

    fn gusty(force: u32) -> WindParamsSnapshot {
        WindParamsSnapshot {
            wind_force: force,
            gust_active: true,
            gust_interval: 0.0,
            ..Default::default()
        }
    }

    /// Advance until the status changes, returning the number of blocks taken.
    fn blocks_until_change<R: RandomSource>(
        gust: &mut GustState,
        params: &WindParamsSnapshot,
        rng: &mut R,
    ) -> u32 {
        let start = gust.status();
        let mut blocks = 0;
        while gust.status() == start {
            gust.advance(params, rate(), rng);
            blocks += 1;
            assert!(blocks < 1_000_000, "stuck in {:?}", start);
        }
        blocks
    }

    #[test]
    fn idle_without_gusts() {
        let mut gust = GustState::default();
        let mut rng = ConstantSource::MEAN;
        let params = WindParamsSnapshot::default();

        for _ in 0..1000 {
            assert_eq!(gust.advance(&params, rate(), &mut rng), GustStatus::Off);
        }
        assert_eq!(gust.current(), 0.0);
    }

    #[test]
    fn first_activation_waits_an_interval() {
        let mut gust = GustState::default();
        let mut rng = ConstantSource::MEAN;
        let params = gusty(5);

        assert_eq!(gust.advance(&params, rate(), &mut rng), GustStatus::Waiting);
        assert!(gust.was_active());
        assert_eq!(gust.current(), 0.0);
        // 5 seconds at 100 blocks per second
        assert_eq!(gust.interval_count(), 500);

        // The episode opens on the block after the interval elapses.
        assert_eq!(blocks_until_change(&mut gust, &params, &mut rng), 501);
        assert_eq!(gust.status(), GustStatus::Active);
        assert_eq!(gust.kind(), EpisodeKind::Gust);
        assert_eq!(gust.target(), 7.5);
        assert_eq!(gust.component_count(), 40);
        assert_eq!(gust.length_count(), 500);
    }

    #[test]
    fn gust_ramps_to_component_target() {
        let mut gust = GustState::default();
        let mut rng = ConstantSource::MEAN;
        let params = gusty(5);

        gust.advance(&params, rate(), &mut rng);
        blocks_until_change(&mut gust, &params, &mut rng);

        for _ in 0..gust.component_count() {
            gust.advance(&params, rate(), &mut rng);
        }
        assert!((gust.current() - 7.5).abs() < 1e-4);
    }

    #[test]
    fn gust_closes_after_its_length() {
        let mut rng = Pcg32Source::new(11);

        for _ in 0..20 {
            let mut gust = GustState::default();
            let params = gusty(5);

            gust.advance(&params, rate(), &mut rng);
            blocks_until_change(&mut gust, &params, &mut rng);
            assert_eq!(gust.status(), GustStatus::Active);

            let length = gust.length_count();
            assert!(length >= 1);
            assert_eq!(blocks_until_change(&mut gust, &params, &mut rng), length + 1);
            assert_eq!(gust.status(), GustStatus::Closing);
        }
    }

    #[test]
    fn closing_ramps_to_zero_then_off() {
        let mut gust = GustState::default();
        let mut rng = ConstantSource::MEAN;
        let params = gusty(5);

        gust.advance(&params, rate(), &mut rng);
        blocks_until_change(&mut gust, &params, &mut rng);
        blocks_until_change(&mut gust, &params, &mut rng);
        assert_eq!(gust.status(), GustStatus::Closing);
        assert_eq!(gust.component_count(), 200);

        // Closing keeps running even with gusts switched off.
        let off = WindParamsSnapshot::default();
        assert_eq!(blocks_until_change(&mut gust, &off, &mut rng), 201);
        assert_eq!(gust.status(), GustStatus::Off);
        assert_eq!(gust.current(), 0.0);
        assert!(!gust.was_active());

        // And the next enabled block starts a new interval.
        assert_eq!(gust.advance(&params, rate(), &mut rng), GustStatus::Waiting);
    }

    #[test]
    fn disabling_mid_gust_closes_on_next_block() {
        let mut gust = GustState::default();
        let mut rng = ConstantSource::MEAN;
        let params = gusty(5);

        gust.advance(&params, rate(), &mut rng);
        blocks_until_change(&mut gust, &params, &mut rng);
        for _ in 0..10 {
            gust.advance(&params, rate(), &mut rng);
        }
        assert_eq!(gust.status(), GustStatus::Active);
        let level = gust.current();
        assert!(level > 0.0);

        let off = WindParamsSnapshot {
            gust_active: false,
            ..params
        };
        assert_eq!(gust.advance(&off, rate(), &mut rng), GustStatus::Closing);
        assert_eq!(gust.current(), level);
        assert_eq!(gust.target(), 0.0);
    }

    #[test]
    fn weak_wind_suppresses_gusts_and_squalls() {
        let mut rng = ConstantSource::MEAN;

        for force in 0..MIN_GUST_FORCE {
            for squall_active in [false, true] {
                let params = WindParamsSnapshot {
                    squall_active,
                    ..gusty(force)
                };

                let mut gust = GustState::default();
                let kind = EpisodeKind::from_params(&params);
                assert!(!gust.draw_component(kind, &params, rate(), &mut rng));
                assert_eq!(gust.status(), GustStatus::Closing);

                // Through the machine: the interval ends in `Closing`, never `Active`.
                let mut gust = GustState::default();
                gust.advance(&params, rate(), &mut rng);
                blocks_until_change(&mut gust, &params, &mut rng);
                assert_eq!(gust.status(), GustStatus::Closing);
            }
        }
    }

    #[test]
    fn squalls_are_longer_and_stronger() {
        let mut rng = ConstantSource::MEAN;
        let params = WindParamsSnapshot {
            squall_active: true,
            ..gusty(5)
        };
        let mut gust = GustState::default();

        gust.advance(&params, rate(), &mut rng);
        blocks_until_change(&mut gust, &params, &mut rng);

        assert_eq!(gust.kind(), EpisodeKind::Squall);
        assert_eq!(gust.target(), 10.0);
        assert_eq!(gust.component_count(), 30);
        assert_eq!(gust.length_count(), 3000);
    }

    #[test]
    fn transitions_are_well_formed() {
        let mut rng = Pcg32Source::new(5);
        let mut toggles = Pcg32Source::new(6);
        let rate = BlockRate::new(&ProcessSpec::new(1000.0, 100, 1).unwrap());
        let mut gust = GustState::default();
        let mut params = gusty(6);

        for block in 0..200_000 {
            if block % 37 == 0 {
                params.gust_active = toggles.uniform() < 0.8;
                params.squall_active = toggles.uniform() < 0.3;
                params.wind_force = (toggles.uniform() * 13.0) as u32;
                params.gust_interval = toggles.uniform() * 0.05;
            }

            let prev = gust.status();
            let next = gust.advance(&params, rate, &mut rng);

            if next == GustStatus::Off {
                assert!(matches!(prev, GustStatus::Off | GustStatus::Closing));
            }
            if next == GustStatus::Waiting {
                assert!(matches!(prev, GustStatus::Off | GustStatus::Waiting));
            }
            if prev == GustStatus::Off && next != GustStatus::Off {
                assert_eq!(next, GustStatus::Waiting);
            }
            assert!(gust.current().is_finite());
        }
    }
}
