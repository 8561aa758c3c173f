//! Weapon instances and their refire gate.
//!
//! A [`Weapon`] pairs an immutable [`WeaponDefinition`] with a [`RefireTimer`].
//! Resolving what a shot actually does (rays, projectiles, melee) needs the
//! whole map and lives in [`crate::map::combat`].

use crate::definitions::WeaponDefinition;
use std::sync::Arc;

/// Accumulating cooldown.
///
/// Time flows in through [`advance`](Self::advance).  [`try_fire`](Self::try_fire)
/// spends one period when enough has built up and then drains whatever whole
/// periods remain, so a long frame authorises exactly one shot instead of a
/// burst.
#[derive(Debug, Clone, PartialEq)]
pub struct RefireTimer {
    period: f32,
    elapsed: f32,
}

impl RefireTimer {
    /// A new timer starts ready to fire.
    pub fn new(period: f32) -> Self {
        let period = if period.is_finite() { period.max(0.0) } else { 0.0 };
        Self {
            period,
            elapsed: period,
        }
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Spend one period if available.  A zero period is always available.
    pub fn decrement_if_elapsed(&mut self) -> bool {
        if self.period <= 0.0 {
            return true;
        }
        if self.elapsed >= self.period {
            self.elapsed -= self.period;
            true
        } else {
            false
        }
    }

    /// Discard every further whole period, keeping the fractional remainder.
    pub fn drain(&mut self) {
        if self.period <= 0.0 {
            self.elapsed = 0.0;
        } else {
            self.elapsed = self.elapsed.rem_euclid(self.period);
        }
    }

    /// Gate one shot and drain the surplus.
    pub fn try_fire(&mut self) -> bool {
        if !self.decrement_if_elapsed() {
            return false;
        }
        self.drain();
        true
    }
}

#[derive(Debug, Clone)]
pub struct Weapon {
    pub definition: Arc<WeaponDefinition>,
    pub refire: RefireTimer,
}

impl Weapon {
    pub fn new(definition: Arc<WeaponDefinition>) -> Self {
        let refire = RefireTimer::new(definition.refire_time);
        Self { definition, refire }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Engagement distance: unlimited for projectile weapons, ray reach for
    /// hitscan, melee reach otherwise.
    pub fn range(&self) -> f32 {
        let def = &self.definition;
        if def.projectile_count > 0 {
            f32::INFINITY
        } else if def.ray_count > 0 {
            def.ray_range
        } else {
            def.melee_range
        }
    }
}
