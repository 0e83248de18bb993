use std::ops::{Add, AddAssign};

use crate::emulator::Health;

/// Zero-sum reward pair for the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rewards {
    pub p1: i32,
    pub p2: i32,
}

impl AddAssign for Rewards {
    fn add_assign(&mut self, rhs: Self) {
        self.p1 += rhs.p1;
        self.p2 += rhs.p2;
    }
}

impl Add for Rewards {
    type Output = Rewards;

    fn add(mut self, rhs: Self) -> Rewards {
        self += rhs;
        self
    }
}

/// Differential health reward. Holds the health seen on the previous tick and
/// must be fed every tick, or damage dealt between feeds is lost.
#[derive(Debug, Clone, Default)]
pub struct RewardModel {
    expected: Health,
}

impl RewardModel {
    pub fn expected(&self) -> Health {
        self.expected
    }

    /// Replace the baseline without producing any reward.
    pub fn reset(&mut self, health: Health) {
        self.expected = health;
    }

    pub fn observe(&mut self, now: Health) -> Rewards {
        let p1_lost = self.expected.p1 as i32 - now.p1 as i32;
        let p2_lost = self.expected.p2 as i32 - now.p2 as i32;
        self.expected = now;
        Rewards {
            p1: p2_lost - p1_lost,
            p2: p1_lost - p2_lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(p1: i8, p2: i8) -> Health {
        Health { p1, p2 }
    }

    #[test]
    fn taking_damage_is_negative_for_p1() {
        let mut model = RewardModel::default();
        model.reset(health(-96, 120));
        // 160 does not fit in i8; the game stores it wrapped.
        let r = model.observe(health(-106, 120));
        assert_eq!(r, Rewards { p1: -10, p2: 10 });
    }

    #[test]
    fn dealing_damage_is_positive_for_p1() {
        let mut model = RewardModel::default();
        model.reset(health(100, 120));
        assert_eq!(model.observe(health(100, 95)), Rewards { p1: 25, p2: -25 });
    }

    #[test]
    fn rewards_are_zero_sum_every_tick() {
        let mut model = RewardModel::default();
        model.reset(health(127, 127));
        let trace = [(127, 120), (110, 120), (110, 100), (-128, 100), (50, -1)];
        for (p1, p2) in trace {
            let r = model.observe(health(p1, p2));
            assert_eq!(r.p1, -r.p2);
            assert_eq!(model.expected(), health(p1, p2));
        }
    }

    #[test]
    fn split_damage_sums_to_the_whole() {
        let mut split = RewardModel::default();
        split.reset(health(100, 100));
        let mut total = Rewards::default();
        for (p1, p2) in [(95, 100), (95, 90), (80, 70)] {
            total += split.observe(health(p1, p2));
        }

        let mut whole = RewardModel::default();
        whole.reset(health(100, 100));
        assert_eq!(total, whole.observe(health(80, 70)));
    }

    #[test]
    fn reset_does_not_reward() {
        let mut model = RewardModel::default();
        model.reset(health(100, 100));
        model.reset(health(10, 10));
        assert_eq!(model.observe(health(10, 10)), Rewards::default());
    }
}
