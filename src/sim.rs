use crate::tank::Tank;

impl Tank {
    pub(crate) fn step(&mut self) -> usize {
        let (fish, rng) = self.fish_and_rng_mut();
        let mut turned = 0;
        for f in fish.iter_mut() {
            if f.at_wall() {
                f.change_direction();
                turned += 1;
            }
            f.move_forward(rng);
            log::trace!("fish {f}");
        }
        turned
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Run {
    pub(crate) total_steps: u32,
    pub(crate) steps_done: u32,
    pub(crate) paused: bool,
}

impl Run {
    pub(crate) fn new(total_steps: u32) -> Self {
        Self {
            total_steps,
            steps_done: 0,
            paused: false,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.steps_done >= self.total_steps
    }

    pub(crate) fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    // None when paused or finished
    pub(crate) fn tick(&mut self, tank: &mut Tank) -> Option<usize> {
        if self.paused {
            return None;
        }
        self.advance(tank)
    }

    pub(crate) fn advance(&mut self, tank: &mut Tank) -> Option<usize> {
        if self.is_finished() {
            return None;
        }
        let turned = tank.step();
        self.steps_done += 1;
        Some(turned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::MIN_DISTANCE;
    use crate::tank::Rgb;
    use proptest::prelude::*;

    fn stocked(width: i32, height: i32, n: usize, seed: u64) -> Tank {
        let mut tank = Tank::new(width, height, seed);
        for _ in 0..n {
            tank.spawn_fish(Rgb::WHITE).unwrap();
        }
        tank
    }

    #[test]
    fn fish_at_wall_turn_before_moving() {
        let mut tank = stocked(600, 480, 1, 1);
        {
            let (fish, _) = tank.fish_and_rng_mut();
            fish[0].place_at(571, 100);
        }
        assert_eq!(tank.step(), 1);
        let f = &tank.fish()[0];
        assert!(f.is_facing_left());
        assert!(f.x() < 571 && f.x() >= 571 - 70);
    }

    #[test]
    fn fish_in_open_water_keep_heading() {
        let mut tank = stocked(600, 480, 1, 1);
        {
            let (fish, _) = tank.fish_and_rng_mut();
            fish[0].place_at(100, 100);
        }
        assert_eq!(tank.step(), 0);
        let f = &tank.fish()[0];
        assert!(f.is_facing_right());
        assert!(f.x() >= 100 + MIN_DISTANCE);
    }

    #[test]
    fn run_stops_after_total_steps() {
        let mut tank = stocked(600, 480, 3, 4);
        let mut run = Run::new(5);
        let mut ran = 0;
        while run.tick(&mut tank).is_some() {
            ran += 1;
        }
        assert_eq!(ran, 5);
        assert!(run.is_finished());
        assert_eq!(run.advance(&mut tank), None);
        assert_eq!(run.steps_done, 5);
    }

    #[test]
    fn paused_run_only_moves_on_explicit_advance() {
        let mut tank = stocked(600, 480, 2, 4);
        let mut run = Run::new(3);
        run.toggle_pause();
        let before: Vec<i32> = tank.fish().iter().map(|f| f.x()).collect();
        assert_eq!(run.tick(&mut tank), None);
        let after: Vec<i32> = tank.fish().iter().map(|f| f.x()).collect();
        assert_eq!(before, after);
        assert_eq!(run.steps_done, 0);

        assert!(run.advance(&mut tank).is_some());
        assert_eq!(run.steps_done, 1);
        run.toggle_pause();
        assert!(run.tick(&mut tank).is_some());
        assert_eq!(run.steps_done, 2);
    }

    #[test]
    fn same_seed_same_swim() {
        let mut a = stocked(600, 480, 4, 77);
        let mut b = stocked(600, 480, 4, 77);
        for _ in 0..50 {
            a.step();
            b.step();
        }
        let pa: Vec<String> = a.fish().iter().map(ToString::to_string).collect();
        let pb: Vec<String> = b.fish().iter().map(ToString::to_string).collect();
        assert_eq!(pa, pb);
    }

    proptest! {
        #[test]
        fn prop_steps_keep_every_fish_in_tank(
            width in 96i32..900,
            height in 51i32..600,
            n in 1usize..10,
            steps in 1usize..150,
            seed in any::<u64>(),
        ) {
            let mut tank = stocked(width, height, n, seed);
            let ys: Vec<i32> = tank.fish().iter().map(|f| f.y()).collect();
            for _ in 0..steps {
                tank.step();
                for f in tank.fish() {
                    let hl = f.navigator().half_length();
                    prop_assert!(f.x() - (hl + 1) >= 0);
                    prop_assert!(f.x() + (hl + 1) <= width);
                }
            }
            let after: Vec<i32> = tank.fish().iter().map(|f| f.y()).collect();
            prop_assert_eq!(ys, after);
        }
    }
}
