use crate::fish::Fish;
use crate::navigation::{LARGEST_HEIGHT, LARGEST_LENGTH};
use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub(crate) const DEFAULT_WIDTH: i32 = 640;
pub(crate) const DEFAULT_HEIGHT: i32 = 480;

pub(crate) const BORDER_PADDING: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) const WHITE: Rgb = Rgb::new(255, 255, 255);
}

pub(crate) const WATER: Rgb = Rgb::new(0, 153, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub(crate) width: i32,
    pub(crate) height: i32,
}

pub(crate) fn half_extent(extent: i32) -> i32 {
    (extent as f64 / 2.0).round() as i32
}

#[derive(Debug)]
pub(crate) struct Tank {
    bounds: Bounds,
    background: Rgb,
    fish: Vec<Fish>,
    next_id: u32,
    rng: StdRng,
}

impl Tank {
    pub(crate) fn new(width: i32, height: i32, seed: u64) -> Self {
        let w = if width > 0 { width } else { DEFAULT_WIDTH };
        let h = if height > 0 { height } else { DEFAULT_HEIGHT };
        if w != width || h != height {
            log::warn!("tank {width}x{height} is not positive, using {w}x{h}");
        }
        Self {
            bounds: Bounds {
                width: w,
                height: h,
            },
            background: WATER,
            fish: Vec::new(),
            next_id: 1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn width(&self) -> i32 {
        self.bounds.width
    }

    pub(crate) fn height(&self) -> i32 {
        self.bounds.height
    }

    pub(crate) fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn background_color(&self) -> Rgb {
        self.background
    }

    pub(crate) fn fish(&self) -> &[Fish] {
        &self.fish
    }

    pub(crate) fn fish_and_rng_mut(&mut self) -> (&mut [Fish], &mut StdRng) {
        (&mut self.fish, &mut self.rng)
    }

    pub(crate) fn len(&self) -> usize {
        self.fish.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fish.is_empty()
    }

    pub(crate) fn add(&mut self, fish: Fish) {
        self.fish.push(fish);
    }

    pub(crate) fn issue_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn valid_location(&self, x: i32, y: i32) -> bool {
        (0..self.bounds.width).contains(&x) && (0..self.bounds.height).contains(&y)
    }

    pub(crate) fn fits(&self, length: i32, height: i32) -> bool {
        center_range(self.bounds.width, length) > 0 && center_range(self.bounds.height, height) > 0
    }

    pub(crate) fn ensure_fits_largest(&self) -> Result<()> {
        ensure!(
            self.fits(LARGEST_LENGTH, LARGEST_HEIGHT),
            "tank {}x{} is too small: fish need at least {}x{}",
            self.bounds.width,
            self.bounds.height,
            LARGEST_LENGTH + 2 * BORDER_PADDING + 1,
            LARGEST_HEIGHT + 2 * BORDER_PADDING + 1,
        );
        Ok(())
    }

    // Draws from `range` values starting at half + padding; the top of the
    // padded interval is never hit.
    pub(crate) fn random_center_x(&mut self, object_length: i32) -> i32 {
        let range = center_range(self.bounds.width, object_length);
        assert!(
            range > 0,
            "tank width {} cannot hold an object of length {object_length}",
            self.bounds.width
        );
        self.rng.gen_range(0..range) + half_extent(object_length) + BORDER_PADDING
    }

    pub(crate) fn random_center_y(&mut self, object_height: i32) -> i32 {
        let range = center_range(self.bounds.height, object_height);
        assert!(
            range > 0,
            "tank height {} cannot hold an object of height {object_height}",
            self.bounds.height
        );
        self.rng.gen_range(0..range) + half_extent(object_height) + BORDER_PADDING
    }

    pub(crate) fn spawn_fish(&mut self, color: Rgb) -> Result<u32> {
        let fish = Fish::new(self, color)?;
        let id = fish.id();
        log::debug!("spawned fish {fish}");
        self.add(fish);
        Ok(id)
    }
}

fn center_range(extent: i32, object_extent: i32) -> i32 {
    extent - object_extent - 2 * BORDER_PADDING
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn non_positive_dimensions_fall_back_per_axis() {
        let t = Tank::new(0, -5, 1);
        assert_eq!((t.width(), t.height()), (640, 480));

        let t = Tank::new(300, 0, 1);
        assert_eq!((t.width(), t.height()), (300, 480));

        let t = Tank::new(-1, 200, 1);
        assert_eq!((t.width(), t.height()), (640, 200));
    }

    #[test]
    fn background_is_water_blue() {
        let t = Tank::new(600, 480, 1);
        assert_eq!(t.background_color(), Rgb::new(0, 153, 255));
    }

    #[test]
    fn center_x_for_45_long_fish_in_600_wide_tank() {
        let mut t = Tank::new(600, 480, 7);
        for _ in 0..5_000 {
            let x = t.random_center_x(45);
            assert!((33..=567).contains(&x), "x = {x}");
        }
    }

    #[test]
    fn center_draws_cover_whole_range() {
        // 60 wide, object 30: range is 10 values starting at 15 + 10.
        let mut t = Tank::new(60, 60, 3);
        let mut seen = [false; 10];
        for _ in 0..2_000 {
            let x = t.random_center_x(30);
            seen[(x - 25) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn center_never_reaches_top_of_padded_interval() {
        // 51 wide, object 30: one value, 25. The padded interval ends at 26.
        let mut t = Tank::new(51, 480, 6);
        for _ in 0..200 {
            assert_eq!(t.random_center_x(30), 25);
        }

        let mut t = Tank::new(600, 480, 6);
        let top = (0..20_000).map(|_| t.random_center_x(30)).max().unwrap();
        assert!(top <= 574, "top = {top}");
        assert!(top > 560);
    }

    #[test]
    #[should_panic(expected = "cannot hold")]
    fn center_x_in_too_narrow_tank_panics() {
        let mut t = Tank::new(50, 480, 1);
        t.random_center_x(30);
    }

    #[test]
    fn valid_location_is_half_open() {
        let t = Tank::new(100, 80, 1);
        assert!(t.valid_location(0, 0));
        assert!(t.valid_location(99, 79));
        assert!(!t.valid_location(100, 0));
        assert!(!t.valid_location(0, 80));
        assert!(!t.valid_location(-1, 10));
    }

    #[test]
    fn ids_are_issued_in_order() {
        let mut t = Tank::new(600, 480, 1);
        assert_eq!(t.issue_id(), 1);
        assert_eq!(t.issue_id(), 2);
        assert_eq!(t.issue_id(), 3);
    }

    #[test]
    fn fish_keep_insertion_order() {
        let mut t = Tank::new(600, 480, 9);
        let ids: Vec<u32> = (0..6).map(|_| t.spawn_fish(Rgb::WHITE).unwrap()).collect();
        let listed: Vec<u32> = t.fish().iter().map(Fish::id).collect();
        assert_eq!(ids, listed);
        let again: Vec<u32> = t.fish().iter().map(Fish::id).collect();
        assert_eq!(listed, again);
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn smallest_tank_that_fits_largest_fish() {
        assert!(Tank::new(96, 51, 1).ensure_fits_largest().is_ok());
        assert!(Tank::new(95, 51, 1).ensure_fits_largest().is_err());
        assert!(Tank::new(96, 50, 1).ensure_fits_largest().is_err());
    }

    #[test]
    fn spawn_in_small_tank_fails_without_side_effects() {
        let mut t = Tank::new(80, 480, 1);
        let err = t.spawn_fish(Rgb::WHITE).unwrap_err();
        assert!(err.to_string().contains("too small"));
        assert!(t.is_empty());
        assert_eq!(t.issue_id(), 1);
    }

    proptest! {
        #[test]
        fn prop_random_centers_keep_padded_box_inside(
            width in 96i32..2000,
            height in 51i32..2000,
            class in 0i32..4,
            seed in any::<u64>(),
        ) {
            let mut t = Tank::new(width, height, seed);
            let length = 30 + class * 15;
            let fish_height = (0.4 * length as f64).round() as i32;
            let (hl, hh) = (half_extent(length), half_extent(fish_height));
            for _ in 0..32 {
                let x = t.random_center_x(length);
                let y = t.random_center_y(fish_height);
                prop_assert!(x - hl - BORDER_PADDING >= 0);
                prop_assert!(x + hl + BORDER_PADDING <= width);
                prop_assert!(y - hh - BORDER_PADDING >= 0);
                prop_assert!(y + hh + BORDER_PADDING <= height);
                prop_assert!(t.valid_location(x, y));
            }
        }
    }
}
