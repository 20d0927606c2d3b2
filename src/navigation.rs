use crate::tank::{half_extent, Bounds, Tank};

pub(crate) const SIZE_CLASSES: i32 = 4;
pub(crate) const LARGEST_LENGTH: i32 = 30 + (SIZE_CLASSES - 1) * 15;
pub(crate) const LARGEST_HEIGHT: i32 = 30;

/// Where a fish is and how big it is. Moves are unclamped here; the fish
/// decides how far it may go.
#[derive(Clone, Debug)]
pub(crate) struct Navigator {
    bounds: Bounds,
    center_x: i32,
    center_y: i32,
    length: i32,
    height: i32,
    half_length: i32,
    half_height: i32,
}

impl Navigator {
    pub(crate) fn new(id: u32, tank: &mut Tank) -> Self {
        let mut nav = Self::init_size(id, tank.bounds());
        nav.init_position(tank);
        nav
    }

    pub(crate) fn init_size(id: u32, bounds: Bounds) -> Self {
        let length = 30 + (id % SIZE_CLASSES as u32) as i32 * 15;
        let height = (0.4 * length as f64).round() as i32;
        Self {
            bounds,
            center_x: 0,
            center_y: 0,
            length,
            height,
            half_length: half_extent(length),
            half_height: half_extent(height),
        }
    }

    fn init_position(&mut self, tank: &mut Tank) {
        self.center_x = tank.random_center_x(self.length);
        self.center_y = tank.random_center_y(self.height);
    }

    pub(crate) fn center_x(&self) -> i32 {
        self.center_x
    }

    pub(crate) fn center_y(&self) -> i32 {
        self.center_y
    }

    pub(crate) fn length(&self) -> i32 {
        self.length
    }

    pub(crate) fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn half_length(&self) -> i32 {
        self.half_length
    }

    pub(crate) fn half_height(&self) -> i32 {
        self.half_height
    }

    /// Distance from the fish's front to the wall it faces. The edge sits one
    /// unit beyond the half length.
    pub(crate) fn distance_to_facing_wall(&self, facing_right: bool) -> i32 {
        if facing_right {
            self.bounds.width - (self.center_x + self.half_length + 1)
        } else {
            self.center_x - (self.half_length + 1)
        }
    }

    /// Compares the top edge against the fish's own height, not zero.
    pub(crate) fn at_surface(&self) -> bool {
        let top = self.center_y - (self.half_height + 1);
        top <= self.height
    }

    pub(crate) fn at_bottom(&self) -> bool {
        let bottom = self.center_y + (self.half_height + 1);
        bottom >= self.bounds.height - self.height
    }

    pub(crate) fn move_right(&mut self, distance: i32) {
        self.center_x += distance;
    }

    pub(crate) fn move_left(&mut self, distance: i32) {
        self.center_x -= distance;
    }

    #[cfg(test)]
    pub(crate) fn place_at(&mut self, x: i32, y: i32) {
        self.center_x = x;
        self.center_y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            width: 600,
            height: 480,
        }
    }

    fn at(id: u32, x: i32, y: i32) -> Navigator {
        let mut nav = Navigator::init_size(id, bounds());
        nav.place_at(x, y);
        nav
    }

    #[test]
    fn four_size_classes_by_id() {
        let expected = [(30, 12, 15, 6), (45, 18, 23, 9), (60, 24, 30, 12), (75, 30, 38, 15)];
        for id in 0..16u32 {
            let nav = Navigator::init_size(id, bounds());
            let (l, h, hl, hh) = expected[(id % 4) as usize];
            assert_eq!(nav.length(), l, "id {id}");
            assert_eq!(nav.height(), h, "id {id}");
            assert_eq!(nav.half_length(), hl, "id {id}");
            assert_eq!(nav.half_height(), hh, "id {id}");
        }
        assert_eq!(LARGEST_LENGTH, 75);
    }

    #[test]
    fn placement_draws_inside_tank() {
        let mut tank = Tank::new(600, 480, 42);
        let nav = Navigator::new(1, &mut tank);
        assert_eq!(nav.length(), 45);
        assert!((33..=567).contains(&nav.center_x()));
        assert!((19..=460).contains(&nav.center_y()));
    }

    #[test]
    fn wall_distance_depends_on_facing() {
        // id 1: half length 23
        let nav = at(1, 100, 200);
        assert_eq!(nav.distance_to_facing_wall(true), 600 - 124);
        assert_eq!(nav.distance_to_facing_wall(false), 76);
    }

    #[test]
    fn surface_and_bottom_use_fish_height() {
        // id 2: height 24, half height 12
        assert!(at(2, 100, 37).at_surface());
        assert!(!at(2, 100, 38).at_surface());
        assert!(at(2, 100, 443).at_bottom());
        assert!(!at(2, 100, 442).at_bottom());
    }

    #[test]
    fn raw_moves_are_not_clamped() {
        let mut nav = at(0, 30, 100);
        nav.move_left(50);
        assert_eq!(nav.center_x(), -20);
        nav.move_right(700);
        assert_eq!(nav.center_x(), 680);
        assert_eq!(nav.center_y(), 100);
    }
}
