use crate::navigation::Navigator;
use crate::tank::{Rgb, Tank};
use anyhow::Result;
use rand::Rng;
use std::fmt;

pub(crate) const MIN_DISTANCE: i32 = 10;
pub(crate) const MAX_DISTANCE: i32 = 70;

#[derive(Clone, Debug)]
pub(crate) struct Fish {
    id: u32,
    color: Rgb,
    facing_right: bool,
    nav: Navigator,
}

impl Fish {
    pub(crate) fn new(tank: &mut Tank, color: Rgb) -> Result<Self> {
        tank.ensure_fits_largest()?;
        let id = tank.issue_id();
        let nav = Navigator::new(id, tank);
        Ok(Self {
            id,
            color,
            facing_right: true,
            nav,
        })
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn color(&self) -> Rgb {
        self.color
    }

    pub(crate) fn x(&self) -> i32 {
        self.nav.center_x()
    }

    pub(crate) fn y(&self) -> i32 {
        self.nav.center_y()
    }

    pub(crate) fn length(&self) -> i32 {
        self.nav.length()
    }

    pub(crate) fn height(&self) -> i32 {
        self.nav.height()
    }

    pub(crate) fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub(crate) fn is_facing_right(&self) -> bool {
        self.facing_right
    }

    pub(crate) fn is_facing_left(&self) -> bool {
        !self.facing_right
    }

    pub(crate) fn distance_to_wall(&self) -> i32 {
        self.nav.distance_to_facing_wall(self.facing_right)
    }

    // never turns on its own; the caller decides
    pub(crate) fn at_wall(&self) -> bool {
        self.distance_to_wall() <= MIN_DISTANCE
    }

    pub(crate) fn at_surface(&self) -> bool {
        self.nav.at_surface()
    }

    pub(crate) fn at_bottom(&self) -> bool {
        self.nav.at_bottom()
    }

    pub(crate) fn move_forward<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut amount = rng.gen_range(MIN_DISTANCE..=MAX_DISTANCE);
        let room = self.distance_to_wall();
        if amount >= room {
            amount = room;
        }
        if self.facing_right {
            self.nav.move_right(amount);
        } else {
            self.nav.move_left(amount);
        }
    }

    pub(crate) fn change_direction(&mut self) {
        self.facing_right = !self.facing_right;
    }

    #[cfg(test)]
    pub(crate) fn place_at(&mut self, x: i32, y: i32) {
        self.nav.place_at(x, y);
    }
}

impl fmt::Display for Fish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.facing_right { "R" } else { "L" };
        write!(f, "{} ({}, {}) {}", self.id, self.x(), self.y(), dir)
    }
}
