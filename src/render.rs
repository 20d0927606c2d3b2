use crate::console::Console;
use crate::fish::Fish;
use crate::tank::{Rgb, Tank};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Rows under the tank given to the console pane.
pub(crate) const CONSOLE_ROWS: u16 = 4;

// Braille: each terminal cell is 2x4 subpixels.
const SUB_X: i32 = 2;
const SUB_Y: i32 = 4;

const HUD_FG: Color = Color::AnsiValue(159);
const FRAME_BG: Color = Color::Black;

const KEY_HINTS: &str = "Space start  P pause  N step  Tab inspect  Q quit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: FRAME_BG,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn get(&self, x: u16, y: u16) -> Cell {
        self.cells[self.idx(x, y)]
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    fn from_rgb(c: Rgb, a: u8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a,
        }
    }
}

pub(crate) struct PixelCanvas {
    pub(crate) w: i32,
    pub(crate) h: i32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: i32, h: i32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w.max(0) as usize) * (h.max(0) as usize)],
        }
    }

    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.w || y >= self.h {
            return None;
        }
        Some((y as usize) * (self.w as usize) + (x as usize))
    }

    pub(crate) fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }

    pub(crate) fn plot(&mut self, x: i32, y: i32, p: Pixel) {
        if let Some(i) = self.idx(x, y) {
            self.px[i] = p;
        }
    }

    pub(crate) fn get(&self, x: i32, y: i32) -> Pixel {
        self.idx(x, y).map(|i| self.px[i]).unwrap_or_default()
    }
}

/// A rectangle in canvas subpixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

/// Largest rectangle with the tank's aspect ratio that fits in `area`,
/// centered in it. Also returns subpixels per tank unit.
pub(crate) fn fit_viewport(tank_w: i32, tank_h: i32, area: Viewport) -> (Viewport, f32) {
    let sx = area.w as f32 / tank_w.max(1) as f32;
    let sy = area.h as f32 / tank_h.max(1) as f32;
    let scale = sx.min(sy).max(0.0);
    // epsilon absorbs f32 error when one axis fits exactly
    let w = ((tank_w as f32 * scale + 1e-3).floor() as i32).min(area.w);
    let h = ((tank_h as f32 * scale + 1e-3).floor() as i32).min(area.h);
    let vp = Viewport {
        x: area.x + (area.w - w) / 2,
        y: area.y + (area.h - h) / 2,
        w,
        h,
    };
    (vp, scale)
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
    full_redraw: bool,
    active: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as i32 * SUB_X, rows as i32 * SUB_Y),
            full_redraw: true,
            active: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as i32 * SUB_X, r as i32 * SUB_Y);
        self.full_redraw = true;
        Ok(true)
    }

    pub(crate) fn force_redraw(&mut self) {
        self.full_redraw = true;
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !self.full_redraw && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

/// What the frame shows besides the tank itself.
pub(crate) struct Overlay<'a> {
    pub(crate) status: &'a str,
    pub(crate) steps_done: u32,
    pub(crate) total_steps: u32,
    pub(crate) inspected: Option<usize>,
    pub(crate) console: &'a Console,
    pub(crate) enable_color: bool,
}

pub(crate) fn draw_frame(term: &mut Terminal, tank: &Tank, overlay: &Overlay) {
    term.cur.clear();
    term.canvas.clear();

    let cols = term.cols as i32;
    let rows = term.rows as i32;
    // HUD on top, inspector + console at the bottom.
    let tank_rows = (rows - 2 - CONSOLE_ROWS as i32).max(0);
    let area = Viewport {
        x: 0,
        y: SUB_Y,
        w: cols * SUB_X,
        h: tank_rows * SUB_Y,
    };
    let (vp, scale) = fit_viewport(tank.width(), tank.height(), area);

    if scale > 0.0 {
        for f in tank.fish() {
            draw_fish(&mut term.canvas, tank, f, vp, scale, overlay.enable_color);
        }
    }

    let water = to_color(tank.background_color());
    canvas_to_cells(&term.canvas, &mut term.cur, |cx, cy| {
        let (sx, sy) = (cx as i32 * SUB_X, cy as i32 * SUB_Y);
        let inside = sx >= vp.x && sx < vp.x + vp.w && sy >= vp.y && sy < vp.y + vp.h;
        if inside {
            water
        } else {
            FRAME_BG
        }
    });

    if let Some(f) = overlay.inspected.and_then(|i| tank.fish().get(i)) {
        mark_fish(&mut term.cur, f, vp, scale, water);
    }

    let hud = format!(
        " aquasim | tank {}x{} | fish {} | step {}/{} | {} | {}",
        tank.width(),
        tank.height(),
        tank.len(),
        overlay.steps_done,
        overlay.total_steps,
        overlay.status,
        KEY_HINTS,
    );
    draw_text(&mut term.cur, 0, 0, &hud, HUD_FG, FRAME_BG);

    let info_row = (rows - 1 - CONSOLE_ROWS as i32).max(1) as u16;
    let info = match overlay.inspected.and_then(|i| tank.fish().get(i)) {
        Some(f) => describe(f),
        None if tank.is_empty() => " the tank is empty".to_string(),
        None => " Tab: inspect a fish".to_string(),
    };
    draw_text(&mut term.cur, 0, info_row, &info, Color::AnsiValue(250), FRAME_BG);

    for (i, line) in overlay.console.tail(CONSOLE_ROWS as usize).enumerate() {
        draw_text(&mut term.cur, 1, info_row + 1 + i as u16, line, Color::White, FRAME_BG);
    }
}

pub(crate) fn describe(f: &Fish) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    format!(
        " fish #{} | {}x{} | at ({}, {}) facing {} | wall in {} | surface {} | bottom {}",
        f.id(),
        f.length(),
        f.height(),
        f.x(),
        f.y(),
        if f.is_facing_left() { "left" } else { "right" },
        f.distance_to_wall(),
        yes_no(f.at_surface()),
        yes_no(f.at_bottom()),
    )
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Rasterizes one fish: an oval body toward the front and a forked tail
/// behind, with an eye near the snout.
fn draw_fish(
    canvas: &mut PixelCanvas,
    tank: &Tank,
    f: &Fish,
    vp: Viewport,
    scale: f32,
    color: bool,
) {
    let nav = f.navigator();
    let hl = nav.half_length() as f32;
    let hh = nav.half_height() as f32;
    let (cx, cy) = (f.x() as f32, f.y() as f32);
    let dir = if f.is_facing_right() { 1.0 } else { -1.0 };

    let body = Pixel::from_rgb(if color { f.color() } else { Rgb::WHITE }, 230);
    let eye = Pixel {
        r: 10,
        g: 10,
        b: 20,
        a: 255,
    };

    let body_c = hl * 0.2;
    let body_a = hl * 0.8;
    let tail_root = -hl * 0.45;

    let x0 = (vp.x as f32 + (cx - hl - 1.0) * scale).floor() as i32;
    let x1 = (vp.x as f32 + (cx + hl + 1.0) * scale).ceil() as i32;
    let y0 = (vp.y as f32 + (cy - hh - 1.0) * scale).floor() as i32;
    let y1 = (vp.y as f32 + (cy + hh + 1.0) * scale).ceil() as i32;

    for py in y0.max(vp.y)..=y1.min(vp.y + vp.h - 1) {
        for px in x0.max(vp.x)..=x1.min(vp.x + vp.w - 1) {
            let tx = (px - vp.x) as f32 / scale + 0.5 / scale;
            let ty = (py - vp.y) as f32 / scale + 0.5 / scale;
            if !tank.valid_location(tx.floor() as i32, ty.floor() as i32) {
                continue;
            }
            let u = (tx - cx) * dir;
            let v = ty - cy;

            let bu = (u - body_c) / body_a;
            let bv = v / hh.max(1.0);
            if bu * bu + bv * bv <= 1.0 {
                let eu = (u - hl * 0.6) / (hl * 0.12).max(1.0);
                let ev = (v + hh * 0.3) / (hh * 0.2).max(1.0);
                let p = if eu * eu + ev * ev <= 1.0 { eye } else { body };
                canvas.plot(px, py, p);
                continue;
            }

            if u <= tail_root && u >= -hl {
                let spread = (tail_root - u) / (tail_root + hl);
                if v.abs() <= hh * spread {
                    canvas.plot(px, py, body);
                }
            }
        }
    }
}

/// Puts a caret in the cell above the inspected fish.
fn mark_fish(buf: &mut CellBuffer, f: &Fish, vp: Viewport, scale: f32, bg: Color) {
    let top = f.y() - f.navigator().half_height();
    let sx = vp.x as f32 + f.x() as f32 * scale;
    let sy = vp.y as f32 + top as f32 * scale;
    let cx = (sx / SUB_X as f32) as i32;
    let cy = (sy / SUB_Y as f32) as i32 - 1;
    if cx < 0 || cy < 1 || cx >= buf.w as i32 || cy >= buf.h as i32 {
        return;
    }
    let (x, y) = (cx as u16, cy as u16);
    let under = buf.get(x, y);
    let bg = if under.bg == FRAME_BG { FRAME_BG } else { bg };
    buf.set(
        x,
        y,
        Cell {
            ch: '▼',
            fg: Color::Yellow,
            bg,
        },
    );
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: i32, dy: i32) -> u8 {
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    bg_at: impl Fn(u16, u16) -> Color,
) {
    for cy in 0..out.h {
        for cx in 0..out.w {
            let px0 = cx as i32 * SUB_X;
            let py0 = cy as i32 * SUB_Y;

            let mut mask: u8 = 0;
            let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
            let mut ink = 0u32;

            for dy in 0..SUB_Y {
                for dx in 0..SUB_X {
                    let p = canvas.get(px0 + dx, py0 + dy);
                    // alpha is ink
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink += 1;
                    }
                }
            }

            let bg = bg_at(cx, cy);
            if ink == 0 {
                out.set(
                    cx,
                    cy,
                    Cell {
                        ch: ' ',
                        fg: Color::White,
                        bg,
                    },
                );
                continue;
            }
            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            let fg = Color::Rgb {
                r: (sum_r / ink) as u8,
                g: (sum_g / ink) as u8,
                b: (sum_b / ink) as u8,
            };
            out.set(cx, cy, Cell { ch, fg, bg });
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let Ok(i) = u16::try_from(i) else { break };
        let xx = x.saturating_add(i);
        if xx >= buf.w {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}
