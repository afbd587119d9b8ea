use crate::model::PetState;
use crossterm::{
    cursor, execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const SHELL: Color = Color::Rgb {
    r: 236,
    g: 150,
    b: 190,
};
const SCREEN_INK: Color = Color::Rgb {
    r: 20,
    g: 48,
    b: 20,
};
const SCREEN_DITHER: Color = Color::Rgb {
    r: 120,
    g: 160,
    b: 90,
};
const SCREEN_BG: Color = Color::Rgb {
    r: 150,
    g: 190,
    b: 110,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
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
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
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
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Writes the cells that differ from the last frame.
    pub(crate) fn present(&mut self, force: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !force && c == self.prev.cells[i] {
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
                if last_bold != c.bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

fn bar(value: i32, width: usize) -> String {
    let fill = (value.clamp(0, 100) as usize * width + 50) / 100;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

fn draw_box(buf: &mut CellBuffer, x0: u16, y0: u16, w: u16, h: u16, fg: Color, bg: Color) {
    if w < 2 || h < 2 {
        return;
    }
    let cell = |ch| Cell {
        ch,
        fg,
        bg,
        bold: false,
    };
    for x in x0..x0 + w {
        for y in y0..y0 + h {
            buf.set(x, y, cell(' '));
        }
        buf.set(x, y0, cell('─'));
        buf.set(x, y0 + h - 1, cell('─'));
    }
    for y in y0..y0 + h {
        buf.set(x0, y, cell('│'));
        buf.set(x0 + w - 1, y, cell('│'));
    }
    buf.set(x0, y0, cell('╭'));
    buf.set(x0 + w - 1, y0, cell('╮'));
    buf.set(x0, y0 + h - 1, cell('╰'));
    buf.set(x0 + w - 1, y0 + h - 1, cell('╯'));
}

/// The dithered green LCD behind the sprite.
fn draw_screen_background(buf: &mut CellBuffer, x0: u16, y0: u16, w: u16, h: u16) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let ch = if (x + y) % 2 == 0 { '░' } else { ' ' };
            buf.set(
                x,
                y,
                Cell {
                    ch,
                    fg: SCREEN_DITHER,
                    bg: SCREEN_BG,
                    bold: false,
                },
            );
        }
    }
}

const SHELL_W: u16 = 34;
const SHELL_H: u16 = 22;
const SCREEN_W: u16 = 26;
const SCREEN_H: u16 = 11;

/// Shell, LCD with the current sprite, buttons and the read-only stats.
pub(crate) fn draw_pet_screen(buf: &mut CellBuffer, st: &PetState, sprite: &[String], busy: bool) {
    let bg = Color::Black;
    buf.clear(bg);

    if buf.w < SHELL_W || buf.h < SHELL_H {
        draw_text(buf, 0, 0, "Terminal too small for Beannie-tchi", Color::White, bg);
        draw_text(
            buf,
            0,
            1,
            &format!("need {SHELL_W}x{SHELL_H}, q to quit"),
            Color::White,
            bg,
        );
        return;
    }

    let x0 = (buf.w - SHELL_W) / 2;
    let y0 = (buf.h - SHELL_H) / 2;
    draw_box(buf, x0, y0, SHELL_W, SHELL_H, Color::Black, SHELL);

    let title = format!(" {} ", st.name);
    let title_x = x0 + SHELL_W.saturating_sub(title.chars().count() as u16) / 2;
    draw_text(buf, title_x, y0, &title, Color::Black, SHELL);

    let sx = x0 + (SHELL_W - SCREEN_W) / 2;
    let sy = y0 + 2;
    draw_screen_background(buf, sx, sy, SCREEN_W, SCREEN_H);

    let sprite_h = sprite.len() as u16;
    let sprite_w = sprite
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0) as u16;
    let px = sx + SCREEN_W.saturating_sub(sprite_w) / 2;
    let py = sy + SCREEN_H.saturating_sub(sprite_h) / 2;
    for (i, line) in sprite.iter().take(SCREEN_H as usize).enumerate() {
        for (j, ch) in line.chars().take(SCREEN_W as usize).enumerate() {
            if ch == ' ' {
                continue;
            }
            buf.set(
                px + j as u16,
                py + i as u16,
                Cell {
                    ch,
                    fg: SCREEN_INK,
                    bg: SCREEN_BG,
                    bold: true,
                },
            );
        }
    }

    let by = sy + SCREEN_H + 1;
    let button_fg = if busy { Color::DarkGrey } else { Color::Black };
    draw_text(buf, x0 + 5, by, "( F ) Feed", button_fg, SHELL);
    draw_text(buf, x0 + 19, by, "( P ) Play", button_fg, SHELL);

    let hunger = format!("Hunger:    {} {:>3}", bar(st.hunger, 10), st.hunger);
    let happy = format!("Happiness: {} {:>3}", bar(st.happiness, 10), st.happiness);
    draw_text(buf, x0 + 2, by + 2, &hunger, Color::Black, SHELL);
    draw_text(buf, x0 + 2, by + 3, &happy, Color::Black, SHELL);
    draw_text(buf, x0 + 2, by + 5, st.action.label(), Color::DarkGrey, SHELL);

    draw_text(
        buf,
        1,
        buf.h - 1,
        "Keys: f feed | p play | q quit",
        Color::DarkGrey,
        bg,
    );
}
