use super::canvas::{Canvas, ColorMode, color_to_fg};
use crossterm::style::Color;

fn color_to_bg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("48;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("48;5;{}", v),
        // Basic colors: background code is the foreground code + 10
        other => match color_to_fg(other).parse::<u8>() {
            Ok(code) => (code + 10).to_string(),
            Err(_) => "40".into(),
        },
    }
}

/// Pixel brightness below which a half is treated as empty background.
/// Colors are scaled by brightness, so near-black pixels stay dark anyway.
const DARK_THRESHOLD: f64 = 0.02;

/// Tracks the active SGR state so unchanged colors are not re-emitted.
#[derive(Default)]
struct Sgr {
    fg: String,
    bg: String,
    active: bool,
}

impl Sgr {
    fn set(&mut self, out: &mut String, fg: String, bg: Option<String>) {
        let mut params = Vec::with_capacity(2);
        if fg != self.fg {
            params.push(fg.clone());
            self.fg = fg;
        }
        match bg {
            Some(bg) if bg != self.bg => {
                params.push(bg.clone());
                self.bg = bg;
            }
            None if !self.bg.is_empty() => {
                params.push("49".into());
                self.bg.clear();
            }
            _ => {}
        }
        if !params.is_empty() {
            out.push_str("\x1b[");
            out.push_str(&params.join(";"));
            out.push('m');
        }
        self.active = true;
    }

    fn reset(&mut self, out: &mut String) {
        if self.active {
            out.push_str("\x1b[0m");
        }
        *self = Sgr::default();
    }
}

pub fn render(canvas: &Canvas) -> String {
    let term_cols = canvas.width;
    let term_rows = canvas.height / 2;
    let mut out = String::with_capacity(term_cols * term_rows * 10);
    let mut sgr = Sgr::default();

    let shaded = |idx: usize| -> Color {
        let v = canvas.pixels[idx].clamp(0.0, 1.0);
        let (r, g, b) = canvas.colors[idx];
        let scale = |c: u8| (c as f64 * v) as u8;
        canvas.map_color(scale(r), scale(g), scale(b))
    };

    for row in 0..term_rows {
        for col in 0..term_cols {
            let top = row * 2 * canvas.width + col;
            let bot = top + canvas.width;
            let top_lit = canvas.pixels[top] >= DARK_THRESHOLD;
            let bot_lit = canvas.pixels[bot] >= DARK_THRESHOLD;

            if canvas.color_mode == ColorMode::Mono {
                out.push(match (top_lit, bot_lit) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
                continue;
            }

            match (top_lit, bot_lit) {
                (false, false) => {
                    sgr.reset(&mut out);
                    out.push(' ');
                }
                (true, false) => {
                    sgr.set(&mut out, color_to_fg(shaded(top)), None);
                    out.push('▀');
                }
                (false, true) => {
                    sgr.set(&mut out, color_to_fg(shaded(bot)), None);
                    out.push('▄');
                }
                (true, true) => {
                    let fg = color_to_fg(shaded(top));
                    let bg = color_to_bg(shaded(bot));
                    sgr.set(&mut out, fg, Some(bg));
                    out.push('▀');
                }
            }
        }
        sgr.reset(&mut out);
        out.push_str(&format!("\x1b[{};1H", row + 2));
    }
    out
}
