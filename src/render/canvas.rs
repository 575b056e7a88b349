use crossterm::style::Color;
use serde::Deserialize;

/// How sub-cell pixels become terminal characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Unicode braille characters (2x4 per cell = highest resolution)
    Braille,
    /// Half-block characters ▀▄█ (1x2 per cell)
    HalfBlock,
    /// Plain ASCII characters with density mapping
    Ascii,
}

impl RenderMode {
    /// Pixel height divided by pixel width, assuming cells twice as tall as wide.
    pub fn pixel_aspect(self) -> f64 {
        match self {
            RenderMode::Braille | RenderMode::HalfBlock => 1.0,
            RenderMode::Ascii => 2.0,
        }
    }
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// No color, monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit true color (RGB)
    TrueColor,
}

/// A pixel-level canvas that gets rendered to terminal characters.
/// Coordinates are in "sub-cell" pixel space.
pub struct Canvas {
    /// Width in pixels (sub-cell)
    pub width: usize,
    /// Height in pixels (sub-cell)
    pub height: usize,
    /// Pixel data: brightness 0.0..=1.0
    pub pixels: Vec<f64>,
    /// Per-pixel color, scaled by brightness on output
    pub colors: Vec<(u8, u8, u8)>,
    pub render_mode: RenderMode,
    pub color_mode: ColorMode,
    /// Color quantization step (0 = off, 4/8/16 = round RGB to nearest N).
    pub color_quant: u8,
}

impl Canvas {
    pub fn new(
        term_cols: usize,
        term_rows: usize,
        render_mode: RenderMode,
        color_mode: ColorMode,
    ) -> Self {
        let (px_w, px_h) = match render_mode {
            RenderMode::Braille => (term_cols * 2, term_rows * 4),
            RenderMode::HalfBlock => (term_cols, term_rows * 2),
            RenderMode::Ascii => (term_cols, term_rows),
        };
        let size = px_w * px_h;
        Canvas {
            width: px_w,
            height: px_h,
            pixels: vec![0.0; size],
            colors: vec![(0, 0, 0); size],
            render_mode,
            color_mode,
            color_quant: 0,
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0.0);
        self.colors.fill((0, 0, 0));
    }

    /// Set a pixel with color
    #[inline]
    pub fn set_colored(&mut self, x: usize, y: usize, brightness: f64, r: u8, g: u8, b: u8) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            self.pixels[idx] = brightness;
            self.colors[idx] = (r, g, b);
        }
    }

    /// Linear RGB currently stored at a pixel (color scaled by brightness).
    pub fn light_at(&self, x: usize, y: usize) -> (f64, f64, f64) {
        if x >= self.width || y >= self.height {
            return (0.0, 0.0, 0.0);
        }
        let idx = y * self.width + x;
        let v = self.pixels[idx].clamp(0.0, 1.0) / 255.0;
        let (r, g, b) = self.colors[idx];
        (r as f64 * v, g as f64 * v, b as f64 * v)
    }

    /// Additively blend linear RGB light onto a pixel, saturating at white.
    pub fn add_light(&mut self, x: usize, y: usize, light: (f64, f64, f64)) {
        if x >= self.width || y >= self.height || light.0.max(light.1).max(light.2) <= 0.0 {
            return;
        }
        let (r0, g0, b0) = self.light_at(x, y);
        let r = (r0 + light.0).clamp(0.0, 1.0);
        let g = (g0 + light.1).clamp(0.0, 1.0);
        let b = (b0 + light.2).clamp(0.0, 1.0);
        let peak = r.max(g).max(b);
        if peak <= 0.0 {
            return;
        }
        let idx = y * self.width + x;
        self.pixels[idx] = peak;
        self.colors[idx] = (
            (r / peak * 255.0).round() as u8,
            (g / peak * 255.0).round() as u8,
            (b / peak * 255.0).round() as u8,
        );
    }

    /// Terminal dimensions needed for this canvas
    pub fn term_size(&self) -> (usize, usize) {
        match self.render_mode {
            RenderMode::Braille => (self.width / 2, self.height / 4),
            RenderMode::HalfBlock => (self.width, self.height / 2),
            RenderMode::Ascii => (self.width, self.height),
        }
    }

    /// Render the canvas to a string buffer for output
    pub fn render(&self) -> String {
        match self.render_mode {
            RenderMode::Braille => super::braille::render(self),
            RenderMode::HalfBlock => super::halfblock::render(self),
            RenderMode::Ascii => self.render_ascii(),
        }
    }

    fn render_ascii(&self) -> String {
        const RAMP: &[u8] = b" .'`:;+*o#@";
        let (cols, rows) = self.term_size();
        let mut out = String::with_capacity(cols * rows * 10);
        let use_color = self.color_mode != ColorMode::Mono;
        let mut last_fg = String::new();

        for row in 0..rows {
            for col in 0..cols {
                let idx = row * self.width + col;
                let v = self.pixels[idx].clamp(0.0, 1.0);
                let ch = RAMP[(v * (RAMP.len() - 1) as f64).round() as usize] as char;

                if use_color && ch != ' ' {
                    let (r, g, b) = self.colors[idx];
                    let fg = color_to_fg(self.map_color(r, g, b));
                    if fg != last_fg {
                        out.push_str("\x1b[");
                        out.push_str(&fg);
                        out.push('m');
                        last_fg = fg;
                    }
                }
                out.push(ch);
            }
            out.push_str("\x1b[0m");
            out.push_str(&format!("\x1b[{};1H", row + 2));
            last_fg.clear();
        }
        out
    }

    pub fn map_color(&self, r: u8, g: u8, b: u8) -> Color {
        let (r, g, b) = if self.color_quant > 1 {
            let q = self.color_quant as u16;
            let quant = |c: u8| ((c as u16 + q / 2) / q * q).min(255) as u8;
            (quant(r), quant(g), quant(b))
        } else {
            (r, g, b)
        };
        match self.color_mode {
            ColorMode::Mono => Color::White,
            ColorMode::TrueColor => Color::Rgb { r, g, b },
            ColorMode::Ansi256 => {
                // 6x6x6 color cube
                let idx = 16 + (36 * (r as u16 / 51)) + (6 * (g as u16 / 51)) + (b as u16 / 51);
                Color::AnsiValue(idx as u8)
            }
            ColorMode::Ansi16 => {
                let brightness = (r as u16 + g as u16 + b as u16) / 3;
                let bright = brightness > 150;
                if brightness < 40 {
                    Color::Black
                } else if r > g && r > b {
                    // The disk is mostly red-orange; keep orange distinct from red.
                    if g as u16 * 2 > r as u16 {
                        if bright { Color::Yellow } else { Color::DarkYellow }
                    } else if bright {
                        Color::Red
                    } else {
                        Color::DarkRed
                    }
                } else if g > r && g > b {
                    if bright { Color::Green } else { Color::DarkGreen }
                } else if b > r && b > g {
                    if bright { Color::Cyan } else { Color::DarkBlue }
                } else if bright {
                    Color::White
                } else {
                    Color::Grey
                }
            }
        }
    }
}

pub fn color_to_fg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("38;5;{}", v),
        Color::Black => "30".into(),
        Color::DarkRed => "31".into(),
        Color::DarkGreen => "32".into(),
        Color::DarkYellow => "33".into(),
        Color::DarkBlue => "34".into(),
        Color::DarkMagenta => "35".into(),
        Color::DarkCyan => "36".into(),
        Color::Grey => "37".into(),
        Color::DarkGrey => "90".into(),
        Color::Red => "91".into(),
        Color::Green => "92".into(),
        Color::Yellow => "93".into(),
        Color::Blue => "94".into(),
        Color::Magenta => "95".into(),
        Color::Cyan => "96".into(),
        Color::White => "97".into(),
        _ => "37".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_dimensions_follow_render_mode() {
        let c = Canvas::new(40, 10, RenderMode::Braille, ColorMode::Mono);
        assert_eq!((c.width, c.height), (80, 40));
        assert_eq!(c.term_size(), (40, 10));
        let c = Canvas::new(40, 10, RenderMode::HalfBlock, ColorMode::Mono);
        assert_eq!((c.width, c.height), (40, 20));
    }

    #[test]
    fn additive_light_accumulates_and_saturates() {
        let mut c = Canvas::new(4, 4, RenderMode::Ascii, ColorMode::TrueColor);
        c.add_light(1, 1, (0.4, 0.2, 0.0));
        c.add_light(1, 1, (0.4, 0.2, 0.0));
        let (r, g, b) = c.light_at(1, 1);
        assert!((r - 0.8).abs() < 0.01);
        assert!((g - 0.4).abs() < 0.01);
        assert_eq!(b, 0.0);

        c.add_light(1, 1, (5.0, 0.0, 0.0));
        assert_eq!(c.pixels[5], 1.0);
        assert_eq!(c.colors[5].0, 255);
    }

    #[test]
    fn black_light_leaves_pixel_untouched() {
        let mut c = Canvas::new(4, 4, RenderMode::Ascii, ColorMode::TrueColor);
        c.set_colored(0, 0, 0.5, 10, 20, 30);
        c.add_light(0, 0, (0.0, 0.0, 0.0));
        assert_eq!(c.pixels[0], 0.5);
        assert_eq!(c.colors[0], (10, 20, 30));
        c.add_light(9, 9, (1.0, 1.0, 1.0));
    }

    #[test]
    fn quantization_rounds_channels() {
        let mut c = Canvas::new(1, 1, RenderMode::Ascii, ColorMode::TrueColor);
        c.color_quant = 16;
        assert_eq!(c.map_color(250, 7, 9), Color::Rgb { r: 255, g: 0, b: 16 });
    }
}
