use super::canvas::{Canvas, ColorMode, color_to_fg};

/// Braille dot positions within a 2x4 cell, with their bit and a Bayer
/// threshold so faint gradients become sparse dot patterns instead of
/// vanishing:
/// (0,0) (1,0)    dot1 dot4
/// (0,1) (1,1)    dot2 dot5
/// (0,2) (1,2)    dot3 dot6
/// (0,3) (1,3)    dot7 dot8
const BRAILLE_OFFSET: u32 = 0x2800;
const DOTS: [(usize, usize, u32, f64); 8] = [
    (0, 0, 0x01, 0.0625),
    (0, 1, 0x02, 0.5625),
    (0, 2, 0x04, 0.1875),
    (1, 0, 0x08, 0.6875),
    (1, 1, 0x10, 0.3125),
    (1, 2, 0x20, 0.8125),
    (0, 3, 0x40, 0.9375),
    (1, 3, 0x80, 0.4375),
];

/// Brightness below which a pixel never lights a dot.
const FLOOR: f64 = 0.04;

pub fn render(canvas: &Canvas) -> String {
    let term_cols = canvas.width / 2;
    let term_rows = canvas.height / 4;
    let mut out = String::with_capacity(term_cols * term_rows * 20);
    let use_color = canvas.color_mode != ColorMode::Mono;

    for row in 0..term_rows {
        let mut last_fg = String::new();
        for col in 0..term_cols {
            let mut bits: u32 = 0;
            let mut sum = (0.0, 0.0, 0.0);
            let mut weight = 0.0;

            for &(dx, dy, bit, threshold) in &DOTS {
                let x = col * 2 + dx;
                let y = row * 4 + dy;
                let idx = y * canvas.width + x;
                let v = canvas.pixels[idx].clamp(0.0, 1.0);
                if v > FLOOR && v >= threshold * 0.8 {
                    bits |= bit;
                    let (r, g, b) = canvas.colors[idx];
                    sum.0 += r as f64 * v;
                    sum.1 += g as f64 * v;
                    sum.2 += b as f64 * v;
                    weight += v;
                }
            }

            let ch = char::from_u32(BRAILLE_OFFSET + bits).unwrap_or(' ');
            if use_color && bits != 0 {
                let color = canvas.map_color(
                    (sum.0 / weight) as u8,
                    (sum.1 / weight) as u8,
                    (sum.2 / weight) as u8,
                );
                let fg = color_to_fg(color);
                if fg != last_fg {
                    out.push_str(&format!("\x1b[{}m", fg));
                    last_fg = fg;
                }
            }
            out.push(ch);
        }
        if use_color {
            out.push_str("\x1b[0m");
        }
        // Cursor movement instead of \n avoids blank line issues
        out.push_str(&format!("\x1b[{};1H", row + 2));
    }
    out
}
