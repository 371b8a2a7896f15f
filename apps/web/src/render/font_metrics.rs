//! Static Helvetica width table and greedy word-wrap for the letter composer.
//!
//! Widths are in em units (AFM widths / 1000) for ASCII 0x20..=0x7E.
//! Index = (char as usize) - 32. Everything else falls back to an average width,
//! which is close enough for Latin-1 letters and only affects where lines break.

/// Static character-width table for a built-in PDF font.
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for characters outside printable ASCII.
    pub average_char_width: f32,
}

impl FontMetricTable {
    /// Width of one character in em units.
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Width of a string in points at `font_size_pt`.
    #[cfg(test)]
    pub fn width_pt(&self, s: &str, font_size_pt: f32) -> f32 {
        self.measure_str(s) * font_size_pt
    }

    /// Greedy word-wrap of one paragraph into lines no wider than `max_width_pt`.
    ///
    /// Whitespace runs collapse to single spaces. A word wider than a whole line
    /// is broken between characters. An all-whitespace input yields no lines.
    pub fn wrap(&self, text: &str, font_size_pt: f32, max_width_pt: f32) -> Vec<String> {
        let max_em = max_width_pt / font_size_pt;
        let space_em = self.char_width(' ');
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_em = 0.0_f32;

        for word in text.split_whitespace() {
            let word_em = self.measure_str(word);

            if !current.is_empty() && current_em + space_em + word_em <= max_em {
                current.push(' ');
                current.push_str(word);
                current_em += space_em + word_em;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_em = 0.0;
            }

            if word_em <= max_em {
                current.push_str(word);
                current_em = word_em;
            } else {
                // Hard-break an over-long token (URLs, long identifiers)
                for c in word.chars() {
                    let c_em = self.char_width(c);
                    if !current.is_empty() && current_em + c_em > max_em {
                        lines.push(std::mem::take(&mut current));
                        current_em = 0.0;
                    }
                    current.push(c);
                    current_em += c_em;
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

/// Helvetica (PDF base-14), the letter's body font.
pub static HELVETICA: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
};
