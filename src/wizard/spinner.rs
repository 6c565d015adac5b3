// ============================================================================
// src/wizard/spinner.rs – Cyclic progress glyphs
// ============================================================================

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Default)]
pub struct Spinner {
    index: usize,
}

impl Spinner {
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % FRAMES.len();
    }

    pub fn current(&self) -> &'static str {
        FRAMES[self.index]
    }

    #[cfg(test)]
    pub fn frame(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_last_glyph() {
        let mut spinner = Spinner::default();
        assert_eq!(spinner.current(), "⠋");
        for _ in 0..FRAMES.len() - 1 {
            spinner.advance();
        }
        assert_eq!(spinner.current(), "⠏");
        spinner.advance();
        assert_eq!(spinner.frame(), 0);
        assert_eq!(spinner.current(), "⠋");
    }
}
