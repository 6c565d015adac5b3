// ============================================================================
// src/wizard/input.rs – Key decoding, list cursor, line buffer
// ============================================================================

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Keys the wizard understands, decoupled from the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Up,
    Down,
    Enter,
    Escape,
    /// Ctrl-C; raw mode swallows SIGINT so it arrives as a key.
    Interrupt,
    Backspace,
    Char(char),
}

impl KeyInput {
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') => Some(KeyInput::Interrupt),
                _ => None,
            };
        }
        match event.code {
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Esc => Some(KeyInput::Escape),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            _ => None,
        }
    }
}

/// Cursor over a fixed-length list; clamps at both ends.
#[derive(Debug, Clone, Default)]
pub struct ListCursor {
    index: usize,
}

impl ListCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn down(&mut self, len: usize) {
        if self.index + 1 < len {
            self.index += 1;
        }
    }
}

/// Single-line text buffer.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    value: String,
}

impl LineInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    /// Hand back the current text and leave the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ctrl_c_as_interrupt() {
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyInput::from_event(ev), Some(KeyInput::Interrupt));

        let plain = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(KeyInput::from_event(plain), Some(KeyInput::Char('c')));
    }

    #[test]
    fn ignores_key_release() {
        let mut ev = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        ev.kind = KeyEventKind::Release;
        assert_eq!(KeyInput::from_event(ev), None);
    }

    #[test]
    fn cursor_clamps() {
        let mut cursor = ListCursor::default();
        cursor.up();
        assert_eq!(cursor.index(), 0);
        cursor.down(2);
        cursor.down(2);
        assert_eq!(cursor.index(), 1);
        cursor.down(0);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn line_input_take_clears() {
        let mut line = LineInput::default();
        for c in "/mnt/datax".chars() {
            line.push(c);
        }
        line.backspace();
        line.push('\u{7}');
        assert_eq!(line.take(), "/mnt/data");
        assert_eq!(line.value(), "");
    }
}
