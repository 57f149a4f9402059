use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

// Line editor state behind the search prompt.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        trace!("Inputter read: {key:?}");
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (kc, km) => self.key(kc, km),
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let byte_pos = self.getbytepos();
            self.current_input.remove(byte_pos);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn key(&mut self, code: KeyCode, _modifier: KeyModifiers) -> InputResult {
        if let Some(chr) = code.as_char() {
            let byte_pos = self.getbytepos();
            self.current_input.insert(byte_pos, chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    // Curser position is in chars, String edits want bytes.
    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(inputter: &mut Inputter, s: &str) -> InputResult {
        let mut last = inputter.get();
        for c in s.chars() {
            last = inputter.read(KeyCode::Char(c).into());
        }
        last
    }

    #[test]
    fn collects_typed_characters() {
        let mut inputter = Inputter::default();
        let result = type_str(&mut inputter, "alien");
        assert_eq!(result.input, "alien");
        assert_eq!(result.curser_pos, 5);
        assert!(!result.finished);
    }

    #[test]
    fn backspace_removes_before_the_curser() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "abc");
        inputter.read(KeyCode::Left.into());
        let result = inputter.read(KeyCode::Backspace.into());
        assert_eq!(result.input, "ac");
        assert_eq!(result.curser_pos, 1);
    }

    #[test]
    fn insert_in_the_middle() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "amlie");
        inputter.read(KeyCode::Left.into());
        inputter.read(KeyCode::Left.into());
        inputter.read(KeyCode::Left.into());
        let result = inputter.read(KeyCode::Char('é').into());
        assert_eq!(result.input, "amélie");
    }

    #[test]
    fn escape_cancels_and_clears() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "xyz");
        let result = inputter.read(KeyCode::Esc.into());
        assert!(result.canceled);
        assert!(result.finished);
        assert_eq!(result.input, "");
    }

    #[test]
    fn enter_finishes_and_keeps_the_input() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "god");
        let result = inputter.read(KeyCode::Enter.into());
        assert!(result.finished);
        assert!(!result.canceled);
        assert_eq!(result.input, "god");
    }
}
