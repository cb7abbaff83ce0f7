//! Text-input editing helpers (cursor movement, insertion, deletion).
//!
//! The cursor counts characters; edits translate it to a byte offset so
//! non-ASCII input (accented brand names, for one) stays intact.

use super::App;

impl App {
    fn byte_offset(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn input_chars(&self) -> usize {
        self.input.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub(crate) fn insert_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub(crate) fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.input.remove(at);
    }

    /// Delete the character at the cursor.
    pub(crate) fn delete(&mut self) {
        if self.cursor >= self.input_chars() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.remove(at);
    }

    pub(crate) fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn move_cursor_right(&mut self) {
        if self.cursor < self.input_chars() {
            self.cursor += 1;
        }
    }

    pub(crate) fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn move_cursor_end(&mut self) {
        self.cursor = self.input_chars();
    }

    /// Browse to the previous entry in input history (Up arrow).
    pub(crate) fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        let new_idx = match self.history_index {
            None => {
                self.history_stash = self.input.clone();
                self.input_history.len() - 1
            }
            Some(0) => return,
            Some(i) => i - 1,
        };

        self.history_index = Some(new_idx);
        self.input = self.input_history[new_idx].clone();
        self.cursor = self.input_chars();
    }

    /// Browse to the next entry in input history (Down arrow), or
    /// return to the in-progress input when past the newest entry.
    pub(crate) fn history_next(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };

        if idx + 1 < self.input_history.len() {
            self.history_index = Some(idx + 1);
            self.input = self.input_history[idx + 1].clone();
        } else {
            self.history_index = None;
            self.input = std::mem::take(&mut self.history_stash);
        }
        self.cursor = self.input_chars();
    }
}
