use std::io::{self, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};

/// Bordered single-line input box, drawn in place below the transcript.
pub struct PromptInput {
    width: usize,
    prompt_text: String,
}

impl PromptInput {
    pub fn new() -> Self {
        Self {
            width: 120,
            prompt_text: "> ".to_string(),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt_text = prompt.to_string();
        self
    }

    /// Read one line of input. Returns `None` when the user hits
    /// Ctrl+C or Ctrl+D.
    pub fn get_input(&self) -> io::Result<Option<String>> {
        terminal::enable_raw_mode()?;
        let result = self.edit_loop();
        terminal::disable_raw_mode()?;
        result
    }

    fn edit_loop(&self) -> io::Result<Option<String>> {
        let mut input = String::new();
        let mut cursor_pos = 0;
        let mut first_draw = true;

        loop {
            if !first_draw {
                // Back to the anchor row of the box before redrawing.
                execute!(io::stdout(), cursor::MoveUp(1))?;
            }
            first_draw = false;
            self.draw_input_box(&input, cursor_pos)?;

            if let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = event::read()?
            {
                match (code, modifiers) {
                    (KeyCode::Char('c'), KeyModifiers::CONTROL)
                    | (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                        self.leave_box()?;
                        return Ok(None);
                    }
                    (KeyCode::Enter, KeyModifiers::NONE) => {
                        self.leave_box()?;
                        return Ok(Some(input));
                    }
                    (KeyCode::Char(c), KeyModifiers::NONE)
                    | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
                        input.insert(cursor_pos, c);
                        cursor_pos += 1;
                    }
                    (KeyCode::Backspace, KeyModifiers::NONE) => {
                        if cursor_pos > 0 {
                            cursor_pos -= 1;
                            input.remove(cursor_pos);
                        }
                    }
                    (KeyCode::Delete, KeyModifiers::NONE) => {
                        if cursor_pos < input.len() {
                            input.remove(cursor_pos);
                        }
                    }
                    (KeyCode::Left, KeyModifiers::NONE) => {
                        cursor_pos = cursor_pos.saturating_sub(1);
                    }
                    (KeyCode::Right, KeyModifiers::NONE) => {
                        if cursor_pos < input.len() {
                            cursor_pos += 1;
                        }
                    }
                    (KeyCode::Home, KeyModifiers::NONE) => {
                        cursor_pos = 0;
                    }
                    (KeyCode::End, KeyModifiers::NONE) => {
                        cursor_pos = input.len();
                    }
                    (KeyCode::Esc, KeyModifiers::NONE) => {
                        input.clear();
                        cursor_pos = 0;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Draw the box and the hint line, leaving the terminal cursor parked
    /// at the edit position inside the box.
    fn draw_input_box(&self, input: &str, cursor_pos: usize) -> io::Result<()> {
        let mut stdout = io::stdout();
        let content_width = self.width.saturating_sub(4);
        let display_len = (self.prompt_text.len() + input.len()).min(content_width);
        let padding = content_width.saturating_sub(display_len);

        execute!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::FromCursorDown),
            Print("╭"),
            Print("─".repeat(self.width.saturating_sub(2))),
            Print("╮\r\n"),
            Print("│ "),
            SetForegroundColor(Color::Cyan),
            Print(&self.prompt_text),
            ResetColor,
            Print(input),
            Print(" ".repeat(padding)),
            Print(" │\r\n"),
            Print("╰"),
            Print("─".repeat(self.width.saturating_sub(2))),
            Print("╯\r\n"),
            SetForegroundColor(Color::DarkGrey),
            Print("Enter to send, Esc to clear input. Type \"/\" for commands."),
            ResetColor,
        )?;

        let visual_cursor_pos = (2 + self.prompt_text.len() + cursor_pos) as u16;
        execute!(
            stdout,
            cursor::MoveUp(2),
            cursor::MoveToColumn(visual_cursor_pos)
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Erase the box and hint so the caller's next card replaces them.
    fn leave_box(&self) -> io::Result<()> {
        execute!(
            io::stdout(),
            cursor::MoveUp(1),
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::FromCursorDown)
        )
    }
}

impl Default for PromptInput {
    fn default() -> Self {
        Self::new()
    }
}
