use std::io::{self, Write};

use chrono::Local;
use crossterm::style::{Color, ResetColor, SetForegroundColor};

use crate::message::Message;

/// Formats and displays transcript messages as bordered cards.
///
/// Pure presentation: everything here renders from state snapshots and
/// never touches the conversation itself.
pub struct TranscriptView {
    width: usize,
    assistant_label: String,
}

impl TranscriptView {
    /// Create a new transcript view with default settings
    pub fn new() -> Self {
        Self {
            width: 120, // Default width that fits most terminals
            assistant_label: "Assistant".to_string(),
        }
    }

    /// Set the width of the message cards
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Set the label shown on assistant cards
    pub fn with_assistant_label(mut self, label: &str) -> Self {
        self.assistant_label = label.to_string();
        self
    }

    /// Display one message as a bordered card with a role + time caption
    pub fn display_message(&self, message: &Message) -> io::Result<()> {
        let caption = self.caption(message);
        let color = if message.is_user {
            Color::Cyan
        } else {
            Color::Green
        };

        print!("{}", SetForegroundColor(color));
        self.print_header(&caption)?;
        print!("{}", ResetColor);
        self.print_content(&message.text)?;
        print!("{}", SetForegroundColor(color));
        self.print_footer()?;
        print!("{}", ResetColor);
        println!();
        io::stdout().flush()?;
        Ok(())
    }

    /// Display an error banner below the transcript
    pub fn display_error(&self, error: &str) -> io::Result<()> {
        println!(
            "{}✗ {}{}",
            SetForegroundColor(Color::Red),
            error,
            ResetColor
        );
        println!(
            "{}Your message is kept; send again to retry.{}",
            SetForegroundColor(Color::DarkGrey),
            ResetColor
        );
        println!();
        io::stdout().flush()?;
        Ok(())
    }

    /// Role label plus localized hour:minute, e.g. "You 14:32".
    fn caption(&self, message: &Message) -> String {
        let speaker = if message.is_user {
            "You"
        } else {
            &self.assistant_label
        };
        let local_time = message.timestamp.with_timezone(&Local);
        format!("{} {}", speaker, local_time.format("%H:%M"))
    }

    /// Print the top border with the caption
    fn print_header(&self, title: &str) -> io::Result<()> {
        let title_with_spaces = format!(" {} ", title);
        let title_len = title_with_spaces.len();

        let remaining_width = self.width.saturating_sub(2); // Account for corner characters
        let left_padding = (remaining_width.saturating_sub(title_len)) / 2;
        let right_padding = remaining_width
            .saturating_sub(title_len)
            .saturating_sub(left_padding);

        print!("╭");
        print!("{}", "─".repeat(left_padding));
        print!("{}", title_with_spaces);
        print!("{}", "─".repeat(right_padding));
        println!("╮");

        Ok(())
    }

    /// Print the bottom border
    fn print_footer(&self) -> io::Result<()> {
        print!("╰");
        print!("{}", "─".repeat(self.width.saturating_sub(2)));
        println!("╯");
        Ok(())
    }

    /// Print content with proper word wrapping and borders
    fn print_content(&self, content: &str) -> io::Result<()> {
        let content_width = self.width.saturating_sub(4); // Account for "│ " on both sides

        for line in content.lines() {
            if line.is_empty() {
                println!("│{}│", " ".repeat(self.width.saturating_sub(2)));
                continue;
            }

            let wrapped_lines = self.wrap_text(line, content_width);
            for wrapped_line in wrapped_lines {
                let padding = content_width.saturating_sub(wrapped_line.len());
                println!("│ {}{} │", wrapped_line, " ".repeat(padding));
            }
        }
        Ok(())
    }

    /// Wrap text to fit within the specified width
    fn wrap_text(&self, text: &str, width: usize) -> Vec<String> {
        if text.len() <= width {
            return vec![text.to_string()];
        }

        let mut lines = Vec::new();
        let mut current_line = String::new();

        for word in text.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + 1 + word.len() <= width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }

        lines
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}
