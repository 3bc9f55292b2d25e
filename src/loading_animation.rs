use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::style::{Color, ResetColor, SetForegroundColor};

/// Spinner shown while a completion request is pending.
pub struct LoadingAnimation {
    message: String,
    is_running: Arc<AtomicBool>,
}

impl LoadingAnimation {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the spinner on a background task
    pub fn start(&self) -> LoadingHandle {
        self.is_running.store(true, Ordering::Relaxed);
        let is_running = Arc::clone(&self.is_running);
        let message = self.message.clone();

        let handle = tokio::spawn(async move {
            let spinner_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let mut frame = 0;

            while is_running.load(Ordering::Relaxed) {
                print!(
                    "\r{}{} {}{}",
                    SetForegroundColor(Color::Cyan),
                    spinner_chars[frame % spinner_chars.len()],
                    message,
                    ResetColor
                );
                io::stdout().flush().ok();

                tokio::time::sleep(Duration::from_millis(100)).await;
                frame += 1;
            }

            // Clear the spinner line
            print!("\r{}\r", " ".repeat(message.len() + 4));
            io::stdout().flush().ok();
        });

        LoadingHandle {
            handle,
            is_running: Arc::clone(&self.is_running),
        }
    }
}

/// Handle for stopping the spinner
pub struct LoadingHandle {
    handle: tokio::task::JoinHandle<()>,
    is_running: Arc<AtomicBool>,
}

impl LoadingHandle {
    /// Stop the spinner and wait for its line to be cleared
    pub async fn stop(self) {
        self.is_running.store(false, Ordering::Relaxed);
        let _ = self.handle.await;
    }
}
