use std::{env, fs, io};

use anyhow::{Context, Result};
use crossterm::{
    cursor, execute,
    terminal::{self, ClearType},
};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use parley::loading_animation::LoadingAnimation;
use parley::prompt_input::PromptInput;
use parley::transcript::TranscriptView;
use parley::{AnyCompletionClient, ChatController, CompletionClient, ConversationState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let client = build_client()?;
    let client_name = client.client_name().to_string();

    let controller = ChatController::new(client);
    let mut transitions = controller.subscribe();

    let transcript = TranscriptView::new().with_assistant_label(&client_name);
    let prompt_input = PromptInput::new().with_width(120);

    print_welcome(&client_name)?;

    loop {
        let Some(input) = prompt_input.get_input()? else {
            break;
        };

        match input.trim() {
            "" => continue,
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye!");
                break;
            }
            "/help" | "/h" => {
                print_help();
                continue;
            }
            "/clear" | "/cls" => {
                controller.clear_chat();
                while transitions.try_recv().is_ok() {}
                print_welcome(&client_name)?;
                continue;
            }
            _ => {}
        }

        // Commands are matched on the trimmed text, but the message itself
        // goes out verbatim.
        controller.send_message(&input);

        // The pending transition is published before send_message returns;
        // its history tail is the user's own message.
        if let Some(state) = transitions.recv().await {
            if let Some(message) = state.history().last() {
                transcript.display_message(message)?;
            }
        }

        let loading = LoadingAnimation::new("Thinking...");
        let loading_handle = loading.start();
        let resolved = transitions.recv().await;
        loading_handle.stop().await;

        match resolved {
            Some(ConversationState::Settled { history }) => {
                if let Some(message) = history.last() {
                    transcript.display_message(message)?;
                }
            }
            Some(ConversationState::Failed { error, .. }) => {
                transcript.display_error(&error)?;
            }
            _ => break,
        }
    }

    Ok(())
}

/// Pick and configure the completion backend from the environment.
///
/// `MOCK_LLM=1` selects the offline mock; otherwise `GEMINI_API_KEY` is
/// required, with optional `GEMINI_MODEL` and `GEMINI_BASE_URL` overrides.
/// A `system_prompt.md` next to the binary is loaded when present.
fn build_client() -> Result<AnyCompletionClient> {
    if env::var("MOCK_LLM").is_ok() {
        return Ok(AnyCompletionClient::new_mock());
    }

    let api_key = env::var("GEMINI_API_KEY").context(
        "GEMINI_API_KEY environment variable not set. Copy .env.example to .env and set your API key, or run with MOCK_LLM=1.",
    )?;
    let model =
        env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string());

    let mut gemini = parley::gemini::GeminiClient::new(api_key, model);

    if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
        gemini = gemini.with_base_url(base_url);
    }

    match fs::read_to_string("system_prompt.md") {
        Ok(system_prompt) => {
            gemini = gemini.with_system_prompt(&system_prompt);
            println!("System prompt loaded from system_prompt.md");
        }
        Err(_) => {
            println!("No system_prompt.md found, continuing without system prompt");
        }
    }

    Ok(AnyCompletionClient::Gemini(gemini))
}

fn print_welcome(client_name: &str) -> Result<()> {
    execute!(
        io::stdout(),
        terminal::Clear(ClearType::All),
        cursor::MoveTo(0, 0)
    )?;
    println!("Parley Chat ({})", client_name);
    println!("====================");
    println!("Type a message to start, or /help for commands.");
    println!();
    Ok(())
}

fn print_help() {
    println!("Parley Chat - Help");
    println!("==================");
    println!("Commands:");
    println!("  /help    - Show this help");
    println!("  /clear   - Clear the screen and the conversation");
    println!("  /quit    - Exit the chat");
    println!();
    println!("A failed exchange keeps your message in the transcript;");
    println!("just send again to retry.");
    println!();
}
