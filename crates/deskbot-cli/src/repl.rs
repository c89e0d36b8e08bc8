//! Interactive chat REPL
//!
//! Reedline-based loop with slash commands and completion. Also hosts the
//! non-interactive one-shot mode used by `--execute`.

use std::sync::Arc;

use deskbot_core::conversation::ERROR_MARKER;
use deskbot_core::{Config, ConversationController, Gateway, Reply, SessionStore, Speaker, Turn, UiConfig};
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, Reedline, ReedlineEvent, ReedlineMenu, Signal, Suggestion,
};

type Controller = ConversationController<Box<dyn SessionStore>>;

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show available commands"),
    ("/exit", "Quit the program"),
    ("/quit", "Quit the program"),
    ("/clear", "Clear the local transcript"),
    ("/new", "Start a new session (fresh id, empty transcript)"),
    ("/reset", "Clear the backend history for this session"),
    ("/health", "Show backend health"),
    ("/history", "Print the transcript"),
    ("/session", "Show the current session id"),
    ("/prompts", "List quick prompts"),
    ("/prompt", "Send quick prompt <n>"),
];

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if !line.starts_with('/') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

/// Custom prompt with colored styling
struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Owned(self.style.paint("> ").to_string())
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_indicator(
        &self,
        _prompt_mode: reedline::PromptEditMode,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }
}

/// Run the interactive REPL
pub async fn run_repl(
    mut controller: Controller,
    gateway: Arc<dyn Gateway>,
    config: &Config,
) -> anyhow::Result<()> {
    print_welcome(&config.ui, &health_badge(gateway.as_ref()).await);

    // Setup keybindings
    let mut keybindings = default_keybindings();

    // Trigger completion on '/' key
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = ColoredPrompt::new();

    loop {
        let signal = line_editor.read_line(&prompt);

        match signal {
            Ok(Signal::Success(line)) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }

                if handle_command(input, &mut controller, gateway.as_ref(), &config.ui).await {
                    continue;
                }

                send_message(&mut controller, input).await;
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("\nGoodbye!\n");
                break;
            }
            Err(err) => {
                eprintln!("\n{ERROR_MARKER} Error: {err}\n");
                break;
            }
        }
    }

    Ok(())
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    // Tab key triggers completion
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('c'),
        ReedlineEvent::CtrlC,
    );
    keybindings.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('d'),
        ReedlineEvent::CtrlD,
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings
}

/// Submit one chat message and print the settled reply
async fn send_message(controller: &mut Controller, text: &str) {
    match controller.submit(text).await {
        Ok(true) => {
            if let Some(turn) = controller.turns().last() {
                if let Reply::Settled(reply) = &turn.reply {
                    println!("\n{reply}\n");
                }
            }
        }
        Ok(false) => {}
        Err(e) => eprintln!("\n{ERROR_MARKER} Error: {e}\n"),
    }
}

/// Handle slash commands; returns true when the input was consumed
async fn handle_command(
    input: &str,
    controller: &mut Controller,
    gateway: &dyn Gateway,
    ui: &UiConfig,
) -> bool {
    let lower = input.to_lowercase();

    match lower.as_str() {
        "/exit" | "/quit" | "/q" => {
            println!("\nGoodbye!\n");
            std::process::exit(0);
        }
        "/clear" => {
            controller.clear_local();
            println!("\n✅ Local transcript cleared.\n");
            true
        }
        "/new" => {
            match controller.start_new_session() {
                Ok(id) => println!("\n✅ New session started: {id}\n"),
                Err(e) => eprintln!("\n{ERROR_MARKER} Error: {e}\n"),
            }
            true
        }
        "/reset" => {
            match controller.reset_backend().await {
                Ok(()) => {
                    if let Some(turn) = controller.turns().last() {
                        if let Reply::Settled(note) = &turn.reply {
                            println!("\n{note}\n");
                        }
                    }
                }
                Err(e) => eprintln!("\n{ERROR_MARKER} Error: {e}\n"),
            }
            true
        }
        "/health" => {
            println!("\n{}\n", health_badge(gateway).await);
            true
        }
        "/help" | "/?" => {
            print_help();
            true
        }
        "/history" => {
            print_history(controller.turns());
            true
        }
        "/session" => {
            match controller.session_id() {
                Ok(id) => println!("\nSession: {id}\n"),
                Err(e) => eprintln!("\n{ERROR_MARKER} Error: {e}\n"),
            }
            true
        }
        "/prompts" => {
            print_prompts(ui);
            true
        }
        "/prompt" => {
            eprintln!(
                "\n{ERROR_MARKER} Usage: /prompt <1-{}>\n",
                ui.quick_prompts.len()
            );
            true
        }
        _ if lower.starts_with("/prompt ") => {
            match parse_prompt_index(input, ui.quick_prompts.len()) {
                Some(index) => {
                    let text = ui.quick_prompts[index].clone();
                    println!("> {text}");
                    send_message(controller, &text).await;
                }
                None => eprintln!(
                    "\n{ERROR_MARKER} Usage: /prompt <1-{}>\n",
                    ui.quick_prompts.len()
                ),
            }
            true
        }
        _ if lower.starts_with('/') => {
            eprintln!("\nUnknown command: {input}. See /help for the command list.\n");
            true
        }
        _ => false,
    }
}

/// Parse the 1-based quick prompt index from "/prompt <n>"
fn parse_prompt_index(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.strip_prefix("/prompt ")?.trim().parse().ok()?;
    if n >= 1 && n <= count { Some(n - 1) } else { None }
}

/// One-line backend health summary
pub async fn health_badge(gateway: &dyn Gateway) -> String {
    match gateway.health().await {
        Ok(report) => report.badge(),
        Err(_) => "Backend: unavailable".to_string(),
    }
}

/// Print welcome banner
fn print_welcome(ui: &UiConfig, badge: &str) {
    println!();
    println!("{}", Color::Cyan.bold().paint(&ui.title));
    println!("{}", ui.greeting);
    println!("{badge}");
    println!();
    println!("Type a message and press Enter to chat.");
    println!("Commands: /help, /prompts, /new, /reset, /exit");
    println!();
}

/// Print help message
fn print_help() {
    println!();
    println!("Available commands:");
    for (cmd, desc) in COMMANDS {
        println!("  {cmd:<10} {desc}");
    }
    println!();
    println!("Typing / shows command suggestions; Tab completes.");
    println!();
}

/// Print the quick prompt list
fn print_prompts(ui: &UiConfig) {
    println!();
    println!("Quick prompts (send with /prompt <n>):");
    for (i, prompt) in ui.quick_prompts.iter().enumerate() {
        println!("  {}. {}", i + 1, prompt);
    }
    println!();
}

/// Print the transcript
fn print_history(turns: &[Turn]) {
    println!();
    println!("Transcript ({} turns):", turns.len());
    println!("{}", "─".repeat(50));

    for turn in turns {
        match turn.speaker {
            Speaker::User => {
                println!("You: {}", turn.user_text);
                match &turn.reply {
                    Reply::Pending => println!("Bot: ..."),
                    Reply::Settled(text) => println!("Bot: {text}"),
                }
            }
            Speaker::System => {
                println!("{} {}", turn.user_text, turn.reply.text().unwrap_or(""));
            }
        }
    }

    println!("{}", "─".repeat(50));
    println!();
}

/// Non-interactive mode: send one message and print the reply.
///
/// Exits with status 1 when the send settles with a failure.
pub async fn run_execute(mut controller: Controller, text: &str) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        eprintln!("Error: message is empty");
        std::process::exit(1);
    }

    if !controller.submit(text).await? {
        eprintln!("Error: message was not sent");
        std::process::exit(1);
    }

    let reply = controller
        .turns()
        .last()
        .and_then(|turn| turn.reply.text())
        .unwrap_or_default()
        .to_string();

    println!("{reply}");

    if reply.starts_with(ERROR_MARKER) {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completer_matches_prefix() {
        let mut completer = CommandCompleter::new();
        let suggestions = completer.complete("/he", 3);

        let values: Vec<_> = suggestions.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["/help", "/health"]);
    }

    #[test]
    fn test_completer_ignores_plain_text() {
        let mut completer = CommandCompleter::new();
        assert!(completer.complete("hello", 5).is_empty());
    }

    #[test]
    fn test_parse_prompt_index() {
        assert_eq!(parse_prompt_index("/prompt 1", 4), Some(0));
        assert_eq!(parse_prompt_index("/prompt 4", 4), Some(3));
        assert_eq!(parse_prompt_index("/prompt 5", 4), None);
        assert_eq!(parse_prompt_index("/prompt 0", 4), None);
        assert_eq!(parse_prompt_index("/prompt x", 4), None);
    }
}
