//! Built-in bot commands: Home Assistant control and entity mappings.

mod home;


use himas_home::HomeInterpreter;

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    /// `None` when Home Assistant is disabled in config.
    pub home: Option<&'a HomeInterpreter>,
    pub sender_id: &'a str,
    pub text: &'a str,
    pub is_admin: bool,
    pub deny_message: &'a str,
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Himas,
    Explain,
    ListEntities,
    RemoveEntity,
    FindSensor,
    HaStatus,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes
    /// (which fall through to the chat path).
    ///
    /// Telegram menu entries cannot contain `-`, so `/find_sensor` and
    /// `/ha_status` are accepted next to the hyphenated names.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/help@himas_bot" → "/help").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/himas" => Some(Self::Himas),
            "/explain" => Some(Self::Explain),
            "/listentities" => Some(Self::ListEntities),
            "/removeentity" => Some(Self::RemoveEntity),
            "/find-sensor" | "/find_sensor" => Some(Self::FindSensor),
            "/ha-status" | "/ha_status" => Some(Self::HaStatus),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Commands that may take a while and deserve a typing indicator.
    pub fn is_slow(self) -> bool {
        matches!(self, Self::Himas | Self::FindSensor | Self::HaStatus)
    }
}

/// Everything after the command word, trimmed.
pub fn arguments(text: &str) -> &str {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => text[i..].trim(),
        None => "",
    }
}

/// Handle a command and return the response text.
pub async fn handle(cmd: Command, ctx: &CommandContext<'_>) -> String {
    let interpreter = match (cmd, ctx.home) {
        (Command::Help, _) => return home::handle_help(),
        (_, None) => return "🏠 Home Assistant is not configured.".to_string(),
        (_, Some(interpreter)) => interpreter,
    };
    let args = arguments(ctx.text);

    match cmd {
        Command::Himas => home::handle_himas(interpreter, args, ctx.sender_id).await,
        Command::Explain => home::handle_explain(interpreter, args).await,
        Command::ListEntities => home::handle_list(interpreter).await,
        Command::RemoveEntity => {
            if !ctx.is_admin {
                return ctx.deny_message.to_string();
            }
            home::handle_remove(interpreter, args).await
        }
        Command::FindSensor => home::handle_find_sensor(interpreter, args).await,
        Command::HaStatus => home::handle_ha_status(interpreter).await,
        Command::Help => home::handle_help(),
    }
}
