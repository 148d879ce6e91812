//! Natural-language command orchestration.
//!
//! Each segment of an utterance runs through
//! `Parse → Execute → (Done | RetryParse → RetryExecute → Done)`.
//! A failed execution gets exactly one more language-model parse, with the
//! failure text as context. Segments are independent: one failing doesn't
//! stop the rest.

use crate::aliases::AliasTable;
use crate::client::{HaClient, HomeApi};
use crate::command::Command;
use crate::directory::EntityDirectory;
use crate::executor::{self, ExecutionOutcome};
use crate::format::format_response;
use crate::llm::LlmParser;
use crate::patterns;
use crate::resolve::resolve_entity;
use crate::split::split_commands;
use himas_core::{
    config::{shellexpand, HomeAssistantConfig, OllamaConfig},
    traits::Provider,
};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};


/// `[Name says:]` prefixes added by relays.
static SPEAKER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?says:\]\s*").expect("valid regex"));

/// Where a segment is in its parse/execute cycle.
enum Stage {
    Parse,
    Execute(Command),
    RetryParse {
        command: Command,
        failure: ExecutionOutcome,
    },
    RetryExecute(Command),
    Done {
        command: Command,
        outcome: ExecutionOutcome,
    },
}

/// Turns free text into Home Assistant actions and a reply.
pub struct HomeInterpreter {
    api: Arc<dyn HomeApi>,
    directory: EntityDirectory,
    llm: LlmParser,
    aliases: Arc<RwLock<AliasTable>>,
}

impl HomeInterpreter {
    pub fn new(api: Arc<dyn HomeApi>, llm: LlmParser, aliases: AliasTable) -> Self {
        Self {
            directory: EntityDirectory::new(api.clone()),
            api,
            llm,
            aliases: Arc::new(RwLock::new(aliases)),
        }
    }

    /// Replace the default entity directory (TTL, allowlist).
    pub fn with_directory(mut self, directory: EntityDirectory) -> Self {
        self.directory = directory;
        self
    }

    /// Wire the real Home Assistant client, directory, alias file and parser.
    pub fn from_config(
        home: &HomeAssistantConfig,
        ollama: &OllamaConfig,
        provider: Arc<dyn Provider>,
    ) -> Self {
        let api: Arc<dyn HomeApi> = Arc::new(HaClient::from_config(home));
        let aliases = AliasTable::load_or_empty(shellexpand(&home.alias_file));
        let llm = LlmParser::from_config(provider, ollama).with_entity_limit(home.llm_entity_limit);
        let directory = EntityDirectory::new(api.clone())
            .with_ttl(Duration::from_secs(home.cache_ttl_secs))
            .with_allowlist(home.allowed_entities.clone());

        info!(
            "home interpreter ready: {} ({} aliases)",
            home.base_url,
            aliases.len()
        );
        Self::new(api, llm, aliases).with_directory(directory)
    }

    pub fn api(&self) -> &Arc<dyn HomeApi> {
        &self.api
    }

    pub fn directory(&self) -> &EntityDirectory {
        &self.directory
    }

    /// Shared alias table. Holders reload it before reading or saving, since
    /// the CLI may have changed the file.
    pub fn aliases(&self) -> &Arc<RwLock<AliasTable>> {
        &self.aliases
    }

    /// Process an utterance and return one formatted line per segment,
    /// joined by blank lines. Never fails; an empty input yields `""`.
    pub async fn process_natural_command(&self, text: &str, user_id: &str) -> String {
        let clean = SPEAKER_TAG_RE.replace_all(text, "");
        let clean = clean.trim();
        if clean.is_empty() {
            return String::new();
        }

        let mut results = Vec::new();
        for segment in split_commands(clean) {
            results.push(self.process_segment(&segment, user_id).await);
        }
        results.join("\n\n")
    }

    async fn process_segment(&self, segment: &str, user_id: &str) -> String {
        let mut stage = Stage::Parse;
        loop {
            stage = match stage {
                Stage::Parse => match self.parse(segment, user_id).await {
                    Command::Error { message } => return format!("❌ {message}"),
                    command => Stage::Execute(command),
                },
                Stage::Execute(command) => {
                    let outcome = self.run(&command).await;
                    if outcome.success {
                        Stage::Done { command, outcome }
                    } else {
                        Stage::RetryParse {
                            command,
                            failure: outcome,
                        }
                    }
                }
                Stage::RetryParse { command, failure } => {
                    info!("retrying {segment:?} after: {}", failure.message);
                    let entities = self.directory.entities(false).await;
                    let retry = self
                        .llm
                        .parse(segment, user_id, &entities, Some(&failure.message))
                        .await;
                    if retry.is_error() {
                        Stage::Done {
                            command,
                            outcome: failure,
                        }
                    } else {
                        Stage::RetryExecute(retry)
                    }
                }
                Stage::RetryExecute(command) => {
                    let outcome = self.run(&command).await;
                    Stage::Done { command, outcome }
                }
                Stage::Done { command, outcome } => return format_response(&command, &outcome),
            };
        }
    }

    /// Regex rules first, then the language model.
    async fn parse(&self, segment: &str, user_id: &str) -> Command {
        if let Some(command) = patterns::parse(segment) {
            debug!("pattern parser handled {segment:?}");
            return command;
        }
        debug!("LLM parser handling {segment:?}");
        let entities = self.directory.entities(false).await;
        self.llm.parse(segment, user_id, &entities, None).await
    }

    /// Resolve the command's entity and execute it.
    async fn run(&self, command: &Command) -> ExecutionOutcome {
        let Some(name) = command.entity_name() else {
            return executor::execute(self.api.as_ref(), command, "").await;
        };

        let entities = self.directory.entities(false).await;
        let resolved = {
            let mut aliases = self.aliases.write().await;
            aliases.reload();
            resolve_entity(name, &entities, &aliases)
        };

        match resolved {
            Some(entity_id) => executor::execute(self.api.as_ref(), command, &entity_id).await,
            None => ExecutionOutcome::unresolved(name),
        }
    }
}
