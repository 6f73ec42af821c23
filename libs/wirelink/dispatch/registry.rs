use crate::command::{Command, CommandRegistry, CommandReply};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Lookup table of commands keyed by name
#[derive(Default, Clone)]
pub struct CommandTable {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its own name, replacing any previous entry
    pub fn register(&mut self, command: Arc<dyn Command>) -> &mut Self {
        let name = command.name().to_string();
        debug!("Registering command: {}", name);
        self.commands.insert(name, command);
        self
    }

    pub fn with(mut self, command: impl Command) -> Self {
        self.register(Arc::new(command));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    /// `(name, description)` pairs sorted by name
    pub fn catalog(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .commands
            .values()
            .map(|c| (c.name().to_string(), c.description().to_string()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[async_trait]
impl CommandRegistry for CommandTable {
    async fn execute(&self, name: &str, args: &[String]) -> CommandReply {
        match self.commands.get(name) {
            Some(command) => command.execute(args).await,
            None => {
                debug!("Unknown command: {}", name);
                CommandReply::unhandled()
            }
        }
    }
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.catalog())
            .finish()
    }
}
