//! Built-in chat commands: `ping`, `echo` and `help`

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use wirelink::{Command, CommandReply, CommandTable, LatencyProbe, OutboundMessage, SessionHandle};

/// Measures round-trip latency
///
/// Stamps the latency probe and asks for our identity. The reply is produced
/// by the dispatcher when the identity frame comes back, so a successful ping
/// returns nothing here.
pub struct Ping {
    session: Arc<dyn SessionHandle>,
    probe: Arc<LatencyProbe>,
    response_prefix: String,
}

impl Ping {
    pub fn new(
        session: Arc<dyn SessionHandle>,
        probe: Arc<LatencyProbe>,
        response_prefix: impl Into<String>,
    ) -> Self {
        Self {
            session,
            probe,
            response_prefix: response_prefix.into(),
        }
    }
}

#[async_trait]
impl Command for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Check bot latency"
    }

    async fn execute(&self, _args: &[String]) -> CommandReply {
        self.probe.issue();
        match self.session.send(OutboundMessage::get_id()).await {
            Ok(()) => CommandReply::unhandled(),
            Err(e) => {
                warn!("Ping failed: {}", e);
                self.probe.cancel();
                CommandReply::handled(format!("{} Failed to ping", self.response_prefix))
            }
        }
    }
}

/// Repeats its arguments
pub struct Echo {
    response_prefix: String,
}

impl Echo {
    pub fn new(response_prefix: impl Into<String>) -> Self {
        Self {
            response_prefix: response_prefix.into(),
        }
    }
}

#[async_trait]
impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo back your message"
    }

    async fn execute(&self, args: &[String]) -> CommandReply {
        if args.is_empty() {
            return CommandReply::unhandled();
        }
        CommandReply::handled(format!("{} {}", self.response_prefix, args.join(" ")))
    }
}

/// Lists commands, or describes one
pub struct Help {
    response_prefix: String,
    /// `(name, description)` of every registered command, help included
    catalog: Vec<(String, String)>,
}

impl Help {
    pub const NAME: &'static str = "help";
    pub const DESCRIPTION: &'static str = "List commands, or describe one";

    pub fn new(response_prefix: impl Into<String>, mut catalog: Vec<(String, String)>) -> Self {
        if !catalog.iter().any(|(name, _)| name == Self::NAME) {
            catalog.push((Self::NAME.to_string(), Self::DESCRIPTION.to_string()));
        }
        catalog.sort();
        Self {
            response_prefix: response_prefix.into(),
            catalog,
        }
    }
}

#[async_trait]
impl Command for Help {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    async fn execute(&self, args: &[String]) -> CommandReply {
        let Some(wanted) = args.first() else {
            let names: Vec<&str> = self.catalog.iter().map(|(name, _)| name.as_str()).collect();
            return CommandReply::handled(format!(
                "{} Commands: {}",
                self.response_prefix,
                names.join(", ")
            ));
        };

        match self.catalog.iter().find(|(name, _)| name == wanted) {
            Some((name, description)) => CommandReply::handled(format!("{} - {}", name, description)),
            None => CommandReply::handled(format!(
                "{} Unknown command: {}",
                self.response_prefix, wanted
            )),
        }
    }
}

/// Register `ping`, `echo` and `help`
pub fn build_registry(
    session: Arc<dyn SessionHandle>,
    probe: Arc<LatencyProbe>,
    response_prefix: &str,
) -> CommandTable {
    let mut table = CommandTable::new()
        .with(Ping::new(session, probe, response_prefix))
        .with(Echo::new(response_prefix));
    let help = Help::new(response_prefix, table.catalog());
    table.register(Arc::new(help));
    table
}
