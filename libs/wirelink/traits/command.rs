use async_trait::async_trait;

/// Result of running a command
///
/// `handled == false` means the command declined the input and nothing is
/// sent back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
    pub handled: bool,
}

impl CommandReply {
    pub fn handled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            handled: true,
        }
    }

    pub fn unhandled() -> Self {
        Self::default()
    }

    /// A reply worth sending back: handled and non-empty
    pub fn is_sendable(&self) -> bool {
        self.handled && !self.text.is_empty()
    }
}

/// A single chat command
///
/// # Example
///
/// ```ignore
/// struct Shout;
///
/// #[async_trait]
/// impl Command for Shout {
///     fn name(&self) -> &str { "shout" }
///     fn description(&self) -> &str { "Repeat in capitals" }
///     async fn execute(&self, args: &[String]) -> CommandReply {
///         CommandReply::handled(args.join(" ").to_uppercase())
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run with the whitespace-separated arguments that followed the name
    async fn execute(&self, args: &[String]) -> CommandReply;
}

/// Lookup from command name to command
#[async_trait]
pub trait CommandRegistry: Send + Sync + 'static {
    /// Run `name` (already stripped of the prefix); unknown names are unhandled
    async fn execute(&self, name: &str, args: &[String]) -> CommandReply;
}
