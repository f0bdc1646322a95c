use crate::{
    command::{CommandDefinition, Invocation, RegistrationHandle, Reply},
    error::PolyglotError,
};
use async_trait::async_trait;

/// Messaging platform trait: the session with the outside world.
///
/// Implementations own the transport. The kernel only registers commands,
/// answers invocations, and asks for a guild's preferred locale.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Human-readable platform name.
    fn name(&self) -> &str;

    /// Start receiving events.
    /// Returns a receiver that yields command invocations.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<Invocation>, PolyglotError>;

    /// Register (or overwrite) a command definition.
    ///
    /// Registering a name the platform already knows must not be reported as
    /// a failure: either return the existing handle or
    /// [`PolyglotError::AlreadyRegistered`].
    async fn register_command(
        &self,
        definition: &CommandDefinition,
    ) -> Result<RegistrationHandle, PolyglotError>;

    /// Remove a previously registered command.
    async fn unregister_command(&self, handle: &RegistrationHandle) -> Result<(), PolyglotError>;

    /// Send the response for an invocation.
    async fn respond(&self, invocation: &Invocation, reply: Reply) -> Result<(), PolyglotError>;

    /// Preferred locale the platform reports for a guild, if any.
    async fn preferred_locale(&self, tenant_id: &str) -> Result<Option<String>, PolyglotError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), PolyglotError>;
}
