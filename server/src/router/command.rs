use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use replica_shared::{LobbyMessage, Value};

use crate::{
    router::{
        command_context::CommandContext,
        dispatch::{DispatchOutcome, DropReason},
    },
    HostError,
};

/// Names the limiter instance and the key a command is counted under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitKey {
    pub limiter: String,
    pub key: String,
}

impl RateLimitKey {
    pub fn new(limiter: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            limiter: limiter.into(),
            key: key.into(),
        }
    }
}

/// Structural validation through serde. Anything that does not
/// deserialize into `T` is `None`.
pub fn parse_body<T: DeserializeOwned>(body: &Value) -> Option<T> {
    T::deserialize(body).ok()
}

/// One typed command a peer can send, e.g. `chat:send:request`.
///
/// A command runs through `parse → authorize → rate-check → handle`; a
/// failure at any step drops it without retry.
pub trait Command: Send + 'static {
    type Payload: DeserializeOwned;

    /// Wire discriminator
    const KIND: &'static str;

    fn parse(&self, body: &Value) -> Option<Self::Payload> {
        parse_body(body)
    }

    fn authorize(&self, _payload: &Self::Payload, _context: &CommandContext<'_>) -> bool {
        true
    }

    /// Message sent back to the sender when `authorize` refuses it
    fn rejection(&self, _payload: &Self::Payload) -> Option<LobbyMessage> {
        None
    }

    fn rate_limit(
        &self,
        _payload: &Self::Payload,
        _context: &CommandContext<'_>,
    ) -> Option<RateLimitKey> {
        None
    }

    fn handle(
        &self,
        payload: Self::Payload,
        context: &mut CommandContext<'_>,
    ) -> Result<(), HostError>;
}

pub(crate) trait ErasedCommand: Send {
    fn kind(&self) -> &'static str;

    fn dispatch(&self, body: &Value, context: &mut CommandContext<'_>) -> DispatchOutcome;
}

impl<C: Command> ErasedCommand for C {
    fn kind(&self) -> &'static str {
        C::KIND
    }

    fn dispatch(&self, body: &Value, context: &mut CommandContext<'_>) -> DispatchOutcome {
        let sender = context.sender().clone();

        let Some(payload) = self.parse(body) else {
            debug!("dropping malformed '{}' from {}", C::KIND, sender);
            return DispatchOutcome::Dropped(DropReason::Malformed);
        };

        if !self.authorize(&payload, context) {
            info!("'{}' from {} was not authorized", C::KIND, sender);
            if let Some(rejection) = self.rejection(&payload) {
                context.reply_message(rejection);
            }
            return DispatchOutcome::Dropped(DropReason::Unauthorized);
        }

        if let Some(limit) = self.rate_limit(&payload, context) {
            if !context.allow(&limit.limiter, &limit.key) {
                debug!("'{}' from {} rate limited on {}", C::KIND, sender, limit.key);
                return DispatchOutcome::Dropped(DropReason::RateLimited);
            }
        }

        match self.handle(payload, context) {
            Ok(()) => DispatchOutcome::Handled,
            Err(err) => {
                warn!("'{}' from {} failed: {}", C::KIND, sender, err);
                DispatchOutcome::Dropped(DropReason::HandlerFailed)
            }
        }
    }
}
