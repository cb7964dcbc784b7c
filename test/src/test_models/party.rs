use serde::Deserialize;
use serde_json::json;

use replica_server::{Command, CommandContext, HostError, HostKeyedList, ParticipantId};
use replica_shared::ObjectId;

pub const ROSTER: &str = "roster";

#[derive(Deserialize)]
pub struct JoinPayload {
    pub actor: String,
    pub name: String,
}

/// `party:join:request`: binds the sender to an actor and lists it in the
/// roster
pub struct PartyJoin;

impl Command for PartyJoin {
    type Payload = JoinPayload;

    const KIND: &'static str = "party:join:request";

    fn authorize(&self, payload: &JoinPayload, context: &CommandContext<'_>) -> bool {
        // an actor already played by another peer cannot be taken over
        match context.participants().peer_of(&ParticipantId::new(payload.actor.as_str())) {
            Some(peer) => peer == context.sender(),
            None => true,
        }
    }

    fn handle(
        &self,
        payload: JoinPayload,
        context: &mut CommandContext<'_>,
    ) -> Result<(), HostError> {
        context.bind_participant(ParticipantId::new(payload.actor.as_str()));
        context.mutate::<HostKeyedList, _>(&ObjectId::from(ROSTER), |roster| {
            roster.upsert_ops(json!({
                "participant": payload.actor,
                "name": payload.name,
            }))
        })?;
        context.reply("party:join:ok", json!({ "actor": payload.actor }));
        Ok(())
    }
}
