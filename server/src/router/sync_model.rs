use std::collections::HashMap;

use log::info;

use replica_shared::Value;

use crate::{
    router::{
        command::{Command, ErasedCommand},
        command_context::CommandContext,
        dispatch::DispatchOutcome,
    },
    HostError,
};

/// A named group of commands that mutate host-owned state
pub struct SyncModel {
    id: String,
    commands: Vec<Box<dyn ErasedCommand>>,
}

impl SyncModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            commands: Vec::new(),
        }
    }

    pub fn with_command<C: Command>(mut self, command: C) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|command| command.kind())
    }
}

/// Routes command kinds to the model that claimed them
#[derive(Default)]
pub(crate) struct CommandDispatcher {
    models: Vec<SyncModel>,
    // kind -> (model, command)
    index: HashMap<&'static str, (usize, usize)>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails without registering anything if a kind is already claimed
    pub fn add_model(&mut self, model: SyncModel) -> Result<(), HostError> {
        let mut claimed: HashMap<&'static str, usize> = HashMap::new();
        for (position, kind) in model.kinds().enumerate() {
            let taken_by = match self.index.get(kind) {
                Some((model_index, _)) => Some(self.models[*model_index].id().to_string()),
                None if claimed.contains_key(kind) => Some(model.id().to_string()),
                None => None,
            };
            if let Some(owner) = taken_by {
                return Err(HostError::DuplicateCommandKind {
                    kind: kind.to_string(),
                    model: owner,
                });
            }
            claimed.insert(kind, position);
        }

        let model_index = self.models.len();
        for (kind, position) in claimed {
            self.index.insert(kind, (model_index, position));
        }
        info!(
            "sync model '{}' registered with {} command(s)",
            model.id(),
            model.commands.len()
        );
        self.models.push(model);
        Ok(())
    }

    pub fn claims(&self, kind: &str) -> bool {
        self.index.contains_key(kind)
    }

    /// `None` when no model claims `kind`
    pub fn dispatch(
        &self,
        kind: &str,
        body: &Value,
        context: &mut CommandContext<'_>,
    ) -> Option<DispatchOutcome> {
        let (model_index, position) = self.index.get(kind)?;
        let command = self.models.get(*model_index)?.commands.get(*position)?;
        Some(command.dispatch(body, context))
    }
}
