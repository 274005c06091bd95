//! Process management (workflow) settings of an app.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ProtocolError;
use crate::codec::decode_json;

/// The workflow graph: named states and the actions that move a record
/// between them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Process {
    pub enable: bool,
    /// States keyed by name.
    #[serde(default)]
    pub states: BTreeMap<String, ProcessState>,
    #[serde(default)]
    pub actions: Vec<ProcessAction>,
    #[serde(with = "crate::wire::decimal_u64")]
    pub revision: u64,
}

impl Process {
    /// States in workflow order (by `index`).
    pub fn ordered_states(&self) -> Vec<&ProcessState> {
        let mut states: Vec<_> = self.states.values().collect();
        states.sort_by_key(|s| s.index);
        states
    }

    /// Actions available from the state called `from`.
    pub fn actions_from<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a ProcessAction> + 'a {
        self.actions.iter().filter(move |a| a.from == from)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessState {
    pub name: String,
    /// Position of the state in the workflow, starting at 0.
    #[serde(with = "crate::wire::decimal_u64")]
    pub index: u64,
    #[serde(default)]
    pub assignee: Option<ProcessAssignee>,
}

/// Who must act on a record while it sits in a state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessAssignee {
    #[serde(rename = "type")]
    pub rule: AssigneeRule,
    #[serde(default)]
    pub entities: Vec<ProcessEntity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssigneeRule {
    /// One of the assignees, picked by the previous actor.
    One,
    /// Every assignee must act.
    All,
    /// Any single assignee may act.
    Any,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEntity {
    pub entity: Entity,
    #[serde(default)]
    pub include_subs: bool,
}

/// A user, group, organization, or field reference used as an assignee.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entity {
    /// `USER`, `GROUP`, `ORGANIZATION`, `FIELD_ENTITY`, `CUSTOM_FIELD`, ...
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// A transition between two states.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAction {
    pub name: String,
    pub from: String,
    pub to: String,
    /// Query condition a record must satisfy for the action to be offered.
    /// Passed through untouched.
    #[serde(default)]
    pub filter_cond: String,
}

/// Decodes process management settings.
pub fn decode_process(data: &[u8]) -> Result<Process, ProtocolError> {
    let process: Process = decode_json(data)?;
    tracing::debug!(
        states = process.states.len(),
        actions = process.actions.len(),
        revision = process.revision,
        "decoded process"
    );
    Ok(process)
}
