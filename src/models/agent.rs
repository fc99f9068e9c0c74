use serde::Deserialize;

/// Health flag of one agent subsystem, as stored in `pbmAgents`.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct SubsystemHealth {
    #[serde(default)]
    pub ok: bool,
}

/// One node-agent entry from the `pbmAgents` collection.
///
/// An agent is identified by its (replica set, node) pair and carries the
/// health of three subsystems: the PBM agent process itself, the mongod
/// node it watches, and the backup storage it writes to.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AgentEntry {
    #[serde(rename = "rs")]
    pub replica_set: String,
    #[serde(rename = "n")]
    pub node: String,
    #[serde(default)]
    pub pbms: SubsystemHealth,
    #[serde(default)]
    pub nodes: SubsystemHealth,
    #[serde(default)]
    pub stors: SubsystemHealth,
}

impl AgentEntry {
    /// Derived health: "ok" iff all three subsystem flags are true.
    /// This is a binary partition, never a wider enum.
    pub fn status(&self) -> &'static str {
        if self.pbms.ok && self.nodes.ok && self.stors.ok {
            "ok"
        } else {
            "error"
        }
    }

    /// Host label exposed on the per-node metric series.
    pub fn host(&self) -> String {
        format!("{}/{}", self.replica_set, self.node)
    }
}
