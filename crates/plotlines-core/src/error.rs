use thiserror::Error;

use crate::identifier::Uid;

/// Failures reported by the graph arena and record building.
#[derive(Debug, Error)]
pub enum Error {
    #[error("edge `{uid}` carries {count} ports, expected 2")]
    EdgePorts { uid: Uid, count: usize },

    #[error("identifier `{0}` is already in use")]
    DuplicateUid(Uid),

    #[error("no node or edge with identifier `{0}`")]
    UnknownItem(Uid),

    #[error("cannot serialize record: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("cannot read record: {0}")]
    Deserialize(#[from] toml::de::Error),
}
