use serde::{Deserialize, Serialize};

/// Dense index of a recording in its [`crate::Dataset`], assigned in input order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(pub u32);

impl RecordingId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
