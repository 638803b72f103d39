use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

use crate::records::Entity;

/// Workflow states of a status-bearing record.
pub trait Lifecycle:
    Copy + Eq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Position along the regular workflow, starting at zero.
    fn stage(self) -> u8;

    /// No further moves out of this state.
    fn is_terminal(self) -> bool;

    fn as_str(self) -> &'static str;

    /// Forward-only reading of the workflow. Re-applying the current state is
    /// always accepted; terminal states (cancel/reject included) can be entered
    /// from any open state.
    fn can_advance_to(self, target: Self) -> bool {
        if self == target {
            return true;
        }

        if self.is_terminal() {
            return false;
        }

        target.is_terminal() || target.stage() > self.stage()
    }
}

pub trait Tracked: Entity {
    type Status: Lifecycle;

    fn status(&self) -> Self::Status;
}
