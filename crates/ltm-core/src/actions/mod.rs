//! Single-action workers.
//!
//! Each type here is an [`Action`](crate::guard::Action) meant to be run
//! through a [`Guarded`](crate::guard::Guarded) runner. Actions report
//! through the event bus only: notices for the user plus one structured
//! result event per run.

mod check_update;
mod delete;
mod describe;
mod listing;
mod login;
mod logout;
mod more_info;
mod moving;
mod password;
mod recycle_act;
mod recycle_list;
mod rename;
mod share_info;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use crate::backend::FileId;

pub use check_update::CheckUpdate;
pub use delete::Delete;
pub use describe::{Describe, DescribeRequest};
pub use listing::{ListRefresh, ListRequest};
pub use login::{Credentials, Login};
pub use logout::Logout;
pub use more_info::{MoreInfo, MoreInfoRequest};
pub use moving::{Move, MoveRequest};
pub use password::{PasswordEdit, SetPassword};
pub use recycle_act::{RecycleAct, RecycleRequest};
pub use recycle_list::RecycleList;
pub use rename::{EditRequest, EntryEdit, NewFolder, RenameMkdir};
pub use share_info::ShareLookup;

/// A drive item picked by the caller for a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub id: FileId,
    pub name: String,
    pub is_file: bool,
}

impl ItemRef {
    pub fn file(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_file: true,
        }
    }

    pub fn folder(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_file: false,
        }
    }
}

/// Waits for a freshly mutated listing to become visible on the drive.
/// Only called from blocking threads.
fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
