//! Domain services for CrowdStack.
//!
//! Services hold the protocol logic and talk to storage only through the
//! ports in [`store`].

pub mod door_pass;
pub mod invite_ledger;
pub mod memory;
pub mod role_assignment;
pub mod store;

pub use door_pass::{CheckInOutcome, DoorPassError, DoorPassService};
pub use invite_ledger::{InviteError, InviteLedger};
pub use memory::InMemoryStore;
pub use role_assignment::{RoleAssignmentError, RoleAssignmentService};
pub use store::{
    CheckInStore, EventStore, InviteQrStore, InviteTokenStore, RegistrationStore, StoreError,
    UserRoleStore,
};
