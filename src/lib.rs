#![doc = include_str!("../README.md")]

// create: add the user, grant it the service logon right
// destroy: revoke rights, delete the profile, delete the user
// exists: query the user record

mod account;
pub mod cli;
pub mod compat;
pub mod directory;
pub mod sid;
pub mod status;
#[cfg(feature = "tui")]
pub mod tui;

pub use account::builder::{
    validate_name, AccountFlags, AccountRecord, NameError, NotSet, Privilege, ServiceAccount, Set,
    ToAssign,
};
pub use account::rights::{mutate, resolve, Change, RightsError, SERVICE_LOGON_RIGHT};
pub use account::teardown::{Step, Teardown};
pub use account::{CreateError, Tense};
