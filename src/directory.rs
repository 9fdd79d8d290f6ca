//! The account database and security policy of a machine, behind a trait so
//! the lifecycle logic can run against something other than the live OS.

use crate::account::builder::AccountRecord;
use crate::sid::{ResolvedAccount, Sid};
use crate::status::{NetStatus, NtStatus, Win32Error};

pub mod memory;
#[cfg(windows)]
pub mod windows;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no account with that name on this machine")]
    AccountNotFound,
    #[error("could not resolve account name: {0}")]
    Resolution(Win32Error),
}

/// Which rights [`Policy::remove_rights`] should strip.
#[derive(Debug, Clone, Copy)]
pub enum Rights<'a> {
    All,
    Named(&'a [&'a str]),
}

/// An open handle on the local security policy. Dropping it releases the
/// handle.
pub trait Policy {
    fn add_rights(&self, sid: &Sid, rights: &[&str]) -> Result<(), NtStatus>;
    fn remove_rights(&self, sid: &Sid, rights: Rights<'_>) -> Result<(), NtStatus>;
}

pub trait AccountDirectory {
    type Policy: Policy;

    /// Name of this machine, the domain its local accounts resolve in.
    fn machine_name(&self) -> Result<String, Win32Error>;
    /// Resolve a name to a sid. Like the OS this may answer with groups or
    /// accounts of other domains, callers go through
    /// [`resolve`](crate::resolve) to narrow it to local users.
    fn lookup_account(&self, name: &str) -> Result<ResolvedAccount, LookupError>;
    /// Query the user record, this is what existence checks use.
    fn user_info(&self, name: &str) -> Result<(), NetStatus>;
    fn add_user(&self, record: &AccountRecord) -> Result<(), NetStatus>;
    fn delete_user(&self, name: &str) -> Result<(), NetStatus>;

    /// Opened with "create account" and "lookup names" access.
    fn open_policy(&self) -> Result<Self::Policy, NtStatus>;

    fn sid_to_string(&self, sid: &Sid) -> Result<String, Win32Error>;
    /// Removes the profile (home) directory belonging to the sid.
    fn delete_profile(&self, sid: &str) -> Result<(), Win32Error>;
}
