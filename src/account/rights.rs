use crate::directory::{AccountDirectory, LookupError, Policy, Rights};
use crate::sid::{ResolvedAccount, SidKind};
use crate::status::{NetStatus, NtStatus, Win32Error};

use super::teardown::Teardown;

/// Name of the "log on as a service" user right (`SE_SERVICE_LOGON_NAME`).
pub const SERVICE_LOGON_RIGHT: &str = "SeServiceLogonRight";

/// What [`mutate`] should change about an account's rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<'a> {
    Grant(&'a str),
    Revoke(&'a str),
    /// Strip every right, then delete the profile and the account itself.
    TearDown,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RightsError {
    #[error("Could not look up the account's sid")]
    SidLookup(#[source] LookupError),
    #[error("Could not open the local security policy: {0}")]
    PolicyOpen(NtStatus),
    #[error("Could not grant right `{right}`: {status}")]
    RightGrant { right: String, status: NtStatus },
    #[error("Could not revoke right `{right}`: {status}")]
    RightRevoke { right: String, status: NtStatus },
    #[error("Could not revoke all rights of the account: {0}")]
    RevokeAllRights(NtStatus),
    #[error("Could not convert the sid to its string form: {0}")]
    SidFormat(Win32Error),
    #[error("Could not delete the account's profile: {0}")]
    ProfileDelete(Win32Error),
    #[error("Could not delete the account: {0}")]
    AccountDelete(NetStatus),
}

impl RightsError {
    /// The number the exported functions return for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            RightsError::SidLookup(_) => -2,
            RightsError::PolicyOpen(_) => -3,
            RightsError::RightGrant { .. } => -4,
            RightsError::RightRevoke { .. } => -5,
            RightsError::RevokeAllRights(_) => -6,
            RightsError::SidFormat(_) => -7,
            RightsError::ProfileDelete(_) => -8,
            RightsError::AccountDelete(_) => -9,
        }
    }

    #[must_use]
    pub fn step(&self) -> &'static str {
        match self {
            RightsError::SidLookup(_) => "sid lookup",
            RightsError::PolicyOpen(_) => "policy open",
            RightsError::RightGrant { .. } => "grant right",
            RightsError::RightRevoke { .. } => "revoke right",
            RightsError::RevokeAllRights(_) => "revoke all rights",
            RightsError::SidFormat(_) => "sid to string",
            RightsError::ProfileDelete(_) => "delete profile",
            RightsError::AccountDelete(_) => "delete account",
        }
    }
}

/// Resolves a name to its sid and domain on this machine. Groups, aliases and
/// accounts of other domains count as not found.
pub fn resolve<D: AccountDirectory>(dir: &D, name: &str) -> Result<ResolvedAccount, LookupError> {
    let resolved = dir.lookup_account(name)?;
    tracing::debug!(
        "resolved `{name}` to {} in domain {} ({:?})",
        resolved.sid,
        resolved.domain,
        resolved.kind
    );

    if resolved.kind != SidKind::User {
        tracing::warn!("`{name}` is a {:?}, not a user account", resolved.kind);
        return Err(LookupError::AccountNotFound);
    }
    let machine = dir.machine_name().map_err(LookupError::Resolution)?;
    if !resolved.domain.eq_ignore_ascii_case(&machine) {
        tracing::warn!(
            "`{name}` belongs to domain {}, not to this machine ({machine})",
            resolved.domain
        );
        return Err(LookupError::AccountNotFound);
    }
    Ok(resolved)
}

/// Applies `change` to the rights of account `name`. The policy handle opened
/// for this is released before returning, whatever the outcome.
pub fn mutate<D: AccountDirectory>(dir: &D, name: &str, change: Change<'_>) -> Result<(), RightsError> {
    match change {
        Change::Grant(right) => {
            let account = resolve(dir, name).map_err(RightsError::SidLookup)?;
            let policy = dir.open_policy().map_err(RightsError::PolicyOpen)?;
            tracing::debug!("granting `{right}` to `{name}`");
            policy
                .add_rights(&account.sid, &[right])
                .map_err(|status| RightsError::RightGrant {
                    right: right.to_owned(),
                    status,
                })?;
            tracing::info!("granted `{right}` to `{name}`");
            Ok(())
        }
        Change::Revoke(right) => {
            let account = resolve(dir, name).map_err(RightsError::SidLookup)?;
            let policy = dir.open_policy().map_err(RightsError::PolicyOpen)?;
            tracing::debug!("revoking `{right}` from `{name}`");
            policy
                .remove_rights(&account.sid, Rights::Named(&[right]))
                .map_err(|status| RightsError::RightRevoke {
                    right: right.to_owned(),
                    status,
                })?;
            tracing::info!("revoked `{right}` from `{name}`");
            Ok(())
        }
        Change::TearDown => Teardown::prepare(dir, name)?.run(),
    }
}
