use crate::directory::{AccountDirectory, Policy, Rights};
use crate::sid::{ResolvedAccount, Sid};
use crate::status::{NtStatus, Win32Error};

use super::rights::{resolve, RightsError};
use super::Tense;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RevokeAllRights,
    DeleteProfile,
    DeleteAccount,
}

const ORDER: [Step; 3] = [Step::RevokeAllRights, Step::DeleteProfile, Step::DeleteAccount];

/// A destroy in progress. Holds the open policy handle until dropped.
///
/// Steps run strictly in order and the first failure ends the teardown,
/// nothing that already happened is undone.
pub struct Teardown<'a, D: AccountDirectory> {
    dir: &'a D,
    name: String,
    account: ResolvedAccount,
    policy: D::Policy,
    next: usize,
}

impl<'a, D: AccountDirectory> Teardown<'a, D> {
    /// Looks up the account and opens the security policy, nothing is
    /// changed yet.
    pub fn prepare(dir: &'a D, name: &str) -> Result<Self, RightsError> {
        let account = resolve(dir, name).map_err(RightsError::SidLookup)?;
        let policy = dir.open_policy().map_err(RightsError::PolicyOpen)?;
        Ok(Self {
            dir,
            name: name.to_owned(),
            account,
            policy,
            next: 0,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn sid(&self) -> &Sid {
        &self.account.sid
    }

    #[must_use]
    pub fn remaining(&self) -> &[Step] {
        &ORDER[self.next..]
    }

    #[must_use]
    pub fn next_step(&self) -> Option<Step> {
        self.remaining().first().copied()
    }

    #[must_use]
    pub fn describe(&self, step: Step, tense: Tense) -> String {
        let name = &self.name;
        let punct = tense.punct();
        match step {
            Step::RevokeAllRights => {
                let verb = match tense {
                    Tense::Past => "Revoked",
                    Tense::Questioning => "Revoke",
                    Tense::Future => "Will revoke",
                    Tense::Active => "Revoking",
                };
                format!("{verb} all rights of account `{name}`{punct}")
            }
            Step::DeleteProfile => {
                let verb = match tense {
                    Tense::Past => "Deleted",
                    Tense::Questioning => "Delete",
                    Tense::Future => "Will delete",
                    Tense::Active => "Deleting",
                };
                format!("{verb} the profile directory of account `{name}`{punct}")
            }
            Step::DeleteAccount => {
                let verb = match tense {
                    Tense::Past => "Deleted",
                    Tense::Questioning => "Delete",
                    Tense::Future => "Will delete",
                    Tense::Active => "Deleting",
                };
                format!("{verb} account `{name}`{punct}")
            }
        }
    }

    #[must_use]
    pub fn describe_detailed(&self, step: Step, tense: Tense) -> String {
        let short = self.describe(step, tense);
        let sid = &self.account.sid;
        let domain = &self.account.domain;
        format!("{short}\n| sid:\n|\t{sid}\n| domain:\n|\t{domain}")
    }

    /// Performs the next step. Returns `Ok(None)` once every step ran or
    /// after a step failed.
    pub fn perform_next(&mut self) -> Result<Option<Step>, RightsError> {
        let Some(step) = self.next_step() else {
            return Ok(None);
        };

        tracing::debug!("{}", self.describe(step, Tense::Active));
        if let Err(e) = self.perform(step) {
            self.next = ORDER.len();
            return Err(e);
        }
        self.next += 1;
        tracing::info!("{}", self.describe(step, Tense::Past));
        Ok(Some(step))
    }

    /// Performs all remaining steps, then releases the policy handle.
    pub fn run(mut self) -> Result<(), RightsError> {
        while self.perform_next()?.is_some() {}
        Ok(())
    }

    fn perform(&self, step: Step) -> Result<(), RightsError> {
        match step {
            Step::RevokeAllRights => self.revoke_all_rights(),
            Step::DeleteProfile => self.delete_profile(),
            Step::DeleteAccount => self
                .dir
                .delete_user(&self.name)
                .map_err(RightsError::AccountDelete),
        }
    }

    fn revoke_all_rights(&self) -> Result<(), RightsError> {
        // removing all rights leaves the lsa account object behind, that is
        // why the user itself is deleted separately later on
        match self.policy.remove_rights(&self.account.sid, Rights::All) {
            Ok(()) => Ok(()),
            Err(NtStatus::OBJECT_NAME_NOT_FOUND) => {
                tracing::warn!("account `{}` held no rights", self.name);
                Ok(())
            }
            Err(status) => Err(RightsError::RevokeAllRights(status)),
        }
    }

    fn delete_profile(&self) -> Result<(), RightsError> {
        let sid = self
            .dir
            .sid_to_string(&self.account.sid)
            .map_err(RightsError::SidFormat)?;

        match self.dir.delete_profile(&sid) {
            Ok(()) => Ok(()),
            Err(Win32Error::FILE_NOT_FOUND) => {
                tracing::warn!("account `{}` has no profile directory", self.name);
                Ok(())
            }
            Err(e) => Err(RightsError::ProfileDelete(e)),
        }
    }
}
