pub(crate) mod builder;
pub(crate) mod rights;
pub(crate) mod teardown;

use crate::directory::AccountDirectory;
use crate::status::NetStatus;

use self::builder::{validate_name, NameError, ServiceAccount, Set};
use self::rights::{mutate, Change, RightsError, SERVICE_LOGON_RIGHT};
use self::teardown::Teardown;

/// Grammatical tense used when describing a teardown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tense {
    Past,
    Questioning,
    Future,
    Active,
}

impl Tense {
    #[must_use]
    pub fn punct(&self) -> &'static str {
        match self {
            Tense::Past | Tense::Future => "",
            Tense::Questioning => "?",
            Tense::Active => "...",
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CreateError {
    #[error("Invalid account name: {0}")]
    InvalidName(#[from] NameError),
    #[error("Could not add the account: {0}")]
    AddAccount(NetStatus),
    #[error("Account was added but granting it the service logon right failed")]
    Rights(#[source] RightsError),
}

impl CreateError {
    /// The number the exported functions return for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            CreateError::InvalidName(_) => NetStatus::BAD_USERNAME.code(),
            CreateError::AddAccount(status) => status.code(),
            CreateError::Rights(e) => e.code(),
        }
    }
}

impl ServiceAccount<Set> {
    /// Adds the account and grants it the right to log on as a service.
    ///
    /// If the grant fails the account is left in place.
    pub fn create<D: AccountDirectory>(&self, dir: &D) -> Result<(), CreateError> {
        let record = self.record();
        validate_name(&record.name)?;

        tracing::debug!("adding account `{}`", record.name);
        dir.add_user(&record).map_err(CreateError::AddAccount)?;
        tracing::info!("added account `{}`", record.name);

        mutate(dir, &record.name, Change::Grant(SERVICE_LOGON_RIGHT)).map_err(CreateError::Rights)
    }

    /// Revokes all rights, deletes the profile and then the account.
    pub fn destroy<D: AccountDirectory>(&self, dir: &D) -> Result<(), RightsError> {
        mutate(dir, self.account_name(), Change::TearDown)
    }

    /// Like [`destroy`](Self::destroy) but hands back the steps so the caller
    /// can perform (or confirm) them one by one.
    pub fn prepare_destroy<'a, D: AccountDirectory>(
        &self,
        dir: &'a D,
    ) -> Result<Teardown<'a, D>, RightsError> {
        Teardown::prepare(dir, self.account_name())
    }

    /// The raw status of querying the user record, success means it exists.
    pub fn status<D: AccountDirectory>(&self, dir: &D) -> Result<(), NetStatus> {
        dir.user_info(self.account_name())
    }

    /// Any failure to query the account counts as it not existing.
    pub fn exists<D: AccountDirectory>(&self, dir: &D) -> bool {
        match self.status(dir) {
            Ok(()) => true,
            Err(NetStatus::USER_NOT_FOUND) => false,
            Err(status) => {
                tracing::warn!(
                    "could not query account `{}`, assuming it does not exist: {status}",
                    self.account_name()
                );
                false
            }
        }
    }
}
