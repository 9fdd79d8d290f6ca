use std::marker::PhantomData;

use bitflags::bitflags;

#[derive(Debug)]
pub struct Set;
#[derive(Debug)]
pub struct NotSet;

pub trait ToAssign {}

impl ToAssign for Set {}
impl ToAssign for NotSet {}

bitflags! {
    /// The `UF_*` flags stored on the user record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccountFlags: u32 {
        const SCRIPT = 0x0001;
        const ACCOUNT_DISABLE = 0x0002;
        const PASSWD_CANT_CHANGE = 0x0040;
        const DONT_EXPIRE_PASSWD = 0x0001_0000;
        const NOT_DELEGATED = 0x0010_0000;
    }
}

impl Default for AccountFlags {
    fn default() -> Self {
        Self::DONT_EXPIRE_PASSWD | Self::SCRIPT
    }
}

/// Privilege level of the user record (`USER_PRIV_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privilege {
    Guest,
    #[default]
    User,
    Admin,
}

impl Privilege {
    #[must_use]
    pub fn raw(self) -> u32 {
        match self {
            Privilege::Guest => 0,
            Privilege::User => 1,
            Privilege::Admin => 2,
        }
    }
}

/// Everything the OS needs to add the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub name: String,
    pub password: Option<String>,
    pub comment: String,
    pub privilege: Privilege,
    pub flags: AccountFlags,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("account name can not be empty")]
    Empty,
    #[error("account name is {0} characters long, at most {MAX_NAME_LENGTH} are allowed")]
    TooLong(usize),
    #[error("account name may not contain '{0}'")]
    InvalidChar(char),
    #[error("account name can not consist of only dots and spaces")]
    OnlyDotsAndSpaces,
}

/// Local user names are limited to 20 characters (`LM20_UNLEN`).
pub const MAX_NAME_LENGTH: usize = 20;

const FORBIDDEN: &[char] = &[
    '"', '/', '\\', '[', ']', ':', ';', '|', '=', ',', '+', '*', '?', '<', '>', '@',
];

/// Checks a name against the rules for local account names. The OS has the
/// final say, this only catches what it would certainly refuse.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(NameError::TooLong(len));
    }

    if let Some(c) = name
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(NameError::InvalidChar(c));
    }

    if name.chars().all(|c| c == '.' || c == ' ') {
        return Err(NameError::OnlyDotsAndSpaces);
    }

    Ok(())
}

#[derive(Debug)]
pub struct ServiceAccount<Name: ToAssign> {
    pub(crate) name: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) comment: String,
    pub(crate) privilege: Privilege,
    pub(crate) flags: AccountFlags,

    pub(crate) name_set: PhantomData<Name>,
}

impl Default for ServiceAccount<NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceAccount<NotSet> {
    #[must_use]
    pub fn new() -> Self {
        ServiceAccount {
            name: None,
            password: None,
            comment: String::new(),
            privilege: Privilege::default(),
            flags: AccountFlags::default(),

            name_set: PhantomData {},
        }
    }

    /// The account name, case is not significant to the OS.
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> ServiceAccount<Set> {
        ServiceAccount {
            name: Some(name.into()),
            password: self.password,
            comment: self.comment,
            privilege: self.privilege,
            flags: self.flags,

            name_set: PhantomData {},
        }
    }
}

impl<Name: ToAssign> ServiceAccount<Name> {
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Stored as the description of the user record.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Replace the default flags: password never expires and `UF_SCRIPT`.
    #[must_use]
    pub fn flags(mut self, flags: AccountFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }
}

impl ServiceAccount<Set> {
    pub(crate) fn account_name(&self) -> &str {
        self.name
            .as_deref()
            .expect("type system guarantees the name is set")
    }

    #[must_use]
    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            name: self.account_name().to_owned(),
            password: self.password.clone(),
            comment: self.comment.clone(),
            privilege: self.privilege,
            flags: self.flags,
        }
    }
}
