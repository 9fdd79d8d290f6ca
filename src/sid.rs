use std::fmt;

use itertools::Itertools;

/// Largest SID the OS will ever hand out (`SECURITY_MAX_SID_SIZE`).
pub const MAX_SID_SIZE: usize = 68;

const MAX_SUB_AUTHORITIES: usize = 15;

/// An owned security identifier.
///
/// The OS hands SIDs out in buffers it may reuse, so we always copy the bytes
/// out before doing anything else with them.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sid(Box<[u8]>);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SidError {
    #[error("a sid is at least 8 bytes, got {0}")]
    TooShort(usize),
    #[error("unknown sid revision: {0}")]
    Revision(u8),
    #[error("sid claims {claimed} sub authorities but holds {len} bytes")]
    Length { claimed: u8, len: usize },
}

impl Sid {
    /// Copies a SID out of an OS buffer, trimming any slack after it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidError> {
        if bytes.len() < 8 {
            return Err(SidError::TooShort(bytes.len()));
        }
        if bytes[0] != 1 {
            return Err(SidError::Revision(bytes[0]));
        }
        let claimed = bytes[1];
        let needed = 8 + 4 * usize::from(claimed);
        if usize::from(claimed) > MAX_SUB_AUTHORITIES || bytes.len() < needed {
            return Err(SidError::Length {
                claimed,
                len: bytes.len(),
            });
        }
        Ok(Self(bytes[..needed].into()))
    }

    /// # Panics
    /// When given more than 15 sub authorities or an authority that does
    /// not fit in 48 bits.
    #[must_use]
    pub fn from_parts(authority: u64, sub_authorities: &[u32]) -> Self {
        assert!(sub_authorities.len() <= MAX_SUB_AUTHORITIES);
        assert!(authority < 1 << 48, "identifier authority is 48 bits");

        let mut bytes = Vec::with_capacity(8 + 4 * sub_authorities.len());
        bytes.push(1);
        bytes.push(sub_authorities.len() as u8);
        bytes.extend_from_slice(&authority.to_be_bytes()[2..]);
        for sub in sub_authorities {
            bytes.extend_from_slice(&sub.to_le_bytes());
        }
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn authority(&self) -> u64 {
        let mut be = [0u8; 8];
        be[2..].copy_from_slice(&self.0[2..8]);
        u64::from_be_bytes(be)
    }

    pub fn sub_authorities(&self) -> impl Iterator<Item = u32> + '_ {
        self.0[8..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// The last sub authority, for accounts this is their relative id.
    #[must_use]
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities().last()
    }
}

/// Renders the canonical `S-1-5-21-...` form, same as `ConvertSidToStringSid`.
impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authority = self.authority();
        write!(f, "S-{}-", self.0[0])?;
        if authority >= 1 << 32 {
            write!(f, "{authority:#014X}")?;
        } else {
            write!(f, "{authority}")?;
        }
        if self.0[1] > 0 {
            write!(f, "-{}", self.sub_authorities().join("-"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sid({self})")
    }
}

/// What kind of object a name resolved to (`SID_NAME_USE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidKind {
    User,
    Group,
    Domain,
    Alias,
    WellKnownGroup,
    DeletedAccount,
    Invalid,
    Unknown,
    Computer,
    Label,
    LogonSession,
}

impl SidKind {
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::User,
            2 => Self::Group,
            3 => Self::Domain,
            4 => Self::Alias,
            5 => Self::WellKnownGroup,
            6 => Self::DeletedAccount,
            7 => Self::Invalid,
            9 => Self::Computer,
            10 => Self::Label,
            11 => Self::LogonSession,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of resolving an account name on the local machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccount {
    pub sid: Sid,
    pub domain: String,
    pub kind: SidKind,
}
