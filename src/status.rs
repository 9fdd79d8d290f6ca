//! The three status families the account APIs report in. They are kept apart
//! on purpose: the same number means different things in each of them.

use std::fmt;

/// Status returned by the `Net*` user management calls (`NET_API_STATUS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetStatus(pub u32);

impl NetStatus {
    pub const SUCCESS: Self = Self(0);
    pub const ACCESS_DENIED: Self = Self(5);
    pub const INVALID_PARAMETER: Self = Self(87);
    pub const BAD_USERNAME: Self = Self(2202);
    pub const USER_NOT_FOUND: Self = Self(2221);
    pub const USER_EXISTS: Self = Self(2224);

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// The status as the exported functions hand it out.
    #[must_use]
    pub fn code(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for NetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = match *self {
            Self::SUCCESS => "success",
            Self::ACCESS_DENIED => "access denied",
            Self::INVALID_PARAMETER => "invalid parameter",
            Self::BAD_USERNAME => "bad user name",
            Self::USER_NOT_FOUND => "user not found",
            Self::USER_EXISTS => "user already exists",
            _ => return write!(f, "net api status {}", self.0),
        };
        write!(f, "{known} ({})", self.0)
    }
}

/// Status returned by the local security authority (`NTSTATUS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NtStatus(pub i32);

impl NtStatus {
    pub const SUCCESS: Self = Self(0);
    pub const ACCESS_DENIED: Self = Self(0xC000_0022_u32 as i32);
    pub const OBJECT_NAME_NOT_FOUND: Self = Self(0xC000_0034_u32 as i32);
    pub const NO_SUCH_PRIVILEGE: Self = Self(0xC000_0060_u32 as i32);

    #[must_use]
    pub fn is_success(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ntstatus {:#010x}", self.0 as u32)
    }
}

/// A `GetLastError` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Win32Error(pub u32);

impl Win32Error {
    pub const FILE_NOT_FOUND: Self = Self(2);
    pub const ACCESS_DENIED: Self = Self(5);
    pub const BUFFER_OVERFLOW: Self = Self(111);
    pub const INSUFFICIENT_BUFFER: Self = Self(122);
    pub const INVALID_SID: Self = Self(1337);
    pub const NONE_MAPPED: Self = Self(1332);
}

impl fmt::Display for Win32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "os error {}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn warnings_are_not_failures() {
        // STATUS_SOME_NOT_MAPPED is informational
        assert!(NtStatus(0x0000_0107).is_success());
        assert!(!NtStatus::OBJECT_NAME_NOT_FOUND.is_success());
    }

    #[test]
    fn net_status_display_names_known_codes() {
        assert_eq!(NetStatus::USER_EXISTS.to_string(), "user already exists (2224)");
        assert_eq!(NetStatus(1).to_string(), "net api status 1");
    }
}
