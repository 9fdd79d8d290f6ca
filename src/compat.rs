//! Integer results for callers that only understand status codes, such as
//! installers loading this crate as a DLL.
//!
//! | result | meaning |
//! |---|---|
//! | 0 | success |
//! | > 0 | net api status from adding or querying the account |
//! | -2 | sid lookup failed |
//! | -3 | opening the security policy failed |
//! | -4 | granting the right failed |
//! | -5 | revoking a single right failed |
//! | -6 | revoking all rights failed |
//! | -7 | converting the sid to a string failed |
//! | -8 | deleting the profile failed |
//! | -9 | deleting the account failed |

use crate::directory::AccountDirectory;
use crate::ServiceAccount;

pub const SUCCESS: i32 = 0;

/// Without a password the account is added with none set, the OS decides
/// whether that is acceptable.
pub fn create_service_account<D: AccountDirectory>(
    dir: &D,
    name: &str,
    password: Option<&str>,
    comment: &str,
) -> i32 {
    let mut account = ServiceAccount::new().name(name).comment(comment);
    if let Some(password) = password {
        account = account.password(password);
    }
    match account.create(dir) {
        Ok(()) => SUCCESS,
        Err(e) => e.code(),
    }
}

pub fn destroy_service_account<D: AccountDirectory>(dir: &D, name: &str) -> i32 {
    match ServiceAccount::new().name(name).destroy(dir) {
        Ok(()) => SUCCESS,
        Err(e) => e.code(),
    }
}

pub fn service_account_exists<D: AccountDirectory>(dir: &D, name: &str) -> i32 {
    match ServiceAccount::new().name(name).status(dir) {
        Ok(()) => SUCCESS,
        Err(status) => status.code(),
    }
}

#[cfg(windows)]
mod exports {
    #![allow(non_snake_case)]

    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    use crate::directory::windows::LocalMachine;
    use crate::status::NetStatus;

    /// # Safety
    /// `ptr` must be null or point to a NUL terminated UTF-16 string.
    unsafe fn read_wide(ptr: *const u16) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let mut len = 0;
        while *ptr.add(len) != 0 {
            len += 1;
        }
        let wide = std::slice::from_raw_parts(ptr, len);
        Some(OsString::from_wide(wide).to_string_lossy().into_owned())
    }

    const INVALID_PARAMETER: i32 = NetStatus::INVALID_PARAMETER.0 as i32;

    /// # Safety
    /// Every argument must be null or a NUL terminated UTF-16 string.
    #[no_mangle]
    pub unsafe extern "system" fn CreateServiceAccount(
        account_name: *const u16,
        password: *const u16,
        comment: *const u16,
    ) -> i32 {
        let Some(name) = read_wide(account_name) else {
            return INVALID_PARAMETER;
        };
        let password = read_wide(password);
        let comment = read_wide(comment).unwrap_or_default();
        super::create_service_account(&LocalMachine, &name, password.as_deref(), &comment)
    }

    /// # Safety
    /// `account_name` must be null or a NUL terminated UTF-16 string.
    #[no_mangle]
    pub unsafe extern "system" fn DestroyServiceAccount(account_name: *const u16) -> i32 {
        let Some(name) = read_wide(account_name) else {
            return INVALID_PARAMETER;
        };
        super::destroy_service_account(&LocalMachine, &name)
    }

    /// # Safety
    /// `account_name` must be null or a NUL terminated UTF-16 string.
    #[no_mangle]
    pub unsafe extern "system" fn ServiceAccountExists(account_name: *const u16) -> i32 {
        let Some(name) = read_wide(account_name) else {
            return INVALID_PARAMETER;
        };
        super::service_account_exists(&LocalMachine, &name)
    }
}
