//! The live account database and security policy of this machine.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::{mem, ptr};

use windows_sys::Win32::Foundation::{GetLastError, LocalFree};
use windows_sys::Win32::NetworkManagement::NetManagement::{
    NetApiBufferFree, NetUserAdd, NetUserDel, NetUserGetInfo, USER_INFO_1,
};
use windows_sys::Win32::Security::Authentication::Identity::{
    LsaAddAccountRights, LsaClose, LsaOpenPolicy, LsaRemoveAccountRights, LSA_HANDLE,
    LSA_OBJECT_ATTRIBUTES, LSA_UNICODE_STRING, POLICY_CREATE_ACCOUNT, POLICY_LOOKUP_NAMES,
};
use windows_sys::Win32::Security::Authorization::ConvertSidToStringSidW;
use windows_sys::Win32::Security::{LookupAccountNameW, PSID};
use windows_sys::Win32::System::SystemInformation::GetComputerNameW;
use windows_sys::Win32::UI::Shell::DeleteProfileW;

use crate::account::builder::AccountRecord;
use crate::sid::{ResolvedAccount, Sid, SidKind, MAX_SID_SIZE};
use crate::status::{NetStatus, NtStatus, Win32Error};

use super::{AccountDirectory, LookupError, Policy, Rights};

/// NUL terminated UTF-16, what every `W` function takes.
fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(Some(0)).collect()
}

fn last_error() -> Win32Error {
    Win32Error(unsafe { GetLastError() })
}

fn sid_ptr(sid: &Sid) -> PSID {
    sid.as_bytes().as_ptr().cast_mut().cast()
}

/// Borrows a wide string (without its NUL) as an `LSA_UNICODE_STRING`.
fn lsa_string(wide: &mut [u16]) -> LSA_UNICODE_STRING {
    let len = wide.len().saturating_sub(1) * mem::size_of::<u16>();
    LSA_UNICODE_STRING {
        Length: len as u16,
        MaximumLength: (len + mem::size_of::<u16>()) as u16,
        Buffer: wide.as_mut_ptr(),
    }
}

/// A string the OS allocated with `LocalAlloc`, freed on drop.
struct LocalString(*mut u16);

impl LocalString {
    fn to_string_lossy(&self) -> String {
        let mut len = 0;
        // SAFETY: the OS hands out NUL terminated strings
        unsafe {
            while *self.0.add(len) != 0 {
                len += 1;
            }
            String::from_utf16_lossy(std::slice::from_raw_parts(self.0, len))
        }
    }
}

impl Drop for LocalString {
    fn drop(&mut self) {
        unsafe { LocalFree(self.0.cast()) };
    }
}

/// `MAX_COMPUTERNAME_LENGTH` plus the NUL.
const COMPUTER_NAME_LEN: usize = 16;

/// The machine this process runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalMachine;

impl AccountDirectory for LocalMachine {
    type Policy = LsaPolicy;

    fn machine_name(&self) -> Result<String, Win32Error> {
        let mut buffer = vec![0u16; COMPUTER_NAME_LEN];
        let mut len = buffer.len() as u32;
        if unsafe { GetComputerNameW(buffer.as_mut_ptr(), &mut len) } == 0 {
            match last_error() {
                Win32Error::BUFFER_OVERFLOW => (),
                other => return Err(other),
            }
            // len now holds the required size, NUL included
            buffer = vec![0u16; len as usize];
            if unsafe { GetComputerNameW(buffer.as_mut_ptr(), &mut len) } == 0 {
                return Err(last_error());
            }
        }
        buffer.truncate(len as usize);
        Ok(String::from_utf16_lossy(&buffer))
    }

    fn lookup_account(&self, name: &str) -> Result<ResolvedAccount, LookupError> {
        let account = wide(name);
        let mut sid_len = 0u32;
        let mut domain_len = 0u32;
        let mut kind = 0;

        // first ask how large the buffers need to be
        let ok = unsafe {
            LookupAccountNameW(
                ptr::null(),
                account.as_ptr(),
                ptr::null_mut(),
                &mut sid_len,
                ptr::null_mut(),
                &mut domain_len,
                &mut kind,
            )
        };
        if ok == 0 {
            match last_error() {
                Win32Error::INSUFFICIENT_BUFFER => (),
                Win32Error::NONE_MAPPED => return Err(LookupError::AccountNotFound),
                other => return Err(LookupError::Resolution(other)),
            }
        }

        if sid_len == 0 {
            sid_len = MAX_SID_SIZE as u32;
        }
        let mut sid = vec![0u8; sid_len as usize];
        let mut domain = vec![0u16; domain_len.max(1) as usize];
        let mut domain_len = domain.len() as u32;

        let ok = unsafe {
            LookupAccountNameW(
                ptr::null(),
                account.as_ptr(),
                sid.as_mut_ptr().cast(),
                &mut sid_len,
                domain.as_mut_ptr(),
                &mut domain_len,
                &mut kind,
            )
        };
        if ok == 0 {
            return match last_error() {
                Win32Error::NONE_MAPPED => Err(LookupError::AccountNotFound),
                other => Err(LookupError::Resolution(other)),
            };
        }

        let sid = Sid::from_bytes(&sid).map_err(|e| {
            tracing::error!("os returned a malformed sid for `{name}`: {e}");
            LookupError::Resolution(Win32Error::INVALID_SID)
        })?;
        domain.truncate(domain_len as usize);
        Ok(ResolvedAccount {
            sid,
            domain: String::from_utf16_lossy(&domain),
            kind: SidKind::from_raw(kind),
        })
    }

    fn user_info(&self, name: &str) -> Result<(), NetStatus> {
        let name = wide(name);
        let mut info: *mut u8 = ptr::null_mut();
        let status = unsafe { NetUserGetInfo(ptr::null(), name.as_ptr(), 0, &mut info) };
        if !info.is_null() {
            unsafe { NetApiBufferFree(info.cast()) };
        }
        match NetStatus(status) {
            NetStatus::SUCCESS => Ok(()),
            err => Err(err),
        }
    }

    fn add_user(&self, record: &AccountRecord) -> Result<(), NetStatus> {
        let mut name = wide(&record.name);
        let mut password = record.password.as_deref().map(wide);
        let mut comment = wide(&record.comment);

        // SAFETY: USER_INFO_1 is plain data, all zeroes is a valid value
        let mut info: USER_INFO_1 = unsafe { mem::zeroed() };
        info.usri1_name = name.as_mut_ptr();
        info.usri1_password = password
            .as_mut()
            .map_or(ptr::null_mut(), |p| p.as_mut_ptr());
        info.usri1_priv = record.privilege.raw() as _;
        info.usri1_comment = comment.as_mut_ptr();
        info.usri1_flags = record.flags.bits() as _;

        let mut param_error = 0u32;
        let status = unsafe {
            NetUserAdd(
                ptr::null(),
                1,
                ptr::addr_of!(info).cast(),
                &mut param_error,
            )
        };
        match NetStatus(status) {
            NetStatus::SUCCESS => Ok(()),
            err => {
                tracing::debug!("NetUserAdd rejected parameter {param_error}");
                Err(err)
            }
        }
    }

    fn delete_user(&self, name: &str) -> Result<(), NetStatus> {
        let name = wide(name);
        match NetStatus(unsafe { NetUserDel(ptr::null(), name.as_ptr()) }) {
            NetStatus::SUCCESS => Ok(()),
            err => Err(err),
        }
    }

    fn open_policy(&self) -> Result<LsaPolicy, NtStatus> {
        // SAFETY: the attributes are reserved and must be zeroed
        let attributes: LSA_OBJECT_ATTRIBUTES = unsafe { mem::zeroed() };
        let mut handle: LSA_HANDLE = unsafe { mem::zeroed() };
        let status = NtStatus(unsafe {
            LsaOpenPolicy(
                ptr::null(),
                &attributes,
                (POLICY_CREATE_ACCOUNT | POLICY_LOOKUP_NAMES) as u32,
                &mut handle,
            )
        });
        if status.is_success() {
            Ok(LsaPolicy { handle })
        } else {
            Err(status)
        }
    }

    fn sid_to_string(&self, sid: &Sid) -> Result<String, Win32Error> {
        let mut out: *mut u16 = ptr::null_mut();
        if unsafe { ConvertSidToStringSidW(sid_ptr(sid), &mut out) } == 0 {
            return Err(last_error());
        }
        Ok(LocalString(out).to_string_lossy())
    }

    fn delete_profile(&self, sid: &str) -> Result<(), Win32Error> {
        let sid = wide(sid);
        if unsafe { DeleteProfileW(sid.as_ptr(), ptr::null(), ptr::null()) } == 0 {
            return Err(last_error());
        }
        Ok(())
    }
}

/// Handle from `LsaOpenPolicy`, closed on drop.
pub struct LsaPolicy {
    handle: LSA_HANDLE,
}

impl Policy for LsaPolicy {
    fn add_rights(&self, sid: &Sid, rights: &[&str]) -> Result<(), NtStatus> {
        let mut wides: Vec<_> = rights.iter().map(|r| wide(r)).collect();
        let strings: Vec<_> = wides.iter_mut().map(|w| lsa_string(w)).collect();
        let status = NtStatus(unsafe {
            LsaAddAccountRights(
                self.handle,
                sid_ptr(sid),
                strings.as_ptr(),
                strings.len() as u32,
            )
        });
        if status.is_success() {
            Ok(())
        } else {
            Err(status)
        }
    }

    fn remove_rights(&self, sid: &Sid, rights: Rights<'_>) -> Result<(), NtStatus> {
        let names = match rights {
            Rights::All => &[][..],
            Rights::Named(names) => names,
        };
        let all_rights = u8::from(matches!(rights, Rights::All));

        let mut wides: Vec<_> = names.iter().map(|r| wide(r)).collect();
        let strings: Vec<_> = wides.iter_mut().map(|w| lsa_string(w)).collect();
        let list = if strings.is_empty() {
            ptr::null()
        } else {
            strings.as_ptr()
        };
        let status = NtStatus(unsafe {
            LsaRemoveAccountRights(
                self.handle,
                sid_ptr(sid),
                all_rights,
                list,
                strings.len() as u32,
            )
        });
        if status.is_success() {
            Ok(())
        } else {
            Err(status)
        }
    }
}

impl Drop for LsaPolicy {
    fn drop(&mut self) {
        let status = NtStatus(unsafe { LsaClose(self.handle) });
        if !status.is_success() {
            tracing::warn!("could not close policy handle: {status}");
        }
    }
}
