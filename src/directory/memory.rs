//! An account directory that lives entirely in memory. It follows the live
//! OS closely enough to test lifecycle logic against: rights are kept by sid
//! in a policy store separate from the user records, profiles only appear
//! once an account "logs on", and failures can be injected per operation.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use crate::account::builder::{validate_name, AccountRecord};
use crate::sid::{ResolvedAccount, Sid, SidKind};
use crate::status::{NetStatus, NtStatus, Win32Error};

use super::{AccountDirectory, LookupError, Policy, Rights};

/// Domain every local account of the fake machine resolves in.
pub const MACHINE_NAME: &str = "MEMORY";
/// Sub authorities shared by every account of the fake machine.
const MACHINE: [u32; 4] = [21, 3_623_811_015, 3_361_044_348, 30_300_820];
/// Sub authorities for names that resolve but are not local users.
const ELSEWHERE: [u32; 4] = [21, 1_644_491_937, 1_417_001_333, 725_345_543];
const FIRST_RID: u32 = 1001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LookupAccount,
    UserInfo,
    AddUser,
    DeleteUser,
    OpenPolicy,
    AddRights,
    RemoveRights,
    SidToString,
    DeleteProfile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub opened: usize,
    pub closed: usize,
}

impl HandleStats {
    #[must_use]
    pub fn balanced(&self) -> bool {
        self.opened == self.closed
    }
}

#[derive(Debug, Clone)]
struct User {
    record: AccountRecord,
    sid: Sid,
}

#[derive(Debug, Default)]
struct State {
    /// keyed by lowercased name, account names are case insensitive
    users: BTreeMap<String, User>,
    /// names that resolve without being a local user, keyed like `users`
    foreign: BTreeMap<String, ResolvedAccount>,
    rights: BTreeMap<Sid, BTreeSet<String>>,
    profiles: BTreeSet<String>,
    next_rid: u32,
    handles: HandleStats,
    faults: HashMap<Operation, u32>,
    calls: Vec<Operation>,
}

impl State {
    fn enter(&mut self, op: Operation) -> Option<u32> {
        self.calls.push(op);
        self.faults.get(&op).copied()
    }

    fn user(&self, name: &str) -> Option<&User> {
        self.users.get(&name.to_lowercase())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemory {
    state: Rc<RefCell<State>>,
}

impl InMemory {
    /// Make every future call of `op` fail with `code`. The code is read as a
    /// net api status, ntstatus or win32 error depending on the operation.
    pub fn fail(&self, op: Operation, code: u32) {
        self.state.borrow_mut().faults.insert(op, code);
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().faults.clear();
    }

    /// Makes `name` resolve to a sid of `kind` in `domain` without adding a
    /// local user, like a group or an account of a trusted domain. The sid
    /// holds the service logon right.
    pub fn add_foreign(&self, name: &str, domain: &str, kind: SidKind) {
        let mut state = self.state.borrow_mut();
        let mut subs = ELSEWHERE.to_vec();
        subs.push(FIRST_RID + state.foreign.len() as u32);
        let sid = Sid::from_parts(5, &subs);
        state.rights.insert(
            sid.clone(),
            BTreeSet::from([crate::SERVICE_LOGON_RIGHT.to_owned()]),
        );
        state.foreign.insert(
            name.to_lowercase(),
            ResolvedAccount {
                sid,
                domain: domain.to_owned(),
                kind,
            },
        );
    }

    /// Simulates the first logon of an account, which creates its profile.
    pub fn log_on(&self, name: &str) -> Result<(), NetStatus> {
        let mut state = self.state.borrow_mut();
        let sid = state
            .user(name)
            .ok_or(NetStatus::USER_NOT_FOUND)?
            .sid
            .to_string();
        state.profiles.insert(sid);
        Ok(())
    }

    #[must_use]
    pub fn has_profile(&self, name: &str) -> bool {
        let state = self.state.borrow();
        state
            .user(name)
            .is_some_and(|u| state.profiles.contains(&u.sid.to_string()))
    }

    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.state.borrow().profiles.len()
    }

    /// Rights held by the account, empty if it does not exist.
    #[must_use]
    pub fn rights_of(&self, name: &str) -> BTreeSet<String> {
        let state = self.state.borrow();
        state
            .user(name)
            .and_then(|u| state.rights.get(&u.sid))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn record_of(&self, name: &str) -> Option<AccountRecord> {
        self.state.borrow().user(name).map(|u| u.record.clone())
    }

    #[must_use]
    pub fn policy_handles(&self) -> HandleStats {
        self.state.borrow().handles
    }

    /// Every directory operation performed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.state.borrow().calls.clone()
    }

    #[must_use]
    pub fn called(&self, op: Operation) -> bool {
        self.state.borrow().calls.contains(&op)
    }
}

impl AccountDirectory for InMemory {
    type Policy = MemoryPolicy;

    fn machine_name(&self) -> Result<String, Win32Error> {
        Ok(MACHINE_NAME.to_owned())
    }

    fn lookup_account(&self, name: &str) -> Result<ResolvedAccount, LookupError> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::LookupAccount) {
            return Err(LookupError::Resolution(Win32Error(code)));
        }
        if let Some(user) = state.user(name) {
            return Ok(ResolvedAccount {
                sid: user.sid.clone(),
                domain: MACHINE_NAME.to_owned(),
                kind: SidKind::User,
            });
        }
        state
            .foreign
            .get(&name.to_lowercase())
            .cloned()
            .ok_or(LookupError::AccountNotFound)
    }

    fn user_info(&self, name: &str) -> Result<(), NetStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::UserInfo) {
            return Err(NetStatus(code));
        }
        state.user(name).map(|_| ()).ok_or(NetStatus::USER_NOT_FOUND)
    }

    fn add_user(&self, record: &AccountRecord) -> Result<(), NetStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::AddUser) {
            return Err(NetStatus(code));
        }
        if validate_name(&record.name).is_err() {
            return Err(NetStatus::BAD_USERNAME);
        }
        let key = record.name.to_lowercase();
        if state.users.contains_key(&key) {
            return Err(NetStatus::USER_EXISTS);
        }

        let rid = FIRST_RID + state.next_rid;
        state.next_rid += 1;
        let mut subs = MACHINE.to_vec();
        subs.push(rid);
        let user = User {
            record: record.clone(),
            sid: Sid::from_parts(5, &subs),
        };
        state.users.insert(key, user);
        Ok(())
    }

    fn delete_user(&self, name: &str) -> Result<(), NetStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::DeleteUser) {
            return Err(NetStatus(code));
        }
        state
            .users
            .remove(&name.to_lowercase())
            .map(|_| ())
            .ok_or(NetStatus::USER_NOT_FOUND)
    }

    fn open_policy(&self) -> Result<MemoryPolicy, NtStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::OpenPolicy) {
            return Err(NtStatus(code as i32));
        }
        state.handles.opened += 1;
        Ok(MemoryPolicy {
            state: Rc::clone(&self.state),
        })
    }

    fn sid_to_string(&self, sid: &Sid) -> Result<String, Win32Error> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::SidToString) {
            return Err(Win32Error(code));
        }
        Ok(sid.to_string())
    }

    fn delete_profile(&self, sid: &str) -> Result<(), Win32Error> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::DeleteProfile) {
            return Err(Win32Error(code));
        }
        if state.profiles.remove(sid) {
            Ok(())
        } else {
            Err(Win32Error::FILE_NOT_FOUND)
        }
    }
}

/// Policy handle of [`InMemory`], counts as closed once dropped.
#[derive(Debug)]
pub struct MemoryPolicy {
    state: Rc<RefCell<State>>,
}

impl Policy for MemoryPolicy {
    fn add_rights(&self, sid: &Sid, rights: &[&str]) -> Result<(), NtStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::AddRights) {
            return Err(NtStatus(code as i32));
        }
        if rights.iter().any(|r| !r.starts_with("Se")) {
            return Err(NtStatus::NO_SUCH_PRIVILEGE);
        }
        state
            .rights
            .entry(sid.clone())
            .or_default()
            .extend(rights.iter().map(|r| (*r).to_owned()));
        Ok(())
    }

    fn remove_rights(&self, sid: &Sid, rights: Rights<'_>) -> Result<(), NtStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.enter(Operation::RemoveRights) {
            return Err(NtStatus(code as i32));
        }
        let Some(held) = state.rights.get_mut(sid) else {
            return Err(NtStatus::OBJECT_NAME_NOT_FOUND);
        };
        match rights {
            Rights::All => held.clear(),
            Rights::Named(names) => {
                for name in names {
                    held.remove(*name);
                }
            }
        }
        if held.is_empty() {
            state.rights.remove(sid);
        }
        Ok(())
    }
}

impl Drop for MemoryPolicy {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.handles.closed += 1;
        assert!(
            state.handles.closed <= state.handles.opened,
            "policy handle released more often than opened"
        );
    }
}
