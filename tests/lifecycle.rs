use service_account::directory::memory::{InMemory, Operation};
use service_account::directory::{AccountDirectory, LookupError};
use service_account::status::{NetStatus, NtStatus, Win32Error};
use service_account::{
    mutate, Change, CreateError, NameError, RightsError, ServiceAccount, SERVICE_LOGON_RIGHT,
};

fn account(name: &str) -> service_account::ServiceAccount<service_account::Set> {
    ServiceAccount::new().name(name).password("S3rvice!pw")
}

#[test]
fn create_then_exists() {
    let dir = InMemory::default();
    assert!(!account("svc-db").exists(&dir));

    account("svc-db").create(&dir).unwrap();

    assert!(account("svc-db").exists(&dir));
    assert!(account("SVC-DB").exists(&dir));
    assert!(dir.rights_of("svc-db").contains(SERVICE_LOGON_RIGHT));
    assert!(dir.policy_handles().balanced());
}

#[test]
fn create_stores_the_record() {
    let dir = InMemory::default();
    account("svc-db")
        .comment("database service")
        .create(&dir)
        .unwrap();

    let record = dir.record_of("svc-db").unwrap();
    assert_eq!(record.comment, "database service");
    assert_eq!(record.password.as_deref(), Some("S3rvice!pw"));
    assert_eq!(record.flags.bits(), 0x0001_0001);
}

#[test]
fn create_destroy_then_gone() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    dir.log_on("svc-db").unwrap();
    assert!(dir.has_profile("svc-db"));

    account("svc-db").destroy(&dir).unwrap();

    assert!(!account("svc-db").exists(&dir));
    assert_eq!(
        account("svc-db").status(&dir),
        Err(NetStatus::USER_NOT_FOUND)
    );
    assert_eq!(dir.profile_count(), 0);
    assert!(dir.policy_handles().balanced());
}

#[test]
fn create_twice_fails_with_os_status() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    assert_eq!(
        account("svc-db").create(&dir),
        Err(CreateError::AddAccount(NetStatus::USER_EXISTS))
    );
}

#[test]
fn invalid_name_is_never_silently_created() {
    let dir = InMemory::default();
    let err = account("svc:db").create(&dir).unwrap_err();
    assert_eq!(err, CreateError::InvalidName(NameError::InvalidChar(':')));
    assert_eq!(err.code(), 2202);
    assert!(!dir.called(Operation::AddUser));
    assert!(!account("svc:db").exists(&dir));
}

#[test]
fn os_rejection_surfaces_as_error() {
    let dir = InMemory::default();
    dir.fail(Operation::AddUser, NetStatus::BAD_USERNAME.0);
    assert_eq!(
        account("svc-db").create(&dir),
        Err(CreateError::AddAccount(NetStatus::BAD_USERNAME))
    );
    assert!(!dir.called(Operation::OpenPolicy));
}

#[test]
fn failed_grant_leaves_account_in_place() {
    let dir = InMemory::default();
    dir.fail(Operation::AddRights, NtStatus::ACCESS_DENIED.0 as u32);
    let err = account("svc-db").create(&dir).unwrap_err();
    assert_eq!(err.code(), -4);
    assert!(account("svc-db").exists(&dir));
    assert!(dir.rights_of("svc-db").is_empty());
    assert!(dir.policy_handles().balanced());
}

#[test]
fn teardown_tolerates_missing_rights_and_profile() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    mutate(&dir, "svc-db", Change::Revoke(SERVICE_LOGON_RIGHT)).unwrap();
    assert!(dir.rights_of("svc-db").is_empty());
    assert!(!dir.has_profile("svc-db"));

    account("svc-db").destroy(&dir).unwrap();
    assert!(!account("svc-db").exists(&dir));
}

#[test]
fn second_teardown_only_fails_at_account_deletion() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    dir.log_on("svc-db").unwrap();

    // the first run stops right before deleting the account
    dir.fail(Operation::DeleteUser, NetStatus::ACCESS_DENIED.0);
    assert_eq!(
        account("svc-db").destroy(&dir),
        Err(RightsError::AccountDelete(NetStatus::ACCESS_DENIED))
    );
    assert!(dir.rights_of("svc-db").is_empty());
    assert!(!dir.has_profile("svc-db"));

    // rights and profile are gone, that alone is no reason to fail
    dir.clear_failures();
    account("svc-db").destroy(&dir).unwrap();

    // with the record gone the sid can no longer be found
    assert_eq!(
        account("svc-db").destroy(&dir),
        Err(RightsError::SidLookup(LookupError::AccountNotFound))
    );
    assert!(dir.policy_handles().balanced());
}

#[test]
fn account_deletion_fails_once_record_is_gone() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    let mut teardown = account("svc-db").prepare_destroy(&dir).unwrap();
    dir.delete_user("svc-db").unwrap();

    assert!(teardown.perform_next().unwrap().is_some());
    assert!(teardown.perform_next().unwrap().is_some());
    assert_eq!(
        teardown.perform_next(),
        Err(RightsError::AccountDelete(NetStatus::USER_NOT_FOUND))
    );
}

#[test]
fn teardown_steps_run_in_order() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    dir.log_on("svc-db").unwrap();
    let before = dir.calls().len();

    account("svc-db").destroy(&dir).unwrap();

    assert_eq!(
        dir.calls()[before..],
        [
            Operation::LookupAccount,
            Operation::OpenPolicy,
            Operation::RemoveRights,
            Operation::SidToString,
            Operation::DeleteProfile,
            Operation::DeleteUser,
        ]
    );
}

#[test]
fn every_exit_path_releases_the_policy_handle() {
    let faults = [
        (Operation::RemoveRights, NtStatus::ACCESS_DENIED.0 as u32),
        (Operation::SidToString, Win32Error::INVALID_SID.0),
        (Operation::DeleteProfile, Win32Error::ACCESS_DENIED.0),
        (Operation::DeleteUser, NetStatus::ACCESS_DENIED.0),
    ];

    for (op, code) in faults {
        let dir = InMemory::default();
        account("svc-db").create(&dir).unwrap();
        dir.log_on("svc-db").unwrap();
        dir.fail(op, code);

        assert!(account("svc-db").destroy(&dir).is_err(), "{op:?}");
        let handles = dir.policy_handles();
        assert_eq!(handles.opened, 2, "{op:?}");
        assert!(handles.balanced(), "{op:?}");
    }
}

#[test]
fn policy_open_failure_opens_nothing() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    dir.fail(Operation::OpenPolicy, NtStatus::ACCESS_DENIED.0 as u32);

    assert_eq!(
        account("svc-db").destroy(&dir),
        Err(RightsError::PolicyOpen(NtStatus::ACCESS_DENIED))
    );
    assert!(dir.policy_handles().balanced());
    assert!(account("svc-db").exists(&dir));
}

#[test]
fn no_rollback_after_partial_teardown() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    dir.log_on("svc-db").unwrap();
    dir.fail(Operation::DeleteProfile, Win32Error::ACCESS_DENIED.0);

    let err = account("svc-db").destroy(&dir).unwrap_err();
    assert_eq!(err.step(), "delete profile");
    assert_eq!(err.code(), -8);

    assert!(dir.rights_of("svc-db").is_empty());
    assert!(dir.has_profile("svc-db"));
    assert!(account("svc-db").exists(&dir));
    assert!(!dir.called(Operation::DeleteUser));
}

#[test]
fn query_failure_counts_as_missing() {
    let dir = InMemory::default();
    account("svc-db").create(&dir).unwrap();
    dir.fail(Operation::UserInfo, NetStatus::ACCESS_DENIED.0);
    assert!(!account("svc-db").exists(&dir));
    assert_eq!(
        account("svc-db").status(&dir),
        Err(NetStatus::ACCESS_DENIED)
    );
}
