use service_account::cli::{run, FAILURE, SUCCESS};
use service_account::directory::memory::{InMemory, Operation};
use service_account::status::Win32Error;

fn run_cli(dir: &InMemory, args: &[&str]) -> (i32, String) {
    let mut out = Vec::new();
    let args = std::iter::once("service-account").chain(args.iter().copied());
    let code = run(dir, args, &mut out);
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn create_and_destroy() {
    let dir = InMemory::default();

    let (code, out) = run_cli(&dir, &["create", "svc-web", "pw"]);
    assert_eq!(code, SUCCESS, "{out}");
    assert!(out.contains("created service account `svc-web`"));

    let (code, out) = run_cli(&dir, &["destroy", "svc-web"]);
    assert_eq!(code, SUCCESS, "{out}");
    assert!(out.contains("destroyed service account `svc-web`"));
}

#[test]
fn comment_is_optional() {
    let dir = InMemory::default();
    let (code, _) = run_cli(&dir, &["create", "svc-web", "pw", "--comment", "web frontend"]);
    assert_eq!(code, SUCCESS);
    assert_eq!(dir.record_of("svc-web").unwrap().comment, "web frontend");
}

#[test]
fn names_and_passwords_may_start_with_a_dash() {
    let dir = InMemory::default();
    let (code, out) = run_cli(&dir, &["create", "-svc", "-pw"]);
    assert_eq!(code, SUCCESS, "{out}");
    assert_eq!(dir.record_of("-svc").unwrap().password.as_deref(), Some("-pw"));

    let (code, out) = run_cli(&dir, &["destroy", "-svc"]);
    assert_eq!(code, SUCCESS, "{out}");
    assert!(dir.record_of("-svc").is_none());
}

#[test]
fn refuses_to_create_existing_account() {
    let dir = InMemory::default();
    assert_eq!(run_cli(&dir, &["create", "svc-web", "pw"]).0, SUCCESS);
    let adds = dir
        .calls()
        .into_iter()
        .filter(|op| *op == Operation::AddUser)
        .count();

    let (code, out) = run_cli(&dir, &["create", "SVC-WEB", "other"]);
    assert_eq!(code, FAILURE);
    assert_eq!(
        out.trim_end(),
        "ERROR did not create the account because it already exists."
    );
    let adds_after = dir
        .calls()
        .into_iter()
        .filter(|op| *op == Operation::AddUser)
        .count();
    assert_eq!(adds, adds_after);
}

#[test]
fn refuses_to_destroy_missing_account() {
    let dir = InMemory::default();
    let (code, out) = run_cli(&dir, &["destroy", "svc-web"]);
    assert_eq!(code, FAILURE);
    assert!(out.starts_with("WARN did not destroy the account"));
    assert_eq!(dir.calls(), vec![Operation::UserInfo]);
    assert_eq!(dir.policy_handles().opened, 0);
}

#[test]
fn reports_teardown_code() {
    let dir = InMemory::default();
    assert_eq!(run_cli(&dir, &["create", "svc-web", "pw"]).0, SUCCESS);
    dir.log_on("svc-web").unwrap();
    dir.fail(Operation::DeleteProfile, Win32Error::ACCESS_DENIED.0);

    let (code, out) = run_cli(&dir, &["destroy", "svc-web"]);
    assert_eq!(code, FAILURE);
    assert_eq!(out.trim_end(), "ERROR failed to remove account with result=-8");
}

#[test]
fn reports_create_status() {
    let dir = InMemory::default();
    let (code, out) = run_cli(&dir, &["create", "svc/web", "pw"]);
    assert_eq!(code, FAILURE);
    assert_eq!(out.trim_end(), "ERROR failed to create account with result=2202");
}

#[test]
fn anything_else_prints_usage() {
    let dir = InMemory::default();
    let cases: [&[&str]; 7] = [
        &[],
        &["list"],
        &["create", "svc-web"],
        &["destroy"],
        &["destroy", "a", "b"],
        &["create", "a", "b", "c"],
        &["--help"],
    ];
    for args in cases {
        let (code, out) = run_cli(&dir, args);
        assert_eq!(code, FAILURE, "{args:?}");
        assert!(out.contains("create"), "{args:?}: {out}");
        assert!(out.contains("destroy"), "{args:?}: {out}");
    }
    assert!(dir.calls().is_empty());
}
