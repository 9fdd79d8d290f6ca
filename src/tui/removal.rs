use std::io::Write;

use dialoguer::Confirm;

use crate::account::rights::RightsError;
use crate::account::teardown::Teardown;
use crate::directory::AccountDirectory;
use crate::Tense;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The removal was canceled by the user")]
    Canceled,
    #[error("Removal aborted: {0}")]
    Aborted(#[source] RightsError),
    #[error("Could not get input from the user")]
    UserInputFailed(
        #[from]
        #[source]
        dialoguer::Error,
    ),
    #[error("Could not show the next step")]
    Output(
        #[from]
        #[source]
        std::io::Error,
    ),
}

/// Start an interactive removal wizard for a [prepared teardown](Teardown).
/// This will ask the user to confirm each step before performing it, what
/// each step does is written to `out`.
///
/// # Errors
/// This returns an error if the user canceled the removal, something went
/// wrong getting user input or one of the steps failed. A failed step ends
/// the removal, steps performed before it are not undone.
pub fn start<D: AccountDirectory>(
    teardown: Teardown<'_, D>,
    out: &mut impl Write,
) -> Result<(), Error> {
    walk(teardown, out, |prompt| {
        Confirm::new().with_prompt(prompt).interact()
    })
}

fn walk<D: AccountDirectory>(
    mut teardown: Teardown<'_, D>,
    out: &mut impl Write,
    mut confirm: impl FnMut(String) -> Result<bool, dialoguer::Error>,
) -> Result<(), Error> {
    while let Some(step) = teardown.next_step() {
        writeln!(out, "{}", teardown.describe_detailed(step, Tense::Future))?;
        if !confirm(teardown.describe(step, Tense::Questioning))? {
            return Err(Error::Canceled);
        }

        teardown.perform_next().map_err(Error::Aborted)?;
        writeln!(out, "{}", teardown.describe(step, Tense::Past))?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::directory::memory::{InMemory, Operation};
    use crate::status::Win32Error;
    use crate::ServiceAccount;

    fn prepared(dir: &InMemory) -> Teardown<'_, InMemory> {
        let account = ServiceAccount::new().name("svc").password("pw");
        account.create(dir).unwrap();
        account.prepare_destroy(dir).unwrap()
    }

    #[test]
    fn confirmed_steps_are_written_to_output() {
        let dir = InMemory::default();
        let mut out = Vec::new();
        let mut prompts = Vec::new();
        walk(prepared(&dir), &mut out, |prompt| {
            prompts.push(prompt);
            Ok(true)
        })
        .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Will revoke all rights of account `svc`"));
        assert!(out.contains("Deleted account `svc`"));
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0], "Revoke all rights of account `svc`?");
        assert!(dir.record_of("svc").is_none());
        assert!(dir.policy_handles().balanced());
    }

    #[test]
    fn declining_stops_before_the_step() {
        let dir = InMemory::default();
        let mut out = Vec::new();
        let mut answers = [true, false].into_iter();
        let err = walk(prepared(&dir), &mut out, |_| Ok(answers.next().unwrap())).unwrap_err();

        assert!(matches!(err, Error::Canceled));
        assert!(dir.rights_of("svc").is_empty());
        assert!(!dir.called(Operation::DeleteProfile));
        assert!(dir.record_of("svc").is_some());
    }

    #[test]
    fn failed_step_aborts() {
        let dir = InMemory::default();
        let teardown = prepared(&dir);
        dir.fail(Operation::DeleteProfile, Win32Error::ACCESS_DENIED.0);

        let err = walk(teardown, &mut Vec::new(), |_| Ok(true)).unwrap_err();
        match err {
            Error::Aborted(cause) => assert_eq!(cause.code(), -8),
            other => panic!("expected an aborted removal, got: {other}"),
        }
        assert!(!dir.called(Operation::DeleteUser));
    }
}
