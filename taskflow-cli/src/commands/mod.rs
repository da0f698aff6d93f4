pub mod completion;
pub mod config;
pub mod session;
pub mod tasks;

use client::ClientError;

/// Wrap `err`, pointing at `login` when the session is the problem.
pub(crate) fn with_login_hint(err: ClientError) -> anyhow::Error {
    if err.requires_login() {
        anyhow::Error::new(err).context("not logged in; run `taskflow login` first")
    } else {
        err.into()
    }
}
