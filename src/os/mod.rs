//! Platform-specific module for operating system features.

use crate::organiser::CancelToken;
use std::io;
use std::sync::OnceLock;

static INTERRUPT_TOKEN: OnceLock<CancelToken> = OnceLock::new();

#[cfg(unix)]
extern "C" fn handle_interrupt(_signal: std::ffi::c_int) {
    if let Some(token) = INTERRUPT_TOKEN.get() {
        token.cancel();
    }
}

/// Cancel `token` when the process receives SIGINT (Ctrl+C).
///
/// Can be installed once per process. The handler is one-shot: the first
/// SIGINT requests cancellation and restores the default action, so a second
/// Ctrl+C terminates the process.
#[cfg(unix)]
pub fn install_interrupt_handler(token: CancelToken) -> io::Result<()> {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    if INTERRUPT_TOKEN.set(token).is_err() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "interrupt handler already installed",
        ));
    }

    let action = SigAction::new(
        SigHandler::Handler(handle_interrupt),
        SaFlags::SA_RESTART | SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    // SAFETY: the handler only reads a OnceLock and stores to an AtomicBool
    unsafe { sigaction(Signal::SIGINT, &action) }.map_err(io::Error::from)?;
    Ok(())
}

/// Cancel `token` when the process receives Ctrl+C.
///
/// Console control handlers are not wired up on this platform; the token is
/// kept so callers behave the same everywhere.
#[cfg(not(unix))]
pub fn install_interrupt_handler(token: CancelToken) -> io::Result<()> {
    if INTERRUPT_TOKEN.set(token).is_err() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "interrupt handler already installed",
        ));
    }
    Ok(())
}
