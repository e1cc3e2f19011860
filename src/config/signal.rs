// src/config/signal.rs

//! Table of stop signals a program may be configured with.

use std::fmt;
use std::str::FromStr;

use nix::sys::signal::Signal;

use crate::errors::TaskmasterError;

/// Short signal names accepted in `stopsignal`, in the order they are listed
/// in error messages.
const SIGNALS: &[(&str, Signal)] = &[
    ("ABRT", Signal::SIGABRT),
    ("ALRM", Signal::SIGALRM),
    ("BUS", Signal::SIGBUS),
    ("CHLD", Signal::SIGCHLD),
    ("CONT", Signal::SIGCONT),
    ("FPE", Signal::SIGFPE),
    ("HUP", Signal::SIGHUP),
    ("ILL", Signal::SIGILL),
    ("INT", Signal::SIGINT),
    ("IO", Signal::SIGIO),
    ("IOT", Signal::SIGABRT),
    ("KILL", Signal::SIGKILL),
    ("PIPE", Signal::SIGPIPE),
    ("PROF", Signal::SIGPROF),
    ("QUIT", Signal::SIGQUIT),
    ("SEGV", Signal::SIGSEGV),
    ("STOP", Signal::SIGSTOP),
    ("SYS", Signal::SIGSYS),
    ("TERM", Signal::SIGTERM),
    ("TRAP", Signal::SIGTRAP),
    ("TSTP", Signal::SIGTSTP),
    ("TTIN", Signal::SIGTTIN),
    ("TTOU", Signal::SIGTTOU),
    ("URG", Signal::SIGURG),
    ("USR1", Signal::SIGUSR1),
    ("USR2", Signal::SIGUSR2),
    ("VTALRM", Signal::SIGVTALRM),
    ("WINCH", Signal::SIGWINCH),
    ("XCPU", Signal::SIGXCPU),
    ("XFSZ", Signal::SIGXFSZ),
];

/// A validated stop signal.
///
/// Keeps the configured short name next to the OS signal so that `IOT` and
/// `ABRT` stay distinguishable when two specs are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopSignal {
    name: &'static str,
    signal: Signal,
}

impl StopSignal {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        StopSignal {
            name: "INT",
            signal: Signal::SIGINT,
        }
    }
}

impl FromStr for StopSignal {
    type Err = TaskmasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let short = trimmed.strip_prefix("SIG").unwrap_or(trimmed);

        SIGNALS
            .iter()
            .find(|(name, _)| *name == short)
            .map(|&(name, signal)| StopSignal { name, signal })
            .ok_or_else(|| TaskmasterError::InvalidSignal(s.to_string()))
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
