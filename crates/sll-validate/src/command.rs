use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of ledger commands.
///
/// A transition is always tagged with exactly one command. Dispatch is an
/// exhaustive match over this enum — there is no open-ended command table,
/// and a command routed to a validator that does not handle it is rejected
/// as unsupported rather than falling through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Issue the first version of a book record. No prior version.
    Create,
    /// Lend an idle book to an entitled party.
    Borrow,
    /// Give a borrowed book back, either to the owner or straight to the
    /// next queued requester.
    Return,
    /// Append one borrow request to the queue of a borrowed book.
    AddRequest,
    /// Register a student record. Operates on student records only.
    CreateStudent,
}

impl Command {
    /// Whether this command consumes a prior committed version.
    pub fn requires_prior(&self) -> bool {
        match self {
            Self::Create | Self::CreateStudent => false,
            Self::Borrow | Self::Return | Self::AddRequest => true,
        }
    }

    /// Stable lowercase name, used in logs and rejection messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Borrow => "borrow",
            Self::Return => "return",
            Self::AddRequest => "add-request",
            Self::CreateStudent => "create-student",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
