// SPDX-License-Identifier: AGPL-3.0-or-later
//! Permission sets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix-style permission bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    pub mode: u32,
}

impl Permissions {
    pub const OWNER_READ: u32 = 0o400;
    pub const OWNER_WRITE: u32 = 0o200;
    pub const OWNER_EXEC: u32 = 0o100;
    pub const GROUP_READ: u32 = 0o040;
    pub const GROUP_WRITE: u32 = 0o020;
    pub const GROUP_EXEC: u32 = 0o010;
    pub const OTHER_READ: u32 = 0o004;
    pub const OTHER_WRITE: u32 = 0o002;
    pub const OTHER_EXEC: u32 = 0o001;

    /// Permission, setuid, setgid and sticky bits
    pub const MASK: u32 = 0o7777;

    /// Keeps the permission bits of a full `st_mode`, dropping type bits
    pub fn new(mode: u32) -> Self {
        Self { mode: mode & Self::MASK }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mode & Self::MASK == 0
    }

    pub fn contains(&self, bits: u32) -> bool {
        self.mode & bits == bits
    }

    pub fn is_readable(&self) -> bool {
        self.mode & 0o444 != 0
    }

    pub fn is_writable(&self) -> bool {
        self.mode & 0o222 != 0
    }

    pub fn is_executable(&self) -> bool {
        self.mode & 0o111 != 0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const BITS: [(u32, char); 9] = [
            (Permissions::OWNER_READ, 'r'),
            (Permissions::OWNER_WRITE, 'w'),
            (Permissions::OWNER_EXEC, 'x'),
            (Permissions::GROUP_READ, 'r'),
            (Permissions::GROUP_WRITE, 'w'),
            (Permissions::GROUP_EXEC, 'x'),
            (Permissions::OTHER_READ, 'r'),
            (Permissions::OTHER_WRITE, 'w'),
            (Permissions::OTHER_EXEC, 'x'),
        ];
        for (bit, c) in BITS {
            write!(f, "{}", if self.mode & bit != 0 { c } else { '-' })?;
        }
        Ok(())
    }
}
