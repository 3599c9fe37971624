// SPDX-License-Identifier: GPL-3.0-only

//! Check kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// The check that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Immediate overall-health verdict reported by the device
    Status,
    /// Short device self-test (usually a few minutes)
    Short,
    /// Extended device self-test (can take hours for large drives)
    Long,
}

impl TestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of device self-test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfTestKind {
    Short,
    Long,
}

impl SelfTestKind {
    /// Value passed to `smartctl --test=`
    pub fn as_smartctl_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
        }
    }

    /// Key under `ata_smart_data.self_test.polling_minutes` holding the
    /// recommended polling period for this kind
    pub fn polling_minutes_key(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "extended",
        }
    }
}

impl From<SelfTestKind> for TestType {
    fn from(kind: SelfTestKind) -> Self {
        match kind {
            SelfTestKind::Short => TestType::Short,
            SelfTestKind::Long => TestType::Long,
        }
    }
}

impl fmt::Display for SelfTestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_smartctl_str())
    }
}
