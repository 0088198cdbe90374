use std::fmt;
use std::str::FromStr;

/// Lifecycle of a scheduled item.
///
/// `Scheduled` is the initial state. The publish worker claims a due row by
/// moving it to `Publishing`, then records the terminal outcome as
/// `Published` or `Failed`. A transient publisher error releases the claim
/// back to `Scheduled` so a later poll retries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Scheduled,
    Publishing,
    Published,
    Failed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Publishing => "publishing",
            ScheduleStatus::Published => "published",
            ScheduleStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScheduleStatus::Published | ScheduleStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ScheduleStatus) -> bool {
        use ScheduleStatus::*;
        matches!(
            (self, next),
            (Scheduled, Publishing)
                | (Publishing, Published)
                | (Publishing, Failed)
                | (Publishing, Scheduled)
        )
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ScheduleStatus::Scheduled),
            "publishing" => Ok(ScheduleStatus::Publishing),
            "published" => Ok(ScheduleStatus::Published),
            "failed" => Ok(ScheduleStatus::Failed),
            other => Err(format!("unknown schedule status: {}", other)),
        }
    }
}
