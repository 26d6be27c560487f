use std::fmt::{Display, Formatter, Result};

/// What caused a rebuild to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Manual,
    Cron,
}

impl Display for TriggerSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TriggerSource::Manual => write!(f, "manual"),
            TriggerSource::Cron => write!(f, "cron"),
        }
    }
}
