//! Callback tokens carried by inline buttons.
//!
//! Tokens are colon-delimited and case-sensitive:
//! `MENU:OPEN`, `CHALLENGE:<ID>`, `FLOW:NEXT:<ID>:<day>`,
//! `REMIND:START:<ID>:<days>` and `CHALLENGE:CHECKIN:<ID>`.

use std::fmt;

use crate::content::{ChallengeId, PROGRAM_DAYS};
use crate::error::CallbackError;

const MENU_OPEN: &str = "MENU:OPEN";
const FLOW_NEXT: &str = "FLOW:NEXT:";
const REMIND_START: &str = "REMIND:START:";
const CHECKIN: &str = "CHALLENGE:CHECKIN:";
const CHALLENGE: &str = "CHALLENGE:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    OpenMenu,
    StartChallenge(ChallengeId),
    /// day as sent by the client; clamped when rendered
    ShowDay { challenge: ChallengeId, day: i64 },
    StartReminders { challenge: ChallengeId, days: u32 },
    CheckIn(ChallengeId),
    Unknown,
}

impl CallbackAction {
    /// Parse a token. Unrecognized prefixes yield `Unknown`; a recognized
    /// prefix with a bad tail yields an error naming that prefix.
    pub fn parse(data: &str) -> Result<CallbackAction, CallbackError> {
        if data == MENU_OPEN {
            return Ok(CallbackAction::OpenMenu);
        }
        if let Some(rest) = data.strip_prefix(FLOW_NEXT) {
            let bad = || CallbackError::Flow(data.to_string());
            let (id, day) = rest.split_once(':').ok_or_else(bad)?;
            let challenge = ChallengeId::from_token(id).ok_or_else(bad)?;
            let day = day.parse::<i64>().map_err(|_| bad())?;
            return Ok(CallbackAction::ShowDay { challenge, day });
        }
        if let Some(rest) = data.strip_prefix(REMIND_START) {
            let bad = || CallbackError::Reminder(data.to_string());
            let (id, days) = rest.split_once(':').ok_or_else(bad)?;
            let challenge = ChallengeId::from_token(id).ok_or_else(bad)?;
            let days = days.parse::<u32>().map_err(|_| bad())?;
            if days == 0 || days > PROGRAM_DAYS {
                return Err(bad());
            }
            return Ok(CallbackAction::StartReminders { challenge, days });
        }
        // must be checked before the bare CHALLENGE: prefix
        if let Some(id) = data.strip_prefix(CHECKIN) {
            return ChallengeId::from_token(id)
                .map(CallbackAction::CheckIn)
                .ok_or_else(|| CallbackError::CheckIn(data.to_string()));
        }
        if let Some(id) = data.strip_prefix(CHALLENGE) {
            return ChallengeId::from_token(id)
                .map(CallbackAction::StartChallenge)
                .ok_or_else(|| CallbackError::Challenge(data.to_string()));
        }
        Ok(CallbackAction::Unknown)
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::OpenMenu => f.write_str(MENU_OPEN),
            CallbackAction::StartChallenge(c) => write!(f, "{}{}", CHALLENGE, c),
            CallbackAction::ShowDay { challenge, day } => {
                write!(f, "{}{}:{}", FLOW_NEXT, challenge, day)
            }
            CallbackAction::StartReminders { challenge, days } => {
                write!(f, "{}{}:{}", REMIND_START, challenge, days)
            }
            CallbackAction::CheckIn(c) => write!(f, "{}{}", CHECKIN, c),
            CallbackAction::Unknown => f.write_str("UNKNOWN"),
        }
    }
}
