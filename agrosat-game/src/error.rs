//! Rejection and reference errors returned by engine operations.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business-rule refusal. Always recoverable; the host shows the message as
/// in-game feedback and the session continues unchanged.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("the guide has collapsed; restart to keep farming")]
    GameOver,
    #[error("plot {plot_id} already has a crop growing; wait until it is harvested")]
    PlotOccupied { plot_id: String },
    #[error("the crop on plot {plot_id} is not ready yet ({months_remaining:.1} months left)")]
    PlotNotReady {
        plot_id: String,
        months_remaining: f64,
    },
    #[error("there is nothing to harvest on plot {plot_id}; plant something first")]
    NothingPlanted { plot_id: String },
    #[error("not enough money: need ${required}, have ${available}")]
    InsufficientFunds { required: i64, available: i64 },
    #[error("mission {mission_id} is not waiting for a decision")]
    MissionNotAwaitingChoice { mission_id: String },
    #[error("mission {mission_id} is already completed")]
    MissionCompleted { mission_id: String },
    #[error("no dialogue is waiting to be shown")]
    NoDialoguePending,
}

impl Rejection {
    /// Stable reason code for hosts that map rejections to their own copy.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GameOver => "game_over",
            Self::PlotOccupied { .. } => "plot_occupied",
            Self::PlotNotReady { .. } => "plot_not_ready",
            Self::NothingPlanted { .. } => "nothing_planted",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::MissionNotAwaitingChoice { .. } => "mission_not_awaiting_choice",
            Self::MissionCompleted { .. } => "mission_completed",
            Self::NoDialoguePending => "no_dialogue_pending",
        }
    }
}

/// An identifier that does not exist in the engine catalogs. Indicates a
/// defect in the calling layer rather than a simulation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReference {
    #[error("unknown plot id `{0}`")]
    UnknownPlot(String),
    #[error("unknown crop id `{0}`")]
    UnknownCrop(String),
    #[error("unknown mission id `{0}`")]
    UnknownMission(String),
    #[error("unknown choice `{choice_id}` for mission `{mission_id}`")]
    UnknownChoice {
        mission_id: String,
        choice_id: String,
    },
    #[error("no speed tier with multiplier x{0}")]
    UnknownSpeedTier(u32),
    #[error("unknown province id `{0}`")]
    UnknownProvince(String),
}

/// Error type for every mutating facade operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Invalid(#[from] InvalidReference),
}

impl ActionError {
    /// The business-rule rejection, if this is one.
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Invalid(_) => None,
        }
    }

    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
