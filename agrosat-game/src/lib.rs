//! AgroSat Game Engine
//!
//! Platform-agnostic farm simulation for the AgroSat educational game: crop
//! growth on an accelerated clock, resource accounting, and the mission and
//! dialogue state machine. No UI, audio, or platform-specific dependencies.

pub mod clock;
pub mod config;
pub mod constants;
pub mod crops;
pub mod data;
pub mod environment;
pub mod error;
pub mod events;
pub mod missions;
pub mod numbers;
pub mod planting;
pub mod plots;
pub mod provinces;
pub mod resources;
pub mod session;
pub mod snapshot;

use std::sync::Arc;

pub use clock::{ClockAdvance, GrowthClock, SpeedPolicy, SpeedTier};
pub use config::{ConfigError, CropEffectTiming, EngineConfig};
pub use crops::{CropCatalog, CropDefinition, ReactionTier};
pub use data::{CatalogBundle, CatalogError, DataLoader, LoadError, PlotList, StaticDataLoader};
pub use environment::{EnvironmentPatch, EnvironmentalData, Season};
pub use error::{ActionError, InvalidReference, Rejection};
pub use events::EngineEvent;
pub use missions::{
    ChoiceEffects, DialogueStep, Emotion, Mission, MissionCatalog, MissionChoice, MissionEngine,
    MissionOutcome, MissionPhase, MissionProgress, NarrativeEvent, NarrativeKind, NarrativeScript,
};
pub use planting::{PlantedCrop, PlantingLedger, PlotPhase, ReadyPlots};
pub use plots::{Plot, PlotChange, PlotCondition, PlotDelta, PlotLayout, PlotMetric, PlotRegistry};
pub use provinces::{Province, ProvinceCatalog};
pub use resources::{GuideMood, LedgerChange, ResourceDelta, ResourceLedger, Resources};
pub use session::{GameSession, HarvestOutcome, PlantOutcome, SpeedChange, TickReport};
pub use snapshot::{ChoiceView, GameSessionView, MissionView, PlantingView, PlotSnapshot};

/// Builds sessions from catalogs supplied by a [`DataLoader`].
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Start a session in the configured starting province.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the configured ids are unknown.
    pub fn create_session(&self) -> anyhow::Result<GameSession> {
        let config = self.data_loader.load_engine_config()?;
        let province = config.starting_province.clone();
        self.build(config, &province)
    }

    /// Start a session in `province_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the province is unknown.
    pub fn create_session_in(&self, province_id: &str) -> anyhow::Result<GameSession> {
        let config = self.data_loader.load_engine_config()?;
        self.build(config, province_id)
    }

    fn build(&self, config: EngineConfig, province_id: &str) -> anyhow::Result<GameSession> {
        config.validate()?;
        let catalogs = self.data_loader.load_catalogs()?;
        catalogs.validate()?;
        Ok(GameSession::new(Arc::new(catalogs), config, province_id)?)
    }
}
