//! FormatRegistry maps format names to their validators and factories.
//!
//! Contests store only a format name and a JSON config; the registry turns
//! those into a boxed [`ContestFormat`] when a contest is loaded.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::{constants::formats, models::Contest};

use super::{
    BonusesContestFormat, ContestFormat, DefaultContestFormat, FormatError, Ics3uContestFormat,
};

/// Factory creating a format instance bound to a contest
pub type FormatFactory =
    Arc<dyn Fn(Arc<Contest>) -> Result<Box<dyn ContestFormat>, FormatError> + Send + Sync>;

/// Validator checking a format config before it is stored
pub type FormatValidator = Arc<dyn Fn(Option<&Value>) -> Result<(), FormatError> + Send + Sync>;

struct FormatEntry {
    display_name: String,
    validate: FormatValidator,
    factory: FormatFactory,
}

pub struct FormatRegistry {
    formats: HashMap<String, FormatEntry>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Registry with every format shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(
            formats::DEFAULT,
            "Default",
            DefaultContestFormat::validate,
            |contest| Ok(Box::new(DefaultContestFormat::new(contest))),
        );
        registry.register(
            formats::ICS3U,
            "ICS3U",
            Ics3uContestFormat::validate,
            |contest| Ok(Box::new(Ics3uContestFormat::new(contest))),
        );
        registry.register(
            formats::BONUSES,
            "Bonuses",
            BonusesContestFormat::validate,
            |contest| Ok(Box::new(BonusesContestFormat::new(contest)?)),
        );

        registry
    }

    /// Register a format. Registering an existing name replaces it.
    pub fn register<V, F>(
        &mut self,
        name: impl Into<String>,
        display_name: impl Into<String>,
        validate: V,
        factory: F,
    ) where
        V: Fn(Option<&Value>) -> Result<(), FormatError> + Send + Sync + 'static,
        F: Fn(Arc<Contest>) -> Result<Box<dyn ContestFormat>, FormatError> + Send + Sync + 'static,
    {
        self.formats.insert(
            name.into(),
            FormatEntry {
                display_name: display_name.into(),
                validate: Arc::new(validate),
                factory: Arc::new(factory),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// `(name, display name)` pairs sorted by name
    pub fn choices(&self) -> Vec<(&str, &str)> {
        let mut choices: Vec<_> = self
            .formats
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.display_name.as_str()))
            .collect();
        choices.sort_unstable();
        choices
    }

    /// Validate `config` for the format called `name`
    pub fn validate(&self, name: &str, config: Option<&Value>) -> Result<(), FormatError> {
        let entry = self
            .formats
            .get(name)
            .ok_or_else(|| FormatError::UnknownFormat(name.to_string()))?;
        (entry.validate)(config)
    }

    /// Build the format instance configured on `contest`
    pub fn build(&self, contest: Arc<Contest>) -> Result<Box<dyn ContestFormat>, FormatError> {
        let entry = self
            .formats
            .get(&contest.format_name)
            .ok_or_else(|| FormatError::UnknownFormat(contest.format_name.clone()))?;
        (entry.factory)(contest)
    }
}
