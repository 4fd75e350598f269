// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use super::error::ConfigError;

/// Default instrument name for the text export.
pub const DEFAULT_KIT_NAME: &str = "Sample Kit";

/// Encoder settings. Every field is optional in the source files; missing
/// keys fall back to [`Settings::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Caps the number of slices below the output format's own limit.
    max_samples: Option<usize>,
    /// The instrument name written by the text export.
    kit_name: String,
    /// Re-reads and checks the written module.
    verify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_samples: None,
            kit_name: DEFAULT_KIT_NAME.to_string(),
            verify: false,
        }
    }
}

impl Settings {
    /// Loads settings from the given file (if any), with `SLICEFUR_*`
    /// environment variables taking precedence.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        Ok(builder
            .add_source(Environment::with_prefix("SLICEFUR"))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Parses settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Settings, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Resolves the effective sample cap for an output format whose hard
    /// limit is `format_limit`.
    pub fn sample_limit(&self, format_limit: usize) -> Result<usize, ConfigError> {
        match self.max_samples {
            None => Ok(format_limit),
            Some(value) if value == 0 || value > format_limit => Err(ConfigError::MaxSamples {
                value,
                limit: format_limit,
            }),
            Some(value) => Ok(value),
        }
    }

    /// Gets the text export instrument name.
    pub fn kit_name(&self) -> &str {
        &self.kit_name
    }

    /// Overrides the text export instrument name.
    pub fn set_kit_name(&mut self, kit_name: String) {
        self.kit_name = kit_name;
    }

    /// Whether the written module should be read back and checked.
    pub fn verify(&self) -> bool {
        self.verify
    }

    /// Turns read-back verification on.
    pub fn enable_verify(&mut self) {
        self.verify = true;
    }
}
