// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persistent application settings.
//!
//! Stored as TOML through `confy`. Every field has a serde default so files
//! written by older versions keep loading.

use std::path::PathBuf;

use par_core::frame::DEFAULT_HISTORY_DOTS;
use par_core::sim::DEFAULT_TARGET_COUNT;
use par_core::telemetry::DEFAULT_LISTEN_ADDRESS;
use par_core::{DisplaySettings, RunwayConfiguration};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "par-display";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Settings schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Last runway configuration; `None` shows the demo runway
    #[serde(default)]
    pub runway: Option<RunwayConfiguration>,

    /// Trail dots drawn per target (1 - 20)
    #[serde(default = "default_history_dots")]
    pub history_dots: usize,

    /// Draw ground traffic
    #[serde(default)]
    pub show_ground: bool,

    /// Telemetry listen address in host:port format
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Directory containing runways.csv
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Feed synthetic traffic into the display
    #[serde(default)]
    pub simulate: bool,

    #[serde(default = "default_simulated_targets")]
    pub simulated_targets: usize,
}

fn default_config_version() -> u32 {
    1
}

fn default_history_dots() -> usize {
    DEFAULT_HISTORY_DOTS
}

fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_simulated_targets() -> usize {
    DEFAULT_TARGET_COUNT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            runway: None,
            history_dots: default_history_dots(),
            show_ground: false,
            listen_address: default_listen_address(),
            data_dir: None,
            simulate: false,
            simulated_targets: default_simulated_targets(),
        }
    }
}

impl Settings {
    /// Load settings from disk, creating the file with defaults if missing.
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Settings file path, for display to the user.
    pub fn config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Display options, clamped to valid ranges.
    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings::new(self.history_dots, self.show_ground)
    }

    /// Remember display options chosen in the UI.
    pub fn set_display_settings(&mut self, display: DisplaySettings) {
        self.history_dots = display.history_dots();
        self.show_ground = display.show_ground;
    }

    /// Where to look for reference data: the configured directory, or the
    /// platform data directory.
    pub fn reference_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.runway.is_none());
        assert_eq!(settings.history_dots, DEFAULT_HISTORY_DOTS);
        assert_eq!(settings.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert!(!settings.simulate);
    }

    #[test]
    fn test_display_settings_clamped() {
        let settings = Settings {
            history_dots: 99,
            show_ground: true,
            ..Settings::default()
        };
        let display = settings.display_settings();
        assert_eq!(display.history_dots(), 20);
        assert!(display.show_ground);

        let mut settings = Settings::default();
        settings.set_display_settings(DisplaySettings::new(7, true));
        assert_eq!(settings.history_dots, 7);
        assert!(settings.show_ground);
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/srv/par")),
            ..Settings::default()
        };
        assert_eq!(settings.reference_data_dir(), Some(PathBuf::from("/srv/par")));
    }
}
