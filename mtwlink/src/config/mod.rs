//! User configuration for mtwlink.
//!
//! Settings are read from `~/.mtwlink/config.ini` and converted into the
//! runtime [`ControllerConfig`](crate::controller::ControllerConfig) with
//! [`ConfigFile::controller_config`].
//!
//! # Example
//!
//! ```no_run
//! use mtwlink::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::load()?;
//! ConfigKey::MasterRadioChannel.set(&mut config, "11")?;
//! config.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{DEFAULT_PRINT_EVERY, MAX_RADIO_CHANNEL, MIN_RADIO_CHANNEL};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{ConfigFile, IngestSettings, LoggingSettings, MasterSettings, SessionSettings};
