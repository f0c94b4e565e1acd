use std::error::Error;

use crate::core::config::data::path_display;
use crate::core::config::Config;

#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print stored and effective settings (default)
    Show,
    /// Set a configuration value
    Set {
        /// One of: base-url, model, api-key-env, target-language, markdown
        key: String,
        /// Value to store (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Remove a configuration value
    Unset { key: String },
    /// Print the config file location
    Path,
}

pub fn run_config(action: Option<ConfigAction>) -> Result<(), Box<dyn Error>> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            Config::load()?.print_all();
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            let value = value.join(" ");
            config.set_value(&key, &value)?;
            let path = config.save()?;
            println!("✅ Set {key} to: {value} ({})", path_display(&path));
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
        }
        ConfigAction::Path => {
            println!("{}", path_display(Config::config_path()?));
        }
    }
    Ok(())
}
