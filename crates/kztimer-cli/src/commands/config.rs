use clap::Subcommand;
use kztimer_core::TimerConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the whole configuration as TOML
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g. "pause_cooldown", "chat_prefix")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Print the config file location
    Path,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = TimerConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = TimerConfig::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = TimerConfig::load()?;
            config.set(&key, &value)?;
            config.save()?;
            tracing::info!("Set config {} = {}", key, value);
            println!("ok");
        }
        ConfigAction::Path => {
            println!("{}", TimerConfig::path()?.display());
        }
        ConfigAction::Reset => {
            TimerConfig::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
