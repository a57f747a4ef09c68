use crate::commands::{CmdMessage, CmdResult};
use crate::config::DaybookConfig;
use crate::error::{DaybookError, Result};
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    Show,
    Set { key: String, value: String },
}

pub fn run(config_dir: &Path, action: ConfigAction) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    match action {
        ConfigAction::Show => {
            let config = DaybookConfig::load(config_dir)?;
            result.add_message(CmdMessage::info(format!(
                "owner: {}",
                display_or_unset(&config.owner)
            )));
            result.add_message(CmdMessage::info(format!(
                "repo: {}",
                display_or_unset(&config.repo)
            )));
            result.add_message(CmdMessage::info(format!("branch: {}", config.branch)));
            result.add_message(CmdMessage::info(format!("token_env: {}", config.token_env)));
            result.add_message(CmdMessage::info(format!(
                "retain_synced: {}",
                config.retain_synced
            )));
        }
        ConfigAction::Set { key, value } => {
            let mut config = DaybookConfig::load(config_dir)?;
            match key.as_str() {
                "owner" => config.owner = value.clone(),
                "repo" => config.repo = value.clone(),
                "branch" => config.branch = value.clone(),
                "token_env" => config.token_env = value.clone(),
                "retain_synced" => {
                    config.retain_synced = value.parse().map_err(|_| {
                        DaybookError::Api(format!("retain_synced must be a number, got {}", value))
                    })?
                }
                other => {
                    return Err(DaybookError::Api(format!("Unknown config key: {}", other)))
                }
            }
            config.save(config_dir)?;
            result.add_message(CmdMessage::success(format!("Set {} = {}", key, value)));
        }
    }

    Ok(result)
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
