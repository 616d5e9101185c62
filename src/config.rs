use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;

use crate::error::Error;
use crate::sts::TemporaryCredentials;

/// Timestamp format used for the persisted session expiration, second
/// precision, always UTC.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Per-profile values from the AWS CLI config file (`~/.aws/config`,
/// section `profile <name>`).
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub profile: String,
    pub region: String,
    pub ask_role: bool,
    pub keyring: bool,
    pub duration: Option<i64>,
    pub idp_id: String,
    pub sp_id: String,
    pub u2f_disabled: bool,
    pub username: String,
    pub bg_response: String,
    pub role_arn: String,
}

impl ProfileConfig {
    pub fn load(path: &Path, profile: &str) -> Result<Self, Error> {
        let mut ini = Ini::new_cs();
        ini.load(path).map_err(Error::Config)?;

        let section = format!("profile {profile}");
        if !ini.sections().contains(&section) {
            return Err(Error::Config(format!(
                "profile {profile} not found in {}",
                path.display()
            )));
        }

        let get = |key: &str| ini.get(&section, key).unwrap_or_default();
        let get_bool = |key: &str, default: bool| -> Result<bool, Error> {
            Ok(ini
                .getboolcoerce(&section, key)
                .map_err(Error::Config)?
                .unwrap_or(default))
        };

        Ok(Self {
            profile: profile.to_string(),
            region: get("region"),
            ask_role: get_bool("google_config.ask_role", true)?,
            keyring: get_bool("google_config.keyring", false)?,
            duration: ini
                .getint(&section, "google_config.duration")
                .map_err(Error::Config)?,
            idp_id: get("google_config.google_idp_id"),
            sp_id: get("google_config.google_sp_id"),
            u2f_disabled: get_bool("google_config.u2f_disabled", false)?,
            username: get("google_config.google_username"),
            bg_response: get("google_config.bg_response"),
            role_arn: get("google_config.role_arn"),
        })
    }
}

impl fmt::Display for ProfileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Profile: {}\nRegion: {}\nAsk_Role: {}\nKeyring: {}\nDuration: {:?}\nIDP_ID: {}\nSP_ID: {}\nU2F_Disabled: {}\nUsername: {}\nRole_ARN: {}",
            self.profile,
            self.region,
            self.ask_role,
            self.keyring,
            self.duration,
            self.idp_id,
            self.sp_id,
            self.u2f_disabled,
            self.username,
            self.role_arn,
        )
    }
}

pub fn aws_config_path() -> Result<PathBuf, Error> {
    aws_dir_entry("config")
}

pub fn aws_credentials_path() -> Result<PathBuf, Error> {
    aws_dir_entry("credentials")
}

fn aws_dir_entry(name: &str) -> Result<PathBuf, Error> {
    dirs::home_dir()
        .map(|home| home.join(".aws").join(name))
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))
}

/// Writes the four credential keys into the profile section of the
/// credentials file, preserving everything else in the store. The whole file
/// is rewritten through a temp file in the same directory and renamed over
/// the original, so a failed write never leaves a half-updated store behind.
///
/// Single-writer at the process level; concurrent processes racing on the
/// same file are a known limitation.
pub fn persist_credentials(
    path: &Path,
    profile: &str,
    credentials: &TemporaryCredentials,
) -> Result<(), Error> {
    let persist_error = |source: Box<dyn std::error::Error + Send + Sync>| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    let mut ini = Ini::new_cs();
    if path.exists() {
        ini.load(path).map_err(|e| persist_error(e.into()))?;
    }

    let set = |ini: &mut Ini, key: &str, value: String| {
        ini.set(profile, key, Some(value));
    };
    set(&mut ini, "aws_access_key_id", credentials.access_key_id.clone());
    set(
        &mut ini,
        "aws_secret_access_key",
        credentials.secret_access_key.clone(),
    );
    set(&mut ini, "aws_session_token", credentials.session_token.clone());
    set(
        &mut ini,
        "aws_session_expiration",
        credentials.expiration.format(EXPIRATION_FORMAT).to_string(),
    );

    let dir = path
        .parent()
        .ok_or_else(|| persist_error("credentials path has no parent directory".into()))?;
    fs::create_dir_all(dir).map_err(|e| persist_error(Box::new(e)))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| persist_error("credentials path has no file name".into()))?;
    let tmp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&tmp, ini.writes()).map_err(|e| persist_error(Box::new(e)))?;
    fs::rename(&tmp, path).map_err(|e| persist_error(Box::new(e)))?;

    log::debug!("credentials for {profile} saved to {}", path.display());
    Ok(())
}
