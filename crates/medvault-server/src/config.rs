use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use medvault_core::admin::AdminCredentials;
use medvault_core::upload::UploadPolicy;
use medvault_db::DbConfig;
use medvault_store::StoreConfig;

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "MEDVAULT_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "MEDVAULT_PORT", default_value = "8000")]
    pub port: u16,

    /// SQLite metadata file. Defaults to `<data dir>/medvault.db`.
    #[arg(long, env = "MEDVAULT_SQLITE_PATH")]
    pub sqlite_path: Option<String>,

    /// Postgres URL. Takes precedence over SQLite when set.
    #[arg(long, env = "MEDVAULT_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Root for local state: the SQLite file and, without S3, the blobs.
    #[arg(long, env = "MEDVAULT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Also require uploads to start with the `%PDF-` signature
    #[arg(long, env = "MEDVAULT_SNIFF_PDF")]
    pub sniff_pdf: bool,

    #[command(flatten)]
    pub admin: AdminArgs,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn db_config(&self) -> DbConfig {
        let env = DbConfig::from_env();
        let sqlite_path = self.sqlite_path.clone().or_else(|| {
            self.data_dir
                .as_ref()
                .map(|dir| dir.join("medvault.db").to_string_lossy().into_owned())
        });
        DbConfig {
            database_url: self
                .database_url
                .clone()
                .filter(|url| !url.is_empty())
                .or(env.database_url),
            sqlite_path: sqlite_path.or(env.sqlite_path),
        }
    }

    /// S3 settings come from the environment; the local root from `--data-dir`.
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::from_env();
        config.local_data_dir = self
            .data_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());
        config
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            sniff_magic: self.sniff_pdf,
        }
    }
}

#[derive(Clone, Default, Args)]
pub struct AdminArgs {
    /// Admin account to create at startup
    #[arg(long, env = "MEDVAULT_ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    #[arg(long, env = "MEDVAULT_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, env = "MEDVAULT_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl fmt::Debug for AdminArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminArgs")
            .field("admin_username", &self.admin_username)
            .field("admin_email", &self.admin_email)
            .finish_non_exhaustive()
    }
}

impl AdminArgs {
    /// `None` when nothing was given. A partial set is an error.
    pub fn credentials(&self) -> Result<Option<AdminCredentials>> {
        let given = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);
        match (
            given(&self.admin_username),
            given(&self.admin_email),
            given(&self.admin_password),
        ) {
            (None, None, None) => Ok(None),
            (Some(username), Some(email), Some(password)) => Ok(Some(AdminCredentials {
                username,
                email,
                password,
            })),
            (username, email, password) => {
                let missing: Vec<&str> = [
                    ("--admin-username", username.is_none()),
                    ("--admin-email", email.is_none()),
                    ("--admin-password", password.is_none()),
                ]
                .into_iter()
                .filter_map(|(flag, absent)| absent.then_some(flag))
                .collect();
                bail!("incomplete admin credentials, missing {}", missing.join(", "))
            }
        }
    }
}
