use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Conf {
    pub id: String,
    pub log_format: String,
    pub data_directory: PathBuf,
    pub rest_server_port: u16,
    pub rest_server_max_body_size: usize,
    pub chain_id: u64,
    /// Manual clock and the `advance_time` route.
    pub dev_mode: bool,
    /// Keep the chain state in `data_directory` across restarts.
    pub persist: bool,
}

impl Conf {
    /// Built-in defaults, then `file` if given, then `FAUCET_*` variables.
    pub fn new(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../../config.toml"),
            FileFormat::Toml,
        ));
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(true));
        }
        builder
            .add_source(Environment::with_prefix("FAUCET"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")
    }
}
