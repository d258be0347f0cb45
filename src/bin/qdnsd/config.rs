// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the server configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use qdns::name::Name;

use crate::args::RunArgs;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the server configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config =
        fs::read_to_string(path.as_ref()).context("failed to read the configuration file")?;
    let mut config = parse(&raw_config)?;

    // When loading the configuration from a path, all zone file paths
    // are interpreted relative to the configuration file's directory.
    for zone_config in &mut config.zones {
        for path in &mut zone_config.paths {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }

    log_config_summary(&config);
    Ok(config)
}

/// Parses the text of a configuration file.
fn parse(raw_config: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(raw_config).context("failed to parse the configuration file")?;
    if let Some(zone_config) = config.zones.iter().find(|z| z.paths.is_empty()) {
        return Err(anyhow!("zone {} has no zone files", zone_config.name.0));
    }
    Ok(config)
}

/// Loads the server configuration from the parsed command line
/// arguments given by `args`. Zone files that name the same zone are
/// gathered into a single [`ZoneConfig`].
pub fn load_from_args(args: RunArgs) -> Config {
    let bind = args.bind.unwrap_or_else(|| {
        let ip = args.ip.unwrap_or(DEFAULT_BIND_IP);
        let port = args.port.unwrap_or(DEFAULT_BIND_PORT);
        SocketAddr::new(ip, port)
    });

    let mut zones: Vec<ZoneConfig> = Vec::new();
    for description in args.zones {
        match zones.iter_mut().find(|z| z.name.0 == description.name) {
            Some(zone_config) => zone_config.paths.push(description.path),
            None => zones.push(ZoneConfig {
                name: ConfigName(description.name),
                paths: vec![description.path],
            }),
        }
    }

    let config = Config { bind, zones };
    log_config_summary(&config);
    config
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let mut message = format!(
        "Configuration loaded:\n\
         Bind address: {}\n\
         Zones:        ",
        config.bind,
    );
    if config.zones.is_empty() {
        message.push_str("none to load");
    } else {
        let _ = write!(message, "{} to load", config.zones.len());
        for zone_config in &config.zones {
            let _ = write!(
                message,
                "\n  {} ({} file{})",
                zone_config.name.0,
                zone_config.paths.len(),
                if zone_config.paths.len() == 1 { "" } else { "s" },
            );
        }
    }
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    pub zones: Vec<ZoneConfig>,
}

const DEFAULT_BIND_IP: IpAddr = IpAddr::V6(Ipv6Addr::LOCALHOST);
const DEFAULT_BIND_PORT: u16 = 53;

fn default_bind() -> SocketAddr {
    SocketAddr::new(DEFAULT_BIND_IP, DEFAULT_BIND_PORT)
}

/// The configuration of a single zone. A zone may be split across
/// several files, which are read in order into the same zone.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub name: ConfigName,
    pub paths: Vec<PathBuf>,
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER QDNS TYPES FOR SERDE                                 //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`qdns`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`qdns`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigName, Name, "domain name");
