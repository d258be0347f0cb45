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

//! Implements zone loading.

use std::fmt::Write;
use std::fs::File;
use std::io::BufReader;
use std::thread;

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};

use qdns::zone::{Catalog, Zone};
use qdns::zone_file::Parser;

use crate::config::ZoneConfig;

/// Loads the zones configured in `zones` into a new [`Catalog`].
///
/// Each zone is loaded on its own thread, and the catalog is only
/// filled once every thread has finished. A zone that fails to load is
/// logged and left out; it is an error only if no zone loads at all.
pub fn load(zones: &[ZoneConfig]) -> Result<Catalog> {
    let results: Vec<(&ZoneConfig, Result<Zone>)> = thread::scope(|scope| {
        let handles: Vec<_> = zones
            .iter()
            .map(|zone_config| (zone_config, scope.spawn(move || load_zone(zone_config))))
            .collect();
        handles
            .into_iter()
            .map(|(zone_config, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow!("the zone loading thread panicked")));
                (zone_config, result)
            })
            .collect()
    });

    let mut catalog = Catalog::new();
    let mut zones_failed = 0;
    for (zone_config, result) in results {
        let result = result.and_then(|zone| {
            catalog
                .insert(zone)
                .context("failed to add the zone to the catalog")
        });
        if let Err(e) = result {
            let mut message = format!("Failed to load {}:", zone_config.name.0);
            for (i, cause) in e.chain().enumerate() {
                let _ = write!(message, "\n[{}] {}", i + 1, cause);
            }
            error!("{}", message);
            zones_failed += 1;
        }
    }

    if zones_failed == 1 {
        error!("1 zone failed to load.");
    } else if zones_failed > 1 {
        error!("{} zones failed to load.", zones_failed);
    }

    if catalog.is_empty() {
        Err(anyhow!("no zone was loaded successfully"))
    } else {
        info!("Loaded {} of {} zones.", catalog.len(), zones.len());
        Ok(catalog)
    }
}

/// Loads a single zone from all of its files.
fn load_zone(zone_config: &ZoneConfig) -> Result<Zone> {
    let name = &zone_config.name.0;
    let mut zone = Zone::new(name.clone());
    for path in &zone_config.paths {
        debug!("Loading {} from {}.", name, path.display());
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let n_records = Parser::new(BufReader::new(file), &mut zone)
            .parse()
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!("Read {} records from {}.", n_records, path.display());
    }

    // An $ORIGIN directive can move an empty zone elsewhere.
    if zone.origin() != name {
        return Err(anyhow!(
            "the zone files set the origin to {}, not {}",
            zone.origin(),
            name,
        ));
    }
    if zone.is_empty() {
        return Err(anyhow!("the zone has no records"));
    }
    Ok(zone)
}
