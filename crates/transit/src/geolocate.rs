//! Optional one-shot position fix at startup.
//!
//! When a locate endpoint is configured, a single bounded-timeout request
//! runs in the background; success moves the focal position once, any
//! failure keeps the São Paulo fallback. The UI never waits on this.

use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::position::FocalPosition;

#[derive(Debug, Deserialize)]
struct LocateFix {
    lat: f64,
    lon: f64,
}

#[derive(Component)]
pub struct LocateRequest {
    task: Task<Result<(f64, f64), String>>,
}

fn fetch_fix(url: &str, timeout: Duration) -> Result<(f64, f64), String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| format!("client error: {err}"))?;
    let fix: LocateFix = client
        .get(url)
        .send()
        .map_err(|err| format!("request error: {err}"))?
        .json()
        .map_err(|err| format!("failed to decode locate response: {err}"))?;
    Ok((fix.lat, fix.lon))
}

pub fn request_initial_fix(config: Res<BackendConfig>, mut commands: Commands) {
    let Some(url) = config.locate_url.clone() else {
        return;
    };
    let timeout = Duration::from_secs(config.locate_timeout_secs);
    let task = IoTaskPool::get().spawn(async move { fetch_fix(&url, timeout) });
    commands.spawn(LocateRequest { task });
}

pub fn poll_initial_fix(
    mut commands: Commands,
    mut requests: Query<(Entity, &mut LocateRequest)>,
    mut focal: ResMut<FocalPosition>,
) {
    for (entity, mut request) in &mut requests {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut request.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        match result {
            Ok((lat, lon)) => {
                info!("initial fix at ({lat:.5}, {lon:.5})");
                focal.update_position(lat, lon);
            }
            Err(err) => {
                // Fallback position stays; locating is best-effort.
                debug!("initial fix unavailable: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_decodes_lat_lon_payload() {
        let fix: LocateFix =
            serde_json::from_str(r#"{"lat": -23.5, "lon": -46.6, "accuracy": 120.0}"#)
                .expect("payload decodes");
        assert_eq!(fix.lat, -23.5);
        assert_eq!(fix.lon, -46.6);
    }
}
