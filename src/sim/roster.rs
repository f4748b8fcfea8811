//! Roster - Driver identity records
//!
//! Immutable driver records shared by reference between every car spawned
//! with that identity. The manifest format matches the cup21 roster file;
//! how sprites get loaded for the variant ids is the presentation layer's
//! business.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shared handle to one driver record. Many cars may point at the same
/// record when the roster is smaller than the field.
pub type DriverRef = Arc<DriverInfo>;

/// One driver's identity and visual accents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub car_num: String,
    pub driver_name: String,
    pub team: String,
    pub manufacturer: String,
    /// 1-5, clamped on parse
    pub rarity: u8,
    pub role: String,
    /// Ids of the visual variants available for this driver
    pub variants: Vec<String>,
    /// Accent color (RGB)
    pub accent: (u8, u8, u8),
}

/// Raw manifest driver entry, `{"drivers": [{"carNum": ...}, ...]}`.
#[derive(Debug, Deserialize)]
struct ManifestDriver {
    #[serde(rename = "carNum", default)]
    car_num: String,
    #[serde(rename = "carDriver", default)]
    driver_name: String,
    #[serde(rename = "carTeam", default)]
    team: String,
    #[serde(rename = "carManufacturer", default)]
    manufacturer: String,
    #[serde(rename = "carRarity", default)]
    rarity: Value,
    #[serde(rename = "carType", default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    drivers: Vec<ManifestDriver>,
}

/// Accent color for a manufacturer code.
pub fn manufacturer_accent(code: &str) -> (u8, u8, u8) {
    match code.to_ascii_uppercase().as_str() {
        "CHV" => (222, 60, 54),
        "FRD" => (78, 152, 240),
        "TYT" | "TYO" => (250, 170, 44),
        "DGE" => (200, 70, 180),
        _ => (180, 200, 230),
    }
}

/// Rarity fields arrive as either a number or a string; anything else
/// degrades to 1.
fn parse_rarity(raw: &Value) -> u8 {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.unwrap_or(1).clamp(1, 5) as u8
}

fn non_empty(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a roster manifest. A malformed manifest degrades to an empty
/// roster; entries without a car number are skipped.
pub fn roster_from_manifest(json: &str) -> Vec<DriverRef> {
    let manifest: Manifest = match serde_json::from_str(json) {
        Ok(manifest) => manifest,
        Err(err) => {
            log::warn!("roster manifest unreadable, starting with an empty roster: {err}");
            return Vec::new();
        }
    };
    let mut drivers = Vec::with_capacity(manifest.drivers.len());
    for entry in manifest.drivers {
        let car_num = entry.car_num.trim().to_string();
        if car_num.is_empty() {
            continue;
        }
        let accent = manufacturer_accent(&entry.manufacturer);
        drivers.push(Arc::new(DriverInfo {
            variants: vec![format!("cup21-{car_num}")],
            car_num,
            driver_name: non_empty(entry.driver_name, "Unknown"),
            team: non_empty(entry.team, "Team"),
            manufacturer: non_empty(entry.manufacturer, "Custom"),
            rarity: parse_rarity(&entry.rarity),
            role: non_empty(entry.role, "Closer"),
            accent,
        }));
    }
    drivers
}

/// Synthetic driver substituted when the roster is empty.
pub fn default_driver() -> DriverRef {
    Arc::new(DriverInfo {
        car_num: "00".into(),
        driver_name: "Player".into(),
        team: "Home Team".into(),
        manufacturer: "Custom".into(),
        rarity: 1,
        role: "Closer".into(),
        variants: vec!["placeholder".into()],
        accent: (180, 200, 230),
    })
}

/// Index of the roster's showcase driver: highest rarity, with a bonus
/// for the Dominator role.
pub fn pick_default_driver(roster: &[DriverRef]) -> usize {
    let mut best_idx = 0;
    let mut best_score = -1i32;
    for (idx, driver) in roster.iter().enumerate() {
        let score = driver.rarity as i32 * 10 + if driver.role == "Dominator" { 5 } else { 0 };
        if score > best_score {
            best_idx = idx;
            best_score = score;
        }
    }
    best_idx
}
