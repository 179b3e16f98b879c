//! Fixed-ratio split of a consumption total across household zones.

use serde::{Deserialize, Serialize};

/// A household water-use category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Kitchen,
    Bathroom,
    Garden,
    Outdoor,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Kitchen, Zone::Bathroom, Zone::Garden, Zone::Outdoor];

    /// Share of the total assigned to this zone. The four weights sum to 1.
    pub const fn weight(self) -> f64 {
        match self {
            Zone::Kitchen => 0.35,
            Zone::Bathroom => 0.40,
            Zone::Garden => 0.15,
            Zone::Outdoor => 0.10,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Zone::Kitchen => "kitchen",
            Zone::Bathroom => "bathroom",
            Zone::Garden => "garden",
            Zone::Outdoor => "outdoor",
        }
    }
}

/// Liters assigned to each zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub kitchen: f64,
    pub bathroom: f64,
    pub garden: f64,
    pub outdoor: f64,
}

impl Allocation {
    pub fn get(&self, zone: Zone) -> f64 {
        match zone {
            Zone::Kitchen => self.kitchen,
            Zone::Bathroom => self.bathroom,
            Zone::Garden => self.garden,
            Zone::Outdoor => self.outdoor,
        }
    }

    pub fn total(&self) -> f64 {
        Zone::ALL.iter().map(|z| self.get(*z)).sum()
    }
}

/// Round to two decimal places, half away from zero.
///
/// Magnitudes too large to scale by 100 are returned unchanged; they carry
/// no fractional cents anyway.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// Split `total_liters` by the zone weights, rounding each share on its own.
///
/// Shares are not renormalized after rounding, so their sum may drift from
/// the total by up to a cent per zone.
pub fn allocate(total_liters: f64) -> Allocation {
    let share = |zone: Zone| round2(total_liters * zone.weight());
    Allocation {
        kitchen: share(Zone::Kitchen),
        bathroom: share(Zone::Bathroom),
        garden: share(Zone::Garden),
        outdoor: share(Zone::Outdoor),
    }
}
