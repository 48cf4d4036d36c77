use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::classify::Region;
use crate::error::PipelineError;

/// A gazetteer hit: the matched place name plus its coordinates and region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region: Region,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region: Region,
}

/// Fixed table of known ancient/alternative-history sites.
///
/// Lookup scans entries front to back and returns the first whose name occurs
/// in the input, so table order is part of the contract: more specific names
/// must precede the generic ones they contain (e.g. "nazca lines" follows
/// "nazca" here only because both resolve identically).
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
}

// (name, latitude, longitude, region) in scan order.
const BUILTIN_SITES: &[(&str, f64, f64, Region)] = &[
    // Turkey
    ("gobekli tepe", 37.2233, 38.9224, Region::Asia),
    ("gobeklitepe", 37.2233, 38.9224, Region::Asia),
    ("göbekli tepe", 37.2233, 38.9224, Region::Asia),
    ("karahan tepe", 37.0667, 39.1833, Region::Asia),
    ("tas tepeler", 37.2233, 38.9224, Region::Asia),
    ("catalhoyuk", 37.6661, 32.8281, Region::Asia),
    ("çatalhöyük", 37.6661, 32.8281, Region::Asia),
    ("derinkuyu", 38.3747, 34.7344, Region::Asia),
    ("cappadocia", 38.6431, 34.8289, Region::Asia),
    // Egypt
    ("giza", 29.9792, 31.1342, Region::Mediterranean),
    ("great pyramid", 29.9792, 31.1342, Region::Mediterranean),
    ("pyramid of giza", 29.9792, 31.1342, Region::Mediterranean),
    ("khufu", 29.9792, 31.1342, Region::Mediterranean),
    ("cheops", 29.9792, 31.1342, Region::Mediterranean),
    ("sphinx", 29.9753, 31.1376, Region::Mediterranean),
    ("karnak", 25.7188, 32.6573, Region::Mediterranean),
    ("luxor", 25.6872, 32.6396, Region::Mediterranean),
    ("abu simbel", 22.3372, 31.6258, Region::Mediterranean),
    ("saqqara", 29.8713, 31.2165, Region::Mediterranean),
    ("abydos", 26.1853, 31.9190, Region::Mediterranean),
    ("dendera", 26.1416, 32.6700, Region::Mediterranean),
    ("osireion", 26.1853, 31.9190, Region::Mediterranean),
    ("serapeum", 29.8713, 31.2165, Region::Mediterranean),
    ("valley of kings", 25.7402, 32.6014, Region::Mediterranean),
    // Peru / South America
    ("machu picchu", -13.1631, -72.5450, Region::Americas),
    ("nazca", -14.7356, -75.1300, Region::Americas),
    ("nazca lines", -14.7356, -75.1300, Region::Americas),
    ("puma punku", -16.5617, -68.6803, Region::Americas),
    ("pumapunku", -16.5617, -68.6803, Region::Americas),
    ("tiwanaku", -16.5546, -68.6731, Region::Americas),
    ("tiahuanaco", -16.5546, -68.6731, Region::Americas),
    ("sacsayhuaman", -13.5092, -71.9822, Region::Americas),
    ("ollantaytambo", -13.2588, -72.2639, Region::Americas),
    ("cusco", -13.5320, -71.9675, Region::Americas),
    ("caral", -10.8933, -77.5203, Region::Americas),
    ("paracas", -13.8333, -76.2500, Region::Americas),
    ("elongated skulls", -13.8333, -76.2500, Region::Americas),
    ("chavin", -9.5947, -77.1778, Region::Americas),
    // Mexico / Central America
    ("teotihuacan", 19.6925, -98.8438, Region::Americas),
    ("chichen itza", 20.6843, -88.5678, Region::Americas),
    ("palenque", 17.4838, -92.0462, Region::Americas),
    ("tikal", 17.2220, -89.6237, Region::Americas),
    ("la venta", 18.1033, -94.0400, Region::Americas),
    ("monte alban", 17.0436, -96.7678, Region::Americas),
    ("olmec", 18.1033, -94.0400, Region::Americas),
    ("maya", 20.6843, -88.5678, Region::Americas),
    ("aztec", 19.4326, -99.1332, Region::Americas),
    ("tulum", 20.2144, -87.4291, Region::Americas),
    // Europe
    ("stonehenge", 51.1789, -1.8262, Region::Europe),
    ("avebury", 51.4288, -1.8544, Region::Europe),
    ("newgrange", 53.6947, -6.4756, Region::Europe),
    ("carnac", 47.5847, -3.0778, Region::Europe),
    ("skara brae", 59.0488, -3.3415, Region::Europe),
    ("malta temples", 35.8267, 14.5367, Region::Europe),
    ("gozo", 36.0444, 14.2511, Region::Europe),
    ("bosnian pyramid", 43.9769, 18.1761, Region::Europe),
    ("visoko", 43.9769, 18.1761, Region::Europe),
    ("silbury hill", 51.4158, -1.8575, Region::Europe),
    ("orkney", 59.0000, -3.0000, Region::Europe),
    // Middle East
    ("baalbek", 34.0069, 36.2039, Region::Asia),
    ("petra", 30.3285, 35.4444, Region::Asia),
    ("jerusalem", 31.7683, 35.2137, Region::Asia),
    ("jericho", 31.8570, 35.4595, Region::Asia),
    ("sumerian", 31.3256, 45.6375, Region::Asia),
    ("sumer", 31.3256, 45.6375, Region::Asia),
    ("babylon", 32.5425, 44.4211, Region::Asia),
    ("mesopotamia", 33.3152, 44.3661, Region::Asia),
    ("ur", 30.9628, 46.1031, Region::Asia),
    ("anunnaki", 31.3256, 45.6375, Region::Asia),
    // Asia
    ("angkor wat", 13.4125, 103.8670, Region::Asia),
    ("angkor", 13.4125, 103.8670, Region::Asia),
    ("borobudur", -7.6079, 110.2038, Region::Asia),
    ("mohenjo daro", 27.3242, 68.1375, Region::Asia),
    ("mohenjo-daro", 27.3242, 68.1375, Region::Asia),
    ("harappa", 30.6314, 72.8643, Region::Asia),
    ("indus valley", 27.3242, 68.1375, Region::Asia),
    ("sanchi", 23.4793, 77.7399, Region::Asia),
    ("ellora", 20.0269, 75.1791, Region::Asia),
    ("ajanta", 20.5519, 75.7033, Region::Asia),
    ("dwarka", 22.2442, 68.9685, Region::Asia),
    ("gunung padang", -6.9944, 107.0564, Region::Asia),
    ("longyou caves", 29.0333, 119.1667, Region::Asia),
    ("forbidden city", 39.9163, 116.3972, Region::Asia),
    // Pacific
    ("easter island", -27.1127, -109.3497, Region::Oceania),
    ("rapa nui", -27.1127, -109.3497, Region::Oceania),
    ("moai", -27.1127, -109.3497, Region::Oceania),
    ("nan madol", 6.8444, 158.3356, Region::Oceania),
    ("yonaguni", 24.4353, 122.9419, Region::Asia),
    // Africa
    ("great zimbabwe", -20.2674, 30.9330, Region::Africa),
    ("axum", 14.1211, 38.7469, Region::Africa),
    ("lalibela", 12.0319, 39.0475, Region::Africa),
    ("dogon", 14.0000, -3.5000, Region::Africa),
    ("timbuktu", 16.7666, -3.0026, Region::Africa),
    // Mediterranean / Greece
    ("knossos", 35.2979, 25.1625, Region::Mediterranean),
    ("minoan", 35.2979, 25.1625, Region::Mediterranean),
    ("mycenae", 37.7306, 22.7564, Region::Mediterranean),
    ("delphi", 38.4824, 22.5010, Region::Mediterranean),
    ("sardinia", 40.1209, 9.0129, Region::Mediterranean),
    ("santorini", 36.3932, 25.4615, Region::Mediterranean),
    ("thera", 36.3932, 25.4615, Region::Mediterranean),
    ("antikythera", 35.8617, 23.3100, Region::Mediterranean),
    ("crete", 35.2401, 24.8093, Region::Mediterranean),
    // Underwater / Legendary
    ("bimini road", 25.7617, -79.2756, Region::Americas),
    ("bimini", 25.7617, -79.2756, Region::Americas),
    ("richat structure", 21.1245, -11.4017, Region::Africa),
    ("eye of sahara", 21.1245, -11.4017, Region::Africa),
    ("eye of the sahara", 21.1245, -11.4017, Region::Africa),
    ("atlantis", 21.1245, -11.4017, Region::Africa),
    // USA
    ("coral castle", 25.5003, -80.4445, Region::Americas),
    ("serpent mound", 39.0253, -83.4303, Region::Americas),
    ("cahokia", 38.6558, -90.0619, Region::Americas),
    ("grand canyon", 36.0544, -112.1401, Region::Americas),
];

impl Gazetteer {
    /// The compiled-in site table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_SITES
            .iter()
            .map(|(name, latitude, longitude, region)| GazetteerEntry {
                name: (*name).to_string(),
                latitude: *latitude,
                longitude: *longitude,
                region: *region,
            })
            .collect();
        Gazetteer { entries }
    }

    /// Loads a replacement table from a JSON array of entries.
    ///
    /// The file is an array (not a map) so that scan order is preserved.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::Configuration(format!(
                "The specified gazetteer file does not exist: {}",
                path.display()
            )));
        }

        let json_data = fs::read_to_string(path).map_err(|err| {
            PipelineError::Configuration(format!("Failed to read the gazetteer file: {}", err))
        })?;

        let entries: Vec<GazetteerEntry> = serde_json::from_str(&json_data).map_err(|err| {
            PipelineError::Configuration(format!("Failed to parse the gazetteer file: {}", err))
        })?;

        info!("Loaded {} gazetteer entries from {}", entries.len(), path.display());
        Ok(Gazetteer { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first entry whose name is a case-insensitive substring of
    /// `text`, or `None`. A miss means "region unknown", not an error.
    pub fn find_location(&self, text: &str) -> Option<Location> {
        if text.is_empty() {
            return None;
        }

        let lower_text = text.to_lowercase();

        self.entries
            .iter()
            .find(|entry| lower_text.contains(&entry.name))
            .map(|entry| Location {
                name: entry.name.clone(),
                latitude: entry.latitude,
                longitude: entry.longitude,
                region: entry.region,
            })
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Gazetteer::builtin()
    }
}
