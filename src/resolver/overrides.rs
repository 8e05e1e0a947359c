//! Hand-verified address overrides
//!
//! Some location pages carry addresses the geocoder cannot place: stale
//! street names, a mall or plaza name glued to the front, or the wrong county.
//! Those stores are listed here by telephone number with an address that is
//! known to geocode to the right spot. A new bad case needs a new entry, either
//! in this table or in the extra overrides file named in the configuration.

use crate::ConfigError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Built-in overrides: telephone → address
const BUILTIN_OVERRIDES: &[(&str, &str)] = &[
    ("+1 480-712-6645", "14770 W McDowell Rd, Goodyear, AZ 85395"),
    ("+1 480-367-8920", "7555 Frank Lloyd Wright, Scottsdale, AZ 85260"),
    ("+1 623-546-1640", "14095 Grand Ave, Surprise, AZ 85374"),
    ("+1 510-538-2738", "22224, Redwood Road, Alameda County, California, 94546, United States"),
    ("+1 510-524-7609", "225, Stannage Avenue, Albany Hill, El Cerrito, Alameda County, California, 94530, United States"),
    ("+1 323-856-0689", "1600, Vine Street, Hollywood, Los Angeles, Los Angeles County, California, 90028, United States"),
    ("+1 310-725-9800", "1800, Rosecrans Avenue, Manhattan Village, Manhattan Beach, Los Angeles County, California, 90266, United States"),
    ("+1 949-494-7404", "8086, Sidra Cove, Crystal Cove, Newport Coast, Newport Beach, Orange County, California, 92657, United States"),
    ("+1 818-762-2963", "6130, Laurel Canyon Boulevard, North Hollywood Neighborhood Council District, Los Angeles, Los Angeles County, California, 91606, United States"),
    ("+1 408-264-8120", "Trader Joe's, 5353, Almaden Expressway, San Jose, Santa Clara County, California, 95118, United States"),
    ("+1 650-583-6401", "Trader Joe's, 301, McLellan Drive, South San Francisco, San Mateo County, California, 94080, United States"),
    ("+1 805-434-9562", "Trader Joe's, 1111, Rossi Road, San Luis Obispo County, California, 93465, United States"),
    ("+1 562-698-1642", "Trader Joe's, 15025, Whittier Boulevard, Friendly Hills, Whittier, Los Angeles County, California, 90603, United States"),
    ("+1 561-338-5031", "855, Southeast 9th Street, Boca Raton, Palm Beach County, Florida, 33432, United States"),
    ("+1 727-436-4019", "33591, West Lake Road, Palm Harbor, Pinellas County, Florida, 34683, United States"),
    ("+1 561-656-1067", "2877, Stribling Way, Wellington, Palm Beach County, Florida, 33414, United States"),
    ("+1 470-762-3171", "Trader Joe's, Halcyon Days Trail, Forsyth County, Georgia, 30005, United States"),
    ("+1 208-214-8293", "303, East Spokane Avenue, Coeur d'Alene, Kootenai County, Idaho, 83814, United States"),
    ("+1 574-472-8744", "1140, Howard Street, Harters Heights, South Bend, Saint Joseph County, Indiana, 46617, United States"),
    ("+1 502-895-7872", "Trader Joe's, 4600 Shelbyville Rd, Louisville, KY 40207"),
    ("+1 508-790-3008", "655 Iyannough Road, Hyannis, MA 02601"),
    ("+1 775-267-2486", "3790, US 395, Carson City, Douglas County, Nevada, 89705, United States"),
    ("+1 973-537-3672", "3056, NJ 10, Denville, Morris County, New Jersey, 07834, United States"),
    ("+1 732-462-1539", "Trader Joe's, Pond Road, Whittier Oaks South, Freehold Township, Monmouth County, New Jersey, 07728, United States"),
    ("+1 856-988-3323", "Trader Joe's, 300, SR 73, Marlton Square, Marlton, Evesham Township, Burlington County, New Jersey, 08053, United States"),
    ("+1 201-265-9624", "Trader Joe's, 404, Sette Drive, Paramus, Bergen County, New Jersey, 07652, United States"),
    ("+1 505-883-3662", "Trader Joe's, 2200, Uptown Loop Road Northeast, Uptown, Albuquerque, Bernalillo County, New Mexico, 87110, United States"),
    ("+1 518-383-5015", "Trader Joe's, Halfmoon Crossing, Town of Halfmoon, Saratoga County, New York, 12065, United States"),
    ("+1 212-477-8340", "Trader Joe's, 400, Grand Street, Lower East Side, Manhattan Community Board 3, Manhattan, New York County, New York, 10002, United States"),
    ("+1 716-415-3179", "5017, Transit Road, Eastern Hills, Buffalo, Erie County, New York, 14221, United States"),
    ("+1 541-312-4198", "Trader Joe's, 63455, McKenzie-Bend Highway, Bend, Deschutes County, Oregon, 97703"),
    ("+1 541-485-1744", "85, Coburg Road, Eugene, Lane County, Oregon, 97401, United States"),
    ("+1 843-630-6282", "Sayebrook Town Center, Sayebrook, Horry County, South Carolina, 29575, United States"),
    ("+1 615-356-1066", "90, Post Place, Nashville, TN 37205"),
    // No address of its own on any map; the Kroger across the street stands in
    ("+1 281-290-4216", "Kroger Marketplace, 9703, Barker Cypress Road, Towne Lake Management District, Cypress, Harris County, Texas, 77433, United States"),
    ("+1 801-571-0987", "Trader Joe's, 11477, State Street, Draper, Salt Lake County, Utah, 84020, United States"),
    ("+1 385-324-2911", "Trader Joe's, Rodeo Walk Drive, Wagstaff Acres, Holladay, Salt Lake County, Utah, 84117, United States"),
    ("+1 801-224-1453", "Trader Joe's, 440, Park Avenue, University Place, Orem, Utah County, Utah, 84097, United States"),
    ("+1 703-379-5883", "5847 Leesburg Pike, Bailey's Crossroads, VA 22041"),
    ("+1 703-288-0566", "Trader Joe's, 7514, Leesburg Pike, Falls Church, Fairfax County, Virginia, 22043, United States"),
    ("+1 703-689-0865", "Trader Joe's, 11958, Killingsworth Avenue, Fairfax County, Virginia, 20194, United States"),
    ("+1 757-259-2135", "5000, Settlers Market Boulevard, Virginia, 23188, United States"),
];

/// Telephone number → verified address string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: HashMap<String, String>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in table, built once per process
    pub fn builtin() -> &'static OverrideTable {
        static BUILTIN: OnceLock<OverrideTable> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            BUILTIN_OVERRIDES
                .iter()
                .map(|(phone, address)| (phone.to_string(), address.to_string()))
                .collect()
        })
    }

    /// Built-in table with the entries of `path` layered on top
    ///
    /// The file is TOML with one `"<telephone>" = "<address>"` pair per line.
    /// File entries replace built-in entries for the same telephone.
    pub fn load_extra(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extra = Self::parse(&content)?;

        let mut table = Self::builtin().clone();
        table.merge(extra);
        Ok(table)
    }

    /// Parses an overrides file
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let entries: HashMap<String, String> = toml::from_str(content)?;

        if let Some((phone, _)) = entries.iter().find(|(_, address)| address.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "override for {} has an empty address",
                phone
            )));
        }

        Ok(Self { entries })
    }

    /// Adds every entry of `other`, replacing existing ones
    pub fn merge(&mut self, other: OverrideTable) {
        self.entries.extend(other.entries);
    }

    pub fn insert(&mut self, telephone: impl Into<String>, address: impl Into<String>) {
        self.entries.insert(telephone.into(), address.into());
    }

    pub fn get(&self, telephone: &str) -> Option<&str> {
        self.entries.get(telephone).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for OverrideTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
