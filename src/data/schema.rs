// ---------------------------------------------------------------------------
// Column schema of the `cptcommon:values` payload
// ---------------------------------------------------------------------------

/// Version of the upstream CPT data contract this column table matches.
pub const SCHEMA_VERSION: &str = "cptcommon/1.1";

/// Number of columns every payload row must carry.
pub const COLUMN_COUNT: usize = 24;

/// Field names, positionally aligned to the raw matrix columns.
///
/// This is a fixed contract with the data source and is never derived at
/// runtime. Changing it means bumping [`SCHEMA_VERSION`].
pub const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "penetrationLength",
    "depth",
    "elapsedTime",
    "coneResistance",
    "correctedConeResistance",
    "netConeResistance",
    "magneticFieldStrengthX",
    "magneticFieldStrengthY",
    "magneticFieldStrengthZ",
    "magneticFieldStrengthTotal",
    "electricalConductivity",
    "inclinationEW",
    "inclinationNS",
    "inclinationX",
    "inclinationY",
    "inclinationResultant",
    "magneticDeclination",
    "localFriction",
    "poreRatio",
    "temperature",
    "porePressureU1",
    "porePressureU2",
    "porePressureU3",
    "frictionRatio",
];

pub const PENETRATION_LENGTH: usize = 0;
pub const DEPTH: usize = 1;
pub const CONE_RESISTANCE: usize = 3;
pub const PORE_PRESSURE_U1: usize = 20;
pub const PORE_PRESSURE_U2: usize = 21;
pub const PORE_PRESSURE_U3: usize = 22;
pub const FRICTION_RATIO: usize = 23;

/// Ordered column names of the payload matrix.
pub fn column_names() -> &'static [&'static str] {
    &COLUMN_NAMES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_index(name: &str) -> Option<usize> {
        COLUMN_NAMES.iter().position(|c| *c == name)
    }

    #[test]
    fn test_column_count_matches_table() {
        assert_eq!(column_names().len(), COLUMN_COUNT);
    }

    #[test]
    fn test_named_indices_point_at_their_columns() {
        assert_eq!(column_index("penetrationLength"), Some(PENETRATION_LENGTH));
        assert_eq!(column_index("depth"), Some(DEPTH));
        assert_eq!(column_index("coneResistance"), Some(CONE_RESISTANCE));
        assert_eq!(column_index("frictionRatio"), Some(FRICTION_RATIO));
        assert_eq!(column_index("porePressureU1"), Some(PORE_PRESSURE_U1));
        assert_eq!(column_index("porePressureU2"), Some(PORE_PRESSURE_U2));
        assert_eq!(column_index("porePressureU3"), Some(PORE_PRESSURE_U3));
        assert_eq!(column_index("nope"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = column_names().to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COLUMN_COUNT);
    }
}
