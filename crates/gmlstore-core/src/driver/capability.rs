#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capability {
    /// The database only knows the unprefixed PostGIS function names
    /// (`AsBinary`, `GeomFromWKB`, `extent`), as PostGIS releases before 1.3
    /// did.
    pub legacy_postgis: bool,
}

impl Capability {
    pub const POSTGIS: Capability = Capability {
        legacy_postgis: false,
    };

    pub const POSTGIS_LEGACY: Capability = Capability {
        legacy_postgis: true,
    };

    /// Derives the capability from a `postgis_lib_version()` string such as
    /// `3.4.2`.
    pub fn from_postgis_version(version: &str) -> Capability {
        let mut parts = version
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u32>().unwrap_or(0));
        let major = parts.next().unwrap_or(0);
        let minor = parts.next().unwrap_or(0);

        Capability {
            legacy_postgis: (major, minor) < (1, 3),
        }
    }
}
