use std::fmt;
use std::str::FromStr;

/// MySQL server versions the e2e suites run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MySqlVersion {
    V5_5,
    V5_6,
    #[default]
    V5_7,
    V8_0,
}

impl MySqlVersion {
    /// Image tag for this version.
    pub fn tag(&self) -> &'static str {
        match self {
            MySqlVersion::V5_5 => "5.5",
            MySqlVersion::V5_6 => "5.6",
            MySqlVersion::V5_7 => "5.7",
            MySqlVersion::V8_0 => "8.0",
        }
    }
}

impl fmt::Display for MySqlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MySqlVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5.5" => Ok(MySqlVersion::V5_5),
            "5.6" => Ok(MySqlVersion::V5_6),
            "5.7" => Ok(MySqlVersion::V5_7),
            "8.0" | "8" => Ok(MySqlVersion::V8_0),
            other => Err(format!(
                "Unsupported MySQL version: {other} (expected 5.5, 5.6, 5.7 or 8.0)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("5.7".parse::<MySqlVersion>().unwrap(), MySqlVersion::V5_7);
        assert_eq!("8".parse::<MySqlVersion>().unwrap(), MySqlVersion::V8_0);
        assert!("9.1".parse::<MySqlVersion>().is_err());
        assert_eq!(MySqlVersion::default().tag(), "5.7");
    }
}
