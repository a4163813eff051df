use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

mod opsin;
pub use opsin::*;

/// Successfully converted candidate names mapped to their structure notation.
/// Rejected candidates are simply absent.
pub type Conversion = BTreeMap<String, String>;

/// The notation a converter is asked to produce. Only line-oriented formats are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Smiles,
    ExtendedSmiles,
    Inchi,
    StdInchi,
    StdInchiKey,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Smiles,
        OutputFormat::ExtendedSmiles,
        OutputFormat::Inchi,
        OutputFormat::StdInchi,
        OutputFormat::StdInchiKey,
    ];

    /// The name OPSIN uses for this format on its `-o` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Smiles => "smi",
            OutputFormat::ExtendedSmiles => "extendedsmi",
            OutputFormat::Inchi => "inchi",
            OutputFormat::StdInchi => "stdinchi",
            OutputFormat::StdInchiKey => "stdinchikey",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match Self::ALL.into_iter().find(|format| format.as_str() == lower) {
            Some(format) => Ok(format),
            None => bail!(
                "Unknown output format {:?}, expected one of {}",
                s,
                Self::ALL.map(|format| format.as_str()).join(", ")
            ),
        }
    }
}

/// A batch name-to-structure converter.
///
/// The whole candidate batch goes out in one request. Candidates the converter cannot
/// parse are left out of the result; transport failures are logged by the implementation
/// and come back as an empty map.
pub trait StructureConverter {
    fn convert_names(&self, names: &[String], format: OutputFormat) -> Conversion;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_names() {
        for format in OutputFormat::ALL {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
        assert_eq!("SMI".parse::<OutputFormat>().unwrap(), OutputFormat::Smiles);
        assert_eq!(OutputFormat::default(), OutputFormat::Smiles);
        assert!("cml".parse::<OutputFormat>().is_err());
    }
}
