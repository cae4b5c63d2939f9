//! `caql` checks: a CAQL query evaluated by the platform.

use circonus_api::CheckBundle;
use circonus_api::config::QUERY;
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, set};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};

/// CAQL checks always use this target.
pub const CAQL_TARGET: &str = "q._caql";

/// `caql` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaqlConfig {
    /// The CAQL query
    pub query: String,
}

impl CheckTypeConfig for CaqlConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("query")
                .required()
                .describe("The query definition"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        bundle.target = CAQL_TARGET.to_string();
        set(bundle, QUERY, &self.query);
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            query: reader.required(QUERY)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn round_trip() {
        let config = CaqlConfig {
            query: "search:metric:average(\"foo\")".into(),
        };
        let mut bundle = CheckBundle::default();
        CheckType::Caql(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.check_type, "caql");
        assert_eq!(bundle.target, CAQL_TARGET);
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Caql(config));
    }
}
