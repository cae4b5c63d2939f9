//! `mysql` checks: run a query and collect its result columns.

use circonus_api::CheckBundle;
use circonus_api::config::{DSN, SQL};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, set};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `mysql` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MySqlConfig {
    /// Connection string
    pub dsn: String,
    /// Query to run
    pub query: String,
}

impl CheckTypeConfig for MySqlConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("dsn")
                .required()
                .validate(Validator::Regex(r"^.+$"))
                .describe("The connect DSN for the MySQL instance"),
            Attribute::string("query")
                .required()
                .validate(Validator::Regex(r".+"))
                .describe("The SQL to use as the query"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, DSN, &self.dsn);
        set(bundle, SQL, &self.query);
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            dsn: reader.required(DSN)?,
            query: reader.required(SQL)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn query_is_sent_as_sql() {
        let config = MySqlConfig {
            dsn: "user=monitor host=db1 port=3306".into(),
            query: "SELECT COUNT(*) AS sessions FROM information_schema.processlist".into(),
        };
        let mut bundle = CheckBundle::default();
        CheckType::MySql(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.config[SQL], config.query);
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::MySql(config));
    }
}
