//! `postgresql` checks (API type `postgres`).

use circonus_api::CheckBundle;
use circonus_api::config::{DSN, SQL};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, set};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `postgresql` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgreSqlConfig {
    /// libpq connection string
    pub dsn: String,
    /// Query to run
    pub query: String,
}

impl CheckTypeConfig for PostgreSqlConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("dsn")
                .required()
                .validate(Validator::Regex(r"^.+$"))
                .describe("The connect DSN for the PostgreSQL instance"),
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
