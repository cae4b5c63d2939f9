//! Keys of the free-form `config` map carried by a check bundle.
//!
//! Every check type stores its settings as string key/value pairs. Keys that
//! carry a dynamic suffix (HTTP headers, CloudWatch dimensions, SNMP OIDs)
//! are expressed as prefixes.

#![allow(missing_docs)]

pub const API_KEY: &str = "api_key";
pub const API_SECRET: &str = "api_secret";
pub const ARG_PREFIX: &str = "arg_";
pub const ASYNC_METRICS: &str = "asynch_metrics";
pub const AUTH_METHOD: &str = "auth_method";
pub const AUTH_PASSWORD: &str = "auth_password";
pub const AUTH_USER: &str = "auth_user";
pub const AVAIL_NEEDED: &str = "avail_needed";
pub const BANNER_MATCH: &str = "banner_match";
pub const BODY: &str = "body";
pub const CA_CHAIN: &str = "ca_chain";
pub const CERT_FILE: &str = "certificate_file";
pub const CHECK_NAME_BLACKLIST: &str = "check_name_blacklist";
pub const CIPHERS: &str = "ciphers";
pub const CLOUDWATCH_METRICS: &str = "cloudwatch_metrics";
pub const CODE: &str = "code";
pub const COMMAND: &str = "command";
pub const COMMUNITY: &str = "community";
pub const CONTROL: &str = "control";
pub const COUNT: &str = "count";
pub const CTYPE: &str = "ctype";
pub const DB_INDEX: &str = "dbindex";
pub const DIM_PREFIX: &str = "dim_";
pub const DSN: &str = "dsn";
pub const EHLO: &str = "ehlo";
pub const ENV_PREFIX: &str = "env_";
pub const EXTRACT: &str = "extract";
pub const FROM: &str = "from";
pub const GRANULARITY: &str = "granularity";
pub const HEADER_PREFIX: &str = "header_";
pub const HTTP_VERSION: &str = "http_version";
pub const INTERVAL: &str = "interval";
pub const KEY_FILE: &str = "key_file";
pub const MBEAN_DOMAINS: &str = "mbean_domains";
pub const METHOD: &str = "method";
pub const NAMESERVER: &str = "nameserver";
pub const NAMESPACE: &str = "namespace";
pub const NODE_BLACKLIST: &str = "node_blacklist";
pub const OID_PREFIX: &str = "oid_";
pub const OUTPUT_EXTRACT: &str = "output_extract";
pub const PASSWORD: &str = "password";
pub const PAYLOAD: &str = "payload";
pub const PORT: &str = "port";
pub const PROXY_DEST_ADDRESS: &str = "proxy_dest_address";
pub const PROXY_DEST_PORT: &str = "proxy_dest_port";
pub const PROXY_FAMILY: &str = "proxy_family";
pub const PROXY_PROTOCOL: &str = "proxy_protocol";
pub const PROXY_SOURCE_ADDRESS: &str = "proxy_source_address";
pub const PROXY_SOURCE_PORT: &str = "proxy_source_port";
pub const QUERY: &str = "query";
pub const READ_LIMIT: &str = "read_limit";
pub const REDIRECTS: &str = "redirects";
pub const REVERSE_SECRET_KEY: &str = "reverse:secret_key";
pub const RTYPE: &str = "rtype";
pub const SASL_AUTH_ID: &str = "sasl_auth_id";
pub const SASL_AUTHENTICATION: &str = "sasl_authentication";
pub const SASL_PASSWORD: &str = "sasl_password";
pub const SASL_USER: &str = "sasl_user";
pub const SECRET: &str = "secret";
pub const SERVICE_BLACKLIST: &str = "service_blacklist";
pub const SQL: &str = "sql";
pub const STARTTLS: &str = "starttls";
pub const SUBMISSION_URL: &str = "submission_url";
pub const TO: &str = "to";
pub const TYPE_PREFIX: &str = "type_";
pub const URI: &str = "uri";
pub const URL: &str = "url";
pub const USE_SSL: &str = "use_ssl";
pub const USERNAME: &str = "username";
pub const VERSION: &str = "version";

/// Number of alert severity levels (severities run `1..=NUM_SEVERITY_LEVELS`).
pub const NUM_SEVERITY_LEVELS: usize = 5;

/// Config keys the API adds on its own; they never map to an attribute.
pub const SERVER_MANAGED_KEYS: [&str; 2] = [REVERSE_SECRET_KEY, SUBMISSION_URL];
