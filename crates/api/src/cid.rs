//! Circonus identifiers (CIDs) and the patterns that validate them.
//!
//! A CID is a path-like string such as `/check_bundle/1234` that the API
//! assigns when an object is created.

use regex::Regex;

use crate::error::{Error, Result};

/// Broker (collector) CID pattern.
pub const BROKER_CID_REGEX: &str = r"^/broker/[0-9]+$";
/// Check bundle CID pattern.
pub const CHECK_BUNDLE_CID_REGEX: &str = r"^/check_bundle/[0-9]+$";
/// Check CID pattern; group 2 is the numeric check ID.
pub const CHECK_CID_REGEX: &str = r"^(/check/)([0-9]+)$";
/// Contact group CID pattern.
pub const CONTACT_GROUP_CID_REGEX: &str = r"^/contact_group/[0-9]+$";
/// Graph CID pattern.
pub const GRAPH_CID_REGEX: &str =
    r"^/graph/[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";
/// Metric cluster CID pattern.
pub const METRIC_CLUSTER_CID_REGEX: &str = r"^/metric_cluster/[0-9]+$";
/// Rule set CID pattern.
pub const RULE_SET_CID_REGEX: &str = r"^/rule_set/[0-9]+(_.+)?$";
/// User CID pattern.
pub const USER_CID_REGEX: &str = r"^/user/[0-9]+$";

/// Prefix of check CIDs.
pub const CHECK_PREFIX: &str = "/check";
/// Prefix of contact group CIDs.
pub const CONTACT_GROUP_PREFIX: &str = "/contact_group";

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::configuration(format!("bad CID pattern: {e}")))
}

/// Returns `true` if `cid` matches `pattern`.
///
/// # Errors
///
/// Returns an error if `pattern` is not a valid regular expression.
pub fn matches(pattern: &str, cid: &str) -> Result<bool> {
    Ok(compile(pattern)?.is_match(cid))
}

/// Extracts the numeric check ID from a `/check/<n>` CID.
///
/// # Errors
///
/// Returns [`Error::InvalidCid`] if `cid` is not a check CID.
pub fn check_id(cid: &str) -> Result<u64> {
    compile(CHECK_CID_REGEX)?
        .captures(cid)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Error::InvalidCid {
            kind: "check",
            cid: cid.to_string(),
        })
}

/// Builds a `/check/<n>` CID.
#[must_use]
pub fn check_cid(id: u64) -> String {
    format!("{CHECK_PREFIX}/{id}")
}

/// Extracts the numeric ID from a `/contact_group/<n>` CID.
///
/// # Errors
///
/// Returns [`Error::InvalidCid`] if `cid` is not a contact group CID.
pub fn contact_group_id(cid: &str) -> Result<u64> {
    cid.strip_prefix(CONTACT_GROUP_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| Error::InvalidCid {
            kind: "contact group",
            cid: cid.to_string(),
        })
}

/// Builds a contact group CID from its numeric ID; `0` means "none".
#[must_use]
pub fn contact_group_cid(id: u64) -> String {
    if id == 0 {
        String::new()
    } else {
        format!("{CONTACT_GROUP_PREFIX}/{id}")
    }
}
