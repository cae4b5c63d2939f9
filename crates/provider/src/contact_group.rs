//! The `circonus_contact_group` resource.
//!
//! A contact group bundles delivery methods with per-severity alert options.
//! Email, SMS and XMPP contacts address either a literal address or a
//! Circonus user. HTTP, PagerDuty, Slack and VictorOps contacts carry their
//! settings as a JSON document in the contact's `contact_info` string.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use circonus_api::cid::{self, CONTACT_GROUP_CID_REGEX, USER_CID_REGEX};
use circonus_api::codec::string_int;
use circonus_api::config::NUM_SEVERITY_LEVELS;
use circonus_api::{
    CirconusApi, ContactGroup, ContactGroupAlertFormats, ContactGroupContactsExternal,
    ContactGroupContactsUser, ContactGroupEscalation,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::duration;
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Block, Schema};
use crate::tags;
use crate::validators::Validator;

/// Resource kind name used in diagnostics.
pub const KIND: &str = "Contact Group";

const DEFAULT_AGGREGATION_WINDOW: &str = "300s";
const DEFAULT_SLACK_USERNAME: &str = "Circonus";

/// Long message sent to Slack groups that do not set their own.
pub const DEFAULT_SLACK_LONG_MESSAGE: &str = "slackformat:
long=Check / Metric Name:{name}
Status:{status}
Severity:{severity}
Occurred:{occurred}
Value:{value}
%(cleared != null) Cleared:{cleared}%
%(cleared != null) Clear Value:{clear_value}%
%(metric_link != null) More Info:{metric_link}%
long=Notes:{metric_notes}
long=Link to Alert:{link}";

/// A delivery method as the API names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactMethod {
    /// Email to an address or user
    Email,
    /// HTTP webhook
    Http,
    /// PagerDuty service
    PagerDuty,
    /// Slack channel
    Slack,
    /// SMS to a number or user
    Sms,
    /// VictorOps team
    VictorOps,
    /// XMPP to an address or user
    Xmpp,
}

impl ContactMethod {
    /// The API's method string.
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Http => "http",
            Self::PagerDuty => "pagerduty",
            Self::Slack => "slack",
            Self::Sms => "sms",
            Self::VictorOps => "victorops",
            Self::Xmpp => "xmpp",
        }
    }

    /// The configuration block holding contacts of this method.
    #[must_use]
    pub const fn block_name(self) -> &'static str {
        match self {
            Self::PagerDuty => "pager_duty",
            other => other.api_name(),
        }
    }

    /// Parse the API's method string.
    #[must_use]
    pub fn from_api(method: &str) -> Option<Self> {
        Some(match method {
            "email" => Self::Email,
            "http" => Self::Http,
            "pagerduty" => Self::PagerDuty,
            "slack" => Self::Slack,
            "sms" => Self::Sms,
            "victorops" => Self::VictorOps,
            "xmpp" => Self::Xmpp,
            _ => return None,
        })
    }
}

fn address_or_user_block() -> Block {
    Block::new(vec![
        Attribute::string("address").describe("The address to deliver to"),
        Attribute::string("user")
            .validate(Validator::Cid {
                kind: "user",
                pattern: USER_CID_REGEX,
            })
            .describe("The Circonus user to deliver to"),
    ])
    .max_items(1)
}

fn fallback_attribute() -> Attribute {
    Attribute::string("contact_group_fallback")
        .validate(Validator::Cid {
            kind: "contact group",
            pattern: CONTACT_GROUP_CID_REGEX,
        })
        .describe("Contact group to fall back to when delivery fails")
}

fn severity_between(name: &'static str) -> Attribute {
    Attribute::int(name)
        .required()
        .validate(Validator::IntBetween(1, 5))
}

static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Attribute::string("aggregation_window")
            .default_value(DEFAULT_AGGREGATION_WINDOW)
            .validate(Validator::Duration {
                min: Some("0s"),
                max: None,
            })
            .describe("How long to aggregate alerts before sending"),
        Attribute::block(
            "alert_option",
            Block::new(vec![
                Attribute::string("escalate_after").validate(Validator::Duration {
                    min: Some("5m"),
                    max: None,
                }),
                Attribute::string("escalate_to").validate(Validator::Cid {
                    kind: "contact group",
                    pattern: CONTACT_GROUP_CID_REGEX,
                }),
                Attribute::string("reminder").validate(Validator::Duration {
                    min: Some("0s"),
                    max: None,
                }),
                severity_between("severity"),
            ]),
        )
        .describe("Reminder and escalation settings for one severity"),
        Attribute::bool("always_send_clear").default_value(false),
        Attribute::block("email", address_or_user_block()),
        Attribute::string("group_type"),
        Attribute::block(
            "http",
            Block::new(vec![
                Attribute::string("address")
                    .required()
                    .validate(Validator::HttpUrl),
                Attribute::string("format")
                    .default_value("json")
                    .validate(Validator::OneOf(&["json", "params"])),
                Attribute::string("method")
                    .default_value("POST")
                    .validate(Validator::OneOf(&["GET", "POST"])),
            ]),
        ),
        Attribute::int("last_modified").computed(),
        Attribute::string("last_modified_by").computed(),
        Attribute::string("long_message"),
        Attribute::string("long_subject"),
        Attribute::string("long_summary"),
        Attribute::string("name").required(),
        Attribute::block(
            "pager_duty",
            Block::new(vec![
                fallback_attribute(),
                Attribute::string("service_key")
                    .required()
                    .sensitive()
                    .validate(Validator::Regex(r"^[a-zA-Z0-9]{32}$")),
                Attribute::string("webhook_url")
                    .required()
                    .validate(Validator::HttpUrl),
                Attribute::string("account").required(),
            ]),
        ),
        Attribute::string("short_message"),
        Attribute::string("short_summary"),
        Attribute::block(
            "slack",
            Block::new(vec![
                fallback_attribute(),
                Attribute::bool("buttons").default_value(true),
                Attribute::string("channel")
                    .required()
                    .validate(Validator::Regex(r"^#\S+$")),
                Attribute::string("team").required(),
                Attribute::string("username")
                    .default_value(DEFAULT_SLACK_USERNAME)
                    .validate(Validator::Regex(r"^\S+$"))
                    .describe("Username Slackbot uses in Slack to deliver a notification"),
            ]),
        ),
        Attribute::block("sms", address_or_user_block()),
        Attribute::tags(),
        Attribute::block(
            "victorops",
            Block::new(vec![
                fallback_attribute(),
                Attribute::string("api_key").required().sensitive(),
                severity_between("critical"),
                severity_between("info"),
                Attribute::string("team").required(),
                severity_between("warning"),
            ]),
        ),
        Attribute::block("xmpp", address_or_user_block()),
    ])
});

/// Schema of `circonus_contact_group`.
#[must_use]
pub fn schema() -> &'static Schema {
    &SCHEMA
}

const fn default_true() -> bool {
    true
}

/// An `alert_option` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertOption {
    /// Escalate after this long
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalate_after: Option<String>,
    /// Contact group to escalate to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalate_to: Option<String>,
    /// Remind this often
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
    /// Severity, 1 to 5
    pub severity: u8,
}

/// An `email`, `sms` or `xmpp` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOrUser {
    /// Literal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// User CID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// An `http` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpContact {
    /// Webhook URL
    pub address: String,
    /// `json` or `params`
    pub format: String,
    /// `GET` or `POST`
    pub method: String,
}

/// A `pager_duty` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerDutyContact {
    /// Fallback contact group CID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group_fallback: Option<String>,
    /// Integration key
    pub service_key: String,
    /// Webhook URL
    pub webhook_url: String,
    /// PagerDuty account
    pub account: String,
}

/// A `slack` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackContact {
    /// Fallback contact group CID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group_fallback: Option<String>,
    /// Show acknowledgement buttons
    #[serde(default = "default_true")]
    pub buttons: bool,
    /// Channel, starting with `#`
    pub channel: String,
    /// Slack team
    pub team: String,
    /// Bot username
    pub username: String,
}

/// A `victorops` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictorOpsContact {
    /// Fallback contact group CID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group_fallback: Option<String>,
    /// API key
    pub api_key: String,
    /// Severity mapped to VictorOps critical
    pub critical: i64,
    /// Severity mapped to VictorOps info
    pub info: i64,
    /// VictorOps team
    pub team: String,
    /// Severity mapped to VictorOps warning
    pub warning: i64,
}

// `contact_info` payloads. Numbers travel as strings.

#[derive(Debug, Serialize, Deserialize)]
struct PagerDutyInfo {
    #[serde(default)]
    service_key: String,
    #[serde(default)]
    webhook_url: String,
    #[serde(default)]
    account: String,
    #[serde(rename = "failover_group", default, with = "string_int")]
    fallback: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlackInfo {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    team: String,
    #[serde(default)]
    username: String,
    #[serde(default, with = "string_int")]
    buttons: i64,
    #[serde(rename = "failover_group", default, with = "string_int")]
    fallback: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct VictorOpsInfo {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    team: String,
    #[serde(default, with = "string_int")]
    critical: i64,
    #[serde(rename = "failover_group", default, with = "string_int")]
    fallback: i64,
    #[serde(default, with = "string_int")]
    info: i64,
    #[serde(default, with = "string_int")]
    warning: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct HttpInfo {
    url: String,
    params: String,
    method: String,
}

/// Decoded `circonus_contact_group` configuration, also used as its state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroupConfig {
    #[serde(default)]
    aggregation_window: Option<String>,
    #[serde(default)]
    alert_option: Vec<AlertOption>,
    #[serde(default)]
    always_send_clear: bool,
    #[serde(default)]
    email: Vec<AddressOrUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_type: Option<String>,
    #[serde(default)]
    http: Vec<HttpContact>,
    #[serde(default, skip_deserializing)]
    last_modified: u64,
    #[serde(default, skip_deserializing)]
    last_modified_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    long_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    long_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    long_summary: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    pager_duty: Vec<PagerDutyContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short_summary: Option<String>,
    #[serde(default)]
    slack: Vec<SlackContact>,
    #[serde(default)]
    sms: Vec<AddressOrUser>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    victorops: Vec<VictorOpsContact>,
    #[serde(default)]
    xmpp: Vec<AddressOrUser>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(String::from)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    non_empty(value.map(str::trim))
}

fn fallback_to_api(cid: Option<&str>) -> Result<i64> {
    let Some(cid) = cid.filter(|c| !c.is_empty()) else {
        return Ok(0);
    };
    let id = cid::contact_group_id(cid)
        .map_err(|e| Error::validation(format!("error reading contact group CID: {e}")))?;
    i64::try_from(id)
        .map_err(|_| Error::validation(format!("contact group CID {cid:?} is out of range")))
}

fn fallback_from_api(id: i64) -> Option<String> {
    u64::try_from(id)
        .ok()
        .map(cid::contact_group_cid)
        .filter(|c| !c.is_empty())
}

fn to_info<T: Serialize>(method: ContactMethod, info: &T) -> Result<ContactGroupContactsExternal> {
    Ok(ContactGroupContactsExternal {
        info: serde_json::to_string(info)?,
        method: method.api_name().to_string(),
    })
}

fn from_info<T: DeserializeOwned>(method: ContactMethod, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        Error::provider_bug(format!(
            "unable to decode external {} JSON ({raw:?}): {e}",
            method.block_name()
        ))
    })
}

impl AddressOrUser {
    fn to_api(
        &self,
        method: ContactMethod,
        external: &mut Vec<ContactGroupContactsExternal>,
        users: &mut Vec<ContactGroupContactsUser>,
    ) -> Result<()> {
        let block = method.block_name();
        match (non_empty(self.address.as_deref()), non_empty(self.user.as_deref())) {
            (Some(address), None) => external.push(ContactGroupContactsExternal {
                info: address,
                method: method.api_name().to_string(),
            }),
            (None, Some(user)) => users.push(ContactGroupContactsUser {
                method: method.api_name().to_string(),
                user_cid: user,
                ..ContactGroupContactsUser::default()
            }),
            (Some(_), Some(_)) => {
                return Err(Error::validation(format!(
                    "In type {block}, only one of address or user may be specified"
                )));
            }
            (None, None) => {
                return Err(Error::validation(format!(
                    "In type {block}, either address or user must be specified"
                )));
            }
        }
        Ok(())
    }
}

impl ContactGroupConfig {
    /// Build the contact group this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for conflicting or incomplete contacts and
    /// alert options.
    pub fn to_api(&self) -> Result<ContactGroup> {
        let mut group = ContactGroup {
            always_send_clear: self.always_send_clear,
            group_type: self.group_type.clone().unwrap_or_default(),
            name: self.name.clone(),
            tags: tags::normalize(self.tags.iter()),
            alert_formats: ContactGroupAlertFormats {
                long_message: non_empty(self.long_message.as_deref()),
                long_subject: non_empty(self.long_subject.as_deref()),
                long_summary: non_empty(self.long_summary.as_deref()),
                short_message: non_empty(self.short_message.as_deref()),
                short_summary: non_empty(self.short_summary.as_deref()),
            },
            ..ContactGroup::default()
        };

        let window = self
            .aggregation_window
            .as_deref()
            .unwrap_or(DEFAULT_AGGREGATION_WINDOW);
        group.aggregation_window = duration::parse_seconds("aggregation_window", window)?;

        self.alert_options_to_api(&mut group)?;

        let contacts = &mut group.contacts;
        for (method, blocks) in [
            (ContactMethod::Email, &self.email),
            (ContactMethod::Sms, &self.sms),
            (ContactMethod::Xmpp, &self.xmpp),
        ] {
            for block in blocks {
                block.to_api(method, &mut contacts.external, &mut contacts.users)?;
            }
        }

        for http in &self.http {
            let info = HttpInfo {
                url: http.address.clone(),
                params: http.format.clone(),
                method: http.method.clone(),
            };
            contacts.external.push(to_info(ContactMethod::Http, &info)?);
        }
        for pd in &self.pager_duty {
            let info = PagerDutyInfo {
                service_key: pd.service_key.clone(),
                webhook_url: pd.webhook_url.clone(),
                account: pd.account.clone(),
                fallback: fallback_to_api(pd.contact_group_fallback.as_deref())?,
            };
            contacts.external.push(to_info(ContactMethod::PagerDuty, &info)?);
        }
        for slack in &self.slack {
            let info = SlackInfo {
                channel: slack.channel.clone(),
                team: slack.team.clone(),
                username: slack.username.clone(),
                buttons: i64::from(slack.buttons),
                fallback: fallback_to_api(slack.contact_group_fallback.as_deref())?,
            };
            contacts.external.push(to_info(ContactMethod::Slack, &info)?);
        }
        for vo in &self.victorops {
            let info = VictorOpsInfo {
                api_key: vo.api_key.clone(),
                team: vo.team.clone(),
                critical: vo.critical,
                fallback: fallback_to_api(vo.contact_group_fallback.as_deref())?,
                info: vo.info,
                warning: vo.warning,
            };
            contacts.external.push(to_info(ContactMethod::VictorOps, &info)?);
        }

        if !self.slack.is_empty() && group.alert_formats.long_message.is_none() {
            group.alert_formats.long_message = Some(DEFAULT_SLACK_LONG_MESSAGE.to_string());
        }
        Ok(group)
    }

    fn alert_options_to_api(&self, group: &mut ContactGroup) -> Result<()> {
        let mut seen = BTreeSet::new();
        for option in &self.alert_option {
            let severity = option.severity;
            let slot = usize::from(severity)
                .checked_sub(1)
                .filter(|i| *i < NUM_SEVERITY_LEVELS)
                .ok_or_else(|| {
                    Error::validation(format!(
                        "alert_option severity {severity} must be between 1 and {NUM_SEVERITY_LEVELS}"
                    ))
                })?;
            if !seen.insert(severity) {
                return Err(Error::validation(format!(
                    "alert_option severity {severity} is configured more than once"
                )));
            }

            if let Some(reminder) = non_empty(option.reminder.as_deref()) {
                group.reminders[slot] = duration::parse_seconds("reminder", &reminder)?;
            }

            let after = non_empty(option.escalate_after.as_deref())
                .map(|after| duration::parse_seconds("escalate_after", &after))
                .transpose()?
                .filter(|secs| *secs > 0);
            match (after, non_empty(option.escalate_to.as_deref())) {
                (Some(after), Some(contact_group_cid)) => {
                    group.escalations[slot] = Some(ContactGroupEscalation {
                        after,
                        contact_group_cid,
                    });
                }
                (None, None) => {}
                _ => {
                    return Err(Error::validation(format!(
                        "alert_option severity {severity}: escalate_after and escalate_to must be set together"
                    )));
                }
            }
        }
        Ok(())
    }

    /// State for `group`.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error for contacts the resource cannot represent.
    pub fn from_api(group: &ContactGroup) -> Result<Self> {
        let mut state = Self {
            aggregation_window: Some(duration::seconds_string(group.aggregation_window)),
            alert_option: alert_options_from_api(group)?,
            always_send_clear: group.always_send_clear,
            group_type: non_empty(Some(group.group_type.as_str())),
            last_modified: group.last_modified,
            last_modified_by: group.last_modified_by.clone(),
            long_message: trimmed(group.alert_formats.long_message.as_deref()),
            long_subject: trimmed(group.alert_formats.long_subject.as_deref()),
            long_summary: trimmed(group.alert_formats.long_summary.as_deref()),
            name: group.name.clone(),
            short_message: trimmed(group.alert_formats.short_message.as_deref()),
            short_summary: trimmed(group.alert_formats.short_summary.as_deref()),
            tags: tags::normalize(group.tags.iter()),
            ..Self::default()
        };

        for ext in &group.contacts.external {
            let Some(method) = ContactMethod::from_api(&ext.method) else {
                return Err(Error::provider_bug(format!(
                    "unsupported contact method {:?}",
                    ext.method
                )));
            };
            let address = || AddressOrUser {
                address: Some(ext.info.clone()),
                user: None,
            };
            match method {
                ContactMethod::Email => state.email.push(address()),
                ContactMethod::Sms => state.sms.push(address()),
                ContactMethod::Xmpp => state.xmpp.push(address()),
                ContactMethod::Http => {
                    let info: HttpInfo = from_info(method, &ext.info)?;
                    state.http.push(HttpContact {
                        address: info.url,
                        format: info.params,
                        method: info.method,
                    });
                }
                ContactMethod::PagerDuty => {
                    let info: PagerDutyInfo = from_info(method, &ext.info)?;
                    state.pager_duty.push(PagerDutyContact {
                        contact_group_fallback: fallback_from_api(info.fallback),
                        service_key: info.service_key,
                        webhook_url: info.webhook_url,
                        account: info.account,
                    });
                }
                ContactMethod::Slack => {
                    let info: SlackInfo = from_info(method, &ext.info)?;
                    state.slack.push(SlackContact {
                        contact_group_fallback: fallback_from_api(info.fallback),
                        buttons: info.buttons == 1,
                        channel: info.channel,
                        team: info.team,
                        username: info.username,
                    });
                }
                ContactMethod::VictorOps => {
                    let info: VictorOpsInfo = from_info(method, &ext.info)?;
                    state.victorops.push(VictorOpsContact {
                        contact_group_fallback: fallback_from_api(info.fallback),
                        api_key: info.api_key,
                        critical: info.critical,
                        info: info.info,
                        team: info.team,
                        warning: info.warning,
                    });
                }
            }
        }

        for user in &group.contacts.users {
            let entry = AddressOrUser {
                address: None,
                user: Some(user.user_cid.clone()),
            };
            match ContactMethod::from_api(&user.method) {
                Some(ContactMethod::Email) => state.email.push(entry),
                Some(ContactMethod::Sms) => state.sms.push(entry),
                Some(ContactMethod::Xmpp) => state.xmpp.push(entry),
                _ => {
                    return Err(Error::provider_bug(format!(
                        "unsupported user contact method {:?}",
                        user.method
                    )));
                }
            }
        }
        Ok(state)
    }
}

fn alert_options_from_api(group: &ContactGroup) -> Result<Vec<AlertOption>> {
    if group.reminders.len() != NUM_SEVERITY_LEVELS
        || group.escalations.len() != NUM_SEVERITY_LEVELS
    {
        return Err(Error::provider_bug(format!(
            "expected {NUM_SEVERITY_LEVELS} reminder and escalation slots, found {} and {}",
            group.reminders.len(),
            group.escalations.len()
        )));
    }

    let options = group
        .reminders
        .iter()
        .zip(&group.escalations)
        .zip(1_u8..)
        .map(|((reminder, escalation), severity)| AlertOption {
            escalate_after: escalation
                .as_ref()
                .map(|e| duration::seconds_string(e.after)),
            escalate_to: escalation
                .as_ref()
                .and_then(|e| non_empty(Some(e.contact_group_cid.as_str()))),
            reminder: (*reminder != 0).then(|| duration::seconds_string(*reminder)),
            severity,
        })
        // An option carrying only its severity says nothing.
        .filter(|o| o.escalate_after.is_some() || o.escalate_to.is_some() || o.reminder.is_some())
        .collect();
    Ok(options)
}

/// Create the contact group and read it back.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the group.
#[instrument(name = "contact_group_create", skip_all)]
pub async fn create(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let config: ContactGroupConfig = data.decode_config()?;
    let group = config.to_api()?;
    debug!(name = %group.name, "Creating contact group");

    let created = client
        .create_contact_group(&group)
        .await
        .map_err(|e| Error::api(format!("unable to create contact group {:?}", group.name), e))?;
    data.set_id(created.cid);
    read(client, data).await
}

/// Fetch the contact group into state; a missing group clears the ID.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "contact_group_read", skip_all, fields(cid = data.id()))]
pub async fn read(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let group = match client.fetch_contact_group(&cid).await {
        Ok(group) => group,
        Err(e) if e.is_not_found() => {
            warn!(%cid, "Contact group no longer exists");
            data.clear_id();
            return Ok(Diagnostic::not_found(KIND, &cid).into());
        }
        Err(e) => return Err(Error::api(format!("unable to read contact group {cid:?}"), e)),
    };

    data.set_id(group.cid.clone());
    data.set_state(&ContactGroupConfig::from_api(&group)?)?;
    Ok(Diagnostics::new())
}

/// Replace the contact group with the current configuration.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the update.
#[instrument(name = "contact_group_update", skip_all, fields(cid = data.id()))]
pub async fn update(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let config: ContactGroupConfig = data.decode_config()?;
    let mut group = config.to_api()?;
    group.cid.clone_from(&cid);

    client
        .update_contact_group(&group)
        .await
        .map_err(|e| Error::api(format!("unable to update contact group {cid:?}"), e))?;
    read(client, data).await
}

/// Delete the contact group. A group that is already gone counts as deleted.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "contact_group_delete", skip_all, fields(cid = data.id()))]
pub async fn delete(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    match client.delete_contact_group(&cid).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => debug!(%cid, "Contact group already deleted"),
        Err(e) => return Err(Error::api(format!("unable to delete contact group {cid:?}"), e)),
    }
    data.clear_id();
    Ok(Diagnostics::new())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn base() -> Value {
        json!({
            "name": "ops",
            "email": [{"address": "ops@example.com"}],
            "sms": [{"user": "/user/9"}],
            "alert_option": [
                {"severity": 1, "reminder": "5m", "escalate_after": "15m", "escalate_to": "/contact_group/2"},
                {"severity": 3, "reminder": "10m"}
            ],
            "slack": [{"channel": "#ops", "team": "T01", "contact_group_fallback": "/contact_group/7"}],
            "tags": ["team:ops"]
        })
    }

    fn group_for(config: Value) -> Result<ContactGroup> {
        let config = schema().apply_defaults(&config);
        serde_json::from_value::<ContactGroupConfig>(config)?.to_api()
    }

    #[test]
    fn builds_group() {
        let group = group_for(base()).unwrap();
        assert_eq!(group.aggregation_window, 300);
        assert_eq!(group.reminders, vec![300, 0, 600, 0, 0]);
        assert_eq!(
            group.escalations[0],
            Some(ContactGroupEscalation {
                after: 900,
                contact_group_cid: "/contact_group/2".into()
            })
        );
        assert!(group.escalations[2].is_none());

        let email = &group.contacts.external[0];
        assert_eq!((email.method.as_str(), email.info.as_str()), ("email", "ops@example.com"));
        assert_eq!(group.contacts.users[0].user_cid, "/user/9");
        assert_eq!(group.contacts.users[0].method, "sms");

        let slack = group
            .contacts
            .external
            .iter()
            .find(|c| c.method == "slack")
            .unwrap();
        let info: Value = serde_json::from_str(&slack.info).unwrap();
        assert_eq!(info["buttons"], "1");
        assert_eq!(info["failover_group"], "7");
        assert_eq!(info["username"], "Circonus");
        assert_eq!(
            group.alert_formats.long_message.as_deref(),
            Some(DEFAULT_SLACK_LONG_MESSAGE)
        );
    }

    #[test]
    fn explicit_long_message_wins_over_slack_default() {
        let mut config = base();
        config["long_message"] = json!("{status}");
        let group = group_for(config).unwrap();
        assert_eq!(group.alert_formats.long_message.as_deref(), Some("{status}"));
    }

    #[test]
    fn address_or_user_is_required() {
        let mut config = base();
        config["xmpp"] = json!([{}]);
        let err = group_for(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "In type xmpp, either address or user must be specified"
        );

        let mut config = base();
        config["email"] = json!([{"address": "a@example.com", "user": "/user/1"}]);
        assert!(group_for(config).unwrap_err().to_string().contains("only one of"));
    }

    #[test]
    fn alert_option_rules() {
        let mut dup = base();
        dup["alert_option"] = json!([{"severity": 2, "reminder": "5m"}, {"severity": 2}]);
        assert!(group_for(dup).unwrap_err().to_string().contains("more than once"));

        let mut half = base();
        half["alert_option"] = json!([{"severity": 2, "escalate_to": "/contact_group/3"}]);
        assert!(group_for(half).unwrap_err().to_string().contains("set together"));
    }

    #[test]
    fn state_round_trip() {
        let mut group = group_for(base()).unwrap();
        group.cid = "/contact_group/40".into();
        group.last_modified = 1_700_000_000;
        group.alert_formats.short_summary = Some("  {status}  ".into());

        let state = ContactGroupConfig::from_api(&group).unwrap();
        assert_eq!(state.aggregation_window.as_deref(), Some("300s"));
        assert_eq!(state.short_summary.as_deref(), Some("{status}"));
        assert_eq!(state.alert_option.len(), 2);
        assert_eq!(state.alert_option[0].escalate_after.as_deref(), Some("900s"));
        assert_eq!(state.alert_option[1].reminder.as_deref(), Some("600s"));
        assert_eq!(state.alert_option[1].severity, 3);
        assert_eq!(state.email[0].address.as_deref(), Some("ops@example.com"));
        assert_eq!(state.sms[0].user.as_deref(), Some("/user/9"));
        assert_eq!(
            state.slack[0].contact_group_fallback.as_deref(),
            Some("/contact_group/7")
        );
        assert!(state.slack[0].buttons);
        assert_eq!(state.last_modified, 1_700_000_000);

        let again = state.to_api().unwrap();
        assert_eq!(again.contacts, group.contacts);
        assert_eq!(again.escalations, group.escalations);
        assert_eq!(again.reminders, group.reminders);
    }

    #[test]
    fn http_and_victorops_info_round_trip() {
        let mut config = base();
        config["http"] = json!([{"address": "https://hooks.example.com/alert"}]);
        config["victorops"] = json!([{
            "api_key": "k",
            "critical": 1,
            "info": 5,
            "warning": 3,
            "team": "sre"
        }]);
        let group = group_for(config).unwrap();
        let http = group.contacts.external.iter().find(|c| c.method == "http").unwrap();
        let info: Value = serde_json::from_str(&http.info).unwrap();
        assert_eq!(info, json!({"url": "https://hooks.example.com/alert", "params": "json", "method": "POST"}));

        let state = ContactGroupConfig::from_api(&group).unwrap();
        assert_eq!(state.http[0].method, "POST");
        assert_eq!(state.victorops[0].warning, 3);
        assert_eq!(state.victorops[0].contact_group_fallback, None);
    }

    #[test]
    fn unknown_method_is_a_provider_bug() {
        let mut group = group_for(base()).unwrap();
        group.contacts.external.push(ContactGroupContactsExternal {
            info: "x".into(),
            method: "pigeon".into(),
        });
        let err = ContactGroupConfig::from_api(&group).unwrap_err();
        assert!(err.to_string().starts_with("PROVIDER BUG"));
    }
}
