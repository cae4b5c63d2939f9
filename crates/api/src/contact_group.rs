//! Contact group objects (`/contact_group`).

use serde::{Deserialize, Serialize};

use crate::config::NUM_SEVERITY_LEVELS;

/// Alert message templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroupAlertFormats {
    /// Long message template
    #[serde(default)]
    pub long_message: Option<String>,
    /// Long subject template
    #[serde(default)]
    pub long_subject: Option<String>,
    /// Long summary template
    #[serde(default)]
    pub long_summary: Option<String>,
    /// Short message template
    #[serde(default)]
    pub short_message: Option<String>,
    /// Short summary template
    #[serde(default)]
    pub short_summary: Option<String>,
}

/// A contact method that is not a Circonus user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroupContactsExternal {
    /// Address or JSON-encoded method details
    #[serde(rename = "contact_info")]
    pub info: String,
    /// `email`, `http`, `pagerduty`, `slack`, `sms`, `victorops` or `xmpp`
    pub method: String,
}

/// A contact method bound to a Circonus user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroupContactsUser {
    /// Contact info resolved by the API
    #[serde(rename = "_contact_info", default, skip_serializing_if = "String::is_empty")]
    pub info: String,
    /// `email`, `sms` or `xmpp`
    pub method: String,
    /// User CID
    #[serde(rename = "user")]
    pub user_cid: String,
}

/// All contacts of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroupContacts {
    /// External contacts
    #[serde(default)]
    pub external: Vec<ContactGroupContactsExternal>,
    /// User contacts
    #[serde(default)]
    pub users: Vec<ContactGroupContactsUser>,
}

/// Escalation for one severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroupEscalation {
    /// Seconds before escalating
    pub after: u64,
    /// Contact group CID escalated to
    #[serde(rename = "contact_group")]
    pub contact_group_cid: String,
}

/// A contact group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGroup {
    /// Seconds to aggregate alerts for
    #[serde(default, skip_serializing_if = "is_zero")]
    pub aggregation_window: u64,
    /// Message templates
    #[serde(default)]
    pub alert_formats: ContactGroupAlertFormats,
    /// Send clears even when not alerting
    #[serde(default)]
    pub always_send_clear: bool,
    /// CID assigned by the API
    #[serde(rename = "_cid", default, skip_serializing_if = "String::is_empty")]
    pub cid: String,
    /// Contacts
    #[serde(default)]
    pub contacts: ContactGroupContacts,
    /// One slot per severity
    #[serde(default = "empty_escalations")]
    pub escalations: Vec<Option<ContactGroupEscalation>>,
    /// Group type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_type: String,
    /// Last modification time
    #[serde(rename = "_last_modified", default, skip_serializing_if = "is_zero")]
    pub last_modified: u64,
    /// Last modifying user CID
    #[serde(rename = "_last_modified_by", default, skip_serializing_if = "String::is_empty")]
    pub last_modified_by: String,
    /// Name
    #[serde(default)]
    pub name: String,
    /// Reminder seconds, one slot per severity
    #[serde(default = "empty_reminders")]
    pub reminders: Vec<u64>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for ContactGroup {
    fn default() -> Self {
        Self {
            aggregation_window: 0,
            alert_formats: ContactGroupAlertFormats::default(),
            always_send_clear: false,
            cid: String::new(),
            contacts: ContactGroupContacts::default(),
            escalations: empty_escalations(),
            group_type: String::new(),
            last_modified: 0,
            last_modified_by: String::new(),
            name: String::new(),
            reminders: empty_reminders(),
            tags: Vec::new(),
        }
    }
}

fn empty_escalations() -> Vec<Option<ContactGroupEscalation>> {
    vec![None; NUM_SEVERITY_LEVELS]
}

fn empty_reminders() -> Vec<u64> {
    vec![0; NUM_SEVERITY_LEVELS]
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_has_a_slot_per_severity() {
        let cg = ContactGroup::default();
        assert_eq!(cg.escalations.len(), NUM_SEVERITY_LEVELS);
        assert_eq!(cg.reminders.len(), NUM_SEVERITY_LEVELS);

        let value = serde_json::to_value(&cg).unwrap();
        assert_eq!(value["escalations"].as_array().map(Vec::len), Some(5));
        assert!(value["escalations"][0].is_null());
    }

    #[test]
    fn decodes_contacts() {
        let json = r#"{
            "_cid": "/contact_group/4680",
            "name": "ops",
            "contacts": {
                "external": [{"contact_info": "ops@example.com", "method": "email"}],
                "users": [{"_contact_info": "x@example.com", "method": "sms", "user": "/user/9"}]
            },
            "escalations": [null, {"after": 900, "contact_group": "/contact_group/1"}, null, null, null],
            "reminders": [0, 60, 0, 0, 0]
        }"#;
        let cg: ContactGroup = serde_json::from_str(json).unwrap();
        assert_eq!(cg.contacts.external[0].info, "ops@example.com");
        assert_eq!(cg.contacts.users[0].user_cid, "/user/9");
        assert_eq!(
            cg.escalations[1].as_ref().map(|e| e.after),
            Some(900)
        );
        assert_eq!(cg.reminders[1], 60);
    }
}
