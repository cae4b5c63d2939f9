//! In-memory Circonus API shared by the resource integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use circonus_api::{CheckBundle, CirconusApi, ContactGroup, Error, Graph, Result, RuleSet};

/// Stores objects by CID and hands out sequential IDs like the real API.
#[derive(Debug, Default)]
pub struct MockApi {
    next_id: AtomicU64,
    bundles: Mutex<BTreeMap<String, CheckBundle>>,
    graphs: Mutex<BTreeMap<String, Graph>>,
    groups: Mutex<BTreeMap<String, ContactGroup>>,
    rule_sets: Mutex<BTreeMap<String, RuleSet>>,
}

fn not_found(cid: &str) -> Error {
    Error::NotFound {
        cid: cid.to_string(),
    }
}

fn fetch<T: Clone>(store: &Mutex<BTreeMap<String, T>>, cid: &str) -> Result<T> {
    store
        .lock()
        .unwrap()
        .get(cid)
        .cloned()
        .ok_or_else(|| not_found(cid))
}

fn replace<T: Clone>(store: &Mutex<BTreeMap<String, T>>, cid: &str, object: &T) -> Result<T> {
    let mut store = store.lock().unwrap();
    match store.get_mut(cid) {
        Some(existing) => {
            *existing = object.clone();
            Ok(object.clone())
        }
        None => Err(not_found(cid)),
    }
}

fn remove<T>(store: &Mutex<BTreeMap<String, T>>, cid: &str) -> Result<()> {
    store
        .lock()
        .unwrap()
        .remove(cid)
        .map(|_| ())
        .ok_or_else(|| not_found(cid))
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn bundle(&self, cid: &str) -> Option<CheckBundle> {
        self.bundles.lock().unwrap().get(cid).cloned()
    }

    pub fn graph(&self, cid: &str) -> Option<Graph> {
        self.graphs.lock().unwrap().get(cid).cloned()
    }

    pub fn group(&self, cid: &str) -> Option<ContactGroup> {
        self.groups.lock().unwrap().get(cid).cloned()
    }

    pub fn rule_set(&self, cid: &str) -> Option<RuleSet> {
        self.rule_sets.lock().unwrap().get(cid).cloned()
    }

    /// Store a rule set as-is, as if created outside Terraform.
    pub fn insert_rule_set(&self, rule_set: RuleSet) {
        self.rule_sets
            .lock()
            .unwrap()
            .insert(rule_set.cid.clone(), rule_set);
    }

    /// Forget every object, as if deleted outside Terraform.
    pub fn purge(&self) {
        self.bundles.lock().unwrap().clear();
        self.graphs.lock().unwrap().clear();
        self.groups.lock().unwrap().clear();
        self.rule_sets.lock().unwrap().clear();
    }
}

#[async_trait]
impl CirconusApi for MockApi {
    async fn create_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle> {
        let id = self.next();
        let mut stored = bundle.clone();
        stored.cid = format!("/check_bundle/{id}");
        stored.checks = stored
            .brokers
            .iter()
            .zip(1_u64..)
            .map(|(_, n)| format!("/check/{}", id * 10 + n))
            .collect();
        stored.check_uuids = stored
            .checks
            .iter()
            .map(|c| format!("uuid-{}", c.trim_start_matches("/check/")))
            .collect();
        stored.created = 1_700_000_000;
        stored.last_modified = 1_700_000_000;
        stored.last_modified_by = "/user/1".to_string();
        self.bundles
            .lock()
            .unwrap()
            .insert(stored.cid.clone(), stored.clone());
        Ok(stored)
    }

    async fn fetch_check_bundle(&self, cid: &str) -> Result<CheckBundle> {
        fetch(&self.bundles, cid)
    }

    async fn update_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle> {
        let existing = fetch(&self.bundles, &bundle.cid)?;
        let mut stored = bundle.clone();
        stored.checks = existing.checks;
        stored.check_uuids = existing.check_uuids;
        stored.created = existing.created;
        stored.last_modified = existing.last_modified + 60;
        stored.last_modified_by = existing.last_modified_by;
        replace(&self.bundles, &bundle.cid, &stored)
    }

    async fn delete_check_bundle(&self, cid: &str) -> Result<()> {
        remove(&self.bundles, cid)
    }

    async fn create_graph(&self, graph: &Graph) -> Result<Graph> {
        let mut stored = graph.clone();
        stored.cid = format!("/graph/00000000-0000-4000-8000-{:012}", self.next());
        self.graphs
            .lock()
            .unwrap()
            .insert(stored.cid.clone(), stored.clone());
        Ok(stored)
    }

    async fn fetch_graph(&self, cid: &str) -> Result<Graph> {
        fetch(&self.graphs, cid)
    }

    async fn update_graph(&self, graph: &Graph) -> Result<Graph> {
        replace(&self.graphs, &graph.cid, graph)
    }

    async fn delete_graph(&self, cid: &str) -> Result<()> {
        remove(&self.graphs, cid)
    }

    async fn create_contact_group(&self, group: &ContactGroup) -> Result<ContactGroup> {
        let mut stored = group.clone();
        stored.cid = format!("/contact_group/{}", self.next());
        stored.last_modified = 1_700_000_000;
        stored.last_modified_by = "/user/1".to_string();
        self.groups
            .lock()
            .unwrap()
            .insert(stored.cid.clone(), stored.clone());
        Ok(stored)
    }

    async fn fetch_contact_group(&self, cid: &str) -> Result<ContactGroup> {
        fetch(&self.groups, cid)
    }

    async fn update_contact_group(&self, group: &ContactGroup) -> Result<ContactGroup> {
        replace(&self.groups, &group.cid, group)
    }

    async fn delete_contact_group(&self, cid: &str) -> Result<()> {
        remove(&self.groups, cid)
    }

    async fn create_rule_set(&self, rule_set: &RuleSet) -> Result<RuleSet> {
        let mut stored = rule_set.clone();
        let check_id = stored.check_cid.trim_start_matches("/check/");
        stored.cid = format!("/rule_set/{check_id}_{}", self.next());
        self.rule_sets
            .lock()
            .unwrap()
            .insert(stored.cid.clone(), stored.clone());
        Ok(stored)
    }

    async fn fetch_rule_set(&self, cid: &str) -> Result<RuleSet> {
        fetch(&self.rule_sets, cid)
    }

    async fn update_rule_set(&self, rule_set: &RuleSet) -> Result<RuleSet> {
        replace(&self.rule_sets, &rule_set.cid, rule_set)
    }

    async fn delete_rule_set(&self, cid: &str) -> Result<()> {
        remove(&self.rule_sets, cid)
    }
}
