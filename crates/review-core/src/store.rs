//! Issue store: the mutable issue set of the open document

use crate::error::{Result, ReviewError};
use crate::status::{page_status, ReviewStats};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared_types::{BBox, Issue, IssueId, PageStatus};

/// Which layout the stored result used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// A bare array of records
    Array,
    /// `{"issues": [...]}`
    Issues,
    /// `{"data": [...]}`
    Data,
}

/// One record as written by the validation backend or a previous save.
///
/// Only `page` must be well formed. The ignored flag is accepted under both
/// spellings; the producer's own `id` is dropped since ids are assigned by
/// position on every load.
#[derive(Debug, Deserialize)]
struct IssueRecord {
    page: u32,
    #[serde(default)]
    severity: Option<Value>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    bbox: Option<Value>,
    #[serde(default)]
    is_ignored: Option<Value>,
    #[serde(default, rename = "isIgnored")]
    is_ignored_camel: Option<Value>,
    #[serde(default, rename = "id")]
    _producer_id: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl IssueRecord {
    fn into_issue(self, id: IssueId) -> Issue {
        let mut extra = self.extra;
        let bbox = match self.bbox {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<BBox>(raw.clone()) {
                Ok(bbox) => Some(bbox),
                Err(e) => {
                    tracing::warn!(issue_id = id, error = %e, "Unusable bbox, issue has no location");
                    // Written back untouched on save
                    extra.insert("bbox".to_string(), raw);
                    None
                }
            },
        };
        let flag = |v: Option<Value>| v.as_ref().and_then(Value::as_bool);

        Issue {
            id,
            page: self.page,
            severity: text(self.severity),
            code: text(self.code),
            message: text(self.message),
            bbox,
            // camelCase is what this crate writes back, so it wins on conflict
            is_ignored: flag(self.is_ignored_camel)
                .or(flag(self.is_ignored))
                .unwrap_or(false),
            extra,
        }
    }
}

fn text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueStore {
    issues: Vec<Issue>,
    /// Top-level keys of the stored result, rewritten around the list on save
    envelope: Map<String, Value>,
    /// Records without a usable page, kept so a save does not lose them
    unparsed: Vec<Value>,
    shape: ResultShape,
}

impl Default for IssueStore {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            envelope: Map::new(),
            unparsed: Vec::new(),
            shape: ResultShape::Array,
        }
    }
}

impl IssueStore {
    /// Build a store from a stored or freshly produced result.
    ///
    /// Accepts a bare array, `{"issues": [...]}` or `{"data": [...]}`; when
    /// both keys hold arrays, `issues` is used. Ids are assigned by position.
    pub fn load(raw: Value) -> Result<Self> {
        let (records, envelope, shape) = match raw {
            Value::Array(records) => (records, Map::new(), ResultShape::Array),
            Value::Object(mut envelope) => {
                let (records, shape) = match envelope.get_mut("issues") {
                    Some(Value::Array(records)) => (std::mem::take(records), ResultShape::Issues),
                    _ => match envelope.get_mut("data") {
                        Some(Value::Array(records)) => (std::mem::take(records), ResultShape::Data),
                        _ => {
                            return Err(ReviewError::MalformedResult(
                                "object has neither an `issues` nor a `data` array".to_string(),
                            ))
                        }
                    },
                };
                (records, envelope, shape)
            }
            other => {
                return Err(ReviewError::MalformedResult(format!(
                    "expected an array or object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut issues = Vec::with_capacity(records.len());
        let mut unparsed = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            match IssueRecord::deserialize(&record) {
                Ok(parsed) => issues.push(parsed.into_issue(issues.len())),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable issue record");
                    unparsed.push(record);
                }
            }
        }

        tracing::info!(
            count = issues.len(),
            skipped = unparsed.len(),
            shape = ?shape,
            "Loaded issue set"
        );
        Ok(Self {
            issues,
            envelope,
            unparsed,
            shape,
        })
    }

    /// Records that were kept verbatim because they could not be read
    pub fn unparsed(&self) -> &[Value] {
        &self.unparsed
    }

    /// Parse and load a result file's contents
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(json).map_err(|e| ReviewError::MalformedResult(e.to_string()))?;
        Self::load(raw)
    }

    pub fn shape(&self) -> ResultShape {
        self.shape
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn get(&self, id: IssueId) -> Option<&Issue> {
        self.issues.get(id)
    }

    pub fn issues_on_page(&self, page: u32) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.page == page)
    }

    pub fn page_status(&self, page: u32) -> PageStatus {
        page_status(&self.issues, page)
    }

    pub fn stats(&self) -> ReviewStats {
        ReviewStats::from_issues(&self.issues)
    }

    /// Flip one issue's ignored flag and return the new value
    pub fn toggle(&mut self, id: IssueId) -> Result<bool> {
        let issue = self
            .issues
            .get_mut(id)
            .ok_or(ReviewError::IssueNotFound(id))?;
        issue.is_ignored = !issue.is_ignored;
        Ok(issue.is_ignored)
    }

    /// Set every issue on `page` to `resolved`; returns how many issues the page has
    pub fn set_page_resolution(&mut self, page: u32, resolved: bool) -> usize {
        let mut count = 0;
        for issue in self.issues.iter_mut().filter(|i| i.page == page) {
            issue.is_ignored = resolved;
            count += 1;
        }
        count
    }

    /// Resolve the page if anything on it is still active, otherwise reopen it.
    ///
    /// Returns the state applied, or `None` when the page has no issues.
    pub fn toggle_page(&mut self, page: u32) -> Option<bool> {
        let target = {
            let mut on_page = self.issues_on_page(page).peekable();
            on_page.peek()?;
            on_page.any(|i| i.is_active())
        };
        self.set_page_resolution(page, target);
        Some(target)
    }

    /// Resolve every active issue on `page`; returns how many changed
    pub fn approve_page(&mut self, page: u32) -> usize {
        let mut count = 0;
        for issue in self
            .issues
            .iter_mut()
            .filter(|i| i.page == page && i.is_active())
        {
            issue.is_ignored = true;
            count += 1;
        }
        count
    }

    /// Serialize the full list for storage.
    ///
    /// Every other key of the loaded envelope is kept; the list is written
    /// under both `issues` and `data` and each record carries the flag under
    /// both spellings.
    pub fn to_result_value(&self) -> Value {
        let records: Vec<Value> = self
            .issues
            .iter()
            .map(issue_record)
            .chain(self.unparsed.iter().cloned())
            .collect();
        let mut envelope = self.envelope.clone();
        envelope.insert("issues".to_string(), Value::Array(records.clone()));
        envelope.insert("data".to_string(), Value::Array(records));
        Value::Object(envelope)
    }
}

fn issue_record(issue: &Issue) -> Value {
    let mut record = Map::new();
    for (key, value) in &issue.extra {
        record.insert(key.clone(), value.clone());
    }
    record.insert("page".to_string(), Value::from(issue.page));
    record.insert("severity".to_string(), Value::from(issue.severity.as_str()));
    record.insert("code".to_string(), Value::from(issue.code.as_str()));
    record.insert("message".to_string(), Value::from(issue.message.as_str()));
    if let Some(bbox) = issue.bbox {
        record.insert(
            "bbox".to_string(),
            Value::from(<[f64; 4]>::from(bbox).to_vec()),
        );
    }
    record.insert("is_ignored".to_string(), Value::Bool(issue.is_ignored));
    record.insert("isIgnored".to_string(), Value::Bool(issue.is_ignored));
    Value::Object(record)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records() -> Value {
        json!([
            {"page": 1, "severity": "error", "code": "MARGIN_LEFT", "message": "Left margin too small",
             "bbox": [10, 10, 110, 60], "is_ignored": true},
            {"page": 1, "severity": "warning", "code": "FONT", "message": "Wrong font"},
            {"page": 3, "severity": "info", "code": "SPACING", "message": "Check spacing",
             "isIgnored": false, "rule": "line_spacing"}
        ])
    }

    #[test]
    fn test_three_shapes_yield_same_issues() {
        let bare = IssueStore::load(records()).unwrap();
        let issues = IssueStore::load(json!({ "issues": records() })).unwrap();
        let data = IssueStore::load(json!({ "data": records() })).unwrap();

        assert_eq!(bare.issues(), issues.issues());
        assert_eq!(bare.issues(), data.issues());
        assert_eq!(bare.shape(), ResultShape::Array);
        assert_eq!(issues.shape(), ResultShape::Issues);
        assert_eq!(data.shape(), ResultShape::Data);
    }

    #[test]
    fn test_ids_are_positional() {
        let store = IssueStore::load(records()).unwrap();
        let ids: Vec<_> = store.issues().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_flag_normalized_from_either_name() {
        let store = IssueStore::load(records()).unwrap();
        assert!(store.issues()[0].is_ignored);
        assert!(!store.issues()[1].is_ignored);
        assert!(!store.issues()[2].is_ignored);
    }

    #[test]
    fn test_camel_case_flag_wins_on_conflict() {
        let store =
            IssueStore::load(json!([{"page": 1, "is_ignored": false, "isIgnored": true}])).unwrap();
        assert!(store.issues()[0].is_ignored);
    }

    #[test]
    fn test_issues_key_preferred_over_data() {
        let store = IssueStore::load(json!({
            "issues": [{"page": 2, "code": "A"}],
            "data": [{"page": 5, "code": "B"}, {"page": 6, "code": "C"}]
        }))
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.issues()[0].code, "A");
    }

    #[test]
    fn test_malformed_results() {
        for raw in [json!({"status": "ok"}), json!("text"), json!(null)] {
            let err = IssueStore::load(raw).unwrap_err();
            assert!(matches!(err, ReviewError::MalformedResult(_)));
        }
        assert!(matches!(
            IssueStore::from_json("{not json").unwrap_err(),
            ReviewError::MalformedResult(_)
        ));
    }

    #[test]
    fn test_bad_records_do_not_discard_the_list() {
        let raw = json!({
            "status": "success",
            "issues": [
                {"page": 1, "code": "GOOD", "bbox": [1, 2, 3, 4], "isIgnored": true},
                {"page": 1, "code": "SHORT_BOX", "bbox": [1, 2, 3]},
                {"page": "two", "code": "BAD_PAGE"},
                {"page": 3, "code": "NUMERIC", "message": 42}
            ]
        });
        let store = IssueStore::load(raw).unwrap();

        let codes: Vec<_> = store.issues().iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["GOOD", "SHORT_BOX", "NUMERIC"]);
        let ids: Vec<_> = store.issues().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(store.issues()[0].is_ignored);
        assert_eq!(store.issues()[1].bbox, None);
        assert_eq!(store.issues()[2].message, "42");
        assert_eq!(store.unparsed().len(), 1);
    }

    #[test]
    fn test_bad_records_survive_a_save() {
        let store = IssueStore::load(json!([
            {"page": 1, "code": "SHORT_BOX", "bbox": [1, 2, 3]},
            {"code": "NO_PAGE"}
        ]))
        .unwrap();
        let value = store.to_result_value();

        assert_eq!(value["issues"][0]["bbox"], json!([1, 2, 3]));
        assert_eq!(value["issues"][1], json!({"code": "NO_PAGE"}));
        assert_eq!(value["issues"], value["data"]);
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        let mut store = IssueStore::load(records()).unwrap();
        let before = store.issues()[1].is_ignored;
        assert_eq!(store.toggle(1).unwrap(), !before);
        assert_eq!(store.toggle(1).unwrap(), before);
    }

    #[test]
    fn test_toggle_unknown_id() {
        let mut store = IssueStore::load(records()).unwrap();
        assert!(matches!(store.toggle(42), Err(ReviewError::IssueNotFound(42))));
    }

    #[test]
    fn test_set_page_resolution() {
        let mut store = IssueStore::load(records()).unwrap();
        assert_eq!(store.set_page_resolution(1, true), 2);
        assert_eq!(store.page_status(1), PageStatus::Resolved);
        assert_eq!(store.set_page_resolution(2, true), 0);
    }

    #[test]
    fn test_toggle_page_resolves_then_reopens() {
        let mut store = IssueStore::load(records()).unwrap();

        // Page 1 has one active issue, so the toggle resolves everything
        assert_eq!(store.toggle_page(1), Some(true));
        assert!(store.issues_on_page(1).all(|i| i.is_ignored));

        assert_eq!(store.toggle_page(1), Some(false));
        assert!(store.issues_on_page(1).all(|i| i.is_active()));

        assert_eq!(store.toggle_page(7), None);
    }

    #[test]
    fn test_approve_page_only_touches_active() {
        let mut store = IssueStore::load(records()).unwrap();
        assert_eq!(store.approve_page(1), 1);
        assert_eq!(store.approve_page(1), 0);
        assert_eq!(store.stats().remaining, 1);
    }

    #[test]
    fn test_result_value_keeps_envelope_and_writes_both_keys() {
        let store = IssueStore::load(json!({
            "status": "success",
            "filename": "thesis.pdf",
            "data": records()
        }))
        .unwrap();
        let value = store.to_result_value();

        assert_eq!(value["status"], json!("success"));
        assert_eq!(value["filename"], json!("thesis.pdf"));
        assert_eq!(value["issues"], value["data"]);
        assert_eq!(value["issues"][0]["isIgnored"], json!(true));
        assert_eq!(value["issues"][0]["is_ignored"], json!(true));
        assert_eq!(value["issues"][0]["bbox"], json!([10.0, 10.0, 110.0, 60.0]));
        assert_eq!(value["issues"][2]["rule"], json!("line_spacing"));
        assert!(value["issues"][1].get("bbox").is_none());
    }

    #[test]
    fn test_reload_after_save_is_identical() {
        let mut store = IssueStore::load(records()).unwrap();
        store.toggle(2).unwrap();
        let reloaded = IssueStore::load(store.to_result_value()).unwrap();
        assert_eq!(reloaded.issues(), store.issues());
    }

    #[test]
    fn test_producer_ids_are_dropped() {
        let store = IssueStore::load(json!([{"id": 99, "page": 1}, {"id": 3, "page": 2}])).unwrap();
        assert_eq!(store.issues()[0].id, 0);
        assert!(store.issues()[0].extra.get("id").is_none());
        assert!(store.to_result_value()["issues"][0].get("id").is_none());
    }
}
