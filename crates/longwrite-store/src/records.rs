//! Record shapes persisted by the stages.
//!
//! Unknown fields on a work item ride along in `extra` and are written back
//! unchanged; each stage only appends its own field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input record: an instruction plus arbitrary metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// The instruction; also the item's identity across the pipeline
    pub prompt: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkItem {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            extra: Map::new(),
        }
    }
}

/// Plan stage output: a work item with its generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    #[serde(flatten)]
    pub work: WorkItem,
    pub plan: String,
}

impl PlanItem {
    /// Attach a plan, replacing any stale `plan` carried in the metadata.
    #[must_use]
    pub fn new(mut work: WorkItem, plan: impl Into<String>) -> Self {
        work.extra.remove("plan");
        Self {
            work,
            plan: plan.into(),
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.work.prompt
    }
}

/// Write stage output: a plan item with one text segment per step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteItem {
    #[serde(flatten)]
    pub planned: PlanItem,
    pub write: Vec<String>,
}

impl WriteItem {
    #[must_use]
    pub fn new(mut planned: PlanItem, write: Vec<String>) -> Self {
        planned.work.extra.remove("write");
        Self { planned, write }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        self.planned.prompt()
    }
}

/// One generated step, keyed by (instruction, step)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub prompt: String,
    pub step: String,
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_work_item_preserves_metadata() {
        let item: WorkItem =
            serde_json::from_value(json!({"prompt": "p", "id": 7, "tags": ["a"]})).unwrap();
        assert_eq!(item.prompt, "p");
        assert_eq!(item.extra["id"], json!(7));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back, json!({"prompt": "p", "id": 7, "tags": ["a"]}));
    }

    #[test]
    fn test_plan_item_appends_plan_field() {
        let work: WorkItem = serde_json::from_value(json!({"prompt": "p", "lang": "en"})).unwrap();
        let planned = PlanItem::new(work, "a\nb");
        let value = serde_json::to_value(&planned).unwrap();
        assert_eq!(value, json!({"prompt": "p", "lang": "en", "plan": "a\nb"}));

        let parsed: PlanItem = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, planned);
        assert!(!parsed.work.extra.contains_key("plan"));
    }

    #[test]
    fn test_stale_stage_fields_are_replaced() {
        let work: WorkItem =
            serde_json::from_value(json!({"prompt": "p", "plan": "old", "write": ["old"]}))
                .unwrap();
        let planned = PlanItem::new(work, "new");
        let written = WriteItem::new(planned, vec!["x".to_string()]);
        let value = serde_json::to_value(&written).unwrap();
        assert_eq!(value, json!({"prompt": "p", "plan": "new", "write": ["x"]}));
    }

    #[test]
    fn test_write_item_round_trip_keeps_metadata() {
        let line = r#"{"prompt":"p","plan":"s1\ns2","source":"doc","write":["one","two"]}"#;
        let item: WriteItem = serde_json::from_str(line).unwrap();
        assert_eq!(item.prompt(), "p");
        assert_eq!(item.planned.plan, "s1\ns2");
        assert_eq!(item.write, vec!["one", "two"]);
        assert_eq!(item.planned.work.extra["source"], json!("doc"));
    }
}
