use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use story_engine::{ItemId, MediaItem, Story, StoryCollection, User, UserId};

const DEFAULT_SIMULATED_DURATION_SECS: f64 = 5.0;

#[derive(Debug, Deserialize)]
struct FixtureItem {
    #[serde(flatten)]
    item: MediaItem,
    /// `null` simulates a locator that never loads.
    #[serde(default = "default_simulated_duration")]
    simulated_duration_secs: Option<f64>,
}

fn default_simulated_duration() -> Option<f64> {
    Some(DEFAULT_SIMULATED_DURATION_SECS)
}

#[derive(Debug, Deserialize)]
struct FixtureStory {
    user: User,
    #[serde(default)]
    is_read: bool,
    items: Vec<FixtureItem>,
}

/// Stories to replay plus the durations the simulated renderer reports.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub stories: StoryCollection,
    pub durations: HashMap<ItemId, Option<f64>>,
}

impl Fixture {
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<FixtureStory> =
            serde_json::from_str(raw).context("stories fixture is not valid JSON")?;

        let mut durations = HashMap::new();
        let mut stories = Vec::with_capacity(records.len());
        for record in records {
            let user_id = record.user.id.clone();
            let items = record
                .items
                .into_iter()
                .map(|entry| {
                    durations.insert(entry.item.id.clone(), entry.simulated_duration_secs);
                    entry.item
                })
                .collect();
            let story = Story::new(record.user, record.is_read, items)
                .with_context(|| format!("invalid story for user {user_id}"))?;
            stories.push(story);
        }

        Ok(Self {
            stories: StoryCollection::new(stories)?,
            durations,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stories fixture {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to load {}", path.display()))
    }
}

/// One input of a replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    Open { user: UserId },
    WaitMs { ms: u64 },
    TapLeft,
    TapRight,
    TapAt { x: f64, width: f64 },
    ScrollStart,
    Settle { page: usize },
    Dismiss,
}

pub fn parse_script(raw: &str) -> Result<Vec<ScriptStep>> {
    serde_json::from_str(raw).context("replay script is not a valid step list")
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse_script(&raw).with_context(|| format!("failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{Fixture, ScriptStep, parse_script};
    use story_engine::{ItemId, UserId};

    #[test]
    fn fixture_reads_simulated_durations_and_broken_locators() {
        let fixture = Fixture::from_json(
            r#"[
                {
                    "user": {"id": "alice", "handle": "alice"},
                    "items": [
                        {"id": "a0", "locator": "file:///a0.mp4", "simulated_duration_secs": 2.5},
                        {"id": "a1", "locator": "file:///a1.jpg", "kind": "image", "simulated_duration_secs": null},
                        {"id": "a2", "locator": "file:///a2.mp4"}
                    ]
                }
            ]"#,
        )
        .expect("fixture should parse");

        assert_eq!(fixture.stories.len(), 1);
        assert_eq!(fixture.durations[&ItemId::from("a0")], Some(2.5));
        assert_eq!(fixture.durations[&ItemId::from("a1")], None);
        assert_eq!(fixture.durations[&ItemId::from("a2")], Some(5.0));
    }

    #[test]
    fn fixture_rejects_empty_story() {
        let result = Fixture::from_json(r#"[{"user": {"id": "bob", "handle": "bob"}, "items": []}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn script_steps_use_snake_case_tags() {
        let steps = parse_script(
            r#"[
                {"step": "open", "user": "alice"},
                {"step": "wait_ms", "ms": 250},
                {"step": "tap_at", "x": 10.0, "width": 300.0},
                {"step": "settle", "page": 1},
                {"step": "dismiss"}
            ]"#,
        )
        .expect("script should parse");

        assert_eq!(
            steps[0],
            ScriptStep::Open {
                user: UserId::from("alice"),
            }
        );
        assert_eq!(steps[1], ScriptStep::WaitMs { ms: 250 });
        assert_eq!(steps[4], ScriptStep::Dismiss);
    }
}
