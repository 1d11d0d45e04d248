#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use story_engine::{
    Command, Engine, Epoch, Event, MediaDuration, MediaItem, Renderer, SessionConfig, Story,
    StoryCollection, TapZone, User, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererCall {
    Load(Epoch, String),
    Preload(Epoch, String),
    Play,
    Pause,
    Seek(i64),
    Release(Epoch),
}

#[derive(Debug, Default)]
pub struct MockRenderer {
    calls: Arc<Mutex<Vec<RendererCall>>>,
}

impl MockRenderer {
    pub fn calls(&self) -> Arc<Mutex<Vec<RendererCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: RendererCall) {
        self.calls.lock().expect("lock renderer calls").push(call);
    }
}

impl Renderer for MockRenderer {
    fn load(&mut self, epoch: Epoch, item: &MediaItem) {
        self.record(RendererCall::Load(epoch, item.id.0.clone()));
    }

    fn preload(&mut self, epoch: Epoch, item: &MediaItem) {
        self.record(RendererCall::Preload(epoch, item.id.0.clone()));
    }

    fn play(&mut self) {
        self.record(RendererCall::Play);
    }

    fn pause(&mut self) {
        self.record(RendererCall::Pause);
    }

    fn seek(&mut self, at_us: i64) {
        self.record(RendererCall::Seek(at_us));
    }

    fn release(&mut self, epoch: Epoch) {
        self.record(RendererCall::Release(epoch));
    }
}

/// Builds a story whose items are named `{user}-{index}`.
pub fn story(user: &str, item_count: usize) -> Story {
    story_with_items(
        user,
        &(0..item_count)
            .map(|index| format!("{user}-{index}"))
            .collect::<Vec<_>>(),
    )
}

pub fn story_with_items(user: &str, item_ids: &[String]) -> Story {
    Story::new(
        User::new(user, user),
        false,
        item_ids
            .iter()
            .map(|id| MediaItem::new(id.as_str(), format!("file:///{id}.mp4")))
            .collect(),
    )
    .expect("valid story")
}

pub fn collection(layout: &[(&str, usize)]) -> StoryCollection {
    StoryCollection::new(
        layout
            .iter()
            .map(|(user, count)| story(user, *count))
            .collect(),
    )
    .expect("valid collection")
}

pub struct Harness {
    pub engine: Engine<MockRenderer>,
    pub calls: Arc<Mutex<Vec<RendererCall>>>,
}

impl Harness {
    pub fn new(layout: &[(&str, usize)]) -> Self {
        Self::with_config(layout, SessionConfig::default())
    }

    pub fn with_config(layout: &[(&str, usize)], config: SessionConfig) -> Self {
        let renderer = MockRenderer::default();
        let calls = renderer.calls();
        let engine =
            Engine::with_config(renderer, collection(layout), config).expect("valid config");
        Self { engine, calls }
    }

    pub fn send(&mut self, command: Command) -> Vec<Event> {
        self.engine
            .handle_command(command)
            .expect("command should succeed")
    }

    pub fn open(&mut self, user: &str) -> Vec<Event> {
        self.send(Command::Open {
            user: UserId::from(user),
        })
    }

    pub fn epoch(&self) -> Epoch {
        self.engine
            .snapshot()
            .and_then(|snapshot| snapshot.epoch)
            .expect("a story is bound")
    }

    /// Delivers a duration for `item` in the current epoch.
    pub fn resolve(&mut self, item: &str, seconds: f64) -> Vec<Event> {
        let epoch = self.epoch();
        self.send(Command::DurationResolved {
            epoch,
            item: item.into(),
            duration: MediaDuration::from_seconds(seconds),
        })
    }

    pub fn tick_ms(&mut self, ms: i64) -> Vec<Event> {
        self.send(Command::Tick {
            elapsed_us: ms * 1_000,
        })
    }

    pub fn tap(&mut self, zone: TapZone) -> Vec<Event> {
        self.send(Command::Tap { zone })
    }

    pub fn progress(&self) -> Vec<f64> {
        self.engine
            .snapshot()
            .expect("session is open")
            .tracks
            .iter()
            .map(|track| track.progress)
            .collect()
    }

    pub fn renderer_calls(&self) -> Vec<RendererCall> {
        self.calls.lock().expect("lock renderer calls").clone()
    }
}
