use std::collections::VecDeque;
use std::io::Write;
use std::sync::mpsc::Receiver;

use anyhow::Result;
use serde::Serialize;
use story_engine::{
    Command, Engine, EngineErrorEvent, Event, Rail, SessionConfig, StoryRead, TapZone, UserId,
};
use tracing::{info, warn};

use crate::fixture::{Fixture, ScriptStep};
use crate::sim::SimulatedRenderer;

/// Rail cell redrawn after a read fact reached it.
#[derive(Debug, Serialize)]
struct RailReport<'a> {
    event: &'static str,
    page: usize,
    user: &'a UserId,
}

/// Replays a script against the engine, writing events as JSON lines.
pub struct Replay<W> {
    engine: Engine<SimulatedRenderer>,
    reads: Receiver<StoryRead>,
    rail: Rail,
    frame_us: i64,
    out: W,
}

impl<W> Replay<W>
where
    W: Write,
{
    pub fn new(fixture: Fixture, config: SessionConfig, interim_zero: bool, out: W) -> Result<Self> {
        let renderer = SimulatedRenderer::new(fixture.durations, interim_zero);
        let rail = Rail::new(fixture.stories.clone());
        let mut engine = Engine::with_config(renderer, fixture.stories, config)?;
        let reads = engine.subscribe_reads();
        Ok(Self {
            engine,
            reads,
            rail,
            frame_us: config.frame_us,
            out,
        })
    }

    /// Runs every step from the first `open` on, then reports rail updates.
    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<()> {
        let Some(start) = steps
            .iter()
            .position(|step| matches!(step, ScriptStep::Open { .. }))
        else {
            warn!("script has no open step, nothing to replay");
            return Ok(());
        };
        if start > 0 {
            warn!(skipped = start, "steps before the first open are ignored");
        }

        for step in &steps[start..] {
            self.step(step)?;
        }
        self.report_rail()
    }

    fn step(&mut self, step: &ScriptStep) -> Result<()> {
        match step {
            ScriptStep::Open { user } => self.dispatch(Command::Open { user: user.clone() }),
            ScriptStep::WaitMs { ms } => {
                let mut remaining = i64::try_from(*ms)?.saturating_mul(1_000);
                while remaining > 0 {
                    let elapsed_us = remaining.min(self.frame_us);
                    self.dispatch(Command::Tick { elapsed_us })?;
                    remaining -= elapsed_us;
                }
                Ok(())
            }
            ScriptStep::TapLeft => self.dispatch(Command::Tap {
                zone: TapZone::Rewind,
            }),
            ScriptStep::TapRight => self.dispatch(Command::Tap {
                zone: TapZone::Skip,
            }),
            ScriptStep::TapAt { x, width } => self.dispatch(Command::TapAt {
                x: *x,
                width: *width,
            }),
            ScriptStep::ScrollStart => self.dispatch(Command::ScrollStarted),
            ScriptStep::Settle { page } => self.dispatch(Command::PageSettled { page: *page }),
            ScriptStep::Dismiss => self.dispatch(Command::Dismiss),
        }
    }

    /// Applies `command` and everything it triggers: page requests scroll the
    /// pager, renderer callbacks arrive on the following turn.
    fn dispatch(&mut self, command: Command) -> Result<()> {
        let mut queue = VecDeque::from([command]);
        while let Some(command) = queue.pop_front() {
            match self.engine.handle_command(command) {
                Ok(events) => {
                    for event in events {
                        self.emit(&event)?;
                        if let Event::PageRequested { to, .. } = event {
                            queue.push_back(Command::ScrollStarted);
                            queue.push_back(Command::PageSettled { page: to });
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, "command rejected");
                    self.emit(&Event::Error(EngineErrorEvent::from_error(&error)))?;
                }
            }
            queue.extend(self.engine.renderer_mut().take_pending());
        }
        Ok(())
    }

    fn emit<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn report_rail(&mut self) -> Result<()> {
        let updated = self.rail.drain(&self.reads);
        info!(cells = updated.len(), "rail updated from read facts");
        for page in updated {
            let Some(story) = self.rail.stories().get(page) else {
                continue;
            };
            let report = RailReport {
                event: "rail_cell_read",
                page,
                user: story.user_id(),
            };
            serde_json::to_writer(&mut self.out, &report)?;
            writeln!(self.out)?;
        }
        Ok(())
    }
}
