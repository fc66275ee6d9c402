//! Streaming point cloud viewer
//!
//! Messages arriving on the configured topic are copied into a single-slot
//! mailbox. Each frame takes the latest payload, decodes it, applies it to
//! the instanced spheres and renders. A frame whose payload fails to decode
//! or apply is skipped and the previous instances stay on screen.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use livecloud_core::{Drawable, Error, Point3d, PointSet, Result};
use livecloud_io::{FrameDecoder, MessageSource, RawFrame};

use crate::config::ViewerConfig;
use crate::frame_loop::{FrameLoop, StopToken};
use crate::mailbox::Mailbox;
use crate::renderer::Renderer;
use crate::scene::{Scene, SceneStats};
use crate::sync::{InstanceSynchronizer, SyncOutcome, SyncStats};

/// Result of one frame tick
#[derive(Debug)]
pub enum FrameOutcome {
    /// No new payload since the last frame
    Idle,
    /// A payload was decoded and applied
    Applied(SyncOutcome),
    /// A payload was dropped; the previous instances were kept
    Skipped(Error),
}

/// Frame and message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerStats {
    pub frames: u64,
    pub messages: u64,
    pub applied: u64,
    pub skipped: u64,
    /// Frames whose message pump failed; rendering continued regardless
    pub transport_errors: u64,
}

/// Extent of the last applied point set, for framing a camera on it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub min: Point3d,
    pub max: Point3d,
    pub center: Point3d,
}

impl ViewBounds {
    /// Bounds of the finite points of `points`, `None` for an empty set
    pub fn of(points: &PointSet) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (min, max) = points.bounding_box();
        Some(Self {
            min,
            max,
            center: points.center(),
        })
    }
}

/// Summary returned by [`StreamViewer::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownReport {
    pub viewer: ViewerStats,
    pub sync: SyncStats,
    pub scene: SceneStats,
    /// Collections still registered in the scene after teardown
    pub scene_members: usize,
}

/// Delivers payloads for one topic into a viewer's mailbox.
///
/// Cheap to clone and safe to use from the thread a network client calls
/// back on.
#[derive(Debug, Clone)]
pub struct MessageSink {
    topic: Arc<str>,
    mailbox: Arc<Mailbox<Vec<u8>>>,
}

impl MessageSink {
    fn new(topic: &str) -> Self {
        Self {
            topic: Arc::from(topic),
            mailbox: Arc::new(Mailbox::new()),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Copy `payload` into the mailbox if it was published on the sink's topic
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> bool {
        topic == &*self.topic && self.mailbox.try_set(payload.to_vec())
    }

    /// Like [`MessageSink::deliver`] for a payload the caller already owns
    pub fn deliver_owned(&self, topic: &str, payload: Vec<u8>) -> bool {
        topic == &*self.topic && self.mailbox.try_set(payload)
    }
}

/// Receives point frames from a message source and renders them as spheres
pub struct StreamViewer<M: MessageSource, R: Renderer> {
    config: ViewerConfig,
    decoder: FrameDecoder,
    scene: Scene,
    synchronizer: InstanceSynchronizer<Scene>,
    sink: MessageSink,
    source: M,
    renderer: R,
    stop: StopToken,
    stats: ViewerStats,
    view_bounds: Option<ViewBounds>,
}

impl<M: MessageSource, R: Renderer> StreamViewer<M, R> {
    /// Create a viewer with an empty sphere collection and subscribe to the configured topic
    pub fn new(config: ViewerConfig, mut source: M, renderer: R) -> Result<Self> {
        config.validate()?;

        let mut scene = Scene::new(config.sphere);
        let synchronizer = InstanceSynchronizer::new(&mut scene, config.sphere.radius)
            .with_validation(config.validate_coordinates);

        source.subscribe(&config.topic);
        log::info!("Viewer listening on '{}' via {}", config.topic, config.broker_url);

        Ok(Self {
            decoder: FrameDecoder::new(config.decode),
            sink: MessageSink::new(&config.topic),
            config,
            scene,
            synchronizer,
            source,
            renderer,
            stop: StopToken::new(),
            stats: ViewerStats::default(),
            view_bounds: None,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn synchronizer(&self) -> &InstanceSynchronizer<Scene> {
        &self.synchronizer
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn stats(&self) -> ViewerStats {
        self.stats
    }

    /// Extent of the instances on screen, `None` while there are none
    pub fn view_bounds(&self) -> Option<ViewBounds> {
        self.view_bounds
    }

    /// Token that stops [`StreamViewer::run`] before its next frame
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Handle for delivering messages from outside the frame loop
    pub fn message_sink(&self) -> MessageSink {
        self.sink.clone()
    }

    /// Message arrival callback; returns whether the payload was queued
    pub fn on_message(&self, topic: &str, payload: &[u8]) -> bool {
        self.sink.deliver(topic, payload)
    }

    /// Move every waiting message from the source into the mailbox
    pub fn pump_messages(&mut self) -> Result<usize> {
        let mut queued = 0;
        while let Some(message) = self.source.try_next()? {
            self.stats.messages += 1;
            if self.sink.deliver_owned(&message.topic, message.payload) {
                queued += 1;
            }
        }
        Ok(queued)
    }

    /// Run one frame: pump messages, apply the latest payload, render.
    ///
    /// Transport errors are logged and counted; only renderer errors are returned.
    pub fn tick(&mut self) -> Result<FrameOutcome> {
        if self.source.is_open() {
            if let Err(err) = self.pump_messages() {
                self.stats.transport_errors += 1;
                log::warn!("Failed to receive messages: {}", err);
            }
        }

        let outcome = match self.sink.mailbox.take_and_clear() {
            Some(payload) => self.apply_payload(&payload),
            None => FrameOutcome::Idle,
        };

        self.renderer.render(&self.scene, self.synchronizer.current_mut())?;
        self.stats.frames += 1;

        Ok(outcome)
    }

    /// Tick until the stop token is set or `max_frames` frames have run
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<u64> {
        let mut frame_loop = FrameLoop::new(self.stop.clone());
        if let Some(interval) = self.config.frame_interval() {
            frame_loop = frame_loop.with_interval(interval);
        }
        if let Some(max_frames) = max_frames {
            frame_loop = frame_loop.with_max_frames(max_frames);
        }

        frame_loop.run(|_| self.tick().map(|_| ()))
    }

    /// Stop the frame loop, release the instances, then close messaging
    pub fn shutdown(mut self) -> TeardownReport {
        self.stop.stop();
        let sync = self.synchronizer.release(&mut self.scene);
        self.source.close();
        self.sink.mailbox.close();

        log::info!(
            "Viewer shut down after {} frames ({} applied, {} skipped)",
            self.stats.frames,
            self.stats.applied,
            self.stats.skipped
        );

        TeardownReport {
            viewer: self.stats,
            sync,
            scene: self.scene.stats(),
            scene_members: self.scene.len(),
        }
    }

    fn apply_payload(&mut self, payload: &[u8]) -> FrameOutcome {
        let result = self
            .decoder
            .decode(RawFrame::whole(payload))
            .and_then(|points| {
                let outcome = self.synchronizer.apply(&mut self.scene, &points)?;
                Ok((outcome, ViewBounds::of(&points)))
            });

        match result {
            Ok((outcome, bounds)) => {
                self.stats.applied += 1;
                self.view_bounds = bounds;
                log::debug!("Applied {} points at {} ms", outcome.count(), unix_millis());
                if let (SyncOutcome::Recreated { .. }, Some(bounds)) = (outcome, bounds) {
                    log::debug!("Framing view on {:?} .. {:?}", bounds.min, bounds.max);
                }
                FrameOutcome::Applied(outcome)
            }
            Err(err) => {
                self.stats.skipped += 1;
                log::warn!("Skipping frame of {} bytes: {}", payload.len(), err);
                FrameOutcome::Skipped(err)
            }
        }
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
