//! The renderer boundary and the sinks shipped with the crate.

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use super::command::{AttrMap, Batch};
use super::scene::{Frame, Scene};
use crate::errors::ProtocolError;
use crate::log::debug;

/// What a sink did with a batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Applied synchronously; nothing is pending
    Applied,
    /// Handed to a transport; pending until acknowledged through an [`AckHandle`]
    Sent,
}

/// Consumer of flushed batches.
///
/// A sink is initialized once, with the frame of the surface that owns it,
/// before the first batch arrives.
pub trait RenderSink {
    fn init(&mut self, frame: &Frame) -> Result<(), ProtocolError>;

    /// Apply or transmit one batch. Commands must be applied in order.
    fn apply_batch(&mut self, batch: &Batch) -> Result<Delivery, ProtocolError>;

    /// The surface frame changed after `init` (root style, view box).
    fn reframe(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        let _ = frame;
        Ok(())
    }

    /// Whether this sink can ever deliver interaction events
    fn supports_events(&self) -> bool {
        false
    }

    /// Ask the renderer to report events of these kinds.
    fn watch_events(&mut self, kinds: &[String]) -> Result<(), ProtocolError> {
        let _ = kinds;
        Err(ProtocolError::UnsupportedOperation {
            operation: "watch_events",
        })
    }
}

/// Shared record of the highest batch sequence a renderer acknowledged.
///
/// The surface keeps one; hosts clone it and call [`AckHandle::acknowledge`]
/// when their transport confirms a batch.
#[derive(Clone, Debug, Default)]
pub struct AckHandle(Rc<Cell<u64>>);

impl AckHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acknowledge(&self, sequence: u64) {
        if sequence > self.0.get() {
            self.0.set(sequence);
        }
    }

    pub fn acknowledged(&self) -> u64 {
        self.0.get()
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Keeps every batch and mirrors them into a [`Scene`]. Supports events.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub batches: Vec<Batch>,
    pub scene: Scene,
    pub watched: Vec<String>,
    pub init_count: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSink for RecordingSink {
    fn init(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.init_count += 1;
        self.scene.set_frame(frame.clone());
        Ok(())
    }

    fn apply_batch(&mut self, batch: &Batch) -> Result<Delivery, ProtocolError> {
        self.scene.apply_batch(batch);
        self.batches.push(batch.clone());
        Ok(Delivery::Applied)
    }

    fn reframe(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.scene.set_frame(frame.clone());
        Ok(())
    }

    fn supports_events(&self) -> bool {
        true
    }

    fn watch_events(&mut self, kinds: &[String]) -> Result<(), ProtocolError> {
        for kind in kinds {
            if !self.watched.contains(kind) {
                self.watched.push(kind.clone());
            }
        }
        Ok(())
    }
}

// ============================================================================
// StaticSvgSink
// ============================================================================

/// Non-interactive export target. Never delivers events.
#[derive(Debug, Default)]
pub struct StaticSvgSink {
    scene: Scene,
}

impl StaticSvgSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The current drawing as a standalone SVG document
    pub fn export(&self) -> String {
        self.scene.to_svg_document()
    }
}

impl RenderSink for StaticSvgSink {
    fn init(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.scene = Scene::new(frame.clone());
        Ok(())
    }

    fn apply_batch(&mut self, batch: &Batch) -> Result<Delivery, ProtocolError> {
        self.scene.apply_batch(batch);
        Ok(Delivery::Applied)
    }

    fn reframe(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.scene.set_frame(frame.clone());
        Ok(())
    }
}

// ============================================================================
// JsonSink
// ============================================================================

/// Writes JSON lines for a remote renderer.
///
/// Frame updates are `{"frame": {...}}` objects, batches are
/// `[sequence, [command, ...]]` arrays, watch requests are
/// `{"watch": [kind, ...]}`. Every batch stays pending until acknowledged.
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        JsonSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, value: &impl serde::Serialize) -> Result<(), ProtocolError> {
        serde_json::to_writer(&mut self.writer, value)
            .map_err(|e| ProtocolError::Transport(e.into()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(ProtocolError::Transport)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        let mut body = AttrMap::new();
        body.insert("width".into(), frame.width.into());
        body.insert("height".into(), frame.height.into());
        body.insert("viewBox".into(), frame.view_box_attr().into());
        body.insert("style".into(), frame.style.clone().into());
        let mut message = AttrMap::new();
        message.insert("frame".into(), body.into());
        self.write_line(&message)
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    fn init(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.write_frame(frame)
    }

    fn apply_batch(&mut self, batch: &Batch) -> Result<Delivery, ProtocolError> {
        self.write_line(batch)?;
        debug!(sequence = batch.sequence, "batch sent");
        Ok(Delivery::Sent)
    }

    fn reframe(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.write_frame(frame)
    }

    fn supports_events(&self) -> bool {
        true
    }

    fn watch_events(&mut self, kinds: &[String]) -> Result<(), ProtocolError> {
        let mut message = AttrMap::new();
        message.insert("watch".into(), kinds.to_vec().into());
        self.write_line(&message)
    }
}
