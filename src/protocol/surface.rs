//! The drawing surface: world-space drawing calls in, batches out.

use std::collections::HashMap;
use std::rc::Rc;

use super::axis::AxisStyle;
use super::command::{AttrMap, Batch, CommandBuffer, PendingCommand};
use super::event::InteractionEvent;
use super::primitive::{Defaults, LayoutContext, Line, Naming, Primitive, Shape};
use super::registry::PrefixRegistry;
use super::scene::Frame;
use super::sink::{AckHandle, Delivery, RenderSink};
use crate::config::{DEFAULT_MARGIN, FlushMode, SurfaceConfig, WaitPolicy};
use crate::errors::{BroadcastError, ProtocolError, Result};
use crate::log::{debug, trace};
use crate::projection::{Bounds, Extrema, Projection};
use crate::types::Point2D;

/// Event handler. Receives the surface so it can draw in response.
pub type EventCallback<S> = Rc<dyn Fn(&mut Surface<S>, &InteractionEvent) -> Result<()>>;

/// A drawing surface bound to one renderer sink.
///
/// Holds the projection, the world extrema, the name registry and the command
/// buffer. Every drawing call validates its arguments before touching any of
/// them, so a failed call leaves the surface exactly as it was.
pub struct Surface<S> {
    sink: S,
    frame: Frame,
    projection: Projection,
    extrema: Extrema,
    registry: PrefixRegistry,
    buffer: CommandBuffer,
    mode: FlushMode,
    defaults: Defaults,
    axis_style: AxisStyle,
    element_callback: Option<EventCallback<S>>,
    default_callback: Option<EventCallback<S>>,
    callbacks: HashMap<String, EventCallback<S>>,
    local_events: bool,
    sequence: u64,
    pending: Option<u64>,
    acks: AckHandle,
    wait: WaitPolicy,
}

impl<S: RenderSink> Surface<S> {
    /// Bind `sink` to a surface with an explicit projection and frame.
    pub fn new(mut sink: S, projection: Projection, frame: Frame) -> Result<Self, ProtocolError> {
        sink.init(&frame)?;
        Ok(Surface {
            sink,
            frame,
            projection,
            extrema: Extrema::default(),
            registry: PrefixRegistry::new(),
            buffer: CommandBuffer::new(),
            mode: FlushMode::default(),
            defaults: Defaults::default(),
            axis_style: AxisStyle::default(),
            element_callback: None,
            default_callback: None,
            callbacks: HashMap::new(),
            local_events: true,
            sequence: 0,
            pending: None,
            acks: AckHandle::new(),
            wait: WaitPolicy::default(),
        })
    }

    /// Fit world `bounds` into a `width`-pixel surface.
    ///
    /// The extrema start out as the bounds, so axes and plots cover the
    /// viewport before anything is drawn.
    pub fn for_viewport(
        sink: S,
        bounds: Bounds,
        width: f64,
        height: Option<f64>,
        margin: f64,
    ) -> Result<Self> {
        let layout = Projection::for_viewport(bounds, width, height, margin)?;
        let frame = Frame::new(layout.width, layout.height);
        let mut surface = Surface::new(sink, layout.projection, frame)?;
        surface.extrema = Extrema::from_bounds(bounds);
        Ok(surface)
    }

    /// [`Surface::for_viewport`] with the default margin and derived height
    pub fn doodle(sink: S, bounds: Bounds, width: f64) -> Result<Self> {
        Self::for_viewport(sink, bounds, width, None, DEFAULT_MARGIN)
    }

    pub fn from_config(sink: S, config: &SurfaceConfig) -> Result<Self> {
        let layout =
            Projection::for_viewport(config.bounds, config.width, config.height, config.margin)?;
        let mut frame = Frame::new(layout.width, layout.height);
        frame.style = config.svg_style.clone();
        let mut surface = Surface::new(sink, layout.projection, frame)?;
        surface.extrema = Extrema::from_bounds(config.bounds);
        surface.mode = config.flush_mode;
        surface.defaults.color = config.color.clone();
        surface.defaults.style = config.element_style.clone();
        surface.local_events = config.local_events;
        surface.wait = config.wait_policy();
        Ok(surface)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn extrema(&self) -> &Extrema {
        &self.extrema
    }

    pub fn reset_extrema(&mut self) {
        self.extrema.reset();
    }

    pub fn registry(&self) -> &PrefixRegistry {
        &self.registry
    }

    /// Commands buffered since the last flush
    pub fn buffered(&self) -> &CommandBuffer {
        &self.buffer
    }

    /// Sequence number of the last flushed batch; 0 before the first flush
    pub fn batch_sequence(&self) -> u64 {
        self.sequence
    }

    pub fn flush_mode(&self) -> FlushMode {
        self.mode
    }

    /// Switching modes does not flush what is already buffered.
    pub fn set_flush_mode(&mut self, mode: FlushMode) {
        self.mode = mode;
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.defaults.color = color.into();
    }

    /// Default style of drawn elements
    pub fn set_default_style(&mut self, style: AttrMap) {
        self.defaults.style = style;
    }

    /// Default extra attributes of drawn elements
    pub fn set_default_attrs(&mut self, attrs: AttrMap) {
        self.defaults.attrs = attrs;
    }

    /// Default text rotation in device-space degrees
    pub fn set_rotate(&mut self, degrees: Option<f64>) {
        self.defaults.rotate = degrees;
    }

    /// Callback attached to every element drawn without its own
    pub fn set_element_callback(
        &mut self,
        callback: impl Fn(&mut Surface<S>, &InteractionEvent) -> Result<()> + 'static,
    ) {
        self.element_callback = Some(Rc::new(callback));
    }

    pub fn clear_element_callback(&mut self) {
        self.element_callback = None;
    }

    pub fn axis_style(&self) -> &AxisStyle {
        &self.axis_style
    }

    pub fn set_axis_style(&mut self, style: AxisStyle) {
        self.axis_style = style;
    }

    pub fn set_wait_policy(&mut self, wait: WaitPolicy) {
        self.wait = wait;
    }

    pub fn set_local_events(&mut self, local: bool) {
        self.local_events = local;
    }

    /// Style of the root `<svg>` element
    pub fn set_style(&mut self, style: AttrMap) -> Result<(), ProtocolError> {
        self.frame.style = style;
        self.sink.reframe(&self.frame)
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Draw one primitive (possibly many elements) and return the names used.
    pub fn draw(&mut self, shape: impl Into<Shape>) -> Result<Vec<String>> {
        self.place(shape.into(), None)
    }

    /// [`Surface::draw`], binding `callback` to every element drawn.
    pub fn draw_with_callback(
        &mut self,
        shape: impl Into<Shape>,
        callback: impl Fn(&mut Surface<S>, &InteractionEvent) -> Result<()> + 'static,
    ) -> Result<Vec<String>> {
        self.place(shape.into(), Some(Rc::new(callback)))
    }

    fn place(&mut self, shape: Shape, callback: Option<EventCallback<S>>) -> Result<Vec<String>> {
        let ctx = LayoutContext {
            projection: &self.projection,
            defaults: &self.defaults,
        };
        let placements = shape.layout(&ctx)?;
        for placement in &placements {
            placement.naming.validate()?;
        }

        let kind = shape.kind();
        let update = shape.updates_extrema();
        let callback = callback.or_else(|| self.element_callback.clone());
        let mut names = Vec::with_capacity(placements.len());
        for placement in placements {
            if update {
                for p in &placement.world {
                    self.extrema.update(p.x, p.y);
                }
            }
            let name = match placement.naming {
                Naming::Auto => self.registry.generate(kind.tag())?,
                Naming::Prefix(prefix) => self.registry.generate(&prefix)?,
                Naming::Exact(name) => {
                    self.registry.register(&name);
                    name
                }
            };
            match &callback {
                Some(cb) => {
                    self.callbacks.insert(name.clone(), cb.clone());
                }
                None => {
                    self.callbacks.remove(&name);
                }
            }
            trace!(name = name.as_str(), kind = kind.tag(), "add element");
            self.buffer.push(PendingCommand::AddElement {
                name: name.clone(),
                kind,
                attrs: placement.attrs,
                style: placement.style,
                text: placement.text,
            });
            names.push(name);
        }
        self.auto_flush()?;
        Ok(names)
    }

    /// Polyline through `(xs[i], ys[i])` as consecutive line segments.
    pub fn sequence(
        &mut self,
        naming: impl Into<Naming>,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<Vec<String>> {
        if xs.len() != ys.len() {
            return Err(BroadcastError::ShapeMismatch {
                index: 1,
                found: ys.len(),
                expected: xs.len(),
            }
            .into());
        }
        let n = xs.len();
        if n < 2 {
            return Ok(Vec::new());
        }
        let segments = Line::new(
            xs[..n - 1].to_vec(),
            ys[..n - 1].to_vec(),
            xs[1..].to_vec(),
            ys[1..].to_vec(),
        )
        .named(naming);
        self.draw(segments)
    }

    /// Remove every element drawn under each prefix.
    ///
    /// Unknown prefixes are skipped, or rejected up front when `strict`.
    pub fn delete(&mut self, prefixes: &[&str], strict: bool) -> Result<(), ProtocolError> {
        if strict {
            if let Some(prefix) = prefixes.iter().find(|p| !self.registry.contains_prefix(p)) {
                return Err(ProtocolError::UnknownPrefix {
                    prefix: prefix.to_string(),
                });
            }
        }
        for prefix in prefixes {
            let Some(names) = self.registry.remove_prefix(prefix) else {
                debug!(prefix = *prefix, "delete: prefix has no live names");
                continue;
            };
            for name in &names {
                self.callbacks.remove(name);
            }
            self.buffer.push(PendingCommand::DeleteNames { names });
        }
        self.auto_flush()
    }

    /// Set `attrs` on every live element under each prefix.
    pub fn change(&mut self, prefixes: &[&str], attrs: &AttrMap) -> Result<(), ProtocolError> {
        for prefix in prefixes {
            let commands: Vec<_> = self
                .registry
                .names(prefix)
                .into_iter()
                .map(|name| PendingCommand::ChangeElement {
                    name: name.to_string(),
                    attrs: attrs.clone(),
                    style: self.defaults.style.clone(),
                    text: None,
                })
                .collect();
            self.buffer.extend(commands);
        }
        self.auto_flush()
    }

    /// Clear the renderer and forget every name and element callback.
    pub fn empty(&mut self) -> Result<(), ProtocolError> {
        self.buffer.push(PendingCommand::Empty);
        self.registry.clear();
        self.callbacks.clear();
        self.auto_flush()
    }

    /// Ask the renderer to compute its bounding box, adopting it as the view when `change_view`.
    pub fn fit(&mut self, change_view: bool) -> Result<(), ProtocolError> {
        self.buffer.push(PendingCommand::Fit { change_view });
        self.auto_flush()
    }

    fn auto_flush(&mut self) -> Result<(), ProtocolError> {
        match self.mode {
            FlushMode::Immediate => self.flush(),
            FlushMode::Explicit => Ok(()),
        }
    }

    /// Hand everything buffered to the sink as one batch. No-op when empty.
    ///
    /// If the sink fails the commands stay buffered.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let sequence = self.sequence + 1;
        let batch = Batch {
            sequence,
            commands: self.buffer.take(),
        };
        match self.sink.apply_batch(&batch) {
            Ok(Delivery::Applied) => self.acks.acknowledge(sequence),
            Ok(Delivery::Sent) => self.pending = Some(sequence),
            Err(err) => {
                self.buffer.restore(batch.commands);
                return Err(err);
            }
        }
        self.sequence = sequence;
        debug!(sequence, commands = batch.commands.len(), "flushed batch");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Acknowledgements
    // ------------------------------------------------------------------

    /// Handle a host uses to acknowledge sent batches
    pub fn ack_handle(&self) -> AckHandle {
        self.acks.clone()
    }

    /// Whether a sent batch still awaits acknowledgement
    pub fn is_pending(&self) -> bool {
        self.pending
            .is_some_and(|sequence| self.acks.acknowledged() < sequence)
    }

    /// Poll for acknowledgement of the last sent batch.
    ///
    /// Sleeps and calls `hook` up to the wait policy's iteration count; the
    /// hook is where a host pumps its event loop. Returns whether the batch
    /// was acknowledged. The pending flag is cleared either way; with
    /// `strict` a timeout is an error.
    pub fn await_pending(&mut self, strict: bool, mut hook: impl FnMut()) -> Result<bool, ProtocolError> {
        let mut polls = 0;
        while self.is_pending() && polls < self.wait.iterations {
            std::thread::sleep(self.wait.sleep);
            hook();
            polls += 1;
        }
        let acknowledged = !self.is_pending();
        let sequence = self.pending.take();
        match sequence {
            Some(sequence) if !acknowledged && strict => Err(ProtocolError::AcknowledgementTimeout {
                sequence,
                iterations: self.wait.iterations,
            }),
            _ => Ok(acknowledged),
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Watch `kinds` on the renderer and route them to `callback` by default.
    pub fn enable_events(
        &mut self,
        kinds: &[&str],
        callback: impl Fn(&mut Surface<S>, &InteractionEvent) -> Result<()> + 'static,
    ) -> Result<(), ProtocolError> {
        if !self.sink.supports_events() {
            return Err(ProtocolError::UnsupportedOperation {
                operation: "enable_events",
            });
        }
        let kinds: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
        self.sink.watch_events(&kinds)?;
        self.default_callback = Some(Rc::new(callback));
        Ok(())
    }

    /// Callback for events no element-level callback handles
    pub fn set_event_callback(
        &mut self,
        callback: impl Fn(&mut Surface<S>, &InteractionEvent) -> Result<()> + 'static,
    ) -> Result<(), ProtocolError> {
        if !self.sink.supports_events() {
            return Err(ProtocolError::UnsupportedOperation {
                operation: "set_event_callback",
            });
        }
        self.default_callback = Some(Rc::new(callback));
        Ok(())
    }

    /// Run the callback for `event`. Returns whether one ran.
    ///
    /// With local events on, an element's own callback wins over the default.
    pub fn dispatch_event(&mut self, event: &InteractionEvent) -> Result<bool> {
        let mut callback = self.default_callback.clone();
        if self.local_events {
            if let Some(local) = self.callbacks.get(&event.name) {
                callback = Some(local.clone());
            }
        }
        let Some(callback) = callback else {
            debug!(name = event.name.as_str(), kind = event.kind.as_str(), "event dropped: no callback");
            return Ok(false);
        };
        callback(self, event)?;
        Ok(true)
    }

    /// The event's pointer position in world coordinates
    pub fn event_world_point(&self, event: &InteractionEvent) -> Option<Point2D> {
        let (dx, dy) = event.device_point()?;
        Some(self.projection.unproject(dx, dy).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::primitive::{Circle, Text};
    use crate::protocol::sink::{JsonSink, RecordingSink};
    use std::cell::Cell;
    use std::time::Duration;

    fn surface() -> Surface<RecordingSink> {
        let projection = Projection::try_new(10.0, -10.0, 100.0, 100.0).unwrap();
        Surface::new(RecordingSink::new(), projection, Frame::new(200.0, 200.0)).unwrap()
    }

    #[test]
    fn sink_is_initialized_once() {
        let s = surface();
        assert_eq!(s.sink().init_count, 1);
        assert_eq!(s.sink().scene.frame().width, 200.0);
    }

    #[test]
    fn immediate_mode_flushes_each_call() {
        let mut s = surface();
        s.draw(Circle::new(0.0, 0.0, 1.0)).unwrap();
        s.draw(Circle::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(s.sink().batches.len(), 2);
        assert_eq!(s.batch_sequence(), 2);
        assert_eq!(s.sink().batches[1].sequence, 2);
    }

    #[test]
    fn failed_call_leaves_state_untouched() {
        let mut s = surface();
        s.set_flush_mode(FlushMode::Explicit);
        let before = *s.extrema();
        let err = s
            .draw(Circle::new([0.0, 1.0], [0.0, 1.0, 2.0], 1.0).named("dots"))
            .unwrap_err();
        assert!(matches!(err, crate::DoodleError::Broadcast(_)));
        assert_eq!(*s.extrema(), before);
        assert!(s.buffered().is_empty());
        assert!(s.registry().is_empty());

        let err = s
            .draw(Circle::new(0.0, 0.0, 1.0).named(Naming::Prefix("a*b".into())))
            .unwrap_err();
        assert!(matches!(err, crate::DoodleError::Protocol(ProtocolError::InvalidPrefix { .. })));
        assert!(s.buffered().is_empty());
    }

    #[test]
    fn extrema_follow_update_flag() {
        let mut s = surface();
        s.draw(Text::new(50.0, 50.0, "far")).unwrap();
        assert!(s.extrema().is_empty());
        s.draw(Circle::new([1.0, -2.0], [3.0, 4.0], 0.5)).unwrap();
        assert_eq!(s.extrema().x_range(), Some((-2.0, 1.0)));
        s.draw(Circle::new(9.0, 9.0, 0.5).update(false)).unwrap();
        assert_eq!(s.extrema().y_range(), Some((3.0, 4.0)));
        s.reset_extrema();
        assert!(s.extrema().is_empty());
    }

    #[test]
    fn auto_names_use_the_tag() {
        let mut s = surface();
        let names = s.draw(Circle::new([0.0, 1.0], 0.0, 1.0)).unwrap();
        assert_eq!(names, ["circle*1", "circle*2"]);
        let names = s.draw(Text::new(0.0, 0.0, "x").named("label*9")).unwrap();
        assert_eq!(names, ["label*9"]);
    }

    #[test]
    fn explicit_mode_sends_one_batch() {
        let mut s = surface();
        s.set_flush_mode(FlushMode::Explicit);
        s.flush().unwrap();
        assert!(s.sink().batches.is_empty());
        s.draw(Circle::new(0.0, 0.0, 1.0)).unwrap();
        s.draw(Text::new(0.0, 0.0, "t")).unwrap();
        s.fit(false).unwrap();
        assert!(s.sink().batches.is_empty());
        s.flush().unwrap();
        assert_eq!(s.sink().batches.len(), 1);
        let labels: Vec<_> = s.sink().batches[0]
            .commands
            .iter()
            .map(PendingCommand::label)
            .collect();
        assert_eq!(labels, ["add_element", "add_element", "fit"]);
    }

    #[test]
    fn strict_delete_checks_every_prefix_first() {
        let mut s = surface();
        s.set_flush_mode(FlushMode::Explicit);
        s.draw(Circle::new(0.0, 0.0, 1.0).named("a")).unwrap();
        let err = s.delete(&["a", "nope"], true).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPrefix { prefix } if prefix == "nope"));
        assert!(s.registry().contains_prefix("a"));
        assert_eq!(s.buffered().len(), 1);
        s.delete(&["a", "nope"], false).unwrap();
        assert!(!s.registry().contains_prefix("a"));
    }

    #[test]
    fn change_carries_the_default_style() {
        let mut s = surface();
        s.draw(Circle::new(0.0, 0.0, 1.0).named("a")).unwrap();
        let mut style = AttrMap::new();
        style.insert("opacity".into(), "0.5".into());
        s.set_default_style(style.clone());
        let mut attrs = AttrMap::new();
        attrs.insert("fill".into(), "red".into());
        s.change(&["a"], &attrs).unwrap();

        let batch = &s.sink().batches[1];
        assert!(matches!(
            &batch.commands[0],
            PendingCommand::ChangeElement { style: sent, .. } if *sent == style
        ));
        let a = s.sink().scene.get("a*1").unwrap();
        assert_eq!(a.style["opacity"], "0.5");
        assert_eq!(a.attrs["fill"], "red");
    }

    #[test]
    fn json_sink_batches_stay_pending_until_acknowledged() {
        let projection = Projection::IDENTITY;
        let mut s = Surface::new(JsonSink::new(Vec::new()), projection, Frame::new(10.0, 10.0)).unwrap();
        s.set_wait_policy(WaitPolicy {
            iterations: 3,
            sleep: Duration::ZERO,
        });
        assert!(s.await_pending(true, || {}).unwrap());

        s.draw(Circle::new(1.0, 1.0, 1.0)).unwrap();
        assert!(s.is_pending());
        let ack = s.ack_handle();
        let polls = Cell::new(0);
        let acknowledged = s
            .await_pending(true, || {
                polls.set(polls.get() + 1);
                if polls.get() == 2 {
                    ack.acknowledge(1);
                }
            })
            .unwrap();
        assert!(acknowledged);
        assert_eq!(polls.get(), 2);
        assert!(!s.is_pending());
    }

    #[test]
    fn ack_timeout() {
        let mut s = Surface::new(
            JsonSink::new(Vec::new()),
            Projection::IDENTITY,
            Frame::new(10.0, 10.0),
        )
        .unwrap();
        s.set_wait_policy(WaitPolicy {
            iterations: 4,
            sleep: Duration::ZERO,
        });
        s.draw(Circle::new(1.0, 1.0, 1.0)).unwrap();
        let err = s.await_pending(true, || {}).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::AcknowledgementTimeout {
                sequence: 1,
                iterations: 4
            }
        ));
        // the flag is cleared even though nothing was acknowledged
        assert!(!s.is_pending());

        s.draw(Circle::new(1.0, 1.0, 1.0)).unwrap();
        assert!(!s.await_pending(false, || {}).unwrap());
        assert!(!s.is_pending());
    }

    #[test]
    fn world_point_of_event() {
        let s = surface();
        let event = InteractionEvent::new("", "click").at(120.0, 70.0);
        assert_eq!(s.event_world_point(&event), Some(Point2D::new(2.0, 3.0)));
        assert_eq!(s.event_world_point(&InteractionEvent::new("", "key")), None);
    }
}
