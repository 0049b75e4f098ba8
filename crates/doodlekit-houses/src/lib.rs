//! Where can the house be?
//!
//! The house is `a` times as far from Kim as from Bob, and `b` times as far
//! from Jack as from Janet. Each condition is a circle of Apollonius; the
//! candidate locations are where the two circles meet. Anchors can be
//! dragged: click one, move the pointer, click again to drop it.

use std::cell::RefCell;
use std::rc::Rc;

use doodlekit::{
    AnchorPair, ApolloniusCircle, Bounds, Circle, FlushMode, InteractionEvent, Line, Point2D,
    ProtocolError, RenderSink, Result, SolverError, Surface, Text,
    intersect_two_apollonius_circles,
};
use tracing::{debug, info};

/// World region shown by the demo
pub const VIEWPORT: Bounds = Bounds::new(-3.0, -6.0, 6.0, 2.0);
/// Device width in pixels
pub const WIDTH: f64 = 700.0;

const DOT_RADIUS: f64 = 0.1;
const LABEL_OFFSET: f64 = 0.1;
const LABEL_ROTATION: f64 = -55.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Kim,
    Bob,
    Jack,
    Janet,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [Anchor::Kim, Anchor::Bob, Anchor::Jack, Anchor::Janet];

    /// Name prefix of the anchor's dot
    pub fn prefix(self) -> &'static str {
        match self {
            Anchor::Kim => "K",
            Anchor::Bob => "B",
            Anchor::Jack => "J",
            Anchor::Janet => "N",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Anchor::Kim => "Kim",
            Anchor::Bob => "Bob",
            Anchor::Jack => "Jack",
            Anchor::Janet => "Janet",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Anchor> {
        Anchor::ALL.into_iter().find(|a| a.prefix() == prefix)
    }
}

/// Puzzle state: four anchors, two ratios, and the anchor being dragged.
#[derive(Clone, Debug, PartialEq)]
pub struct Houses {
    pub kim: Point2D,
    pub bob: Point2D,
    pub jack: Point2D,
    pub janet: Point2D,
    /// Distance to Kim over distance to Bob
    pub kim_bob: f64,
    /// Distance to Jack over distance to Janet
    pub jack_janet: f64,
    moving: Option<Anchor>,
}

impl Default for Houses {
    fn default() -> Self {
        Houses {
            kim: Point2D::new(4.0, 0.0),
            bob: Point2D::new(0.0, 0.0),
            jack: Point2D::new(-2.0, -4.0),
            janet: Point2D::new(-2.0, -1.0),
            kim_bob: 3.0,
            jack_janet: 4.0,
            moving: None,
        }
    }
}

/// A surface over [`VIEWPORT`] that only flushes when the puzzle redraws.
pub fn new_surface<S: RenderSink>(sink: S) -> Result<Surface<S>> {
    let mut surface = Surface::doodle(sink, VIEWPORT, WIDTH)?;
    surface.set_flush_mode(FlushMode::Explicit);
    Ok(surface)
}

/// Route clicks and pointer moves on `surface` to the shared puzzle.
pub fn install<S: RenderSink + 'static>(
    surface: &mut Surface<S>,
    houses: Rc<RefCell<Houses>>,
) -> Result<(), ProtocolError> {
    surface.enable_events(&["click", "mousemove"], move |surface, event| {
        houses.borrow_mut().handle_event(surface, event)
    })
}

impl Houses {
    pub fn anchor(&self, anchor: Anchor) -> Point2D {
        match anchor {
            Anchor::Kim => self.kim,
            Anchor::Bob => self.bob,
            Anchor::Jack => self.jack,
            Anchor::Janet => self.janet,
        }
    }

    pub fn set_anchor(&mut self, anchor: Anchor, at: Point2D) {
        let slot = match anchor {
            Anchor::Kim => &mut self.kim,
            Anchor::Bob => &mut self.bob,
            Anchor::Jack => &mut self.jack,
            Anchor::Janet => &mut self.janet,
        };
        *slot = at;
    }

    /// The anchor currently following the pointer
    pub fn moving(&self) -> Option<Anchor> {
        self.moving
    }

    pub fn kim_bob_pair(&self) -> AnchorPair {
        AnchorPair::new(self.kim, self.bob, self.kim_bob)
    }

    pub fn jack_janet_pair(&self) -> AnchorPair {
        AnchorPair::new(self.jack, self.janet, self.jack_janet)
    }

    /// Candidate house locations: zero or two points
    pub fn locations(&self) -> Result<Vec<Point2D>, SolverError> {
        intersect_two_apollonius_circles(&self.kim_bob_pair(), &self.jack_janet_pair())
    }

    /// Change both ratios and redraw.
    pub fn set_ratios<S: RenderSink>(
        &mut self,
        surface: &mut Surface<S>,
        kim_bob: f64,
        jack_janet: f64,
    ) -> Result<()> {
        self.kim_bob = kim_bob;
        self.jack_janet = jack_janet;
        self.redraw(surface)
    }

    /// Replace the whole drawing and flush it as one batch.
    ///
    /// All geometry is solved first; if the anchors or ratios admit no
    /// circles the surface is left alone.
    pub fn redraw<S: RenderSink>(&self, surface: &mut Surface<S>) -> Result<()> {
        let kim_bob = self.kim_bob_pair().circle()?;
        let jack_janet = self.jack_janet_pair().circle()?;
        let locations = self.locations()?;

        surface.empty()?;
        surface.set_color("black");
        surface.set_rotate(None);
        surface.axes(-2.5, -5.5)?;
        surface.set_rotate(Some(LABEL_ROTATION));

        draw_disc(surface, &kim_bob, "KB")?;
        draw_disc(surface, &jack_janet, "JN")?;

        surface.set_color("blue");
        for location in &locations {
            surface.draw(Circle::new(location.x, location.y, DOT_RADIUS).named("location"))?;
            let anchors = Anchor::ALL.map(|a| self.anchor(a));
            surface.draw(
                Line::new(
                    location.x,
                    location.y,
                    anchors.map(|p| p.x),
                    anchors.map(|p| p.y),
                )
                .named("location"),
            )?;
        }

        surface.set_color("red");
        for anchor in Anchor::ALL {
            let at = self.anchor(anchor);
            surface.draw(Circle::new(at.x, at.y, DOT_RADIUS).named(anchor.prefix()))?;
            let label = at + Point2D::new(LABEL_OFFSET, -LABEL_OFFSET);
            surface.draw(Text::new(label.x, label.y, anchor.label()).named(anchor.label()))?;
        }

        surface.flush()?;
        debug!(locations = locations.len(), "redrawn");
        Ok(())
    }

    /// Drag handling: a click on an anchor picks it up, pointer moves carry
    /// it, the next click drops it.
    pub fn handle_event<S: RenderSink>(
        &mut self,
        surface: &mut Surface<S>,
        event: &InteractionEvent,
    ) -> Result<()> {
        if let Some(anchor) = self.moving {
            if let Some(at) = surface.event_world_point(event) {
                self.set_anchor(anchor, at);
                self.redraw(surface)?;
            }
        }
        if event.kind != "click" {
            return Ok(());
        }
        match self.moving.take() {
            Some(anchor) => {
                info!(anchor = anchor.label(), "dropped");
                self.redraw(surface)?;
            }
            None => {
                self.moving = Anchor::from_prefix(event.prefix());
                if let Some(anchor) = self.moving {
                    info!(anchor = anchor.label(), "picked up");
                }
            }
        }
        Ok(())
    }
}

fn draw_disc<S: RenderSink>(
    surface: &mut Surface<S>,
    circle: &ApolloniusCircle,
    name: &str,
) -> Result<()> {
    surface.draw(
        Circle::new(circle.center.x, circle.center.y, circle.radius)
            .named(name)
            .color("green")
            .attr("fill-opacity", "0.4"),
    )?;
    Ok(())
}
