use kurbo::{Affine, Rect, Size};

use crate::bitmap::Bitmap;
use crate::error::{SnapError, SnapResult};
use crate::session::Session;

/// Default canvas for drawing tests.
pub const DEFAULT_CANVAS_SIZE: Size = Size::new(512.0, 256.0);

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Live offscreen drawing surface a test body renders into.
///
/// Wraps a `vello_cpu::RenderContext` together with the logical drawing
/// bounds and a tracked current transform. `vello_cpu` only has a
/// replace-style `set_transform`, so CTM-style stacking goes through
/// [`Surface::concat_transform`].
pub struct Surface {
    ctx: vello_cpu::RenderContext,
    bounds: Rect,
    transform: Affine,
}

impl Surface {
    fn new(width: u16, height: u16) -> Self {
        let ctx = vello_cpu::RenderContext::new(width, height);
        let bounds = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
        Self {
            ctx,
            bounds,
            transform: Affine::IDENTITY,
        }
    }

    /// Raw render context, for test bodies that drive `vello_cpu` directly.
    pub fn ctx(&mut self) -> &mut vello_cpu::RenderContext {
        &mut self.ctx
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(f64::from(self.ctx.width()), f64::from(self.ctx.height()))
    }

    /// Logical rectangle the test is expected to draw within.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Replace the drawing bounds. Bounds must stay within the canvas.
    pub fn set_bounds(&mut self, bounds: Rect) -> SnapResult<()> {
        let canvas = Rect::from_origin_size((0.0, 0.0), self.canvas_size());
        if bounds.union(canvas) != canvas {
            return Err(SnapError::setup(format!(
                "drawing bounds {bounds:?} exceed canvas {canvas:?}"
            )));
        }
        self.bounds = bounds;
        Ok(())
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Append `t` to the current transform (applied before what is already
    /// there, like concatenating a CTM) and push the result to the context.
    pub fn concat_transform(&mut self, t: Affine) {
        self.transform *= t;
        self.ctx.set_transform(affine_to_cpu(self.transform));
    }

    /// Set the current paint from straight (non-premultiplied) RGBA8.
    pub fn set_paint_rgba8(&mut self, rgba: [u8; 4]) {
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
    }

    /// Fill `rect` (in current-transform space) with the current paint.
    pub fn fill_rect(&mut self, rect: Rect) {
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }
}

/// One step of fixture setup, contributing a canvas-size adjustment and a
/// context/bounds transform.
///
/// Transforms compose by explicit ordering: `CanvasFixture::set_up` folds
/// `canvas_size` over the default size in list order, then applies each
/// `apply` in the same order on the freshly allocated surface.
pub trait SetupTransform {
    /// Adjust the canvas size inherited from the previous stage.
    fn canvas_size(&self, parent: Size) -> Size {
        parent
    }

    /// Prime the surface before the test body runs.
    fn apply(&self, surface: &mut Surface) -> SnapResult<()> {
        let _ = surface;
        Ok(())
    }
}

/// Fills the full bounds with a solid background and leaves a contrasting
/// ink color set as the surface paint.
///
/// Isolates drawing-command correctness from background-color assumptions:
/// a test that strokes nothing still produces a deterministic background.
pub struct BackgroundPrime {
    pub background: [u8; 4],
    pub ink: [u8; 4],
}

impl Default for BackgroundPrime {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            ink: [0, 0, 0, 255],
        }
    }
}

impl SetupTransform for BackgroundPrime {
    fn apply(&self, surface: &mut Surface) -> SnapResult<()> {
        let bounds = surface.bounds();
        surface.set_paint_rgba8(self.background);
        surface.fill_rect(bounds);
        surface.set_paint_rgba8(self.ink);
        Ok(())
    }
}

/// Reproduces a top-left-origin, unit-scaled host coordinate convention on a
/// bottom-left-origin, pixel-scaled surface.
///
/// Doubles the inherited canvas, applies a vertical flip plus a 2x scale,
/// and halves the reported drawing bounds: a 512x256 parent becomes a
/// 1024x512 canvas whose logical bounds are 512x256 at the origin.
pub struct DeviceMimic;

impl SetupTransform for DeviceMimic {
    fn canvas_size(&self, parent: Size) -> Size {
        Size::new(parent.width * 2.0, parent.height * 2.0)
    }

    fn apply(&self, surface: &mut Surface) -> SnapResult<()> {
        let bounds = surface.bounds();

        surface.concat_transform(Affine::scale_non_uniform(1.0, -1.0));
        surface.concat_transform(Affine::translate((0.0, -bounds.height())));
        surface.concat_transform(Affine::scale(2.0));

        let halved = Rect::new(
            bounds.x0 * 0.5,
            bounds.y0 * 0.5,
            bounds.x1 * 0.5,
            bounds.y1 * 0.5,
        );
        surface.set_bounds(halved)
    }
}

/// Canvas fixture: the unit a drawing test runs against.
///
/// `set_up` allocates the surface and runs the setup transforms; the test
/// body draws through [`CanvasFixture::surface`]; teardown goes through
/// [`crate::harness::run_teardown`], which captures and compares.
pub struct CanvasFixture {
    surface: Surface,
}

impl CanvasFixture {
    /// Allocate a surface sized by `transforms` (over the 512x256 default)
    /// and apply each transform in order.
    pub fn set_up(transforms: Vec<Box<dyn SetupTransform>>) -> SnapResult<Self> {
        let size = transforms
            .iter()
            .fold(DEFAULT_CANVAS_SIZE, |acc, t| t.canvas_size(acc));

        let (width, height) = surface_dims(size)?;
        let mut surface = Surface::new(width, height);
        for t in &transforms {
            t.apply(&mut surface)?;
        }
        Ok(Self { surface })
    }

    /// Plain fixture with no setup transforms.
    pub fn plain() -> SnapResult<Self> {
        Self::set_up(Vec::new())
    }

    pub fn surface(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn canvas_size(&self) -> Size {
        self.surface.canvas_size()
    }

    pub fn bounds(&self) -> Rect {
        self.surface.bounds()
    }

    /// Extract an immutable bitmap snapshot of the surface.
    ///
    /// The capture target pixmap is borrowed from the session pool and
    /// returned to it once the pixels are copied out.
    pub fn capture(&mut self, session: &mut Session) -> SnapResult<Bitmap> {
        let ctx = &mut self.surface.ctx;
        let width = ctx.width();
        let height = ctx.height();

        ctx.flush();
        let mut pixmap = session.pool.borrow(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        let bitmap = Bitmap::from_pixmap(&pixmap);
        session.pool.release(pixmap);
        bitmap
    }
}

fn surface_dims(size: Size) -> SnapResult<(u16, u16)> {
    let to_u16 = |v: f64, axis: &str| -> SnapResult<u16> {
        let px = v.round();
        if px < 1.0 || px > f64::from(u16::MAX) {
            return Err(SnapError::setup(format!(
                "canvas {axis} {v} is outside the supported surface range"
            )));
        }
        Ok(px as u16)
    };
    Ok((to_u16(size.width, "width")?, to_u16(size.height, "height")?))
}
