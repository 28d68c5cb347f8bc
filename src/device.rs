//! Polymorphic drawing sink driven by the content-stream interpreter
//! (`interpreter.rs`). The core crate ships two reference implementors,
//! `ListDevice` and `BboxDevice`; a raster device is out of scope (image
//! codec territory).

/// 2D affine transform `[a b c d e f]`, applied as `x' = a*x + c*y + e`,
/// `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const fn identity() -> Matrix {
        Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Matrix {
        Matrix { a, b, c, d, e, f }
    }

    /// `self` premultiplied on the left of `other`, i.e. the result of
    /// applying `self` then `other` (matches `cm`'s "concat" semantics:
    /// the new matrix goes on the left of the CTM).
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }
}

/// One segment of a subpath. `MoveTo` always starts a new subpath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    Close,
}

/// A path as the interpreter builds it: a flat sequence of segments where
/// each `MoveTo` begins a new subpath, matching how `m`/`l`/`c`/`h` are
/// emitted in a content stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Path {
        Path::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Axis-aligned bounding box of every point the path touches (control
    /// points included, which overestimates curved segments but is cheap
    /// and conservative).
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut rect: Option<Rect> = None;
        let mut extend = |p: Point| {
            rect = Some(match rect {
                None => Rect::new(p.x, p.y, p.x, p.y),
                Some(r) => r.union_point(p),
            });
        };
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => extend(p),
                PathSegment::CurveTo(c1, c2, p) => {
                    extend(c1);
                    extend(c2);
                    extend(p);
                }
                PathSegment::Close => {}
            }
        }
        rect
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn union_point(&self, p: Point) -> Rect {
        Rect {
            x0: self.x0.min(p.x),
            y0: self.y0.min(p.y),
            x1: self.x1.max(p.x),
            y1: self.y1.max(p.y),
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Transform the four corners by `ctm` and return their bounding box.
    pub fn transform(&self, ctm: &Matrix) -> Rect {
        let corners = [
            ctm.apply(self.x0, self.y0),
            ctm.apply(self.x1, self.y0),
            ctm.apply(self.x0, self.y1),
            ctm.apply(self.x1, self.y1),
        ];
        let (x0, y0) = corners[0];
        let mut rect = Rect::new(x0, y0, x0, y0);
        for &(x, y) in &corners[1..] {
            rect = rect.union_point(Point::new(x, y));
        }
        rect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeState {
    pub line_width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash_pattern: Vec<f32>,
    pub dash_phase: f32,
}

impl Default for StrokeState {
    fn default() -> Self {
        StrokeState {
            line_width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash_pattern: Vec::new(),
            dash_phase: 0.0,
        }
    }
}

/// A resolved, device-independent color space. Named ICC/Indexed/Separation
/// spaces that aren't one of the three device spaces or a pattern are kept
/// by name only; resolving them further is out of scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    Pattern(Vec<u8>),
    Named(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Darken,
    Lighten,
}

/// One positioned glyph, already advanced by the text matrix the
/// interpreter maintains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub trm: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: Vec<u8>,
    pub font_size: f32,
    pub glyphs: Vec<Glyph>,
}

/// A decoded raster image or image mask, as extracted from an image
/// XObject or an inline image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub is_mask: bool,
    pub samples: Vec<u8>,
}

/// The sink every drawing operator the interpreter executes is issued
/// against. Method list matches the content-stream interpreter's drawing
/// vocabulary one-to-one; arguments are borrowed for the call's duration
/// only, implementors that need to retain them must clone.
pub trait Device {
    fn fill_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32);
    fn stroke_path(&mut self, path: &Path, stroke_state: &StrokeState, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32);
    fn clip_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix, scissor: Option<Rect>);
    fn clip_stroke_path(&mut self, path: &Path, stroke_state: &StrokeState, ctm: &Matrix, scissor: Option<Rect>);
    fn fill_text(&mut self, text: &TextRun, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32);
    fn stroke_text(&mut self, text: &TextRun, stroke_state: &StrokeState, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32);
    fn clip_text(&mut self, text: &TextRun, ctm: &Matrix, accumulate: bool);
    fn clip_stroke_text(&mut self, text: &TextRun, stroke_state: &StrokeState, ctm: &Matrix);
    fn ignore_text(&mut self, text: &TextRun, ctm: &Matrix);
    fn fill_shade(&mut self, shade: &[u8], ctm: &Matrix, alpha: f32);
    fn fill_image(&mut self, image: &Image, ctm: &Matrix, alpha: f32);
    fn fill_image_mask(&mut self, image: &Image, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32);
    fn clip_image_mask(&mut self, image: &Image, ctm: &Matrix);
    fn pop_clip(&mut self);
    fn begin_mask(&mut self, bbox: Rect, luminosity: bool, colorspace: &ColorSpace, color: &[f32]);
    fn end_mask(&mut self);
    fn begin_group(&mut self, bbox: Rect, isolated: bool, knockout: bool, blend_mode: BlendMode, alpha: f32);
    fn end_group(&mut self);
    fn begin_tile(&mut self, area: Rect, view: Rect, xstep: f32, ystep: f32, ctm: &Matrix, id: i32) -> i32;
    fn end_tile(&mut self);
    fn begin_page(&mut self, mediabox: Rect, ctm: &Matrix);
    fn end_page(&mut self);
}

/// Every call a `Device` can receive, recorded verbatim by `ListDevice`.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayListItem {
    FillPath { path: Path, even_odd: bool, ctm: Matrix, colorspace: ColorSpace, color: Vec<f32>, alpha: f32 },
    StrokePath { path: Path, stroke_state: StrokeState, ctm: Matrix, colorspace: ColorSpace, color: Vec<f32>, alpha: f32 },
    ClipPath { path: Path, even_odd: bool, ctm: Matrix, scissor: Option<Rect> },
    ClipStrokePath { path: Path, stroke_state: StrokeState, ctm: Matrix, scissor: Option<Rect> },
    FillText { text: TextRun, ctm: Matrix, colorspace: ColorSpace, color: Vec<f32>, alpha: f32 },
    StrokeText { text: TextRun, stroke_state: StrokeState, ctm: Matrix, colorspace: ColorSpace, color: Vec<f32>, alpha: f32 },
    ClipText { text: TextRun, ctm: Matrix, accumulate: bool },
    ClipStrokeText { text: TextRun, stroke_state: StrokeState, ctm: Matrix },
    IgnoreText { text: TextRun, ctm: Matrix },
    FillShade { shade: Vec<u8>, ctm: Matrix, alpha: f32 },
    FillImage { image: Image, ctm: Matrix, alpha: f32 },
    FillImageMask { image: Image, ctm: Matrix, colorspace: ColorSpace, color: Vec<f32>, alpha: f32 },
    ClipImageMask { image: Image, ctm: Matrix },
    PopClip,
    BeginMask { bbox: Rect, luminosity: bool, colorspace: ColorSpace, color: Vec<f32> },
    EndMask,
    BeginGroup { bbox: Rect, isolated: bool, knockout: bool, blend_mode: BlendMode, alpha: f32 },
    EndGroup,
    BeginTile { area: Rect, view: Rect, xstep: f32, ystep: f32, ctm: Matrix, id: i32 },
    EndTile,
    BeginPage { mediabox: Rect, ctm: Matrix },
    EndPage,
}

/// Records every call as a display-list node. Replaying the list against a
/// different device must reproduce the same sequence of calls exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDevice {
    pub items: Vec<DisplayListItem>,
    next_tile_id: i32,
}

impl ListDevice {
    pub fn new() -> ListDevice {
        ListDevice::default()
    }

    /// Issue every recorded call against `device`, in order.
    pub fn replay<D: Device>(&self, device: &mut D) {
        for item in &self.items {
            match item.clone() {
                DisplayListItem::FillPath { path, even_odd, ctm, colorspace, color, alpha } => {
                    device.fill_path(&path, even_odd, &ctm, &colorspace, &color, alpha)
                }
                DisplayListItem::StrokePath { path, stroke_state, ctm, colorspace, color, alpha } => {
                    device.stroke_path(&path, &stroke_state, &ctm, &colorspace, &color, alpha)
                }
                DisplayListItem::ClipPath { path, even_odd, ctm, scissor } => device.clip_path(&path, even_odd, &ctm, scissor),
                DisplayListItem::ClipStrokePath { path, stroke_state, ctm, scissor } => {
                    device.clip_stroke_path(&path, &stroke_state, &ctm, scissor)
                }
                DisplayListItem::FillText { text, ctm, colorspace, color, alpha } => {
                    device.fill_text(&text, &ctm, &colorspace, &color, alpha)
                }
                DisplayListItem::StrokeText { text, stroke_state, ctm, colorspace, color, alpha } => {
                    device.stroke_text(&text, &stroke_state, &ctm, &colorspace, &color, alpha)
                }
                DisplayListItem::ClipText { text, ctm, accumulate } => device.clip_text(&text, &ctm, accumulate),
                DisplayListItem::ClipStrokeText { text, stroke_state, ctm } => device.clip_stroke_text(&text, &stroke_state, &ctm),
                DisplayListItem::IgnoreText { text, ctm } => device.ignore_text(&text, &ctm),
                DisplayListItem::FillShade { shade, ctm, alpha } => device.fill_shade(&shade, &ctm, alpha),
                DisplayListItem::FillImage { image, ctm, alpha } => device.fill_image(&image, &ctm, alpha),
                DisplayListItem::FillImageMask { image, ctm, colorspace, color, alpha } => {
                    device.fill_image_mask(&image, &ctm, &colorspace, &color, alpha)
                }
                DisplayListItem::ClipImageMask { image, ctm } => device.clip_image_mask(&image, &ctm),
                DisplayListItem::PopClip => device.pop_clip(),
                DisplayListItem::BeginMask { bbox, luminosity, colorspace, color } => {
                    device.begin_mask(bbox, luminosity, &colorspace, &color)
                }
                DisplayListItem::EndMask => device.end_mask(),
                DisplayListItem::BeginGroup { bbox, isolated, knockout, blend_mode, alpha } => {
                    device.begin_group(bbox, isolated, knockout, blend_mode, alpha)
                }
                DisplayListItem::EndGroup => device.end_group(),
                DisplayListItem::BeginTile { area, view, xstep, ystep, ctm, id } => {
                    device.begin_tile(area, view, xstep, ystep, &ctm, id);
                }
                DisplayListItem::EndTile => device.end_tile(),
                DisplayListItem::BeginPage { mediabox, ctm } => device.begin_page(mediabox, &ctm),
                DisplayListItem::EndPage => device.end_page(),
            }
        }
    }
}

impl Device for ListDevice {
    fn fill_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32) {
        self.items.push(DisplayListItem::FillPath {
            path: path.clone(),
            even_odd,
            ctm: *ctm,
            colorspace: colorspace.clone(),
            color: color.to_vec(),
            alpha,
        });
    }

    fn stroke_path(
        &mut self, path: &Path, stroke_state: &StrokeState, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32,
    ) {
        self.items.push(DisplayListItem::StrokePath {
            path: path.clone(),
            stroke_state: stroke_state.clone(),
            ctm: *ctm,
            colorspace: colorspace.clone(),
            color: color.to_vec(),
            alpha,
        });
    }

    fn clip_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix, scissor: Option<Rect>) {
        self.items.push(DisplayListItem::ClipPath {
            path: path.clone(),
            even_odd,
            ctm: *ctm,
            scissor,
        });
    }

    fn clip_stroke_path(&mut self, path: &Path, stroke_state: &StrokeState, ctm: &Matrix, scissor: Option<Rect>) {
        self.items.push(DisplayListItem::ClipStrokePath {
            path: path.clone(),
            stroke_state: stroke_state.clone(),
            ctm: *ctm,
            scissor,
        });
    }

    fn fill_text(&mut self, text: &TextRun, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32) {
        self.items.push(DisplayListItem::FillText {
            text: text.clone(),
            ctm: *ctm,
            colorspace: colorspace.clone(),
            color: color.to_vec(),
            alpha,
        });
    }

    fn stroke_text(
        &mut self, text: &TextRun, stroke_state: &StrokeState, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32,
    ) {
        self.items.push(DisplayListItem::StrokeText {
            text: text.clone(),
            stroke_state: stroke_state.clone(),
            ctm: *ctm,
            colorspace: colorspace.clone(),
            color: color.to_vec(),
            alpha,
        });
    }

    fn clip_text(&mut self, text: &TextRun, ctm: &Matrix, accumulate: bool) {
        self.items.push(DisplayListItem::ClipText {
            text: text.clone(),
            ctm: *ctm,
            accumulate,
        });
    }

    fn clip_stroke_text(&mut self, text: &TextRun, stroke_state: &StrokeState, ctm: &Matrix) {
        self.items.push(DisplayListItem::ClipStrokeText {
            text: text.clone(),
            stroke_state: stroke_state.clone(),
            ctm: *ctm,
        });
    }

    fn ignore_text(&mut self, text: &TextRun, ctm: &Matrix) {
        self.items.push(DisplayListItem::IgnoreText { text: text.clone(), ctm: *ctm });
    }

    fn fill_shade(&mut self, shade: &[u8], ctm: &Matrix, alpha: f32) {
        self.items.push(DisplayListItem::FillShade {
            shade: shade.to_vec(),
            ctm: *ctm,
            alpha,
        });
    }

    fn fill_image(&mut self, image: &Image, ctm: &Matrix, alpha: f32) {
        self.items.push(DisplayListItem::FillImage {
            image: image.clone(),
            ctm: *ctm,
            alpha,
        });
    }

    fn fill_image_mask(&mut self, image: &Image, ctm: &Matrix, colorspace: &ColorSpace, color: &[f32], alpha: f32) {
        self.items.push(DisplayListItem::FillImageMask {
            image: image.clone(),
            ctm: *ctm,
            colorspace: colorspace.clone(),
            color: color.to_vec(),
            alpha,
        });
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: &Matrix) {
        self.items.push(DisplayListItem::ClipImageMask { image: image.clone(), ctm: *ctm });
    }

    fn pop_clip(&mut self) {
        self.items.push(DisplayListItem::PopClip);
    }

    fn begin_mask(&mut self, bbox: Rect, luminosity: bool, colorspace: &ColorSpace, color: &[f32]) {
        self.items.push(DisplayListItem::BeginMask {
            bbox,
            luminosity,
            colorspace: colorspace.clone(),
            color: color.to_vec(),
        });
    }

    fn end_mask(&mut self) {
        self.items.push(DisplayListItem::EndMask);
    }

    fn begin_group(&mut self, bbox: Rect, isolated: bool, knockout: bool, blend_mode: BlendMode, alpha: f32) {
        self.items.push(DisplayListItem::BeginGroup {
            bbox,
            isolated,
            knockout,
            blend_mode,
            alpha,
        });
    }

    fn end_group(&mut self) {
        self.items.push(DisplayListItem::EndGroup);
    }

    fn begin_tile(&mut self, area: Rect, view: Rect, xstep: f32, ystep: f32, ctm: &Matrix, id: i32) -> i32 {
        let id = if id >= 0 {
            id
        } else {
            self.next_tile_id += 1;
            self.next_tile_id
        };
        self.items.push(DisplayListItem::BeginTile {
            area,
            view,
            xstep,
            ystep,
            ctm: *ctm,
            id,
        });
        id
    }

    fn end_tile(&mut self) {
        self.items.push(DisplayListItem::EndTile);
    }

    fn begin_page(&mut self, mediabox: Rect, ctm: &Matrix) {
        self.items.push(DisplayListItem::BeginPage { mediabox, ctm: *ctm });
    }

    fn end_page(&mut self) {
        self.items.push(DisplayListItem::EndPage);
    }
}

/// Ignores color and records only the union of every transformed bounding
/// box it's asked to draw, stroke or clip to.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BboxDevice {
    pub bounds: Option<Rect>,
}

impl BboxDevice {
    pub fn new() -> BboxDevice {
        BboxDevice::default()
    }

    fn extend(&mut self, rect: Rect) {
        self.bounds = Some(match self.bounds {
            Some(existing) => existing.union(&rect),
            None => rect,
        });
    }

    fn extend_path(&mut self, path: &Path, ctm: &Matrix) {
        if let Some(rect) = path.bounding_box() {
            self.extend(rect.transform(ctm));
        }
    }
}

impl Device for BboxDevice {
    fn fill_path(&mut self, path: &Path, _even_odd: bool, ctm: &Matrix, _colorspace: &ColorSpace, _color: &[f32], _alpha: f32) {
        self.extend_path(path, ctm);
    }

    fn stroke_path(
        &mut self, path: &Path, _stroke_state: &StrokeState, ctm: &Matrix, _colorspace: &ColorSpace, _color: &[f32], _alpha: f32,
    ) {
        self.extend_path(path, ctm);
    }

    fn clip_path(&mut self, path: &Path, _even_odd: bool, ctm: &Matrix, _scissor: Option<Rect>) {
        self.extend_path(path, ctm);
    }

    fn clip_stroke_path(&mut self, path: &Path, _stroke_state: &StrokeState, ctm: &Matrix, _scissor: Option<Rect>) {
        self.extend_path(path, ctm);
    }

    fn fill_text(&mut self, _text: &TextRun, _ctm: &Matrix, _colorspace: &ColorSpace, _color: &[f32], _alpha: f32) {}
    fn stroke_text(
        &mut self, _text: &TextRun, _stroke_state: &StrokeState, _ctm: &Matrix, _colorspace: &ColorSpace, _color: &[f32], _alpha: f32,
    ) {
    }
    fn clip_text(&mut self, _text: &TextRun, _ctm: &Matrix, _accumulate: bool) {}
    fn clip_stroke_text(&mut self, _text: &TextRun, _stroke_state: &StrokeState, _ctm: &Matrix) {}
    fn ignore_text(&mut self, _text: &TextRun, _ctm: &Matrix) {}
    fn fill_shade(&mut self, _shade: &[u8], _ctm: &Matrix, _alpha: f32) {}

    fn fill_image(&mut self, image: &Image, ctm: &Matrix, _alpha: f32) {
        self.extend(Rect::new(0.0, 0.0, image.width as f32, image.height as f32).transform(ctm));
    }

    fn fill_image_mask(&mut self, image: &Image, ctm: &Matrix, _colorspace: &ColorSpace, _color: &[f32], _alpha: f32) {
        self.extend(Rect::new(0.0, 0.0, image.width as f32, image.height as f32).transform(ctm));
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: &Matrix) {
        self.extend(Rect::new(0.0, 0.0, image.width as f32, image.height as f32).transform(ctm));
    }

    fn pop_clip(&mut self) {}
    fn begin_mask(&mut self, _bbox: Rect, _luminosity: bool, _colorspace: &ColorSpace, _color: &[f32]) {}
    fn end_mask(&mut self) {}
    fn begin_group(&mut self, _bbox: Rect, _isolated: bool, _knockout: bool, _blend_mode: BlendMode, _alpha: f32) {}
    fn end_group(&mut self) {}

    fn begin_tile(&mut self, _area: Rect, _view: Rect, _xstep: f32, _ystep: f32, _ctm: &Matrix, id: i32) -> i32 {
        id.max(0)
    }

    fn end_tile(&mut self) {}

    fn begin_page(&mut self, mediabox: Rect, ctm: &Matrix) {
        self.extend(mediabox.transform(ctm));
    }

    fn end_page(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_concat_premultiplies_on_the_left() {
        let translate = Matrix::new(1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let combined = translate.concat(&scale);
        assert_eq!(combined.apply(0.0, 0.0), (20.0, 0.0));
    }

    #[test]
    fn path_bounding_box_covers_control_points() {
        let path = Path {
            segments: vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::CurveTo(Point::new(-5.0, 2.0), Point::new(15.0, 2.0), Point::new(10.0, 0.0)),
            ],
        };
        let bbox = path.bounding_box().unwrap();
        assert_eq!((bbox.x0, bbox.x1), (-5.0, 15.0));
    }

    #[test]
    fn list_device_replay_reproduces_calls() {
        let mut recorder = ListDevice::new();
        let path = Path {
            segments: vec![PathSegment::MoveTo(Point::new(0.0, 0.0)), PathSegment::LineTo(Point::new(1.0, 1.0))],
        };
        recorder.fill_path(&path, false, &Matrix::identity(), &ColorSpace::DeviceGray, &[0.0], 1.0);
        recorder.pop_clip();

        let mut replayed = ListDevice::new();
        recorder.replay(&mut replayed);
        assert_eq!(recorder.items, replayed.items);
    }

    #[test]
    fn list_device_begin_tile_assigns_ids_when_negative() {
        let mut recorder = ListDevice::new();
        let area = Rect::new(0.0, 0.0, 1.0, 1.0);
        let first = recorder.begin_tile(area, area, 1.0, 1.0, &Matrix::identity(), -1);
        let second = recorder.begin_tile(area, area, 1.0, 1.0, &Matrix::identity(), -1);
        assert_ne!(first, second);
        let reused = recorder.begin_tile(area, area, 1.0, 1.0, &Matrix::identity(), 42);
        assert_eq!(reused, 42);
    }

    #[test]
    fn bbox_device_accumulates_transformed_bounds() {
        let mut device = BboxDevice::new();
        let path = Path {
            segments: vec![PathSegment::MoveTo(Point::new(0.0, 0.0)), PathSegment::LineTo(Point::new(10.0, 10.0))],
        };
        let ctm = Matrix::new(1.0, 0.0, 0.0, 1.0, 5.0, 0.0);
        device.fill_path(&path, false, &ctm, &ColorSpace::DeviceGray, &[0.0], 1.0);
        let bounds = device.bounds.unwrap();
        assert_eq!((bounds.x0, bounds.x1), (5.0, 15.0));

        let image = Image {
            width: 4,
            height: 4,
            bits_per_component: 8,
            is_mask: false,
            samples: vec![0; 16],
        };
        device.fill_image(&image, &Matrix::identity(), 1.0);
        let bounds = device.bounds.unwrap();
        assert_eq!(bounds.x0, 0.0);
    }

    #[test]
    fn bbox_device_ignores_text() {
        let mut device = BboxDevice::new();
        let run = TextRun {
            font: b"F1".to_vec(),
            font_size: 12.0,
            glyphs: vec![Glyph { code: 65, trm: Matrix::identity() }],
        };
        device.fill_text(&run, &Matrix::identity(), &ColorSpace::DeviceGray, &[0.0], 1.0);
        assert!(device.bounds.is_none());
    }
}
