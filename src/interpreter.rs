//! The content-stream stack machine: consumes a page's parsed operator
//! list (`content::Content`/`Operation`) and drives a `Device`. The teacher
//! crate can decode and re-encode a content stream but has no component
//! that interprets it against a drawing sink; this module is that
//! component.

use log::warn;

use crate::content::{Content as ParsedContent, Operation};
use crate::context::Cookie;
use crate::device::{ColorSpace, Device, Glyph, Image, LineCap, LineJoin, Matrix, Path, PathSegment, Point, Rect, StrokeState, TextRun};
use crate::{Dictionary, Document, Error, Object, Result};

const MAX_GSTATE_DEPTH: usize = 32;
const MAX_XOBJECT_DEPTH: usize = 16;

#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f32,
    word_spacing: f32,
    h_scaling: f32,
    leading: f32,
    font: Option<Vec<u8>>,
    font_size: f32,
    rise: f32,
    render_mode: i64,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rise: 0.0,
            render_mode: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    stroke_state: StrokeState,
    fill_colorspace: ColorSpace,
    fill_color: Vec<f32>,
    stroke_colorspace: ColorSpace,
    stroke_color: Vec<f32>,
    text: TextState,
    clip_depth: u32,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> GraphicsState {
        GraphicsState {
            ctm,
            stroke_state: StrokeState::default(),
            fill_colorspace: ColorSpace::DeviceGray,
            fill_color: vec![0.0],
            stroke_colorspace: ColorSpace::DeviceGray,
            stroke_color: vec![0.0],
            text: TextState::default(),
            clip_depth: 0,
        }
    }
}

/// Terminal state produced by interpreting one content stream: whether the
/// run completed normally and how many operator-level errors were warned
/// away along the way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Content {
    pub completed: bool,
    pub warnings: u32,
}

/// Drives a `Device` by walking a page's (or form XObject's) operations.
pub struct Interpreter<'doc, D> {
    doc: &'doc Document,
    device: D,
    gs_stack: Vec<GraphicsState>,
    path: Path,
    current_point: Point,
    pending_clip: Option<bool>,
    tm: Matrix,
    tlm: Matrix,
    in_text_object: bool,
    compat_depth: u32,
    cookie: Option<&'doc Cookie>,
    warnings: u32,
}

impl<'doc, D: Device> Interpreter<'doc, D> {
    pub fn new(doc: &'doc Document, device: D) -> Interpreter<'doc, D> {
        Interpreter {
            doc,
            device,
            gs_stack: vec![GraphicsState::new(Matrix::identity())],
            path: Path::new(),
            current_point: Point::new(0.0, 0.0),
            pending_clip: None,
            tm: Matrix::identity(),
            tlm: Matrix::identity(),
            in_text_object: false,
            compat_depth: 0,
            cookie: None,
            warnings: 0,
        }
    }

    pub fn with_ctm(mut self, ctm: Matrix) -> Self {
        self.gs_stack[0].ctm = ctm;
        self
    }

    pub fn with_cookie(mut self, cookie: &'doc Cookie) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn gs(&self) -> &GraphicsState {
        self.gs_stack.last().expect("gstate stack never empty")
    }

    fn gs_mut(&mut self) -> &mut GraphicsState {
        self.gs_stack.last_mut().expect("gstate stack never empty")
    }

    fn warn(&mut self, message: impl AsRef<str>) {
        warn!("{}", message.as_ref());
        self.warnings += 1;
    }

    fn cookie_wants_abort(&self) -> bool {
        self.cookie.map(Cookie::is_aborted).unwrap_or(false)
    }

    /// Interpret every operation of `content` against `resources`,
    /// recursing into Form XObjects as `Do` is encountered.
    pub fn run(&mut self, content: &ParsedContent, resources: &'doc Dictionary) -> Result<Content> {
        self.run_at_depth(content, resources, 0)
    }

    fn run_at_depth(&mut self, content: &ParsedContent, resources: &'doc Dictionary, xobject_depth: usize) -> Result<Content> {
        for operation in &content.operations {
            if self.cookie_wants_abort() {
                if let Some(cookie) = self.cookie {
                    cookie.mark_incomplete();
                }
                return Ok(Content {
                    completed: false,
                    warnings: self.warnings,
                });
            }
            self.execute(operation, resources, xobject_depth)?;
        }
        Ok(Content {
            completed: true,
            warnings: self.warnings,
        })
    }

    fn execute(&mut self, op: &Operation, resources: &'doc Dictionary, xobject_depth: usize) -> Result<()> {
        let operands = &op.operands;
        match op.operator.as_str() {
            // path construction
            "m" => {
                if let Some(p) = self.point(operands, 0) {
                    self.current_point = p;
                    self.path.segments.push(PathSegment::MoveTo(p));
                }
            }
            "l" => {
                if let Some(p) = self.point(operands, 0) {
                    self.current_point = p;
                    self.path.segments.push(PathSegment::LineTo(p));
                }
            }
            "c" => {
                if let (Some(c1), Some(c2), Some(p)) = (self.point(operands, 0), self.point(operands, 2), self.point(operands, 4)) {
                    self.current_point = p;
                    self.path.segments.push(PathSegment::CurveTo(c1, c2, p));
                }
            }
            "v" => {
                if let (Some(c2), Some(p)) = (self.point(operands, 0), self.point(operands, 2)) {
                    let c1 = self.current_point;
                    self.current_point = p;
                    self.path.segments.push(PathSegment::CurveTo(c1, c2, p));
                }
            }
            "y" => {
                if let (Some(c1), Some(p)) = (self.point(operands, 0), self.point(operands, 2)) {
                    self.current_point = p;
                    self.path.segments.push(PathSegment::CurveTo(c1, p, p));
                }
            }
            "re" => {
                if operands.len() < 4 {
                    self.warn("stack underflow on re, skipping");
                } else {
                    let (x, y, w, h) = (self.num(operands, 0), self.num(operands, 1), self.num(operands, 2), self.num(operands, 3));
                    self.path.segments.push(PathSegment::MoveTo(Point::new(x, y)));
                    self.path.segments.push(PathSegment::LineTo(Point::new(x + w, y)));
                    self.path.segments.push(PathSegment::LineTo(Point::new(x + w, y + h)));
                    self.path.segments.push(PathSegment::LineTo(Point::new(x, y + h)));
                    self.path.segments.push(PathSegment::Close);
                    self.current_point = Point::new(x, y);
                }
            }
            "h" => self.path.segments.push(PathSegment::Close),

            // path painting
            "S" => self.paint(false, None, true),
            "s" => {
                self.path.segments.push(PathSegment::Close);
                self.paint(false, None, true);
            }
            "f" | "F" => self.paint(true, Some(false), false),
            "f*" => self.paint(true, Some(true), false),
            "B" => self.paint(true, Some(false), true),
            "B*" => self.paint(true, Some(true), true),
            "b" => {
                self.path.segments.push(PathSegment::Close);
                self.paint(true, Some(false), true);
            }
            "b*" => {
                self.path.segments.push(PathSegment::Close);
                self.paint(true, Some(true), true);
            }
            "n" => self.paint(false, None, false),

            // clipping (deferred until the next painting operator)
            "W" => self.pending_clip = Some(false),
            "W*" => self.pending_clip = Some(true),

            // gstate
            "q" => {
                if self.gs_stack.len() >= MAX_GSTATE_DEPTH {
                    self.warn("graphics state stack depth exceeded, clamping");
                } else {
                    let top = self.gs().clone();
                    self.gs_stack.push(top);
                }
            }
            "Q" => {
                if self.gs_stack.len() <= 1 {
                    self.warn("Q with no matching q, ignoring");
                } else {
                    let popped = self.gs_stack.pop().expect("checked len > 1");
                    for _ in 0..popped.clip_depth {
                        self.device.pop_clip();
                    }
                }
            }
            "cm" => {
                if operands.len() < 6 {
                    self.warn("stack underflow on cm, skipping");
                } else {
                    let m = Matrix::new(
                        self.num(operands, 0),
                        self.num(operands, 1),
                        self.num(operands, 2),
                        self.num(operands, 3),
                        self.num(operands, 4),
                        self.num(operands, 5),
                    );
                    self.gs_mut().ctm = m.concat(&self.gs().ctm);
                }
            }
            "w" => {
                if let Some(width) = self.operand(operands, 0) {
                    self.gs_mut().stroke_state.line_width = width;
                }
            }
            "J" => {
                if let Some(cap) = operands.first().and_then(|o| o.as_i64().ok()) {
                    self.gs_mut().stroke_state.cap = match cap {
                        1 => LineCap::Round,
                        2 => LineCap::Square,
                        _ => LineCap::Butt,
                    };
                }
            }
            "j" => {
                if let Some(join) = operands.first().and_then(|o| o.as_i64().ok()) {
                    self.gs_mut().stroke_state.join = match join {
                        1 => LineJoin::Round,
                        2 => LineJoin::Bevel,
                        _ => LineJoin::Miter,
                    };
                }
            }
            "M" => {
                if let Some(limit) = self.operand(operands, 0) {
                    self.gs_mut().stroke_state.miter_limit = limit;
                }
            }
            "d" => {
                if operands.len() < 2 {
                    self.warn("stack underflow on d, skipping");
                } else if let Ok(array) = operands[0].as_array() {
                    let pattern = array.iter().map(|o| o.as_float().unwrap_or(0.0)).collect();
                    let phase = self.num(operands, 1);
                    self.gs_mut().stroke_state.dash_pattern = pattern;
                    self.gs_mut().stroke_state.dash_phase = phase;
                }
            }
            "i" | "gs" => {}

            // color
            "CS" => self.gs_mut().stroke_colorspace = self.colorspace_operand(operands),
            "cs" => self.gs_mut().fill_colorspace = self.colorspace_operand(operands),
            "SC" | "SCN" => self.gs_mut().stroke_color = self.color_operands(operands),
            "sc" | "scn" => self.gs_mut().fill_color = self.color_operands(operands),
            "G" => {
                self.gs_mut().stroke_colorspace = ColorSpace::DeviceGray;
                self.gs_mut().stroke_color = vec![self.num(operands, 0)];
            }
            "g" => {
                self.gs_mut().fill_colorspace = ColorSpace::DeviceGray;
                self.gs_mut().fill_color = vec![self.num(operands, 0)];
            }
            "RG" => {
                self.gs_mut().stroke_colorspace = ColorSpace::DeviceRGB;
                self.gs_mut().stroke_color = vec![self.num(operands, 0), self.num(operands, 1), self.num(operands, 2)];
            }
            "rg" => {
                self.gs_mut().fill_colorspace = ColorSpace::DeviceRGB;
                self.gs_mut().fill_color = vec![self.num(operands, 0), self.num(operands, 1), self.num(operands, 2)];
            }
            "K" => {
                self.gs_mut().stroke_colorspace = ColorSpace::DeviceCMYK;
                self.gs_mut().stroke_color =
                    vec![self.num(operands, 0), self.num(operands, 1), self.num(operands, 2), self.num(operands, 3)];
            }
            "k" => {
                self.gs_mut().fill_colorspace = ColorSpace::DeviceCMYK;
                self.gs_mut().fill_color =
                    vec![self.num(operands, 0), self.num(operands, 1), self.num(operands, 2), self.num(operands, 3)];
            }

            // text object
            "BT" => {
                self.in_text_object = true;
                self.tm = Matrix::identity();
                self.tlm = Matrix::identity();
            }
            "ET" => self.in_text_object = false,

            // text state
            "Tc" => {
                if let Some(v) = self.operand(operands, 0) {
                    self.gs_mut().text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = self.operand(operands, 0) {
                    self.gs_mut().text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = self.operand(operands, 0) {
                    self.gs_mut().text.h_scaling = v;
                }
            }
            "TL" => {
                if let Some(v) = self.operand(operands, 0) {
                    self.gs_mut().text.leading = v;
                }
            }
            "Tf" => {
                if operands.len() < 2 {
                    self.warn("stack underflow on Tf, skipping");
                } else {
                    let name = operands[0].as_name().map_err(|_| {
                        Error::Syntax("Tf operand is not a name".to_string())
                    })?;
                    self.lookup_font(resources, name)?;
                    let size = self.num(operands, 1);
                    self.gs_mut().text.font = Some(name.to_vec());
                    self.gs_mut().text.font_size = size;
                }
            }
            "Tr" => {
                if let Some(mode) = operands.first().and_then(|o| o.as_i64().ok()) {
                    self.gs_mut().text.render_mode = mode;
                }
            }
            "Ts" => {
                if let Some(v) = self.operand(operands, 0) {
                    self.gs_mut().text.rise = v;
                }
            }

            // text positioning
            "Td" => {
                if operands.len() < 2 {
                    self.warn("stack underflow on Td, skipping");
                } else {
                    let translate = Matrix::new(1.0, 0.0, 0.0, 1.0, self.num(operands, 0), self.num(operands, 1));
                    self.tlm = translate.concat(&self.tlm);
                    self.tm = self.tlm;
                }
            }
            "TD" => {
                if operands.len() < 2 {
                    self.warn("stack underflow on TD, skipping");
                } else {
                    self.gs_mut().text.leading = -self.num(operands, 1);
                    let translate = Matrix::new(1.0, 0.0, 0.0, 1.0, self.num(operands, 0), self.num(operands, 1));
                    self.tlm = translate.concat(&self.tlm);
                    self.tm = self.tlm;
                }
            }
            "Tm" => {
                if operands.len() < 6 {
                    self.warn("stack underflow on Tm, skipping");
                } else {
                    self.tlm = Matrix::new(
                        self.num(operands, 0),
                        self.num(operands, 1),
                        self.num(operands, 2),
                        self.num(operands, 3),
                        self.num(operands, 4),
                        self.num(operands, 5),
                    );
                    self.tm = self.tlm;
                }
            }
            "T*" => {
                let leading = self.gs().text.leading;
                let translate = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -leading);
                self.tlm = translate.concat(&self.tlm);
                self.tm = self.tlm;
            }

            // text showing
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(|o| o.as_str().ok()) {
                    self.show_text(bytes);
                } else {
                    self.warn("stack underflow on Tj, skipping");
                }
            }
            "'" => {
                let leading = self.gs().text.leading;
                let translate = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -leading);
                self.tlm = translate.concat(&self.tlm);
                self.tm = self.tlm;
                if let Some(bytes) = operands.first().and_then(|o| o.as_str().ok()) {
                    self.show_text(bytes);
                } else {
                    self.warn("stack underflow on ', skipping");
                }
            }
            "\"" => {
                if operands.len() < 3 {
                    self.warn("stack underflow on \", skipping");
                } else {
                    self.gs_mut().text.word_spacing = self.num(operands, 0);
                    self.gs_mut().text.char_spacing = self.num(operands, 1);
                    let leading = self.gs().text.leading;
                    let translate = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -leading);
                    self.tlm = translate.concat(&self.tlm);
                    self.tm = self.tlm;
                    if let Ok(bytes) = operands[2].as_str() {
                        self.show_text(bytes);
                    }
                }
            }
            "TJ" => {
                if let Some(array) = operands.first().and_then(|o| o.as_array().ok()) {
                    for element in array {
                        match element {
                            Object::String(bytes, _) => self.show_text(bytes),
                            _ => {
                                let adjustment = element.as_float().unwrap_or(0.0);
                                let dx = -adjustment / 1000.0 * self.gs().text.font_size * (self.gs().text.h_scaling / 100.0);
                                self.tm = Matrix::new(1.0, 0.0, 0.0, 1.0, dx, 0.0).concat(&self.tm);
                            }
                        }
                    }
                } else {
                    self.warn("stack underflow on TJ, skipping");
                }
            }

            // xobject
            "Do" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.do_xobject(resources, name, xobject_depth)?;
                } else {
                    self.warn("stack underflow on Do, skipping");
                }
            }

            // inline image, already parsed into a synthetic Stream operand by the content parser
            "BI" => {
                if let Some(Object::Stream(stream)) = operands.first() {
                    if let Some(image) = self.decode_image(&stream.dict, &stream.content) {
                        let ctm = self.gs().ctm;
                        if image.is_mask {
                            let (colorspace, color) = (self.gs().fill_colorspace.clone(), self.gs().fill_color.clone());
                            self.device.fill_image_mask(&image, &ctm, &colorspace, &color, 1.0);
                        } else {
                            self.device.fill_image(&image, &ctm, 1.0);
                        }
                    }
                }
            }

            // shading
            "sh" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    let ctm = self.gs().ctm;
                    self.device.fill_shade(name, &ctm, 1.0);
                } else {
                    self.warn("stack underflow on sh, skipping");
                }
            }

            // compatibility
            "BX" => self.compat_depth += 1,
            "EX" => self.compat_depth = self.compat_depth.saturating_sub(1),

            // marked content: no-op
            "BMC" | "BDC" | "EMC" | "MP" | "DP" => {}

            unknown => {
                if self.compat_depth == 0 {
                    self.warn(format!("unknown operator {unknown:?}, ignoring"));
                }
            }
        }
        Ok(())
    }

    fn point(&mut self, operands: &[Object], index: usize) -> Option<Point> {
        if operands.len() < index + 2 {
            self.warn("stack underflow on path operator, skipping");
            return None;
        }
        Some(Point::new(self.num(operands, index), self.num(operands, index + 1)))
    }

    fn operand(&mut self, operands: &[Object], index: usize) -> Option<f32> {
        if operands.len() <= index {
            self.warn("stack underflow, skipping");
            return None;
        }
        Some(self.num(operands, index))
    }

    fn num(&mut self, operands: &[Object], index: usize) -> f32 {
        match operands.get(index).and_then(|o| o.as_float().ok()) {
            Some(v) => v,
            None => {
                self.warn(format!("malformed numeric operand at index {index}, substituting 0"));
                0.0
            }
        }
    }

    fn colorspace_operand(&mut self, operands: &[Object]) -> ColorSpace {
        match operands.first().and_then(|o| o.as_name().ok()) {
            Some(b"DeviceGray") => ColorSpace::DeviceGray,
            Some(b"DeviceRGB") => ColorSpace::DeviceRGB,
            Some(b"DeviceCMYK") => ColorSpace::DeviceCMYK,
            Some(b"Pattern") => ColorSpace::Pattern(Vec::new()),
            Some(name) => ColorSpace::Named(name.to_vec()),
            None => {
                self.warn("stack underflow on colorspace operator, defaulting to DeviceGray");
                ColorSpace::DeviceGray
            }
        }
    }

    fn color_operands(&mut self, operands: &[Object]) -> Vec<f32> {
        let mut pattern_name = None;
        let mut components = Vec::new();
        for operand in operands {
            match operand {
                Object::Name(name) => pattern_name = Some(name.clone()),
                _ => components.push(operand.as_float().unwrap_or(0.0)),
            }
        }
        if let Some(name) = pattern_name {
            self.gs_mut().fill_colorspace = ColorSpace::Pattern(name);
        }
        components
    }

    fn paint(&mut self, fill: bool, even_odd: Option<bool>, stroke: bool) {
        if self.path.is_empty() {
            self.path.segments.clear();
            self.pending_clip = None;
            return;
        }
        let ctm = self.gs().ctm;
        if fill {
            let (colorspace, color) = (self.gs().fill_colorspace.clone(), self.gs().fill_color.clone());
            self.device.fill_path(&self.path, even_odd.unwrap_or(false), &ctm, &colorspace, &color, 1.0);
        }
        if stroke {
            let (colorspace, color) = (self.gs().stroke_colorspace.clone(), self.gs().stroke_color.clone());
            let stroke_state = self.gs().stroke_state.clone();
            self.device.stroke_path(&self.path, &stroke_state, &ctm, &colorspace, &color, 1.0);
        }
        if let Some(even_odd) = self.pending_clip.take() {
            self.device.clip_path(&self.path, even_odd, &ctm, None);
            self.gs_mut().clip_depth += 1;
        }
        self.path.segments.clear();
    }

    fn lookup_font(&self, resources: &Dictionary, name: &[u8]) -> Result<()> {
        let font_dict = self.doc.get_dict_in_dict(resources, b"Font")?;
        font_dict.get(name).map_err(|_| Error::DictKey(String::from_utf8_lossy(name).to_string()))?;
        Ok(())
    }

    fn show_text(&mut self, bytes: &[u8]) {
        let text = self.gs().text.clone();
        let glyphs = bytes
            .iter()
            .map(|&byte| {
                let glyph_trm = Matrix::new(
                    text.font_size * (text.h_scaling / 100.0),
                    0.0,
                    0.0,
                    text.font_size,
                    0.0,
                    text.rise,
                )
                .concat(&self.tm)
                .concat(&self.gs().ctm);
                let advance = text.font_size * 0.5 + text.char_spacing + if byte == b' ' { text.word_spacing } else { 0.0 };
                self.tm = Matrix::new(1.0, 0.0, 0.0, 1.0, advance, 0.0).concat(&self.tm);
                Glyph {
                    code: byte as u32,
                    trm: glyph_trm,
                }
            })
            .collect();
        let run = TextRun {
            font: text.font.clone().unwrap_or_default(),
            font_size: text.font_size,
            glyphs,
        };
        let ctm = self.gs().ctm;
        let (fill_cs, fill_color) = (self.gs().fill_colorspace.clone(), self.gs().fill_color.clone());
        let (stroke_cs, stroke_color) = (self.gs().stroke_colorspace.clone(), self.gs().stroke_color.clone());
        let stroke_state = self.gs().stroke_state.clone();
        match text.render_mode {
            0 => self.device.fill_text(&run, &ctm, &fill_cs, &fill_color, 1.0),
            1 => self.device.stroke_text(&run, &stroke_state, &ctm, &stroke_cs, &stroke_color, 1.0),
            2 => {
                self.device.fill_text(&run, &ctm, &fill_cs, &fill_color, 1.0);
                self.device.stroke_text(&run, &stroke_state, &ctm, &stroke_cs, &stroke_color, 1.0);
            }
            3 => self.device.ignore_text(&run, &ctm),
            4 => {
                self.device.fill_text(&run, &ctm, &fill_cs, &fill_color, 1.0);
                self.device.clip_text(&run, &ctm, true);
            }
            5 => {
                self.device.stroke_text(&run, &stroke_state, &ctm, &stroke_cs, &stroke_color, 1.0);
                self.device.clip_stroke_text(&run, &stroke_state, &ctm);
            }
            6 => {
                self.device.fill_text(&run, &ctm, &fill_cs, &fill_color, 1.0);
                self.device.stroke_text(&run, &stroke_state, &ctm, &stroke_cs, &stroke_color, 1.0);
                self.device.clip_stroke_text(&run, &stroke_state, &ctm);
            }
            7 => self.device.clip_text(&run, &ctm, false),
            _ => self.device.fill_text(&run, &ctm, &fill_cs, &fill_color, 1.0),
        }
    }

    fn do_xobject(&mut self, resources: &'doc Dictionary, name: &[u8], xobject_depth: usize) -> Result<()> {
        if xobject_depth >= MAX_XOBJECT_DEPTH {
            self.warn("Do recursion depth exceeded, skipping");
            return Ok(());
        }
        let xobject_dict = self.doc.get_dict_in_dict(resources, b"XObject")?;
        let xobject_ref = xobject_dict.get(name).map_err(|_| Error::DictKey(String::from_utf8_lossy(name).to_string()))?;
        let (_, xobject) = self.doc.dereference(xobject_ref)?;
        let stream = xobject.as_stream()?;
        let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).unwrap_or(b"Form");
        match subtype {
            b"Image" => {
                let samples = stream.get_plain_content().unwrap_or_else(|_| stream.content.clone());
                let image = self.decode_image(&stream.dict, &samples);
                if let Some(image) = image {
                    let ctm = self.gs().ctm;
                    if image.is_mask {
                        let (colorspace, color) = (self.gs().fill_colorspace.clone(), self.gs().fill_color.clone());
                        self.device.fill_image_mask(&image, &ctm, &colorspace, &color, 1.0);
                    } else {
                        self.device.fill_image(&image, &ctm, 1.0);
                    }
                }
            }
            _ => {
                let content_bytes = stream.get_plain_content()?;
                let form_content = ParsedContent::decode(&content_bytes)?;
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .and_then(Object::as_array)
                    .map(|array| {
                        Matrix::new(
                            array[0].as_float().unwrap_or(1.0),
                            array[1].as_float().unwrap_or(0.0),
                            array[2].as_float().unwrap_or(0.0),
                            array[3].as_float().unwrap_or(1.0),
                            array[4].as_float().unwrap_or(0.0),
                            array[5].as_float().unwrap_or(0.0),
                        )
                    })
                    .unwrap_or(Matrix::identity());
                let form_resources = self.doc.get_dict_in_dict(&stream.dict, b"Resources").unwrap_or(resources);
                if self.gs_stack.len() >= MAX_GSTATE_DEPTH {
                    self.warn("graphics state stack depth exceeded on Do, clamping");
                } else {
                    let mut top = self.gs().clone();
                    top.ctm = form_matrix.concat(&top.ctm);
                    self.gs_stack.push(top);
                    if let Some(bbox) = stream.dict.get(b"BBox").and_then(Object::as_array).ok() {
                        if bbox.len() == 4 {
                            let rect = Rect::new(
                                bbox[0].as_float().unwrap_or(0.0),
                                bbox[1].as_float().unwrap_or(0.0),
                                bbox[2].as_float().unwrap_or(0.0),
                                bbox[3].as_float().unwrap_or(0.0),
                            );
                            let ctm = self.gs().ctm;
                            let clip_path = rect_path(rect);
                            self.device.clip_path(&clip_path, false, &ctm, None);
                            self.gs_mut().clip_depth += 1;
                        }
                    }
                    self.run_at_depth(&form_content, form_resources, xobject_depth + 1)?;
                    let popped = self.gs_stack.pop().expect("pushed above");
                    for _ in 0..popped.clip_depth {
                        self.device.pop_clip();
                    }
                }
            }
        }
        Ok(())
    }

    fn decode_image(&self, dict: &Dictionary, content: &[u8]) -> Option<Image> {
        let width = dict.get(b"Width").and_then(Object::as_i64).ok()? as u32;
        let height = dict.get(b"Height").and_then(Object::as_i64).ok()? as u32;
        let bpc = dict
            .get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .unwrap_or(8) as u8;
        let is_mask = dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false);
        Some(Image {
            width,
            height,
            bits_per_component: bpc,
            is_mask,
            samples: content.to_vec(),
        })
    }
}

fn rect_path(rect: Rect) -> Path {
    Path {
        segments: vec![
            PathSegment::MoveTo(Point::new(rect.x0, rect.y0)),
            PathSegment::LineTo(Point::new(rect.x1, rect.y0)),
            PathSegment::LineTo(Point::new(rect.x1, rect.y1)),
            PathSegment::LineTo(Point::new(rect.x0, rect.y1)),
            PathSegment::Close,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ListDevice;

    fn operation(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    #[test]
    fn fill_path_reaches_device() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let content = ParsedContent {
            operations: vec![
                operation("re", vec![0.into(), 0.into(), 10.into(), 10.into()]),
                operation("f", vec![]),
            ],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new());
        let result = interpreter.run(&content, &resources).unwrap();
        assert!(result.completed);
        assert_eq!(interpreter.device().items.len(), 1);
    }

    #[test]
    fn q_q_balances_gstate_stack() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let content = ParsedContent {
            operations: vec![operation("q", vec![]), operation("Q", vec![])],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new());
        interpreter.run(&content, &resources).unwrap();
        assert_eq!(interpreter.gs_stack.len(), 1);
    }

    #[test]
    fn unmatched_q_warns_without_crashing() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let content = ParsedContent {
            operations: vec![operation("Q", vec![])],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new());
        let result = interpreter.run(&content, &resources).unwrap();
        assert!(result.warnings >= 1);
    }

    #[test]
    fn unknown_operator_warns_and_continues() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let content = ParsedContent {
            operations: vec![operation("Zz", vec![]), operation("n", vec![])],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new());
        let result = interpreter.run(&content, &resources).unwrap();
        assert!(result.completed);
        assert!(result.warnings >= 1);
    }

    #[test]
    fn unknown_operator_inside_bx_ex_is_silent() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let content = ParsedContent {
            operations: vec![operation("BX", vec![]), operation("Zz", vec![]), operation("EX", vec![])],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new());
        let result = interpreter.run(&content, &resources).unwrap();
        assert_eq!(result.warnings, 0);
    }

    #[test]
    fn malformed_numeric_operand_substitutes_zero() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let content = ParsedContent {
            operations: vec![operation("w", vec![Object::Name(b"not-a-number".to_vec())])],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new());
        let result = interpreter.run(&content, &resources).unwrap();
        assert_eq!(interpreter.gs_stack[0].stroke_state.line_width, 0.0);
        assert!(result.warnings >= 1);
    }

    #[test]
    fn cookie_abort_stops_run_early() {
        let doc = Document::new();
        let resources = Dictionary::new();
        let cookie = Cookie::new();
        cookie.abort();
        let content = ParsedContent {
            operations: vec![operation("n", vec![]), operation("n", vec![])],
        };
        let mut interpreter = Interpreter::new(&doc, ListDevice::new()).with_cookie(&cookie);
        let result = interpreter.run(&content, &resources).unwrap();
        assert!(!result.completed);
        assert!(cookie.is_incomplete());
    }
}
