//! Rendering of a sampled field: contour lines (marching squares) and a shaded 3D
//! surface, drawn to PNG with plotters or shown in a gnuplot window.
use crate::errors::RenderError;
use crate::numerical::critical_points::Classification;
use crate::numerical::sampler::SampledField;
// gnuplot options stay path-qualified: gnuplot::Color clashes with the plotters Color trait
use gnuplot::{AxesCommon, DashType, Figure};
use log::{info, warn};
use ndarray::Array1;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};

pub type Point = (f64, f64);
pub type Segment = (Point, Point);

////////////////////////////////COLORMAPS/////////////////////////////////////////////
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
}

impl Colormap {
    // samples of the matplotlib maps at t = 0, 0.25, 0.5, 0.75, 1
    fn anchors(&self) -> [(u8, u8, u8); 5] {
        match self {
            Colormap::Viridis => [(68, 1, 84), (59, 82, 139), (33, 145, 140), (94, 201, 98), (253, 231, 37)],
            Colormap::Plasma => [(13, 8, 135), (126, 3, 168), (204, 71, 120), (248, 149, 64), (240, 249, 33)],
            Colormap::Inferno => [(0, 0, 4), (87, 16, 110), (188, 55, 84), (249, 142, 9), (252, 255, 164)],
            Colormap::Magma => [(0, 0, 4), (81, 18, 124), (183, 55, 121), (252, 137, 97), (252, 253, 191)],
            Colormap::Cividis => [(0, 34, 78), (53, 69, 108), (102, 105, 112), (149, 143, 120), (254, 232, 56)],
        }
    }

    /// Color at `t` in [0, 1], linear between the anchors. Out-of-range `t` is clamped.
    pub fn rgb(&self, t: f64) -> (u8, u8, u8) {
        let anchors = self.anchors();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (anchors.len() - 1) as f64;
        let i = (pos.floor() as usize).min(anchors.len() - 2);
        let s = pos - i as f64;
        let (a, b) = (anchors[i], anchors[i + 1]);
        let mix = |p: u8, q: u8| (p as f64 + s * (q as f64 - p as f64)).round() as u8;
        (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    pub fn color(&self, t: f64) -> RGBColor {
        let (r, g, b) = self.rgb(t);
        RGBColor(r, g, b)
    }

    pub fn hex(&self, t: f64) -> String {
        let (r, g, b) = self.rgb(t);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

////////////////////////////////LINE STYLES///////////////////////////////////////////
/// matplotlib line style codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
pub enum LineStyle {
    #[default]
    #[strum(to_string = "-", serialize = "solid")]
    Solid,
    #[strum(to_string = "--", serialize = "dashed")]
    Dashed,
    #[strum(to_string = "-.", serialize = "dashdot")]
    DashDot,
    #[strum(to_string = ":", serialize = "dotted")]
    Dotted,
}

impl LineStyle {
    /// on/off lengths, in units of 1/300 of the plot diagonal
    fn pattern(&self) -> Option<&'static [f64]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some(&[6.0, 4.0]),
            LineStyle::DashDot => Some(&[6.0, 3.0, 1.0, 3.0]),
            LineStyle::Dotted => Some(&[1.0, 2.5]),
        }
    }

    fn dash_type(&self) -> DashType {
        match self {
            LineStyle::Solid => DashType::Solid,
            LineStyle::Dashed => DashType::Dash,
            LineStyle::DashDot => DashType::DotDash,
            LineStyle::Dotted => DashType::Dot,
        }
    }

    /// Splits a polyline into the visible pieces of the dash pattern.
    pub fn dash(&self, line: &[Point], unit: f64) -> Vec<Vec<Point>> {
        let Some(pattern) = self.pattern() else {
            return vec![line.to_vec()];
        };
        if line.len() < 2 || !(unit > 0.0) {
            return vec![line.to_vec()];
        }
        let mut pieces = Vec::new();
        let mut current: Vec<Point> = vec![line[0]];
        let mut k = 0; // index into the pattern, even = drawn
        let mut left = pattern[0] * unit;
        for w in line.windows(2) {
            let (mut a, b) = (w[0], w[1]);
            let mut len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
            while len > left {
                let s = left / len;
                let cut = (a.0 + s * (b.0 - a.0), a.1 + s * (b.1 - a.1));
                if k % 2 == 0 {
                    current.push(cut);
                    pieces.push(std::mem::take(&mut current));
                } else {
                    current = vec![cut];
                }
                len -= left;
                a = cut;
                k = (k + 1) % pattern.len();
                left = pattern[k] * unit;
            }
            left -= len;
            if k % 2 == 0 {
                current.push(b);
            }
        }
        if k % 2 == 0 && current.len() >= 2 {
            pieces.push(current);
        }
        pieces
    }
}

////////////////////////////////SCENE/////////////////////////////////////////////////
/// Contour levels: `Auto(n)` spreads n levels from the finite minimum to the maximum.
#[derive(Debug, Clone, PartialEq)]
pub enum Levels {
    Auto(usize),
    Fixed(Vec<f64>),
}

impl Default for Levels {
    fn default() -> Self {
        Levels::Auto(10)
    }
}

pub fn resolve_levels(levels: &Levels, field: &SampledField) -> Result<Vec<f64>, RenderError> {
    let ((_, _, lo), (_, _, hi)) = field.finite_extrema().ok_or(RenderError::NoFiniteValues)?;
    let resolved = match levels {
        Levels::Auto(_) if lo == hi => vec![lo],
        Levels::Auto(n) => Array1::linspace(lo, hi, (*n).max(2)).to_vec(),
        Levels::Fixed(values) => {
            let mut values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();
            values
        }
    };
    Ok(resolved)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    ContourOnly,
    /// 3D surface on the left, contours on the right
    SurfaceAndContour,
}

impl Layout {
    pub fn image_size(&self) -> (u32, u32) {
        match self {
            Layout::ContourOnly => (800, 800),
            Layout::SurfaceAndContour => (1400, 700),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    GlobalMin,
    GlobalMax,
    Critical(Classification),
}

impl MarkerKind {
    fn rgb(&self) -> (u8, u8, u8) {
        match self {
            MarkerKind::GlobalMin => (0, 160, 0),
            MarkerKind::GlobalMax => (220, 0, 0),
            MarkerKind::Critical(Classification::Minimum) => (0, 90, 255),
            MarkerKind::Critical(Classification::Maximum) => (255, 120, 0),
            MarkerKind::Critical(Classification::Saddle) => (150, 0, 200),
            MarkerKind::Critical(Classification::Indeterminate) => (90, 90, 90),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub kind: MarkerKind,
    pub label: String,
}

/// Everything a renderer needs for one figure.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub title: String,
    pub field: &'a SampledField,
    pub layout: Layout,
    pub levels: Vec<f64>,
    pub colormap: Colormap,
    pub line_style: LineStyle,
    pub markers: Vec<Marker>,
    /// text shown in a corner of the contour panel
    pub annotations: Vec<String>,
}

impl Scene<'_> {
    /// Position of the i-th level on the colormap.
    pub fn level_position(&self, i: usize) -> f64 {
        if self.levels.len() < 2 { 0.5 } else { i as f64 / (self.levels.len() - 1) as f64 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    Window,
    Png(PathBuf),
}

pub trait Renderer {
    fn render(&mut self, scene: &Scene, target: &RenderTarget) -> Result<(), RenderError>;
}

////////////////////////////////MARCHING SQUARES//////////////////////////////////////
/// Line pieces of the `level` isoline, one or two per grid cell. Cells with a non-finite
/// corner are skipped.
pub fn contour_segments(field: &SampledField, level: f64) -> Vec<Segment> {
    let (ny, nx) = field.z.dim();
    let mut segments = Vec::new();
    if nx < 2 || ny < 2 {
        return segments;
    }
    for r in 0..ny - 1 {
        for c in 0..nx - 1 {
            let v00 = field.z[[r, c]];
            let v10 = field.z[[r, c + 1]];
            let v01 = field.z[[r + 1, c]];
            let v11 = field.z[[r + 1, c + 1]];
            if !(v00.is_finite() && v10.is_finite() && v01.is_finite() && v11.is_finite()) {
                continue;
            }
            let case = ((v00 >= level) as u8)
                | (((v10 >= level) as u8) << 1)
                | (((v01 >= level) as u8) << 2)
                | (((v11 >= level) as u8) << 3);
            if case == 0 || case == 15 {
                continue;
            }
            let lerp = |va: f64, vb: f64| {
                if (vb - va).abs() < f64::EPSILON { 0.5 } else { (level - va) / (vb - va) }
            };
            let (x0, x1, y0, y1) = (field.x[c], field.x[c + 1], field.y[r], field.y[r + 1]);
            let bottom = (x0 + lerp(v00, v10) * (x1 - x0), y0);
            let top = (x0 + lerp(v01, v11) * (x1 - x0), y1);
            let left = (x0, y0 + lerp(v00, v01) * (y1 - y0));
            let right = (x1, y0 + lerp(v10, v11) * (y1 - y0));
            match case {
                1 | 14 => segments.push((bottom, left)),
                2 | 13 => segments.push((bottom, right)),
                3 | 12 => segments.push((left, right)),
                4 | 11 => segments.push((left, top)),
                5 => {
                    segments.push((bottom, left));
                    segments.push((top, right));
                }
                6 | 9 => segments.push((bottom, top)),
                7 | 8 => segments.push((right, top)),
                10 => {
                    segments.push((bottom, right));
                    segments.push((left, top));
                }
                _ => {}
            }
        }
    }
    segments
}

/// Joins segments sharing an end point into polylines.
pub fn stitch_segments(segments: &[Segment]) -> Vec<Vec<Point>> {
    let key = |p: Point| (p.0.to_bits(), p.1.to_bits());
    let mut ends: HashMap<(u64, u64), Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        ends.entry(key(*a)).or_default().push(i);
        ends.entry(key(*b)).or_default().push(i);
    }
    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let mut line = VecDeque::from(vec![a, b]);
        for forward in [true, false] {
            loop {
                let tip = match if forward { line.back() } else { line.front() } {
                    Some(p) => *p,
                    None => break,
                };
                let next = ends
                    .get(&key(tip))
                    .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
                let Some(i) = next else { break };
                used[i] = true;
                let (p, q) = segments[i];
                let other = if key(p) == key(tip) { q } else { p };
                if forward {
                    line.push_back(other);
                } else {
                    line.push_front(other);
                }
            }
        }
        lines.push(line.into_iter().collect());
    }
    lines
}

////////////////////////////////3D PROJECTION/////////////////////////////////////////
/// Orthographic camera looking at the unit cube [-1, 1]^3.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub azimuth: f64,
    pub elevation: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera { azimuth: -1.07, elevation: 0.63 }
    }
}

impl Camera {
    pub fn project(&self, p: [f64; 3]) -> Point {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        (-p[0] * sa + p[1] * ca, -p[0] * ca * se - p[1] * sa * se + p[2] * ce)
    }

    /// larger is further from the viewer
    pub fn depth(&self, p: [f64; 3]) -> f64 {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        -(p[0] * ce * ca + p[1] * ce * sa + p[2] * se)
    }
}

// cells per axis drawn for the surface
const SURFACE_CELLS: usize = 60;

#[derive(Debug, Clone)]
pub struct SurfaceQuad {
    pub corners: [Point; 4],
    pub depth: f64,
    /// mean height scaled to [0, 1]
    pub height: f64,
    pub shade: f64,
}

/// Maps grid coordinates into the unit cube used by the camera.
pub struct CubeScale {
    x: (f64, f64),
    y: (f64, f64),
    z: (f64, f64),
}

impl CubeScale {
    pub fn new(field: &SampledField) -> Option<Self> {
        let ((_, _, zmin), (_, _, zmax)) = field.finite_extrema()?;
        let last = |a: &Array1<f64>| a[a.len() - 1];
        Some(CubeScale {
            x: (field.x[0], last(&field.x)),
            y: (field.y[0], last(&field.y)),
            z: (zmin, zmax),
        })
    }

    pub fn unit(&self, x: f64, y: f64, z: f64) -> [f64; 3] {
        let s = |v: f64, (lo, hi): (f64, f64)| if hi > lo { 2.0 * (v - lo) / (hi - lo) - 1.0 } else { 0.0 };
        [s(x, self.x), s(y, self.y), s(z, self.z)]
    }

    pub fn height(&self, z: f64) -> f64 {
        if self.z.1 > self.z.0 { (z - self.z.0) / (self.z.1 - self.z.0) } else { 0.5 }
    }
}

/// Projected surface cells sorted back to front, on a grid thinned to about
/// `SURFACE_CELLS` cells per axis. Cells touching a non-finite value are left out.
pub fn surface_quads(field: &SampledField, camera: &Camera) -> Vec<SurfaceQuad> {
    let Some(scale) = CubeScale::new(field) else {
        return Vec::new();
    };
    let (ny, nx) = field.z.dim();
    let stride_r = ny.div_ceil(SURFACE_CELLS).max(1);
    let stride_c = nx.div_ceil(SURFACE_CELLS).max(1);
    let rows: Vec<usize> = (0..ny).step_by(stride_r).chain(std::iter::once(ny - 1)).collect();
    let cols: Vec<usize> = (0..nx).step_by(stride_c).chain(std::iter::once(nx - 1)).collect();
    let mut quads = Vec::new();
    for rw in rows.windows(2).filter(|w| w[0] != w[1]) {
        for cw in cols.windows(2).filter(|w| w[0] != w[1]) {
            let idx = [(rw[0], cw[0]), (rw[0], cw[1]), (rw[1], cw[1]), (rw[1], cw[0])];
            let zs = idx.map(|(r, c)| field.z[[r, c]]);
            if zs.iter().any(|z| !z.is_finite()) {
                continue;
            }
            let pts = idx.map(|(r, c)| scale.unit(field.x[c], field.y[r], field.z[[r, c]]));
            let depth = pts.iter().map(|p| camera.depth(*p)).sum::<f64>() / 4.0;
            let mean_z = zs.iter().sum::<f64>() / 4.0;
            quads.push(SurfaceQuad {
                corners: pts.map(|p| camera.project(p)),
                depth,
                height: scale.height(mean_z),
                shade: lambert(pts[0], pts[1], pts[3]),
            });
        }
    }
    quads.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    quads
}

// ambient + diffuse light from the upper left front
fn lambert(p0: [f64; 3], p1: [f64; 3], p2: [f64; 3]) -> f64 {
    let u = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
    let v = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
    let n = [u[1] * v[2] - u[2] * v[1], u[2] * v[0] - u[0] * v[2], u[0] * v[1] - u[1] * v[0]];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len < 1e-15 {
        return 1.0;
    }
    let light = [0.4, -0.5, 0.76];
    let light_len = (0.4f64 * 0.4 + 0.25 + 0.76 * 0.76).sqrt();
    let dot = (n[0] * light[0] + n[1] * light[1] + n[2] * light[2]) / (len * light_len);
    0.35 + 0.65 * dot.abs()
}

////////////////////////////////PNG (plotters)////////////////////////////////////////
#[derive(Debug, Default, Clone, Copy)]
pub struct PngRenderer;

impl PngRenderer {
    fn draw(&self, scene: &Scene, path: &Path) -> Result<(), Box<dyn Error>> {
        let size = scene.layout.image_size();
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(&scene.title, ("sans-serif", 24))?;
        match scene.layout {
            Layout::ContourOnly => draw_contour_panel(&root, scene)?,
            Layout::SurfaceAndContour => {
                let (left, right) = root.split_horizontally(size.0 / 2);
                draw_surface_panel(&left, scene)?;
                draw_contour_panel(&right, scene)?;
            }
        }
        root.present()?;
        Ok(())
    }
}

impl Renderer for PngRenderer {
    fn render(&mut self, scene: &Scene, target: &RenderTarget) -> Result<(), RenderError> {
        let RenderTarget::Png(path) = target else {
            return Err(RenderError::Backend("the PNG renderer cannot open a window".to_string()));
        };
        self.draw(scene, path).map_err(|e| RenderError::Backend(e.to_string()))?;
        info!("plot saved to {}", path.display());
        Ok(())
    }
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw_contour_panel(area: &Panel, scene: &Scene) -> Result<(), Box<dyn Error>> {
    let field = scene.field;
    let (x0, x1) = (field.x[0], field.x[field.x.len() - 1]);
    let (y0, y1) = (field.y[0], field.y[field.y.len() - 1]);
    let mut chart = ChartBuilder::on(area)
        .caption("contour lines", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart.configure_mesh().x_desc("x").y_desc("y").draw()?;

    // axes through the origin
    if x0 <= 0.0 && 0.0 <= x1 {
        chart.draw_series(LineSeries::new(vec![(0.0, y0), (0.0, y1)], &BLACK))?;
    }
    if y0 <= 0.0 && 0.0 <= y1 {
        chart.draw_series(LineSeries::new(vec![(x0, 0.0), (x1, 0.0)], &BLACK))?;
    }

    let unit = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt() / 300.0;
    for (i, level) in scene.levels.iter().enumerate() {
        let color = scene.colormap.color(scene.level_position(i));
        let lines = stitch_segments(&contour_segments(field, *level));
        for line in &lines {
            let pieces = scene.line_style.dash(line, unit);
            chart.draw_series(pieces.into_iter().map(|p| PathElement::new(p, color.stroke_width(2))))?;
        }
        // inline label on the longest line of the level
        if let Some(longest) = lines.iter().max_by_key(|l| l.len()) {
            let at = longest[longest.len() / 2];
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.3}", level),
                at,
                ("sans-serif", 12).into_font(),
            )))?;
        }
    }

    for marker in &scene.markers {
        let (r, g, b) = marker.kind.rgb();
        let color = RGBColor(r, g, b);
        chart.draw_series(std::iter::once(Circle::new((marker.x, marker.y), 5, color.filled())))?;
        chart.draw_series(std::iter::once(Text::new(
            marker.label.clone(),
            (marker.x, marker.y),
            ("sans-serif", 13).into_font(),
        )))?;
    }

    for (k, line) in scene.annotations.iter().enumerate() {
        area.draw(&Text::new(
            line.clone(),
            (60, 40 + 16 * k as i32),
            ("sans-serif", 13).into_font(),
        ))?;
    }
    Ok(())
}

fn draw_surface_panel(area: &Panel, scene: &Scene) -> Result<(), Box<dyn Error>> {
    let camera = Camera::default();
    let mut chart = ChartBuilder::on(area)
        .caption("3D surface", ("sans-serif", 18))
        .margin(10)
        .build_cartesian_2d(-1.7..1.7, -1.9..1.9)?;

    // floor of the bounding box with axis names
    let floor = [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0]];
    chart.draw_series(std::iter::once(PathElement::new(
        floor.iter().map(|p| camera.project(*p)).collect::<Vec<_>>(),
        BLACK.mix(0.5).stroke_width(1),
    )))?;
    let axis_label = |text: &str, p: [f64; 3]| Text::new(text.to_string(), camera.project(p), ("sans-serif", 16).into_font());
    chart.draw_series([
        axis_label("x", [1.15, -1.0, -1.0]),
        axis_label("y", [-1.0, 1.15, -1.0]),
        axis_label("z", [-1.0, -1.0, 1.1]),
    ])?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![camera.project([-1.0, -1.0, -1.0]), camera.project([-1.0, -1.0, 1.0])],
        BLACK.mix(0.5).stroke_width(1),
    )))?;

    let quads = surface_quads(scene.field, &camera);
    chart.draw_series(quads.iter().map(|q| {
        let (r, g, b) = scene.colormap.rgb(q.height);
        let lit = |c: u8| (c as f64 * q.shade).round().clamp(0.0, 255.0) as u8;
        Polygon::new(q.corners.to_vec(), RGBColor(lit(r), lit(g), lit(b)).filled())
    }))?;

    if let Some(scale) = CubeScale::new(scene.field) {
        for marker in &scene.markers {
            let (r, g, b) = marker.kind.rgb();
            let at = camera.project(scale.unit(marker.x, marker.y, marker.z));
            chart.draw_series(std::iter::once(Circle::new(at, 5, RGBColor(r, g, b).filled())))?;
        }
    }
    Ok(())
}

////////////////////////////////WINDOW (gnuplot)//////////////////////////////////////
#[derive(Debug, Default, Clone, Copy)]
pub struct GnuplotRenderer;

impl GnuplotRenderer {
    fn figure(&self, scene: &Scene) -> Figure {
        let field = scene.field;
        let mut fg = Figure::new();
        fg.set_title(&scene.title);
        if scene.layout == Layout::SurfaceAndContour {
            fg.set_multiplot_layout(1, 2);
            let (ny, nx) = field.z.dim();
            let stride = nx.max(ny).div_ceil(SURFACE_CELLS).max(1);
            let rows: Vec<usize> = (0..ny).step_by(stride).collect();
            let cols: Vec<usize> = (0..nx).step_by(stride).collect();
            let values: Vec<f64> = rows
                .iter()
                .flat_map(|&r| cols.iter().map(move |&c| (r, c)))
                .map(|(r, c)| field.z[[r, c]])
                .collect();
            let (x0, y0) = (field.x[0], field.y[0]);
            let (x1, y1) = (field.x[cols[cols.len() - 1]], field.y[rows[rows.len() - 1]]);
            fg.axes3d()
                .set_title("3D surface", &[])
                .set_x_label("x", &[])
                .set_y_label("y", &[])
                .set_z_label("z", &[])
                .surface(values.iter(), rows.len(), cols.len(), Some((x0, y0, x1, y1)), &[]);
        }

        let axes = fg.axes2d();
        axes.set_title("contour lines", &[]).set_x_label("x", &[]).set_y_label("y", &[]);
        for (i, level) in scene.levels.iter().enumerate() {
            let hex = scene.colormap.hex(scene.level_position(i));
            let caption = format!("{:.3}", level);
            for (k, line) in stitch_segments(&contour_segments(field, *level)).iter().enumerate() {
                let xs: Vec<f64> = line.iter().map(|p| p.0).collect();
                let ys: Vec<f64> = line.iter().map(|p| p.1).collect();
                // one legend entry per level
                let label = if k == 0 { caption.as_str() } else { "" };
                axes.lines(
                    &xs,
                    &ys,
                    &[
                        gnuplot::Caption(label),
                        gnuplot::Color(gnuplot::RGBString(hex.as_str())),
                        gnuplot::LineStyle(scene.line_style.dash_type()),
                        gnuplot::LineWidth(1.5),
                    ],
                );
            }
        }
        for marker in &scene.markers {
            let (r, g, b) = marker.kind.rgb();
            let hex = format!("#{:02x}{:02x}{:02x}", r, g, b);
            axes.points(
                &[marker.x],
                &[marker.y],
                &[
                    gnuplot::Caption(marker.label.as_str()),
                    gnuplot::Color(gnuplot::RGBString(hex.as_str())),
                    gnuplot::PointSymbol('O'),
                    gnuplot::PointSize(1.5),
                ],
            );
        }
        fg
    }
}

impl Renderer for GnuplotRenderer {
    fn render(&mut self, scene: &Scene, target: &RenderTarget) -> Result<(), RenderError> {
        if let RenderTarget::Png(_) = target {
            return Err(RenderError::Backend("the gnuplot renderer only opens windows".to_string()));
        }
        let mut fg = self.figure(scene);
        fg.show()
            .map_err(|e| RenderError::Backend(format!("gnuplot could not be started: {:?}", e)))?;
        Ok(())
    }
}

/// PNG files through plotters, windows through gnuplot.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRenderer {
    png: PngRenderer,
    window: GnuplotRenderer,
}

impl Renderer for DefaultRenderer {
    fn render(&mut self, scene: &Scene, target: &RenderTarget) -> Result<(), RenderError> {
        if scene.levels.is_empty() {
            warn!("no contour level lies inside the sampled range");
        }
        match target {
            RenderTarget::Png(_) => self.png.render(scene, target),
            RenderTarget::Window => self.window.render(scene, target),
        }
    }
}
