//! One interactive plotting run: read an expression, fix the extra variables, compile,
//! sample, analyse (annotated variant) and render.
//!
//! The free functions `validate` and `compile` are the expression pipeline on its own:
//! ```
//! use RustedContours::session::{compile, validate, FixedVariableSet};
//! assert!(validate("x**2 + y**2"));
//! assert!(!validate("x +* y"));
//! let mut fixed = FixedVariableSet::new();
//! fixed.insert("z".to_string(), 1.0);
//! let f = compile("x*y + z", &fixed).unwrap();
//! assert_eq!(f.eval(2.0, 3.0), 7.0);
//! ```
pub mod settings;
pub mod variable_fixer;

pub use settings::{PlotConfig, Variant};
pub use variable_fixer::{FixedVariableSet, collect_fixed_variables, parse_fix_entry};

use crate::Utils::plots::{
    Layout, LineStyle, Marker, MarkerKind, RenderTarget, Renderer, Scene, resolve_levels,
};
use crate::errors::{CompileError, RenderError, SessionError};
use crate::numerical::critical_points::{analyze, critical_points_table};
use crate::numerical::sampler::{SampledField, gradient_magnitude, sample};
use crate::symbolic::symbolic_lambdify::BivariateFunction;
use crate::symbolic::symbolic_limits::LimitPoint;
use crate::symbolic::symbolic_traits::{NativeEngine, SymbolicEngine, get_symbolic_engine};
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// default image name of the contour-only variant
pub const DEFAULT_IMAGE_NAME: &str = "GLC.png";

/// True when the engine can parse `raw`. Unknown symbols are fine here.
pub fn validate(raw: &str) -> bool {
    validate_with(&NativeEngine, raw)
}

pub fn validate_with(engine: &dyn SymbolicEngine, raw: &str) -> bool {
    engine.parse(raw).is_ok()
}

/// Parses `raw`, substitutes the fixed variables and binds what is left to `(x, y)`.
pub fn compile(raw: &str, fixed: &FixedVariableSet) -> Result<BivariateFunction, CompileError> {
    compile_with(&NativeEngine, raw, fixed)
}

pub fn compile_with(
    engine: &dyn SymbolicEngine,
    raw: &str,
    fixed: &FixedVariableSet,
) -> Result<BivariateFunction, CompileError> {
    let parsed = engine.parse(raw)?;
    let expr = engine.simplify(&engine.substitute(&parsed, fixed));
    let unresolved: Vec<String> = engine
        .free_symbols(&expr)
        .into_iter()
        .filter(|name| name != "x" && name != "y")
        .collect();
    if !unresolved.is_empty() {
        return Err(CompileError::Substitution { unresolved });
    }
    engine.lambdify(&expr)
}

fn show_instructions<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Contour and surface plotter")?;
    writeln!(out, "Type a function of x and y; other variables (z, a, ...) are fixed afterwards.")?;
    writeln!(out, "  - operators: + - * /, and ** or ^ for powers")?;
    writeln!(out, "  - functions: sin cos tan exp log sqrt abs asin acos atan ...; constants pi and E")?;
    writeln!(out, "  - type only the expression, without 'f(x, y) ='")?;
    writeln!(out, "Examples: sqrt(x) + y + z, x**2 + y**2, sin(x) * cos(y) * z, exp(-x**2 - y**2 + z)")?;
    Ok(())
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> Result<String, SessionError> {
    write!(out, "{}", text)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Parses `answer`, or falls back to `default` (empty answer, or an unknown name with a warning).
fn choice<T: FromStr + Copy + std::fmt::Display>(answer: &str, default: T, what: &str) -> T {
    if answer.is_empty() {
        return default;
    }
    T::from_str(answer).unwrap_or_else(|_| {
        warn!("unknown {} '{}', using {}", what, answer, default);
        default
    })
}

pub struct Session {
    config: PlotConfig,
    engine: &'static dyn SymbolicEngine,
    raw_expression: Option<String>,
    fixed: FixedVariableSet,
    function: Option<BivariateFunction>,
}

impl Session {
    pub fn new(config: PlotConfig) -> Self {
        let engine = get_symbolic_engine(config.engine);
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: PlotConfig, engine: &'static dyn SymbolicEngine) -> Self {
        Session { config, engine, raw_expression: None, fixed: FixedVariableSet::new(), function: None }
    }

    ////////////////////////////////GETTERS///////////////////////////////////////////
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }
    pub fn raw_expression(&self) -> Option<&str> {
        self.raw_expression.as_deref()
    }
    pub fn fixed_variables(&self) -> &FixedVariableSet {
        &self.fixed
    }
    pub fn function(&self) -> Option<&BivariateFunction> {
        self.function.as_ref()
    }

    /// The whole dialogue. Prompts go to `out`, answers come from `input`.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
        renderer: &mut dyn Renderer,
    ) -> Result<(), SessionError> {
        show_instructions(out)?;
        let raw = prompt(input, out, "\nEnter the function (use x and y as the plot variables): ")?;
        self.raw_expression = Some(raw.clone());
        if let Err(error) = self.engine.parse(&raw) {
            return Err(SessionError::InvalidExpression { raw, error });
        }
        self.fixed = collect_fixed_variables(input, out)?;
        let function = compile_with(self.engine, &raw, &self.fixed)?;
        info!("compiled f(x, y) = {}", function.expr());

        let field = sample(&function, self.config.x_range, self.config.y_range, self.config.resolution);
        if let Some(path) = &self.config.csv_output {
            if let Err(e) = field.save_csv(path) {
                warn!("could not write {}: {}", path.display(), e);
            }
        }
        let result = match self.config.variant {
            Variant::Contour2D => self.run_contour2d(input, out, renderer, &function, &field),
            Variant::Combined => self.run_combined(input, out, renderer, &function, &field),
            Variant::Interactive => self.run_interactive(out, renderer, &function, &field),
        };
        self.function = Some(function);
        result
    }

    fn scene<'a>(&self, function: &BivariateFunction, field: &'a SampledField, layout: Layout) -> Result<Scene<'a>, RenderError> {
        Ok(Scene {
            title: format!("f(x, y) = {}", self.engine.pretty(function.expr())),
            field,
            layout,
            levels: resolve_levels(&self.config.levels(), field)?,
            colormap: self.config.colormap(),
            line_style: self.config.line_style,
            markers: Vec::new(),
            annotations: Vec::new(),
        })
    }

    fn run_contour2d<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
        renderer: &mut dyn Renderer,
        function: &BivariateFunction,
        field: &SampledField,
    ) -> Result<(), SessionError> {
        let save = prompt(input, out, "Save the plot as an image? (Y/N): ")?;
        let save_path = if save.to_lowercase().starts_with('y') {
            let name = prompt(input, out, &format!("File name [{}]: ", DEFAULT_IMAGE_NAME))?;
            Some(PathBuf::from(if name.is_empty() { DEFAULT_IMAGE_NAME.to_string() } else { name }))
        } else {
            None
        };
        let default_colormap = self.config.colormap();
        let answer = prompt(input, out, &format!("Colormap (viridis, plasma, inferno, magma, cividis) [{}]: ", default_colormap))?;
        let colormap = choice(&answer, default_colormap, "colormap");
        let default_style = self.config.line_style;
        let answer = prompt(input, out, &format!("Line style (-, --, -., :) [{}]: ", default_style))?;
        let line_style: LineStyle = choice(&answer, default_style, "line style");

        let mut scene = self.scene(function, field, Layout::ContourOnly)?;
        scene.colormap = colormap;
        scene.line_style = line_style;
        if let Some(path) = save_path {
            renderer.render(&scene, &RenderTarget::Png(path.clone()))?;
            writeln!(out, "Plot saved to {}", path.display())?;
        }
        show(renderer, &scene, out)
    }

    fn run_combined<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
        renderer: &mut dyn Renderer,
        function: &BivariateFunction,
        field: &SampledField,
    ) -> Result<(), SessionError> {
        let path = prompt(input, out, "Path to save the plot (e.g. my_plot.png), or press Enter to skip: ")?;
        let scene = self.scene(function, field, Layout::SurfaceAndContour)?;
        if !path.is_empty() {
            let path = PathBuf::from(path);
            renderer.render(&scene, &RenderTarget::Png(path.clone()))?;
            writeln!(out, "Plot saved to {}", path.display())?;
        }
        show(renderer, &scene, out)
    }

    /// Prints the equation, the partial derivatives, the critical points and the limits,
    /// then shows the surface with the grid extrema and the critical points marked.
    fn run_interactive<W: Write>(
        &self,
        out: &mut W,
        renderer: &mut dyn Renderer,
        function: &BivariateFunction,
        field: &SampledField,
    ) -> Result<(), SessionError> {
        let engine = self.engine;
        let expr = function.expr();
        let equation = format!("f(x, y) = {}", engine.pretty(expr));
        writeln!(out, "\n{}", equation)?;

        let analysis = analyze(engine, expr, "x", "y", &self.config.analysis_options());
        writeln!(out, "df/dx = {}", engine.pretty(&analysis.fx))?;
        writeln!(out, "df/dy = {}", engine.pretty(&analysis.fy))?;
        match (&analysis.failure, analysis.points.is_empty()) {
            (Some(failure), _) => writeln!(out, "Critical points: {}", failure)?,
            (None, true) => writeln!(out, "Critical points: none found")?,
            (None, false) => writeln!(out, "Critical points:\n{}", critical_points_table(&analysis.points))?,
        }

        if let (Ok(fx), Ok(fy)) = (engine.lambdify(&analysis.fx), engine.lambdify(&analysis.fy)) {
            let grad = gradient_magnitude(&fx, &fy, field);
            let max = grad.iter().copied().filter(|g| g.is_finite()).fold(f64::NAN, f64::max);
            if max.is_finite() {
                writeln!(out, "max |grad f| on the grid = {:.6}", max)?;
            }
        }

        writeln!(out, "Limits:")?;
        for (var, point) in [
            ("x", LimitPoint::PosInfinity),
            ("x", LimitPoint::NegInfinity),
            ("y", LimitPoint::PosInfinity),
            ("y", LimitPoint::NegInfinity),
        ] {
            writeln!(out, "  lim {}->{} f = {}", var, point, engine.limit(expr, var, point))?;
        }
        writeln!(out, "  lim y->0 lim x->0 f = {}", engine.iterated_limit(expr, "x", 0.0, "y", 0.0))?;

        let mut scene = self.scene(function, field, Layout::SurfaceAndContour)?;
        if let Some(((x0, y0, min), (x1, y1, max))) = field.finite_extrema() {
            scene.markers.push(Marker { x: x0, y: y0, z: min, kind: MarkerKind::GlobalMin, label: format!("min {:.3}", min) });
            scene.markers.push(Marker { x: x1, y: y1, z: max, kind: MarkerKind::GlobalMax, label: format!("max {:.3}", max) });
        }
        let (xr, yr) = (self.config.x_range, self.config.y_range);
        for p in analysis.points.iter().filter(|p| (xr.0..=xr.1).contains(&p.x) && (yr.0..=yr.1).contains(&p.y)) {
            scene.markers.push(Marker {
                x: p.x,
                y: p.y,
                z: p.value,
                kind: MarkerKind::Critical(p.classification),
                label: p.classification.to_string(),
            });
        }
        scene.annotations.push(equation);
        show(renderer, &scene, out)
    }
}

/// A window that cannot be opened (no display, no gnuplot) is reported, not fatal.
fn show<W: Write>(renderer: &mut dyn Renderer, scene: &Scene, out: &mut W) -> Result<(), SessionError> {
    if let Err(e) = renderer.render(scene, &RenderTarget::Window) {
        warn!("{}", e);
        writeln!(out, "Could not open a plot window: {}", e)?;
    }
    Ok(())
}
