//! Run settings read from the task document (see `Utils::task_parser`).
//!
//! ```text
//! plot
//!  x_range: 0, 10
//!  y_range: -5, 5
//!  resolution: 400
//!  levels: 0.1, 0.4, 0.7
//!  colormap: viridis
//!  line_style: -
//!  csv_output: grid.csv
//! session
//!  variant: interactive
//!  loglevel: info
//!  log_file: false
//!  engine: native
//! analysis
//!  timeout_ms: 2000
//!  seeds: 9
//! ```
//! Every key is optional.
use crate::Utils::logger::parse_loglevel;
use crate::Utils::plots::{Colormap, Levels, LineStyle};
use crate::Utils::task_parser::{DocumentMap, Value, parse_document_as};
use crate::errors::ConfigError;
use crate::numerical::critical_points::AnalysisOptions;
use crate::numerical::sampler::DEFAULT_RESOLUTION;
use crate::symbolic::symbolic_traits::SymbolicEngineType;
use log::{LevelFilter, info};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{Display, EnumIter, EnumString};

/// read from the working directory when no path is given
pub const DEFAULT_SETTINGS_FILE: &str = "plot_settings.txt";

/// The three flavours of the plotting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Variant {
    /// contour lines only; asks for saving, colormap and line style
    Contour2D,
    /// 3D surface next to the contour lines; asks for a save path
    Combined,
    /// surface and contours with extrema markers, prints the analysis
    #[default]
    Interactive,
}

impl Variant {
    pub fn default_levels(&self) -> Levels {
        match self {
            Variant::Contour2D => Levels::Fixed(vec![0.1, 0.2, 0.4, 0.6, 0.8, 1.0]),
            Variant::Combined => Levels::Fixed(vec![0.1, 0.4, 0.7, 1.0, 1.2, 1.4, 1.8]),
            Variant::Interactive => Levels::Auto(10),
        }
    }

    pub fn default_colormap(&self) -> Colormap {
        match self {
            Variant::Interactive => Colormap::Inferno,
            _ => Colormap::Viridis,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub resolution: usize,
    pub levels: Option<Levels>,       // None: the variant's own levels
    pub colormap: Option<Colormap>,   // None: the variant's own colormap
    pub line_style: LineStyle,
    pub csv_output: Option<PathBuf>,
    pub variant: Variant,
    pub loglevel: LevelFilter,
    pub log_file: bool,
    pub engine: SymbolicEngineType,
    pub timeout: Duration,
    pub seeds_per_axis: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            x_range: (0.0, 10.0),
            y_range: (-5.0, 5.0),
            resolution: DEFAULT_RESOLUTION,
            levels: None,
            colormap: None,
            line_style: LineStyle::Solid,
            csv_output: None,
            variant: Variant::default(),
            loglevel: LevelFilter::Info,
            log_file: false,
            engine: SymbolicEngineType::Native,
            timeout: Duration::from_secs(2),
            seeds_per_axis: 9,
        }
    }
}

////////////////////////////////VALUE HELPERS/////////////////////////////////////////
fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), reason: reason.into() }
}

fn single<'a>(key: &str, values: &'a [Value]) -> Result<&'a Value, ConfigError> {
    match values {
        [value] => Ok(value),
        _ => Err(invalid(key, format!("expected one value, got {}", values.len()))),
    }
}

fn range(key: &str, values: &[Value]) -> Result<(f64, f64), ConfigError> {
    let bounds: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    match bounds[..] {
        [lo, hi] if bounds.len() == values.len() && lo.is_finite() && hi.is_finite() && lo < hi => {
            Ok((lo, hi))
        }
        _ => Err(invalid(key, "expected two increasing numbers, e.g. 0, 10")),
    }
}

fn integer_at_least(key: &str, values: &[Value], min: i64) -> Result<usize, ConfigError> {
    match single(key, values)?.as_integer() {
        Some(n) if n >= min => Ok(n as usize),
        _ => Err(invalid(key, format!("expected an integer >= {}", min))),
    }
}

/// strum-parsed names
fn named<T: FromStr>(key: &str, values: &[Value]) -> Result<T, ConfigError> {
    let text = single(key, values)?.to_string();
    T::from_str(&text).map_err(|_| invalid(key, format!("unknown name '{}'", text)))
}

/// `auto`, a single integer n (n automatic levels) or a list of level values.
fn levels(key: &str, values: &[Value]) -> Result<Levels, ConfigError> {
    match values {
        [Value::String(s)] if s.eq_ignore_ascii_case("auto") => Ok(Levels::default()),
        [Value::Integer(n)] if *n >= 2 => Ok(Levels::Auto(*n as usize)),
        [Value::Integer(_)] => Err(invalid(key, "at least 2 automatic levels are needed")),
        _ => {
            let fixed: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            if fixed.is_empty() || fixed.len() != values.len() {
                return Err(invalid(key, "expected numbers, a level count or 'auto'"));
            }
            Ok(Levels::Fixed(fixed))
        }
    }
}

impl PlotConfig {
    pub fn from_document(doc: &DocumentMap) -> Result<Self, ConfigError> {
        let mut config = PlotConfig::default();
        for (section, map) in doc {
            for (key, values) in map {
                let k = key.as_str();
                match (section.as_str(), k) {
                    ("plot", "x_range") => config.x_range = range(k, values)?,
                    ("plot", "y_range") => config.y_range = range(k, values)?,
                    ("plot", "resolution") => config.resolution = integer_at_least(k, values, 2)?,
                    ("plot", "levels") => config.levels = Some(levels(k, values)?),
                    ("plot", "colormap") => config.colormap = Some(named(k, values)?),
                    ("plot", "line_style") => config.line_style = named(k, values)?,
                    ("plot", "csv_output") => {
                        config.csv_output = Some(PathBuf::from(single(k, values)?.to_string()))
                    }
                    ("session", "variant") => config.variant = named(k, values)?,
                    ("session", "loglevel") => {
                        let text = single(k, values)?.to_string();
                        config.loglevel = parse_loglevel(&text)
                            .ok_or_else(|| invalid(k, format!("unknown level '{}'", text)))?;
                    }
                    ("session", "log_file") => {
                        config.log_file = single(k, values)?
                            .as_boolean()
                            .ok_or_else(|| invalid(k, "expected true or false"))?;
                    }
                    ("session", "engine") => config.engine = named(k, values)?,
                    ("analysis", "timeout_ms") => {
                        config.timeout = Duration::from_millis(integer_at_least(k, values, 0)? as u64)
                    }
                    ("analysis", "seeds") => config.seeds_per_axis = integer_at_least(k, values, 2)?,
                    _ => {
                        return Err(ConfigError::UnknownKey { section: section.clone(), key: key.clone() });
                    }
                }
            }
        }
        Ok(config)
    }

    /// Reads `path`, or `plot_settings.txt` when it exists. No file at all means defaults;
    /// an explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !default.exists() {
                    return Ok(PlotConfig::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_str(&content)?;
        info!("settings read from {}", path.display());
        Ok(config)
    }

    pub fn levels(&self) -> Levels {
        self.levels.clone().unwrap_or_else(|| self.variant.default_levels())
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap.unwrap_or_else(|| self.variant.default_colormap())
    }

    /// Solver settings: seeds spread over the plot domain.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            x_range: self.x_range,
            y_range: self.y_range,
            seeds_per_axis: self.seeds_per_axis,
            timeout: self.timeout,
            ..AnalysisOptions::default()
        }
    }
}

impl FromStr for PlotConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::from_document(&parse_document_as(content)?)
    }
}
