//! Style accessors: scales that turn column values into visual attributes.
//!
//! Scales are plain value objects (domain, range, kind) so they can be
//! inspected, serialized next to the graph model and turned into legends.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::normalize::CanonicalData;

pub const EDGE_WIDTH_RANGE: (f64, f64) = (1.0, 7.0);
pub const DEFAULT_EDGE_WIDTH: f64 = 1.0;
pub const NODE_RADIUS_RANGE: (f64, f64) = (1.0, 70.0);
pub const DEFAULT_NODE_RADIUS: f64 = 2.0;
pub const EDGE_COLOR_RANGE: (Color, Color) = (Color::WHITE_SMOKE, Color::BLACK);
pub const DEFAULT_EDGE_COLOR: &str = "dimgray";
/// Colors assigned to categories, most frequent category first.
pub const NODE_PALETTE: [&str; 5] = ["#0800FF", "#C900C8", "#5FE81B", "#FD3800", "#F04BB0"];
/// Node types used when no node color column is mapped.
pub const NODE_TYPES: [&str; 2] = ["parent", "child"];
pub const LEGEND_STEP: f64 = 10.0;
/// Most entries a continuous legend has; wider domains get a coarser step.
pub const LEGEND_MAX_ENTRIES: usize = 20;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE_SMOKE: Color = Color::rgb(245, 245, 245);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise interpolation; `t` outside `[0, 1]` extrapolates and the
    /// channels saturate.
    pub fn interpolate(&self, other: &Color, t: f64) -> Color {
        let channel = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Color {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }

    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Normalized position of `x` in `domain`. A zero-width domain maps
/// everything to the middle of the range.
fn normalize(domain: (f64, f64), x: f64) -> f64 {
    let width = domain.1 - domain.0;
    if width == 0.0 {
        0.5
    } else {
        (x - domain.0) / width
    }
}

fn column_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NumericScale {
    Constant { value: f64 },
    Linear { domain: (f64, f64), range: (f64, f64) },
}

impl NumericScale {
    /// Linear `[0, max(values)] -> range` when the column is usable, else a
    /// constant `default`.
    pub fn build(values: &[f64], usable: bool, range: (f64, f64), default: f64) -> Self {
        match (usable, column_max(values)) {
            (true, Some(max)) => NumericScale::Linear {
                domain: (0.0, max),
                range,
            },
            _ => NumericScale::Constant { value: default },
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            NumericScale::Constant { value } => *value,
            NumericScale::Linear { domain, range } => {
                range.0 + normalize(*domain, x) * (range.1 - range.0)
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, NumericScale::Constant { .. })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ColorScale {
    Constant {
        color: String,
    },
    Linear {
        domain: (f64, f64),
        from: Color,
        to: Color,
    },
    Ordinal {
        domain: Vec<String>,
        palette: Vec<String>,
    },
}

impl ColorScale {
    /// Linear color scale over `[0, max(values)]` when the column is usable,
    /// else the constant `default` color.
    pub fn continuous(values: &[f64], usable: bool, range: (Color, Color), default: &str) -> Self {
        match (usable, column_max(values)) {
            (true, Some(max)) => ColorScale::Linear {
                domain: (0.0, max),
                from: range.0,
                to: range.1,
            },
            _ => ColorScale::Constant {
                color: default.to_string(),
            },
        }
    }

    /// Ordinal scale over the distinct categories, most frequent first
    /// (ties keep first-appearance order).
    pub fn categorical<S: AsRef<str>>(values: &[S]) -> Self {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for value in values {
            *counts.entry(value.as_ref()).or_default() += 1;
        }
        // stable sort keeps first-appearance order for equal counts
        counts.sort_by(|_, a, _, b| b.cmp(a));

        ColorScale::Ordinal {
            domain: counts.keys().map(|k| k.to_string()).collect(),
            palette: NODE_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The `parent`/`child` scale used when nodes are colored by degree.
    pub fn node_types() -> Self {
        ColorScale::Ordinal {
            domain: NODE_TYPES.iter().map(|t| t.to_string()).collect(),
            palette: NODE_PALETTE[..NODE_TYPES.len()]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }

    pub fn map_number(&self, x: f64) -> String {
        match self {
            ColorScale::Constant { color } => color.clone(),
            ColorScale::Linear { domain, from, to } => {
                from.interpolate(to, normalize(*domain, x)).to_css()
            }
            ColorScale::Ordinal { .. } => self.map_category(&format_number(x)),
        }
    }

    /// Categories past the end of the palette cycle through it again.
    /// Categories outside the domain get the default edge color.
    pub fn map_category(&self, key: &str) -> String {
        match self {
            ColorScale::Constant { color } => color.clone(),
            ColorScale::Linear { from, .. } => match key.trim().parse::<f64>() {
                Ok(x) => self.map_number(x),
                Err(_) => from.to_css(),
            },
            ColorScale::Ordinal { domain, palette } => {
                match (domain.iter().position(|d| d == key), palette.len()) {
                    (Some(position), len) if len > 0 => palette[position % len].clone(),
                    _ => DEFAULT_EDGE_COLOR.to_string(),
                }
            }
        }
    }

    /// Legend entries: one per category for ordinal scales, one per
    /// `LEGEND_STEP` bucket of the domain for linear scales, none otherwise.
    /// A linear legend has at most `LEGEND_MAX_ENTRIES` entries.
    pub fn legend(&self) -> Vec<LegendEntry> {
        match self {
            ColorScale::Constant { .. } => Vec::new(),
            ColorScale::Linear { domain, .. } => {
                let (start, stop) = *domain;
                let step = legend_step(stop - start);
                let steps = ((stop - start) / step).ceil();
                if !steps.is_finite() || steps <= 0.0 {
                    return Vec::new();
                }
                (0..(steps as usize).min(LEGEND_MAX_ENTRIES))
                    .map(|i| {
                        let value = start + i as f64 * step;
                        LegendEntry {
                            label: format_number(value),
                            value: number_value(value),
                            color: self.map_number(value),
                        }
                    })
                    .collect()
            }
            ColorScale::Ordinal { domain, .. } => domain
                .iter()
                .map(|category| LegendEntry {
                    label: category.clone(),
                    value: Value::String(category.clone()),
                    color: self.map_category(category),
                })
                .collect(),
        }
    }
}

/// `LEGEND_STEP`, or a multiple of it wide enough to cover `width` in
/// `LEGEND_MAX_ENTRIES` steps.
fn legend_step(width: f64) -> f64 {
    let cap = LEGEND_MAX_ENTRIES as f64;
    if width / LEGEND_STEP <= cap {
        return LEGEND_STEP;
    }
    let step = (width / cap / LEGEND_STEP).ceil() * LEGEND_STEP;
    warn!(
        "Color domain [0, {}] is too wide for a legend step of {}, using {}",
        format_number(width),
        LEGEND_STEP,
        format_number(step)
    );
    step
}

fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

/// JSON number for `x`, integral values without a fraction.
pub fn number_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        Value::from(x as i64)
    } else {
        serde_json::Number::from_f64(x)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub value: Value,
    pub color: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegendDescription {
    pub node_color: Vec<LegendEntry>,
    pub edge_color: Vec<LegendEntry>,
    pub node_color_label: Option<String>,
    pub edge_color_label: Option<String>,
}

/// The four scales used to style a graph model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleAccessors {
    pub edge_width: NumericScale,
    pub edge_color: ColorScale,
    pub node_radius: NumericScale,
    pub node_color: ColorScale,
}

impl Default for StyleAccessors {
    fn default() -> Self {
        Self {
            edge_width: NumericScale::Constant {
                value: DEFAULT_EDGE_WIDTH,
            },
            edge_color: ColorScale::Constant {
                color: DEFAULT_EDGE_COLOR.to_string(),
            },
            node_radius: NumericScale::Constant {
                value: DEFAULT_NODE_RADIUS,
            },
            node_color: ColorScale::node_types(),
        }
    }
}

impl StyleAccessors {
    pub fn legend(&self, data: &CanonicalData) -> LegendDescription {
        LegendDescription {
            node_color: self.node_color.legend(),
            edge_color: self.edge_color.legend(),
            node_color_label: data.mapping.node_color.name().map(str::to_string),
            edge_color_label: data.mapping.edge_color.name().map(str::to_string),
        }
    }
}

/// Build all accessors from the full canonical dataset.
pub fn build_accessors(data: &CanonicalData) -> StyleAccessors {
    let mapping = &data.mapping;
    let widths: Vec<f64> = data.edges.iter().map(|e| e.edge_width).collect();
    let strokes: Vec<f64> = data.edges.iter().map(|e| e.edge_color).collect();
    let radii: Vec<f64> = data.nodes.iter().map(|n| n.node_radius).collect();

    let node_color = if mapping.node_color.is_present() && data.has_node_table() {
        let categories: Vec<&str> = data.nodes.iter().map(|n| n.node_color.as_str()).collect();
        ColorScale::categorical(categories.as_slice())
    } else {
        ColorScale::node_types()
    };

    let accessors = StyleAccessors {
        edge_width: NumericScale::build(
            &widths,
            mapping.edge_width.is_present() && data.numeric.edge_width,
            EDGE_WIDTH_RANGE,
            DEFAULT_EDGE_WIDTH,
        ),
        edge_color: ColorScale::continuous(
            &strokes,
            mapping.edge_color.is_present() && data.numeric.edge_color,
            EDGE_COLOR_RANGE,
            DEFAULT_EDGE_COLOR,
        ),
        node_radius: NumericScale::build(
            &radii,
            mapping.node_radius.is_present() && data.numeric.node_radius,
            NODE_RADIUS_RANGE,
            DEFAULT_NODE_RADIUS,
        ),
        node_color,
    };
    debug!("Built style accessors: {:?}", accessors);
    accessors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_width_scale() {
        let scale = NumericScale::build(&[5.0, 3.0], true, EDGE_WIDTH_RANGE, DEFAULT_EDGE_WIDTH);
        assert_eq!(
            scale,
            NumericScale::Linear {
                domain: (0.0, 5.0),
                range: (1.0, 7.0)
            }
        );
        assert_eq!(scale.apply(0.0), 1.0);
        assert_eq!(scale.apply(5.0), 7.0);
        assert!((scale.apply(2.5) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_unusable_column_is_constant() {
        let scale = NumericScale::build(&[5.0, 3.0], false, EDGE_WIDTH_RANGE, DEFAULT_EDGE_WIDTH);
        assert!(scale.is_constant());
        assert_eq!(scale.apply(5.0), 1.0);
        assert_eq!(scale.apply(3.0), 1.0);
    }

    #[test]
    fn test_zero_width_domain_maps_to_middle() {
        let scale = NumericScale::build(&[0.0, 0.0], true, EDGE_WIDTH_RANGE, DEFAULT_EDGE_WIDTH);
        assert_eq!(scale.apply(0.0), 4.0);
    }

    #[test]
    fn test_color_interpolation() {
        let scale = ColorScale::continuous(&[100.0], true, EDGE_COLOR_RANGE, DEFAULT_EDGE_COLOR);
        assert_eq!(scale.map_number(0.0), "rgb(245, 245, 245)");
        assert_eq!(scale.map_number(100.0), "rgb(0, 0, 0)");
        assert_eq!(scale.map_number(50.0), "rgb(123, 123, 123)");
    }

    #[test]
    fn test_continuous_legend_steps_by_ten() {
        let scale = ColorScale::continuous(&[25.0], true, EDGE_COLOR_RANGE, DEFAULT_EDGE_COLOR);
        let legend = scale.legend();
        let labels: Vec<&str> = legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "10", "20"]);
        assert_eq!(legend[0].color, "rgb(245, 245, 245)");
    }

    #[test]
    fn test_wide_domain_legend_is_capped() {
        let scale = ColorScale::continuous(&[2.0e7], true, EDGE_COLOR_RANGE, DEFAULT_EDGE_COLOR);
        let legend = scale.legend();
        assert_eq!(legend.len(), LEGEND_MAX_ENTRIES);
        assert_eq!(legend[1].label, "1000000");
        assert_eq!(legend[19].value, serde_json::json!(19_000_000));

        let huge = ColorScale::continuous(&[1.0e300], true, EDGE_COLOR_RANGE, DEFAULT_EDGE_COLOR);
        let legend = huge.legend();
        assert!(!legend.is_empty());
        assert!(legend.len() <= LEGEND_MAX_ENTRIES);
        assert_eq!(legend[0].label, "0");
    }

    #[test]
    fn test_legend_at_the_cap_keeps_step() {
        let scale = ColorScale::continuous(&[200.0], true, EDGE_COLOR_RANGE, DEFAULT_EDGE_COLOR);
        let legend = scale.legend();
        assert_eq!(legend.len(), 20);
        assert_eq!(legend[19].label, "190");
    }

    #[test]
    fn test_constant_color_has_no_legend() {
        let scale = ColorScale::continuous(&[25.0], false, EDGE_COLOR_RANGE, DEFAULT_EDGE_COLOR);
        assert_eq!(scale.map_number(25.0), "dimgray");
        assert!(scale.legend().is_empty());
    }

    #[test]
    fn test_categorical_orders_by_frequency() {
        let scale = ColorScale::categorical(&["b", "a", "a", "c", "a", "b"]);
        match &scale {
            ColorScale::Ordinal { domain, .. } => assert_eq!(domain, &vec!["a", "b", "c"]),
            other => panic!("expected ordinal scale, got {:?}", other),
        }
        assert_eq!(scale.map_category("a"), NODE_PALETTE[0]);
        assert_eq!(scale.map_category("c"), NODE_PALETTE[2]);
    }

    #[test]
    fn test_palette_cycles_past_five_categories() {
        let categories = ["a", "b", "c", "d", "e", "f", "g"];
        let scale = ColorScale::categorical(&categories);
        assert_eq!(scale.map_category("f"), NODE_PALETTE[0]);
        assert_eq!(scale.map_category("g"), NODE_PALETTE[1]);
        assert_eq!(scale.legend().len(), 7);
    }

    #[test]
    fn test_node_type_scale() {
        let scale = ColorScale::node_types();
        assert_eq!(scale.map_category("parent"), "#0800FF");
        assert_eq!(scale.map_category("child"), "#C900C8");
        assert_eq!(scale.map_category("unknown"), DEFAULT_EDGE_COLOR);
    }

    #[test]
    fn test_scale_serializes_with_kind_tag() {
        let json = serde_json::to_value(NumericScale::Constant { value: 2.0 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "constant", "value": 2.0}));
    }
}
