//! Chart specifications and their Plotly figure JSON.

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
    HorizontalBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "scale")]
pub enum ChartColor {
    Plain,
    /// Bars shaded by value on the named Plotly color scale.
    Continuous(&'static str),
    /// One trace, and one legend entry, per category.
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: &'static str,
    pub heading: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub color: ChartColor,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Plotly figure (`data` + `layout`) for this chart.
    pub fn to_figure(&self) -> Value {
        let labels = self.labels();
        let values = self.values();

        let data = match self.kind {
            ChartKind::Pie => vec![json!({
                "type": "pie",
                "labels": labels,
                "values": values,
            })],
            ChartKind::Line => vec![json!({
                "type": "scatter",
                "mode": "lines+markers",
                "x": labels,
                "y": values,
            })],
            ChartKind::Bar | ChartKind::HorizontalBar => self.bar_traces(&labels, &values),
        };

        let mut layout = json!({
            "title": { "text": self.title },
            "margin": { "t": 48, "r": 16, "b": 48, "l": 16 },
            "autosize": true,
        });
        match self.kind {
            ChartKind::Pie => {}
            ChartKind::HorizontalBar => {
                layout["xaxis"] = json!({ "title": { "text": self.x_label } });
                layout["yaxis"] = json!({
                    "title": { "text": self.y_label },
                    "categoryorder": "total ascending",
                    "automargin": true,
                });
            }
            _ => {
                layout["xaxis"] = json!({ "title": { "text": self.x_label }, "automargin": true });
                layout["yaxis"] = json!({ "title": { "text": self.y_label } });
            }
        }
        if self.color == ChartColor::Categorical {
            layout["showlegend"] = json!(true);
        }

        json!({ "data": data, "layout": layout })
    }

    fn bar_traces(&self, labels: &[&str], values: &[f64]) -> Vec<Value> {
        let horizontal = self.kind == ChartKind::HorizontalBar;
        let orient = |label: Value, value: Value| {
            if horizontal {
                json!({ "type": "bar", "orientation": "h", "x": value, "y": label })
            } else {
                json!({ "type": "bar", "x": label, "y": value })
            }
        };

        match &self.color {
            ChartColor::Categorical => labels
                .iter()
                .zip(values)
                .map(|(label, value)| {
                    let mut trace = orient(json!([label]), json!([value]));
                    trace["name"] = json!(label);
                    trace
                })
                .collect(),
            ChartColor::Continuous(scale) => {
                let mut trace = orient(json!(labels), json!(values));
                trace["marker"] = json!({
                    "color": values,
                    "colorscale": scale,
                    "showscale": true,
                });
                vec![trace]
            }
            ChartColor::Plain => vec![orient(json!(labels), json!(values))],
        }
    }
}
