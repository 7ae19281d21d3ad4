use serde::{Deserialize, Serialize};

/// How an insight is meant to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightComponent {
    SimpleDisplay,
    BarChart,
    SimpleTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSize {
    Small,
    Default,
}

/// A single rendered value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Number(value) => write!(f, "{value}"),
            ScalarValue::Text(value) => f.write_str(value),
        }
    }
}

/// One bar: a category and its count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarDatum {
    #[serde(rename = "questionType")]
    pub category: String,
    #[serde(rename = "totalQuestions")]
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartOutput {
    pub data: Vec<BarDatum>,
    pub x_field: String,
    pub y_field: String,
    pub series_field: String,
    pub x_axis_name: String,
    pub y_axis_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub title: String,
    pub data_index: String,
    pub key: String,
}

impl TableColumn {
    pub fn new(title: &str, data_index: &str) -> Self {
        Self {
            title: title.to_string(),
            data_index: data_index.to_string(),
            key: data_index.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOutput {
    pub columns: Vec<TableColumn>,
    pub data_source: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// The computed value of an insight, one variant per [`InsightComponent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightOutput {
    SimpleDisplay(ScalarValue),
    BarChart(BarChartOutput),
    SimpleTable(TableOutput),
}

impl InsightOutput {
    pub fn component(&self) -> InsightComponent {
        match self {
            InsightOutput::SimpleDisplay(_) => InsightComponent::SimpleDisplay,
            InsightOutput::BarChart(_) => InsightComponent::BarChart,
            InsightOutput::SimpleTable(_) => InsightComponent::SimpleTable,
        }
    }
}
