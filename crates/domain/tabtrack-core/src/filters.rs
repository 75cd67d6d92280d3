use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Filter state as the host dashboard reports it, one variant per filter type.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Categorical {
        applied_values: Vec<Value>,
        is_exclude_mode: bool,
    },
    Range {
        min_value: Value,
        max_value: Value,
    },
    RelativeDate {
        period_type: String,
        range_n: i64,
        range_type: String,
        anchor_date: Option<Value>,
    },
    /// Any filter type without a dedicated descriptor (e.g. `hierarchical`).
    Other { filter_type: String },
}

impl Filter {
    pub fn filter_type(&self) -> &str {
        match self {
            Filter::Categorical { .. } => "categorical",
            Filter::Range { .. } => "range",
            Filter::RelativeDate { .. } => "relative-date",
            Filter::Other { filter_type } => filter_type,
        }
    }
}

/// A filter together with the field and worksheet it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHostFilter", into = "RawHostFilter")]
pub struct HostFilter {
    pub worksheet_name: String,
    pub field_name: String,
    pub filter: Filter,
}

/// Loose wire shape: every type-specific attribute is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHostFilter {
    #[serde(default)]
    worksheet_name: String,
    #[serde(default)]
    field_name: String,
    filter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    applied_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_exclude_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    period_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "rangeN")]
    range_n: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor_date: Option<Value>,
}

impl From<RawHostFilter> for HostFilter {
    fn from(raw: RawHostFilter) -> Self {
        let filter = match raw.filter_type.as_str() {
            "categorical" => Filter::Categorical {
                applied_values: raw.applied_values.unwrap_or_default(),
                is_exclude_mode: raw.is_exclude_mode.unwrap_or(false),
            },
            "range" => Filter::Range {
                min_value: raw.min_value.unwrap_or(Value::Null),
                max_value: raw.max_value.unwrap_or(Value::Null),
            },
            "relative-date" => match (raw.period_type, raw.range_n, raw.range_type) {
                (Some(period_type), Some(range_n), Some(range_type)) => Filter::RelativeDate {
                    period_type,
                    range_n,
                    range_type,
                    anchor_date: raw.anchor_date,
                },
                // Incomplete relative-date shapes degrade like unknown types.
                _ => Filter::Other {
                    filter_type: raw.filter_type,
                },
            },
            _ => Filter::Other {
                filter_type: raw.filter_type,
            },
        };
        HostFilter {
            worksheet_name: raw.worksheet_name,
            field_name: raw.field_name,
            filter,
        }
    }
}

impl From<HostFilter> for RawHostFilter {
    fn from(f: HostFilter) -> Self {
        let mut raw = RawHostFilter {
            worksheet_name: f.worksheet_name,
            field_name: f.field_name,
            filter_type: f.filter.filter_type().to_string(),
            ..Default::default()
        };
        match f.filter {
            Filter::Categorical {
                applied_values,
                is_exclude_mode,
            } => {
                raw.applied_values = Some(applied_values);
                raw.is_exclude_mode = Some(is_exclude_mode);
            }
            Filter::Range {
                min_value,
                max_value,
            } => {
                raw.min_value = Some(min_value);
                raw.max_value = Some(max_value);
            }
            Filter::RelativeDate {
                period_type,
                range_n,
                range_type,
                anchor_date,
            } => {
                raw.period_type = Some(period_type);
                raw.range_n = Some(range_n);
                raw.range_type = Some(range_type);
                raw.anchor_date = anchor_date;
            }
            Filter::Other { .. } => {}
        }
        raw
    }
}

/// Uniform per-filter descriptor carried in event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSnapshot {
    Categorical {
        applied_values: Vec<Value>,
    },
    Range {
        min_value: Value,
        max_value: Value,
    },
    RelativeDate {
        period_type: String,
        range_n: i64,
        range_type: String,
    },
    /// Only the type tag survives for unrecognized filter types.
    Minimal {
        filter_type: String,
    },
}

impl FilterSnapshot {
    pub fn filter_type(&self) -> &str {
        match self {
            FilterSnapshot::Categorical { .. } => "categorical",
            FilterSnapshot::Range { .. } => "range",
            FilterSnapshot::RelativeDate { .. } => "relative-date",
            FilterSnapshot::Minimal { filter_type } => filter_type,
        }
    }
}

impl Serialize for FilterSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("filterType", self.filter_type())?;
        match self {
            FilterSnapshot::Categorical { applied_values } => {
                map.serialize_entry("appliedValues", applied_values)?;
            }
            FilterSnapshot::Range {
                min_value,
                max_value,
            } => {
                map.serialize_entry("minValue", min_value)?;
                map.serialize_entry("maxValue", max_value)?;
            }
            FilterSnapshot::RelativeDate {
                period_type,
                range_n,
                range_type,
            } => {
                map.serialize_entry("periodType", period_type)?;
                map.serialize_entry("rangeN", range_n)?;
                map.serialize_entry("rangeType", range_type)?;
            }
            FilterSnapshot::Minimal { .. } => {}
        }
        map.end()
    }
}

/// Normalizes a host filter into its descriptor. Pure and total.
pub fn extract(filter: &Filter) -> FilterSnapshot {
    match filter {
        Filter::Categorical { applied_values, .. } => FilterSnapshot::Categorical {
            applied_values: applied_values.clone(),
        },
        Filter::Range {
            min_value,
            max_value,
        } => FilterSnapshot::Range {
            min_value: min_value.clone(),
            max_value: max_value.clone(),
        },
        Filter::RelativeDate {
            period_type,
            range_n,
            range_type,
            ..
        } => FilterSnapshot::RelativeDate {
            period_type: period_type.clone(),
            range_n: *range_n,
            range_type: range_type.clone(),
        },
        Filter::Other { filter_type } => FilterSnapshot::Minimal {
            filter_type: filter_type.clone(),
        },
    }
}

/// One (field, worksheet, descriptor) entry of a filter payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStateEntry {
    pub field_name: String,
    pub worksheet_name: String,
    #[serde(flatten)]
    pub snapshot: FilterSnapshot,
}

impl FilterStateEntry {
    /// The entry as a JSON object, same shape as its serialized form.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("fieldName".into(), Value::String(self.field_name.clone()));
        map.insert(
            "worksheetName".into(),
            Value::String(self.worksheet_name.clone()),
        );
        map.insert(
            "filterType".into(),
            Value::String(self.snapshot.filter_type().to_string()),
        );
        match &self.snapshot {
            FilterSnapshot::Categorical { applied_values } => {
                map.insert("appliedValues".into(), Value::Array(applied_values.clone()));
            }
            FilterSnapshot::Range {
                min_value,
                max_value,
            } => {
                map.insert("minValue".into(), min_value.clone());
                map.insert("maxValue".into(), max_value.clone());
            }
            FilterSnapshot::RelativeDate {
                period_type,
                range_n,
                range_type,
            } => {
                map.insert("periodType".into(), Value::String(period_type.clone()));
                map.insert("rangeN".into(), Value::from(*range_n));
                map.insert("rangeType".into(), Value::String(range_type.clone()));
            }
            FilterSnapshot::Minimal { .. } => {}
        }
        map
    }
}

impl From<&HostFilter> for FilterStateEntry {
    fn from(f: &HostFilter) -> Self {
        Self {
            field_name: f.field_name.clone(),
            worksheet_name: f.worksheet_name.clone(),
            snapshot: extract(&f.filter),
        }
    }
}
