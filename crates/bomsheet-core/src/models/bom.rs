//! Bill-of-materials document model.
//!
//! The pricing calculator export is loosely typed JSON. [`BomDocument::from_value`] is the
//! single validating parse step that turns it into strongly typed line items; nothing
//! downstream touches the raw JSON again.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Region used when a line item carries none.
pub const DEFAULT_REGION: &str = "N/A";

const GROUPS_KEY: &str = "Groups";
const SERVICES_KEY: &str = "Services";
const REGION_KEY: &str = "Region";
const SERVICE_NAME_KEY: &str = "Service Name";
const SERVICE_COST_KEY: &str = "Service Cost";
const MONTHLY_KEY: &str = "monthly";
const PROPERTIES_KEY: &str = "Properties";

/// A problem found while parsing the cost document.
///
/// `path` is a dotted location such as `Groups.Services[2].Service Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomIssue {
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for BomIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BomError {
    #[error("cost document must be a JSON object")]
    NotAnObject,

    #[error("invalid cost document: {}", join_issues(.0))]
    Invalid(Vec<BomIssue>),
}

impl BomError {
    /// Dotted paths of every offending field.
    pub fn fields(&self) -> Vec<String> {
        match self {
            BomError::NotAnObject => vec!["jsonData".to_string()],
            BomError::Invalid(issues) => issues.iter().map(|i| i.path.clone()).collect(),
        }
    }
}

fn join_issues(issues: &[BomIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One priced service from the calculator export.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLineItem {
    pub region: String,
    pub service_name: String,
    pub monthly_cost: Decimal,
    /// Configuration properties in document order.
    pub properties: Vec<(String, String)>,
}

/// Parsed cost document: the services reachable at `Groups.Services`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomDocument {
    pub services: Vec<ServiceLineItem>,
}

impl BomDocument {
    /// Parse from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, BomError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            BomError::Invalid(vec![BomIssue {
                path: "jsonData".to_string(),
                reason: format!("not valid JSON ({})", e),
            }])
        })?;
        Self::from_value(&value)
    }

    /// Validate and convert a calculator export.
    ///
    /// A missing `Groups` or `Services` yields an empty document. Every row must carry a
    /// non-empty `Service Name`; all offending rows are reported together and the whole
    /// document is rejected.
    pub fn from_value(value: &Value) -> Result<Self, BomError> {
        let root = value.as_object().ok_or(BomError::NotAnObject)?;

        let services = match root.get(GROUPS_KEY) {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(groups)) => match groups.get(SERVICES_KEY) {
                None | Some(Value::Null) => return Ok(Self::default()),
                Some(Value::Array(services)) => services,
                Some(_) => {
                    return Err(BomError::Invalid(vec![BomIssue {
                        path: format!("{}.{}", GROUPS_KEY, SERVICES_KEY),
                        reason: "expected a list".to_string(),
                    }]))
                }
            },
            Some(_) => {
                return Err(BomError::Invalid(vec![BomIssue {
                    path: GROUPS_KEY.to_string(),
                    reason: "expected an object".to_string(),
                }]))
            }
        };

        let mut issues = Vec::new();
        let mut items = Vec::with_capacity(services.len());

        for (index, raw) in services.iter().enumerate() {
            let path = format!("{}.{}[{}]", GROUPS_KEY, SERVICES_KEY, index);
            match raw.as_object() {
                Some(service) => match parse_line_item(service, &path) {
                    Ok(item) => items.push(item),
                    Err(mut row_issues) => issues.append(&mut row_issues),
                },
                None => issues.push(BomIssue {
                    path,
                    reason: "expected an object".to_string(),
                }),
            }
        }

        if !issues.is_empty() {
            return Err(BomError::Invalid(issues));
        }

        Ok(Self { services: items })
    }
}

fn parse_line_item(service: &Map<String, Value>, path: &str) -> Result<ServiceLineItem, Vec<BomIssue>> {
    let mut issues = Vec::new();

    let service_name = match service.get(SERVICE_NAME_KEY) {
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Some(Value::String(_)) => {
            issues.push(BomIssue {
                path: format!("{}.{}", path, SERVICE_NAME_KEY),
                reason: "must not be empty".to_string(),
            });
            None
        }
        Some(_) => {
            issues.push(BomIssue {
                path: format!("{}.{}", path, SERVICE_NAME_KEY),
                reason: "expected a string".to_string(),
            });
            None
        }
        None => {
            issues.push(BomIssue {
                path: format!("{}.{}", path, SERVICE_NAME_KEY),
                reason: "is required".to_string(),
            });
            None
        }
    };

    let region = match service.get(REGION_KEY) {
        Some(Value::String(region)) if !region.trim().is_empty() => region.clone(),
        _ => DEFAULT_REGION.to_string(),
    };

    let monthly_path = format!("{}.{}.{}", path, SERVICE_COST_KEY, MONTHLY_KEY);
    let monthly_cost = match service
        .get(SERVICE_COST_KEY)
        .and_then(Value::as_object)
        .and_then(|cost| cost.get(MONTHLY_KEY))
    {
        None | Some(Value::Null) => Some(Decimal::ZERO),
        Some(raw) => match parse_decimal(raw) {
            Some(value) => Some(value),
            None => {
                issues.push(BomIssue {
                    path: monthly_path,
                    reason: format!("not a number: {}", raw),
                });
                None
            }
        },
    };

    let properties = service
        .get(PROPERTIES_KEY)
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(key, value)| (key.clone(), property_text(value)))
                .collect()
        })
        .unwrap_or_default();

    match (service_name, monthly_cost) {
        (Some(service_name), Some(monthly_cost)) if issues.is_empty() => Ok(ServiceLineItem {
            region,
            service_name,
            monthly_cost,
            properties,
        }),
        _ => Err(issues),
    }
}

/// Accepts JSON numbers and numeric strings ("1,234.50" and "$12" included).
fn parse_decimal(raw: &Value) -> Option<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', ""),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
