use bomsheet_core::models::{BomDocument, ServiceLineItem};
use bomsheet_core::AppError;
use rust_decimal::Decimal;

use crate::currency::format_usd;

const MONTHS_PER_YEAR: i64 = 12;

/// A cost too large to carry through the yearly and total arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostTableError {
    #[error("yearly cost of service {index} is out of range")]
    YearlyOverflow { index: usize },

    #[error("total {column} cost is out of range")]
    TotalOverflow { column: &'static str },
}

impl CostTableError {
    /// Location in the cost document, in the same dotted form the BOM parser reports.
    pub fn field(&self) -> String {
        match self {
            CostTableError::YearlyOverflow { index } => {
                format!("Groups.Services[{}].Service Cost.monthly", index)
            }
            CostTableError::TotalOverflow { .. } => "Groups.Services".to_string(),
        }
    }
}

impl From<CostTableError> for AppError {
    fn from(err: CostTableError) -> Self {
        AppError::validation(vec![format!("jsonData.{}", err.field())], err.to_string())
    }
}

/// One rendered service row.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRow {
    pub region: String,
    pub service_name: String,
    pub monthly_cost: Decimal,
    pub yearly_cost: Decimal,
    pub monthly_cost_display: String,
    pub yearly_cost_display: String,
    pub properties_summary: String,
}

impl CostRow {
    fn from_item(index: usize, item: &ServiceLineItem) -> Result<Self, CostTableError> {
        let yearly_cost = item
            .monthly_cost
            .checked_mul(Decimal::from(MONTHS_PER_YEAR))
            .ok_or(CostTableError::YearlyOverflow { index })?;
        Ok(Self {
            region: item.region.clone(),
            service_name: item.service_name.clone(),
            monthly_cost: item.monthly_cost,
            yearly_cost,
            monthly_cost_display: format_usd(item.monthly_cost),
            yearly_cost_display: format_usd(yearly_cost),
            properties_summary: summarize_properties(&item.properties),
        })
    }
}

/// Service rows plus the Totals and Calculator trailers.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    pub rows: Vec<CostRow>,
    pub total_monthly: Decimal,
    pub total_yearly: Decimal,
    pub total_monthly_display: String,
    pub total_yearly_display: String,
    /// Content of the Calculator trailer; blank when absent.
    pub calculator_link: Option<String>,
}

impl CostTable {
    pub const HEADERS: [&'static str; 5] = [
        "Region",
        "Service",
        "Monthly ($)",
        "First 12 Month Total ($)",
        "Config Summary",
    ];

    /// Build the table. Totals are summed from the numeric row values.
    pub fn build(
        document: &BomDocument,
        calculator_link: Option<&str>,
    ) -> Result<Self, CostTableError> {
        let rows = document
            .services
            .iter()
            .enumerate()
            .map(|(index, item)| CostRow::from_item(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        let total_monthly = checked_total(rows.iter().map(|r| r.monthly_cost), "monthly")?;
        let total_yearly = checked_total(rows.iter().map(|r| r.yearly_cost), "yearly")?;

        Ok(Self {
            rows,
            total_monthly,
            total_yearly,
            total_monthly_display: format_usd(total_monthly),
            total_yearly_display: format_usd(total_yearly),
            calculator_link: calculator_link
                .map(str::trim)
                .filter(|link| !link.is_empty())
                .map(String::from),
        })
    }

    /// Service rows plus the two trailers.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 2
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn checked_total(
    mut values: impl Iterator<Item = Decimal>,
    column: &'static str,
) -> Result<Decimal, CostTableError> {
    values.try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value)
            .ok_or(CostTableError::TotalOverflow { column })
    })
}

/// `key: value, key: value` in document order.
fn summarize_properties(properties: &[(String, String)]) -> String {
    properties
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn document(value: serde_json::Value) -> BomDocument {
        BomDocument::from_value(&value).unwrap()
    }

    #[test]
    fn test_single_service() {
        let doc = document(json!({
            "Groups": {"Services": [{
                "Region": "US East",
                "Service Name": "EC2",
                "Service Cost": {"monthly": 100.0},
                "Properties": {"Instance": "t3.micro", "Count": 2}
            }]}
        }));

        let table = CostTable::build(&doc, None).unwrap();

        assert_eq!(table.row_count(), 3);
        let row = &table.rows[0];
        assert_eq!(row.region, "US East");
        assert_eq!(row.service_name, "EC2");
        assert_eq!(row.monthly_cost_display, "$100.00");
        assert_eq!(row.yearly_cost_display, "$1,200.00");
        assert_eq!(row.properties_summary, "Instance: t3.micro, Count: 2");
        assert_eq!(table.total_monthly_display, "$100.00");
        assert_eq!(table.total_yearly_display, "$1,200.00");
        assert_eq!(table.calculator_link, None);
    }

    #[test]
    fn test_totals_are_exact_sums() {
        let doc = document(json!({
            "Groups": {"Services": [
                {"Service Name": "A", "Service Cost": {"monthly": "0.1"}},
                {"Service Name": "B", "Service Cost": {"monthly": "0.2"}},
                {"Service Name": "C", "Service Cost": {"monthly": "1234.565"}}
            ]}
        }));

        let table =
            CostTable::build(&doc, Some("https://calculator.aws/#/estimate?id=1")).unwrap();

        assert_eq!(table.row_count(), 5);
        assert_eq!(table.total_monthly, dec("1234.865"));
        assert_eq!(table.total_yearly, dec("14818.38"));
        assert_eq!(table.total_monthly_display, "$1,234.87");
        assert_eq!(table.total_yearly_display, "$14,818.38");
        assert_eq!(table.rows[0].region, "N/A");
        assert_eq!(
            table.calculator_link.as_deref(),
            Some("https://calculator.aws/#/estimate?id=1")
        );
    }

    #[test]
    fn test_empty_document() {
        let table = CostTable::build(&BomDocument::default(), Some("   ")).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.total_monthly, Decimal::ZERO);
        assert_eq!(table.total_monthly_display, "$0.00");
        assert_eq!(table.total_yearly_display, "$0.00");
        assert_eq!(table.calculator_link, None);
    }

    #[test]
    fn test_rows_keep_input_order() {
        let doc = document(json!({
            "Groups": {"Services": [
                {"Service Name": "Zeta"},
                {"Service Name": "Alpha"},
                {"Service Name": "Mu"}
            ]}
        }));

        let names: Vec<_> = CostTable::build(&doc, None)
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.service_name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mu"]);
    }

    #[test]
    fn test_yearly_overflow_is_reported_not_panicked() {
        let doc = document(json!({
            "Groups": {"Services": [
                {"Service Name": "EC2", "Service Cost": {"monthly": 10}},
                {"Service Name": "EC2", "Service Cost": {"monthly": 1e28}}
            ]}
        }));

        let err = CostTable::build(&doc, None).unwrap_err();

        assert_eq!(err, CostTableError::YearlyOverflow { index: 1 });
        assert_eq!(err.field(), "Groups.Services[1].Service Cost.monthly");
        let app_err = AppError::from(err);
        assert_eq!(
            app_err.fields(),
            ["jsonData.Groups.Services[1].Service Cost.monthly"]
        );
    }

    #[test]
    fn test_total_overflow_is_reported() {
        // Each yearly value fits; their sum does not.
        let big = Decimal::MAX / Decimal::from(24);
        let doc = BomDocument {
            services: (0..3)
                .map(|i| ServiceLineItem {
                    region: "us-east-1".to_string(),
                    service_name: format!("svc-{}", i),
                    monthly_cost: big,
                    properties: Vec::new(),
                })
                .collect(),
        };

        let err = CostTable::build(&doc, None).unwrap_err();
        assert!(matches!(err, CostTableError::TotalOverflow { .. }));
        assert_eq!(err.field(), "Groups.Services");
    }

    #[test]
    fn test_largest_safe_cost_still_builds() {
        let monthly = Decimal::MAX / Decimal::from(48);
        let doc = BomDocument {
            services: vec![ServiceLineItem {
                region: "us-east-1".to_string(),
                service_name: "EC2".to_string(),
                monthly_cost: monthly,
                properties: Vec::new(),
            }],
        };

        let table = CostTable::build(&doc, None).unwrap();
        assert_eq!(table.total_monthly, monthly);
        assert!(table.total_yearly_display.starts_with('$'));
    }
}
