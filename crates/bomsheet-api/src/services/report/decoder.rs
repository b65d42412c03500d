//! Request decoding: JSON or multipart body into a validated [`ReportRequest`].
//!
//! Decoding (content type, body framing, duplicate parts) and validation (required fields,
//! cost document) are separate steps so failures can be attributed to the right stage.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
};
use bomsheet_core::models::{BomDocument, BomError, ReportRequest};
use bomsheet_core::validation::is_valid_customer_name;
use bomsheet_core::AppError;
use serde_json::{Map, Value};

pub const FIELD_CUSTOMER_NAME: &str = "customerName";
pub const FIELD_JSON_DATA: &str = "jsonData";
pub const FIELD_IMAGE: &str = "imageFile";
pub const FIELD_CALCULATOR_URL: &str = "awsCalculatorUrl";
/// Older clients upload the cost document as a file part under this name.
const FIELD_JSON_FILE_ALIAS: &str = "jsonFile";

/// The cost document as it arrived: already-parsed JSON or text still to be parsed.
#[derive(Debug, Clone)]
pub enum CostDocumentInput {
    Json(Value),
    Text(String),
}

/// Decoded but unvalidated request fields.
#[derive(Debug, Clone, Default)]
pub struct RawReportInput {
    pub customer_name: Option<String>,
    pub cost_document: Option<CostDocumentInput>,
    pub image: Option<Vec<u8>>,
    pub reference_link: Option<String>,
}

/// Read the request body according to its content type.
pub async fn decode_request(request: Request) -> Result<RawReportInput, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let essence = content_type
        .as_deref()
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase());

    match essence.as_deref() {
        Some("application/json") => decode_json(request).await,
        Some(e) if e.ends_with("+json") => decode_json(request).await,
        Some("multipart/form-data") => decode_multipart(request).await,
        Some(other) => Err(AppError::UnsupportedMediaType(other.to_string())),
        None => Err(AppError::UnsupportedMediaType(
            "missing content-type".to_string(),
        )),
    }
}

async fn decode_json(request: Request) -> Result<RawReportInput, AppError> {
    let body = Bytes::from_request(request, &()).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::validation(Vec::new(), format!("Failed to read body: {}", rejection.body_text()))
        }
    })?;

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        AppError::validation(Vec::new(), format!("Request body is not valid JSON: {}", e))
    })?;

    let Value::Object(mut fields) = value else {
        return Err(AppError::validation(
            Vec::new(),
            "Request body must be a JSON object",
        ));
    };

    Ok(RawReportInput {
        customer_name: take_text(&mut fields, FIELD_CUSTOMER_NAME)?,
        cost_document: match fields.remove(FIELD_JSON_DATA) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(CostDocumentInput::Text(text)),
            Some(value) => Some(CostDocumentInput::Json(value)),
        },
        image: None,
        reference_link: take_text(&mut fields, FIELD_CALCULATOR_URL)?,
    })
}

fn take_text(fields: &mut Map<String, Value>, name: &str) -> Result<Option<String>, AppError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(AppError::validation(
            vec![name.to_string()],
            format!("{} must be a string", name),
        )),
    }
}

async fn decode_multipart(request: Request) -> Result<RawReportInput, AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::validation(Vec::new(), format!("Invalid multipart body: {}", e)))?;

    let mut input = RawReportInput::default();
    let mut seen: Vec<&'static str> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = match field.name() {
            Some(FIELD_CUSTOMER_NAME) => FIELD_CUSTOMER_NAME,
            Some(FIELD_JSON_DATA) | Some(FIELD_JSON_FILE_ALIAS) => FIELD_JSON_DATA,
            Some(FIELD_IMAGE) => FIELD_IMAGE,
            Some(FIELD_CALCULATOR_URL) => FIELD_CALCULATOR_URL,
            // Unknown parts are skipped.
            _ => continue,
        };

        if seen.contains(&name) {
            return Err(AppError::validation(
                vec![name.to_string()],
                format!("Field {} was sent more than once", name),
            ));
        }
        seen.push(name);

        match name {
            FIELD_IMAGE => {
                let data = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was chosen.
                input.image = (!data.is_empty()).then(|| data.to_vec());
            }
            _ => {
                let text = field.text().await.map_err(multipart_error)?;
                match name {
                    FIELD_CUSTOMER_NAME => input.customer_name = Some(text),
                    FIELD_JSON_DATA => input.cost_document = Some(CostDocumentInput::Text(text)),
                    _ => input.reference_link = Some(text),
                }
            }
        }
    }

    Ok(input)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::validation(Vec::new(), format!("Failed to read multipart: {}", e.body_text()))
    }
}

impl RawReportInput {
    /// Check required fields and parse the cost document. Every problem is reported at
    /// once, with the offending field names.
    pub fn validate(self, owner_id: &str) -> Result<ReportRequest, AppError> {
        let mut fields = Vec::new();
        let mut problems = Vec::new();

        let customer_name = self
            .customer_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        match &customer_name {
            None => {
                fields.push(FIELD_CUSTOMER_NAME.to_string());
                problems.push(format!("{} is required", FIELD_CUSTOMER_NAME));
            }
            Some(name) if !is_valid_customer_name(name) => {
                fields.push(FIELD_CUSTOMER_NAME.to_string());
                problems.push(format!(
                    "{} must contain at least one letter or digit",
                    FIELD_CUSTOMER_NAME
                ));
            }
            Some(_) => {}
        }

        let cost_document = match self.cost_document {
            None => {
                fields.push(FIELD_JSON_DATA.to_string());
                problems.push(format!("{} is required", FIELD_JSON_DATA));
                None
            }
            Some(CostDocumentInput::Text(text)) if text.trim().is_empty() => {
                fields.push(FIELD_JSON_DATA.to_string());
                problems.push(format!("{} is required", FIELD_JSON_DATA));
                None
            }
            Some(input) => {
                let parsed = match input {
                    CostDocumentInput::Json(value) => BomDocument::from_value(&value),
                    CostDocumentInput::Text(text) => BomDocument::from_json_str(&text),
                };
                match parsed {
                    Ok(document) => Some(document),
                    Err(e) => {
                        fields.extend(qualify_bom_fields(&e));
                        problems.push(e.to_string());
                        None
                    }
                }
            }
        };

        match (customer_name, cost_document) {
            (Some(customer_name), Some(cost_document)) if fields.is_empty() => Ok(ReportRequest {
                owner_id: owner_id.to_string(),
                customer_name,
                cost_document,
                image: self.image,
                reference_link: self
                    .reference_link
                    .map(|link| link.trim().to_string())
                    .filter(|link| !link.is_empty()),
            }),
            _ => Err(AppError::validation(fields, problems.join("; "))),
        }
    }
}

/// BOM field paths are relative to the cost document; prefix them with its field name.
fn qualify_bom_fields(err: &BomError) -> Vec<String> {
    err.fields()
        .into_iter()
        .map(|path| {
            if path == FIELD_JSON_DATA {
                path
            } else {
                format!("{}.{}", FIELD_JSON_DATA, path)
            }
        })
        .collect()
}
