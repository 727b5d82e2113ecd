use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Discretion,
    Wrap,
    ClientName,
    EffectiveDate,
    ClientSignaturePage11,
    ClientDatePage11,
    AccountNumber,
    FeeType,
    FeeAmount,
    AdvReceivedDate,
    ClientSignaturePage14,
    ClientDatePage14,
}

impl Field {
    /// Ledger column order.
    pub const ALL: [Field; 12] = [
        Field::Discretion,
        Field::Wrap,
        Field::ClientName,
        Field::EffectiveDate,
        Field::ClientSignaturePage11,
        Field::ClientDatePage11,
        Field::AccountNumber,
        Field::FeeType,
        Field::FeeAmount,
        Field::AdvReceivedDate,
        Field::ClientSignaturePage14,
        Field::ClientDatePage14,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Self::Discretion => "Discretion",
            Self::Wrap => "WRAP",
            Self::ClientName => "Clients name",
            Self::EffectiveDate => "Effective date",
            Self::ClientSignaturePage11 => "Client signature page 11",
            Self::ClientDatePage11 => "client date page 11",
            Self::AccountNumber => "account number",
            Self::FeeType => "Fee type",
            Self::FeeAmount => "Fee amount",
            Self::AdvReceivedDate => "ADV received date",
            Self::ClientSignaturePage14 => "Client signature page 14",
            Self::ClientDatePage14 => "client date page 14",
        }
    }

    /// Key used by the web front-end's advisory record.
    pub fn alias(self) -> &'static str {
        match self {
            Self::Discretion => "discretionary",
            Self::Wrap => "wrap",
            Self::ClientName => "clientName",
            Self::EffectiveDate => "effectiveDate",
            Self::ClientSignaturePage11 => "clientSignedP11",
            Self::ClientDatePage11 => "clientDatedP11",
            Self::AccountNumber => "accountNumber",
            Self::FeeType => "feeType",
            Self::FeeAmount => "feeAmount",
            Self::AdvReceivedDate => "advReceivedDate",
            Self::ClientSignaturePage14 => "clientSignedP14",
            Self::ClientDatePage14 => "clientDatedP14",
        }
    }

    pub fn summary_label(self) -> &'static str {
        match self {
            Self::Discretion => "Discretionary v. Non-Discretionary",
            Self::Wrap => "Wrap v. Non-WRAP",
            Self::ClientName => "Client's Name",
            Self::EffectiveDate => "Effective Date",
            Self::ClientSignaturePage11 => "Client Signed Page 11",
            Self::ClientDatePage11 => "Client Dated Page 11",
            Self::AccountNumber => "Account Number",
            Self::FeeType => "Flat v. Tiered",
            Self::FeeAmount => "Fee Amount",
            Self::AdvReceivedDate => "ADV Received Date",
            Self::ClientSignaturePage14 => "Client Signed Page 14",
            Self::ClientDatePage14 => "Client Dated Page 14",
        }
    }

    pub fn notice_label(self) -> &'static str {
        match self {
            Self::Discretion => "Discretionary Status",
            Self::Wrap => "Wrap Status",
            Self::ClientName => "Client Entity Name",
            Self::EffectiveDate => "Effective Date",
            Self::ClientSignaturePage11 => "Client Signed P11",
            Self::ClientDatePage11 => "Client Dated P11",
            Self::AccountNumber => "Account Number",
            Self::FeeType => "Fee Type",
            Self::FeeAmount => "Fee Amount",
            Self::AdvReceivedDate => "ADV Received Date",
            Self::ClientSignaturePage14 => "Client Signed P14",
            Self::ClientDatePage14 => "Client Dated P14",
        }
    }

    pub fn is_signature_or_date(self) -> bool {
        matches!(
            self,
            Self::ClientSignaturePage11
                | Self::ClientDatePage11
                | Self::ClientSignaturePage14
                | Self::ClientDatePage14
        )
    }
}

/// The per-document data points, keyed by ledger header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    values: Map<String, Value>,
}

impl FieldMapping {
    pub fn from_payload(payload: &str) -> Result<Self, FlowError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|err| FlowError::Input(err.to_string()))?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(FlowError::Input(format!(
                "JSON payload must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn value(&self, field: Field) -> Option<&Value> {
        self.values
            .get(field.header())
            .or_else(|| self.values.get(field.alias()))
            .filter(|value| !value.is_null())
    }

    pub fn text(&self, field: Field) -> Option<String> {
        self.value(field).map(render_value)
    }

    pub fn cell_text(&self, field: Field) -> String {
        self.text(field).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfFieldsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(flatten)]
    pub fields: Option<PdfFields>,
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PdfFields {
    pub rep_code: Option<String>,
    pub fee: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub debug_notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub debug_notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NigoReport {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub debug_notes: Vec<String>,
    pub excel_updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    pub flagged_fields: Vec<String>,
    pub missing_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadErrorReport {
    pub error: String,
    pub error_kind: &'static str,
    pub status: Status,
    pub payload_snippet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub error_kind: &'static str,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatus {
    pub path: String,
    pub sheet: String,
    pub exists: bool,
    pub readable: bool,
    pub has_header: bool,
    pub data_rows: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: Status,
    pub generated_at: String,
    pub credential_configured: bool,
    pub ledger: LedgerStatus,
    pub nigo_ledger: LedgerStatus,
    pub field_sheet_exists: bool,
}
