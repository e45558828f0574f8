use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Referencia a un archivo externo. El formato nunca se asume por el nombre:
/// siempre se detecta con los bytes descargados.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReference {
    pub url: String,
}

impl FileReference {
    pub fn new(url: impl Into<String>) -> Self {
        FileReference { url: url.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitInfo {
    pub name: String,
    pub tax_id: String,
    pub address: Option<String>,
    pub logo: Option<FileReference>,
    pub default_bank_name: Option<String>,
    pub default_account_type: Option<String>,
    pub default_elaborated_by: Option<String>,
    pub default_reviewed_by: Option<String>,
    pub default_approved_by: Option<String>,
    pub default_recorded_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterpart {
    pub name: String,
    pub nit: String,
    pub dv: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub bank_account: Option<String>,
}

impl Counterpart {
    /// NIT con dígito de verificación, p.ej. `900123456-7`.
    pub fn full_nit(&self) -> String {
        match &self.dv {
            Some(dv) if !dv.is_empty() => format!("{}-{}", self.nit, dv),
            _ => self.nit.clone(),
        }
    }
}

/// Una factura aplicada dentro de un pago, con su soporte original opcional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineRef {
    pub number: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub amount_applied: f64,
    pub file: Option<FileReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Número consecutivo del comprobante; `None` marca un pago externo.
    pub consecutive: Option<u32>,
    pub date: NaiveDate,
    pub counterpart: Counterpart,
    pub gross_amount: f64,
    pub retefuente: f64,
    pub reteica: f64,
    pub net_amount: f64,
    pub payment_method: Option<String>,
    pub bank_name: Option<String>,
    pub account_type: Option<String>,
    pub transaction_ref: Option<String>,
    pub observations: Option<String>,
    pub invoice_lines: Vec<InvoiceLineRef>,
    pub support_file: Option<FileReference>,
    pub payroll_file: Option<FileReference>,
}

impl PaymentRecord {
    /// Etiqueta corta del sello: `CE-42` o `EXT` para pagos externos.
    pub fn label(&self) -> String {
        match self.consecutive {
            Some(n) => format!("CE-{}", n),
            None => "EXT".to_string(),
        }
    }

    /// Número de documento del encabezado del comprobante.
    pub fn document_number(&self) -> String {
        match self.consecutive {
            Some(n) => format!("CE-{:04}", n),
            None => "EXTERNO (Sin CE)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInvoiceRecord {
    pub number: String,
    pub date: NaiveDate,
    pub counterpart_name: String,
    pub total_amount: f64,
    pub balance: Option<f64>,
    pub file: Option<FileReference>,
}

impl PendingInvoiceRecord {
    pub fn outstanding(&self) -> f64 {
        self.balance.unwrap_or(self.total_amount)
    }
}

/// Entrada completa de una llamada de ensamblaje. Inmutable, propiedad del
/// llamador; el motor no conserva estado entre llamadas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRequest {
    pub unit: UnitInfo,
    pub month: String,
    pub year: String,
    pub payments: Vec<PaymentRecord>,
    pub pending_invoices: Vec<PendingInvoiceRecord>,
    pub skip_internal_receipts: bool,
    pub include_payroll_filings: bool,
}
