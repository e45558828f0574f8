//! Adaptador del sistema de registro: traduce las formas JSON del API
//! administrativo (camelCase, fechas ISO, campos opcionales) al modelo
//! estructurado del motor.

use serde::Deserialize;

use crate::core::{AssemblyError, AssemblyResult};
use crate::models::{
    Counterpart, FileReference, InvoiceLineRef, PackageRequest, PaymentRecord,
    PendingInvoiceRecord, UnitInfo,
};
use chrono::NaiveDate;

/// Solicitud tal como la envía el sistema de registro.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRequest {
    pub unit_info: ApiUnitInfo,
    pub month: String,
    pub year: String,
    pub payments: Vec<ApiPayment>,
    #[serde(default)]
    pub pending_invoices: Vec<ApiPendingInvoice>,
    #[serde(default, rename = "skipInternalCE")]
    pub skip_internal_ce: bool,
    #[serde(default)]
    pub include_pila: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUnitInfo {
    pub name: String,
    pub tax_id: String,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub default_bank_name: Option<String>,
    pub default_account_type: Option<String>,
    pub default_elaborated_by: Option<String>,
    pub default_reviewed_by: Option<String>,
    pub default_approved_by: Option<String>,
    pub default_recorded_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPayment {
    pub consecutive_number: Option<u32>,
    pub payment_date: String,
    pub amount_paid: f64,
    #[serde(default)]
    pub retefuente_applied: f64,
    #[serde(default)]
    pub reteica_applied: f64,
    pub net_value: f64,
    pub bank_payment_method: Option<String>,
    pub bank_name: Option<String>,
    pub account_type: Option<String>,
    pub transaction_ref: Option<String>,
    pub observations: Option<String>,
    pub pila_file_url: Option<String>,
    pub support_file_url: Option<String>,
    pub provider: Option<ApiProvider>,
    #[serde(default)]
    pub invoice_items: Vec<ApiInvoiceItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProvider {
    pub name: String,
    pub nit: String,
    pub dv: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub bank_account: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInvoiceItem {
    pub amount_applied: f64,
    pub invoice: ApiInvoice,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInvoice {
    pub invoice_number: String,
    pub invoice_date: String,
    pub description: Option<String>,
    #[serde(default)]
    pub total_amount: f64,
    pub file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPendingInvoice {
    pub invoice_number: String,
    pub invoice_date: String,
    pub total_amount: f64,
    pub balance: Option<f64>,
    pub provider: Option<ApiPendingProvider>,
    pub file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPendingProvider {
    pub name: String,
}

impl FolderRequest {
    /// Convierte y valida la solicitud externa al modelo del motor.
    pub fn into_request(self) -> AssemblyResult<PackageRequest> {
        let unit = UnitInfo {
            name: self.unit_info.name,
            tax_id: self.unit_info.tax_id,
            address: self.unit_info.address,
            logo: self.unit_info.logo_url.map(FileReference::new),
            default_bank_name: self.unit_info.default_bank_name,
            default_account_type: self.unit_info.default_account_type,
            default_elaborated_by: self.unit_info.default_elaborated_by,
            default_reviewed_by: self.unit_info.default_reviewed_by,
            default_approved_by: self.unit_info.default_approved_by,
            default_recorded_by: self.unit_info.default_recorded_by,
        };

        let payments = self
            .payments
            .into_iter()
            .map(ApiPayment::into_record)
            .collect::<AssemblyResult<Vec<_>>>()?;

        let pending_invoices = self
            .pending_invoices
            .into_iter()
            .map(ApiPendingInvoice::into_record)
            .collect::<AssemblyResult<Vec<_>>>()?;

        Ok(PackageRequest {
            unit,
            month: self.month,
            year: self.year,
            payments,
            pending_invoices,
            skip_internal_receipts: self.skip_internal_ce,
            include_payroll_filings: self.include_pila,
        })
    }
}

impl ApiPayment {
    fn into_record(self) -> AssemblyResult<PaymentRecord> {
        let counterpart = match self.provider {
            Some(provider) => Counterpart {
                name: provider.name,
                nit: provider.nit,
                dv: provider.dv,
                phone: provider.phone,
                city: provider.city,
                bank_account: provider.bank_account,
            },
            // Pagos sin proveedor asociado (p.ej. cargados por extracto).
            None => Counterpart {
                name: "N/A".to_string(),
                nit: String::new(),
                dv: None,
                phone: None,
                city: None,
                bank_account: None,
            },
        };

        let invoice_lines = self
            .invoice_items
            .into_iter()
            .map(|item| {
                Ok(InvoiceLineRef {
                    number: item.invoice.invoice_number,
                    date: parse_date(&item.invoice.invoice_date)?,
                    description: item.invoice.description,
                    amount_applied: item.amount_applied,
                    file: item.invoice.file_url.map(FileReference::new),
                })
            })
            .collect::<AssemblyResult<Vec<_>>>()?;

        Ok(PaymentRecord {
            consecutive: self.consecutive_number,
            date: parse_date(&self.payment_date)?,
            counterpart,
            gross_amount: self.amount_paid,
            retefuente: self.retefuente_applied,
            reteica: self.reteica_applied,
            net_amount: self.net_value,
            payment_method: self.bank_payment_method,
            bank_name: self.bank_name,
            account_type: self.account_type,
            transaction_ref: self.transaction_ref,
            observations: self.observations,
            invoice_lines,
            support_file: self.support_file_url.map(FileReference::new),
            payroll_file: self.pila_file_url.map(FileReference::new),
        })
    }
}

impl ApiPendingInvoice {
    fn into_record(self) -> AssemblyResult<PendingInvoiceRecord> {
        Ok(PendingInvoiceRecord {
            number: self.invoice_number,
            date: parse_date(&self.invoice_date)?,
            counterpart_name: self
                .provider
                .map(|p| p.name)
                .unwrap_or_else(|| "N/A".to_string()),
            total_amount: self.total_amount,
            balance: self.balance,
            file: self.file_url.map(FileReference::new),
        })
    }
}

/// Fecha ISO del API; acepta tanto `2026-03-15` como la forma con hora.
fn parse_date(value: &str) -> AssemblyResult<NaiveDate> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| AssemblyError::InvalidRequest(format!("Fecha inválida: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folder_request_maps_to_engine_model() {
        let raw = json!({
            "unitInfo": {
                "name": "Conjunto Mirador",
                "taxId": "900123456",
                "logoUrl": "https://cdn/logo.png",
                "defaultElaboratedBy": "Sandra P."
            },
            "month": "Marzo",
            "year": "2026",
            "payments": [{
                "consecutiveNumber": 7,
                "paymentDate": "2026-03-15T00:00:00.000Z",
                "amountPaid": 1_190_000.0,
                "retefuenteApplied": 41_650.0,
                "netValue": 1_148_350.0,
                "provider": { "name": "Aseo Total SAS", "nit": "830000111", "dv": "4" },
                "invoiceItems": [{
                    "amountApplied": 1_190_000.0,
                    "invoice": {
                        "invoiceNumber": "FV-220",
                        "invoiceDate": "2026-03-01",
                        "fileUrl": "https://cdn/fv-220.pdf"
                    }
                }],
                "supportFileUrl": "https://cdn/soporte-7.pdf"
            }],
            "pendingInvoices": [{
                "invoiceNumber": "FV-300",
                "invoiceDate": "2026-03-20",
                "totalAmount": 200_000.0
            }],
            "skipInternalCE": true,
            "includePila": true
        });

        let request: FolderRequest = serde_json::from_value(raw).unwrap();
        let request = request.into_request().unwrap();

        assert!(request.skip_internal_receipts);
        assert!(request.include_payroll_filings);
        assert_eq!(request.unit.name, "Conjunto Mirador");

        let payment = &request.payments[0];
        assert_eq!(payment.consecutive, Some(7));
        assert_eq!(payment.date, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert_eq!(payment.counterpart.full_nit(), "830000111-4");
        assert_eq!(payment.invoice_lines[0].number, "FV-220");

        let pending = &request.pending_invoices[0];
        assert_eq!(pending.counterpart_name, "N/A");
        assert_eq!(pending.outstanding(), 200_000.0);
    }

    #[test]
    fn payment_without_provider_gets_placeholder_counterpart() {
        let raw = json!({
            "paymentDate": "2026-03-02",
            "amountPaid": 50_000.0,
            "netValue": 50_000.0
        });
        let payment: ApiPayment = serde_json::from_value(raw).unwrap();
        let record = payment.into_record().unwrap();

        assert_eq!(record.consecutive, None);
        assert_eq!(record.counterpart.name, "N/A");
        assert_eq!(record.label(), "EXT");
    }

    #[test]
    fn malformed_date_is_an_invalid_request() {
        let raw = json!({
            "paymentDate": "15/03/2026",
            "amountPaid": 1.0,
            "netValue": 1.0
        });
        let payment: ApiPayment = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            payment.into_record(),
            Err(AssemblyError::InvalidRequest(_))
        ));
    }
}
