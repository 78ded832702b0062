//! CSV rendering for the `export_csv` script.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::db::{self, Pool};
use crate::shortener::UrlShortener;
use crate::util;

/// Which table an export reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportTable {
    Users,
    Events,
    Invoices,
}

/// Header row plus data rows, all as display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write_record(&mut out, &self.headers)?;
        for row in &self.rows {
            write_record(&mut out, row)?;
        }
        out.flush()
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        self.write_to(std::io::BufWriter::new(file))
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

fn write_record<W: Write>(out: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")
}

/// Quote a field when it contains a delimiter, quote or line break, doubling
/// embedded quotes.
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn opt(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

pub async fn users_table(pool: &Pool) -> Result<CsvTable> {
    let mut table = CsvTable::new(&[
        "id",
        "name",
        "email",
        "mobileNumber",
        "city",
        "state",
        "pincode",
        "referralCode",
        "createdAt",
    ]);
    for user in db::list_users(pool).await? {
        table.rows.push(vec![
            user.id.to_string(),
            user.name,
            opt(&user.email),
            user.mobile_number,
            opt(&user.city),
            opt(&user.state),
            opt(&user.pincode),
            user.referred_by
                .as_deref()
                .map(util::extract_referral_code)
                .unwrap_or_default(),
            user.created_at.to_rfc3339(),
        ]);
    }
    Ok(table)
}

/// Events with their public registration link, optionally shortened.
pub async fn events_table(
    pool: &Pool,
    public_base_url: &str,
    shortener: Option<&dyn UrlShortener>,
) -> Result<CsvTable> {
    let mut table = CsvTable::new(&[
        "id",
        "title",
        "category",
        "eventDate",
        "price",
        "registrationDeadline",
        "registrationLink",
    ]);
    let base = public_base_url.trim_end_matches('/');
    for event in db::list_events(pool).await? {
        let long_link = format!("{base}/events/{}", event.id);
        let link = match shortener {
            Some(s) => s
                .shorten(&long_link)
                .await
                .with_context(|| format!("failed to shorten {long_link}"))?,
            None => long_link,
        };
        table.rows.push(vec![
            event.id.to_string(),
            event.title,
            event.category,
            util::format_long_date(&event.event_date),
            format!("{:.2}", event.price),
            event
                .registration_deadline
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            link,
        ]);
    }
    Ok(table)
}

pub async fn invoices_table(pool: &Pool) -> Result<CsvTable> {
    let mut table = CsvTable::new(&[
        "invoiceId",
        "amount",
        "status",
        "userId",
        "eventId",
        "gatewayInvoiceId",
        "shortUrl",
        "createdAt",
    ]);
    for invoice in db::list_invoices(pool).await? {
        table.rows.push(vec![
            invoice.invoice_id,
            format!("{:.2}", invoice.amount),
            invoice.status.as_str().to_string(),
            invoice.user_id.to_string(),
            invoice.event_id.to_string(),
            invoice.gateway_invoice_id,
            invoice.short_url,
            invoice.created_at.to_rfc3339(),
        ]);
    }
    Ok(table)
}
