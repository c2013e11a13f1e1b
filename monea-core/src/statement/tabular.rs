//! Tabular statement decoder
//!
//! Reads spreadsheet exports (the Bancolombia savings layout): a few
//! metadata rows (account, period, balances), then a fixed header row
//! `Fecha | Descripción | Valor | Saldo`, then one movement per row with a
//! signed value. XLSX and CSV are the same logical format; only the byte
//! reader differs. No password support on this path.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, Utc};

use crate::domain::{
    AccountType, BankCode, CandidateSource, DecodeError, FailedExtraction, FailureReason,
    StatementResult, TransactionCandidate, UNKNOWN_ACCOUNT_NUMBER,
};
use crate::parser::{amount, date};

use super::{classify_row, detect_bank_from_file_name, file_fingerprint, merchant_from_description};

pub fn decode_xlsx(data: &[u8], file_name: &str) -> Result<StatementResult, DecodeError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data.to_vec()))
        .map_err(|e| DecodeError::MalformedFile(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::MalformedFile("workbook has no sheets".to_string()))?
        .map_err(|e| DecodeError::MalformedFile(e.to_string()))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    parse_rows(&rows, file_name, file_fingerprint(data), CandidateSource::StatementExcel)
}

pub fn decode_csv(data: &[u8], file_name: &str) -> Result<StatementResult, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::MalformedFile(e.to_string()))?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    parse_rows(&rows, file_name, file_fingerprint(data), CandidateSource::StatementExcel)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Lowercase and strip the accents spreadsheet headers come with
fn fold(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            _ => c,
        })
        .collect()
}

struct Columns {
    fecha: usize,
    descripcion: Option<usize>,
    valor: usize,
    saldo: Option<usize>,
}

/// Is this the fixed header row, and where are its columns?
fn detect_header(row: &[String]) -> Option<Columns> {
    let folded: Vec<String> = row.iter().map(|c| fold(c)).collect();

    let fecha = folded.iter().position(|c| c == "fecha")?;
    let valor = folded.iter().position(|c| c == "valor" || c == "monto")?;
    let descripcion = folded
        .iter()
        .position(|c| c == "descripcion" || c == "detalle" || c == "concepto");
    let saldo = folded.iter().position(|c| c == "saldo");

    Some(Columns {
        fecha,
        descripcion,
        valor,
        saldo,
    })
}

/// Metadata cells sit above the header as "Label: value" pairs, either in
/// one cell or split across two. The label must fill its cell up to an
/// optional colon so "Cuenta:" matches but "Cuentas de ahorro" does not.
fn metadata_value(row: &[String], label_folded: &str) -> Option<String> {
    for (idx, cell) in row.iter().enumerate() {
        let folded = fold(cell);
        let Some(rest) = folded.strip_prefix(label_folded) else {
            continue;
        };
        if !rest.is_empty() && !rest.starts_with(':') {
            continue;
        }

        if let Some((_, value)) = cell.split_once(':') {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        if let Some(next) = row.get(idx + 1) {
            if !next.is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_rows(
    rows: &[Vec<String>],
    file_name: &str,
    fingerprint: String,
    source: CandidateSource,
) -> Result<StatementResult, DecodeError> {
    let mut account_number = None;
    let mut period: Option<(NaiveDate, NaiveDate)> = None;
    let mut opening_balance = None;
    let mut closing_balance = None;
    let mut columns: Option<Columns> = None;

    let mut candidates = Vec::new();
    let mut row_failures = Vec::new();

    for row in rows {
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }

        let Some(cols) = &columns else {
            // Still in the metadata block
            if account_number.is_none() {
                account_number = metadata_value(row, "cuenta")
                    .or_else(|| metadata_value(row, "numero de cuenta"));
            }
            if period.is_none() {
                if let Some(value) = metadata_value(row, "periodo") {
                    period = parse_period(&value);
                }
            }
            if opening_balance.is_none() {
                if let Some(value) = metadata_value(row, "saldo inicial")
                    .or_else(|| metadata_value(row, "saldo anterior"))
                {
                    opening_balance = amount::parse_amount(&value);
                }
            }
            if closing_balance.is_none() {
                if let Some(value) = metadata_value(row, "saldo final")
                    .or_else(|| metadata_value(row, "saldo actual"))
                {
                    closing_balance = amount::parse_amount(&value);
                }
            }

            columns = detect_header(row);
            continue;
        };

        // Some exports print the closing balance below the table
        if closing_balance.is_none() {
            if let Some(value) = metadata_value(row, "saldo final")
                .or_else(|| metadata_value(row, "saldo actual"))
            {
                closing_balance = amount::parse_amount(&value);
                continue;
            }
        }

        match parse_movement_row(row, cols, file_name, source) {
            RowOutcome::Transaction(c) => candidates.push(c),
            RowOutcome::Failed(failed) => row_failures.push(failed),
            RowOutcome::Blank => {}
        }
    }

    if columns.is_none() {
        return Err(DecodeError::MalformedFile(
            "no header row (Fecha/Valor) found in sheet".to_string(),
        ));
    }

    candidates.sort_by_key(|c| c.occurred_at);

    // The sheet is trusted over derivation, but a sheet without explicit
    // metadata still decodes: period from the row dates, closing balance
    // from the latest row's running balance.
    let (period_start, period_end) = match period {
        Some(p) => p,
        None => period_from_candidates(&candidates).ok_or_else(|| {
            DecodeError::MalformedFile("no period metadata and no dated rows".to_string())
        })?,
    };
    let statement_balance = closing_balance
        .or_else(|| candidates.iter().rev().find_map(|c| c.running_balance))
        .ok_or_else(|| {
            DecodeError::MalformedFile("no closing balance in sheet".to_string())
        })?;

    Ok(StatementResult {
        bank_code: detect_bank_from_file_name(file_name).or(Some(BankCode::Bancolombia)),
        account_number: account_number.unwrap_or_else(|| UNKNOWN_ACCOUNT_NUMBER.to_string()),
        account_type: AccountType::Savings,
        holder_name: None,
        period_start,
        period_end,
        opening_balance,
        statement_balance,
        candidates,
        row_failures,
        file_name: file_name.to_string(),
        file_fingerprint: fingerprint,
    })
}

enum RowOutcome {
    Transaction(TransactionCandidate),
    Failed(FailedExtraction),
    Blank,
}

fn parse_movement_row(
    row: &[String],
    cols: &Columns,
    file_name: &str,
    source: CandidateSource,
) -> RowOutcome {
    let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

    let fecha = cell(cols.fecha);
    let valor = cell(cols.valor);
    if fecha.is_empty() && valor.is_empty() {
        return RowOutcome::Blank;
    }

    let raw_payload = row.join(" | ");
    let fail = |reason| {
        RowOutcome::Failed(FailedExtraction::new(
            file_name,
            raw_payload.clone(),
            source,
            reason,
            Utc::now(),
        ))
    };

    let Some(occurred) = date::parse_day_month_year(fecha) else {
        return fail(FailureReason::UnparseableDate);
    };
    let Some(signed_amount) = amount::parse_amount(valor) else {
        return fail(FailureReason::UnparseableAmount);
    };
    if signed_amount == 0 {
        return fail(FailureReason::UnparseableAmount);
    }

    let description = cols
        .descripcion
        .map(cell)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let running_balance = cols.saldo.map(cell).and_then(amount::parse_amount);

    let direction = classify_row(description.as_deref().unwrap_or(""), signed_amount < 0);

    RowOutcome::Transaction(TransactionCandidate {
        source,
        bank_code: BankCode::Bancolombia,
        direction,
        amount: signed_amount.abs(),
        occurred_at: occurred.and_hms_opt(0, 0, 0).unwrap().and_utc(),
        counterparty: description.as_deref().and_then(merchant_from_description),
        description,
        reference: None,
        account_last4: None,
        running_balance,
        raw_payload,
    })
}

fn parse_period(value: &str) -> Option<(NaiveDate, NaiveDate)> {
    let mut parts = value.split(" a ");
    let start = date::parse_year_month_day(parts.next()?.trim())?;
    let end = date::parse_year_month_day(parts.next()?.trim())?;
    Some((start, end))
}

fn period_from_candidates(candidates: &[TransactionCandidate]) -> Option<(NaiveDate, NaiveDate)> {
    let first = candidates.first()?.occurred_at.date_naive();
    let last = candidates.last()?.occurred_at.date_naive();
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionType;

    const SAMPLE_CSV: &str = "\
Bancolombia,Cuentas de ahorro
Cuenta:,04512345678
Periodo:,2025/06/01 a 2025/06/30
Saldo inicial,\"$1.000.000\"
Saldo final,\"$1.080.000\"
Fecha,Descripción,Valor,Saldo
05/06/2025,COMPRA EN EXITO POBLADO,-45000,955000
10/06/2025,Abono recibido de EMPRESA SAS,125000,1080000
";

    #[test]
    fn test_decodes_csv_sheet() {
        let result =
            decode_csv(SAMPLE_CSV.as_bytes(), "Cuentas_de_ahorro_junio.csv").unwrap();

        assert_eq!(result.bank_code, Some(BankCode::Bancolombia));
        assert_eq!(result.account_number, "04512345678");
        assert_eq!(result.opening_balance, Some(1_000_000));
        assert_eq!(result.statement_balance, 1_080_000);
        assert_eq!(
            result.period_start,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert_eq!(result.candidates.len(), 2);

        let expense = &result.candidates[0];
        assert_eq!(expense.direction, TransactionType::Expense);
        assert_eq!(expense.amount, 45_000);
        assert_eq!(expense.running_balance, Some(955_000));

        let income = &result.candidates[1];
        assert_eq!(income.direction, TransactionType::TransferIn);
        assert_eq!(income.amount, 125_000);
    }

    #[test]
    fn test_bad_row_does_not_abort_the_sheet() {
        let csv = SAMPLE_CSV.replace("-45000", "cuarenta y cinco mil");
        let result = decode_csv(csv.as_bytes(), "cuentas_de_ahorro.csv").unwrap();

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.row_failures.len(), 1);
        assert_eq!(
            result.row_failures[0].failure_reason,
            FailureReason::UnparseableAmount
        );
    }

    #[test]
    fn test_sheet_without_header_aborts() {
        let csv = "algo,sin,encabezado\n1,2,3\n";
        let err = decode_csv(csv.as_bytes(), "cuentas.csv").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedFile(_)));
    }

    #[test]
    fn test_balance_falls_back_to_last_row() {
        let csv = "\
Cuenta:,123456
Fecha,Descripción,Valor,Saldo
05/06/2025,COMPRA EN D1,-10000,90000
07/06/2025,COMPRA EN ARA,-5000,85000
";
        let result = decode_csv(csv.as_bytes(), "cuentas.csv").unwrap();
        assert_eq!(result.statement_balance, 85_000);
        assert_eq!(
            result.period_start,
            NaiveDate::from_ymd_opt(2025, 6, 5).unwrap()
        );
        assert_eq!(
            result.period_end,
            NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()
        );
    }
}
