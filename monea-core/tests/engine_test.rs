//! End-to-end engine tests against the in-memory adapters
//!
//! These exercise the public surface the UI layer uses: ingest (realtime
//! and bulk), statement reconciliation, backup merge, permission flow and
//! failed-extraction reprocessing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use monea_core::adapters::{FixedSmsSource, MemoryStore};
use monea_core::domain::backup::{
    AccountExport, BackupApp, BackupMetadata, BackupPayload, CategoryExport, TransactionExport,
};
use monea_core::{
    Account, AccountType, BackupData, BankCode, Engine, Error, ImportStrategy, IngestOutcome,
    LedgerStore, PermissionState, PermissionStatus, RawSms, SmsCapability, StatementFileKind,
    TransactionType,
};

fn sms(sender: &str, body: &str, at: chrono::DateTime<Utc>) -> RawSms {
    RawSms {
        sender: sender.to_string(),
        body: body.to_string(),
        received_at: at,
    }
}

fn engine_with(messages: Vec<RawSms>) -> (Engine, Arc<MemoryStore>, Arc<FixedSmsSource>) {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(FixedSmsSource::new(messages));
    let engine = Engine::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        Arc::clone(&source) as Arc<dyn SmsCapability>,
    );
    (engine, store, source)
}

#[tokio::test]
async fn ingesting_the_same_reference_twice_persists_once() {
    let (engine, store, _) = engine_with(vec![]);
    let at = Utc.with_ymd_and_hms(2025, 7, 18, 14, 33, 0).unwrap();

    let body = "Bancolombia le informa pago por $99.000 en NETFLIX. Ref. AB1234 Saldo $901.000";
    let first = engine.classify_and_extract("Bancolombia", body, at).unwrap();
    let second = first.clone();

    assert!(matches!(
        engine.ingest_realtime(first).await.unwrap(),
        IngestOutcome::Created { .. }
    ));
    assert!(matches!(
        engine.ingest_realtime(second).await.unwrap(),
        IngestOutcome::Duplicate
    ));

    assert_eq!(store.all_transactions().len(), 1);
}

#[tokio::test]
async fn realtime_window_dedup_without_reference() {
    let (engine, store, _) = engine_with(vec![]);
    let at = Utc.with_ymd_and_hms(2025, 7, 18, 14, 33, 0).unwrap();

    let body = "Nequi: Pagaste $15.000 en TIENDA D1. Disponible $85.000";
    let first = engine.classify_and_extract("Nequi", body, at).unwrap();

    // Same amount and direction, one minute later: inside the window
    let mut near = first.clone();
    near.occurred_at = at + chrono::Duration::minutes(1);

    // Same amount and direction, next morning: a genuinely new purchase
    let mut far = first.clone();
    far.occurred_at = at + chrono::Duration::hours(20);

    assert!(matches!(
        engine.ingest_realtime(first).await.unwrap(),
        IngestOutcome::Created { .. }
    ));
    assert!(matches!(
        engine.ingest_realtime(near).await.unwrap(),
        IngestOutcome::Duplicate
    ));
    assert!(matches!(
        engine.ingest_realtime(far).await.unwrap(),
        IngestOutcome::Created { .. }
    ));

    assert_eq!(store.all_transactions().len(), 2);
}

#[tokio::test]
async fn ingest_updates_cached_balance_from_running_balance() {
    let (engine, store, _) = engine_with(vec![]);
    let at = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();

    let candidate = engine
        .classify_and_extract(
            "Nequi",
            "Nequi: Recibiste $20.000 de MARIA. Disponible $105.000",
            at,
        )
        .unwrap();
    engine.ingest_realtime(candidate).await.unwrap();

    let accounts = store.get_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].bank_code, BankCode::Nequi);
    assert_eq!(accounts[0].account_type, AccountType::DigitalWallet);
    assert_eq!(accounts[0].balance, 105_000);
}

#[tokio::test]
async fn bulk_import_honors_limit_and_resumes_past_the_batch() {
    let base = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
    let messages: Vec<RawSms> = (0..200)
        .map(|i| {
            sms(
                "Nequi",
                &format!(
                    "Nequi: Pagaste ${} en TIENDA D1. Disponible $50.000",
                    1_000 + i * 500
                ),
                base + chrono::Duration::minutes(i),
            )
        })
        .collect();

    let (engine, store, _) = engine_with(messages);

    let first = engine.ingest_bulk(50).await.unwrap();
    assert_eq!(first.processed, 50);
    assert_eq!(first.imported, 50);
    assert_eq!(first.failed, 0);
    assert!(first.can_import_more);

    let boundary = engine.prepare_for_more().await.unwrap();
    // The next scan is bounded by the oldest imported message, exclusive
    assert_eq!(boundary, base + chrono::Duration::minutes(150));

    let second = engine.ingest_bulk(200).await.unwrap();
    assert_eq!(second.processed, 150);
    assert_eq!(second.imported, 150);
    assert!(!second.can_import_more);

    assert_eq!(store.all_transactions().len(), 200);
}

#[tokio::test]
async fn bulk_import_queues_unparseable_bank_messages() {
    let base = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
    let messages = vec![
        sms("Nequi", "Nequi: Pagaste $10.000 en ARA. Disponible $90.000", base),
        sms(
            "Bancolombia",
            "Bancolombia le informa que su extracto ya esta disponible",
            base + chrono::Duration::minutes(1),
        ),
        sms("Claro", "Tu factura de Claro llega manana", base + chrono::Duration::minutes(2)),
    ];

    let (engine, _, _) = engine_with(messages);
    let result = engine.ingest_bulk(10).await.unwrap();

    // The non-bank message is not even processed; the unparseable bank
    // message is queued, not dropped
    assert_eq!(result.processed, 2);
    assert_eq!(result.imported, 1);
    assert_eq!(result.failed, 1);

    let state = engine.sync_state().await.unwrap();
    assert_eq!(state.unprocessed_count, 1);
}

const STATEMENT_CSV: &str = "\
Cuenta:,unknown
Periodo:,2025/06/01 a 2025/06/30
Saldo final,\"$999.000\"
Fecha,Descripción,Valor,Saldo
05/06/2025,COMPRA EN TIENDA D1,-15000,985000
08/06/2025,COMPRA EN EXITO,-40000,945000
12/06/2025,Abono recibido de EMPRESA,200000,1145000
20/06/2025,COMPRA EN ARA,-30000,1115000
25/06/2025,Retiro cajero,-116000,999000
";

#[tokio::test]
async fn statement_superset_reconciliation_imports_the_difference() {
    let (engine, store, _) = engine_with(vec![]);

    // Two purchases already known from SMS, same day and amount as two
    // statement rows
    for (day, body) in [
        (5, "Nequi: Pagaste $15.000 en TIENDA D1. Disponible $985.000"),
        (8, "Nequi: Pagaste $40.000 en EXITO. Disponible $945.000"),
    ] {
        let at = Utc.with_ymd_and_hms(2025, 6, day, 15, 0, 0).unwrap();
        let candidate = engine.classify_and_extract("Nequi", body, at).unwrap();
        engine.ingest_realtime(candidate).await.unwrap();
    }

    let account_id = store.get_accounts().await.unwrap()[0].id;

    let statement = engine
        .decode_statement(
            STATEMENT_CSV.as_bytes(),
            "cuentas_de_ahorro_junio.csv",
            StatementFileKind::Csv,
            None,
        )
        .unwrap();
    assert_eq!(statement.candidates.len(), 5);
    assert_eq!(statement.statement_balance, 999_000);

    let result = engine.reconcile_statement(account_id, &statement).await.unwrap();
    assert_eq!(result.transactions.imported, 3);
    assert_eq!(result.transactions.skipped, 2);
    assert!(result.success());
    assert_eq!(store.all_transactions().len(), 5);

    // Statement balance is authoritative over the SMS-derived value
    let account = store.get_account(account_id).await.unwrap().unwrap();
    assert_eq!(account.balance, 999_000);

    // The same file cannot be reconciled twice
    let again = engine.reconcile_statement(account_id, &statement).await;
    assert!(matches!(again, Err(Error::StatementAlreadyImported(_))));
}

#[tokio::test]
async fn statement_of_pure_duplicates_is_a_zero_import_success() {
    let (engine, store, _) = engine_with(vec![]);

    let at = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
    let candidate = engine
        .classify_and_extract("Nequi", "Nequi: Pagaste $15.000 en TIENDA D1. Disponible $85.000", at)
        .unwrap();
    engine.ingest_realtime(candidate).await.unwrap();
    let account_id = store.get_accounts().await.unwrap()[0].id;

    let csv = "\
Fecha,Descripción,Valor,Saldo
05/06/2025,COMPRA EN TIENDA D1,-15000,85000
";
    let statement = engine
        .decode_statement(csv.as_bytes(), "cuentas.csv", StatementFileKind::Csv, None)
        .unwrap();

    let result = engine.reconcile_statement(account_id, &statement).await.unwrap();
    assert_eq!(result.transactions.imported, 0);
    assert_eq!(result.transactions.skipped, 1);
    assert!(result.success());
}

fn backup_fixture() -> BackupData {
    BackupData {
        metadata: BackupMetadata {
            version: 1,
            exported_at: "2025-06-01T12:00:00Z".to_string(),
            app: BackupApp {
                name: "monea".to_string(),
                version: "1.0.0".to_string(),
            },
        },
        data: BackupPayload {
            accounts: vec![
                AccountExport {
                    id: "acc-1".to_string(),
                    bank_code: BankCode::Bancolombia,
                    bank_name: "Bancolombia".to_string(),
                    account_number: "1234".to_string(),
                    account_type: AccountType::Savings,
                    balance: 500_000,
                    is_active: true,
                    last_synced_at: None,
                    created_at: 1_717_243_200_000,
                },
                AccountExport {
                    id: "acc-2".to_string(),
                    bank_code: BankCode::Nequi,
                    bank_name: "Nequi".to_string(),
                    account_number: "3001234567".to_string(),
                    account_type: AccountType::DigitalWallet,
                    balance: 80_000,
                    is_active: true,
                    last_synced_at: None,
                    created_at: 1_717_243_200_000,
                },
            ],
            transactions: vec![
                TransactionExport {
                    id: "tx-1".to_string(),
                    account_id: "acc-1".to_string(),
                    category_id: Some("cat-1".to_string()),
                    transaction_type: TransactionType::Expense,
                    amount: 45_000,
                    balance_after: Some(455_000),
                    merchant: Some("Exito".to_string()),
                    description: None,
                    reference: Some("REF-77".to_string()),
                    transaction_date: 1_717_329_600_000,
                    created_at: 1_717_329_600_000,
                },
                TransactionExport {
                    id: "tx-2".to_string(),
                    account_id: "acc-2".to_string(),
                    category_id: Some("cat-missing".to_string()),
                    transaction_type: TransactionType::Income,
                    amount: 80_000,
                    balance_after: None,
                    merchant: None,
                    description: Some("Sueldo".to_string()),
                    reference: None,
                    transaction_date: 1_717_416_000_000,
                    created_at: 1_717_416_000_000,
                },
                TransactionExport {
                    id: "tx-3".to_string(),
                    account_id: "acc-gone".to_string(),
                    category_id: None,
                    transaction_type: TransactionType::Expense,
                    amount: 10_000,
                    balance_after: None,
                    merchant: None,
                    description: None,
                    reference: None,
                    transaction_date: 1_717_416_000_000,
                    created_at: 1_717_416_000_000,
                },
            ],
            categories: vec![
                CategoryExport {
                    id: "cat-sys".to_string(),
                    name: "Comida".to_string(),
                    icon: "utensils".to_string(),
                    color: "#ff0000".to_string(),
                    is_system: true,
                    is_income: false,
                    created_at: 1_717_243_200_000,
                },
                CategoryExport {
                    id: "cat-1".to_string(),
                    name: "Mascotas".to_string(),
                    icon: "paw".to_string(),
                    color: "#00ff00".to_string(),
                    is_system: false,
                    is_income: false,
                    created_at: 1_717_243_200_000,
                },
            ],
        },
    }
}

#[tokio::test]
async fn backup_merge_skips_existing_account_but_attaches_its_transactions() {
    let (engine, store, _) = engine_with(vec![]);

    // The "1234" account already exists locally under a different id
    let local = Account::new(BankCode::Bancolombia, "1234", AccountType::Savings);
    let local_id = local.id;
    store.create_account(&local).await.unwrap();

    let result = engine
        .import_backup(&backup_fixture(), ImportStrategy::Merge)
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.accounts.imported, 1);
    assert_eq!(result.accounts.skipped, 1);
    assert_eq!(result.categories.imported, 1);
    assert_eq!(result.categories.skipped, 1);
    // tx-3's account never imported: skipped, not an error
    assert_eq!(result.transactions.imported, 2);
    assert_eq!(result.transactions.skipped, 1);

    // tx-1 landed on the pre-existing local account
    let attached = store.transactions_for_account(local_id).await.unwrap();
    assert_eq!(attached.len(), 1);
    assert_eq!(attached[0].reference.as_deref(), Some("REF-77"));
    assert!(attached[0].category_id.is_some());

    // tx-2's dangling category reference was dropped, not fatal
    let accounts = store.get_accounts().await.unwrap();
    let nequi = accounts.iter().find(|a| a.bank_code == BankCode::Nequi).unwrap();
    let nequi_txs = store.transactions_for_account(nequi.id).await.unwrap();
    assert_eq!(nequi_txs.len(), 1);
    assert!(nequi_txs[0].category_id.is_none());
}

#[tokio::test]
async fn backup_import_is_idempotent_on_references() {
    let (engine, store, _) = engine_with(vec![]);

    let backup = backup_fixture();
    engine.import_backup(&backup, ImportStrategy::Merge).await.unwrap();
    let second = engine.import_backup(&backup, ImportStrategy::Merge).await.unwrap();

    assert_eq!(second.accounts.imported, 0);
    assert_eq!(second.accounts.skipped, 2);
    // tx-1 has a reference and dedupes; tx-2 has none and re-imports
    assert_eq!(second.transactions.skipped, 2);

    assert_eq!(store.all_transactions().len(), 3);
}

#[tokio::test]
async fn future_backup_version_is_rejected() {
    let (engine, _, _) = engine_with(vec![]);

    let mut backup = backup_fixture();
    backup.metadata.version = 99;

    let err = engine.import_backup(&backup, ImportStrategy::Merge).await.unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedBackupVersion { found: 99, supported: 1 }
    ));
}

#[tokio::test]
async fn permission_flow_gates_realtime_listening() {
    let nothing = PermissionStatus::default();
    let granted = PermissionStatus {
        can_read_inbox: true,
        can_receive_push: true,
    };

    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(FixedSmsSource::new(vec![]).with_permissions(nothing, granted));
    let engine = Engine::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        Arc::clone(&source) as Arc<dyn SmsCapability>,
    );

    assert_eq!(engine.sync.check_permissions().await.unwrap(), PermissionState::Denied);
    assert!(matches!(
        engine.sync.start_listening().await,
        Err(Error::ListeningUnavailable(_))
    ));

    assert_eq!(
        engine.sync.request_permissions().await.unwrap(),
        PermissionState::Granted
    );

    let sender = engine.sync.start_listening().await.unwrap();
    sender
        .send(sms(
            "Nequi",
            "Nequi: Recibiste $20.000 de MARIA. Disponible $105.000",
            Utc::now(),
        ))
        .await
        .unwrap();

    // The consumer task commits asynchronously; wait for it
    let mut committed = false;
    for _ in 0..50 {
        if store.all_transactions().len() == 1 {
            committed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(committed, "realtime message was not ingested");

    let state = engine.sync_state().await.unwrap();
    assert!(state.is_listening);

    engine.sync.stop_listening().await;
    assert!(!engine.sync.is_listening().await);
}

#[tokio::test]
async fn denied_everywhere_ends_blocked() {
    let nothing = PermissionStatus::default();
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(FixedSmsSource::new(vec![]).with_permissions(nothing, nothing));
    let engine = Engine::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        Arc::clone(&source) as Arc<dyn SmsCapability>,
    );

    assert_eq!(
        engine.sync.request_permissions().await.unwrap(),
        PermissionState::Blocked
    );
}

#[tokio::test]
async fn reprocess_keeps_unparseable_payloads_and_bumps_retry() {
    let base = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
    let messages = vec![sms(
        "Bancolombia",
        "Bancolombia le informa que su extracto ya esta disponible",
        base,
    )];
    let (engine, store, _) = engine_with(messages);

    engine.ingest_bulk(10).await.unwrap();
    assert_eq!(engine.sync_state().await.unwrap().unprocessed_count, 1);

    let result = engine.reprocess_failed().await.unwrap();
    assert_eq!(result.transactions.imported, 0);
    assert_eq!(result.transactions.failed, 1);
    assert!(!result.success());

    let queued = store.list_failed_extractions().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].retry_count, 1);
    // Stale entries stay visible until reprocessed or cleared
    assert_eq!(engine.sync_state().await.unwrap().unprocessed_count, 1);
}
