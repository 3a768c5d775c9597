//! Integration tests for a full bonus distribution
//!
//! Drives the same path as `bonuscraft run`:
//! 1. Settings loaded from a PascalCase JSON config
//! 2. Operator account opened from an encrypted wallet file
//! 3. Contribution log ingested and allocated
//! 4. Batches built, signed, dumped and submitted to the mock ledger
//! 5. Audit record and transaction dumps checked on disk

use std::path::{Path, PathBuf};

use bonuscraft_core::{Address, BonusError, DEFAULT_BATCH_SIZE};
use bonuscraft_distributor::{
    transaction_dump_path, Distributor, DistributorConfig, DistributorError,
};
use bonuscraft_keystore::{encrypt_wallet_with_rounds, resolve_account, Account};
use bonuscraft_ledger::{
    max_transfers_per_transaction, GasSettings, Ledger, LedgerClient, LedgerConfig, Transaction,
};
use bonuscraft_settings::{Mode, Settings};

// =============================================================================
// HELPERS
// =============================================================================

const PASSWORD: &str = "correct horse battery staple";
const KDF_ROUNDS: u32 = 1_000;
const GAS_PRICE: u64 = 1;
const GAS_LIMIT: u64 = 200_000;

/// Transfers per transaction under the test gas settings
fn ledger_limit() -> usize {
    max_transfers_per_transaction(&GasSettings::new(GAS_PRICE, GAS_LIMIT)).unwrap()
}

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bonuscraft-it-{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn peer_address(i: u32) -> Address {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&i.to_be_bytes());
    bytes[31] = 1;
    Address::new(bytes)
}

fn write_log(path: &Path, rows: &[(String, Address, u64)]) {
    let body: String = rows
        .iter()
        .map(|(peer, address, value)| {
            serde_json::json!({
                "peer_pubkey": peer,
                "address": address.to_base58(),
                "value": value,
            })
            .to_string()
                + "\n"
        })
        .collect();
    std::fs::write(path, body).unwrap();
}

/// Write wallet + config into `dir` and return the loaded settings.
fn setup(dir: &Path, bonus: u64, extra: serde_json::Value) -> (Settings, Account) {
    let account = Account::generate();
    encrypt_wallet_with_rounds(&account, PASSWORD, KDF_ROUNDS)
        .unwrap()
        .save(&dir.join("wallet.json"))
        .unwrap();

    let mut config = serde_json::json!({
        "JsonRpcAddress": "http://127.0.0.1:8899",
        "WalletFile": dir.join("wallet.json"),
        "DataFile": dir.join("data.json"),
        "Bonus": bonus,
        "GasPrice": GAS_PRICE,
        "GasLimit": GAS_LIMIT,
        "BatchSize": ledger_limit(),
        "RecordFile": dir.join("record.txt"),
        "TransactionDumpDir": dir.join("dumps"),
        "Mode": "mock",
    });
    if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }

    let config_path = dir.join("config.json");
    std::fs::write(&config_path, config.to_string()).unwrap();
    let settings = Settings::load_from(&config_path).unwrap();
    (settings, account)
}

fn mock_distributor(settings: &Settings) -> Distributor<LedgerClient> {
    assert_eq!(settings.mode, Mode::Mock);
    let account = resolve_account(&settings.wallet_file, PASSWORD).unwrap();
    let ledger =
        LedgerClient::with_secret_key(LedgerConfig::mock(), account.secret_bytes()).unwrap();
    Distributor::new(DistributorConfig::from_settings(settings), ledger)
}

fn record_lines(dir: &Path) -> Vec<(String, u64)> {
    std::fs::read_to_string(dir.join("record.txt"))
        .unwrap()
        .lines()
        .map(|line| {
            let (address, amount) = line.split_once('\t').unwrap();
            (address.to_string(), amount.parse().unwrap())
        })
        .collect()
}

// =============================================================================
// 1. Proportional split across peers
// =============================================================================

#[test]
fn test_proportional_split_end_to_end() {
    let dir = workdir("split");
    let (settings, account) = setup(&dir, 1_000, serde_json::json!({ "BonusMultiplier": 2 }));

    let a = peer_address(1);
    let b = peer_address(2);
    let c = peer_address(3);
    write_log(
        &dir.join("data.json"),
        &[
            ("peer-a".to_string(), a, 1),
            ("peer-a".to_string(), b, 3),
            ("peer-b".to_string(), c, 7),
            ("peer-b".to_string(), c, 0),
        ],
    );

    let distributor = mock_distributor(&settings);
    assert_eq!(distributor.ledger().operator(), account.address());

    let report = distributor.run().unwrap();
    assert_eq!(report.plan.records, 3);
    assert_eq!(report.plan.dropped, 1);

    // peer-a: 1/4 and 3/4 of the pool; peer-b: the whole pool on one address
    let record = record_lines(&dir);
    assert_eq!(
        record,
        vec![
            (a.to_base58(), 250),
            (b.to_base58(), 750),
            (c.to_base58(), 1_000),
        ]
    );

    // Each peer is split the whole pool, so two rounds are needed
    assert_eq!(report.plan.total, 2_000);
    assert_eq!(report.plan.permitted, 2_000);
    assert_eq!(distributor.ledger().mock_submissions()[0].lamports, 2_000);

    let _ = std::fs::remove_dir_all(&dir);
}

// =============================================================================
// 2. Safety check aborts before anything is submitted
// =============================================================================

#[test]
fn test_over_allocation_aborts_without_submission() {
    let dir = workdir("over");
    let (settings, _) = setup(&dir, 100, serde_json::json!({ "BonusMultiplier": 1 }));

    write_log(
        &dir.join("data.json"),
        &[
            ("p1".to_string(), peer_address(1), 30),
            ("p1".to_string(), peer_address(2), 70),
            ("p2".to_string(), peer_address(3), 100),
        ],
    );

    let distributor = mock_distributor(&settings);
    let err = distributor.run().unwrap_err();
    assert!(matches!(
        err,
        DistributorError::Bonus(BonusError::OverAllocation { total: 200, permitted: 100 })
    ));
    assert!(err.to_string().contains("Sum of split is more than total bonus"));

    assert!(distributor.ledger().mock_submissions().is_empty());
    assert!(!transaction_dump_path(&dir.join("dumps"), 0).exists());
    assert_eq!(record_lines(&dir).len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

// =============================================================================
// 3. Allow-list with a multi-round multiplier
// =============================================================================

#[test]
fn test_allow_list_and_multiplier() {
    let dir = workdir("allow");
    let peers: Vec<String> = (0..10).map(|i| format!("peer-{}", i)).collect();
    let (settings, _) = setup(
        &dir,
        700,
        serde_json::json!({
            "AllowList": peers[..7].to_vec(),
            "BonusMultiplier": 7,
        }),
    );

    let rows: Vec<(String, Address, u64)> = peers
        .iter()
        .enumerate()
        .map(|(i, peer)| (peer.clone(), peer_address(i as u32), 10))
        .collect();
    write_log(&dir.join("data.json"), &rows);

    let distributor = mock_distributor(&settings);
    let report = distributor.run().unwrap();

    // Seven allowed peers, each the sole contributor to its own total
    assert_eq!(report.plan.allocations.len(), 7);
    assert!(report
        .plan
        .allocations
        .iter()
        .all(|a| peers[..7].contains(&a.peer) && a.instruction.amount == 700));
    assert_eq!(report.plan.total, 4_900);
    assert_eq!(report.plan.permitted, 4_900);

    let submitted = distributor.ledger().mock_submissions();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].transfers, 7);
    assert_eq!(submitted[0].lamports, 4_900);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_allow_list_excluding_everyone() {
    let dir = workdir("allow-none");
    let (settings, _) = setup(&dir, 50, serde_json::json!({ "AllowList": [] }));
    write_log(&dir.join("data.json"), &[("p1".to_string(), peer_address(1), 5)]);

    let distributor = mock_distributor(&settings);
    let report = distributor.run().unwrap();
    assert!(report.plan.allocations.is_empty());
    assert!(report.receipts.is_empty());
    assert!(distributor.ledger().mock_submissions().is_empty());
    assert!(record_lines(&dir).is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

// =============================================================================
// 4. Batching and transaction dumps
// =============================================================================

#[test]
fn test_default_batch_size_rejected_before_submission() {
    let dir = workdir("batches");
    let (settings, _) = setup(
        &dir,
        1_001,
        serde_json::json!({ "BatchSize": DEFAULT_BATCH_SIZE }),
    );
    assert_eq!(settings.batch_size, Some(DEFAULT_BATCH_SIZE));

    let rows: Vec<(String, Address, u64)> = (0..1001)
        .map(|i| ("p1".to_string(), peer_address(i), 1))
        .collect();
    write_log(&dir.join("data.json"), &rows);

    let distributor = mock_distributor(&settings);
    let err = distributor.run().unwrap_err();

    match err {
        DistributorError::BatchTooLarge { batch_size, limit } => {
            assert_eq!(batch_size, DEFAULT_BATCH_SIZE);
            assert_eq!(limit, ledger_limit());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(distributor.ledger().mock_submissions().is_empty());
    assert!(!transaction_dump_path(&dir.join("dumps"), 0).exists());
    // The audit record is still written
    assert_eq!(record_lines(&dir).len(), 1001);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_batches_submitted_and_dumped() {
    let dir = workdir("dumps");
    let limit = ledger_limit();
    let count = limit * 2 + 1;
    let (settings, _) = setup(&dir, count as u64, serde_json::json!({}));
    assert_eq!(settings.batch_size, Some(limit));

    let rows: Vec<(String, Address, u64)> = (0..count as u32)
        .map(|i| ("p1".to_string(), peer_address(i), 1))
        .collect();
    write_log(&dir.join("data.json"), &rows);

    let distributor = mock_distributor(&settings);
    let report = distributor.run().unwrap();

    assert_eq!(
        report.receipts.iter().map(|r| r.transfers).collect::<Vec<_>>(),
        vec![limit, limit, 1]
    );

    let submitted = distributor.ledger().mock_submissions();
    assert_eq!(submitted.len(), 3);
    assert_eq!(submitted.iter().map(|s| s.lamports).sum::<u128>(), count as u128);

    // Each dump decodes to the signed transaction that was submitted
    for (receipt, accepted) in report.receipts.iter().zip(&submitted) {
        let path = transaction_dump_path(&dir.join("dumps"), receipt.index);
        assert_eq!(receipt.dump.as_deref(), Some(path.as_path()));

        let raw = hex::decode(std::fs::read_to_string(&path).unwrap()).unwrap();
        let tx: Transaction = bincode::deserialize(&raw).unwrap();
        assert!(tx.is_signed());
        assert_eq!(tx.signatures[0], accepted.hash.0);
        assert_eq!(receipt.hash.0, accepted.hash.0);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_single_transaction_when_batching_disabled() {
    let dir = workdir("unbatched");
    let (settings, _) = setup(&dir, 60, serde_json::json!({ "BatchSize": null }));

    let rows: Vec<(String, Address, u64)> = (0..6)
        .map(|i| ("p1".to_string(), peer_address(i), 1))
        .collect();
    write_log(&dir.join("data.json"), &rows);

    let report = mock_distributor(&settings).run().unwrap();
    assert_eq!(report.receipts.len(), 1);
    assert_eq!(report.receipts[0].transfers, 6);
    assert_eq!(report.receipts[0].amount, 60);

    let _ = std::fs::remove_dir_all(&dir);
}

// =============================================================================
// 5. Zero shares and bad input
// =============================================================================

#[test]
fn test_zero_shares_kept_or_skipped() {
    let rows = vec![
        ("p1".to_string(), peer_address(1), 1),
        ("p1".to_string(), peer_address(2), 1_000),
    ];

    let dir = workdir("zero-kept");
    let (settings, _) = setup(&dir, 10, serde_json::json!({}));
    write_log(&dir.join("data.json"), &rows);
    let report = mock_distributor(&settings).run().unwrap();
    assert_eq!(
        report.plan.instructions().iter().map(|i| i.amount).collect::<Vec<_>>(),
        vec![0, 9]
    );
    let _ = std::fs::remove_dir_all(&dir);

    let dir = workdir("zero-skipped");
    let (settings, _) = setup(&dir, 10, serde_json::json!({ "SkipZeroShares": true }));
    write_log(&dir.join("data.json"), &rows);
    let report = mock_distributor(&settings).run().unwrap();
    assert_eq!(
        report.plan.instructions().iter().map(|i| i.amount).collect::<Vec<_>>(),
        vec![9]
    );
    assert_eq!(record_lines(&dir), vec![(peer_address(2).to_base58(), 9)]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_malformed_log_line_reported() {
    let dir = workdir("malformed");
    let (settings, _) = setup(&dir, 10, serde_json::json!({}));
    let good = serde_json::json!({
        "peer_pubkey": "p1",
        "address": peer_address(1).to_base58(),
        "value": 1,
    });
    std::fs::write(dir.join("data.json"), format!("{}\n{{not json\n", good)).unwrap();

    let distributor = mock_distributor(&settings);
    let err = distributor.run().unwrap_err();
    assert!(matches!(err, DistributorError::Bonus(BonusError::Parse { line: 2, .. })));
    assert!(distributor.ledger().mock_submissions().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_blank_line_between_records_reported() {
    let dir = workdir("blank-line");
    let (settings, _) = setup(&dir, 10, serde_json::json!({}));
    let good = serde_json::json!({
        "peer_pubkey": "p1",
        "address": peer_address(1).to_base58(),
        "value": 1,
    });
    std::fs::write(dir.join("data.json"), format!("{}\n\n{}\n", good, good)).unwrap();

    let distributor = mock_distributor(&settings);
    let err = distributor.run().unwrap_err();
    assert!(matches!(err, DistributorError::Bonus(BonusError::Parse { line: 2, .. })));
    assert!(distributor.ledger().mock_submissions().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_wrong_wallet_password_rejected() {
    let dir = workdir("password");
    let (settings, _) = setup(&dir, 10, serde_json::json!({}));
    assert!(resolve_account(&settings.wallet_file, "not the password").is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
