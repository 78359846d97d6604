mod common;

use common::{owner_hash, save_request, VaultHarness};
use shardkeep::crypto::aead;
use shardkeep::{LogLevel, VaultError, WriteMode};

#[tokio::test]
async fn save_then_fetch_returns_original_payload() {
    let vault = VaultHarness::new();
    let owner = owner_hash("roundtrip");
    let req = save_request(&owner, b"AAAABBBB");

    vault
        .coordinator
        .save(&req, WriteMode::WriteThrough)
        .await
        .unwrap();

    let records = vault.reader.fetch_by_owner(&owner).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, req.id);
    assert_eq!(records[0].payload, b"AAAABBBB");
    assert_eq!(records[0].iv, req.iv);

    // Committed on both shards
    assert_eq!(vault.primary.active_rows(&owner).await.len(), 1);
    assert_eq!(vault.secondary.active_rows(&owner).await.len(), 1);
}

#[tokio::test]
async fn shards_hold_encrypted_halves() {
    let vault = VaultHarness::new();
    let owner = owner_hash("halves");
    let req = save_request(&owner, b"AAAABBBB");

    vault
        .coordinator
        .save(&req, WriteMode::WriteThrough)
        .await
        .unwrap();

    let row_a = vault.primary.active_rows(&owner).await.remove(0);
    let row_b = vault.secondary.active_rows(&owner).await.remove(0);

    // Neither shard stores its half in the clear
    assert!(!row_a.content.windows(4).any(|w| w == b"AAAA"));
    assert!(!row_b.content.windows(4).any(|w| w == b"BBBB"));

    // Each half decrypts only under its own shard's pepper
    let part_a = aead::decrypt(&vault.config.pepper_a, &row_a.content).unwrap();
    let part_b = aead::decrypt(&vault.config.pepper_b, &row_b.content).unwrap();
    assert_eq!(part_a.as_slice(), b"AAAA");
    assert_eq!(part_b.as_slice(), b"BBBB");
    assert!(aead::decrypt(&vault.config.pepper_b, &row_a.content).is_err());
}

#[tokio::test]
async fn odd_length_payload_survives_the_split() {
    let vault = VaultHarness::new();
    let owner = owner_hash("odd");
    let req = save_request(&owner, b"ABCDEFGHI");

    vault
        .coordinator
        .save(&req, WriteMode::WriteThrough)
        .await
        .unwrap();

    let records = vault.reader.fetch_by_owner(&owner).await.unwrap();
    assert_eq!(records[0].payload, b"ABCDEFGHI");
}

#[tokio::test]
async fn delete_removes_record_from_both_shards() {
    let vault = VaultHarness::new();
    let owner = owner_hash("delete");
    let req = save_request(&owner, b"AAAABBBB");

    vault
        .coordinator
        .save(&req, WriteMode::WriteThrough)
        .await
        .unwrap();
    let outcome = vault.coordinator.delete(req.id).await.unwrap();

    assert!(outcome.is_complete());
    assert!(vault.reader.fetch_by_owner(&owner).await.unwrap().is_empty());
    assert!(vault.primary.active_rows(&owner).await.is_empty());
    assert!(vault.secondary.active_rows(&owner).await.is_empty());
}

#[tokio::test]
async fn duplicate_id_surfaces_in_force_direct_mode() {
    let vault = VaultHarness::new();
    let owner = owner_hash("dup");
    let req = save_request(&owner, b"AAAABBBB");

    vault
        .coordinator
        .save(&req, WriteMode::ForceDirect)
        .await
        .unwrap();
    let result = vault.coordinator.save(&req, WriteMode::ForceDirect).await;

    assert!(matches!(result, Err(VaultError::PrepareFailed(_))));
}

#[tokio::test]
async fn partial_commit_is_hidden_from_readers() {
    let vault = VaultHarness::new();
    let owner = owner_hash("partial");
    let req = save_request(&owner, b"AAAABBBB");

    // Secondary accepts the prepare but cannot flip to ACTIVE.
    vault.secondary.set_commit_down(true);
    vault
        .coordinator
        .save(&req, WriteMode::WriteThrough)
        .await
        .expect("partial commit still reports success to the caller");

    assert!(vault.sink.count(LogLevel::Warn) >= 1, "partial commit warns");

    // Primary is ACTIVE, secondary stuck in PENDING: the record must be
    // excluded and exactly one integrity alert emitted.
    let records = vault.reader.fetch_by_owner(&owner).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(vault.sink.security_alerts(), 1);
}

#[tokio::test]
async fn records_come_back_in_display_order() {
    let vault = VaultHarness::new();
    let owner = owner_hash("ordering");

    for (payload, order) in [(&b"first_"[..], 2i64), (b"second", 0), (b"third_", 1)] {
        let mut req = save_request(&owner, payload);
        req.order_index = order;
        vault
            .coordinator
            .save(&req, WriteMode::WriteThrough)
            .await
            .unwrap();
    }

    let records = vault.reader.fetch_by_owner(&owner).await.unwrap();
    let orders: Vec<i64> = records.iter().map(|r| r.order_index).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(records[0].payload, b"second");
}
