//! End-to-end scenarios: file in, digest out, record, verify.

use std::sync::Arc;

use rxproof::core::{Digest, Keypair};
use rxproof::ledger::{Ledger, SqliteLedger};
use rxproof::{
    Client, ClientError, DigestProducer, RecordStatus, Registry, RegistryConfig, RxConfig,
};
use rxproof_testkit::{flip_bit, sample_prescription, TestFixture};
use tracing_subscriber::EnvFilter;

/// Route registry logs through the test harness. Set `RUST_LOG` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rxproof=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn scenario_a_record_then_verify() {
    init_tracing();
    let fixture = TestFixture::with_seed([1; 32]);
    let client = fixture.client();
    let file_a = fixture.write_file("a.pdf", &sample_prescription("amoxicillin"));

    let h_a = client.fingerprint(&file_a).unwrap();
    let receipt = client.record_file(&file_a).await.unwrap();

    assert_eq!(receipt.digest, h_a);
    assert_eq!(receipt.status, RecordStatus::Recorded);
    assert!(fixture.registry.is_recorded(&h_a).await.unwrap());
    assert!(client.verify_file(&file_a).await.unwrap().recorded);
}

#[tokio::test]
async fn scenario_b_unrecorded_file_is_absent() {
    init_tracing();
    let fixture = TestFixture::with_seed([2; 32]);
    let client = fixture.client();
    let file_a = fixture.write_file("a.pdf", &sample_prescription("amoxicillin"));
    let file_b = fixture.write_file("b.pdf", &sample_prescription("metformin"));

    client.record_file(&file_a).await.unwrap();

    let verification = client.verify_file(&file_b).await.unwrap();
    assert!(!verification.recorded);
    assert_ne!(verification.digest, client.fingerprint(&file_a).unwrap());
}

#[tokio::test]
async fn scenario_c_second_record_is_noop() {
    init_tracing();
    let fixture = TestFixture::with_seed([3; 32]);
    let client = fixture.client();
    let mut notifications = fixture.registry.subscribe();
    let file_a = fixture.write_file("a.pdf", &sample_prescription("amoxicillin"));

    let first = client.record_file(&file_a).await.unwrap();
    let second = client.record_file(&file_a).await.unwrap();

    assert_eq!(first.status, RecordStatus::Recorded);
    assert_eq!(second.status, RecordStatus::AlreadyRecorded);
    assert_eq!(second.notification, first.notification);
    assert!(client.verify_file(&file_a).await.unwrap().recorded);

    assert_eq!(notifications.recv().await.unwrap(), first.notification);
    assert!(notifications.try_recv().is_err());
    assert_eq!(fixture.registry.ledger().notification_count().await.unwrap(), 1);
}

#[tokio::test]
async fn single_bit_change_is_a_different_document() {
    init_tracing();
    let fixture = TestFixture::with_seed([4; 32]);
    let client = fixture.client();
    let original = sample_prescription("warfarin");
    let path = fixture.write_file("original.pdf", &original);
    client.record_file(&path).await.unwrap();

    // Past the "%PDF" magic so both still sniff as PDF.
    for bit in [40, 200, original.len() * 8 - 1] {
        let tampered = fixture.write_file(&format!("tampered-{bit}.pdf"), &flip_bit(&original, bit));
        let verification = client.verify_file(&tampered).await.unwrap();
        assert!(!verification.recorded, "bit {bit} flip verified as recorded");
    }
}

#[tokio::test]
async fn presence_is_monotonic() {
    init_tracing();
    let fixture = TestFixture::with_seed([5; 32]);
    let client = fixture.client();
    let digests: Vec<Digest> = (0..10u8).map(|i| Digest::sha256(&[i; 16])).collect();

    for (i, digest) in digests.iter().enumerate() {
        client.record_digest(*digest).await.unwrap();
        for (j, earlier) in digests.iter().enumerate() {
            assert_eq!(
                fixture.registry.is_recorded(earlier).await.unwrap(),
                j <= i,
                "digest {j} after recording {i}"
            );
        }
    }
}

#[tokio::test]
async fn any_caller_may_record_and_verify() {
    init_tracing();
    let fixture = TestFixture::with_seed([6; 32]);
    let path = fixture.write_file("rx.pdf", &sample_prescription("lisinopril"));

    let pharmacist = fixture.party([60; 32]);
    let auditor = fixture.party([61; 32]);

    let receipt = pharmacist.record_file(&path).await.unwrap();
    assert_eq!(receipt.notification.recorded_by, pharmacist.caller_id());

    let again = auditor.record_file(&path).await.unwrap();
    assert_eq!(again.status, RecordStatus::AlreadyRecorded);
    assert_eq!(again.notification.recorded_by, pharmacist.caller_id());
    assert!(auditor.verify_file(&path).await.unwrap().recorded);
}

#[tokio::test]
async fn concurrent_records_commit_once() {
    init_tracing();
    let fixture = TestFixture::with_seed([7; 32]);
    let digest = Digest::sha256(b"shared prescription");

    let mut handles = Vec::new();
    for i in 0..16u8 {
        let client = fixture.party([i + 100; 32]);
        handles.push(tokio::spawn(async move {
            client.record_digest(digest).await
        }));
    }

    let mut new = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_new() {
            new += 1;
        }
    }
    assert_eq!(new, 1);
    assert_eq!(fixture.registry.ledger().notification_count().await.unwrap(), 1);
}

#[tokio::test]
async fn oversize_file_never_reaches_registry() {
    init_tracing();
    let fixture = TestFixture::with_seed([8; 32]);
    let client = Client::new(
        fixture.keypair.clone(),
        Arc::clone(&fixture.registry),
        DigestProducer::new(Default::default(), 64),
    );
    let path = fixture.write_file("big.txt", &[b'x'; 65]);

    assert!(matches!(
        client.record_file(&path).await,
        Err(ClientError::InvalidInput(_))
    ));
    assert_eq!(fixture.registry.ledger().notification_count().await.unwrap(), 0);
}

#[tokio::test]
async fn sqlite_registry_survives_restart() {
    init_tracing();
    let fixture = TestFixture::with_seed([9; 32]);
    let db = fixture.dir().join("ledger.db");
    let path = fixture.write_file("rx.pdf", &sample_prescription("atorvastatin"));
    let config = RxConfig::default();

    let digest = {
        let registry = Arc::new(Registry::new(
            SqliteLedger::open(&db).unwrap(),
            config.registry_config(),
        ));
        let client = Client::new(Keypair::from_seed(&[9; 32]), registry, config.producer());
        client.record_file(&path).await.unwrap().digest
    };

    let registry = Arc::new(Registry::new(
        SqliteLedger::open(&db).unwrap(),
        RegistryConfig::default(),
    ));
    let client = Client::new(Keypair::generate(), Arc::clone(&registry), config.producer());

    let verification = client.verify_file(&path).await.unwrap();
    assert_eq!(verification.digest, digest);
    assert!(verification.recorded);

    let log = registry.ledger().notifications_since(0, 10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].digest, digest);
    assert_eq!(log[0].recorded_by, Keypair::from_seed(&[9; 32]).caller_id());
}
