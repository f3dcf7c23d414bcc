//! Tests for the typed `Tally` API.

use super::test_tally;
use crate::{Error, Tally};
use tally_core::password::MIN_COST;
use tally_engine::TallyConfig;
use tempfile::TempDir;

#[test]
fn test_welcome_mug_scenario() {
    let db = test_tally();

    let alice = db.create_user("alice", "pw").unwrap();
    assert_eq!(alice.points, 0);

    let welcome = db.create_token("welcome", 100).unwrap();
    let alice = db.redeem_token(&alice.id, &welcome.unique_code).unwrap();
    assert_eq!(alice.points, 100);

    let mug = db.create_prize("mug", 50, 2).unwrap();
    let mug = db.exchange_prize(&alice.id, &mug.id).unwrap();
    assert_eq!(mug.amount, 1);
    assert_eq!(db.get_user(&alice.id).unwrap().points, 50);

    let mug = db.exchange_prize(&alice.id, &mug.id).unwrap();
    assert_eq!(mug.amount, 0);
    assert_eq!(db.get_user(&alice.id).unwrap().points, 0);

    let err = db.exchange_prize(&alice.id, &mug.id).unwrap_err();
    assert_eq!(
        err,
        Error::InsufficientFundsOrStock {
            points: 0,
            cost: 50,
            amount: 0
        }
    );
    assert_eq!(db.list_prizes().unwrap()[0].amount, 0);
}

#[test]
fn test_validation_lists_missing_fields() {
    let db = test_tally();
    let err = db.create_prize("", 0, 3).unwrap_err();
    match err {
        Error::InvalidInput { fields, .. } => assert_eq!(fields, vec!["name", "point"]),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
    assert!(db.list_prizes().unwrap().is_empty());

    let err = db.redeem_token("", "t").unwrap_err();
    assert!(matches!(err, Error::InvalidInput { fields, .. } if fields == vec!["user_id"]));
}

#[test]
fn test_info_counts_records() {
    let db = test_tally();
    db.create_user("a", "pw").unwrap();
    db.create_token("t", 1).unwrap();
    db.create_prize("p", 1, 1).unwrap();

    let info = db.info().unwrap();
    assert_eq!((info.users, info.tokens, info.prizes), (1, 1, 1));
    assert_eq!(info.durability, "ephemeral");
    assert_eq!(info.commit_version, 3);
    assert_eq!(info.txns_committed, 3);
}

#[test]
fn test_open_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let config = TallyConfig {
        durability: "always".into(),
        password_cost: MIN_COST,
    };

    let user_id = {
        let db = Tally::open_with_config(dir.path(), config.clone()).unwrap();
        let user = db.create_user("alice", "pw").unwrap();
        let token = db.create_token("t", 40).unwrap();
        db.redeem_token(&user.id, &token.unique_code).unwrap();
        db.flush().unwrap();
        user.id
    };

    let db = Tally::open_with_config(dir.path(), config).unwrap();
    assert_eq!(db.get_user(&user_id).unwrap().points, 40);
    assert_eq!(db.info().unwrap().durability, "strict");
    assert_eq!(db.compact().unwrap(), 2);
    assert_eq!(db.get_user(&user_id).unwrap().points, 40);
}
