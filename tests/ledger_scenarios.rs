//! End-to-end ledger scenarios through the public API.
//!
//! Everything here uses only what the root crate re-exports.

use tally::{Command, Database, Error, Ledger, Output, Tally, TallyConfig};
use tempfile::TempDir;

fn fast_config() -> TallyConfig {
    TallyConfig {
        durability: "always".into(),
        password_cost: 4,
    }
}

/// In-memory ledger with cheap password hashing
fn cache() -> Tally {
    Tally::from_ledger(Ledger::new(Database::ephemeral_with_config(fast_config())))
}

#[test]
fn alice_welcome_mug() {
    let dir = TempDir::new().unwrap();
    let db = Tally::open_with_config(dir.path(), fast_config()).unwrap();

    let alice = db.create_user("alice", "pw").unwrap();
    assert_eq!(alice.points, 0);

    let welcome = db.create_token("welcome", 100).unwrap();
    assert_eq!(
        db.redeem_token(&alice.id, &welcome.unique_code)
            .unwrap()
            .points,
        100
    );

    let mug = db.create_prize("mug", 50, 2).unwrap();
    assert_eq!(db.exchange_prize(&alice.id, &mug.id).unwrap().amount, 1);
    assert_eq!(db.get_user(&alice.id).unwrap().points, 50);
    assert_eq!(db.exchange_prize(&alice.id, &mug.id).unwrap().amount, 0);
    assert_eq!(db.get_user(&alice.id).unwrap().points, 0);

    assert!(matches!(
        db.exchange_prize(&alice.id, &mug.id),
        Err(Error::InsufficientFundsOrStock { amount: 0, .. })
    ));
    assert_eq!(db.list_prizes().unwrap()[0].amount, 0);
}

#[test]
fn ids_are_unique_and_immediately_readable() {
    let dir = TempDir::new().unwrap();
    let db = Tally::open_with_config(dir.path(), fast_config()).unwrap();

    let mut ids = Vec::new();
    for i in 0..20 {
        let user = db.create_user(&format!("user{i}"), "pw").unwrap();
        assert_eq!(db.get_user(&user.id).unwrap(), user);
        ids.push(user.id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(db.list_users().unwrap().len(), 20);
}

#[test]
fn rejected_requests_leave_no_trace() {
    let db = cache();

    assert!(matches!(
        db.create_user("", ""),
        Err(Error::InvalidInput { ref fields, .. }) if fields == &["username", "password"]
    ));
    assert!(matches!(
        db.create_token("free", 0),
        Err(Error::InvalidInput { .. })
    ));
    assert!(matches!(
        db.redeem_token("ghost", "nothing"),
        Err(Error::UserNotFound { .. })
    ));

    let info = db.info().unwrap();
    assert_eq!((info.users, info.tokens, info.prizes), (0, 0, 0));
    assert_eq!(info.commit_version, 0);
}

#[test]
fn tokens_are_reusable_across_users() {
    let db = cache();
    let token = db.create_token("standing offer", 5).unwrap();

    for name in ["a", "b", "c"] {
        let user = db.create_user(name, "pw").unwrap();
        for _ in 0..2 {
            db.redeem_token(&user.id, &token.unique_code).unwrap();
        }
        assert_eq!(db.get_user(&user.id).unwrap().points, 10);
    }
    assert_eq!(db.list_tokens().unwrap(), vec![token]);
}

#[test]
fn state_survives_reopen_and_compaction() {
    let dir = TempDir::new().unwrap();
    let (user_id, prize_id) = {
        let db = Tally::open_with_config(dir.path(), fast_config()).unwrap();
        let user = db.create_user("bob", "pw").unwrap();
        let token = db.create_token("t", 25).unwrap();
        let prize = db.create_prize("pen", 20, 3).unwrap();
        for _ in 0..4 {
            db.redeem_token(&user.id, &token.unique_code).unwrap();
        }
        db.exchange_prize(&user.id, &prize.id).unwrap();
        assert_eq!(db.compact().unwrap(), 3);
        db.exchange_prize(&user.id, &prize.id).unwrap();
        (user.id, prize.id)
    };

    let db = Tally::open_with_config(dir.path(), fast_config()).unwrap();
    assert_eq!(db.get_user(&user_id).unwrap().points, 60);
    let prize = db
        .list_prizes()
        .unwrap()
        .into_iter()
        .find(|p| p.id == prize_id)
        .unwrap();
    assert_eq!(prize.amount, 1);
}

#[test]
fn commands_from_json() {
    let db = cache();
    let script = r#"[
        {"CreateUser": {"username": "carol", "password": "pw"}},
        {"CreateToken": {"name": "bonus", "point": 7}},
        "ListUsers"
    ]"#;
    let cmds: Vec<Command> = serde_json::from_str(script).unwrap();
    let results = db.executor().execute_many(cmds);

    assert!(results.iter().all(|r| r.is_ok()));
    match &results[2] {
        Ok(Output::Users(users)) => assert_eq!(users[0].username, "carol"),
        other => panic!("Expected Users, got {:?}", other),
    }
}
