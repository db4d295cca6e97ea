//! Integration-Tests fuer IdentitaetRepository (In-Memory SQLite)

use kurier_db::{
    models::{NeueIdentitaet, ProfilUpdate},
    IdentitaetRepository, SqliteDb,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

async fn anlegen(db: &SqliteDb, name: &str) {
    IdentitaetRepository::create(
        db,
        NeueIdentitaet {
            username: name,
            password_hash: "hash",
            public_key: Some("pk"),
            encrypted_private_key: None,
        },
    )
    .await
    .expect("Identitaet anlegen fehlgeschlagen");
}

#[tokio::test]
async fn identitaet_erstellen_und_laden() {
    let db = db().await;

    let angelegt = IdentitaetRepository::create(
        &db,
        NeueIdentitaet {
            username: "alice",
            password_hash: "hash_alice",
            public_key: Some("pk_alice"),
            encrypted_private_key: Some("blob_alice"),
        },
    )
    .await
    .unwrap();
    assert_eq!(angelegt.username, "alice");
    assert!(angelegt.friends.is_empty());

    let geladen = IdentitaetRepository::get_by_name(&db, "alice")
        .await
        .unwrap()
        .expect("alice sollte existieren");
    assert_eq!(geladen.password_hash, "hash_alice");
    assert_eq!(geladen.public_key.as_deref(), Some("pk_alice"));
    assert_eq!(geladen.encrypted_private_key.as_deref(), Some("blob_alice"));
    assert_eq!(geladen.created_at, angelegt.created_at);

    assert!(IdentitaetRepository::get_by_name(&db, "bob")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn identitaet_name_eindeutig() {
    let db = db().await;
    anlegen(&db, "carol").await;

    let err = IdentitaetRepository::create(
        &db,
        NeueIdentitaet {
            username: "carol",
            password_hash: "anderer",
            public_key: None,
            encrypted_private_key: None,
        },
    )
    .await
    .unwrap_err();
    assert!(err.ist_eindeutigkeit());
}

#[tokio::test]
async fn existiert_und_schluessel_aktualisieren() {
    let db = db().await;
    anlegen(&db, "dave").await;

    assert!(IdentitaetRepository::exists(&db, "dave").await.unwrap());
    assert!(!IdentitaetRepository::exists(&db, "erin").await.unwrap());

    assert!(IdentitaetRepository::update_public_key(&db, "dave", "pk_neu")
        .await
        .unwrap());
    assert!(!IdentitaetRepository::update_public_key(&db, "erin", "pk")
        .await
        .unwrap());

    let dave = IdentitaetRepository::get_by_name(&db, "dave")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dave.public_key.as_deref(), Some("pk_neu"));
}

#[tokio::test]
async fn profil_aktualisieren_nur_gesetzte_felder() {
    let db = db().await;
    anlegen(&db, "frank").await;

    let ok = IdentitaetRepository::update_profile(
        &db,
        "frank",
        ProfilUpdate {
            display_name: Some("Frank".into()),
            avatar_ref: None,
        },
    )
    .await
    .unwrap();
    assert!(ok);

    IdentitaetRepository::update_profile(
        &db,
        "frank",
        ProfilUpdate {
            display_name: None,
            avatar_ref: Some("avatar://1".into()),
        },
    )
    .await
    .unwrap();

    let frank = IdentitaetRepository::get_by_name(&db, "frank")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frank.display_name.as_deref(), Some("Frank"));
    assert_eq!(frank.avatar_ref.as_deref(), Some("avatar://1"));

    assert!(
        !IdentitaetRepository::update_profile(&db, "niemand", ProfilUpdate::default())
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn freundschaft_beidseitig_und_idempotent() {
    let db = db().await;
    anlegen(&db, "gina").await;
    anlegen(&db, "hank").await;
    anlegen(&db, "ada").await;

    assert!(IdentitaetRepository::add_friendship(&db, "gina", "hank")
        .await
        .unwrap());
    assert!(!IdentitaetRepository::add_friendship(&db, "hank", "gina")
        .await
        .unwrap());
    IdentitaetRepository::add_friendship(&db, "gina", "ada")
        .await
        .unwrap();

    let freunde = IdentitaetRepository::friends_of(&db, "gina").await.unwrap();
    assert_eq!(freunde, vec!["ada".to_string(), "hank".to_string()]);

    let hank = IdentitaetRepository::get_by_name(&db, "hank")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hank.friends, vec!["gina".to_string()]);
}
