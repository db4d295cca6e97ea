//! Integration-Tests fuer GruppenRepository (In-Memory SQLite)

use kurier_db::{
    models::{NeueGruppe, NeueIdentitaet},
    GruppenRepository, IdentitaetRepository, SqliteDb,
};

async fn db_mit(namen: &[&str]) -> SqliteDb {
    let db = SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden");
    for name in namen {
        IdentitaetRepository::create(
            &db,
            NeueIdentitaet {
                username: name,
                password_hash: "hash",
                public_key: None,
                encrypted_private_key: None,
            },
        )
        .await
        .unwrap();
    }
    db
}

#[tokio::test]
async fn gruppe_erstellen_und_laden() {
    let db = db_mit(&["alice", "bob", "carol"]).await;
    let mitglieder = vec!["alice".to_string(), "bob".to_string()];

    let gruppe = GruppenRepository::create(
        &db,
        NeueGruppe {
            name: "team",
            creator: "alice",
            members: &mitglieder,
        },
    )
    .await
    .unwrap();
    assert_eq!(gruppe.members, mitglieder);

    GruppenRepository::add_member(&db, "team", "carol")
        .await
        .unwrap();

    let geladen = GruppenRepository::get(&db, "team")
        .await
        .unwrap()
        .expect("Gruppe sollte existieren");
    assert_eq!(geladen.creator, "alice");
    assert_eq!(
        geladen.members,
        vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
    );

    assert!(GruppenRepository::get(&db, "fehlt").await.unwrap().is_none());
}

#[tokio::test]
async fn gruppenname_eindeutig() {
    let db = db_mit(&["alice"]).await;
    let mitglieder = vec!["alice".to_string()];
    let neu = || NeueGruppe {
        name: "team",
        creator: "alice",
        members: &mitglieder,
    };

    GruppenRepository::create(&db, neu()).await.unwrap();
    let err = GruppenRepository::create(&db, neu()).await.unwrap_err();
    assert!(err.ist_eindeutigkeit());
}

#[tokio::test]
async fn doppelte_mitgliedschaft_abgelehnt() {
    let db = db_mit(&["alice", "bob"]).await;
    let mitglieder = vec!["alice".to_string(), "bob".to_string()];
    GruppenRepository::create(
        &db,
        NeueGruppe {
            name: "team",
            creator: "alice",
            members: &mitglieder,
        },
    )
    .await
    .unwrap();

    let err = GruppenRepository::add_member(&db, "team", "bob")
        .await
        .unwrap_err();
    assert!(err.ist_eindeutigkeit());

    let gruppe = GruppenRepository::get(&db, "team").await.unwrap().unwrap();
    assert_eq!(gruppe.members.len(), 2);
}

#[tokio::test]
async fn mitgliedschaft_abfragen() {
    let db = db_mit(&["alice", "bob", "carol"]).await;
    let team = vec!["alice".to_string(), "bob".to_string()];
    let club = vec!["bob".to_string()];
    GruppenRepository::create(
        &db,
        NeueGruppe {
            name: "team",
            creator: "alice",
            members: &team,
        },
    )
    .await
    .unwrap();
    GruppenRepository::create(
        &db,
        NeueGruppe {
            name: "club",
            creator: "bob",
            members: &club,
        },
    )
    .await
    .unwrap();

    assert!(GruppenRepository::is_member(&db, "team", "bob").await.unwrap());
    assert!(!GruppenRepository::is_member(&db, "team", "carol").await.unwrap());
    assert_eq!(
        GruppenRepository::groups_of(&db, "bob").await.unwrap(),
        vec!["club".to_string(), "team".to_string()]
    );
    assert!(GruppenRepository::groups_of(&db, "carol")
        .await
        .unwrap()
        .is_empty());
}
