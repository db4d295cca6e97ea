mod postfach_tests;

use std::sync::Arc;

use kurier_db::{models::NeueIdentitaet, IdentitaetRepository, SqliteDb};

/// In-Memory-DB mit den angegebenen Identitaeten
pub(crate) async fn test_db(namen: &[&str]) -> Arc<SqliteDb> {
    let db = SqliteDb::in_memory()
        .await
        .expect("In-Memory-DB konnte nicht geoeffnet werden");
    for name in namen {
        IdentitaetRepository::create(
            &db,
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
    Arc::new(db)
}
