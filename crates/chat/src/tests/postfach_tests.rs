//! Unit-Tests fuer das Postfach

use chrono::{Duration, Utc};
use kurier_core::NachrichtId;

use super::test_db;
use crate::{error::ChatError, gruppen::GruppenVerwaltung, postfach::Postfach};

#[tokio::test]
async fn test_anhaengen_und_abholen() {
    let db = test_db(&["alice", "bob"]).await;
    let postfach = Postfach::neu(db);

    let abgelegt = postfach.anhaengen("alice", "bob", b"ct-1").await.unwrap();
    assert!(!abgelegt.zugestellt);
    assert!(!abgelegt.gelesen);
    assert_eq!(postfach.unzugestellt_anzahl("bob").await.unwrap(), 1);

    let abgeholt = postfach.abholen("bob").await.unwrap();
    assert_eq!(abgeholt.len(), 1);
    assert_eq!(abgeholt[0].id, abgelegt.id);
    assert_eq!(abgeholt[0].chiffrat, b"ct-1");
    assert!(abgeholt[0].zugestellt);

    assert!(postfach.abholen("bob").await.unwrap().is_empty());
    assert_eq!(postfach.unzugestellt_anzahl("bob").await.unwrap(), 0);
}

#[tokio::test]
async fn test_abholen_in_erstellungsreihenfolge() {
    let db = test_db(&["alice", "bob", "carol"]).await;
    let postfach = Postfach::neu(db);

    for (i, absender) in ["alice", "carol", "alice", "carol"].iter().enumerate() {
        postfach
            .anhaengen(absender, "bob", format!("ct-{i}").as_bytes())
            .await
            .unwrap();
    }

    let abgeholt = postfach.abholen("bob").await.unwrap();
    let inhalte: Vec<String> = abgeholt
        .iter()
        .map(|n| String::from_utf8(n.chiffrat.clone()).unwrap())
        .collect();
    assert_eq!(inhalte, vec!["ct-0", "ct-1", "ct-2", "ct-3"]);
    assert!(abgeholt
        .windows(2)
        .all(|w| w[0].erstellt_am <= w[1].erstellt_am));
}

#[tokio::test]
async fn test_neue_nachricht_nach_abholen_landet_im_naechsten_abruf() {
    let db = test_db(&["alice", "bob"]).await;
    let postfach = Postfach::neu(db);

    postfach.anhaengen("alice", "bob", b"vorher").await.unwrap();
    assert_eq!(postfach.abholen("bob").await.unwrap().len(), 1);

    postfach.anhaengen("alice", "bob", b"nachher").await.unwrap();
    let zweiter = postfach.abholen("bob").await.unwrap();
    assert_eq!(zweiter.len(), 1);
    assert_eq!(zweiter[0].chiffrat, b"nachher");
}

#[tokio::test]
async fn test_als_gelesen_markieren() {
    let db = test_db(&["alice", "bob"]).await;
    let postfach = Postfach::neu(db);
    let nachricht = postfach.anhaengen("alice", "bob", b"ct").await.unwrap();

    postfach.als_gelesen_markieren(nachricht.id).await.unwrap();
    // Idempotent
    postfach.als_gelesen_markieren(nachricht.id).await.unwrap();

    let geladen = postfach.nachricht_laden(nachricht.id).await.unwrap();
    assert!(geladen.gelesen);
    assert!(!geladen.zugestellt);

    let unbekannt = postfach.als_gelesen_markieren(NachrichtId::new()).await;
    assert!(matches!(unbekannt, Err(ChatError::NachrichtNichtGefunden(_))));
}

#[tokio::test]
async fn test_gruppen_log() {
    let db = test_db(&["alice", "bob"]).await;
    let gruppen = GruppenVerwaltung::neu(db.clone());
    let postfach = Postfach::neu(db);
    gruppen
        .erstellen("G", "alice", &["bob".to_string()])
        .await
        .unwrap();

    let t0 = Utc::now() - Duration::seconds(1);
    postfach
        .gruppennachricht_anhaengen("G", "alice", b"m1")
        .await
        .unwrap();
    postfach
        .gruppennachricht_anhaengen("G", "bob", b"m2")
        .await
        .unwrap();

    let seit = postfach.gruppennachrichten_seit("G", Some(t0)).await.unwrap();
    assert_eq!(seit.len(), 2);
    assert_eq!(seit[0].chiffrat, b"m1");
    assert_eq!(seit[1].absender, "bob");

    // Wiederholt abrufbar
    assert_eq!(
        postfach.gruppennachrichten_seit("G", None).await.unwrap(),
        seit
    );
}

#[test]
fn test_direktnachricht_json_chiffrat_als_base64() {
    let nachricht = crate::types::Direktnachricht {
        id: NachrichtId::new(),
        absender: "alice".into(),
        empfaenger: "bob".into(),
        chiffrat: vec![0xff, 0x00],
        zugestellt: false,
        gelesen: false,
        erstellt_am: Utc::now(),
    };
    let wert = serde_json::to_value(&nachricht).unwrap();
    assert_eq!(wert["chiffrat"], "/wA=");
}
