//! Integrationstests fuer den Zustellrouter gegen eine In-Memory-SQLite

use std::sync::Arc;

use chrono::Utc;
use kurier_auth::{AuthError, PasswortParameter};
use kurier_chat::ChatError;
use kurier_core::Zustellung;
use kurier_crypto::{nachricht_oeffnen, nachricht_versiegeln_fuer, schluesselpaar_erzeugen};
use kurier_db::SqliteDb;
use kurier_delivery::{
    FanoutPolitik, PresencePolitik, PresenceTracker, ZustellConfig, ZustellFehler,
    Zustellrouter, Zustellstatus,
};
use kurier_observability::KurierMetriken;

fn schnelle_parameter() -> PasswortParameter {
    PasswortParameter {
        speicher_kib: 1024,
        iterationen: 1,
        parallelitaet: 1,
    }
}

async fn router_mit(config: ZustellConfig, namen: &[&str]) -> Zustellrouter<SqliteDb> {
    let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory DB"));
    let presence = PresenceTracker::neu(config.presence_politik, config.push_queue_groesse);
    let router = Zustellrouter::neu(db, presence, config, schnelle_parameter());
    for name in namen {
        router
            .register()
            .registrieren(name, "passwort", "pk", None)
            .await
            .expect("Registrierung");
    }
    router
}

async fn router(namen: &[&str]) -> Zustellrouter<SqliteDb> {
    router_mit(ZustellConfig::default(), namen).await
}

// ---------------------------------------------------------------------------
// Direktnachrichten
// ---------------------------------------------------------------------------

#[tokio::test]
async fn offline_empfaenger_wird_gespeichert_und_einmal_abgeholt() {
    let r = router(&["alice", "bob"]).await;

    let status = r.direkt_senden("alice", "bob", vec![7; 32]).await.unwrap();
    let Zustellstatus::Gespeichert { nachricht_id } = status else {
        panic!("bob ist offline, Nachricht muss gespeichert werden");
    };
    assert_eq!(r.postfach().unzugestellt_anzahl("bob").await.unwrap(), 1);

    let erste = r.direkt_abholen("bob").await.unwrap();
    assert_eq!(erste.len(), 1);
    assert_eq!(erste[0].id, nachricht_id);
    assert_eq!(erste[0].absender, "alice");
    assert_eq!(erste[0].chiffrat, vec![7; 32]);

    let zweite = r.direkt_abholen("bob").await.unwrap();
    assert!(zweite.is_empty());
}

#[tokio::test]
async fn online_empfaenger_bekommt_push_ohne_postfach() {
    let r = router(&["alice", "bob"]).await;
    let mut sitzung = r.presence().verbinden("bob").unwrap();

    let status = r.direkt_senden("alice", "bob", vec![1, 2, 3]).await.unwrap();
    assert_eq!(status, Zustellstatus::LiveZugestellt);

    match sitzung.empfaenger.try_recv().unwrap() {
        Zustellung::Direkt { absender, chiffrat, .. } => {
            assert_eq!(absender, "alice");
            assert_eq!(chiffrat, vec![1, 2, 3]);
        }
        andere => panic!("unerwartete Zustellung: {andere:?}"),
    }
    assert_eq!(r.postfach().unzugestellt_anzahl("bob").await.unwrap(), 0);
}

#[tokio::test]
async fn abholen_in_erstellungsreihenfolge() {
    let r = router(&["alice", "bob", "bob2"]).await;
    for i in 1..=3u8 {
        r.direkt_senden("alice", "bob", vec![i]).await.unwrap();
    }
    r.direkt_senden("bob2", "bob", vec![4]).await.unwrap();

    let nachrichten = r.direkt_abholen("bob").await.unwrap();
    let inhalte: Vec<u8> = nachrichten.iter().map(|n| n.chiffrat[0]).collect();
    assert_eq!(inhalte, vec![1, 2, 3, 4]);
    assert!(nachrichten.iter().all(|n| n.zugestellt));
}

#[tokio::test]
async fn unbekannter_empfaenger_ohne_seiteneffekt() {
    let r = router(&["alice"]).await;
    let ergebnis = r.direkt_senden("alice", "ghost", vec![1]).await;
    assert!(matches!(ergebnis, Err(ZustellFehler::UnbekannterEmpfaenger(n)) if n == "ghost"));
    assert!(r.register().freunde_von("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn unbekannter_absender_wird_abgelehnt() {
    let r = router(&["bob"]).await;
    let ergebnis = r.direkt_senden("mallory", "bob", vec![1]).await;
    assert!(matches!(ergebnis, Err(ZustellFehler::AbsenderUnbekannt(_))));
    assert_eq!(r.postfach().unzugestellt_anzahl("bob").await.unwrap(), 0);
}

#[tokio::test]
async fn chiffrat_grenzen() {
    let config = ZustellConfig {
        max_chiffrat_bytes: 16,
        ..ZustellConfig::default()
    };
    let r = router_mit(config, &["alice", "bob"]).await;

    assert!(matches!(
        r.direkt_senden("alice", "bob", Vec::new()).await,
        Err(ZustellFehler::UngueltigeEingabe(_))
    ));
    assert!(matches!(
        r.direkt_senden("alice", "bob", vec![0; 17]).await,
        Err(ZustellFehler::UngueltigeEingabe(_))
    ));
    assert!(r.direkt_senden("alice", "bob", vec![0; 16]).await.is_ok());
}

#[tokio::test]
async fn abholen_fuer_unbekannten_benutzer() {
    let r = router(&["alice"]).await;
    assert!(matches!(
        r.direkt_abholen("ghost").await,
        Err(ZustellFehler::BenutzerNichtGefunden(_))
    ));
}

#[tokio::test]
async fn freundschaft_wird_beim_ersten_senden_eingetragen() {
    let r = router(&["alice", "bob", "carol"]).await;
    let _bob = r.presence().verbinden("bob").unwrap();

    // Live-Pfad
    r.direkt_senden("alice", "bob", vec![1]).await.unwrap();
    // Postfach-Pfad
    r.direkt_senden("carol", "alice", vec![2]).await.unwrap();
    // Wiederholung bleibt idempotent
    r.direkt_senden("alice", "bob", vec![3]).await.unwrap();

    assert_eq!(r.register().freunde_von("alice").await.unwrap(), vec!["bob", "carol"]);
    assert_eq!(r.register().freunde_von("bob").await.unwrap(), vec!["alice"]);
}

#[tokio::test]
async fn nachricht_an_sich_selbst_ohne_freundschaft() {
    let r = router(&["alice"]).await;
    r.direkt_senden("alice", "alice", vec![1]).await.unwrap();
    assert!(r.register().freunde_von("alice").await.unwrap().is_empty());
    assert_eq!(r.direkt_abholen("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn lesebestaetigung_nur_durch_empfaenger() {
    let r = router(&["alice", "bob"]).await;
    let Zustellstatus::Gespeichert { nachricht_id } =
        r.direkt_senden("alice", "bob", vec![9]).await.unwrap()
    else {
        panic!("muss gespeichert werden");
    };

    let fremd = r.gelesen_bestaetigen("alice", nachricht_id).await;
    assert!(matches!(
        fremd,
        Err(ZustellFehler::Chat(ChatError::NachrichtNichtGefunden(_)))
    ));

    r.gelesen_bestaetigen("bob", nachricht_id).await.unwrap();
    // Idempotent
    r.gelesen_bestaetigen("bob", nachricht_id).await.unwrap();
    assert!(r.postfach().nachricht_laden(nachricht_id).await.unwrap().gelesen);
}

#[tokio::test]
async fn volle_queue_faellt_auf_postfach_zurueck() {
    let config = ZustellConfig {
        push_queue_groesse: 1,
        ..ZustellConfig::default()
    };
    let metriken = KurierMetriken::neu().unwrap();
    let r = router_mit(config, &["alice", "bob"])
        .await
        .mit_metriken(metriken.clone());
    let _sitzung = r.presence().verbinden("bob").unwrap();

    assert_eq!(
        r.direkt_senden("alice", "bob", vec![1]).await.unwrap(),
        Zustellstatus::LiveZugestellt
    );
    let zweite = r.direkt_senden("alice", "bob", vec![2]).await.unwrap();
    assert!(matches!(zweite, Zustellstatus::Gespeichert { .. }));

    assert_eq!(metriken.direct_live_total.get(), 1);
    assert_eq!(metriken.direct_stored_total.get(), 1);
    assert_eq!(metriken.delivery_misses_total.get(), 1);

    r.direkt_abholen("bob").await.unwrap();
    assert_eq!(metriken.drained_messages_total.get(), 1);
}

#[tokio::test]
async fn geschlossene_sitzung_ist_kein_systemfehler() {
    let r = router(&["alice", "bob"]).await;
    let sitzung = r.presence().verbinden("bob").unwrap();
    // Empfangsseite weg, Eintrag im Tracker noch vorhanden
    drop(sitzung.empfaenger);

    let status = r.direkt_senden("alice", "bob", vec![5]).await.unwrap();
    assert!(matches!(status, Zustellstatus::Gespeichert { .. }));
}

#[tokio::test]
async fn ende_zu_ende_verschluesselt() {
    let r = router(&["alice"]).await;
    let bob_schluessel = schluesselpaar_erzeugen().unwrap();
    r.register()
        .registrieren("bob", "pw", &bob_schluessel.oeffentlich.als_text(), None)
        .await
        .unwrap();

    let pk = r.register().public_key_von("bob").await.unwrap();
    let chiffrat = nachricht_versiegeln_fuer(b"hallo bob", &pk).unwrap();
    r.direkt_senden("alice", "bob", chiffrat).await.unwrap();

    let nachrichten = r.direkt_abholen("bob").await.unwrap();
    let klartext = nachricht_oeffnen(&nachrichten[0].chiffrat, &bob_schluessel.privat).unwrap();
    assert_eq!(klartext, b"hallo bob");
}

// ---------------------------------------------------------------------------
// Presence-Politik
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ersetzen_pusht_nur_an_neue_sitzung() {
    let r = router(&["alice", "bob"]).await;
    let mut erste = r.presence().verbinden("alice").unwrap();
    let mut zweite = r.presence().verbinden("alice").unwrap();

    assert_eq!(
        r.presence().ist_online("alice").unwrap().sitzung_id(),
        zweite.handle.sitzung_id
    );

    r.direkt_senden("bob", "alice", vec![1]).await.unwrap();
    assert!(zweite.empfaenger.try_recv().is_ok());
    assert!(erste.empfaenger.try_recv().is_err());

    // Veraltetes Trennen laesst die neue Sitzung online
    assert!(!r.presence().trennen(&erste.handle));
    assert!(r.presence().ist_online("alice").is_some());
}

#[tokio::test]
async fn ablehnen_behaelt_erste_sitzung() {
    let config = ZustellConfig {
        presence_politik: PresencePolitik::Ablehnen,
        ..ZustellConfig::default()
    };
    let r = router_mit(config, &["alice", "bob"]).await;
    let mut erste = r.presence().verbinden("alice").unwrap();

    assert!(matches!(
        r.presence().verbinden("alice"),
        Err(ZustellFehler::BereitsVerbunden(_))
    ));

    r.direkt_senden("bob", "alice", vec![1]).await.unwrap();
    assert!(erste.empfaenger.try_recv().is_ok());
}

#[tokio::test]
async fn trennen_fuehrt_zurueck_ins_postfach() {
    let r = router(&["alice", "bob"]).await;
    let sitzung = r.presence().verbinden("bob").unwrap();
    assert!(r.presence().trennen(&sitzung.handle));

    let status = r.direkt_senden("alice", "bob", vec![1]).await.unwrap();
    assert!(matches!(status, Zustellstatus::Gespeichert { .. }));
}

// ---------------------------------------------------------------------------
// Gruppen
// ---------------------------------------------------------------------------

async fn gruppe_g(r: &Zustellrouter<SqliteDb>) {
    r.gruppen()
        .erstellen("G", "alice", &["bob".to_string(), "carol".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn nicht_mitglied_wird_vor_persistenz_abgelehnt() {
    let r = router(&["alice", "bob", "carol", "eve"]).await;
    gruppe_g(&r).await;

    let ergebnis = r.gruppe_senden("G", "eve", vec![1]).await;
    assert!(matches!(
        ergebnis,
        Err(ZustellFehler::Chat(ChatError::KeinMitglied { .. }))
    ));
    assert!(r
        .postfach()
        .gruppennachrichten_seit("G", None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unbekannte_gruppe() {
    let r = router(&["alice"]).await;
    assert!(matches!(
        r.gruppe_senden("nirgendwo", "alice", vec![1]).await,
        Err(ZustellFehler::Chat(ChatError::GruppeNichtGefunden(_)))
    ));
}

#[tokio::test]
async fn fanout_an_online_mitglieder() {
    let r = router(&["alice", "bob", "carol"]).await;
    gruppe_g(&r).await;
    let t0 = Utc::now() - chrono::Duration::seconds(1);

    let mut alice = r.presence().verbinden("alice").unwrap();
    let mut bob = r.presence().verbinden("bob").unwrap();

    let ergebnis = r.gruppe_senden("G", "alice", vec![42]).await.unwrap();
    assert_eq!(ergebnis.live_zugestellt, 1);
    assert_eq!(ergebnis.verpasst, 0);

    match bob.empfaenger.try_recv().unwrap() {
        Zustellung::Gruppe { gruppe, absender, chiffrat, .. } => {
            assert_eq!(gruppe, "G");
            assert_eq!(absender, "alice");
            assert_eq!(chiffrat, vec![42]);
        }
        andere => panic!("unerwartete Zustellung: {andere:?}"),
    }
    // Absender standardmaessig ausgeschlossen
    assert!(alice.empfaenger.try_recv().is_err());

    // carol war offline und holt spaeter aus dem Log
    let mut carol = r.presence().verbinden("carol").unwrap();
    assert!(carol.empfaenger.try_recv().is_err());
    let log = r.gruppennachrichten_seit("carol", "G", Some(t0)).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0], ergebnis.nachricht);
}

#[tokio::test]
async fn fanout_mit_absender() {
    let config = ZustellConfig {
        fanout_politik: FanoutPolitik::AbsenderEinschliessen,
        ..ZustellConfig::default()
    };
    let r = router_mit(config, &["alice", "bob", "carol"]).await;
    gruppe_g(&r).await;
    let mut alice = r.presence().verbinden("alice").unwrap();
    let _bob = r.presence().verbinden("bob").unwrap();

    let ergebnis = r.gruppe_senden("G", "alice", vec![1]).await.unwrap();
    assert_eq!(ergebnis.live_zugestellt, 2);
    assert!(alice.empfaenger.try_recv().is_ok());
}

#[tokio::test]
async fn fanout_fehler_bricht_nicht_ab() {
    let config = ZustellConfig {
        push_queue_groesse: 1,
        ..ZustellConfig::default()
    };
    let metriken = KurierMetriken::neu().unwrap();
    let r = router_mit(config, &["alice", "bob", "carol"])
        .await
        .mit_metriken(metriken.clone());
    gruppe_g(&r).await;

    let bob = r.presence().verbinden("bob").unwrap();
    let mut carol = r.presence().verbinden("carol").unwrap();
    drop(bob.empfaenger);

    let ergebnis = r.gruppe_senden("G", "alice", vec![1]).await.unwrap();
    assert_eq!(ergebnis.verpasst, 1);
    assert_eq!(ergebnis.live_zugestellt, 1);
    assert!(carol.empfaenger.try_recv().is_ok());
    assert_eq!(
        r.postfach().gruppennachrichten_seit("G", None).await.unwrap().len(),
        1
    );
    assert_eq!(metriken.group_messages_total.get(), 1);
    assert_eq!(metriken.fanout_pushes_total.get(), 1);
    assert_eq!(metriken.delivery_misses_total.get(), 1);
}

#[tokio::test]
async fn gruppenlog_nur_fuer_mitglieder() {
    let r = router(&["alice", "bob", "carol", "eve"]).await;
    gruppe_g(&r).await;
    r.gruppe_senden("G", "bob", vec![1]).await.unwrap();

    assert!(matches!(
        r.gruppennachrichten_seit("eve", "G", None).await,
        Err(ZustellFehler::Chat(ChatError::KeinMitglied { .. }))
    ));

    r.gruppen().beitreten("G", "eve").await.unwrap();
    assert_eq!(r.gruppennachrichten_seit("eve", "G", None).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Schluesselregister ueber den Router
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registrierung_und_anmeldung() {
    let r = router(&["alice"]).await;

    assert!(matches!(
        r.register().registrieren("alice", "x", "pk", None).await,
        Err(AuthError::IdentitaetVergeben(_))
    ));
    assert!(matches!(
        r.register().authentifizieren("alice", "wrongpw").await,
        Err(AuthError::UngueltigeAnmeldedaten)
    ));
    assert!(matches!(
        r.register().authentifizieren("ghost", "anything").await,
        Err(AuthError::BenutzerNichtGefunden(_))
    ));
    assert!(r.register().authentifizieren("alice", "passwort").await.is_ok());
}
