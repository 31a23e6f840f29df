use std::sync::Arc;

use flash::{Catalog, FlashMap, FlashMessage, FlashStorage};

/// Run one request: restore from the session blob, let the handler act, sweep, persist.
fn request(session: &mut Option<String>, handler: impl FnOnce(&mut FlashStorage)) -> anyhow::Result<FlashMap> {
    let restored: Option<FlashMap> = match session.as_deref() {
        Some(blob) => Some(serde_json::from_str(blob)?),
        None => None,
    };
    let mut flash = FlashStorage::new(restored);
    handler(&mut flash);
    let seen = flash.to_map();
    flash.sweep();
    *session = Some(serde_json::to_string(flash.now())?);
    Ok(seen)
}

#[test]
fn message_is_visible_for_exactly_one_request() -> anyhow::Result<()> {
    let mut session = None;

    let seen = request(&mut session, |f| f.set_error("Login failed").unwrap())?;
    assert!(seen.is_empty());

    let seen = request(&mut session, |f| assert_eq!(f.error(), Some("Login failed")))?;
    assert_eq!(seen.len(), 1);

    let seen = request(&mut session, |f| assert_eq!(f.error(), None))?;
    assert!(seen.is_empty());
    Ok(())
}

#[test]
fn keep_extends_visibility_by_one_request() -> anyhow::Result<()> {
    let mut session = None;
    request(&mut session, |f| {
        f.set_notice("Saved").unwrap();
        f.set_success("Done").unwrap();
    })?;
    request(&mut session, |f| f.keep("notice"))?;
    let seen = request(&mut session, |_| {})?;
    assert_eq!(seen.get("notice").map(String::as_str), Some("Saved"));
    assert!(seen.get("success").is_none());
    let seen = request(&mut session, |_| {})?;
    assert!(seen.is_empty());
    Ok(())
}

#[test]
fn discard_cancels_pending_message() -> anyhow::Result<()> {
    let mut session = None;
    request(&mut session, |f| {
        f.set_notice("Pending").unwrap();
        f.discard("notice");
    })?;
    let seen = request(&mut session, |_| {})?;
    assert!(seen.is_empty());
    Ok(())
}

#[test]
fn localized_messages_survive_persistence() -> anyhow::Result<()> {
    let catalog = Arc::new(Catalog::from_toml_str("en", "[en.login]\nfailed = \"Invalid login\"\n")?);
    let mut session = None;
    let restored: Option<FlashMap> = None;
    let mut flash = FlashStorage::new(restored).with_translator(catalog);
    flash.set_error(FlashMessage::localized("login.failed"))?;
    flash.sweep();
    session.replace(serde_json::to_string(flash.now())?);

    let seen = request(&mut session, |_| {})?;
    assert_eq!(seen.get("error").map(String::as_str), Some("Invalid login"));
    Ok(())
}

#[test]
fn session_order_is_preserved() -> anyhow::Result<()> {
    let mut session = Some(r#"{"notice":"Flash Notice","success":"Flash Success"}"#.to_string());
    let seen = request(&mut session, |f| {
        let pairs: Vec<_> = f.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![("notice".to_string(), "Flash Notice".to_string()), ("success".to_string(), "Flash Success".to_string())]
        );
    })?;
    assert_eq!(seen.len(), 2);
    Ok(())
}
