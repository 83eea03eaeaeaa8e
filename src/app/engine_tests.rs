use super::*;
use crate::app::config::{DuplicatePolicy, PaletteConfig};
use crate::domain::command::CommandGroup;
use crate::domain::ports::{MockExecutionObserver, MockKeyValueStore, MockRouter};
use crate::infrastructure::keys::ChannelKeySource;
use crate::infrastructure::storage::MemoryStore;
use mockall::predicate::eq;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn permissive_router() -> Arc<MockRouter> {
    let mut router = MockRouter::new();
    router.expect_navigate().returning(|_| Ok(()));
    Arc::new(router)
}

async fn mount(deps: EngineDeps) -> PaletteEngine {
    PaletteEngine::mount(deps, &PaletteConfig::default())
        .await
        .unwrap()
}

async fn engine() -> PaletteEngine {
    mount(EngineDeps::new(permissive_router())).await
}

async fn engine_with(custom: Vec<Command>) -> PaletteEngine {
    let mut deps = EngineDeps::new(permissive_router());
    deps.custom_commands = custom;
    mount(deps).await
}

fn counting(id: &str, hits: &Arc<AtomicUsize>) -> Command {
    let hits = Arc::clone(hits);
    Command::new(
        id,
        format!("Custom {id}"),
        CommandGroup::Custom,
        CommandAction::custom(move || {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    )
}

fn type_text(engine: &mut PaletteEngine, text: &str) {
    for c in text.chars() {
        engine.handle_key(&KeyInput::plain(c.to_string())).unwrap();
    }
}

#[tokio::test]
async fn test_starts_closed_with_empty_query() {
    let engine = engine().await;
    assert!(!engine.is_open());
    assert_eq!(engine.query(), "");
    assert!(engine.recent_ids().is_empty());
    assert!(engine.selected_command().is_none());
}

#[tokio::test]
async fn test_toggle_pairs_restore_state() {
    let mut engine = engine().await;
    for start_open in [false, true] {
        if start_open {
            engine.open();
        } else {
            engine.close();
        }
        engine.handle_key(&KeyInput::meta("k")).unwrap();
        assert_ne!(engine.is_open(), start_open);
        let outcome = engine.handle_key(&KeyInput::ctrl("k")).unwrap();
        assert_eq!(engine.is_open(), start_open);
        assert!(outcome.consumed);
    }
}

#[tokio::test]
async fn test_escape_never_opens() {
    let mut engine = engine().await;
    let outcome = engine.handle_key(&KeyInput::plain("Escape")).unwrap();
    assert_eq!(outcome.decision, KeyDecision::Ignore);
    assert!(!outcome.consumed);
    assert!(!engine.is_open());

    engine.open();
    let outcome = engine.handle_key(&KeyInput::plain("Escape")).unwrap();
    assert_eq!(outcome.decision, KeyDecision::Close);
    assert!(!engine.is_open());
}

#[tokio::test]
async fn test_opening_resets_query() {
    let mut engine = engine().await;
    engine.open();
    engine.set_query("calendar");
    engine.handle_key(&KeyInput::meta("k")).unwrap();
    engine.handle_key(&KeyInput::meta("k")).unwrap();
    assert!(engine.is_open());
    assert_eq!(engine.query(), "");
}

#[tokio::test]
async fn test_set_query_ignored_while_closed() {
    let mut engine = engine().await;
    engine.set_query("cases");
    assert_eq!(engine.query(), "");
}

#[tokio::test]
async fn test_recency_is_bounded_and_deduplicated() {
    let hits = Arc::new(AtomicUsize::new(0));
    let ids = ["A", "B", "C", "D", "E", "F"];
    let mut engine = engine_with(ids.iter().map(|id| counting(id, &hits)).collect()).await;

    for id in ids {
        engine.open();
        engine.select(id).unwrap();
    }
    assert_eq!(engine.recent_ids(), ["F", "E", "D", "C", "B"]);
    assert_eq!(hits.load(Ordering::SeqCst), 6);

    let mut engine = engine_with(ids.iter().map(|id| counting(id, &hits)).collect()).await;
    for id in ["A", "B", "A"] {
        engine.open();
        engine.select(id).unwrap();
    }
    assert_eq!(engine.recent_ids(), ["A", "B"]);
}

#[tokio::test]
async fn test_single_key_shortcut_bypasses_palette() {
    let hits = Arc::new(AtomicUsize::new(0));
    let cmd = counting("custom-export", &hits).with_shortcut("X");
    let mut engine = engine_with(vec![cmd]).await;

    let outcome = engine.handle_key(&KeyInput::meta("x")).unwrap();
    assert_eq!(
        outcome.decision,
        KeyDecision::InvokeCommand("custom-export".to_string())
    );
    assert!(outcome.consumed);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!engine.is_open());
    assert_eq!(engine.recent_ids(), ["custom-export"]);
}

#[tokio::test]
async fn test_kept_duplicate_shortcut_runs_matched_command() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut router = MockRouter::new();
    router.expect_navigate().never();

    let mut deps = EngineDeps::new(Arc::new(router));
    deps.custom_commands = vec![counting("nav-cases", &hits).with_shortcut("X")];
    let config = PaletteConfig {
        duplicate_policy: DuplicatePolicy::KeepBoth,
        ..PaletteConfig::default()
    };
    let mut engine = PaletteEngine::mount(deps, &config).await.unwrap();

    let outcome = engine.handle_key(&KeyInput::ctrl("x")).unwrap();
    assert_eq!(
        outcome.decision,
        KeyDecision::InvokeCommand("nav-cases".to_string())
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!engine.is_open());
    assert_eq!(engine.recent_ids(), ["nav-cases"]);
}

#[tokio::test]
async fn test_failing_shortcut_is_still_consumed() {
    let mut deps = EngineDeps::new(permissive_router());
    deps.custom_commands = vec![Command::new(
        "custom-fail",
        "Always Fails",
        CommandGroup::Custom,
        CommandAction::custom(|| Err(anyhow::anyhow!("boom"))),
    )
    .with_shortcut("F")];
    let mut engine = mount(deps).await;

    let input = KeyInput::meta("f");
    let err = engine.handle_key(&input).unwrap_err();
    assert!(matches!(err, PaletteError::Action { ref id, .. } if id == "custom-fail"));
    assert!(match_shortcut(&input, false, engine.registry().commands()).consumes_event());
    assert!(!engine.is_open());
    assert!(engine.recent_ids().is_empty());
}

#[tokio::test]
async fn test_shortcut_keys_type_while_open() {
    let hits = Arc::new(AtomicUsize::new(0));
    let cmd = counting("custom-export", &hits).with_shortcut("X");
    let mut engine = engine_with(vec![cmd]).await;

    engine.open();
    let outcome = engine.handle_key(&KeyInput::meta("x")).unwrap();
    assert_eq!(outcome.decision, KeyDecision::Ignore);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(engine.is_open());
}

#[tokio::test]
async fn test_navigation_command_uses_router() {
    let mut router = MockRouter::new();
    router
        .expect_navigate()
        .with(eq("/cases"))
        .times(1)
        .returning(|_| Ok(()));
    let mut engine = mount(EngineDeps::new(Arc::new(router))).await;

    engine.open();
    engine.select("nav-cases").unwrap();
    assert!(!engine.is_open());
}

#[tokio::test]
async fn test_observer_notified_once_per_success() {
    let mut observer = MockExecutionObserver::new();
    observer
        .expect_on_command_executed()
        .withf(|cmd| cmd.id() == "help-docs")
        .times(1)
        .return_const(());

    let mut deps = EngineDeps::new(permissive_router());
    deps.observer = Some(Arc::new(observer));
    let mut engine = mount(deps).await;

    engine.open();
    engine.select("help-docs").unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_execution_order_action_record_observer() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let (written_tx, written_rx) = std::sync::mpsc::channel::<String>();

    let mut store = MockKeyValueStore::new();
    store.expect_read_key().returning(|_| Ok(None));
    store.expect_write_key().times(1).returning(move |_, value| {
        let _ = written_tx.send(value.to_string());
        Ok(())
    });

    // The save is spawned when recency is recorded, so a worker delivers the
    // write while the observer waits. Recording after the observer times out.
    let observer_log = Arc::clone(&log);
    let mut observer = MockExecutionObserver::new();
    observer
        .expect_on_command_executed()
        .times(1)
        .returning(move |cmd| {
            let written = written_rx
                .recv_timeout(Duration::from_secs(5))
                .unwrap_or_default();
            observer_log
                .lock()
                .push(format!("observer {} after {written}", cmd.id()));
        });

    let action_log = Arc::clone(&log);
    let step = Command::new(
        "custom-step",
        "Step",
        CommandGroup::Custom,
        CommandAction::custom(move || {
            action_log.lock().push("action".to_string());
            Ok(())
        }),
    );

    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(store));
    deps.observer = Some(Arc::new(observer));
    deps.custom_commands = vec![step];
    let mut engine = mount(deps).await;

    engine.open();
    engine.select("custom-step").unwrap();
    assert!(!engine.is_open());
    engine.flush().await;

    assert_eq!(
        *log.lock(),
        vec![
            "action".to_string(),
            r#"observer custom-step after ["custom-step"]"#.to_string(),
        ]
    );
    assert_eq!(engine.recent_ids(), ["custom-step"]);
}

#[tokio::test]
async fn test_failing_action_still_closes() {
    let mut router = MockRouter::new();
    router
        .expect_navigate()
        .returning(|_| Err(anyhow::anyhow!("router offline")));
    let mut observer = MockExecutionObserver::new();
    observer.expect_on_command_executed().never();

    let mut deps = EngineDeps::new(Arc::new(router));
    deps.observer = Some(Arc::new(observer));
    let mut engine = mount(deps).await;

    engine.open();
    let err = engine.select("nav-settings").unwrap_err();
    assert!(matches!(err, PaletteError::Action { ref id, .. } if id == "nav-settings"));
    assert!(err.to_string().contains("router offline"));
    assert!(!engine.is_open());
    assert!(engine.recent_ids().is_empty());
}

#[tokio::test]
async fn test_select_requires_open_palette() {
    let mut engine = engine().await;
    assert!(matches!(
        engine.select("nav-cases"),
        Err(PaletteError::PaletteClosed)
    ));
    assert!(matches!(
        engine.execute_selected(),
        Err(PaletteError::PaletteClosed)
    ));

    engine.open();
    assert!(matches!(
        engine.select("missing"),
        Err(PaletteError::UnknownCommand { .. })
    ));
    assert!(engine.is_open());
}

#[tokio::test]
async fn test_arrow_keys_and_enter_execute_highlight() {
    let mut router = MockRouter::new();
    router
        .expect_navigate()
        .with(eq("/cases"))
        .times(1)
        .returning(|_| Ok(()));
    let mut engine = mount(EngineDeps::new(Arc::new(router))).await;

    engine.handle_key(&KeyInput::ctrl("k")).unwrap();
    engine.handle_key(&KeyInput::plain("ArrowDown")).unwrap();
    assert_eq!(engine.selected_command().unwrap().id(), "nav-cases");

    let outcome = engine.handle_key(&KeyInput::plain("Enter")).unwrap();
    assert!(outcome.consumed);
    assert!(!engine.is_open());
    assert_eq!(engine.recent_ids(), ["nav-cases"]);
}

#[tokio::test]
async fn test_arrow_up_wraps_to_last_row() {
    let mut engine = engine().await;
    engine.open();
    engine.handle_key(&KeyInput::plain("ArrowUp")).unwrap();
    assert_eq!(engine.selected_command().unwrap().id(), "help-shortcuts");
}

#[tokio::test]
async fn test_typing_resets_highlight_and_backspace_edits() {
    let mut engine = engine().await;
    engine.open();
    engine.handle_key(&KeyInput::plain("ArrowDown")).unwrap();
    type_text(&mut engine, "docs");
    assert_eq!(engine.state().selected_index, 0);
    assert_eq!(engine.query(), "docs");

    engine.handle_key(&KeyInput::plain("Backspace")).unwrap();
    assert_eq!(engine.query(), "doc");
    assert_eq!(engine.selected_command().unwrap().id(), "action-quick-search");
}

#[tokio::test]
async fn test_enter_with_no_results_keeps_palette_open() {
    let mut engine = engine().await;
    engine.open();
    type_text(&mut engine, "xyzzy");
    assert!(engine.results().is_empty());
    engine.handle_key(&KeyInput::plain("Enter")).unwrap();
    assert!(engine.is_open());
    assert!(engine.recent_ids().is_empty());
}

#[tokio::test]
async fn test_end_to_end_case_search() {
    let mut engine = engine().await;

    let outcome = engine.handle_key(&KeyInput::meta("k")).unwrap();
    assert!(outcome.consumed);
    assert!(engine.is_open());
    assert_eq!(engine.query(), "");

    type_text(&mut engine, "case");
    let shown: Vec<&str> = engine
        .results()
        .flatten()
        .into_iter()
        .map(Command::id)
        .collect();
    assert_eq!(shown, vec!["nav-dashboard", "nav-cases", "action-new-case"]);

    engine.select("action-new-case").unwrap();
    assert_eq!(engine.recent_ids().first().map(String::as_str), Some("action-new-case"));
    assert!(!engine.is_open());
    assert_eq!(engine.query(), "");
}

#[tokio::test]
async fn test_recent_section_follows_executions() {
    let mut engine = engine().await;
    engine.open();
    engine.select("help-docs").unwrap();
    engine.open();
    engine.select("nav-calendar").unwrap();

    engine.open();
    let results = engine.results();
    let recent = &results.sections[0];
    assert_eq!(recent.kind, crate::app::filter::SectionKind::Recent);
    let ids: Vec<&str> = recent.commands.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["nav-calendar", "help-docs"]);
}

#[tokio::test]
async fn test_mount_loads_persisted_recency() {
    let store = MemoryStore::new().with_entry(
        "caseos-recent-commands",
        r#"["nav-cases","gone-command","help-docs"]"#,
    );
    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(store));
    let engine = mount(deps).await;

    assert_eq!(engine.recent_ids(), ["nav-cases", "gone-command", "help-docs"]);
    let titles: Vec<&str> = engine.recent_commands().into_iter().map(Command::title).collect();
    assert_eq!(titles, vec!["Go to Cases", "Documentation"]);
}

#[tokio::test]
async fn test_default_recent_seeds_only_empty_storage() {
    let config = PaletteConfig {
        default_recent: vec!["nav-dashboard".into(), "nav-cases".into(), "action-new-case".into()],
        ..PaletteConfig::default()
    };

    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(MemoryStore::new()));
    let engine = PaletteEngine::mount(deps, &config).await.unwrap();
    assert_eq!(engine.recent_ids(), ["nav-dashboard", "nav-cases", "action-new-case"]);

    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(
        MemoryStore::new().with_entry("caseos-recent-commands", r#"["help-docs"]"#),
    ));
    let engine = PaletteEngine::mount(deps, &config).await.unwrap();
    assert_eq!(engine.recent_ids(), ["help-docs"]);
}

#[tokio::test]
async fn test_corrupted_storage_mounts_empty() {
    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(
        MemoryStore::new().with_entry("caseos-recent-commands", "not json"),
    ));
    let engine = mount(deps).await;
    assert!(engine.recent_ids().is_empty());
}

#[tokio::test]
async fn test_execution_persists_recency() {
    let mut store = MockKeyValueStore::new();
    store.expect_read_key().returning(|_| Ok(None));
    store
        .expect_write_key()
        .withf(|name, value| name == "caseos-recent-commands" && value == r#"["action-ai-chat"]"#)
        .times(1)
        .returning(|_, _| Ok(()));

    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(store));
    let mut engine = mount(deps).await;

    engine.handle_key(&KeyInput::ctrl("a")).unwrap();
    engine.flush().await;
    assert_eq!(engine.recent_ids(), ["action-ai-chat"]);
}

#[tokio::test]
async fn test_failed_write_does_not_disturb_session() {
    let mut store = MockKeyValueStore::new();
    store.expect_read_key().returning(|_| Ok(None));
    store
        .expect_write_key()
        .returning(|_, _| Err(anyhow::anyhow!("disk full")));

    let mut deps = EngineDeps::new(permissive_router());
    deps.store = Some(Arc::new(store));
    let mut engine = mount(deps).await;

    engine.open();
    engine.select("nav-contacts").unwrap();
    engine.flush().await;
    assert_eq!(engine.recent_ids(), ["nav-contacts"]);
}

#[tokio::test]
async fn test_duplicate_custom_id_rejected_on_mount() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut deps = EngineDeps::new(permissive_router());
    deps.custom_commands = vec![counting("nav-cases", &hits)];
    let err = PaletteEngine::mount(deps, &PaletteConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PaletteError::DuplicateCommandId { .. }));
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let source = ChannelKeySource::new();
    let emitter = source.emitter();
    let mut engine = engine().await;

    assert!(engine.pump().await.is_none());
    engine.attach(&source).unwrap();
    assert!(matches!(
        engine.attach(&source),
        Err(PaletteError::AlreadyAttached)
    ));

    assert!(emitter.emit(KeyInput::meta("k")).await);
    let outcome = engine.pump().await.unwrap().unwrap();
    assert_eq!(outcome.decision, KeyDecision::ToggleOpen);
    assert!(engine.is_open());

    assert!(engine.detach());
    assert!(!engine.is_attached());
    assert!(!emitter.emit(KeyInput::meta("k")).await);
}

#[tokio::test]
async fn test_run_drains_until_source_closes() {
    let source = ChannelKeySource::new();
    let emitter = source.emitter();
    let mut engine = engine().await;
    engine.attach(&source).unwrap();

    for input in [
        KeyInput::ctrl("k"),
        KeyInput::plain("d"),
        KeyInput::plain("o"),
        KeyInput::plain("c"),
        KeyInput::plain("s"),
        KeyInput::plain("Enter"),
    ] {
        assert!(emitter.emit(input).await);
    }
    emitter.close();

    engine.run().await.unwrap();
    assert!(!engine.is_attached());
    assert_eq!(engine.recent_ids(), ["help-docs"]);
}

#[tokio::test]
async fn test_run_surfaces_action_errors() {
    let source = ChannelKeySource::new();
    let emitter = source.emitter();
    let failing = Command::new(
        "custom-fail",
        "Always Fails",
        CommandGroup::Custom,
        CommandAction::custom(|| Err(anyhow::anyhow!("boom"))),
    )
    .with_shortcut("F");
    let mut engine = engine_with(vec![failing]).await;
    engine.attach(&source).unwrap();

    assert!(emitter.emit(KeyInput::ctrl("f")).await);
    assert!(emitter.emit(KeyInput::ctrl("k")).await);
    emitter.close();

    assert!(matches!(engine.run().await, Err(PaletteError::Action { .. })));
    // The machine keeps going after the failure.
    engine.run().await.unwrap();
    assert!(engine.is_open());
}

#[tokio::test]
async fn test_keystroke_fuzzing() {
    let mut engine = engine().await;
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    for _ in 0..2000 {
        let input = generate_random_key(&mut rng);
        engine.handle_key(&input).unwrap();

        if !engine.is_open() {
            assert_eq!(engine.query(), "");
        }
        let recent = engine.recent_ids();
        assert!(recent.len() <= 5);
        for (i, id) in recent.iter().enumerate() {
            assert!(!recent[i + 1..].contains(id), "duplicate recent id {id}");
        }
        let rows = engine.results().len();
        if engine.is_open() && rows > 0 {
            assert!(engine.state().selected_index < rows);
        }
    }
}

fn generate_random_key<R: Rng>(rng: &mut R) -> KeyInput {
    let key = match rng.gen_range(0..20) {
        0 => "Escape".to_string(),
        1 => "Enter".to_string(),
        2 => "ArrowUp".to_string(),
        3 => "ArrowDown".to_string(),
        4 => "Backspace".to_string(),
        5 => "Tab".to_string(),
        6 => "k".to_string(),
        _ => (rng.gen_range(b' '..=b'~') as char).to_string(),
    };
    KeyInput {
        key,
        meta: rng.gen_bool(0.1),
        ctrl: rng.gen_bool(0.15),
    }
}
