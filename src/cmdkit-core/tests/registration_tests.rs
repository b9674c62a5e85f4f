//! Registration and concurrency tests for the cmdkit-core crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cmdkit_core::{
    Arguments, CommandDescription, CommandManager, ContainerKind, ExecutionProvider,
    ManagerConfig, MessageKey, ParameterDescription, RegistrationError, SubCommandDescription,
};
use tokio::runtime::Handle;

fn noop() -> SubCommandDescription<()> {
    SubCommandDescription::new(|_: &(), _: &Arguments| Ok(()))
}

fn manager() -> CommandManager<()> {
    CommandManager::new(ManagerConfig::default(), ExecutionProvider::Sync)
}

// ============================================================================
// REGISTRATION
// ============================================================================

mod registration {
    use super::*;

    #[test]
    fn test_variadic_must_be_single_and_last() {
        let manager = manager();

        let err = manager
            .register_command(
                CommandDescription::new("bad").sub_command(
                    noop()
                        .parameter(ParameterDescription::collection("a", ContainerKind::List))
                        .parameter(ParameterDescription::fixed::<i32>("b")),
                ),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::VariadicNotLast { .. }));

        let err = manager
            .register_command(
                CommandDescription::new("bad").sub_command(
                    noop()
                        .parameter(ParameterDescription::limitless("a"))
                        .parameter(ParameterDescription::limitless("b")),
                ),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MultipleVariadic { .. }));

        assert!(!manager.contains("bad"));
    }

    #[test]
    fn test_failed_registration_is_atomic() {
        let manager = manager();
        let err = manager
            .register_command(
                CommandDescription::new("half")
                    .sub_command(noop().path(["good"]))
                    .sub_command(
                        noop()
                            .path(["bad"])
                            .parameter(ParameterDescription::fixed::<i32>("x").optional())
                            .parameter(ParameterDescription::fixed::<i32>("y")),
                    ),
            )
            .unwrap_err();

        assert!(matches!(err, RegistrationError::OptionalBeforeRequired { .. }));
        assert!(manager.command("half").is_none());
        assert!(
            manager
                .dispatch((), ["half", "good"])
                .into_ready()
                .map(|outcome| outcome.is(&MessageKey::UNKNOWN_COMMAND))
                .unwrap_or(false)
        );
    }

    #[test]
    fn test_identical_registration_is_rejected() {
        let manager = manager();
        let description = || {
            CommandDescription::new("home")
                .sub_command(noop())
                .sub_command(noop().path(["set"]))
        };

        manager.register_command(description()).unwrap();
        let err = manager.register_command(description()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateRoute {
                command: "home".to_string(),
                path: String::new(),
            }
        );
        assert_eq!(manager.command("home").unwrap().sub_commands().len(), 2);
    }

    #[test]
    fn test_disjoint_registration_merges() {
        let manager = manager();
        manager
            .register_command(CommandDescription::new("home").sub_command(noop()))
            .unwrap();
        manager
            .register_command(
                CommandDescription::new("home")
                    .alias("h")
                    .sub_command(noop().path(["set"])),
            )
            .unwrap();

        let home = manager.command("h").unwrap();
        assert_eq!(home.sub_commands().len(), 2);
        assert!(home.sub_command(&["set"]).is_some());
    }

    #[test]
    fn test_alias_conflict() {
        let manager = manager();
        manager
            .register_command(CommandDescription::new("teleport").alias("tp").sub_command(noop()))
            .unwrap();

        let err = manager
            .register_command(CommandDescription::new("tpa").alias("tp").sub_command(noop()))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NameConflict { .. }));
        assert!(!manager.contains("tpa"));
    }

    #[test]
    fn test_unregister() {
        let manager = manager();
        manager
            .register_command(CommandDescription::new("spawn").alias("s").sub_command(noop()))
            .unwrap();

        assert!(manager.unregister_command("spawn"));
        assert!(!manager.unregister_command("spawn"));
        assert!(!manager.contains("s"));
        assert!(manager.commands().is_empty());
    }

    #[test]
    fn test_message_last_registration_wins() {
        let manager = manager();
        let hits = Arc::new(AtomicUsize::new(0));

        assert!(!manager.register_message(MessageKey::UNKNOWN_COMMAND, |_, _| {}));
        let counter = Arc::clone(&hits);
        assert!(manager.register_message(MessageKey::UNKNOWN_COMMAND, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let outcome = manager.dispatch((), ["nope"]).into_ready().unwrap();
        assert!(manager.render(&(), &outcome));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_config_from_toml() {
        let config = ManagerConfig::from_toml_str(
            r#"
case_sensitive = false
max_concurrent = 4
"#,
        )
        .unwrap();
        let manager: CommandManager<()> = CommandManager::new(config, ExecutionProvider::Sync);
        manager
            .register_command(CommandDescription::new("Ping").sub_command(noop()))
            .unwrap();

        assert!(manager.contains("PING"));
        assert_eq!(manager.config().max_concurrent, 4);
        assert!(manager.config().flag_terminator);
    }
}

// ============================================================================
// CONCURRENCY
// ============================================================================

mod concurrency {
    use super::*;

    #[derive(Clone)]
    struct Caller(usize);

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_async_dispatch() {
        const CALLS: usize = 64;
        let manager: Arc<CommandManager<Caller>> = Arc::new(CommandManager::with_runtime(
            ManagerConfig::default().with_max_concurrent(8),
            Handle::current(),
        ));

        let mut description = CommandDescription::new("work");
        for lane in 0..4 {
            description = description.sub_command(
                SubCommandDescription::new(move |caller: &Caller, args: &Arguments| {
                    let value = *args.get::<usize>("value").ok_or_else(|| anyhow::anyhow!("missing"))?;
                    anyhow::ensure!(value == caller.0, "value {} routed to caller {}", value, caller.0);
                    anyhow::ensure!(value % 4 == lane, "value {} routed to lane {}", value, lane);
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    Ok(())
                })
                .path([format!("lane{lane}")])
                .parameter(ParameterDescription::fixed::<usize>("value"))
                .asynchronous(),
            );
        }
        manager.register_command(description).unwrap();

        let mut tasks = Vec::with_capacity(CALLS);
        for call in 0..CALLS {
            let manager = Arc::clone(&manager);
            tasks.push(tokio::spawn(async move {
                let tokens = vec![
                    "work".to_string(),
                    format!("lane{}", call % 4),
                    call.to_string(),
                ];
                manager.dispatch(Caller(call), tokens).await
            }));
        }

        for task in tasks {
            let outcome = task.await.unwrap();
            assert!(outcome.is_executed(), "unexpected outcome: {outcome:?}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registration_during_dispatch() {
        let manager: Arc<CommandManager<()>> = Arc::new(CommandManager::with_runtime(
            ManagerConfig::default(),
            Handle::current(),
        ));
        manager
            .register_command(CommandDescription::new("stable").sub_command(noop()))
            .unwrap();

        let writer = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                for index in 0..50 {
                    let name = format!("extra{index}");
                    manager
                        .register_command(CommandDescription::new(name.as_str()).sub_command(noop()))
                        .unwrap();
                    manager.unregister_command(&name);
                }
            })
        };

        for _ in 0..200 {
            assert!(manager.dispatch((), ["stable"]).await.is_executed());
        }
        writer.await.unwrap();
        assert_eq!(manager.commands().names(), vec!["stable"]);
    }
}
