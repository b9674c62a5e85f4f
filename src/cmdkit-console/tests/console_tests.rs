//! Integration tests for the cmdkit-console crate.
//!
//! Drives a console manager against an in-memory server: command table,
//! player and world lookups, and a main-thread task queue.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, bail};
use cmdkit_console::{
    CommandMap, ConsoleCommandManager, ConsoleDispatch, ConsoleError, ConsoleHost, ConsoleSender,
    HostCommand, ServerLookup, TaskQueue,
};
use cmdkit_core::{
    Arguments, CommandDescription, ManagerConfig, MessageKey, ParameterDescription,
    SubCommandDescription,
};
use parking_lot::Mutex;
use tokio::runtime::Handle;

// ============================================================================
// FAKE SERVER
// ============================================================================

#[derive(Clone)]
struct TestSender {
    name: String,
    permissions: Arc<HashSet<String>>,
    inbox: Arc<Mutex<Vec<String>>>,
}

impl TestSender {
    fn new(name: &str, permissions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            permissions: Arc::new(permissions.iter().map(|p| p.to_string()).collect()),
            inbox: Arc::default(),
        }
    }

    fn inbox(&self) -> Vec<String> {
        self.inbox.lock().clone()
    }
}

impl ConsoleSender for TestSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_message(&self, message: &str) {
        self.inbox.lock().push(message.to_string());
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[derive(Default)]
struct FakeCommandMap {
    /// name -> (owning plugin, entry)
    entries: Mutex<HashMap<String, (String, HostCommand)>>,
    reserved: HashSet<String>,
}

impl FakeCommandMap {
    fn reserving(names: &[&str]) -> Self {
        Self {
            entries: Mutex::default(),
            reserved: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn entry(&self, name: &str) -> Option<(String, HostCommand)> {
        self.entries.lock().get(name).cloned()
    }
}

impl CommandMap for FakeCommandMap {
    fn register(&self, fallback_prefix: &str, command: &HostCommand) -> anyhow::Result<()> {
        if self.reserved.contains(&command.name) {
            bail!("'{}' is reserved by the server", command.name);
        }
        self.entries.lock().insert(
            command.name.clone(),
            (fallback_prefix.to_string(), command.clone()),
        );
        Ok(())
    }

    fn unregister(&self, name: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| anyhow!("'{}' is not registered", name))
    }

    fn owner(&self, name: &str) -> Option<String> {
        self.entries.lock().get(name).map(|(owner, _)| owner.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Player(String);

#[derive(Debug, Clone, PartialEq)]
struct World(String);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Material {
    Stone,
    Diamond,
}

struct FakeLookup;

impl ServerLookup for FakeLookup {
    type Player = Player;
    type World = World;
    type Material = Material;

    fn player(&self, name: &str) -> Option<Player> {
        ["alex", "sam"]
            .contains(&name)
            .then(|| Player(name.to_string()))
    }

    fn world(&self, name: &str) -> Option<World> {
        (name == "overworld").then(|| World(name.to_string()))
    }

    fn material(&self, name: &str) -> Option<Material> {
        match name.to_ascii_lowercase().as_str() {
            "stone" => Some(Material::Stone),
            "diamond" => Some(Material::Diamond),
            _ => None,
        }
    }
}

struct Fixture {
    manager: ConsoleCommandManager<TestSender>,
    map: Arc<FakeCommandMap>,
    queue: TaskQueue,
}

fn fixture(map: FakeCommandMap) -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let map = Arc::new(map);
    let queue = TaskQueue::new();
    let host = ConsoleHost {
        plugin_name: "testplugin".to_string(),
        runtime: Handle::current(),
        command_map: map.clone(),
        main_thread: Arc::new(queue.clone()),
    };
    Fixture {
        manager: ConsoleCommandManager::create(ManagerConfig::default(), host, FakeLookup),
        map,
        queue,
    }
}

fn give() -> CommandDescription<TestSender> {
    CommandDescription::new("give").alias("g").sub_command(
        SubCommandDescription::new(|sender: &TestSender, args: &Arguments| {
            let player = args.get::<Player>("player").ok_or_else(|| anyhow!("no player"))?;
            let material = args.get::<Material>("item").ok_or_else(|| anyhow!("no item"))?;
            let amount = args.get::<u32>("amount").copied().unwrap_or(1);
            sender.send_message(&format!("Gave {} {:?} x{}", player.0, material, amount));
            Ok(())
        })
        .parameter(ParameterDescription::fixed::<Player>("player"))
        .parameter(ParameterDescription::fixed::<Material>("item"))
        .parameter(ParameterDescription::fixed::<u32>("amount").optional())
        .permission("items.give"),
    )
}

// ============================================================================
// REGISTRATION
// ============================================================================

mod registration {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_register_publishes_to_host() {
        let fixture = fixture(FakeCommandMap::default());
        fixture.manager.register_command(give()).unwrap();

        let (owner, entry) = fixture.map.entry("give").unwrap();
        assert_eq!(owner, "testplugin");
        assert_eq!(entry.aliases, vec!["g".to_string()]);
        assert_eq!(entry.usage, "/give <player> <item> [amount]");
    }

    #[tokio::test]
    async fn test_host_refusal_rolls_back() {
        let fixture = fixture(FakeCommandMap::reserving(&["give"]));

        let err = fixture.manager.register_command(give()).unwrap_err();
        assert!(matches!(err, ConsoleError::CommandMap { ref name, .. } if name == "give"));
        assert!(!fixture.manager.core().contains("give"));
    }

    #[tokio::test]
    async fn test_invalid_description_never_reaches_host() {
        let fixture = fixture(FakeCommandMap::default());
        let description = CommandDescription::new("bad").sub_command(
            SubCommandDescription::new(|_: &TestSender, _: &Arguments| Ok(()))
                .parameter(ParameterDescription::limitless("rest"))
                .parameter(ParameterDescription::fixed::<u32>("after")),
        );

        let err = fixture.manager.register_command(description).unwrap_err();
        assert!(matches!(err, ConsoleError::Registration(_)));
        assert!(fixture.map.entry("bad").is_none());
    }

    #[tokio::test]
    async fn test_replaces_own_static_entry() {
        let map = FakeCommandMap::default();
        map.register(
            "testplugin",
            &HostCommand {
                name: "give".to_string(),
                aliases: Vec::new(),
                description: None,
                usage: "/give".to_string(),
            },
        )
        .unwrap();

        let fixture = fixture(map);
        fixture.manager.register_command(give()).unwrap();
        let (_, entry) = fixture.map.entry("give").unwrap();
        assert_eq!(entry.usage, "/give <player> <item> [amount]");
    }

    #[tokio::test]
    async fn test_host_refusing_unregister_keeps_command() {
        let fixture = fixture(FakeCommandMap::default());
        fixture.manager.register_command(give()).unwrap();
        fixture.map.unregister("give").unwrap();

        let err = fixture.manager.unregister_command("give").unwrap_err();
        assert!(matches!(err, ConsoleError::CommandMap { ref name, .. } if name == "give"));
        assert!(fixture.manager.core().contains("give"));
    }

    #[tokio::test]
    async fn test_unregister_removes_host_entry() {
        let fixture = fixture(FakeCommandMap::default());
        fixture.manager.register_command(give()).unwrap();

        assert!(fixture.manager.unregister_command("g").unwrap());
        assert!(fixture.map.entry("give").is_none());
        assert!(!fixture.manager.unregister_command("give").unwrap());
    }
}

// ============================================================================
// EXECUTION
// ============================================================================

mod execution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_host_argument_types() {
        let fixture = fixture(FakeCommandMap::default());
        fixture.manager.register_command(give()).unwrap();
        let sender = TestSender::new("op", &["items.give"]);

        let outcome = fixture
            .manager
            .execute(sender.clone(), "/give alex DIAMOND 3")
            .wait()
            .await;
        assert!(outcome.is_executed());
        assert_eq!(sender.inbox(), vec!["Gave alex Diamond x3"]);
    }

    #[tokio::test]
    async fn test_default_messages() {
        let fixture = fixture(FakeCommandMap::default());
        fixture.manager.register_command(give()).unwrap();
        let sender = TestSender::new("op", &["items.give"]);

        fixture.manager.execute(sender.clone(), "/warp home");
        fixture.manager.execute(sender.clone(), "give alex");
        fixture.manager.execute(sender.clone(), "give alex stone 1 2");
        fixture.manager.execute(sender.clone(), "give nobody stone");
        fixture.manager.execute(sender.clone(), "g sam stone many");

        assert_eq!(
            sender.inbox(),
            vec![
                "Unknown command: `warp`.",
                "Invalid usage.",
                "Invalid usage.",
                "Invalid argument `nobody` for type `Player`.",
                "Invalid argument `many` for type `u32`.",
            ]
        );
    }

    #[tokio::test]
    async fn test_permission_gate() {
        let fixture = fixture(FakeCommandMap::default());
        fixture.manager.register_command(give()).unwrap();
        let guest = TestSender::new("guest", &[]);

        let outcome = fixture.manager.execute(guest.clone(), "give alex stone").wait().await;
        assert!(outcome.is(&MessageKey::NO_PERMISSION));
        assert_eq!(
            guest.inbox(),
            vec!["You do not have permission to perform this command. Permission needed: `items.give`."]
        );
    }

    #[tokio::test]
    async fn test_builtin_resolver_survives_host_lookup() {
        struct NameLookup;

        impl ServerLookup for NameLookup {
            type Player = String;
            type World = World;
            type Material = Material;

            fn player(&self, _: &str) -> Option<String> {
                None
            }

            fn world(&self, _: &str) -> Option<World> {
                None
            }

            fn material(&self, _: &str) -> Option<Material> {
                None
            }
        }

        let host = ConsoleHost {
            plugin_name: "testplugin".to_string(),
            runtime: Handle::current(),
            command_map: Arc::new(FakeCommandMap::default()),
            main_thread: Arc::new(TaskQueue::new()),
        };
        let manager = ConsoleCommandManager::create(ManagerConfig::default(), host, NameLookup);
        manager
            .register_command(CommandDescription::new("say").sub_command(
                SubCommandDescription::new(|sender: &TestSender, args: &Arguments| {
                    let word = args.get::<String>("word").ok_or_else(|| anyhow!("no word"))?;
                    sender.send_message(word);
                    Ok(())
                })
                .parameter(ParameterDescription::fixed::<String>("word")),
            ))
            .unwrap();
        let sender = TestSender::new("console", &[]);

        let outcome = manager.execute(sender.clone(), "say hello").wait().await;
        assert!(outcome.is_executed());
        assert_eq!(sender.inbox(), vec!["hello"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_failure_rendered_on_main_thread() {
        let fixture = fixture(FakeCommandMap::default());
        fixture
            .manager
            .register_command(
                CommandDescription::new("backup").sub_command(
                    SubCommandDescription::new(|_: &TestSender, _: &Arguments| {
                        Err(anyhow!("disk full"))
                    })
                    .asynchronous(),
                ),
            )
            .unwrap();
        let sender = TestSender::new("console", &[]);

        let dispatch = fixture.manager.execute(sender.clone(), "backup");
        assert!(dispatch.is_deferred());
        let outcome = dispatch.wait().await;
        assert!(outcome.is(&MessageKey::EXECUTION_FAILED));

        // Nothing is rendered until the host drains its queue.
        assert!(sender.inbox().is_empty());
        assert_eq!(fixture.queue.run_pending(), 1);
        assert_eq!(
            sender.inbox(),
            vec!["An internal error occurred while attempting to perform this command."]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_success_schedules_nothing() {
        let fixture = fixture(FakeCommandMap::default());
        fixture
            .manager
            .register_command(
                CommandDescription::new("save").sub_command(
                    SubCommandDescription::new(|_: &TestSender, _: &Arguments| Ok(()))
                        .parameter(ParameterDescription::fixed::<World>("world"))
                        .asynchronous(),
                ),
            )
            .unwrap();
        let sender = TestSender::new("console", &[]);

        let dispatch = fixture.manager.execute(sender.clone(), "save overworld");
        assert!(matches!(dispatch, ConsoleDispatch::Deferred(_)));
        assert!(dispatch.wait().await.is_executed());
        assert_eq!(fixture.queue.run_pending(), 0);

        // Resolution failures are reported synchronously even for async sub-commands.
        let dispatch = fixture.manager.execute(sender.clone(), "save nether");
        assert!(!dispatch.is_deferred());
        assert_eq!(sender.inbox(), vec!["Invalid argument `nether` for type `World`."]);
    }
}
