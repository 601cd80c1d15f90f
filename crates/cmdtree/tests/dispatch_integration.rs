//! End-to-end tests: a small game-server console wired through the public API.

use std::rc::Rc;

use cmdtree::{
    require_extension, tokenize, Arguments, Command, CommandContext, CommandError, Dispatcher,
    Extensions, Hooks, Parameter, ParameterGroup, Provider, ProviderManager, ReadError, Token,
    Value,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
struct Player(String);

struct Roster(Vec<&'static str>);

struct Operator;

fn roster_providers() -> ProviderManager {
    let mut providers = ProviderManager::new();
    providers.register_named::<Player>(
        "player",
        Provider::new("player", |text: &str, inv: &cmdtree::CommandInvocation| {
            let roster = inv.context().app_state.get::<Roster>();
            match roster {
                Some(roster) if roster.0.iter().any(|p| p.eq_ignore_ascii_case(text)) => {
                    Ok(Value::new(Player(text.to_lowercase())))
                }
                _ => Err(ReadError::new(text, "player", "not online")),
            }
        })
        .with_completer(|_prefix, inv| {
            inv.context()
                .app_state
                .get::<Roster>()
                .map(|roster| roster.0.iter().map(|p| p.to_string()).collect())
                .unwrap_or_default()
        }),
    );
    providers
}

fn console() -> Dispatcher {
    let mut app_state = Extensions::new();
    app_state.insert(Roster(vec!["alex", "steve", "sam"]));

    let mut dispatcher = Dispatcher::with_providers(roster_providers()).with_app_state(app_state);
    dispatcher
        .add_command(
            Command::new("give")
                .alias("g")
                .describe("Give items to a player")
                .parameter(Parameter::positional::<Player>("player"))
                .parameter(Parameter::positional::<String>("item"))
                .parameter(Parameter::positional::<i32>("amount").optional().default_literal("1"))
                .parameter(Parameter::flag("silent").short("s").long("silent"))
                .handler(|args: &Arguments, _ctx: &CommandContext| {
                    let player = args.get_required::<Player>("player")?;
                    Ok::<_, anyhow::Error>(json!({
                        "player": player.0,
                        "item": args.get_required::<String>("item")?,
                        "amount": args.get_required::<i32>("amount")?,
                        "silent": args.flag("silent"),
                    }))
                }),
        )
        .unwrap();
    dispatcher
        .add_command(
            Command::new("say")
                .describe("Broadcast a message")
                .parameter(Parameter::positional::<String>("message").infinite())
                .handler(|args: &Arguments, _ctx: &CommandContext| {
                    Ok::<_, anyhow::Error>(args.get_required::<String>("message")?.clone())
                }),
        )
        .unwrap();
    dispatcher
        .add_command(
            Command::new("time").subcommand(
                Command::new("set")
                    .parameter(Parameter::fixed::<u32, _, _>(
                        "time",
                        [("day", 1000u32), ("night", 13000), ("noon", 6000)],
                    ))
                    .handler(|args: &Arguments, _ctx: &CommandContext| {
                        Ok::<_, anyhow::Error>(*args.get_required::<u32>("time")?)
                    }),
            ),
        )
        .unwrap();
    dispatcher
        .add_command(
            Command::new("admin")
                .filter(require_extension::<Operator>("operators only"))
                .subcommand(
                    Command::new("kick")
                        .parameter(Parameter::positional::<Player>("player"))
                        .parameter(
                            Parameter::named::<String>("reason", &["--reason", "-r"])
                                .optional()
                                .infinite(),
                        )
                        .handler(|args: &Arguments, ctx: &CommandContext| {
                            Ok::<_, anyhow::Error>(json!({
                                "path": ctx.command_path,
                                "player": args.get_required::<Player>("player")?.0,
                                "reason": args.get::<String>("reason"),
                            }))
                        }),
                ),
        )
        .unwrap();
    dispatcher
}

fn operator() -> Extensions {
    let mut extensions = Extensions::new();
    extensions.insert(Operator);
    extensions
}

#[test]
fn tokenizer_examples() {
    assert_eq!(
        tokenize("a \"b c\" d"),
        vec![Token::plain("a"), Token::quoted("b c"), Token::plain("d")]
    );
    assert_eq!(tokenize("'it\\'s'"), vec![Token::quoted("it's")]);
    assert!(tokenize("").is_empty());

    let open = tokenize("\"abc");
    assert_eq!(open.len(), 1);
    assert!(!open[0].is_quoted());
    assert_eq!(open[0].as_str(), "\"abc");
}

#[test]
fn group_properties() {
    let providers = Rc::new(ProviderManager::new());

    let tail = ParameterGroup::builder()
        .param(Parameter::positional::<String>("first"))
        .param(Parameter::positional::<String>("second").infinite())
        .build()
        .unwrap();
    let args = tail.parse_line("a b c d", Rc::clone(&providers)).unwrap();
    assert_eq!(args.get::<String>("first").map(String::as_str), Some("a"));
    assert_eq!(args.get::<String>("second").map(String::as_str), Some("b c d"));

    let flagged = ParameterGroup::builder()
        .param(Parameter::flag("force").short("f").long("force"))
        .param(Parameter::positional::<String>("target").optional())
        .build()
        .unwrap();
    let args = flagged.parse_line("-f hello", Rc::clone(&providers)).unwrap();
    assert!(args.flag("force"));
    assert_eq!(args.get::<String>("target").map(String::as_str), Some("hello"));
    let args = flagged.parse_line("-f", Rc::clone(&providers)).unwrap();
    assert!(args.flag("force"));
    assert!(args.get::<String>("target").is_none());

    let pair = ParameterGroup::builder()
        .param(Parameter::positional::<String>("a"))
        .param(Parameter::positional::<String>("b"))
        .build()
        .unwrap();
    assert!(matches!(
        pair.parse_line("a", Rc::clone(&providers)),
        Err(CommandError::TooFewArguments { .. })
    ));
    assert!(matches!(
        pair.parse_line("a b c", Rc::clone(&providers)),
        Err(CommandError::TooManyArguments { .. })
    ));

    let named = ParameterGroup::builder()
        .param(Parameter::named::<String>("name", &["--name"]))
        .build()
        .unwrap();
    assert!(named
        .suggest_line("--na", providers)
        .contains(&"--name".to_string()));
}

#[test]
fn alias_lookup_and_replacement() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .add_command(Command::new("foo").alias("f").describe("first"))
        .unwrap();
    assert_eq!(
        dispatcher.get_command("F").and_then(|c| c.description()),
        Some("first")
    );

    dispatcher
        .add_command(Command::new("foo").describe("second"))
        .unwrap();
    assert_eq!(
        dispatcher.get_command("foo").and_then(|c| c.description()),
        Some("second")
    );
}

#[test]
fn give_with_defaults_flags_and_alias() {
    let dispatcher = console();

    let outcome = dispatcher.execute("give Alex diamond 5").unwrap();
    assert_eq!(
        outcome.data(),
        Some(&json!({"player": "alex", "item": "diamond", "amount": 5, "silent": false}))
    );

    let outcome = dispatcher.execute("G -s steve \"golden apple\"").unwrap();
    assert_eq!(
        outcome.data(),
        Some(&json!({"player": "steve", "item": "golden apple", "amount": 1, "silent": true}))
    );
}

#[test]
fn provider_errors_surface_as_parse_errors() {
    let dispatcher = console();
    let err = dispatcher.execute("give herobrine dirt").unwrap_err();
    match err {
        CommandError::Parse(read) => {
            assert_eq!(read.input, "herobrine");
            assert_eq!(read.expected, "player");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = dispatcher.execute("give alex dirt lots").unwrap_err();
    assert!(matches!(err, CommandError::Parse(ref read) if read.input == "lots"));
}

#[test]
fn greedy_message_and_fixed_values() {
    let dispatcher = console();
    let outcome = dispatcher.execute("say hello   there 'big world'").unwrap();
    assert_eq!(outcome.data(), Some(&json!("hello there big world")));

    let outcome = dispatcher.execute("time set NIGHT").unwrap();
    assert_eq!(outcome.data(), Some(&json!(13000)));

    assert!(dispatcher.execute("time set dusk").is_err());
}

#[test]
fn filtered_subtree_is_hidden_and_blocked() {
    let dispatcher = console();

    let err = dispatcher.execute("admin kick sam").unwrap_err();
    assert!(err.is_permission());
    assert!(!dispatcher.get_suggestions("").contains(&"admin".to_string()));
    assert!(dispatcher.get_suggestions("admin k").is_empty());

    let outcome = dispatcher
        .execute_with("admin kick sam --reason spamming the chat", operator())
        .unwrap();
    assert_eq!(
        outcome.data(),
        Some(&json!({
            "path": ["admin", "kick"],
            "player": "sam",
            "reason": "spamming the chat",
        }))
    );
    assert_eq!(
        dispatcher.get_suggestions_with("admin k", operator()),
        vec!["kick"]
    );
}

#[test]
fn completion_walks_the_tree() {
    let dispatcher = console();

    assert_eq!(dispatcher.get_suggestions(""), vec!["g", "give", "say", "time"]);
    assert_eq!(dispatcher.get_suggestions("ti"), vec!["time"]);
    assert_eq!(dispatcher.get_suggestions("time "), vec!["set"]);
    assert_eq!(dispatcher.get_suggestions("time set n"), vec!["night", "noon"]);
    assert_eq!(dispatcher.get_suggestions("give s"), vec!["steve", "sam", "-s", "-silent"]);
    assert_eq!(
        dispatcher.get_suggestions_with("admin kick sam --r", operator()),
        vec!["--reason"]
    );
}

#[test]
fn hooks_and_help() {
    let mut dispatcher = console();
    dispatcher
        .add_command(
            Command::new("ping")
                .describe("Check the connection")
                .handler(|_args: &Arguments, _ctx: &CommandContext| {
                    Ok::<_, anyhow::Error>(json!({"reply": "pong"}))
                })
                .hooks(Hooks::new().post_dispatch(|_args, _ctx, mut data| {
                    data["latency_ms"] = json!(0);
                    Ok(data)
                })),
        )
        .unwrap();

    let outcome = dispatcher.execute("ping").unwrap();
    assert_eq!(outcome.data(), Some(&json!({"reply": "pong", "latency_ms": 0})));

    let help = dispatcher.help_lines();
    assert!(help
        .iter()
        .any(|line| line.starts_with("give <player> <item> [amount] [-s]")
            && line.ends_with("Give items to a player")));
    assert!(help.iter().any(|line| line.starts_with("time set <day|night|noon>")));
    assert!(!help.iter().any(|line| line.starts_with("g ")));
}

#[test]
fn unknown_commands_use_fallback() {
    let mut dispatcher = console();
    assert!(matches!(
        dispatcher.execute("fly"),
        Err(CommandError::CommandNotFound { ref name }) if name == "fly"
    ));

    dispatcher.fallback(|inv| {
        Ok(cmdtree::Outcome::Rendered(json!(format!(
            "no such command: {}",
            inv.line()
        ))))
    });
    let outcome = dispatcher.execute("fly high").unwrap();
    assert_eq!(outcome.data(), Some(&json!("no such command: fly high")));
}
