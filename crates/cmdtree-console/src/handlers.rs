//! Built-in handlers and value types of the console.
//!
//! Command files refer to the handlers by the keys registered in
//! [`registry`] and to the extra value types (`player`, `numbers`,
//! `coordinate`) by the names registered in [`providers`].

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{anyhow, bail};
use cmdtree::{
    Arguments, CommandContext, CommandInvocation, HandlerRegistry, HandlerResult, Output,
    Provider, ProviderManager, ReadError, Value,
};
use serde::{Serialize, Serializer};
use serde_json::json;

/// Players known to the console, used to read and complete `player` values.
#[derive(Debug, Clone)]
pub struct Roster(pub Vec<String>);

impl Default for Roster {
    fn default() -> Self {
        Self(["alex", "steve", "sam"].map(String::from).to_vec())
    }
}

/// Aligned help lines of every command, captured after loading.
#[derive(Debug, Clone, Default)]
pub struct HelpIndex(pub Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player(pub String);

/// Whitespace-separated numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberList(pub Vec<f64>);

/// One axis of a position: a number, or `~` with an optional offset from
/// where the player stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    Absolute(f64),
    Relative(f64),
}

impl Coordinate {
    fn parse(text: &str) -> Result<Self, ReadError> {
        let number = |digits: &str| {
            digits
                .parse::<f64>()
                .map_err(|e| ReadError::new(text, "coordinate", e.to_string()))
        };
        match text.strip_prefix('~') {
            Some("") => Ok(Coordinate::Relative(0.0)),
            Some(offset) => number(offset).map(Coordinate::Relative),
            None => number(text).map(Coordinate::Absolute),
        }
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Coordinate::Absolute(value) => serializer.serialize_f64(*value),
            Coordinate::Relative(offset) if *offset == 0.0 => serializer.serialize_str("~"),
            Coordinate::Relative(offset) => serializer.serialize_str(&format!("~{}", offset)),
        }
    }
}

/// Providers for the stock types plus `player`, `numbers` and `coordinate`.
pub fn providers() -> ProviderManager {
    let mut providers = ProviderManager::new();
    providers.register_named::<Player>(
        "player",
        Provider::new("player", read_player).with_completer(|_prefix, inv| {
            inv.context()
                .app_state
                .get::<Roster>()
                .map(|roster| roster.0.clone())
                .unwrap_or_default()
        }),
    );
    providers.register_named::<NumberList>(
        "numbers",
        Provider::new("numbers", |text: &str, _inv: &CommandInvocation| {
            text.split_whitespace()
                .map(|word| {
                    word.parse::<f64>()
                        .map_err(|e| ReadError::new(word, "number", e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|numbers| Value::new(NumberList(numbers)))
        }),
    );
    providers.register_named::<Coordinate>(
        "coordinate",
        Provider::new("coordinate", |text: &str, _inv: &CommandInvocation| {
            Coordinate::parse(text).map(Value::new)
        })
        .with_completer(|_prefix, _inv| vec!["~".to_string()]),
    );
    providers
}

fn read_player(text: &str, inv: &CommandInvocation) -> Result<Value, ReadError> {
    let online = inv
        .context()
        .app_state
        .get::<Roster>()
        .and_then(|roster| roster.0.iter().find(|name| name.eq_ignore_ascii_case(text)));
    match online {
        Some(name) => Ok(Value::new(Player(name.clone()))),
        None => Err(ReadError::new(text, "player", "no such player online")),
    }
}

/// Handlers available to command files.
pub fn registry() -> HandlerRegistry {
    let clock = Rc::new(Cell::new(0u32));
    let mut handlers = HandlerRegistry::new();

    handlers
        .register("echo", |args: &Arguments, _ctx: &CommandContext| {
            Ok::<_, anyhow::Error>(args.get::<String>("text").cloned().unwrap_or_default())
        })
        .register("sum", |args: &Arguments, _ctx: &CommandContext| {
            let numbers = args.get_required::<NumberList>("numbers")?;
            Ok::<_, anyhow::Error>(json!({
                "count": numbers.0.len(),
                "total": numbers.0.iter().sum::<f64>(),
            }))
        })
        .register("help", help)
        .register("give", give)
        .register("teleport", teleport)
        .register("time_set", {
            let clock = Rc::clone(&clock);
            move |args: &Arguments, _ctx: &CommandContext| {
                let ticks = match args.get_required::<String>("time")?.as_str() {
                    "day" => 1000,
                    "noon" => 6000,
                    "night" => 13000,
                    other => bail!("unknown time of day '{}'", other),
                };
                clock.set(ticks);
                Ok::<_, anyhow::Error>(format!("Set the time to {}", ticks))
            }
        })
        .register("time_query", move |_args: &Arguments, _ctx: &CommandContext| {
            Ok::<_, anyhow::Error>(json!({ "time": clock.get() }))
        });
    handlers
}

fn help(args: &Arguments, ctx: &CommandContext) -> Result<Vec<String>, anyhow::Error> {
    let index = ctx.app_state.get_required::<HelpIndex>()?;
    let lines: Vec<String> = match args.get::<String>("command") {
        Some(command) => {
            let command = command.to_lowercase();
            index
                .0
                .iter()
                .filter(|line| {
                    let lower = line.to_lowercase();
                    lower == command || lower.starts_with(&format!("{} ", command))
                })
                .cloned()
                .collect()
        }
        None => index.0.clone(),
    };
    if lines.is_empty() {
        return Err(anyhow!("no help for '{}'", args.raw("command").unwrap_or_default()));
    }
    Ok(lines)
}

fn give(args: &Arguments, _ctx: &CommandContext) -> HandlerResult<String> {
    let player = args.get_required::<Player>("player")?;
    let item = args.get_required::<String>("item")?;
    let amount = *args.get_required::<i32>("amount")?;
    if amount <= 0 {
        bail!("amount must be positive, got {}", amount);
    }
    if args.flag("silent") {
        return Ok(Output::Silent);
    }
    Ok(Output::Render(format!("Gave {} {} to {}", amount, item, player.0)))
}

#[derive(Debug, Serialize)]
struct Teleported {
    player: Option<Player>,
    x: Coordinate,
    y: Coordinate,
    z: Coordinate,
}

fn teleport(args: &Arguments, _ctx: &CommandContext) -> Result<Teleported, anyhow::Error> {
    let to = args.get_required::<Arguments>("to")?;
    Ok(Teleported {
        player: args.get::<Player>("player").cloned(),
        x: *to.get_required::<Coordinate>("x")?,
        y: *to.get_required::<Coordinate>("y")?,
        z: *to.get_required::<Coordinate>("z")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdtree::Extensions;

    fn invocation(line: &str) -> CommandInvocation {
        let mut state = Extensions::new();
        state.insert(Roster::default());
        CommandInvocation::new(
            line,
            Rc::new(providers()),
            CommandContext::new(Rc::new(state), Extensions::new()),
        )
    }

    #[test]
    fn player_reads_from_roster() {
        let inv = invocation("");
        let providers = providers();
        let player = providers.type_named("player").unwrap();

        let value = providers.read(player, "STEVE", &inv).unwrap();
        assert_eq!(value.downcast_ref::<Player>(), Some(&Player("steve".into())));
        assert!(providers.read(player, "herobrine", &inv).is_err());
        assert_eq!(providers.complete(player, "s", &inv), vec!["steve", "sam"]);
    }

    #[test]
    fn numbers_read_every_word() {
        let inv = invocation("");
        let providers = providers();
        let numbers = providers.type_named("numbers").unwrap();

        let value = providers.read(numbers, "1 2.5 -3", &inv).unwrap();
        assert_eq!(
            value.downcast_ref::<NumberList>(),
            Some(&NumberList(vec![1.0, 2.5, -3.0]))
        );
        let err = providers.read(numbers, "1 two", &inv).unwrap_err();
        assert_eq!(err.input, "two");
    }

    #[test]
    fn coordinates_are_absolute_or_relative() {
        let inv = invocation("");
        let providers = providers();
        let coordinate = providers.type_named("coordinate").unwrap();

        let read = |text: &str| {
            providers
                .read(coordinate, text, &inv)
                .map(|value| *value.downcast_ref::<Coordinate>().unwrap())
        };
        assert_eq!(read("-12.5").unwrap(), Coordinate::Absolute(-12.5));
        assert_eq!(read("~").unwrap(), Coordinate::Relative(0.0));
        assert_eq!(read("~3").unwrap(), Coordinate::Relative(3.0));
        assert!(read("~up").is_err());
        assert_eq!(providers.complete(coordinate, "", &inv), vec!["~"]);
        assert!(providers.complete(coordinate, "4", &inv).is_empty());

        assert_eq!(
            serde_json::to_value([Coordinate::Absolute(2.0), Coordinate::Relative(0.0), Coordinate::Relative(-1.5)])
                .unwrap(),
            json!([2.0, "~", "~-1.5"])
        );
    }

    #[test]
    fn registry_has_builtins() {
        let handlers = registry();
        assert_eq!(
            handlers.keys(),
            ["echo", "give", "help", "sum", "teleport", "time_query", "time_set"]
        );
    }
}
