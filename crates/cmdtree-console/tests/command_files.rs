//! Loading command files from disk.

use std::fs;

use cmdtree_console::{Console, OutputMode};

const ARENA: &str = r#"
commands:
  - name: shout
    handler: echo
    parameters:
      - name: text
        greed: infinite
  - name: arena
    children:
      - name: give
        handler: give
        parameters:
          - name: player
            type: player
          - name: item
          - name: amount
            type: int
            default: "16"
            required: false
"#;

#[test]
fn loads_commands_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arena.yaml");
    fs::write(&path, ARENA).unwrap();

    let console = Console::from_file(&path, OutputMode::Yaml).unwrap();
    let mut out = Vec::new();
    console.execute("shout all hands", &mut out).unwrap();
    console.execute("arena give sam arrow", &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "all hands\nGave 16 arrow to sam\n"
    );

    assert!(console.dispatcher().get_command("echo").is_none());
    assert_eq!(console.complete("arena g"), vec!["give"]);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.yaml");
    let err = Console::from_file(&path, OutputMode::Text).err().unwrap();
    assert!(format!("{:#}", err).contains("missing.yaml"));
}

#[test]
fn invalid_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "commands:\n  - name: x\n    handler: teleport_all\n").unwrap();

    let err = Console::from_file(&path, OutputMode::Text).err().unwrap();
    let message = format!("{:#}", err);
    assert!(message.contains("bad.yaml"));
    assert!(message.contains("teleport_all"));
}
