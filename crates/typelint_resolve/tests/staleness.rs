//! Staleness scenarios: configuration edits, renames, and the overlay text
//! flowing into rescans, all against a real tempdir project.

mod common;

use std::path::Path;
use std::thread;
use std::time::Duration;

use common::Workspace;

// Filesystem mtimes on the config file drive invalidation; give them room
// to tick between writes.
fn let_mtime_tick() {
    thread::sleep(Duration::from_millis(50));
}

#[test]
fn config_edit_is_picked_up_without_rebuilding_the_program() {
    let ws = Workspace::new();
    ws.write("project.json", r#"{ "include": ["src/**/*"] }"#);
    ws.write("src/foo.ts", "");
    ws.write("test/bar.ts", "");

    let mut resolver = ws.resolver();
    let stats = resolver.toolchain().stats();
    let configs = vec![ws.path("project.json")];

    let before = resolver
        .resolve(Path::new("src/foo.ts"), "", &configs)
        .unwrap();
    assert!(
        resolver
            .resolve(Path::new("test/bar.ts"), "", &configs)
            .unwrap()
            .is_empty()
    );

    let_mtime_tick();
    ws.write(
        "project.json",
        r#"{ "include": ["src/**/*", "test/**/*"] }"#,
    );

    let after = resolver
        .resolve(Path::new("test/bar.ts"), "", &configs)
        .unwrap();

    // The same program instance absorbed the new include set.
    assert!(before[0].same_instance(&after[0]));
    assert!(after[0].contains_file(&ws.path("test/bar.ts")));
    assert_eq!(stats.programs_created(), 1);
}

#[test]
fn narrowed_config_stops_covering_previous_members() {
    let ws = Workspace::new();
    ws.write("project.json", r#"{ "include": ["src/**/*"] }"#);
    ws.write("src/foo.ts", "");
    ws.write("test/bar.ts", "");

    let mut resolver = ws.resolver();
    let configs = vec![ws.path("project.json")];

    resolver
        .resolve(Path::new("src/foo.ts"), "", &configs)
        .unwrap();

    let_mtime_tick();
    ws.write("project.json", r#"{ "include": ["test/**/*"] }"#);

    // The edit is observed while resolving a file the new config covers.
    let programs = resolver
        .resolve(Path::new("test/bar.ts"), "", &configs)
        .unwrap();
    assert!(programs[0].contains_file(&ws.path("test/bar.ts")));

    // The old member is no longer covered by any project.
    let programs = resolver
        .resolve(Path::new("src/foo.ts"), "", &configs)
        .unwrap();
    assert!(programs.is_empty());
}

#[test]
fn untouched_config_never_reparses() {
    let ws = Workspace::new();
    ws.write("project.json", r#"{ "include": ["src/**/*"] }"#);
    ws.write("src/foo.ts", "");

    let mut resolver = ws.resolver();
    let stats = resolver.toolchain().stats();
    let configs = vec![ws.path("project.json")];

    for _ in 0..3 {
        resolver
            .resolve(Path::new("src/foo.ts"), "", &configs)
            .unwrap();
    }

    assert_eq!(stats.configs_parsed(), 1);
    assert_eq!(stats.rescans(), 1);
}

#[test]
fn rename_retires_the_old_root_and_admits_the_new_one() {
    let ws = Workspace::new();
    ws.write("project.json", r#"{ "include": ["src/**/*"] }"#);
    let old = ws.write("src/old.ts", "export const v = 1;");

    let mut resolver = ws.resolver();
    let stats = resolver.toolchain().stats();
    let configs = vec![ws.path("project.json")];

    let before = resolver
        .resolve(Path::new("src/old.ts"), "export const v = 1;", &configs)
        .unwrap();

    ws.remove("src/old.ts");
    let new = ws.write("src/new.ts", "export const v = 1;");

    let after = resolver
        .resolve(Path::new("src/new.ts"), "export const v = 1;", &configs)
        .unwrap();

    assert!(before[0].same_instance(&after[0]));
    assert!(after[0].contains_file(&new));
    assert!(!after[0].root_file_names().contains(&old));
    assert_eq!(stats.programs_created(), 1);
}

#[test]
fn rescans_read_the_unsaved_overlay_text_not_the_disk() {
    let ws = Workspace::new();
    ws.write("project.json", r#"{ "include": ["src/**/*"] }"#);
    ws.write("src/foo.ts", "");

    let mut resolver = ws.resolver();
    let configs = vec![ws.path("project.json")];

    resolver
        .resolve(Path::new("src/foo.ts"), "", &configs)
        .unwrap();

    // A new file whose buffer has not been saved: disk and editor differ.
    let new = ws.write("src/new.ts", "saved text");
    let programs = resolver
        .resolve(Path::new("src/new.ts"), "unsaved text", &configs)
        .unwrap();

    assert_eq!(programs[0].source_text(&new).as_deref(), Some("unsaved text"));
}
