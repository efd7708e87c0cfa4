//! Command interface example
//!
//! Drives an in-memory [`EditorSession`] with command lines, key sequences and canvas events.

use mindmap_core::{
    CanvasEvent, CommandRegistry, DropPosition, EditorHandlers, EditorSession, KeyOutcome,
    KeySequence, Node, dispatch, execute_line, register_builtin_commands, visible_nodes,
};

fn print_outline(session: &EditorSession) {
    fn walk(nodes: &[Node], depth: usize, selected: Option<&str>) {
        for node in nodes {
            let marker = if Some(node.id.as_str()) == selected { ">" } else { " " };
            let fold = if node.collapsed && node.has_children() { " [+]" } else { "" };
            println!("  {marker} {}{}{fold}", "  ".repeat(depth), node.text);
            if !node.collapsed {
                walk(&node.children, depth + 1, selected);
            }
        }
    }
    walk(session.map().roots(), 0, session.selected());
}

fn run(registry: &CommandRegistry, session: &mut EditorSession, line: &str) {
    let result = execute_line(registry, session, line);
    match (result.success, result.message, result.error) {
        (true, Some(message), _) => println!("  :{line}  ->  {message}"),
        (true, None, _) => println!("  :{line}  ->  ok"),
        (false, _, error) => println!("  :{line}  ->  error: {}", error.unwrap_or_default()),
    }
}

fn main() {
    println!("=== Mind map command interface ===\n");

    let mut registry = CommandRegistry::new();
    for skipped in register_builtin_commands(&mut registry) {
        println!("skipped: {skipped}");
    }
    println!("{} commands registered\n", registry.len());

    let mut session = EditorSession::new(vec![
        Node::new("root", "Release")
            .with_child(Node::new("docs", "Docs").at(200.0, 0.0))
            .with_child(Node::new("tests", "Tests").at(200.0, 60.0)),
    ])
    .unwrap();

    // 1. Command lines
    println!("1. Command lines:");
    run(&registry, &mut session, "select root");
    run(&registry, &mut session, "add-child --text 'Changelog' --edit false");
    run(&registry, &mut session, "rename --text \"Changelog (draft)\"");
    run(&registry, &mut session, "note --text 'Link the milestone'");
    run(&registry, &mut session, "delete root");
    run(&registry, &mut session, "frobnicate");
    print_outline(&session);
    println!();

    // 2. Key sequences
    println!("2. Normal-mode keys:");
    let mut keys = KeySequence::default();
    for key in "kkjza".chars() {
        match keys.push(key) {
            KeyOutcome::Command(line) => run(&registry, &mut session, &line),
            KeyOutcome::Unbound(typed) => println!("  unbound: {typed}"),
            KeyOutcome::Pending | KeyOutcome::CommandLine => {}
        }
    }
    print_outline(&session);
    println!();

    // 3. Canvas events
    println!("3. Canvas events:");
    let drop = CanvasEvent::NodeDragEnd {
        x: 0.0,
        y: 0.0,
        dragged_node_id: "tests".to_string(),
        target_node_id: "docs".to_string(),
        drop_position: DropPosition::Before,
    };
    if let Some(result) = dispatch(&registry, &mut session, &drop) {
        println!("  drag tests before docs -> {:?}", result.message);
    }
    print_outline(&session);
    println!();

    // 4. Help and search
    println!("4. Help:");
    run(&registry, &mut session, "help move");
    println!(
        "  completion for 'add-': {:?}",
        registry.complete("add-").unwrap_or_default()
    );
    println!(
        "  search 'node': {:?}",
        registry
            .search("node")
            .iter()
            .map(|command| command.name.as_str())
            .collect::<Vec<_>>()
    );

    println!(
        "\n{} visible nodes, mode {:?}, version {}",
        visible_nodes(session.map().roots()).len(),
        session.mode(),
        session.version()
    );
}
