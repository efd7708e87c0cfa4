use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use mindmap_core::{
    CommandRegistry, Direction, EditorSession, Node, execute_line, navigate, parse_command,
    register_builtin_commands,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A forest of `roots` trees, each `breadth` wide and `depth` deep, laid out left to right.
fn large_forest(roots: usize, breadth: usize, depth: usize) -> Vec<Node> {
    fn build(prefix: &str, breadth: usize, depth: usize, x: f64, y: f64) -> Node {
        let mut node = Node::new(prefix, format!("topic {prefix}")).at(x, y);
        if depth > 0 {
            for i in 0..breadth {
                let child_y = y + (i as f64 - breadth as f64 / 2.0) * 40.0;
                node = node.with_child(build(
                    &format!("{prefix}.{i}"),
                    breadth,
                    depth - 1,
                    x + 200.0,
                    child_y,
                ));
            }
        }
        node
    }

    (0..roots)
        .map(|r| build(&format!("r{r}"), breadth, depth, 0.0, r as f64 * 2_000.0))
        .collect()
}

fn bench_parse_command(c: &mut Criterion) {
    let line = "move \"node with spaces\" --target 'other node' --position after --count 12";
    c.bench_function("parse_command/quoted_flags", |b| {
        b.iter(|| black_box(parse_command(black_box(line)).unwrap()))
    });
}

fn bench_navigation_random_walk(c: &mut Criterion) {
    // 4 * (1 + 6 + 36 + 216 + 1296) nodes
    let forest = large_forest(4, 6, 4);
    let directions = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    c.bench_function("navigate/random_walk_1000", |b| {
        b.iter_batched(
            || StdRng::seed_from_u64(7),
            |mut rng| {
                let mut current = "r0".to_string();
                for _ in 0..1_000 {
                    let direction = directions[rng.gen_range(0..directions.len())];
                    if let Some(outcome) = navigate(&forest, &current, direction, 1) {
                        current = outcome.target;
                    }
                }
                black_box(current);
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_registry_search(c: &mut Criterion) {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    c.bench_function("registry/search_and_complete", |b| {
        b.iter(|| {
            black_box(registry.search(black_box("no")));
            black_box(registry.complete(black_box("add-")));
        })
    });
}

fn bench_session_edits(c: &mut Criterion) {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let forest = large_forest(1, 5, 3);

    c.bench_function("session/100_added_children", |b| {
        b.iter_batched(
            || EditorSession::new(forest.clone()).unwrap(),
            |mut session| {
                execute_line(&registry, &mut session, "select r0");
                for i in 0..100 {
                    let line = format!("add-child r0 --text 'child {i}' --edit false");
                    black_box(execute_line(&registry, &mut session, &line));
                }
                black_box(session.map().len());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_parse_command,
    bench_navigation_random_walk,
    bench_registry_search,
    bench_session_edits
);
criterion_main!(benches);
