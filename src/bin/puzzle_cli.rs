#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("puzzle_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vector_triangulation::geom::Point3;
    use vector_triangulation::intersection::{AccuracyRules, estimate_convergence};
    use vector_triangulation::options::PuzzleOptions;
    use vector_triangulation::puzzle::Puzzle;
    use vector_triangulation::scene::{Scene, SourceGenerator, SourceId};
    use vector_triangulation::services::{Callbacks, Severity};
    use vector_triangulation::view::{Projector, ScreenPoint, Viewport};

    const USAGE: &str = r#"puzzle_cli (vector-triangulation)

USAGE:
  puzzle_cli scene  [--seed <n>] [--reveal]
  puzzle_cli solve  [--seed <n>]
  puzzle_cli decoys [--seed <n>]

COMMANDS:
  scene    Print the generated sources (and with --reveal the hidden target)
  solve    Play a puzzle by clicking the accurate sources, then lock coordinates
  decoys   Score every possible three-source lock set

OPTIONS:
  --seed <n>   Seed for the scene generator (default 1)
  --reveal     Also print the hidden target and which sources are accurate
  -h, --help   Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        if matches!(command.as_str(), "-h" | "--help" | "help") {
            print_usage();
            return Ok(());
        }

        let mut seed = 1_u64;
        let mut reveal = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = args.value("--seed")?;
                    seed = value
                        .parse()
                        .map_err(|e| format!("invalid seed `{value}`: {e}"))?;
                }
                "--reveal" => reveal = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        match command.as_str() {
            "scene" => {
                cmd_scene(seed, reveal);
                Ok(())
            }
            "solve" => cmd_solve(seed),
            "decoys" => {
                cmd_decoys(seed);
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn generate(seed: u64) -> Scene {
        let options = PuzzleOptions::default();
        SourceGenerator::new(&options).generate(&mut StdRng::seed_from_u64(seed))
    }

    fn cmd_scene(seed: u64, reveal: bool) {
        let scene = generate(seed);
        println!("seed {seed}");
        if reveal {
            println!("target {}", fmt_point(scene.hidden_target()));
        }
        for source in scene.sources() {
            let d = source.direction;
            print!(
                "{:>2} {:<14} at {} dir ({:+.4}, {:+.4}, {:+.4})",
                source.id.0,
                source.name,
                fmt_point(source.position),
                d.x,
                d.y,
                d.z
            );
            if reveal {
                print!(" {}", if source.is_accurate { "accurate" } else { "decoy" });
            }
            println!();
        }
    }

    fn cmd_solve(seed: u64) -> Result<(), String> {
        let scene = generate(seed);
        let accurate: Vec<SourceId> = scene
            .sources()
            .iter()
            .filter(|source| source.is_accurate)
            .map(|source| source.id)
            .collect();

        let outcome = Rc::new(RefCell::new(None));
        let report = Rc::clone(&outcome);
        let mut puzzle = Puzzle::builder()
            .notifier(|message: &str, severity: Severity| {
                eprintln!("[{}] {message}", severity.name());
            })
            .start_with_scene(
                scene,
                &mut StdRng::seed_from_u64(seed),
                Callbacks::new(move |estimate| *report.borrow_mut() = Some(estimate), || {}),
            )
            .map_err(|e| e.to_string())?;

        for id in accurate {
            let at = screen_position(&puzzle, id)
                .ok_or_else(|| format!("source {} is not on screen", id.0))?;
            puzzle.click(at);
        }
        puzzle.frame();

        if !puzzle.lock_coordinates() {
            let snapshot = puzzle.snapshot();
            return Err(format!(
                "lock not available: {} locked, accuracy {:?}",
                snapshot.locked_count, snapshot.accuracy
            ));
        }

        let estimate = outcome
            .borrow_mut()
            .take()
            .ok_or("success callback did not fire")?;
        println!(
            "fix {} accuracy {:.2}% from {} pairs",
            fmt_point(estimate.point),
            estimate.accuracy,
            estimate.sample_count
        );
        Ok(())
    }

    fn cmd_decoys(seed: u64) {
        let rules = AccuracyRules::default();
        let options = PuzzleOptions::default();
        let base = generate(seed);
        let ids: Vec<SourceId> = base.sources().iter().map(|source| source.id).collect();

        for (i, a) in ids.iter().enumerate() {
            for (j, b) in ids.iter().enumerate().skip(i + 1) {
                for c in ids.iter().skip(j + 1) {
                    let mut scene = base.clone();
                    for id in [*a, *b, *c] {
                        scene.toggle_lock(id, options.max_locked);
                    }
                    let accurate = scene
                        .locked_sources()
                        .filter(|source| source.is_accurate)
                        .count();
                    let line = match estimate_convergence(&scene, &rules) {
                        Some(estimate) => format!(
                            "{:.2}%{}",
                            estimate.accuracy,
                            if estimate.accuracy > options.success_threshold {
                                " lockable"
                            } else {
                                ""
                            }
                        ),
                        None => "no estimate".to_string(),
                    };
                    println!("[{} {} {}] accurate={accurate} {line}", a.0, b.0, c.0);
                }
            }
        }
    }

    fn screen_position(puzzle: &Puzzle, id: SourceId) -> Option<ScreenPoint> {
        let source = puzzle.scene().source(id)?;
        let projector =
            Projector::new(puzzle.view(), Viewport::default(), puzzle.options().focal_length);
        let p = projector.project(source.position);
        (!p.behind_camera).then(|| ScreenPoint::new(p.x, p.y))
    }

    fn fmt_point(p: Point3) -> String {
        format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
