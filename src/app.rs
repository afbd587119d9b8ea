use crate::assets::AssetCache;
use crate::clock::SystemClock;
use crate::config::{init_logging, load_settings, project_paths, Paths, Settings};
use crate::engine::Engine;
use crate::input::{collect_input_nonblocking, map_key, Command};
use crate::model::Rules;
use crate::render::{draw_pet_screen, Terminal};
use crate::sound::TerminalBell;
use crate::storage::FileStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Stdout;
use std::time::{Duration, Instant};

type LiveEngine = Engine<SystemClock, FileStore, TerminalBell<Stdout>>;

pub(crate) struct App {
    settings: Settings,
    engine: LiveEngine,
    assets: AssetCache,
    term: Terminal,
    should_quit: bool,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let paths = project_paths()?;
        init_logging(&paths.log_path)?;
        log::info!("beannie-tchi starting, data in {}", paths.data_dir.display());

        let settings = load_settings(&paths.settings_path);
        let assets = AssetCache::preload(settings.assets_dir.as_deref());
        let engine = start_engine(&paths, &settings);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            engine,
            assets,
            term,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(5, 120);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut force = true;

        while !self.should_quit {
            let frame_start = Instant::now();
            force |= self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                match map_key(&ev) {
                    Some(Command::Feed) => {
                        self.engine.feed();
                    }
                    Some(Command::Play) => {
                        self.engine.play();
                    }
                    Some(Command::Quit) => {
                        self.should_quit = true;
                        break;
                    }
                    None => {}
                }
            }

            self.engine.advance();

            let sprite = self.assets.sprite(self.engine.image());
            draw_pet_screen(
                &mut self.term.cur,
                self.engine.state(),
                sprite,
                self.engine.in_progress(),
            );
            self.term.present(force)?;
            force = false;

            spin_sleep(frame_dt, frame_start);
        }

        self.engine.persist_now();
        self.term.end()?;
        log::info!("bye");
        Ok(())
    }
}

fn start_engine(paths: &Paths, settings: &Settings) -> LiveEngine {
    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Engine::start(
        SystemClock,
        FileStore::new(&paths.data_dir),
        TerminalBell::stdout(settings.sound_enabled),
        Rules::default(),
        rng,
        &settings.pet_name,
    )
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    let res = app.run();
    if res.is_err() {
        // leave the user with a usable terminal even when the loop failed
        let _ = app.term.end();
    }
    res
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
