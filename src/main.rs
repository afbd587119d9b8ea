mod app;
mod assets;
mod clock;
mod config;
mod engine;
mod images;
mod input;
mod model;
mod render;
mod scheduler;
mod sim;
mod sound;
mod storage;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
