mod app;
mod config;
mod console;
mod fish;
mod input;
mod navigation;
mod render;
mod sim;
mod tank;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
