mod application;

mod presentation {
    pub mod cli;
    pub mod render;
}

fn main() -> anyhow::Result<()> {
    application::run()
}
