//! LoreWeave command-line entry point

fn main() -> anyhow::Result<()> {
    loreweave::cli::run_cli()
}
