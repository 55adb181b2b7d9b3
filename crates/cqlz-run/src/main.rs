use clap::Parser;

fn main() -> miette::Result<()> {
    cqlz_run::Cli::parse().run()
}
