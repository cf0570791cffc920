/// CLI module - command-line interface for chatfolders
mod cli;

fn main() {
    cli::run_cli();
}
