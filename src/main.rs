#[cfg(feature = "cli")]
fn main() {
    env_logger::builder().format_timestamp(None).init();
    let cli = <saneql::cli::Cli as clap::Parser>::parse();
    std::process::exit(cli.run());
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("saneql was built without the `cli` feature");
    std::process::exit(1);
}
