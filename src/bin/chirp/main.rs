#[macro_use]
extern crate log;

mod common;
mod migration;
mod run;
mod setup;
mod user;

use structopt::StructOpt;

pub use common::Opt;

#[derive(StructOpt)]
struct Args {
    #[structopt(flatten)]
    opt: Opt,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt)]
enum Cmd {
    #[structopt(name = "run", about = "Start serving the API")]
    Run(run::Opt),
    #[structopt(name = "setup", about = "Set up the database for the server")]
    Setup(setup::Opt),
    #[structopt(name = "migration", about = "Run pending database migrations")]
    Migration(migration::Opt),
    #[structopt(name = "user", about = "Manage users")]
    User(user::Opt),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Args { opt, cmd } = Args::from_args();

    match cmd {
        Cmd::Run(subopt) => run::main(&opt, subopt).await,
        Cmd::Setup(subopt) => setup::main(&opt, subopt),
        Cmd::Migration(subopt) => migration::main(&opt, subopt),
        Cmd::User(subopt) => user::main(&opt, subopt),
    }
}
