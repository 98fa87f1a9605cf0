use std::io::{self, Write};

use anyhow::Context;
use chirp::models::NewUser;
use structopt::StructOpt;

use crate::common::establish;

#[derive(StructOpt)]
pub struct Opt {
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt)]
enum Cmd {
    #[structopt(name = "add", about = "Registers a user")]
    Add(Add),
    #[structopt(name = "list", about = "Lists registered users")]
    List,
    #[structopt(name = "show", about = "Prints a user as JSON")]
    Show { id: i64 },
}

#[derive(StructOpt)]
struct Add {
    username: String,
    email: String,
    #[structopt(long = "picture", help = "URL of the profile picture")]
    picture: Option<String>,
}

pub fn main(opt: &crate::Opt, subopt: Opt) -> anyhow::Result<()> {
    let manifest = opt.open_manifest()?;
    let conn = establish(&manifest)?;

    match subopt.cmd {
        Cmd::Add(add) => {
            let user = chirp::users::create_user(
                &conn,
                &NewUser {
                    username: &add.username,
                    email: &add.email,
                    picture: add.picture.as_deref(),
                },
            )?;
            println!("{}", user.id);
        }
        Cmd::List => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            for user in chirp::users::list_users(&conn)? {
                write!(stdout, "{}", user.id)?;
                stdout.write_all(b"\t")?;
                write!(stdout, "{}", user.username)?;
                stdout.write_all(b"\t")?;
                write!(stdout, "{}", user.email)?;
                stdout.write_all(b"\t")?;
                if let Some(picture) = user.picture {
                    write!(stdout, "{}", picture)?;
                }
                stdout.write_all(b"\n")?;
            }
        }
        Cmd::Show { id } => {
            let user = chirp::users::find_user(&conn, id)?
                .with_context(|| format!("no user with id {}", id))?;
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            json::to_writer_pretty(&mut stdout, &user)?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
