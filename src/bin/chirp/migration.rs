use std::io;

use anyhow::Context;

use crate::common::establish;

#[derive(Default, structopt::StructOpt)]
pub struct Opt {}

pub fn main(opt: &crate::Opt, _subopt: Opt) -> anyhow::Result<()> {
    let manifest = opt.open_manifest()?;
    let conn = establish(&manifest)?;

    let stdout = io::stdout();
    chirp::migrations::run_with_output(&conn, &mut stdout.lock()).context("migration failed")?;

    Ok(())
}
